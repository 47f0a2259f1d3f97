use super::{low_bits, BitSink};

/// Records the bitstream of one block in memory so it can be compressed on a worker thread
/// and replayed, bit for bit, into the real output later.
///
/// Bits are packed as they arrive, so a recording costs about as much memory as the compressed block.
#[derive(Debug, Default)]
pub struct BitPacker {
    /// Complete bytes recorded so far.
    output: Vec<u8>,
    /// Bits not yet forming a complete byte.
    queue: u64,
    /// Count of valid bits in the queue.
    q_bits: u8,
}

impl BitPacker {
    /// Create a new BitPacker with an output buffer of the size specified. Suggest the
    /// size be set near the expected compressed block size.
    pub fn new(size: usize) -> Self {
        Self {
            output: Vec::with_capacity(size),
            queue: 0,
            q_bits: 0,
        }
    }

    /// Number of bits recorded.
    pub fn bit_len(&self) -> u64 {
        self.output.len() as u64 * 8 + self.q_bits as u64
    }

    /// True if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.output.is_empty() && self.q_bits == 0
    }

    /// Replay every recorded bit, in order, into another sink. The trailing partial byte is
    /// replayed without padding, so blocks butt up against each other in the final stream.
    pub fn replay<S: BitSink + ?Sized>(&self, sink: &mut S) {
        sink.write_bytes(&self.output);
        if self.q_bits > 0 {
            sink.write_bits(self.q_bits, self.queue as u32);
        }
    }

    /// Debugging function to return the number of bytes.bits recorded so far
    pub fn loc(&self) -> String {
        format!("[{}.{}]", self.bit_len() / 8, self.bit_len() % 8)
    }
}

impl BitSink for BitPacker {
    fn write_bits(&mut self, count: u8, value: u32) {
        debug_assert!(count <= 32);
        self.queue = (self.queue << count) | low_bits(count, value);
        self.q_bits += count;
        while self.q_bits > 7 {
            self.output.push((self.queue >> (self.q_bits - 8)) as u8);
            self.q_bits -= 8;
        }
        // Keep only the pending bits so replay can hand them over as-is
        self.queue = low_bits(self.q_bits, self.queue as u32);
    }
}
