//! The bitstream module forms the output subsystem for the multi-threaded bzip2 compressor.
//!
//! BZIP2 is a block-oriented approach to compress data, and nearly every field in a block is written at
//! sub-byte granularity.
//!
//! The reference BZIP2 tool, being single-threaded, was able to write the bitstream from start to finish.
//! This multi-threaded version compresses each block on a worker thread into a BitPacker, an in-memory recording
//! of the block's bits. The orchestrator then replays each recording into the one BitWriter attached to the real
//! output, in block order.
//!
//! Both implement BitSink, so the block encoder never knows whether its bits go straight out or are recorded
//! for later.
//!
pub mod bitpacker;
pub mod bitwriter;

/// Anything that accepts a bzip2 bitstream, most significant bit first.
pub trait BitSink {
    /// Write the `count` (0-32) least significant bits of `value`.
    fn write_bits(&mut self, count: u8, value: u32);

    /// Write a single bit.
    fn write_bool(&mut self, bit: bool) {
        self.write_bits(1, bit as u32);
    }

    /// Write `n` one bits followed by a single zero bit.
    fn write_unary(&mut self, mut n: u32) {
        while n >= 8 {
            self.write_bits(8, 0xff);
            n -= 8;
        }
        // n ones followed by the terminating zero, in one go
        self.write_bits(n as u8 + 1, ((1_u32 << n) - 1) << 1);
    }

    /// Write a 32 bit word as two 16 bit halves, high half first.
    fn write_int32(&mut self, value: u32) {
        self.write_bits(16, value >> 16);
        self.write_bits(16, value & 0xffff);
    }

    /// Write whole bytes. Implementations may override this with a faster aligned path.
    fn write_bytes(&mut self, bytes: &[u8]) {
        bytes.iter().for_each(|&b| self.write_bits(8, b as u32));
    }
}

/// Mask off everything above the low `count` bits.
#[inline(always)]
pub(crate) fn low_bits(count: u8, value: u32) -> u64 {
    (value as u64) & ((1_u64 << count) - 1)
}
