use std::io::{self, Write};

use log::trace;

use super::{low_bits, BitSink};

/// Writes the final bitstream to the real output. Recorded blocks are replayed into it in order, together with
/// the stream header and footer written by the orchestrator.
pub struct BitWriter<W> {
    /// Output buffer of complete bytes waiting to be handed to the writer.
    output: Vec<u8>,
    /// Private queue to hold bits that are waiting to be put as bytes into the output buffer.
    queue: u64,
    /// Count of valid bits in the queue.
    q_bits: u8,
    /// Bytes already handed to the writer, used for position reporting.
    written: u64,
    /// Set once the final partial byte has been padded out.
    closed: bool,
    /// Handle to the output stream
    writer: W,
}

impl<W: Write> BitWriter<W> {
    /// Create a new BitWriter around the output stream.
    pub fn new(writer: W) -> Self {
        Self {
            output: Vec::with_capacity(64 * 1024),
            queue: 0,
            q_bits: 0,
            written: 0,
            closed: false,
            writer,
        }
    }

    /// Hand all complete bytes to the writer. Bits of a partial byte stay queued.
    pub fn push_output(&mut self) -> io::Result<()> {
        if !self.output.is_empty() {
            self.writer.write_all(&self.output)?;
            self.written += self.output.len() as u64;
            self.output.clear();
        }
        Ok(())
    }

    /// Pad the final partial byte with zero bits, push everything out and flush the writer.
    /// Nothing may be written after this.
    pub fn flush(&mut self) -> io::Result<()> {
        if self.q_bits > 0 {
            let pad = 8 - self.q_bits;
            trace!("\r\x1b[43mPadding {} bits at {}.    \x1b[0m", pad, self.loc());
            self.write_bits(pad, 0);
        }
        self.closed = true;
        self.push_output()?;
        self.writer.flush()
    }

    /// Returns the number of bytes.bits output so far.
    pub fn loc(&self) -> String {
        let bits = (self.written + self.output.len() as u64) * 8 + self.q_bits as u64;
        format!("[{}.{}]", bits / 8, bits % 8)
    }

    /// Reference to the underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Mutable reference to the underlying writer. Writing to it directly corrupts the stream.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Give back the underlying writer. Unpushed bytes are lost, so call flush() first.
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Move whole bytes from the queue to the output buffer.
    #[inline(always)]
    fn drain_queue(&mut self) {
        while self.q_bits > 7 {
            self.output.push((self.queue >> (self.q_bits - 8)) as u8);
            self.q_bits -= 8;
        }
    }
}

impl<W: Write> BitSink for BitWriter<W> {
    fn write_bits(&mut self, count: u8, value: u32) {
        debug_assert!(!self.closed, "BitWriter written after flush");
        debug_assert!(count <= 32);
        self.queue = (self.queue << count) | low_bits(count, value);
        self.q_bits += count;
        self.drain_queue();
    }

    fn write_bytes(&mut self, bytes: &[u8]) {
        // Byte aligned data can go straight into the output buffer
        if self.q_bits == 0 {
            self.output.extend_from_slice(bytes);
        } else {
            bytes.iter().for_each(|&b| self.write_bits(8, b as u32));
        }
    }
}
