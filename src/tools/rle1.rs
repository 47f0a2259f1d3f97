use log::trace;

use super::crc::do_crc_run;

/// Longest run a single RLE1 entry can describe: four literal bytes plus a count of up to 251.
pub const MAX_RUN: usize = 255;

/// Bytes the BWT input buffer gets past its end so the sort can compare across the wrap
/// without bounds juggling. Reserved up front so the sort never reallocates.
pub const OVERSHOOT: usize = 20;

/// The first stage of a block. Accepts raw bytes and encodes runs of identical bytes
/// bzip2 style (runs of 4-255 become four literal bytes and a count of the extra bytes),
/// building the buffer that the BWT will sort.
///
/// The block capacity limits the *encoded* length, which is what a decoder checks. A byte
/// that would push the encoded length past capacity is refused, and the block is full.
#[derive(Debug)]
pub struct Rle1Block {
    /// RLE1 encoded data
    data: Vec<u8>,
    /// Maximum length of the encoded data
    capacity: usize,
    /// CRC over the raw (not encoded) bytes
    block_crc: u32,
    /// Byte value of the pending run
    run_byte: u8,
    /// Length of the pending run, 0 when none
    run_len: usize,
    /// Raw bytes accepted
    loaded: usize,
    /// Set when a byte has been refused
    full: bool,
}

/// Encoded length of a run of `len` identical bytes.
#[inline(always)]
fn run_cost(len: usize) -> usize {
    if len < 4 {
        len
    } else {
        5
    }
}

impl Rle1Block {
    /// Create an empty block that will hold at most `capacity` encoded bytes.
    pub fn new(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity + 1 + OVERSHOOT),
            capacity,
            block_crc: 0,
            run_byte: 0,
            run_len: 0,
            loaded: 0,
            full: false,
        }
    }

    /// Add one raw byte. Returns false, and marks the block full, if the byte does not fit.
    pub fn write(&mut self, byte: u8) -> bool {
        let needed = if self.run_len == 0 {
            self.data.len() + 1
        } else if byte == self.run_byte {
            self.data.len() + run_cost(self.run_len + 1)
        } else {
            self.data.len() + run_cost(self.run_len) + 1
        };
        if needed > self.capacity {
            self.full = true;
            return false;
        }

        if self.run_len == 0 {
            self.run_byte = byte;
            self.run_len = 1;
        } else if byte == self.run_byte {
            self.run_len += 1;
            if self.run_len == MAX_RUN {
                self.flush_run();
            }
        } else {
            self.flush_run();
            self.run_byte = byte;
            self.run_len = 1;
        }
        self.loaded += 1;
        true
    }

    /// Add as many bytes from the slice as fit. Returns how many were taken.
    pub fn write_slice(&mut self, buf: &[u8]) -> usize {
        buf.iter().take_while(|&&b| self.write(b)).count()
    }

    /// Write out the pending run, if any. Call once all input for the block has been written.
    pub fn flush_run(&mut self) {
        if self.run_len == 0 {
            return;
        }
        let (byte, len) = (self.run_byte, self.run_len);
        self.block_crc = do_crc_run(self.block_crc, byte, len);
        if len < 4 {
            self.data.extend(std::iter::repeat(byte).take(len));
        } else {
            self.data.extend_from_slice(&[byte; 4]);
            self.data.push((len - 4) as u8);
        }
        trace!("\r\x1b[43mRLE1 run of {} x {:#04x}.    \x1b[0m", len, byte);
        self.run_len = 0;
    }

    /// Take the encoded data and the block crc. Any pending run is flushed first.
    pub fn finish(mut self) -> (Vec<u8>, u32) {
        self.flush_run();
        (self.data, self.block_crc)
    }

    /// Raw bytes accepted so far.
    pub fn loaded(&self) -> usize {
        self.loaded
    }

    /// True once a byte has been refused.
    pub fn is_full(&self) -> bool {
        self.full
    }

    /// True if no byte has been accepted.
    pub fn is_empty(&self) -> bool {
        self.loaded == 0
    }

    /// Encoded length, counting the pending run as it will be written.
    pub fn encoded_len(&self) -> usize {
        self.data.len() + run_cost(self.run_len)
    }
}
