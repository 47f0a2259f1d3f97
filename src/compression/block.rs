use crate::bitstream::bitpacker::BitPacker;
use crate::tools::rle1::Rle1Block;

/// One block of the stream. The writer fills it through the RLE1 stage, a worker compresses it into its
/// recorder, and the orchestrator replays the recording into the output in id order.
#[derive(Debug)]
pub struct Block {
    /// Position of this block in the stream, starting at 0.
    id: u64,
    /// RLE1 stage. Taken when the block is compressed.
    pub(crate) rle1: Option<Rle1Block>,
    /// Compressed bits of the block, header included.
    pub(crate) recorder: BitPacker,
    /// CRC over the raw bytes of the block, set when compressed.
    pub(crate) crc: u32,
    /// True if the sort had to randomise the block.
    pub(crate) randomised: bool,
    /// Raw bytes in the block.
    loaded: usize,
}

impl Block {
    /// Create an empty block that holds at most `capacity` RLE1 encoded bytes.
    pub fn new(id: u64, capacity: usize) -> Self {
        Self {
            id,
            rle1: Some(Rle1Block::new(capacity)),
            recorder: BitPacker::default(),
            crc: 0,
            randomised: false,
            loaded: 0,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Add as many bytes as fit. Returns how many were taken; fewer than offered means the block is full.
    pub fn write(&mut self, buf: &[u8]) -> usize {
        match self.rle1.as_mut() {
            Some(rle1) => {
                let taken = rle1.write_slice(buf);
                self.loaded += taken;
                taken
            }
            None => 0,
        }
    }

    /// Add one byte. Returns false if the block is full.
    pub fn write_byte(&mut self, byte: u8) -> bool {
        self.write(&[byte]) == 1
    }

    /// True once the block refused a byte, or has been compressed.
    pub fn is_full(&self) -> bool {
        self.rle1.as_ref().map_or(true, |r| r.is_full())
    }

    /// True if no bytes were written.
    pub fn is_empty(&self) -> bool {
        self.loaded == 0
    }

    /// Raw bytes written into the block.
    pub fn loaded(&self) -> usize {
        self.loaded
    }

    /// True once the block has been compressed.
    pub fn is_compressed(&self) -> bool {
        self.rle1.is_none()
    }

    /// CRC of the raw bytes. Only meaningful once compressed.
    pub fn crc(&self) -> u32 {
        self.crc
    }

    pub fn randomised(&self) -> bool {
        self.randomised
    }

    /// The compressed bits, ready to replay.
    pub fn recorder(&self) -> &BitPacker {
        &self.recorder
    }
}
