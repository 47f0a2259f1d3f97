use log::{debug, trace};

use crate::bitstream::bitpacker::BitPacker;
use crate::bitstream::BitSink;
use crate::bwt_algorithms::block_sort::block_sort;
use crate::error::{Bz2Error, Result};
use crate::huffman_coding::huffman::huf_encode;
use crate::tools::rle2_mtf::rle2_mtf_encode;

use super::block::Block;

/// Block header magic, the BCD digits of pi.
pub const BLOCK_MAGIC: u64 = 0x3141_5926_5359;

/// Compress a filled block into its recorder: block header, then the BWT, MTF/RLE2 and huffman stages.
/// A block can be compressed only once.
pub fn compress_block(block: &mut Block) -> Result<()> {
    let rle1 = block
        .rle1
        .take()
        .ok_or(Bz2Error::Internal("block closed twice"))?;
    if rle1.is_empty() {
        return Err(Bz2Error::Internal("empty block closed"));
    }
    let (data, crc) = rle1.finish();
    let rle1_len = data.len();

    let sorted = block_sort(data)?;
    let rle2 = rle2_mtf_encode(&sorted.bwt);

    // Leave room for the compressed block, which is nearly always smaller than the input
    let mut bits = BitPacker::new(rle1_len / 2 + 64);
    trace!("\r\x1b[43mWriting magic and CRC at {}.    \x1b[0m", bits.loc());
    bits.write_bits(24, (BLOCK_MAGIC >> 24) as u32);
    bits.write_bits(24, (BLOCK_MAGIC & 0xff_ffff) as u32);
    bits.write_int32(crc);
    bits.write_bool(sorted.randomised);
    trace!("\r\x1b[43mWriting key at {}.    \x1b[0m", bits.loc());
    bits.write_bits(24, sorted.origin_ptr);

    huf_encode(&mut bits, &rle2)?;

    debug!(
        "\n         block {}: {} bytes in block, {} after MTF & RLE2 coding, {} syms in use, {} bits out",
        block.id(),
        rle1_len,
        rle2.symbols.len(),
        rle2.alpha_size(),
        bits.bit_len()
    );

    block.recorder = bits;
    block.crc = crc;
    block.randomised = sorted.randomised;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tools::crc::do_crc;

    #[test]
    fn header_test() {
        let mut block = Block::new(0, 1000);
        block.write(b"hello, world");
        compress_block(&mut block).unwrap();
        assert!(block.is_compressed());
        assert_eq!(block.crc(), do_crc(0, b"hello, world"));

        let mut out = crate::bitstream::bitwriter::BitWriter::new(Vec::new());
        block.recorder().replay(&mut out);
        out.flush().unwrap();
        let bytes = out.into_inner();
        assert_eq!(&bytes[..6], &[0x31, 0x41, 0x59, 0x26, 0x53, 0x59]);
        assert_eq!(&bytes[6..10], &block.crc().to_be_bytes());
        // Not randomised: the top bit of the next byte is clear
        assert_eq!(bytes[10] & 0x80, 0);
    }

    #[test]
    fn close_twice_test() {
        let mut block = Block::new(0, 1000);
        block.write(b"abc");
        compress_block(&mut block).unwrap();
        assert!(matches!(
            compress_block(&mut block),
            Err(Bz2Error::Internal(_))
        ));
    }

    #[test]
    fn empty_block_test() {
        let mut block = Block::new(0, 1000);
        assert!(compress_block(&mut block).is_err());
    }
}
