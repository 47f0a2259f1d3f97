//! CRC32 checksums for bzip2, both block and stream versions.
//!
//! bzip2 uses the big-endian (non-reflected) CRC32 with polynomial 0x04c11db7, not the
//! reflected variant used by zip and gzip.

const POLY: u32 = 0x04c1_1db7;

/// Lookup table, built at compile time.
static CRC_TABLE: [u32; 256] = build_table();

const fn build_table() -> [u32; 256] {
    let mut table = [0_u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut c = (i as u32) << 24;
        let mut k = 0;
        while k < 8 {
            c = if c & 0x8000_0000 != 0 { (c << 1) ^ POLY } else { c << 1 };
            k += 1;
        }
        table[i] = c;
        i += 1;
    }
    table
}

#[inline(always)]
fn update(crc: u32, byte: u8) -> u32 {
    (crc << 8) ^ CRC_TABLE[((crc >> 24) ^ byte as u32) as usize]
}

/// Continue a block crc over `data`. Start a new block with a crc of 0. The result is
/// always the finished crc of everything seen so far, so calls can be chained freely.
pub fn do_crc(crc: u32, data: &[u8]) -> u32 {
    !data.iter().fold(!crc, |c, &b| update(c, b))
}

/// Continue a block crc over `count` copies of `byte`.
pub fn do_crc_run(crc: u32, byte: u8, count: usize) -> u32 {
    !(0..count).fold(!crc, |c, _| update(c, byte))
}

/// Fold a block crc into the stream crc. Order matters: blocks must be folded in stream order.
pub fn do_stream_crc(stream_crc: u32, block_crc: u32) -> u32 {
    stream_crc.rotate_left(1) ^ block_crc
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn check_value_test() {
        // CRC-32/BZIP2 check value
        assert_eq!(do_crc(0, b"123456789"), 0xfc89_1918);
    }

    #[test]
    fn chained_crc_test() {
        let whole = do_crc(0, b"The quick brown fox jumps over the lazy dog");
        let part = do_crc(0, b"The quick brown ");
        assert_eq!(do_crc(part, b"fox jumps over the lazy dog"), whole);
    }

    #[test]
    fn run_crc_test() {
        let direct = do_crc(0, &[b'a'; 300]);
        assert_eq!(do_crc_run(0, b'a', 300), direct);
        assert_eq!(do_crc_run(0, b'a', 0), 0);
    }

    #[test]
    fn stream_crc_test() {
        let blocks = [0x8000_0001_u32, 0x1234_5678, 0xffff_0000];
        let stream = blocks.iter().fold(0, |s, &b| do_stream_crc(s, b));
        let mut expected = 0_u32;
        for b in blocks {
            expected = ((expected << 1) | (expected >> 31)) ^ b;
        }
        assert_eq!(stream, expected);
        // Order dependent
        let reversed = blocks.iter().rev().fold(0, |s, &b| do_stream_crc(s, b));
        assert_ne!(stream, reversed);
    }
}
