use std::io::Read;

use bzip2::read::BzDecoder;
use pbzip2::{compress, EncoderOptions, ParallelBzEncoder};

fn opts(threads: usize, level: u8) -> EncoderOptions {
    EncoderOptions::new().with_threads(threads).with_level(level)
}

fn decompress(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    BzDecoder::new(data).read_to_end(&mut out).unwrap();
    out
}

/// Pseudo random bytes. With `run_free`, no byte equals the one before it, so RLE1 leaves the data alone.
fn noise(n: usize, seed: u32, run_free: bool) -> Vec<u8> {
    let mut x = seed;
    let mut prev = 0_u8;
    (0..n)
        .map(|_| {
            x = x.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let mut b = (x >> 16) as u8;
            if run_free && b == prev {
                b = b.wrapping_add(1);
            }
            prev = b;
            b
        })
        .collect()
}

fn text(n: usize) -> Vec<u8> {
    let words = [
        "block", "sorting", "compressor ", "the ", "of ", "and ", "huffman ", "table\n", "run ",
        "a ", "zzzzzzzzzz ", "move to front ",
    ];
    let mut x = 7_u32;
    let mut out = Vec::with_capacity(n + 16);
    while out.len() < n {
        x = x.wrapping_mul(69_069).wrapping_add(1);
        out.extend_from_slice(words[(x >> 20) as usize % words.len()].as_bytes());
    }
    out.truncate(n);
    out
}

fn check(data: &[u8], options: EncoderOptions) -> Vec<u8> {
    let compressed = compress(data, options).unwrap();
    assert_eq!(decompress(&compressed), data);
    compressed
}

#[test]
fn empty_input_test() {
    let compressed = check(b"", opts(2, 9));
    // Header and footer only
    assert_eq!(compressed.len(), 14);
}

#[test]
fn single_byte_test() {
    check(b"x", opts(1, 1));
    check(&[0], opts(1, 9));
    check(&[255], opts(4, 5));
}

#[test]
fn short_inputs_test() {
    for n in 1..40 {
        check(&text(n), opts(1, 1));
        check(&noise(n, n as u32, false), opts(1, 1));
    }
}

#[test]
fn text_test() {
    check(&text(350_000), opts(4, 1));
}

#[test]
fn random_test() {
    check(&noise(250_000, 99, false), opts(3, 2));
}

#[test]
fn runs_test() {
    // Runs of every length around the RLE1 limits
    let mut data = Vec::new();
    for len in 1..600 {
        data.extend(std::iter::repeat((len % 7) as u8 + b'a').take(len));
    }
    check(&data, opts(2, 1));
}

#[test]
fn all_byte_values_test() {
    let data: Vec<u8> = (0..=255_u8).cycle().take(70_000).collect();
    check(&data, opts(2, 1));
}

#[test]
fn thread_count_invariance_test() {
    let data = text(450_000);
    let one = check(&data, opts(1, 1));
    let two = check(&data, opts(2, 1));
    let many = check(&data, opts(7, 1));
    assert_eq!(one, two);
    assert_eq!(one, many);
}

#[test]
fn byte_at_a_time_test() {
    let data = text(20_000);
    let mut enc = ParallelBzEncoder::new(Vec::new(), opts(2, 1)).unwrap();
    for &b in &data {
        enc.write_byte(b).unwrap();
    }
    let out = enc.finish().unwrap();
    assert_eq!(out, compress(&data, opts(1, 1)).unwrap());
}

#[test]
fn boundary_block_sizes_test() {
    // Exactly one full block
    let data = noise(100_000, 5, true);
    let mut enc = ParallelBzEncoder::new(Vec::new(), opts(2, 1)).unwrap();
    enc.write_bytes(&data).unwrap();
    let (out, stats) = enc.finish_with_stats().unwrap();
    assert_eq!(stats.blocks_written, 1);
    assert_eq!(decompress(&out), data);

    // One byte more spills into a second block
    let data = noise(100_001, 5, true);
    let mut enc = ParallelBzEncoder::new(Vec::new(), opts(2, 1)).unwrap();
    enc.write_bytes(&data).unwrap();
    // The full block has been queued, the single byte is still filling
    assert_eq!(enc.stats().bytes_in, 100_001);
    let (out, stats) = enc.finish_with_stats().unwrap();
    assert_eq!(stats.blocks_written, 2);
    assert_eq!(decompress(&out), data);
}

#[test]
fn randomised_block_test() {
    // RLE1 turns this into one block of "aaaa\xfb" repeated, too repetitive for the first sort attempt
    let data = vec![b'a'; 300_000];
    let mut enc = ParallelBzEncoder::new(Vec::new(), opts(1, 1)).unwrap();
    enc.write_bytes(&data).unwrap();
    let (out, stats) = enc.finish_with_stats().unwrap();
    assert_eq!(stats.blocks_written, 1);
    assert_eq!(stats.randomised_blocks, 1);
    // Header (4), block magic (6) and block crc (4), then the randomised bit
    assert_eq!(out[14] & 0x80, 0x80);
    assert_eq!(decompress(&out), data);
}

#[test]
fn level_nine_repetitive_test() {
    let data = vec![0_u8; 2_000_000];
    let (out, stats) = {
        let mut enc = ParallelBzEncoder::new(Vec::new(), opts(2, 9)).unwrap();
        enc.write_bytes(&data).unwrap();
        enc.finish_with_stats().unwrap()
    };
    assert_eq!(stats.blocks_written, 1);
    assert_eq!(decompress(&out), data);
}
