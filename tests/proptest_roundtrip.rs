use std::io::Read;

use bzip2::read::BzDecoder;
use pbzip2::{compress, EncoderOptions};
use proptest::prelude::*;

fn roundtrip(data: &[u8], threads: usize, level: u8) -> Vec<u8> {
    let options = EncoderOptions::new().with_threads(threads).with_level(level);
    let compressed = compress(data, options).unwrap();
    let mut out = Vec::new();
    BzDecoder::new(&compressed[..])
        .read_to_end(&mut out)
        .unwrap();
    out
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn arbitrary_bytes(data in proptest::collection::vec(any::<u8>(), 0..6000), threads in 1_usize..4, level in 1_u8..=9) {
        prop_assert_eq!(roundtrip(&data, threads, level), data);
    }

    #[test]
    fn small_alphabet(data in proptest::collection::vec(0_u8..3, 0..20_000), threads in 1_usize..4) {
        // Lots of runs and repeats
        prop_assert_eq!(roundtrip(&data, threads, 1), data);
    }

    #[test]
    fn repeated_pattern(pattern in proptest::collection::vec(any::<u8>(), 1..12), copies in 1_usize..3000) {
        let data: Vec<u8> = pattern.iter().copied().cycle().take(pattern.len() * copies).collect();
        prop_assert_eq!(roundtrip(&data, 2, 1), data);
    }
}
