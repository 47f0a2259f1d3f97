//! This helper is part of the huffman encoding system.
//!
//! The main huffman encoding function gathers symbol frequencies for each coding table from the 50 symbol groups
//! that table won. This helper turns those frequencies into code lengths (depths in a huffman tree). BZIP2 decoders
//! accept codes of at most 20 bits. If the frequencies supplied create longer codes, they are flattened and another
//! attempt is made.
//!
//! The tree is never materialised. Nodes live in flat weight and parent arrays, merged through a binary min-heap,
//! and a leaf's depth is found by walking its parents up to the root.
//!
use std::cmp::Reverse;
use std::collections::BinaryHeap;

use log::trace;

use crate::error::{Bz2Error, Result};

/// Longest code length a bzip2 decoder accepts.
pub const MAX_CODE_LEN: u32 = 20;

/// Replace `lengths[..alpha_size]` with huffman code lengths for `freqs[..alpha_size]`, no longer than
/// MAX_CODE_LEN. Symbols with a frequency of zero are treated as occurring once, so every symbol gets a code.
pub fn improve_code_len_from_weights(
    lengths: &mut [u32],
    freqs: &[u32],
    alpha_size: usize,
) -> Result<()> {
    if alpha_size < 2 || alpha_size > lengths.len() || alpha_size > freqs.len() {
        return Err(Bz2Error::Internal("huffman alphabet size out of range"));
    }
    // Weights keep the frequency in the high 24 bits and the subtree depth in the low 8.
    let mut weight: Vec<u32> = freqs[..alpha_size]
        .iter()
        .map(|&f| f.max(1) << 8)
        .collect();
    weight.resize(alpha_size * 2, 0);
    let mut parent: Vec<Option<usize>> = vec![None; alpha_size * 2];

    let mut attempts = 1;
    loop {
        // Leaves are nodes 0..alpha_size. Ties go to the lower node number.
        let mut heap: BinaryHeap<Reverse<(u32, usize)>> = (0..alpha_size)
            .map(|i| Reverse((weight[i], i)))
            .collect();
        parent.iter_mut().for_each(|p| *p = None);

        let mut n_nodes = alpha_size;
        while heap.len() > 1 {
            let (Some(Reverse((w1, n1))), Some(Reverse((w2, n2)))) = (heap.pop(), heap.pop()) else {
                break;
            };
            parent[n1] = Some(n_nodes);
            parent[n2] = Some(n_nodes);
            weight[n_nodes] = add_weights(w1, w2);
            heap.push(Reverse((weight[n_nodes], n_nodes)));
            n_nodes += 1;
        }

        let mut too_long = false;
        for (i, len) in lengths.iter_mut().take(alpha_size).enumerate() {
            let mut depth = 0;
            let mut k = i;
            while let Some(p) = parent[k] {
                k = p;
                depth += 1;
            }
            *len = depth;
            too_long |= depth > MAX_CODE_LEN;
        }
        if !too_long {
            break;
        }

        // Flatten the frequencies and try again.
        trace!(
            "\r\x1b[43mCodes too long on attempt {}, flattening weights.    \x1b[0m",
            attempts
        );
        for w in weight.iter_mut().take(alpha_size) {
            *w = (1 + (*w >> 8) / 2) << 8;
        }
        attempts += 1;
    }
    Ok(())
}

/// Weight of a parent node: the summed frequencies, and one more than the deeper child.
#[inline(always)]
fn add_weights(a: u32, b: u32) -> u32 {
    let weight_mask: u32 = 0xffffff00;
    let depth_mask: u32 = 0x000000ff;
    ((a & weight_mask) + (b & weight_mask)) | (1 + (a & depth_mask).max(b & depth_mask))
}

/// Build canonical codes from code lengths: shorter codes first, and within a length, lower symbols first.
pub fn assign_codes(lengths: &[u32], alpha_size: usize) -> Vec<u32> {
    let lengths = &lengths[..alpha_size];
    let min_len = lengths.iter().copied().min().unwrap_or(0);
    let max_len = lengths.iter().copied().max().unwrap_or(0);

    let mut codes = vec![0_u32; alpha_size];
    let mut next = 0_u32;
    for n in min_len..=max_len {
        for (code, _) in codes
            .iter_mut()
            .zip(lengths)
            .filter(|(_, len)| **len == n)
        {
            *code = next;
            next += 1;
        }
        next <<= 1;
    }
    codes
}

#[cfg(test)]
mod test {
    use super::*;

    /// A complete prefix code fills the code space exactly.
    fn kraft_sum(lengths: &[u32]) -> u64 {
        lengths.iter().map(|&l| 1_u64 << (MAX_CODE_LEN - l)).sum()
    }

    #[test]
    fn add_weights_test() {
        assert_eq!(add_weights(3 << 8, 5 << 8), (8 << 8) | 1);
        assert_eq!(add_weights((3 << 8) | 2, (5 << 8) | 4), (8 << 8) | 5);
    }

    #[test]
    fn balanced_lengths_test() {
        let mut lengths = [0_u32; 258];
        improve_code_len_from_weights(&mut lengths, &[10; 8], 8).unwrap();
        assert_eq!(&lengths[..8], &[3; 8]);
    }

    #[test]
    fn skewed_lengths_test() {
        let mut lengths = [0_u32; 258];
        improve_code_len_from_weights(&mut lengths, &[100, 50, 25, 25], 4).unwrap();
        assert_eq!(&lengths[..4], &[1, 2, 3, 3]);
    }

    #[test]
    fn zero_frequencies_still_get_codes_test() {
        let mut lengths = [0_u32; 258];
        improve_code_len_from_weights(&mut lengths, &[0, 0, 1000, 0, 0], 5).unwrap();
        assert!(lengths[..5].iter().all(|&l| l >= 1));
        assert_eq!(lengths[2], 1);
        assert_eq!(kraft_sum(&lengths[..5]), 1 << MAX_CODE_LEN);
    }

    #[test]
    fn length_limit_test() {
        // Fibonacci frequencies build the deepest possible tree, 29 levels for 30 symbols
        let mut freqs = vec![1_u32, 1];
        while freqs.len() < 30 {
            let next = freqs[freqs.len() - 1] + freqs[freqs.len() - 2];
            freqs.push(next);
        }
        let mut lengths = [0_u32; 258];
        improve_code_len_from_weights(&mut lengths, &freqs, 30).unwrap();
        let max = *lengths[..30].iter().max().unwrap();
        assert!(max <= MAX_CODE_LEN);
        assert!(lengths[..30].iter().all(|&l| l >= 1));
        assert_eq!(kraft_sum(&lengths[..30]), 1 << MAX_CODE_LEN);
    }

    #[test]
    fn bad_alphabet_test() {
        let mut lengths = [0_u32; 258];
        assert!(improve_code_len_from_weights(&mut lengths, &[1], 1).is_err());
    }

    #[test]
    fn canonical_codes_test() {
        let lengths = [2, 1, 3, 3];
        let codes = assign_codes(&lengths, 4);
        // 1 -> 0, 0 -> 10, 2 -> 110, 3 -> 111
        assert_eq!(codes, vec![0b10, 0b0, 0b110, 0b111]);
    }

    #[test]
    fn prefix_free_test() {
        let freqs: Vec<u32> = (0..40).map(|i| (i * 37 % 11) + 1).collect();
        let mut lengths = [0_u32; 258];
        improve_code_len_from_weights(&mut lengths, &freqs, 40).unwrap();
        let codes = assign_codes(&lengths, 40);
        for a in 0..40 {
            for b in 0..40 {
                if a == b || lengths[a] > lengths[b] {
                    continue;
                }
                // a must not be a prefix of b
                assert_ne!(codes[b] >> (lengths[b] - lengths[a]), codes[a], "{} {}", a, b);
            }
        }
    }
}
