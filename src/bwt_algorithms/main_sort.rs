use log::{debug, trace};

use super::main_q_sort3::main_q_sort3;
use super::main_simple_sort::main_simple_sort;
use crate::error::{Bz2Error, Result};
use crate::tools::rle1::OVERSHOOT;

/// Marks a two byte bucket in the frequency table as sorted.
const SETMASK: u32 = 1 << 21;
const CLEARMASK: u32 = !SETMASK;
/// Blocks up to this size skip the bucket machinery and go straight to the simple sort.
const SIMPLE_SORT_LIMIT: usize = 4000;

/// Working state of the block sort, shared by the main sort, the quicksort and the simple sort.
#[derive(Debug)]
pub struct QsortData {
    /// The block, followed by OVERSHOOT bytes copied cyclically from its start.
    pub block: Vec<u8>,
    /// Sort rank hints for each position, with the same overshoot as the block.
    pub quadrant: Vec<u16>,
    /// Rotation start positions, in sorted order once the sort is done.
    pub zptr: Vec<u32>,
    /// Length of the block.
    pub end: usize,
    /// Comparison work done so far.
    pub work_done: u64,
    /// Work allowed before the first attempt gives up.
    pub work_limit: u64,
    /// True until the block has been given up on once (or was never at risk).
    pub first_attempt: bool,
}

impl QsortData {
    /// Set up the sort for a non-empty block.
    pub fn new(mut block: Vec<u8>, work_factor: u64) -> Self {
        let end = block.len();
        block.resize(end + OVERSHOOT, 0);
        Self {
            block,
            quadrant: vec![0; end + OVERSHOOT],
            zptr: vec![0; end],
            end,
            work_done: 0,
            work_limit: work_factor * end as u64,
            first_attempt: true,
        }
    }

    /// True once the first attempt has run past its work limit.
    #[inline(always)]
    pub fn exhausted(&self) -> bool {
        self.first_attempt && self.work_done > self.work_limit
    }

    /// The byte before `pos`, wrapping at the start of the block.
    #[inline(always)]
    pub fn prev_byte(&self, pos: usize) -> u8 {
        self.block[self.prev_pos(pos)]
    }

    #[inline(always)]
    fn prev_pos(&self, pos: usize) -> usize {
        if pos == 0 {
            self.end - 1
        } else {
            pos - 1
        }
    }

    /// Refresh the overshoot from the (possibly randomised) block and clear the quadrants.
    fn prepare(&mut self) {
        for i in 0..OVERSHOOT {
            self.block[self.end + i] = self.block[i % self.end];
        }
        self.quadrant.iter_mut().for_each(|q| *q = 0);
    }
}

/// Sort all rotations of the block into qs.zptr. Returns early, leaving zptr unusable, if the first attempt
/// runs out of work budget; the caller checks qs.exhausted().
pub fn main_sort(qs: &mut QsortData) -> Result<()> {
    let end = qs.end;
    let last = end - 1;
    qs.prepare();

    if end <= SIMPLE_SORT_LIMIT {
        // Small blocks are cheap enough to sort without a budget
        qs.zptr
            .iter_mut()
            .enumerate()
            .for_each(|(i, z)| *z = i as u32);
        qs.first_attempt = false;
        qs.work_done = 0;
        qs.work_limit = 0;
        main_simple_sort(qs, 0, last as i32, 0);
        return Ok(());
    }

    // Count every two byte bucket, including the pair that wraps from the end to the start.
    let mut ftab = vec![0_u32; 65537];
    let mut c1 = qs.block[last] as usize;
    for i in 0..end {
        let c2 = qs.block[i] as usize;
        ftab[(c1 << 8) + c2] += 1;
        c1 = c2;
    }
    for i in 1..ftab.len() {
        ftab[i] += ftab[i - 1];
    }

    // Drop each rotation into its bucket. Afterwards ftab holds the first slot of every bucket.
    let mut c1 = qs.block[0] as usize;
    for i in 0..last {
        let c2 = qs.block[i + 1] as usize;
        let j = (c1 << 8) + c2;
        c1 = c2;
        ftab[j] -= 1;
        qs.zptr[ftab[j] as usize] = i as u32;
    }
    let j = ((qs.block[last] as usize) << 8) + qs.block[0] as usize;
    ftab[j] -= 1;
    qs.zptr[ftab[j] as usize] = last as u32;

    // Running order: big buckets from smallest to largest.
    let big_size = |ftab: &[u32], b: usize| ftab[(b + 1) << 8] - ftab[b << 8];
    let mut running_order: [usize; 256] = core::array::from_fn(|i| i);
    for h in [121, 40, 13, 4, 1] {
        for i in h..256 {
            let vv = running_order[i];
            let mut j = i;
            while big_size(&ftab, running_order[j - h]) > big_size(&ftab, vv) {
                running_order[j] = running_order[j - h];
                j -= h;
                if j < h {
                    break;
                }
            }
            running_order[j] = vv;
        }
    }

    let mut big_done = [false; 256];
    let mut copy = [0_u32; 256];
    let mut num_q_sorted = 0;

    for (i, &ss) in running_order.iter().enumerate() {
        // Step 1: complete big bucket [ss] by quicksorting any small bucket [ss, j] not already done.
        for j in 0..256 {
            let sb = (ss << 8) + j;
            if ftab[sb] & SETMASK == 0 {
                let lo = (ftab[sb] & CLEARMASK) as i32;
                let hi = (ftab[sb + 1] & CLEARMASK) as i32 - 1;
                if hi > lo {
                    main_q_sort3(qs, lo, hi, 2)?;
                    num_q_sorted += hi - lo + 1;
                    if qs.exhausted() {
                        debug!(
                            "    main sort gave up: work {} over limit {}, {} of {} sorted",
                            qs.work_done, qs.work_limit, num_q_sorted, end
                        );
                        return Ok(());
                    }
                }
                ftab[sb] |= SETMASK;
            }
        }

        // Step 2: record the rank of every rotation in this bucket as its quadrant value, so later
        // comparisons can stop early. Pointless for the last bucket.
        big_done[ss] = true;
        if i < 255 {
            let bb_start = (ftab[ss << 8] & CLEARMASK) as usize;
            let bb_size = (ftab[(ss + 1) << 8] & CLEARMASK) as usize - bb_start;
            let mut shifts = 0;
            while (bb_size >> shifts) > 65534 {
                shifts += 1;
            }
            for j in 0..bb_size {
                let a2_update = qs.zptr[bb_start + j] as usize;
                let q_val = (j >> shifts) as u16;
                qs.quadrant[a2_update] = q_val;
                if a2_update < OVERSHOOT {
                    qs.quadrant[a2_update + end] = q_val;
                }
            }
            if (bb_size.saturating_sub(1) >> shifts) > 65535 {
                return Err(Bz2Error::Internal("quadrant value overflow in main sort"));
            }
        }

        // Step 3: scan this big bucket to synthesise the sorted order of small buckets [t, ss] for every t
        // not yet done.
        for (t, c) in copy.iter_mut().enumerate() {
            *c = ftab[(t << 8) + ss] & CLEARMASK;
        }
        let bb_lo = (ftab[ss << 8] & CLEARMASK) as usize;
        let bb_hi = (ftab[(ss + 1) << 8] & CLEARMASK) as usize;
        for j in bb_lo..bb_hi {
            let prev = qs.prev_pos(qs.zptr[j] as usize);
            let c1 = qs.block[prev] as usize;
            if !big_done[c1] {
                qs.zptr[copy[c1] as usize] = prev as u32;
                copy[c1] += 1;
            }
        }
        for t in 0..256 {
            ftab[(t << 8) + ss] |= SETMASK;
        }
    }
    trace!(
        "\r\x1b[43mMain sort done: {} quicksorted of {}, work {}.    \x1b[0m",
        num_q_sorted,
        end,
        qs.work_done
    );
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    /// Reference order: sort the rotations directly.
    fn naive_rotations(data: &[u8]) -> Vec<Vec<u8>> {
        let n = data.len();
        let mut rots: Vec<Vec<u8>> = (0..n)
            .map(|i| data[i..].iter().chain(&data[..i]).copied().collect())
            .collect();
        rots.sort();
        rots
    }

    fn rotation(data: &[u8], z: u32) -> impl Iterator<Item = &u8> {
        let z = z as usize;
        data[z..].iter().chain(&data[..z])
    }

    /// Every rotation must sort no later than the next one, and zptr must be a permutation.
    fn assert_sorted(qs: &QsortData) {
        let data = &qs.block[..qs.end];
        for pair in qs.zptr.windows(2) {
            assert!(rotation(data, pair[0]).le(rotation(data, pair[1])));
        }
        let mut seen = qs.zptr.clone();
        seen.sort_unstable();
        assert!(seen.iter().enumerate().all(|(i, &z)| i as u32 == z));
    }

    fn pseudo_random(n: usize, seed: u32) -> Vec<u8> {
        let mut x = seed;
        (0..n)
            .map(|_| {
                x ^= x << 13;
                x ^= x >> 17;
                x ^= x << 5;
                (x % 7) as u8 + b'a'
            })
            .collect()
    }

    #[test]
    fn small_block_test() {
        let data = b"abracadabra_banana".to_vec();
        let mut qs = QsortData::new(data.clone(), 50);
        main_sort(&mut qs).unwrap();
        assert!(!qs.exhausted());
        let sorted: Vec<Vec<u8>> = qs
            .zptr
            .iter()
            .map(|&z| rotation(&data, z).copied().collect())
            .collect();
        assert_eq!(sorted, naive_rotations(&data));
    }

    #[test]
    fn single_byte_block_test() {
        let mut qs = QsortData::new(vec![42], 50);
        main_sort(&mut qs).unwrap();
        assert_eq!(qs.zptr, vec![0]);
    }

    #[test]
    fn bucket_sort_path_test() {
        // Above the simple sort limit, with a small alphabet so buckets need real work
        let data = pseudo_random(9000, 12345);
        let mut qs = QsortData::new(data, 50);
        main_sort(&mut qs).unwrap();
        assert!(!qs.exhausted());
        assert_sorted(&qs);
    }

    #[test]
    fn simple_sort_path_test() {
        let data = pseudo_random(4000, 99);
        let mut qs = QsortData::new(data, 50);
        main_sort(&mut qs).unwrap();
        assert!(!qs.first_attempt);
        assert_sorted(&qs);
    }

    #[test]
    fn wide_alphabet_test() {
        // All 256 byte values, so every big bucket is in play
        let mut x = 0x2545_f491_u32;
        let data: Vec<u8> = (0..20_000)
            .map(|_| {
                x = x.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                (x >> 24) as u8
            })
            .collect();
        let mut qs = QsortData::new(data, 50);
        main_sort(&mut qs).unwrap();
        assert!(!qs.exhausted());
        assert_sorted(&qs);
    }

    #[test]
    fn repetitive_block_gives_up_test() {
        // Every rotation of a periodic block compares equal for the whole block length
        let data: Vec<u8> = b"bbbb\xfb".iter().copied().cycle().take(6000).collect();
        let mut qs = QsortData::new(data, 50);
        main_sort(&mut qs).unwrap();
        assert!(qs.exhausted());
    }
}
