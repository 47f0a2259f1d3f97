use log::error;

use super::main_simple_sort::main_simple_sort;
use super::main_sort::QsortData;
use crate::error::{Bz2Error, Result};

/// Frames the quicksort may have pending at once. Real data needs a small fraction of this.
const QSORT_STACK_SIZE: usize = 1000;
/// Ranges smaller than this go to the simple sort.
const SMALL_THRESH: i32 = 20;
/// Partitions deeper than this go to the simple sort.
const DEPTH_THRESH: i32 = 10;

/// Three way radix quicksort of zptr[lo..=hi] on the byte at depth `d`, using an explicit stack of
/// (lo, hi, d) frames.
pub fn main_q_sort3(qs: &mut QsortData, lo: i32, hi: i32, d: i32) -> Result<()> {
    let mut stack: Vec<(i32, i32, i32)> = Vec::with_capacity(QSORT_STACK_SIZE);
    stack.push((lo, hi, d));

    while let Some((lo, hi, d)) = stack.pop() {
        if hi - lo < SMALL_THRESH || d > DEPTH_THRESH {
            main_simple_sort(qs, lo, hi, d);
            if qs.exhausted() {
                return Ok(());
            }
            continue;
        }

        let med = mmed3(
            byte_at(qs, lo, d),
            byte_at(qs, hi, d),
            byte_at(qs, (lo + hi) >> 1, d),
        ) as i32;

        let mut un_lo = lo;
        let mut lt_lo = lo;
        let mut un_hi = hi;
        let mut gt_hi = hi;

        loop {
            while un_lo <= un_hi {
                let n = byte_at(qs, un_lo, d) as i32 - med;
                if n == 0 {
                    qs.zptr.swap(un_lo as usize, lt_lo as usize);
                    lt_lo += 1;
                    un_lo += 1;
                    continue;
                }
                if n > 0 {
                    break;
                }
                un_lo += 1;
            }
            while un_lo <= un_hi {
                let n = byte_at(qs, un_hi, d) as i32 - med;
                if n == 0 {
                    qs.zptr.swap(un_hi as usize, gt_hi as usize);
                    gt_hi -= 1;
                    un_hi -= 1;
                    continue;
                }
                if n < 0 {
                    break;
                }
                un_hi -= 1;
            }
            if un_lo > un_hi {
                break;
            }
            qs.zptr.swap(un_lo as usize, un_hi as usize);
            un_lo += 1;
            un_hi -= 1;
        }

        // Everything matched the median, so look one byte deeper
        if gt_hi < lt_lo {
            stack.push((lo, hi, d + 1));
            continue;
        }

        // Move the equal runs from both ends into the middle
        let n = (lt_lo - lo).min(un_lo - lt_lo);
        mvswap(&mut qs.zptr, lo, un_lo - n, n);
        let m = (hi - gt_hi).min(gt_hi - un_hi);
        mvswap(&mut qs.zptr, un_lo, hi - m + 1, m);

        let n = lo + un_lo - lt_lo - 1;
        let m = hi - (gt_hi - un_hi) + 1;

        if stack.len() + 3 > QSORT_STACK_SIZE {
            error!("Sort stack exhausted at {} frames.", stack.len());
            return Err(Bz2Error::Internal("block sort stack exhausted"));
        }
        stack.push((lo, n, d));
        stack.push((n + 1, m - 1, d + 1));
        stack.push((m, hi, d));
    }
    Ok(())
}

/// Byte `d` places into the rotation at zptr[i].
#[inline(always)]
fn byte_at(qs: &QsortData, i: i32, d: i32) -> u8 {
    qs.block[qs.zptr[i as usize] as usize + d as usize]
}

/// Median of three
fn mmed3(mut a: u8, mut b: u8, c: u8) -> u8 {
    if a > b {
        std::mem::swap(&mut a, &mut b);
    }
    if b > c {
        b = c;
        if a > b {
            b = a;
        }
    }
    b
}

/// Swap the n entries starting at p1 with the n entries starting at p2.
fn mvswap(zptr: &mut [u32], p1: i32, p2: i32, n: i32) {
    for i in 0..n.max(0) {
        zptr.swap((p1 + i) as usize, (p2 + i) as usize);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn mmed3_test() {
        assert_eq!(mmed3(1, 2, 3), 2);
        assert_eq!(mmed3(3, 2, 1), 2);
        assert_eq!(mmed3(2, 3, 1), 2);
        assert_eq!(mmed3(5, 5, 1), 5);
        assert_eq!(mmed3(9, 1, 9), 9);
    }

    #[test]
    fn mvswap_test() {
        let mut v = vec![0, 1, 2, 3, 4, 5];
        mvswap(&mut v, 0, 4, 2);
        assert_eq!(v, vec![4, 5, 2, 3, 0, 1]);
        mvswap(&mut v, 0, 3, 0);
        assert_eq!(v, vec![4, 5, 2, 3, 0, 1]);
    }

    #[test]
    fn q_sort3_test() {
        // Sort a whole 300 byte block from depth 0
        let mut x = 7_u32;
        let data: Vec<u8> = (0..300)
            .map(|_| {
                x = x.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                b"acgt"[(x >> 16) as usize % 4]
            })
            .collect();
        let mut qs = QsortData::new(data.clone(), 50);
        for i in 0..20 {
            qs.block[300 + i] = qs.block[i];
        }
        qs.zptr = (0..300).collect();
        qs.first_attempt = false;
        main_q_sort3(&mut qs, 0, 299, 0).unwrap();

        let rotation = |z: u32| -> Vec<u8> {
            let z = z as usize;
            data[z..].iter().chain(&data[..z]).copied().collect()
        };
        for pair in qs.zptr.windows(2) {
            assert!(rotation(pair[0]) <= rotation(pair[1]));
        }
    }
}
