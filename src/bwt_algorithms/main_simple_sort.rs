use super::main_sort::QsortData;

/// Knuth's increments. They work better than Incerpi-Sedgewick here, probably because the
/// ranges handed to the simple sort are usually small.
const INCS: [i32; 14] = [
    1, 4, 13, 40, 121, 364, 1093, 3280, 9841, 29524, 88573, 265720, 797161, 2391484,
];

/// Shell sort of zptr[lo..=hi], comparing rotations from depth `d` on. Used for small ranges, deep
/// quicksort partitions, and whole blocks of up to 4000 bytes. Gives up between insertions once the
/// work budget of a first attempt is spent.
pub fn main_simple_sort(qs: &mut QsortData, lo: i32, hi: i32, d: i32) {
    let big_n = hi - lo + 1;
    if big_n < 2 {
        return;
    }
    // Largest increment below the range size
    let top_incr = INCS.iter().position(|&h| h >= big_n).unwrap_or(INCS.len());

    for &h in INCS[..top_incr].iter().rev() {
        let mut i = lo + h;
        while i <= hi {
            // Three insertions between budget checks
            for _ in 0..3 {
                if i > hi {
                    break;
                }
                insert(qs, i, h, lo, d);
                i += 1;
            }
            if qs.exhausted() {
                return;
            }
        }
    }
}

/// Insert zptr[i] into the h-sorted run that ends just before it.
#[inline(always)]
fn insert(qs: &mut QsortData, i: i32, h: i32, lo: i32, d: i32) {
    let QsortData {
        block,
        quadrant,
        zptr,
        end,
        work_done,
        ..
    } = qs;
    let v = zptr[i as usize];
    let mut j = i;
    while main_gtu(
        (zptr[(j - h) as usize] as i32 + d) as usize,
        (v as i32 + d) as usize,
        &block[..],
        &quadrant[..],
        *end,
        work_done,
    ) {
        zptr[j as usize] = zptr[(j - h) as usize];
        j -= h;
        if j < lo + h {
            break;
        }
    }
    zptr[j as usize] = v;
}

/// True if the rotation at `i1` sorts after the rotation at `i2`. Both may start inside the overshoot.
/// Equal rotations (a periodic block) compare as not greater after one full lap.
pub fn main_gtu(
    mut i1: usize,
    mut i2: usize,
    block: &[u8],
    quadrant: &[u16],
    end: usize,
    work_done: &mut u64,
) -> bool {
    macro_rules! check_bd {
        () => {
            if block[i1] != block[i2] {
                return block[i1] > block[i2];
            }
            i1 += 1;
            i2 += 1;
        };
    }
    macro_rules! check_bdq {
        () => {
            if block[i1] != block[i2] {
                return block[i1] > block[i2];
            }
            if quadrant[i1] != quadrant[i2] {
                return quadrant[i1] > quadrant[i2];
            }
            i1 += 1;
            i2 += 1;
        };
    }

    check_bd!();
    check_bd!();
    check_bd!();
    check_bd!();
    check_bd!();
    check_bd!();

    let mut k = end as i64;
    while k >= 0 {
        check_bdq!();
        check_bdq!();
        check_bdq!();
        check_bdq!();

        // Wrap around the end of the block. (The block and quadrant are extended past end.)
        if i1 >= end {
            i1 -= end;
        }
        if i2 >= end {
            i2 -= end;
        }
        k -= 4;
        *work_done += 1;
    }
    false
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn gtu_test() {
        let qs = QsortData::new(b"banana".to_vec(), 50);
        let mut work = 0;
        let mut block = qs.block.clone();
        // The overshoot is normally filled in by the main sort
        for i in 0..20 {
            block[6 + i] = block[i % 6];
        }
        // "nanaba" > "banana"
        assert!(main_gtu(2, 0, &block, &qs.quadrant, 6, &mut work));
        assert!(!main_gtu(0, 2, &block, &qs.quadrant, 6, &mut work));
        // "ananab" > "anaban"
        assert!(main_gtu(1, 3, &block, &qs.quadrant, 6, &mut work));
        assert!(!main_gtu(3, 1, &block, &qs.quadrant, 6, &mut work));
    }

    #[test]
    fn equal_rotations_count_work_test() {
        let block = vec![7_u8; 100 + 20];
        let quadrant = vec![0_u16; 120];
        let mut work = 0;
        assert!(!main_gtu(0, 50, &block, &quadrant, 100, &mut work));
        // One unit per four bytes compared, over a full lap
        assert_eq!(work, 26);
    }

    #[test]
    fn simple_sort_test() {
        let data = b"mississippi".to_vec();
        let mut qs = QsortData::new(data, 50);
        for i in 0..20 {
            qs.block[11 + i] = qs.block[i % 11];
        }
        qs.zptr = (0..11).collect();
        qs.first_attempt = false;
        main_simple_sort(&mut qs, 0, 10, 0);
        // Sorted rotations of "mississippi"
        assert_eq!(qs.zptr, vec![10, 7, 4, 1, 0, 9, 8, 6, 3, 5, 2]);
    }
}
