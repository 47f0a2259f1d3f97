use log::{trace, warn};

use super::main_sort::{main_sort, QsortData};
use super::randomise::randomise_block;
use crate::error::{Bz2Error, Result};

/// Comparison work allowed per block byte before the sort gives up and randomises the block.
pub const WORK_FACTOR: u64 = 50;

/// A block after the Burrows-Wheeler transform.
#[derive(Debug)]
pub struct SortedBlock {
    /// Row of the sorted rotations that holds the unrotated block.
    pub origin_ptr: u32,
    /// Last column of the sorted rotations.
    pub bwt: Vec<u8>,
    /// True if the block was randomised before the final sort.
    pub randomised: bool,
}

/// Primary entry into the BWT sorting system. Receives the RLE1 data of one block and returns the origin
/// pointer and the BWT data. Highly repetitive blocks that blow the work budget are randomised and sorted again.
pub fn block_sort(block: Vec<u8>) -> Result<SortedBlock> {
    if block.is_empty() {
        return Err(Bz2Error::Internal("empty block handed to the sort"));
    }
    let mut qs = QsortData::new(block, WORK_FACTOR);
    main_sort(&mut qs)?;

    let mut randomised = false;
    if qs.exhausted() {
        warn!(
            "    too repetitive; randomising block of {} bytes after {} work",
            qs.end, qs.work_done
        );
        randomise_block(&mut qs.block[..qs.end]);
        qs.work_done = 0;
        qs.work_limit = 0;
        qs.first_attempt = false;
        randomised = true;
        main_sort(&mut qs)?;
    }

    let origin_ptr = qs
        .zptr
        .iter()
        .position(|&z| z == 0)
        .ok_or(Bz2Error::Internal("origin pointer not found after sorting"))?;
    let bwt = qs
        .zptr
        .iter()
        .map(|&z| qs.prev_byte(z as usize))
        .collect();

    trace!(
        "\r\x1b[43mBWT of {} bytes, origin {}, work {}.    \x1b[0m",
        qs.end,
        origin_ptr,
        qs.work_done
    );
    Ok(SortedBlock {
        origin_ptr: origin_ptr as u32,
        bwt,
        randomised,
    })
}
