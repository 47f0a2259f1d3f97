//! The bwt_algorithms module forms the critical sorting subsystem for the bzip2 block encoder.
//!
//! BZIP2 uses the Burrow-Wheeler Transform (BWT) to prepare data for compression. This transform alters the data in such
//! a way that runs of similar bytes are more likely to occur. This allows for more effective compression.
//!
//! The sort buckets rotations by their first two bytes, then finishes each bucket with a three way radix quicksort
//! that hands small or deep partitions to a shell sort. Sorting tracks how much comparison work it does. A block
//! that needs too much (long repeats) is randomised and sorted again without a limit.
//!
pub mod block_sort;
pub mod main_q_sort3;
pub mod main_simple_sort;
pub mod main_sort;
pub mod randomise;
