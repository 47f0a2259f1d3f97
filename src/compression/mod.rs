//! The compression module manages the compression side of the multi-threaded bzip2 encoder.
//!
//! BZIP2 compression happens in the following steps:
//! - Run Length Encoding 1: Compress all runs of 4-255 identical bytes. This stage also decides where each block ends.
//! - Burrow Wheeler Transform: Sort the data to increase the probability of runs of identical bytes.
//! - Move To Front transform: Increase the frequency of lower byte values, and thereby decrease the frequency of other byte values.
//! - Run Length Encoding 2: Compress all runs of the zero byte.
//! - Huffman coding: Encode frequent byte values using smaller bit codes and less frequent byte values with longer bit codes.
//!
//! While the initial RLE1 compression is probably not necessary, it is a legacy of the first bzip2 format and must be preserved.
//!
//! Every step after RLE1 works on one block alone, so blocks are compressed in parallel on a pool of worker threads
//! (worker_pool). The encoder (compress) fills the blocks, feeds the pool, and writes the compressed blocks out in their
//! input order.
//!
pub mod block;
pub mod compress;
pub mod compress_block;
pub mod worker_pool;
