//! The tools module provides the helper stages and settings of the block compressor.
//!
//! The tools are:
//! - cli: Command line interface for the pbzip2 binary.
//! - crc: CRC32 checksum for BZIP2, both block and stream versions.
//! - options: Encoder settings (thread count and block size).
//! - rle1: Run-Length-Encoding phase 1, which also fills each block.
//! - rle2_mtf: Move-To-Front transform and Run-Length-Encoding phase 2 (integrated for speed).
//!
pub mod cli;
pub mod crc;
pub mod options;
pub mod rle1;
pub mod rle2_mtf;
