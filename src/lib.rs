//! Multi-threaded bzip2 compressor.
//!
//! Version 0.1.0
//!
//! Produces standard bzip2 streams that any bzip2 decoder can read. Input is cut into blocks of 100k-900k
//! (after the first run-length stage), and each block is compressed on its own thread: Burrows-Wheeler sort,
//! move-to-front and zero run coding, then multi-table huffman coding. Compressed blocks are written out in
//! input order, so the output does not depend on the number of threads.
//!
//! Basic usage:
//!
//! ```no_run
//! use std::io::Write;
//! use pbzip2::{EncoderOptions, ParallelBzEncoder};
//!
//! let file = std::fs::File::create("test.txt.bz2")?;
//! let mut encoder = ParallelBzEncoder::new(file, EncoderOptions::default().with_level(9))?;
//! encoder.write_all(b"hello, world")?;
//! encoder.finish()?;
//! # Ok::<(), pbzip2::Bz2Error>(())
//! ```
//!
//! The `pbzip2` binary wraps this for files: `$> pbzip2 -k test.txt` creates test.txt.bz2.
//!
pub mod bitstream;
pub mod bwt_algorithms;
pub mod compression;
pub mod error;
pub mod huffman_coding;
pub mod tools;

pub use compression::compress::{compress, EncoderStats, ParallelBzEncoder};
pub use error::{Bz2Error, Result};
pub use tools::options::EncoderOptions;
