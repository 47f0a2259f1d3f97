//! Encoder configuration.

/// Fewest and most compression threads allowed.
pub const MIN_THREADS: usize = 1;
pub const MAX_THREADS: usize = 128;
/// Block size levels; level n means blocks of n x 100k.
pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 9;
/// Bytes of block capacity per level.
pub const LEVEL_CAPACITY: usize = 100_000;
/// Pending blocks allowed per compression thread before the writer waits.
pub const QUEUE_BLOCKS_PER_THREAD: usize = 10;

/// Settings fixed when an encoder is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncoderOptions {
    /// Maximum number of compression threads
    threads: usize,
    /// Block size level, 1-9
    level: u8,
}

impl EncoderOptions {
    /// Defaults: one thread per logical core, and the largest blocks.
    pub fn new() -> Self {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            threads: cores.clamp(MIN_THREADS, MAX_THREADS),
            level: MAX_LEVEL,
        }
    }

    /// Set the maximum number of compression threads, clamped to 1-128.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.clamp(MIN_THREADS, MAX_THREADS);
        self
    }

    /// Set the block size level, clamped to 1-9.
    pub fn with_level(mut self, level: u8) -> Self {
        self.level = level.clamp(MIN_LEVEL, MAX_LEVEL);
        self
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    /// Most RLE1 encoded bytes a block may hold.
    pub fn block_capacity(&self) -> usize {
        LEVEL_CAPACITY * self.level as usize
    }

    /// Most blocks waiting for a compression thread.
    pub fn queue_limit(&self) -> usize {
        QUEUE_BLOCKS_PER_THREAD * self.threads
    }
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn clamp_test() {
        let opts = EncoderOptions::new().with_threads(0).with_level(0);
        assert_eq!(opts.threads(), 1);
        assert_eq!(opts.level(), 1);
        let opts = opts.with_threads(1000).with_level(12);
        assert_eq!(opts.threads(), 128);
        assert_eq!(opts.level(), 9);
    }

    #[test]
    fn derived_sizes_test() {
        let opts = EncoderOptions::default().with_threads(4).with_level(3);
        assert_eq!(opts.block_capacity(), 300_000);
        assert_eq!(opts.queue_limit(), 40);
    }

    #[test]
    fn default_test() {
        let opts = EncoderOptions::default();
        assert_eq!(opts.level(), 9);
        assert!(opts.threads() >= 1 && opts.threads() <= 128);
    }
}
