use std::io::{self, Write};
use std::sync::Arc;
use std::thread;

use log::{debug, info, trace};
use rustc_hash::FxHashMap;

use crate::bitstream::bitwriter::BitWriter;
use crate::bitstream::BitSink;
use crate::error::{Bz2Error, Result};
use crate::tools::crc::do_stream_crc;
use crate::tools::options::EncoderOptions;

use super::block::Block;
use super::worker_pool::WorkerPool;

/// End of stream magic, the BCD digits of sqrt(pi).
pub const STREAM_END_MAGIC: u64 = 0x1772_4538_5090;

/// Counters describing the stream written so far.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EncoderStats {
    /// Blocks replayed into the output.
    pub blocks_written: u64,
    /// Of those, blocks the sort had to randomise.
    pub randomised_blocks: u64,
    /// Raw bytes accepted.
    pub bytes_in: u64,
    /// Most blocks ever waiting for a compression thread.
    pub peak_queue_depth: usize,
}

/*
    The writer side fills one block at a time through the RLE1 stage. Each full block goes onto the
    compression queue, and a fresh block takes its place. Workers compress blocks in any order, so
    finished blocks park in a map until every block before them has been written. Only this side ever
    touches the output or the stream crc, which is what keeps both in block order.
*/

/// Multi-threaded bzip2 encoder. Bytes written to it come out of the wrapped writer as a standard
/// bzip2 stream. Call finish() to end the stream and get the writer back; dropping the encoder ends
/// the stream too, but ignores any error.
pub struct ParallelBzEncoder<W: Write> {
    /// The real output. None once the stream is finished.
    out: Option<BitWriter<W>>,
    options: EncoderOptions,
    /// Block being filled. None once the stream is finished.
    current: Option<Block>,
    /// Blocks handed to the pool so far, which is also the id of the current block.
    queued: u64,
    /// Id of the next block to write out.
    next_to_write: u64,
    /// Compressed blocks that arrived ahead of their turn.
    completed: FxHashMap<u64, Block>,
    pool: WorkerPool,
    stream_crc: u32,
    stats: EncoderStats,
    /// First failure. Once set, every call fails with it.
    failure: Option<Arc<Bz2Error>>,
}

impl<W: Write> ParallelBzEncoder<W> {
    /// Start a stream. The BZh header is written to `inner` straight away.
    pub fn new(inner: W, options: EncoderOptions) -> Result<Self> {
        let mut out = BitWriter::new(inner);
        trace!(
            "\r\x1b[43mWriting BZh signature header at {}.    \x1b[0m",
            out.loc()
        );
        out.write_bytes(&[b'B', b'Z', b'h', b'0' + options.level()]);
        out.push_output()?;

        info!(
            "Compressing with blocks of {}00k and up to {} threads.",
            options.level(),
            options.threads()
        );
        Ok(Self {
            out: Some(out),
            current: Some(Block::new(0, options.block_capacity())),
            queued: 0,
            next_to_write: 0,
            completed: FxHashMap::default(),
            pool: WorkerPool::new(options.threads(), options.queue_limit()),
            stream_crc: 0,
            stats: EncoderStats::default(),
            failure: None,
            options,
        })
    }

    /// Add bytes to the stream. Full blocks are queued for compression as they fill, and the call waits
    /// only when the compression queue is full.
    pub fn write_bytes(&mut self, buf: &[u8]) -> Result<()> {
        self.check()?;
        let mut rest = buf;
        while !rest.is_empty() {
            let block = self.current.as_mut().ok_or(Bz2Error::StreamFinished)?;
            let taken = block.write(rest);
            self.stats.bytes_in += taken as u64;
            rest = &rest[taken..];
            if block.is_full() {
                self.queue_current()?;
            }
        }
        Ok(())
    }

    /// Add a single byte to the stream.
    pub fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.write_bytes(&[byte])
    }

    /// Counters for the stream so far.
    pub fn stats(&self) -> EncoderStats {
        self.stats
    }

    pub fn options(&self) -> &EncoderOptions {
        &self.options
    }

    /// The wrapped writer. None once the stream is finished.
    pub fn get_ref(&self) -> Option<&W> {
        self.out.as_ref().map(|out| out.get_ref())
    }

    /// The wrapped writer. Writing to it directly corrupts the stream.
    pub fn get_mut(&mut self) -> Option<&mut W> {
        self.out.as_mut().map(|out| out.get_mut())
    }

    /// End the stream: compress the last partial block, write every block in order, then the footer
    /// with the stream crc. Returns the wrapped writer.
    pub fn finish(self) -> Result<W> {
        self.finish_with_stats().map(|(inner, _)| inner)
    }

    /// finish(), also returning the final counters.
    pub fn finish_with_stats(mut self) -> Result<(W, EncoderStats)> {
        self.finalize()?;
        let inner = self
            .out
            .take()
            .map(|out| out.into_inner())
            .ok_or(Bz2Error::StreamFinished)?;
        Ok((inner, self.stats))
    }

    /// Fail with the first failure, if there was one.
    fn check(&self) -> Result<()> {
        match &self.failure {
            Some(cause) => Err(Bz2Error::Poisoned(Arc::clone(cause))),
            None => Ok(()),
        }
    }

    /// Record a failure, stop the workers, and hand back the poisoned error.
    fn fail(&mut self, e: Bz2Error) -> Bz2Error {
        self.pool.halt();
        let cause = match e {
            Bz2Error::Poisoned(cause) => cause,
            e => Arc::new(e),
        };
        debug!("Compression halted: {}", cause);
        self.failure = Some(Arc::clone(&cause));
        Bz2Error::Poisoned(cause)
    }

    /// Run `f`, poisoning the encoder if it fails.
    fn guard<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.check()?;
        f(self).map_err(|e| self.fail(e))
    }

    /// Hand the current block to the pool and start the next one. Waits, writing out finished blocks,
    /// while the queue is full.
    fn queue_current(&mut self) -> Result<()> {
        let capacity = self.options.block_capacity();
        let Some(block) = self.current.replace(Block::new(self.queued + 1, capacity)) else {
            return Err(Bz2Error::StreamFinished);
        };
        self.submit(block)
    }

    fn submit(&mut self, block: Block) -> Result<()> {
        debug!("Queueing block {} of {} bytes.", block.id(), block.loaded());
        self.guard(|enc| {
            let mut pending = block;
            while let Some(back) = enc.pool.try_submit(pending)? {
                pending = back;
                // Back-pressure: nothing to do but write what is ready
                if !enc.drain_completed()? {
                    thread::yield_now();
                }
            }
            enc.queued += 1;
            enc.stats.peak_queue_depth = enc.stats.peak_queue_depth.max(enc.pool.queue_depth());
            enc.drain_completed().map(|_| ())
        })
    }

    /// Collect finished blocks from the pool and write out any that are next in line. Returns true if
    /// any block came back.
    fn drain_completed(&mut self) -> Result<bool> {
        let mut any = false;
        while let Some(result) = self.pool.try_result() {
            let block = result?;
            self.completed.insert(block.id(), block);
            any = true;
        }
        if self.pool.is_halted() {
            // A worker failed; its error is on the way
            return Ok(any);
        }
        self.write_in_order()?;
        Ok(any)
    }

    /// Replay blocks into the output for as long as the next one in order is ready.
    fn write_in_order(&mut self) -> Result<()> {
        let out = self.out.as_mut().ok_or(Bz2Error::StreamFinished)?;
        while let Some(block) = self.completed.remove(&self.next_to_write) {
            block.recorder().replay(out);
            self.stream_crc = do_stream_crc(self.stream_crc, block.crc());
            self.stats.blocks_written += 1;
            self.stats.randomised_blocks += block.randomised() as u64;
            debug!(
                "Wrote block {}. Block crc is {:#010x}, stream crc is {:#010x}. Output now at {}.",
                block.id(),
                block.crc(),
                self.stream_crc,
                out.loc()
            );
            self.next_to_write += 1;
            out.push_output()?;
        }
        Ok(())
    }

    /// Everything finish() does except giving back the writer.
    fn finalize(&mut self) -> Result<()> {
        self.check()?;
        let last = self.current.take().ok_or(Bz2Error::StreamFinished)?;
        if !last.is_empty() {
            self.submit(last)?;
        }
        self.guard(|enc| {
            enc.pool.close();
            loop {
                enc.write_in_order()?;
                if enc.next_to_write == enc.queued {
                    break;
                }
                let block = enc.pool.wait_result()?;
                enc.completed.insert(block.id(), block);
            }
            enc.pool.join();

            let out = enc.out.as_mut().ok_or(Bz2Error::StreamFinished)?;
            trace!(
                "\r\x1b[43mWriting stream footer at {}.    \x1b[0m",
                out.loc()
            );
            out.write_bits(24, (STREAM_END_MAGIC >> 24) as u32);
            out.write_bits(24, (STREAM_END_MAGIC & 0xff_ffff) as u32);
            out.write_int32(enc.stream_crc);
            out.flush()?;
            info!(
                "Done. {} bytes in {} blocks ({} randomised), stream crc {:#010x}.",
                enc.stats.bytes_in,
                enc.stats.blocks_written,
                enc.stats.randomised_blocks,
                enc.stream_crc
            );
            Ok(())
        })
    }
}

impl<W: Write> Write for ParallelBzEncoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_bytes(buf)?;
        Ok(buf.len())
    }

    /// Write out every block that is ready and flush the wrapped writer. The stream is not ended, and
    /// bits of a trailing partial byte stay behind until more arrive.
    fn flush(&mut self) -> io::Result<()> {
        self.guard(|enc| {
            enc.drain_completed()?;
            let out = enc.out.as_mut().ok_or(Bz2Error::StreamFinished)?;
            out.push_output()?;
            out.get_mut().flush()?;
            Ok(())
        })?;
        Ok(())
    }
}

impl<W: Write> Drop for ParallelBzEncoder<W> {
    fn drop(&mut self) {
        if self.out.is_some() && self.current.is_some() && self.failure.is_none() {
            let _ = self.finalize();
        }
    }
}

/// Compress a whole buffer in one go.
pub fn compress(data: &[u8], options: EncoderOptions) -> Result<Vec<u8>> {
    let mut encoder = ParallelBzEncoder::new(Vec::with_capacity(data.len() / 4 + 64), options)?;
    encoder.write_bytes(data)?;
    encoder.finish()
}
