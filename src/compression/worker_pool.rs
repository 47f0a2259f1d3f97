//! Compression threads.
//!
//! Filled blocks go to the workers over a bounded channel, and compressed blocks (or the error that stopped
//! them) come back over an unbounded one. Workers start on demand, up to the configured maximum. A shared fatal
//! flag stops every worker after the first failure.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TryRecvError, TrySendError};
use log::{debug, error, trace};

use super::block::Block;
use super::compress_block::compress_block;
use crate::error::{Bz2Error, Result};

pub struct WorkerPool {
    /// Filled blocks waiting for a worker. None once the pool has been closed.
    jobs: Option<Sender<Block>>,
    job_queue: Receiver<Block>,
    results_tx: Sender<Result<Block>>,
    results: Receiver<Result<Block>>,
    fatal: Arc<AtomicBool>,
    workers: Vec<JoinHandle<()>>,
    max_workers: usize,
}

impl WorkerPool {
    /// A pool of up to `max_workers` threads with room for `queue_limit` pending blocks. No thread starts
    /// until there is work.
    pub fn new(max_workers: usize, queue_limit: usize) -> Self {
        let (jobs, job_queue) = bounded(queue_limit.max(1));
        let (results_tx, results) = unbounded();
        Self {
            jobs: Some(jobs),
            job_queue,
            results_tx,
            results,
            fatal: Arc::new(AtomicBool::new(false)),
            workers: Vec::with_capacity(max_workers),
            max_workers: max_workers.max(1),
        }
    }

    /// Queue a block for compression. Hands the block back if the queue is full.
    pub fn try_submit(&mut self, block: Block) -> Result<Option<Block>> {
        let jobs = self.jobs.as_ref().ok_or(Bz2Error::StreamFinished)?;
        match jobs.try_send(block) {
            Ok(()) => {
                self.spawn_if_needed()?;
                Ok(None)
            }
            Err(TrySendError::Full(block)) => {
                self.spawn_if_needed()?;
                Ok(Some(block))
            }
            Err(TrySendError::Disconnected(_)) => {
                Err(Bz2Error::Internal("compression queue disconnected"))
            }
        }
    }

    /// Blocks waiting for a worker.
    pub fn queue_depth(&self) -> usize {
        self.job_queue.len()
    }

    /// A finished block or failure, if one is ready.
    pub fn try_result(&self) -> Option<Result<Block>> {
        match self.results.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Wait for the next finished block or failure.
    pub fn wait_result(&self) -> Result<Block> {
        // The pool holds a sender itself, so this only returns once a result arrives.
        self.results
            .recv()
            .map_err(|_| Bz2Error::Internal("result channel disconnected"))?
    }

    /// Tell every worker to stop at its next block.
    pub fn halt(&self) {
        self.fatal.store(true, Ordering::Release);
    }

    pub fn is_halted(&self) -> bool {
        self.fatal.load(Ordering::Acquire)
    }

    /// Threads started so far.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// No more blocks will be submitted. Workers finish the queue and exit.
    pub fn close(&mut self) {
        self.jobs = None;
    }

    /// Close the queue and wait for every worker to exit.
    pub fn join(&mut self) {
        self.close();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                error!("A compression thread exited abnormally.");
            }
        }
    }

    /// Start another worker if blocks are waiting and we are below the maximum.
    fn spawn_if_needed(&mut self) -> Result<()> {
        if self.workers.len() >= self.max_workers || self.job_queue.is_empty() {
            return Ok(());
        }
        let n = self.workers.len();
        let jobs = self.job_queue.clone();
        let results = self.results_tx.clone();
        let fatal = Arc::clone(&self.fatal);
        let handle = thread::Builder::new()
            .name(format!("pbzip2-worker-{}", n))
            .spawn(move || worker_loop(jobs, results, fatal))?;
        debug!("Started compression thread {}.", n);
        self.workers.push(handle);
        Ok(())
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Abandon anything still queued.
        self.halt();
        self.join();
    }
}

/// Compress blocks until the queue is closed and empty, or the pipeline halts.
fn worker_loop(jobs: Receiver<Block>, results: Sender<Result<Block>>, fatal: Arc<AtomicBool>) {
    for mut block in jobs.iter() {
        if fatal.load(Ordering::Acquire) {
            break;
        }
        let id = block.id();
        trace!("\r\x1b[43mCompressing block {}.    \x1b[0m", id);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| compress_block(&mut block)));
        let result = match outcome {
            Ok(Ok(())) => Ok(block),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(Bz2Error::WorkerPanicked),
        };
        if let Err(e) = &result {
            error!("Block {} failed: {}", id, e);
            fatal.store(true, Ordering::Release);
        }
        if results.send(result).is_err() {
            break;
        }
    }
}
