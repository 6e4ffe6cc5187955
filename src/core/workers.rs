//! Background thread pool for image decoding.
//!
//! Uses work-stealing deques: the frame loop pushes decode jobs into a global
//! injector, idle workers steal from each other.
//!
//! Epoch mechanism: a carousel reset bumps the epoch, so decode jobs queued
//! before the reset are skipped instead of landing in the new collection.

use crossbeam::deque::{Injector, Stealer, Worker};
use log::trace;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Worker pool with work-stealing and epoch-based cancellation.
///
/// # Example
/// ```ignore
/// let workers = Workers::new(2);
/// let epoch = workers.current_epoch();
/// workers.execute_with_epoch(epoch, move || {
///     // decode on a worker thread
/// });
/// ```
pub struct Workers {
    injector: Arc<Injector<Job>>,
    handles: Vec<thread::JoinHandle<()>>,
    current_epoch: Arc<AtomicU64>,
    shutdown: Arc<AtomicBool>,
}

impl Workers {
    /// Spawn `num_threads` workers (at least one).
    pub fn new(num_threads: usize) -> Self {
        let num_threads = num_threads.max(1);
        let injector: Arc<Injector<Job>> = Arc::new(Injector::new());
        let shutdown = Arc::new(AtomicBool::new(false));

        let locals: Vec<Worker<Job>> = (0..num_threads).map(|_| Worker::new_fifo()).collect();
        let stealers: Vec<Stealer<Job>> = locals.iter().map(Worker::stealer).collect();

        let mut handles = Vec::with_capacity(num_threads);
        for (worker_id, local) in locals.into_iter().enumerate() {
            let injector = Arc::clone(&injector);
            let shutdown = Arc::clone(&shutdown);
            let stealers = stealers.clone();

            let spawned = thread::Builder::new()
                .name(format!("carousel-decode-{}", worker_id))
                .spawn(move || worker_loop(worker_id, local, injector, stealers, shutdown));

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => log::error!("Failed to spawn decode worker {}: {}", worker_id, e),
            }
        }

        trace!("Workers initialized: {} threads", handles.len());

        Self {
            injector,
            handles,
            current_epoch: Arc::new(AtomicU64::new(0)),
            shutdown,
        }
    }

    /// Number of live worker threads
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Run `f` on a worker thread, no epoch check.
    pub fn execute<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.injector.push(Box::new(f));
    }

    pub fn current_epoch(&self) -> u64 {
        self.current_epoch.load(Ordering::Acquire)
    }

    /// Invalidate every job queued so far. Returns the new epoch.
    pub fn bump_epoch(&self) -> u64 {
        self.current_epoch.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Run `f` only if the epoch is still `epoch` when a worker picks it up.
    pub fn execute_with_epoch<F>(&self, epoch: u64, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let current_epoch = Arc::clone(&self.current_epoch);
        self.injector.push(Box::new(move || {
            if current_epoch.load(Ordering::Acquire) == epoch {
                f();
            }
        }));
    }
}

fn worker_loop(
    worker_id: usize,
    local: Worker<Job>,
    injector: Arc<Injector<Job>>,
    stealers: Vec<Stealer<Job>>,
    shutdown: Arc<AtomicBool>,
) {
    trace!("Worker {} started", worker_id);
    loop {
        if let Some(job) = local.pop() {
            job();
            continue;
        }
        if let Some(job) = injector.steal_batch_and_pop(&local).success() {
            job();
            continue;
        }
        if let Some(job) = stealers.iter().find_map(|s| s.steal().success()) {
            job();
            continue;
        }
        if shutdown.load(Ordering::Relaxed) {
            break;
        }
        // Idle: short sleep instead of spinning
        thread::sleep(std::time::Duration::from_millis(1));
    }
    trace!("Worker {} stopped", worker_id);
}

impl Drop for Workers {
    fn drop(&mut self) {
        use std::time::{Duration, Instant};

        self.shutdown.store(true, Ordering::SeqCst);
        // Decodes are short; don't block exit on a huge image
        let deadline = Instant::now() + Duration::from_millis(500);
        for handle in std::mem::take(&mut self.handles) {
            while !handle.is_finished() {
                if Instant::now() >= deadline {
                    trace!("Worker shutdown timeout reached");
                    return;
                }
                thread::sleep(Duration::from_millis(1));
            }
            let _ = handle.join();
        }
    }
}
