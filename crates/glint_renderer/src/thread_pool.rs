//! Fixed-size pool of render workers.
//!
//! Workers are spawned once and live as long as the pool. Each frame the
//! caller announces how many jobs it is about to queue with
//! [`ThreadPool::set_task_counter`], queues exactly that many with
//! [`ThreadPool::add_task`], then blocks in [`ThreadPool::wait_for_tasks`]
//! until every one of them has finished.
//!
//! Jobs travel to the workers over a crossbeam channel. The completion
//! counter has its own mutex/condvar pair and is never held while a job runs.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::{Condvar, Mutex};

use crate::error::PoolError;

type Job = Box<dyn FnOnce() + Send + 'static>;

struct Shared {
    /// Set on drop; workers stop claiming jobs once it is raised
    stop: AtomicBool,
    /// Jobs of the current frame that have not completed yet
    task_counter: Mutex<usize>,
    task_counter_condition: Condvar,
}

impl Shared {
    fn complete_one(&self) {
        let mut counter = self.task_counter.lock();
        if *counter == 0 {
            log::warn!("Render job completed with no outstanding task count");
        } else {
            *counter -= 1;
        }
        drop(counter);
        self.task_counter_condition.notify_all();
    }
}

/// Number of workers used when none is configured.
pub fn default_thread_count() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Fixed-size pool of worker threads.
pub struct ThreadPool {
    shared: Arc<Shared>,
    /// Dropped before joining so idle workers see a disconnected queue
    jobs: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl ThreadPool {
    /// Spawn `num_threads` workers (at least one).
    pub fn new(num_threads: usize) -> Result<Self, PoolError> {
        let num_threads = num_threads.max(1);
        let (sender, receiver) = unbounded::<Job>();
        let mut pool = Self {
            shared: Arc::new(Shared {
                stop: AtomicBool::new(false),
                task_counter: Mutex::new(0),
                task_counter_condition: Condvar::new(),
            }),
            jobs: Some(sender),
            workers: Vec::with_capacity(num_threads),
        };

        for index in 0..num_threads {
            let shared = Arc::clone(&pool.shared);
            let receiver = receiver.clone();
            // On error `pool` is dropped, which stops and joins the workers spawned so far
            let handle = thread::Builder::new()
                .name(format!("glint-worker-{index}"))
                .spawn(move || worker_loop(&receiver, &shared))?;
            pool.workers.push(handle);
        }

        log::info!("Thread pool started with {} workers", num_threads);
        Ok(pool)
    }

    /// Spawn one worker per available hardware thread.
    pub fn with_default_size() -> Result<Self, PoolError> {
        Self::new(default_thread_count())
    }

    /// Queue a job for the next free worker.
    pub fn add_task<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let sent = match &self.jobs {
            Some(jobs) => jobs.send(Box::new(job)).is_ok(),
            None => false,
        };
        if !sent {
            // Count it as done so `wait_for_tasks` cannot hang
            log::error!("Render job dropped, no worker is listening");
            self.shared.complete_one();
        }
    }

    /// Announce how many jobs the upcoming frame will queue.
    ///
    /// Must be called once per frame, before the first `add_task` of that
    /// frame, and the frame must queue exactly `count` jobs. The pool does
    /// not check this.
    pub fn set_task_counter(&self, count: usize) {
        *self.shared.task_counter.lock() = count;
    }

    /// Block until every announced job has completed.
    pub fn wait_for_tasks(&self) {
        let mut counter = self.shared.task_counter.lock();
        while *counter > 0 {
            self.shared.task_counter_condition.wait(&mut counter);
        }
    }

    pub fn num_threads(&self) -> usize {
        self.workers.len()
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shared.stop.store(true, Ordering::Release);
        drop(self.jobs.take());

        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                log::error!("Render worker exited abnormally");
            }
        }
        log::debug!("Thread pool stopped");
    }
}

fn worker_loop(jobs: &Receiver<Job>, shared: &Shared) {
    // Ends once the pool drops its sender and the queue is empty
    for job in jobs.iter() {
        if shared.stop.load(Ordering::Acquire) {
            // Unclaimed jobs are abandoned
            return;
        }

        if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
            log::error!(
                "Render job panicked on {}",
                thread::current().name().unwrap_or("unnamed worker")
            );
        }
        shared.complete_one();
    }
}
