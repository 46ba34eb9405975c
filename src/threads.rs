//! Fixed-size worker thread pool.
//!
//! Workers pull boxed closures from a shared FIFO queue guarded by a mutex and
//! condition variable. [`FixedThreadPool::submit`] returns a [`TaskHandle`]
//! that blocks on the task's result.
//!
//! [`FixedThreadPool::shutdown`] clears the `working` flag and wakes every
//! worker; later submissions fail with [`ThreadPoolError::ShutDown`]. Workers
//! drain the queue before they exit, so every task submitted before the
//! shutdown still runs to completion. Dropping the pool shuts it down and
//! joins the workers.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace};

use crate::error::ThreadPoolError;

type Job = Box<dyn FnOnce() + Send + 'static>;

struct Queue {
    jobs: VecDeque<Job>,
    working: bool,
}

struct Shared {
    queue: Mutex<Queue>,
    available: Condvar,
}

/// A pool with a fixed number of worker threads.
pub struct FixedThreadPool {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

/// Number of workers matching the available hardware parallelism (at least 1).
pub fn default_thread_count() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .max(1)
}

impl Default for FixedThreadPool {
    fn default() -> Self {
        Self::new(default_thread_count())
    }
}

impl FixedThreadPool {
    /// Spawn a pool of `thread_count` workers (at least one).
    pub fn new(thread_count: usize) -> Self {
        let thread_count = thread_count.max(1);
        let shared = Arc::new(Shared {
            queue: Mutex::new(Queue {
                jobs: VecDeque::new(),
                working: true,
            }),
            available: Condvar::new(),
        });
        let workers = (0..thread_count)
            .map(|_| {
                let shared = Arc::clone(&shared);
                thread::spawn(move || worker_loop(&shared))
            })
            .collect();
        debug!(threads = thread_count, "thread pool started");
        Self { shared, workers }
    }

    /// Number of worker threads.
    pub fn thread_count(&self) -> usize {
        self.workers.len()
    }

    /// Whether the pool still accepts work.
    pub fn is_active(&self) -> bool {
        self.shared.queue.lock().working
    }

    /// Queue a closure and wake one worker.
    pub fn submit<F, T>(&self, task: F) -> TaskHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = mpsc::sync_channel(1);
        let job: Job = Box::new(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(task));
            // The handle may have been dropped; nobody is waiting then.
            let _ = tx.send(result.map_err(|_| ThreadPoolError::TaskPanicked));
        });
        let mut queue = self.shared.queue.lock();
        if queue.working {
            queue.jobs.push_back(job);
            self.shared.available.notify_one();
        } else {
            trace!("task rejected by stopped pool");
        }
        TaskHandle { rx }
    }

    /// Stop accepting work and wake every worker.
    ///
    /// Queued tasks still run; tasks submitted afterwards are dropped and
    /// their handles report `ShutDown`.
    pub fn shutdown(&self) {
        let mut queue = self.shared.queue.lock();
        if queue.working {
            queue.working = false;
            self.shared.available.notify_all();
            debug!(pending = queue.jobs.len(), "thread pool shutting down");
        }
    }
}

impl Drop for FixedThreadPool {
    fn drop(&mut self) {
        self.shutdown();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
        debug!("thread pool stopped");
    }
}

fn worker_loop(shared: &Shared) {
    loop {
        let job = {
            let mut queue = shared.queue.lock();
            while queue.jobs.is_empty() && queue.working {
                shared.available.wait(&mut queue);
            }
            match queue.jobs.pop_front() {
                Some(job) => job,
                None => break,
            }
        };
        job();
    }
    trace!("pool worker exiting");
}

/// Pending result of a submitted task.
pub struct TaskHandle<T> {
    rx: Receiver<Result<T, ThreadPoolError>>,
}

impl<T> TaskHandle<T> {
    /// Block until the task finishes.
    ///
    /// # Errors
    /// `TaskPanicked` if the closure panicked, `ShutDown` if the pool was
    /// stopped before the task was queued.
    pub fn join(self) -> Result<T, ThreadPoolError> {
        self.rx.recv().map_err(|_| ThreadPoolError::ShutDown)?
    }
}
