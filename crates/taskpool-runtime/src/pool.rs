//! The pool: construction, dispatch, and graceful shutdown.

use crate::config::PoolOptions;
use crate::error::PoolError;
use crate::tls;
use crate::worker::Worker;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use taskpool_core::FixedTask;

/// How long `post` backs off between full scans while every queue is
/// saturated. Short because liveness comes from any worker draining its
/// queue, not from being woken; this is a poll interval, not a wait for
/// a specific signal.
const BACKPRESSURE_BACKOFF: Duration = Duration::from_micros(50);

/// A fixed set of worker threads, each with its own bounded queue,
/// cooperatively stealing from one another.
///
/// Construct with [`Pool::new`], submit with [`Pool::post`] or
/// [`Pool::try_post`]. Dropping the pool stops and joins every worker
/// thread.
pub struct Pool {
    workers: Arc<[Worker]>,
    next: AtomicUsize,
    backoff: crate::parker::Parker,
}

impl Pool {
    /// Build and start a pool from `options`.
    ///
    /// Fails only if `options` does not validate (an unusable
    /// `worker_queue_capacity`); never panics on caller-supplied
    /// configuration.
    pub fn new(options: PoolOptions) -> Result<Self, PoolError> {
        options.validate()?;

        let thread_count = options.resolved_thread_count();
        let capacity = options.queue_capacity();
        let trace = options.trace_sink();

        let workers: Vec<Worker> = (0..thread_count)
            .map(|id| {
                Worker::new(id, capacity, trace.clone())
                    .expect("queue capacity was validated by PoolOptions::validate")
            })
            .collect();
        let workers: Arc<[Worker]> = workers.into();

        for worker in workers.iter() {
            worker.start(workers.clone());
        }

        Ok(Self {
            workers,
            next: AtomicUsize::new(0),
            backoff: crate::parker::Parker::new(),
        })
    }

    /// Number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Attempt to submit `task` without blocking.
    ///
    /// Dispatches to the caller's own worker queue if the caller is
    /// itself a pool thread; otherwise round-robins. If the first choice
    /// is full, falls back to a single scan of every other worker.
    /// Returns `false` only once every queue has refused the task.
    pub fn try_post(&self, task: FixedTask) -> bool {
        match self.try_post_once(task) {
            Ok(()) => true,
            Err(_task) => false,
        }
    }

    /// The public entry point. Submits `task`, blocking under
    /// backpressure rather than failing: this never drops a task and
    /// never returns [`QueueFull`].
    pub fn post(&self, task: FixedTask) {
        let mut task = task;
        loop {
            match self.try_post_once(task) {
                Ok(()) => return,
                Err(back) => {
                    task = back;
                    self.backoff.park_timeout(BACKPRESSURE_BACKOFF);
                }
            }
        }
    }

    /// One full dispatch attempt: preferred worker, then a scan of every
    /// worker. Returns the task back if every queue refused it.
    fn try_post_once(&self, task: FixedTask) -> Result<(), FixedTask> {
        let preferred = self.preferred_worker();
        match self.workers[preferred].try_post(task) {
            Ok(()) => return Ok(()),
            Err(task) => {
                let n = self.workers.len();
                let mut task = task;
                for step in 0..n {
                    let idx = (preferred + step) % n;
                    if idx == preferred {
                        continue;
                    }
                    match self.workers[idx].try_post(task) {
                        Ok(()) => return Ok(()),
                        Err(back) => task = back,
                    }
                }
                Err(task)
            }
        }
    }

    /// The worker queue a submission should prefer: the caller's own
    /// worker if the caller is a pool thread, otherwise the next
    /// round-robin slot.
    fn preferred_worker(&self) -> usize {
        let id = tls::current_worker_id();
        if id < self.workers.len() {
            return id;
        }
        self.next.fetch_add(1, Ordering::Relaxed) % self.workers.len()
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        for worker in self.workers.iter() {
            worker.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolOptions;
    use std::sync::atomic::AtomicUsize;
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    fn pool(threads: usize, capacity: usize) -> Pool {
        Pool::new(
            PoolOptions::new()
                .thread_count(threads)
                .worker_queue_capacity(capacity),
        )
        .unwrap()
    }

    #[test]
    fn test_invalid_capacity_rejected_without_spawning() {
        let err = Pool::new(PoolOptions::new().worker_queue_capacity(3));
        assert!(err.is_err());
    }

    #[test]
    fn test_single_thread_round_trip() {
        let pool = pool(1, 8);
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..100 {
            let c = counter.clone();
            pool.post(FixedTask::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
            }));
        }
        drop(pool);
        assert_eq!(counter.load(Ordering::SeqCst), 100);
    }

    #[test]
    fn test_self_reposting_chain_runs_on_worker_threads() {
        let pool = Arc::new(pool(4, 1024));
        let counter = Arc::new(AtomicUsize::new(0));
        let target = 2_000usize;
        let on_worker = Arc::new(AtomicUsize::new(0));
        let off_worker = Arc::new(AtomicUsize::new(0));
        let done = Arc::new((Mutex::new(false), std::sync::Condvar::new()));

        fn repost(
            pool: Arc<Pool>,
            counter: Arc<AtomicUsize>,
            target: usize,
            on_worker: Arc<AtomicUsize>,
            off_worker: Arc<AtomicUsize>,
            done: Arc<(Mutex<bool>, std::sync::Condvar)>,
        ) {
            if crate::tls::current_worker_id() < pool.worker_count() {
                on_worker.fetch_add(1, Ordering::SeqCst);
            } else {
                off_worker.fetch_add(1, Ordering::SeqCst);
            }
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            if n < target {
                let pool2 = pool.clone();
                pool.post(FixedTask::new(move || {
                    repost(pool2, counter, target, on_worker, off_worker, done)
                }));
            } else {
                let (lock, cvar) = &*done;
                *lock.lock().unwrap() = true;
                cvar.notify_all();
            }
        }

        let pool2 = pool.clone();
        pool.post(FixedTask::new({
            let counter = counter.clone();
            let on_worker = on_worker.clone();
            let off_worker = off_worker.clone();
            let done = done.clone();
            move || repost(pool2, counter, target, on_worker, off_worker, done)
        }));

        let (lock, cvar) = &*done;
        let mut finished = lock.lock().unwrap();
        while !*finished {
            finished = cvar.wait(finished).unwrap();
        }
        drop(finished);

        assert_eq!(counter.load(Ordering::SeqCst), target);
        assert_eq!(off_worker.load(Ordering::SeqCst), 0);
        assert_eq!(on_worker.load(Ordering::SeqCst), target);
    }

    #[test]
    fn test_backpressure_never_drops_a_task() {
        let pool = Arc::new(pool(1, 2));
        let completed = Arc::new(AtomicUsize::new(0));
        let batch = 200usize;
        let handles: Vec<_> = (0..batch)
            .map(|_| {
                let pool = pool.clone();
                let completed = completed.clone();
                std::thread::spawn(move || {
                    pool.post(FixedTask::new(move || {
                        std::thread::sleep(Duration::from_millis(1));
                        completed.fetch_add(1, Ordering::SeqCst);
                    }));
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let deadline = Instant::now() + Duration::from_secs(10);
        while completed.load(Ordering::SeqCst) < batch && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(completed.load(Ordering::SeqCst), batch);
    }

    #[test]
    fn test_stealing_crosses_worker_boundaries_under_imbalance() {
        let pool = pool(4, 256);
        let executed_on: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));
        let total = 4_000usize;
        for _ in 0..total {
            let executed_on = executed_on.clone();
            pool.try_post(FixedTask::new(move || {
                executed_on
                    .lock()
                    .unwrap()
                    .push(crate::tls::current_worker_id());
            }));
        }
        let deadline = Instant::now() + Duration::from_secs(10);
        while executed_on.lock().unwrap().len() < total && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        let ids = executed_on.lock().unwrap();
        let distinct: std::collections::HashSet<usize> = ids.iter().copied().collect();
        assert!(
            distinct.len() > 1,
            "expected tasks to execute on more than one worker, stealing likely did not occur"
        );
    }

    #[test]
    fn test_affinity_keeps_chained_continuation_on_same_worker() {
        let pool = Arc::new(pool(4, 1024));
        let recorded = Arc::new(AtomicUsize::new(usize::MAX));
        let done = Arc::new((Mutex::new(false), std::sync::Condvar::new()));

        let pool2 = pool.clone();
        let recorded2 = recorded.clone();
        let done2 = done.clone();
        pool.post(FixedTask::new(move || {
            let first_worker = crate::tls::current_worker_id();
            let recorded3 = recorded2.clone();
            let done3 = done2.clone();
            pool2.post(FixedTask::new(move || {
                recorded3.store(crate::tls::current_worker_id(), Ordering::SeqCst);
                let (lock, cvar) = &*done3;
                *lock.lock().unwrap() = true;
                cvar.notify_all();
            }));
            assert_eq!(first_worker, crate::tls::current_worker_id());
        }));

        let (lock, cvar) = &*done;
        let mut finished = lock.lock().unwrap();
        while !*finished {
            finished = cvar.wait(finished).unwrap();
        }
    }

    #[test]
    fn test_graceful_shutdown_waits_for_in_flight_task() {
        let pool = pool(1, 8);
        let completed = Arc::new(AtomicUsize::new(0));
        let c = completed.clone();
        pool.post(FixedTask::new(move || {
            std::thread::sleep(Duration::from_millis(100));
            c.fetch_add(1, Ordering::SeqCst);
        }));
        // Give the worker a moment to pick the task up before we drop.
        std::thread::sleep(Duration::from_millis(10));
        drop(pool);
        assert_eq!(completed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_stop_stop_double_drop_is_a_no_op() {
        let pool = pool(2, 8);
        drop(pool);
    }
}
