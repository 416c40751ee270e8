//! Ready queue and worker pool.
//!
//! Contracts with pending work sit in a FIFO ready queue, each at most once.
//! A fixed pool of worker threads pops them and runs one turn per pop, so
//! contracts are served round-robin across workers. Whether a contract is
//! already queued or leased is tracked by the engine; this module only
//! moves ids and keeps the bookkeeping `drain` needs.

use parking_lot::{Condvar, Mutex};
use scaf_core::ContractId;
use std::any::Any;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::error;

/// Runs turns on behalf of the pool
pub(crate) trait TurnRunner: Send + Sync + 'static {
    /// Queue the workers pop from
    fn ready(&self) -> &ReadyQueue;

    /// Run one turn of `contract`
    fn run_turn(&self, contract: ContractId);
}

pub(crate) struct ReadyQueue {
    queue: Mutex<VecDeque<ContractId>>,
    work_ready: Condvar,
    drain_cond: Condvar,
    shutdown: AtomicBool,
    queue_depth: AtomicUsize,
    active_turns: AtomicUsize,
}

impl ReadyQueue {
    pub fn new() -> Self {
        ReadyQueue {
            queue: Mutex::new(VecDeque::new()),
            work_ready: Condvar::new(),
            drain_cond: Condvar::new(),
            shutdown: AtomicBool::new(false),
            queue_depth: AtomicUsize::new(0),
            active_turns: AtomicUsize::new(0),
        }
    }

    /// Append a contract at the back
    pub fn push(&self, contract: ContractId) {
        {
            let mut queue = self.queue.lock();
            queue.push_back(contract);
            self.queue_depth.fetch_add(1, Ordering::Release);
        }
        self.work_ready.notify_one();
    }

    /// Block until the queue is empty and no turn is running.
    ///
    /// Workers keep running afterwards.
    pub fn drain(&self) {
        let mut queue = self.queue.lock();
        while self.queue_depth.load(Ordering::Acquire) > 0
            || self.active_turns.load(Ordering::Acquire) > 0
        {
            self.drain_cond.wait(&mut queue);
        }
    }

    /// Tell idle workers to exit once the queue is empty
    pub fn signal_shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);

        // A worker between its shutdown check and its wait holds the lock,
        // so taking it here means the notify cannot be lost.
        let _queue = self.queue.lock();
        self.work_ready.notify_all();
    }

    pub fn depth(&self) -> usize {
        self.queue_depth.load(Ordering::Relaxed)
    }

    pub fn active(&self) -> usize {
        self.active_turns.load(Ordering::Relaxed)
    }

    fn next(&self) -> Option<ContractId> {
        let mut queue = self.queue.lock();
        loop {
            if let Some(contract) = queue.pop_front() {
                self.queue_depth.fetch_sub(1, Ordering::Release);
                self.active_turns.fetch_add(1, Ordering::Release);
                return Some(contract);
            }
            if self.shutdown.load(Ordering::Acquire) {
                return None;
            }
            self.work_ready.wait(&mut queue);
        }
    }
}

/// Decrements `active_turns` and wakes drain waiters, even if the turn panics.
struct ActiveTurnGuard<'a> {
    ready: &'a ReadyQueue,
}

impl Drop for ActiveTurnGuard<'_> {
    fn drop(&mut self) {
        let prev_active = self.ready.active_turns.fetch_sub(1, Ordering::Release);

        // drain() checks its condition under the queue lock; take it so the
        // notify lands either before the check or inside the wait.
        if prev_active == 1 && self.ready.queue_depth.load(Ordering::Acquire) == 0 {
            let _queue = self.ready.queue.lock();
            self.ready.drain_cond.notify_all();
        }
    }
}

/// Fixed set of worker threads
pub(crate) struct WorkerPool {
    workers: Mutex<Vec<JoinHandle<()>>>,
    num_threads: usize,
}

impl WorkerPool {
    /// Start `num_threads` workers named `scaf-worker-0`, `scaf-worker-1`, ...
    pub fn spawn<R: TurnRunner>(num_threads: usize, runner: Arc<R>) -> Self {
        let mut workers = Vec::with_capacity(num_threads);
        for i in 0..num_threads {
            let runner = Arc::clone(&runner);
            let handle = std::thread::Builder::new()
                .name(format!("scaf-worker-{}", i))
                .spawn(move || worker_loop(runner.as_ref()))
                .expect("failed to spawn scaf worker thread");
            workers.push(handle);
        }
        WorkerPool {
            workers: Mutex::new(workers),
            num_threads,
        }
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Join every worker; later calls return immediately
    pub fn join(&self) {
        let mut workers = self.workers.lock();
        for handle in workers.drain(..) {
            let _ = handle.join();
        }
    }
}

fn worker_loop<R: TurnRunner>(runner: &R) {
    let ready = runner.ready();
    while let Some(contract) = ready.next() {
        let _guard = ActiveTurnGuard { ready };

        // Policy panics are handled inside the turn; this only keeps the
        // worker alive if the engine itself faults.
        if let Err(payload) =
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| runner.run_turn(contract)))
        {
            error!(contract = %contract, "turn panicked: {}", panic_message(payload.as_ref()));
        }
    }
}

/// Best-effort text of a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "(non-string panic)".to_string()
    }
}
