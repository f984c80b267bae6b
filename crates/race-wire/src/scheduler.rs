//! Dual priority-queue scheduler: a staging queue of relative (`after`)
//! events and an active queue of absolute (`when`) events, serviced either
//! synchronously (drain now) or by a background worker thread that sleeps
//! until the next event is due.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use parking_lot::{Condvar, Mutex};

pub type Action = Box<dyn FnOnce() + Send + 'static>;

const KEEP_ALIVE_PARK: StdDuration = StdDuration::from_secs(10);

struct RelativeEvent {
    after: Duration,
    seq: u64,
    action: Action,
}

struct AbsoluteEvent {
    when: DateTime<Utc>,
    seq: u64,
    action: Action,
}

// Ordered by time ascending, sequence as tiebreaker, wrapped so a
// `BinaryHeap` (a max-heap) pops the earliest event first.
impl PartialEq for RelativeEvent {
    fn eq(&self, other: &Self) -> bool {
        self.after == other.after && self.seq == other.seq
    }
}
impl Eq for RelativeEvent {}
impl PartialOrd for RelativeEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for RelativeEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .after
            .cmp(&self.after)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialEq for AbsoluteEvent {
    fn eq(&self, other: &Self) -> bool {
        self.when == other.when && self.seq == other.seq
    }
}
impl Eq for AbsoluteEvent {}
impl PartialOrd for AbsoluteEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for AbsoluteEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        other.when.cmp(&self.when).then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Default)]
struct Queues {
    staging: BinaryHeap<RelativeEvent>,
    active: BinaryHeap<AbsoluteEvent>,
}

/// Thread-backed scheduler. All mutating operations take the internal
/// monitor (`state` + `signal`); the worker reads the active queue under
/// the monitor, then drops it before sleeping and firing, so actions may
/// re-enter [`EventScheduler::schedule_after`]/[`schedule_at`] without
/// deadlocking (they must not call back into `process_events_sync`/`wait_for_completion`
/// from inside an action, since those block on the same monitor).
pub struct EventScheduler {
    state: Arc<Mutex<Queues>>,
    signal: Arc<Condvar>,
    seq: AtomicU64,
    worker: Mutex<Option<JoinHandle<()>>>,
    worker_done: Arc<(Mutex<bool>, Condvar)>,
}

impl EventScheduler {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(Queues::default())),
            signal: Arc::new(Condvar::new()),
            seq: AtomicU64::new(0),
            worker: Mutex::new(None),
            worker_done: Arc::new((Mutex::new(true), Condvar::new())),
        }
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, AtomicOrdering::Relaxed)
    }

    /// Stage an event to fire `after` elapses relative to the next
    /// `process_events_sync`/`process_events_async` base time.
    pub fn schedule_after(&self, after: Duration, action: Action) {
        let seq = self.next_seq();
        let mut q = self.state.lock();
        q.staging.push(RelativeEvent { after, seq, action });
        self.signal.notify_all();
    }

    /// Schedule an event to fire at an absolute time.
    pub fn schedule_at(&self, when: DateTime<Utc>, action: Action) {
        let seq = self.next_seq();
        let mut q = self.state.lock();
        q.active.push(AbsoluteEvent { when, seq, action });
        self.signal.notify_all();
    }

    /// Clear both queues without firing or interrupting any action already
    /// in flight.
    pub fn purge(&self) {
        let mut q = self.state.lock();
        q.staging.clear();
        q.active.clear();
    }

    pub fn pending_count(&self) -> usize {
        let q = self.state.lock();
        q.staging.len() + q.active.len()
    }

    fn promote_staged(q: &mut Queues, base: DateTime<Utc>) {
        while let Some(ev) = q.staging.pop() {
            q.active.push(AbsoluteEvent {
                when: base + ev.after,
                seq: ev.seq,
                action: ev.action,
            });
        }
    }

    /// Move every staged relative event into the active queue anchored at
    /// `base`, then fire every active event in ascending `when` order,
    /// without waiting for wall-clock time to catch up. Blocks until both
    /// queues are empty.
    pub fn process_events_sync(&self, base: DateTime<Utc>) {
        loop {
            let next = {
                let mut q = self.state.lock();
                Self::promote_staged(&mut q, base);
                q.active.pop()
            };
            match next {
                Some(ev) => (ev.action)(),
                None => break,
            }
        }
    }

    /// Spawn a worker that waits on the monitor's signal, sleeps until the
    /// next active event is due (real wall-clock sleep), fires it, and
    /// loops. On an empty queue it terminates unless `keep_alive`, in which
    /// case it parks for 10s before rechecking.
    pub fn process_events_async(&mut self, base: DateTime<Utc>, keep_alive: bool) {
        {
            let mut q = self.state.lock();
            Self::promote_staged(&mut q, base);
        }
        let state = Arc::clone(&self.state);
        let signal = Arc::clone(&self.signal);
        let done = Arc::clone(&self.worker_done);
        *done.0.lock() = false;

        let handle = std::thread::spawn(move || {
            loop {
                let next = {
                    let mut q = state.lock();
                    loop {
                        if let Some(ev) = q.active.pop() {
                            break Some(ev);
                        }
                        if !keep_alive {
                            break None;
                        }
                        let timed_out = signal.wait_for(&mut q, KEEP_ALIVE_PARK).timed_out();
                        if timed_out && q.active.is_empty() {
                            break None;
                        }
                    }
                };
                match next {
                    Some(ev) => {
                        let now = Utc::now();
                        if ev.when > now {
                            let wait = (ev.when - now).to_std().unwrap_or(StdDuration::ZERO);
                            std::thread::sleep(wait);
                        }
                        (ev.action)();
                    }
                    None => break,
                }
            }
            let (lock, cvar) = &*done;
            *lock.lock() = true;
            cvar.notify_all();
        });
        *self.worker.lock() = Some(handle);
    }

    /// Block until the background worker (if any) has exited, or `timeout`
    /// elapses. Returns `true` if the worker completed.
    pub fn wait_for_completion(&self, timeout: StdDuration) -> bool {
        let (lock, cvar) = &*self.worker_done;
        let mut done = lock.lock();
        if !*done {
            let result = cvar.wait_for(&mut done, timeout);
            if result.timed_out() && !*done {
                return false;
            }
        }
        if let Some(handle) = self.worker.lock().take() {
            let _ = handle.join();
        }
        true
    }
}

impl Default for EventScheduler {
    fn default() -> Self {
        Self::new()
    }
}
