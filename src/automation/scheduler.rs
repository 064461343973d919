//! Single-threaded task scheduler.
//!
//! Holds the due times of the action cycle, the mining check and the
//! docking one-shots. The controller pops one due task at a time and runs it
//! to completion, so tasks never overlap. Periodic tasks are re-armed after
//! they run, from the time they finished, as long as they are still
//! registered; stopping a periodic task removes both its registration and
//! its queued occurrence.

use rand::Rng;
use std::collections::HashMap;
use std::time::Duration;

use crate::automation::docking::DockingStep;

/// Work the controller knows how to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Task {
    ActionCycle,
    MiningCheck,
    Docking(DockingStep),
}

/// How long a periodic task waits between runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cadence {
    Fixed(Duration),
    /// Uniformly drawn from `[min, max]` before every run.
    Jittered { min: Duration, max: Duration },
}

impl Cadence {
    pub fn next_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        match *self {
            Cadence::Fixed(interval) => interval,
            Cadence::Jittered { min, max } => {
                let ms = rng.gen_range(min.as_millis() as u64..=max.as_millis() as u64);
                Duration::from_millis(ms)
            }
        }
    }
}

#[derive(Debug)]
struct Entry {
    due: Duration,
    seq: u64,
    task: Task,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    queue: Vec<Entry>,
    periodic: HashMap<Task, Cadence>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, task: Task, due: Duration) {
        self.queue.push(Entry {
            due,
            seq: self.next_seq,
            task,
        });
        self.next_seq += 1;
    }

    fn is_queued(&self, task: Task) -> bool {
        self.queue.iter().any(|e| e.task == task)
    }

    /// Registers `task` to run `first_delay` after `now` and then on `cadence`.
    pub fn start_periodic(
        &mut self,
        task: Task,
        cadence: Cadence,
        now: Duration,
        first_delay: Duration,
    ) {
        self.stop_periodic(task);
        self.periodic.insert(task, cadence);
        self.push(task, now + first_delay);
    }

    /// Unregisters a periodic task and drops its pending run.
    pub fn stop_periodic(&mut self, task: Task) {
        self.periodic.remove(&task);
        self.queue.retain(|e| e.task != task);
    }

    /// Queues a single run of `task` after `delay`.
    pub fn schedule_once(&mut self, task: Task, now: Duration, delay: Duration) {
        self.push(task, now + delay);
    }

    /// Drops every pending run matching `predicate`, periodic or not.
    pub fn cancel_matching(&mut self, predicate: impl Fn(&Task) -> bool) {
        self.periodic.retain(|task, _| !predicate(task));
        self.queue.retain(|e| !predicate(&e.task));
    }

    pub fn cancel_all(&mut self) {
        self.periodic.clear();
        self.queue.clear();
    }

    /// Queues the next run of a periodic task that has just finished.
    ///
    /// Returns false if the task was stopped while it ran or is not periodic.
    pub fn rearm<R: Rng + ?Sized>(&mut self, task: Task, now: Duration, rng: &mut R) -> bool {
        let Some(cadence) = self.periodic.get(&task).copied() else {
            return false;
        };
        if self.is_queued(task) {
            return false;
        }
        let delay = cadence.next_delay(rng);
        self.push(task, now + delay);
        true
    }

    /// Earliest due time of any queued run.
    pub fn next_due(&self) -> Option<Duration> {
        self.queue.iter().map(|e| e.due).min()
    }

    /// Removes and returns the earliest run due at or before `now`.
    ///
    /// Runs with equal due times come out in the order they were queued.
    pub fn pop_due(&mut self, now: Duration) -> Option<Task> {
        let index = self
            .queue
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due <= now)
            .min_by_key(|(_, e)| (e.due, e.seq))
            .map(|(i, _)| i)?;
        Some(self.queue.swap_remove(index).task)
    }

    /// Whether `task` is registered or has a pending run.
    pub fn is_active(&self, task: Task) -> bool {
        self.periodic.contains_key(&task) || self.is_queued(task)
    }

    /// True when nothing is registered and nothing is queued.
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty() && self.periodic.is_empty()
    }
}
