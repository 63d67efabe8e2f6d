//! Cooperative timers for the single-threaded device loop.
//!
//! Every timer and serial poll is a one-shot [`Task`] that reschedules
//! itself while it still has work to do. Tasks are stamped with the
//! scheduler epoch at the time they are scheduled; a screen transition
//! bumps the epoch, and a task from an older epoch is discarded when it
//! comes due instead of running against the new screen.

use crate::acquisition::CapturePhase;
use tracing::trace;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Task {
    /// Boot splash is over.
    BootDone,
    /// "Turning off" pause is over.
    BlankDone,
    /// Advance the loading bar.
    ProgressStep,
    /// Advance the hold countdown.
    CountdownStep,
    /// Check whether a sweep block has arrived.
    PollSweep(CapturePhase),
    /// Check whether the temperature line has arrived.
    PollTemperature,
}

#[derive(Clone, Copy, Debug)]
struct Pending {
    due_ms: u64,
    epoch: u32,
    task: Task,
}

pub struct Scheduler {
    epoch: u32,
    pending: Vec<Pending>,
}

impl Scheduler {
    pub const fn new() -> Self {
        Self {
            epoch: 0,
            pending: Vec::new(),
        }
    }

    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    /// Invalidate everything scheduled so far.
    pub fn advance_epoch(&mut self) -> u32 {
        self.epoch = self.epoch.wrapping_add(1);
        self.epoch
    }

    /// Run `task` once `after_ms` have passed since `now_ms`.
    pub fn schedule(&mut self, now_ms: u64, after_ms: u64, task: Task) {
        self.pending.push(Pending {
            due_ms: now_ms.saturating_add(after_ms),
            epoch: self.epoch,
            task,
        });
    }

    /// Take the earliest task due at `now_ms`, dropping stale ones on the way.
    ///
    /// Tasks due at the same time come out in scheduling order.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<Task> {
        let epoch = self.epoch;
        self.pending.retain(|p| {
            let live = p.epoch == epoch;
            if !live {
                trace!("scheduler: dropping stale {:?} (epoch {})", p.task, p.epoch);
            }
            live
        });

        let (idx, _) = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due_ms <= now_ms)
            .min_by_key(|(i, p)| (p.due_ms, *i))?;
        Some(self.pending.remove(idx).task)
    }

    /// Live tasks (current epoch) still waiting.
    pub fn pending(&self) -> usize {
        self.pending.iter().filter(|p| p.epoch == self.epoch).count()
    }

    pub fn is_scheduled(&self, task: Task) -> bool {
        self.pending
            .iter()
            .any(|p| p.epoch == self.epoch && p.task == task)
    }

    /// Due time of the earliest live task.
    pub fn next_due(&self) -> Option<u64> {
        self.pending
            .iter()
            .filter(|p| p.epoch == self.epoch)
            .map(|p| p.due_ms)
            .min()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
