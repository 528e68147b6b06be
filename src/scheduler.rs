//! Cooperative task scheduler.
//!
//! One control loop, no preemption.  Each tick reads the clock once and
//! hands the timestamp to a [`SchedulerDelegate`]: inbound draining first,
//! then every periodic task whose interval has elapsed, in registration
//! order.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Scheduler.tick(now)                     │
//! │                                                              │
//! │  1. delegate.drain_inbound(now)        (every tick)          │
//! │                                                              │
//! │  2. for each task, if due:                                   │
//! │     ┌───────────┐ ┌───────────┐ ┌────────────┐ ┌──────────┐  │
//! │     │ Motion    │ │ Session   │ │ Register   │ │ Clock /  │  │
//! │     │ 100 ms    │ │ 100 ms    │ │ 1 s        │ │ Display  │  │
//! │     └─────┬─────┘ └─────┬─────┘ └─────┬──────┘ └────┬─────┘  │
//! │           ▼             ▼             ▼             ▼        │
//! │     ┌────────────────────────────────────────────────────┐   │
//! │     │         delegate.run_task(id, now)                 │   │
//! │     └────────────────────────────────────────────────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use crate::app::ports::SchedulerDelegate;
use crate::config::SystemConfig;
use log::info;

// ═══════════════════════════════════════════════════════════════
//  Task types
// ═══════════════════════════════════════════════════════════════

/// Periodic tasks known to the firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskId {
    MotionPoll,
    SessionMaintain,
    Registration,
    ClockSync,
    DisplayRefresh,
}

/// Internal bookkeeping for one task.
#[derive(Debug, Clone)]
struct PeriodicTask {
    id: TaskId,
    interval_ms: u64,
    /// `None` until the first run, which is due immediately.
    last_run_ms: Option<u64>,
}

impl PeriodicTask {
    fn is_due(&self, now_ms: u64) -> bool {
        match self.last_run_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.interval_ms,
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// Maximum number of tasks (stack-allocated).
const MAX_TASKS: usize = 8;

/// The scheduler engine.
///
/// Decoupled from what tasks do: it only tracks ids and intervals and
/// calls back into the [`SchedulerDelegate`].
pub struct Scheduler {
    tasks: heapless::Vec<PeriodicTask, MAX_TASKS>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            tasks: heapless::Vec::new(),
        }
    }

    /// The firmware's task table with intervals from `config`.
    pub fn from_config(config: &SystemConfig) -> Self {
        let mut s = Self::new();
        let table = [
            (TaskId::MotionPoll, config.motion_poll_interval_ms),
            (TaskId::SessionMaintain, config.session_maintain_interval_ms),
            (TaskId::Registration, config.registration_retry_ms),
            (TaskId::ClockSync, config.clock_sync_interval_ms),
            (TaskId::DisplayRefresh, config.display_refresh_interval_ms),
        ];
        for (id, interval) in table {
            // Five entries always fit.
            let _ = s.add(id, u64::from(interval));
        }
        s
    }

    /// Register a task.  Returns `false` if the table is full or the id
    /// is already present.
    pub fn add(&mut self, id: TaskId, interval_ms: u64) -> bool {
        if self.tasks.iter().any(|t| t.id == id) {
            return false;
        }
        let pushed = self
            .tasks
            .push(PeriodicTask {
                id,
                interval_ms,
                last_run_ms: None,
            })
            .is_ok();
        if pushed {
            info!("Scheduler: added {:?} every {} ms", id, interval_ms);
        }
        pushed
    }

    /// Run one tick at `now_ms`.
    pub fn tick(&mut self, now_ms: u64, delegate: &mut dyn SchedulerDelegate) {
        delegate.drain_inbound(now_ms);

        for task in self.tasks.iter_mut() {
            if task.is_due(now_ms) {
                task.last_run_ms = Some(now_ms);
                delegate.run_task(task.id, now_ms);
            }
        }
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
