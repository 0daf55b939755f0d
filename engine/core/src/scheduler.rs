//! Event Scheduler
//!
//! A virtual-clock timer queue. Time is a [`Duration`] since the session
//! started; nothing in here reads a wall clock or sleeps. The owner calls
//! [`EventScheduler::pop_due`] from its tick until it returns `None`, handles
//! each fired timer, and re-arms repeating ones with a period it picks at
//! that moment (the narrator period depends on the snapshot *after* the
//! previous handlers ran).
//!
//! ```text
//!   schedule(kind, due, repeat) ──► queue (due asc, id asc)
//!                                        │
//!   tick(now): while pop_due(now) ───────┘──► handle ──► rearm(timer, period)
//! ```
//!
//! Re-arming keeps cadence: the next due time is the previous *due* time plus
//! the period, not `now` plus the period. A long gap between ticks therefore
//! fires a repeating timer once per missed period, the same frame-rate
//! independence the animation controller in the TUI relies on.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::badges::BadgeId;

/// Shortest period a repeating timer can be re-armed with
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// What a timer does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    /// Spiral depth and frustration creep, maybe a glitch
    SpiralTick,
    /// Ambient narrator line
    NarratorAmbient,
    /// Experience phase gate
    PhaseGate,
    /// Existential prompt
    ExistentialPrompt,
    /// Badge award check
    BadgeCheck,
    /// Glitch overlay ends
    GlitchClear,
    /// Existential prompt disappears
    PromptHide,
    /// Badge toast disappears
    ToastDismiss(BadgeId),
}

impl TimerKind {
    /// Short label for logs
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::SpiralTick => "spiral_tick",
            Self::NarratorAmbient => "narrator_ambient",
            Self::PhaseGate => "phase_gate",
            Self::ExistentialPrompt => "existential_prompt",
            Self::BadgeCheck => "badge_check",
            Self::GlitchClear => "glitch_clear",
            Self::PromptHide => "prompt_hide",
            Self::ToastDismiss(_) => "toast_dismiss",
        }
    }
}

impl std::fmt::Display for TimerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Whether a timer comes back after firing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Repeat {
    /// Fires once
    Once,
    /// Fires until cancelled; the owner supplies each next period
    Repeating,
}

/// Timer handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimerId(u64);

/// A queued or fired timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTimer {
    /// Handle, kept across re-arms
    pub id: TimerId,
    /// Behavior
    pub kind: TimerKind,
    /// Virtual time it is (or was) due
    pub due: Duration,
    /// Repeat policy
    pub repeat: Repeat,
}

impl PartialOrd for ScheduledTimer {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledTimer {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.due
            .cmp(&other.due)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Virtual-clock timer queue with group cancellation
#[derive(Debug, Clone, Default)]
pub struct EventScheduler {
    queue: BinaryHeap<Reverse<ScheduledTimer>>,
    next_id: u64,
    fired: u64,
    ended: bool,
}

impl EventScheduler {
    /// Empty scheduler
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a timer. Returns `None` once the scheduler has been cancelled.
    pub fn schedule(&mut self, kind: TimerKind, due: Duration, repeat: Repeat) -> Option<TimerId> {
        if self.ended {
            return None;
        }
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.queue.push(Reverse(ScheduledTimer {
            id,
            kind,
            due,
            repeat,
        }));
        Some(id)
    }

    /// Pop the earliest timer due at or before `now`
    pub fn pop_due(&mut self, now: Duration) -> Option<ScheduledTimer> {
        if self.ended {
            return None;
        }
        let Reverse(next) = self.queue.peek()?;
        if next.due > now {
            return None;
        }
        let Reverse(timer) = self.queue.pop()?;
        self.fired += 1;
        tracing::debug!(
            timer = %timer.kind,
            due_ms = timer.due.as_millis() as u64,
            now_ms = now.as_millis() as u64,
            "Timer fired"
        );
        Some(timer)
    }

    /// Put a fired repeating timer back, `period` after its last due time.
    ///
    /// One-shot timers and a cancelled scheduler are ignored.
    pub fn rearm(&mut self, timer: &ScheduledTimer, period: Duration) -> Option<Duration> {
        if self.ended || timer.repeat == Repeat::Once {
            return None;
        }
        let due = timer.due + period.max(MIN_PERIOD);
        self.queue.push(Reverse(ScheduledTimer { due, ..*timer }));
        Some(due)
    }

    /// Cancel every timer as a group. Nothing fires afterwards.
    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.queue.len();
        self.queue.clear();
        if !self.ended {
            self.ended = true;
            tracing::info!(cancelled, fired = self.fired, "Timer group cancelled");
        }
        cancelled
    }

    /// Whether [`EventScheduler::cancel_all`] has run
    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Timers still queued
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Earliest due time
    #[must_use]
    pub fn next_due(&self) -> Option<Duration> {
        self.queue.peek().map(|Reverse(t)| t.due)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    fn drain(scheduler: &mut EventScheduler, now: Duration) -> Vec<TimerKind> {
        let mut fired = Vec::new();
        while let Some(timer) = scheduler.pop_due(now) {
            fired.push(timer.kind);
        }
        fired
    }

    // =========================================================================
    // Ordering Tests
    // =========================================================================

    #[test]
    fn test_fires_in_due_order() {
        let mut scheduler = EventScheduler::new();
        scheduler.schedule(TimerKind::BadgeCheck, secs(15), Repeat::Once);
        scheduler.schedule(TimerKind::PhaseGate, secs(10), Repeat::Once);
        scheduler.schedule(TimerKind::SpiralTick, secs(60), Repeat::Once);

        assert!(drain(&mut scheduler, secs(9)).is_empty());
        assert_eq!(
            drain(&mut scheduler, secs(20)),
            [TimerKind::PhaseGate, TimerKind::BadgeCheck]
        );
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn test_ties_fire_in_schedule_order() {
        let mut scheduler = EventScheduler::new();
        scheduler.schedule(TimerKind::GlitchClear, secs(1), Repeat::Once);
        scheduler.schedule(TimerKind::PromptHide, secs(1), Repeat::Once);
        assert_eq!(
            drain(&mut scheduler, secs(1)),
            [TimerKind::GlitchClear, TimerKind::PromptHide]
        );
    }

    // =========================================================================
    // Repeat Tests
    // =========================================================================

    #[test]
    fn test_rearm_keeps_cadence() {
        let mut scheduler = EventScheduler::new();
        scheduler.schedule(TimerKind::PhaseGate, secs(10), Repeat::Repeating);

        let mut fires = 0;
        while let Some(timer) = scheduler.pop_due(secs(35)) {
            fires += 1;
            scheduler.rearm(&timer, secs(10));
        }
        // Due at 10, 20 and 30
        assert_eq!(fires, 3);
        assert_eq!(scheduler.next_due(), Some(secs(40)));
    }

    #[test]
    fn test_one_shot_is_not_rearmed() {
        let mut scheduler = EventScheduler::new();
        scheduler.schedule(TimerKind::GlitchClear, secs(1), Repeat::Once);
        let timer = scheduler.pop_due(secs(1)).expect("due");
        assert_eq!(scheduler.rearm(&timer, secs(1)), None);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_zero_period_is_floored() {
        let mut scheduler = EventScheduler::new();
        scheduler.schedule(TimerKind::NarratorAmbient, secs(1), Repeat::Repeating);
        let timer = scheduler.pop_due(secs(1)).expect("due");
        assert_eq!(
            scheduler.rearm(&timer, Duration::ZERO),
            Some(secs(1) + MIN_PERIOD)
        );
    }

    // =========================================================================
    // Cancellation Tests
    // =========================================================================

    #[test]
    fn test_cancel_all_is_final() {
        let mut scheduler = EventScheduler::new();
        scheduler.schedule(TimerKind::SpiralTick, secs(60), Repeat::Repeating);
        scheduler.schedule(TimerKind::PhaseGate, secs(10), Repeat::Repeating);
        let timer = scheduler.pop_due(secs(10)).expect("due");

        assert_eq!(scheduler.cancel_all(), 1);
        assert!(scheduler.is_ended());
        assert_eq!(scheduler.rearm(&timer, secs(10)), None);
        assert_eq!(scheduler.schedule(TimerKind::BadgeCheck, secs(1), Repeat::Once), None);
        assert!(drain(&mut scheduler, secs(10_000)).is_empty());
        assert_eq!(scheduler.cancel_all(), 0);
    }
}
