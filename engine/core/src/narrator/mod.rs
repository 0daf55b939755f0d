//! Narrator Channel
//!
//! The narrator "types". Every push waits behind a random typing delay before
//! it lands in the scrollback, so the channel has two halves:
//!
//! ```text
//!   push(text) ──► pending (ordered by due time, then push order)
//!                        │
//!            poll(now) ──┘──► scrollback (newest last, capped) ──► latest()
//! ```
//!
//! # Design Philosophy
//!
//! - Every line is held for its own typing delay, counted from its push.
//!   Lines are delivered in due order; equal due times keep push order.
//! - A push identical to the immediately preceding push is dropped, whether
//!   or not that push has been delivered yet.
//! - The scrollback is bounded; the oldest line falls off first.

pub mod lines;
pub mod scramble;

use std::collections::VecDeque;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::random::RandomSource;

/// Lines kept in the scrollback
pub const SCROLLBACK_CAPACITY: usize = 20;

/// Shortest typing delay
pub const TYPING_DELAY_MIN: Duration = Duration::from_millis(500);

/// Longest typing delay
pub const TYPING_DELAY_MAX: Duration = Duration::from_millis(1500);

/// Where a narrator line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarratorSource {
    /// Fixed story beats (session start, challenge reactions)
    Scripted,
    /// Picked from the phase pool by the narrator timer
    Ambient,
    /// Entry line of an experience phase
    PhaseTransition,
    /// Pushed by a surface
    External,
}

impl NarratorSource {
    /// Short label for logs
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Scripted => "scripted",
            Self::Ambient => "ambient",
            Self::PhaseTransition => "phase",
            Self::External => "external",
        }
    }
}

impl std::fmt::Display for NarratorSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A delivered narrator line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarratorLine {
    /// Push order, starting at 0
    pub seq: u64,
    /// Unscrambled text
    pub text: String,
    /// Origin
    pub source: NarratorSource,
    /// Session time of the push
    pub pushed_at: Duration,
    /// Session time the line finished typing
    pub delivered_at: Duration,
}

#[derive(Debug, Clone)]
struct PendingLine {
    seq: u64,
    text: String,
    source: NarratorSource,
    pushed_at: Duration,
    due: Duration,
}

/// Delayed, deduplicated, bounded narrator output
#[derive(Debug, Clone)]
pub struct NarratorChannel {
    capacity: usize,
    delay_min: Duration,
    delay_max: Duration,
    pending: VecDeque<PendingLine>,
    scrollback: VecDeque<NarratorLine>,
    last_pushed: Option<String>,
    next_seq: u64,
}

impl NarratorChannel {
    /// Channel with a scrollback capacity and typing delay range
    #[must_use]
    pub fn new(capacity: usize, delay_min: Duration, delay_max: Duration) -> Self {
        Self {
            capacity: capacity.max(1),
            delay_min,
            delay_max,
            pending: VecDeque::new(),
            scrollback: VecDeque::with_capacity(capacity.max(1)),
            last_pushed: None,
            next_seq: 0,
        }
    }

    /// Queue a line.
    ///
    /// Returns `false` when the line was dropped: blank text, or the same
    /// text as the immediately preceding push.
    pub fn push(
        &mut self,
        text: impl Into<String>,
        source: NarratorSource,
        now: Duration,
        rng: &mut dyn RandomSource,
    ) -> bool {
        let text = text.into();
        if text.trim().is_empty() {
            return false;
        }
        if self.last_pushed.as_deref() == Some(text.as_str()) {
            tracing::debug!(source = %source, "Dropped duplicate narrator line");
            return false;
        }

        let due = now + rng.between(self.delay_min, self.delay_max);
        self.last_pushed = Some(text.clone());
        let at = self.pending.partition_point(|p| p.due <= due);
        self.pending.insert(
            at,
            PendingLine {
                seq: self.next_seq,
                text,
                source,
                pushed_at: now,
                due,
            },
        );
        self.next_seq += 1;
        true
    }

    /// Deliver every line whose typing delay has elapsed by `now`
    pub fn poll(&mut self, now: Duration) -> Vec<NarratorLine> {
        let mut delivered = Vec::new();
        while self.pending.front().is_some_and(|p| p.due <= now) {
            let Some(p) = self.pending.pop_front() else {
                break;
            };
            let line = NarratorLine {
                seq: p.seq,
                text: p.text,
                source: p.source,
                pushed_at: p.pushed_at,
                delivered_at: p.due,
            };
            if self.scrollback.len() == self.capacity {
                self.scrollback.pop_front();
            }
            self.scrollback.push_back(line.clone());
            delivered.push(line);
        }
        delivered
    }

    /// Most recently delivered line
    #[must_use]
    pub fn latest(&self) -> Option<&NarratorLine> {
        self.scrollback.back()
    }

    /// Delivered lines, oldest first
    pub fn scrollback(&self) -> impl Iterator<Item = &NarratorLine> {
        self.scrollback.iter()
    }

    /// Whether a line is still being typed
    #[must_use]
    pub fn is_typing(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Due time of the next delivery
    #[must_use]
    pub fn next_due(&self) -> Option<Duration> {
        self.pending.front().map(|p| p.due)
    }

    /// Drop everything still being typed. Delivered lines stay.
    pub fn clear_pending(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }
}

impl Default for NarratorChannel {
    fn default() -> Self {
        Self::new(SCROLLBACK_CAPACITY, TYPING_DELAY_MIN, TYPING_DELAY_MAX)
    }
}
