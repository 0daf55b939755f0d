//! Metric Store
//!
//! Holds the raw, mutable signals of a narrative session. Every surface reads
//! a [`MetricSnapshot`] copy and writes through the named mutators on
//! [`MetricStore`]; there are no public field setters.
//!
//! All mutators are total: out-of-range or malformed input is clamped into
//! the legal range instead of being rejected.

use serde::{Deserialize, Serialize};

use crate::badges::BadgeId;
use crate::phase::ExperiencePhase;

/// Highest chaos level
pub const MAX_CHAOS: u8 = 5;

/// Highest suspicion level
pub const MAX_SUSPICION: u8 = 10;

/// Interactions needed to climb one chaos level
pub const INTERACTIONS_PER_CHAOS_LEVEL: u64 = 10;

/// Kind of user interaction reported by a surface
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InteractionKind {
    /// Any click/tap
    Click,
    /// The user tripped over something (failed a form, closed the wrong modal)
    Error,
    /// The user restarted a flow
    Restart,
}

impl InteractionKind {
    /// Parse from a surface-supplied string.
    ///
    /// Unknown strings count as clicks; surfaces are never rejected.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "error" | "errors" | "fail" | "mistake" => Self::Error,
            "restart" | "restarts" | "reset" => Self::Restart,
            _ => Self::Click,
        }
    }

    /// Human-readable label
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::Error => "error",
            Self::Restart => "restart",
        }
    }
}

impl std::fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Monotonic user behaviour counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserBehavior {
    /// Clicks recorded
    pub click_count: u64,
    /// Errors recorded
    pub error_count: u64,
    /// Restarts recorded
    pub restart_count: u64,
}

impl UserBehavior {
    /// Sum of all counters
    #[must_use]
    pub fn total(&self) -> u64 {
        self.click_count
            .saturating_add(self.error_count)
            .saturating_add(self.restart_count)
    }
}

/// Point-in-time copy of every raw signal
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    /// 0..=5
    pub chaos_level: u8,
    /// 0..=10
    pub suspicion_level: u8,
    /// Non-negative, unbounded upward
    pub frustration_score: f64,
    /// Spiral ticks elapsed
    pub spiral_depth: u32,
    /// Interaction counters
    pub user_behavior: UserBehavior,
    /// Badges earned so far, in award order
    pub earned_badges: Vec<BadgeId>,
    /// Ratcheted stage of the scripted narrative
    pub experience_phase: ExperiencePhase,
}

impl MetricSnapshot {
    /// Fresh snapshot at session start
    #[must_use]
    pub fn new() -> Self {
        Self {
            chaos_level: 0,
            suspicion_level: 0,
            frustration_score: 0.0,
            spiral_depth: 0,
            user_behavior: UserBehavior::default(),
            earned_badges: Vec::new(),
            experience_phase: ExperiencePhase::Intro,
        }
    }

    /// Snapshot with the four core signals set, clamped into range.
    ///
    /// Useful for previews and for exercising the derivations directly.
    #[must_use]
    pub fn with_signals(chaos: u8, suspicion: u8, spiral_depth: u32, frustration: f64) -> Self {
        Self {
            chaos_level: chaos.min(MAX_CHAOS),
            suspicion_level: suspicion.min(MAX_SUSPICION),
            frustration_score: sanitize_frustration(frustration),
            spiral_depth,
            ..Self::new()
        }
    }

    /// Whether a badge has been earned
    #[must_use]
    pub fn has_badge(&self, badge: BadgeId) -> bool {
        self.earned_badges.contains(&badge)
    }
}

impl Default for MetricSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

/// Clamp a frustration value: NaN and negatives become 0, infinity saturates
fn sanitize_frustration(value: f64) -> f64 {
    if value.is_nan() || value <= 0.0 {
        0.0
    } else if value.is_infinite() {
        f64::MAX
    } else {
        value
    }
}

/// Chaos level implied by an interaction total: `min(5, 1 + floor(total / 10))`
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn chaos_for_interactions(total: u64) -> u8 {
    (1 + total / INTERACTIONS_PER_CHAOS_LEVEL).min(u64::from(MAX_CHAOS)) as u8
}

/// Owner of the session's single [`MetricSnapshot`]
#[derive(Clone, Debug, Default)]
pub struct MetricStore {
    snapshot: MetricSnapshot,
}

impl MetricStore {
    /// Store with a fresh snapshot
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consistent copy of every signal
    #[must_use]
    pub fn snapshot(&self) -> MetricSnapshot {
        self.snapshot.clone()
    }

    /// Borrow the live snapshot without copying
    #[must_use]
    pub fn current(&self) -> &MetricSnapshot {
        &self.snapshot
    }

    /// Raise chaos by one level (clamped at 5). Returns the new level.
    pub fn bump_chaos(&mut self) -> u8 {
        self.snapshot.chaos_level = self.snapshot.chaos_level.saturating_add(1).min(MAX_CHAOS);
        self.snapshot.chaos_level
    }

    /// Raise suspicion by one level (clamped at 10). Returns the new level.
    pub fn bump_suspicion(&mut self) -> u8 {
        self.snapshot.suspicion_level = self
            .snapshot
            .suspicion_level
            .saturating_add(1)
            .min(MAX_SUSPICION);
        self.snapshot.suspicion_level
    }

    /// Add to frustration. The result never drops below zero.
    pub fn add_frustration(&mut self, delta: f64) -> f64 {
        if !delta.is_nan() {
            self.snapshot.frustration_score =
                sanitize_frustration(self.snapshot.frustration_score + delta);
        }
        self.snapshot.frustration_score
    }

    /// One spiral tick deeper. Returns the new depth.
    pub fn increment_spiral_depth(&mut self) -> u32 {
        self.snapshot.spiral_depth = self.snapshot.spiral_depth.saturating_add(1);
        self.snapshot.spiral_depth
    }

    /// Count an interaction and recompute chaos from the counters.
    ///
    /// Chaos never falls below a level already reached through
    /// [`MetricStore::bump_chaos`]. Returns the new chaos level.
    pub fn record_interaction(&mut self, kind: InteractionKind) -> u8 {
        let behavior = &mut self.snapshot.user_behavior;
        match kind {
            InteractionKind::Click => behavior.click_count = behavior.click_count.saturating_add(1),
            InteractionKind::Error => behavior.error_count = behavior.error_count.saturating_add(1),
            InteractionKind::Restart => {
                behavior.restart_count = behavior.restart_count.saturating_add(1);
            }
        }

        let total = behavior.total();
        let previous = self.snapshot.chaos_level;
        self.snapshot.chaos_level = previous.max(chaos_for_interactions(total));

        if self.snapshot.chaos_level != previous {
            tracing::debug!(
                kind = %kind,
                total,
                chaos = self.snapshot.chaos_level,
                "Chaos level rose"
            );
        }
        self.snapshot.chaos_level
    }

    /// Replace spiral depth through an updater (e.g. `|d| d + 3`)
    pub fn set_spiral_depth(&mut self, updater: impl FnOnce(u32) -> u32) -> u32 {
        self.snapshot.spiral_depth = updater(self.snapshot.spiral_depth);
        self.snapshot.spiral_depth
    }

    /// Replace frustration through an updater. The result is clamped.
    pub fn set_frustration_score(&mut self, updater: impl FnOnce(f64) -> f64) -> f64 {
        self.snapshot.frustration_score = sanitize_frustration(updater(self.snapshot.frustration_score));
        self.snapshot.frustration_score
    }

    /// Add a badge. Returns `false` if it was already held.
    pub(crate) fn earn_badge(&mut self, badge: BadgeId) -> bool {
        if self.snapshot.has_badge(badge) {
            return false;
        }
        self.snapshot.earned_badges.push(badge);
        true
    }

    /// Move the experience phase forward. Backward moves are ignored.
    pub(crate) fn advance_experience_phase(&mut self, phase: ExperiencePhase) -> bool {
        if phase > self.snapshot.experience_phase {
            self.snapshot.experience_phase = phase;
            true
        } else {
            false
        }
    }
}
