//! Badge Engine
//!
//! Achievement flags with set semantics: once earned, a badge is never
//! revoked and never offered again.
//!
//! The award rule is intentionally weak. A check only considers awarding
//! anything while **no** badge is held, and then succeeds with a flat chance
//! (30% by default), picking a random badge from the catalog. Most visitors
//! therefore end the session with at most one badge from the timer; widgets
//! can still grant specific badges directly.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::metrics::MetricSnapshot;
use crate::random::RandomSource;

/// Default chance per check while no badge is held
pub const BADGE_AWARD_CHANCE: f64 = 0.3;

/// Default lifetime of a badge toast
pub const TOAST_DURATION: Duration = Duration::from_secs(5);

/// Fixed badge catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BadgeId {
    /// Accepted every cookie
    CookieConnoisseur,
    /// Scrolled straight past the terms
    TermsSkimmer,
    /// Could not find the unsubscribe link
    NewsletterHostage,
    /// Kept scrolling
    InfiniteScroller,
    /// Clicked faster than the page could load
    RageClicker,
    /// Restarted and came back anyway
    LoopSurvivor,
    /// Looked into the mirror
    MirrorGazer,
    /// Handed over everything the form asked for
    DataDonor,
}

impl BadgeId {
    /// The whole catalog, in display order
    #[must_use]
    pub const fn all() -> [Self; 8] {
        [
            Self::CookieConnoisseur,
            Self::TermsSkimmer,
            Self::NewsletterHostage,
            Self::InfiniteScroller,
            Self::RageClicker,
            Self::LoopSurvivor,
            Self::MirrorGazer,
            Self::DataDonor,
        ]
    }

    /// Stable identifier
    #[must_use]
    pub const fn id(&self) -> &'static str {
        match self {
            Self::CookieConnoisseur => "cookie-connoisseur",
            Self::TermsSkimmer => "terms-skimmer",
            Self::NewsletterHostage => "newsletter-hostage",
            Self::InfiniteScroller => "infinite-scroller",
            Self::RageClicker => "rage-clicker",
            Self::LoopSurvivor => "loop-survivor",
            Self::MirrorGazer => "mirror-gazer",
            Self::DataDonor => "data-donor",
        }
    }

    /// Parse a stable identifier
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        Self::all().into_iter().find(|b| b.id() == s)
    }

    /// Toast title
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::CookieConnoisseur => "Cookie Connoisseur",
            Self::TermsSkimmer => "Terms Skimmer",
            Self::NewsletterHostage => "Newsletter Hostage",
            Self::InfiniteScroller => "Infinite Scroller",
            Self::RageClicker => "Rage Clicker",
            Self::LoopSurvivor => "Loop Survivor",
            Self::MirrorGazer => "Mirror Gazer",
            Self::DataDonor => "Data Donor",
        }
    }
}

impl std::fmt::Display for BadgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Transient award notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    /// Badge announced
    pub badge: BadgeId,
    /// Display text
    pub text: String,
    /// Session time it appeared
    pub shown_at: Duration,
    /// Session time it disappears
    pub dismiss_at: Duration,
}

/// Decides awards and tracks the toasts on screen
#[derive(Debug, Clone)]
pub struct BadgeEngine {
    award_chance: f64,
    toast_duration: Duration,
    toasts: Vec<Toast>,
}

impl BadgeEngine {
    /// Engine with an award chance and toast lifetime
    #[must_use]
    pub fn new(award_chance: f64, toast_duration: Duration) -> Self {
        Self {
            award_chance,
            toast_duration,
            toasts: Vec::new(),
        }
    }

    /// Badges not yet earned, in catalog order
    #[must_use]
    pub fn unearned(s: &MetricSnapshot) -> Vec<BadgeId> {
        BadgeId::all()
            .into_iter()
            .filter(|b| !s.has_badge(*b))
            .collect()
    }

    /// One award check.
    ///
    /// Only while no badge is held: a flat chance, then a uniform pick among
    /// unearned badges. Does not mutate anything; the caller records the award.
    pub fn evaluate(&self, s: &MetricSnapshot, rng: &mut dyn RandomSource) -> Option<BadgeId> {
        if !s.earned_badges.is_empty() {
            return None;
        }
        if !rng.chance(self.award_chance) {
            return None;
        }
        let candidates = Self::unearned(s);
        rng.index(candidates.len()).map(|i| candidates[i])
    }

    /// Put a toast on screen for an award made at `now`
    pub fn show_toast(&mut self, badge: BadgeId, now: Duration) -> Toast {
        let toast = Toast {
            badge,
            text: format!("Achievement unlocked: {}", badge.title()),
            shown_at: now,
            dismiss_at: now + self.toast_duration,
        };
        self.toasts.push(toast.clone());
        toast
    }

    /// Remove the toast for `badge`. Returns whether one was showing.
    pub fn dismiss_toast(&mut self, badge: BadgeId) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|t| t.badge != badge);
        self.toasts.len() != before
    }

    /// Toasts currently on screen
    #[must_use]
    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }
}

impl Default for BadgeEngine {
    fn default() -> Self {
        Self::new(BADGE_AWARD_CHANCE, TOAST_DURATION)
    }
}
