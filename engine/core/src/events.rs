//! Surface Events
//!
//! Events sent from UI surfaces to the session. Surfaces (the HUD, the
//! dark-pattern challenge widgets, the mirror sequence) never touch the
//! metrics directly; they report what happened and the session applies the
//! matching mutator.
//!
//! # Design Philosophy
//!
//! Challenge widgets are opaque. The engine does not know what a cookie
//! banner or a fake leaderboard looks like; it only hears "completed" or
//! "failed" and reacts to that.

use serde::{Deserialize, Serialize};

use crate::badges::BadgeId;
use crate::metrics::InteractionKind;

/// Events from a surface to the session
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SurfaceEvent {
    // ============================================
    // Metric Events
    // ============================================
    /// A user interaction was observed
    Interaction {
        /// What kind
        kind: InteractionKind,
    },

    /// Overwrite spiral depth
    SetSpiralDepth {
        /// New depth
        depth: u32,
    },

    /// Overwrite the frustration score (clamped to `>= 0`)
    SetFrustration {
        /// New score
        score: f64,
    },

    /// A widget found something suspicious
    SuspicionRaised,

    /// A widget escalated chaos directly
    ChaosRaised,

    /// The user was pushed into a choice they did not want
    ForcedChoice,

    // ============================================
    // Challenge Events
    // ============================================
    /// A dark-pattern challenge was completed
    ChallengeCompleted {
        /// Which challenge
        challenge: ChallengeKind,
    },

    /// A dark-pattern challenge was failed
    ChallengeFailed {
        /// Which challenge
        challenge: ChallengeKind,
    },

    /// The mirror sequence finished and handed control back
    MirrorResolved,

    /// A widget awards a specific badge
    GrantBadge {
        /// Badge to award
        badge: BadgeId,
    },

    // ============================================
    // Narrator / Lifecycle Events
    // ============================================
    /// A surface wants the narrator to say something
    NarratorMessage {
        /// Line text
        text: String,
    },

    /// The visitor left
    EndSession,
}

impl SurfaceEvent {
    /// Short name for logs
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Interaction { .. } => "interaction",
            Self::SetSpiralDepth { .. } => "set_spiral_depth",
            Self::SetFrustration { .. } => "set_frustration",
            Self::SuspicionRaised => "suspicion_raised",
            Self::ChaosRaised => "chaos_raised",
            Self::ForcedChoice => "forced_choice",
            Self::ChallengeCompleted { .. } => "challenge_completed",
            Self::ChallengeFailed { .. } => "challenge_failed",
            Self::MirrorResolved => "mirror_resolved",
            Self::GrantBadge { .. } => "grant_badge",
            Self::NarratorMessage { .. } => "narrator_message",
            Self::EndSession => "end_session",
        }
    }
}

/// Dark-pattern challenge widgets
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeKind {
    /// Endless registration form
    Form,
    /// Modal that spawns more modals
    ModalSpam,
    /// Rigged leaderboard
    FakeLeaderboard,
    /// Trolley problem with no good answer
    MoralChoice,
    /// Nested menus that loop
    MenuMaze,
    /// Progress bar that never finishes
    ProgressBar,
}

impl ChallengeKind {
    /// All challenges
    #[must_use]
    pub const fn all() -> [Self; 6] {
        [
            Self::Form,
            Self::ModalSpam,
            Self::FakeLeaderboard,
            Self::MoralChoice,
            Self::MenuMaze,
            Self::ProgressBar,
        ]
    }

    /// Stable identifier
    #[must_use]
    pub const fn id(&self) -> &'static str {
        match self {
            Self::Form => "form",
            Self::ModalSpam => "modal_spam",
            Self::FakeLeaderboard => "fake_leaderboard",
            Self::MoralChoice => "moral_choice",
            Self::MenuMaze => "menu_maze",
            Self::ProgressBar => "progress_bar",
        }
    }

    /// Parse an identifier; dashes and underscores are interchangeable
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase().replace('-', "_");
        Self::all().into_iter().find(|c| c.id() == s)
    }
}

impl std::fmt::Display for ChallengeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}
