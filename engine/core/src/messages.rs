//! Engine Messages
//!
//! What the session tells surfaces. Two shapes:
//!
//! - [`EngineMessage`]: discrete things that just happened (a line finished
//!   typing, a phase was entered, a toast appeared). Surfaces animate these.
//! - [`SessionView`]: the full current picture, recomputed from the snapshot
//!   on every read. Surfaces that only render state can ignore messages and
//!   poll the view.

use serde::{Deserialize, Serialize};

use crate::badges::{BadgeId, Toast};
use crate::derive::DerivedState;
use crate::metrics::MetricSnapshot;
use crate::narrator::NarratorLine;
use crate::phase::ExperiencePhase;

/// Messages from the session to surfaces
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EngineMessage {
    // ============================================
    // Narrator
    // ============================================
    /// A narrator line finished typing
    NarratorLine {
        /// The delivered line
        line: NarratorLine,
    },

    // ============================================
    // Narrative Progression
    // ============================================
    /// The experience phase moved forward
    PhaseAdvanced {
        /// Phase before
        from: ExperiencePhase,
        /// Phase after
        to: ExperiencePhase,
        /// Phase-gate corruption that caused it, if any
        corruption: Option<f64>,
    },

    /// Hand off to the mirror sequence. Sent once per session.
    MirrorConfrontation,

    // ============================================
    // Transient Effects
    // ============================================
    /// Glitch overlay on
    GlitchStarted {
        /// Overlay strength in `[0, 1]`
        intensity: f64,
    },

    /// Glitch overlay off
    GlitchCleared,

    /// Existential prompt on screen
    PromptShown {
        /// Prompt text
        text: String,
    },

    /// Existential prompt gone
    PromptHidden,

    /// Badge toast on screen
    ToastShown {
        /// The toast
        toast: Toast,
    },

    /// Badge toast gone
    ToastDismissed {
        /// Badge it announced
        badge: BadgeId,
    },

    /// Screen orientation changed
    ScreenFlip {
        /// Whether the screen is now upside down
        flipped: bool,
    },

    // ============================================
    // Lifecycle
    // ============================================
    /// The session ended; no further messages follow
    SessionEnded {
        /// Session time at the end, in milliseconds
        elapsed_ms: u64,
    },
}

impl EngineMessage {
    /// Short name for logs
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::NarratorLine { .. } => "narrator_line",
            Self::PhaseAdvanced { .. } => "phase_advanced",
            Self::MirrorConfrontation => "mirror_confrontation",
            Self::GlitchStarted { .. } => "glitch_started",
            Self::GlitchCleared => "glitch_cleared",
            Self::PromptShown { .. } => "prompt_shown",
            Self::PromptHidden => "prompt_hidden",
            Self::ToastShown { .. } => "toast_shown",
            Self::ToastDismissed { .. } => "toast_dismissed",
            Self::ScreenFlip { .. } => "screen_flip",
            Self::SessionEnded { .. } => "session_ended",
        }
    }
}

/// Everything a surface needs to render one frame
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    /// Session time, in milliseconds
    pub elapsed_ms: u64,
    /// Raw signals
    pub metrics: MetricSnapshot,
    /// Values derived from `metrics`
    pub derived: DerivedState,
    /// Most recent narrator line, unscrambled
    pub narrator_latest: Option<NarratorLine>,
    /// Most recent narrator line as it should be displayed
    pub narrator_display: Option<String>,
    /// Delivered narrator lines, oldest first
    pub scrollback: Vec<NarratorLine>,
    /// The narrator is typing
    pub narrator_typing: bool,
    /// Glitch overlay on
    pub glitch_active: bool,
    /// Existential prompt on screen
    pub prompt: Option<String>,
    /// Badge toasts on screen
    pub toasts: Vec<Toast>,
    /// The mirror hand-off already happened
    pub mirror_triggered: bool,
    /// The session has ended
    pub ended: bool,
}

impl SessionView {
    /// Experience phase, for convenience
    #[must_use]
    pub fn experience_phase(&self) -> ExperiencePhase {
        self.metrics.experience_phase
    }

    /// Single-line JSON rendering
    ///
    /// # Errors
    ///
    /// Fails only if a float in the view is not representable (NaN/inf).
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
