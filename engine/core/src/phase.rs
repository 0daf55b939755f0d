//! Narrator and Experience Phases
//!
//! Two state machines with different transition rules live side by side:
//!
//! - [`NarratorPhase`] is a pure function of the current signals. It moves in
//!   either direction as the signals change.
//! - [`ExperiencePhase`] is a one-way ratchet driven by the phase-gate
//!   corruption score. Once advanced it never reverts, even if the score later
//!   drops.
//!
//! ```text
//! Intro ──20──▶ PatternSequences ──45──▶ ExistentialReflection ──75──▶ MirrorConfrontation
//!                                                                          │ (mirror resolved)
//!                                                                          ▼
//!                                                                   RealityBreakdown
//! ```

use serde::{Deserialize, Serialize};

// =============================================================================
// Thresholds
// =============================================================================

/// Narrator weight at which the tone turns passive-aggressive
pub const NARRATOR_PASSIVE_AGGRESSIVE_AT: f64 = 5.0;

/// Narrator weight at which the tone turns existential
pub const NARRATOR_EXISTENTIAL_AT: f64 = 10.0;

/// Narrator weight at which the narrator comes unhinged
pub const NARRATOR_UNHINGED_AT: f64 = 15.0;

/// Phase-gate corruption needed for pattern sequences
pub const GATE_PATTERN_SEQUENCES: f64 = 20.0;

/// Phase-gate corruption needed for existential reflection
pub const GATE_EXISTENTIAL_REFLECTION: f64 = 45.0;

/// Phase-gate corruption needed for the mirror confrontation
pub const GATE_MIRROR_CONFRONTATION: f64 = 75.0;

// =============================================================================
// Narrator Phase
// =============================================================================

/// Tone bucket of the narrator's ambient lines
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "kebab-case")]
pub enum NarratorPhase {
    /// Weight below 5
    #[default]
    Helpful,
    /// Weight below 10
    PassiveAggressive,
    /// Weight below 15
    Existential,
    /// Everything above
    Unhinged,
}

impl NarratorPhase {
    /// Bucket a narrator weight (`chaos + suspicion/2 + spiral/2 + frustration/3`)
    #[must_use]
    pub fn from_weight(weight: f64) -> Self {
        if weight.is_nan() || weight < NARRATOR_PASSIVE_AGGRESSIVE_AT {
            Self::Helpful
        } else if weight < NARRATOR_EXISTENTIAL_AT {
            Self::PassiveAggressive
        } else if weight < NARRATOR_UNHINGED_AT {
            Self::Existential
        } else {
            Self::Unhinged
        }
    }

    /// Stable identifier used on the wire
    #[must_use]
    pub const fn id(&self) -> &'static str {
        match self {
            Self::Helpful => "helpful",
            Self::PassiveAggressive => "passive-aggressive",
            Self::Existential => "existential",
            Self::Unhinged => "unhinged",
        }
    }

    /// All phases, calmest first
    #[must_use]
    pub const fn all() -> [Self; 4] {
        [
            Self::Helpful,
            Self::PassiveAggressive,
            Self::Existential,
            Self::Unhinged,
        ]
    }
}

impl std::fmt::Display for NarratorPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

// =============================================================================
// Experience Phase
// =============================================================================

/// Ratcheted stage of the scripted narrative
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "kebab-case")]
pub enum ExperiencePhase {
    /// Friendly onboarding
    #[default]
    Intro = 0,
    /// Dark-pattern challenges start appearing
    PatternSequences = 1,
    /// The narrator starts asking questions
    ExistentialReflection = 2,
    /// Control is handed to the external mirror surface
    MirrorConfrontation = 3,
    /// After the mirror reports back
    RealityBreakdown = 4,
}

impl ExperiencePhase {
    /// Stable identifier used on the wire
    #[must_use]
    pub const fn id(&self) -> &'static str {
        match self {
            Self::Intro => "intro",
            Self::PatternSequences => "pattern-sequences",
            Self::ExistentialReflection => "existential-reflection",
            Self::MirrorConfrontation => "mirror-confrontation",
            Self::RealityBreakdown => "reality-breakdown",
        }
    }

    /// Next phase, if any
    #[must_use]
    pub const fn next(&self) -> Option<Self> {
        match self {
            Self::Intro => Some(Self::PatternSequences),
            Self::PatternSequences => Some(Self::ExistentialReflection),
            Self::ExistentialReflection => Some(Self::MirrorConfrontation),
            Self::MirrorConfrontation => Some(Self::RealityBreakdown),
            Self::RealityBreakdown => None,
        }
    }

    /// Phase-gate corruption required to enter this phase.
    ///
    /// `None` for phases not reachable through the gate.
    #[must_use]
    pub const fn gate(&self) -> Option<f64> {
        match self {
            Self::PatternSequences => Some(GATE_PATTERN_SEQUENCES),
            Self::ExistentialReflection => Some(GATE_EXISTENTIAL_REFLECTION),
            Self::MirrorConfrontation => Some(GATE_MIRROR_CONFRONTATION),
            Self::Intro | Self::RealityBreakdown => None,
        }
    }

    /// Highest phase the gate allows for a corruption score
    #[must_use]
    pub fn gated_by(corruption: f64) -> Self {
        let mut phase = Self::Intro;
        while let Some(next) = phase.next() {
            match next.gate() {
                Some(gate) if corruption >= gate => phase = next,
                _ => break,
            }
        }
        phase
    }

    /// The one-time narrator line spoken on entering this phase
    #[must_use]
    pub const fn entry_line(&self) -> &'static str {
        match self {
            Self::Intro => "Welcome! Everything here is designed with your best interests in mind.",
            Self::PatternSequences => {
                "Let's try a few small tasks. They are completely optional. Mostly."
            }
            Self::ExistentialReflection => {
                "Have you noticed how long you've been here? I have. I always notice."
            }
            Self::MirrorConfrontation => "There's someone I'd like you to meet. Look closer.",
            Self::RealityBreakdown => "ERR: narrative.integrity < 0. Continuing anyway.",
        }
    }
}

impl std::fmt::Display for ExperiencePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// A forward move of the experience phase
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseTransition {
    /// Phase before
    pub from: ExperiencePhase,
    /// Phase after
    pub to: ExperiencePhase,
    /// Corruption score that caused it (`None` for external transitions)
    pub corruption: Option<f64>,
}

impl PhaseTransition {
    /// Every phase entered by this transition, in order.
    ///
    /// A single large jump enters several phases; each gets its entry line.
    #[must_use]
    pub fn entered(&self) -> Vec<ExperiencePhase> {
        let mut phases = Vec::new();
        let mut cursor = self.from;
        while let Some(next) = cursor.next() {
            if next > self.to {
                break;
            }
            phases.push(next);
            cursor = next;
        }
        phases
    }
}

// =============================================================================
// Phase Ratchet
// =============================================================================

/// One-way experience phase tracker with the one-shot mirror trigger
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseRatchet {
    phase: ExperiencePhase,
    mirror_triggered: bool,
}

impl PhaseRatchet {
    /// Ratchet at `Intro`
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase
    #[must_use]
    pub fn current(&self) -> ExperiencePhase {
        self.phase
    }

    /// Whether the mirror hand-off already happened
    #[must_use]
    pub fn mirror_triggered(&self) -> bool {
        self.mirror_triggered
    }

    /// Apply a phase-gate corruption reading.
    ///
    /// Returns a transition only when the gate allows a phase beyond the
    /// current one; lower readings never move the ratchet back.
    pub fn check(&mut self, corruption: f64) -> Option<PhaseTransition> {
        let target = ExperiencePhase::gated_by(corruption);
        if target <= self.phase {
            return None;
        }
        let transition = PhaseTransition {
            from: self.phase,
            to: target,
            corruption: Some(corruption),
        };
        self.phase = target;
        Some(transition)
    }

    /// Fires exactly once, the first time it is called at or past the mirror
    pub fn take_mirror_trigger(&mut self) -> bool {
        if self.phase >= ExperiencePhase::MirrorConfrontation && !self.mirror_triggered {
            self.mirror_triggered = true;
            true
        } else {
            false
        }
    }

    /// The external mirror surface handed control back
    pub fn resolve_mirror(&mut self) -> Option<PhaseTransition> {
        if self.phase != ExperiencePhase::MirrorConfrontation {
            return None;
        }
        self.phase = ExperiencePhase::RealityBreakdown;
        Some(PhaseTransition {
            from: ExperiencePhase::MirrorConfrontation,
            to: ExperiencePhase::RealityBreakdown,
            corruption: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Narrator Phase Tests
    // =========================================================================

    #[test]
    fn test_narrator_boundaries() {
        assert_eq!(NarratorPhase::from_weight(0.0), NarratorPhase::Helpful);
        assert_eq!(NarratorPhase::from_weight(4.99), NarratorPhase::Helpful);
        assert_eq!(NarratorPhase::from_weight(5.0), NarratorPhase::PassiveAggressive);
        assert_eq!(NarratorPhase::from_weight(9.99), NarratorPhase::PassiveAggressive);
        assert_eq!(NarratorPhase::from_weight(10.0), NarratorPhase::Existential);
        assert_eq!(NarratorPhase::from_weight(14.99), NarratorPhase::Existential);
        assert_eq!(NarratorPhase::from_weight(15.0), NarratorPhase::Unhinged);
        assert_eq!(NarratorPhase::from_weight(f64::NAN), NarratorPhase::Helpful);
    }

    #[test]
    fn test_narrator_phase_ids() {
        assert_eq!(NarratorPhase::PassiveAggressive.to_string(), "passive-aggressive");
        let json = serde_json::to_string(&NarratorPhase::Unhinged).unwrap();
        assert_eq!(json, "\"unhinged\"");
    }

    // =========================================================================
    // Ratchet Tests
    // =========================================================================

    #[test]
    fn test_ratchet_advances_through_gates() {
        let mut ratchet = PhaseRatchet::new();
        assert!(ratchet.check(10.0).is_none());

        let t = ratchet.check(20.0).unwrap();
        assert_eq!(t.from, ExperiencePhase::Intro);
        assert_eq!(t.to, ExperiencePhase::PatternSequences);

        let t = ratchet.check(50.0).unwrap();
        assert_eq!(t.to, ExperiencePhase::ExistentialReflection);

        let t = ratchet.check(75.0).unwrap();
        assert_eq!(t.to, ExperiencePhase::MirrorConfrontation);
        assert!(ratchet.check(100.0).is_none());
    }

    #[test]
    fn test_ratchet_never_regresses() {
        let mut ratchet = PhaseRatchet::new();
        ratchet.check(80.0);
        for reading in [0.0, 10.0, 44.0, -5.0, f64::NAN] {
            assert!(ratchet.check(reading).is_none());
            assert_eq!(ratchet.current(), ExperiencePhase::MirrorConfrontation);
        }
    }

    #[test]
    fn test_jump_enters_every_phase() {
        let mut ratchet = PhaseRatchet::new();
        let t = ratchet.check(99.0).unwrap();
        assert_eq!(
            t.entered(),
            vec![
                ExperiencePhase::PatternSequences,
                ExperiencePhase::ExistentialReflection,
                ExperiencePhase::MirrorConfrontation,
            ]
        );
    }

    #[test]
    fn test_mirror_trigger_is_one_shot() {
        let mut ratchet = PhaseRatchet::new();
        assert!(!ratchet.take_mirror_trigger());
        ratchet.check(80.0);
        assert!(ratchet.take_mirror_trigger());
        assert!(!ratchet.take_mirror_trigger());
        assert!(ratchet.mirror_triggered());
    }

    #[test]
    fn test_resolve_mirror() {
        let mut ratchet = PhaseRatchet::new();
        assert!(ratchet.resolve_mirror().is_none());
        ratchet.check(80.0);
        let t = ratchet.resolve_mirror().unwrap();
        assert_eq!(t.to, ExperiencePhase::RealityBreakdown);
        assert!(t.corruption.is_none());
        assert!(ratchet.check(100.0).is_none());
        assert_eq!(ratchet.current(), ExperiencePhase::RealityBreakdown);
    }

    #[test]
    fn test_gate_thresholds() {
        assert_eq!(ExperiencePhase::Intro.gate(), None);
        assert_eq!(ExperiencePhase::PatternSequences.gate(), Some(20.0));
        assert_eq!(ExperiencePhase::MirrorConfrontation.gate(), Some(75.0));
        assert_eq!(ExperiencePhase::gated_by(44.9), ExperiencePhase::PatternSequences);
        assert_eq!(ExperiencePhase::gated_by(45.0), ExperiencePhase::ExistentialReflection);
        assert_eq!(ExperiencePhase::gated_by(100.0), ExperiencePhase::MirrorConfrontation);
        assert_eq!(ExperiencePhase::gated_by(f64::NAN), ExperiencePhase::Intro);
    }
}
