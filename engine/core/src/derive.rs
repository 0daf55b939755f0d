//! Derived State
//!
//! Pure functions from a [`MetricSnapshot`] to the values surfaces render.
//! Nothing here is cached: callers recompute from the snapshot they are
//! holding, once per render or tick.
//!
//! Several corruption formulas coexist on purpose. The HUD, the screen-flip
//! trigger, the phase gate and the glitch overlay each weigh the signals
//! differently; [`CorruptionFormula`] names every variant so they are never
//! collapsed into one.

use serde::{Deserialize, Serialize};

use crate::metrics::MetricSnapshot;
use crate::phase::NarratorPhase;

/// Screen-flip corruption above which the surface renders upside down
pub const SCREEN_FLIP_THRESHOLD: f64 = 50.0;

/// Expression glyphs, calm to crashed
pub const FACE_GLYPHS: [&str; 10] = [
    "(◕‿◕)",
    "(・‿・)",
    "(・_・)",
    "(￣～￣)",
    "(ಠ_ಠ)",
    "(╯°□°)",
    "(⊙_☉)",
    "(x_x)",
    "(✖╭╮✖)",
    "[CRASHED]",
];

/// Named corruption blends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CorruptionFormula {
    /// `chaos*15 + suspicion*5`, shown in the HUD
    Hud,
    /// `chaos*7 + suspicion*5`, drives the screen flip
    ScreenFlip,
    /// `chaos*10 + suspicion*5 + spiral*3 + frustration`, gates experience phases
    PhaseGate,
    /// `chaos*12 + spiral*4`, drives glitch intensity
    Glitch,
}

impl CorruptionFormula {
    /// Every formula
    #[must_use]
    pub const fn all() -> [Self; 4] {
        [Self::Hud, Self::ScreenFlip, Self::PhaseGate, Self::Glitch]
    }

    /// Raw, unclamped blend
    #[must_use]
    pub fn raw(self, s: &MetricSnapshot) -> f64 {
        let chaos = f64::from(s.chaos_level);
        let suspicion = f64::from(s.suspicion_level);
        let spiral = f64::from(s.spiral_depth);
        match self {
            Self::Hud => chaos * 15.0 + suspicion * 5.0,
            Self::ScreenFlip => chaos * 7.0 + suspicion * 5.0,
            Self::PhaseGate => chaos * 10.0 + suspicion * 5.0 + spiral * 3.0 + s.frustration_score,
            Self::Glitch => chaos * 12.0 + spiral * 4.0,
        }
    }
}

/// Clamp to `[0, 100]`; NaN becomes 0
fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Corruption percentage for a formula, clamped to `[0, 100]`
#[must_use]
pub fn corruption_percentage(formula: CorruptionFormula, s: &MetricSnapshot) -> f64 {
    clamp_percent(formula.raw(s))
}

/// Colour/severity bucket for a percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    /// Below 25
    Stable,
    /// Below 50
    Unstable,
    /// Below 75
    Critical,
    /// 75 and above
    Corrupted,
}

impl Severity {
    /// Bucket a percentage
    #[must_use]
    pub fn from_percentage(percentage: f64) -> Self {
        let p = clamp_percent(percentage);
        if p < 25.0 {
            Self::Stable
        } else if p < 50.0 {
            Self::Unstable
        } else if p < 75.0 {
            Self::Critical
        } else {
            Self::Corrupted
        }
    }

    /// Colour name surfaces map to their palette
    #[must_use]
    pub const fn color(&self) -> &'static str {
        match self {
            Self::Stable => "green",
            Self::Unstable => "yellow",
            Self::Critical => "orange",
            Self::Corrupted => "red",
        }
    }
}

/// Weighted narrator sum: `chaos + suspicion/2 + spiral/2 + frustration/3`
#[must_use]
pub fn narrator_weight(s: &MetricSnapshot) -> f64 {
    f64::from(s.chaos_level)
        + f64::from(s.suspicion_level) / 2.0
        + f64::from(s.spiral_depth) / 2.0
        + s.frustration_score / 3.0
}

/// Current narrator tone
#[must_use]
pub fn narrator_phase(s: &MetricSnapshot) -> NarratorPhase {
    NarratorPhase::from_weight(narrator_weight(s))
}

/// Index into [`FACE_GLYPHS`]: `floor(min((chaos + suspicion/2) / 1.5, 9))`
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn expression_index(s: &MetricSnapshot) -> usize {
    let max = (FACE_GLYPHS.len() - 1) as f64;
    let raw = (f64::from(s.chaos_level) + f64::from(s.suspicion_level) / 2.0) / 1.5;
    raw.min(max).floor().max(0.0) as usize
}

/// Face glyph for the current signals
#[must_use]
pub fn expression_glyph(s: &MetricSnapshot) -> &'static str {
    FACE_GLYPHS[expression_index(s)]
}

/// Which experience the integrity meter belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum IntegrityMode {
    /// The linear page flow, base 70
    Linear,
    /// The spiral experience, base 40
    #[default]
    Spiral,
}

impl IntegrityMode {
    /// Starting integrity before any damage
    #[must_use]
    pub const fn base(&self) -> f64 {
        match self {
            Self::Linear => 70.0,
            Self::Spiral => 40.0,
        }
    }
}

/// `base - (chaos*10 + suspicion*2)`, floored at 0
#[must_use]
pub fn system_integrity(mode: IntegrityMode, s: &MetricSnapshot) -> f64 {
    let damage = f64::from(s.chaos_level) * 10.0 + f64::from(s.suspicion_level) * 2.0;
    (mode.base() - damage).max(0.0)
}

/// Glitch overlay strength in `[0, 1]`
#[must_use]
pub fn glitch_intensity(s: &MetricSnapshot) -> f64 {
    corruption_percentage(CorruptionFormula::Glitch, s) / 100.0
}

/// Whether the screen-flip corruption is past its threshold
#[must_use]
pub fn screen_flipped(s: &MetricSnapshot) -> bool {
    corruption_percentage(CorruptionFormula::ScreenFlip, s) > SCREEN_FLIP_THRESHOLD
}

/// Everything derived from one snapshot, computed together for a single render
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedState {
    /// HUD corruption
    pub hud_corruption: f64,
    /// Screen-flip corruption
    pub screen_flip_corruption: f64,
    /// Phase-gate ("total") corruption
    pub total_corruption: f64,
    /// Severity bucket of the HUD corruption
    pub severity: Severity,
    /// Narrator tone
    pub narrator_phase: NarratorPhase,
    /// Face glyph index
    pub expression_index: usize,
    /// Face glyph
    pub expression: String,
    /// Integrity meter for the spiral experience
    pub system_integrity: f64,
    /// Glitch overlay strength
    pub glitch_intensity: f64,
    /// Screen rendered upside down
    pub screen_flipped: bool,
}

impl DerivedState {
    /// Compute every derived value from a snapshot
    #[must_use]
    pub fn compute(s: &MetricSnapshot) -> Self {
        let hud_corruption = corruption_percentage(CorruptionFormula::Hud, s);
        Self {
            hud_corruption,
            screen_flip_corruption: corruption_percentage(CorruptionFormula::ScreenFlip, s),
            total_corruption: corruption_percentage(CorruptionFormula::PhaseGate, s),
            severity: Severity::from_percentage(hud_corruption),
            narrator_phase: narrator_phase(s),
            expression_index: expression_index(s),
            expression: expression_glyph(s).to_string(),
            system_integrity: system_integrity(IntegrityMode::Spiral, s),
            glitch_intensity: glitch_intensity(s),
            screen_flipped: screen_flipped(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(chaos: u8, suspicion: u8, spiral: u32, frustration: f64) -> MetricSnapshot {
        MetricSnapshot::with_signals(chaos, suspicion, spiral, frustration)
    }

    // =========================================================================
    // Corruption Tests
    // =========================================================================

    #[test]
    fn test_formulas_are_distinct() {
        let s = snap(2, 4, 0, 0.0);
        assert!((corruption_percentage(CorruptionFormula::Hud, &s) - 50.0).abs() < f64::EPSILON);
        assert!(
            (corruption_percentage(CorruptionFormula::ScreenFlip, &s) - 34.0).abs() < f64::EPSILON
        );
        assert!(
            (corruption_percentage(CorruptionFormula::PhaseGate, &s) - 40.0).abs() < f64::EPSILON
        );
        assert!((corruption_percentage(CorruptionFormula::Glitch, &s) - 24.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_corruption_clamped() {
        let s = snap(5, 10, 10_000, 1e12);
        for formula in CorruptionFormula::all() {
            let p = corruption_percentage(formula, &s);
            assert!((0.0..=100.0).contains(&p), "{formula:?} = {p}");
        }
        let zero = MetricSnapshot::new();
        for formula in CorruptionFormula::all() {
            assert_eq!(corruption_percentage(formula, &zero), 0.0);
        }
    }

    #[test]
    fn test_severity_buckets() {
        assert_eq!(Severity::from_percentage(0.0), Severity::Stable);
        assert_eq!(Severity::from_percentage(25.0), Severity::Unstable);
        assert_eq!(Severity::from_percentage(74.9), Severity::Critical);
        assert_eq!(Severity::from_percentage(500.0), Severity::Corrupted);
        assert_eq!(Severity::Corrupted.color(), "red");
    }

    // =========================================================================
    // Narrator / Expression Tests
    // =========================================================================

    #[test]
    fn test_calm_snapshot() {
        let s = snap(0, 0, 0, 0.0);
        assert_eq!(narrator_phase(&s), NarratorPhase::Helpful);
        assert_eq!(expression_index(&s), 0);
        assert_eq!(expression_glyph(&s), "(◕‿◕)");
    }

    #[test]
    fn test_max_chaos_and_suspicion_is_existential() {
        let s = snap(5, 10, 0, 0.0);
        assert!((narrator_weight(&s) - 10.0).abs() < f64::EPSILON);
        assert_eq!(narrator_phase(&s), NarratorPhase::Existential);
    }

    #[test]
    fn test_narrator_phase_oscillates() {
        let low = snap(1, 0, 0, 0.0);
        let high = snap(5, 10, 10, 0.0);
        assert_eq!(narrator_phase(&low), NarratorPhase::Helpful);
        assert_eq!(narrator_phase(&high), NarratorPhase::Unhinged);
        assert_eq!(narrator_phase(&low), NarratorPhase::Helpful);
    }

    #[test]
    fn test_expression_index_caps() {
        assert_eq!(expression_index(&snap(5, 10, 0, 0.0)), 6);
        assert_eq!(expression_index(&snap(3, 0, 0, 0.0)), 2);
        assert!(expression_index(&snap(5, 10, 99, 99.0)) < FACE_GLYPHS.len());
    }

    // =========================================================================
    // Integrity / Glitch Tests
    // =========================================================================

    #[test]
    fn test_system_integrity() {
        let s = snap(2, 3, 0, 0.0);
        assert!((system_integrity(IntegrityMode::Linear, &s) - 44.0).abs() < f64::EPSILON);
        assert!((system_integrity(IntegrityMode::Spiral, &s) - 14.0).abs() < f64::EPSILON);
        assert_eq!(system_integrity(IntegrityMode::Spiral, &snap(5, 10, 0, 0.0)), 0.0);
    }

    #[test]
    fn test_glitch_and_flip() {
        let s = snap(5, 10, 20, 0.0);
        assert!((glitch_intensity(&s) - 1.0).abs() < f64::EPSILON);
        assert!(screen_flipped(&s));
        assert!(!screen_flipped(&snap(3, 5, 0, 0.0)));
    }

    #[test]
    fn test_derived_state_bundle() {
        let s = snap(1, 2, 0, 0.0);
        let d = DerivedState::compute(&s);
        assert!((d.hud_corruption - 25.0).abs() < f64::EPSILON);
        assert_eq!(d.severity, Severity::Unstable);
        assert_eq!(d.narrator_phase, NarratorPhase::Helpful);
        assert_eq!(d.expression, FACE_GLYPHS[d.expression_index]);
        assert!(!d.screen_flipped);
    }
}
