//! Text Scrambler
//!
//! Display-only corruption of narrator text. A [`ScrambledText`] keeps the
//! original string for every semantic use (equality, logging, scrollback) and
//! re-rolls a corrupted rendering on a timer whose period shrinks as chaos
//! rises. Nothing about the engine's state changes when text is scrambled.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::random::RandomSource;

/// Replacement glyphs
pub const GLYPHS: &[char] = &[
    '█', '▓', '▒', '░', '#', '@', '%', '&', '$', '!', '?', '¿', '§', '¥', '∆', 'Ø', '¤', '※',
];

/// Per-character replacement chance never exceeds this
pub const MAX_SCRAMBLE_PROBABILITY: f64 = 0.9;

const PROBABILITY_PER_CHAOS: f64 = 0.08;
const BASE_REROLL: Duration = Duration::from_millis(400);
const REROLL_STEP_MS: f64 = 60.0;
const MIN_REROLL: Duration = Duration::from_millis(60);

/// `min(0.9, chaos * multiplier * 0.08)`
#[must_use]
pub fn scramble_probability(chaos: u8, multiplier: f64) -> f64 {
    let p = f64::from(chaos) * multiplier * PROBABILITY_PER_CHAOS;
    if p.is_nan() {
        0.0
    } else {
        p.clamp(0.0, MAX_SCRAMBLE_PROBABILITY)
    }
}

/// `max(60ms, 400ms - chaos * multiplier * 60ms)`
#[must_use]
pub fn reroll_period(chaos: u8, multiplier: f64) -> Duration {
    let step_ms = f64::from(chaos) * multiplier * REROLL_STEP_MS;
    if !step_ms.is_finite() || step_ms <= 0.0 {
        return BASE_REROLL;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let step = Duration::from_millis(step_ms.round().min(u64::MAX as f64) as u64);
    BASE_REROLL
        .checked_sub(step)
        .unwrap_or(MIN_REROLL)
        .max(MIN_REROLL)
}

/// Only letters and digits are replaced; punctuation and combining marks stay
fn scramblable(c: char) -> bool {
    c.is_alphanumeric()
}

/// One-off scrambled rendering
#[must_use]
pub fn scramble(text: &str, probability: f64, rng: &mut dyn RandomSource) -> String {
    if probability <= 0.0 {
        return text.to_string();
    }
    text.chars()
        .map(|c| {
            if scramblable(c) && rng.chance(probability) {
                rng.index(GLYPHS.len()).map_or(c, |i| GLYPHS[i])
            } else {
                c
            }
        })
        .collect()
}

/// Lazily re-rolled scrambled view over a source string
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrambledText {
    source: String,
    rendered: String,
    multiplier: f64,
    next_reroll: Option<Duration>,
}

impl ScrambledText {
    /// Wrap `source`; the first [`ScrambledText::update`] renders it
    #[must_use]
    pub fn new(source: impl Into<String>, multiplier: f64) -> Self {
        let source = source.into();
        Self {
            rendered: source.clone(),
            source,
            multiplier,
            next_reroll: None,
        }
    }

    /// The original, unscrambled text
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The current display rendering
    #[must_use]
    pub fn rendered(&self) -> &str {
        &self.rendered
    }

    /// Re-roll if the period has elapsed. Returns whether the rendering was re-rolled.
    pub fn update(&mut self, now: Duration, chaos: u8, rng: &mut dyn RandomSource) -> bool {
        if self.next_reroll.is_some_and(|due| now < due) {
            return false;
        }
        let probability = scramble_probability(chaos, self.multiplier);
        self.rendered = scramble(&self.source, probability, rng);
        self.next_reroll = Some(now + reroll_period(chaos, self.multiplier));
        true
    }
}

impl PartialEq for ScrambledText {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl std::fmt::Display for ScrambledText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.rendered)
    }
}
