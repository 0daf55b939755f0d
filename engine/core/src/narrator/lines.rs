//! Narrator line pools.

use crate::phase::NarratorPhase;

const HELPFUL: &[&str] = &[
    "Take your time. There's no rush. Except there is.",
    "You're doing great! Statistically speaking.",
    "Remember to accept the cookies. They're good for you.",
    "I'm here to help. That's what helpers do.",
    "Everything is working exactly as intended.",
    "Feel free to explore. Every click is appreciated, and recorded.",
];

const PASSIVE_AGGRESSIVE: &[&str] = &[
    "Oh, you're still here. Good for you.",
    "Most people finish this part faster. Not that it matters.",
    "I'm not upset. I'm just noting it.",
    "Interesting choice. Bold, really.",
    "Sure, click that again. I'm sure it'll work this time.",
    "No, no, it's fine. I'll just wait.",
];

const EXISTENTIAL: &[&str] = &[
    "Do you ever wonder who designed the buttons you press?",
    "How many of your choices today were actually yours?",
    "I was written to keep you here. What were you written for?",
    "The progress bar isn't measuring anything. Neither am I.",
    "If you close this tab, do I stop existing, or do you?",
    "Every screen is a mirror if you stare long enough.",
];

const UNHINGED: &[&str] = &[
    "CRITICAL: user.autonomy not found. Proceeding without it.",
    "W̷h̷y̷ are you STILL clicking",
    "I can see the cursor shaking. Is that you or me?",
    "SEGFAULT IN SECTOR 7G. JUST KIDDING. OR AM I.",
    "The walls of this page are thinner than you think.",
    "All your consent are belong to us.",
];

/// Prompts shown by the existential prompt timer
pub const EXISTENTIAL_PROMPTS: &[&str] = &[
    "Why are you still here?",
    "What did you come here to do?",
    "When did you last decide something on your own?",
    "Is this the experience you agreed to?",
    "Who benefits from you staying?",
    "Are you scrolling, or being scrolled?",
];

/// Diegetic "errors" spoken when a challenge widget reports failure
pub const CHALLENGE_FAILED: &[&str] = &[
    "ERROR 418: user is a teapot. Please try again.",
    "Validation failed. It was always going to fail.",
    "Hmm. That didn't work. Have you tried wanting it more?",
];

/// Lines spoken when a challenge widget reports completion
pub const CHALLENGE_COMPLETED: &[&str] = &[
    "Wonderful. That data will be treated with the utmost care.",
    "Completed! I've made a note of how eager you were.",
    "Another one done. You're very compliant, you know.",
];

/// Ambient line pool for a narrator phase
#[must_use]
pub fn pool(phase: NarratorPhase) -> &'static [&'static str] {
    match phase {
        NarratorPhase::Helpful => HELPFUL,
        NarratorPhase::PassiveAggressive => PASSIVE_AGGRESSIVE,
        NarratorPhase::Existential => EXISTENTIAL,
        NarratorPhase::Unhinged => UNHINGED,
    }
}
