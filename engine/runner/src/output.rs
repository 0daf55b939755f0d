//! Stdout rendering
//!
//! Plain text for people, one JSON object per line with `--json`.

use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;

use spiral_core::{EngineMessage, SessionView};

use crate::commands::HELP;

/// One line of `--json` output
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Output<'a> {
    Message { message: &'a EngineMessage },
    View { view: &'a SessionView },
}

/// Writes engine output to stdout
pub struct Printer {
    json: bool,
}

impl Printer {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub fn banner(&self) {
        println!("spiral {} (type `help` for commands)", env!("CARGO_PKG_VERSION"));
    }

    pub fn help(&self) {
        println!("{HELP}");
    }

    pub fn message(&self, message: &EngineMessage) -> Result<()> {
        if self.json {
            return emit(&Output::Message { message });
        }
        if let Some(text) = format_message(message) {
            println!("{text}");
        }
        Ok(())
    }

    pub fn view(&self, view: &SessionView) -> Result<()> {
        if self.json {
            return emit(&Output::View { view });
        }
        println!("{}", format_view(view));
        Ok(())
    }
}

fn emit(output: &Output<'_>) -> Result<()> {
    let line = serde_json::to_string(output).context("Failed to encode output")?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{line}").context("Failed to write stdout")?;
    stdout.flush().context("Failed to flush stdout")
}

/// Human-readable line for a message, `None` for ones not worth printing
fn format_message(message: &EngineMessage) -> Option<String> {
    let text = match message {
        EngineMessage::NarratorLine { line } => format!("narrator> {}", line.text),
        EngineMessage::PhaseAdvanced {
            from,
            to,
            corruption,
        } => match corruption {
            Some(c) => format!("== {from} -> {to} (corruption {c:.1}%) =="),
            None => format!("== {from} -> {to} =="),
        },
        EngineMessage::MirrorConfrontation => {
            "== the mirror is waiting (type `mirror` to resolve) ==".to_string()
        }
        EngineMessage::GlitchStarted { intensity } => format!("~~ glitch {intensity:.2} ~~"),
        EngineMessage::GlitchCleared => return None,
        EngineMessage::PromptShown { text } => format!("?? {text}"),
        EngineMessage::PromptHidden => return None,
        EngineMessage::ToastShown { toast } => format!("[badge] {}", toast.text),
        EngineMessage::ToastDismissed { .. } => return None,
        EngineMessage::ScreenFlip { flipped } => {
            if *flipped {
                "(the screen turns upside down)".to_string()
            } else {
                "(the screen rights itself)".to_string()
            }
        }
        EngineMessage::SessionEnded { elapsed_ms } => {
            format!("session ended after {:.1}s", *elapsed_ms as f64 / 1000.0)
        }
    };
    Some(text)
}

fn format_view(view: &SessionView) -> String {
    let m = &view.metrics;
    let d = &view.derived;
    let mut out = format!(
        "t={:.1}s phase={} narrator={} {}\n\
         chaos={} suspicion={} depth={} frustration={:.1} interactions={}\n\
         corruption={:.1}% ({:?}) integrity={:.1}% flipped={}",
        view.elapsed_ms as f64 / 1000.0,
        m.experience_phase,
        d.narrator_phase,
        d.expression,
        m.chaos_level,
        m.suspicion_level,
        m.spiral_depth,
        m.frustration_score,
        m.user_behavior.total(),
        d.total_corruption,
        d.severity,
        d.system_integrity,
        d.screen_flipped,
    );
    if !m.earned_badges.is_empty() {
        let badges: Vec<String> = m.earned_badges.iter().map(ToString::to_string).collect();
        out.push_str(&format!("\nbadges: {}", badges.join(", ")));
    }
    if let Some(line) = &view.narrator_display {
        out.push_str(&format!("\nnarrator: {line}"));
    }
    if let Some(prompt) = &view.prompt {
        out.push_str(&format!("\nprompt: {prompt}"));
    }
    if view.ended {
        out.push_str("\n(ended)");
    }
    out
}
