//! Spiral Core - Headless Narrative State Engine
//!
//! This crate provides the state engine behind the spiral experience: a set
//! of continuously evolving metrics that escalate as a visitor interacts, the
//! pure derivations that turn those metrics into corruption, tone and glitch
//! levels, and the timers, badges and narrator that react to them. It has no
//! rendering code; any surface (a browser page, a terminal, a test) drives it.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          Surfaces                                │
//! │  ┌─────────┐  ┌──────────────┐  ┌──────────┐  ┌───────────────┐ │
//! │  │   HUD   │  │  Challenges  │  │  Mirror  │  │ Runner / Test │ │
//! │  └────┬────┘  └──────┬───────┘  └────┬─────┘  └───────┬───────┘ │
//! │       └──────────────┴───────────────┴────────────────┘         │
//! │                           │                                      │
//! │                    SurfaceEvent (up)                             │
//! │             EngineMessage + SessionView (down)                   │
//! └───────────────────────────┼──────────────────────────────────────┘
//!                             │
//! ┌───────────────────────────┼──────────────────────────────────────┐
//! │                      SPIRAL CORE                                 │
//! │  ┌────────────────────────┴────────────────────────────────────┐ │
//! │  │                       Session                                │ │
//! │  │  ┌─────────────┐  ┌───────────┐  ┌────────┐  ┌───────────┐  │ │
//! │  │  │ MetricStore │  │ Scheduler │  │ Badges │  │ Narrator  │  │ │
//! │  │  └──────┬──────┘  └───────────┘  └────────┘  └───────────┘  │ │
//! │  │         └──► derive (pure) ──► PhaseRatchet                  │ │
//! │  └─────────────────────────────────────────────────────────────┘ │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`Session`]: owns all state; `tick(now)` and `handle_event(event, now)`
//! - [`SessionRuntime`]: runs a session inside a tokio task
//! - [`MetricSnapshot`]: the raw signals (chaos, suspicion, frustration, depth)
//! - [`DerivedState`]: everything computed from a snapshot
//! - [`SurfaceEvent`] / [`EngineMessage`] / [`SessionView`]: the surface protocol
//!
//! # Quick Start
//!
//! ```ignore
//! use spiral_core::{load_config, Session, SessionRuntime, SurfaceEvent};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config()?;
//!     let mut handle = SessionRuntime::spawn(Session::from_config(config));
//!
//!     handle.send(SurfaceEvent::ChaosRaised).await?;
//!     while let Some(message) = handle.next_message().await {
//!         // Render message
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`metrics`]: raw signals and their named mutators
//! - [`derive`]: corruption formulas, severity, expression, integrity
//! - [`phase`]: narrator tone and the one-way experience phase
//! - [`scheduler`]: virtual-clock timers
//! - [`badges`]: achievement catalog, award rule, toasts
//! - [`narrator`]: typing delay, dedup, scrollback, text scrambling
//! - [`random`]: injectable randomness
//! - [`session`]: the context object wiring it all together
//! - [`runtime`]: tokio driver
//! - [`config`]: TOML / env / CLI configuration

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod badges;
pub mod config;
pub mod derive;
pub mod events;
pub mod messages;
pub mod metrics;
pub mod narrator;
pub mod phase;
pub mod random;
pub mod runtime;
pub mod scheduler;
pub mod session;

// Re-exports for convenience
pub use badges::{BadgeEngine, BadgeId, Toast};
pub use derive::{
    corruption_percentage, expression_glyph, expression_index, glitch_intensity, narrator_phase,
    narrator_weight, screen_flipped, system_integrity, CorruptionFormula, DerivedState,
    IntegrityMode, Severity,
};
pub use events::{ChallengeKind, SurfaceEvent};
pub use messages::{EngineMessage, SessionView};
pub use metrics::{InteractionKind, MetricSnapshot, MetricStore, UserBehavior};
pub use narrator::scramble::ScrambledText;
pub use narrator::{NarratorChannel, NarratorLine, NarratorSource};
pub use phase::{ExperiencePhase, NarratorPhase, PhaseRatchet, PhaseTransition};
pub use random::{RandomSource, ScriptedRandom, SeededRandom};
pub use runtime::{RuntimeError, RuntimeHandle, SessionRuntime};
pub use scheduler::{EventScheduler, Repeat, TimerId, TimerKind};
pub use session::Session;

// Config exports
pub use config::{
    default_config_path, load_config, load_config_from_path, ConfigError, ConfigOverrides,
    ConfigSource, SessionConfig, SpiralToml,
};
