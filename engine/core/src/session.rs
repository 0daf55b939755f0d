//! Session
//!
//! The explicit context object for one visit. It owns every piece of engine
//! state and is the only thing surfaces talk to:
//!
//! ```text
//!   SurfaceEvent ──► handle_event ──► MetricStore mutators
//!                                            │
//!   tick(now) ──► EventScheduler ──► timer handlers ──► PhaseRatchet
//!                                            │          BadgeEngine
//!                                            │          NarratorChannel
//!                                            ▼
//!                               outbox: Vec<EngineMessage>
//!                               view(): SessionView (recomputed on read)
//! ```
//!
//! # Design Philosophy
//!
//! Nothing here is asynchronous and nothing reads a clock. The caller passes
//! the session time into [`Session::tick`] and [`Session::handle_event`];
//! the tokio driver in [`crate::runtime`] is one such caller, tests are
//! another. Derived values are never stored; every read goes back to the
//! current snapshot.
//!
//! Rule randomness (glitches, badge awards, narrator picks, typing delays)
//! comes from the injected [`RandomSource`]. Text scrambling draws from a
//! separate display source so re-rendering a line never shifts the outcome
//! of a rule.

use std::time::Duration;

use crate::badges::BadgeEngine;
use crate::badges::BadgeId;
use crate::config::SessionConfig;
use crate::derive::{self, CorruptionFormula, DerivedState};
use crate::events::SurfaceEvent;
use crate::messages::{EngineMessage, SessionView};
use crate::metrics::{InteractionKind, MetricSnapshot, MetricStore};
use crate::narrator::lines;
use crate::narrator::scramble::ScrambledText;
use crate::narrator::{NarratorChannel, NarratorSource};
use crate::phase::{ExperiencePhase, PhaseRatchet, PhaseTransition};
use crate::random::{RandomSource, SeededRandom};
use crate::scheduler::{EventScheduler, Repeat, ScheduledTimer, TimerKind};

/// Frustration added by a forced choice
pub const FORCED_CHOICE_FRUSTRATION: f64 = 10.0;

/// One visitor's run through the experience
pub struct Session {
    config: SessionConfig,
    store: MetricStore,
    ratchet: PhaseRatchet,
    badges: BadgeEngine,
    narrator: NarratorChannel,
    scheduler: EventScheduler,
    rng: Box<dyn RandomSource>,
    display_rng: Box<dyn RandomSource>,
    display: Option<ScrambledText>,
    outbox: Vec<EngineMessage>,
    now: Duration,
    glitch_active: bool,
    prompt: Option<String>,
    screen_flipped: bool,
    ended: bool,
}

impl Session {
    /// Start a session at time zero.
    ///
    /// Registers the repeating timers and queues the intro line.
    #[must_use]
    pub fn new(config: SessionConfig, rng: Box<dyn RandomSource>) -> Self {
        let display_rng: Box<dyn RandomSource> = match config.runtime.seed {
            Some(seed) => Box::new(SeededRandom::from_seed(seed.wrapping_add(1))),
            None => Box::new(SeededRandom::from_entropy()),
        };
        let narrator = NarratorChannel::new(
            config.narrator.scrollback_capacity,
            config.narrator.typing_delay_min,
            config.narrator.typing_delay_max,
        );
        let badges = BadgeEngine::new(config.badges.award_chance, config.badges.toast_duration);

        let mut session = Self {
            config,
            store: MetricStore::new(),
            ratchet: PhaseRatchet::new(),
            badges,
            narrator,
            scheduler: EventScheduler::new(),
            rng,
            display_rng,
            display: None,
            outbox: Vec::new(),
            now: Duration::ZERO,
            glitch_active: false,
            prompt: None,
            screen_flipped: false,
            ended: false,
        };

        for kind in [
            TimerKind::SpiralTick,
            TimerKind::NarratorAmbient,
            TimerKind::PhaseGate,
            TimerKind::ExistentialPrompt,
            TimerKind::BadgeCheck,
        ] {
            let first = session.period_for(kind);
            session.scheduler.schedule(kind, first, Repeat::Repeating);
        }
        session.say(
            ExperiencePhase::Intro.entry_line(),
            NarratorSource::PhaseTransition,
            Duration::ZERO,
        );

        tracing::info!(
            seed = ?session.config.runtime.seed,
            timers = session.scheduler.pending(),
            "Session started"
        );
        session
    }

    /// Start a session seeded from the configuration (or OS entropy)
    #[must_use]
    pub fn from_config(config: SessionConfig) -> Self {
        let rng: Box<dyn RandomSource> = match config.runtime.seed {
            Some(seed) => Box::new(SeededRandom::from_seed(seed)),
            None => Box::new(SeededRandom::from_entropy()),
        };
        Self::new(config, rng)
    }

    /// Replace the display randomness used for text scrambling
    #[must_use]
    pub fn with_display_rng(mut self, rng: Box<dyn RandomSource>) -> Self {
        self.display_rng = rng;
        self
    }

    // =========================================================================
    // Clock
    // =========================================================================

    /// Advance session time to `now` and fire everything due.
    ///
    /// Time never moves backwards; an earlier `now` is treated as the current
    /// time. After the session ended this does nothing.
    pub fn tick(&mut self, now: Duration) {
        if self.ended {
            return;
        }
        self.advance_clock(now);
        let now = self.now;

        while let Some(timer) = self.scheduler.pop_due(now) {
            self.fire(&timer);
            let period = self.period_for(timer.kind);
            self.scheduler.rearm(&timer, period);
        }

        let delivered = self.narrator.poll(now);
        if let Some(last) = delivered.last() {
            self.display = Some(ScrambledText::new(
                last.text.clone(),
                self.config.scramble_multiplier,
            ));
        }
        for line in delivered {
            self.outbox.push(EngineMessage::NarratorLine { line });
        }
        if let Some(display) = self.display.as_mut() {
            display.update(
                now,
                self.store.current().chaos_level,
                self.display_rng.as_mut(),
            );
        }

        self.sync_screen_flip();
    }

    fn advance_clock(&mut self, now: Duration) {
        if now > self.now {
            self.now = now;
        }
    }

    /// Period a timer is (re-)armed with, read from the current snapshot
    fn period_for(&self, kind: TimerKind) -> Duration {
        let timers = &self.config.timers;
        match kind {
            TimerKind::SpiralTick => timers.spiral_period,
            TimerKind::NarratorAmbient => self
                .config
                .narrator
                .period_for(derive::narrator_phase(self.store.current())),
            TimerKind::PhaseGate => timers.phase_gate_period,
            TimerKind::ExistentialPrompt => timers.prompt_period,
            TimerKind::BadgeCheck => timers.badge_check_period,
            TimerKind::GlitchClear | TimerKind::PromptHide | TimerKind::ToastDismiss(_) => {
                Duration::ZERO
            }
        }
    }

    // =========================================================================
    // Timer Handlers
    // =========================================================================

    fn fire(&mut self, timer: &ScheduledTimer) {
        let at = timer.due;
        match timer.kind {
            TimerKind::SpiralTick => self.on_spiral_tick(at),
            TimerKind::NarratorAmbient => self.on_narrator_tick(at),
            TimerKind::PhaseGate => self.on_phase_gate(at),
            TimerKind::ExistentialPrompt => self.on_prompt_tick(at),
            TimerKind::BadgeCheck => {
                if let Some(badge) = self.badges.evaluate(self.store.current(), self.rng.as_mut())
                {
                    self.award(badge, at);
                }
            }
            TimerKind::GlitchClear => {
                if self.glitch_active {
                    self.glitch_active = false;
                    self.outbox.push(EngineMessage::GlitchCleared);
                }
            }
            TimerKind::PromptHide => {
                if self.prompt.take().is_some() {
                    self.outbox.push(EngineMessage::PromptHidden);
                }
            }
            TimerKind::ToastDismiss(badge) => {
                if self.badges.dismiss_toast(badge) {
                    self.outbox.push(EngineMessage::ToastDismissed { badge });
                }
            }
        }
    }

    fn on_spiral_tick(&mut self, at: Duration) {
        let depth = self.store.increment_spiral_depth();
        let frustration = self
            .store
            .add_frustration(self.config.timers.frustration_per_tick);

        let glitch = self.rng.chance(self.config.timers.glitch_chance);
        if glitch && !self.glitch_active {
            self.glitch_active = true;
            let intensity = derive::glitch_intensity(self.store.current());
            self.outbox.push(EngineMessage::GlitchStarted { intensity });
            self.scheduler.schedule(
                TimerKind::GlitchClear,
                at + self.config.timers.glitch_duration,
                Repeat::Once,
            );
        }
        tracing::debug!(depth, frustration, glitch, "Spiral tick");
    }

    fn on_narrator_tick(&mut self, at: Duration) {
        if self.rng.chance(self.config.narrator.skip_chance) {
            return;
        }
        let phase = derive::narrator_phase(self.store.current());
        let pool = lines::pool(phase);
        if let Some(i) = self.rng.index(pool.len()) {
            self.say(pool[i], NarratorSource::Ambient, at);
        }
    }

    fn on_phase_gate(&mut self, at: Duration) {
        let corruption =
            derive::corruption_percentage(CorruptionFormula::PhaseGate, self.store.current());
        if let Some(transition) = self.ratchet.check(corruption) {
            self.enter(transition, at);
        }
    }

    fn on_prompt_tick(&mut self, at: Duration) {
        let s = self.store.current();
        let timers = &self.config.timers;
        if self.prompt.is_some()
            || s.spiral_depth < timers.prompt_min_spiral_depth
            || s.chaos_level < timers.prompt_min_chaos
        {
            return;
        }
        let Some(i) = self.rng.index(lines::EXISTENTIAL_PROMPTS.len()) else {
            return;
        };
        let text = lines::EXISTENTIAL_PROMPTS[i].to_string();
        self.prompt = Some(text.clone());
        self.outbox.push(EngineMessage::PromptShown { text });
        self.scheduler.schedule(
            TimerKind::PromptHide,
            at + self.config.timers.prompt_duration,
            Repeat::Once,
        );
    }

    // =========================================================================
    // Shared Effects
    // =========================================================================

    /// Apply a phase transition made at `at`: store, message, entry lines, mirror hand-off
    fn enter(&mut self, transition: PhaseTransition, at: Duration) {
        self.store.advance_experience_phase(transition.to);
        tracing::info!(
            from = %transition.from,
            to = %transition.to,
            corruption = ?transition.corruption,
            "Experience phase advanced"
        );
        self.outbox.push(EngineMessage::PhaseAdvanced {
            from: transition.from,
            to: transition.to,
            corruption: transition.corruption,
        });
        for phase in transition.entered() {
            self.say(phase.entry_line(), NarratorSource::PhaseTransition, at);
        }
        if self.ratchet.take_mirror_trigger() {
            tracing::info!("Mirror confrontation triggered");
            self.outbox.push(EngineMessage::MirrorConfrontation);
        }
    }

    /// Record a badge and put its toast up. Returns `false` if already held.
    fn award(&mut self, badge: BadgeId, at: Duration) -> bool {
        if !self.store.earn_badge(badge) {
            return false;
        }
        let toast = self.badges.show_toast(badge, at);
        self.scheduler
            .schedule(TimerKind::ToastDismiss(badge), toast.dismiss_at, Repeat::Once);
        tracing::info!(badge = %badge, "Badge awarded");
        self.outbox.push(EngineMessage::ToastShown { toast });
        true
    }

    fn say(&mut self, text: &str, source: NarratorSource, at: Duration) {
        self.narrator.push(text, source, at, self.rng.as_mut());
    }

    fn say_random(&mut self, pool: &[&str], source: NarratorSource) {
        if let Some(i) = self.rng.index(pool.len()) {
            self.say(pool[i], source, self.now);
        }
    }

    fn sync_screen_flip(&mut self) {
        let flipped = derive::screen_flipped(self.store.current());
        if flipped != self.screen_flipped {
            self.screen_flipped = flipped;
            tracing::debug!(flipped, "Screen flip changed");
            self.outbox.push(EngineMessage::ScreenFlip { flipped });
        }
    }

    // =========================================================================
    // Surface Events
    // =========================================================================

    /// Apply one surface event at session time `now`.
    ///
    /// Events only mutate state; timers fire on the next [`Session::tick`].
    /// Events after the session ended are ignored.
    pub fn handle_event(&mut self, event: SurfaceEvent, now: Duration) {
        if self.ended {
            tracing::debug!(event = event.name(), "Ignoring event after session end");
            return;
        }
        self.advance_clock(now);
        tracing::debug!(event = event.name(), "Surface event");

        match event {
            SurfaceEvent::Interaction { kind } => {
                self.store.record_interaction(kind);
            }
            SurfaceEvent::SetSpiralDepth { depth } => {
                self.store.set_spiral_depth(|_| depth);
            }
            SurfaceEvent::SetFrustration { score } => {
                self.store.set_frustration_score(|_| score);
            }
            SurfaceEvent::SuspicionRaised => {
                self.store.bump_suspicion();
            }
            SurfaceEvent::ChaosRaised => {
                self.store.bump_chaos();
            }
            SurfaceEvent::ForcedChoice => {
                self.store.add_frustration(FORCED_CHOICE_FRUSTRATION);
            }
            SurfaceEvent::ChallengeCompleted { challenge } => {
                tracing::info!(challenge = %challenge, "Challenge completed");
                self.store.bump_suspicion();
                self.say_random(lines::CHALLENGE_COMPLETED, NarratorSource::Scripted);
            }
            SurfaceEvent::ChallengeFailed { challenge } => {
                tracing::info!(challenge = %challenge, "Challenge failed");
                self.store.record_interaction(InteractionKind::Error);
                self.say_random(lines::CHALLENGE_FAILED, NarratorSource::Scripted);
            }
            SurfaceEvent::MirrorResolved => {
                if let Some(transition) = self.ratchet.resolve_mirror() {
                    self.enter(transition, self.now);
                } else {
                    tracing::warn!(
                        phase = %self.ratchet.current(),
                        "Mirror resolved outside the mirror phase"
                    );
                }
            }
            SurfaceEvent::GrantBadge { badge } => {
                self.award(badge, self.now);
            }
            SurfaceEvent::NarratorMessage { text } => {
                self.say(&text, NarratorSource::External, self.now);
            }
            SurfaceEvent::EndSession => self.end(),
        }

        self.sync_screen_flip();
    }

    /// End the session: cancel every timer and drop undelivered lines.
    ///
    /// Idempotent; only the first call emits [`EngineMessage::SessionEnded`].
    pub fn end(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;
        let cancelled = self.scheduler.cancel_all();
        let dropped = self.narrator.clear_pending();
        #[allow(clippy::cast_possible_truncation)]
        let elapsed_ms = self.now.as_millis() as u64;
        tracing::info!(elapsed_ms, cancelled, dropped, "Session ended");
        self.outbox.push(EngineMessage::SessionEnded { elapsed_ms });
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Take every message produced since the last drain
    pub fn drain_messages(&mut self) -> Vec<EngineMessage> {
        std::mem::take(&mut self.outbox)
    }

    /// Clone of the current raw signals
    #[must_use]
    pub fn snapshot(&self) -> MetricSnapshot {
        self.store.snapshot()
    }

    /// Derived values for the current snapshot
    #[must_use]
    pub fn derived(&self) -> DerivedState {
        DerivedState::compute(self.store.current())
    }

    /// Full render state
    #[must_use]
    pub fn view(&self) -> SessionView {
        #[allow(clippy::cast_possible_truncation)]
        let elapsed_ms = self.now.as_millis() as u64;
        SessionView {
            elapsed_ms,
            metrics: self.store.snapshot(),
            derived: self.derived(),
            narrator_latest: self.narrator.latest().cloned(),
            narrator_display: self.display.as_ref().map(|d| d.rendered().to_string()),
            scrollback: self.narrator.scrollback().cloned().collect(),
            narrator_typing: self.narrator.is_typing(),
            glitch_active: self.glitch_active,
            prompt: self.prompt.clone(),
            toasts: self.badges.toasts().to_vec(),
            mirror_triggered: self.ratchet.mirror_triggered(),
            ended: self.ended,
        }
    }

    /// Current session time
    #[must_use]
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Whether [`Session::end`] has run
    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Current experience phase
    #[must_use]
    pub fn experience_phase(&self) -> ExperiencePhase {
        self.ratchet.current()
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Earliest session time anything is scheduled to happen
    #[must_use]
    pub fn next_wakeup(&self) -> Option<Duration> {
        match (self.scheduler.next_due(), self.narrator.next_due()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("now", &self.now)
            .field("phase", &self.ratchet.current())
            .field("metrics", self.store.current())
            .field("pending_timers", &self.scheduler.pending())
            .field("ended", &self.ended)
            .finish_non_exhaustive()
    }
}
