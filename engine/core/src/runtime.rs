//! Session Runtime
//!
//! Drives a [`Session`] from a single tokio task. The task owns the session
//! outright (no locks) and waits on three things at once:
//!
//! ```text
//!            ┌──────────────────────── session task ─────────────────────┐
//!  interval ─┤ tick(elapsed)                                             │
//!  events  ──┤ handle_event(ev, elapsed)     ──► drain_messages ──► mpsc ├─► surface
//!  shutdown ─┤ end()                         ──► view()         ──► watch├─► surface
//!            └───────────────────────────────────────────────────────────┘
//! ```
//!
//! Session time is `tokio::time::Instant::elapsed` since the task started, so
//! tests running with a paused clock see exact virtual time. Timers inside the
//! session are polled on the heartbeat; nothing sleeps.
//!
//! Dropping the [`RuntimeHandle`] aborts the task. [`RuntimeHandle::shutdown`]
//! ends the session first and returns the final view.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::events::SurfaceEvent;
use crate::messages::{EngineMessage, SessionView};
use crate::session::Session;

/// Errors from talking to a running session
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The session task is gone (ended, shut down or aborted)
    #[error("Session runtime is no longer running")]
    Closed,

    /// The session task panicked or was cancelled
    #[error("Session runtime task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Spawns session tasks
pub struct SessionRuntime;

impl SessionRuntime {
    /// Move `session` into a new task on the current tokio runtime.
    ///
    /// The heartbeat interval and inbox size come from the session's
    /// configuration.
    #[must_use]
    pub fn spawn(session: Session) -> RuntimeHandle {
        let tick_interval = session.config().runtime.tick_interval;
        let buffer = session.config().runtime.event_buffer.max(1);

        let (events_tx, events_rx) = mpsc::channel(buffer);
        let (messages_tx, messages_rx) = mpsc::unbounded_channel();
        let (view_tx, view_rx) = watch::channel(session.view());
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let task = tokio::spawn(run(
            session,
            tick_interval,
            events_rx,
            shutdown_rx,
            messages_tx,
            view_tx,
        ));

        RuntimeHandle {
            events: events_tx,
            messages: messages_rx,
            view: view_rx,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }
}

async fn run(
    mut session: Session,
    tick_interval: Duration,
    mut events: mpsc::Receiver<SurfaceEvent>,
    mut shutdown: oneshot::Receiver<()>,
    messages: mpsc::UnboundedSender<EngineMessage>,
    view: watch::Sender<SessionView>,
) -> SessionView {
    let start = Instant::now();
    let mut heartbeat = tokio::time::interval(tick_interval.max(Duration::from_millis(1)));
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(
        tick_ms = tick_interval.as_millis() as u64,
        "Session runtime started"
    );

    loop {
        tokio::select! {
            _ = heartbeat.tick() => {
                session.tick(start.elapsed());
            }
            event = events.recv() => match event {
                Some(event) => session.handle_event(event, start.elapsed()),
                None => {
                    tracing::debug!("All event senders dropped, ending session");
                    session.end();
                }
            },
            _ = &mut shutdown => {
                tracing::debug!("Shutdown requested");
                session.end();
            }
        }

        for message in session.drain_messages() {
            // A surface that stopped listening is not an engine error
            let _ = messages.send(message);
        }
        view.send_replace(session.view());

        if session.is_ended() {
            break;
        }
    }

    tracing::info!(elapsed_ms = session.view().elapsed_ms, "Session runtime stopped");
    session.view()
}

/// Surface-side handle to a running session
pub struct RuntimeHandle {
    events: mpsc::Sender<SurfaceEvent>,
    messages: mpsc::UnboundedReceiver<EngineMessage>,
    view: watch::Receiver<SessionView>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<SessionView>>,
}

impl RuntimeHandle {
    /// Deliver a surface event
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Closed`] if the session task has stopped.
    pub async fn send(&self, event: SurfaceEvent) -> Result<(), RuntimeError> {
        self.events
            .send(event)
            .await
            .map_err(|_| RuntimeError::Closed)
    }

    /// Extra sender for surfaces that live in their own task
    #[must_use]
    pub fn sender(&self) -> mpsc::Sender<SurfaceEvent> {
        self.events.clone()
    }

    /// Latest published view
    #[must_use]
    pub fn view(&self) -> SessionView {
        self.view.borrow().clone()
    }

    /// Watch receiver that sees every published view
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view.clone()
    }

    /// Next engine message; `None` once the task has stopped and the queue is empty
    pub async fn next_message(&mut self) -> Option<EngineMessage> {
        self.messages.recv().await
    }

    /// Next engine message if one is already queued
    pub fn try_next_message(&mut self) -> Option<EngineMessage> {
        self.messages.try_recv().ok()
    }

    /// Whether the session task has stopped
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// End the session and wait for the task to stop.
    ///
    /// Returns the final view. Works whether or not the session already ended.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Join`] if the task panicked, or
    /// [`RuntimeError::Closed`] if it was already reaped.
    pub async fn shutdown(mut self) -> Result<SessionView, RuntimeError> {
        if let Some(tx) = self.shutdown.take() {
            // The task may already have ended on its own
            let _ = tx.send(());
        }
        let task = self.task.take().ok_or(RuntimeError::Closed)?;
        Ok(task.await?)
    }
}

impl Drop for RuntimeHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
