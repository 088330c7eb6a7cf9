//! Async task hosting one session at a fixed tick rate.

use std::{sync::Arc, time::Duration};

use pit_defence_core::{Command, Event, SessionId, SessionSnapshot, ShiftOutcome};
use thiserror::Error;
use tokio::{
    sync::{mpsc, watch},
    task::{JoinError, JoinHandle},
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::{
    config::ServerConfig,
    session::Session,
    store::{SessionDocument, SessionStore},
};

/// Failures surfaced to callers of a running session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session task stopped accepting commands.
    #[error("session {0} is closed")]
    Closed(SessionId),
    /// No session with the identifier is hosted.
    #[error("session {0} is not hosted")]
    UnknownSession(SessionId),
    /// The session task panicked or was cancelled.
    #[error("session task failed")]
    Failed(#[from] JoinError),
}

/// Summary returned once a session task finished.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionReport {
    /// Document written to the store.
    pub document: SessionDocument,
    /// Number of simulation steps executed.
    pub ticks: u64,
}

/// Client side of a running session task.
#[derive(Debug)]
pub struct SessionHandle {
    id: SessionId,
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<SessionSnapshot>,
    task: JoinHandle<SessionReport>,
}

impl SessionHandle {
    /// Identifier of the hosted session.
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Queues a command for the next loop iteration.
    pub async fn send(&self, command: Command) -> Result<(), SessionError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SessionError::Closed(self.id))
    }

    /// Receiver observing every published snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// Closes the inbox and waits for the task to persist the session.
    ///
    /// A session that is still running when its inbox closes is abandoned.
    pub async fn finish(self) -> Result<SessionReport, SessionError> {
        drop(self.commands);
        Ok(self.task.await?)
    }
}

/// Spawns the fixed-rate loop of a session on the current runtime.
pub fn spawn_session(
    session: Session,
    config: &ServerConfig,
    store: Arc<dyn SessionStore>,
) -> SessionHandle {
    let id = session.id();
    let (commands, inbox) = mpsc::channel(config.command_buffer.max(1));
    let (publisher, snapshots) = watch::channel(session.snapshot());
    let step = config.tick_interval();
    let task = tokio::spawn(run(session, inbox, publisher, store, step));

    SessionHandle {
        id,
        commands,
        snapshots,
        task,
    }
}

async fn run(
    mut session: Session,
    mut inbox: mpsc::Receiver<Command>,
    publisher: watch::Sender<SessionSnapshot>,
    store: Arc<dyn SessionStore>,
    step: Duration,
) -> SessionReport {
    let id = session.id();
    let mut ticker = interval(step);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut ticks: u64 = 0;
    info!(session = %id, seed = session.seed(), ?step, "session started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let events = session.step(step);
                ticks += 1;
                settle(id, &events, store.as_ref());
                let _ = publisher.send_replace(session.snapshot());
            }
            command = inbox.recv() => {
                let Some(command) = command else {
                    if !session.is_ended() {
                        warn!(session = %id, "inbox closed before the shift ended");
                        let events = session.submit(Command::EndShift {
                            outcome: ShiftOutcome::Abandoned,
                        });
                        settle(id, &events, store.as_ref());
                        let _ = publisher.send_replace(session.snapshot());
                    }
                    break;
                };
                debug!(session = %id, ?command, "command received");
                let events = session.submit(command);
                settle(id, &events, store.as_ref());
                let _ = publisher.send_replace(session.snapshot());
            }
        }

        if session.is_ended() {
            break;
        }
    }

    let document = session.document();
    store.put(document.clone());
    info!(
        session = %id,
        outcome = ?document.outcome,
        waves = document.waves_completed,
        ticks,
        "session finished"
    );
    SessionReport { document, ticks }
}

/// Books credits granted by forfeits and shift endings.
fn settle(session: SessionId, events: &[Event], store: &dyn SessionStore) {
    for event in events {
        match event {
            Event::PlayerForfeited { player, credits } => {
                info!(%session, %player, credits, "player forfeited");
                store.credit(*player, *credits);
            }
            Event::ShiftEnded { outcome, payouts } => {
                info!(%session, ?outcome, players = payouts.len(), "shift ended");
                for payout in payouts {
                    store.credit(payout.player, payout.credits);
                }
            }
            Event::WaveStageChanged { stage, wave, phase } => {
                info!(%session, ?stage, wave, phase, "wave stage changed");
            }
            Event::CommandRejected { player, reason } => {
                debug!(%session, %player, ?reason, "command rejected");
            }
            Event::PlacementRejected { player, reason, .. } => {
                debug!(%session, %player, ?reason, "placement rejected");
            }
            _ => {}
        }
    }
}
