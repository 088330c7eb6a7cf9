//! Directory of the sessions hosted by one server process.

use std::{collections::BTreeMap, sync::Arc};

use pit_defence_core::{Command, SessionId, SessionSnapshot};
use pit_defence_world::query;
use tokio::sync::watch;
use tracing::info;

use crate::{
    config::ServerConfig,
    runtime::{spawn_session, SessionError, SessionHandle, SessionReport},
    session::Session,
    store::SessionStore,
};

/// Creates sessions and routes commands to their tasks.
pub struct SessionRegistry {
    config: ServerConfig,
    store: Arc<dyn SessionStore>,
    next_id: u64,
    sessions: BTreeMap<SessionId, SessionHandle>,
}

impl SessionRegistry {
    /// Creates an empty registry persisting into `store`.
    #[must_use]
    pub fn new(config: ServerConfig, store: Arc<dyn SessionStore>) -> Self {
        Self {
            config,
            store,
            next_id: 1,
            sessions: BTreeMap::new(),
        }
    }

    /// Spawns a new session and returns its identifier.
    pub fn create(&mut self) -> SessionId {
        let id = SessionId::new(self.next_id);
        self.next_id += 1;

        let session = Session::new(id, &self.config);
        info!(
            session = %id,
            fallback = query::map(session.world()).is_fallback(),
            "session created"
        );
        let handle = spawn_session(session, &self.config, Arc::clone(&self.store));
        let _ = self.sessions.insert(id, handle);
        id
    }

    /// Number of sessions currently hosted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Reports whether no session is hosted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Routes a command to a hosted session.
    pub async fn send(&self, session: SessionId, command: Command) -> Result<(), SessionError> {
        self.sessions
            .get(&session)
            .ok_or(SessionError::UnknownSession(session))?
            .send(command)
            .await
    }

    /// Subscribes to the snapshots of a hosted session.
    pub fn subscribe(
        &self,
        session: SessionId,
    ) -> Result<watch::Receiver<SessionSnapshot>, SessionError> {
        self.sessions
            .get(&session)
            .map(SessionHandle::subscribe)
            .ok_or(SessionError::UnknownSession(session))
    }

    /// Stops hosting a session and waits for its report.
    pub async fn finish(&mut self, session: SessionId) -> Result<SessionReport, SessionError> {
        let handle = self
            .sessions
            .remove(&session)
            .ok_or(SessionError::UnknownSession(session))?;
        handle.finish().await
    }
}
