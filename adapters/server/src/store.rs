//! Persistence boundary for finished sessions and player credits.

use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use pit_defence_core::{MapDocument, Payout, PlayerId, SessionId, SessionStatus, ShiftOutcome};
use serde::{Deserialize, Serialize};

/// Persisted summary of a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionDocument {
    /// Session identifier.
    pub session: SessionId,
    /// Seed every random stream of the session was derived from.
    pub seed: u64,
    /// Map the session was played on.
    pub map: MapDocument,
    /// Lifecycle status when the document was written.
    pub status: SessionStatus,
    /// Terminal state, once reached.
    pub outcome: Option<ShiftOutcome>,
    /// Waves fully played.
    pub waves_completed: u32,
    /// Enemies destroyed.
    pub enemies_defeated: u32,
    /// Session clock when the document was written.
    pub clock: Duration,
    /// Credits granted when the session ended.
    pub payouts: Vec<Payout>,
}

/// Storage collaborator shared by every session task.
pub trait SessionStore: Send + Sync {
    /// Loads a stored session document.
    fn get(&self, session: SessionId) -> Option<SessionDocument>;

    /// Stores a session document, replacing any previous version.
    fn put(&self, document: SessionDocument);

    /// Adds credits to a player's balance.
    fn credit(&self, player: PlayerId, amount: u32);

    /// Current credit balance of a player.
    fn balance(&self, player: PlayerId) -> u32;
}

#[derive(Debug, Default)]
struct Records {
    sessions: BTreeMap<SessionId, SessionDocument>,
    balances: BTreeMap<PlayerId, u32>,
}

/// Process-local store used by the binary and tests.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: Mutex<Records>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> MutexGuard<'_, Records> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionStore for InMemoryStore {
    fn get(&self, session: SessionId) -> Option<SessionDocument> {
        self.records().sessions.get(&session).cloned()
    }

    fn put(&self, document: SessionDocument) {
        let _ = self.records().sessions.insert(document.session, document);
    }

    fn credit(&self, player: PlayerId, amount: u32) {
        let mut records = self.records();
        let balance = records.balances.entry(player).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    fn balance(&self, player: PlayerId) -> u32 {
        self.records().balances.get(&player).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pit_defence_system_mapgen::fallback_layout;

    fn document() -> SessionDocument {
        SessionDocument {
            session: SessionId::new(4),
            seed: 77,
            map: fallback_layout(10).document(),
            status: SessionStatus::Ended,
            outcome: Some(ShiftOutcome::Defeat),
            waves_completed: 3,
            enemies_defeated: 41,
            clock: Duration::from_millis(95_500),
            payouts: vec![Payout {
                player: PlayerId::new(1),
                credits: 35,
            }],
        }
    }

    #[test]
    fn documents_are_replaced_by_session() {
        let store = InMemoryStore::new();
        assert_eq!(store.get(SessionId::new(4)), None);

        store.put(document());
        let mut updated = document();
        updated.waves_completed = 4;
        store.put(updated.clone());

        assert_eq!(store.get(SessionId::new(4)), Some(updated));
    }

    #[test]
    fn credits_accumulate_per_player() {
        let store = InMemoryStore::new();
        store.credit(PlayerId::new(1), 30);
        store.credit(PlayerId::new(1), 12);
        store.credit(PlayerId::new(2), 5);

        assert_eq!(store.balance(PlayerId::new(1)), 42);
        assert_eq!(store.balance(PlayerId::new(2)), 5);
        assert_eq!(store.balance(PlayerId::new(3)), 0);
    }

    #[test]
    fn documents_survive_json_and_bincode() {
        let original = document();

        let json = serde_json::to_string(&original).expect("serialize json");
        assert!(json.contains("\"corePaths\""));
        let from_json: SessionDocument = serde_json::from_str(&json).expect("deserialize json");
        assert_eq!(from_json, original);

        let bytes = bincode::serialize(&original).expect("serialize bincode");
        let from_bincode: SessionDocument =
            bincode::deserialize(&bytes).expect("deserialize bincode");
        assert_eq!(from_bincode, original);
    }
}
