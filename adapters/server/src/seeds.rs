//! Deterministic seed derivation for session random streams.

use pit_defence_core::SessionId;
use sha2::{Digest, Sha256};

/// Independent random streams consumed by one session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeedStream {
    /// Map generation.
    Map,
    /// Wave table and waste rolls.
    Waves,
    /// Boost offers.
    Boosts,
}

impl SeedStream {
    const fn label(self) -> &'static str {
        match self {
            Self::Map => "pit-defence/map",
            Self::Waves => "pit-defence/waves",
            Self::Boosts => "pit-defence/boosts",
        }
    }
}

/// Seed of a session, derived from the server-wide seed and the session id.
#[must_use]
pub fn derive_session_seed(global_seed: u64, session: SessionId) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(global_seed.to_le_bytes());
    hasher.update(session.get().to_le_bytes());
    finalize_seed(hasher)
}

/// Seed of one labeled stream within a session.
#[must_use]
pub fn derive_stream_seed(session_seed: u64, stream: SeedStream) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(session_seed.to_le_bytes());
    hasher.update(stream.label().as_bytes());
    finalize_seed(hasher)
}

fn finalize_seed(hasher: Sha256) -> u64 {
    let digest = hasher.finalize();
    let mut bytes = [0_u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_seeds_depend_on_both_inputs() {
        let base = derive_session_seed(7, SessionId::new(1));
        assert_eq!(base, derive_session_seed(7, SessionId::new(1)));
        assert_ne!(base, derive_session_seed(8, SessionId::new(1)));
        assert_ne!(base, derive_session_seed(7, SessionId::new(2)));
    }

    #[test]
    fn streams_are_independent() {
        let session = derive_session_seed(42, SessionId::new(3));
        let map = derive_stream_seed(session, SeedStream::Map);
        let waves = derive_stream_seed(session, SeedStream::Waves);
        let boosts = derive_stream_seed(session, SeedStream::Boosts);
        assert_ne!(map, waves);
        assert_ne!(waves, boosts);
        assert_ne!(map, boosts);
    }
}
