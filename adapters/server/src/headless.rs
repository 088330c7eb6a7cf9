//! Runs a session as fast as possible with scripted players.

use std::time::Duration;

use pit_defence_core::{Command, Event, PlayerId, SessionId, SessionSnapshot};
use pit_defence_world::query;
use tracing::{debug, info};

use crate::{autopilot::Autopilot, config::ServerConfig, session::Session, store::SessionDocument};

/// Result of a headless run.
#[derive(Clone, Debug, PartialEq)]
pub struct HeadlessRun {
    /// Persistable summary at the end of the run.
    pub document: SessionDocument,
    /// Final snapshot.
    pub snapshot: SessionSnapshot,
    /// Simulation steps executed.
    pub steps: u64,
    /// Weapons successfully placed by the bots.
    pub weapons_placed: u32,
}

/// Plays a session with `players` bots until it ends or `limit` of
/// simulated time elapsed.
#[must_use]
pub fn run_headless(
    id: SessionId,
    config: &ServerConfig,
    players: u32,
    limit: Duration,
) -> HeadlessRun {
    let mut session = Session::new(id, config);
    let map = query::map(session.world()).clone();
    let step = config.tick_interval();

    let mut bots: Vec<Autopilot> = (1..=players.max(1))
        .map(|index| Autopilot::new(PlayerId::new(index), &map))
        .collect();
    let mut weapons_placed = 0;
    for bot in &bots {
        let player = bot.player();
        let _ = session.submit(Command::Join {
            player,
            name: format!("Bot {player}"),
        });
    }

    let mut steps: u64 = 0;
    while !session.is_ended() && query::clock(session.world()) < limit {
        let snapshot = session.snapshot();
        for bot in &mut bots {
            for command in bot.decide(&snapshot, &map) {
                let events = session.submit(command);
                weapons_placed += count_placements(&events);
            }
        }

        let events = session.step(step);
        weapons_placed += count_placements(&events);
        steps += 1;
        if steps % 600 == 0 {
            debug!(
                session = %id,
                clock = ?query::clock(session.world()),
                overflow = query::overflow(session.world()),
                "headless progress"
            );
        }
    }

    let document = session.document();
    info!(
        session = %id,
        steps,
        outcome = ?document.outcome,
        waves = document.waves_completed,
        "headless run finished"
    );
    HeadlessRun {
        document,
        snapshot: session.snapshot(),
        steps,
        weapons_placed,
    }
}

fn count_placements(events: &[Event]) -> u32 {
    events
        .iter()
        .filter(|event| matches!(event, Event::WeaponPlaced { .. }))
        .count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use pit_defence_core::SessionStatus;

    #[test]
    fn bots_build_and_fight() {
        let config = ServerConfig {
            global_seed: 3,
            ..ServerConfig::default()
        };
        let run = run_headless(SessionId::new(1), &config, 2, Duration::from_secs(40));

        assert!(run.weapons_placed > 0);
        assert_eq!(run.snapshot.players.len(), 2);
        assert_ne!(run.snapshot.status, SessionStatus::Waiting);
        assert!(run.snapshot.enemies_defeated > 0 || !run.snapshot.enemies.is_empty());
    }

    #[test]
    fn headless_runs_are_reproducible() {
        let config = ServerConfig {
            global_seed: 8,
            ..ServerConfig::default()
        };
        let first = run_headless(SessionId::new(5), &config, 1, Duration::from_secs(20));
        let second = run_headless(SessionId::new(5), &config, 1, Duration::from_secs(20));
        assert_eq!(first, second);
    }
}
