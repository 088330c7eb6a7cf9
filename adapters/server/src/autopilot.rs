//! Scripted player used by the headless runner and soak tests.

use std::time::Duration;

use pit_defence_core::{
    CellCoord, CellPoint, Command, Direction, MapLayout, PlayerId, PlayerSnapshot, SessionSnapshot,
    SessionStatus, WaveStage,
};

/// Placements attempted before the bot stops building.
const MAX_PLACEMENT_ATTEMPTS: usize = 24;
/// Minimum time between two placement attempts.
const PLACEMENT_RETRY: Duration = Duration::from_millis(1000);
/// Distance at which the bot tries to pick up scrap.
const PICKUP_DISTANCE: f32 = 2.0;

/// Bot that readies up, builds next to the corridor, gathers scrap and
/// always takes the first boost offered.
#[derive(Clone, Debug)]
pub struct Autopilot {
    player: PlayerId,
    sites: Vec<CellCoord>,
    attempts: usize,
    last_attempt: Option<Duration>,
}

impl Autopilot {
    /// Creates a bot for `player`, ranking build sites by distance to the pit.
    #[must_use]
    pub fn new(player: PlayerId, map: &MapLayout) -> Self {
        Self {
            player,
            sites: build_sites(map),
            attempts: 0,
            last_attempt: None,
        }
    }

    /// Player the bot controls.
    #[must_use]
    pub const fn player(&self) -> PlayerId {
        self.player
    }

    /// Commands the bot issues after observing `snapshot`.
    pub fn decide(&mut self, snapshot: &SessionSnapshot, map: &MapLayout) -> Vec<Command> {
        let player = self.player;
        let Some(me) = snapshot.players.iter().find(|state| state.id == player) else {
            return Vec::new();
        };

        let mut commands = Vec::new();
        match snapshot.status {
            SessionStatus::Waiting if !me.ready => commands.push(Command::MarkReady { player }),
            SessionStatus::Planning => {
                self.try_place(snapshot.clock, &mut commands);
                if self.attempts >= 2 {
                    commands.push(Command::StartWave { player });
                }
            }
            SessionStatus::Active if !snapshot.paused => {
                if snapshot.stage == WaveStage::Break {
                    commands.push(Command::EndBreak { player });
                }
                if me.pending_offer.as_ref().is_some_and(|offer| !offer.is_empty()) {
                    commands.push(Command::ChooseBoost { player, index: 0 });
                }
                self.try_place(snapshot.clock, &mut commands);
                gather(me, snapshot, map, &mut commands);
            }
            _ => {}
        }
        commands
    }

    fn try_place(&mut self, clock: Duration, commands: &mut Vec<Command>) {
        if self.attempts >= MAX_PLACEMENT_ATTEMPTS {
            return;
        }
        if self
            .last_attempt
            .is_some_and(|last| clock.saturating_sub(last) < PLACEMENT_RETRY)
        {
            return;
        }
        let Some(origin) = self.sites.get(self.attempts).copied() else {
            return;
        };

        self.attempts += 1;
        self.last_attempt = Some(clock);
        commands.push(Command::PlaceWeapon {
            player: self.player,
            origin,
        });
    }
}

/// Collects reachable scrap, otherwise walks toward the nearest pickup.
fn gather(
    me: &PlayerSnapshot,
    snapshot: &SessionSnapshot,
    map: &MapLayout,
    commands: &mut Vec<Command>,
) {
    let Some(nearest) = snapshot.scrap.iter().min_by(|a, b| {
        me.position
            .distance(a.position)
            .total_cmp(&me.position.distance(b.position))
    }) else {
        return;
    };

    if me.position.distance(nearest.position) <= PICKUP_DISTANCE {
        commands.push(Command::CollectScrap {
            player: me.id,
            scrap: nearest.id,
        });
    } else if let Some(to) = nearest_corridor(map, nearest.position) {
        commands.push(Command::MovePlayer { player: me.id, to });
    }
}

fn nearest_corridor(map: &MapLayout, point: CellPoint) -> Option<CellCoord> {
    map.corridor()
        .iter()
        .copied()
        .min_by(|a, b| point.distance(a.to_point()).total_cmp(&point.distance(b.to_point())))
}

/// Buildable cells touching the corridor, closest to the pit first.
fn build_sites(map: &MapLayout) -> Vec<CellCoord> {
    let pit = map.pit().center();
    let mut sites: Vec<CellCoord> = map
        .corridor()
        .iter()
        .flat_map(|cell| {
            let cell = *cell;
            Direction::ALL
                .into_iter()
                .filter_map(move |direction| cell.step(direction))
        })
        .filter(|cell| {
            map.in_bounds(*cell) && !map.is_corridor(*cell) && !map.pit().contains(*cell)
        })
        .collect();
    sites.sort();
    sites.dedup();
    sites.sort_by(|a, b| pit.distance(a.to_point()).total_cmp(&pit.distance(b.to_point())));

    // Spread consecutive attempts out so footprints rarely overlap.
    let mut spread = Vec::with_capacity(sites.len());
    for cell in sites {
        if spread
            .iter()
            .all(|placed: &CellCoord| placed.manhattan_distance(cell) >= 4)
        {
            spread.push(cell);
        }
    }
    spread
}
