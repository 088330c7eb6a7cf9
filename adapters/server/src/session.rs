//! Deterministic session loop wiring the world to its systems.

use std::time::Duration;

use pit_defence_core::{Command, Event, Payout, SessionId, SessionSnapshot, SessionStatus};
use pit_defence_system_combat::CombatResolver;
use pit_defence_system_loot::BoostOffers;
use pit_defence_system_mapgen::MapGenerator;
use pit_defence_system_waves::WaveScheduler;
use pit_defence_world::{self as world, query, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::{
    config::ServerConfig,
    seeds::{derive_session_seed, derive_stream_seed, SeedStream},
    store::SessionDocument,
};

/// One hosted session: the authoritative world plus every system driving it.
///
/// All randomness derives from the session seed, so two sessions created
/// with the same configuration and fed the same commands stay identical.
#[derive(Debug)]
pub struct Session {
    seed: u64,
    world: World,
    scheduler: WaveScheduler,
    offers: BoostOffers,
    resolver: CombatResolver,
    payouts: Vec<Payout>,
}

impl Session {
    /// Generates the map and seeds every system of a new session.
    #[must_use]
    pub fn new(id: SessionId, config: &ServerConfig) -> Self {
        let seed = derive_session_seed(config.global_seed, id);
        let mut map_rng = ChaCha8Rng::seed_from_u64(derive_stream_seed(seed, SeedStream::Map));
        let map = MapGenerator::new().generate(&mut map_rng);

        Self {
            seed,
            world: World::new(id, map, config.world_config()),
            scheduler: WaveScheduler::new(derive_stream_seed(seed, SeedStream::Waves)),
            offers: BoostOffers::new(derive_stream_seed(seed, SeedStream::Boosts)),
            resolver: CombatResolver::new(),
            payouts: Vec::new(),
        }
    }

    /// Session identifier.
    #[must_use]
    pub fn id(&self) -> SessionId {
        query::session(&self.world)
    }

    /// Seed the session's random streams derive from.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Read-only access to the authoritative world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Reports whether the session reached a terminal state.
    #[must_use]
    pub fn is_ended(&self) -> bool {
        query::status(&self.world) == SessionStatus::Ended
    }

    /// Applies a command and lets the systems react until they fall silent.
    pub fn submit(&mut self, command: Command) -> Vec<Event> {
        let mut log = Vec::new();
        self.run_commands(vec![command], &mut log);
        log
    }

    /// Advances the session by one fixed step.
    ///
    /// The clock ticks first so the scheduler can spawn, then enemies move,
    /// weapons fire, heat resolves, projectiles fly and the outcome is
    /// checked. Every phase reads fresh views of the world.
    pub fn step(&mut self, dt: Duration) -> Vec<Event> {
        let mut log = Vec::new();
        self.run_commands(vec![Command::Tick { dt }], &mut log);

        let mut commands = Vec::new();
        let context = query::tick_context(&self.world);
        let enemies = query::enemy_view(&self.world);
        self.resolver
            .move_enemies(&context, &enemies, query::map(&self.world), &mut commands);
        self.run_commands(commands, &mut log);

        let mut commands = Vec::new();
        let context = query::tick_context(&self.world);
        let weapons = query::weapon_view(&self.world);
        let enemies = query::enemy_view(&self.world);
        let modifiers = query::modifier_table(&self.world);
        self.resolver
            .fire_weapons(&context, &weapons, &enemies, &modifiers, &mut commands);
        self.run_commands(commands, &mut log);

        let mut commands = Vec::new();
        let context = query::tick_context(&self.world);
        let weapons = query::weapon_view(&self.world);
        let enemies = query::enemy_view(&self.world);
        let modifiers = query::modifier_table(&self.world);
        self.resolver
            .resolve_heat(&context, &weapons, &enemies, &modifiers, &mut commands);
        self.run_commands(commands, &mut log);

        let mut commands = Vec::new();
        let context = query::tick_context(&self.world);
        let projectiles = query::projectile_view(&self.world);
        let enemies = query::enemy_view(&self.world);
        self.resolver
            .move_projectiles(&context, &projectiles, &enemies, &mut commands);
        self.run_commands(commands, &mut log);

        let mut commands = Vec::new();
        let context = query::tick_context(&self.world);
        self.resolver.resolve_outcome(&context, &mut commands);
        self.run_commands(commands, &mut log);

        log
    }

    /// Full snapshot published to subscribers.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        query::snapshot(&self.world)
    }

    /// Persistable summary of the session.
    #[must_use]
    pub fn document(&self) -> SessionDocument {
        let snapshot = self.snapshot();
        SessionDocument {
            session: snapshot.session,
            seed: self.seed,
            map: snapshot.map,
            status: snapshot.status,
            outcome: snapshot.outcome,
            waves_completed: query::waves_completed(&self.world),
            enemies_defeated: snapshot.enemies_defeated,
            clock: snapshot.clock,
            payouts: self.payouts.clone(),
        }
    }

    fn run_commands(&mut self, commands: Vec<Command>, log: &mut Vec<Event>) {
        let mut events = Vec::new();
        for command in commands {
            world::apply(&mut self.world, command, &mut events);
        }
        self.pump(events, log);
    }

    fn pump(&mut self, mut events: Vec<Event>, log: &mut Vec<Event>) {
        loop {
            if events.is_empty() {
                break;
            }
            self.record(&events);

            let mut commands = Vec::new();
            self.scheduler
                .handle(&events, query::map(&self.world), &mut commands);
            self.offers.handle(&events, &mut commands);
            log.append(&mut events);
            if commands.is_empty() {
                break;
            }

            for command in commands {
                world::apply(&mut self.world, command, &mut events);
            }
        }
    }

    fn record(&mut self, events: &[Event]) {
        for event in events {
            if let Event::ShiftEnded { payouts, .. } = event {
                self.payouts.clone_from(payouts);
            }
        }
    }
}
