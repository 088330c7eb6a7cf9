#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for a single Pit Defence session.
//!
//! The world is mutated exclusively through [`apply`], which validates every
//! command and reports the outcome as events. Systems observe the world
//! through the read-only helpers in [`query`].

mod enemies;
mod players;
mod weapons;

use std::{collections::BTreeMap, time::Duration};

use pit_defence_core::{
    Command, EnemyId, Event, MapLayout, Payout, PlayerId, ProjectileId, RejectionReason,
    ScrapId, SessionId, SessionStatus, ShiftOutcome, WaveStage, WeaponLoss,
    BASE_HEAT_DISSIPATION, MAX_PLAYERS, STARTING_OVERFLOW,
};

use enemies::{EnemyState, ProjectileState, ScrapPickup};
use players::{reject, PlayerState};
use weapons::WeaponRegistry;

/// Tunable rules applied by a world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldConfig {
    /// Shared health pool at session start.
    pub starting_overflow: i32,
    /// Minimum time between two placements of the same player.
    pub placement_cooldown: Duration,
    /// Maximum number of players admitted.
    pub max_players: usize,
    /// Pickup radius in cells before boosts.
    pub pickup_radius: f32,
    /// Duration of the freeze boost.
    pub freeze_duration: Duration,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            starting_overflow: STARTING_OVERFLOW,
            placement_cooldown: Duration::from_millis(1000),
            max_players: MAX_PLAYERS,
            pickup_radius: 2.0,
            freeze_duration: Duration::from_secs(5),
        }
    }
}

/// Represents the authoritative state of one session.
#[derive(Debug)]
pub struct World {
    session: SessionId,
    config: WorldConfig,
    map: MapLayout,
    status: SessionStatus,
    paused: bool,
    clock: Duration,
    last_dt: Duration,
    tick_index: u64,
    stage: WaveStage,
    wave: u32,
    phase: u8,
    waves_completed: u32,
    heat: f32,
    overflow: i32,
    freeze_remaining: Duration,
    enemies_defeated: u32,
    pit_count: u32,
    outcome: Option<ShiftOutcome>,
    players: Vec<PlayerState>,
    enemies: BTreeMap<EnemyId, EnemyState>,
    next_enemy_id: EnemyId,
    weapons: WeaponRegistry,
    projectiles: BTreeMap<ProjectileId, ProjectileState>,
    next_projectile_id: ProjectileId,
    scrap: BTreeMap<ScrapId, ScrapPickup>,
    next_scrap_id: ScrapId,
}

impl World {
    /// Creates a waiting session on the provided map.
    #[must_use]
    pub fn new(session: SessionId, map: MapLayout, config: WorldConfig) -> Self {
        Self {
            session,
            config,
            map,
            status: SessionStatus::Waiting,
            paused: false,
            clock: Duration::ZERO,
            last_dt: Duration::ZERO,
            tick_index: 0,
            stage: WaveStage::Waiting,
            wave: 0,
            phase: 1,
            waves_completed: 0,
            heat: 0.0,
            overflow: config.starting_overflow,
            freeze_remaining: Duration::ZERO,
            enemies_defeated: 0,
            pit_count: 0,
            outcome: None,
            players: Vec::new(),
            enemies: BTreeMap::new(),
            next_enemy_id: EnemyId::new(0),
            weapons: WeaponRegistry::new(),
            projectiles: BTreeMap::new(),
            next_projectile_id: ProjectileId::new(0),
            scrap: BTreeMap::new(),
            next_scrap_id: ScrapId::new(0),
        }
    }

    fn simulating(&self) -> bool {
        self.status == SessionStatus::Active && !self.paused
    }

    fn set_status(&mut self, status: SessionStatus, out_events: &mut Vec<Event>) {
        if self.status != status {
            self.status = status;
            out_events.push(Event::StatusChanged { status });
        }
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.tick_index = self.tick_index.saturating_add(1);
        self.clock = self.clock.saturating_add(dt);
        self.last_dt = dt;

        let simulating = self.simulating();
        if simulating {
            self.freeze_remaining = self.freeze_remaining.saturating_sub(dt);
            self.regenerate_enemies(dt);
            self.weapons.cool(BASE_HEAT_DISSIPATION);
        }
        out_events.push(Event::TimeAdvanced { dt, simulating });
    }

    fn set_wave_stage(
        &mut self,
        stage: WaveStage,
        wave: u32,
        phase: u8,
        out_events: &mut Vec<Event>,
    ) {
        if self.stage == WaveStage::Delay && stage != WaveStage::Delay {
            self.waves_completed = self.waves_completed.saturating_add(1);
        }

        self.stage = stage;
        self.wave = wave;
        self.phase = phase;
        out_events.push(Event::WaveStageChanged { stage, wave, phase });
    }

    fn end_shift(&mut self, outcome: ShiftOutcome, out_events: &mut Vec<Event>) {
        if self.status == SessionStatus::Ended {
            return;
        }

        let payouts: Vec<Payout> = self
            .players
            .iter()
            .map(|state| Payout {
                player: state.id,
                credits: self.payout_basis(state).shift_credits(outcome),
            })
            .collect();
        for state in &mut self.players {
            state.pending_offer = None;
        }

        self.outcome = Some(outcome);
        self.set_status(SessionStatus::Ended, out_events);
        out_events.push(Event::ShiftEnded { outcome, payouts });
    }
}

/// Player issuing the command, if the command originates from a player.
fn issuer(command: &Command) -> Option<PlayerId> {
    match command {
        Command::Join { player, .. }
        | Command::Leave { player }
        | Command::MarkReady { player }
        | Command::StartWave { player }
        | Command::EndBreak { player }
        | Command::PlaceWeapon { player, .. }
        | Command::DestroyWeapon { player, .. }
        | Command::MovePlayer { player, .. }
        | Command::Chat { player, .. }
        | Command::SaveToolbelt { player, .. }
        | Command::SelectSlot { player, .. }
        | Command::ChooseBoost { player, .. }
        | Command::SetPaused { player, .. }
        | Command::CollectScrap { player, .. }
        | Command::Forfeit { player } => Some(*player),
        _ => None,
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Once the session ended only ticks are processed; player commands are
/// rejected and system commands are ignored.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    if world.status == SessionStatus::Ended {
        match command {
            Command::Tick { dt } => world.tick(dt, out_events),
            other => {
                if let Some(player) = issuer(&other) {
                    reject(out_events, player, RejectionReason::InvalidStatus);
                }
            }
        }
        return;
    }

    match command {
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::Join { player, name } => world.join(player, name, out_events),
        Command::Leave { player } => world.leave(player, out_events),
        Command::MarkReady { player } => world.mark_ready(player, out_events),
        Command::StartWave { player } => world.start_wave(player, out_events),
        Command::EndBreak { player } => world.end_break(player, out_events),
        Command::PlaceWeapon { player, origin } => world.place_weapon(player, origin, out_events),
        Command::DestroyWeapon { player, weapon } => {
            world.destroy_weapon(player, weapon, out_events)
        }
        Command::MovePlayer { player, to } => world.move_player(player, to, out_events),
        Command::Chat { player, message } => world.chat(player, message, out_events),
        Command::SaveToolbelt { player, toolbelt } => {
            world.save_toolbelt(player, toolbelt, out_events)
        }
        Command::SelectSlot { player, slot } => world.select_slot(player, slot, out_events),
        Command::ChooseBoost { player, index } => world.choose_boost(player, index, out_events),
        Command::SetPaused { player, paused } => world.set_paused(player, paused, out_events),
        Command::CollectScrap { player, scrap } => world.collect_scrap(player, scrap, out_events),
        Command::Forfeit { player } => world.forfeit(player, out_events),
        Command::SetWaveStage { stage, wave, phase } => {
            world.set_wave_stage(stage, wave, phase, out_events)
        }
        Command::SpawnEnemy { path, profile } => world.spawn_enemy(path, profile, out_events),
        Command::MoveEnemy {
            enemy,
            path_index,
            progress,
            position,
        } => world.move_enemy(enemy, path_index, progress, position),
        Command::EnemyReachedPit { enemy } => world.enemy_reached_pit(enemy, out_events),
        Command::DropEnemy { enemy } => world.drop_enemy(enemy, out_events),
        Command::FireWeapon { weapon, heat } => world.fire_weapon(weapon, heat),
        Command::DamageEnemy {
            enemy,
            amount,
            knockback,
            owner,
        } => world.damage_enemy(enemy, amount, knockback, owner, out_events),
        Command::LaunchProjectile {
            weapon,
            target,
            damage,
            knockback,
        } => world.launch_projectile(weapon, target, damage, knockback, out_events),
        Command::MoveProjectile {
            projectile,
            position,
        } => world.move_projectile(projectile, position),
        Command::RemoveProjectile { projectile } => world.remove_projectile(projectile),
        Command::SetHeat { heat } => world.heat = heat.max(0.0),
        Command::DamageWeapon { weapon, amount } => {
            world.damage_weapon(weapon, amount, WeaponLoss::Overheat, out_events)
        }
        Command::OfferBoosts { player, boosts } => world.offer_boosts(player, boosts, out_events),
        Command::EndShift { outcome } => world.end_shift(outcome, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::{collections::BTreeMap, time::Duration};

    use super::World;
    use pit_defence_core::{
        EnemyView, MapLayout, ModifierTable, PlayerSnapshot, ProjectileView, ScrapSnapshot,
        SessionId, SessionSnapshot, SessionStatus, ShiftOutcome, TickContext, WaveStage,
        WeaponView,
    };

    /// Identifier of the session the world belongs to.
    #[must_use]
    pub fn session(world: &World) -> SessionId {
        world.session
    }

    /// Provides read-only access to the generated map.
    #[must_use]
    pub fn map(world: &World) -> &MapLayout {
        &world.map
    }

    /// Lifecycle status of the session.
    #[must_use]
    pub fn status(world: &World) -> SessionStatus {
        world.status
    }

    /// Terminal state, once reached.
    #[must_use]
    pub fn outcome(world: &World) -> Option<ShiftOutcome> {
        world.outcome
    }

    /// Shared health pool.
    #[must_use]
    pub fn overflow(world: &World) -> i32 {
        world.overflow
    }

    /// Shared heat.
    #[must_use]
    pub fn heat(world: &World) -> f32 {
        world.heat
    }

    /// Time elapsed since the session was created.
    #[must_use]
    pub fn clock(world: &World) -> Duration {
        world.clock
    }

    /// Mirrored scheduler stage.
    #[must_use]
    pub fn stage(world: &World) -> WaveStage {
        world.stage
    }

    /// Number of waves fully played.
    #[must_use]
    pub fn waves_completed(world: &World) -> u32 {
        world.waves_completed
    }

    /// Session-wide values systems need for one tick.
    #[must_use]
    pub fn tick_context(world: &World) -> TickContext {
        TickContext {
            status: world.status,
            paused: world.paused,
            clock: world.clock,
            dt: world.last_dt,
            frozen: !world.freeze_remaining.is_zero(),
            heat: world.heat,
            overflow: world.overflow,
        }
    }

    /// Captures a read-only view of the enemies in the session.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView::from_snapshots(world.enemies.values().map(|enemy| enemy.snapshot()).collect())
    }

    /// Captures a read-only view of the placed weapons.
    #[must_use]
    pub fn weapon_view(world: &World) -> WeaponView {
        WeaponView::from_snapshots(world.weapons.iter().map(|weapon| weapon.snapshot()).collect())
    }

    /// Captures a read-only view of the projectiles in flight.
    #[must_use]
    pub fn projectile_view(world: &World) -> ProjectileView {
        ProjectileView::from_snapshots(
            world
                .projectiles
                .values()
                .map(|projectile| projectile.snapshot())
                .collect(),
        )
    }

    /// Scrap pickups in identifier order.
    #[must_use]
    pub fn scrap(world: &World) -> Vec<ScrapSnapshot> {
        world.scrap.values().map(|pickup| pickup.snapshot()).collect()
    }

    /// Players in join order.
    #[must_use]
    pub fn players(world: &World) -> Vec<PlayerSnapshot> {
        world.players.iter().map(|player| player.snapshot()).collect()
    }

    /// Folded boost modifiers of every player.
    #[must_use]
    pub fn modifier_table(world: &World) -> ModifierTable {
        ModifierTable::new(
            world
                .players
                .iter()
                .map(|player| (player.id, player.modifiers()))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    /// Complete state published to subscribers.
    #[must_use]
    pub fn snapshot(world: &World) -> SessionSnapshot {
        SessionSnapshot {
            session: world.session,
            status: world.status,
            paused: world.paused,
            clock: world.clock,
            tick: world.tick_index,
            stage: world.stage,
            wave: world.wave,
            phase: world.phase,
            heat: world.heat,
            overflow: world.overflow,
            enemies_defeated: world.enemies_defeated,
            freeze_remaining: world.freeze_remaining,
            outcome: world.outcome,
            map: world.map.document(),
            players: players(world),
            enemies: enemy_view(world).into_vec(),
            weapons: weapon_view(world).into_vec(),
            projectiles: projectile_view(world).into_vec(),
            scrap: scrap(world),
        }
    }
}
