//! Read-only snapshots handed to systems and published to subscribers.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    boost::Boost,
    catalog::{Ability, EnemyProfile, WeaponSpec},
    map::MapDocument,
    CellPoint, CellRect, EnemyId, PathId, PlayerId, ProjectileId, ScrapId, SessionId,
    SessionStatus, ShiftOutcome, WaveStage, WeaponId,
};

/// Session-wide values systems need for one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickContext {
    /// Lifecycle status.
    pub status: SessionStatus,
    /// Whether the session is paused.
    pub paused: bool,
    /// Time elapsed since the session was created.
    pub clock: Duration,
    /// Duration of the most recent tick.
    pub dt: Duration,
    /// Whether enemies are frozen by a boost.
    pub frozen: bool,
    /// Shared heat.
    pub heat: f32,
    /// Shared health pool.
    pub overflow: i32,
}

impl TickContext {
    /// Reports whether combat advances this tick.
    #[must_use]
    pub fn simulating(&self) -> bool {
        self.status == SessionStatus::Active && !self.paused
    }
}

/// Immutable representation of a single enemy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemySnapshot {
    /// Unique identifier.
    pub id: EnemyId,
    /// Core path being followed.
    pub path: PathId,
    /// Index of the path cell the enemy departed from.
    pub path_index: usize,
    /// Fraction of the current segment already covered.
    pub progress: f32,
    /// Continuous position.
    pub position: CellPoint,
    /// Template the enemy was spawned from, with its maximum hit points.
    pub profile: EnemyProfile,
    /// Remaining hit points.
    pub hp: f32,
    /// Whether the enemy reached the pit.
    pub in_pit: bool,
    /// Pit slot once the enemy reached the pit.
    pub pit_slot: Option<u32>,
}

impl EnemySnapshot {
    /// Reports whether the enemy carries the given ability.
    #[must_use]
    pub fn has(&self, ability: Ability) -> bool {
        self.profile.has(ability)
    }
}

/// Read-only snapshot describing all enemies in the session.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Looks up a single enemy.
    #[must_use]
    pub fn get(&self, id: EnemyId) -> Option<&EnemySnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single placed weapon.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeaponSnapshot {
    /// Unique identifier.
    pub id: WeaponId,
    /// Owning player.
    pub owner: PlayerId,
    /// Weapon item that was placed.
    pub spec: WeaponSpec,
    /// Occupied footprint.
    pub region: CellRect,
    /// Remaining hit points.
    pub hp: u32,
    /// Heat accumulated by the weapon's own shots.
    pub heat: f32,
    /// Session clock value of the last shot.
    pub last_fired: Option<Duration>,
}

/// Read-only snapshot describing all placed weapons.
#[derive(Clone, Debug, Default)]
pub struct WeaponView {
    snapshots: Vec<WeaponSnapshot>,
}

impl WeaponView {
    /// Creates a new weapon view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<WeaponSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &WeaponSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<WeaponSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a homing projectile.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectileSnapshot {
    /// Unique identifier.
    pub id: ProjectileId,
    /// Current position.
    pub position: CellPoint,
    /// Enemy being tracked.
    pub target: EnemyId,
    /// Distance covered per tick, in cells.
    pub speed: f32,
    /// Damage applied on impact.
    pub damage: u32,
    /// Knockback applied on impact.
    pub knockback: f32,
    /// Player credited with a kill.
    pub owner: PlayerId,
}

/// Read-only snapshot describing all projectiles in flight.
#[derive(Clone, Debug, Default)]
pub struct ProjectileView {
    snapshots: Vec<ProjectileSnapshot>,
}

impl ProjectileView {
    /// Creates a new projectile view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<ProjectileSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &ProjectileSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<ProjectileSnapshot> {
        self.snapshots
    }
}

/// Scrap lying on the floor.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScrapSnapshot {
    /// Unique identifier.
    pub id: ScrapId,
    /// Where the scrap was dropped.
    pub position: CellPoint,
    /// Scrap gained on pickup.
    pub value: u32,
}

/// Public state of a player.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    /// Unique identifier.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Avatar position.
    pub position: CellPoint,
    /// Carried weapons.
    pub toolbelt: Vec<WeaponSpec>,
    /// Toolbelt slot used for placement.
    pub selected_slot: usize,
    /// Active stacking boosts.
    pub boosts: Vec<Boost>,
    /// Scrap collected toward the next boost.
    pub scrap: u32,
    /// Scrap collected over the whole session.
    pub lifetime_scrap: u32,
    /// Scrap needed for the next boost offer.
    pub pickup_threshold: u32,
    /// Threshold of the previous boost offer.
    pub previous_threshold: u32,
    /// Boosts waiting to be chosen.
    pub pending_offer: Option<Vec<Boost>>,
    /// Whether the player is ready.
    pub ready: bool,
}

/// Complete session state published to subscribers after every tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Session identifier.
    pub session: SessionId,
    /// Lifecycle status.
    pub status: SessionStatus,
    /// Whether the session is paused.
    pub paused: bool,
    /// Time elapsed since the session was created.
    pub clock: Duration,
    /// Number of ticks processed.
    pub tick: u64,
    /// Scheduler stage.
    pub stage: WaveStage,
    /// One-based wave number, zero before the first wave.
    pub wave: u32,
    /// Current phase.
    pub phase: u8,
    /// Shared heat.
    pub heat: f32,
    /// Shared health pool.
    pub overflow: i32,
    /// Enemies destroyed so far.
    pub enemies_defeated: u32,
    /// Remaining freeze time.
    pub freeze_remaining: Duration,
    /// Terminal state, once reached.
    pub outcome: Option<ShiftOutcome>,
    /// Map in wire shape.
    pub map: MapDocument,
    /// Players in join order.
    pub players: Vec<PlayerSnapshot>,
    /// Enemies in identifier order.
    pub enemies: Vec<EnemySnapshot>,
    /// Weapons in identifier order.
    pub weapons: Vec<WeaponSnapshot>,
    /// Projectiles in identifier order.
    pub projectiles: Vec<ProjectileSnapshot>,
    /// Scrap pickups in identifier order.
    pub scrap: Vec<ScrapSnapshot>,
}
