#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Pit Defence session engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations (player intents as well as system decisions),
//! the world executes those commands via its `apply` entry point, and then
//! broadcasts [`Event`] values for systems to react to deterministically.
//! Systems consume event streams, query immutable views, and respond
//! exclusively with new command batches.

pub mod boost;
pub mod catalog;
pub mod map;
pub mod view;

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

pub use boost::{
    next_pickup_threshold, Boost, BoostEffect, BoostKind, BoostModifiers, BoostRarity,
    ModifierKey, ModifierTable, OneShotEffect, STARTING_PICKUP_THRESHOLD,
};
pub use catalog::{
    calculate_damage, Ability, DamageTag, EnemyProfile, FireShape, Material, WasteRarity,
    WeaponAdjective, WeaponKind, WeaponRarity, WeaponSpec, WeaponStats,
};
pub use map::{CorePath, MapDocument, MapLayout, PathColor};
pub use view::{
    EnemySnapshot, EnemyView, PlayerSnapshot, ProjectileSnapshot, ProjectileView,
    ScrapSnapshot, SessionSnapshot, TickContext, WeaponSnapshot, WeaponView,
};

/// Number of cell columns in every generated map.
pub const GRID_COLUMNS: u32 = 80;

/// Number of cell rows in every generated map.
pub const GRID_ROWS: u32 = 60;

/// Inward margin, in cells, that paths may never enter.
pub const GRID_PADDING: u32 = 2;

/// Width of the central pit measured in cells.
pub const PIT_WIDTH: u32 = 10;

/// Height of the central pit measured in cells.
pub const PIT_HEIGHT: u32 = 8;

/// Shared health pool every session starts with.
pub const STARTING_OVERFLOW: i32 = 1000;

/// Heat above which weapons start to take overheat damage.
pub const HEAT_THRESHOLD: f32 = 100.0;

/// Heat removed from the session every tick before boosts.
pub const BASE_HEAT_DISSIPATION: f32 = 0.5;

/// Maximum number of players admitted into one session.
pub const MAX_PLAYERS: usize = 4;

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident($repr:ty)) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name($repr);

        impl $name {
            /// Creates a new identifier with the provided numeric value.
            #[must_use]
            pub const fn new(value: $repr) -> Self {
                Self(value)
            }

            /// Retrieves the numeric representation of the identifier.
            #[must_use]
            pub const fn get(&self) -> $repr {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

identifier!(
    /// Unique identifier assigned to a session ("shift").
    SessionId(u64)
);
identifier!(
    /// Unique identifier assigned to a player, resolved by authentication upstream.
    PlayerId(u32)
);
identifier!(
    /// Unique identifier assigned to a waste unit.
    EnemyId(u32)
);
identifier!(
    /// Unique identifier assigned to a placed weapon.
    WeaponId(u32)
);
identifier!(
    /// Unique identifier assigned to a homing projectile.
    ProjectileId(u32)
);
identifier!(
    /// Unique identifier assigned to a scrap pickup lying on the floor.
    ScrapId(u32)
);
identifier!(
    /// Unique identifier assigned to a core path of the map.
    PathId(u32)
);

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }

    /// Returns the neighbouring cell in the provided direction.
    ///
    /// Steps that would leave the non-negative quadrant yield `None`; upper
    /// bounds are the caller's responsibility.
    #[must_use]
    pub fn step(self, direction: Direction) -> Option<CellCoord> {
        match direction {
            Direction::North => self.row.checked_sub(1).map(|row| Self::new(self.column, row)),
            Direction::East => self.column.checked_add(1).map(|column| Self::new(column, self.row)),
            Direction::South => self.row.checked_add(1).map(|row| Self::new(self.column, row)),
            Direction::West => self
                .column
                .checked_sub(1)
                .map(|column| Self::new(column, self.row)),
        }
    }

    /// Reports the direction of a single orthogonal step between two cells.
    #[must_use]
    pub fn direction_to(self, to: CellCoord) -> Option<Direction> {
        if self.manhattan_distance(to) != 1 {
            return None;
        }

        if to.column > self.column {
            Some(Direction::East)
        } else if to.column < self.column {
            Some(Direction::West)
        } else if to.row > self.row {
            Some(Direction::South)
        } else {
            Some(Direction::North)
        }
    }

    /// Continuous point located on this cell.
    #[must_use]
    pub fn to_point(self) -> CellPoint {
        CellPoint::new(self.column as f32, self.row as f32)
    }
}

/// Cardinal directions used by path growth.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// All directions in clockwise order starting at north.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Direction reached by a 90 degree counter-clockwise turn.
    #[must_use]
    pub const fn turn_left(self) -> Self {
        match self {
            Self::North => Self::West,
            Self::West => Self::South,
            Self::South => Self::East,
            Self::East => Self::North,
        }
    }

    /// Direction reached by a 90 degree clockwise turn.
    #[must_use]
    pub const fn turn_right(self) -> Self {
        match self {
            Self::North => Self::East,
            Self::East => Self::South,
            Self::South => Self::West,
            Self::West => Self::North,
        }
    }
}

/// Continuous position measured in cell units.
///
/// A cell `(c, r)` maps to the point `(c, r)`, so distances between points
/// are directly comparable with ranges expressed in cells.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct CellPoint {
    column: f32,
    row: f32,
}

impl CellPoint {
    /// Creates a new point from continuous column and row coordinates.
    #[must_use]
    pub const fn new(column: f32, row: f32) -> Self {
        Self { column, row }
    }

    /// Continuous column coordinate.
    #[must_use]
    pub const fn column(&self) -> f32 {
        self.column
    }

    /// Continuous row coordinate.
    #[must_use]
    pub const fn row(&self) -> f32 {
        self.row
    }

    /// Euclidean distance between two points.
    #[must_use]
    pub fn distance(self, other: CellPoint) -> f32 {
        let dc = self.column - other.column;
        let dr = self.row - other.row;
        (dc * dc + dr * dr).sqrt()
    }

    /// Linear interpolation toward `other` by `t` in `[0, 1]`.
    #[must_use]
    pub fn lerp(self, other: CellPoint, t: f32) -> CellPoint {
        CellPoint::new(
            self.column + (other.column - self.column) * t,
            self.row + (other.row - self.row) * t,
        )
    }

    /// Moves toward `target` by at most `step` cells.
    #[must_use]
    pub fn advance_toward(self, target: CellPoint, step: f32) -> CellPoint {
        let distance = self.distance(target);
        if distance <= step || distance == 0.0 {
            return target;
        }
        self.lerp(target, step / distance)
    }

    /// Reports whether both coordinates are finite numbers.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.column.is_finite() && self.row.is_finite()
    }
}

/// Axis-aligned rectangle expressed in cell coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRect {
    origin: CellCoord,
    size: CellRectSize,
}

impl CellRect {
    /// Constructs a rectangle from an origin cell and size.
    #[must_use]
    pub const fn from_origin_and_size(origin: CellCoord, size: CellRectSize) -> Self {
        Self { origin, size }
    }

    /// Upper-left cell that anchors the rectangle.
    #[must_use]
    pub const fn origin(&self) -> CellCoord {
        self.origin
    }

    /// Dimensions of the rectangle measured in whole cells.
    #[must_use]
    pub const fn size(&self) -> CellRectSize {
        self.size
    }

    /// Reports whether the cell lies inside the rectangle.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        cell.column() >= self.origin.column()
            && cell.row() >= self.origin.row()
            && cell.column() < self.origin.column() + self.size.width()
            && cell.row() < self.origin.row() + self.size.height()
    }

    /// Reports whether two rectangles share at least one cell.
    #[must_use]
    pub fn intersects(&self, other: &CellRect) -> bool {
        let self_right = self.origin.column() + self.size.width();
        let self_bottom = self.origin.row() + self.size.height();
        let other_right = other.origin.column() + other.size.width();
        let other_bottom = other.origin.row() + other.size.height();
        self.origin.column() < other_right
            && other.origin.column() < self_right
            && self.origin.row() < other_bottom
            && other.origin.row() < self_bottom
    }

    /// Iterates over every cell covered by the rectangle in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> {
        let origin = self.origin;
        let size = self.size;
        (0..size.height()).flat_map(move |dr| {
            (0..size.width()).map(move |dc| CellCoord::new(origin.column() + dc, origin.row() + dr))
        })
    }

    /// Continuous center point of the rectangle.
    #[must_use]
    pub fn center(&self) -> CellPoint {
        CellPoint::new(
            self.origin.column() as f32 + (self.size.width() as f32 - 1.0) / 2.0,
            self.origin.row() as f32 + (self.size.height() as f32 - 1.0) / 2.0,
        )
    }

    /// Distance from `point` to the closest cell of the rectangle.
    #[must_use]
    pub fn distance_to(&self, point: CellPoint) -> f32 {
        let max_column = (self.origin.column() + self.size.width()).saturating_sub(1) as f32;
        let max_row = (self.origin.row() + self.size.height()).saturating_sub(1) as f32;
        let nearest = CellPoint::new(
            point.column().clamp(self.origin.column() as f32, max_column),
            point.row().clamp(self.origin.row() as f32, max_row),
        );
        nearest.distance(point)
    }

    /// Center cell of the rectangle, rounding toward the origin.
    #[must_use]
    pub fn center_cell(&self) -> CellCoord {
        CellCoord::new(
            self.origin.column() + self.size.width() / 2,
            self.origin.row() + self.size.height() / 2,
        )
    }
}

/// Size of a [`CellRect`] measured in whole cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRectSize {
    width: u32,
    height: u32,
}

impl CellRectSize {
    /// Creates a new size descriptor with explicit dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width of the rectangle in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the rectangle in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }
}

/// Lifecycle of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionStatus {
    /// Players are joining and marking themselves ready.
    Waiting,
    /// Every player is ready; weapons may be placed before the first wave.
    Planning,
    /// Waves are running and combat advances every tick.
    Active,
    /// The session reached a terminal state.
    Ended,
}

/// States of the wave scheduler mirrored into the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WaveStage {
    /// No wave has been requested yet.
    Waiting,
    /// Enemies of the current wave are being emitted.
    Spawning,
    /// The wave quota is met; the next wave starts after a fixed delay.
    Delay,
    /// A phase break that only ends on player request.
    Break,
    /// Every wave of the table has been played.
    Completed,
}

/// Terminal states of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShiftOutcome {
    /// The whole wave table was survived.
    Completed,
    /// Overflow was depleted.
    Defeat,
    /// The last player left or forfeited.
    Abandoned,
}

/// Credits granted to a player when the session ends or they forfeit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Payout {
    /// Player receiving the credits.
    pub player: PlayerId,
    /// Number of credits granted.
    pub credits: u32,
}

/// Why a weapon left the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponLoss {
    /// The owner dismantled the weapon.
    Dismantled,
    /// Overheat damage reduced the weapon to zero hit points.
    Overheat,
    /// An explosive enemy destroyed the weapon.
    Explosion,
}

/// Reasons a weapon placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementError {
    /// The requesting player is not part of the session.
    UnknownPlayer,
    /// The session is neither planning nor active.
    InvalidStatus,
    /// The selected toolbelt slot holds no weapon.
    EmptySlot,
    /// The player placed another weapon too recently.
    Cooldown,
    /// The requested footprint extends beyond the grid.
    OutOfBounds,
    /// The requested footprint covers a pit cell.
    Pit,
    /// The requested footprint covers a corridor cell.
    Corridor,
    /// The requested footprint overlaps another weapon.
    Occupied,
}

/// Reasons a non-placement player command may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectionReason {
    /// The requesting player is not part of the session.
    UnknownPlayer,
    /// The session already holds the maximum number of players.
    SessionFull,
    /// The player already joined the session.
    AlreadyJoined,
    /// The command is not valid in the current lifecycle status or stage.
    InvalidStatus,
    /// Movement is locked while the session is paused.
    Paused,
    /// The requested destination is not a corridor cell.
    NotCorridor,
    /// Only the owner may dismantle a weapon.
    NotOwner,
    /// No weapon with the provided identifier exists.
    MissingWeapon,
    /// No scrap pickup with the provided identifier exists.
    MissingScrap,
    /// The scrap pickup lies outside the player's pickup radius.
    OutOfReach,
    /// No boost offer is pending for the player.
    NoPendingOffer,
    /// The chosen offer index does not exist.
    InvalidChoice,
    /// The requested toolbelt slot does not exist.
    InvalidSlot,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the session clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Admits a player into the session.
    Join {
        /// Player requesting admission.
        player: PlayerId,
        /// Display name shown to other players.
        name: String,
    },
    /// Removes a player that disconnected without forfeiting.
    Leave {
        /// Player leaving the session.
        player: PlayerId,
    },
    /// Marks a player as ready to leave the waiting room.
    MarkReady {
        /// Player signalling readiness.
        player: PlayerId,
    },
    /// Requests the first wave while the session is planning.
    StartWave {
        /// Player issuing the request.
        player: PlayerId,
    },
    /// Requests the end of a phase break.
    EndBreak {
        /// Player issuing the request.
        player: PlayerId,
    },
    /// Places the player's selected toolbelt weapon anchored at `origin`.
    PlaceWeapon {
        /// Player placing the weapon.
        player: PlayerId,
        /// Upper-left cell of the weapon footprint.
        origin: CellCoord,
    },
    /// Dismantles a weapon owned by the player.
    DestroyWeapon {
        /// Player issuing the request.
        player: PlayerId,
        /// Weapon to dismantle.
        weapon: WeaponId,
    },
    /// Moves a player avatar to a corridor cell.
    MovePlayer {
        /// Player moving.
        player: PlayerId,
        /// Destination cell.
        to: CellCoord,
    },
    /// Relays an opaque chat message.
    Chat {
        /// Player sending the message.
        player: PlayerId,
        /// Message body, passed through unchanged.
        message: String,
    },
    /// Replaces the player's toolbelt.
    SaveToolbelt {
        /// Player owning the toolbelt.
        player: PlayerId,
        /// Weapons carried in slot order.
        toolbelt: Vec<WeaponSpec>,
    },
    /// Selects the toolbelt slot used by subsequent placements.
    SelectSlot {
        /// Player owning the toolbelt.
        player: PlayerId,
        /// Zero-based slot index.
        slot: usize,
    },
    /// Picks one boost of the player's pending offer.
    ChooseBoost {
        /// Player choosing.
        player: PlayerId,
        /// Zero-based index into the pending offer.
        index: usize,
    },
    /// Pauses or resumes the session.
    SetPaused {
        /// Player issuing the request.
        player: PlayerId,
        /// Whether the session should be paused.
        paused: bool,
    },
    /// Collects a scrap pickup within the player's reach.
    CollectScrap {
        /// Player collecting.
        player: PlayerId,
        /// Pickup to collect.
        scrap: ScrapId,
    },
    /// Leaves the session early in exchange for reduced credits.
    Forfeit {
        /// Player forfeiting.
        player: PlayerId,
    },
    /// Mirrors the wave scheduler state into the session.
    SetWaveStage {
        /// Scheduler stage.
        stage: WaveStage,
        /// One-based wave number, zero before the first wave.
        wave: u32,
        /// Current phase in `1..=3`.
        phase: u8,
    },
    /// Spawns a waste unit at the head of a core path.
    SpawnEnemy {
        /// Core path the enemy follows.
        path: PathId,
        /// Generated enemy template.
        profile: EnemyProfile,
    },
    /// Updates an enemy's progress along its path.
    MoveEnemy {
        /// Enemy that moved.
        enemy: EnemyId,
        /// Index of the path cell the enemy departed from.
        path_index: usize,
        /// Fraction of the segment toward `path_index + 1` already covered.
        progress: f32,
        /// Resulting continuous position.
        position: CellPoint,
    },
    /// Moves an enemy into the pit, consuming overflow.
    EnemyReachedPit {
        /// Enemy arriving.
        enemy: EnemyId,
    },
    /// Removes an enemy whose state became unusable.
    DropEnemy {
        /// Enemy to remove.
        enemy: EnemyId,
    },
    /// Records that a weapon fired and accrues its heat.
    FireWeapon {
        /// Weapon that fired.
        weapon: WeaponId,
        /// Heat generated by the shot.
        heat: f32,
    },
    /// Applies resolved damage and knockback to an enemy.
    DamageEnemy {
        /// Enemy receiving the hit.
        enemy: EnemyId,
        /// Damage after resistances and toughness.
        amount: u32,
        /// Knockback strength before density scaling.
        knockback: f32,
        /// Player credited with a kill.
        owner: PlayerId,
    },
    /// Launches a homing projectile toward an enemy.
    LaunchProjectile {
        /// Weapon launching the projectile.
        weapon: WeaponId,
        /// Enemy being tracked.
        target: EnemyId,
        /// Damage applied on impact.
        damage: u32,
        /// Knockback applied on impact.
        knockback: f32,
    },
    /// Moves a projectile to a new position.
    MoveProjectile {
        /// Projectile that moved.
        projectile: ProjectileId,
        /// Resulting position.
        position: CellPoint,
    },
    /// Removes a projectile.
    RemoveProjectile {
        /// Projectile to remove.
        projectile: ProjectileId,
    },
    /// Replaces the shared heat value.
    SetHeat {
        /// New heat, clamped at zero by the world.
        heat: f32,
    },
    /// Applies direct damage to a weapon.
    DamageWeapon {
        /// Weapon receiving damage.
        weapon: WeaponId,
        /// Hit points removed.
        amount: u32,
    },
    /// Fills a player's pending boost offer.
    OfferBoosts {
        /// Player receiving the offer.
        player: PlayerId,
        /// Boosts to choose from.
        boosts: Vec<Boost>,
    },
    /// Ends the session with the provided outcome.
    EndShift {
        /// Terminal state reached.
        outcome: ShiftOutcome,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the session clock advanced.
    TimeAdvanced {
        /// Duration of time that elapsed in the tick.
        dt: Duration,
        /// Whether combat and scheduling should advance this tick.
        simulating: bool,
    },
    /// Confirms that a player joined.
    PlayerJoined {
        /// Player admitted.
        player: PlayerId,
        /// Display name.
        name: String,
    },
    /// Confirms that a player left the session.
    PlayerLeft {
        /// Player removed.
        player: PlayerId,
    },
    /// Confirms that a player marked themselves ready.
    PlayerReady {
        /// Player now ready.
        player: PlayerId,
    },
    /// Confirms that a player avatar moved.
    PlayerMoved {
        /// Player that moved.
        player: PlayerId,
        /// Destination cell.
        to: CellCoord,
    },
    /// Announces a lifecycle transition.
    StatusChanged {
        /// Status that became active.
        status: SessionStatus,
    },
    /// Asks the wave scheduler to start the first wave.
    WaveStartRequested,
    /// Asks the wave scheduler to leave the current break.
    BreakEndRequested,
    /// Confirms the mirrored scheduler state changed.
    WaveStageChanged {
        /// New stage.
        stage: WaveStage,
        /// One-based wave number.
        wave: u32,
        /// Current phase.
        phase: u8,
    },
    /// Confirms that an enemy entered the map.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// Core path the enemy follows.
        path: PathId,
    },
    /// Reports that an enemy reached the pit.
    EnemyReachedPit {
        /// Enemy that arrived.
        enemy: EnemyId,
        /// Pit slot assigned to the enemy.
        slot: u32,
        /// Overflow remaining after the arrival.
        overflow: i32,
    },
    /// Reports that an enemy was destroyed.
    EnemyDefeated {
        /// Enemy destroyed.
        enemy: EnemyId,
        /// Player credited with the kill.
        by: PlayerId,
        /// Scrap pickup dropped at the enemy position.
        scrap: ScrapId,
    },
    /// Reports that an enemy with unusable state was removed.
    EnemyDropped {
        /// Enemy removed.
        enemy: EnemyId,
    },
    /// Confirms that a weapon was placed.
    WeaponPlaced {
        /// Identifier assigned to the weapon.
        weapon: WeaponId,
        /// Owning player.
        owner: PlayerId,
        /// Weapon placed.
        spec: WeaponSpec,
        /// Occupied footprint.
        region: CellRect,
    },
    /// Reports that a weapon placement request was rejected.
    PlacementRejected {
        /// Player that requested the placement.
        player: PlayerId,
        /// Origin provided in the request.
        origin: CellCoord,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Reports that a weapon left the session.
    WeaponDestroyed {
        /// Weapon removed.
        weapon: WeaponId,
        /// Cause of the removal.
        cause: WeaponLoss,
    },
    /// Confirms that a projectile was launched.
    ProjectileLaunched {
        /// Identifier assigned to the projectile.
        projectile: ProjectileId,
        /// Enemy being tracked.
        target: EnemyId,
    },
    /// Confirms that a player gained scrap.
    ScrapCollected {
        /// Player collecting.
        player: PlayerId,
        /// Amount gained.
        amount: u32,
    },
    /// Reports that a player's scrap reached the pickup threshold.
    BoostThresholdCrossed {
        /// Player that crossed the threshold.
        player: PlayerId,
        /// Threshold that was reached.
        threshold: u32,
        /// Threshold that must be reached next.
        next_threshold: u32,
    },
    /// Confirms that a boost offer is waiting for the player.
    BoostOffered {
        /// Player receiving the offer.
        player: PlayerId,
        /// Boosts available.
        boosts: Vec<Boost>,
    },
    /// Confirms that a player chose a boost.
    BoostChosen {
        /// Player choosing.
        player: PlayerId,
        /// Boost chosen.
        boost: Boost,
    },
    /// Relays a chat message.
    ChatPosted {
        /// Sender.
        player: PlayerId,
        /// Message body.
        message: String,
    },
    /// Confirms that a toolbelt was stored.
    ToolbeltSaved {
        /// Player owning the toolbelt.
        player: PlayerId,
        /// Stored toolbelt.
        toolbelt: Vec<WeaponSpec>,
    },
    /// Announces a pause flag change.
    PauseChanged {
        /// Whether the session is paused.
        paused: bool,
    },
    /// Reports that a player command was rejected.
    CommandRejected {
        /// Player that issued the command.
        player: PlayerId,
        /// Specific reason for the rejection.
        reason: RejectionReason,
    },
    /// Reports credits granted to a player that forfeited.
    PlayerForfeited {
        /// Player that forfeited.
        player: PlayerId,
        /// Credits granted.
        credits: u32,
    },
    /// Announces that the session ended.
    ShiftEnded {
        /// Terminal state reached.
        outcome: ShiftOutcome,
        /// Credits granted to every remaining player.
        payouts: Vec<Payout>,
    },
}

/// Inputs to the payout formula captured when a player's session ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PayoutBasis {
    /// Scrap the player collected over the whole session.
    pub lifetime_scrap: u32,
    /// Number of waves fully played.
    pub waves_completed: u32,
    /// Number of enemies the session destroyed.
    pub enemies_defeated: u32,
    /// Whether more than one player took part.
    pub multiplayer: bool,
}

impl PayoutBasis {
    fn base(&self) -> f64 {
        f64::from(self.lifetime_scrap) / 10.0
            + 5.0 * f64::from(self.waves_completed)
            + f64::from(self.enemies_defeated) / 2.0
    }

    /// Credits granted when the session reaches a terminal state.
    ///
    /// Completing the table pays half again as much as a defeat, multiplayer
    /// sessions pay a 10% bonus and abandoned sessions pay nothing.
    #[must_use]
    pub fn shift_credits(&self, outcome: ShiftOutcome) -> u32 {
        let outcome_multiplier = match outcome {
            ShiftOutcome::Completed => 1.5,
            ShiftOutcome::Defeat => 1.0,
            ShiftOutcome::Abandoned => return 0,
        };
        let multiplayer = if self.multiplayer { 1.1 } else { 1.0 };
        (self.base() * outcome_multiplier * multiplayer).floor() as u32
    }

    /// Credits granted to a player that forfeits, halved in multiplayer.
    #[must_use]
    pub fn forfeit_credits(&self) -> u32 {
        let penalty = if self.multiplayer { 0.5 } else { 1.0 };
        (self.base() * penalty).floor() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{de::DeserializeOwned, Serialize};

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = CellCoord::new(1, 1);
        let destination = CellCoord::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    #[test]
    fn steps_respect_lower_bounds() {
        let corner = CellCoord::new(0, 0);
        assert_eq!(corner.step(Direction::North), None);
        assert_eq!(corner.step(Direction::West), None);
        assert_eq!(corner.step(Direction::East), Some(CellCoord::new(1, 0)));
        assert_eq!(corner.step(Direction::South), Some(CellCoord::new(0, 1)));
    }

    #[test]
    fn direction_to_only_reports_adjacent_cells() {
        let cell = CellCoord::new(5, 5);
        assert_eq!(cell.direction_to(CellCoord::new(5, 4)), Some(Direction::North));
        assert_eq!(cell.direction_to(CellCoord::new(4, 5)), Some(Direction::West));
        assert_eq!(cell.direction_to(CellCoord::new(6, 6)), None);
        assert_eq!(cell.direction_to(cell), None);
    }

    #[test]
    fn turns_are_inverse_of_each_other() {
        for direction in Direction::ALL {
            assert_eq!(direction.turn_left().turn_right(), direction);
            assert_ne!(direction.turn_left(), direction);
        }
    }

    #[test]
    fn rect_intersection_detects_shared_cells() {
        let first = CellRect::from_origin_and_size(CellCoord::new(2, 2), CellRectSize::new(2, 2));
        let touching =
            CellRect::from_origin_and_size(CellCoord::new(4, 2), CellRectSize::new(1, 1));
        let overlapping =
            CellRect::from_origin_and_size(CellCoord::new(3, 3), CellRectSize::new(3, 1));
        assert!(!first.intersects(&touching));
        assert!(first.intersects(&overlapping));
        assert_eq!(first.cells().count(), 4);
        assert!(first.contains(CellCoord::new(3, 3)));
        assert!(!first.contains(CellCoord::new(4, 3)));
    }

    #[test]
    fn rect_distance_measures_from_nearest_edge() {
        let rect = CellRect::from_origin_and_size(CellCoord::new(10, 10), CellRectSize::new(4, 4));
        assert_eq!(rect.distance_to(CellPoint::new(11.0, 12.0)), 0.0);
        assert!((rect.distance_to(CellPoint::new(16.0, 12.0)) - 3.0).abs() < 1e-5);
        assert!((rect.distance_to(CellPoint::new(7.0, 13.0)) - 3.0).abs() < 1e-5);
    }

    #[test]
    fn advance_toward_never_overshoots() {
        let start = CellPoint::new(0.0, 0.0);
        let target = CellPoint::new(3.0, 4.0);
        let moved = start.advance_toward(target, 1.0);
        assert!((moved.distance(start) - 1.0).abs() < 1e-5);
        assert_eq!(start.advance_toward(target, 10.0), target);
    }

    #[test]
    fn payouts_follow_outcome_multipliers() {
        let basis = PayoutBasis {
            lifetime_scrap: 200,
            waves_completed: 4,
            enemies_defeated: 60,
            multiplayer: false,
        };
        assert_eq!(basis.shift_credits(ShiftOutcome::Defeat), 70);
        assert_eq!(basis.shift_credits(ShiftOutcome::Completed), 105);
        assert_eq!(basis.shift_credits(ShiftOutcome::Abandoned), 0);
        assert_eq!(basis.forfeit_credits(), 70);

        let shared = PayoutBasis {
            multiplayer: true,
            ..basis
        };
        assert_eq!(shared.shift_credits(ShiftOutcome::Defeat), 77);
        assert_eq!(shared.forfeit_credits(), 35);
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn identifiers_round_trip_through_bincode() {
        assert_round_trip(&WeaponId::new(42));
        assert_round_trip(&SessionId::new(u64::MAX));
        assert_round_trip(&PlacementError::Corridor);
        assert_round_trip(&RejectionReason::OutOfReach);
    }

    #[test]
    fn cell_rect_round_trips_through_bincode() {
        let origin = CellCoord::new(5, 7);
        let size = CellRectSize::new(2, 3);
        let rect = CellRect::from_origin_and_size(origin, size);
        assert_round_trip(&rect);
    }
}
