//! Waste units, projectiles and the scrap they leave behind.

use std::time::Duration;

use pit_defence_core::{
    Ability, CellCoord, CellPoint, EnemyId, EnemyProfile, EnemySnapshot, Event, PathId, PlayerId,
    ProjectileId, ProjectileSnapshot, ScrapId, ScrapSnapshot, SessionStatus, WeaponId,
    WeaponLoss,
};

use crate::World;

/// Distance a projectile covers per tick, in cells.
pub(crate) const PROJECTILE_SPEED: f32 = 0.6;
/// Fraction of max hit points regenerated per second.
const REGENERATION_RATE: f32 = 0.05;
/// Cells pushed back per unit of knockback over density.
const KNOCKBACK_SCALE: f32 = 0.1;
/// Weapons within this many cells of an exploding unit are damaged.
const EXPLOSION_RADIUS: f32 = 3.0;
/// Hit points removed from weapons caught in an explosion.
const EXPLOSION_DAMAGE: u32 = 20;

/// Authoritative state of a waste unit.
#[derive(Clone, Debug)]
pub(crate) struct EnemyState {
    /// Identifier allocated by the world.
    pub(crate) id: EnemyId,
    /// Core path being followed.
    pub(crate) path: PathId,
    /// Path cell the unit departed from.
    pub(crate) path_index: usize,
    /// Fraction of the current segment covered.
    pub(crate) progress: f32,
    /// Continuous position.
    pub(crate) position: CellPoint,
    /// Rolled template.
    pub(crate) profile: EnemyProfile,
    /// Remaining hit points.
    pub(crate) hp: f32,
    /// Pit slot, once the unit dropped into the pit.
    pub(crate) pit_slot: Option<u32>,
}

impl EnemyState {
    pub(crate) fn in_pit(&self) -> bool {
        self.pit_slot.is_some()
    }

    pub(crate) fn snapshot(&self) -> EnemySnapshot {
        EnemySnapshot {
            id: self.id,
            path: self.path,
            path_index: self.path_index,
            progress: self.progress,
            position: self.position,
            profile: self.profile.clone(),
            hp: self.hp,
            in_pit: self.in_pit(),
            pit_slot: self.pit_slot,
        }
    }
}

/// Homing projectile in flight.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ProjectileState {
    pub(crate) id: ProjectileId,
    pub(crate) position: CellPoint,
    pub(crate) target: EnemyId,
    pub(crate) damage: u32,
    pub(crate) knockback: f32,
    pub(crate) owner: PlayerId,
}

impl ProjectileState {
    pub(crate) fn snapshot(&self) -> ProjectileSnapshot {
        ProjectileSnapshot {
            id: self.id,
            position: self.position,
            target: self.target,
            speed: PROJECTILE_SPEED,
            damage: self.damage,
            knockback: self.knockback,
            owner: self.owner,
        }
    }
}

/// Scrap dropped by a destroyed unit.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ScrapPickup {
    pub(crate) id: ScrapId,
    pub(crate) position: CellPoint,
    pub(crate) value: u32,
}

impl ScrapPickup {
    pub(crate) fn snapshot(&self) -> ScrapSnapshot {
        ScrapSnapshot {
            id: self.id,
            position: self.position,
            value: self.value,
        }
    }
}

/// Position of a slot inside the pit, filled row by row.
fn pit_slot_position(origin: CellCoord, width: u32, slot: u32) -> CellPoint {
    let width = width.max(1);
    CellPoint::new(
        (origin.column() + slot % width) as f32,
        (origin.row() + slot / width) as f32,
    )
}

impl World {
    fn allocate_enemy_id(&mut self) -> EnemyId {
        let id = self.next_enemy_id;
        self.next_enemy_id = EnemyId::new(id.get().saturating_add(1));
        id
    }

    fn insert_enemy(
        &mut self,
        path: PathId,
        path_index: usize,
        progress: f32,
        position: CellPoint,
        profile: EnemyProfile,
        out_events: &mut Vec<Event>,
    ) {
        let id = self.allocate_enemy_id();
        let _ = self.enemies.insert(
            id,
            EnemyState {
                id,
                path,
                path_index,
                progress,
                position,
                hp: profile.max_hp,
                profile,
                pit_slot: None,
            },
        );
        out_events.push(Event::EnemySpawned { enemy: id, path });
    }

    pub(crate) fn spawn_enemy(
        &mut self,
        path: PathId,
        profile: EnemyProfile,
        out_events: &mut Vec<Event>,
    ) {
        if self.status != SessionStatus::Active {
            return;
        }
        let Some(position) = self.map.path(path).and_then(|route| route.point_at(0, 0.0)) else {
            return;
        };

        self.insert_enemy(path, 0, 0.0, position, profile, out_events);
    }

    pub(crate) fn move_enemy(
        &mut self,
        enemy: EnemyId,
        path_index: usize,
        progress: f32,
        position: CellPoint,
    ) {
        let Some(state) = self.enemies.get_mut(&enemy) else {
            return;
        };
        if state.in_pit() || path_index < state.path_index {
            return;
        }

        state.path_index = path_index;
        state.progress = progress.clamp(0.0, 1.0);
        state.position = position;
    }

    pub(crate) fn enemy_reached_pit(&mut self, enemy: EnemyId, out_events: &mut Vec<Event>) {
        let pit = self.map.pit();
        let capacity = pit.size().width() * pit.size().height();
        let slot = self.pit_count.min(capacity.saturating_sub(1));
        let Some(state) = self.enemies.get_mut(&enemy) else {
            return;
        };
        if state.in_pit() {
            return;
        }

        state.pit_slot = Some(slot);
        state.position = pit_slot_position(pit.origin(), pit.size().width(), slot);
        self.pit_count = self.pit_count.saturating_add(1);
        self.overflow -= state.profile.footprint();
        out_events.push(Event::EnemyReachedPit {
            enemy,
            slot,
            overflow: self.overflow,
        });
    }

    pub(crate) fn drop_enemy(&mut self, enemy: EnemyId, out_events: &mut Vec<Event>) {
        if self.enemies.remove(&enemy).is_some() {
            out_events.push(Event::EnemyDropped { enemy });
        }
    }

    pub(crate) fn damage_enemy(
        &mut self,
        enemy: EnemyId,
        amount: u32,
        knockback: f32,
        owner: PlayerId,
        out_events: &mut Vec<Event>,
    ) {
        let Some(state) = self.enemies.get_mut(&enemy) else {
            return;
        };
        if state.in_pit() {
            return;
        }

        state.hp -= amount as f32;
        if state.hp <= 0.0 {
            self.defeat_enemy(enemy, owner, true, out_events);
            return;
        }

        if knockback > 0.0 && state.profile.density > 0.0 {
            let push = knockback / state.profile.density * KNOCKBACK_SCALE;
            state.progress = (state.progress - push).max(0.0);
            if let Some(position) = self
                .map
                .path(state.path)
                .and_then(|route| route.point_at(state.path_index, state.progress))
            {
                state.position = position;
            }
        }
    }

    /// Removes a unit, credits the kill and drops its scrap.
    ///
    /// Split and explosive abilities only trigger when `abilities` is set.
    fn defeat_enemy(
        &mut self,
        enemy: EnemyId,
        by: PlayerId,
        abilities: bool,
        out_events: &mut Vec<Event>,
    ) {
        let Some(state) = self.enemies.remove(&enemy) else {
            return;
        };

        self.enemies_defeated = self.enemies_defeated.saturating_add(1);
        let scrap = self.next_scrap_id;
        self.next_scrap_id = ScrapId::new(scrap.get().saturating_add(1));
        let value = state
            .profile
            .value
            .saturating_add(self.modifiers_for(by).scrap_bonus());
        let _ = self.scrap.insert(
            scrap,
            ScrapPickup {
                id: scrap,
                position: state.position,
                value,
            },
        );
        out_events.push(Event::EnemyDefeated { enemy, by, scrap });

        if !abilities {
            return;
        }

        if state.profile.has(Ability::Split) {
            let child = state.profile.split_child();
            for _ in 0..2 {
                self.insert_enemy(
                    state.path,
                    state.path_index,
                    state.progress,
                    state.position,
                    child.clone(),
                    out_events,
                );
            }
        }

        if state.profile.has(Ability::Explosive) {
            let caught: Vec<WeaponId> = self
                .weapons
                .iter()
                .filter(|weapon| weapon.region.distance_to(state.position) <= EXPLOSION_RADIUS)
                .map(|weapon| weapon.id)
                .collect();
            for weapon in caught {
                self.damage_weapon(weapon, EXPLOSION_DAMAGE, WeaponLoss::Explosion, out_events);
            }
        }
    }

    /// Destroys every unit outside the pit on behalf of `player`.
    pub(crate) fn purge_enemies(&mut self, player: PlayerId, out_events: &mut Vec<Event>) {
        let targets: Vec<EnemyId> = self
            .enemies
            .values()
            .filter(|enemy| !enemy.in_pit())
            .map(|enemy| enemy.id)
            .collect();
        for enemy in targets {
            self.defeat_enemy(enemy, player, false, out_events);
        }
    }

    pub(crate) fn regenerate_enemies(&mut self, dt: Duration) {
        let seconds = dt.as_secs_f32();
        for enemy in self.enemies.values_mut() {
            if enemy.in_pit() || !enemy.profile.has(Ability::Regenerating) {
                continue;
            }
            let max_hp = enemy.profile.max_hp;
            enemy.hp = (enemy.hp + max_hp * REGENERATION_RATE * seconds).min(max_hp);
        }
    }

    pub(crate) fn launch_projectile(
        &mut self,
        weapon: WeaponId,
        target: EnemyId,
        damage: u32,
        knockback: f32,
        out_events: &mut Vec<Event>,
    ) {
        let Some(launcher) = self.weapons.get(weapon) else {
            return;
        };
        if !self.enemies.contains_key(&target) {
            return;
        }

        let id = self.next_projectile_id;
        self.next_projectile_id = ProjectileId::new(id.get().saturating_add(1));
        let _ = self.projectiles.insert(
            id,
            ProjectileState {
                id,
                position: launcher.region.center(),
                target,
                damage,
                knockback,
                owner: launcher.owner,
            },
        );
        out_events.push(Event::ProjectileLaunched {
            projectile: id,
            target,
        });
    }

    pub(crate) fn move_projectile(&mut self, projectile: ProjectileId, position: CellPoint) {
        if let Some(state) = self.projectiles.get_mut(&projectile) {
            state.position = position;
        }
    }

    pub(crate) fn remove_projectile(&mut self, projectile: ProjectileId) {
        let _ = self.projectiles.remove(&projectile);
    }
}
