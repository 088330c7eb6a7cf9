//! Authoritative weapon state management utilities.

use std::{collections::BTreeMap, time::Duration};

use pit_defence_core::{
    BoostModifiers, CellCoord, CellRect, Event, PlacementError, PlayerId, RejectionReason,
    SessionStatus, WeaponId, WeaponLoss, WeaponSnapshot, WeaponSpec,
};

use crate::{players::reject, World};

/// Snapshot of a weapon stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct WeaponState {
    /// Identifier allocated by the world for the weapon.
    pub(crate) id: WeaponId,
    /// Player that placed the weapon.
    pub(crate) owner: PlayerId,
    /// Toolbelt item the weapon was placed from.
    pub(crate) spec: WeaponSpec,
    /// Region of cells occupied by the weapon.
    pub(crate) region: CellRect,
    /// Remaining hit points.
    pub(crate) hp: u32,
    /// Heat accumulated by the weapon's own shots.
    pub(crate) heat: f32,
    /// Session clock value of the last shot.
    pub(crate) last_fired: Option<Duration>,
}

impl WeaponState {
    pub(crate) fn snapshot(&self) -> WeaponSnapshot {
        WeaponSnapshot {
            id: self.id,
            owner: self.owner,
            spec: self.spec,
            region: self.region,
            hp: self.hp,
            heat: self.heat,
            last_fired: self.last_fired,
        }
    }
}

/// Registry that stores weapons and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct WeaponRegistry {
    entries: BTreeMap<WeaponId, WeaponState>,
    next_weapon_id: WeaponId,
}

impl WeaponRegistry {
    /// Creates an empty weapon registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_weapon_id: WeaponId::new(0),
        }
    }

    fn allocate(&mut self) -> WeaponId {
        let id = self.next_weapon_id;
        self.next_weapon_id = WeaponId::new(id.get().saturating_add(1));
        id
    }

    pub(crate) fn get(&self, id: WeaponId) -> Option<&WeaponState> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: WeaponId) -> Option<&mut WeaponState> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &WeaponState> {
        self.entries.values()
    }

    pub(crate) fn remove(&mut self, id: WeaponId) -> Option<WeaponState> {
        self.entries.remove(&id)
    }

    pub(crate) fn overlaps(&self, region: &CellRect) -> bool {
        self.entries
            .values()
            .any(|weapon| weapon.region.intersects(region))
    }

    /// Own heat bleeds off at the same base rate as the shared heat.
    pub(crate) fn cool(&mut self, amount: f32) {
        for weapon in self.entries.values_mut() {
            weapon.heat = (weapon.heat - amount).max(0.0);
        }
    }
}

impl World {
    fn placement_region(
        &self,
        player: PlayerId,
        origin: CellCoord,
    ) -> Result<(WeaponSpec, CellRect), PlacementError> {
        let state = self.player(player).ok_or(PlacementError::UnknownPlayer)?;
        if !matches!(self.status, SessionStatus::Planning | SessionStatus::Active) {
            return Err(PlacementError::InvalidStatus);
        }
        let spec = state.selected_weapon().ok_or(PlacementError::EmptySlot)?;
        if let Some(last) = state.last_placement {
            if self.clock.saturating_sub(last) < self.config.placement_cooldown {
                return Err(PlacementError::Cooldown);
            }
        }

        let region = CellRect::from_origin_and_size(origin, spec.kind.footprint());
        let mut touches_corridor = false;
        for cell in region.cells() {
            if !self.map.in_bounds(cell) {
                return Err(PlacementError::OutOfBounds);
            }
            if self.map.pit().contains(cell) {
                return Err(PlacementError::Pit);
            }
            touches_corridor |= self.map.is_corridor(cell);
        }
        if touches_corridor {
            return Err(PlacementError::Corridor);
        }
        if self.weapons.overlaps(&region) {
            return Err(PlacementError::Occupied);
        }

        Ok((spec, region))
    }

    pub(crate) fn place_weapon(
        &mut self,
        player: PlayerId,
        origin: CellCoord,
        out_events: &mut Vec<Event>,
    ) {
        let (spec, region) = match self.placement_region(player, origin) {
            Ok(placement) => placement,
            Err(reason) => {
                out_events.push(Event::PlacementRejected {
                    player,
                    origin,
                    reason,
                });
                return;
            }
        };

        let hp = self.modifiers_for(player).apply(spec.stats()).max_hp;
        let clock = self.clock;
        if let Some(state) = self.player_mut(player) {
            state.last_placement = Some(clock);
        }

        let id = self.weapons.allocate();
        let _ = self.weapons.entries.insert(
            id,
            WeaponState {
                id,
                owner: player,
                spec,
                region,
                hp,
                heat: 0.0,
                last_fired: None,
            },
        );
        out_events.push(Event::WeaponPlaced {
            weapon: id,
            owner: player,
            spec,
            region,
        });
    }

    pub(crate) fn destroy_weapon(
        &mut self,
        player: PlayerId,
        weapon: WeaponId,
        out_events: &mut Vec<Event>,
    ) {
        if self.player(player).is_none() {
            reject(out_events, player, RejectionReason::UnknownPlayer);
            return;
        }
        let Some(state) = self.weapons.get(weapon) else {
            reject(out_events, player, RejectionReason::MissingWeapon);
            return;
        };
        if state.owner != player {
            reject(out_events, player, RejectionReason::NotOwner);
            return;
        }

        self.remove_weapon(weapon, WeaponLoss::Dismantled, out_events);
    }

    pub(crate) fn fire_weapon(&mut self, weapon: WeaponId, heat: f32) {
        let clock = self.clock;
        let Some(state) = self.weapons.get_mut(weapon) else {
            return;
        };

        state.last_fired = Some(clock);
        state.heat += heat.max(0.0);
        self.heat += heat.max(0.0);
    }

    /// Removes hit points, destroying the weapon at zero.
    pub(crate) fn damage_weapon(
        &mut self,
        weapon: WeaponId,
        amount: u32,
        cause: WeaponLoss,
        out_events: &mut Vec<Event>,
    ) {
        let Some(state) = self.weapons.get_mut(weapon) else {
            return;
        };

        state.hp = state.hp.saturating_sub(amount);
        if state.hp == 0 {
            self.remove_weapon(weapon, cause, out_events);
        }
    }

    fn remove_weapon(&mut self, weapon: WeaponId, cause: WeaponLoss, out_events: &mut Vec<Event>) {
        if self.weapons.remove(weapon).is_some() {
            out_events.push(Event::WeaponDestroyed { weapon, cause });
        }
    }

    /// Carries the current hit point ratio of `owner`'s weapons over to a
    /// changed effective maximum.
    pub(crate) fn rescale_weapon_hp(
        &mut self,
        owner: PlayerId,
        before: BoostModifiers,
        after: BoostModifiers,
    ) {
        for weapon in self.weapons.entries.values_mut() {
            if weapon.owner != owner {
                continue;
            }
            let stats = weapon.spec.stats();
            let old_max = u64::from(before.apply(stats).max_hp.max(1));
            let new_max = u64::from(after.apply(stats).max_hp);
            let scaled = u64::from(weapon.hp) * new_max / old_max;
            weapon.hp = u32::try_from(scaled).unwrap_or(u32::MAX).max(1);
        }
    }

    /// Restores every weapon to its owner's effective maximum.
    pub(crate) fn heal_weapons(&mut self) {
        let healed: Vec<(WeaponId, u32)> = self
            .weapons
            .iter()
            .map(|weapon| {
                let max_hp = self.modifiers_for(weapon.owner).apply(weapon.spec.stats()).max_hp;
                (weapon.id, max_hp)
            })
            .collect();

        for (id, max_hp) in healed {
            if let Some(weapon) = self.weapons.get_mut(id) {
                weapon.hp = weapon.hp.max(max_hp);
            }
        }
    }
}
