//! Player roster, scrap economy and boost choices.

use std::time::Duration;

use pit_defence_core::{
    next_pickup_threshold, Boost, BoostEffect, BoostModifiers, CellCoord, CellPoint, Event,
    ModifierKey, OneShotEffect, PayoutBasis, PlayerId, PlayerSnapshot, RejectionReason, ScrapId,
    SessionStatus, ShiftOutcome, WaveStage, WeaponSpec, STARTING_PICKUP_THRESHOLD,
};

use crate::World;

/// Authoritative state of a connected player.
#[derive(Clone, Debug)]
pub(crate) struct PlayerState {
    /// Identifier resolved by the transport before the player joined.
    pub(crate) id: PlayerId,
    /// Display name.
    pub(crate) name: String,
    /// Avatar position.
    pub(crate) position: CellPoint,
    /// Carried weapons in slot order.
    pub(crate) toolbelt: Vec<WeaponSpec>,
    /// Slot used for the next placement.
    pub(crate) selected_slot: usize,
    /// Stacking boosts in the order they were chosen.
    pub(crate) boosts: Vec<Boost>,
    /// Scrap gathered toward the next offer.
    pub(crate) scrap: u32,
    /// Scrap gathered over the whole session.
    pub(crate) lifetime_scrap: u32,
    /// Scrap required for the next offer.
    pub(crate) pickup_threshold: u32,
    /// Threshold of the offer made last.
    pub(crate) previous_threshold: u32,
    /// Offer awaiting a choice; empty until the offer system fills it.
    pub(crate) pending_offer: Option<Vec<Boost>>,
    /// Whether the player left the waiting room.
    pub(crate) ready: bool,
    /// Session clock value of the last successful placement.
    pub(crate) last_placement: Option<Duration>,
}

impl PlayerState {
    /// Creates a player carrying the default toolbelt.
    pub(crate) fn new(id: PlayerId, name: String, position: CellPoint) -> Self {
        Self {
            id,
            name,
            position,
            toolbelt: vec![WeaponSpec::default()],
            selected_slot: 0,
            boosts: Vec::new(),
            scrap: 0,
            lifetime_scrap: 0,
            pickup_threshold: STARTING_PICKUP_THRESHOLD,
            previous_threshold: 0,
            pending_offer: None,
            ready: false,
            last_placement: None,
        }
    }

    /// Folded stacking boosts of the player.
    pub(crate) fn modifiers(&self) -> BoostModifiers {
        BoostModifiers::fold(&self.boosts)
    }

    /// Weapon in the selected toolbelt slot.
    pub(crate) fn selected_weapon(&self) -> Option<WeaponSpec> {
        self.toolbelt.get(self.selected_slot).copied()
    }

    /// Advances the pickup threshold when it was reached and no offer is
    /// pending, returning the reached and the next threshold.
    pub(crate) fn cross_threshold(&mut self) -> Option<(u32, u32)> {
        if self.pending_offer.is_some() || self.scrap < self.pickup_threshold {
            return None;
        }

        self.previous_threshold = self.pickup_threshold;
        self.pickup_threshold = next_pickup_threshold(self.pickup_threshold);
        self.pending_offer = Some(Vec::new());
        Some((self.previous_threshold, self.pickup_threshold))
    }

    pub(crate) fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            id: self.id,
            name: self.name.clone(),
            position: self.position,
            toolbelt: self.toolbelt.clone(),
            selected_slot: self.selected_slot,
            boosts: self.boosts.clone(),
            scrap: self.scrap,
            lifetime_scrap: self.lifetime_scrap,
            pickup_threshold: self.pickup_threshold,
            previous_threshold: self.previous_threshold,
            pending_offer: self.pending_offer.clone(),
            ready: self.ready,
        }
    }
}

pub(crate) fn reject(out_events: &mut Vec<Event>, player: PlayerId, reason: RejectionReason) {
    out_events.push(Event::CommandRejected { player, reason });
}

impl World {
    pub(crate) fn player(&self, id: PlayerId) -> Option<&PlayerState> {
        self.players.iter().find(|player| player.id == id)
    }

    pub(crate) fn player_mut(&mut self, id: PlayerId) -> Option<&mut PlayerState> {
        self.players.iter_mut().find(|player| player.id == id)
    }

    pub(crate) fn modifiers_for(&self, id: PlayerId) -> BoostModifiers {
        self.player(id)
            .map(PlayerState::modifiers)
            .unwrap_or_default()
    }

    /// Players are spread along the first core path in join order.
    fn spawn_position(&self, slot: usize) -> CellPoint {
        let max = self.config.max_players.max(1);
        self.map
            .core_paths()
            .first()
            .and_then(|path| {
                let cells = path.cells();
                cells.get((slot + 1) * cells.len() / (max + 1))
            })
            .map_or_else(|| self.map.pit().center(), |cell| cell.to_point())
    }

    pub(crate) fn join(&mut self, player: PlayerId, name: String, out_events: &mut Vec<Event>) {
        if self.player(player).is_some() {
            reject(out_events, player, RejectionReason::AlreadyJoined);
            return;
        }
        if self.players.len() >= self.config.max_players {
            reject(out_events, player, RejectionReason::SessionFull);
            return;
        }

        let position = self.spawn_position(self.players.len());
        self.players
            .push(PlayerState::new(player, name.clone(), position));
        out_events.push(Event::PlayerJoined { player, name });
    }

    pub(crate) fn leave(&mut self, player: PlayerId, out_events: &mut Vec<Event>) {
        let Some(index) = self.players.iter().position(|state| state.id == player) else {
            reject(out_events, player, RejectionReason::UnknownPlayer);
            return;
        };

        let _ = self.players.remove(index);
        out_events.push(Event::PlayerLeft { player });
        self.after_departure(out_events);
    }

    fn after_departure(&mut self, out_events: &mut Vec<Event>) {
        if self.players.is_empty() {
            self.end_shift(ShiftOutcome::Abandoned, out_events);
        } else if self.status == SessionStatus::Waiting {
            self.promote_when_ready(out_events);
        }
    }

    pub(crate) fn mark_ready(&mut self, player: PlayerId, out_events: &mut Vec<Event>) {
        if self.status != SessionStatus::Waiting {
            reject(out_events, player, RejectionReason::InvalidStatus);
            return;
        }
        let Some(state) = self.player_mut(player) else {
            reject(out_events, player, RejectionReason::UnknownPlayer);
            return;
        };

        state.ready = true;
        out_events.push(Event::PlayerReady { player });
        self.promote_when_ready(out_events);
    }

    fn promote_when_ready(&mut self, out_events: &mut Vec<Event>) {
        if !self.players.is_empty() && self.players.iter().all(|state| state.ready) {
            self.set_status(SessionStatus::Planning, out_events);
        }
    }

    pub(crate) fn start_wave(&mut self, player: PlayerId, out_events: &mut Vec<Event>) {
        if self.player(player).is_none() {
            reject(out_events, player, RejectionReason::UnknownPlayer);
            return;
        }
        if self.status != SessionStatus::Planning {
            reject(out_events, player, RejectionReason::InvalidStatus);
            return;
        }

        self.set_status(SessionStatus::Active, out_events);
        out_events.push(Event::WaveStartRequested);
    }

    pub(crate) fn end_break(&mut self, player: PlayerId, out_events: &mut Vec<Event>) {
        if self.player(player).is_none() {
            reject(out_events, player, RejectionReason::UnknownPlayer);
            return;
        }
        if self.status != SessionStatus::Active || self.stage != WaveStage::Break {
            reject(out_events, player, RejectionReason::InvalidStatus);
            return;
        }

        out_events.push(Event::BreakEndRequested);
    }

    pub(crate) fn move_player(
        &mut self,
        player: PlayerId,
        to: CellCoord,
        out_events: &mut Vec<Event>,
    ) {
        if self.player(player).is_none() {
            reject(out_events, player, RejectionReason::UnknownPlayer);
            return;
        }
        if self.paused {
            reject(out_events, player, RejectionReason::Paused);
            return;
        }
        if !self.map.in_bounds(to) || !self.map.is_corridor(to) {
            reject(out_events, player, RejectionReason::NotCorridor);
            return;
        }

        if let Some(state) = self.player_mut(player) {
            state.position = to.to_point();
        }
        out_events.push(Event::PlayerMoved { player, to });
    }

    pub(crate) fn chat(&mut self, player: PlayerId, message: String, out_events: &mut Vec<Event>) {
        if self.player(player).is_none() {
            reject(out_events, player, RejectionReason::UnknownPlayer);
            return;
        }
        out_events.push(Event::ChatPosted { player, message });
    }

    pub(crate) fn save_toolbelt(
        &mut self,
        player: PlayerId,
        toolbelt: Vec<WeaponSpec>,
        out_events: &mut Vec<Event>,
    ) {
        if toolbelt.is_empty() {
            reject(out_events, player, RejectionReason::InvalidSlot);
            return;
        }
        let Some(state) = self.player_mut(player) else {
            reject(out_events, player, RejectionReason::UnknownPlayer);
            return;
        };

        state.toolbelt = toolbelt.clone();
        state.selected_slot = 0;
        out_events.push(Event::ToolbeltSaved { player, toolbelt });
    }

    pub(crate) fn select_slot(
        &mut self,
        player: PlayerId,
        slot: usize,
        out_events: &mut Vec<Event>,
    ) {
        let Some(state) = self.player_mut(player) else {
            reject(out_events, player, RejectionReason::UnknownPlayer);
            return;
        };
        if slot >= state.toolbelt.len() {
            reject(out_events, player, RejectionReason::InvalidSlot);
            return;
        }
        state.selected_slot = slot;
    }

    pub(crate) fn set_paused(
        &mut self,
        player: PlayerId,
        paused: bool,
        out_events: &mut Vec<Event>,
    ) {
        if self.player(player).is_none() {
            reject(out_events, player, RejectionReason::UnknownPlayer);
            return;
        }
        if self.paused != paused {
            self.paused = paused;
            out_events.push(Event::PauseChanged { paused });
        }
    }

    pub(crate) fn collect_scrap(
        &mut self,
        player: PlayerId,
        scrap: ScrapId,
        out_events: &mut Vec<Event>,
    ) {
        let Some(state) = self.player(player) else {
            reject(out_events, player, RejectionReason::UnknownPlayer);
            return;
        };
        let Some(pickup) = self.scrap.get(&scrap) else {
            reject(out_events, player, RejectionReason::MissingScrap);
            return;
        };

        let reach = self.config.pickup_radius * state.modifiers().pickup_radius_multiplier();
        if state.position.distance(pickup.position) > reach {
            reject(out_events, player, RejectionReason::OutOfReach);
            return;
        }

        if let Some(pickup) = self.scrap.remove(&scrap) {
            self.grant_scrap(player, pickup.value, out_events);
        }
    }

    fn grant_scrap(&mut self, player: PlayerId, amount: u32, out_events: &mut Vec<Event>) {
        let Some(state) = self.player_mut(player) else {
            return;
        };

        state.scrap = state.scrap.saturating_add(amount);
        state.lifetime_scrap = state.lifetime_scrap.saturating_add(amount);
        let crossed = state.cross_threshold();
        out_events.push(Event::ScrapCollected { player, amount });

        if let Some((threshold, next_threshold)) = crossed {
            out_events.push(Event::BoostThresholdCrossed {
                player,
                threshold,
                next_threshold,
            });
        }
    }

    pub(crate) fn offer_boosts(
        &mut self,
        player: PlayerId,
        boosts: Vec<Boost>,
        out_events: &mut Vec<Event>,
    ) {
        let Some(state) = self.player_mut(player) else {
            return;
        };
        // Only an offer opened by a threshold crossing can be filled.
        if !matches!(&state.pending_offer, Some(offer) if offer.is_empty()) {
            return;
        }

        state.pending_offer = Some(boosts.clone());
        out_events.push(Event::BoostOffered { player, boosts });
    }

    pub(crate) fn choose_boost(
        &mut self,
        player: PlayerId,
        index: usize,
        out_events: &mut Vec<Event>,
    ) {
        let Some(state) = self.player_mut(player) else {
            reject(out_events, player, RejectionReason::UnknownPlayer);
            return;
        };
        let Some(offer) = state.pending_offer.as_ref().filter(|offer| !offer.is_empty()) else {
            reject(out_events, player, RejectionReason::NoPendingOffer);
            return;
        };
        let Some(boost) = offer.get(index).copied() else {
            reject(out_events, player, RejectionReason::InvalidChoice);
            return;
        };

        state.pending_offer = None;
        if boost.is_one_shot() {
            out_events.push(Event::BoostChosen { player, boost });
            if let BoostEffect::OneShot(effect) = boost.effect {
                self.apply_one_shot(player, effect, out_events);
            }
            return;
        }

        let before = state.modifiers();
        state.boosts.push(boost);
        state.scrap = 0;
        let after = state.modifiers();
        out_events.push(Event::BoostChosen { player, boost });
        if matches!(
            boost.effect,
            BoostEffect::Modifier {
                key: ModifierKey::HpMult,
                ..
            }
        ) {
            self.rescale_weapon_hp(player, before, after);
        }
    }

    fn apply_one_shot(
        &mut self,
        player: PlayerId,
        effect: OneShotEffect,
        out_events: &mut Vec<Event>,
    ) {
        match effect {
            OneShotEffect::HealWeapons => self.heal_weapons(),
            OneShotEffect::DestroyAllEnemies => self.purge_enemies(player, out_events),
            OneShotEffect::FreezeEnemies => self.freeze_remaining = self.config.freeze_duration,
            OneShotEffect::VacuumScrap => {
                let total = self.scrap.values().map(|pickup| pickup.value).sum();
                self.scrap.clear();
                if total > 0 {
                    self.grant_scrap(player, total, out_events);
                }
            }
        }
    }

    pub(crate) fn forfeit(&mut self, player: PlayerId, out_events: &mut Vec<Event>) {
        let Some(index) = self.players.iter().position(|state| state.id == player) else {
            reject(out_events, player, RejectionReason::UnknownPlayer);
            return;
        };

        let basis = self.payout_basis(&self.players[index]);
        let _ = self.players.remove(index);
        out_events.push(Event::PlayerForfeited {
            player,
            credits: basis.forfeit_credits(),
        });
        out_events.push(Event::PlayerLeft { player });
        self.after_departure(out_events);
    }

    pub(crate) fn payout_basis(&self, state: &PlayerState) -> PayoutBasis {
        PayoutBasis {
            lifetime_scrap: state.lifetime_scrap,
            waves_completed: self.waves_completed,
            enemies_defeated: self.enemies_defeated,
            multiplayer: self.players.len() > 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pit_defence_core::{BoostKind, BoostRarity};

    fn player() -> PlayerState {
        PlayerState::new(PlayerId::new(1), "ada".into(), CellPoint::new(0.0, 0.0))
    }

    #[test]
    fn new_players_carry_the_default_toolbelt() {
        let state = player();
        assert_eq!(state.selected_weapon(), Some(WeaponSpec::default()));
        assert_eq!(state.pickup_threshold, STARTING_PICKUP_THRESHOLD);
        assert!(state.pending_offer.is_none());
        assert_eq!(state.last_placement, None);
    }

    #[test]
    fn thresholds_advance_once_per_offer() {
        let mut state = player();
        state.scrap = 45;

        assert_eq!(state.cross_threshold(), Some((20, 27)));
        assert_eq!(state.cross_threshold(), None, "offer still pending");

        state.pending_offer = None;
        assert_eq!(state.cross_threshold(), Some((27, 37)));
        state.pending_offer = None;
        assert_eq!(state.cross_threshold(), None, "45 is below 50");
        assert_eq!(state.pickup_threshold, 50);
        assert_eq!(state.previous_threshold, 37);
    }

    #[test]
    fn modifiers_fold_chosen_boosts() {
        let mut state = player();
        state
            .boosts
            .push(Boost::new(BoostKind::Magnet, BoostRarity::Common));
        assert!((state.modifiers().pickup_radius_multiplier() - 1.25).abs() < 1e-6);
        assert_eq!(state.snapshot().boosts.len(), 1);
    }
}
