//! Boost catalog and the fold that turns active boosts into stat modifiers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{catalog::WeaponStats, PlayerId};

/// Scrap a player must collect before the first boost offer.
pub const STARTING_PICKUP_THRESHOLD: u32 = 20;

const MIN_COOLDOWN_MULTIPLIER: f32 = 0.1;

/// Threshold that follows `threshold`, grown by 35% and rounded up.
#[must_use]
pub const fn next_pickup_threshold(threshold: u32) -> u32 {
    (threshold * 135 + 99) / 100
}

/// Rarity tiers rolled for boosts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoostRarity {
    /// Baseline strength.
    Common,
    /// 20% stronger.
    Uncommon,
    /// 40% stronger.
    Rare,
    /// 70% stronger.
    Epic,
    /// Twice as strong.
    Legendary,
}

impl BoostRarity {
    /// Every boost tier from most to least frequent.
    pub const ALL: [BoostRarity; 5] = [
        BoostRarity::Common,
        BoostRarity::Uncommon,
        BoostRarity::Rare,
        BoostRarity::Epic,
        BoostRarity::Legendary,
    ];

    /// Strength multiplier of the tier.
    #[must_use]
    pub const fn multiplier(self) -> f32 {
        match self {
            Self::Common => 1.0,
            Self::Uncommon => 1.2,
            Self::Rare => 1.4,
            Self::Epic => 1.7,
            Self::Legendary => 2.0,
        }
    }

    /// Relative roll weight of the tier.
    #[must_use]
    pub const fn weight(self) -> u32 {
        match self {
            Self::Common => 50,
            Self::Uncommon => 30,
            Self::Rare => 13,
            Self::Epic => 5,
            Self::Legendary => 2,
        }
    }
}

/// Stats a stacking boost may modify.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModifierKey {
    /// Multiplies weapon cooldowns.
    CooldownMult,
    /// Multiplies weapon power.
    PowerMult,
    /// Multiplies weapon range.
    RangeMult,
    /// Multiplies weapon hit points.
    HpMult,
    /// Multiplies weapon knockback.
    KnockbackMult,
    /// Adds to weapon heat resistance.
    HeatResistBonus,
    /// Adds to the session's per-tick heat dissipation.
    HeatDissipationBonus,
    /// Adds to the scrap dropped by enemies the player destroys.
    ScrapBonus,
    /// Multiplies the player's pickup radius.
    PickupRadiusMult,
}

/// Effects applied once, the moment the boost is chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OneShotEffect {
    /// Restores every weapon to full hit points.
    HealWeapons,
    /// Destroys every enemy that has not reached the pit.
    DestroyAllEnemies,
    /// Stops enemy movement for a fixed duration.
    FreezeEnemies,
    /// Collects every scrap pickup on the floor.
    VacuumScrap,
}

/// Tagged effect descriptor interpreted by [`BoostModifiers::fold`] and the world.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum BoostEffect {
    /// Stacking stat modifier kept for the rest of the session.
    Modifier {
        /// Stat being modified.
        key: ModifierKey,
        /// Multiplier for `*Mult` keys, addend for `*Bonus` keys.
        value: f32,
    },
    /// Immediate effect.
    OneShot(OneShotEffect),
}

/// Boosts that can appear in an offer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoostKind {
    /// Shorter cooldowns.
    Overclock,
    /// More power.
    HighPressure,
    /// Longer range.
    LongNozzle,
    /// More weapon hit points.
    Reinforced,
    /// Stronger knockback.
    Shockwave,
    /// Higher heat resistance.
    Insulation,
    /// Faster heat dissipation.
    Coolant,
    /// More scrap per kill.
    Salvager,
    /// Larger pickup radius.
    Magnet,
    /// Heals all weapons.
    Repair,
    /// Destroys all enemies on the belts.
    Purge,
    /// Freezes all enemies.
    CryoBlast,
    /// Collects all scrap.
    Vacuum,
}

impl BoostKind {
    /// Every boost kind in catalog order.
    pub const ALL: [BoostKind; 13] = [
        BoostKind::Overclock,
        BoostKind::HighPressure,
        BoostKind::LongNozzle,
        BoostKind::Reinforced,
        BoostKind::Shockwave,
        BoostKind::Insulation,
        BoostKind::Coolant,
        BoostKind::Salvager,
        BoostKind::Magnet,
        BoostKind::Repair,
        BoostKind::Purge,
        BoostKind::CryoBlast,
        BoostKind::Vacuum,
    ];

    /// Effect of this kind at the given tier.
    #[must_use]
    pub fn effect(self, rarity: BoostRarity) -> BoostEffect {
        let tier = rarity.multiplier();
        let modifier = |key, value| BoostEffect::Modifier { key, value };
        match self {
            Self::Overclock => modifier(ModifierKey::CooldownMult, 1.0 - 0.1 * tier),
            Self::HighPressure => modifier(ModifierKey::PowerMult, 1.0 + 0.1 * tier),
            Self::LongNozzle => modifier(ModifierKey::RangeMult, 1.0 + 0.1 * tier),
            Self::Reinforced => modifier(ModifierKey::HpMult, 1.0 + 0.15 * tier),
            Self::Shockwave => modifier(ModifierKey::KnockbackMult, 1.0 + 0.25 * tier),
            Self::Insulation => modifier(ModifierKey::HeatResistBonus, 10.0 * tier),
            Self::Coolant => modifier(ModifierKey::HeatDissipationBonus, 0.25 * tier),
            Self::Salvager => modifier(ModifierKey::ScrapBonus, tier.floor()),
            Self::Magnet => modifier(ModifierKey::PickupRadiusMult, 1.0 + 0.25 * tier),
            Self::Repair => BoostEffect::OneShot(OneShotEffect::HealWeapons),
            Self::Purge => BoostEffect::OneShot(OneShotEffect::DestroyAllEnemies),
            Self::CryoBlast => BoostEffect::OneShot(OneShotEffect::FreezeEnemies),
            Self::Vacuum => BoostEffect::OneShot(OneShotEffect::VacuumScrap),
        }
    }
}

/// A rolled boost instance.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Boost {
    /// Boost family.
    pub kind: BoostKind,
    /// Rolled tier.
    pub rarity: BoostRarity,
    /// Resolved effect.
    pub effect: BoostEffect,
}

impl Boost {
    /// Resolves a boost of the given kind and tier.
    #[must_use]
    pub fn new(kind: BoostKind, rarity: BoostRarity) -> Self {
        Self {
            kind,
            rarity,
            effect: kind.effect(rarity),
        }
    }

    /// Reports whether the boost applies once instead of stacking.
    #[must_use]
    pub fn is_one_shot(&self) -> bool {
        matches!(self.effect, BoostEffect::OneShot(_))
    }
}

/// Aggregated stacking modifiers of one player.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoostModifiers {
    cooldown: f32,
    power: f32,
    range: f32,
    hp: f32,
    knockback: f32,
    heat_resist: f32,
    heat_dissipation: f32,
    scrap: f32,
    pickup_radius: f32,
}

impl Default for BoostModifiers {
    fn default() -> Self {
        Self {
            cooldown: 1.0,
            power: 1.0,
            range: 1.0,
            hp: 1.0,
            knockback: 1.0,
            heat_resist: 0.0,
            heat_dissipation: 0.0,
            scrap: 0.0,
            pickup_radius: 1.0,
        }
    }
}

impl BoostModifiers {
    /// Folds active boosts: `*Mult` keys multiply, `*Bonus` keys add.
    ///
    /// One-shot boosts never reach a player's active list, and are ignored.
    #[must_use]
    pub fn fold<'a>(boosts: impl IntoIterator<Item = &'a Boost>) -> Self {
        boosts
            .into_iter()
            .fold(Self::default(), |mut acc, boost| {
                if let BoostEffect::Modifier { key, value } = boost.effect {
                    match key {
                        ModifierKey::CooldownMult => acc.cooldown *= value,
                        ModifierKey::PowerMult => acc.power *= value,
                        ModifierKey::RangeMult => acc.range *= value,
                        ModifierKey::HpMult => acc.hp *= value,
                        ModifierKey::KnockbackMult => acc.knockback *= value,
                        ModifierKey::HeatResistBonus => acc.heat_resist += value,
                        ModifierKey::HeatDissipationBonus => acc.heat_dissipation += value,
                        ModifierKey::ScrapBonus => acc.scrap += value,
                        ModifierKey::PickupRadiusMult => acc.pickup_radius *= value,
                    }
                }
                acc
            })
    }

    /// Effective weapon statistics under these modifiers.
    #[must_use]
    pub fn apply(&self, stats: WeaponStats) -> WeaponStats {
        WeaponStats {
            power: stats.power * self.power,
            cooldown: stats
                .cooldown
                .mul_f32(self.cooldown.max(MIN_COOLDOWN_MULTIPLIER)),
            range: stats.range * self.range,
            heat_generation: stats.heat_generation,
            heat_resist: stats.heat_resist + self.heat_resist,
            max_hp: (stats.max_hp as f32 * self.hp).floor() as u32,
            knockback: stats.knockback * self.knockback,
        }
    }

    /// Extra per-tick heat dissipation contributed by the player.
    #[must_use]
    pub fn heat_dissipation_bonus(&self) -> f32 {
        self.heat_dissipation.max(0.0)
    }

    /// Extra scrap added to every enemy the player destroys.
    #[must_use]
    pub fn scrap_bonus(&self) -> u32 {
        self.scrap.max(0.0).floor() as u32
    }

    /// Multiplier applied to the player's pickup radius.
    #[must_use]
    pub fn pickup_radius_multiplier(&self) -> f32 {
        self.pickup_radius
    }
}

/// Folded modifiers of every player in a session.
#[derive(Clone, Debug, Default)]
pub struct ModifierTable {
    players: BTreeMap<PlayerId, BoostModifiers>,
}

impl ModifierTable {
    /// Creates a table from per-player modifiers.
    #[must_use]
    pub fn new(players: BTreeMap<PlayerId, BoostModifiers>) -> Self {
        Self { players }
    }

    /// Modifiers of the given player, neutral when the player left.
    #[must_use]
    pub fn for_owner(&self, player: PlayerId) -> BoostModifiers {
        self.players.get(&player).copied().unwrap_or_default()
    }

    /// Sum of every player's heat dissipation bonus.
    #[must_use]
    pub fn total_heat_dissipation(&self) -> f32 {
        self.players
            .values()
            .map(BoostModifiers::heat_dissipation_bonus)
            .sum()
    }
}
