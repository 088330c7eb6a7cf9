//! Static catalogs describing weapons, waste and the damage formula.
//!
//! Everything in this module is pure data: the random rolls that pick a
//! rarity, an adjective or a special ability live in the loot system.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::CellRectSize;

/// Damage families that materials may be weak or resistant to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageTag {
    /// High pressure water.
    Water,
    /// Blunt kinetic impact.
    Physical,
    /// Focused light.
    Laser,
    /// Electric discharge.
    Electric,
    /// Magnetic acceleration.
    Magnetic,
    /// Enzymatic cleaner.
    BioCleaner,
    /// Open flame.
    Incinerator,
    /// Chemical neutralizer.
    Neutralizer,
}

/// Area a weapon affects when it fires. Carried for clients; targeting is
/// always single-enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FireShape {
    /// Widening spray in front of the weapon.
    Cone,
    /// Homing missiles.
    Missile,
    /// Straight beam.
    Line,
    /// Area around the weapon.
    Circle,
}

/// Weapon families that can be carried on a toolbelt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponKind {
    /// Cheap short-range sprayer, the default toolbelt weapon.
    PressureWasher,
    /// Slow launcher firing homing volleys.
    MissileLauncher,
    /// Fast, cool-running beam.
    LaserCutter,
    /// Large pod launching homing neutralizer capsules.
    WasteEscapePod,
    /// Very fast, very hot flame sprayer.
    FlameThrower,
    /// Long-range, heavy-hitting rail.
    Railgun,
}

impl WeaponKind {
    /// Every weapon kind in catalog order.
    pub const ALL: [WeaponKind; 6] = [
        WeaponKind::PressureWasher,
        WeaponKind::MissileLauncher,
        WeaponKind::LaserCutter,
        WeaponKind::WasteEscapePod,
        WeaponKind::FlameThrower,
        WeaponKind::Railgun,
    ];

    /// Unscaled statistics of a common weapon without adjective.
    #[must_use]
    pub const fn base_stats(self) -> WeaponStats {
        let (power, cooldown_ms, range, heat_generation, heat_resist, max_hp, knockback) =
            match self {
                Self::PressureWasher => (50.0, 1000, 5.0, 10.0, 10.0, 100, 1.0),
                Self::MissileLauncher => (100.0, 3000, 18.0, 15.0, 5.0, 120, 2.0),
                Self::LaserCutter => (30.0, 800, 6.0, 5.0, 8.0, 80, 1.0),
                Self::WasteEscapePod => (10.0, 2000, 3.0, 2.0, 15.0, 150, 3.0),
                Self::FlameThrower => (20.0, 500, 4.0, 20.0, 5.0, 90, 0.0),
                Self::Railgun => (200.0, 5000, 20.0, 25.0, 10.0, 140, 5.0),
            };
        WeaponStats {
            power,
            cooldown: Duration::from_millis(cooldown_ms),
            range,
            heat_generation,
            heat_resist,
            max_hp,
            knockback,
        }
    }

    /// Footprint occupied on the grid.
    #[must_use]
    pub const fn footprint(self) -> CellRectSize {
        match self {
            Self::PressureWasher | Self::FlameThrower => CellRectSize::new(1, 1),
            Self::MissileLauncher => CellRectSize::new(2, 2),
            Self::LaserCutter => CellRectSize::new(1, 3),
            Self::WasteEscapePod => CellRectSize::new(4, 4),
            Self::Railgun => CellRectSize::new(3, 1),
        }
    }

    /// Area affected when firing.
    #[must_use]
    pub const fn shape(self) -> FireShape {
        match self {
            Self::PressureWasher | Self::FlameThrower => FireShape::Cone,
            Self::MissileLauncher => FireShape::Missile,
            Self::LaserCutter | Self::Railgun => FireShape::Line,
            Self::WasteEscapePod => FireShape::Circle,
        }
    }

    /// Damage family dealt by the weapon.
    #[must_use]
    pub const fn damage_tag(self) -> DamageTag {
        match self {
            Self::PressureWasher => DamageTag::Water,
            Self::MissileLauncher => DamageTag::Physical,
            Self::LaserCutter => DamageTag::Laser,
            Self::WasteEscapePod => DamageTag::Neutralizer,
            Self::FlameThrower => DamageTag::Incinerator,
            Self::Railgun => DamageTag::Magnetic,
        }
    }

    /// Number of homing projectiles per shot, `None` for instant-hit weapons.
    #[must_use]
    pub const fn volley(self) -> Option<u32> {
        match self {
            Self::MissileLauncher => Some(3),
            Self::WasteEscapePod => Some(2),
            _ => None,
        }
    }

    /// Human readable name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::PressureWasher => "Pressure Washer",
            Self::MissileLauncher => "Missile Launcher",
            Self::LaserCutter => "Laser Cutter",
            Self::WasteEscapePod => "Waste Escape Pod",
            Self::FlameThrower => "Flame Thrower",
            Self::Railgun => "Railgun",
        }
    }
}

/// Rarity tiers rolled for weapons.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponRarity {
    /// Most frequent tier.
    Common,
    /// Slightly improved tier.
    Uncommon,
    /// Noticeably improved tier.
    Rare,
    /// Very rare tier.
    Mythic,
    /// Rarest tier.
    Legendary,
}

impl WeaponRarity {
    /// Every weapon rarity from most to least frequent.
    pub const ALL: [WeaponRarity; 5] = [
        WeaponRarity::Common,
        WeaponRarity::Uncommon,
        WeaponRarity::Rare,
        WeaponRarity::Mythic,
        WeaponRarity::Legendary,
    ];

    /// Stat multiplier applied by the tier.
    #[must_use]
    pub const fn modifier(self) -> f32 {
        match self {
            Self::Common => 1.0,
            Self::Uncommon => 1.1,
            Self::Rare => 1.25,
            Self::Mythic => 1.5,
            Self::Legendary => 2.0,
        }
    }

    /// Relative roll weight of the tier.
    #[must_use]
    pub const fn weight(self) -> f64 {
        match self {
            Self::Common => 0.5,
            Self::Uncommon => 0.35,
            Self::Rare => 0.13,
            Self::Mythic => 0.016_66,
            Self::Legendary => 0.003_33,
        }
    }
}

/// Optional quirk rolled on top of a weapon's rarity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponAdjective {
    /// Fires 20% more often.
    RapidFire,
    /// Has 20% more hit points.
    HighCapacity,
    /// Hits 10% harder.
    Freezing,
}

impl WeaponAdjective {
    /// Every adjective in catalog order.
    pub const ALL: [WeaponAdjective; 3] = [
        WeaponAdjective::RapidFire,
        WeaponAdjective::HighCapacity,
        WeaponAdjective::Freezing,
    ];
}

/// Statistics that drive firing, heat and durability.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeaponStats {
    /// Base damage before resistances and toughness.
    pub power: f32,
    /// Minimum time between two shots.
    pub cooldown: Duration,
    /// Targeting radius measured in cells from the footprint edge.
    pub range: f32,
    /// Heat added to the session per shot.
    pub heat_generation: f32,
    /// Session heat the weapon tolerates without damage.
    pub heat_resist: f32,
    /// Hit points of a freshly placed weapon.
    pub max_hp: u32,
    /// Knockback strength per hit.
    pub knockback: f32,
}

/// A concrete weapon item as carried on a toolbelt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WeaponSpec {
    /// Weapon family.
    pub kind: WeaponKind,
    /// Rolled rarity tier.
    pub rarity: WeaponRarity,
    /// Rolled adjective, if any.
    pub adjective: Option<WeaponAdjective>,
}

impl Default for WeaponSpec {
    fn default() -> Self {
        Self {
            kind: WeaponKind::PressureWasher,
            rarity: WeaponRarity::Common,
            adjective: None,
        }
    }
}

impl WeaponSpec {
    /// Statistics after rarity scaling and adjective, before boosts.
    ///
    /// Rarity scales power, heat resistance, hit points and knockback up and
    /// shortens the cooldown; each scaled value is floored.
    #[must_use]
    pub fn stats(&self) -> WeaponStats {
        let base = self.kind.base_stats();
        let modifier = self.rarity.modifier();
        let mut cooldown_ms = (base.cooldown.as_millis() as f32 / modifier).floor();
        let mut power = (base.power * modifier).floor();
        let mut max_hp = (base.max_hp as f32 * modifier).floor();

        match self.adjective {
            Some(WeaponAdjective::RapidFire) => cooldown_ms = (cooldown_ms * 0.8).floor(),
            Some(WeaponAdjective::HighCapacity) => max_hp = (max_hp * 1.2).floor(),
            Some(WeaponAdjective::Freezing) => power = (power * 1.1).floor(),
            None => {}
        }

        WeaponStats {
            power,
            cooldown: Duration::from_millis(cooldown_ms as u64),
            range: base.range,
            heat_generation: base.heat_generation,
            heat_resist: (base.heat_resist * modifier).floor(),
            max_hp: max_hp as u32,
            knockback: (base.knockback * modifier).floor(),
        }
    }
}

/// Material a waste unit is made of.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Material {
    /// Rotting organic matter.
    Organic,
    /// Scrap metal.
    Metal,
    /// Leaking chemicals.
    Chemical,
    /// Unsorted mixture with no affinities.
    Mixed,
}

impl Material {
    /// Every material in catalog order.
    pub const ALL: [Material; 4] = [
        Material::Organic,
        Material::Metal,
        Material::Chemical,
        Material::Mixed,
    ];

    /// Damage families dealing 50% extra damage.
    #[must_use]
    pub const fn weak_to(self) -> &'static [DamageTag] {
        match self {
            Self::Organic => &[DamageTag::BioCleaner, DamageTag::Incinerator],
            Self::Metal => &[DamageTag::Laser, DamageTag::Electric, DamageTag::Magnetic],
            Self::Chemical => &[DamageTag::Neutralizer, DamageTag::Incinerator],
            Self::Mixed => &[],
        }
    }

    /// Damage families dealing half damage.
    #[must_use]
    pub const fn resistant_to(self) -> &'static [DamageTag] {
        match self {
            Self::Organic => &[DamageTag::Laser, DamageTag::Electric],
            Self::Metal => &[DamageTag::BioCleaner, DamageTag::Physical],
            Self::Chemical => &[DamageTag::Water, DamageTag::BioCleaner],
            Self::Mixed => &[],
        }
    }

    /// Human readable name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Organic => "Organic",
            Self::Metal => "Metal",
            Self::Chemical => "Chemical",
            Self::Mixed => "Mixed",
        }
    }
}

/// Rarity tiers rolled for waste.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WasteRarity {
    /// Most frequent tier.
    Common,
    /// Tougher tier.
    Uncommon,
    /// Rare tier.
    Rare,
    /// Epic tier.
    Epic,
    /// Legendary tier.
    Legendary,
    /// Mini-boss tier, never rolled randomly.
    Boss,
}

impl WasteRarity {
    /// Tiers that can be rolled for regular spawns.
    pub const ROLLED: [WasteRarity; 5] = [
        WasteRarity::Common,
        WasteRarity::Uncommon,
        WasteRarity::Rare,
        WasteRarity::Epic,
        WasteRarity::Legendary,
    ];

    /// Zero-based tier index used to scale ability chances.
    #[must_use]
    pub const fn index(self) -> u32 {
        match self {
            Self::Common => 0,
            Self::Uncommon => 1,
            Self::Rare => 2,
            Self::Epic => 3,
            Self::Legendary => 4,
            Self::Boss => 5,
        }
    }

    /// Multiplier applied to hit points, toughness and density.
    #[must_use]
    pub const fn stat_multiplier(self) -> f32 {
        match self {
            Self::Common => 1.0,
            Self::Uncommon => 1.5,
            Self::Rare => 2.0,
            Self::Epic => 3.0,
            Self::Legendary => 5.0,
            Self::Boss => 10.0,
        }
    }

    /// Multiplier applied to the scrap value.
    #[must_use]
    pub const fn value_multiplier(self) -> f32 {
        match self {
            Self::Common => 1.0,
            Self::Uncommon => 1.5,
            Self::Rare => 3.0,
            Self::Epic => 5.0,
            Self::Legendary => 10.0,
            Self::Boss => 20.0,
        }
    }

    /// Relative roll weight; zero for tiers that are only placed manually.
    #[must_use]
    pub const fn spawn_weight(self) -> u32 {
        match self {
            Self::Common => 100,
            Self::Uncommon => 50,
            Self::Rare => 20,
            Self::Epic => 10,
            Self::Legendary => 5,
            Self::Boss => 0,
        }
    }

    /// Probability that a unit of this tier carries a special ability.
    #[must_use]
    pub fn ability_chance(self) -> f64 {
        match self {
            Self::Boss => 1.0,
            other => (f64::from(other.index()) * 0.15).min(0.5),
        }
    }

    /// Human readable name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Common => "Common",
            Self::Uncommon => "Uncommon",
            Self::Rare => "Rare",
            Self::Epic => "Epic",
            Self::Legendary => "Legendary",
            Self::Boss => "Boss",
        }
    }
}

/// Special abilities a waste unit may carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ability {
    /// Splits into two smaller units on death.
    Split,
    /// Heals 5% of its maximum hit points per second.
    Regenerating,
    /// Takes half damage.
    Armored,
    /// Moves 50% faster.
    Fast,
    /// Damages nearby weapons on death.
    Explosive,
    /// Heats up nearby weapons.
    Toxic,
}

impl Ability {
    /// Every ability in catalog order.
    pub const ALL: [Ability; 6] = [
        Ability::Split,
        Ability::Regenerating,
        Ability::Armored,
        Ability::Fast,
        Ability::Explosive,
        Ability::Toxic,
    ];
}

/// Unscaled stats of a waste unit of the given size.
///
/// Returns `(hp, toughness, density, value)`; sizes outside `1..=3` clamp.
#[must_use]
pub const fn size_base_stats(size: u8) -> (f32, f32, f32, u32) {
    match size {
        0 | 1 => (10.0, 0.0, 1.0, 1),
        2 => (25.0, 2.0, 1.5, 3),
        _ => (50.0, 5.0, 2.0, 6),
    }
}

/// Fully rolled waste template used to spawn an enemy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyProfile {
    /// Generated display name.
    pub name: String,
    /// Material the unit is made of.
    pub material: Material,
    /// Rolled rarity tier.
    pub rarity: WasteRarity,
    /// Edge length in cells, `1..=3`.
    pub size: u8,
    /// Maximum hit points.
    pub max_hp: f32,
    /// Flat damage reduction.
    pub toughness: f32,
    /// Resistance to knockback.
    pub density: f32,
    /// Scrap dropped on death.
    pub value: u32,
    /// Special ability, if any.
    pub ability: Option<Ability>,
}

impl EnemyProfile {
    /// Overflow consumed when the unit reaches the pit.
    #[must_use]
    pub fn footprint(&self) -> i32 {
        i32::from(self.size) * i32::from(self.size)
    }

    /// Reports whether the unit carries the given ability.
    #[must_use]
    pub fn has(&self, ability: Ability) -> bool {
        self.ability == Some(ability)
    }

    /// Template of each of the two units left behind by a splitting unit.
    #[must_use]
    pub fn split_child(&self) -> EnemyProfile {
        EnemyProfile {
            name: format!("{} Fragment", self.name),
            size: self.size.saturating_sub(1).max(1),
            max_hp: (self.max_hp * 0.5).floor().max(1.0),
            value: (self.value / 2).max(1),
            ability: None,
            ..self.clone()
        }
    }
}

/// Resolves the damage dealt by one hit.
///
/// Armor halves the base, a weakness adds 50% and a resistance halves it
/// again. Toughness is subtracted last and the result never drops below one.
#[must_use]
pub fn calculate_damage(
    base: f32,
    tag: DamageTag,
    material: Material,
    toughness: f32,
    armored: bool,
) -> u32 {
    let mut damage = base;
    if armored {
        damage *= 0.5;
    }

    if material.weak_to().contains(&tag) {
        damage *= 1.5;
    } else if material.resistant_to().contains(&tag) {
        damage *= 0.5;
    }

    (damage - toughness).max(1.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weakness_adds_half_before_toughness() {
        assert_eq!(
            calculate_damage(20.0, DamageTag::Incinerator, Material::Organic, 5.0, false),
            25
        );
    }

    #[test]
    fn resistance_and_armor_stack() {
        assert_eq!(
            calculate_damage(40.0, DamageTag::Water, Material::Chemical, 0.0, false),
            20
        );
        assert_eq!(
            calculate_damage(40.0, DamageTag::Water, Material::Chemical, 0.0, true),
            10
        );
    }

    #[test]
    fn damage_never_drops_below_one() {
        assert_eq!(
            calculate_damage(10.0, DamageTag::Physical, Material::Metal, 50.0, true),
            1
        );
    }

    #[test]
    fn mixed_material_is_neutral() {
        for tag in [DamageTag::Laser, DamageTag::Water, DamageTag::Incinerator] {
            assert_eq!(calculate_damage(30.0, tag, Material::Mixed, 0.0, false), 30);
        }
    }

    #[test]
    fn rarity_scales_and_floors_weapon_stats() {
        let spec = WeaponSpec {
            kind: WeaponKind::LaserCutter,
            rarity: WeaponRarity::Rare,
            adjective: None,
        };
        let stats = spec.stats();
        assert_eq!(stats.power, 37.0);
        assert_eq!(stats.cooldown, Duration::from_millis(640));
        assert_eq!(stats.max_hp, 100);
        assert_eq!(stats.heat_resist, 10.0);
        assert_eq!(stats.knockback, 1.0);
    }

    #[test]
    fn adjectives_modify_their_stat_only() {
        let base = WeaponSpec::default();
        let rapid = WeaponSpec {
            adjective: Some(WeaponAdjective::RapidFire),
            ..base
        };
        let sturdy = WeaponSpec {
            adjective: Some(WeaponAdjective::HighCapacity),
            ..base
        };
        assert_eq!(rapid.stats().cooldown, Duration::from_millis(800));
        assert_eq!(rapid.stats().power, base.stats().power);
        assert_eq!(sturdy.stats().max_hp, 120);
        assert_eq!(sturdy.stats().cooldown, base.stats().cooldown);
    }

    #[test]
    fn split_child_shrinks_and_loses_ability() {
        let parent = EnemyProfile {
            name: "Rare Organic Sludge".to_owned(),
            material: Material::Organic,
            rarity: WasteRarity::Rare,
            size: 2,
            max_hp: 51.0,
            toughness: 4.0,
            density: 1.5,
            value: 9,
            ability: Some(Ability::Split),
        };
        let child = parent.split_child();
        assert_eq!(child.size, 1);
        assert_eq!(child.max_hp, 25.0);
        assert_eq!(child.ability, None);
        assert_eq!(child.footprint(), 1);
        assert_eq!(parent.footprint(), 4);
    }

    #[test]
    fn ability_chance_caps_at_half() {
        assert_eq!(WasteRarity::Common.ability_chance(), 0.0);
        assert!((WasteRarity::Rare.ability_chance() - 0.3).abs() < 1e-9);
        assert_eq!(WasteRarity::Legendary.ability_chance(), 0.5);
        assert_eq!(WasteRarity::Boss.ability_chance(), 1.0);
    }
}
