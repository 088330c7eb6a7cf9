#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Random generation of weapons, waste and boosts.
//!
//! The free functions roll single instances from any random source so the
//! wave scheduler can reuse them with its own stream. [`BoostOffers`] is the
//! pure system that answers threshold crossings with boost offers.

use pit_defence_core::{
    catalog::size_base_stats, Ability, Boost, BoostKind, BoostRarity, Command, EnemyProfile,
    Event, Material, WasteRarity, WeaponAdjective, WeaponKind, WeaponRarity, WeaponSpec,
};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Number of boosts presented in one offer.
pub const OFFER_SIZE: usize = 3;

const ADJECTIVE_CHANCE: f64 = 0.3;
const SMALL_SIZE_CHANCE: f64 = 0.7;

/// Rolls a weapon item: uniform kind, weighted rarity, 30% adjective chance.
///
/// Sessions never roll weapons themselves. Toolbelts arrive through
/// `Command::SaveToolbelt`, and this is the entry point the inventory
/// service uses to mint the items it hands out.
pub fn roll_weapon<R: Rng + ?Sized>(rng: &mut R) -> WeaponSpec {
    let kind = WeaponKind::ALL
        .choose(rng)
        .copied()
        .unwrap_or(WeaponKind::PressureWasher);
    let rarity = WeaponRarity::ALL
        .choose_weighted(rng, |rarity| rarity.weight())
        .ok()
        .copied()
        .unwrap_or(WeaponRarity::Common);
    let adjective = if rng.gen_bool(ADJECTIVE_CHANCE) {
        WeaponAdjective::ALL.choose(rng).copied()
    } else {
        None
    };

    WeaponSpec {
        kind,
        rarity,
        adjective,
    }
}

/// Rolls a waste unit for the given wave.
///
/// `base_hp` is the per-enemy hit point budget of the wave; it is scaled by
/// the unit's size and rarity. Boss units always carry an ability.
pub fn roll_waste<R: Rng + ?Sized>(
    rng: &mut R,
    wave: u32,
    base_hp: f32,
    boss: bool,
) -> EnemyProfile {
    let rarity = if boss {
        WasteRarity::Boss
    } else {
        WasteRarity::ROLLED
            .choose_weighted(rng, |rarity| rarity.spawn_weight())
            .ok()
            .copied()
            .unwrap_or(WasteRarity::Common)
    };
    let material = Material::ALL
        .choose(rng)
        .copied()
        .unwrap_or(Material::Mixed);
    let size = roll_size(rng, rarity);
    let (size_hp, toughness, density, value) = size_base_stats(size);
    let stat = rarity.stat_multiplier();

    let ability = if rng.gen_bool(rarity.ability_chance()) {
        Ability::ALL.choose(rng).copied()
    } else {
        None
    };

    EnemyProfile {
        name: waste_name(rarity, material, size, wave),
        material,
        rarity,
        size,
        max_hp: (base_hp * size_hp / 10.0 * stat).floor().max(1.0),
        toughness: (toughness * stat).floor(),
        density: density * stat * 0.5,
        value: (value as f32 * rarity.value_multiplier()).floor() as u32,
        ability,
    }
}

/// Rolls a boost: uniform kind, weighted tier.
pub fn roll_boost<R: Rng + ?Sized>(rng: &mut R) -> Boost {
    let kind = BoostKind::ALL
        .choose(rng)
        .copied()
        .unwrap_or(BoostKind::Overclock);
    Boost::new(kind, roll_boost_rarity(rng))
}

/// Rolls an offer of [`OFFER_SIZE`] boosts of distinct kinds.
pub fn roll_offer<R: Rng + ?Sized>(rng: &mut R) -> Vec<Boost> {
    let kinds: Vec<BoostKind> = BoostKind::ALL
        .choose_multiple(rng, OFFER_SIZE)
        .copied()
        .collect();
    kinds
        .into_iter()
        .map(|kind| Boost::new(kind, roll_boost_rarity(rng)))
        .collect()
}

fn roll_boost_rarity<R: Rng + ?Sized>(rng: &mut R) -> BoostRarity {
    BoostRarity::ALL
        .choose_weighted(rng, |rarity| rarity.weight())
        .ok()
        .copied()
        .unwrap_or(BoostRarity::Common)
}

fn roll_size<R: Rng + ?Sized>(rng: &mut R, rarity: WasteRarity) -> u8 {
    match rarity {
        WasteRarity::Common => 1,
        WasteRarity::Uncommon | WasteRarity::Rare => {
            if rng.gen_bool(SMALL_SIZE_CHANCE) {
                1
            } else {
                2
            }
        }
        WasteRarity::Epic | WasteRarity::Legendary => {
            if rng.gen_bool(0.5) {
                2
            } else {
                3
            }
        }
        WasteRarity::Boss => rng.gen_range(2..=3),
    }
}

fn waste_name(rarity: WasteRarity, material: Material, size: u8, wave: u32) -> String {
    let noun = match (material, size) {
        (Material::Organic, 1) => "Peel",
        (Material::Organic, 2) => "Compost Heap",
        (Material::Organic, _) => "Rot Mound",
        (Material::Metal, 1) => "Can",
        (Material::Metal, 2) => "Scrap Bundle",
        (Material::Metal, _) => "Wreck",
        (Material::Chemical, 1) => "Vial",
        (Material::Chemical, 2) => "Barrel",
        (Material::Chemical, _) => "Tank",
        (Material::Mixed, 1) => "Bag",
        (Material::Mixed, 2) => "Bale",
        (Material::Mixed, _) => "Heap",
    };

    match rarity {
        WasteRarity::Boss => format!("Wave {wave} Boss {} {noun}", material.label()),
        other => format!("{} {} {noun}", other.label(), material.label()),
    }
}

/// Pure system answering boost threshold crossings with offers.
#[derive(Debug)]
pub struct BoostOffers {
    rng: ChaCha8Rng,
}

impl BoostOffers {
    /// Creates the system with a dedicated random stream.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Emits `Command::OfferBoosts` for every threshold crossing.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            if let Event::BoostThresholdCrossed { player, .. } = event {
                out.push(Command::OfferBoosts {
                    player: *player,
                    boosts: roll_offer(&mut self.rng),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pit_defence_core::PlayerId;
    use std::collections::BTreeSet;

    #[test]
    fn bosses_are_large_and_always_gifted() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..50 {
            let boss = roll_waste(&mut rng, 5, 20.0, true);
            assert_eq!(boss.rarity, WasteRarity::Boss);
            assert!((2..=3).contains(&boss.size));
            assert!(boss.ability.is_some());
            assert!(boss.name.starts_with("Wave 5 Boss"));
        }
    }

    #[test]
    fn common_waste_is_small_and_plain() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let commons: Vec<EnemyProfile> = (0..400)
            .map(|_| roll_waste(&mut rng, 1, 20.0, false))
            .filter(|profile| profile.rarity == WasteRarity::Common)
            .collect();
        assert!(!commons.is_empty());
        for profile in commons {
            assert_eq!(profile.size, 1);
            assert_eq!(profile.ability, None);
            assert_eq!(profile.max_hp, 20.0);
            assert_eq!(profile.toughness, 0.0);
            assert_eq!(profile.value, 1);
            assert!((profile.density - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn rolls_are_deterministic_for_a_seed() {
        let mut first = ChaCha8Rng::seed_from_u64(99);
        let mut second = ChaCha8Rng::seed_from_u64(99);
        for _ in 0..20 {
            assert_eq!(roll_weapon(&mut first), roll_weapon(&mut second));
            assert_eq!(
                roll_waste(&mut first, 3, 18.0, false),
                roll_waste(&mut second, 3, 18.0, false)
            );
        }
    }

    #[test]
    fn common_weapons_dominate() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let commons = (0..1000)
            .filter(|_| roll_weapon(&mut rng).rarity == WeaponRarity::Common)
            .count();
        assert!((400..600).contains(&commons), "{commons} commons out of 1000");
    }

    #[test]
    fn offers_hold_three_distinct_kinds() {
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        for _ in 0..50 {
            let offer = roll_offer(&mut rng);
            assert_eq!(offer.len(), OFFER_SIZE);
            let kinds: BTreeSet<String> = offer
                .iter()
                .map(|boost| format!("{:?}", boost.kind))
                .collect();
            assert_eq!(kinds.len(), OFFER_SIZE);
        }
    }

    #[test]
    fn single_boosts_resolve_their_effect() {
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        for _ in 0..20 {
            let boost = roll_boost(&mut rng);
            assert_eq!(boost, Boost::new(boost.kind, boost.rarity));
        }
    }

    #[test]
    fn offers_only_answer_threshold_crossings() {
        let mut system = BoostOffers::new(4);
        let events = vec![
            Event::PauseChanged { paused: true },
            Event::BoostThresholdCrossed {
                player: PlayerId::new(3),
                threshold: 20,
                next_threshold: 27,
            },
        ];
        let mut out = Vec::new();
        system.handle(&events, &mut out);

        assert_eq!(out.len(), 1);
        match &out[0] {
            Command::OfferBoosts { player, boosts } => {
                assert_eq!(*player, PlayerId::new(3));
                assert_eq!(boosts.len(), OFFER_SIZE);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
