#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system resolving enemy movement, weapon fire, heat and projectiles.
//!
//! Each phase reads fresh views of the world and emits commands; the caller
//! applies them before running the next phase so later phases observe the
//! effects of earlier ones.

use std::collections::BTreeMap;

use pit_defence_core::{
    calculate_damage, Ability, CellPoint, Command, EnemyId, EnemySnapshot, EnemyView, MapLayout,
    ModifierTable, ProjectileView, SessionStatus, ShiftOutcome, TickContext, WeaponSnapshot,
    WeaponStats, WeaponView, BASE_HEAT_DISSIPATION, HEAT_THRESHOLD,
};

/// Cells per second covered by an enemy on a belt.
pub const ENEMY_SPEED: f32 = 2.0;
/// Speed multiplier of the fast ability.
pub const FAST_MULTIPLIER: f32 = 1.5;
/// Toxic enemies within this many cells of a weapon heat the session.
pub const TOXIC_RADIUS: f32 = 3.0;
/// Heat per second added by each toxic enemy near a weapon.
pub const TOXIC_HEAT_PER_SECOND: f32 = 2.0;

/// Combat system that turns world views into combat commands.
#[derive(Debug, Default)]
pub struct CombatResolver {
    projected_hp: BTreeMap<EnemyId, f32>,
}

impl CombatResolver {
    /// Creates a new resolver with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances enemies along their core paths.
    ///
    /// Enemies stall while a freeze is active or when their path is unknown.
    /// Enemies whose position stopped being finite are dropped.
    pub fn move_enemies(
        &mut self,
        context: &TickContext,
        enemies: &EnemyView,
        map: &MapLayout,
        out: &mut Vec<Command>,
    ) {
        if !context.simulating() || context.frozen {
            return;
        }

        let seconds = context.dt.as_secs_f32();
        for enemy in enemies.iter().filter(|enemy| !enemy.in_pit) {
            if !enemy.position.is_finite() || !enemy.progress.is_finite() {
                out.push(Command::DropEnemy { enemy: enemy.id });
                continue;
            }
            let Some(path) = map.path(enemy.path) else {
                continue;
            };

            let speed = if enemy.has(Ability::Fast) {
                ENEMY_SPEED * FAST_MULTIPLIER
            } else {
                ENEMY_SPEED
            };
            let last = path.last_index();
            let mut index = enemy.path_index;
            let mut progress = enemy.progress;
            let mut remaining = speed * seconds;

            while index < last && remaining > 0.0 {
                let left = 1.0 - progress;
                if remaining >= left {
                    remaining -= left;
                    index += 1;
                    progress = 0.0;
                } else {
                    progress += remaining;
                    remaining = 0.0;
                }
            }

            if index >= last {
                out.push(Command::EnemyReachedPit { enemy: enemy.id });
                continue;
            }

            match path.point_at(index, progress) {
                Some(position) if position.is_finite() => out.push(Command::MoveEnemy {
                    enemy: enemy.id,
                    path_index: index,
                    progress,
                    position,
                }),
                Some(_) => out.push(Command::DropEnemy { enemy: enemy.id }),
                None => {}
            }
        }
    }

    /// Fires every weapon whose cooldown elapsed at the first enemy in range.
    ///
    /// Damage already committed during this phase is tracked so a second
    /// weapon never wastes its shot on an enemy that is about to die.
    pub fn fire_weapons(
        &mut self,
        context: &TickContext,
        weapons: &WeaponView,
        enemies: &EnemyView,
        modifiers: &ModifierTable,
        out: &mut Vec<Command>,
    ) {
        if !context.simulating() {
            return;
        }

        self.projected_hp.clear();
        for weapon in weapons.iter() {
            let stats = effective_stats(weapon, modifiers);
            if !cooled_down(weapon, &stats, context) {
                continue;
            }
            let Some(target) = self.first_target(weapon, &stats, enemies) else {
                continue;
            };

            out.push(Command::FireWeapon {
                weapon: weapon.id,
                heat: stats.heat_generation,
            });

            let tag = weapon.spec.kind.damage_tag();
            let armored = target.has(Ability::Armored);
            let committed = match weapon.spec.kind.volley() {
                Some(count) => {
                    let share = stats.power / count.max(1) as f32;
                    let damage = calculate_damage(
                        share,
                        tag,
                        target.profile.material,
                        target.profile.toughness,
                        armored,
                    );
                    for _ in 0..count {
                        out.push(Command::LaunchProjectile {
                            weapon: weapon.id,
                            target: target.id,
                            damage,
                            knockback: stats.knockback,
                        });
                    }
                    damage.saturating_mul(count)
                }
                None => {
                    let damage = calculate_damage(
                        stats.power,
                        tag,
                        target.profile.material,
                        target.profile.toughness,
                        armored,
                    );
                    out.push(Command::DamageEnemy {
                        enemy: target.id,
                        amount: damage,
                        knockback: stats.knockback,
                        owner: weapon.owner,
                    });
                    damage
                }
            };

            let remaining = self.projected_hp.entry(target.id).or_insert(target.hp);
            *remaining -= committed as f32;
        }
    }

    fn first_target<'a>(
        &self,
        weapon: &WeaponSnapshot,
        stats: &WeaponStats,
        enemies: &'a EnemyView,
    ) -> Option<&'a EnemySnapshot> {
        enemies.iter().find(|enemy| {
            let hp = self.projected_hp.get(&enemy.id).copied().unwrap_or(enemy.hp);
            !enemy.in_pit && hp > 0.0 && weapon.region.distance_to(enemy.position) <= stats.range
        })
    }

    /// Dissipates shared heat and damages weapons that cannot tolerate it.
    pub fn resolve_heat(
        &mut self,
        context: &TickContext,
        weapons: &WeaponView,
        enemies: &EnemyView,
        modifiers: &ModifierTable,
        out: &mut Vec<Command>,
    ) {
        if !context.simulating() {
            return;
        }

        let toxic = enemies
            .iter()
            .filter(|enemy| !enemy.in_pit && enemy.has(Ability::Toxic))
            .filter(|enemy| {
                weapons
                    .iter()
                    .any(|weapon| weapon.region.distance_to(enemy.position) <= TOXIC_RADIUS)
            })
            .count();
        let gained = toxic as f32 * TOXIC_HEAT_PER_SECOND * context.dt.as_secs_f32();
        let dissipation = BASE_HEAT_DISSIPATION + modifiers.total_heat_dissipation();
        let heat = (context.heat + gained - dissipation).max(0.0);
        out.push(Command::SetHeat { heat });

        if heat <= HEAT_THRESHOLD {
            return;
        }
        for weapon in weapons.iter() {
            if effective_stats(weapon, modifiers).heat_resist < heat {
                out.push(Command::DamageWeapon {
                    weapon: weapon.id,
                    amount: 1,
                });
            }
        }
    }

    /// Steers projectiles toward their targets and resolves impacts.
    pub fn move_projectiles(
        &mut self,
        context: &TickContext,
        projectiles: &ProjectileView,
        enemies: &EnemyView,
        out: &mut Vec<Command>,
    ) {
        if !context.simulating() {
            return;
        }

        for projectile in projectiles.iter() {
            let target = enemies
                .get(projectile.target)
                .filter(|enemy| !enemy.in_pit && enemy.position.is_finite());
            let Some(target) = target else {
                out.push(Command::RemoveProjectile {
                    projectile: projectile.id,
                });
                continue;
            };

            if projectile.position.distance(target.position) < projectile.speed {
                out.push(Command::DamageEnemy {
                    enemy: target.id,
                    amount: projectile.damage,
                    knockback: projectile.knockback,
                    owner: projectile.owner,
                });
                out.push(Command::RemoveProjectile {
                    projectile: projectile.id,
                });
                continue;
            }

            let position: CellPoint = projectile
                .position
                .advance_toward(target.position, projectile.speed);
            if position.is_finite() {
                out.push(Command::MoveProjectile {
                    projectile: projectile.id,
                    position,
                });
            } else {
                out.push(Command::RemoveProjectile {
                    projectile: projectile.id,
                });
            }
        }
    }

    /// Ends an active session once the shared health pool is exhausted.
    pub fn resolve_outcome(&mut self, context: &TickContext, out: &mut Vec<Command>) {
        if context.status == SessionStatus::Active && context.overflow <= 0 {
            out.push(Command::EndShift {
                outcome: ShiftOutcome::Defeat,
            });
        }
    }
}

fn effective_stats(weapon: &WeaponSnapshot, modifiers: &ModifierTable) -> WeaponStats {
    modifiers.for_owner(weapon.owner).apply(weapon.spec.stats())
}

fn cooled_down(weapon: &WeaponSnapshot, stats: &WeaponStats, context: &TickContext) -> bool {
    weapon
        .last_fired
        .map_or(true, |fired| context.clock.saturating_sub(fired) >= stats.cooldown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pit_defence_core::{
        Boost, BoostKind, BoostModifiers, BoostRarity, CellCoord, CellRect, CellRectSize,
        CorePath, EnemyProfile, Material, PathColor, PathId, PlayerId, ProjectileId,
        ProjectileSnapshot, WasteRarity, WeaponId, WeaponKind, WeaponRarity, WeaponSpec,
    };
    use std::time::Duration;

    const OWNER: PlayerId = PlayerId::new(1);

    fn context() -> TickContext {
        TickContext {
            status: SessionStatus::Active,
            paused: false,
            clock: Duration::from_secs(10),
            dt: Duration::from_millis(500),
            frozen: false,
            heat: 0.0,
            overflow: 1000,
        }
    }

    fn map() -> MapLayout {
        let pit = CellRect::from_origin_and_size(CellCoord::new(0, 10), CellRectSize::new(4, 4));
        let cells: Vec<CellCoord> = (0..10).map(|row| CellCoord::new(1, row)).collect();
        let corridor = cells.iter().copied().collect();
        let path = CorePath::new(PathId::new(0), cells, PathColor::from_rgb(0, 0, 0), 0);
        MapLayout::new(pit, vec![path], corridor, 1, false)
    }

    fn enemy(id: u32, path_index: usize, hp: f32) -> EnemySnapshot {
        EnemySnapshot {
            id: EnemyId::new(id),
            path: PathId::new(0),
            path_index,
            progress: 0.0,
            position: CellPoint::new(1.0, path_index as f32),
            profile: EnemyProfile {
                name: "Common Mixed Bag".into(),
                material: Material::Mixed,
                rarity: WasteRarity::Common,
                size: 1,
                max_hp: hp,
                toughness: 0.0,
                density: 0.5,
                value: 1,
                ability: None,
            },
            hp,
            in_pit: false,
            pit_slot: None,
        }
    }

    fn weapon(id: u32, kind: WeaponKind, origin: CellCoord) -> WeaponSnapshot {
        WeaponSnapshot {
            id: WeaponId::new(id),
            owner: OWNER,
            spec: WeaponSpec {
                kind,
                rarity: WeaponRarity::Common,
                adjective: None,
            },
            region: CellRect::from_origin_and_size(origin, kind.footprint()),
            hp: 100,
            heat: 0.0,
            last_fired: None,
        }
    }

    fn no_modifiers() -> ModifierTable {
        ModifierTable::default()
    }

    #[test]
    fn enemies_cover_two_cells_per_second() {
        let mut resolver = CombatResolver::new();
        let enemies = EnemyView::from_snapshots(vec![enemy(0, 2, 20.0)]);
        let mut out = Vec::new();

        resolver.move_enemies(&context(), &enemies, &map(), &mut out);

        assert_eq!(
            out,
            vec![Command::MoveEnemy {
                enemy: EnemyId::new(0),
                path_index: 3,
                progress: 0.0,
                position: CellPoint::new(1.0, 3.0),
            }]
        );
    }

    #[test]
    fn enemies_reaching_the_last_cell_enter_the_pit() {
        let mut resolver = CombatResolver::new();
        let mut fast = enemy(4, 8, 20.0);
        fast.profile.ability = Some(Ability::Fast);
        let enemies = EnemyView::from_snapshots(vec![fast]);
        let mut out = Vec::new();

        resolver.move_enemies(&context(), &enemies, &map(), &mut out);

        assert_eq!(out, vec![Command::EnemyReachedPit { enemy: EnemyId::new(4) }]);
    }

    #[test]
    fn frozen_missing_or_broken_enemies_do_not_move() {
        let mut resolver = CombatResolver::new();
        let mut lost = enemy(1, 0, 20.0);
        lost.path = PathId::new(9);
        let mut broken = enemy(2, 0, 20.0);
        broken.position = CellPoint::new(f32::NAN, 0.0);
        let enemies = EnemyView::from_snapshots(vec![lost, broken]);

        let mut frozen = context();
        frozen.frozen = true;
        let mut out = Vec::new();
        resolver.move_enemies(&frozen, &enemies, &map(), &mut out);
        assert!(out.is_empty());

        resolver.move_enemies(&context(), &enemies, &map(), &mut out);
        assert_eq!(out, vec![Command::DropEnemy { enemy: EnemyId::new(2) }]);
    }

    #[test]
    fn weapons_target_the_first_enemy_in_range() {
        let mut resolver = CombatResolver::new();
        let mut pitted = enemy(0, 4, 100.0);
        pitted.in_pit = true;
        let enemies =
            EnemyView::from_snapshots(vec![pitted, enemy(1, 9, 100.0), enemy(2, 4, 100.0)]);
        let weapons = WeaponView::from_snapshots(vec![weapon(
            0,
            WeaponKind::PressureWasher,
            CellCoord::new(3, 4),
        )]);
        let mut out = Vec::new();

        resolver.fire_weapons(&context(), &weapons, &enemies, &no_modifiers(), &mut out);

        assert_eq!(
            out,
            vec![
                Command::FireWeapon {
                    weapon: WeaponId::new(0),
                    heat: 10.0,
                },
                Command::DamageEnemy {
                    enemy: EnemyId::new(2),
                    amount: 50,
                    knockback: 1.0,
                    owner: OWNER,
                },
            ]
        );
    }

    #[test]
    fn lethally_damaged_enemies_are_not_retargeted() {
        let mut resolver = CombatResolver::new();
        let enemies = EnemyView::from_snapshots(vec![enemy(0, 4, 40.0), enemy(1, 5, 40.0)]);
        let weapons = WeaponView::from_snapshots(vec![
            weapon(0, WeaponKind::PressureWasher, CellCoord::new(3, 4)),
            weapon(1, WeaponKind::PressureWasher, CellCoord::new(3, 5)),
        ]);
        let mut out = Vec::new();

        resolver.fire_weapons(&context(), &weapons, &enemies, &no_modifiers(), &mut out);

        let targets: Vec<EnemyId> = out
            .iter()
            .filter_map(|command| match command {
                Command::DamageEnemy { enemy, .. } => Some(*enemy),
                _ => None,
            })
            .collect();
        assert_eq!(targets, vec![EnemyId::new(0), EnemyId::new(1)]);
    }

    #[test]
    fn cooldowns_gate_firing() {
        let mut resolver = CombatResolver::new();
        let enemies = EnemyView::from_snapshots(vec![enemy(0, 4, 40.0)]);
        let mut hot = weapon(0, WeaponKind::PressureWasher, CellCoord::new(3, 4));
        hot.last_fired = Some(Duration::from_millis(9_500));
        let mut out = Vec::new();

        resolver.fire_weapons(
            &context(),
            &WeaponView::from_snapshots(vec![hot]),
            &enemies,
            &no_modifiers(),
            &mut out,
        );
        assert!(out.is_empty());

        let overclocked = ModifierTable::new(
            [(
                OWNER,
                BoostModifiers::fold(&[Boost::new(BoostKind::Overclock, BoostRarity::Legendary)]),
            )]
            .into_iter()
            .collect(),
        );
        hot.last_fired = Some(Duration::from_millis(9_100));
        resolver.fire_weapons(
            &context(),
            &WeaponView::from_snapshots(vec![hot]),
            &enemies,
            &overclocked,
            &mut out,
        );
        assert_eq!(out.len(), 2, "overclocked cooldown elapsed after 900ms");
    }

    #[test]
    fn homing_weapons_split_damage_across_a_volley() {
        let mut resolver = CombatResolver::new();
        let enemies = EnemyView::from_snapshots(vec![enemy(0, 4, 500.0)]);
        let weapons = WeaponView::from_snapshots(vec![weapon(
            0,
            WeaponKind::MissileLauncher,
            CellCoord::new(8, 4),
        )]);
        let mut out = Vec::new();

        resolver.fire_weapons(&context(), &weapons, &enemies, &no_modifiers(), &mut out);

        let launches: Vec<&Command> = out
            .iter()
            .filter(|command| matches!(command, Command::LaunchProjectile { .. }))
            .collect();
        assert_eq!(launches.len(), 3);
        assert_eq!(
            launches[0],
            &Command::LaunchProjectile {
                weapon: WeaponId::new(0),
                target: EnemyId::new(0),
                damage: 33,
                knockback: 2.0,
            }
        );
    }

    #[test]
    fn overheated_weapons_lose_exactly_one_hit_point() {
        let mut resolver = CombatResolver::new();
        let mut hot = context();
        hot.heat = 150.0;
        let weapons = WeaponView::from_snapshots(vec![weapon(
            0,
            WeaponKind::PressureWasher,
            CellCoord::new(3, 4),
        )]);
        let insulated = ModifierTable::new(
            [(
                OWNER,
                BoostModifiers::fold(&[
                    Boost::new(BoostKind::Insulation, BoostRarity::Common),
                    Boost::new(BoostKind::Insulation, BoostRarity::Legendary),
                    Boost::new(BoostKind::Insulation, BoostRarity::Legendary),
                    Boost::new(BoostKind::Insulation, BoostRarity::Legendary),
                    Boost::new(BoostKind::Insulation, BoostRarity::Legendary),
                ]),
            )]
            .into_iter()
            .collect(),
        );
        let mut out = Vec::new();

        resolver.resolve_heat(&hot, &weapons, &EnemyView::default(), &insulated, &mut out);

        assert_eq!(
            out,
            vec![
                Command::SetHeat { heat: 149.5 },
                Command::DamageWeapon {
                    weapon: WeaponId::new(0),
                    amount: 1,
                },
            ]
        );
    }

    #[test]
    fn heat_dissipates_to_zero_without_damage() {
        let mut resolver = CombatResolver::new();
        let weapons = WeaponView::from_snapshots(vec![weapon(
            0,
            WeaponKind::PressureWasher,
            CellCoord::new(3, 4),
        )]);
        let mut out = Vec::new();

        resolver.resolve_heat(
            &context(),
            &weapons,
            &EnemyView::default(),
            &no_modifiers(),
            &mut out,
        );

        assert_eq!(out, vec![Command::SetHeat { heat: 0.0 }]);
    }

    #[test]
    fn toxic_enemies_near_weapons_add_heat() {
        let mut resolver = CombatResolver::new();
        let mut toxic = enemy(0, 4, 20.0);
        toxic.profile.ability = Some(Ability::Toxic);
        let mut warm = context();
        warm.heat = 10.0;
        let weapons = WeaponView::from_snapshots(vec![weapon(
            0,
            WeaponKind::PressureWasher,
            CellCoord::new(3, 4),
        )]);
        let mut out = Vec::new();

        resolver.resolve_heat(
            &warm,
            &weapons,
            &EnemyView::from_snapshots(vec![toxic]),
            &no_modifiers(),
            &mut out,
        );

        assert_eq!(out, vec![Command::SetHeat { heat: 10.5 }]);
    }

    #[test]
    fn projectiles_hit_when_within_one_step() {
        let mut resolver = CombatResolver::new();
        let enemies = EnemyView::from_snapshots(vec![enemy(0, 4, 20.0)]);
        let projectiles = ProjectileView::from_snapshots(vec![
            ProjectileSnapshot {
                id: ProjectileId::new(0),
                position: CellPoint::new(1.5, 4.0),
                target: EnemyId::new(0),
                speed: 0.6,
                damage: 12,
                knockback: 2.0,
                owner: OWNER,
            },
            ProjectileSnapshot {
                id: ProjectileId::new(1),
                position: CellPoint::new(4.0, 4.0),
                target: EnemyId::new(0),
                speed: 0.5,
                damage: 12,
                knockback: 2.0,
                owner: OWNER,
            },
            ProjectileSnapshot {
                id: ProjectileId::new(2),
                position: CellPoint::new(4.0, 4.0),
                target: EnemyId::new(7),
                speed: 0.5,
                damage: 12,
                knockback: 2.0,
                owner: OWNER,
            },
        ]);
        let mut out = Vec::new();

        resolver.move_projectiles(&context(), &projectiles, &enemies, &mut out);

        assert_eq!(
            out,
            vec![
                Command::DamageEnemy {
                    enemy: EnemyId::new(0),
                    amount: 12,
                    knockback: 2.0,
                    owner: OWNER,
                },
                Command::RemoveProjectile {
                    projectile: ProjectileId::new(0),
                },
                Command::MoveProjectile {
                    projectile: ProjectileId::new(1),
                    position: CellPoint::new(3.5, 4.0),
                },
                Command::RemoveProjectile {
                    projectile: ProjectileId::new(2),
                },
            ]
        );
    }

    #[test]
    fn projectiles_exactly_one_step_away_close_in_before_hitting() {
        let mut resolver = CombatResolver::new();
        let enemies = EnemyView::from_snapshots(vec![enemy(0, 4, 20.0)]);
        let projectiles = ProjectileView::from_snapshots(vec![ProjectileSnapshot {
            id: ProjectileId::new(3),
            position: CellPoint::new(1.5, 4.0),
            target: EnemyId::new(0),
            speed: 0.5,
            damage: 12,
            knockback: 0.0,
            owner: OWNER,
        }]);
        let mut out = Vec::new();

        resolver.move_projectiles(&context(), &projectiles, &enemies, &mut out);

        assert_eq!(
            out,
            vec![Command::MoveProjectile {
                projectile: ProjectileId::new(3),
                position: CellPoint::new(1.0, 4.0),
            }]
        );
    }

    #[test]
    fn exhausted_overflow_ends_the_shift_in_defeat() {
        let mut resolver = CombatResolver::new();
        let mut out = Vec::new();
        let mut drained = context();
        drained.overflow = 0;

        resolver.resolve_outcome(&context(), &mut out);
        assert!(out.is_empty());
        resolver.resolve_outcome(&drained, &mut out);
        assert_eq!(
            out,
            vec![Command::EndShift {
                outcome: ShiftOutcome::Defeat
            }]
        );
    }

    #[test]
    fn paused_sessions_are_silent() {
        let mut resolver = CombatResolver::new();
        let mut paused = context();
        paused.paused = true;
        let enemies = EnemyView::from_snapshots(vec![enemy(0, 4, 20.0)]);
        let weapons = WeaponView::from_snapshots(vec![weapon(
            0,
            WeaponKind::PressureWasher,
            CellCoord::new(3, 4),
        )]);
        let mut out = Vec::new();

        resolver.move_enemies(&paused, &enemies, &map(), &mut out);
        resolver.fire_weapons(&paused, &weapons, &enemies, &no_modifiers(), &mut out);
        resolver.resolve_heat(&paused, &weapons, &enemies, &no_modifiers(), &mut out);

        assert!(out.is_empty());
    }

    proptest::proptest! {
        #[test]
        fn movement_never_goes_backwards(
            index in 0usize..9,
            progress in 0.0f32..1.0,
            millis in 1u64..2000,
        ) {
            let mut resolver = CombatResolver::new();
            let mut walker = enemy(0, index, 20.0);
            walker.progress = progress;
            let mut tick = context();
            tick.dt = Duration::from_millis(millis);
            let mut out = Vec::new();

            resolver.move_enemies(
                &tick,
                &EnemyView::from_snapshots(vec![walker]),
                &map(),
                &mut out,
            );

            proptest::prop_assert_eq!(out.len(), 1);
            match &out[0] {
                Command::MoveEnemy { path_index, progress: moved, .. } => {
                    proptest::prop_assert!(
                        *path_index > index || (*path_index == index && *moved >= progress)
                    );
                }
                Command::EnemyReachedPit { .. } => {}
                other => proptest::prop_assert!(false, "unexpected command {:?}", other),
            }
        }
    }
}
