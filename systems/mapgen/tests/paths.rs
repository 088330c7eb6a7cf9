use std::collections::BTreeSet;

use pit_defence_core::{CellCoord, Direction, MapLayout, GRID_COLUMNS, GRID_ROWS};
use pit_defence_system_mapgen::{
    pit_rect, pit_seeds, MapGenerator, PathBuilder, PathRole, ESCAPE_STEPS, MIN_RUN,
    SELF_DISTANCE,
};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn directions(cells: &[CellCoord]) -> Vec<Direction> {
    cells
        .windows(2)
        .map(|pair| {
            pair[0]
                .direction_to(pair[1])
                .expect("consecutive cells must be grid-adjacent")
        })
        .collect()
}

fn touches_pit(map: &MapLayout, cell: CellCoord) -> bool {
    Direction::ALL
        .into_iter()
        .filter_map(|direction| cell.step(direction))
        .any(|neighbor| map.pit().contains(neighbor))
}

fn assert_map_invariants(map: &MapLayout) {
    assert!(map.main_path_count() >= 3, "three main paths expected");
    assert_eq!(map.entries().len(), map.core_paths().len());

    for (index, path) in map.core_paths().iter().enumerate() {
        let cells = path.cells();
        let distinct: BTreeSet<CellCoord> = cells.iter().copied().collect();
        assert_eq!(distinct.len(), cells.len(), "path {index} repeats a cell");
        let _ = directions(cells);

        let head = path.head().expect("paths are never empty");
        assert_eq!(map.entries()[index], head);
        assert_eq!(map.entry_to_main_path()[index], path.main_path());
        assert!(map.is_corridor(head), "path {index} must start in the corridor");

        let last = *cells.last().expect("paths are never empty");
        assert!(touches_pit(map, last), "path {index} must end next to the pit");

        for cell in cells {
            assert!(cell.column() < GRID_COLUMNS && cell.row() < GRID_ROWS);
            assert!(!map.pit().contains(*cell));
            assert!(map.is_corridor(*cell));
        }
    }

    for cell in map.corridor() {
        assert!(!map.pit().contains(*cell), "corridor may not cover the pit");
    }
}

#[test]
fn fixed_seeds_produce_valid_maps() {
    for seed in 0..16 {
        let map = MapGenerator::new().generate(&mut ChaCha8Rng::seed_from_u64(seed));
        assert_map_invariants(&map);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn generated_maps_are_connected(seed in any::<u64>()) {
        let map = MapGenerator::new().generate(&mut ChaCha8Rng::seed_from_u64(seed));
        assert_map_invariants(&map);
    }

    #[test]
    fn main_walks_keep_self_distance_and_min_run(seed in any::<u64>(), side in 0usize..3) {
        let pit = pit_rect();
        let (start, outward) = pit_seeds(pit)[side];
        let occupied = BTreeSet::new();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        if let Some(walk) =
            PathBuilder::new(pit, &occupied).build(start, outward, PathRole::Main, &mut rng)
        {
            prop_assert!(walk.len() >= PathRole::Main.min_length());
            prop_assert!(walk.len() <= *PathRole::Main.target_length().end());
            prop_assert_eq!(walk[0], start);

            for later in 0..walk.len() {
                for earlier in 0..later.saturating_sub(SELF_DISTANCE as usize) {
                    prop_assert!(
                        walk[earlier].manhattan_distance(walk[later]) >= SELF_DISTANCE,
                        "cells {} and {} are too close", earlier, later
                    );
                }
            }

            let steps = directions(&walk);
            for (index, pair) in steps.windows(2).enumerate() {
                let step = index + 1;
                if step < ESCAPE_STEPS || pair[0] == pair[1] {
                    continue;
                }
                let run_start = step - MIN_RUN as usize;
                prop_assert!(
                    steps[run_start..step].iter().all(|direction| *direction == pair[0]),
                    "turn after step {} came before a run of {}", step, MIN_RUN
                );
            }
        }
    }

    #[test]
    fn branch_walks_respect_their_minimum(seed in any::<u64>()) {
        let pit = pit_rect();
        let occupied = BTreeSet::new();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let start = CellCoord::new(20, 20);

        let walk = PathBuilder::new(pit, &occupied).build(
            start,
            Direction::West,
            PathRole::Branch,
            &mut rng,
        );
        if let Some(walk) = walk {
            prop_assert!(walk.len() >= PathRole::Branch.min_length());
            prop_assert!(walk.len() <= *PathRole::Branch.target_length().end());
        }
    }
}
