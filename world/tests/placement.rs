use std::time::Duration;

use pit_defence_core::{
    CellCoord, Command, Event, PlacementError, PlayerId, SessionId, GRID_COLUMNS, GRID_ROWS,
};
use pit_defence_system_mapgen::MapGenerator;
use pit_defence_world::{apply, query, World, WorldConfig};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const PLAYER: PlayerId = PlayerId::new(3);

fn planning_world(seed: u64) -> World {
    let map = MapGenerator::new().generate(&mut ChaCha8Rng::seed_from_u64(seed));
    let mut world = World::new(SessionId::new(seed), map, WorldConfig::default());
    let mut events = Vec::new();
    apply(
        &mut world,
        Command::Join {
            player: PLAYER,
            name: "grace".into(),
        },
        &mut events,
    );
    apply(&mut world, Command::MarkReady { player: PLAYER }, &mut events);
    world
}

#[test]
fn corridor_cells_never_accept_weapons() {
    let mut world = planning_world(12);
    let corridor: Vec<CellCoord> = query::map(&world)
        .corridor()
        .iter()
        .copied()
        .step_by(7)
        .collect();
    assert!(!corridor.is_empty());

    for cell in corridor {
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PlaceWeapon {
                player: PLAYER,
                origin: cell,
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::PlacementRejected {
                player: PLAYER,
                origin: cell,
                reason: PlacementError::Corridor,
            }]
        );
    }
    assert_eq!(query::weapon_view(&world).iter().count(), 0);
}

#[test]
fn open_floor_accepts_weapons_once_per_cooldown() {
    let mut world = planning_world(5);
    let map = query::map(&world).clone();
    let open: Vec<CellCoord> = (0..GRID_ROWS)
        .flat_map(|row| (0..GRID_COLUMNS).map(move |column| CellCoord::new(column, row)))
        .filter(|cell| !map.is_corridor(*cell) && !map.pit().contains(*cell))
        .take(2)
        .collect();
    assert_eq!(open.len(), 2);

    let mut events = Vec::new();
    for cell in &open {
        apply(
            &mut world,
            Command::PlaceWeapon {
                player: PLAYER,
                origin: *cell,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(1000),
            },
            &mut events,
        );
    }

    let placed = events
        .iter()
        .filter(|event| matches!(event, Event::WeaponPlaced { .. }))
        .count();
    assert_eq!(placed, 2);
    assert_eq!(query::weapon_view(&world).iter().count(), 2);
}

#[test]
fn pit_cells_are_rejected_before_corridor_checks() {
    let mut world = planning_world(9);
    let origin = query::map(&world).pit().center_cell();
    let mut events = Vec::new();

    apply(
        &mut world,
        Command::PlaceWeapon {
            player: PLAYER,
            origin,
        },
        &mut events,
    );

    assert_eq!(
        events,
        vec![Event::PlacementRejected {
            player: PLAYER,
            origin,
            reason: PlacementError::Pit,
        }]
    );
}
