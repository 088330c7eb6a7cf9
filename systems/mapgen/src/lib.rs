#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Procedural generation of the conveyor network around the central pit.
//!
//! [`PathBuilder`] grows a single meandering walk away from a seed cell while
//! keeping distance from its own earlier cells. [`MapGenerator`] runs the
//! builder for three main paths and their branches, retries a bounded number
//! of times and falls back to a deterministic straight-line map.

use std::{collections::BTreeSet, ops::RangeInclusive};

use pit_defence_core::{
    CellCoord, CellPoint, CellRect, CellRectSize, CorePath, Direction, MapLayout, PathColor,
    PathId, GRID_COLUMNS, GRID_PADDING, GRID_ROWS, PIT_HEIGHT, PIT_WIDTH,
};
use rand::{seq::SliceRandom, Rng};

/// Steps at the start of a walk that always head outward.
pub const ESCAPE_STEPS: usize = 10;

/// Straight steps required before a walk may turn.
pub const MIN_RUN: u32 = 3;

/// Cells more than this many positions apart must keep this Manhattan distance.
pub const SELF_DISTANCE: u32 = 5;

const CONTINUE_PROBABILITY: f64 = 0.60;
const TURN_PROBABILITY: f64 = 0.25;
const MAIN_PATHS: usize = 3;
const MAX_BRANCHES_PER_MAIN: u32 = 2;
const DEFAULT_MAX_ATTEMPTS: u32 = 10;

const MAIN_COLORS: [PathColor; 3] = [
    PathColor::from_rgb(0x2f, 0x95, 0x32),
    PathColor::from_rgb(0xc8, 0x2a, 0x36),
    PathColor::from_rgb(0x58, 0x47, 0xff),
];

/// Kind of walk being grown; decides its length bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathRole {
    /// Path from a pit edge out to a spawn point.
    Main,
    /// Path splitting off an existing main path.
    Branch,
}

impl PathRole {
    /// Range the target length is drawn from.
    #[must_use]
    pub fn target_length(self) -> RangeInclusive<usize> {
        match self {
            Self::Main => 50..=80,
            Self::Branch => 30..=60,
        }
    }

    /// Shortest walk accepted.
    #[must_use]
    pub const fn min_length(self) -> usize {
        match self {
            Self::Main => 30,
            Self::Branch => 20,
        }
    }
}

/// Grows one path outward from a seed cell.
#[derive(Clone, Copy, Debug)]
pub struct PathBuilder<'a> {
    pit: CellRect,
    occupied: &'a BTreeSet<CellCoord>,
}

impl<'a> PathBuilder<'a> {
    /// Creates a builder avoiding the pit and every already placed path cell.
    #[must_use]
    pub fn new(pit: CellRect, occupied: &'a BTreeSet<CellCoord>) -> Self {
        Self { pit, occupied }
    }

    /// Walks from `start`, heading `outward` for the first [`ESCAPE_STEPS`].
    ///
    /// Index 0 of the result is `start`, which is exempt from the occupancy
    /// check so branches can be seeded on their parent. Returns `None` when
    /// the walk dead-ends before reaching the role's minimum length.
    pub fn build<R: Rng + ?Sized>(
        &self,
        start: CellCoord,
        outward: Direction,
        role: PathRole,
        rng: &mut R,
    ) -> Option<Vec<CellCoord>> {
        let target = rng.gen_range(role.target_length());
        let mut path = vec![start];
        let mut visited = BTreeSet::from([start]);
        let mut heading = outward;
        let mut run = 0;

        while path.len() < target {
            let current = *path.last()?;
            let next = if path.len() - 1 < ESCAPE_STEPS {
                self.escape_step(&path, &visited, current, outward, rng)
            } else {
                self.meander_step(&path, &visited, current, heading, run, rng)
            };

            let Some((direction, cell)) = next else {
                break;
            };

            if direction == heading {
                run += 1;
            } else {
                heading = direction;
                run = 1;
            }
            path.push(cell);
            let _ = visited.insert(cell);
        }

        (path.len() >= role.min_length()).then_some(path)
    }

    fn escape_step<R: Rng + ?Sized>(
        &self,
        path: &[CellCoord],
        visited: &BTreeSet<CellCoord>,
        current: CellCoord,
        outward: Direction,
        rng: &mut R,
    ) -> Option<(Direction, CellCoord)> {
        if let Some(cell) = self.candidate(path, visited, current, outward) {
            return Some((outward, cell));
        }

        let options: Vec<(Direction, CellCoord)> = Direction::ALL
            .into_iter()
            .filter_map(|direction| {
                self.candidate(path, visited, current, direction)
                    .map(|cell| (direction, cell))
            })
            .collect();
        options.choose(rng).copied()
    }

    fn meander_step<R: Rng + ?Sized>(
        &self,
        path: &[CellCoord],
        visited: &BTreeSet<CellCoord>,
        current: CellCoord,
        heading: Direction,
        run: u32,
        rng: &mut R,
    ) -> Option<(Direction, CellCoord)> {
        let may_turn = run >= MIN_RUN;
        let turns = [heading.turn_left(), heading.turn_right()];
        let roll: f64 = rng.gen();
        let preferred = if roll < CONTINUE_PROBABILITY {
            Some(heading)
        } else if roll < CONTINUE_PROBABILITY + TURN_PROBABILITY && may_turn {
            turns.choose(rng).copied()
        } else {
            None
        };

        if let Some(direction) = preferred {
            if let Some(cell) = self.candidate(path, visited, current, direction) {
                return Some((direction, cell));
            }
        }

        let mut directions = vec![heading];
        if may_turn {
            directions.extend(turns);
        }
        let options: Vec<(Direction, CellCoord)> = directions
            .into_iter()
            .filter_map(|direction| {
                self.candidate(path, visited, current, direction)
                    .map(|cell| (direction, cell))
            })
            .collect();
        options.choose(rng).copied()
    }

    fn candidate(
        &self,
        path: &[CellCoord],
        visited: &BTreeSet<CellCoord>,
        current: CellCoord,
        direction: Direction,
    ) -> Option<CellCoord> {
        let cell = current.step(direction)?;
        if !within_padding(cell)
            || self.pit.contains(cell)
            || visited.contains(&cell)
            || self.occupied.contains(&cell)
        {
            return None;
        }

        let horizon = path.len().saturating_sub(SELF_DISTANCE as usize);
        let crowded = path[..horizon]
            .iter()
            .any(|earlier| earlier.manhattan_distance(cell) < SELF_DISTANCE);
        (!crowded).then_some(cell)
    }
}

/// Orchestrates path building into a complete map.
#[derive(Clone, Copy, Debug)]
pub struct MapGenerator {
    max_attempts: u32,
}

impl Default for MapGenerator {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl MapGenerator {
    /// Creates a generator with the default retry budget.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a generator giving up after `max_attempts` failed attempts.
    #[must_use]
    pub const fn with_max_attempts(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    /// Generates a map, falling back to straight paths when every attempt fails.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> MapLayout {
        let pit = pit_rect();
        for attempt in 1..=self.max_attempts {
            if let Some(paths) = attempt_paths(pit, rng) {
                return assemble(pit, paths, attempt, false);
            }
            tracing::debug!(attempt, "map attempt produced fewer than three main paths");
        }

        tracing::warn!(
            attempts = self.max_attempts,
            "map generation exhausted its retries, using straight fallback paths"
        );
        fallback_layout(self.max_attempts)
    }
}

/// Pit rectangle centered on the grid.
#[must_use]
pub fn pit_rect() -> CellRect {
    CellRect::from_origin_and_size(
        CellCoord::new((GRID_COLUMNS - PIT_WIDTH) / 2, (GRID_ROWS - PIT_HEIGHT) / 2),
        CellRectSize::new(PIT_WIDTH, PIT_HEIGHT),
    )
}

/// Cells just outside the midpoint of each pit edge, with their outward direction.
///
/// Order is top, right, bottom, left.
#[must_use]
pub fn pit_seeds(pit: CellRect) -> [(CellCoord, Direction); 4] {
    let origin = pit.origin();
    let size = pit.size();
    let mid_column = origin.column() + size.width() / 2;
    let mid_row = origin.row() + size.height() / 2;
    [
        (CellCoord::new(mid_column, origin.row() - 1), Direction::North),
        (CellCoord::new(origin.column() + size.width(), mid_row), Direction::East),
        (CellCoord::new(mid_column, origin.row() + size.height()), Direction::South),
        (CellCoord::new(origin.column() - 1, mid_row), Direction::West),
    ]
}

/// Deterministic map of three straight paths from the padding margin to the pit.
#[must_use]
pub fn fallback_layout(attempts: u32) -> MapLayout {
    let pit = pit_rect();
    let paths = pit_seeds(pit)
        .into_iter()
        .take(MAIN_PATHS)
        .enumerate()
        .map(|(index, (seed, outward))| {
            let mut cells = vec![seed];
            let mut current = seed;
            while let Some(next) = current.step(outward).filter(|cell| within_padding(*cell)) {
                cells.push(next);
                current = next;
            }
            cells.reverse();
            (cells, index)
        })
        .collect();
    assemble(pit, paths, attempts, true)
}

/// 3x3 dilation of every core path cell, clipped to the grid, without pit cells.
#[must_use]
pub fn dilate_corridor(paths: &[CorePath], pit: CellRect) -> BTreeSet<CellCoord> {
    let mut corridor = BTreeSet::new();
    for cell in paths.iter().flat_map(|path| path.cells().iter().copied()) {
        let column = i64::from(cell.column());
        let row = i64::from(cell.row());
        for dr in -1..=1 {
            for dc in -1..=1 {
                let (c, r) = (column + dc, row + dr);
                if c < 0 || r < 0 || c >= i64::from(GRID_COLUMNS) || r >= i64::from(GRID_ROWS) {
                    continue;
                }
                let neighbor = CellCoord::new(c as u32, r as u32);
                if !pit.contains(neighbor) {
                    let _ = corridor.insert(neighbor);
                }
            }
        }
    }
    corridor
}

fn attempt_paths<R: Rng + ?Sized>(
    pit: CellRect,
    rng: &mut R,
) -> Option<Vec<(Vec<CellCoord>, usize)>> {
    let mut occupied = BTreeSet::new();
    let mut mains: Vec<Vec<CellCoord>> = Vec::with_capacity(MAIN_PATHS);
    for (start, outward) in pit_seeds(pit).into_iter().take(MAIN_PATHS) {
        let walk = PathBuilder::new(pit, &occupied).build(start, outward, PathRole::Main, rng)?;
        occupied.extend(walk.iter().copied());
        mains.push(walk.into_iter().rev().collect());
    }

    let center = pit.center();
    let mut branches = Vec::new();
    for (main_index, main) in mains.iter().enumerate() {
        for _ in 0..rng.gen_range(0..=MAX_BRANCHES_PER_MAIN) {
            let seed_index = rng.gen_range(main.len() * 3 / 10..=main.len() * 7 / 10);
            let seed = main[seed_index];
            let outward = away_from(center, seed);
            let Some(walk) =
                PathBuilder::new(pit, &occupied).build(seed, outward, PathRole::Branch, rng)
            else {
                continue;
            };

            occupied.extend(walk.iter().skip(1).copied());
            let mut cells: Vec<CellCoord> = walk[1..].iter().rev().copied().collect();
            cells.extend_from_slice(&main[seed_index..]);
            branches.push((cells, main_index));
        }
    }

    let mut paths: Vec<(Vec<CellCoord>, usize)> = mains.into_iter().zip(0..).collect();
    paths.extend(branches);
    Some(paths)
}

fn assemble(
    pit: CellRect,
    paths: Vec<(Vec<CellCoord>, usize)>,
    attempts: u32,
    fallback: bool,
) -> MapLayout {
    let core_paths: Vec<CorePath> = paths
        .into_iter()
        .zip(0..)
        .map(|((cells, main_path), id)| {
            let color = MAIN_COLORS[main_path % MAIN_COLORS.len()];
            CorePath::new(PathId::new(id), cells, color, main_path)
        })
        .collect();
    let corridor = dilate_corridor(&core_paths, pit);
    MapLayout::new(pit, core_paths, corridor, attempts, fallback)
}

fn away_from(center: CellPoint, cell: CellCoord) -> Direction {
    let dx = cell.column() as f32 - center.column();
    let dy = cell.row() as f32 - center.row();
    if dx.abs() >= dy.abs() {
        if dx >= 0.0 {
            Direction::East
        } else {
            Direction::West
        }
    } else if dy >= 0.0 {
        Direction::South
    } else {
        Direction::North
    }
}

fn within_padding(cell: CellCoord) -> bool {
    cell.column() >= GRID_PADDING
        && cell.row() >= GRID_PADDING
        && cell.column() < GRID_COLUMNS - GRID_PADDING
        && cell.row() < GRID_ROWS - GRID_PADDING
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn pit_is_centered() {
        let pit = pit_rect();
        assert_eq!(pit.origin(), CellCoord::new(35, 26));
        assert_eq!(pit.size(), CellRectSize::new(10, 8));
    }

    #[test]
    fn seeds_sit_outside_pit_edges() {
        let pit = pit_rect();
        let seeds = pit_seeds(pit);
        assert_eq!(seeds[0], (CellCoord::new(40, 25), Direction::North));
        assert_eq!(seeds[1], (CellCoord::new(45, 30), Direction::East));
        assert_eq!(seeds[2], (CellCoord::new(40, 34), Direction::South));
        assert_eq!(seeds[3], (CellCoord::new(34, 30), Direction::West));
        for (seed, _) in seeds {
            assert!(!pit.contains(seed));
        }
    }

    #[test]
    fn fallback_map_runs_straight_from_padding_to_pit() {
        let map = fallback_layout(DEFAULT_MAX_ATTEMPTS);
        assert!(map.is_fallback());
        assert_eq!(map.core_paths().len(), 3);
        assert_eq!(map.entry_to_main_path(), &[0, 1, 2]);

        let top = &map.core_paths()[0];
        assert_eq!(top.head(), Some(CellCoord::new(40, 2)));
        assert_eq!(top.cells().last(), Some(&CellCoord::new(40, 25)));
        let right = &map.core_paths()[1];
        assert_eq!(right.head(), Some(CellCoord::new(77, 30)));
        let bottom = &map.core_paths()[2];
        assert_eq!(bottom.head(), Some(CellCoord::new(40, 57)));
    }

    #[test]
    fn zero_attempt_budget_uses_fallback() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let map = MapGenerator::with_max_attempts(0).generate(&mut rng);
        assert!(map.is_fallback());
        assert_eq!(map.attempts(), 0);
    }

    #[test]
    fn generation_is_deterministic_for_a_seed() {
        let first = MapGenerator::new().generate(&mut ChaCha8Rng::seed_from_u64(42));
        let second = MapGenerator::new().generate(&mut ChaCha8Rng::seed_from_u64(42));
        assert_eq!(first, second);
    }

    #[test]
    fn corridor_excludes_pit_and_covers_neighbors() {
        let pit = pit_rect();
        let path = CorePath::new(
            PathId::new(0),
            vec![CellCoord::new(40, 24), CellCoord::new(40, 25)],
            MAIN_COLORS[0],
            0,
        );
        let corridor = dilate_corridor(&[path], pit);
        assert!(corridor.contains(&CellCoord::new(39, 23)));
        assert!(corridor.contains(&CellCoord::new(41, 25)));
        assert!(!corridor.contains(&CellCoord::new(40, 26)));
        assert_eq!(corridor.len(), 9);
    }

    #[test]
    fn builder_refuses_occupied_cells() {
        let pit = pit_rect();
        let (start, outward) = pit_seeds(pit)[0];
        let blocked: BTreeSet<CellCoord> = (GRID_PADDING..GRID_ROWS - GRID_PADDING)
            .flat_map(|row| {
                (GRID_PADDING..GRID_COLUMNS - GRID_PADDING)
                    .map(move |column| CellCoord::new(column, row))
            })
            .filter(|cell| *cell != start)
            .collect();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let walk = PathBuilder::new(pit, &blocked).build(start, outward, PathRole::Main, &mut rng);
        assert_eq!(walk, None);
    }

    #[test]
    fn branch_seed_direction_points_away_from_pit() {
        let center = pit_rect().center();
        assert_eq!(away_from(center, CellCoord::new(40, 10)), Direction::North);
        assert_eq!(away_from(center, CellCoord::new(70, 31)), Direction::East);
        assert_eq!(away_from(center, CellCoord::new(5, 29)), Direction::West);
    }
}
