//! Generated map layout and its wire representation.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{CellCoord, CellPoint, CellRect, PathId, GRID_COLUMNS, GRID_ROWS};

/// Display color shared by a main path and its branches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathColor {
    red: u8,
    green: u8,
    blue: u8,
}

impl PathColor {
    /// Creates a new color from byte RGB components.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// CSS hex notation, e.g. `#2f9532`.
    #[must_use]
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }
}

/// A conveyor route from a spawn cell to the pit edge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorePath {
    id: PathId,
    cells: Vec<CellCoord>,
    color: PathColor,
    main_path: usize,
}

impl CorePath {
    /// Creates a core path; `cells[0]` is the spawn cell.
    #[must_use]
    pub fn new(id: PathId, cells: Vec<CellCoord>, color: PathColor, main_path: usize) -> Self {
        Self {
            id,
            cells,
            color,
            main_path,
        }
    }

    /// Identifier of the path.
    #[must_use]
    pub const fn id(&self) -> PathId {
        self.id
    }

    /// Ordered cells from spawn to pit edge.
    #[must_use]
    pub fn cells(&self) -> &[CellCoord] {
        &self.cells
    }

    /// Display color.
    #[must_use]
    pub const fn color(&self) -> PathColor {
        self.color
    }

    /// Index of the main path this route belongs to.
    #[must_use]
    pub const fn main_path(&self) -> usize {
        self.main_path
    }

    /// Spawn cell of the path.
    #[must_use]
    pub fn head(&self) -> Option<CellCoord> {
        self.cells.first().copied()
    }

    /// Index of the final cell, reached when an enemy drops into the pit.
    #[must_use]
    pub fn last_index(&self) -> usize {
        self.cells.len().saturating_sub(1)
    }

    /// Point `progress` of the way from cell `index` to the following cell.
    #[must_use]
    pub fn point_at(&self, index: usize, progress: f32) -> Option<CellPoint> {
        let from = self.cells.get(index)?.to_point();
        let to = self
            .cells
            .get(index + 1)
            .map_or(from, |cell| cell.to_point());
        Some(from.lerp(to, progress.clamp(0.0, 1.0)))
    }
}

/// Immutable result of map generation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapLayout {
    pit: CellRect,
    core_paths: Vec<CorePath>,
    entries: Vec<CellCoord>,
    entry_to_main_path: Vec<usize>,
    corridor: BTreeSet<CellCoord>,
    attempts: u32,
    fallback: bool,
}

impl MapLayout {
    /// Assembles a layout, deriving entries and their main path mapping
    /// from the provided core paths.
    #[must_use]
    pub fn new(
        pit: CellRect,
        core_paths: Vec<CorePath>,
        corridor: BTreeSet<CellCoord>,
        attempts: u32,
        fallback: bool,
    ) -> Self {
        let mut entries = Vec::with_capacity(core_paths.len());
        let mut entry_to_main_path = Vec::with_capacity(core_paths.len());
        for path in &core_paths {
            if let Some(head) = path.head() {
                entries.push(head);
                entry_to_main_path.push(path.main_path());
            }
        }

        Self {
            pit,
            core_paths,
            entries,
            entry_to_main_path,
            corridor,
            attempts,
            fallback,
        }
    }

    /// Rectangle covered by the pit.
    #[must_use]
    pub const fn pit(&self) -> CellRect {
        self.pit
    }

    /// Every core path, main paths first.
    #[must_use]
    pub fn core_paths(&self) -> &[CorePath] {
        &self.core_paths
    }

    /// Looks up a core path by identifier.
    #[must_use]
    pub fn path(&self, id: PathId) -> Option<&CorePath> {
        self.core_paths.iter().find(|path| path.id() == id)
    }

    /// Spawn cell of every core path.
    #[must_use]
    pub fn entries(&self) -> &[CellCoord] {
        &self.entries
    }

    /// Main path index of every entry.
    #[must_use]
    pub fn entry_to_main_path(&self) -> &[usize] {
        &self.entry_to_main_path
    }

    /// Non-buildable cells around the core paths.
    #[must_use]
    pub fn corridor(&self) -> &BTreeSet<CellCoord> {
        &self.corridor
    }

    /// Reports whether the cell belongs to the corridor.
    #[must_use]
    pub fn is_corridor(&self, cell: CellCoord) -> bool {
        self.corridor.contains(&cell)
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub fn in_bounds(&self, cell: CellCoord) -> bool {
        cell.column() < GRID_COLUMNS && cell.row() < GRID_ROWS
    }

    /// Number of distinct main paths.
    #[must_use]
    pub fn main_path_count(&self) -> usize {
        self.core_paths
            .iter()
            .map(CorePath::main_path)
            .max()
            .map_or(0, |max| max + 1)
    }

    /// Number of generation attempts that were made.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Reports whether the deterministic fallback map was used.
    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        self.fallback
    }

    /// Wire representation sent to clients.
    #[must_use]
    pub fn document(&self) -> MapDocument {
        let origin = self.pit.origin();
        MapDocument {
            pit: PitDocument {
                x: origin.column(),
                y: origin.row(),
                width: self.pit.size().width(),
                height: self.pit.size().height(),
            },
            entries: self.entries.iter().copied().map(SquareDocument::from).collect(),
            core_paths: self
                .core_paths
                .iter()
                .map(|path| CorePathDocument {
                    squares: path.cells().iter().copied().map(SquareDocument::from).collect(),
                    color: path.color().hex(),
                    id: path.id().get(),
                })
                .collect(),
            entry_to_main_path: self.entry_to_main_path.clone(),
            path_squares: self.corridor.iter().copied().map(SquareDocument::from).collect(),
        }
    }
}

/// Map shape transmitted to clients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapDocument {
    /// Pit rectangle.
    pub pit: PitDocument,
    /// Spawn cell of every core path.
    pub entries: Vec<SquareDocument>,
    /// Every core path.
    pub core_paths: Vec<CorePathDocument>,
    /// Main path index of every entry.
    pub entry_to_main_path: Vec<usize>,
    /// Corridor cells.
    pub path_squares: Vec<SquareDocument>,
}

/// Pit rectangle as transmitted to clients.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PitDocument {
    /// Left column.
    pub x: u32,
    /// Top row.
    pub y: u32,
    /// Width in cells.
    pub width: u32,
    /// Height in cells.
    pub height: u32,
}

/// A single cell as transmitted to clients.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SquareDocument {
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
}

impl From<CellCoord> for SquareDocument {
    fn from(cell: CellCoord) -> Self {
        Self {
            x: cell.column(),
            y: cell.row(),
        }
    }
}

/// A core path as transmitted to clients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorePathDocument {
    /// Ordered cells from spawn to pit edge.
    pub squares: Vec<SquareDocument>,
    /// CSS hex color.
    pub color: String,
    /// Path identifier.
    pub id: u32,
}
