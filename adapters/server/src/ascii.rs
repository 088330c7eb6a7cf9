//! Plain-text rendering of maps and session snapshots.

use pit_defence_core::{CellCoord, MapLayout, SessionSnapshot, GRID_COLUMNS, GRID_ROWS};

const FLOOR: char = '.';
const CORRIDOR: char = ':';
const PATH: char = '#';
const ENTRY: char = 'S';
const PIT: char = 'O';
const WEAPON: char = 'W';
const ENEMY: char = 'e';
const PLAYER: char = '@';

/// Character grid covering the whole map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AsciiFrame {
    rows: Vec<Vec<char>>,
}

impl AsciiFrame {
    /// Draws the static layout: floor, corridor, core paths, entries and pit.
    #[must_use]
    pub fn from_map(map: &MapLayout) -> Self {
        let mut frame = Self {
            rows: vec![vec![FLOOR; GRID_COLUMNS as usize]; GRID_ROWS as usize],
        };
        for cell in map.corridor() {
            frame.put(*cell, CORRIDOR);
        }
        for path in map.core_paths() {
            for cell in path.cells() {
                frame.put(*cell, PATH);
            }
        }
        for cell in map.entries() {
            frame.put(*cell, ENTRY);
        }
        for cell in map.pit().cells() {
            frame.put(cell, PIT);
        }
        frame
    }

    /// Draws the layout with weapons, enemies and players on top.
    #[must_use]
    pub fn from_snapshot(map: &MapLayout, snapshot: &SessionSnapshot) -> Self {
        let mut frame = Self::from_map(map);
        for weapon in &snapshot.weapons {
            for cell in weapon.region.cells() {
                frame.put(cell, WEAPON);
            }
        }
        for enemy in snapshot.enemies.iter().filter(|enemy| !enemy.in_pit) {
            frame.put_point(enemy.position.column(), enemy.position.row(), ENEMY);
        }
        for player in &snapshot.players {
            frame.put_point(player.position.column(), player.position.row(), PLAYER);
        }
        frame
    }

    /// Character drawn at a cell, if it lies on the grid.
    #[must_use]
    pub fn at(&self, cell: CellCoord) -> Option<char> {
        self.rows
            .get(cell.row() as usize)
            .and_then(|row| row.get(cell.column() as usize))
            .copied()
    }

    fn put(&mut self, cell: CellCoord, glyph: char) {
        if let Some(slot) = self
            .rows
            .get_mut(cell.row() as usize)
            .and_then(|row| row.get_mut(cell.column() as usize))
        {
            *slot = glyph;
        }
    }

    fn put_point(&mut self, column: f32, row: f32, glyph: char) {
        if !column.is_finite() || !row.is_finite() || column < 0.0 || row < 0.0 {
            return;
        }
        self.put(CellCoord::new(column.round() as u32, row.round() as u32), glyph);
    }
}

impl std::fmt::Display for AsciiFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in &self.rows {
            let line: String = row.iter().collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
