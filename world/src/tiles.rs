//! Sparse tile storage for the static floor and the moveable tile overlay.

use std::collections::{BTreeMap, BTreeSet};

use chipway_core::{Cell, TileKind};

/// Sparse tile layer keyed by cell.
///
/// Static tiles (walls, destructibles, win and key-blocking tiles) live in the
/// floor map. Moveable tiles live in a separate overlay so a pushed tile can
/// rest on top of a win or key-blocking tile without erasing it.
#[derive(Clone, Debug, Default)]
pub struct TileLayer {
    floor: BTreeMap<Cell, TileKind>,
    moveables: BTreeSet<Cell>,
}

impl TileLayer {
    /// Tile resolved at the cell. A moveable tile hides the floor beneath it.
    #[must_use]
    pub fn kind(&self, cell: Cell) -> TileKind {
        if self.moveables.contains(&cell) {
            TileKind::Moveable
        } else {
            self.floor(cell)
        }
    }

    /// Static tile at the cell, ignoring moveable tiles.
    #[must_use]
    pub fn floor(&self, cell: Cell) -> TileKind {
        self.floor.get(&cell).copied().unwrap_or_default()
    }

    /// Reports whether a moveable tile rests on the cell.
    #[must_use]
    pub fn has_moveable(&self, cell: Cell) -> bool {
        self.moveables.contains(&cell)
    }

    /// Iterates over the non-empty floor tiles in cell order.
    pub fn floor_tiles(&self) -> impl Iterator<Item = (Cell, TileKind)> + '_ {
        self.floor.iter().map(|(cell, kind)| (*cell, *kind))
    }

    /// Iterates over cells holding a moveable tile in cell order.
    pub fn moveable_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.moveables.iter().copied()
    }

    pub(crate) fn set(&mut self, cell: Cell, kind: TileKind) {
        match kind {
            TileKind::Moveable => {
                let _ = self.moveables.insert(cell);
            }
            TileKind::Empty => {
                let _ = self.floor.remove(&cell);
            }
            other => {
                let _ = self.floor.insert(cell, other);
            }
        }
    }

    /// Moves a moveable tile between cells. Fails when the source holds none or
    /// the destination already holds one.
    pub(crate) fn slide(&mut self, from: Cell, to: Cell) -> bool {
        if !self.moveables.contains(&from) || self.moveables.contains(&to) {
            return false;
        }
        let _ = self.moveables.remove(&from);
        self.moveables.insert(to)
    }

    pub(crate) fn clear_destructible(&mut self, cell: Cell) -> bool {
        if self.floor(cell) == TileKind::Destructible {
            let _ = self.floor.remove(&cell);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moveable_tile_hides_floor_without_erasing_it() {
        let mut layer = TileLayer::default();
        let cell = Cell::new(2, 2);
        layer.set(cell, TileKind::Win);
        layer.set(Cell::new(1, 2), TileKind::Moveable);

        assert!(layer.slide(Cell::new(1, 2), cell));
        assert_eq!(layer.kind(cell), TileKind::Moveable);
        assert_eq!(layer.floor(cell), TileKind::Win);
        assert_eq!(layer.kind(Cell::new(1, 2)), TileKind::Empty);
    }

    #[test]
    fn slide_refuses_stacking() {
        let mut layer = TileLayer::default();
        layer.set(Cell::new(0, 0), TileKind::Moveable);
        layer.set(Cell::new(1, 0), TileKind::Moveable);
        assert!(!layer.slide(Cell::new(0, 0), Cell::new(1, 0)));
        assert!(!layer.slide(Cell::new(5, 5), Cell::new(6, 5)));
        assert_eq!(layer.moveable_cells().count(), 2);
    }

    #[test]
    fn only_destructible_floor_is_cleared() {
        let mut layer = TileLayer::default();
        layer.set(Cell::new(0, 0), TileKind::Wall);
        layer.set(Cell::new(1, 0), TileKind::Destructible);
        assert!(!layer.clear_destructible(Cell::new(0, 0)));
        assert!(layer.clear_destructible(Cell::new(1, 0)));
        assert_eq!(layer.kind(Cell::new(1, 0)), TileKind::Empty);
    }
}
