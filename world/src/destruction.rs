//! Removal of destructibles crushed by pushables.

use std::collections::BTreeSet;

use chipway_core::{Cell, Event};
use tracing::{debug, info};

use crate::World;

/// Remembers which cells held a pushable at the end of the previous scan.
#[derive(Clone, Debug, Default)]
pub(crate) struct DestructionTracker {
    previous: BTreeSet<Cell>,
}

impl DestructionTracker {
    pub(crate) fn new(occupied: BTreeSet<Cell>) -> Self {
        Self { previous: occupied }
    }

    /// Records the current set and returns the cells that were not occupied
    /// during the previous scan.
    pub(crate) fn newly_occupied(&mut self, current: BTreeSet<Cell>) -> Vec<Cell> {
        let fresh = current.difference(&self.previous).copied().collect();
        self.previous = current;
        fresh
    }
}

impl World {
    /// Removes the destructible tile and entity at the cell.
    ///
    /// Returns `false` when the cell holds nothing destructible.
    pub fn try_destroy_at(&mut self, cell: Cell, out_events: &mut Vec<Event>) -> bool {
        let mut destroyed = self.tiles.clear_destructible(cell);
        if let Some(fixture) = self.registry.fixture_at(cell) {
            destroyed |= self.registry.remove(fixture).is_some();
        }
        if !destroyed {
            debug!(?cell, "nothing to destroy");
            return false;
        }
        let position = self.grid.cell_center(cell);
        info!(?cell, "destructible destroyed");
        out_events.push(Event::DestructibleDestroyed { cell, position });
        true
    }

    /// Cells currently holding a moveable tile or a moveable entity.
    pub(crate) fn pushable_cells(&self) -> BTreeSet<Cell> {
        let mut cells = self.registry.moveable_cells();
        cells.extend(self.tiles.moveable_cells());
        cells
    }

    /// Destroys destructibles under pushables that arrived since the last scan.
    pub(crate) fn resolve_destruction(&mut self, out_events: &mut Vec<Event>) {
        let current = self.pushable_cells();
        for cell in self.destruction.newly_occupied(current) {
            let _ = self.try_destroy_at(cell, out_events);
        }
    }
}
