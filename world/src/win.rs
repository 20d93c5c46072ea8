//! Pickup tracking and the two-part completion latch.

use std::collections::{BTreeMap, BTreeSet};

use chipway_core::{Cell, PickupId};

#[derive(Clone, Debug, Default)]
pub(crate) struct WinCondition {
    pickups: BTreeMap<Cell, PickupId>,
    collected: BTreeSet<PickupId>,
    total: u32,
    all_collected: bool,
    goal_reached: bool,
    completed: bool,
}

/// Outcome of collecting a pickup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Collection {
    pub(crate) pickup: PickupId,
    pub(crate) collected: u32,
    pub(crate) total: u32,
    pub(crate) completes_set: bool,
}

impl WinCondition {
    pub(crate) fn new(cells: impl IntoIterator<Item = Cell>) -> Self {
        let pickups: BTreeMap<Cell, PickupId> = cells
            .into_iter()
            .enumerate()
            .map(|(index, cell)| (cell, PickupId::new(index as u32)))
            .collect();
        let total = pickups.len() as u32;
        Self {
            pickups,
            collected: BTreeSet::new(),
            total,
            all_collected: total == 0,
            goal_reached: false,
            completed: false,
        }
    }

    /// Collects the pickup on the cell, if one remains there.
    pub(crate) fn collect_at(&mut self, cell: Cell) -> Option<Collection> {
        let pickup = *self.pickups.get(&cell)?;
        if !self.collected.insert(pickup) {
            return None;
        }
        let collected = self.collected.len() as u32;
        let completes_set = !self.all_collected && collected == self.total;
        if completes_set {
            self.all_collected = true;
        }
        Some(Collection {
            pickup,
            collected,
            total: self.total,
            completes_set,
        })
    }

    /// Latches the goal flag. Returns `true` the first time only.
    pub(crate) fn reach_goal(&mut self) -> bool {
        let first = !self.goal_reached;
        self.goal_reached = true;
        first
    }

    /// Latches completion once both conditions hold. Returns `true` once.
    pub(crate) fn try_complete(&mut self) -> bool {
        if self.completed || !(self.all_collected && self.goal_reached) {
            return false;
        }
        self.completed = true;
        true
    }

    pub(crate) fn remaining(&self) -> impl Iterator<Item = (Cell, PickupId)> + '_ {
        self.pickups
            .iter()
            .filter(|(_, pickup)| !self.collected.contains(pickup))
            .map(|(cell, pickup)| (*cell, *pickup))
    }

    pub(crate) fn progress(&self) -> WinProgress {
        WinProgress {
            collected: self.collected.len() as u32,
            total: self.total,
            all_collected: self.all_collected,
            goal_reached: self.goal_reached,
            completed: self.completed,
        }
    }
}

/// Read-only summary of the level's win state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WinProgress {
    /// Pickups collected so far.
    pub collected: u32,
    /// Pickups placed in the level.
    pub total: u32,
    /// Whether every pickup has been collected.
    pub all_collected: bool,
    /// Whether the player has rested on a win tile.
    pub goal_reached: bool,
    /// Whether the level completed.
    pub completed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_requires_both_latches_and_fires_once() {
        let mut win = WinCondition::new([Cell::new(1, 0), Cell::new(2, 0)]);
        assert!(win.reach_goal());
        assert!(!win.try_complete());

        let first = win.collect_at(Cell::new(1, 0)).expect("pickup present");
        assert_eq!((first.collected, first.total, first.completes_set), (1, 2, false));
        assert!(win.collect_at(Cell::new(1, 0)).is_none());
        let second = win.collect_at(Cell::new(2, 0)).expect("pickup present");
        assert!(second.completes_set);

        assert!(win.try_complete());
        assert!(!win.try_complete());
        assert!(!win.reach_goal());
    }

    #[test]
    fn level_without_pickups_only_needs_goal() {
        let mut win = WinCondition::new(Vec::new());
        assert!(!win.try_complete());
        assert!(win.reach_goal());
        assert!(win.try_complete());
        assert_eq!(win.remaining().count(), 0);
    }
}
