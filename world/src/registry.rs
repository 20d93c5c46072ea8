//! Entity storage with per-cell occupancy indices.

use std::collections::{BTreeMap, BTreeSet};

use chipway_core::{
    Cell, Direction, EnemyBehavior, EntityId, EntityKind, EntitySnapshot, MotionState,
};
use glam::Vec2;

use crate::motion::Motion;

#[derive(Clone, Debug)]
pub(crate) struct Entity {
    pub(crate) id: EntityId,
    pub(crate) kind: EntityKind,
    pub(crate) cell: Cell,
    pub(crate) facing: Direction,
    pub(crate) position: Vec2,
    pub(crate) motion: Option<Motion>,
    pub(crate) dash_cooldown: f32,
    pub(crate) behavior: Option<EnemyBehavior>,
    /// Cells crossed by the running dash, excluding its destination.
    pub(crate) passed_over: Vec<Cell>,
}

impl Entity {
    pub(crate) fn is_moving(&self) -> bool {
        self.motion.is_some()
    }

    pub(crate) fn motion_state(&self) -> MotionState {
        self.motion.map_or(MotionState::Idle, |motion| motion.state())
    }

    pub(crate) fn snapshot(&self) -> EntitySnapshot {
        EntitySnapshot {
            id: self.id,
            kind: self.kind,
            cell: self.cell,
            facing: self.facing,
            position: self.position,
            motion: self.motion_state(),
            dash_cooldown: self.dash_cooldown,
            behavior: self.behavior,
        }
    }
}

/// Registry of entities. Bodies (player, enemies, moveables) claim their cell
/// exclusively; destructible fixtures are indexed separately.
#[derive(Clone, Debug, Default)]
pub(crate) struct EntityRegistry {
    entities: BTreeMap<EntityId, Entity>,
    bodies: BTreeMap<Cell, EntityId>,
    fixtures: BTreeMap<Cell, EntityId>,
    next_id: u32,
}

impl EntityRegistry {
    /// Registers an entity, refusing cells already claimed by the same layer.
    pub(crate) fn spawn(
        &mut self,
        kind: EntityKind,
        cell: Cell,
        position: Vec2,
        behavior: Option<EnemyBehavior>,
    ) -> Option<EntityId> {
        let index = if kind.is_body() {
            &mut self.bodies
        } else {
            &mut self.fixtures
        };
        if index.contains_key(&cell) {
            return None;
        }
        let id = EntityId::new(self.next_id);
        self.next_id += 1;
        let _ = index.insert(cell, id);
        let _ = self.entities.insert(
            id,
            Entity {
                id,
                kind,
                cell,
                facing: Direction::Down,
                position,
                motion: None,
                dash_cooldown: 0.0,
                behavior,
                passed_over: Vec::new(),
            },
        );
        Some(id)
    }

    pub(crate) fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.values_mut()
    }

    /// Body claiming the cell, if any.
    pub(crate) fn occupant(&self, cell: Cell) -> Option<&Entity> {
        self.bodies
            .get(&cell)
            .and_then(|id| self.entities.get(id))
    }

    /// Destructible fixture resting on the cell, if any.
    pub(crate) fn fixture_at(&self, cell: Cell) -> Option<EntityId> {
        self.fixtures.get(&cell).copied()
    }

    pub(crate) fn player(&self) -> Option<&Entity> {
        self.entities
            .values()
            .find(|entity| entity.kind == EntityKind::Player)
    }

    /// Moves a body's logical cell. Fails when another body claims `to`.
    pub(crate) fn relocate(&mut self, id: EntityId, to: Cell) -> bool {
        let Some(entity) = self.entities.get_mut(&id) else {
            return false;
        };
        if !entity.kind.is_body() {
            return false;
        }
        match self.bodies.get(&to) {
            Some(other) if *other != id => return false,
            _ => {}
        }
        let _ = self.bodies.remove(&entity.cell);
        let _ = self.bodies.insert(to, id);
        entity.cell = to;
        true
    }

    pub(crate) fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let entity = self.entities.remove(&id)?;
        let index = if entity.kind.is_body() {
            &mut self.bodies
        } else {
            &mut self.fixtures
        };
        let _ = index.remove(&entity.cell);
        Some(entity)
    }

    /// Cells claimed by moveable entities.
    pub(crate) fn moveable_cells(&self) -> BTreeSet<Cell> {
        self.entities
            .values()
            .filter(|entity| entity.kind == EntityKind::Moveable)
            .map(|entity| entity.cell)
            .collect()
    }

    /// Verifies that the cell indices agree with the entity records.
    #[cfg(test)]
    pub(crate) fn is_consistent(&self) -> bool {
        let bodies = self
            .entities
            .values()
            .filter(|entity| entity.kind.is_body())
            .all(|entity| self.bodies.get(&entity.cell) == Some(&entity.id));
        let fixtures = self
            .entities
            .values()
            .filter(|entity| !entity.kind.is_body())
            .all(|entity| self.fixtures.get(&entity.cell) == Some(&entity.id));
        let body_count = self
            .entities
            .values()
            .filter(|entity| entity.kind.is_body())
            .count();
        bodies && fixtures && body_count == self.bodies.len()
    }
}
