//! Step, push and dash resolution.
//!
//! Logical cells are committed the moment a request is accepted, so two
//! bodies can never be mid-transition into the same cell. The presented
//! position then animates toward the committed cell.

use chipway_core::{
    Cell, Direction, EntityId, EntityKind, Event, MotionState, MoveOutcome, Pushable,
    RejectReason, TileKind,
};
use tracing::debug;

use crate::{motion::Motion, motion::TileSlide, LevelStatus, World};

/// What lies in the cell an actor wants to enter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StepProbe {
    Open,
    Push(Pushable),
    Catch { enemy: EntityId },
    Blocked(RejectReason),
}

/// Whether a pushable may land in the cell beyond it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PushProbe {
    Clear { destroys: bool },
    Blocked,
}

#[derive(Clone, Copy, Debug)]
struct Actor {
    id: EntityId,
    kind: EntityKind,
    cell: Cell,
    dash_cooldown: f32,
}

impl World {
    /// Attempts to move an actor one cell, pushing a block ahead of the player.
    pub fn request_step(
        &mut self,
        entity: EntityId,
        direction: Direction,
        out_events: &mut Vec<Event>,
    ) -> MoveOutcome {
        let actor = match self.ready_actor(entity) {
            Ok(actor) => actor,
            Err(reason) => return reject(entity, direction, reason, out_events),
        };
        let target = actor.cell.step(direction);

        match self.probe_step(actor.id, actor.kind, target) {
            StepProbe::Open => {
                self.commit_step(actor, target, direction, out_events);
                MoveOutcome::Accepted
            }
            StepProbe::Blocked(reason) => reject(entity, direction, reason, out_events),
            StepProbe::Catch { enemy } => {
                self.catch_player(enemy, out_events);
                reject(entity, direction, RejectReason::Caught, out_events)
            }
            StepProbe::Push(pushable) => {
                let push_target = target.step(direction);
                match self.probe_push(push_target) {
                    PushProbe::Blocked => {
                        reject(entity, direction, RejectReason::PushBlocked, out_events)
                    }
                    PushProbe::Clear { destroys } => {
                        if destroys {
                            let _ = self.try_destroy_at(push_target, out_events);
                        }
                        self.commit_push(pushable, target, push_target, out_events);
                        self.commit_step(actor, target, direction, out_events);
                        MoveOutcome::Accepted
                    }
                }
            }
        }
    }

    /// Attempts a multi-cell dash, falling back to a step when the dash is
    /// cooling down or the first cell is not clear.
    pub fn request_dash(
        &mut self,
        entity: EntityId,
        direction: Direction,
        out_events: &mut Vec<Event>,
    ) -> MoveOutcome {
        let actor = match self.ready_actor(entity) {
            Ok(actor) => actor,
            Err(reason) => return reject(entity, direction, reason, out_events),
        };
        if actor.dash_cooldown > 0.0 {
            debug!(entity = entity.get(), "dash cooling down, stepping instead");
            return self.request_step(entity, direction, out_events);
        }

        let mut path = Vec::new();
        let mut destination = actor.cell;
        while (path.len() as u32) < self.tuning.dash_distance {
            let next = destination.step(direction);
            if self.probe_step(actor.id, actor.kind, next) != StepProbe::Open {
                break;
            }
            path.push(next);
            destination = next;
        }
        let travelled = path.len() as u32;
        if travelled == 0 {
            return self.request_step(entity, direction, out_events);
        }
        let _ = path.pop();

        let duration = self.tuning.dash_step_time * travelled as f32;
        let end = self.grid.cell_center(destination);
        let dash_cooldown = self.tuning.dash_cooldown;
        if !self.registry.relocate(entity, destination) {
            return reject(entity, direction, RejectReason::Occupied, out_events);
        }
        if let Some(body) = self.registry.get_mut(entity) {
            body.motion = Some(Motion::dash(body.position, end, duration));
            body.facing = direction;
            body.dash_cooldown = dash_cooldown;
            body.passed_over = path;
        }
        out_events.push(Event::MoveStarted {
            entity,
            from: actor.cell,
            to: destination,
            motion: MotionState::Dashing,
        });
        MoveOutcome::Accepted
    }

    /// Reports whether a step in the direction would currently be accepted.
    pub(crate) fn can_step(&self, entity: EntityId, direction: Direction) -> bool {
        let Ok(actor) = self.ready_actor(entity) else {
            return false;
        };
        let target = actor.cell.step(direction);
        match self.probe_step(actor.id, actor.kind, target) {
            StepProbe::Open | StepProbe::Catch { .. } => true,
            StepProbe::Blocked(_) => false,
            StepProbe::Push(_) => matches!(
                self.probe_push(target.step(direction)),
                PushProbe::Clear { .. }
            ),
        }
    }

    /// Advances every running animation and returns the entities that arrived,
    /// in identifier order.
    pub(crate) fn advance_motions(&mut self, dt: f32) -> Vec<EntityId> {
        let mut arrived = Vec::new();
        for entity in self.registry.iter_mut() {
            entity.dash_cooldown = (entity.dash_cooldown - dt).max(0.0);
            let Some(motion) = entity.motion.as_mut() else {
                continue;
            };
            if motion.advance(dt) {
                entity.position = motion.end();
                entity.motion = None;
                arrived.push(entity.id);
            } else {
                entity.position = motion.position();
            }
        }
        self.slides.retain_mut(|slide| !slide.motion.advance(dt));
        arrived
    }

    fn ready_actor(&self, entity: EntityId) -> Result<Actor, RejectReason> {
        if self.paused {
            return Err(RejectReason::Paused);
        }
        if self.status != LevelStatus::Playing {
            return Err(RejectReason::LevelOver);
        }
        let body = self
            .registry
            .get(entity)
            .ok_or(RejectReason::UnknownEntity)?;
        if !body.kind.is_actor() {
            return Err(RejectReason::NotAnActor);
        }
        if body.is_moving() {
            return Err(RejectReason::AlreadyMoving);
        }
        Ok(Actor {
            id: body.id,
            kind: body.kind,
            cell: body.cell,
            dash_cooldown: body.dash_cooldown,
        })
    }

    fn probe_step(&self, mover: EntityId, kind: EntityKind, cell: Cell) -> StepProbe {
        if !self.level.contains(cell) {
            return StepProbe::Blocked(RejectReason::Wall);
        }
        match self.tiles.floor(cell) {
            TileKind::Wall => return StepProbe::Blocked(RejectReason::Wall),
            TileKind::Destructible => return StepProbe::Blocked(RejectReason::Destructible),
            TileKind::KeyBlocking if kind == EntityKind::Enemy => {
                return StepProbe::Blocked(RejectReason::KeyBlocked)
            }
            _ => {}
        }
        if self.gates.is_closed(cell) {
            return StepProbe::Blocked(RejectReason::GateClosed);
        }
        if self.registry.fixture_at(cell).is_some() {
            return StepProbe::Blocked(RejectReason::Destructible);
        }
        if let Some(occupant) = self.registry.occupant(cell) {
            return match (kind, occupant.kind) {
                (EntityKind::Player, EntityKind::Moveable) if !occupant.is_moving() => {
                    StepProbe::Push(Pushable::Entity(occupant.id))
                }
                (EntityKind::Player, EntityKind::Enemy) => StepProbe::Catch { enemy: occupant.id },
                (EntityKind::Enemy, EntityKind::Player) => StepProbe::Catch { enemy: mover },
                _ => StepProbe::Blocked(RejectReason::Occupied),
            };
        }
        if self.tiles.has_moveable(cell) {
            let sliding = self.slides.iter().any(|slide| slide.to == cell);
            return if kind == EntityKind::Player && !sliding {
                StepProbe::Push(Pushable::Tile)
            } else {
                StepProbe::Blocked(RejectReason::Occupied)
            };
        }
        StepProbe::Open
    }

    fn probe_push(&self, cell: Cell) -> PushProbe {
        if !self.level.contains(cell)
            || self.tiles.floor(cell) == TileKind::Wall
            || self.tiles.has_moveable(cell)
            || self.gates.is_closed(cell)
            || self.registry.occupant(cell).is_some()
        {
            return PushProbe::Blocked;
        }
        let destroys = self.tiles.floor(cell) == TileKind::Destructible
            || self.registry.fixture_at(cell).is_some();
        PushProbe::Clear { destroys }
    }

    fn commit_step(
        &mut self,
        actor: Actor,
        target: Cell,
        direction: Direction,
        out_events: &mut Vec<Event>,
    ) {
        let duration = match actor.kind {
            EntityKind::Enemy => self.tuning.enemy_step_time,
            _ => self.tuning.step_time,
        };
        let end = self.grid.cell_center(target);
        if !self.registry.relocate(actor.id, target) {
            return;
        }
        if let Some(body) = self.registry.get_mut(actor.id) {
            body.motion = Some(Motion::step(body.position, end, duration));
            body.facing = direction;
        }
        out_events.push(Event::MoveStarted {
            entity: actor.id,
            from: actor.cell,
            to: target,
            motion: MotionState::Moving,
        });
    }

    fn commit_push(
        &mut self,
        pushable: Pushable,
        from: Cell,
        to: Cell,
        out_events: &mut Vec<Event>,
    ) {
        let start = self.grid.cell_center(from);
        let end = self.grid.cell_center(to);
        let motion = Motion::step(start, end, self.tuning.step_time);
        let moved = match pushable {
            Pushable::Tile => {
                let slid = self.tiles.slide(from, to);
                if slid {
                    self.slides.push(TileSlide { from, to, motion });
                }
                slid
            }
            Pushable::Entity(id) => {
                let relocated = self.registry.relocate(id, to);
                if let (true, Some(block)) = (relocated, self.registry.get_mut(id)) {
                    block.motion = Some(motion);
                }
                relocated
            }
        };
        if moved {
            out_events.push(Event::BlockPushed { pushable, from, to });
        }
    }
}

fn reject(
    entity: EntityId,
    direction: Direction,
    reason: RejectReason,
    out_events: &mut Vec<Event>,
) -> MoveOutcome {
    debug!(entity = entity.get(), ?direction, ?reason, "move rejected");
    out_events.push(Event::StepRejected {
        entity,
        direction,
        reason,
    });
    MoveOutcome::Rejected
}
