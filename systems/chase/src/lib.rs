#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure chase system that steers enemies greedily toward the player.

use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};

use chipway_core::{
    Cell, Command, DetectionParameters, Direction, EnemyBehavior, EntityId, EntitySnapshot,
    EntityView, Event, OutOfRangeBehavior,
};
use tracing::{trace, warn};

/// Configuration parameters required to construct the chase system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    move_delay: Duration,
}

impl Config {
    /// Creates a configuration with the idle time an enemy waits between decisions.
    #[must_use]
    pub const fn new(move_delay: Duration) -> Self {
        Self { move_delay }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Duration::from_millis(200))
    }
}

/// Pure system that emits step commands for chasing enemies.
#[derive(Debug)]
pub struct Chase {
    move_delay: Duration,
    idle_time: BTreeMap<EntityId, Duration>,
    warned: BTreeSet<EntityId>,
}

impl Chase {
    /// Creates a new chase system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            move_delay: config.move_delay,
            idle_time: BTreeMap::new(),
            warned: BTreeSet::new(),
        }
    }

    /// Consumes world events and the entity view to emit enemy steps.
    ///
    /// `can_step` reports whether the world would accept a step for the
    /// entity in the given direction; stepping into the player counts as open.
    pub fn handle<F>(
        &mut self,
        events: &[Event],
        entities: &EntityView,
        can_step: F,
        out: &mut Vec<Command>,
    ) where
        F: Fn(EntityId, Direction) -> bool,
    {
        let mut elapsed = Duration::ZERO;
        for event in events {
            match event {
                Event::TimeAdvanced { dt } => elapsed = elapsed.saturating_add(*dt),
                Event::LevelReset => self.idle_time.clear(),
                _ => {}
            }
        }

        let Some(player) = entities.player() else {
            return;
        };

        for enemy in entities.enemies() {
            let Some(EnemyBehavior::Chase(detection)) = enemy.behavior else {
                continue;
            };
            if enemy.is_moving() {
                continue;
            }
            let idle = self.idle_time.entry(enemy.id).or_default();
            *idle = idle.saturating_add(elapsed);
            if *idle < self.move_delay || player.is_moving() {
                continue;
            }
            *idle = Duration::ZERO;

            if !detection.in_range(enemy.cell.manhattan_distance(player.cell)) {
                if detection.out_of_range != OutOfRangeBehavior::Idle
                    && self.warned.insert(enemy.id)
                {
                    warn!(
                        enemy = enemy.id.get(),
                        behavior = ?detection.out_of_range,
                        "out-of-range behaviour not supported, idling"
                    );
                }
                continue;
            }

            if let Some(direction) =
                choose_direction(enemy, player, &detection, |direction| {
                    can_step(enemy.id, direction)
                })
            {
                trace!(enemy = enemy.id.get(), ?direction, "chasing");
                out.push(Command::RequestStep {
                    entity: enemy.id,
                    direction,
                });
            }
        }
    }
}

impl Default for Chase {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

/// Direction along the axis with the larger distance to the target.
///
/// Ties go to the vertical axis. Returns `None` when both cells coincide.
#[must_use]
pub fn preferred_direction(from: Cell, to: Cell) -> Option<Direction> {
    let dx = to.x() - from.x();
    let dy = to.y() - from.y();
    if dx == 0 && dy == 0 {
        return None;
    }
    if dx.abs() > dy.abs() {
        Some(if dx > 0 {
            Direction::Right
        } else {
            Direction::Left
        })
    } else {
        Some(if dy > 0 { Direction::Down } else { Direction::Up })
    }
}

/// Picks the step an enemy takes toward the player, or `None` to stay idle.
///
/// The preferred axis is tried first, then right, left, up and down.
pub fn choose_direction<F>(
    enemy: &EntitySnapshot,
    player: &EntitySnapshot,
    detection: &DetectionParameters,
    can_step: F,
) -> Option<Direction>
where
    F: Fn(Direction) -> bool,
{
    if !detection.in_range(enemy.cell.manhattan_distance(player.cell)) {
        return None;
    }
    let preferred = preferred_direction(enemy.cell, player.cell)?;
    if can_step(preferred) {
        return Some(preferred);
    }
    Direction::ALL
        .into_iter()
        .find(|direction| can_step(*direction))
}
