#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure wander system that walks enemies in seeded random cardinal directions.
//!
//! Each wandering enemy holds a direction for a random duration and steps
//! along it whenever it is idle. A blocked enemy re-picks early, but no more
//! often than the configured re-pick cooldown allows.

use std::{collections::BTreeMap, time::Duration};

use chipway_core::{Command, Direction, EnemyBehavior, EntityId, EntityView, Event};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::trace;

/// Configuration parameters required to construct the wander system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    hold_min: Duration,
    hold_max: Duration,
    repick_cooldown: Duration,
    seed: u64,
}

impl Config {
    /// Creates a configuration from the hold range, the blocked re-pick
    /// cooldown and the random seed.
    #[must_use]
    pub const fn new(
        hold_min: Duration,
        hold_max: Duration,
        repick_cooldown: Duration,
        seed: u64,
    ) -> Self {
        Self {
            hold_min,
            hold_max,
            repick_cooldown,
            seed,
        }
    }

    /// Returns a copy of the configuration using another seed.
    #[must_use]
    pub const fn with_seed(self, seed: u64) -> Self {
        Self { seed, ..self }
    }

    /// Seed feeding the direction and duration picks.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(
            Duration::from_secs(1),
            Duration::from_secs(2),
            Duration::from_millis(200),
            0,
        )
    }
}

#[derive(Clone, Copy, Debug)]
struct Heading {
    direction: Direction,
    hold: Duration,
    repick: Duration,
}

/// Pure system that emits step commands for wandering enemies.
#[derive(Debug)]
pub struct Wander {
    config: Config,
    rng: ChaCha8Rng,
    headings: BTreeMap<EntityId, Heading>,
}

impl Wander {
    /// Creates a new wander system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            headings: BTreeMap::new(),
        }
    }

    /// Direction the enemy currently holds, if it has started wandering.
    #[must_use]
    pub fn heading(&self, enemy: EntityId) -> Option<Direction> {
        self.headings.get(&enemy).map(|heading| heading.direction)
    }

    /// Consumes world events and the entity view to emit wander steps.
    ///
    /// `can_step` reports whether the world would accept a step for the
    /// entity in the given direction.
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
                Event::LevelReset => {
                    self.headings.clear();
                    self.rng = ChaCha8Rng::seed_from_u64(self.config.seed);
                }
                _ => {}
            }
        }

        for enemy in entities.enemies() {
            if enemy.behavior != Some(EnemyBehavior::Wander) {
                continue;
            }
            if !self.headings.contains_key(&enemy.id) {
                let picked = pick(&mut self.rng, &self.config);
                let _ = self.headings.insert(enemy.id, picked);
            } else if let Some(heading) = self.headings.get_mut(&enemy.id) {
                heading.hold = heading.hold.saturating_sub(elapsed);
                heading.repick = heading.repick.saturating_sub(elapsed);
            }
            let Some(heading) = self.headings.get_mut(&enemy.id) else {
                continue;
            };
            if heading.hold.is_zero() {
                let repick = heading.repick;
                *heading = Heading {
                    repick,
                    ..pick(&mut self.rng, &self.config)
                };
            }
            if enemy.is_moving() {
                continue;
            }

            if !can_step(enemy.id, heading.direction) {
                if !heading.repick.is_zero() {
                    continue;
                }
                *heading = Heading {
                    repick: self.config.repick_cooldown,
                    ..pick(&mut self.rng, &self.config)
                };
                trace!(
                    enemy = enemy.id.get(),
                    direction = ?heading.direction,
                    "blocked, re-picking"
                );
                if !can_step(enemy.id, heading.direction) {
                    continue;
                }
            }

            out.push(Command::RequestStep {
                entity: enemy.id,
                direction: heading.direction,
            });
        }
    }
}

impl Default for Wander {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

fn pick(rng: &mut ChaCha8Rng, config: &Config) -> Heading {
    let direction = Direction::ALL[rng.gen_range(0..Direction::ALL.len())];
    let min = config.hold_min.as_secs_f32();
    let max = config.hold_max.as_secs_f32();
    let hold = if max > min {
        rng.gen_range(min..max)
    } else {
        min
    };
    Heading {
        direction,
        hold: Duration::try_from_secs_f32(hold).unwrap_or(config.hold_min),
        repick: Duration::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_stay_within_the_hold_range() {
        let config = Config::default().with_seed(7);
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed());
        for _ in 0..64 {
            let heading = pick(&mut rng, &config);
            assert!(heading.hold >= Duration::from_secs(1), "hold below minimum");
            assert!(heading.hold < Duration::from_secs(2), "hold above maximum");
            assert!(heading.repick.is_zero(), "fresh picks carry no cooldown");
        }
    }

    #[test]
    fn equal_bounds_hold_for_exactly_the_minimum() {
        let config = Config::new(
            Duration::from_millis(500),
            Duration::from_millis(500),
            Duration::ZERO,
            3,
        );
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed());
        assert_eq!(pick(&mut rng, &config).hold, Duration::from_millis(500));
    }
}
