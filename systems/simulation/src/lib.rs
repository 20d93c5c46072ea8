#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Fixed-order simulation loop tying the world to its systems.
//!
//! One call to [`Simulation::tick`] runs every [`Phase`] exactly once, in
//! [`PHASE_ORDER`], and returns the events the tick produced.

use std::time::Duration;

use chipway_core::{dispatch_effects, Command, EffectHooks, Event};
use chipway_system_chase::{self as chase, Chase};
use chipway_system_input::{InputFrame, PlayerInput};
use chipway_system_wander::{self as wander, Wander};
use chipway_world::{self as world, query, Level, World};
use tracing::trace;

/// Stages of a single simulation tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Animations, cooldowns and arrivals advance by `dt`.
    AdvanceTime,
    /// The input frame becomes player commands.
    ResolveInput,
    /// Chase and wander enemies pick their steps.
    ResolveAi,
    /// Pushables that came to rest on destructibles destroy them.
    ResolveDestruction,
    /// Armed teleporters relay eligible subjects.
    ResolveTeleports,
    /// Level completion is checked.
    ResolveWinCheck,
}

impl Phase {
    /// Stable name used in logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::AdvanceTime => "AdvanceTime",
            Self::ResolveInput => "ResolveInput",
            Self::ResolveAi => "ResolveAi",
            Self::ResolveDestruction => "ResolveDestruction",
            Self::ResolveTeleports => "ResolveTeleports",
            Self::ResolveWinCheck => "ResolveWinCheck",
        }
    }
}

/// Order in which phases run within every tick.
pub const PHASE_ORDER: [Phase; 6] = [
    Phase::AdvanceTime,
    Phase::ResolveInput,
    Phase::ResolveAi,
    Phase::ResolveDestruction,
    Phase::ResolveTeleports,
    Phase::ResolveWinCheck,
];

/// Configuration of the systems owned by a [`Simulation`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SimulationConfig {
    chase: chase::Config,
    wander: wander::Config,
}

impl SimulationConfig {
    /// Creates a configuration from the chase and wander settings.
    #[must_use]
    pub const fn new(chase: chase::Config, wander: wander::Config) -> Self {
        Self { chase, wander }
    }
}

/// Owns a world and drives it one tick at a time.
#[derive(Debug)]
pub struct Simulation {
    world: World,
    config: SimulationConfig,
    input: PlayerInput,
    chase: Chase,
    wander: Wander,
    carried: Vec<Event>,
    last_tick_order: Vec<Phase>,
}

impl Simulation {
    /// Builds a simulation for the level.
    #[must_use]
    pub fn new(level: Level, config: SimulationConfig) -> Self {
        let preference = level.tuning().axis_preference;
        Self {
            world: World::new(level),
            config,
            input: PlayerInput::new(preference),
            chase: Chase::new(config.chase),
            wander: Wander::new(config.wander),
            carried: Vec::new(),
            last_tick_order: Vec::with_capacity(PHASE_ORDER.len()),
        }
    }

    /// Read-only access to the simulated world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Phases run by the most recent tick, in execution order.
    #[must_use]
    pub fn last_tick_order(&self) -> &[Phase] {
        &self.last_tick_order
    }

    /// Runs one tick and forwards the resulting effects to `hooks`.
    ///
    /// Input and enemy decisions are skipped while the world is paused.
    pub fn tick<H>(&mut self, frame: &InputFrame, dt: Duration, hooks: &mut H) -> Vec<Event>
    where
        H: EffectHooks + ?Sized,
    {
        let mut events = Vec::new();
        self.last_tick_order.clear();
        for phase in PHASE_ORDER {
            self.last_tick_order.push(phase);
            let before = events.len();
            self.run_phase(phase, frame, dt, &mut events);
            trace!(
                phase = phase.name(),
                events = events.len() - before,
                "phase finished"
            );
        }
        dispatch_effects(&events, hooks);
        events
    }

    /// Applies an out-of-band command such as a switch trigger.
    ///
    /// The events are returned immediately and are also shown to the AI
    /// systems on the next tick.
    pub fn submit(&mut self, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        world::apply(&mut self.world, command, &mut events);
        self.carried.extend(events.iter().cloned());
        events
    }

    /// Pauses or resumes the world.
    pub fn set_paused(&mut self, paused: bool) -> Vec<Event> {
        self.submit(Command::SetPaused { paused })
    }

    /// Reloads the level as it was first loaded.
    pub fn reset(&mut self) -> Vec<Event> {
        self.input = PlayerInput::new(query::tuning(&self.world).axis_preference);
        self.submit(Command::ResetLevel)
    }

    /// Configuration the simulation was built with.
    #[must_use]
    pub fn config(&self) -> SimulationConfig {
        self.config
    }

    fn run_phase(
        &mut self,
        phase: Phase,
        frame: &InputFrame,
        dt: Duration,
        events: &mut Vec<Event>,
    ) {
        let paused = query::is_paused(&self.world);
        match phase {
            Phase::AdvanceTime => world::apply(&mut self.world, Command::Tick { dt }, events),
            Phase::ResolveInput if !paused => {
                let mut commands = Vec::new();
                let player = query::player(&self.world);
                self.input.handle(frame, player.as_ref(), &mut commands);
                self.apply_all(commands, events);
            }
            Phase::ResolveAi if !paused => {
                let mut observed = std::mem::take(&mut self.carried);
                observed.extend(events.iter().cloned());
                let view = query::entity_view(&self.world);
                let world = &self.world;
                let mut commands = Vec::new();
                self.chase.handle(
                    &observed,
                    &view,
                    |entity, direction| query::can_step(world, entity, direction),
                    &mut commands,
                );
                self.wander.handle(
                    &observed,
                    &view,
                    |entity, direction| query::can_step(world, entity, direction),
                    &mut commands,
                );
                commands.sort_by_key(command_entity);
                self.apply_all(commands, events);
            }
            Phase::ResolveInput | Phase::ResolveAi => {}
            Phase::ResolveDestruction => world::resolve_destruction(&mut self.world, events),
            Phase::ResolveTeleports => world::resolve_teleports(&mut self.world, events),
            Phase::ResolveWinCheck => world::resolve_win_check(&mut self.world, events),
        }
    }

    fn apply_all(&mut self, commands: Vec<Command>, events: &mut Vec<Event>) {
        for command in commands {
            world::apply(&mut self.world, command, events);
        }
    }
}

fn command_entity(command: &Command) -> Option<u32> {
    match command {
        Command::RequestStep { entity, .. } | Command::RequestDash { entity, .. } => {
            Some(entity.get())
        }
        _ => None,
    }
}
