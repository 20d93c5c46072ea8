#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Chipway.
//!
//! The world owns the tile layer, the entity registry, teleporters, gates and
//! the win latches. Every mutation arrives as a [`Command`] through [`apply`]
//! or through one of the per-tick phase functions, and every observable change
//! is reported as an [`Event`].

mod destruction;
mod gates;
mod level;
mod motion;
mod movement;
mod registry;
mod teleport;
mod tiles;
mod win;

use std::{collections::BTreeMap, time::Duration};

use chipway_core::{
    Cell, Command, EnemyBehavior, EntityId, EntityKind, Event, GateId, GridSpace, SwitchId,
    TeleporterId, TileKind, Tuning,
};
use tracing::{error, info, warn};

pub use level::{EnemyMode, EnemySpec, GateSpec, Level, LevelError, SwitchSpec, TeleporterSpec};
pub use motion::TileSlide;
pub use tiles::TileLayer;
pub use win::WinProgress;

use destruction::DestructionTracker;
use gates::{Gate, GateBoard, Switch};
use registry::EntityRegistry;
use teleport::TeleportLink;
use win::WinCondition;

/// Whether the level is still being played.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LevelStatus {
    /// The player may still move.
    Playing,
    /// Both win conditions were met.
    Complete,
    /// An enemy caught the player.
    Caught,
}

/// Represents the authoritative Chipway world state.
#[derive(Clone, Debug)]
pub struct World {
    level: Level,
    grid: GridSpace,
    tuning: Tuning,
    tiles: TileLayer,
    registry: EntityRegistry,
    slides: Vec<TileSlide>,
    destruction: DestructionTracker,
    teleporters: BTreeMap<TeleporterId, TeleportLink>,
    gates: GateBoard,
    win: WinCondition,
    status: LevelStatus,
    paused: bool,
    tick_index: u64,
}

impl World {
    /// Builds a world from a validated level.
    ///
    /// Misconfigured components are disabled and logged instead of failing
    /// the whole level.
    #[must_use]
    pub fn new(level: Level) -> Self {
        let grid = level.grid();
        let mut tiles = TileLayer::default();
        for (cell, kind) in &level.tiles {
            tiles.set(*cell, *kind);
        }

        let mut behaviors = BTreeMap::<_, EnemyBehavior>::new();
        for spec in &level.enemies {
            let has_enemy = level
                .spawns
                .iter()
                .any(|(kind, cell)| *kind == EntityKind::Enemy && *cell == spec.cell);
            if !has_enemy {
                warn!(cell = ?spec.cell, "enemy parameters without an enemy, ignoring");
                continue;
            }
            let _ = behaviors.insert(spec.cell, spec.behavior());
        }

        let mut registry = EntityRegistry::default();
        for (kind, cell) in &level.spawns {
            let behavior = (*kind == EntityKind::Enemy)
                .then(|| behaviors.get(cell).copied().unwrap_or_default());
            if registry
                .spawn(*kind, *cell, grid.cell_center(*cell), behavior)
                .is_none()
            {
                warn!(?kind, ?cell, "cell already claimed, skipping spawn");
            }
        }

        let mut gates = GateBoard::default();
        for (index, spec) in level.gates.iter().enumerate() {
            if let Some(outside) = spec.cells.iter().find(|cell| !level.contains(**cell)) {
                warn!(gate = index, cell = ?outside, "gate cell lies outside the map");
            }
            gates.add_gate(
                GateId::new(index as u32),
                Gate {
                    cells: spec.cells.clone(),
                    open: spec.open,
                },
            );
        }
        for (index, spec) in level.switches.iter().enumerate() {
            let targets: Vec<GateId> = spec.gates.iter().map(|gate| GateId::new(*gate)).collect();
            if let Some(unknown) = targets.iter().find(|gate| !gates.has_gate(**gate)) {
                error!(
                    switch = index,
                    gate = unknown.get(),
                    "switch references an unknown gate, disabling it"
                );
                continue;
            }
            gates.add_switch(
                SwitchId::new(index as u32),
                Switch {
                    cell: spec.cell,
                    on: false,
                    gates: targets,
                },
            );
        }

        let mut teleporters = BTreeMap::new();
        for (index, spec) in level.teleporters.iter().enumerate() {
            let valid = level.contains(spec.source)
                && level.contains(spec.destination)
                && spec.source != spec.destination;
            let link = if valid {
                TeleportLink::new(spec)
            } else {
                error!(
                    teleporter = index,
                    source = ?spec.source,
                    destination = ?spec.destination,
                    "teleporter endpoints are invalid, disabling it"
                );
                TeleportLink::disabled(spec)
            };
            let _ = teleporters.insert(TeleporterId::new(index as u32), link);
        }

        let win = WinCondition::new(level.pickups.iter().copied());
        info!(
            level = level.name(),
            entities = level.spawns.len(),
            pickups = level.pickups.len(),
            "level loaded"
        );

        let mut world = Self {
            grid,
            tuning: level.tuning(),
            tiles,
            registry,
            slides: Vec::new(),
            destruction: DestructionTracker::default(),
            teleporters,
            gates,
            win,
            status: LevelStatus::Playing,
            paused: false,
            tick_index: 0,
            level,
        };
        world.destruction = DestructionTracker::new(world.pushable_cells());
        world
    }

    fn advance(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        if self.paused {
            return;
        }
        self.tick_index = self.tick_index.saturating_add(1);
        out_events.push(Event::TimeAdvanced { dt });

        let elapsed = dt.as_secs_f32();
        let arrived = self.advance_motions(elapsed);
        self.advance_teleporters(elapsed);
        for id in arrived {
            if let Some(entity) = self.registry.get(id) {
                out_events.push(Event::MoveCompleted {
                    entity: id,
                    cell: entity.cell,
                });
            }
            self.handle_arrival(id, out_events);
        }
    }

    /// Applies the effects of the player coming to rest on its cell, after
    /// those of any cells a dash carried it across.
    pub(crate) fn handle_arrival(&mut self, id: EntityId, out_events: &mut Vec<Event>) {
        let Some(entity) = self.registry.get_mut(id) else {
            return;
        };
        let passed_over = std::mem::take(&mut entity.passed_over);
        if entity.kind != EntityKind::Player {
            return;
        }
        let cell = entity.cell;

        for crossed in passed_over {
            self.enter_cell(crossed, out_events);
        }
        self.enter_cell(cell, out_events);
        if self.tiles.floor(cell) == TileKind::Win && self.win.reach_goal() {
            out_events.push(Event::GoalReached { cell });
        }
    }

    /// Collects the pickup and flips the switch plate on a cell the player
    /// entered.
    fn enter_cell(&mut self, cell: Cell, out_events: &mut Vec<Event>) {
        if let Some(collection) = self.win.collect_at(cell) {
            out_events.push(Event::PickupCollected {
                pickup: collection.pickup,
                collected: collection.collected,
                total: collection.total,
            });
            if collection.completes_set {
                out_events.push(Event::AllPickupsCollected);
            }
        }
        if let Some(switch) = self.gates.switch_at(cell) {
            let _ = self.trigger_switch(switch, out_events);
        }
    }

    /// Flips a switch and every gate it controls.
    pub fn trigger_switch(&mut self, switch: SwitchId, out_events: &mut Vec<Event>) -> bool {
        let Some(flip) = self.gates.flip(switch) else {
            warn!(switch = switch.get(), "unknown switch");
            return false;
        };
        out_events.push(Event::SwitchToggled {
            switch,
            on: flip.on,
        });
        for (gate, open) in flip.gates {
            out_events.push(Event::GateChanged { gate, open });
        }
        true
    }

    /// Opens or closes a gate. Returns `true` when the state changed.
    pub fn set_gate(&mut self, gate: GateId, open: bool, out_events: &mut Vec<Event>) -> bool {
        match self.gates.set_open(gate, open) {
            Some(open) => {
                out_events.push(Event::GateChanged { gate, open });
                true
            }
            None => false,
        }
    }

    fn catch_player(&mut self, enemy: EntityId, out_events: &mut Vec<Event>) {
        if self.status != LevelStatus::Playing {
            return;
        }
        self.status = LevelStatus::Caught;
        info!(enemy = enemy.get(), "player caught");
        out_events.push(Event::PlayerCaught { enemy });
        out_events.push(Event::SceneChangeRequested {
            name: self.level.name().to_owned(),
            delay: seconds(self.tuning.catch_reload_delay),
        });
    }

    fn check_completion(&mut self, out_events: &mut Vec<Event>) {
        if self.status != LevelStatus::Playing || !self.win.try_complete() {
            return;
        }
        self.status = LevelStatus::Complete;
        info!(level = self.level.name(), "level complete");
        out_events.push(Event::LevelComplete);
        if let Some(next) = self.level.next() {
            out_events.push(Event::SceneChangeRequested {
                name: next.to_owned(),
                delay: seconds(self.tuning.level_complete_delay),
            });
        }
    }
}

fn seconds(value: f32) -> Duration {
    Duration::try_from_secs_f32(value.max(0.0)).unwrap_or(Duration::ZERO)
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => world.advance(dt, out_events),
        Command::RequestStep { entity, direction } => {
            let _ = world.request_step(entity, direction, out_events);
        }
        Command::RequestDash { entity, direction } => {
            let _ = world.request_dash(entity, direction, out_events);
        }
        Command::TriggerSwitch { switch } => {
            let _ = world.trigger_switch(switch, out_events);
        }
        Command::SetGate { gate, open } => {
            let _ = world.set_gate(gate, open, out_events);
        }
        Command::ResetTeleporter { link } => {
            let _ = world.reset_teleporter(link);
        }
        Command::SetPaused { paused } => {
            if world.paused != paused {
                world.paused = paused;
                out_events.push(Event::PauseChanged { paused });
            }
        }
        Command::ResetLevel => {
            *world = World::new(world.level.clone());
            out_events.push(Event::LevelReset);
        }
    }
}

/// Destroys destructibles under pushables that arrived since the previous scan.
pub fn resolve_destruction(world: &mut World, out_events: &mut Vec<Event>) {
    if !world.paused {
        world.resolve_destruction(out_events);
    }
}

/// Relays eligible subjects through every armed teleporter.
pub fn resolve_teleports(world: &mut World, out_events: &mut Vec<Event>) {
    if !world.paused {
        world.resolve_teleports(out_events);
    }
}

/// Fires `LevelComplete` once both win conditions hold.
pub fn resolve_win_check(world: &mut World, out_events: &mut Vec<Event>) {
    if !world.paused {
        world.check_completion(out_events);
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use chipway_core::{
        Cell, Direction, EntityId, EntitySnapshot, EntityView, GateId, GridSpace, PickupId,
        SwitchId, TeleportState, TeleporterId, Tuning,
    };

    use super::{Level, LevelStatus, TileLayer, TileSlide, WinProgress, World};

    /// Level the world was built from.
    #[must_use]
    pub fn level(world: &World) -> &Level {
        &world.level
    }

    /// Mapping between world positions and cells.
    #[must_use]
    pub fn grid_space(world: &World) -> GridSpace {
        world.grid
    }

    /// Tuning constants in effect.
    #[must_use]
    pub fn tuning(world: &World) -> Tuning {
        world.tuning
    }

    /// Provides read-only access to the tile layer.
    #[must_use]
    pub fn tile_layer(world: &World) -> &TileLayer {
        &world.tiles
    }

    /// Captures a read-only view of every entity.
    #[must_use]
    pub fn entity_view(world: &World) -> EntityView {
        EntityView::from_snapshots(world.registry.iter().map(|entity| entity.snapshot()).collect())
    }

    /// Snapshot of the player, if present.
    #[must_use]
    pub fn player(world: &World) -> Option<EntitySnapshot> {
        world.registry.player().map(|entity| entity.snapshot())
    }

    /// Reports whether a step request would currently be accepted or end in a
    /// catch.
    #[must_use]
    pub fn can_step(world: &World, entity: EntityId, direction: Direction) -> bool {
        world.can_step(entity, direction)
    }

    /// Moveable tiles still sliding after a push.
    #[must_use]
    pub fn tile_slides(world: &World) -> &[TileSlide] {
        &world.slides
    }

    /// Snapshot of every teleporter link.
    #[must_use]
    pub fn teleporters(world: &World) -> Vec<TeleporterSnapshot> {
        world
            .teleporters
            .iter()
            .map(|(id, link)| TeleporterSnapshot {
                id: *id,
                source: link.source,
                destination: link.destination,
                state: link.state(),
            })
            .collect()
    }

    /// Snapshot of every gate.
    #[must_use]
    pub fn gates(world: &World) -> Vec<GateSnapshot> {
        world
            .gates
            .gates()
            .map(|(id, gate)| GateSnapshot {
                id,
                cells: gate.cells.clone(),
                open: gate.open,
            })
            .collect()
    }

    /// Whether the gate is open, or `None` for unknown gates.
    #[must_use]
    pub fn gate_open(world: &World, gate: GateId) -> Option<bool> {
        world.gates.gate(gate).map(|gate| gate.open)
    }

    /// Snapshot of every active switch.
    #[must_use]
    pub fn switches(world: &World) -> Vec<SwitchSnapshot> {
        world
            .gates
            .switches()
            .map(|(id, switch)| SwitchSnapshot {
                id,
                cell: switch.cell,
                on: switch.on,
            })
            .collect()
    }

    /// Pickups not yet collected, in cell order.
    #[must_use]
    pub fn remaining_pickups(world: &World) -> Vec<(Cell, PickupId)> {
        world.win.remaining().collect()
    }

    /// Progress toward completion.
    #[must_use]
    pub fn win_progress(world: &World) -> WinProgress {
        world.win.progress()
    }

    /// Whether the level is still being played.
    #[must_use]
    pub fn status(world: &World) -> LevelStatus {
        world.status
    }

    /// Whether simulated time is frozen.
    #[must_use]
    pub fn is_paused(world: &World) -> bool {
        world.paused
    }

    /// Number of ticks that advanced time.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Read-only description of a teleporter link.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct TeleporterSnapshot {
        /// Identifier of the link.
        pub id: TeleporterId,
        /// Cell that triggers the relay.
        pub source: Cell,
        /// Cell subjects arrive on.
        pub destination: Cell,
        /// Current lifecycle state.
        pub state: TeleportState,
    }

    /// Read-only description of a gate.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct GateSnapshot {
        /// Identifier of the gate.
        pub id: GateId,
        /// Cells covered by the gate.
        pub cells: Vec<Cell>,
        /// Whether the gate is open.
        pub open: bool,
    }

    /// Read-only description of a switch.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct SwitchSnapshot {
        /// Identifier of the switch.
        pub id: SwitchId,
        /// Cell the switch sits on.
        pub cell: Cell,
        /// Whether the switch is on.
        pub on: bool,
    }
}
