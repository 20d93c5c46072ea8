#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Chipway puzzle engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that an actor advance a single cell in the specified direction.
    RequestStep {
        /// Identifier of the actor attempting to move.
        entity: EntityId,
        /// Direction of travel for the attempted step.
        direction: Direction,
    },
    /// Requests a multi-cell dash, falling back to a step when unavailable.
    RequestDash {
        /// Identifier of the actor attempting to dash.
        entity: EntityId,
        /// Direction of travel for the attempted dash.
        direction: Direction,
    },
    /// Toggles a switch as if the player had stepped onto it.
    TriggerSwitch {
        /// Identifier of the switch to toggle.
        switch: SwitchId,
    },
    /// Forces a gate into the provided state.
    SetGate {
        /// Identifier of the gate to update.
        gate: GateId,
        /// Whether the gate should be open after the command.
        open: bool,
    },
    /// Returns a spent or cooling teleporter to its armed state.
    ResetTeleporter {
        /// Identifier of the teleporter link to reset.
        link: TeleporterId,
    },
    /// Freezes or resumes simulated time.
    SetPaused {
        /// Whether the world should stop advancing.
        paused: bool,
    },
    /// Rebuilds the world from the level it was created with.
    ResetLevel,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that an actor claimed a new cell and began animating toward it.
    MoveStarted {
        /// Identifier of the entity that moved.
        entity: EntityId,
        /// Cell the entity occupied before the move.
        from: Cell,
        /// Cell the entity occupies once the move was accepted.
        to: Cell,
        /// Whether the move is a regular step or a dash.
        motion: MotionState,
    },
    /// Reports that a move animation reached its destination.
    MoveCompleted {
        /// Identifier of the entity that finished moving.
        entity: EntityId,
        /// Cell the entity now rests on.
        cell: Cell,
    },
    /// Reports that a step or dash request was refused.
    StepRejected {
        /// Identifier of the entity whose request failed.
        entity: EntityId,
        /// Direction that was requested.
        direction: Direction,
        /// Reason the request could not be honoured.
        reason: RejectReason,
    },
    /// Confirms that a pushable was displaced by the player.
    BlockPushed {
        /// Pushable that moved.
        pushable: Pushable,
        /// Cell the pushable left.
        from: Cell,
        /// Cell the pushable now occupies.
        to: Cell,
    },
    /// Announces that a destructible tile or entity was removed.
    DestructibleDestroyed {
        /// Cell that held the destructible.
        cell: Cell,
        /// World-space centre of the destroyed cell.
        position: Vec2,
    },
    /// Announces that a subject entered a teleporter and left its source.
    TeleportEntered {
        /// Teleporter link that fired.
        link: TeleporterId,
        /// Subject that was relayed.
        subject: RelaySubject,
        /// World-space centre of the source cell.
        position: Vec2,
    },
    /// Announces that a relayed subject appeared at the destination.
    TeleportExited {
        /// Teleporter link that fired.
        link: TeleporterId,
        /// Subject that was relayed.
        subject: RelaySubject,
        /// World-space centre of the destination cell.
        position: Vec2,
    },
    /// Reports a gate opening or closing.
    GateChanged {
        /// Identifier of the gate that changed.
        gate: GateId,
        /// Whether the gate is now open.
        open: bool,
    },
    /// Reports that a switch was toggled.
    SwitchToggled {
        /// Identifier of the switch.
        switch: SwitchId,
        /// Whether the switch is now on.
        on: bool,
    },
    /// Confirms that the player collected a pickup.
    PickupCollected {
        /// Identifier of the collected pickup.
        pickup: PickupId,
        /// Number of pickups collected so far.
        collected: u32,
        /// Number of pickups placed in the level.
        total: u32,
    },
    /// Fires once when every pickup in the level has been collected.
    AllPickupsCollected,
    /// Fires once when the player first rests on a win tile.
    GoalReached {
        /// Win tile the player reached.
        cell: Cell,
    },
    /// Fires once when both win conditions hold.
    LevelComplete,
    /// Reports that an enemy and the player collided.
    PlayerCaught {
        /// Enemy that caught the player.
        enemy: EntityId,
    },
    /// Asks the outer shell to load a scene after a delay.
    SceneChangeRequested {
        /// Name of the level to load.
        name: String,
        /// Real time to wait before loading.
        delay: Duration,
    },
    /// Reports that simulated time was frozen or resumed.
    PauseChanged {
        /// Whether the world is now paused.
        paused: bool,
    },
    /// Confirms that the world was rebuilt from its level description.
    LevelReset,
}

/// Reasons a movement request may be refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RejectReason {
    /// Simulated time is paused.
    Paused,
    /// The level already finished through a win or a catch.
    LevelOver,
    /// No entity with the provided identifier exists.
    UnknownEntity,
    /// The entity kind cannot initiate movement.
    NotAnActor,
    /// The entity is still animating a previous move.
    AlreadyMoving,
    /// The target cell holds a wall.
    Wall,
    /// The target cell holds a destructible.
    Destructible,
    /// The target cell is blocked for enemies only.
    KeyBlocked,
    /// The target cell is covered by a closed gate.
    GateClosed,
    /// Another body already claims the target cell.
    Occupied,
    /// The pushable ahead cannot be displaced.
    PushBlocked,
    /// The move closed the distance between an enemy and the player.
    Caught,
}

/// Outcome of a movement request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MoveOutcome {
    /// The move was accepted and the logical cell committed.
    Accepted,
    /// The move was refused and no state changed.
    Rejected,
}

impl MoveOutcome {
    /// Reports whether the request was accepted.
    #[must_use]
    pub const fn is_accepted(self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Motion phase of an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum MotionState {
    /// The entity rests on its logical cell.
    #[default]
    Idle,
    /// The entity animates a single-cell step.
    Moving,
    /// The entity animates a multi-cell dash.
    Dashing,
}

/// Something the player can push.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pushable {
    /// A moveable tile in the tile layer.
    Tile,
    /// A moveable entity.
    Entity(EntityId),
}

/// Subject a teleporter may relay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RelaySubject {
    /// A registered entity, such as the player or a moveable block.
    Entity(EntityId),
    /// The moveable tile resting on the link's source cell.
    MoveableTile,
}

/// Lifecycle of a teleporter link.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TeleportState {
    /// The link relays the next eligible subject.
    Armed,
    /// The link waits for its cooldown or for the relayed subject to leave.
    Cooling,
    /// A single-use link already fired.
    Spent,
}

/// Kinds of registered entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// The player-controlled actor.
    Player,
    /// An AI-controlled actor.
    Enemy,
    /// A block the player may push.
    Moveable,
    /// A static obstacle destroyed when a pushable lands on it.
    Destructible,
}

impl EntityKind {
    /// Reports whether the kind claims its cell exclusively.
    #[must_use]
    pub const fn is_body(self) -> bool {
        !matches!(self, Self::Destructible)
    }

    /// Reports whether the kind may request steps or dashes.
    #[must_use]
    pub const fn is_actor(self) -> bool {
        matches!(self, Self::Player | Self::Enemy)
    }
}

/// Kinds of tiles resolved at a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TileKind {
    /// Open floor.
    #[default]
    Empty,
    /// Impassable wall.
    Wall,
    /// Tile the player may push.
    Moveable,
    /// Tile destroyed when a pushable lands on it.
    Destructible,
    /// Goal tile.
    Win,
    /// Tile that blocks enemies only.
    KeyBlocking,
}

/// Cardinal movement directions. Rows grow downward, so `Up` decreases `y`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Toward decreasing rows.
    Up,
    /// Toward increasing rows.
    Down,
    /// Toward decreasing columns.
    Left,
    /// Toward increasing columns.
    Right,
}

impl Direction {
    /// All directions in the order AI fallbacks try them.
    pub const ALL: [Direction; 4] = [
        Direction::Right,
        Direction::Left,
        Direction::Up,
        Direction::Down,
    ];

    /// Unit offset of the direction in cell space.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }

    /// Direction pointing the opposite way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Reports whether the direction moves along the horizontal axis.
    #[must_use]
    pub const fn is_horizontal(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }

    /// Resolves raw axis input into at most one direction.
    ///
    /// Negative `y` points up. When both axes are held the preference decides
    /// which one wins.
    #[must_use]
    pub fn from_axes(x: i32, y: i32, preference: AxisPreference) -> Option<Self> {
        let horizontal = match x.signum() {
            1 => Some(Self::Right),
            -1 => Some(Self::Left),
            _ => None,
        };
        let vertical = match y.signum() {
            1 => Some(Self::Down),
            -1 => Some(Self::Up),
            _ => None,
        };
        match preference {
            AxisPreference::Horizontal => horizontal.or(vertical),
            AxisPreference::Vertical => vertical.or(horizontal),
        }
    }
}

/// Axis chosen when input holds both a horizontal and a vertical direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisPreference {
    /// Horizontal input wins.
    #[default]
    Horizontal,
    /// Vertical input wins.
    Vertical,
}

/// Integer grid coordinate. Serialises as an `[x, y]` pair.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct Cell {
    x: i32,
    y: i32,
}

impl Cell {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Column of the cell.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Row of the cell. Rows grow downward.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Cell adjacent in the provided direction.
    #[must_use]
    pub const fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self::new(self.x + dx, self.y + dy)
    }

    /// Computes the Manhattan distance between two cells.
    #[must_use]
    pub fn manhattan_distance(self, other: Cell) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl From<[i32; 2]> for Cell {
    fn from([x, y]: [i32; 2]) -> Self {
        Self::new(x, y)
    }
}

impl From<Cell> for [i32; 2] {
    fn from(cell: Cell) -> Self {
        [cell.x, cell.y]
    }
}

/// Conversion between continuous world positions and integer cells.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridSpace {
    origin: Vec2,
    cell_size: f32,
}

impl GridSpace {
    /// Creates a grid with the provided origin and a positive cell size.
    #[must_use]
    pub const fn new(origin: Vec2, cell_size: f32) -> Self {
        Self { origin, cell_size }
    }

    /// World position of the grid's top-left corner.
    #[must_use]
    pub const fn origin(&self) -> Vec2 {
        self.origin
    }

    /// Edge length of a cell in world units.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Cell containing the world position.
    #[must_use]
    pub fn world_to_cell(&self, position: Vec2) -> Cell {
        let local = (position - self.origin) / self.cell_size;
        Cell::new(local.x.floor() as i32, local.y.floor() as i32)
    }

    /// World-space centre of the cell.
    #[must_use]
    pub fn cell_center(&self, cell: Cell) -> Vec2 {
        let index = Vec2::new(cell.x() as f32, cell.y() as f32);
        self.origin + (index + Vec2::splat(0.5)) * self.cell_size
    }
}

impl Default for GridSpace {
    fn default() -> Self {
        Self::new(Vec2::ZERO, 1.0)
    }
}

/// Movement and timing constants shared by the world and its systems.
///
/// Times are in seconds. Every field may be omitted from a level file.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Duration of a player step.
    pub step_time: f32,
    /// Duration of an enemy step.
    pub enemy_step_time: f32,
    /// Duration of each cell travelled during a dash.
    pub dash_step_time: f32,
    /// Time after a dash before another dash is allowed.
    pub dash_cooldown: f32,
    /// Maximum number of cells a dash covers.
    pub dash_distance: u32,
    /// Axis that wins when input holds two directions.
    pub axis_preference: AxisPreference,
    /// Delay before the level reloads after the player is caught.
    pub catch_reload_delay: f32,
    /// Delay before the next level loads after completion.
    pub level_complete_delay: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            step_time: 0.12,
            enemy_step_time: 0.15,
            dash_step_time: 0.06,
            dash_cooldown: 2.0,
            dash_distance: 2,
            axis_preference: AxisPreference::Horizontal,
            catch_reload_delay: 0.1,
            level_complete_delay: 1.0,
        }
    }
}

/// What a chasing enemy does when the player is outside its radius.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutOfRangeBehavior {
    /// Stand still.
    #[default]
    Idle,
    /// Reserved: treated as idle.
    ReturnToStart,
    /// Reserved: treated as idle.
    Patrol,
}

/// Detection settings of a chasing enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct DetectionParameters {
    /// Manhattan radius within which the enemy chases. Zero chases everywhere.
    pub radius: u32,
    /// Behaviour while the player is out of range.
    pub out_of_range: OutOfRangeBehavior,
}

impl DetectionParameters {
    /// Reports whether a player at the given distance should be chased.
    #[must_use]
    pub const fn in_range(&self, distance: u32) -> bool {
        self.radius == 0 || distance <= self.radius
    }
}

/// AI behaviour attached to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnemyBehavior {
    /// Greedily closes the distance to the player.
    Chase(DetectionParameters),
    /// Walks in random directions.
    Wander,
}

impl Default for EnemyBehavior {
    fn default() -> Self {
        Self::Chase(DetectionParameters::default())
    }
}

/// Unique identifier assigned to a registered entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of a teleporter link.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeleporterId(u32);

impl TeleporterId {
    /// Creates a new teleporter identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of a gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GateId(u32);

impl GateId {
    /// Creates a new gate identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of a switch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SwitchId(u32);

impl SwitchId {
    /// Creates a new switch identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of a collectible pickup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PickupId(u32);

impl PickupId {
    /// Creates a new pickup identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Immutable representation of a single entity's state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EntitySnapshot {
    /// Identifier assigned to the entity.
    pub id: EntityId,
    /// Kind of the entity.
    pub kind: EntityKind,
    /// Logical cell the entity occupies.
    pub cell: Cell,
    /// Last direction the entity moved in.
    pub facing: Direction,
    /// Presented world position, interpolated while moving.
    pub position: Vec2,
    /// Current motion phase.
    pub motion: MotionState,
    /// Seconds until the entity may dash again.
    pub dash_cooldown: f32,
    /// AI behaviour for enemies.
    pub behavior: Option<EnemyBehavior>,
}

impl EntitySnapshot {
    /// Reports whether the entity is animating a move.
    #[must_use]
    pub const fn is_moving(&self) -> bool {
        !matches!(self.motion, MotionState::Idle)
    }
}

/// Read-only view over every registered entity ordered by identifier.
#[derive(Clone, Debug, Default)]
pub struct EntityView {
    snapshots: Vec<EntitySnapshot>,
}

impl EntityView {
    /// Builds a view from snapshots, sorting them by identifier.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EntitySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterates over all snapshots.
    pub fn iter(&self) -> impl Iterator<Item = &EntitySnapshot> {
        self.snapshots.iter()
    }

    /// Snapshot of the player, if one exists.
    #[must_use]
    pub fn player(&self) -> Option<&EntitySnapshot> {
        self.snapshots
            .iter()
            .find(|snapshot| snapshot.kind == EntityKind::Player)
    }

    /// Iterates over enemy snapshots.
    pub fn enemies(&self) -> impl Iterator<Item = &EntitySnapshot> {
        self.snapshots
            .iter()
            .filter(|snapshot| snapshot.kind == EntityKind::Enemy)
    }

    /// Snapshot of the entity with the provided identifier.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&EntitySnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Consumes the view and returns the owned snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EntitySnapshot> {
        self.snapshots
    }
}

/// Receiver for presentation side effects derived from world events.
///
/// Every method defaults to doing nothing so implementors only override the
/// cues they care about.
pub trait EffectHooks {
    /// A destructible was removed at the given position.
    fn on_destroyed(&mut self, _cell: Cell, _position: Vec2) {}

    /// A subject entered a teleporter at the given position.
    fn on_teleport_enter(&mut self, _position: Vec2) {}

    /// A subject left a teleporter at the given position.
    fn on_teleport_exit(&mut self, _position: Vec2) {}

    /// A pickup was collected. `progress` lies in `0.0..=1.0`.
    fn on_pickup_collected(&mut self, _pickup: PickupId, _progress: f32) {}

    /// The level was completed.
    fn on_level_complete(&mut self) {}

    /// The world asked for a scene to be loaded after `delay`.
    fn request_scene_change(&mut self, _name: &str, _delay: Duration) {}
}

/// Hooks implementation that ignores every cue.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoEffects;

impl EffectHooks for NoEffects {}

/// Forwards the presentation-relevant events to the provided hooks in order.
pub fn dispatch_effects<H>(events: &[Event], hooks: &mut H)
where
    H: EffectHooks + ?Sized,
{
    for event in events {
        match event {
            Event::DestructibleDestroyed { cell, position } => hooks.on_destroyed(*cell, *position),
            Event::TeleportEntered { position, .. } => hooks.on_teleport_enter(*position),
            Event::TeleportExited { position, .. } => hooks.on_teleport_exit(*position),
            Event::PickupCollected {
                pickup,
                collected,
                total,
            } => {
                let progress = if *total == 0 {
                    1.0
                } else {
                    *collected as f32 / *total as f32
                };
                hooks.on_pickup_collected(*pickup, progress);
            }
            Event::LevelComplete => hooks.on_level_complete(),
            Event::SceneChangeRequested { name, delay } => hooks.request_scene_change(name, *delay),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn up_decreases_row() {
        let cell = Cell::new(3, 3);
        assert_eq!(cell.step(Direction::Up), Cell::new(3, 2));
        assert_eq!(cell.step(Direction::Right), Cell::new(4, 3));
    }

    #[test]
    fn axis_preference_breaks_diagonal_input() {
        assert_eq!(
            Direction::from_axes(1, -1, AxisPreference::Horizontal),
            Some(Direction::Right)
        );
        assert_eq!(
            Direction::from_axes(1, -1, AxisPreference::Vertical),
            Some(Direction::Up)
        );
        assert_eq!(Direction::from_axes(0, 0, AxisPreference::Horizontal), None);
    }

    #[test]
    fn grid_space_round_trips_cell_centres() {
        let grid = GridSpace::new(Vec2::new(-2.0, 1.0), 0.5);
        for cell in [Cell::new(0, 0), Cell::new(-3, 7), Cell::new(12, -4)] {
            assert_eq!(grid.world_to_cell(grid.cell_center(cell)), cell);
        }
    }

    #[test]
    fn negative_positions_floor_toward_lower_cells() {
        let grid = GridSpace::default();
        assert_eq!(grid.world_to_cell(Vec2::new(-0.25, -0.75)), Cell::new(-1, -1));
    }

    #[test]
    fn detection_radius_zero_is_unbounded() {
        let unbounded = DetectionParameters::default();
        assert!(unbounded.in_range(500));
        let bounded = DetectionParameters {
            radius: 4,
            out_of_range: OutOfRangeBehavior::Idle,
        };
        assert!(bounded.in_range(4));
        assert!(!bounded.in_range(5));
    }

    #[test]
    fn tuning_fields_default_individually() {
        let tuning: Tuning = toml::from_str("dash_distance = 3").expect("tuning parses");
        assert_eq!(tuning.dash_distance, 3);
        assert_eq!(tuning.step_time, Tuning::default().step_time);
        assert_eq!(tuning.axis_preference, AxisPreference::Horizontal);
    }

    #[derive(Default)]
    struct Recorder {
        progress: Vec<f32>,
        scenes: Vec<String>,
        completions: u32,
    }

    impl EffectHooks for Recorder {
        fn on_pickup_collected(&mut self, _pickup: PickupId, progress: f32) {
            self.progress.push(progress);
        }

        fn on_level_complete(&mut self) {
            self.completions += 1;
        }

        fn request_scene_change(&mut self, name: &str, _delay: Duration) {
            self.scenes.push(name.to_owned());
        }
    }

    #[test]
    fn dispatch_forwards_presentation_events() {
        let events = vec![
            Event::PickupCollected {
                pickup: PickupId::new(0),
                collected: 1,
                total: 4,
            },
            Event::TimeAdvanced {
                dt: Duration::from_millis(16),
            },
            Event::LevelComplete,
            Event::SceneChangeRequested {
                name: "next".to_owned(),
                delay: Duration::from_secs(1),
            },
        ];
        let mut recorder = Recorder::default();
        dispatch_effects(&events, &mut recorder);
        assert_eq!(recorder.progress, vec![0.25]);
        assert_eq!(recorder.completions, 1);
        assert_eq!(recorder.scenes, vec!["next".to_owned()]);
    }
}
