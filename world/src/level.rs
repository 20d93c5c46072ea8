//! Static level descriptions loaded from TOML.
//!
//! The map is a list of equally long rows of glyphs:
//!
//! | glyph | meaning |
//! |-------|---------|
//! | `.` or space | empty floor |
//! | `#` | wall |
//! | `B` | moveable tile |
//! | `X` | destructible tile |
//! | `W` | win tile |
//! | `K` | key-blocking tile (blocks enemies only) |
//! | `P` | player |
//! | `E` | enemy |
//! | `M` | moveable entity |
//! | `D` | destructible entity |
//! | `C` | pickup |
//!
//! Teleporters, gates, switches and enemy parameters are linked by cell in
//! their own tables.

use chipway_core::{
    Cell, DetectionParameters, EnemyBehavior, EntityKind, GridSpace, OutOfRangeBehavior,
    TileKind, Tuning,
};
use glam::Vec2;
use serde::Deserialize;
use thiserror::Error;

/// Fatal problems that prevent a level from loading.
#[derive(Debug, Error)]
pub enum LevelError {
    /// The level file is not valid TOML or does not match the schema.
    #[error("failed to parse level: {0}")]
    Parse(#[from] toml::de::Error),
    /// The map has no rows.
    #[error("level map is empty")]
    EmptyMap,
    /// A row's length differs from the first row.
    #[error("map row {row} has {found} columns, expected {expected}")]
    RaggedRow {
        /// Zero-based row index.
        row: usize,
        /// Column count of the first row.
        expected: usize,
        /// Column count of the offending row.
        found: usize,
    },
    /// The map contains a glyph outside the legend.
    #[error("unknown map glyph {glyph:?} at ({x}, {y})")]
    UnknownGlyph {
        /// Offending character.
        glyph: char,
        /// Column of the glyph.
        x: i32,
        /// Row of the glyph.
        y: i32,
    },
    /// The map places no player.
    #[error("level has no player")]
    MissingPlayer,
    /// The map places more than one player.
    #[error("level places a second player at {second:?}, first at {first:?}")]
    DuplicatePlayer {
        /// Cell of the first player glyph.
        first: Cell,
        /// Cell of the second player glyph.
        second: Cell,
    },
    /// The cell size is zero, negative or not finite.
    #[error("cell size must be positive, got {0}")]
    InvalidCellSize(f32),
}

fn default_true() -> bool {
    true
}

fn default_teleport_cooldown() -> f32 {
    0.5
}

fn default_cell_size() -> f32 {
    1.0
}

/// Link between a teleporter source and its destination.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct TeleporterSpec {
    /// Cell that triggers the relay.
    pub source: Cell,
    /// Cell subjects are relayed to.
    pub destination: Cell,
    /// Whether the link fires only once.
    #[serde(default)]
    pub single_use: bool,
    /// Whether the relayed subject must leave the source before the link re-arms.
    #[serde(default = "default_true")]
    pub require_reentry: bool,
    /// Seconds the link waits after a relay.
    #[serde(default = "default_teleport_cooldown")]
    pub cooldown: f32,
    /// Whether moveable tiles and entities are relayed too.
    #[serde(default = "default_true")]
    pub allow_moveables: bool,
}

impl TeleporterSpec {
    /// Link with the default reuse policy.
    #[must_use]
    pub fn new(source: Cell, destination: Cell) -> Self {
        Self {
            source,
            destination,
            single_use: false,
            require_reentry: true,
            cooldown: default_teleport_cooldown(),
            allow_moveables: true,
        }
    }
}

/// Group of cells that open and close together.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct GateSpec {
    /// Cells covered by the gate.
    pub cells: Vec<Cell>,
    /// Whether the gate starts open.
    #[serde(default)]
    pub open: bool,
}

/// Floor switch that toggles gates, referenced by their table index.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SwitchSpec {
    /// Cell the player steps on to flip the switch.
    pub cell: Cell,
    /// Indices into the level's gate table.
    pub gates: Vec<u32>,
}

/// AI mode selected for an enemy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyMode {
    /// Greedy pursuit.
    #[default]
    Chase,
    /// Random wandering.
    Wander,
}

/// Parameters for the enemy placed at `cell`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct EnemySpec {
    /// Cell holding the enemy glyph.
    pub cell: Cell,
    /// AI mode.
    #[serde(default)]
    pub mode: EnemyMode,
    /// Detection radius for chasing enemies. Zero chases everywhere.
    #[serde(default)]
    pub radius: u32,
    /// Behaviour while the player is out of range.
    #[serde(default)]
    pub out_of_range: OutOfRangeBehavior,
}

impl EnemySpec {
    /// Behaviour this block configures.
    #[must_use]
    pub fn behavior(&self) -> EnemyBehavior {
        match self.mode {
            EnemyMode::Chase => EnemyBehavior::Chase(DetectionParameters {
                radius: self.radius,
                out_of_range: self.out_of_range,
            }),
            EnemyMode::Wander => EnemyBehavior::Wander,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LevelFile {
    name: String,
    #[serde(default)]
    next: Option<String>,
    #[serde(default = "default_cell_size")]
    cell_size: f32,
    #[serde(default)]
    origin: [f32; 2],
    map: Vec<String>,
    #[serde(default)]
    tuning: Tuning,
    #[serde(default)]
    teleporters: Vec<TeleporterSpec>,
    #[serde(default)]
    gates: Vec<GateSpec>,
    #[serde(default)]
    switches: Vec<SwitchSpec>,
    #[serde(default)]
    enemies: Vec<EnemySpec>,
}

/// Validated level description. A world keeps its level to support resets.
#[derive(Clone, Debug)]
pub struct Level {
    name: String,
    next: Option<String>,
    grid: GridSpace,
    width: u32,
    height: u32,
    tuning: Tuning,
    pub(crate) tiles: Vec<(Cell, TileKind)>,
    pub(crate) spawns: Vec<(EntityKind, Cell)>,
    pub(crate) pickups: Vec<Cell>,
    pub(crate) teleporters: Vec<TeleporterSpec>,
    pub(crate) gates: Vec<GateSpec>,
    pub(crate) switches: Vec<SwitchSpec>,
    pub(crate) enemies: Vec<EnemySpec>,
}

impl Level {
    /// Parses and validates a TOML level file.
    pub fn from_toml_str(source: &str) -> Result<Self, LevelError> {
        let file: LevelFile = toml::from_str(source)?;
        if !(file.cell_size.is_finite() && file.cell_size > 0.0) {
            return Err(LevelError::InvalidCellSize(file.cell_size));
        }
        let mut level = Self::from_rows(file.name, &file.map)?;
        level.next = file.next;
        level.grid = GridSpace::new(Vec2::from(file.origin), file.cell_size);
        level.tuning = file.tuning;
        level.teleporters = file.teleporters;
        level.gates = file.gates;
        level.switches = file.switches;
        level.enemies = file.enemies;
        Ok(level)
    }

    /// Builds a level from map rows with a unit grid and default tuning.
    pub fn from_rows<S>(name: impl Into<String>, rows: &[S]) -> Result<Self, LevelError>
    where
        S: AsRef<str>,
    {
        let Some(first) = rows.first() else {
            return Err(LevelError::EmptyMap);
        };
        let expected = first.as_ref().chars().count();
        let mut level = Self {
            name: name.into(),
            next: None,
            grid: GridSpace::default(),
            width: expected as u32,
            height: rows.len() as u32,
            tuning: Tuning::default(),
            tiles: Vec::new(),
            spawns: Vec::new(),
            pickups: Vec::new(),
            teleporters: Vec::new(),
            gates: Vec::new(),
            switches: Vec::new(),
            enemies: Vec::new(),
        };

        let mut player: Option<Cell> = None;
        for (row_index, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            let found = row.chars().count();
            if found != expected {
                return Err(LevelError::RaggedRow {
                    row: row_index,
                    expected,
                    found,
                });
            }
            for (column_index, glyph) in row.chars().enumerate() {
                let cell = Cell::new(column_index as i32, row_index as i32);
                match glyph {
                    '.' | ' ' => {}
                    '#' => level.tiles.push((cell, TileKind::Wall)),
                    'B' => level.tiles.push((cell, TileKind::Moveable)),
                    'X' => level.tiles.push((cell, TileKind::Destructible)),
                    'W' => level.tiles.push((cell, TileKind::Win)),
                    'K' => level.tiles.push((cell, TileKind::KeyBlocking)),
                    'P' => {
                        if let Some(first) = player {
                            return Err(LevelError::DuplicatePlayer {
                                first,
                                second: cell,
                            });
                        }
                        player = Some(cell);
                        level.spawns.push((EntityKind::Player, cell));
                    }
                    'E' => level.spawns.push((EntityKind::Enemy, cell)),
                    'M' => level.spawns.push((EntityKind::Moveable, cell)),
                    'D' => level.spawns.push((EntityKind::Destructible, cell)),
                    'C' => level.pickups.push(cell),
                    other => {
                        return Err(LevelError::UnknownGlyph {
                            glyph: other,
                            x: cell.x(),
                            y: cell.y(),
                        })
                    }
                }
            }
        }

        if player.is_none() {
            return Err(LevelError::MissingPlayer);
        }
        Ok(level)
    }

    /// Adds a teleporter link.
    #[must_use]
    pub fn with_teleporter(mut self, spec: TeleporterSpec) -> Self {
        self.teleporters.push(spec);
        self
    }

    /// Adds a gate. Gates are identified by insertion order.
    #[must_use]
    pub fn with_gate(mut self, spec: GateSpec) -> Self {
        self.gates.push(spec);
        self
    }

    /// Adds a switch. Switches are identified by insertion order.
    #[must_use]
    pub fn with_switch(mut self, spec: SwitchSpec) -> Self {
        self.switches.push(spec);
        self
    }

    /// Configures the enemy placed at the given cell.
    #[must_use]
    pub fn with_enemy(mut self, spec: EnemySpec) -> Self {
        self.enemies.push(spec);
        self
    }

    /// Replaces the tuning constants.
    #[must_use]
    pub fn with_tuning(mut self, tuning: Tuning) -> Self {
        self.tuning = tuning;
        self
    }

    /// Sets the level loaded after completion.
    #[must_use]
    pub fn with_next(mut self, next: impl Into<String>) -> Self {
        self.next = Some(next.into());
        self
    }

    /// Name of the level.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the level loaded after completion, if any.
    #[must_use]
    pub fn next(&self) -> Option<&str> {
        self.next.as_deref()
    }

    /// Mapping between world positions and cells.
    #[must_use]
    pub const fn grid(&self) -> GridSpace {
        self.grid
    }

    /// Tuning constants used by the level.
    #[must_use]
    pub const fn tuning(&self) -> Tuning {
        self.tuning
    }

    /// Map width and height in cells.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Reports whether the cell lies inside the map.
    #[must_use]
    pub fn contains(&self, cell: Cell) -> bool {
        cell.x() >= 0
            && cell.y() >= 0
            && (cell.x() as u32) < self.width
            && (cell.y() as u32) < self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_map_and_tables() {
        let level = Level::from_toml_str(
            r######"
            name = "demo"
            next = "demo-2"
            cell_size = 2.0
            origin = [1.0, -1.0]
            map = [
                "#####",
                "#P.E#",
                "#C.W#",
                "#####",
            ]

            [tuning]
            dash_distance = 3

            [[teleporters]]
            source = [2, 1]
            destination = [2, 2]
            single_use = true

            [[enemies]]
            cell = [3, 1]
            mode = "wander"
            "######,
        )
        .expect("level parses");

        assert_eq!(level.name(), "demo");
        assert_eq!(level.next(), Some("demo-2"));
        assert_eq!(level.dimensions(), (5, 4));
        assert_eq!(level.grid().cell_size(), 2.0);
        assert_eq!(level.tuning().dash_distance, 3);
        assert_eq!(level.tuning().step_time, Tuning::default().step_time);
        assert_eq!(level.pickups, vec![Cell::new(1, 2)]);
        assert!(level.teleporters[0].single_use);
        assert!(level.teleporters[0].require_reentry);
        assert_eq!(level.enemies[0].behavior(), EnemyBehavior::Wander);
    }

    #[test]
    fn rejects_unknown_glyph() {
        let error = Level::from_rows("bad", &["P?"]).expect_err("glyph is unknown");
        assert!(matches!(
            error,
            LevelError::UnknownGlyph {
                glyph: '?',
                x: 1,
                y: 0
            }
        ));
    }

    #[test]
    fn rejects_ragged_rows() {
        let error = Level::from_rows("bad", &["P..", ".."]).expect_err("rows differ");
        assert!(matches!(
            error,
            LevelError::RaggedRow {
                row: 1,
                expected: 3,
                found: 2
            }
        ));
    }

    #[test]
    fn requires_exactly_one_player() {
        assert!(matches!(
            Level::from_rows("none", &["..."]),
            Err(LevelError::MissingPlayer)
        ));
        assert!(matches!(
            Level::from_rows("two", &["P.P"]),
            Err(LevelError::DuplicatePlayer { .. })
        ));
    }

    #[test]
    fn rejects_non_positive_cell_size() {
        let error = Level::from_toml_str("name = \"x\"\ncell_size = 0.0\nmap = [\"P\"]\n")
            .expect_err("cell size is zero");
        assert!(matches!(error, LevelError::InvalidCellSize(size) if size == 0.0));
    }

    #[test]
    fn malformed_toml_is_reported() {
        assert!(matches!(
            Level::from_toml_str("name = "),
            Err(LevelError::Parse(_))
        ));
    }
}
