#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that turns sampled player input into movement commands.

use chipway_core::{AxisPreference, Command, Direction, EntitySnapshot};
use tracing::trace;

/// Input sampled for a single tick.
///
/// Axis values are signs: positive `direction_x` points right and negative
/// `direction_y` points up, matching the grid's downward-growing rows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputFrame {
    /// Horizontal axis. Only the sign is used.
    pub direction_x: i32,
    /// Vertical axis. Only the sign is used.
    pub direction_y: i32,
    /// Whether the dash modifier is held.
    pub dash_held: bool,
    /// Whether the dash modifier went down this tick.
    pub dash_pressed: bool,
}

impl InputFrame {
    /// Frame without any input.
    pub const IDLE: Self = Self {
        direction_x: 0,
        direction_y: 0,
        dash_held: false,
        dash_pressed: false,
    };

    /// Frame pressing a single direction.
    #[must_use]
    pub const fn toward(direction: Direction) -> Self {
        let (direction_x, direction_y) = direction.delta();
        Self {
            direction_x,
            direction_y,
            dash_held: false,
            dash_pressed: false,
        }
    }

    /// Frame pressing a direction with the dash modifier held.
    #[must_use]
    pub const fn dashing(direction: Direction) -> Self {
        let (direction_x, direction_y) = direction.delta();
        Self {
            direction_x,
            direction_y,
            dash_held: true,
            dash_pressed: true,
        }
    }

    /// Frame pressing only the dash modifier, repeating the last direction.
    pub const DASH_REPEAT: Self = Self {
        direction_x: 0,
        direction_y: 0,
        dash_held: true,
        dash_pressed: true,
    };
}

/// Pure system translating input frames into player commands.
#[derive(Debug)]
pub struct PlayerInput {
    preference: AxisPreference,
    last_direction: Option<Direction>,
}

impl PlayerInput {
    /// Creates the system with the axis that wins diagonal input.
    #[must_use]
    pub const fn new(preference: AxisPreference) -> Self {
        Self {
            preference,
            last_direction: None,
        }
    }

    /// Direction of the most recent accepted input.
    #[must_use]
    pub const fn last_direction(&self) -> Option<Direction> {
        self.last_direction
    }

    /// Emits at most one step or dash command for the player.
    ///
    /// Input is ignored while the player is animating a move.
    pub fn handle(
        &mut self,
        frame: &InputFrame,
        player: Option<&EntitySnapshot>,
        out: &mut Vec<Command>,
    ) {
        let Some(player) = player else {
            return;
        };
        if player.is_moving() {
            return;
        }

        let mut direction =
            Direction::from_axes(frame.direction_x, frame.direction_y, self.preference);
        if direction.is_none() && frame.dash_held && frame.dash_pressed {
            direction = self.last_direction;
            trace!(?direction, "dash repeats last direction");
        }
        let Some(direction) = direction else {
            return;
        };
        self.last_direction = Some(direction);

        let entity = player.id;
        out.push(if frame.dash_held {
            Command::RequestDash { entity, direction }
        } else {
            Command::RequestStep { entity, direction }
        });
    }
}

impl Default for PlayerInput {
    fn default() -> Self {
        Self::new(AxisPreference::Horizontal)
    }
}
