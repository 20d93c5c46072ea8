use std::{error::Error, fmt};

use chipway_core::Direction;
use chipway_system_input::InputFrame;

/// Glyph that leaves the player idle for one scripted move.
const IDLE_GLYPH: char = '.';
/// Glyph that dashes in the last direction moved.
const DASH_REPEAT_GLYPH: char = '!';

/// Scripted sequence of input frames replayed one move at a time.
///
/// The cursor only advances on ticks where the player is idle, so every glyph
/// maps to exactly one accepted or rejected move attempt.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct InputScript {
    frames: Vec<InputFrame>,
    cursor: usize,
}

impl InputScript {
    /// Parses a script such as `"RRd.!L"`.
    ///
    /// Upper-case `U`/`D`/`L`/`R` step, lower-case dash, `.` idles and `!`
    /// repeats the last direction as a dash. Whitespace is ignored.
    pub(crate) fn parse(source: &str) -> Result<Self, ScriptError> {
        let mut frames = Vec::new();
        for (index, glyph) in source.chars().enumerate() {
            if glyph.is_whitespace() {
                continue;
            }
            let frame = match glyph {
                IDLE_GLYPH => InputFrame::IDLE,
                DASH_REPEAT_GLYPH => InputFrame::DASH_REPEAT,
                _ => {
                    let direction = direction_for(glyph.to_ascii_uppercase())
                        .ok_or(ScriptError::UnknownGlyph { glyph, index })?;
                    if glyph.is_ascii_uppercase() {
                        InputFrame::toward(direction)
                    } else {
                        InputFrame::dashing(direction)
                    }
                }
            };
            frames.push(frame);
        }
        Ok(Self { frames, cursor: 0 })
    }

    /// Frame to feed this tick. Idle players consume the next scripted move.
    pub(crate) fn next_frame(&mut self, player_idle: bool) -> InputFrame {
        if !player_idle {
            return InputFrame::IDLE;
        }
        match self.frames.get(self.cursor) {
            Some(frame) => {
                self.cursor += 1;
                *frame
            }
            None => InputFrame::IDLE,
        }
    }

    /// Reports whether every scripted move was fed.
    pub(crate) fn is_finished(&self) -> bool {
        self.cursor >= self.frames.len()
    }
}

fn direction_for(glyph: char) -> Option<Direction> {
    match glyph {
        'U' => Some(Direction::Up),
        'D' => Some(Direction::Down),
        'L' => Some(Direction::Left),
        'R' => Some(Direction::Right),
        _ => None,
    }
}

/// Errors that can occur while parsing an input script.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ScriptError {
    /// The script contained a character with no meaning.
    UnknownGlyph {
        /// Offending character.
        glyph: char,
        /// Character offset within the script.
        index: usize,
    },
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownGlyph { glyph, index } => {
                write!(f, "unknown move '{glyph}' at position {index}")
            }
        }
    }
}

impl Error for ScriptError {}
