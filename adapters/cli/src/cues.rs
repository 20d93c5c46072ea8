//! Logging stand-in for the audio and scene services.

use std::time::Duration;

use chipway_core::{Cell, EffectHooks, PickupId};
use glam::Vec2;
use tracing::info;

/// Effect hooks that log a named cue for every presentation effect.
#[derive(Debug, Default)]
pub(crate) struct AudioCues {
    played: usize,
    scene_request: Option<(String, Duration)>,
}

impl AudioCues {
    /// Number of cues played so far.
    pub(crate) fn played(&self) -> usize {
        self.played
    }

    /// Latest scene change the world asked for.
    pub(crate) fn scene_request(&self) -> Option<&(String, Duration)> {
        self.scene_request.as_ref()
    }

    fn play(&mut self, cue: &'static str, position: Option<Vec2>) {
        self.played += 1;
        match position {
            Some(position) => info!(cue, x = position.x, y = position.y, "cue"),
            None => info!(cue, "cue"),
        }
    }
}

impl EffectHooks for AudioCues {
    fn on_destroyed(&mut self, _cell: Cell, position: Vec2) {
        self.play("break", Some(position));
    }

    fn on_teleport_enter(&mut self, position: Vec2) {
        self.play("teleport_in", Some(position));
    }

    fn on_teleport_exit(&mut self, position: Vec2) {
        self.play("teleport_out", Some(position));
    }

    fn on_pickup_collected(&mut self, pickup: PickupId, progress: f32) {
        info!(pickup = pickup.get(), progress, "chip collected");
        self.play("chip", None);
    }

    fn on_level_complete(&mut self) {
        self.play("level_complete", None);
    }

    fn request_scene_change(&mut self, name: &str, delay: Duration) {
        info!(scene = name, delay_ms = delay.as_millis() as u64, "scene change requested");
        self.scene_request = Some((name.to_owned(), delay));
    }
}
