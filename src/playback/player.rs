// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! A scheduler bound to its outputs.

use std::sync::Arc;

use tracing::debug;

use super::{FrameOutcome, Outputs, PlaybackScheduler, PlaybackStatus, RunToken};
use crate::recording::Recording;

/// Plays one loaded recording through an owned [`Outputs`] context.
///
/// Dropping a player that is still playing or paused stops it, so no
/// note is left hanging on the instrument.
pub struct Player {
    outputs: Outputs,
    scheduler: PlaybackScheduler,
    recording: Option<Arc<Recording>>,
    token: Option<RunToken>,
}

impl Player {
    /// Create a player with nothing loaded
    pub fn new(outputs: Outputs) -> Self {
        Self {
            outputs,
            scheduler: PlaybackScheduler::new(),
            recording: None,
            token: None,
        }
    }

    /// Replace the loaded recording, stopping the current one
    pub fn load(&mut self, recording: impl Into<Arc<Recording>>) {
        if self.scheduler.status() != PlaybackStatus::Idle {
            self.stop();
        }
        let recording = recording.into();
        debug!(
            "Loaded recording {:?} ({} messages)",
            recording.title,
            recording.messages.len()
        );
        self.recording = Some(recording);
    }

    /// Start the loaded recording from its lead-in, or resume if paused.
    ///
    /// Returns `false` when nothing is loaded.
    pub fn play(&mut self) -> bool {
        if self.scheduler.status() == PlaybackStatus::Paused {
            self.scheduler.resume();
            return true;
        }

        match self.recording.clone() {
            Some(recording) => {
                self.token = Some(self.scheduler.start(recording, &mut self.outputs));
                true
            }
            None => false,
        }
    }

    /// Freeze playback
    pub fn pause(&mut self) {
        self.scheduler.pause();
    }

    /// Continue after a pause
    pub fn resume(&mut self) {
        self.scheduler.resume();
    }

    /// Pause if playing, resume if paused
    pub fn toggle_pause(&mut self) {
        self.scheduler.toggle_pause();
    }

    /// Stop and silence every sink
    pub fn stop(&mut self) {
        self.token = None;
        self.scheduler.stop(&mut self.outputs);
    }

    /// Drive one frame at `now_ms` (monotonic milliseconds)
    pub fn tick(&mut self, now_ms: f64) -> FrameOutcome {
        let Some(token) = self.token else {
            return FrameOutcome::Cancelled;
        };

        let outcome = self.scheduler.frame(token, now_ms, &mut self.outputs);
        if !outcome.is_continue() {
            self.token = None;
        }
        outcome
    }

    /// Current state
    pub fn status(&self) -> PlaybackStatus {
        self.scheduler.status()
    }

    /// Seconds into the recording
    pub fn playback_time(&self) -> f64 {
        self.scheduler.playback_time()
    }

    /// Loaded recording
    pub fn recording(&self) -> Option<&Recording> {
        self.recording.as_deref()
    }

    /// Attached sinks, for swapping between frames
    pub fn outputs_mut(&mut self) -> &mut Outputs {
        &mut self.outputs
    }

    /// Receive the playback time after every frame
    pub fn set_time_listener(&mut self, listener: impl FnMut(f64) + 'static) {
        self.scheduler.set_time_listener(listener);
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        if self.scheduler.status() != PlaybackStatus::Idle {
            self.stop();
        }
    }
}
