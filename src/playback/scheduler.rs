// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Frame-driven playback state machine.
//!
//! `Idle -> Playing -> (Paused <-> Playing) -> Idle`. A run starts one
//! second before the first note on and ends three seconds after the last
//! message. Each call to [`PlaybackScheduler::frame`] dispatches every
//! message whose time has been reached since the previous frame, so each
//! message goes out exactly once and in order.

use std::sync::Arc;

use tracing::{debug, info};

use super::Outputs;
use crate::recording::{Message, MessageType, Recording};

/// Silence before the first note on, in seconds
pub const LEAD_IN_SECONDS: f64 = 1.0;

/// Time played past the final message, in seconds
pub const TAIL_SECONDS: f64 = 3.0;

/// Scheduler state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    Idle,
    Playing,
    Paused,
}

/// Identifies one run; frames carrying a stale token are ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunToken(u64);

/// Result of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Still playing (or paused)
    Continue { dispatched: usize },
    /// Reached the end of the tail and stopped
    Finished { dispatched: usize },
    /// The token does not belong to the current run
    Cancelled,
}

impl FrameOutcome {
    /// Messages sent during the frame
    pub fn dispatched(&self) -> usize {
        match self {
            FrameOutcome::Continue { dispatched } | FrameOutcome::Finished { dispatched } => {
                *dispatched
            }
            FrameOutcome::Cancelled => 0,
        }
    }

    /// Check if the driver should keep calling `frame`
    pub fn is_continue(&self) -> bool {
        matches!(self, FrameOutcome::Continue { .. })
    }
}

/// State of the active run
struct Run {
    token: RunToken,
    recording: Arc<Recording>,
    /// Index of the next message to dispatch
    cursor: usize,
    /// Pedal held when playback begins
    start_pedal: bool,
    /// Time of the last message; the run ends a tail after it
    end_time: f64,
    /// Timestamp that maps to the start offset; advanced while paused
    start_ms: Option<f64>,
    last_ms: Option<f64>,
    paused: bool,
    pedal_sent: bool,
}

/// Replays one recording at a time into an [`Outputs`] context
pub struct PlaybackScheduler {
    run: Option<Run>,
    next_token: u64,
    /// Seconds into the recording where the current or last run starts
    first_note_offset: f64,
    playback_time: f64,
    time_listener: Option<Box<dyn FnMut(f64)>>,
}

impl Default for PlaybackScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Lead-in start and initial pedal state for a message stream.
///
/// The pedal state only covers messages before the start, which the run
/// skips; pedal events inside the lead-in are dispatched as recorded.
fn start_point(messages: &[Message]) -> (f64, bool) {
    let Some(first_note) = messages.iter().find(|m| m.kind == MessageType::NoteOn) else {
        return (0.0, false);
    };

    let offset = (first_note.time - LEAD_IN_SECONDS).max(0.0);
    let skipped = messages.partition_point(|m| m.time < offset);
    let pedal = messages[..skipped]
        .iter()
        .rev()
        .find(|m| m.kind.is_pedal())
        .map_or(false, |m| m.kind == MessageType::PedalOn);

    (offset, pedal)
}

impl PlaybackScheduler {
    /// Create an idle scheduler
    pub fn new() -> Self {
        Self {
            run: None,
            next_token: 0,
            first_note_offset: 0.0,
            playback_time: 0.0,
            time_listener: None,
        }
    }

    /// Receive the playback time after every frame and state change
    pub fn set_time_listener(&mut self, listener: impl FnMut(f64) + 'static) {
        self.time_listener = Some(Box::new(listener));
    }

    /// Remove the playback time listener
    pub fn clear_time_listener(&mut self) {
        self.time_listener = None;
    }

    fn publish(&mut self) {
        let time = self.playback_time;
        if let Some(listener) = self.time_listener.as_mut() {
            listener(time);
        }
    }

    /// Current state
    pub fn status(&self) -> PlaybackStatus {
        match &self.run {
            None => PlaybackStatus::Idle,
            Some(run) if run.paused => PlaybackStatus::Paused,
            Some(_) => PlaybackStatus::Playing,
        }
    }

    /// Seconds into the recording
    pub fn playback_time(&self) -> f64 {
        self.playback_time
    }

    /// Where the current or last run started, in seconds
    pub fn first_note_offset(&self) -> f64 {
        self.first_note_offset
    }

    /// Recording of the active run
    pub fn recording(&self) -> Option<&Arc<Recording>> {
        self.run.as_ref().map(|run| &run.recording)
    }

    /// Check if `token` identifies the active run
    pub fn is_current(&self, token: RunToken) -> bool {
        self.run.as_ref().is_some_and(|run| run.token == token)
    }

    /// Begin playing `recording`, stopping any active run first
    pub fn start(&mut self, recording: Arc<Recording>, outputs: &mut Outputs) -> RunToken {
        if self.run.is_some() {
            self.stop(outputs);
        }

        let (offset, start_pedal) = start_point(&recording.messages);
        let cursor = recording.messages.partition_point(|m| m.time < offset);
        let end_time = recording.messages.last().map_or(0.0, |m| m.time);

        self.next_token += 1;
        let token = RunToken(self.next_token);

        info!(
            "Playing {} messages over {:.1}s from {:.3}s",
            recording.messages.len(),
            recording.duration(),
            offset
        );

        self.run = Some(Run {
            token,
            recording,
            cursor,
            start_pedal,
            end_time,
            start_ms: None,
            last_ms: None,
            paused: false,
            pedal_sent: false,
        });
        self.first_note_offset = offset;
        self.playback_time = offset;
        self.publish();

        token
    }

    /// Advance the run identified by `token` to `now_ms`
    pub fn frame(&mut self, token: RunToken, now_ms: f64, outputs: &mut Outputs) -> FrameOutcome {
        let offset = self.first_note_offset;
        let Some(run) = self.run.as_mut().filter(|run| run.token == token) else {
            return FrameOutcome::Cancelled;
        };

        // Clamp a clock that went backwards
        let now_ms = run.last_ms.map_or(now_ms, |last| now_ms.max(last));
        let elapsed_ms = run.last_ms.map_or(0.0, |last| now_ms - last);
        let start_ms = *run.start_ms.get_or_insert(now_ms);
        run.last_ms = Some(now_ms);

        if run.paused {
            run.start_ms = Some(start_ms + elapsed_ms);
            self.publish();
            return FrameOutcome::Continue { dispatched: 0 };
        }

        let total = offset + (now_ms - start_ms) / 1000.0;
        let mut dispatched = 0;

        if !run.pedal_sent {
            run.pedal_sent = true;
            if run.start_pedal {
                outputs.dispatch(&Message::pedal_on(offset));
                dispatched += 1;
            }
        }

        let messages = &run.recording.messages;
        while let Some(message) = messages.get(run.cursor) {
            if message.time > total {
                break;
            }
            outputs.dispatch(message);
            run.cursor += 1;
            dispatched += 1;
        }

        let finished = total >= run.end_time + TAIL_SECONDS;

        self.playback_time = total;
        self.publish();

        if finished {
            debug!("Reached end of recording at {:.3}s", total);
            self.stop(outputs);
            FrameOutcome::Finished { dispatched }
        } else {
            FrameOutcome::Continue { dispatched }
        }
    }

    /// Freeze playback time; frames keep arriving but dispatch nothing
    pub fn pause(&mut self) {
        if let Some(run) = self.run.as_mut() {
            if !run.paused {
                run.paused = true;
                debug!("Paused at {:.3}s", self.playback_time);
            }
        }
    }

    /// Continue from the frozen playback time
    pub fn resume(&mut self) {
        if let Some(run) = self.run.as_mut() {
            if run.paused {
                run.paused = false;
                debug!("Resumed at {:.3}s", self.playback_time);
            }
        }
    }

    /// Pause if playing, resume if paused
    pub fn toggle_pause(&mut self) {
        match self.status() {
            PlaybackStatus::Playing => self.pause(),
            PlaybackStatus::Paused => self.resume(),
            PlaybackStatus::Idle => {}
        }
    }

    /// End the active run, rewind to its start and silence every sink
    pub fn stop(&mut self, outputs: &mut Outputs) {
        if self.run.take().is_some() {
            info!("Playback stopped");
        }
        self.playback_time = self.first_note_offset;
        outputs.silence();
        self.publish();
    }
}
