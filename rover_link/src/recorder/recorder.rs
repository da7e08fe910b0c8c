use std::time::Instant;

use tracing::debug;

use crate::errors::LinkError;
use crate::packets::{Recording, Step};
use crate::Command;

/// Commands held for no longer than this are operator key jitter and collapse
/// into the next held command instead of becoming a step.
pub const QUANTIZE_THRESHOLD_MS: u64 = 50;

/// Every recording ends with a synthetic STOP of this duration so replay
/// always brings the rover to rest, even if the operator forgot to stop.
pub const TRAILING_STOP_MS: u64 = 500;

/// Converts a live stream of sent commands into a replayable step sequence.
///
/// The recorder is a plain state machine: `Idle --start--> Recording
/// --observe*--> Recording --stop--> Idle`, producing a [`Recording`] on the
/// stop transition. It never touches the transport; the caller feeds it the
/// commands that were actually sent.
///
/// Wall-clock entry points (`start`, `observe`, `stop`) delegate to `*_at`
/// variants taking an explicit [`Instant`], which replay tooling and tests
/// use for deterministic timing.
#[derive(Debug)]
pub struct Recorder {
    active: bool,
    steps: Recording,
    last_command: Command,
    last_instant: Instant,
}

impl Recorder {
    pub fn new() -> Self {
        Self {
            active: false,
            steps: Vec::new(),
            last_command: Command::stop(),
            last_instant: Instant::now(),
        }
    }

    pub fn start(&mut self) -> Result<(), LinkError> {
        self.start_at(Instant::now())
    }

    /// Begins a new recording from the resting command. A recording already
    /// in progress is preserved and the call rejected with
    /// `AlreadyRecording`; the operator must stop the current take first.
    pub fn start_at(&mut self, now: Instant) -> Result<(), LinkError> {
        if self.active {
            return Err(LinkError::AlreadyRecording);
        }
        self.active = true;
        self.steps.clear();
        self.last_command = Command::stop();
        self.last_instant = now;
        Ok(())
    }

    pub fn observe(&mut self, command: Command) {
        self.observe_at(command, Instant::now());
    }

    /// Folds one sent command into the step sequence. The *previous* command
    /// becomes a step once it has been held past the quantization threshold;
    /// a faster change overwrites the pending command without emitting a
    /// step. The pending command and timestamp always advance, emitted or
    /// not. No-op while idle.
    pub fn observe_at(&mut self, command: Command, now: Instant) {
        if !self.active {
            return;
        }
        let elapsed_ms = now.duration_since(self.last_instant).as_millis() as u64;
        if elapsed_ms > QUANTIZE_THRESHOLD_MS {
            self.steps.push(Step::new(self.last_command.clone(), elapsed_ms));
        } else {
            debug!("collapsed {}ms tap of {}", elapsed_ms, self.last_command);
        }
        self.last_instant = now;
        self.last_command = command;
    }

    pub fn stop(&mut self) -> Result<Recording, LinkError> {
        self.stop_at(Instant::now())
    }

    /// Finalizes the recording: the still-pending command is flushed with
    /// its held duration (threshold does not apply here), the `{STOP, 500}`
    /// pad is appended, and the frozen sequence is returned. The recorder is
    /// left idle and empty. Stopping while idle is a non-fatal
    /// `NotRecording` and mutates nothing.
    pub fn stop_at(&mut self, now: Instant) -> Result<Recording, LinkError> {
        if !self.active {
            return Err(LinkError::NotRecording);
        }
        self.active = false;
        let held_ms = now.duration_since(self.last_instant).as_millis() as u64;
        self.steps.push(Step::new(self.last_command.clone(), held_ms));
        self.steps.push(Step::new(Command::stop(), TRAILING_STOP_MS));
        self.last_command = Command::stop();
        Ok(std::mem::take(&mut self.steps))
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Emitted steps so far, for the operator's progress line.
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}
