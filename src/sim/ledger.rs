//! Temporal action ledger
//!
//! Stores the per-frame inputs of every round still represented on screen.
//! Unit `k` (0 = live player, higher = older echo) lives for
//! `fps * (num_echoes - k)` frames and replays the tail of its original
//! recording, so every echo finishes its run exactly when it disappears.
//!
//! Storage is `num_echoes / 2` rows of `(num_echoes + 1) * fps` frames. Row
//! `r` holds unit `r` at its front and unit `num_echoes - 1 - r` at its back:
//!
//! ```text
//! row 0 | unit 0 ............................. | unit N-1 |
//! row 1 | unit 1 ....................... | unit N-2 ........ |
//! ...
//! ```
//!
//! Rotating at a round boundary ages every window by one unit id and drops
//! the first `fps` frames of each recording, which the round controller has
//! already simulated during warm-up.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when sizing a ledger
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("echo count must be a positive even number, got {0}")]
    OddEchoCount(usize),

    #[error("frame rate and spawn rate must be non-zero")]
    ZeroRate,
}

/// One frame of recorded input
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Pointer offset from the screen center
    pub aim_x: f32,
    pub aim_y: f32,
    /// Hold position
    pub stop: bool,
    /// Pull the trigger
    pub fire: bool,
}

impl Action {
    pub fn new(aim: Vec2, stop: bool, fire: bool) -> Self {
        Self {
            aim_x: aim.x,
            aim_y: aim.y,
            stop,
            fire,
        }
    }

    pub fn aim(&self) -> Vec2 {
        Vec2::new(self.aim_x, self.aim_y)
    }

    /// `[aimX, aimY, stop, fire]`
    pub fn to_array(&self) -> [f32; 4] {
        [
            self.aim_x,
            self.aim_y,
            if self.stop { 1.0 } else { 0.0 },
            if self.fire { 1.0 } else { 0.0 },
        ]
    }

    pub fn from_array(v: [f32; 4]) -> Self {
        Self {
            aim_x: v[0],
            aim_y: v[1],
            stop: v[2] != 0.0,
            fire: v[3] != 0.0,
        }
    }
}

/// Rotating buffer of every live unit's recorded inputs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLedger {
    num_echoes: usize,
    /// Frames an echo loses per round
    fps: usize,
    rows: usize,
    width: usize,
    /// Row-major `rows x width` frames
    data: Vec<Action>,
}

impl ActionLedger {
    pub fn new(num_echoes: usize, per_second: usize, spawn_rate: usize) -> Result<Self, LedgerError> {
        if num_echoes == 0 || num_echoes % 2 != 0 {
            return Err(LedgerError::OddEchoCount(num_echoes));
        }
        if per_second == 0 || spawn_rate == 0 {
            return Err(LedgerError::ZeroRate);
        }
        let fps = spawn_rate * per_second;
        let rows = num_echoes / 2;
        let width = (num_echoes + 1) * fps;
        Ok(Self {
            num_echoes,
            fps,
            rows,
            width,
            data: vec![Action::default(); rows * width],
        })
    }

    pub fn num_echoes(&self) -> usize {
        self.num_echoes
    }

    pub fn fps(&self) -> usize {
        self.fps
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Frames in a full recorded round
    pub fn round_frames(&self) -> usize {
        self.num_echoes * self.fps
    }

    /// Frames unit `id` stays on screen; 0 for ids outside the ledger
    pub fn lifetime(&self, id: i32) -> usize {
        match usize::try_from(id) {
            Ok(k) if k < self.num_echoes => (self.num_echoes - k) * self.fps,
            _ => 0,
        }
    }

    pub fn is_on_screen(&self, id: i32, frame: usize) -> bool {
        frame < self.lifetime(id)
    }

    /// Replay window of unit `key`, indexed by frame of the current round
    pub fn window(&self, key: usize) -> &[Action] {
        if key >= self.num_echoes {
            return &[];
        }
        if key >= self.rows {
            let len = self.fps * (self.num_echoes - key);
            let row = self.num_echoes - key - 1;
            let end = (row + 1) * self.width;
            &self.data[end - len..end]
        } else {
            let len = self.fps * (self.num_echoes - key);
            let start = key * self.width;
            &self.data[start..start + len]
        }
    }

    /// Action of unit `id` at `frame`; idle for anything outside its window
    pub fn action(&self, id: i32, frame: usize) -> Action {
        usize::try_from(id)
            .ok()
            .and_then(|k| self.window(k).get(frame).copied())
            .unwrap_or_default()
    }

    /// Record the live player's input for `frame`
    pub fn save_action(&mut self, frame: usize, action: Action) {
        if frame >= self.round_frames() {
            log::warn!(
                "Dropping action for frame {} (round is {} frames)",
                frame,
                self.round_frames()
            );
            return;
        }
        self.data[frame] = action;
    }

    /// Age every window by one unit id
    ///
    /// 1. Each row's young window (back) moves up one row, losing its first
    ///    `fps` frames; the oldest unit falls off row 0.
    /// 2. The bottom row's front unit crosses to the young half: its frames
    ///    after the first `fps` seed the bottom row's back.
    /// 3. Each row's front window moves down one row, losing its first `fps`
    ///    frames.
    /// 4. Row 0's front is cleared for the next recording.
    pub fn rotate(&mut self) {
        let (fps, w) = (self.fps, self.width);

        for i in 1..self.rows {
            let len = fps * i;
            let src = i * w + w - len;
            self.data.copy_within(src..src + len, (i - 1) * w + w - len);
        }

        let bottom = (self.rows - 1) * w;
        let half = self.rows * fps;
        self.data
            .copy_within(bottom + fps..bottom + fps + half, bottom + w - half);

        for i in (1..self.rows).rev() {
            let len = fps * (2 * self.rows - i);
            let src = (i - 1) * w + fps;
            self.data.copy_within(src..src + len, i * w);
        }

        self.data[..w - fps].fill(Action::default());
    }
}
