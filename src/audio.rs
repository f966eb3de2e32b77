//! Fire-and-forget sound routing
//!
//! The simulation never plays sounds itself. It asks an `AudioManager`, which
//! applies volume and mute settings and forwards to whatever `AudioSink` the
//! frontend plugged in.

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Live player fires
    Shoot,
    /// An echo or enemy fires
    ShootQuiet,
    /// Live player takes damage
    Hurt,
    /// Reward collected
    Coin,
}

impl SoundEffect {
    /// Volume the effect is mixed at before master/sfx scaling
    pub fn base_volume(self) -> f32 {
        match self {
            SoundEffect::Shoot | SoundEffect::ShootQuiet => 0.1,
            SoundEffect::Hurt => 0.4,
            SoundEffect::Coin => 0.5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SoundEffect::Shoot => "shoot",
            SoundEffect::ShootQuiet => "shoot-quiet",
            SoundEffect::Hurt => "hurt",
            SoundEffect::Coin => "coin",
        }
    }

    /// Shots share one channel: only one plays per frame
    fn is_shot(self) -> bool {
        matches!(self, SoundEffect::Shoot | SoundEffect::ShootQuiet)
    }
}

/// Backend that actually produces sound
pub trait AudioSink {
    fn play(&mut self, effect: SoundEffect, volume: f32);
}

/// Discards everything
#[derive(Debug, Default)]
pub struct NullSink;

impl AudioSink for NullSink {
    fn play(&mut self, _effect: SoundEffect, _volume: f32) {}
}

/// Logs each sound at debug level; used by the headless runner
#[derive(Debug, Default)]
pub struct LogSink;

impl AudioSink for LogSink {
    fn play(&mut self, effect: SoundEffect, volume: f32) {
        log::debug!("sound {} at {:.2}", effect.as_str(), volume);
    }
}

/// Audio manager for the game
pub struct AudioManager {
    sink: Box<dyn AudioSink>,
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
    /// A shot already played this frame
    shot_channel_busy: bool,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new(Box::new(NullSink))
    }
}

impl AudioManager {
    pub fn new(sink: Box<dyn AudioSink>) -> Self {
        Self {
            sink,
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
            shot_channel_busy: false,
        }
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Get effective volume
    fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    /// Free the shot channel; call once per simulated frame
    pub fn begin_frame(&mut self) {
        self.shot_channel_busy = false;
    }

    /// Play a sound effect
    pub fn play(&mut self, effect: SoundEffect) {
        let vol = self.effective_volume() * effect.base_volume();
        if vol <= 0.0 {
            return;
        }
        if effect.is_shot() {
            if self.shot_channel_busy {
                return;
            }
            self.shot_channel_busy = true;
        }
        self.sink.play(effect, vol);
    }
}
