use crate::clock::Millis;
use crate::config;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FadeClock {
    horizon_ms: Millis,
}

impl Default for FadeClock {
    fn default() -> Self {
        Self::new(config::DECAY_HORIZON_MS)
    }
}

impl FadeClock {
    pub fn new(horizon_ms: Millis) -> Self {
        assert!(horizon_ms > 0, "decay horizon must be positive");
        Self { horizon_ms }
    }

    /// `1.0` right after an edit, falling linearly to `0.0` at the horizon.
    /// A `last_active` in the future (clock skew) reads as fully opaque.
    pub fn opacity(&self, now: Millis, last_active: Millis) -> f32 {
        let elapsed = (now - last_active).max(0);
        if elapsed >= self.horizon_ms {
            return 0.0;
        }
        (1.0 - elapsed as f64 / self.horizon_ms as f64) as f32
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FadePhase {
    Resting,
    Drifting,
    Fading,
    Releasing,
}

impl FadePhase {
    pub fn from_opacity(opacity: f32) -> Self {
        if opacity > 0.75 {
            FadePhase::Resting
        } else if opacity > 0.50 {
            FadePhase::Drifting
        } else if opacity > 0.25 {
            FadePhase::Fading
        } else {
            FadePhase::Releasing
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FadePhase::Resting => "resting",
            FadePhase::Drifting => "drifting",
            FadePhase::Fading => "fading",
            FadePhase::Releasing => "releasing",
        }
    }
}
