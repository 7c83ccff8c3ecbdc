// Atomic parameters - Lock-free mixer values shared with the audio callback
// f32 values are stored as u32 bits so both sides can read and write without locks

use crate::sequencer::step::DrumKind;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Thread-safe f32 parameter
/// Clones share the same storage
#[derive(Clone)]
pub struct AtomicF32 {
    inner: Arc<AtomicU32>,
}

impl AtomicF32 {
    pub fn new(value: f32) -> Self {
        Self {
            inner: Arc::new(AtomicU32::new(value.to_bits())),
        }
    }

    pub fn set(&self, value: f32) {
        self.inner.store(value.to_bits(), Ordering::Relaxed);
    }

    /// Store a gain, clamped to [0, 1]; NaN is ignored
    pub fn set_gain(&self, value: f32) {
        if value.is_nan() {
            return;
        }
        self.set(value.clamp(0.0, 1.0));
    }

    pub fn get(&self) -> f32 {
        f32::from_bits(self.inner.load(Ordering::Relaxed))
    }
}

impl Default for AtomicF32 {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl std::fmt::Debug for AtomicF32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AtomicF32").field(&self.get()).finish()
    }
}

/// Gains the UI can move while drums are rendering
#[derive(Debug, Clone)]
pub struct DrumGains {
    pub master: AtomicF32,
    kick: AtomicF32,
    snare: AtomicF32,
    hat: AtomicF32,
}

impl DrumGains {
    pub fn new(master: f32) -> Self {
        Self {
            master: AtomicF32::new(master.clamp(0.0, 1.0)),
            kick: AtomicF32::new(1.0),
            snare: AtomicF32::new(0.8),
            hat: AtomicF32::new(0.5),
        }
    }

    pub fn drum(&self, drum: DrumKind) -> &AtomicF32 {
        match drum {
            DrumKind::Kick => &self.kick,
            DrumKind::Snare => &self.snare,
            DrumKind::Hat => &self.hat,
        }
    }

    /// Effective gain for one drum (drum gain × master)
    pub fn effective(&self, drum: DrumKind) -> f32 {
        self.drum(drum).get() * self.master.get()
    }
}

impl Default for DrumGains {
    fn default() -> Self {
        Self::new(0.7)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_value() {
        let a = AtomicF32::new(0.25);
        let b = a.clone();
        b.set(0.75);
        assert_eq!(a.get(), 0.75);
    }

    #[test]
    fn test_set_gain_clamps() {
        let gain = AtomicF32::new(0.5);
        gain.set_gain(3.0);
        assert_eq!(gain.get(), 1.0);
        gain.set_gain(-1.0);
        assert_eq!(gain.get(), 0.0);
        gain.set_gain(f32::NAN);
        assert_eq!(gain.get(), 0.0);
    }

    #[test]
    fn test_effective_gain() {
        let gains = DrumGains::new(0.5);
        gains.drum(DrumKind::Hat).set_gain(0.4);
        assert!((gains.effective(DrumKind::Hat) - 0.2).abs() < 1e-6);
        assert!((gains.effective(DrumKind::Kick) - 0.5).abs() < 1e-6);
    }
}
