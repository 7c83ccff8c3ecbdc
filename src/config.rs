// Sequencer configuration
// Construction-time defaults and timing constants, loadable from RON

use crate::error::{SequencerError, SequencerResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration applied when a sequencer is created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    /// Initial pattern length in steps
    pub length: usize,
    /// Initial tempo (BPM)
    pub bpm: f64,
    /// Initial sequencer output volume (0.0 - 1.0)
    pub output_volume: f32,
    /// Time constant (seconds) for per-tick gate ramps
    pub gate_time_constant: f64,
    /// Time constant (seconds) for the ramp back to neutral on stop
    pub release_time_constant: f64,
    /// Velocity passed to the voice service for sequencer notes
    pub velocity: u8,
}

impl SequencerConfig {
    /// Parse a configuration from RON text
    pub fn from_ron_str(ron_data: &str) -> SequencerResult<Self> {
        let config: Self = ron::from_str(ron_data).map_err(|e| {
            SequencerError::Config(format!("Failed to parse RON configuration: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file in RON format
    pub fn load(path: &Path) -> SequencerResult<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_ron_str(&data)
    }

    /// Serialize to RON text
    pub fn to_ron_string(&self) -> SequencerResult<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()).map_err(|e| {
            SequencerError::Config(format!("Failed to serialize configuration: {}", e))
        })
    }

    /// Reject values the transport cannot run with
    pub fn validate(&self) -> SequencerResult<()> {
        crate::sequencer::pattern::validate_length(self.length)?;
        crate::sequencer::timeline::Tempo::new(self.bpm)?;
        if !(0.0..=1.0).contains(&self.output_volume) {
            return Err(SequencerError::Config(format!(
                "output_volume {} outside 0.0..=1.0",
                self.output_volume
            )));
        }
        if self.gate_time_constant <= 0.0 || self.release_time_constant <= 0.0 {
            return Err(SequencerError::Config(
                "time constants must be positive".to_string(),
            ));
        }
        if self.velocity > 127 {
            return Err(SequencerError::Config(format!(
                "velocity {} above 127",
                self.velocity
            )));
        }
        Ok(())
    }
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            length: 8,
            bpm: 120.0,
            output_volume: 0.7,
            gate_time_constant: 0.005,
            release_time_constant: 0.05,
            velocity: 100,
        }
    }
}
