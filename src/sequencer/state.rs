// Song state - Serializable snapshot of the sequencer
// The JSON shape is shared with saved songs, so field names are camelCase

use crate::error::SequencerResult;
use crate::sequencer::gate::GateSettings;
use crate::sequencer::pattern::{DEFAULT_PATTERN_LENGTH, GatePattern};
use crate::sequencer::step::{DrumKind, Step};
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_bpm() -> f64 {
    120.0
}

fn default_output_volume() -> f32 {
    0.7
}

fn default_length() -> usize {
    DEFAULT_PATTERN_LENGTH
}

/// Encoded drum samples loaded by the user, one optional blob per drum
///
/// Blobs are opaque to the sequencer (typically data URLs); decoding is
/// done by whoever owns the drum machine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrumSampleBlobs {
    pub kick: Option<String>,
    pub snare: Option<String>,
    pub hat: Option<String>,
}

impl DrumSampleBlobs {
    pub fn get(&self, drum: DrumKind) -> Option<&str> {
        match drum {
            DrumKind::Kick => self.kick.as_deref(),
            DrumKind::Snare => self.snare.as_deref(),
            DrumKind::Hat => self.hat.as_deref(),
        }
    }

    pub fn set(&mut self, drum: DrumKind, blob: Option<String>) {
        match drum {
            DrumKind::Kick => self.kick = blob,
            DrumKind::Snare => self.snare = blob,
            DrumKind::Hat => self.hat = blob,
        }
    }
}

/// Exported sequencer state
///
/// Every field has a default so partial or older song files still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequencerState {
    #[serde(default = "default_bpm")]
    pub bpm: f64,
    #[serde(default = "default_output_volume")]
    pub output_volume: f32,
    #[serde(default = "default_length")]
    pub length: usize,
    #[serde(default)]
    pub pattern: Vec<Step>,
    #[serde(default)]
    pub drum_sample_blobs: DrumSampleBlobs,
    #[serde(default)]
    pub tremolo_gate_pattern: GatePattern,
    #[serde(default)]
    pub parameter_gate_pattern: GatePattern,
    /// Tremolo gate shape
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tremolo_gate: Option<GateSettings>,
    /// Parameter gate shape
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_gate: Option<GateSettings>,
    /// Parameter gate destination name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_gate_destination: Option<String>,
}

impl SequencerState {
    /// Serialize to pretty JSON
    pub fn to_json(&self) -> SequencerResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse from JSON
    pub fn from_json(json_data: &str) -> SequencerResult<Self> {
        Ok(serde_json::from_str(json_data)?)
    }

    /// Write to a JSON file
    pub fn save_to_file(&self, path: &Path) -> SequencerResult<()> {
        std::fs::write(path, self.to_json()?)?;
        log::info!("Saved sequencer state to {}", path.display());
        Ok(())
    }

    /// Read from a JSON file
    pub fn load_from_file(path: &Path) -> SequencerResult<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }
}

impl Default for SequencerState {
    fn default() -> Self {
        Self {
            bpm: default_bpm(),
            output_volume: default_output_volume(),
            length: default_length(),
            pattern: Vec::new(),
            drum_sample_blobs: DrumSampleBlobs::default(),
            tremolo_gate_pattern: GatePattern::default(),
            parameter_gate_pattern: GatePattern::default(),
            tremolo_gate: None,
            parameter_gate: None,
            parameter_gate_destination: None,
        }
    }
}
