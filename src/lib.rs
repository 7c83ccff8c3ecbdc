// Synthwave step sequencer - Library exports

pub mod audio;
pub mod config;
pub mod drums;
pub mod driver;
pub mod error;
pub mod messaging;
pub mod sequencer;

// Re-export commonly used types for convenience
pub use config::SequencerConfig;
pub use drums::{DrumKit, DrumMachine};
pub use driver::{MonotonicClock, SequencerDriver};
pub use error::{SequencerError, SequencerResult};
pub use messaging::{Command, SequencerEvent, create_command_channel, create_event_channel};
pub use sequencer::{
    AudioClock, DrumHost, DrumKind, EditMode, GateKind, GatePattern, GateSettings, ModulationHost,
    Pattern, PitchEntry, ScheduledParam, SequencerHost, SequencerState, Step, StepSequencer, Tempo,
    TransportState, VoiceHost, VoiceRequest,
};
