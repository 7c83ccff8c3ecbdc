// Audio-side plumbing shared between the sequencer and the render callback

pub mod parameters;

pub use parameters::{AtomicF32, DrumGains};
