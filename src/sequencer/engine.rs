// Step sequencer - Pattern store, transport and gates behind one owner
// The host supplies the audio clock, voices, drums and modulation targets

use crate::config::SequencerConfig;
use crate::error::{SequencerError, SequencerResult};
use crate::sequencer::gate::{GateEngine, GateSettings, ModulationHost, TickWindow};
use crate::sequencer::pattern::{GateKind, GatePattern, Pattern, validate_length};
use crate::sequencer::randomize::randomize_steps;
use crate::sequencer::state::{DrumSampleBlobs, SequencerState};
use crate::sequencer::step::{DrumKind, MAX_OCTAVE_SHIFT, MIN_OCTAVE_SHIFT, PitchEntry, Step};
use crate::sequencer::timeline::{Tempo, note_hold_seconds, step_at_tick};
use crate::sequencer::transport::{AudioClock, Transport, TransportState};
use crate::sequencer::voice::{DrumHost, VoiceHost, VoiceId, VoiceTrigger};
use rand::Rng;

/// Everything the sequencer needs from its surroundings
pub trait SequencerHost: AudioClock + VoiceHost + DrumHost + ModulationHost {
    /// Called whenever the playing step changes (`None` on stop)
    fn highlight_step(&mut self, _step: Option<usize>) {}
}

/// What piano-key input currently does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditMode {
    /// Keys play manual voices
    #[default]
    Off,
    /// Keys write into this step
    EditingStep(usize),
}

/// Outcome of a key press routed through the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDispatch {
    StepEdited(usize),
    VoiceStarted(VoiceId),
}

/// The step sequencer
///
/// Single owner of the pattern, both gate masks and the transport. Nothing
/// here runs on its own: the owner calls [`StepSequencer::poll`] often
/// enough (see [`StepSequencer::next_deadline`]) and every due release and
/// tick fires in order.
pub struct StepSequencer<H: SequencerHost> {
    host: H,
    config: SequencerConfig,
    pattern: Pattern,
    gates: GateEngine,
    tempo: Tempo,
    transport: Transport,
    voices: VoiceTrigger,
    edit_mode: EditMode,
    keyboard_octave: i8,
    pitch_pool: Vec<PitchEntry>,
    output_volume: f32,
    drum_samples: DrumSampleBlobs,
    highlighted_step: Option<usize>,
}

impl<H: SequencerHost> StepSequencer<H> {
    /// Create a sequencer with the default configuration
    pub fn new(host: H) -> Self {
        let config = SequencerConfig::default();
        Self {
            host,
            pattern: Pattern::default(),
            gates: GateEngine::new(),
            tempo: Tempo::default(),
            transport: Transport::new(),
            voices: VoiceTrigger::new(config.velocity),
            edit_mode: EditMode::Off,
            keyboard_octave: 0,
            pitch_pool: Vec::new(),
            output_volume: config.output_volume,
            drum_samples: DrumSampleBlobs::default(),
            highlighted_step: None,
            config,
        }
    }

    /// Create a sequencer from a configuration
    pub fn with_config(host: H, config: SequencerConfig) -> SequencerResult<Self> {
        config.validate()?;
        let mut sequencer = Self::new(host);
        sequencer.pattern = Pattern::new_default(config.length)?;
        sequencer.tempo = Tempo::new(config.bpm)?;
        sequencer.voices = VoiceTrigger::new(config.velocity);
        sequencer.output_volume = config.output_volume;
        sequencer.config = config;
        Ok(sequencer)
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    // Transport

    pub fn transport_state(&self) -> TransportState {
        self.transport.state()
    }

    pub fn is_playing(&self) -> bool {
        self.transport.state().is_playing()
    }

    /// Gate tick the next tick will run on
    pub fn gate_tick(&self) -> usize {
        self.transport.gate_tick()
    }

    /// Step most recently reached
    pub fn step_index(&self) -> usize {
        self.transport.step_index()
    }

    /// Step highlighted by playback
    pub fn highlighted_step(&self) -> Option<usize> {
        self.highlighted_step
    }

    pub fn tempo(&self) -> &Tempo {
        &self.tempo
    }

    /// Change the tempo; the pending tick keeps its time, the one after
    /// it uses the new period
    pub fn set_bpm(&mut self, bpm: f64) -> SequencerResult<()> {
        self.tempo = Tempo::new(bpm)?;
        log::debug!("Tempo set to {}", self.tempo);
        Ok(())
    }

    /// Start playback from step 0
    ///
    /// Does nothing if already playing. When the audio clock is suspended
    /// the first tick waits for it to resume.
    pub fn start(&mut self) {
        if self.transport.start(&mut self.host) {
            self.edit_mode = EditMode::Off;
            log::info!("Sequencer started at {}", self.tempo);
        }
    }

    /// Stop playback
    ///
    /// Cancels the pending tick (or a start waiting on resume), releases
    /// sounding sequencer notes and ramps gated parameters back to neutral.
    pub fn stop(&mut self) {
        if !self.transport.stop() {
            return;
        }
        let now = self.host.now();
        self.voices.release_all(&mut self.host);
        self.gates
            .release(&mut self.host, now, self.config.release_time_constant);
        self.highlighted_step = None;
        self.host.highlight_step(None);
        log::info!("Sequencer stopped");
    }

    pub fn toggle_play(&mut self) {
        if self.is_playing() {
            self.stop();
        } else {
            self.start();
        }
    }

    /// Fire every release and tick that is due at the host's current time
    /// Returns the number of ticks fired
    pub fn poll(&mut self) -> usize {
        if self.transport.check_resumed(&self.host) {
            log::debug!("Audio clock resumed, first tick fires now");
        }

        let now = self.host.now();
        self.voices.release_due(&mut self.host, now);

        let mut fired = 0;
        while let Some(window) = self.transport.take_due_tick(now, &self.tempo) {
            self.run_tick(&window);
            fired += 1;
        }

        self.voices.release_due(&mut self.host, now);
        fired
    }

    /// Earliest time at which `poll` has something to do
    pub fn next_deadline(&self) -> Option<f64> {
        let tick = match self.transport.state() {
            TransportState::Running => Some(
                self.transport
                    .next_tick_at()
                    .unwrap_or_else(|| self.host.now()),
            ),
            _ => None,
        };
        match (tick, self.voices.next_release_at()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn run_tick(&mut self, window: &TickWindow) {
        self.gates
            .process_tick(&mut self.host, window, self.config.gate_time_constant);

        let length = self.pattern.len();
        let Some(step_index) = step_at_tick(window.gate_tick, length) else {
            return;
        };

        self.transport.set_step_index(step_index);
        if self.highlighted_step != Some(step_index) {
            self.highlighted_step = Some(step_index);
            self.host.highlight_step(Some(step_index));
        }

        if let Some(step) = self.pattern.step(step_index) {
            let hold = note_hold_seconds(window.duration, length);
            self.voices
                .trigger_step(&mut self.host, step, window.time, hold);
        }
    }

    fn restart_if_running(&mut self) {
        if self.transport.state() == TransportState::Running {
            self.transport.restart();
            log::debug!("Transport restarted from tick 0");
        }
    }

    // Pattern store

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn length(&self) -> usize {
        self.pattern.len()
    }

    /// Change the number of steps
    ///
    /// Playback is stopped first. Steps are kept by index, new steps are
    /// empty, and the step index and edit cursor are reset.
    pub fn resize(&mut self, new_length: usize) -> SequencerResult<()> {
        validate_length(new_length)?;
        self.stop();
        self.pattern.resize(new_length)?;
        self.transport.set_step_index(0);
        self.edit_mode = EditMode::Off;
        log::debug!("Pattern resized to {} steps", new_length);
        Ok(())
    }

    pub fn set_step(&mut self, index: usize, step: Step) -> SequencerResult<()> {
        self.pattern.set_step(index, step)
    }

    pub fn set_step_drum(&mut self, index: usize, drum: DrumKind, value: bool) -> SequencerResult<()> {
        self.pattern.set_step_drum(index, drum, value)
    }

    pub fn toggle_step_drum(&mut self, index: usize, drum: DrumKind) -> SequencerResult<bool> {
        self.pattern.toggle_step_drum(index, drum)
    }

    pub fn set_step_volume(&mut self, index: usize, volume: f32) -> SequencerResult<()> {
        self.pattern.set_step_volume(index, volume)
    }

    pub fn clear_step(&mut self, index: usize) -> SequencerResult<()> {
        self.pattern.clear_step(index)
    }

    /// Reset the whole pattern to the default groove
    /// Confirmation is the caller's job; a running transport restarts from tick 0
    pub fn clear_all(&mut self) {
        self.pattern.clear_all();
        self.restart_if_running();
    }

    /// Randomize melodic content with the thread RNG
    pub fn randomize(&mut self) {
        self.randomize_with(&mut rand::thread_rng());
    }

    /// Randomize melodic content with a caller-supplied RNG
    ///
    /// Drum flags and volumes are untouched. A running transport restarts
    /// from tick 0 so the new notes are heard right away.
    pub fn randomize_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let applied = randomize_steps(
            self.pattern.steps_mut(),
            &self.pitch_pool,
            self.keyboard_octave,
            rng,
        );
        if applied.is_some() {
            self.restart_if_running();
        }
    }

    /// Pitches available to the randomizer, in pool order
    pub fn set_pitch_pool(&mut self, pool: Vec<PitchEntry>) {
        self.pitch_pool = pool;
    }

    pub fn pitch_pool(&self) -> &[PitchEntry] {
        &self.pitch_pool
    }

    // Gates

    pub fn gate_pattern(&self, gate: GateKind) -> &GatePattern {
        match gate {
            GateKind::Tremolo => &self.gates.tremolo_pattern,
            GateKind::Parameter => &self.gates.parameter_pattern,
        }
    }

    fn gate_pattern_mut(&mut self, gate: GateKind) -> &mut GatePattern {
        match gate {
            GateKind::Tremolo => &mut self.gates.tremolo_pattern,
            GateKind::Parameter => &mut self.gates.parameter_pattern,
        }
    }

    pub fn set_gate(&mut self, gate: GateKind, gate_tick: usize, open: bool) -> SequencerResult<()> {
        self.gate_pattern_mut(gate).set(gate_tick, open)
    }

    pub fn toggle_gate(&mut self, gate: GateKind, gate_tick: usize) -> SequencerResult<bool> {
        self.gate_pattern_mut(gate).toggle(gate_tick)
    }

    pub fn set_gate_pattern(&mut self, gate: GateKind, pattern: GatePattern) {
        *self.gate_pattern_mut(gate) = pattern;
    }

    pub fn gate_settings(&self, gate: GateKind) -> &GateSettings {
        match gate {
            GateKind::Tremolo => &self.gates.tremolo,
            GateKind::Parameter => &self.gates.parameter,
        }
    }

    /// Length and depth are clamped into 0.0..=1.0
    pub fn set_gate_settings(&mut self, gate: GateKind, settings: GateSettings) {
        let settings = settings.sanitized();
        match gate {
            GateKind::Tremolo => self.gates.tremolo = settings,
            GateKind::Parameter => self.gates.parameter = settings,
        }
    }

    /// Effect parameter driven by the parameter gate
    pub fn set_parameter_destination(&mut self, destination: Option<String>) {
        if self.gates.destination != destination {
            // Leave the old destination at its base value
            if self.transport.state() == TransportState::Running {
                let now = self.host.now();
                self.gates
                    .release(&mut self.host, now, self.config.release_time_constant);
            }
            self.gates.destination = destination;
        }
    }

    pub fn parameter_destination(&self) -> Option<&str> {
        self.gates.destination.as_deref()
    }

    // Edit mode and key dispatch

    pub fn edit_mode(&self) -> EditMode {
        self.edit_mode
    }

    /// Route subsequent key presses into `index`
    pub fn select_step(&mut self, index: usize) -> SequencerResult<()> {
        if index >= self.pattern.len() {
            return Err(SequencerError::StepOutOfRange {
                index,
                length: self.pattern.len(),
            });
        }
        self.edit_mode = EditMode::EditingStep(index);
        Ok(())
    }

    pub fn exit_edit_mode(&mut self) {
        self.edit_mode = EditMode::Off;
    }

    /// Octave shift used for key entry and randomized notes
    pub fn set_keyboard_octave(&mut self, octave: i8) {
        self.keyboard_octave = octave.clamp(MIN_OCTAVE_SHIFT, MAX_OCTAVE_SHIFT);
    }

    pub fn keyboard_octave(&self) -> i8 {
        self.keyboard_octave
    }

    /// Single entry point for piano-key presses
    ///
    /// In edit mode the pitch is written into the selected step; otherwise
    /// a manual voice is started.
    pub fn key_down(&mut self, pitch: &PitchEntry) -> SequencerResult<KeyDispatch> {
        match self.edit_mode {
            EditMode::EditingStep(index) => {
                self.pattern
                    .set_step_note(index, pitch, self.keyboard_octave)?;
                Ok(KeyDispatch::StepEdited(index))
            }
            EditMode::Off => {
                let now = self.host.now();
                let voice_id =
                    self.voices
                        .press_manual(&mut self.host, pitch, self.keyboard_octave, now);
                Ok(KeyDispatch::VoiceStarted(voice_id))
            }
        }
    }

    /// Release a manually played key
    pub fn key_up(&mut self, note_name: &str) -> Option<VoiceId> {
        self.voices.release_manual(&mut self.host, note_name)
    }

    // Mixer surfaces and samples

    pub fn output_volume(&self) -> f32 {
        self.output_volume
    }

    pub fn set_output_volume(&mut self, volume: f32) {
        self.output_volume = volume.clamp(0.0, 1.0);
    }

    pub fn drum_samples(&self) -> &DrumSampleBlobs {
        &self.drum_samples
    }

    pub fn set_drum_sample(&mut self, drum: DrumKind, blob: Option<String>) {
        self.drum_samples.set(drum, blob);
    }

    // Song persistence

    /// Snapshot for saving
    pub fn export_state(&self) -> SequencerState {
        SequencerState {
            bpm: self.tempo.bpm(),
            output_volume: self.output_volume,
            length: self.pattern.len(),
            pattern: self.pattern.steps().to_vec(),
            drum_sample_blobs: self.drum_samples.clone(),
            tremolo_gate_pattern: self.gates.tremolo_pattern,
            parameter_gate_pattern: self.gates.parameter_pattern,
            tremolo_gate: Some(self.gates.tremolo.clone()),
            parameter_gate: Some(self.gates.parameter.clone()),
            parameter_gate_destination: self.gates.destination.clone(),
        }
    }

    /// Load a saved snapshot
    ///
    /// The pattern is resized to the saved length before steps are copied
    /// in. Out-of-range values fall back to defaults instead of failing.
    pub fn import_state(&mut self, state: SequencerState) {
        let defaults = SequencerState::default();

        let tempo = Tempo::new(state.bpm).unwrap_or_else(|err| {
            log::warn!("Ignoring saved tempo: {}", err);
            Tempo::default()
        });
        let length = match validate_length(state.length) {
            Ok(()) => state.length,
            Err(err) => {
                log::warn!("Ignoring saved length: {}", err);
                defaults.length
            }
        };

        if let Err(err) = self.resize(length) {
            log::warn!("Failed to resize pattern on import: {}", err);
        }
        self.tempo = tempo;
        self.output_volume = if state.output_volume.is_finite() {
            state.output_volume.clamp(0.0, 1.0)
        } else {
            defaults.output_volume
        };

        let mut saved_steps = state.pattern.into_iter();
        for step in self.pattern.steps_mut() {
            let mut loaded = saved_steps.next().unwrap_or_else(Step::empty);
            loaded.octave_shift = loaded.octave_shift.clamp(MIN_OCTAVE_SHIFT, MAX_OCTAVE_SHIFT);
            *step = loaded;
        }

        self.drum_samples = state.drum_sample_blobs;
        self.gates.tremolo_pattern = state.tremolo_gate_pattern;
        self.gates.parameter_pattern = state.parameter_gate_pattern;
        // Gate fields missing from the song fall back to a fresh engine's values
        let fresh = GateEngine::new();
        self.gates.tremolo = state
            .tremolo_gate
            .map_or(fresh.tremolo, GateSettings::sanitized);
        self.gates.parameter = state
            .parameter_gate
            .map_or(fresh.parameter, GateSettings::sanitized);
        self.gates.destination = state.parameter_gate_destination;
        log::info!(
            "Imported sequencer state: {} steps at {}",
            self.pattern.len(),
            self.tempo
        );
    }
}
