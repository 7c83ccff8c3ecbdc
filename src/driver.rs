// Sequencer driver - Runs a sequencer on its own thread
// The thread is the only owner; the UI talks to it through ring buffers

use crate::messaging::{
    Command, CommandConsumer, EventProducer, Notification, NotificationCategory, SequencerEvent,
};
use crate::sequencer::engine::{SequencerHost, StepSequencer};
use crate::sequencer::transport::AudioClock;
use crate::error::{SequencerError, SequencerResult};
use ringbuf::traits::{Consumer, Producer};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Longest the driver sleeps between polls, even with nothing scheduled
/// Bounds the latency of commands
pub const MAX_POLL_INTERVAL: Duration = Duration::from_millis(2);

/// Audio clock backed by the monotonic system clock
///
/// For hosts without an audio device clock (tests, offline tools).
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioClock for MonotonicClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Handle to a sequencer running on a background thread
pub struct SequencerDriver<H: SequencerHost + Send + 'static> {
    handle: JoinHandle<StepSequencer<H>>,
}

impl<H: SequencerHost + Send + 'static> SequencerDriver<H> {
    /// Move `sequencer` onto a new thread
    pub fn spawn(
        sequencer: StepSequencer<H>,
        commands: CommandConsumer,
        events: EventProducer,
    ) -> std::io::Result<Self> {
        let handle = thread::Builder::new()
            .name("sequencer".to_string())
            .spawn(move || run(sequencer, commands, events))?;
        Ok(Self { handle })
    }

    /// Wait for the thread to exit (after `Command::Quit`) and get the sequencer back
    pub fn join(self) -> thread::Result<StepSequencer<H>> {
        self.handle.join()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

fn run<H: SequencerHost>(
    mut sequencer: StepSequencer<H>,
    mut commands: CommandConsumer,
    mut events: EventProducer,
) -> StepSequencer<H> {
    log::info!("Sequencer thread started");
    let mut last_step = sequencer.highlighted_step();
    let mut last_state = sequencer.transport_state();

    'run: loop {
        while let Some(command) = commands.try_pop() {
            if matches!(command, Command::Quit) {
                break 'run;
            }
            match apply(&mut sequencer, command) {
                Ok(Some(event)) => send(&mut events, event),
                Ok(None) => {}
                Err(err) => {
                    log::warn!("Sequencer command failed: {}", err);
                    send(
                        &mut events,
                        SequencerEvent::Notice(Notification::warning(
                            category_of(&err),
                            err.to_string(),
                        )),
                    );
                }
            }
        }

        sequencer.poll();

        let state = sequencer.transport_state();
        if state != last_state {
            last_state = state;
            send(&mut events, SequencerEvent::TransportChanged(state));
        }
        let step = sequencer.highlighted_step();
        if step != last_step {
            last_step = step;
            send(&mut events, SequencerEvent::StepChanged(step));
        }

        thread::sleep(sleep_until_deadline(&sequencer));
    }

    sequencer.stop();
    log::info!("Sequencer thread stopped");
    sequencer
}

fn sleep_until_deadline<H: SequencerHost>(sequencer: &StepSequencer<H>) -> Duration {
    let Some(deadline) = sequencer.next_deadline() else {
        return MAX_POLL_INTERVAL;
    };
    let wait = (deadline - sequencer.host().now()).max(0.0);
    Duration::from_secs_f64(wait).min(MAX_POLL_INTERVAL)
}

fn category_of(err: &SequencerError) -> NotificationCategory {
    match err {
        SequencerError::InvalidTempo(_) => NotificationCategory::Transport,
        SequencerError::Config(_)
        | SequencerError::Io(_)
        | SequencerError::Json(_) => NotificationCategory::Persistence,
        _ => NotificationCategory::Pattern,
    }
}

fn send(events: &mut EventProducer, event: SequencerEvent) {
    if events.try_push(event).is_err() {
        log::warn!("Sequencer event channel full, event dropped");
    }
}

/// Apply one command; some commands answer with an event
fn apply<H: SequencerHost>(
    sequencer: &mut StepSequencer<H>,
    command: Command,
) -> SequencerResult<Option<SequencerEvent>> {
    match command {
        Command::Start => sequencer.start(),
        Command::Stop => sequencer.stop(),
        Command::TogglePlay => sequencer.toggle_play(),
        Command::SetBpm(bpm) => sequencer.set_bpm(bpm)?,
        Command::Resize(length) => sequencer.resize(length)?,
        Command::SetStepDrum { index, drum, value } => sequencer.set_step_drum(index, drum, value)?,
        Command::SetStepVolume { index, volume } => sequencer.set_step_volume(index, volume)?,
        Command::ClearStep(index) => sequencer.clear_step(index)?,
        Command::ClearAll => sequencer.clear_all(),
        Command::Randomize => sequencer.randomize(),
        Command::SetGate { gate, tick, open } => sequencer.set_gate(gate, tick, open)?,
        Command::SetGateSettings { gate, settings } => sequencer.set_gate_settings(gate, settings),
        Command::SetParameterDestination(destination) => {
            sequencer.set_parameter_destination(destination)
        }
        Command::SetPitchPool(pool) => sequencer.set_pitch_pool(pool),
        Command::SetKeyboardOctave(octave) => sequencer.set_keyboard_octave(octave),
        Command::SelectStep(index) => sequencer.select_step(index)?,
        Command::ExitEditMode => sequencer.exit_edit_mode(),
        Command::KeyDown(pitch) => {
            sequencer.key_down(&pitch)?;
        }
        Command::KeyUp(note_name) => {
            sequencer.key_up(&note_name);
        }
        Command::SetOutputVolume(volume) => sequencer.set_output_volume(volume),
        Command::SetDrumSample { drum, blob } => sequencer.set_drum_sample(drum, blob),
        Command::Import(state) => sequencer.import_state(*state),
        Command::Export => {
            return Ok(Some(SequencerEvent::Exported(Box::new(
                sequencer.export_state(),
            ))));
        }
        Command::Quit => {}
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::{create_command_channel, create_event_channel};
    use crate::sequencer::gate::{GateTarget, ModulationHost};
    use crate::sequencer::step::DrumKind;
    use crate::sequencer::transport::TransportState;
    use crate::sequencer::voice::{DrumHost, VoiceHost, VoiceId, VoiceRequest};

    #[derive(Default)]
    struct ThreadHost {
        clock: MonotonicClock,
        drums: Vec<(DrumKind, f64)>,
    }

    impl AudioClock for ThreadHost {
        fn now(&self) -> f64 {
            self.clock.now()
        }
    }

    impl VoiceHost for ThreadHost {
        fn play_voice(&mut self, _request: &VoiceRequest) {}
        fn stop_voice(&mut self, _voice_id: VoiceId) {}
    }

    impl DrumHost for ThreadHost {
        fn trigger_drum(&mut self, drum: DrumKind, at: f64) {
            self.drums.push((drum, at));
        }
    }

    impl ModulationHost for ThreadHost {
        fn tremolo_target(&mut self) -> Option<GateTarget<'_>> {
            None
        }

        fn parameter_target(&mut self, _destination: &str) -> Option<GateTarget<'_>> {
            None
        }
    }

    impl SequencerHost for ThreadHost {}

    #[test]
    fn test_monotonic_clock_advances() {
        let clock = MonotonicClock::new();
        let first = clock.now();
        std::thread::sleep(Duration::from_millis(2));
        assert!(clock.now() > first);
        assert!(!clock.is_suspended());
    }

    #[test]
    fn test_driver_plays_and_reports_events() {
        let sequencer = StepSequencer::new(ThreadHost::default());
        let (mut commands, command_rx) = create_command_channel(64);
        let (event_tx, mut events) = create_event_channel(1024);
        let driver = SequencerDriver::spawn(sequencer, command_rx, event_tx).unwrap();

        // 999 BPM: 15 ms per tick, so a full hyper-measure takes 240 ms
        assert!(commands.try_push(Command::SetBpm(999.0)).is_ok());
        assert!(commands.try_push(Command::Start).is_ok());
        std::thread::sleep(Duration::from_millis(300));
        assert!(commands.try_push(Command::Export).is_ok());
        std::thread::sleep(Duration::from_millis(20));
        assert!(commands.try_push(Command::Quit).is_ok());

        let sequencer = driver.join().unwrap();
        assert!(!sequencer.is_playing());
        assert!(!sequencer.host().drums.is_empty());

        let mut saw_running = false;
        let mut saw_step = false;
        let mut exported = None;
        while let Some(event) = events.try_pop() {
            match event {
                SequencerEvent::TransportChanged(TransportState::Running) => saw_running = true,
                SequencerEvent::StepChanged(Some(_)) => saw_step = true,
                SequencerEvent::Exported(state) => exported = Some(state),
                _ => {}
            }
        }
        assert!(saw_running);
        assert!(saw_step);
        assert_eq!(exported.map(|state| state.bpm), Some(999.0));
    }

    #[test]
    fn test_failed_command_becomes_notice() {
        let sequencer = StepSequencer::new(ThreadHost::default());
        let (mut commands, command_rx) = create_command_channel(8);
        let (event_tx, mut events) = create_event_channel(64);
        let driver = SequencerDriver::spawn(sequencer, command_rx, event_tx).unwrap();

        assert!(commands.try_push(Command::ClearStep(99)).is_ok());
        assert!(commands.try_push(Command::Quit).is_ok());
        driver.join().unwrap();

        let notice = std::iter::from_fn(|| events.try_pop()).find_map(|event| match event {
            SequencerEvent::Notice(notification) => Some(notification),
            _ => None,
        });
        let notice = notice.unwrap();
        assert_eq!(notice.category, NotificationCategory::Pattern);
        assert!(notice.message.contains("99"));
    }
}
