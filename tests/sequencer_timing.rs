// Integration tests for transport timing and gate scheduling
// Drives the sequencer with a fake clock and checks what reaches the host

mod common;

use common::{CUTOFF_DESTINATION, Event, TestHost, run_until};
use synthwave_seq::SequencerConfig;
use synthwave_seq::sequencer::{DrumKind, GateKind, GatePattern, GateSettings, StepSequencer};

/// Sequencer with the default groove laid out over `length` steps
fn with_length(length: usize) -> StepSequencer<TestHost> {
    let config = SequencerConfig {
        length,
        ..SequencerConfig::default()
    };
    StepSequencer::with_config(TestHost::default(), config).unwrap()
}

#[test]
fn test_default_pattern_at_120_bpm() {
    let mut sequencer = StepSequencer::new(TestHost::default());
    sequencer.start();
    run_until(&mut sequencer, 3.99);

    let host = sequencer.host();
    let expected_hats: Vec<f64> = (0..16).map(|k| k as f64 * 0.25).collect();
    assert_eq!(host.drum_times(DrumKind::Hat), expected_hats);
    assert_eq!(host.drum_times(DrumKind::Kick), vec![0.0, 2.0]);
    assert_eq!(host.drum_times(DrumKind::Snare), vec![1.0, 3.0]);

    // Each step is visited once per hyper-measure, in order
    let expected_highlights: Vec<Option<usize>> = (0..2).flat_map(|_| (0..8).map(Some)).collect();
    assert_eq!(host.highlights(), expected_highlights);
}

#[test]
fn test_divisor_lengths_visit_every_step_once() {
    for length in [1usize, 2, 4, 16] {
        let mut sequencer = with_length(length);
        sequencer.start();
        run_until(&mut sequencer, 1.99);

        let step_seconds = 2.0 / length as f64;
        let expected: Vec<f64> = (0..length).map(|k| k as f64 * step_seconds).collect();
        assert_eq!(
            sequencer.host().drum_times(DrumKind::Hat),
            expected,
            "length {}",
            length
        );
    }
}

#[test]
fn test_non_divisor_length_only_fires_first_step() {
    let mut sequencer = with_length(3);
    sequencer.start();
    run_until(&mut sequencer, 3.99);

    let host = sequencer.host();
    assert_eq!(host.drum_times(DrumKind::Hat), vec![0.0, 2.0]);
    assert_eq!(host.drum_times(DrumKind::Kick), vec![0.0, 2.0]);
    assert!(host.drum_times(DrumKind::Snare).is_empty());
    assert_eq!(host.highlights(), vec![Some(0)]);
}

#[test]
fn test_long_pattern_reaches_even_steps_only() {
    let mut sequencer = with_length(32);
    sequencer.start();
    run_until(&mut sequencer, 1.99);

    let host = sequencer.host();
    assert_eq!(host.drum_times(DrumKind::Hat).len(), 16);
    // Snare sits on step 16, reached at tick 8
    assert_eq!(host.drum_times(DrumKind::Snare), vec![1.0]);
    assert!(
        host.highlights()
            .iter()
            .all(|step| step.is_some_and(|s| s % 2 == 0))
    );
}

#[test]
fn test_tempo_change_applies_from_next_period() {
    let mut sequencer = StepSequencer::new(TestHost::default());
    sequencer.start();
    sequencer.poll();

    sequencer.host_mut().time = 0.05;
    sequencer.set_bpm(60.0).unwrap();
    run_until(&mut sequencer, 0.4);

    // Tick 1 keeps its 0.125 slot, tick 2 follows one 60 BPM period later
    assert_eq!(sequencer.host().drum_times(DrumKind::Hat), vec![0.0, 0.375]);
}

#[test]
fn test_late_poll_catches_up_on_logical_times() {
    let mut sequencer = StepSequencer::new(TestHost::default());
    sequencer.start();
    sequencer.poll();

    sequencer.host_mut().time = 0.3;
    assert_eq!(sequencer.poll(), 2);
    assert_eq!(sequencer.host().drum_times(DrumKind::Hat), vec![0.0, 0.25]);
    assert_eq!(sequencer.gate_tick(), 3);
}

#[test]
fn test_stalled_host_reanchors_instead_of_replaying() {
    let mut sequencer = StepSequencer::new(TestHost::default());
    sequencer.start();
    sequencer.poll();

    sequencer.host_mut().time = 5.0;
    assert_eq!(sequencer.poll(), 1);
    assert_eq!(sequencer.gate_tick(), 2);
    assert_eq!(sequencer.next_deadline(), Some(5.125));
}

#[test]
fn test_stop_after_clock_passed_next_tick() {
    let mut sequencer = StepSequencer::new(TestHost::default());
    sequencer.start();
    sequencer.poll();

    // Tick 1 was due at 0.125 but never polled
    sequencer.host_mut().time = 0.2;
    sequencer.stop();
    let events_at_stop = sequencer.host().events.len();

    assert_eq!(sequencer.poll(), 0);
    run_until(&mut sequencer, 1.0);
    assert_eq!(sequencer.host().events.len(), events_at_stop);
    assert!(!sequencer.is_playing());
    assert_eq!(sequencer.host().highlights().last(), Some(&None));
    assert_eq!(sequencer.next_deadline(), None);
}

#[test]
fn test_alternating_tremolo_gate() {
    let mut host = TestHost::default();
    host.tremolo_active = true;
    let mut sequencer = StepSequencer::new(host);

    let mut slots = [false; 16];
    for (tick, slot) in slots.iter_mut().enumerate() {
        *slot = tick % 2 == 0;
    }
    sequencer.set_gate_pattern(GateKind::Tremolo, GatePattern::from_slots(slots));
    sequencer.set_gate_settings(
        GateKind::Tremolo,
        GateSettings {
            enabled: true,
            length: 0.5,
            depth: 1.0,
        },
    );

    sequencer.start();
    sequencer.poll();
    assert_eq!(sequencer.host().tremolo.cancels, vec![0.0]);
    assert_eq!(
        sequencer.host().tremolo.targets,
        vec![(1.0, 0.0), (0.0, 0.0625)]
    );

    sequencer.host_mut().time = 0.125;
    sequencer.poll();
    assert_eq!(sequencer.host().tremolo.cancels, vec![0.0, 0.125]);
    assert_eq!(sequencer.host().tremolo.targets[2..], [(0.0, 0.125)]);

    // Stop ramps back to full volume
    sequencer.host_mut().time = 0.2;
    sequencer.stop();
    assert_eq!(sequencer.host().tremolo.targets.last(), Some(&(1.0, 0.2)));
}

#[test]
fn test_inactive_tremolo_is_left_alone() {
    let mut sequencer = StepSequencer::new(TestHost::default());
    sequencer.start();
    run_until(&mut sequencer, 0.5);
    assert!(sequencer.host().tremolo.targets.is_empty());
}

#[test]
fn test_parameter_gate_drives_destination() {
    let mut sequencer = StepSequencer::new(TestHost::default());
    sequencer.set_parameter_destination(Some(CUTOFF_DESTINATION.to_string()));
    sequencer.set_gate_settings(
        GateKind::Parameter,
        GateSettings {
            enabled: true,
            length: 1.0,
            depth: 0.5,
        },
    );
    sequencer.set_gate(GateKind::Parameter, 0, false).unwrap();

    sequencer.start();
    sequencer.poll();
    sequencer.host_mut().time = 0.125;
    sequencer.poll();

    assert_eq!(
        sequencer.host().cutoff.targets,
        vec![(1000.0, 0.0), (2000.0, 0.125)]
    );

    sequencer.host_mut().time = 0.2;
    sequencer.stop();
    assert_eq!(sequencer.host().cutoff.targets.last(), Some(&(2000.0, 0.2)));
}

#[test]
fn test_sequencer_notes_release_before_next_step() {
    let mut sequencer = StepSequencer::new(TestHost::default());
    let mut step = sequencer.pattern().step(0).cloned().unwrap();
    step.note_name = Some("A4".to_string());
    step.base_frequency = Some(440.0);
    sequencer.set_step(0, step).unwrap();

    sequencer.start();
    run_until(&mut sequencer, 0.3);

    let events = &sequencer.host().events;
    let stop_index = events
        .iter()
        .position(|e| matches!(e, Event::Stop(_)))
        .unwrap();
    let hat_at_step_one = events
        .iter()
        .position(|e| *e == Event::Drum(DrumKind::Hat, 0.25))
        .unwrap();
    assert!(stop_index < hat_at_step_one);
    assert_eq!(sequencer.host().plays(), vec![("A4".to_string(), 0.0)]);
}

#[test]
fn test_note_without_frequency_reaches_voice_service() {
    let mut sequencer = StepSequencer::new(TestHost::default());
    let mut step = sequencer.pattern().step(0).cloned().unwrap();
    step.note_name = Some("C4".to_string());
    step.base_frequency = None;
    sequencer.set_step(0, step).unwrap();

    sequencer.start();
    run_until(&mut sequencer, 0.2);

    assert_eq!(sequencer.host().plays(), vec![("C4".to_string(), 0.0)]);
}
