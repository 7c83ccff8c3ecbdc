// Transport - Play/stop state and the gate-tick clock
// Ticks are scheduled on the host audio clock, anchored on their planned times

use crate::sequencer::gate::TickWindow;
use crate::sequencer::timeline::{Tempo, TICKS_PER_HYPER_MEASURE};

/// The host audio clock
///
/// `now` is the authoritative time base for every tick. A suspended clock
/// must be resumed before the transport can run; `resume` only requests it
/// and the transport waits until `is_suspended` turns false.
pub trait AudioClock {
    fn now(&self) -> f64;

    fn is_suspended(&self) -> bool {
        false
    }

    fn resume(&mut self) {}
}

/// Transport state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    #[default]
    Stopped,
    /// Start requested, waiting for the audio clock to resume
    Resuming,
    Running,
}

impl TransportState {
    /// Running or about to run
    pub fn is_playing(&self) -> bool {
        matches!(self, TransportState::Resuming | TransportState::Running)
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, TransportState::Stopped)
    }
}

/// Tick clock
///
/// There is at most one pending tick at any time (`next_tick_at`), so at
/// most one tick chain can exist. `None` while running means the next
/// tick fires on the next poll and anchors the chain there.
#[derive(Debug, Clone)]
pub struct Transport {
    state: TransportState,
    gate_tick: usize,
    step_index: usize,
    next_tick_at: Option<f64>,
    ticks_fired: u64,
}

impl Transport {
    pub fn new() -> Self {
        Self {
            state: TransportState::Stopped,
            gate_tick: 0,
            step_index: 0,
            next_tick_at: None,
            ticks_fired: 0,
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    /// Gate tick the next tick will run on (0..16)
    pub fn gate_tick(&self) -> usize {
        self.gate_tick
    }

    /// Step most recently reached on a step boundary
    pub fn step_index(&self) -> usize {
        self.step_index
    }

    /// Time of the pending tick, if one is scheduled
    pub fn next_tick_at(&self) -> Option<f64> {
        match self.state {
            TransportState::Running => self.next_tick_at,
            _ => None,
        }
    }

    /// Total ticks fired since construction
    pub fn ticks_fired(&self) -> u64 {
        self.ticks_fired
    }

    /// Start from tick 0
    ///
    /// Returns false if the transport was already playing (no second chain
    /// is ever created).
    pub fn start<C: AudioClock + ?Sized>(&mut self, clock: &mut C) -> bool {
        if self.state.is_playing() {
            return false;
        }
        self.reset_position();
        if clock.is_suspended() {
            log::debug!("Audio clock suspended, requesting resume before start");
            clock.resume();
            self.state = TransportState::Resuming;
        } else {
            self.state = TransportState::Running;
        }
        true
    }

    /// Stop and drop the pending tick
    /// Also cancels a start still waiting for the clock to resume
    pub fn stop(&mut self) -> bool {
        if self.state.is_stopped() {
            return false;
        }
        self.state = TransportState::Stopped;
        self.next_tick_at = None;
        true
    }

    /// Go back to tick 0 and fire on the next poll, keeping the single chain
    pub fn restart(&mut self) {
        self.reset_position();
    }

    fn reset_position(&mut self) {
        self.gate_tick = 0;
        self.step_index = 0;
        self.next_tick_at = None;
    }

    pub(crate) fn set_step_index(&mut self, step_index: usize) {
        self.step_index = step_index;
    }

    /// Promote a pending start once the clock has resumed
    pub fn check_resumed<C: AudioClock + ?Sized>(&mut self, clock: &C) -> bool {
        if self.state == TransportState::Resuming && !clock.is_suspended() {
            self.state = TransportState::Running;
            return true;
        }
        false
    }

    /// Take the next due tick, if any
    ///
    /// Advances the gate tick and schedules the following tick one period
    /// (at the current tempo) after this tick's planned time. When the host
    /// has fallen more than a hyper-measure behind, the chain re-anchors on
    /// `now` instead of replaying every missed tick.
    pub fn take_due_tick(&mut self, now: f64, tempo: &Tempo) -> Option<TickWindow> {
        if self.state != TransportState::Running {
            return None;
        }

        let period = tempo.tick_duration_seconds();
        let tick_time = match self.next_tick_at {
            None => now,
            Some(at) if at > now => return None,
            Some(at) if now - at > tempo.hyper_measure_seconds() => {
                log::warn!(
                    "Sequencer clock fell {:.3}s behind, re-anchoring on current time",
                    now - at
                );
                now
            }
            Some(at) => at,
        };

        let window = TickWindow {
            gate_tick: self.gate_tick,
            time: tick_time,
            duration: period,
        };

        self.gate_tick = (self.gate_tick + 1) % TICKS_PER_HYPER_MEASURE;
        self.next_tick_at = Some(tick_time + period);
        self.ticks_fired += 1;

        Some(window)
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new()
    }
}
