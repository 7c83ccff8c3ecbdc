// Gate modulation engine
// Schedules per-tick open/closed ramps on an externally owned audio parameter

use crate::sequencer::pattern::GatePattern;
use serde::{Deserialize, Serialize};

/// An audio parameter with sample-accurate automation
///
/// Mirrors the automation primitives of a host audio graph: scheduled
/// changes can be cancelled from a point in time, and a new target can be
/// approached exponentially from a start time.
pub trait ScheduledParam {
    /// Drop every scheduled change at or after `from_time`
    fn cancel_scheduled_values(&mut self, from_time: f64);

    /// Approach `value` starting at `start_time` with the given time constant
    fn set_target_at_time(&mut self, value: f32, start_time: f64, time_constant: f64);
}

/// A parameter the gate may drive, as resolved by the host
pub struct GateTarget<'a> {
    /// Whether the effect owning the parameter is switched on
    pub active: bool,
    /// The parameter itself
    pub param: &'a mut dyn ScheduledParam,
    /// Full (open) value of the parameter
    pub base_value: f32,
}

/// Host-side lookup of modulation destinations
///
/// Returning `None` is a normal condition (effect not loaded, destination
/// unknown); the engine skips the tick.
pub trait ModulationHost {
    /// The tremolo gain stage, whose base value is 1.0
    fn tremolo_target(&mut self) -> Option<GateTarget<'_>>;

    /// Any effect parameter, looked up by destination name
    fn parameter_target(&mut self, destination: &str) -> Option<GateTarget<'_>>;
}

/// Per-gate shape settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GateSettings {
    /// Gate switched on at the sequencer side
    pub enabled: bool,
    /// Fraction of an open tick spent at full value (0.0 - 1.0)
    pub length: f32,
    /// How far a closed gate pulls the value down (0.0 - 1.0)
    pub depth: f32,
}

impl GateSettings {
    /// Clamp length and depth into 0.0..=1.0
    pub fn sanitized(mut self) -> Self {
        self.length = if self.length.is_finite() { self.length.clamp(0.0, 1.0) } else { 1.0 };
        self.depth = if self.depth.is_finite() { self.depth.clamp(0.0, 1.0) } else { 1.0 };
        self
    }
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            length: 1.0,
            depth: 1.0,
        }
    }
}

/// Timing of the tick being scheduled
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickWindow {
    pub gate_tick: usize,
    /// Host clock time of the tick boundary
    pub time: f64,
    /// Length of the tick in seconds
    pub duration: f64,
}

/// Value a closed gate settles on
pub fn attenuated_value(base_value: f32, depth: f32) -> f32 {
    base_value * (1.0 - depth)
}

/// Schedule one tick of gating on `param`
///
/// Any automation left over from earlier ticks is cancelled at the tick
/// boundary first. Open ticks go to `base_value` and, when `length < 1`,
/// fall to the attenuated value part-way through the tick. Closed ticks go
/// straight to the attenuated value.
pub fn schedule_tick(
    param: &mut dyn ScheduledParam,
    open: bool,
    base_value: f32,
    settings: &GateSettings,
    window: &TickWindow,
    time_constant: f64,
) {
    let closed_value = attenuated_value(base_value, settings.depth);
    param.cancel_scheduled_values(window.time);

    if open {
        param.set_target_at_time(base_value, window.time, time_constant);
        if settings.length < 1.0 {
            let fall_time = window.time + window.duration * settings.length as f64;
            param.set_target_at_time(closed_value, fall_time, time_constant);
        }
    } else {
        param.set_target_at_time(closed_value, window.time, time_constant);
    }
}

/// Smoothly return `param` to its unmodulated value
pub fn reset_to_neutral(param: &mut dyn ScheduledParam, base_value: f32, now: f64, time_constant: f64) {
    param.cancel_scheduled_values(now);
    param.set_target_at_time(base_value, now, time_constant);
}

/// The two gates the transport drives each tick
#[derive(Debug, Clone, PartialEq)]
pub struct GateEngine {
    pub tremolo_pattern: GatePattern,
    pub tremolo: GateSettings,
    pub parameter_pattern: GatePattern,
    pub parameter: GateSettings,
    /// Effect parameter name the parameter gate drives
    pub destination: Option<String>,
}

impl GateEngine {
    pub fn new() -> Self {
        Self {
            tremolo_pattern: GatePattern::all_open(),
            tremolo: GateSettings::default(),
            parameter_pattern: GatePattern::all_open(),
            parameter: GateSettings {
                enabled: false,
                ..GateSettings::default()
            },
            destination: None,
        }
    }

    /// Run both gates for one tick
    pub fn process_tick<H: ModulationHost + ?Sized>(&self, host: &mut H, window: &TickWindow, time_constant: f64) {
        if self.tremolo.enabled {
            if let Some(target) = host.tremolo_target() {
                if target.active {
                    let open = self.tremolo_pattern.is_open(window.gate_tick);
                    schedule_tick(target.param, open, 1.0, &self.tremolo, window, time_constant);
                }
            }
        }

        if self.parameter.enabled {
            if let Some(destination) = self.destination.as_deref() {
                if let Some(target) = host.parameter_target(destination) {
                    if target.active {
                        let open = self.parameter_pattern.is_open(window.gate_tick);
                        schedule_tick(
                            target.param,
                            open,
                            target.base_value,
                            &self.parameter,
                            window,
                            time_constant,
                        );
                    }
                }
            }
        }
    }

    /// Ramp every gated parameter back to its base value
    pub fn release<H: ModulationHost + ?Sized>(&self, host: &mut H, now: f64, time_constant: f64) {
        if let Some(target) = host.tremolo_target() {
            reset_to_neutral(target.param, 1.0, now, time_constant);
        }
        if let Some(destination) = self.destination.as_deref() {
            if let Some(target) = host.parameter_target(destination) {
                reset_to_neutral(target.param, target.base_value, now, time_constant);
            }
        }
    }
}

impl Default for GateEngine {
    fn default() -> Self {
        Self::new()
    }
}
