// Drum machine - Kick, snare and hat voices for the step sequencer
// Plays user samples when loaded, otherwise short procedurally generated hits

use crate::audio::parameters::DrumGains;
use crate::sequencer::step::DrumKind;
use crate::sequencer::voice::DrumHost;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::PI;
use std::sync::Arc;

/// Hits that can ring at the same time; the oldest is dropped past this
pub const MAX_ACTIVE_HITS: usize = 32;

/// Seed for the noise of the procedural snare and hat
const NOISE_SEED: u64 = 0x5eed_d2a5;

fn slot(drum: DrumKind) -> usize {
    match drum {
        DrumKind::Kick => 0,
        DrumKind::Snare => 1,
        DrumKind::Hat => 2,
    }
}

/// Pre-rendered procedural drum hits
#[derive(Debug, Clone)]
pub struct DrumKit {
    voices: [Arc<Vec<f32>>; 3],
}

impl DrumKit {
    const KICK_SECONDS: f32 = 0.45;
    const SNARE_SECONDS: f32 = 0.2;
    const HAT_SECONDS: f32 = 0.05;

    pub fn procedural(sample_rate: f32) -> Self {
        let mut rng = StdRng::seed_from_u64(NOISE_SEED);
        Self {
            voices: [
                Arc::new(Self::generate_kick(sample_rate)),
                Arc::new(Self::generate_snare(sample_rate, &mut rng)),
                Arc::new(Self::generate_hat(sample_rate, &mut rng)),
            ],
        }
    }

    /// Sine with a fast downward pitch sweep (150 Hz to 50 Hz)
    fn generate_kick(sample_rate: f32) -> Vec<f32> {
        let num_samples = (Self::KICK_SECONDS * sample_rate) as usize;
        let mut samples = Vec::with_capacity(num_samples);
        let mut phase = 0.0f32;

        for i in 0..num_samples {
            let t = i as f32 / sample_rate;
            let frequency = 50.0 + 100.0 * (-t * 25.0).exp();
            phase += 2.0 * PI * frequency / sample_rate;
            let envelope = (-t * 7.0).exp();
            samples.push(phase.sin() * envelope * 0.9);
        }

        samples
    }

    /// Highpassed noise burst over a short 180 Hz body
    fn generate_snare(sample_rate: f32, rng: &mut StdRng) -> Vec<f32> {
        let num_samples = (Self::SNARE_SECONDS * sample_rate) as usize;
        let noise = highpass(&white_noise(num_samples, rng), 1200.0, sample_rate);

        noise
            .iter()
            .enumerate()
            .map(|(i, n)| {
                let t = i as f32 / sample_rate;
                let tone = (2.0 * PI * 180.0 * t).sin() * (-t * 30.0).exp();
                let rattle = n * (-t * 18.0).exp();
                (rattle * 0.7 + tone * 0.3) * 0.6
            })
            .collect()
    }

    fn generate_hat(sample_rate: f32, rng: &mut StdRng) -> Vec<f32> {
        let num_samples = (Self::HAT_SECONDS * sample_rate) as usize;
        let noise = highpass(&white_noise(num_samples, rng), 7000.0, sample_rate);

        noise
            .iter()
            .enumerate()
            .map(|(i, n)| {
                let t = i as f32 / sample_rate;
                n * (-t * 60.0).exp() * 0.4
            })
            .collect()
    }

    pub fn get(&self, drum: DrumKind) -> &Arc<Vec<f32>> {
        &self.voices[slot(drum)]
    }
}

fn white_noise(length: usize, rng: &mut StdRng) -> Vec<f32> {
    (0..length).map(|_| rng.gen_range(-1.0..1.0)).collect()
}

/// One-pole highpass
fn highpass(input: &[f32], cutoff: f32, sample_rate: f32) -> Vec<f32> {
    let rc = 1.0 / (2.0 * PI * cutoff);
    let dt = 1.0 / sample_rate;
    let alpha = rc / (rc + dt);

    let mut output = Vec::with_capacity(input.len());
    let mut prev_in = 0.0;
    let mut prev_out = 0.0;
    for &x in input {
        let y = alpha * (prev_out + x - prev_in);
        output.push(y);
        prev_in = x;
        prev_out = y;
    }
    output
}

/// A scheduled or ringing hit
#[derive(Debug, Clone)]
struct Hit {
    drum: DrumKind,
    start_sample: u64,
    position: usize,
    source: Arc<Vec<f32>>,
}

/// Renders drum hits on a sample clock
///
/// `trigger` takes a time in seconds on the same clock as
/// [`DrumMachine::time`]; hits land on the exact sample.
#[derive(Debug)]
pub struct DrumMachine {
    sample_rate: f32,
    kit: DrumKit,
    loaded: [Option<Arc<Vec<f32>>>; 3],
    gains: DrumGains,
    hits: Vec<Hit>,
    position: u64,
}

impl DrumMachine {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            kit: DrumKit::procedural(sample_rate),
            loaded: [None, None, None],
            gains: DrumGains::default(),
            hits: Vec::with_capacity(MAX_ACTIVE_HITS),
            position: 0,
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Gain handles; clone them to move gains from another thread
    pub fn gains(&self) -> &DrumGains {
        &self.gains
    }

    /// Use decoded mono samples for `drum` instead of the procedural hit
    pub fn load_sample(&mut self, drum: DrumKind, samples: Vec<f32>) {
        if samples.is_empty() {
            log::warn!("Empty {} sample ignored, keeping procedural sound", drum);
            self.loaded[slot(drum)] = None;
            return;
        }
        log::debug!("Loaded {} sample ({} frames)", drum, samples.len());
        self.loaded[slot(drum)] = Some(Arc::new(samples));
    }

    pub fn clear_sample(&mut self, drum: DrumKind) {
        self.loaded[slot(drum)] = None;
    }

    pub fn has_sample(&self, drum: DrumKind) -> bool {
        self.loaded[slot(drum)].is_some()
    }

    /// Current render position in seconds
    pub fn time(&self) -> f64 {
        self.position as f64 / self.sample_rate as f64
    }

    pub fn active_hits(&self) -> usize {
        self.hits.len()
    }

    /// Schedule `drum` at `at` seconds; times in the past play immediately
    pub fn trigger(&mut self, drum: DrumKind, at: f64) {
        let start_sample = ((at.max(0.0) * self.sample_rate as f64).round() as u64).max(self.position);
        let source = match &self.loaded[slot(drum)] {
            Some(samples) => Arc::clone(samples),
            None => Arc::clone(self.kit.get(drum)),
        };

        if self.hits.len() >= MAX_ACTIVE_HITS {
            self.hits.remove(0);
        }
        self.hits.push(Hit {
            drum,
            start_sample,
            position: 0,
            source,
        });
    }

    /// Render one mono sample and advance the clock
    pub fn process_sample(&mut self) -> f32 {
        let gains = DrumKind::ALL.map(|drum| self.gains.effective(drum));
        let now = self.position;
        let mut output = 0.0;

        self.hits.retain_mut(|hit| {
            if hit.start_sample > now {
                return true;
            }
            let Some(sample) = hit.source.get(hit.position) else {
                return false;
            };
            output += sample * gains[slot(hit.drum)];
            hit.position += 1;
            hit.position < hit.source.len()
        });

        self.position += 1;
        output
    }

    /// Render into `output`, overwriting it
    pub fn process_buffer(&mut self, output: &mut [f32]) {
        for sample in output.iter_mut() {
            *sample = self.process_sample();
        }
    }

    /// Drop every hit and rewind the clock
    pub fn reset(&mut self) {
        self.hits.clear();
        self.position = 0;
    }
}

impl DrumHost for DrumMachine {
    fn trigger_drum(&mut self, drum: DrumKind, at: f64) {
        self.trigger(drum, at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48000.0;

    fn peak(samples: &[f32]) -> f32 {
        samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
    }

    #[test]
    fn test_procedural_kit() {
        let kit = DrumKit::procedural(SR);
        let kick = kit.get(DrumKind::Kick);
        let hat = kit.get(DrumKind::Hat);

        assert!(peak(kick) > 0.1);
        assert!(peak(hat) > 0.01);
        assert!(hat.len() < kick.len());

        // Decays towards silence
        let tail = &kick[kick.len() - 100..];
        assert!(peak(tail) < peak(&kick[..1000]) * 0.1);
    }

    #[test]
    fn test_procedural_kit_is_deterministic() {
        let a = DrumKit::procedural(SR);
        let b = DrumKit::procedural(SR);
        assert_eq!(a.get(DrumKind::Snare), b.get(DrumKind::Snare));
    }

    #[test]
    fn test_hit_starts_on_scheduled_sample() {
        let mut drums = DrumMachine::new(SR);
        assert_eq!(drums.sample_rate(), SR);
        drums.trigger_drum(DrumKind::Kick, 0.01); // sample 480

        let mut buffer = vec![0.0; 1024];
        drums.process_buffer(&mut buffer);

        assert!(buffer[..480].iter().all(|s| *s == 0.0));
        assert!(peak(&buffer[480..]) > 0.0);
        assert!((drums.time() - 1024.0 / SR as f64).abs() < 1e-9);
    }

    #[test]
    fn test_past_hit_plays_immediately() {
        let mut drums = DrumMachine::new(SR);
        let mut buffer = vec![0.0; 256];
        drums.process_buffer(&mut buffer);

        drums.trigger(DrumKind::Kick, 0.0);
        drums.process_buffer(&mut buffer);
        assert!(peak(&buffer[..64]) > 0.0);
    }

    #[test]
    fn test_loaded_sample_replaces_procedural() {
        let mut drums = DrumMachine::new(SR);
        drums.gains().master.set(1.0);
        drums.load_sample(DrumKind::Snare, vec![0.5, 0.25]);
        assert!(drums.has_sample(DrumKind::Snare));

        drums.trigger(DrumKind::Snare, 0.0);
        let snare_gain = drums.gains().drum(DrumKind::Snare).get();
        assert!((drums.process_sample() - 0.5 * snare_gain).abs() < 1e-6);
        assert!((drums.process_sample() - 0.25 * snare_gain).abs() < 1e-6);
        assert_eq!(drums.process_sample(), 0.0);
        assert_eq!(drums.active_hits(), 0);

        drums.clear_sample(DrumKind::Snare);
        assert!(!drums.has_sample(DrumKind::Snare));
    }

    #[test]
    fn test_empty_sample_keeps_procedural() {
        let mut drums = DrumMachine::new(SR);
        drums.load_sample(DrumKind::Hat, Vec::new());
        assert!(!drums.has_sample(DrumKind::Hat));
    }

    #[test]
    fn test_gain_scales_output() {
        let mut drums = DrumMachine::new(SR);
        drums.load_sample(DrumKind::Kick, vec![1.0]);
        drums.gains().master.set(0.5);
        drums.gains().drum(DrumKind::Kick).set(0.5);

        drums.trigger(DrumKind::Kick, 0.0);
        assert!((drums.process_sample() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_hit_limit() {
        let mut drums = DrumMachine::new(SR);
        for _ in 0..MAX_ACTIVE_HITS + 5 {
            drums.trigger(DrumKind::Hat, 1.0);
        }
        assert_eq!(drums.active_hits(), MAX_ACTIVE_HITS);

        drums.reset();
        assert_eq!(drums.active_hits(), 0);
        assert_eq!(drums.time(), 0.0);
    }
}
