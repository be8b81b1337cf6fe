// One note = one ephemeral synthesis unit: a main oscillator plus an
// always-present harmonic layer through a shared lowpass, vibrato on the
// main oscillator's frequency, tremolo on the note gain, and an
// attack/sustain-decay/release envelope. The voice renders into the mono
// dry and wet scratch buses and self-terminates 0.1s past its duration.

use biquad::{Biquad, Coefficients, DirectForm2Transposed, Q_BUTTERWORTH_F32, ToHertz, Type};

use crate::audio_api::NoteParams;
use crate::audio::graph::perceptual_gain;
use crate::shared::OscShape;

/// Mix level of the harmonic layer relative to the main oscillator.
const HARMONIC_LEVEL: f32 = 0.25;

/// Attack time, seconds.
const ATTACK: f32 = 0.02;

/// Near-zero envelope floor; exponential ramps cannot target exactly 0.
const ENV_FLOOR: f32 = 0.001;

/// Guard tail past the nominal duration before the voice frees its slot.
const RELEASE_TAIL: f32 = 0.1;

#[inline]
fn osc_sample(shape: OscShape, phase: f32) -> f32 {
    match shape {
        OscShape::Sine => (std::f32::consts::TAU * phase).sin(),
        OscShape::Square => {
            if phase < 0.5 {
                1.0
            } else {
                -1.0
            }
        }
        OscShape::Triangle => {
            if phase < 0.5 {
                4.0 * phase - 1.0
            } else {
                3.0 - 4.0 * phase
            }
        }
        OscShape::Sawtooth => 2.0 * phase - 1.0,
    }
}

#[inline]
fn advance(phase: &mut f32, freq: f32, sample_rate: f32) -> f32 {
    let p = *phase;
    *phase += freq / sample_rate;
    if *phase >= 1.0 {
        *phase -= phase.floor();
    }
    p
}

#[derive(Clone, Debug)]
pub struct NoteVoice {
    pub active: bool,
    shape: OscShape,
    frequency: f32,
    harmonic_freq: f32,
    sample_rate: f32,

    main_phase: f32,
    harmonic_phase: f32,
    vibrato_phase: f32,
    tremolo_phase: f32,

    vibrato_rate: f32,
    vibrato_depth: f32,
    tremolo_rate: f32,
    tremolo_depth: f32,

    filter: DirectForm2Transposed<f32>,

    peak: f32,
    duration: f32,
    elapsed: u64,
    life: u64,
}

impl NoteVoice {
    pub fn new(params: NoteParams, sample_rate: f32) -> Self {
        let light = params.lightness.clamp(0.0, 100.0);

        // brighter pixels open the filter further
        let cutoff = (800.0 + light * 50.0).min(sample_rate * 0.45);
        let coeffs = Coefficients::<f32>::from_params(
            Type::LowPass,
            sample_rate.hz(),
            cutoff.hz(),
            Q_BUTTERWORTH_F32,
        )
        .unwrap_or(Coefficients {
            a1: 0.0,
            a2: 0.0,
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
        });

        // darker pixels still speak: the floor keeps every cell audible
        let pixel_volume = (0.6 + light / 100.0).max(0.3);
        let peak = pixel_volume * perceptual_gain(params.volume);

        let duration = params.duration.max(ATTACK * 2.0);

        Self {
            active: true,
            shape: params.shape,
            frequency: params.frequency,
            harmonic_freq: params.frequency * params.harmonic_mult,
            sample_rate,
            main_phase: 0.0,
            harmonic_phase: 0.0,
            vibrato_phase: 0.0,
            tremolo_phase: 0.0,
            vibrato_rate: 3.0 + light / 60.0,
            vibrato_depth: (light / 100.0).max(0.1),
            tremolo_rate: 3.0 + light / 50.0,
            tremolo_depth: (light / 250.0).max(0.1),
            filter: DirectForm2Transposed::<f32>::new(coeffs),
            peak,
            duration,
            elapsed: 0,
            life: ((duration + RELEASE_TAIL) * sample_rate) as u64,
        }
    }

    /// Samples until this voice frees its slot; used for oldest-first steal.
    pub fn remaining(&self) -> u64 {
        self.life.saturating_sub(self.elapsed)
    }

    /// Envelope value at `t` seconds: linear attack to the peak, linear decay
    /// to 80% by half duration, exponential decay to the floor by the end.
    fn envelope(&self, t: f32) -> f32 {
        if self.peak <= ENV_FLOOR {
            return 0.0;
        }
        let half = self.duration * 0.5;
        if t < ATTACK {
            self.peak * (t / ATTACK)
        } else if t < half {
            let frac = (t - ATTACK) / (half - ATTACK).max(1e-6);
            self.peak * (1.0 - 0.2 * frac)
        } else if t < self.duration {
            let sustain = self.peak * 0.8;
            let frac = (t - half) / (self.duration - half).max(1e-6);
            sustain * (ENV_FLOOR / sustain).powf(frac)
        } else {
            ENV_FLOOR
        }
    }

    /// Adds this voice's next `dry.len()` samples into the dry and wet
    /// scratch buses. Both buses carry the same post-filter signal; the
    /// graph applies the bus levels.
    pub fn render_into(&mut self, dry: &mut [f32], wet: &mut [f32]) {
        if !self.active {
            return;
        }
        for (d, w) in dry.iter_mut().zip(wet.iter_mut()) {
            if self.elapsed >= self.life {
                self.active = false;
                break;
            }
            let t = self.elapsed as f32 / self.sample_rate;

            // vibrato wobbles the main oscillator's frequency in Hz
            let vib = self.vibrato_depth
                * (std::f32::consts::TAU * advance(&mut self.vibrato_phase, self.vibrato_rate, self.sample_rate))
                    .sin();
            let main_freq = (self.frequency + vib).max(0.0);

            let main = osc_sample(self.shape, advance(&mut self.main_phase, main_freq, self.sample_rate));
            let harmonic = osc_sample(
                self.shape,
                advance(&mut self.harmonic_phase, self.harmonic_freq, self.sample_rate),
            );

            let filtered = self.filter.run(main + HARMONIC_LEVEL * harmonic);

            // tremolo rides on top of the envelope, like an LFO patched
            // straight into the gain param
            let trem = self.tremolo_depth
                * (std::f32::consts::TAU * advance(&mut self.tremolo_phase, self.tremolo_rate, self.sample_rate))
                    .sin();
            let gain = self.envelope(t) + trem;

            let sample = filtered * gain;
            *d += sample;
            *w += sample;

            self.elapsed += 1;
        }
        if self.elapsed >= self.life {
            self.active = false;
        }
    }
}
