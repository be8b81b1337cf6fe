// The persistent signal topology, built once and reused across sweeps:
//
//   voices ──► dry bus (0.85) ──► bass shelf ─┐
//        └──► wet bus (0.35) ──► convolver ──┤──► master gain ──► device
//
// Bus handles are explicit fields here; voices render into the dry/wet
// scratch slices the engine hands them, and this graph mixes the result.

use biquad::{Biquad, Coefficients, DirectForm2Transposed, Q_BUTTERWORTH_F32, ToHertz, Type};
use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::audio::frame::StereoFrame;
use crate::audio::reverb::{Convolver, ReverbImpulse};

/// Dry path level into the bass shelf.
const DRY_LEVEL: f32 = 0.85;

/// Wet path level into the reverb unit.
const WET_LEVEL: f32 = 0.35;

/// Bass shelf corner, Hz.
const SHELF_HZ: f32 = 200.0;

/// Bass shelf boost, dB.
const SHELF_DB: f32 = 6.0;

/// Master gain smoothing time constant, seconds. Retargeting over ~20ms
/// keeps volume changes click-free.
const SMOOTHING_TC: f32 = 0.02;

/// Impulse response length, seconds.
const REVERB_SECONDS: f32 = 1.8;

/// Impulse response decay exponent.
const REVERB_DECAY: f32 = 2.5;

/// Perceptual loudness curve: a squared control value compensates the
/// linear-to-perceptual mismatch. 0 -> 0, 0.5 -> 0.25, 1 -> 1.
pub fn perceptual_gain(volume: f32) -> f32 {
    let v = volume.clamp(0.0, 1.0);
    v * v
}

pub struct AudioGraph {
    master_gain: f32,
    target_gain: f32,
    /// Per-sample one-pole coefficient toward the target.
    smoothing: f32,

    shelf: DirectForm2Transposed<f32>,
    reverb_l: Convolver,
    reverb_r: Convolver,

    wet_scratch: Vec<f32>,
    rev_l: Vec<f32>,
    rev_r: Vec<f32>,
}

impl AudioGraph {
    pub fn new(sample_rate: f32, volume: f32) -> Self {
        Self::with_seed(sample_rate, volume, rand::random())
    }

    /// Deterministic impulse noise for tests.
    pub fn with_seed(sample_rate: f32, volume: f32, seed: u64) -> Self {
        let coeffs = Coefficients::<f32>::from_params(
            Type::LowShelf(SHELF_DB),
            sample_rate.hz(),
            SHELF_HZ.hz(),
            Q_BUTTERWORTH_F32,
        )
        .unwrap_or(Coefficients {
            a1: 0.0,
            a2: 0.0,
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
        });

        let mut rng = Pcg32::seed_from_u64(seed);
        let impulse = ReverbImpulse::render(REVERB_SECONDS, REVERB_DECAY, sample_rate, &mut rng);

        let gain = perceptual_gain(volume);
        Self {
            master_gain: gain,
            target_gain: gain,
            smoothing: 1.0 - (-1.0 / (SMOOTHING_TC * sample_rate)).exp(),
            shelf: DirectForm2Transposed::<f32>::new(coeffs),
            reverb_l: Convolver::new(&impulse.left),
            reverb_r: Convolver::new(&impulse.right),
            wet_scratch: Vec::new(),
            rev_l: Vec::new(),
            rev_r: Vec::new(),
        }
    }

    /// Retargets master gain; the new value is approached over the
    /// smoothing constant, never stepped.
    pub fn set_volume(&mut self, volume: f32) {
        self.target_gain = perceptual_gain(volume);
    }

    #[cfg(test)]
    fn gain(&self) -> f32 {
        self.master_gain
    }

    /// Mixes one block: dry through the bass shelf, wet through the reverb,
    /// sum under the smoothed master gain.
    pub fn process_block(&mut self, dry: &[f32], wet: &[f32], out: &mut [StereoFrame]) {
        let n = out.len();
        if self.wet_scratch.len() < n {
            self.wet_scratch.resize(n, 0.0);
            self.rev_l.resize(n, 0.0);
            self.rev_r.resize(n, 0.0);
        }

        for i in 0..n {
            self.wet_scratch[i] = wet[i] * WET_LEVEL;
        }
        self.reverb_l
            .process(&self.wet_scratch[..n], &mut self.rev_l[..n]);
        self.reverb_r
            .process(&self.wet_scratch[..n], &mut self.rev_r[..n]);

        for i in 0..n {
            self.master_gain += (self.target_gain - self.master_gain) * self.smoothing;
            let shelved = self.shelf.run(dry[i] * DRY_LEVEL);
            out[i].left = (shelved + self.rev_l[i]) * self.master_gain;
            out[i].right = (shelved + self.rev_r[i]) * self.master_gain;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 44_100.0;

    #[test]
    fn perceptual_curve_is_quadratic() {
        assert_eq!(perceptual_gain(0.0), 0.0);
        assert_eq!(perceptual_gain(1.0), 1.0);
        assert!((perceptual_gain(0.5) - 0.25).abs() < 1e-6);
        // out-of-range control values clamp first
        assert_eq!(perceptual_gain(-2.0), 0.0);
        assert_eq!(perceptual_gain(3.0), 1.0);
    }

    #[test]
    fn silence_in_silence_out() {
        let mut graph = AudioGraph::with_seed(SR, 0.9, 21);
        let dry = vec![0.0; 512];
        let wet = vec![0.0; 512];
        let mut out = vec![StereoFrame::zero(); 512];
        graph.process_block(&dry, &wet, &mut out);
        assert!(out.iter().all(|f| f.left == 0.0 && f.right == 0.0));
    }

    #[test]
    fn volume_changes_are_smoothed_not_stepped() {
        let mut graph = AudioGraph::with_seed(SR, 1.0, 22);
        graph.set_volume(0.0);

        // after one block the gain has moved but not yet arrived
        let dry = vec![0.0; 64];
        let wet = vec![0.0; 64];
        let mut out = vec![StereoFrame::zero(); 64];
        graph.process_block(&dry, &wet, &mut out);
        let g = graph.gain();
        assert!(g < 1.0 && g > 0.0, "gain jumped: {g}");

        // and converges within a couple hundred milliseconds
        for _ in 0..200 {
            graph.process_block(&dry, &wet, &mut out);
        }
        assert!(graph.gain() < 1e-3);
    }

    #[test]
    fn dry_signal_reaches_the_output() {
        let mut graph = AudioGraph::with_seed(SR, 1.0, 23);
        let dry = vec![0.5; 1024];
        let wet = vec![0.0; 1024];
        let mut out = vec![StereoFrame::zero(); 1024];
        graph.process_block(&dry, &wet, &mut out);
        assert!(out.iter().any(|f| f.left.abs() > 0.05));
    }

    #[test]
    fn wet_signal_rings_through_the_reverb() {
        let mut graph = AudioGraph::with_seed(SR, 1.0, 24);
        let dry = vec![0.0; 1024];
        let mut wet = vec![0.0; 1024];
        wet[0] = 1.0;
        let mut out = vec![StereoFrame::zero(); 1024];
        graph.process_block(&dry, &wet, &mut out);

        // an impulse into the wet bus leaves a tail, and the stereo
        // channels differ because the impulse noise is independent
        let energy: f32 = out.iter().map(|f| f.left * f.left).sum();
        assert!(energy > 0.0);
        assert!(out.iter().any(|f| (f.left - f.right).abs() > 1e-9));
    }
}
