// The shared reverb unit: a one-shot decaying-noise impulse response
// convolved with the wet bus. Convolution runs as uniform-partition
// overlap-add FFT (realfft) with a frequency-domain delay line, so a
// multi-second impulse stays affordable inside the audio callback. All
// buffers are allocated up front; the per-hop path never allocates.

use std::collections::VecDeque;
use std::sync::Arc;

use rand::Rng;
use rand_pcg::Pcg32;
use realfft::num_complex::Complex;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};

/// Samples per convolver hop; also the partition length of the impulse.
/// One hop (~6ms at 44.1kHz) of constant latency, inaudible on a wet bus.
pub const HOP: usize = 256;

/// Stereo decaying-noise impulse response. Each channel is independent
/// uniform noise in [-1, 1] shaped by (1 - i/len)^decay.
pub struct ReverbImpulse {
    pub left: Vec<f32>,
    pub right: Vec<f32>,
}

impl ReverbImpulse {
    pub fn render(seconds: f32, decay: f32, sample_rate: f32, rng: &mut Pcg32) -> Self {
        let len = ((seconds * sample_rate) as usize).max(1);
        let mut channel = || -> Vec<f32> {
            (0..len)
                .map(|i| {
                    let env = (1.0 - i as f32 / len as f32).powf(decay);
                    rng.gen_range(-1.0f32..=1.0) * env
                })
                .collect()
        };
        Self {
            left: channel(),
            right: channel(),
        }
    }
}

/// Mono-in mono-out partitioned convolver. Feed arbitrary block sizes;
/// output lags the input by one hop while the first partition fills.
pub struct Convolver {
    fft_len: usize,
    r2c: Arc<dyn RealToComplex<f32>>,
    c2r: Arc<dyn ComplexToReal<f32>>,

    /// Pre-transformed impulse partitions, earliest first.
    ir_spectra: Vec<Vec<Complex<f32>>>,
    /// Spectra of recent input hops, newest first; aligned with ir_spectra.
    history: VecDeque<Vec<Complex<f32>>>,

    in_buf: Vec<f32>,
    in_fill: usize,
    out_queue: VecDeque<f32>,
    overlap: Vec<f32>,

    scratch_time: Vec<f32>,
    scratch_spec: Vec<Complex<f32>>,
    acc: Vec<Complex<f32>>,
}

impl Convolver {
    pub fn new(impulse: &[f32]) -> Self {
        let fft_len = HOP * 2;
        let bins = fft_len / 2 + 1;
        let mut planner = RealFftPlanner::<f32>::new();
        let r2c = planner.plan_fft_forward(fft_len);
        let c2r = planner.plan_fft_inverse(fft_len);

        let partitions = impulse.len().div_ceil(HOP).max(1);
        let mut ir_spectra = Vec::with_capacity(partitions);
        let mut padded = vec![0.0f32; fft_len];
        for p in 0..partitions {
            padded.fill(0.0);
            let start = p * HOP;
            let end = (start + HOP).min(impulse.len());
            if start < impulse.len() {
                padded[..end - start].copy_from_slice(&impulse[start..end]);
            }
            let mut spectrum = vec![Complex::new(0.0, 0.0); bins];
            // realfft scrambles its input; padded is refilled next round
            let _ = r2c.process(&mut padded, &mut spectrum);
            ir_spectra.push(spectrum);
        }

        let mut history = VecDeque::with_capacity(partitions);
        for _ in 0..partitions {
            history.push_back(vec![Complex::new(0.0, 0.0); bins]);
        }

        Self {
            fft_len,
            r2c,
            c2r,
            ir_spectra,
            history,
            in_buf: vec![0.0; HOP],
            in_fill: 0,
            out_queue: VecDeque::with_capacity(fft_len),
            overlap: vec![0.0; HOP],
            scratch_time: vec![0.0; fft_len],
            scratch_spec: vec![Complex::new(0.0, 0.0); bins],
            acc: vec![Complex::new(0.0, 0.0); bins],
        }
    }

    /// Convolves `input` with the impulse, writing the same number of
    /// samples to `output` (one hop of fixed delay).
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) {
        debug_assert_eq!(input.len(), output.len());
        for (i, &sample) in input.iter().enumerate() {
            self.in_buf[self.in_fill] = sample;
            self.in_fill += 1;
            if self.in_fill == HOP {
                self.in_fill = 0;
                self.run_hop();
            }
            output[i] = self.out_queue.pop_front().unwrap_or(0.0);
        }
    }

    fn run_hop(&mut self) {
        // transform the newest hop, reusing the oldest history slot
        self.scratch_time[..HOP].copy_from_slice(&self.in_buf);
        self.scratch_time[HOP..].fill(0.0);
        let mut spectrum = self.history.pop_back().unwrap_or_default();
        let _ = self.r2c.process(&mut self.scratch_time, &mut spectrum);
        self.history.push_front(spectrum);

        // frequency-domain delay line: newest hop against the earliest
        // impulse partition, older hops against later ones
        self.acc.fill(Complex::new(0.0, 0.0));
        for (h, ir) in self.history.iter().zip(self.ir_spectra.iter()) {
            for ((a, x), y) in self.acc.iter_mut().zip(h.iter()).zip(ir.iter()) {
                *a += x * y;
            }
        }

        self.scratch_spec.copy_from_slice(&self.acc);
        let _ = self.c2r.process(&mut self.scratch_spec, &mut self.scratch_time);

        let scale = 1.0 / self.fft_len as f32;
        for i in 0..HOP {
            self.out_queue
                .push_back(self.scratch_time[i] * scale + self.overlap[i]);
            self.overlap[i] = self.scratch_time[HOP + i] * scale;
        }
    }
}
