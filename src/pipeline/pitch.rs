// Hue picks the scale degree, lightness picks the octave, and a little
// randomness keeps repeated pixels from sounding machine-stamped. All
// randomness flows through the caller's Pcg32 so tests can seed it.

use rand::Rng;
use rand_pcg::Pcg32;

use crate::pipeline::scale::{ROOT_HZ, ScaleName};

/// Detune applied to every note, Hz either side of the mapped base.
pub const DETUNE_HZ: f32 = 2.5;

/// One pixel's tonal assignment, consumed exactly once by the synthesizer.
#[derive(Clone, Copy, Debug)]
pub struct TonalEvent {
    /// Always finite and > 0.
    pub frequency: f32,
    /// 1.0, 1.5 (fifth), or 2.0 (octave).
    pub harmonic_mult: f32,
    pub lightness: f32,
}

/// Octave displacement from lightness: -1 for dark up to +2 for bright.
pub fn octave_shift(lightness: f32) -> i32 {
    (((lightness / 100.0) * 3.0).floor() as i32 - 1).clamp(-1, 2)
}

/// Maps a color to a tonal event on the given scale.
///
/// The square-root warp concentrates low hues onto few degrees and spreads
/// high hues across the rest; it is intentionally non-linear. The detune and
/// harmonic choice are random, so two identical pixels may differ slightly.
pub fn map(hue: f32, lightness: f32, scale: ScaleName, rng: &mut Pcg32) -> TonalEvent {
    map_notes(hue, lightness, scale.notes(), rng)
}

fn map_notes(hue: f32, lightness: f32, notes: &[f32], rng: &mut Pcg32) -> TonalEvent {
    let len = notes.len();
    let index = (((hue / 360.0).sqrt() * len as f32).floor() as usize) % len;

    let mut base = notes.get(index).copied().unwrap_or(ROOT_HZ);
    base *= 2f32.powi(octave_shift(lightness));
    if !base.is_finite() || base <= 0.0 {
        base = ROOT_HZ;
    }
    base += rng.gen_range(-DETUNE_HZ..=DETUNE_HZ);

    // 50% chance of an audible harmonic; then a coin flip between a perfect
    // fifth and an octave. The harmonic oscillator itself is always built by
    // the voice; only this ratio varies.
    let harmonic_mult = if rng.gen_bool(0.5) {
        if rng.gen_bool(0.5) { 1.5 } else { 2.0 }
    } else {
        1.0
    };

    TonalEvent {
        frequency: base,
        harmonic_mult,
        lightness,
    }
}
