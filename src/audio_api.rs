use crate::shared::OscShape;

/// Everything the engine needs to voice one pixel's note.
#[derive(Clone, Copy, Debug)]
pub struct NoteParams {
    /// Fundamental, Hz. Always > 0 (the pitch mapper guards this).
    pub frequency: f32,
    /// Frequency ratio of the always-present harmonic layer: 1.0, 1.5, or 2.0.
    pub harmonic_mult: f32,
    /// Pixel lightness 0-100; drives filter cutoff, LFO rates, and loudness.
    pub lightness: f32,
    /// Note duration, seconds (the voice rings 0.1s past this).
    pub duration: f32,
    pub shape: OscShape,
    /// Master volume control value 0-1 (perceptual mapping applied downstream).
    pub volume: f32,
}

#[derive(Clone, Copy, Debug)]
pub enum AudioCommand {
    /// Voice one note immediately. Sent once per sequencer step.
    PlayNote(NoteParams),

    /// Retarget master gain; always smoothed, never stepped.
    SetVolume(f32),

    /// Kill every sounding voice right now (explicit stop).
    StopAll,
}
