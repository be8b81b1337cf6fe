// Types that cross the layer boundaries: the TUI emits InputEvents, the
// middle layer answers with a DisplayState snapshot each frame, and the
// audio thread only ever sees AudioCommands (see audio_api.rs).
//
// The rendering idea:
//   - The middle layer owns the sequencer, settings, and loaded image.
//   - Each frame, call `middle.display_state()` and draw exactly that:
//     the pixel preview, the sweep cursor, the progress gauge, and the
//     current knob values. The TUI holds no state of its own.

use serde::{Deserialize, Serialize};

/// Largest dimension of the playable (sonified) pixel grid.
pub const MAX_PLAYABLE_SIZE: u32 = 24;

/// Hard ceiling on a single note's duration, seconds.
pub const MAX_NOTE_DURATION: f32 = 2.0;

/// Shortest usable note duration, seconds.
pub const MIN_NOTE_DURATION: f32 = 0.05;

/// Waveform of the per-note oscillators.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OscShape {
    Sine,
    Square,
    Triangle,
    #[default]
    Sawtooth,
}

impl OscShape {
    pub fn next(self) -> Self {
        match self {
            OscShape::Sine => OscShape::Square,
            OscShape::Square => OscShape::Triangle,
            OscShape::Triangle => OscShape::Sawtooth,
            OscShape::Sawtooth => OscShape::Sine,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            OscShape::Sine => "SINE",
            OscShape::Square => "SQUARE",
            OscShape::Triangle => "TRIANGLE",
            OscShape::Sawtooth => "SAWTOOTH",
        }
    }
}

/// Semantic input, already resolved from raw key events by the TUI.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    /// Toggle playback (start a sweep, or stop the running one).
    PlayPress,

    // knobs; deltas are in the unit of the parameter
    AdjustVolume(f32),
    AdjustBpm(f32),
    AdjustSpeed(f32),
    AdjustDuration(f32),

    /// Horizontal sweep step, 1-4.
    SetPixelStep(u8),

    CycleShape,
    CycleScale,

    /// Re-decode the current image from disk.
    ReloadImage,

    Quit,
}

/// Everything the TUI needs to draw one frame.
#[derive(Clone, Debug)]
pub struct DisplayState {
    pub playing: bool,
    /// Audio output could not be created; play retries instead of starting.
    pub blocked: bool,
    pub progress: f32,
    pub image_name: String,
    pub grid_w: usize,
    pub grid_h: usize,
    /// Cell currently being sonified, with its sampled color. None when idle.
    pub cursor: Option<(usize, usize, [u8; 4])>,
    pub volume: f32,
    pub bpm: f32,
    pub speed: f32,
    pub note_duration: f32,
    pub effective_duration: f32,
    pub pixel_step: u8,
    pub shape_label: &'static str,
    pub scale_label: &'static str,
    /// Error or hint text for the status line; empty when all is well.
    pub status_line: String,
}
