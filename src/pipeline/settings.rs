// The configuration surface. Knob adjustments clamp into the recognized
// ranges; an optional pixeltone.json in the working directory overrides the
// defaults at startup. The file is only ever read — settings are not
// persisted back.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::pipeline::scale::ScaleName;
use crate::shared::{MAX_NOTE_DURATION, MIN_NOTE_DURATION, OscShape};

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Settings {
    /// Master volume control value, 0-1.
    pub volume: f32,
    /// 40-240; only feeds the derived note duration.
    pub bpm: f32,
    /// 0.1-2 multiplier on the BPM-derived duration.
    pub speed: f32,
    /// Explicit per-note duration in seconds; wins over the derived one.
    pub note_duration: f32,
    /// Horizontal sweep step in grid cells, 1-4.
    pub pixel_step: u8,
    pub shape: OscShape,
    pub scale: ScaleName,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            volume: 0.9,
            bpm: 160.0,
            speed: 0.5,
            note_duration: 0.25,
            pixel_step: 1,
            shape: OscShape::Sawtooth,
            scale: ScaleName::Major,
        }
    }
}

impl Settings {
    /// Defaults, overridden by `pixeltone.json` next to the working directory
    /// when present and parseable. Unknown or missing fields keep defaults.
    pub fn load(dir: &Path) -> Self {
        let path = dir.join("pixeltone.json");
        let Ok(data) = std::fs::read_to_string(&path) else {
            return Self::default();
        };
        match serde_json::from_str::<Overrides>(&data) {
            Ok(o) => {
                let mut s = Self::default();
                o.apply(&mut s);
                s.clamp_all();
                s
            }
            Err(e) => {
                eprintln!("pixeltone: ignoring malformed {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn adjust_volume(&mut self, delta: f32) {
        self.volume = (self.volume + delta).clamp(0.0, 1.0);
    }

    pub fn adjust_bpm(&mut self, delta: f32) {
        self.bpm = (self.bpm + delta).clamp(40.0, 240.0);
    }

    pub fn adjust_speed(&mut self, delta: f32) {
        self.speed = (self.speed + delta).clamp(0.1, 2.0);
    }

    pub fn adjust_duration(&mut self, delta: f32) {
        self.note_duration = (self.note_duration + delta).clamp(MIN_NOTE_DURATION, MAX_NOTE_DURATION);
    }

    pub fn set_pixel_step(&mut self, step: u8) {
        self.pixel_step = step.clamp(1, 4);
    }

    /// Seconds between sweep steps, which is also the note duration.
    ///
    /// The explicit duration is clamped first, so even a zero or negative
    /// value resolves to the minimum and wins; the BPM/speed-derived
    /// fallback applies only when the explicit value is not a number at all.
    pub fn effective_note_duration(&self) -> f32 {
        if self.note_duration.is_finite() {
            self.note_duration.clamp(MIN_NOTE_DURATION, MAX_NOTE_DURATION)
        } else {
            ((60.0 / self.bpm) * self.speed).min(MAX_NOTE_DURATION)
        }
    }

    fn clamp_all(&mut self) {
        self.volume = self.volume.clamp(0.0, 1.0);
        self.bpm = self.bpm.clamp(40.0, 240.0);
        self.speed = self.speed.clamp(0.1, 2.0);
        if self.note_duration.is_finite() {
            self.note_duration = self.note_duration.clamp(MIN_NOTE_DURATION, MAX_NOTE_DURATION);
        }
        self.pixel_step = self.pixel_step.clamp(1, 4);
    }
}

/// Partial settings as found in pixeltone.json; every field optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Overrides {
    volume: Option<f32>,
    bpm: Option<f32>,
    speed: Option<f32>,
    note_duration: Option<f32>,
    pixel_step: Option<u8>,
    shape: Option<OscShape>,
    scale: Option<ScaleName>,
}

impl Overrides {
    fn apply(&self, s: &mut Settings) {
        if let Some(v) = self.volume {
            s.volume = v;
        }
        if let Some(v) = self.bpm {
            s.bpm = v;
        }
        if let Some(v) = self.speed {
            s.speed = v;
        }
        if let Some(v) = self.note_duration {
            s.note_duration = v;
        }
        if let Some(v) = self.pixel_step {
            s.pixel_step = v;
        }
        if let Some(v) = self.shape {
            s.shape = v;
        }
        if let Some(v) = self.scale {
            s.scale = v;
        }
    }
}
