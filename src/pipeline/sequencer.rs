// The playback sequencer: a cooperative state machine that walks the
// playable grid in raster order and emits one note per visited cell. There
// are no wall-clock waits here — the owner feeds elapsed time into tick()
// (the main loop passes real frame deltas, tests pass synthetic ones) and
// the sequencer re-arms itself by counting down to the next step.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::audio_api::NoteParams;
use crate::loader::image_loader::PixelGrid;
use crate::pipeline::color::rgb_to_hsl;
use crate::pipeline::pitch;
use crate::pipeline::settings::Settings;

/// Extra per-step frequency jitter, Hz either side, on top of the mapper's
/// detune. Keeps long runs of identical pixels from phasing.
const STEP_JITTER_HZ: f32 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    Running,
}

/// One sweep step: the visited cell, its sampled color, and the note to play.
#[derive(Clone, Copy, Debug)]
pub struct StepEvent {
    pub x: usize,
    pub y: usize,
    pub rgba: [u8; 4],
    pub note: NoteParams,
}

pub struct Sequencer {
    phase: Phase,
    x: usize,
    y: usize,
    processed: usize,
    total: usize,
    /// Horizontal step, frozen at start(). A knob change mid-sweep would
    /// otherwise desync `total` and skip promised cells.
    stride: usize,
    /// Seconds until the next step fires; only meaningful while Running.
    until_next: f32,
    progress: f32,
    rng: Pcg32,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    /// Deterministic variant for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            phase: Phase::Idle,
            x: 0,
            y: 0,
            processed: 0,
            total: 0,
            stride: 1,
            until_next: 0.0,
            progress: 0.0,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    /// 0 after an explicit stop, 1.0 after a completed sweep.
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// The cell the next step will visit, while running.
    pub fn cursor(&self) -> Option<(usize, usize)> {
        (self.phase == Phase::Running).then_some((self.x, self.y))
    }

    /// Arms a fresh sweep over `grid`. Any prior session is cancelled first;
    /// the first step fires on the next tick (a zero-dt tick fires it
    /// immediately). Returns false for an empty grid.
    pub fn start(&mut self, grid: &PixelGrid, settings: &Settings) -> bool {
        self.stop();
        if grid.width == 0 || grid.height == 0 {
            return false;
        }
        self.stride = settings.pixel_step.max(1) as usize;
        self.total = grid.width.div_ceil(self.stride) * grid.height;
        self.phase = Phase::Running;
        self.until_next = 0.0;
        true
    }

    /// Cancels the session. Idempotent: stopping an idle sequencer is a
    /// no-op, and progress is left at 0 either way.
    pub fn stop(&mut self) {
        self.phase = Phase::Idle;
        self.x = 0;
        self.y = 0;
        self.processed = 0;
        self.total = 0;
        self.stride = 1;
        self.until_next = 0.0;
        self.progress = 0.0;
    }

    /// Advances virtual time and fires any due steps, strictly in raster
    /// order. A large dt can fire several steps in one call; cancellation is
    /// re-checked before every one.
    pub fn tick(&mut self, dt: f32, grid: &PixelGrid, settings: &Settings) -> Vec<StepEvent> {
        let mut events = Vec::new();
        if self.phase != Phase::Running {
            return events;
        }
        self.until_next -= dt.max(0.0);
        while self.phase == Phase::Running && self.until_next <= 0.0 {
            if let Some(ev) = self.step(grid, settings) {
                events.push(ev);
            }
        }
        events
    }

    fn step(&mut self, grid: &PixelGrid, settings: &Settings) -> Option<StepEvent> {
        if self.y >= grid.height {
            // swept past the last row: the session completes on the step
            // after the final note, one duration later
            self.complete();
            return None;
        }

        let (x, y) = (self.x, self.y);
        let rgba = grid.get(x, y);
        let hsl = rgb_to_hsl(rgba[0], rgba[1], rgba[2]);
        let tone = pitch::map(hsl.hue, hsl.lightness, settings.scale, &mut self.rng);
        let jitter = self.rng.gen_range(-STEP_JITTER_HZ..=STEP_JITTER_HZ);
        let duration = settings.effective_note_duration();

        let note = NoteParams {
            frequency: tone.frequency + jitter,
            harmonic_mult: tone.harmonic_mult,
            lightness: tone.lightness,
            duration,
            shape: settings.shape,
            volume: settings.volume,
        };

        // advance the cursor: left to right with the session's stride,
        // wrapping to the next row
        self.x += self.stride;
        if self.x >= grid.width {
            self.x = 0;
            self.y += 1;
        }

        self.processed += 1;
        if self.total > 0 {
            self.progress = (self.processed as f32 / self.total as f32).min(1.0);
        }
        self.until_next += duration;

        Some(StepEvent { x, y, rgba, note })
    }

    fn complete(&mut self) {
        self.phase = Phase::Idle;
        self.x = 0;
        self.y = 0;
        self.until_next = 0.0;
        // progress parks at 1.0 so the UI can show a finished sweep;
        // an explicit stop() is what resets it
        self.progress = 1.0;
    }
}
