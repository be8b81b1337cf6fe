// The middle layer: owns the settings, the loaded image, and the sweep
// sequencer. The TUI pushes InputEvents in and reads a DisplayState back;
// everything audible leaves as AudioCommands for the engine. No audio or
// terminal handles live here, which keeps the whole layer testable.

use std::path::PathBuf;

use crate::audio_api::AudioCommand;
use crate::loader::image_loader::{self, LoadedImage};
use crate::pipeline::sequencer::Sequencer;
use crate::pipeline::settings::Settings;
use crate::shared::{DisplayState, InputEvent};

pub struct Middle {
    pub settings: Settings,
    sequencer: Sequencer,
    image: LoadedImage,
    /// Where the image came from; None for the built-in test card.
    image_path: Option<PathBuf>,
    /// Last cell the sweep visited, with its sampled color.
    last_cell: Option<(usize, usize, [u8; 4])>,
    /// Set when the audio stream could not be opened.
    blocked: bool,
    /// Play was pressed while blocked; the main loop retries the stream.
    retry_requested: bool,
    status: String,
}

impl Middle {
    pub fn new(settings: Settings, image: LoadedImage, image_path: Option<PathBuf>) -> Self {
        Self {
            settings,
            sequencer: Sequencer::new(),
            image,
            image_path,
            last_cell: None,
            blocked: false,
            retry_requested: false,
            status: String::new(),
        }
    }

    #[cfg(test)]
    fn with_seed(settings: Settings, image: LoadedImage, seed: u64) -> Self {
        let mut m = Self::new(settings, image, None);
        m.sequencer = Sequencer::with_seed(seed);
        m
    }

    pub fn set_blocked(&mut self, blocked: bool) {
        self.blocked = blocked;
        if blocked {
            self.status = "audio unavailable - press space to retry".to_string();
        } else {
            self.status.clear();
        }
    }

    pub fn set_status(&mut self, status: String) {
        self.status = status;
    }

    /// True once per blocked play press; the caller retries start_audio.
    pub fn take_retry_request(&mut self) -> bool {
        std::mem::take(&mut self.retry_requested)
    }

    pub fn handle_input(&mut self, event: InputEvent) -> Vec<AudioCommand> {
        let mut cmds = Vec::new();
        match event {
            InputEvent::PlayPress => {
                if self.blocked {
                    self.retry_requested = true;
                } else if self.sequencer.is_running() {
                    self.sequencer.stop();
                    self.last_cell = None;
                    cmds.push(AudioCommand::StopAll);
                } else if self.sequencer.start(&self.image.grid, &self.settings) {
                    self.last_cell = None;
                    self.status.clear();
                } else {
                    self.status = "image has no playable pixels".to_string();
                }
            }
            InputEvent::AdjustVolume(d) => {
                self.settings.adjust_volume(d);
                cmds.push(AudioCommand::SetVolume(self.settings.volume));
            }
            InputEvent::AdjustBpm(d) => self.settings.adjust_bpm(d),
            InputEvent::AdjustSpeed(d) => self.settings.adjust_speed(d),
            InputEvent::AdjustDuration(d) => self.settings.adjust_duration(d),
            InputEvent::SetPixelStep(step) => {
                self.settings.set_pixel_step(step);
                // a running sweep keeps its old step; restart picks it up
            }
            InputEvent::CycleShape => self.settings.shape = self.settings.shape.next(),
            InputEvent::CycleScale => self.settings.scale = self.settings.scale.next(),
            InputEvent::ReloadImage => {
                self.reload_image();
                cmds.push(AudioCommand::StopAll);
            }
            InputEvent::Quit => {}
        }
        cmds
    }

    /// Advances the sweep by `dt` seconds of virtual time. Every due step
    /// becomes a PlayNote command and moves the display cursor.
    pub fn tick(&mut self, dt: f32) -> Vec<AudioCommand> {
        let was_running = self.sequencer.is_running();
        let events = self.sequencer.tick(dt, &self.image.grid, &self.settings);

        let mut cmds = Vec::with_capacity(events.len());
        for ev in events {
            self.last_cell = Some((ev.x, ev.y, ev.rgba));
            cmds.push(AudioCommand::PlayNote(ev.note));
        }

        // completed naturally: clear the cursor, progress stays parked at 1
        if was_running && !self.sequencer.is_running() {
            self.last_cell = None;
        }
        cmds
    }

    fn reload_image(&mut self) {
        self.sequencer.stop();
        self.last_cell = None;
        match &self.image_path {
            Some(path) => match image_loader::load_image(path) {
                Ok(img) => {
                    self.image = img;
                    self.status = format!("reloaded {}", self.image.name);
                }
                Err(e) => {
                    self.status = format!("reload failed: {e}");
                }
            },
            None => {
                self.image = image_loader::test_card();
                self.status = "reloaded test card".to_string();
            }
        }
    }

    pub fn display_state(&self) -> DisplayState {
        DisplayState {
            playing: self.sequencer.is_running(),
            blocked: self.blocked,
            progress: self.sequencer.progress(),
            image_name: self.image.name.clone(),
            grid_w: self.image.grid.width,
            grid_h: self.image.grid.height,
            cursor: self.last_cell,
            volume: self.settings.volume,
            bpm: self.settings.bpm,
            speed: self.settings.speed,
            note_duration: self.settings.note_duration,
            effective_duration: self.settings.effective_note_duration(),
            pixel_step: self.settings.pixel_step,
            shape_label: self.settings.shape.label(),
            scale_label: self.settings.scale.label(),
            status_line: self.status.clone(),
        }
    }

    pub fn image(&self) -> &LoadedImage {
        &self.image
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::image_loader::LoadedImage;

    fn two_pixel_image() -> LoadedImage {
        LoadedImage::from_pixels(
            "duo",
            2,
            1,
            vec![[255, 0, 0, 255], [0, 0, 255, 255]],
        )
    }

    fn middle() -> Middle {
        Middle::with_seed(Settings::default(), two_pixel_image(), 7)
    }

    #[test]
    fn play_toggles_and_stop_flushes_voices() {
        let mut m = middle();
        assert!(m.handle_input(InputEvent::PlayPress).is_empty());
        assert!(m.display_state().playing);

        let cmds = m.handle_input(InputEvent::PlayPress);
        assert!(matches!(cmds.as_slice(), [AudioCommand::StopAll]));
        assert!(!m.display_state().playing);
        assert_eq!(m.display_state().progress, 0.0);
    }

    #[test]
    fn ticking_a_sweep_emits_notes_and_moves_the_cursor() {
        let mut m = middle();
        m.handle_input(InputEvent::PlayPress);

        let cmds = m.tick(0.0);
        assert_eq!(cmds.len(), 1);
        assert!(matches!(cmds[0], AudioCommand::PlayNote(_)));
        let ds = m.display_state();
        assert_eq!(ds.cursor, Some((0, 0, [255, 0, 0, 255])));
        assert!(ds.progress > 0.0 && ds.progress < 1.0);
    }

    #[test]
    fn natural_completion_parks_progress_and_clears_the_cursor() {
        let mut m = middle();
        m.handle_input(InputEvent::PlayPress);
        // long enough for both cells at default duration
        let mut notes = 0;
        for _ in 0..20 {
            notes += m.tick(0.3).len();
        }
        assert_eq!(notes, 2);
        let ds = m.display_state();
        assert!(!ds.playing);
        assert_eq!(ds.progress, 1.0);
        assert_eq!(ds.cursor, None);
    }

    #[test]
    fn volume_knob_reaches_the_engine_clamped() {
        let mut m = middle();
        let cmds = m.handle_input(InputEvent::AdjustVolume(0.5));
        assert!(matches!(cmds.as_slice(), [AudioCommand::SetVolume(v)] if *v == 1.0));
    }

    #[test]
    fn blocked_play_asks_for_a_retry_instead_of_starting() {
        let mut m = middle();
        m.set_blocked(true);
        let cmds = m.handle_input(InputEvent::PlayPress);
        assert!(cmds.is_empty());
        assert!(!m.display_state().playing);
        assert!(m.take_retry_request());
        // the request is one-shot
        assert!(!m.take_retry_request());
    }

    #[test]
    fn cycling_knobs_updates_the_display_labels() {
        let mut m = middle();
        let before = m.display_state();
        m.handle_input(InputEvent::CycleShape);
        m.handle_input(InputEvent::CycleScale);
        let after = m.display_state();
        assert_ne!(before.shape_label, after.shape_label);
        assert_ne!(before.scale_label, after.scale_label);
    }

    #[test]
    fn reload_without_a_path_falls_back_to_the_test_card() {
        let mut m = middle();
        m.handle_input(InputEvent::PlayPress);
        let cmds = m.handle_input(InputEvent::ReloadImage);
        assert!(matches!(cmds.as_slice(), [AudioCommand::StopAll]));
        assert!(!m.display_state().playing);
        assert_eq!(m.image().name, "test card");
    }
}
