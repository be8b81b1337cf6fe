use std::path::PathBuf;
use std::time::Instant;

use crossterm::terminal;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use pixeltone::audio::{self, AudioHandle};
use pixeltone::audio_api::AudioCommand;
use pixeltone::loader::image_loader;
use pixeltone::middle::Middle;
use pixeltone::pipeline::settings::Settings;
use pixeltone::shared::InputEvent;
use pixeltone::tui;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let work_dir = std::env::current_dir().unwrap_or_default();
    let settings = Settings::load(&work_dir);

    let image_path: Option<PathBuf> = std::env::args().nth(1).map(PathBuf::from);
    let (image, image_path, mut load_error) = match &image_path {
        Some(path) => match image_loader::load_image(path) {
            Ok(img) => (img, image_path.clone(), None),
            Err(e) => (
                image_loader::test_card(),
                None,
                Some(format!("could not load {}: {e}", path.display())),
            ),
        },
        None => (image_loader::test_card(), None, None),
    };

    let mut middle = Middle::new(settings, image, image_path);

    // no output device is not fatal: the UI runs, play retries the stream
    let mut audio: Option<AudioHandle> = match audio::start_audio(middle.settings.volume) {
        Ok(handle) => Some(handle),
        Err(e) => {
            load_error.get_or_insert(format!("audio unavailable: {e}"));
            middle.set_blocked(true);
            None
        }
    };

    terminal::enable_raw_mode()?;
    let _guard = RawModeGuard; // auto drops when out of scope
    let backend = CrosstermBackend::new(std::io::stdout());
    let mut term = Terminal::new(backend)?;
    term.clear()?;

    if let Some(msg) = load_error {
        // after raw mode the eprintln would be eaten; route it to the UI
        middle.set_status(msg);
    }

    let tick_rate = std::time::Duration::from_millis(16); // ~60fps
    let mut last_tick = Instant::now();

    loop {
        let ds = middle.display_state();
        term.draw(|frame| {
            tui::view::render(frame, frame.area(), &ds, &middle.image().preview);
        })?;

        let events = tui::input::poll_input(tick_rate)?;
        for event in events {
            if event == InputEvent::Quit {
                drop(term);
                return Ok(());
            }
            for cmd in middle.handle_input(event) {
                send(&audio, cmd);
            }
        }

        // a play press while blocked asks for another shot at the device
        if middle.take_retry_request() {
            match audio::start_audio(middle.settings.volume) {
                Ok(handle) => {
                    audio = Some(handle);
                    middle.set_blocked(false);
                }
                Err(e) => middle.set_status(format!("audio still unavailable: {e}")),
            }
        }

        let elapsed = last_tick.elapsed().as_secs_f32();
        last_tick = Instant::now();
        for cmd in middle.tick(elapsed) {
            send(&audio, cmd);
        }
    }
}

fn send(audio: &Option<AudioHandle>, cmd: AudioCommand) {
    if let Some(handle) = audio {
        handle.send(cmd);
    }
}

struct RawModeGuard;
impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}
