// End-to-end sweeps through the middle layer: a tiny known image goes in,
// and the note stream, progress, and rendered audio come out. No terminal
// and no audio device are involved; virtual time drives everything.

use crossbeam_channel::unbounded;

use pixeltone::audio::{Engine, StereoFrame};
use pixeltone::audio_api::AudioCommand;
use pixeltone::loader::image_loader::LoadedImage;
use pixeltone::middle::Middle;
use pixeltone::pipeline::settings::Settings;
use pixeltone::shared::InputEvent;

/// Root of the default Major scale.
const ROOT_HZ: f32 = 261.63;

/// Mapper detune plus sequencer jitter, either side.
const FREQ_SLOP: f32 = 2.7;

fn red_blue_image() -> LoadedImage {
    // pure red (hue 0) and pure blue (hue 240), both at 50% lightness
    LoadedImage::from_pixels("duo", 2, 1, vec![[255, 0, 0, 255], [0, 0, 255, 255]])
}

fn drive(middle: &mut Middle, seconds: f32) -> Vec<AudioCommand> {
    let mut cmds = Vec::new();
    let mut t = 0.0;
    while t < seconds {
        cmds.extend(middle.tick(0.05));
        t += 0.05;
    }
    cmds
}

#[test]
fn a_two_pixel_sweep_plays_the_expected_melody() {
    let mut middle = Middle::new(Settings::default(), red_blue_image(), None);
    middle.handle_input(InputEvent::PlayPress);
    assert!(middle.display_state().playing);

    let cmds = drive(&mut middle, 2.0);
    let notes: Vec<_> = cmds
        .iter()
        .filter_map(|c| match c {
            AudioCommand::PlayNote(p) => Some(*p),
            _ => None,
        })
        .collect();
    assert_eq!(notes.len(), 2, "one note per pixel");

    // hue 0 lands on the scale root, hue 240 five degrees up (A at 440)
    assert!((notes[0].frequency - ROOT_HZ).abs() < FREQ_SLOP);
    assert!((notes[1].frequency - 440.0).abs() < FREQ_SLOP);

    // 50% lightness pixels sit mid-range
    for note in &notes {
        assert!((note.lightness - 50.0).abs() < 1.0);
        assert!(note.harmonic_mult == 1.0 || note.harmonic_mult == 1.5 || note.harmonic_mult == 2.0);
    }

    let ds = middle.display_state();
    assert!(!ds.playing, "sweep completed");
    assert_eq!(ds.progress, 1.0, "progress parks at full");
    assert_eq!(ds.cursor, None);
}

#[test]
fn progress_counts_visited_cells_and_stop_resets_it() {
    let mut middle = Middle::new(Settings::default(), red_blue_image(), None);
    middle.handle_input(InputEvent::PlayPress);

    // first step fires immediately
    let first = middle.tick(0.0);
    assert_eq!(first.len(), 1);
    assert!((middle.display_state().progress - 0.5).abs() < 1e-6);

    // stopping mid-sweep flushes the engine and rewinds progress
    let cmds = middle.handle_input(InputEvent::PlayPress);
    assert!(matches!(cmds.as_slice(), [AudioCommand::StopAll]));
    assert_eq!(middle.display_state().progress, 0.0);

    // nothing fires after the stop
    assert!(drive(&mut middle, 1.0).is_empty());
}

#[test]
fn restarting_mid_sweep_begins_again_from_the_first_cell() {
    let mut middle = Middle::new(Settings::default(), red_blue_image(), None);
    middle.handle_input(InputEvent::PlayPress);
    middle.tick(0.0);
    assert_eq!(middle.display_state().cursor.map(|(x, y, _)| (x, y)), Some((0, 0)));

    // stop, then start a fresh sweep: the red root note plays again
    middle.handle_input(InputEvent::PlayPress);
    middle.handle_input(InputEvent::PlayPress);
    let cmds = middle.tick(0.0);
    match cmds.as_slice() {
        [AudioCommand::PlayNote(p)] => {
            assert!((p.frequency - ROOT_HZ).abs() < FREQ_SLOP);
        }
        other => panic!("expected one note, got {other:?}"),
    }
}

#[test]
fn knob_changes_shape_the_emitted_notes() {
    let mut settings = Settings::default();
    settings.note_duration = 0.1;
    let mut middle = Middle::new(settings, red_blue_image(), None);

    middle.handle_input(InputEvent::CycleShape); // sawtooth -> sine
    middle.handle_input(InputEvent::AdjustVolume(-0.5));
    middle.handle_input(InputEvent::PlayPress);

    let cmds = drive(&mut middle, 1.0);
    let mut saw_note = false;
    for cmd in &cmds {
        if let AudioCommand::PlayNote(p) = cmd {
            saw_note = true;
            assert_eq!(p.shape, pixeltone::shared::OscShape::Sine);
            assert!((p.volume - 0.4).abs() < 1e-6);
            assert!((p.duration - 0.1).abs() < 1e-6);
        }
    }
    assert!(saw_note);
}

#[test]
fn the_note_stream_renders_to_audible_audio_without_a_device() {
    let mut middle = Middle::new(Settings::default(), red_blue_image(), None);
    let (tx, rx) = unbounded();
    let mut engine = Engine::new(rx, 44_100.0, middle.settings.volume);

    middle.handle_input(InputEvent::PlayPress);
    for cmd in drive(&mut middle, 2.0) {
        tx.send(cmd).unwrap();
    }

    let mut out = vec![StereoFrame::zero(); 44_100];
    engine.render_block(&mut out);

    let peak = out
        .iter()
        .map(|f| f.left.abs().max(f.right.abs()))
        .fold(0.0f32, f32::max);
    assert!(peak > 0.01, "sweep produced silence (peak {peak})");
    assert!(out.iter().all(|f| f.left.is_finite() && f.right.is_finite()));
}
