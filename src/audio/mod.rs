use anyhow::Context;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};

use crate::audio_api::AudioCommand;

mod engine;
mod frame;
mod graph;
mod reverb;
mod voice;

pub use engine::Engine;
pub use frame::StereoFrame;
pub use graph::AudioGraph;
pub use reverb::{Convolver, ReverbImpulse};
pub use voice::NoteVoice;

pub struct AudioHandle {
    tx: Sender<AudioCommand>,
    _output_stream: cpal::Stream,
}

impl AudioHandle {
    pub fn send(&self, cmd: AudioCommand) {
        let _ = self.tx.try_send(cmd);
    }
}

/// Opens the default output device and hands the engine to its callback.
/// Fails when the machine has no usable output; the caller stays alive in
/// a blocked state and may retry.
pub fn start_audio(initial_volume: f32) -> anyhow::Result<AudioHandle> {
    let (tx, rx) = crossbeam_channel::bounded::<AudioCommand>(1024);

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .context("no default output device")?;
    let config = device
        .default_output_config()
        .context("no default output config")?;

    let sample_rate = config.sample_rate() as f32;
    let channels = config.channels() as usize;

    match config.sample_format() {
        cpal::SampleFormat::F32 => {
            let output_stream = build_output_stream_f32(
                &device,
                &config.into(),
                rx,
                sample_rate,
                initial_volume,
                channels,
            )?;
            output_stream
                .play()
                .context("failed to play output stream")?;

            Ok(AudioHandle {
                tx,
                _output_stream: output_stream,
            })
        }
        _ => anyhow::bail!("unsupported sample format (only f32 supported for now)"),
    }
}

fn build_output_stream_f32(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    rx: Receiver<AudioCommand>,
    sample_rate: f32,
    initial_volume: f32,
    channels: usize,
) -> anyhow::Result<cpal::Stream> {
    let mut engine = Engine::new(rx, sample_rate, initial_volume);
    let mut frames: Vec<StereoFrame> = Vec::new();

    let err_fn = |err| eprintln!("audio output stream error: {err}");

    let stream = device.build_output_stream(
        config,
        move |data: &mut [f32], _info| {
            let n_frames = data.len() / channels.max(1);
            if frames.len() < n_frames {
                frames.resize(n_frames, StereoFrame::zero());
            }
            engine.render_block(&mut frames[..n_frames]);

            // fan the stereo mix out to however many channels the device has
            for (chunk, frame) in data.chunks_mut(channels.max(1)).zip(&frames) {
                match chunk {
                    [mono] => *mono = frame.mono(),
                    [left, right, rest @ ..] => {
                        *left = frame.left;
                        *right = frame.right;
                        rest.fill(0.0);
                    }
                    [] => {}
                }
            }
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}
