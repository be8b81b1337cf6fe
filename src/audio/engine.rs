// Fixed-pool polyphony behind the command channel. The engine owns the
// voices and the shared graph; the output callback drains commands and
// asks for blocks, nothing else touches audio state.

use crossbeam_channel::Receiver;

use crate::audio_api::AudioCommand;
use crate::audio::frame::StereoFrame;
use crate::audio::graph::AudioGraph;
use crate::audio::voice::NoteVoice;

/// Hard cap on simultaneous notes. A full 24x24 sweep at high bpm stays
/// well under this; beyond it the oldest voice is stolen.
const MAX_VOICES: usize = 64;

pub struct Engine {
    rx: Receiver<AudioCommand>,
    sample_rate: f32,
    volume: f32,
    /// Built on the first note, not at stream start. Impulse rendering and
    /// FFT planning happen once, then every block reuses the plan.
    graph: Option<AudioGraph>,
    voices: Vec<NoteVoice>,
    dry: Vec<f32>,
    wet: Vec<f32>,
}

impl Engine {
    pub fn new(rx: Receiver<AudioCommand>, sample_rate: f32, volume: f32) -> Self {
        Self {
            rx,
            sample_rate,
            volume,
            graph: None,
            voices: Vec::with_capacity(MAX_VOICES),
            dry: Vec::new(),
            wet: Vec::new(),
        }
    }

    fn handle_cmd(&mut self, cmd: AudioCommand) {
        match cmd {
            AudioCommand::PlayNote(params) => {
                let voice = NoteVoice::new(params, self.sample_rate);
                if self.voices.len() < MAX_VOICES {
                    self.voices.push(voice);
                } else if let Some(oldest) = self
                    .voices
                    .iter_mut()
                    .min_by_key(|v| v.remaining())
                {
                    *oldest = voice;
                }
                if self.graph.is_none() {
                    self.graph = Some(AudioGraph::new(self.sample_rate, self.volume));
                }
            }
            AudioCommand::SetVolume(v) => {
                self.volume = v;
                if let Some(graph) = &mut self.graph {
                    graph.set_volume(v);
                }
            }
            AudioCommand::StopAll => {
                // notes vanish immediately; the reverb tail rings out
                self.voices.clear();
            }
        }
    }

    /// Renders one output block. Called from the audio thread only.
    pub fn render_block(&mut self, out: &mut [StereoFrame]) {
        while let Ok(cmd) = self.rx.try_recv() {
            self.handle_cmd(cmd);
        }

        let n = out.len();
        if self.dry.len() < n {
            self.dry.resize(n, 0.0);
            self.wet.resize(n, 0.0);
        }
        self.dry[..n].fill(0.0);
        self.wet[..n].fill(0.0);

        for voice in &mut self.voices {
            voice.render_into(&mut self.dry[..n], &mut self.wet[..n]);
        }
        self.voices.retain(|v| v.active);

        match &mut self.graph {
            Some(graph) => graph.process_block(&self.dry[..n], &self.wet[..n], out),
            None => out.fill(StereoFrame::zero()),
        }
    }
}
