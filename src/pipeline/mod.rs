pub mod color;
pub mod pitch;
pub mod scale;
pub mod sequencer;
pub mod settings;
