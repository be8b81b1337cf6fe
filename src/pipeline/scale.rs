use serde::{Deserialize, Serialize};

/// Canonical root every scale here is built on (middle C, Hz). Also the
/// fallback when a mapped frequency degenerates.
pub const ROOT_HZ: f32 = 261.63;

// C-rooted note tables, one octave plus the upper C.
static MAJOR: [f32; 6] = [261.63, 293.66, 329.63, 392.0, 440.0, 523.25];
static MINOR: [f32; 6] = [261.63, 293.66, 311.13, 392.0, 415.3, 523.25];
static PENTATONIC: [f32; 6] = [261.63, 293.66, 349.23, 392.0, 466.16, 523.25];
static BLUES: [f32; 7] = [261.63, 293.66, 311.13, 349.23, 392.0, 466.16, 523.25];
static CHROMATIC: [f32; 13] = [
    261.63, 277.18, 293.66, 311.13, 329.63, 349.23, 369.99, 392.0, 415.3, 440.0, 466.16, 493.88,
    523.25,
];
static WHOLE_TONE: [f32; 7] = [261.63, 293.66, 329.63, 369.99, 415.3, 466.16, 523.25];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScaleName {
    #[default]
    Major,
    Minor,
    Pentatonic,
    Blues,
    Chromatic,
    WholeTone,
}

impl ScaleName {
    pub fn next(self) -> Self {
        match self {
            ScaleName::Major => ScaleName::Minor,
            ScaleName::Minor => ScaleName::Pentatonic,
            ScaleName::Pentatonic => ScaleName::Blues,
            ScaleName::Blues => ScaleName::Chromatic,
            ScaleName::Chromatic => ScaleName::WholeTone,
            ScaleName::WholeTone => ScaleName::Major,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScaleName::Major => "MAJOR",
            ScaleName::Minor => "MINOR",
            ScaleName::Pentatonic => "PENTA",
            ScaleName::Blues => "BLUES",
            ScaleName::Chromatic => "CHROM",
            ScaleName::WholeTone => "WHOLE",
        }
    }

    /// Base frequencies for this scale, read-only.
    pub fn notes(self) -> &'static [f32] {
        match self {
            ScaleName::Major => &MAJOR,
            ScaleName::Minor => &MINOR,
            ScaleName::Pentatonic => &PENTATONIC,
            ScaleName::Blues => &BLUES,
            ScaleName::Chromatic => &CHROMATIC,
            ScaleName::WholeTone => &WHOLE_TONE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ScaleName; 6] = [
        ScaleName::Major,
        ScaleName::Minor,
        ScaleName::Pentatonic,
        ScaleName::Blues,
        ScaleName::Chromatic,
        ScaleName::WholeTone,
    ];

    #[test]
    fn every_scale_is_rooted_and_ascending() {
        for name in ALL {
            let notes = name.notes();
            assert!(notes.len() >= 6);
            assert_eq!(notes[0], ROOT_HZ);
            for w in notes.windows(2) {
                assert!(w[0] < w[1], "{:?} is not ascending", name);
            }
        }
    }

    #[test]
    fn cycle_visits_all_six() {
        let mut name = ScaleName::Major;
        for _ in 0..5 {
            name = name.next();
        }
        assert_eq!(name, ScaleName::WholeTone);
        assert_eq!(name.next(), ScaleName::Major);
    }
}
