/// One stereo sample pair. The engine renders in these; the stream
/// callback fans them out to the device's channel count.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StereoFrame {
    pub left: f32,
    pub right: f32,
}

impl StereoFrame {
    pub fn zero() -> Self {
        Self::default()
    }

    /// Equal-weight fold-down for single-channel outputs.
    pub fn mono(self) -> f32 {
        0.5 * (self.left + self.right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mono_fold_averages_the_channels() {
        let f = StereoFrame { left: 1.0, right: 0.5 };
        assert_eq!(f.mono(), 0.75);
        assert_eq!(StereoFrame::zero().mono(), 0.0);
    }
}
