/// Color descriptor for one sampled pixel. Saturation is computed for
/// completeness but nothing downstream reads it yet.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hsl {
    /// 0-360 degrees.
    pub hue: f32,
    /// 0-100 percent.
    pub saturation: f32,
    /// 0-100 percent.
    pub lightness: f32,
}

/// Standard max/min-channel RGB to HSL conversion. Pure and total: every
/// input produces finite values in range.
pub fn rgb_to_hsl(r: u8, g: u8, b: u8) -> Hsl {
    let r = r as f32 / 255.0;
    let g = g as f32 / 255.0;
    let b = b as f32 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let mut hue = 0.0;
    if delta != 0.0 {
        hue = if max == r {
            ((g - b) / delta) % 6.0
        } else if max == g {
            (b - r) / delta + 2.0
        } else {
            (r - g) / delta + 4.0
        };
        hue *= 60.0;
        if hue < 0.0 {
            hue += 360.0;
        }
    }

    let l = (max + min) / 2.0;
    let s = if delta == 0.0 {
        0.0
    } else {
        // near white or black the denominator approaches delta and rounding
        // can push the ratio past 1
        (delta / (1.0 - (2.0 * l - 1.0).abs())).min(1.0)
    };

    Hsl {
        hue,
        saturation: s * 100.0,
        lightness: l * 100.0,
    }
}
