// The image sampler: decode once, keep a preview for the terminal view and a
// small playable grid for sonification. The engine can't decode files (that
// would stall the audio thread), so everything here happens on the UI thread
// before playback starts.

use std::path::Path;

use anyhow::Context;
use image::{Rgba, RgbaImage, imageops::FilterType};

use crate::shared::MAX_PLAYABLE_SIZE;

/// Largest dimension of the display preview. Terminals have nowhere near
/// native image resolution, so this stands in for the "full-resolution copy".
const MAX_PREVIEW_SIZE: u32 = 96;

/// A plain RGBA pixel buffer with row-major layout.
#[derive(Clone, Debug)]
pub struct PixelGrid {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<[u8; 4]>,
}

impl PixelGrid {
    pub fn get(&self, x: usize, y: usize) -> [u8; 4] {
        self.pixels
            .get(y * self.width + x)
            .copied()
            .unwrap_or([0, 0, 0, 255])
    }

    fn from_rgba(img: &RgbaImage) -> Self {
        Self {
            width: img.width() as usize,
            height: img.height() as usize,
            pixels: img.pixels().map(|p| p.0).collect(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct LoadedImage {
    pub name: String,
    /// What the TUI draws.
    pub preview: PixelGrid,
    /// What the sequencer sweeps; each axis clamped to MAX_PLAYABLE_SIZE.
    pub grid: PixelGrid,
}

impl LoadedImage {
    /// Builds an image directly from pixels; used by tests and the test card.
    pub fn from_pixels(name: &str, width: u32, height: u32, pixels: Vec<[u8; 4]>) -> Self {
        assert_eq!(pixels.len(), (width * height) as usize);
        let mut img = RgbaImage::new(width, height);
        for (i, px) in pixels.iter().enumerate() {
            let x = i as u32 % width;
            let y = i as u32 / width;
            img.put_pixel(x, y, Rgba(*px));
        }
        from_decoded(name, img)
    }
}

/// Downsampled grid dimensions: uniform scale, never upscaled, never below
/// 1x1, larger axis clamped to `max_dim`.
pub fn playable_dims(width: u32, height: u32, max_dim: u32) -> (u32, u32) {
    let scale = (max_dim as f32 / width as f32)
        .min(max_dim as f32 / height as f32)
        .min(1.0);
    let w = ((width as f32 * scale).round() as u32).max(1);
    let h = ((height as f32 * scale).round() as u32).max(1);
    (w, h)
}

/// Decodes and samples an image from disk. Errors are reported to the caller
/// (the middle layer shows them and keeps the previous image); nothing here
/// panics on bad files.
pub fn load_image(path: &Path) -> anyhow::Result<LoadedImage> {
    let img = image::open(path)
        .with_context(|| format!("failed to decode image {}", path.display()))?
        .to_rgba8();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(from_decoded(&name, img))
}

fn from_decoded(name: &str, img: RgbaImage) -> LoadedImage {
    let grid = resample(&img, MAX_PLAYABLE_SIZE);
    let preview = resample(&img, MAX_PREVIEW_SIZE);
    LoadedImage {
        name: name.to_string(),
        preview,
        grid,
    }
}

fn resample(img: &RgbaImage, max_dim: u32) -> PixelGrid {
    let (w, h) = playable_dims(img.width(), img.height(), max_dim);
    if (w, h) == (img.width(), img.height()) {
        PixelGrid::from_rgba(img)
    } else {
        PixelGrid::from_rgba(&image::imageops::resize(img, w, h, FilterType::Triangle))
    }
}

/// A generated gradient so the demo runs without any assets on disk: hue
/// sweeps left to right, lightness bottom to top.
pub fn test_card() -> LoadedImage {
    let (w, h) = (96u32, 64u32);
    let img = RgbaImage::from_fn(w, h, |x, y| {
        let hue = x as f32 / (w - 1) as f32 * 360.0;
        let light = 0.15 + 0.7 * (1.0 - y as f32 / (h - 1) as f32);
        let (r, g, b) = hsl_to_rgb(hue, 0.9, light);
        Rgba([r, g, b, 255])
    });
    from_decoded("test card", img)
}

// Inverse of the analyzer's conversion, only used to paint the test card.
fn hsl_to_rgb(h: f32, s: f32, l: f32) -> (u8, u8, u8) {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = h / 60.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r, g, b) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    (
        ((r + m) * 255.0).round() as u8,
        ((g + m) * 255.0).round() as u8,
        ((b + m) * 255.0).round() as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playable_dims_respect_the_clamp() {
        for &(w, h) in &[
            (1u32, 1u32),
            (24, 24),
            (25, 25),
            (1920, 1080),
            (10000, 3),
            (3, 10000),
            (640, 1),
            (1, 640),
        ] {
            let (gw, gh) = playable_dims(w, h, MAX_PLAYABLE_SIZE);
            assert!(gw.max(gh) <= MAX_PLAYABLE_SIZE, "{w}x{h} -> {gw}x{gh}");
            assert!(gw >= 1 && gh >= 1, "{w}x{h} -> {gw}x{gh}");
        }
    }

    #[test]
    fn small_images_are_not_upscaled() {
        assert_eq!(playable_dims(10, 6, MAX_PLAYABLE_SIZE), (10, 6));
        assert_eq!(playable_dims(24, 12, MAX_PLAYABLE_SIZE), (24, 12));
    }

    #[test]
    fn aspect_ratio_is_roughly_kept() {
        let (w, h) = playable_dims(1920, 1080, MAX_PLAYABLE_SIZE);
        assert_eq!(w, 24);
        assert!((13..=14).contains(&h));
    }

    #[test]
    fn from_pixels_keeps_tiny_grids_exact() {
        let img = LoadedImage::from_pixels(
            "two",
            2,
            1,
            vec![[255, 0, 0, 255], [0, 0, 255, 255]],
        );
        assert_eq!(img.grid.width, 2);
        assert_eq!(img.grid.height, 1);
        assert_eq!(img.grid.get(0, 0), [255, 0, 0, 255]);
        assert_eq!(img.grid.get(1, 0), [0, 0, 255, 255]);
    }

    #[test]
    fn out_of_bounds_get_is_opaque_black() {
        let img = LoadedImage::from_pixels("one", 1, 1, vec![[9, 9, 9, 255]]);
        assert_eq!(img.grid.get(5, 5), [0, 0, 0, 255]);
    }

    #[test]
    fn test_card_is_playable() {
        let card = test_card();
        assert!(card.grid.width.max(card.grid.height) <= MAX_PLAYABLE_SIZE as usize);
        assert!(card.grid.width >= 1 && card.grid.height >= 1);
        assert!(!card.preview.pixels.is_empty());
    }

    #[test]
    fn decode_failure_is_an_error_not_a_panic() {
        assert!(load_image(Path::new("/no/such/image.png")).is_err());
    }
}
