use std::path::Path;

use anyhow::{Context, Result};

/// Tightly packed 8-bit RGB pixels, top row first.
#[derive(Debug, Clone)]
pub struct Rgb8Image {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Rgb8Image {
    /// Decodes `path`, or falls back to a checkerboard when no image was given.
    pub fn load_or_checkerboard(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::checkerboard(256, 32)),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let rgb = image::open(path)
            .with_context(|| format!("could not read image `{}`", path.display()))?
            .into_rgb8();
        let (width, height) = rgb.dimensions();
        log::info!("loaded {}x{} image from {}", width, height, path.display());

        Ok(Self { width, height, pixels: rgb.into_raw() })
    }

    pub fn checkerboard(size: u32, cell: u32) -> Self {
        let cell = cell.max(1);
        let mut pixels = Vec::with_capacity(size as usize * size as usize * 3);
        for y in 0..size {
            for x in 0..size {
                let shade = if (x / cell + y / cell) % 2 == 0 { 0xe0 } else { 0x30 };
                pixels.extend_from_slice(&[shade, shade, shade]);
            }
        }

        Self { width: size, height: size, pixels }
    }
}
