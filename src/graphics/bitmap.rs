use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{bail, Context, Result};
use image::codecs::hdr::HdrEncoder;
use image::Rgb;

/// Floating point image with `comp` channels, stored row by row and then layer by layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    pub width: usize,
    pub height: usize,
    /// Number of layers; 6 for cube map faces.
    pub depth: usize,
    pub comp: usize,
    data: Vec<f32>,
}

impl Bitmap {
    pub fn new(width: usize, height: usize, comp: usize) -> Result<Self> {
        Self::new_layers(width, height, 1, comp)
    }

    pub fn new_layers(width: usize, height: usize, depth: usize, comp: usize) -> Result<Self> {
        check_comp(comp)?;
        Ok(Self { width, height, depth, comp, data: vec![0.0; width * height * depth * comp] })
    }

    pub fn from_data(width: usize, height: usize, comp: usize, data: Vec<f32>) -> Result<Self> {
        check_comp(comp)?;
        let expected = width * height * comp;
        if data.len() != expected {
            bail!("{}x{}x{} bitmap needs {} values, got {}", width, height, comp, expected, data.len());
        }
        Ok(Self { width, height, depth: 1, comp, data })
    }

    /// Reads a Radiance HDR (or any other format `image` knows) as RGB floats.
    pub fn load_rgb(path: &Path) -> Result<Self> {
        let rgb = image::open(path)
            .with_context(|| format!("could not read `{}`", path.display()))?
            .into_rgb32f();
        let (width, height) = rgb.dimensions();
        Self::from_data(width as usize, height as usize, 3, rgb.into_raw())
    }

    /// Writes the first layer as Radiance HDR. Only RGB bitmaps can be written.
    pub fn save_hdr(&self, path: &Path) -> Result<()> {
        if self.comp != 3 {
            bail!("HDR snapshots need 3 channels, this bitmap has {}", self.comp);
        }

        let pixels: Vec<Rgb<f32>> = self.layer(0)
            .chunks_exact(3)
            .map(|p| Rgb([p[0], p[1], p[2]]))
            .collect();

        let file = File::create(path).with_context(|| format!("could not create `{}`", path.display()))?;
        HdrEncoder::new(BufWriter::new(file))
            .encode(&pixels, self.width, self.height)
            .with_context(|| format!("could not write `{}`", path.display()))?;

        log::info!("wrote {}x{} snapshot to {}", self.width, self.height, path.display());
        Ok(())
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    fn layer(&self, z: usize) -> &[f32] {
        let len = self.width * self.height * self.comp;
        &self.data[z * len..(z + 1) * len]
    }

    fn offset(&self, x: usize, y: usize, z: usize) -> usize {
        ((z * self.height + y) * self.width + x) * self.comp
    }

    /// Missing channels read as zero.
    pub fn pixel(&self, x: usize, y: usize) -> [f32; 4] {
        let at = self.offset(x, y, 0);
        let mut out = [0.0; 4];
        out[..self.comp].copy_from_slice(&self.data[at..at + self.comp]);
        out
    }

    /// Extra channels in `value` are ignored.
    pub fn set_pixel(&mut self, x: usize, y: usize, value: [f32; 4]) {
        self.set_pixel_in(x, y, 0, value)
    }

    pub fn set_pixel_in(&mut self, x: usize, y: usize, z: usize, value: [f32; 4]) {
        let at = self.offset(x, y, z);
        let comp = self.comp;
        self.data[at..at + comp].copy_from_slice(&value[..comp]);
    }
}

fn check_comp(comp: usize) -> Result<()> {
    if !(1..=4).contains(&comp) {
        bail!("bitmaps have 1 to 4 channels, not {}", comp);
    }
    Ok(())
}
