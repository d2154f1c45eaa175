//! Decoded pixel buffers handed to the histogram and fusion stages.

use crate::errors::BracketError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Interleaved channel layout of a [`Raster`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelLayout {
    Gray,
    Rgb,
}

impl PixelLayout {
    pub fn channels(self) -> usize {
        match self {
            PixelLayout::Gray => 1,
            PixelLayout::Rgb => 3,
        }
    }

    pub fn from_channels(channels: usize) -> Result<Self, BracketError> {
        match channels {
            1 => Ok(PixelLayout::Gray),
            3 => Ok(PixelLayout::Rgb),
            other => Err(BracketError::UnsupportedChannels(other)),
        }
    }
}

/// An 8-bit image, row-major with interleaved channels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Raster {
    pub width: u32,
    pub height: u32,
    pub layout: PixelLayout,
    pub data: Vec<u8>,
}

impl Raster {
    /// Wrap a pixel buffer, checking its length against the dimensions
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        layout: PixelLayout,
    ) -> Result<Self, BracketError> {
        let expected_len = width as usize * height as usize * layout.channels();
        if data.len() != expected_len {
            return Err(BracketError::DataCorruption {
                data_len: data.len(),
                expected_len,
            });
        }
        Ok(Self {
            width,
            height,
            layout,
            data,
        })
    }

    /// Raster with every sample set to `value`
    pub fn filled(width: u32, height: u32, layout: PixelLayout, value: u8) -> Self {
        Self {
            width,
            height,
            layout,
            data: vec![value; width as usize * height as usize * layout.channels()],
        }
    }

    pub fn channels(&self) -> usize {
        self.layout.channels()
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.pixel_count() == 0
    }

    /// `(width, height, channels)` triple used in mismatch errors
    pub fn shape(&self) -> (u32, u32, usize) {
        (self.width, self.height, self.channels())
    }

    /// Single-channel copy using BT.601 luma weights
    pub fn to_luma(&self) -> Raster {
        match self.layout {
            PixelLayout::Gray => self.clone(),
            PixelLayout::Rgb => {
                let data = self
                    .data
                    .chunks_exact(3)
                    .map(|rgb| luminance(rgb).round().clamp(0.0, 255.0) as u8)
                    .collect();
                Raster {
                    width: self.width,
                    height: self.height,
                    layout: PixelLayout::Gray,
                    data,
                }
            }
        }
    }

    /// Convert a decoded image, keeping color only when `layout` asks for it
    pub fn from_dynamic_image(img: &image::DynamicImage, layout: PixelLayout) -> Self {
        match layout {
            PixelLayout::Gray => {
                let gray = img.to_luma8();
                let (width, height) = gray.dimensions();
                Self {
                    width,
                    height,
                    layout,
                    data: gray.into_raw(),
                }
            }
            PixelLayout::Rgb => {
                let rgb = img.to_rgb8();
                let (width, height) = rgb.dimensions();
                Self {
                    width,
                    height,
                    layout,
                    data: rgb.into_raw(),
                }
            }
        }
    }

    pub fn to_dynamic_image(&self) -> Result<image::DynamicImage, BracketError> {
        let corrupted = || BracketError::DataCorruption {
            data_len: self.data.len(),
            expected_len: self.pixel_count() * self.channels(),
        };
        match self.layout {
            PixelLayout::Gray => {
                let img = image::GrayImage::from_raw(self.width, self.height, self.data.clone())
                    .ok_or_else(corrupted)?;
                Ok(image::DynamicImage::ImageLuma8(img))
            }
            PixelLayout::Rgb => {
                let img = image::RgbImage::from_raw(self.width, self.height, self.data.clone())
                    .ok_or_else(corrupted)?;
                Ok(image::DynamicImage::ImageRgb8(img))
            }
        }
    }

    /// Load an image file as a grayscale raster
    pub fn open_gray<P: AsRef<Path>>(path: P) -> Result<Self, BracketError> {
        let img = image::open(path.as_ref())?;
        Ok(Self::from_dynamic_image(&img, PixelLayout::Gray))
    }

    /// Load an image file as an RGB raster
    pub fn open_rgb<P: AsRef<Path>>(path: P) -> Result<Self, BracketError> {
        let img = image::open(path.as_ref())?;
        Ok(Self::from_dynamic_image(&img, PixelLayout::Rgb))
    }

    /// Encode to disk; the format follows the file extension
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), BracketError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        self.to_dynamic_image()?.save(path)?;
        log::debug!("Saved {}x{} raster to {:?}", self.width, self.height, path);
        Ok(())
    }
}

/// BT.601 luma of one RGB sample triple, in the input's scale
pub fn luminance(rgb: &[u8]) -> f32 {
    0.299 * rgb[0] as f32 + 0.587 * rgb[1] as f32 + 0.114 * rgb[2] as f32
}
