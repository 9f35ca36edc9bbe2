// src/format.rs

//! Pixel formats and the color-depth translation shared by both backends.

use crate::error::BackendError;
use serde::{Deserialize, Serialize};

/// Pixel format of a drawable surface.
///
/// This is the single format policy for the whole crate: the framebuffer
/// backend accepts exactly these two color depths from the device, and the
/// image backend allocates `Argb32` only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelFormat {
    /// 16 bits per pixel, RGB packed 5-6-5.
    Rgb565,
    /// 32 bits per pixel, 8-bit ARGB channels.
    Argb32,
}

impl PixelFormat {
    /// Translates a device-reported color depth into a pixel format.
    ///
    /// Any depth outside {16, 32} is a hard [`BackendError::UnsupportedFormat`],
    /// never a fallback to a default.
    pub fn from_bits_per_pixel(bits_per_pixel: u32) -> Result<Self, BackendError> {
        match bits_per_pixel {
            16 => Ok(PixelFormat::Rgb565),
            32 => Ok(PixelFormat::Argb32),
            _ => Err(BackendError::UnsupportedFormat),
        }
    }

    /// Reverse translation, used when pushing a format change back to the
    /// device. Total by construction: every representable format has a
    /// depth.
    pub fn bits_per_pixel(self) -> u32 {
        match self {
            PixelFormat::Rgb565 => 16,
            PixelFormat::Argb32 => 32,
        }
    }

    /// Bytes per pixel, for buffer and stride sizing.
    pub fn bytes_per_pixel(self) -> u32 {
        self.bits_per_pixel() / 8
    }
}
