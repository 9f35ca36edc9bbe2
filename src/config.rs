// src/config.rs

//! Setup configuration for the framebuffer backend.
//!
//! Deserialized from a small JSON file by the `fbinfo` tool; every field
//! has a default so a partial (or absent) file is fine. Mode overrides are
//! optional: when present they are pushed to the device after open, before
//! the first surface is created.

use crate::backends::{fbdev::DEFAULT_DEVICE_PATH, Backend, FbDevBackend};
use crate::error::BackendError;
use crate::format::PixelFormat;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Framebuffer device setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FbDevConfig {
    /// Device node to open.
    pub device: PathBuf,
    /// Optional horizontal resolution to request after open.
    pub width: Option<u32>,
    /// Optional vertical resolution to request after open.
    pub height: Option<u32>,
    /// Optional pixel format to request after open.
    pub format: Option<PixelFormat>,
}

impl Default for FbDevConfig {
    fn default() -> Self {
        Self {
            device: PathBuf::from(DEFAULT_DEVICE_PATH),
            width: None,
            height: None,
            format: None,
        }
    }
}

impl FbDevConfig {
    /// Pushes the configured mode overrides to an opened backend. Fields
    /// left unset keep whatever mode the device reported.
    pub fn apply(&self, backend: &mut FbDevBackend) -> Result<(), BackendError> {
        if let Some(width) = self.width {
            backend.set_width(width)?;
        }
        if let Some(height) = self.height {
            backend.set_height(height)?;
        }
        if let Some(format) = self.format {
            backend.set_format(format)?;
        }
        Ok(())
    }
}
