// src/bin/fbinfo.rs

//! Diagnostic tool: open a framebuffer device, optionally apply mode
//! overrides from a JSON config file, and report the negotiated geometry.
//!
//! Usage: `fbinfo [config.json]`. Needs read/write access to the device
//! node, which usually means membership in the `video` group or root.

use anyhow::{Context, Result};
use fbcanvas::config::FbDevConfig;
use fbcanvas::{Backend, FbDevBackend};
use log::info;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config file '{}'", path))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("failed to parse config file '{}'", path))?
        }
        None => FbDevConfig::default(),
    };

    let mut backend = FbDevBackend::open_path(&config.device).with_context(|| {
        format!(
            "failed to initialize framebuffer backend on {}",
            config.device.display()
        )
    })?;
    config
        .apply(&mut backend)
        .context("failed to apply configured mode overrides")?;

    let mapped_len = backend.mapped_len();
    let surface = backend
        .create_surface()
        .context("failed to create drawable surface")?;

    info!(
        "{}: {}x{} {:?}, stride {} bytes, {} bytes mapped",
        config.device.display(),
        surface.width(),
        surface.height(),
        surface.format(),
        surface.stride(),
        mapped_len,
    );

    Ok(())
}
