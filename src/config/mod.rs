//! Renderer configuration and loading logic.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::layout::DrawOptions;

/// Default directory holding `default8.png` and the `glyph_<HH>.png` packs.
pub const DEFAULT_BASE_PATH: &str = "./images/font";

/// Config file read from the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "tilefont.toml";

/// Top-level configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Atlas directory. A trailing `/` is ignored.
    pub base_path: PathBuf,
    /// Clamped to 1.0-2.0 when sizing the backing texture.
    pub device_pixel_ratio: f64,
    /// Displayed (logical) surface width.
    pub display_width: f64,
    /// Displayed (logical) surface height.
    pub display_height: f64,
    /// Defaults for every draw call.
    pub draw: DrawOptions,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from(DEFAULT_BASE_PATH),
            device_pixel_ratio: 1.0,
            display_width: 128.0,
            display_height: 128.0,
            draw: DrawOptions::default(),
        }
    }
}

impl RendererConfig {
    /// Load config from `path`, falling back to defaults on any error.
    pub fn load(path: &Path) -> Self {
        let data = match std::fs::read_to_string(path) {
            Ok(d) => d,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    log::warn!("config: failed to read {}: {e}", path.display());
                }
                return Self::default();
            }
        };

        match toml::from_str(&data) {
            Ok(cfg) => {
                log::info!("config: loaded from {}", path.display());
                cfg
            }
            Err(e) => {
                log::warn!("config: parse error in {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Try to load config, returning an error message on failure.
    ///
    /// Unlike `load()`, a missing file is an error here.
    pub fn try_load(path: &Path) -> Result<Self, String> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
        toml::from_str(&data).map_err(|e| format!("parse error in {}: {e}", path.display()))
    }

    /// Pretty TOML of the whole config, for `--print-config`.
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("serialize error: {e}"))
    }
}
