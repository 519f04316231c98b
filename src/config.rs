//! Configuration management for hostprobe
//!
//! Config file location:
//! - Linux: ~/.config/hostprobe/config.toml
//! - macOS: ~/Library/Application Support/com.hostprobe.hostprobe/config.toml
//! - Windows: %APPDATA%/hostprobe/hostprobe/config/config.toml
//!
//! You can override the config location by setting `HOSTPROBE_CONFIG_PATH`.
//! A missing file is not an error: every field has a default.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// System report settings
    #[serde(default)]
    pub report: ReportConfig,

    /// List-to-image settings
    #[serde(default)]
    pub render: RenderConfig,
}

impl Config {
    /// Load configuration from the default location or return defaults
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path; a missing file yields defaults
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

        Ok(config)
    }

    /// Resolve an optional CLI override, falling back to the default location
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from(path),
            None => Self::load(),
        }
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("HOSTPROBE_CONFIG_PATH") {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Ok(PathBuf::from(trimmed));
            }
        }

        let proj_dirs = ProjectDirs::from("com", "hostprobe", "hostprobe")
            .context("Could not determine project directories")?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }
}

/// GPU query backend
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum GpuBackend {
    /// NVIDIA Management Library, loaded at runtime
    Nvml,
    /// The `nvidia-smi` command-line tool
    NvidiaSmi,
}

/// System report settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Process name whose memory is aggregated separately
    #[serde(default = "default_target_process")]
    pub target_process: String,

    /// Number of processes listed in the top-by-memory section
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Wait for a key press after the text report
    #[serde(default = "default_true")]
    pub pause_on_exit: bool,

    /// GPU query backend
    #[serde(default = "default_gpu_backend")]
    pub gpu_backend: GpuBackend,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            target_process: default_target_process(),
            top_n: default_top_n(),
            pause_on_exit: default_true(),
            gpu_backend: default_gpu_backend(),
        }
    }
}

#[cfg(target_os = "windows")]
fn default_target_process() -> String {
    "chrome.exe".to_string()
}

#[cfg(not(target_os = "windows"))]
fn default_target_process() -> String {
    "chrome".to_string()
}

fn default_top_n() -> usize {
    5
}

fn default_true() -> bool {
    true
}

fn default_gpu_backend() -> GpuBackend {
    GpuBackend::Nvml
}

/// List-to-image settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Output image path; the extension selects the format
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,

    /// Font size in pixels
    #[serde(default = "default_font_size")]
    pub font_size: u32,

    /// Background color (`#rrggbb` or `r,g,b`)
    #[serde(default = "default_background")]
    pub background: String,

    /// Text color (`#rrggbb` or `r,g,b`)
    #[serde(default = "default_text_color")]
    pub text_color: String,

    /// Canvas width in pixels
    #[serde(default = "default_width")]
    pub width: u32,

    /// Canvas height in pixels
    #[serde(default = "default_height")]
    pub height: u32,

    /// Font candidates tried in order before the built-in face
    #[serde(default = "default_fonts")]
    pub fonts: Vec<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            output_path: default_output_path(),
            font_size: default_font_size(),
            background: default_background(),
            text_color: default_text_color(),
            width: default_width(),
            height: default_height(),
            fonts: default_fonts(),
        }
    }
}

fn default_output_path() -> PathBuf {
    PathBuf::from("output.png")
}

fn default_font_size() -> u32 {
    20
}

fn default_background() -> String {
    "#ffffff".to_string()
}

fn default_text_color() -> String {
    "#000000".to_string()
}

fn default_width() -> u32 {
    500
}

fn default_height() -> u32 {
    800
}

fn default_fonts() -> Vec<PathBuf> {
    vec![PathBuf::from("msyh.ttc"), PathBuf::from("simhei.ttf")]
}
