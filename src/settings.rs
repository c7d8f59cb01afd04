//! Persistent user settings
//!
//! TOML-backed configuration. The background service owns the on-disk
//! copy; the content side receives the
//! struct over the channel and falls back to built-in defaults when the
//! channel cannot be reached.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::constants::{config, timing, validation};

/// The single active trigger mode. Exactly one is in effect at a time;
/// `hover_space` in [`Settings`] is an additional opt-in combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Trigger {
    LongHover,
    HardClick,
    AltClick,
    CtrlShiftClick,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appearance {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(rename = "z_index", default = "default_z_index")]
    pub z_index_base: i32,
    #[serde(default = "default_overlay_opacity")]
    pub overlay_opacity: f32,
    #[serde(rename = "overlay_blur", default = "default_overlay_blur")]
    pub overlay_blur_px: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Behavior {
    #[serde(rename = "highlighting", default = "default_true")]
    pub highlight_on_hover: bool,
    #[serde(default = "default_true")]
    pub close_on_outside_click: bool,
    #[serde(default = "default_true")]
    pub close_on_scroll_over: bool,
    /// Close a shown preview when the pointer leaves the link. Off by
    /// default; most triggers want the preview to outlive the hover.
    #[serde(rename = "close_on_mouse_leave", default)]
    pub close_on_pointer_leave: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(rename = "selected_trigger", default = "default_trigger")]
    pub trigger: Trigger,

    #[serde(rename = "long_hover_time_ms", default = "default_long_hover_ms")]
    pub long_hover_delay_ms: u64,

    /// Hovering a link while Space is held fires a preview immediately,
    /// independent of the selected trigger.
    #[serde(default)]
    pub hover_space: bool,

    #[serde(default)]
    pub appearance: Appearance,

    #[serde(default)]
    pub behavior: Behavior,

    /// A target hostname is excluded when it *contains* any entry.
    /// Substring match, not exact-domain match: "example.com" excludes both
    /// "sub.example.com" and "example.com.evil.org".
    #[serde(rename = "disabled_websites", default)]
    pub disabled_host_substrings: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_trigger() -> Trigger {
    Trigger::LongHover
}

fn default_long_hover_ms() -> u64 {
    timing::DEFAULT_LONG_HOVER_MS
}

fn default_theme() -> String {
    "light".to_string()
}

fn default_z_index() -> i32 {
    9999
}

fn default_overlay_opacity() -> f32 {
    crate::constants::overlay::DEFAULT_OPACITY
}

fn default_overlay_blur() -> f32 {
    crate::constants::overlay::DEFAULT_BLUR_PX
}

impl Default for Appearance {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            z_index_base: default_z_index(),
            overlay_opacity: default_overlay_opacity(),
            overlay_blur_px: default_overlay_blur(),
        }
    }
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            highlight_on_hover: true,
            close_on_outside_click: true,
            close_on_scroll_over: true,
            close_on_pointer_leave: false,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            trigger: default_trigger(),
            long_hover_delay_ms: default_long_hover_ms(),
            hover_space: false,
            appearance: Appearance::default(),
            behavior: Behavior::default(),
            disabled_host_substrings: Vec::new(),
        }
    }
}

impl Settings {
    pub fn path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(config::APP_DIR);
        path.push(config::FILENAME);
        path
    }

    /// Load settings from the TOML file, creating it with defaults when absent
    pub fn load() -> Result<Self> {
        let path = Self::path();

        if !path.exists() {
            info!(path = %path.display(), "Settings file not found, creating defaults");
            let settings = Settings::default();
            settings.save()?;
            return Ok(settings);
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;

        let mut settings: Settings = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse TOML from {}", path.display()))?;

        settings.validate_and_clamp();
        Ok(settings)
    }

    /// Save settings to the TOML file
    pub fn save(&self) -> Result<()> {
        let path = Self::path();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
        }

        let toml_string =
            toml::to_string_pretty(self).context("Failed to serialize settings to TOML")?;

        fs::write(&path, toml_string)
            .with_context(|| format!("Failed to write settings to {}", path.display()))?;

        info!(path = %path.display(), "Saved settings");
        Ok(())
    }

    /// Clamp out-of-range values to safe ranges, warning on each adjustment
    pub fn validate_and_clamp(&mut self) {
        if !(0.0..=1.0).contains(&self.appearance.overlay_opacity) {
            warn!(
                overlay_opacity = self.appearance.overlay_opacity,
                "overlay_opacity outside [0, 1], clamping"
            );
            self.appearance.overlay_opacity = self.appearance.overlay_opacity.clamp(0.0, 1.0);
        }

        if !(0.0..=validation::MAX_BLUR_PX).contains(&self.appearance.overlay_blur_px) {
            warn!(
                overlay_blur = self.appearance.overlay_blur_px,
                max = validation::MAX_BLUR_PX,
                "overlay_blur outside range, clamping"
            );
            self.appearance.overlay_blur_px =
                self.appearance.overlay_blur_px.clamp(0.0, validation::MAX_BLUR_PX);
        }

        if self.appearance.z_index_base < validation::MIN_Z_INDEX {
            warn!(
                z_index = self.appearance.z_index_base,
                min = validation::MIN_Z_INDEX,
                "z_index below minimum, raising"
            );
            self.appearance.z_index_base = validation::MIN_Z_INDEX;
        }

        if self.long_hover_delay_ms > timing::MAX_LONG_HOVER_MS {
            warn!(
                long_hover_time_ms = self.long_hover_delay_ms,
                max = timing::MAX_LONG_HOVER_MS,
                "long_hover_time_ms exceeds maximum, clamping"
            );
            self.long_hover_delay_ms = timing::MAX_LONG_HOVER_MS;
        }
    }
}
