//! Simulator settings with TOML file support.
//!
//! Every section uses `#[serde(default)]`, so a file that only overrides
//! `[view]` (or a single key of it) is valid.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::SimError;

/// Top-level simulator configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimConfig {
    pub window: WindowConfig,
    pub simulation: SimulationConfig,
    pub view: ViewConfig,
    pub controls: ControlsConfig,
}

impl SimConfig {
    /// Loads a configuration file. Missing fields use defaults.
    pub fn load(path: &Path) -> Result<Self, SimError> {
        let content = std::fs::read_to_string(path).map_err(|source| SimError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|message| SimError::Config {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Parses and validates TOML text; the error is the parser's or
    /// [`SimConfig::validate`]'s message.
    pub fn from_toml_str(content: &str) -> Result<Self, String> {
        let config: Self = toml::from_str(content).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would turn the per-frame uniforms into inf or NaN.
    pub fn validate(&self) -> Result<(), String> {
        let view = &self.view;
        positive("view.scale", view.scale)?;
        positive("view.rate", view.rate)?;
        positive("view.zoom_step", view.zoom_step)?;
        finite("view.light_angle", view.light_angle)?;
        finite("view.light_radius", view.light_radius)?;
        if !view.center.iter().all(|c| c.is_finite()) {
            return Err(format!("view.center must be finite, got {:?}", view.center));
        }

        let controls = &self.controls;
        positive("controls.rate_step", controls.rate_step)?;
        finite("controls.light_radius_step", controls.light_radius_step)?;
        finite("controls.light_angle_step", controls.light_angle_step)?;
        Ok(())
    }
}

fn positive(key: &str, value: f32) -> Result<(), String> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(format!("{key} must be a positive number, got {value}"))
    }
}

fn finite(key: &str, value: f32) -> Result<(), String> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(format!("{key} must be finite, got {value}"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    /// Initial inner size in logical pixels.
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "redif".to_string(),
            width: 1600,
            height: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    /// Simulation steps recorded per displayed frame.
    pub ticks_per_frame: u32,
    /// Palette image indexed by (A, B). The built-in palette is used when
    /// unset or unreadable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub palette: Option<PathBuf>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            ticks_per_frame: 20,
            palette: None,
        }
    }
}

/// Initial view and lighting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewConfig {
    /// Simulation-space point at the window center: (kill, feed).
    pub center: [f32; 2],
    /// Simulation units per half the window's geometric-mean size.
    pub scale: f32,
    /// Diffusion-rate multiplier.
    pub rate: f32,
    /// Light azimuth in radians.
    pub light_angle: f32,
    pub light_radius: f32,
    /// Factor applied to `scale` per wheel step.
    pub zoom_step: f32,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            center: [0.064, 0.041],
            scale: 0.01,
            rate: 1.0,
            light_angle: 2.0,
            light_radius: 0.5,
            zoom_step: 1.2,
        }
    }
}

/// Brush radius (field pixels) and the texel value it stamps.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq)]
pub struct BrushPreset {
    pub radius: f32,
    pub value: [f32; 4],
}

/// Per-action amounts for the input bindings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ControlsConfig {
    /// Rate factor per ArrowUp / ArrowDown press.
    pub rate_step: f32,
    /// Light radius change per frame while W / S is held.
    pub light_radius_step: f32,
    /// Light angle change per frame while A / D is held.
    pub light_angle_step: f32,
    /// Left button.
    pub draw: BrushPreset,
    /// Right button.
    pub erase: BrushPreset,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            rate_step: 1.1,
            light_radius_step: 0.01,
            light_angle_step: 0.06,
            draw: BrushPreset {
                radius: 1.0,
                value: [1.0, 1.0, 0.0, 0.0],
            },
            erase: BrushPreset {
                radius: 200.0,
                value: [1.0, 0.0, 0.0, 0.0],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_round_trips_through_toml() {
        let config = SimConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed = SimConfig::from_toml_str(&text).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn palette_path_round_trips() {
        let mut config = SimConfig::default();
        config.simulation.palette = Some(PathBuf::from("palettes/oof.png"));
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(SimConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let text = r#"
[view]
scale = 0.05

[controls.erase]
radius = 50.0
value = [1.0, 0.0, 0.0, 0.0]
"#;
        let config = SimConfig::from_toml_str(text).unwrap();
        assert_eq!(config.view.scale, 0.05);
        assert_eq!(config.view.center, [0.064, 0.041]);
        assert_eq!(config.controls.erase.radius, 50.0);
        assert_eq!(config.controls.draw.radius, 1.0);
        assert_eq!(config.simulation.ticks_per_frame, 20);
        assert_eq!(config.window.width, 1600);
    }

    #[test]
    fn malformed_toml_is_reported() {
        assert!(SimConfig::from_toml_str("[view]\nscale = \"big\"\n").is_err());
    }

    #[test]
    fn non_positive_view_values_are_rejected() {
        for text in [
            "[view]\nzoom_step = 0.0\n",
            "[view]\nrate = -1.0\n",
            "[view]\nscale = 0.0\n",
            "[controls]\nrate_step = 0.0\n",
        ] {
            let err = SimConfig::from_toml_str(text).unwrap_err();
            assert!(err.contains("must be a positive number"), "{text:?}: {err}");
        }
        assert!(SimConfig::from_toml_str("[view]\nzoom_step = 1.5\n").is_ok());
    }

    #[test]
    fn load_rejects_invalid_values() {
        let path = std::env::temp_dir().join(format!("redif-config-{}.toml", std::process::id()));
        std::fs::write(&path, "[view]\nscale = -0.01\n").unwrap();
        let err = SimConfig::load(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        match err {
            SimError::Config { message, .. } => assert!(message.contains("view.scale"), "{message}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn load_reports_missing_file() {
        let err = SimConfig::load(Path::new("/nonexistent/redif.toml")).unwrap_err();
        assert!(matches!(err, SimError::Io { .. }));
    }
}
