use std::path::{Path, PathBuf};

use anyhow::Context;
use glam::Vec3;
use serde::Deserialize;

pub const CONFIG_ENV_VAR: &str = "GALAXIAS_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "galaxias.json";

/// Tunables for the sandbox. Every field has a default, so a config file only
/// needs to name what it changes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    pub assets: AssetConfig,
    pub placement: PlacementConfig,
    pub transform: TransformConfig,
    pub animation: AnimationConfig,
    pub camera: CameraConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub root: PathBuf,
    pub library: Vec<String>,
    pub preload: Vec<String>,
    pub screenshot_dir: PathBuf,
}

impl Default for AssetConfig {
    fn default() -> Self {
        let planets = ["Mercury", "Venus", "Earth", "Mars", "Jupiter"];

        Self {
            root: PathBuf::from("assets/models"),
            library: planets
                .iter()
                .chain(&["Saturn", "Uranus", "Neptune", "Sun", "Moon"])
                .map(|name| name.to_string())
                .collect(),
            preload: planets.iter().map(|name| name.to_string()).collect(),
            screenshot_dir: PathBuf::from("screenshots"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Largest dimension of every model after normalization.
    pub target_size: f32,
    /// Side of the square, centered on the origin, that placement samples from.
    pub region_size: f32,
    /// Side of the unchecked square used when no clear spot was found.
    pub fallback_region_size: f32,
    pub max_attempts: u32,
    pub clearance: f32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            target_size: 500.0,
            region_size: 3000.0,
            fallback_region_size: 6000.0,
            max_attempts: 100,
            clearance: 50.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    pub move_step: f32,
    pub scale_step: f32,
    pub min_scale: f32,
    /// Hold time in milliseconds before the speed ramp starts.
    pub ramp_delay_ms: f32,
    pub ramp_gain: f32,
    pub max_speed_multiplier: f32,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            move_step: 10.0,
            scale_step: 0.01,
            min_scale: 0.1,
            ramp_delay_ms: 200.0,
            ramp_gain: 5.0,
            max_speed_multiplier: 50.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Radians per frame at speed 1.
    pub spin_rate: f32,
    /// Radians per frame at speed 1.
    pub orbit_rate: f32,
    pub max_speed: f32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            spin_rate: 0.01,
            orbit_rate: 0.005,
            max_speed: 5.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub home_eye: Vec3,
    pub home_target: Vec3,
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub damping: f32,
    pub rotate_speed: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            home_eye: Vec3::new(0.0, 3000.0, 3000.0),
            home_target: Vec3::ZERO,
            fov_y_degrees: 75.0,
            near: 0.1,
            far: 100_000.0,
            min_distance: 100.0,
            max_distance: 50_000.0,
            damping: 0.05,
            rotate_speed: 0.005,
        }
    }
}

impl SandboxConfig {
    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Reads the file named by `GALAXIAS_CONFIG`, else `galaxias.json` when it
    /// exists, else the defaults.
    pub fn load() -> anyhow::Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Self::from_path(path);
        }

        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            return Self::from_path(default_path);
        }

        Ok(Self::default())
    }
}
