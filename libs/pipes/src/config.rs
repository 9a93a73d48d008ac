use std::path::Path;

use nalgebra::Vector3;
use serde_derive::{Deserialize, Serialize};

use crate::direction::TurnOrder;
use crate::error::ConfigError;
use crate::lattice::MAX_GRID_SIZE;

/// Tunables for a pipe field. Any key missing from a config file keeps its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipesConfig {
    /// Half-width of the cubic lattice; cells span `-grid_size..=grid_size` per axis.
    pub grid_size: i32,
    /// World length of one straight unit (also the lattice spacing).
    pub segment_length: f32,
    /// Seconds between growth steps of a single pipe.
    pub build_delay: f32,
    /// Seconds a segment lives before it is retired.
    pub pipe_lifetime: f32,
    /// Seconds between spawn attempts.
    pub spawn_interval: f32,
    /// Probability that a step ends in a bend and a turn.
    pub bend_chance: f32,
    pub turn_order: TurnOrder,
    /// Upper bound on growth steps one pipe may catch up in a single frame.
    pub max_steps_per_frame: u32,

    // Visual hints, passed through to the renderer untouched.
    pub cylinder_scale: [f32; 3],
    pub sphere_scale: [f32; 3],
}

impl Default for PipesConfig {
    fn default() -> Self {
        Self {
            grid_size: 10,
            segment_length: 1.0,
            build_delay: 0.05,
            pipe_lifetime: 60.0,
            spawn_interval: 5.0,
            bend_chance: 0.25,
            turn_order: TurnOrder::Declaration,
            max_steps_per_frame: 8,
            cylinder_scale: [0.1, 1.0, 0.1],
            sphere_scale: [0.2, 0.2, 0.2],
        }
    }
}

// Height of the unit cylinder mesh the straight scale is expressed against.
const CYLINDER_MESH_HEIGHT: f32 = 2.0;

impl PipesConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: PipesConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        log::info!("loaded pipes config from {}", path.display());
        Ok(config)
    }

    pub fn to_toml_string(&self) -> String {
        // Every field is a plain scalar, array or unit enum, which always serialises.
        toml::to_string(self).unwrap_or_default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, reason: impl Into<String>) -> Result<(), ConfigError> {
            Err(ConfigError::Invalid {
                field,
                reason: reason.into(),
            })
        }

        if !(0..=MAX_GRID_SIZE).contains(&self.grid_size) {
            return invalid(
                "grid_size",
                format!("must be in [0, {}], got {}", MAX_GRID_SIZE, self.grid_size),
            );
        }
        if !(self.segment_length > 0.0) {
            return invalid("segment_length", "must be positive");
        }
        if !(self.build_delay > 0.0) {
            return invalid("build_delay", "must be positive");
        }
        if !(self.spawn_interval > 0.0) {
            return invalid("spawn_interval", "must be positive");
        }
        if !(self.pipe_lifetime >= 0.0) {
            return invalid("pipe_lifetime", "must not be negative");
        }
        if !(0.0..=1.0).contains(&self.bend_chance) {
            return invalid("bend_chance", format!("must be in [0, 1], got {}", self.bend_chance));
        }
        if self.max_steps_per_frame == 0 {
            return invalid("max_steps_per_frame", "must be at least 1");
        }
        Ok(())
    }

    /// Scale for straight segments: the cylinder hint stretched to one segment length.
    pub fn straight_scale(&self) -> Vector3<f32> {
        let [x, y, z] = self.cylinder_scale;
        Vector3::new(x, y * self.segment_length / CYLINDER_MESH_HEIGHT, z)
    }

    pub fn bend_scale(&self) -> Vector3<f32> {
        Vector3::from(self.sphere_scale)
    }
}
