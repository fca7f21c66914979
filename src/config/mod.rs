//! Editor Configuration
//! Drawing constants and interaction tunables, optionally loaded from a JSON file

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{AnchorSettings, Point, SelfLoopPolicy, LABEL_OFFSET};


/// Environment variable naming a JSON config file
pub const CONFIG_ENV_VAR: &str = "FSA_SKETCH_CONFIG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid config value for `{field}`: {message}")]
    Invalid { field: &'static str, message: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// How newly placed states are named
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NamingScheme {
    /// `q0`, `q1`, ... from a counter that resets on clear
    Sequential { prefix: String },
    /// Every new state gets the same placeholder name
    Fixed { name: String },
}

impl Default for NamingScheme {
    fn default() -> Self {
        NamingScheme::Sequential {
            prefix: "q".to_string(),
        }
    }
}

impl NamingScheme {
    pub fn name_for(&self, counter: u32) -> String {
        match self {
            NamingScheme::Sequential { prefix } => format!("{prefix}{counter}"),
            NamingScheme::Fixed { name } => name.clone(),
        }
    }
}

/// The start pseudo-state: a small filled circle with an arrow into the start state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartMarker {
    /// Marker center relative to the start state's center
    pub offset: Point,
    pub radius: f32,
}

impl Default for StartMarker {
    fn default() -> Self {
        Self {
            offset: Point::new(-80.0, 0.0),
            radius: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub state_radius: f32,
    /// Gap between the outer circle and the accepting ring
    pub accepting_ring_inset: f32,
    pub label_offset: f32,
    pub self_loop: SelfLoopPolicy,
    pub start_marker: StartMarker,
    pub naming: NamingScheme,
    /// Max pointer distance (px) for a click to hit a transition
    pub hit_tolerance: f32,
    pub canvas_size: [f32; 2],
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            state_radius: 30.0,
            accepting_ring_inset: 4.0,
            label_offset: LABEL_OFFSET,
            self_loop: SelfLoopPolicy::default(),
            start_marker: StartMarker::default(),
            naming: NamingScheme::default(),
            hit_tolerance: 6.0,
            canvas_size: [800.0, 600.0],
        }
    }
}

impl EditorConfig {
    /// Parse and validate a JSON document. Missing fields take their defaults.
    pub fn from_json(source: &str) -> ConfigResult<Self> {
        let config: EditorConfig = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        log::debug!("Loading editor config from {}", path.display());
        let source = std::fs::read_to_string(path)?;
        Self::from_json(&source)
    }

    /// Load from the file named by `FSA_SKETCH_CONFIG`, or defaults when it is unset.
    pub fn from_env() -> ConfigResult<Self> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        fn positive(field: &'static str, value: f32) -> ConfigResult<()> {
            if value > 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(ConfigError::Invalid {
                    field,
                    message: format!("must be a positive number, got {value}"),
                })
            }
        }

        positive("state_radius", self.state_radius)?;
        positive("start_marker.radius", self.start_marker.radius)?;
        positive("hit_tolerance", self.hit_tolerance)?;
        positive("canvas_size[0]", self.canvas_size[0])?;
        positive("canvas_size[1]", self.canvas_size[1])?;

        if !(0.0..self.state_radius).contains(&self.accepting_ring_inset) {
            return Err(ConfigError::Invalid {
                field: "accepting_ring_inset",
                message: format!(
                    "must lie in [0, state_radius), got {}",
                    self.accepting_ring_inset
                ),
            });
        }
        if !self.label_offset.is_finite() || self.label_offset < 0.0 {
            return Err(ConfigError::Invalid {
                field: "label_offset",
                message: format!("must be a non-negative number, got {}", self.label_offset),
            });
        }
        let offsets = &self.self_loop.vertex_offsets;
        if offsets.is_empty() {
            return Err(ConfigError::Invalid {
                field: "self_loop.vertex_offsets",
                message: "needs at least one vertex".to_string(),
            });
        }
        // Loop ends are trimmed toward these two, so they must leave the node center.
        for (end, offset) in [("first", offsets[0]), ("last", offsets[offsets.len() - 1])] {
            if offset == Point::ZERO {
                return Err(ConfigError::Invalid {
                    field: "self_loop.vertex_offsets",
                    message: format!("{end} offset must not be (0, 0)"),
                });
            }
        }
        if let NamingScheme::Fixed { name } = &self.naming {
            if name.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    field: "naming.name",
                    message: "must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn anchor_settings(&self) -> AnchorSettings {
        AnchorSettings {
            label_offset: self.label_offset,
            self_loop: self.self_loop.clone(),
        }
    }
}
