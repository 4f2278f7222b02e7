//! Editor configuration.

use crate::debounce::Duration;
use crate::scene::SceneTree;
use crate::selection::MarqueeMode;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Environment variable naming a JSON config file.
pub const CONFIG_ENV_VAR: &str = "SLIDEKIT_CONFIG";

/// Errors loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Quiet periods before debounced writes fire, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebounceConfig {
    pub background_ms: u64,
    pub duration_ms: u64,
    pub anchor_ms: u64,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            background_ms: 400,
            duration_ms: 500,
            anchor_ms: 300,
        }
    }
}

impl DebounceConfig {
    pub fn background(&self) -> Duration {
        Duration::from_millis(self.background_ms)
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    pub fn anchor(&self) -> Duration {
        Duration::from_millis(self.anchor_ms)
    }
}

/// Stage used for slides without persisted scene data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    pub width: f64,
    pub height: f64,
    pub background_color: String,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            width: 1920.0,
            height: 1080.0,
            background_color: SceneTree::DEFAULT_BACKGROUND.to_string(),
        }
    }
}

impl StageConfig {
    pub fn empty_tree(&self) -> SceneTree {
        SceneTree::new(self.width, self.height, &self.background_color)
    }
}

/// Editor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub snap_threshold: f64,
    pub marquee_min_size: f64,
    pub min_resize: f64,
    pub history_limit: usize,
    pub marquee_mode: MarqueeMode,
    pub debounce: DebounceConfig,
    /// Fire pending debounced writes before switching slides.
    pub flush_pending_on_slide_switch: bool,
    pub default_stage: StageConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            snap_threshold: 5.0,
            marquee_min_size: 5.0,
            min_resize: 5.0,
            history_limit: crate::history::MAX_UNDO_HISTORY,
            marquee_mode: MarqueeMode::Loose,
            debounce: DebounceConfig::default(),
            flush_pending_on_slide_switch: false,
            default_stage: StageConfig::default(),
        }
    }
}

impl EditorConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Load from the file named by [`CONFIG_ENV_VAR`], or defaults when unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::load(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config =
            EditorConfig::from_json(r#"{ "snap_threshold": 8.0, "debounce": { "anchor_ms": 100 } }"#)
                .unwrap();
        assert!((config.snap_threshold - 8.0).abs() < f64::EPSILON);
        assert_eq!(config.debounce.anchor_ms, 100);
        assert_eq!(config.debounce.background_ms, 400);
        assert_eq!(config.history_limit, 50);
        assert_eq!(config.marquee_mode, MarqueeMode::Loose);
    }

    #[test]
    fn test_marquee_mode_names() {
        let config = EditorConfig::from_json(r#"{ "marquee_mode": "strict" }"#).unwrap();
        assert_eq!(config.marquee_mode, MarqueeMode::Strict);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = EditorConfig::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_default_stage_tree() {
        let tree = StageConfig::default().empty_tree();
        assert_eq!(tree.layers.len(), 1);
        assert!((tree.width - 1920.0).abs() < f64::EPSILON);
    }
}
