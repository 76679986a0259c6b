/*!
    Player configuration.

    Stored as JSON, by default at `<config dir>/volplayer/config.json`.
    Every field is optional in the file; missing fields take their defaults.
*/

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use media_decode::{DEFAULT_MAX_PACKETS_PER_FRAME, SyncConfig};
use media_types::RoleSet;

use crate::error::{Error, Result};

const DEFAULT_RING_CAPACITY: usize = 8;
const DEFAULT_WRITER_WAIT_TIMEOUT_MS: u64 = 10;

/**
    Which streams a logical frame is assembled from.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamLayout {
    Color,
    ColorAlpha,
    ColorDepth,
    #[default]
    ColorAlphaDepth,
}

impl StreamLayout {
    pub fn roles(self) -> RoleSet {
        match self {
            Self::Color => RoleSet::COLOR,
            Self::ColorAlpha => RoleSet::COLOR_ALPHA,
            Self::ColorDepth => RoleSet::COLOR_DEPTH,
            Self::ColorAlphaDepth => RoleSet::ALL,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Whole-request timeout, including the body download.
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 120,
            connect_timeout_secs: 10,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Server root; the manifest lives at `<base_url>/manifest/frames.json`.
    pub base_url: String,
    /// Number of frame slots, including the one always kept empty.
    pub ring_capacity: usize,
    /// Frames decoded per writer wake; half the capacity when unset.
    pub target_fill: Option<usize>,
    pub writer_wait_timeout_ms: u64,
    pub looping: bool,
    pub streams: StreamLayout,
    pub max_packets_per_frame: usize,
    pub http: HttpConfig,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            ring_capacity: DEFAULT_RING_CAPACITY,
            target_fill: None,
            writer_wait_timeout_ms: DEFAULT_WRITER_WAIT_TIMEOUT_MS,
            looping: true,
            streams: StreamLayout::default(),
            max_packets_per_frame: DEFAULT_MAX_PACKETS_PER_FRAME,
            http: HttpConfig::default(),
        }
    }
}

impl PlayerConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn target_fill(&self) -> usize {
        self.target_fill.unwrap_or(self.ring_capacity / 2).max(1)
    }

    pub fn writer_wait_timeout(&self) -> Duration {
        Duration::from_millis(self.writer_wait_timeout_ms)
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            roles: self.streams.roles(),
            max_packets_per_frame: self.max_packets_per_frame,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.ring_capacity < 2 {
            return Err(Error::config(format!(
                "ring_capacity must be at least 2, got {}",
                self.ring_capacity
            )));
        }
        if self.target_fill == Some(0) {
            return Err(Error::config("target_fill must be positive"));
        }
        if self.writer_wait_timeout_ms == 0 {
            return Err(Error::config("writer_wait_timeout_ms must be positive"));
        }
        if self.max_packets_per_frame == 0 {
            return Err(Error::config("max_packets_per_frame must be positive"));
        }
        Ok(())
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("volplayer").join("config.json"))
    }

    /**
        Load the configuration.

        An explicit path must exist. Without one, the default location is
        tried and defaults are used if nothing is stored there.
    */
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        let contents = fs::read_to_string(&path)?;
        let config: Self = serde_json::from_str(&contents)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /**
        Write the configuration, to the default location if `path` is `None`.
    */
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) => path,
                None => return Ok(()),
            },
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        fs::write(&path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = PlayerConfig::default();
        assert_eq!(config.ring_capacity, 8);
        assert_eq!(config.target_fill(), 4);
        assert_eq!(config.writer_wait_timeout(), Duration::from_millis(10));
        assert!(config.looping);
        assert_eq!(config.sync_config().roles, RoleSet::ALL);
        assert_eq!(config.sync_config(), SyncConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: PlayerConfig =
            serde_json::from_str(r#"{"base_url": "http://cdn", "streams": "color_depth"}"#)
                .unwrap();
        assert_eq!(config.base_url, "http://cdn");
        assert_eq!(config.streams.roles(), RoleSet::COLOR_DEPTH);
        assert_eq!(config.ring_capacity, 8);
        assert_eq!(config.http, HttpConfig::default());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let config = PlayerConfig {
            ring_capacity: 1,
            ..PlayerConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = PlayerConfig {
            target_fill: Some(0),
            ..PlayerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn save_then_load_from_explicit_path() {
        let dir = std::env::temp_dir().join(format!("volplayer-config-{}", std::process::id()));
        let path = dir.join("nested").join("config.json");

        let config = PlayerConfig {
            looping: false,
            target_fill: Some(3),
            ..PlayerConfig::default().with_base_url("http://localhost:9000")
        };
        config.save(Some(&path)).unwrap();
        let loaded = PlayerConfig::load(Some(&path)).unwrap();
        assert_eq!(loaded, config);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let path = std::env::temp_dir().join("volplayer-does-not-exist/config.json");
        assert!(matches!(
            PlayerConfig::load(Some(&path)),
            Err(Error::Io(_))
        ));
    }
}
