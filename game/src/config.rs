use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::shapes::{FRAME_SIZE, ShapeKind};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoringConfig {
    /// Points for the first row of a clear.
    pub row_score: u32,
    /// Extra points for each further row in the same clear.
    pub row_bonus: u32,
    /// Score span per level.
    pub level_mark: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            row_score: 100,
            row_bonus: 50,
            level_mark: 500,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpeedTier {
    pub min_level: u32,
    pub period_ms: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpeedConfig {
    /// Ordered by ascending `min_level`; the first tier starts at level 1.
    pub tiers: Vec<SpeedTier>,
}

impl Default for SpeedConfig {
    fn default() -> Self {
        Self {
            tiers: vec![
                SpeedTier {
                    min_level: 1,
                    period_ms: 700,
                },
                SpeedTier {
                    min_level: 3,
                    period_ms: 600,
                },
                SpeedTier {
                    min_level: 7,
                    period_ms: 500,
                },
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    #[serde(default = "default_rows")]
    pub rows: usize,
    #[serde(default = "default_cols")]
    pub cols: usize,
    #[serde(default = "default_base_period_ms")]
    pub base_period_ms: u32,
    #[serde(default = "default_fast_drop_factor")]
    pub fast_drop_factor: f64,
    #[serde(default = "default_color_count")]
    pub color_count: u8,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub speed: SpeedConfig,
    #[serde(default)]
    pub seed: u64,
}

fn default_rows() -> usize {
    23
}

fn default_cols() -> usize {
    16
}

fn default_base_period_ms() -> u32 {
    50
}

fn default_fast_drop_factor() -> f64 {
    2.5
}

fn default_color_count() -> u8 {
    11
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rows: default_rows(),
            cols: default_cols(),
            base_period_ms: default_base_period_ms(),
            fast_drop_factor: default_fast_drop_factor(),
            color_count: default_color_count(),
            scoring: ScoringConfig::default(),
            speed: SpeedConfig::default(),
            seed: 0,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Invalid { field: &'static str, reason: String },
    Io(io::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Invalid { field, reason } => write!(f, "invalid {field}: {reason}"),
            ConfigError::Io(e) => write!(f, "config i/o error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Invalid { .. } => None,
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
        }
    }
}

impl From<io::Error> for ConfigError {
    fn from(e: io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

const MIN_BOARD_SIDE: usize = FRAME_SIZE;

impl EngineConfig {
    pub fn with_board(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows < MIN_BOARD_SIDE {
            return Err(invalid("rows", format!("{} < {MIN_BOARD_SIDE}", self.rows)));
        }
        if self.cols < MIN_BOARD_SIDE {
            return Err(invalid("cols", format!("{} < {MIN_BOARD_SIDE}", self.cols)));
        }
        if self.base_period_ms == 0 {
            return Err(invalid("base_period_ms", "must be positive"));
        }
        if !(self.fast_drop_factor >= 1.0 && self.fast_drop_factor.is_finite()) {
            return Err(invalid(
                "fast_drop_factor",
                format!("{} is not a finite factor >= 1", self.fast_drop_factor),
            ));
        }
        if (self.color_count as usize) < ShapeKind::COUNT {
            return Err(invalid(
                "color_count",
                format!("{} < {}", self.color_count, ShapeKind::COUNT),
            ));
        }
        if self.scoring.level_mark == 0 {
            return Err(invalid("scoring.level_mark", "must be positive"));
        }

        let tiers = &self.speed.tiers;
        let Some(first) = tiers.first() else {
            return Err(invalid("speed.tiers", "at least one tier is required"));
        };
        if first.min_level != 1 {
            return Err(invalid("speed.tiers", "first tier must start at level 1"));
        }
        for pair in tiers.windows(2) {
            if pair[1].min_level <= pair[0].min_level {
                return Err(invalid("speed.tiers", "min_level must be strictly ascending"));
            }
            if pair[1].period_ms > pair[0].period_ms {
                return Err(invalid("speed.tiers", "period_ms must not increase"));
            }
        }
        if tiers.iter().any(|t| t.period_ms == 0) {
            return Err(invalid("speed.tiers", "period_ms must be positive"));
        }
        Ok(())
    }

    /// Replaces invalid fields with their defaults.
    pub fn sanitized(mut self) -> Self {
        if self.rows < MIN_BOARD_SIDE {
            self.rows = default_rows();
        }
        if self.cols < MIN_BOARD_SIDE {
            self.cols = default_cols();
        }
        if self.base_period_ms == 0 {
            self.base_period_ms = default_base_period_ms();
        }
        if !(self.fast_drop_factor >= 1.0 && self.fast_drop_factor.is_finite()) {
            self.fast_drop_factor = default_fast_drop_factor();
        }
        if (self.color_count as usize) < ShapeKind::COUNT {
            self.color_count = default_color_count();
        }
        if self.scoring.level_mark == 0 {
            self.scoring.level_mark = ScoringConfig::default().level_mark;
        }
        let speed = EngineConfig {
            speed: self.speed.clone(),
            ..EngineConfig::default()
        };
        if speed.validate().is_err() {
            self.speed = SpeedConfig::default();
        }
        self
    }

    /// Column of the spawn anchor, near the horizontal center and never
    /// further right than a 4-wide frame allows.
    pub fn spawn_col(&self) -> i32 {
        let c = self.cols as i32;
        ((c - FRAME_SIZE as i32) / 2 + 1).min(c - FRAME_SIZE as i32)
    }
}

/// On-disk home of an `EngineConfig`, for front ends and binaries such as
/// `tetrad-profile`. Nothing in the engine calls it; `GameEngine` only ever
/// receives an already loaded config.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_env() -> Self {
        if let Some(explicit) = std::env::var_os("TETRAD_CONFIG_PATH") {
            return Self::new(explicit);
        }

        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var_os("HOME").map(|home| {
                    let mut p = PathBuf::from(home);
                    p.push(".config");
                    p
                })
            })
            .unwrap_or_else(|| PathBuf::from("."));

        let mut path = base;
        path.push("tetrad");
        path.push("config.json");
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and validates the stored config.
    pub fn load_strict(&self) -> Result<EngineConfig, ConfigError> {
        let bytes = fs::read(&self.path)?;
        let config: EngineConfig = serde_json::from_slice(&bytes)?;
        config.validate()?;
        Ok(config)
    }

    /// Like `load_strict`, but never fails: a missing file yields the
    /// defaults and a broken one is sanitized or replaced.
    pub fn load(&self) -> EngineConfig {
        match self.load_strict() {
            Ok(config) => config,
            Err(ConfigError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                EngineConfig::default()
            }
            Err(ConfigError::Invalid { field, reason }) => {
                log::warn!(
                    "config {} has invalid {field} ({reason}); sanitizing",
                    self.path.display()
                );
                fs::read(&self.path)
                    .ok()
                    .and_then(|bytes| serde_json::from_slice::<EngineConfig>(&bytes).ok())
                    .map(EngineConfig::sanitized)
                    .unwrap_or_default()
            }
            Err(e) => {
                log::warn!("config {} unusable ({e}); using defaults", self.path.display());
                EngineConfig::default()
            }
        }
    }

    pub fn save(&self, config: &EngineConfig) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let text = serde_json::to_string_pretty(config)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(&self.path, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(name: &str) -> ConfigStore {
        let dir = std::env::temp_dir().join(format!(
            "tetrad-config-{name}-{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        ConfigStore::new(dir.join("config.json"))
    }

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        assert_eq!((config.rows, config.cols), (23, 16));
        assert_eq!(config.base_period_ms, 50);
        assert_eq!(config.color_count, 11);
        config.validate().expect("defaults validate");
    }

    #[test]
    fn spawn_col_is_near_center_and_fits() {
        assert_eq!(EngineConfig::with_board(23, 16).spawn_col(), 7);
        assert_eq!(EngineConfig::with_board(20, 10).spawn_col(), 4);
        assert_eq!(EngineConfig::with_board(4, 4).spawn_col(), 0);
        assert_eq!(EngineConfig::with_board(4, 5).spawn_col(), 1);
    }

    #[test]
    fn validate_rejects_bad_tiers() {
        let mut config = EngineConfig::default();
        config.speed.tiers.swap(0, 1);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "speed.tiers",
                ..
            })
        ));

        config.speed.tiers.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_small_board_and_palette() {
        assert!(EngineConfig::with_board(3, 10).validate().is_err());
        let config = EngineConfig {
            color_count: 6,
            ..EngineConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("color_count"));
    }

    #[test]
    fn sanitized_restores_defaults_for_bad_fields() {
        let config = EngineConfig {
            rows: 1,
            base_period_ms: 0,
            fast_drop_factor: 0.5,
            speed: SpeedConfig { tiers: vec![] },
            ..EngineConfig::with_board(20, 10)
        }
        .sanitized();
        assert_eq!(config.rows, 23);
        assert_eq!(config.cols, 10);
        assert_eq!(config.base_period_ms, 50);
        assert_eq!(config.fast_drop_factor, 2.5);
        assert_eq!(config.speed, SpeedConfig::default());
        config.validate().expect("sanitized config validates");
    }

    #[test]
    fn serde_defaults_fill_missing_fields() {
        let parsed: EngineConfig =
            serde_json::from_str(r#"{"rows":20,"cols":10}"#).expect("config JSON should parse");
        assert_eq!(parsed, EngineConfig::with_board(20, 10));
    }

    #[test]
    fn store_round_trips_and_falls_back() {
        let store = temp_store("roundtrip");
        assert_eq!(store.load(), EngineConfig::default());
        assert!(matches!(store.load_strict(), Err(ConfigError::Io(_))));

        let config = EngineConfig {
            seed: 99,
            ..EngineConfig::with_board(20, 10)
        };
        store.save(&config).expect("save config");
        assert_eq!(store.load_strict().expect("load config"), config);

        fs::write(store.path(), b"{ not json").expect("write corrupt config");
        assert!(matches!(store.load_strict(), Err(ConfigError::Parse(_))));
        assert_eq!(store.load(), EngineConfig::default());

        fs::write(store.path(), br#"{"rows":2,"cols":10}"#).expect("write invalid config");
        assert_eq!(store.load(), EngineConfig::with_board(23, 10));
    }
}
