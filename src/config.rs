//! Configuration management for scav-announcer-rs.
//!
//! Loads config from YAML files in standard locations. Every section
//! falls back to defaults, so a partial file is fine.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_INTERVAL_HOURS: f64 = 2.0;
/// One week.
const MAX_INTERVAL_HOURS: f64 = 168.0;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    pub path: PathBuf,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("scav_lists/2024.pdf"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub interval_hours: f64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_hours: DEFAULT_INTERVAL_HOURS,
        }
    }
}

impl ScheduleConfig {
    /// Period between scheduled announcements, between one second and one week.
    /// Non-finite values fall back to the default.
    pub fn interval(&self) -> Duration {
        let hours = if self.interval_hours.is_finite() {
            self.interval_hours
        } else {
            DEFAULT_INTERVAL_HOURS
        };
        let secs = (hours * 3600.0).clamp(1.0, MAX_INTERVAL_HOURS * 3600.0);
        Duration::try_from_secs_f64(secs)
            .unwrap_or(Duration::from_secs((DEFAULT_INTERVAL_HOURS * 3600.0) as u64))
    }

    fn normalize(&mut self) {
        if !self.interval_hours.is_finite() {
            warn!(
                "schedule.interval_hours = {} is not finite, using {DEFAULT_INTERVAL_HOURS}",
                self.interval_hours
            );
            self.interval_hours = DEFAULT_INTERVAL_HOURS;
        } else if self.interval_hours > MAX_INTERVAL_HOURS {
            warn!(
                "schedule.interval_hours = {} is too long, capping at {MAX_INTERVAL_HOURS}",
                self.interval_hours
            );
            self.interval_hours = MAX_INTERVAL_HOURS;
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub max_items: usize,
    pub max_item_chars: usize,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            max_items: 5,
            max_item_chars: 100,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TTSConfig {
    /// `auto`, `say` or `espeak`.
    pub backend: String,
    /// Empty means the backend's own default voice.
    pub voice: String,
    /// Words per minute (50-300).
    pub rate: u32,
    /// 0.0 to 1.0
    pub volume: f32,
    /// 0.5 to 2.0
    pub pitch: f32,
    /// Seconds of silence after each announcement.
    pub pause_between_items: f64,
}

impl Default for TTSConfig {
    fn default() -> Self {
        Self {
            backend: "auto".into(),
            voice: String::new(),
            rate: 150,
            volume: 1.0,
            pitch: 1.0,
            pause_between_items: 1.0,
        }
    }
}

impl TTSConfig {
    fn normalize(&mut self) {
        if !self.pause_between_items.is_finite() || self.pause_between_items > 60.0 {
            warn!(
                "tts.pause_between_items = {} is out of range, using 1.0",
                self.pause_between_items
            );
            self.pause_between_items = 1.0;
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Defaults to `~/.scav-announcer/history.json`.
    pub path: Option<PathBuf>,
    pub recent_limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: None,
            recent_limit: 10,
        }
    }
}

impl HistoryConfig {
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".scav-announcer")
                .join("history.json")
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    pub notifications: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub document: DocumentConfig,
    pub schedule: ScheduleConfig,
    pub preview: PreviewConfig,
    pub tts: TTSConfig,
    pub history: HistoryConfig,
    pub feedback: FeedbackConfig,
    pub logging: LoggingConfig,
    pub selection: SelectionConfig,
}

impl Config {
    /// Load configuration from YAML file.
    ///
    /// Searches standard locations if no path is provided:
    /// 1. ./config.yaml
    /// 2. ~/.config/scav-announcer/config.yaml
    /// 3. /etc/scav-announcer/config.yaml
    ///
    /// A file that cannot be read or parsed is reported and replaced by defaults.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(config_path) = path.map(Path::to_path_buf).or_else(Self::find_file) else {
            info!("No config file found, using defaults");
            return Self::default();
        };

        match Self::read_file(&config_path) {
            Ok(config) => {
                info!("Loaded config from {}", config_path.display());
                config
            }
            Err(reason) => {
                warn!("{reason}, using defaults");
                Self::default()
            }
        }
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::with_capacity(3);
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd.join("config.yaml"));
        }
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".config/scav-announcer/config.yaml"));
        }
        paths.push(PathBuf::from("/etc/scav-announcer/config.yaml"));
        paths
    }

    fn find_file() -> Option<PathBuf> {
        Self::search_paths().into_iter().find(|p| p.is_file())
    }

    fn read_file(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
        Self::from_yaml(&contents).map_err(|e| format!("Failed to parse {}: {e}", path.display()))
    }

    /// Parse YAML and bring out-of-range values back into range.
    pub fn from_yaml(contents: &str) -> Result<Self, serde_yml::Error> {
        let config: Self = serde_yml::from_str(contents)?;
        Ok(config.validated())
    }

    fn validated(mut self) -> Self {
        self.schedule.normalize();
        self.tts.normalize();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_shipped_settings() {
        let config = Config::default();
        assert_eq!(config.document.path, PathBuf::from("scav_lists/2024.pdf"));
        assert_eq!(config.schedule.interval_hours, 2.0);
        assert_eq!(config.preview.max_items, 5);
        assert_eq!(config.preview.max_item_chars, 100);
        assert!(config.tts.voice.is_empty());
        assert_eq!(config.tts.rate, 150);
        assert_eq!(config.history.recent_limit, 10);
        assert!(!config.feedback.notifications);
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let yaml = "schedule:\n  interval_hours: 0.5\ntts:\n  voice: Alex\n";
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.schedule.interval_hours, 0.5);
        assert_eq!(config.schedule.interval(), std::time::Duration::from_secs(1800));
        assert_eq!(config.tts.voice, "Alex");
        assert_eq!(config.tts.rate, 150);
        assert_eq!(config.preview.max_items, 5);
    }

    #[test]
    fn interval_is_clamped_to_one_second() {
        let schedule = ScheduleConfig { interval_hours: 0.0 };
        assert_eq!(schedule.interval(), std::time::Duration::from_secs(1));
    }

    #[test]
    fn non_finite_interval_falls_back_to_default() {
        for hours in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            let schedule = ScheduleConfig { interval_hours: hours };
            assert_eq!(schedule.interval(), Duration::from_secs(7200));
        }
    }

    #[test]
    fn huge_interval_is_capped_at_one_week() {
        let schedule = ScheduleConfig { interval_hours: 1.0e16 };
        assert_eq!(schedule.interval(), Duration::from_secs(168 * 3600));
    }

    #[test]
    fn yaml_interval_is_validated_on_load() {
        let config = Config::from_yaml("schedule:\n  interval_hours: .inf\n").unwrap();
        assert_eq!(config.schedule.interval_hours, DEFAULT_INTERVAL_HOURS);
        assert_eq!(config.schedule.interval(), Duration::from_secs(7200));

        let config = Config::from_yaml("schedule:\n  interval_hours: 1.0e16\n").unwrap();
        assert_eq!(config.schedule.interval_hours, MAX_INTERVAL_HOURS);
    }

    #[test]
    fn runaway_pause_is_reset() {
        let config = Config::from_yaml("tts:\n  pause_between_items: .inf\n").unwrap();
        assert_eq!(config.tts.pause_between_items, 1.0);
    }

    #[test]
    fn load_validates_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "schedule:\n  interval_hours: 1.0e16\ntts:\n  voice: Alex\n").unwrap();

        let config = Config::load(Some(path.as_path()));
        assert_eq!(config.schedule.interval_hours, MAX_INTERVAL_HOURS);
        assert_eq!(config.tts.voice, "Alex");
    }

    #[test]
    fn unparsable_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "schedule: [not, a, map\n").unwrap();

        let config = Config::load(Some(path.as_path()));
        assert_eq!(config.schedule.interval_hours, DEFAULT_INTERVAL_HOURS);
    }

    #[test]
    fn explicit_history_path_wins() {
        let yaml = "history:\n  path: /tmp/hist.json\n";
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.history.resolved_path(), PathBuf::from("/tmp/hist.json"));
    }

    #[test]
    fn missing_explicit_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(dir.path().join("nope.yaml").as_path()));
        assert!(config.tts.voice.is_empty());
        assert_eq!(config.schedule.interval_hours, DEFAULT_INTERVAL_HOURS);
    }
}
