use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}, time::Duration};

use crate::{tip::TipPolicy, units::UnitSystem, view::DisplayPrefs};

/// Where the hosting web app lives and how to talk to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Sent as `X-CSRFToken` on saved-location writes.
    pub csrf_token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            csrf_token: None,
            timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub units: UnitSystem,
    /// Activity slug highlighted on the location view, e.g. "running".
    pub primary_activity: Option<String>,
    pub top_activities: usize,
    /// Ask the scores endpoint for the weekly outlook.
    pub weekly: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            units: UnitSystem::Metric,
            primary_activity: None,
            top_activities: 3,
            weekly: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub search_debounce_ms: u64,
    pub map_debounce_ms: u64,
    pub toast_ms: u64,
    pub scores_timeout_ms: u64,
    pub spot_radius_m: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            search_debounce_ms: 280,
            map_debounce_ms: 800,
            toast_ms: 4500,
            scores_timeout_ms: 8000,
            spot_radius_m: 8000,
        }
    }
}

impl TimingConfig {
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn map_debounce(&self) -> Duration {
        Duration::from_millis(self.map_debounce_ms)
    }

    pub fn toast(&self) -> Duration {
        Duration::from_millis(self.toast_ms)
    }

    pub fn scores_timeout(&self) -> Duration {
        Duration::from_millis(self.scores_timeout_ms)
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// [api]
/// base_url = "https://outdoors.example.com"
/// csrf_token = "..."
///
/// [display]
/// units = "imperial"
/// primary_activity = "running"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub display: DisplayConfig,
    pub timing: TimingConfig,
    pub tips: TipPolicy,
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, use defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "outdoor", "outdoor-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Set the API base URL; only http(s) URLs are accepted.
    pub fn set_base_url(&mut self, url: &str) -> Result<()> {
        let url = url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(anyhow!(
                "Invalid base URL '{url}'.\n\
                 Hint: it must start with http:// or https://, e.g. `http://127.0.0.1:8000`."
            ));
        }
        self.api.base_url = url.trim_end_matches('/').to_string();
        Ok(())
    }

    /// Blank input clears the primary activity.
    pub fn set_primary_activity(&mut self, slug: Option<&str>) {
        self.display.primary_activity = slug
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
    }

    pub fn set_csrf_token(&mut self, token: Option<&str>) {
        self.api.csrf_token = token.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);
    }

    /// Everything a render needs from configuration, read once per load.
    pub fn display_prefs(&self) -> DisplayPrefs {
        DisplayPrefs {
            units: self.display.units,
            primary_activity: self.display.primary_activity.clone(),
            top_activities: self.display.top_activities,
            tips: self.tips.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_client_behaviour() {
        let cfg = Config::default();

        assert_eq!(cfg.display.units, UnitSystem::Metric);
        assert_eq!(cfg.timing.search_debounce(), Duration::from_millis(280));
        assert_eq!(cfg.timing.map_debounce(), Duration::from_millis(800));
        assert_eq!(cfg.timing.toast(), Duration::from_millis(4500));
        assert_eq!(cfg.timing.spot_radius_m, 8000);
        assert_eq!(cfg.tips, TipPolicy::default());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [display]
            units = "imperial"
            primary_activity = "running"

            [tips]
            rain_threshold_pct = 50.0
            "#,
        )
        .expect("should parse");

        assert_eq!(cfg.display.units, UnitSystem::Imperial);
        assert_eq!(cfg.display.primary_activity.as_deref(), Some("running"));
        assert_eq!(cfg.display.top_activities, 3);
        assert_eq!(cfg.tips.rain_threshold_pct, 50.0);
        assert_eq!(cfg.tips.rain_last_step, 4);
        assert_eq!(cfg.api, ApiConfig::default());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = std::env::temp_dir().join(format!("outdoor-config-test-{}", std::process::id()));
        let path = dir.join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.set_primary_activity(Some("Hiking"));
        cfg.set_csrf_token(Some("abc123"));
        cfg.save_to(&path).expect("save");

        let loaded = Config::load_from(&path).expect("load");
        assert_eq!(loaded, cfg);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_file_loads_defaults() {
        let path = std::env::temp_dir().join("outdoor-config-does-not-exist.toml");
        assert_eq!(Config::load_from(&path).expect("load"), Config::default());
    }

    #[test]
    fn base_url_must_be_http() {
        let mut cfg = Config::default();

        let err = cfg.set_base_url("ftp://example.com").unwrap_err();
        assert!(err.to_string().contains("Invalid base URL"));
        assert!(err.to_string().contains("Hint"));

        cfg.set_base_url("https://example.com/").expect("valid");
        assert_eq!(cfg.api.base_url, "https://example.com");
    }

    #[test]
    fn blank_primary_activity_clears_it() {
        let mut cfg = Config::default();

        cfg.set_primary_activity(Some(" Running "));
        assert_eq!(cfg.display.primary_activity.as_deref(), Some("running"));

        cfg.set_primary_activity(Some("   "));
        assert!(cfg.display.primary_activity.is_none());
    }

    #[test]
    fn display_prefs_carry_tip_policy() {
        let mut cfg = Config::default();
        cfg.display.units = UnitSystem::Imperial;
        cfg.tips.rain_threshold_pct = 75.0;

        let prefs = cfg.display_prefs();
        assert_eq!(prefs.units, UnitSystem::Imperial);
        assert_eq!(prefs.tips.rain_threshold_pct, 75.0);
    }
}
