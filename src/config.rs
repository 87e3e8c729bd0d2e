use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::constants::constants;
use crate::playback::{EmbedStrategy, PlaybackPolicy};
use crate::youtube::{ApiConfig, usable_api_key};

pub const API_KEY_ENV: &str = "FASTTUBE_API_KEY";

/// The Data API rejects page sizes above this.
const MAX_PAGE_SIZE: u32 = 50;

/// User preferences from `config.toml`. Every field is optional and falls
/// back to the embedded constants.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct Config {
  pub theme_name: Option<String>,
  pub api_key: Option<String>,
  pub region: Option<String>,
  pub max_results: Option<u32>,
  pub cache_freshness_secs: Option<u64>,
  pub embed_grace_period_ms: Option<u64>,
  /// Replaces the built-in embed fallback ladder when non-empty.
  pub embed_strategies: Option<Vec<EmbedStrategy>>,
}

fn config_path() -> Option<PathBuf> {
  ProjectDirs::from("", "", "fasttube").map(|d| d.config_dir().join("config.toml"))
}

impl Config {
  pub fn load() -> Self {
    config_path().map(|p| Self::load_from(&p)).unwrap_or_default()
  }

  pub fn load_from(path: &Path) -> Self {
    let Ok(content) = std::fs::read_to_string(path) else { return Self::default() };
    match toml::from_str(&content) {
      Ok(config) => config,
      Err(e) => {
        warn!(path = %path.display(), err = %e, "config: unreadable, using defaults");
        Self::default()
      }
    }
  }

  pub fn save(&self) {
    if let Some(path) = config_path() {
      self.save_to(&path);
    }
  }

  pub fn save_to(&self, path: &Path) {
    if let Some(dir) = path.parent()
      && std::fs::create_dir_all(dir).is_ok()
    {
      match toml::to_string(self) {
        Ok(content) => {
          if let Err(e) = std::fs::write(path, content) {
            warn!(path = %path.display(), err = %e, "config: failed to save");
          }
        }
        Err(e) => warn!(err = %e, "config: failed to serialize"),
      }
    }
  }

  /// Snapshot for the API client. `api_key` comes from [`resolve_api_key`].
  pub fn api_config(&self, api_key: Option<String>) -> ApiConfig {
    let c = constants();
    ApiConfig {
      base_url: c.api_base_url.clone(),
      api_key,
      region: self.region.clone().filter(|r| !r.trim().is_empty()).unwrap_or_else(|| c.default_region.clone()),
      max_results: self.max_results.unwrap_or(c.default_max_results).clamp(1, MAX_PAGE_SIZE),
      freshness: Duration::from_secs(self.cache_freshness_secs.unwrap_or(c.cache_freshness_secs)),
    }
  }

  /// Snapshot for the playback controller.
  pub fn playback_policy(&self) -> PlaybackPolicy {
    let mut policy = PlaybackPolicy::default();
    if let Some(ms) = self.embed_grace_period_ms {
      policy.grace_period = Duration::from_millis(ms);
    }
    if let Some(strategies) = self.embed_strategies.as_ref().filter(|s| !s.is_empty()) {
      policy.strategies = strategies.clone();
    }
    policy
  }
}

/// Every place an API key can come from, highest priority first.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeySources<'a> {
  pub stored: Option<&'a str>,
  pub cli: Option<&'a str>,
  pub file: Option<&'a str>,
  pub env: Option<&'a str>,
}

/// First usable key in priority order. Empty strings and the placeholder are skipped.
pub fn resolve_api_key(sources: KeySources<'_>) -> Option<String> {
  [sources.stored, sources.cli, sources.file, sources.env].into_iter().find_map(usable_api_key)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(Config::load_from(&dir.path().join("nope.toml")), Config::default());
  }

  #[test]
  fn corrupt_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "theme_name = [").unwrap();
    assert_eq!(Config::load_from(&path), Config::default());
  }

  #[test]
  fn save_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");
    let config = Config { theme_name: Some("Nord".into()), region: Some("GB".into()), ..Config::default() };
    config.save_to(&path);
    assert_eq!(Config::load_from(&path), config);
  }

  #[test]
  fn api_config_falls_back_to_constants() {
    let api = Config::default().api_config(None);
    assert_eq!(api.region, "US");
    assert_eq!(api.max_results, 20);
    assert_eq!(api.freshness, Duration::from_secs(3600));
    assert!(!api.has_credential());
  }

  #[test]
  fn api_config_clamps_page_size() {
    let config = Config { max_results: Some(500), region: Some("  ".into()), ..Config::default() };
    let api = config.api_config(Some("k".into()));
    assert_eq!(api.max_results, 50);
    assert_eq!(api.region, "US");
  }

  #[test]
  fn strategy_override_from_toml() {
    let config: Config = toml::from_str(
      r#"
      embed_grace_period_ms = 2000

      [[embed_strategies]]
      name = "only"
      base_url = "https://www.youtube.com/embed"
      params = [["autoplay", "1"]]
      "#,
    )
    .unwrap();
    let policy = config.playback_policy();
    assert_eq!(policy.grace_period, Duration::from_millis(2000));
    assert_eq!(policy.strategies.len(), 1);
    assert_eq!(policy.strategies[0].embed_url("x"), "https://www.youtube.com/embed/x?autoplay=1");
  }

  #[test]
  fn empty_strategy_override_keeps_defaults() {
    let config = Config { embed_strategies: Some(vec![]), ..Config::default() };
    assert_eq!(config.playback_policy().strategies, PlaybackPolicy::default().strategies);
  }

  #[test]
  fn key_priority_order() {
    let all = KeySources { stored: Some("stored"), cli: Some("cli"), file: Some("file"), env: Some("env") };
    assert_eq!(resolve_api_key(all).as_deref(), Some("stored"));
    let no_stored = KeySources { stored: None, ..all };
    assert_eq!(resolve_api_key(no_stored).as_deref(), Some("cli"));
    let only_env = KeySources { env: Some("env"), ..KeySources::default() };
    assert_eq!(resolve_api_key(only_env).as_deref(), Some("env"));
  }

  #[test]
  fn placeholder_and_blank_keys_are_skipped() {
    let sources =
      KeySources { stored: Some(""), cli: Some("YOUR_YOUTUBE_API_KEY_HERE"), file: Some("  "), env: Some("real") };
    assert_eq!(resolve_api_key(sources).as_deref(), Some("real"));
    assert_eq!(resolve_api_key(KeySources::default()), None);
  }
}
