//! Application constants loaded from `constants.ron` at compile time.
//!
//! Tunables for the API client, the embed fallback ladder and local storage.
//! Parsed once on first access via `LazyLock`.

use serde::Deserialize;
use std::sync::LazyLock;

use crate::playback::EmbedStrategy;

/// All tuneable application constants.
#[derive(Debug, Deserialize)]
pub struct Constants {
  // YouTube Data API
  pub api_base_url: String,
  pub api_key_placeholder: String,
  pub default_region: String,
  pub default_max_results: u32,
  pub related_max_results: u32,

  // Response cache
  pub cache_freshness_secs: u64,

  // Embed fallback ladder
  pub embed_grace_period_ms: u64,
  pub min_usable_embed_height: u32,
  pub embed_strategies: Vec<EmbedStrategy>,

  // Local store
  pub history_limit: usize,
  pub watch_time_estimate_secs: u64,
  pub storage_quota_bytes: u64,

  /// Named category filters mapped to canned search queries.
  pub categories: Vec<(String, String)>,
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Safety: the RON file is embedded at compile time; if it's malformed this is a build-time error.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}
