//! Local persistence for settings, playlist, watch history and usage stats.
//!
//! Each document is a whole JSON value under a namespaced key. Every public
//! `LocalStore` operation is best-effort: storage or decoding failures are
//! logged and the caller gets a safe default instead of an error.

use chrono::{DateTime, NaiveDate, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

pub const SETTINGS_KEY: &str = "fasttube_settings";
pub const PLAYLIST_KEY: &str = "fasttube_playlist";
pub const PLAYLISTS_KEY: &str = "fasttube_playlists";
pub const HISTORY_KEY: &str = "fasttube_watch_history";
pub const STATS_KEY: &str = "fasttube_stats";
pub const API_KEY_KEY: &str = "youtube_api_key";

/// The built-in playlist, stored under [`PLAYLIST_KEY`]. It always exists and
/// cannot be deleted. User-created playlists share one name-to-entries map.
pub const DEFAULT_PLAYLIST: &str = "Favorites";

#[derive(Error, Debug)]
pub enum StoreError {
  #[error("storage I/O failed: {0}")]
  Io(#[from] std::io::Error),

  #[error("corrupted document: {0}")]
  Json(#[from] serde_json::Error),

  #[error("storage quota exceeded: {needed} bytes needed, quota is {quota}")]
  QuotaExceeded { needed: u64, quota: u64 },

  #[error("invalid storage key: {0}")]
  InvalidKey(String),
}

/// Synchronous string-keyed storage with a finite quota.
pub trait Storage: Send {
  fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
  fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
  fn remove(&mut self, key: &str) -> Result<(), StoreError>;
  /// All (key, value) pairs currently stored.
  fn entries(&self) -> Result<Vec<(String, String)>, StoreError>;
}

fn check_quota(used_by_others: u64, key: &str, value: &str, quota: u64) -> Result<(), StoreError> {
  let needed = used_by_others + (key.len() + value.len()) as u64;
  if needed > quota {
    return Err(StoreError::QuotaExceeded { needed, quota });
  }
  Ok(())
}

// --- File-backed storage ---

/// One file per key inside a directory. Writes go through a temp file and a
/// rename so a document is never observed half-written.
pub struct FileStorage {
  dir: PathBuf,
  quota: u64,
}

impl FileStorage {
  pub fn open(dir: impl Into<PathBuf>, quota: u64) -> Result<Self, StoreError> {
    let dir = dir.into();
    std::fs::create_dir_all(&dir)?;
    Ok(Self { dir, quota })
  }

  /// Open the store under the platform data directory.
  pub fn open_default(quota: u64) -> Result<Self, StoreError> {
    let proj_dirs = ProjectDirs::from("", "", "fasttube")
      .ok_or_else(|| StoreError::Io(std::io::Error::other("no home directory for data storage")))?;
    Self::open(proj_dirs.data_dir().join("store"), quota)
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }

  fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
    if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
      return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(self.dir.join(format!("{}.json", key)))
  }
}

impl Storage for FileStorage {
  fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
    match std::fs::read_to_string(self.path_for(key)?) {
      Ok(content) => Ok(Some(content)),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(e.into()),
    }
  }

  fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
    let path = self.path_for(key)?;
    let others: u64 = self.entries()?.iter().filter(|(k, _)| k != key).map(|(k, v)| (k.len() + v.len()) as u64).sum();
    check_quota(others, key, value, self.quota)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, value)?;
    std::fs::rename(&tmp, &path)?;
    Ok(())
  }

  fn remove(&mut self, key: &str) -> Result<(), StoreError> {
    match std::fs::remove_file(self.path_for(key)?) {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
      Err(e) => Err(e.into()),
    }
  }

  fn entries(&self) -> Result<Vec<(String, String)>, StoreError> {
    let mut out = Vec::new();
    for entry in std::fs::read_dir(&self.dir)? {
      let path = entry?.path();
      if path.extension().and_then(|e| e.to_str()) != Some("json") {
        continue;
      }
      let Some(key) = path.file_stem().and_then(|s| s.to_str()) else { continue };
      out.push((key.to_string(), std::fs::read_to_string(&path)?));
    }
    Ok(out)
  }
}

// --- In-memory storage ---

/// Volatile storage, used when the data directory is unavailable and in tests.
#[derive(Default)]
pub struct MemoryStorage {
  map: HashMap<String, String>,
  quota: Option<u64>,
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }

  #[cfg(test)]
  pub fn with_quota(quota: u64) -> Self {
    Self { map: HashMap::new(), quota: Some(quota) }
  }
}

impl Storage for MemoryStorage {
  fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
    Ok(self.map.get(key).cloned())
  }

  fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
    if let Some(quota) = self.quota {
      let others: u64 = self.map.iter().filter(|(k, _)| *k != key).map(|(k, v)| (k.len() + v.len()) as u64).sum();
      check_quota(others, key, value, quota)?;
    }
    self.map.insert(key.to_string(), value.to_string());
    Ok(())
  }

  fn remove(&mut self, key: &str) -> Result<(), StoreError> {
    self.map.remove(key);
    Ok(())
  }

  fn entries(&self) -> Result<Vec<(String, String)>, StoreError> {
    Ok(self.map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
  }
}

// --- Documents ---

/// Stream quality preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
  #[default]
  Auto,
  Small,
  Medium,
  Large,
  Hd720,
  Hd1080,
}

impl Quality {
  pub const ALL: [Quality; 6] =
    [Quality::Auto, Quality::Small, Quality::Medium, Quality::Large, Quality::Hd720, Quality::Hd1080];

  pub fn label(self) -> &'static str {
    match self {
      Quality::Auto => "auto",
      Quality::Small => "small",
      Quality::Medium => "medium",
      Quality::Large => "large",
      Quality::Hd720 => "hd720",
      Quality::Hd1080 => "hd1080",
    }
  }

  /// Maximum stream height in pixels, or `None` to let the player choose.
  pub fn max_height(self) -> Option<u32> {
    match self {
      Quality::Auto => None,
      Quality::Small => Some(240),
      Quality::Medium => Some(360),
      Quality::Large => Some(480),
      Quality::Hd720 => Some(720),
      Quality::Hd1080 => Some(1080),
    }
  }

  pub fn next(self) -> Self {
    // Safety: position() always finds self in ALL, and the modulo keeps the index in bounds.
    let idx = Quality::ALL.iter().position(|q| *q == self).unwrap_or(0);
    Quality::ALL[(idx + 1) % Quality::ALL.len()]
  }
}

/// User settings. Missing fields in a stored document fall back to defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
  pub auto_quality: bool,
  pub background_play_enabled: bool,
  pub save_history: bool,
  pub default_quality: Quality,
}

impl Default for Settings {
  fn default() -> Self {
    Self { auto_quality: true, background_play_enabled: true, save_history: true, default_quality: Quality::Auto }
  }
}

impl Settings {
  /// Height cap passed to the player, honoring `auto_quality`.
  pub fn quality_cap(&self) -> Option<u32> {
    if self.auto_quality { None } else { self.default_quality.max_height() }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistEntry {
  pub video_id: String,
  pub title: String,
  #[serde(default)]
  pub thumbnail_url: String,
  /// Epoch millis.
  pub added_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
  pub video_id: String,
  pub title: String,
  /// Epoch millis.
  pub watched_at: i64,
}

/// Display-only usage counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Stats {
  pub videos_watched: u64,
  /// Estimated seconds watched.
  pub total_watch_time: u64,
  pub category_views: BTreeMap<String, u64>,
  /// Distinct `YYYY-MM-DD` days with at least one watched video.
  pub active_days: Vec<String>,
}

impl Stats {
  /// Per-category counts, most viewed first.
  pub fn top_categories(&self) -> Vec<(&str, u64)> {
    let mut cats: Vec<(&str, u64)> = self.category_views.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    cats.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    cats
  }
}

#[derive(Debug, Clone)]
pub enum StatsEvent {
  VideoWatched { category: Option<String>, day: NaiveDate, estimated_secs: u64 },
}

/// Everything exportable in one document.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
  pub playlist: Vec<PlaylistEntry>,
  pub playlists: BTreeMap<String, Vec<PlaylistEntry>>,
  pub history: Vec<HistoryEntry>,
  pub stats: Stats,
  pub settings: Settings,
  /// Epoch millis.
  pub exported_at: i64,
}

// --- LocalStore ---

pub struct LocalStore {
  storage: Box<dyn Storage>,
  history_limit: usize,
}

impl LocalStore {
  pub fn new(storage: Box<dyn Storage>, history_limit: usize) -> Self {
    Self { storage, history_limit }
  }

  fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
    match self.storage.get(key)? {
      Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
      None => Ok(None),
    }
  }

  fn write<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), StoreError> {
    let raw = serde_json::to_string(value)?;
    self.storage.set(key, &raw)
  }

  /// Read a document, degrading to its default on any failure.
  fn read_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
    match self.read(key) {
      Ok(value) => value.unwrap_or_default(),
      Err(e) => {
        warn!(key, err = %e, "store: read failed, using default");
        T::default()
      }
    }
  }

  fn write_logged<T: Serialize>(&mut self, key: &str, value: &T) -> bool {
    match self.write(key, value) {
      Ok(()) => true,
      Err(e) => {
        warn!(key, err = %e, "store: write failed");
        false
      }
    }
  }

  // --- Settings ---

  pub fn settings(&self) -> Settings {
    self.read_or_default(SETTINGS_KEY)
  }

  pub fn save_settings(&mut self, settings: &Settings) -> bool {
    debug!(?settings, "store: saving settings");
    self.write_logged(SETTINGS_KEY, settings)
  }

  // --- Playlists ---

  fn named_playlists(&self) -> BTreeMap<String, Vec<PlaylistEntry>> {
    self.read_or_default(PLAYLISTS_KEY)
  }

  /// The built-in playlist first, then user playlists in name order.
  pub fn playlist_names(&self) -> Vec<String> {
    let mut names = vec![DEFAULT_PLAYLIST.to_string()];
    names.extend(self.named_playlists().into_keys());
    names
  }

  /// Returns `false` for a blank or already used name.
  pub fn create_playlist(&mut self, name: &str) -> bool {
    let name = name.trim();
    if name.is_empty() || name == DEFAULT_PLAYLIST {
      return false;
    }
    let mut all = self.named_playlists();
    if all.contains_key(name) {
      return false;
    }
    all.insert(name.to_string(), Vec::new());
    self.write_logged(PLAYLISTS_KEY, &all)
  }

  /// Delete a user playlist with its entries. The built-in one is kept.
  pub fn delete_playlist(&mut self, name: &str) -> bool {
    let mut all = self.named_playlists();
    if all.remove(name).is_none() {
      return false;
    }
    self.write_logged(PLAYLISTS_KEY, &all)
  }

  /// Entries of playlist `name`; unknown names read as empty.
  pub fn playlist(&self, name: &str) -> Vec<PlaylistEntry> {
    if name == DEFAULT_PLAYLIST {
      self.read_or_default(PLAYLIST_KEY)
    } else {
      self.named_playlists().remove(name).unwrap_or_default()
    }
  }

  fn save_playlist(&mut self, name: &str, entries: Vec<PlaylistEntry>) -> bool {
    if name == DEFAULT_PLAYLIST {
      return self.write_logged(PLAYLIST_KEY, &entries);
    }
    let mut all = self.named_playlists();
    all.insert(name.to_string(), entries);
    self.write_logged(PLAYLISTS_KEY, &all)
  }

  /// Append an entry, creating the playlist if needed. Returns `false` without
  /// writing if the video is already in that playlist.
  pub fn add_to_playlist(&mut self, name: &str, entry: PlaylistEntry) -> bool {
    let mut playlist = self.playlist(name);
    if playlist.iter().any(|e| e.video_id == entry.video_id) {
      return false;
    }
    playlist.push(entry);
    self.save_playlist(name, playlist)
  }

  pub fn remove_from_playlist(&mut self, name: &str, video_id: &str) {
    let mut playlist = self.playlist(name);
    let before = playlist.len();
    playlist.retain(|e| e.video_id != video_id);
    if playlist.len() != before {
      self.save_playlist(name, playlist);
    }
  }

  /// Empty a playlist. A user playlist keeps its name.
  pub fn clear_playlist(&mut self, name: &str) {
    if name != DEFAULT_PLAYLIST {
      self.save_playlist(name, Vec::new());
    } else if let Err(e) = self.storage.remove(PLAYLIST_KEY) {
      warn!(err = %e, "store: failed to clear playlist");
    }
  }

  // --- History ---

  pub fn history(&self) -> Vec<HistoryEntry> {
    self.read_or_default(HISTORY_KEY)
  }

  /// Record a watch, most recent first. A repeat watch moves the entry to the
  /// front. No-op when history saving is disabled.
  pub fn add_to_history(&mut self, entry: HistoryEntry) {
    if !self.settings().save_history {
      debug!(video_id = %entry.video_id, "store: history disabled, not recording");
      return;
    }
    let mut history = self.history();
    history.retain(|e| e.video_id != entry.video_id);
    history.insert(0, entry);
    history.truncate(self.history_limit);
    self.write_logged(HISTORY_KEY, &history);
  }

  pub fn clear_history(&mut self) {
    if let Err(e) = self.storage.remove(HISTORY_KEY) {
      warn!(err = %e, "store: failed to clear history");
    }
  }

  // --- Stats ---

  pub fn stats(&self) -> Stats {
    self.read_or_default(STATS_KEY)
  }

  pub fn update_stats(&mut self, event: StatsEvent) {
    let mut stats = self.stats();
    match event {
      StatsEvent::VideoWatched { category, day, estimated_secs } => {
        stats.videos_watched += 1;
        stats.total_watch_time += estimated_secs;
        if let Some(category) = category {
          *stats.category_views.entry(category).or_insert(0) += 1;
        }
        let day = day.format("%Y-%m-%d").to_string();
        if !stats.active_days.contains(&day) {
          stats.active_days.push(day);
        }
      }
    }
    self.write_logged(STATS_KEY, &stats);
  }

  // --- Credential override ---

  pub fn api_key_override(&self) -> Option<String> {
    match self.storage.get(API_KEY_KEY) {
      Ok(key) => key,
      Err(e) => {
        warn!(err = %e, "store: failed to read API key override");
        None
      }
    }
  }

  pub fn save_api_key(&mut self, key: &str) -> bool {
    match self.storage.set(API_KEY_KEY, key.trim()) {
      Ok(()) => true,
      Err(e) => {
        warn!(err = %e, "store: failed to save API key");
        false
      }
    }
  }

  // --- Misc ---

  /// Total size of all stored keys and documents in bytes.
  pub fn usage_bytes(&self) -> u64 {
    match self.storage.entries() {
      Ok(entries) => entries.iter().map(|(k, v)| (k.len() + v.len()) as u64).sum(),
      Err(e) => {
        warn!(err = %e, "store: failed to measure usage");
        0
      }
    }
  }

  pub fn export(&self, now: DateTime<Utc>) -> ExportBundle {
    ExportBundle {
      playlist: self.playlist(DEFAULT_PLAYLIST),
      playlists: self.named_playlists(),
      history: self.history(),
      stats: self.stats(),
      settings: self.settings(),
      exported_at: now.timestamp_millis(),
    }
  }
}

/// Format a byte count as kilobytes with two decimals.
pub fn format_kb(bytes: u64) -> String {
  format!("{:.2} KB", bytes as f64 / 1024.0)
}
