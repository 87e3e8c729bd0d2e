use chrono::{Local, Utc};
use ratatui::widgets::ListState;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::constants::constants;
use crate::playback::{MountOptions, PlaybackController, PlaybackEvent, PlaybackState, app_uri, watch_url};
use crate::player::{self, NowPlaying};
use crate::store::{DEFAULT_PLAYLIST, HistoryEntry, LocalStore, PlaylistEntry, Settings, Stats, StatsEvent};
use crate::theme::{THEMES, theme_index};
use crate::youtube::{ApiClient, ApiError, VideoDetails, VideoPage, VideoSummary, category_names, usable_api_key};

// --- Types ---

pub type PageResult = Result<VideoPage, ApiError>;
pub type DetailsResult = Result<Option<VideoDetails>, ApiError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
  /// Typing in the search box.
  Input,
  /// Navigating the current page.
  Browse,
  /// Typing a replacement API key on the settings page.
  ApiKey,
  /// Typing the name of a new playlist.
  PlaylistName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
  Home,
  Player,
  Playlist,
  History,
  Stats,
  Settings,
}

impl Page {
  pub const ALL: [Page; 6] = [Page::Home, Page::Player, Page::Playlist, Page::History, Page::Stats, Page::Settings];

  pub fn label(self) -> &'static str {
    match self {
      Page::Home => "Home",
      Page::Player => "Player",
      Page::Playlist => "Playlist",
      Page::History => "History",
      Page::Stats => "Stats",
      Page::Settings => "Settings",
    }
  }
}

/// Rows of the settings page, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingItem {
  AutoQuality,
  BackgroundPlay,
  SaveHistory,
  DefaultQuality,
  ApiKey,
  ClearCache,
}

impl SettingItem {
  pub const ALL: [SettingItem; 6] = [
    SettingItem::AutoQuality,
    SettingItem::BackgroundPlay,
    SettingItem::SaveHistory,
    SettingItem::DefaultQuality,
    SettingItem::ApiKey,
    SettingItem::ClearCache,
  ];
}

/// Where the current result list came from, for "load more".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingSource {
  Search(String),
  Category(String),
}

#[derive(Debug, Clone)]
pub struct Pagination {
  pub source: ListingSource,
  pub next_page_token: Option<String>,
  pub loading_more: bool,
}

/// The video the player page is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Watching {
  pub video_id: String,
  pub title: String,
  pub thumbnail_url: String,
  pub category: Option<String>,
}

impl Watching {
  fn from_summary(v: &VideoSummary, category: Option<String>) -> Self {
    Self { video_id: v.id.clone(), title: v.title.clone(), thumbnail_url: v.thumbnail_url.clone(), category }
  }

  fn from_playlist(e: &PlaylistEntry) -> Self {
    Self {
      video_id: e.video_id.clone(),
      title: e.title.clone(),
      thumbnail_url: e.thumbnail_url.clone(),
      category: None,
    }
  }
}

/// Playlist snapshot being played through with next/previous.
#[derive(Debug, Clone)]
pub struct PlaylistQueue {
  pub entries: Vec<PlaylistEntry>,
  pub index: usize,
}

pub fn wrap_next(index: usize, len: usize) -> usize {
  if len == 0 { 0 } else { (index + 1) % len }
}

pub fn wrap_prev(index: usize, len: usize) -> usize {
  if len == 0 { 0 } else { (index + len - 1) % len }
}

/// Move a list selection down, wrapping at the end.
pub fn list_down(state: &mut ListState, count: usize) -> Option<usize> {
  if count == 0 {
    return None;
  }
  let i = state.selected().map_or(0, |i| wrap_next(i, count));
  state.select(Some(i));
  Some(i)
}

/// Move a list selection up, wrapping at the start.
pub fn list_up(state: &mut ListState, count: usize) -> Option<usize> {
  if count == 0 {
    return None;
  }
  let i = state.selected().map_or(0, |i| wrap_prev(i, count));
  state.select(Some(i));
  Some(i)
}

/// In-flight async task receivers. Player-related results carry the session
/// id they were requested for.
#[derive(Default)]
pub(crate) struct AsyncTasks {
  pub(crate) search_rx: Option<oneshot::Receiver<PageResult>>,
  pub(crate) more_rx: Option<oneshot::Receiver<PageResult>>,
  pub(crate) details_rx: Option<(u64, oneshot::Receiver<DetailsResult>)>,
  pub(crate) related_rx: Option<(u64, oneshot::Receiver<PageResult>)>,
}

pub struct App {
  pub input: String,
  pub cursor_position: usize,
  pub input_scroll: usize,
  pub key_input: String,
  pub name_input: String,
  pub mode: AppMode,
  pub page: Page,
  pub theme_index: usize,
  pub config: Config,
  pub api: ApiClient,
  pub playback: PlaybackController,
  pub store: LocalStore,
  pub now_playing: NowPlaying,

  pub results: Vec<VideoSummary>,
  pub results_state: ListState,
  pub pagination: Option<Pagination>,
  /// Category chip currently shown, if the results are a category listing.
  pub category: Option<String>,

  pub watching: Option<Watching>,
  pub details: Option<VideoDetails>,
  pub related: Vec<VideoSummary>,
  pub related_state: ListState,
  pub queue: Option<PlaylistQueue>,

  pub settings: Settings,
  /// Playlist shown on the playlist page and targeted by "add".
  pub active_playlist: String,
  pub playlist_names: Vec<String>,
  pub playlist: Vec<PlaylistEntry>,
  pub history: Vec<HistoryEntry>,
  pub stats: Stats,
  pub storage_bytes: u64,
  pub playlist_state: ListState,
  pub history_state: ListState,
  pub settings_state: ListState,

  pub last_error: Option<String>,
  pub status_message: Option<String>,
  /// Informational message, lower priority than status/error.
  pub info_message: Option<String>,
  /// Persistent configuration problem. Not auto-dismissed.
  pub config_error: Option<String>,
  pub should_quit: bool,
  pub(crate) tasks: AsyncTasks,
  /// When the last error was set, for auto-dismiss after 5 seconds.
  error_time: Option<Instant>,
}

impl App {
  pub fn new(
    config: Config,
    api: ApiClient,
    playback: PlaybackController,
    store: LocalStore,
    now_playing: NowPlaying,
  ) -> Self {
    let theme_index = theme_index(config.theme_name.as_deref());
    let mut app = Self {
      input: String::new(),
      cursor_position: 0,
      input_scroll: 0,
      key_input: String::new(),
      name_input: String::new(),
      mode: AppMode::Browse,
      page: Page::Home,
      theme_index,
      config,
      api,
      playback,
      store,
      now_playing,
      results: Vec::new(),
      results_state: ListState::default(),
      pagination: None,
      category: None,
      watching: None,
      details: None,
      related: Vec::new(),
      related_state: ListState::default(),
      queue: None,
      settings: Settings::default(),
      active_playlist: DEFAULT_PLAYLIST.to_string(),
      playlist_names: Vec::new(),
      playlist: Vec::new(),
      history: Vec::new(),
      stats: Stats::default(),
      storage_bytes: 0,
      playlist_state: ListState::default(),
      history_state: ListState::default(),
      settings_state: ListState::default(),
      last_error: None,
      status_message: None,
      info_message: None,
      config_error: None,
      should_quit: false,
      tasks: AsyncTasks::default(),
      error_time: None,
    };
    app.settings_state.select(Some(0));
    app.refresh_library();
    app
  }

  /// Load initial content. A missing credential opens Settings with a
  /// persistent banner instead of fetching.
  pub fn boot(&mut self) {
    if self.api.config().has_credential() {
      self.trigger_category("trending");
    } else {
      self.set_config_error(ApiError::MissingCredential.to_string());
      self.page = Page::Settings;
    }
  }

  pub fn theme(&self) -> &'static crate::theme::Theme {
    // Safety: theme_index comes from theme_index() or modular arithmetic in next_theme().
    &THEMES[self.theme_index]
  }

  pub fn next_theme(&mut self) {
    self.theme_index = (self.theme_index + 1) % THEMES.len();
    self.config.theme_name = Some(self.theme().name.to_string());
    self.config.save();
  }

  // --- Messages ---

  /// Set an error message with auto-dismiss tracking.
  pub fn set_error(&mut self, msg: String) {
    self.last_error = Some(msg);
    self.error_time = Some(Instant::now());
  }

  /// Clear the current error message and its expiry timer.
  pub fn clear_error(&mut self) {
    self.last_error = None;
    self.error_time = None;
  }

  /// Clear stale error messages after 5 seconds.
  pub fn expire_error(&mut self) {
    if let Some(t) = self.error_time
      && t.elapsed() >= Duration::from_secs(5)
    {
      self.last_error = None;
      self.error_time = None;
    }
  }

  pub fn set_config_error(&mut self, msg: String) {
    warn!(msg = %msg, "configuration error");
    self.config_error = Some(msg);
  }

  /// Route an API failure: configuration problems get the persistent banner,
  /// everything else a dismissible message.
  fn report_api_error(&mut self, action: &str, e: ApiError) {
    warn!(action, err = %e, "api request failed");
    if e.is_configuration() {
      self.set_config_error(e.to_string());
    } else {
      self.set_error(format!("{} failed: {}", action, e));
    }
  }

  // --- Navigation ---

  pub fn show_page(&mut self, page: Page) {
    if self.page == Page::Player && page != Page::Player {
      self.leave_player();
    }
    if page == Page::Player && self.watching.is_none() {
      self.info_message = Some("Nothing is playing.".to_string());
      return;
    }
    self.page = page;
    self.mode = AppMode::Browse;
    self.refresh_library();
  }

  /// Leaving the player keeps playback going only with background play on.
  fn leave_player(&mut self) {
    if self.playback.state() == PlaybackState::Idle {
      return;
    }
    if self.settings.background_play_enabled {
      debug!("playback: continuing in background");
    } else {
      self.close_player();
    }
  }

  /// Re-read the persisted documents shown on library pages.
  pub fn refresh_library(&mut self) {
    self.settings = self.store.settings();
    self.playlist_names = self.store.playlist_names();
    if !self.playlist_names.contains(&self.active_playlist) {
      self.active_playlist = DEFAULT_PLAYLIST.to_string();
    }
    self.playlist = self.store.playlist(&self.active_playlist);
    self.history = self.store.history();
    self.stats = self.store.stats();
    self.storage_bytes = self.store.usage_bytes();
    clamp_selection(&mut self.playlist_state, self.playlist.len());
    clamp_selection(&mut self.history_state, self.history.len());
  }

  // --- Search & listings ---

  pub fn trigger_search(&mut self) {
    let query = self.input.trim().to_string();
    if query.is_empty() {
      self.set_error("Enter a search term.".to_string());
      return;
    }
    info!(query = %query, "search triggered");
    self.category = None;
    self.start_listing(ListingSource::Search(query.clone()), format!("Searching '{}'…", query));
  }

  pub fn trigger_category(&mut self, name: &str) {
    info!(category = name, "category triggered");
    self.category = Some(name.to_string());
    self.start_listing(ListingSource::Category(name.to_string()), format!("Loading {}…", name));
  }

  /// Cycle to the next category chip and load it.
  pub fn next_category(&mut self) {
    let names = category_names();
    let idx = self
      .category
      .as_deref()
      .and_then(|c| names.iter().position(|n| *n == c))
      .map_or(0, |i| wrap_next(i, names.len()));
    if let Some(name) = names.get(idx) {
      self.trigger_category(name);
    }
  }

  fn start_listing(&mut self, source: ListingSource, status: String) {
    if !self.api.config().has_credential() {
      self.set_config_error(ApiError::MissingCredential.to_string());
      return;
    }
    self.tasks.search_rx = None;
    self.tasks.more_rx = None;
    self.clear_error();
    self.info_message = None;
    self.status_message = Some(status);
    self.pagination = Some(Pagination { source: source.clone(), next_page_token: None, loading_more: false });

    let api = self.api.clone();
    let max = api.config().max_results;
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let result = match &source {
        ListingSource::Search(q) => api.search(q, max, None).await,
        ListingSource::Category(c) => api.search_by_category(c, max, None).await,
      };
      let _ = tx.send(result);
    });
    self.tasks.search_rx = Some(rx);
  }

  /// Trigger a background fetch of the next page of the current listing.
  pub fn trigger_load_more(&mut self) {
    let Some(pagination) = &mut self.pagination else { return };
    let Some(token) = pagination.next_page_token.clone() else { return };
    if pagination.loading_more {
      return;
    }
    pagination.loading_more = true;
    let source = pagination.source.clone();
    debug!(?source, "load more");

    let api = self.api.clone();
    let max = api.config().max_results;
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let result = match &source {
        ListingSource::Search(q) => api.search(q, max, Some(&token)).await,
        ListingSource::Category(c) => api.search_by_category(c, max, Some(&token)).await,
      };
      let _ = tx.send(result);
    });
    self.tasks.more_rx = Some(rx);
  }

  /// Called after the results selection moves.
  pub fn on_results_moved(&mut self, selected: usize) {
    if selected >= self.results.len().saturating_sub(5) {
      self.trigger_load_more();
    }
  }

  fn apply_first_page(&mut self, page: VideoPage) {
    // A listing only comes back with a working credential.
    self.config_error = None;
    if page.items.is_empty() {
      self.set_error("No results found.".to_string());
    }
    if let Some(p) = &mut self.pagination {
      p.next_page_token = page.next_page_token;
    }
    self.results = page.items;
    self.results_state.select(if self.results.is_empty() { None } else { Some(0) });
    if self.page == Page::Home {
      self.mode = AppMode::Browse;
    }
  }

  fn apply_more(&mut self, page: VideoPage) {
    if let Some(p) = &mut self.pagination {
      p.loading_more = false;
      p.next_page_token = page.next_page_token;
    }
    let known: std::collections::HashSet<String> = self.results.iter().map(|v| v.id.clone()).collect();
    self.results.extend(page.items.into_iter().filter(|v| !known.contains(&v.id)));
  }

  // --- Async results ---

  pub fn check_pending(&mut self) {
    if let Some(mut rx) = self.tasks.search_rx.take() {
      match rx.try_recv() {
        Ok(result) => {
          self.status_message = None;
          match result {
            Ok(page) => self.apply_first_page(page),
            Err(e) => self.report_api_error("Search", e),
          }
        }
        Err(oneshot::error::TryRecvError::Empty) => {
          self.tasks.search_rx = Some(rx);
        }
        Err(oneshot::error::TryRecvError::Closed) => {
          self.status_message = None;
          self.set_error("Search task failed.".to_string());
        }
      }
    }

    if let Some(mut rx) = self.tasks.more_rx.take() {
      match rx.try_recv() {
        Ok(Ok(page)) => self.apply_more(page),
        Ok(Err(e)) => {
          if let Some(p) = &mut self.pagination {
            p.loading_more = false;
          }
          self.report_api_error("Loading more", e);
        }
        Err(oneshot::error::TryRecvError::Empty) => {
          self.tasks.more_rx = Some(rx);
        }
        Err(oneshot::error::TryRecvError::Closed) => {
          if let Some(p) = &mut self.pagination {
            p.loading_more = false;
          }
        }
      }
    }

    let current_session = self.playback.session().map(|s| s.id);

    if let Some((session, mut rx)) = self.tasks.details_rx.take() {
      match rx.try_recv() {
        Ok(_) if Some(session) != current_session => debug!(session, "details for closed session dropped"),
        Ok(Ok(details)) => self.details = details,
        Ok(Err(e)) => warn!(err = %e, "details fetch failed"),
        Err(oneshot::error::TryRecvError::Empty) => self.tasks.details_rx = Some((session, rx)),
        Err(oneshot::error::TryRecvError::Closed) => {}
      }
    }

    if let Some((session, mut rx)) = self.tasks.related_rx.take() {
      match rx.try_recv() {
        Ok(_) if Some(session) != current_session => debug!(session, "related videos for closed session dropped"),
        Ok(Ok(page)) => {
          self.related = page.items;
          self.related_state.select(None);
        }
        Ok(Err(e)) => warn!(err = %e, "related videos fetch failed"),
        Err(oneshot::error::TryRecvError::Empty) => self.tasks.related_rx = Some((session, rx)),
        Err(oneshot::error::TryRecvError::Closed) => {}
      }
    }

    let events = self.playback.poll();
    self.apply_playback_events(events);
  }

  // --- Playback ---

  pub fn play_selected_result(&mut self) {
    let Some(video) = self.results_state.selected().and_then(|i| self.results.get(i)) else { return };
    let watching = Watching::from_summary(video, self.category.clone().filter(|c| c != "trending"));
    self.queue = None;
    self.play(watching);
  }

  pub fn play_selected_related(&mut self) {
    let Some(video) = self.related_state.selected().and_then(|i| self.related.get(i)) else { return };
    let watching = Watching::from_summary(video, None);
    self.queue = None;
    self.play(watching);
  }

  pub fn play_selected_history(&mut self) {
    let Some(entry) = self.history_state.selected().and_then(|i| self.history.get(i)) else { return };
    let watching = Watching {
      video_id: entry.video_id.clone(),
      title: entry.title.clone(),
      thumbnail_url: String::new(),
      category: None,
    };
    self.queue = None;
    self.play(watching);
  }

  /// Play the playlist from `index`, keeping it as the next/previous queue.
  pub fn play_playlist(&mut self, index: usize) {
    let entries = self.store.playlist(&self.active_playlist);
    let Some(entry) = entries.get(index) else {
      self.info_message = Some("Playlist is empty.".to_string());
      return;
    };
    let watching = Watching::from_playlist(entry);
    info!(playlist = %self.active_playlist, index, len = entries.len(), "playlist: playing");
    self.queue = Some(PlaylistQueue { entries, index });
    self.play(watching);
  }

  pub fn play_all(&mut self) {
    self.play_playlist(0);
  }

  pub fn play_next(&mut self) {
    self.step_queue(true);
  }

  pub fn play_previous(&mut self) {
    self.step_queue(false);
  }

  fn step_queue(&mut self, forward: bool) {
    let Some(queue) = &mut self.queue else {
      self.info_message = Some("Not playing from the playlist.".to_string());
      return;
    };
    let len = queue.entries.len();
    queue.index = if forward { wrap_next(queue.index, len) } else { wrap_prev(queue.index, len) };
    let Some(entry) = queue.entries.get(queue.index) else { return };
    let watching = Watching::from_playlist(entry);
    self.play(watching);
  }

  fn play(&mut self, watching: Watching) {
    let opts = MountOptions { max_height: self.store.settings().quality_cap() };
    info!(video_id = %watching.video_id, title = %watching.title, "play requested");
    self.details = None;
    self.related.clear();
    self.related_state.select(None);
    self.tasks.details_rx = None;
    self.tasks.related_rx = None;
    self.info_message = None;
    let video_id = watching.video_id.clone();
    self.watching = Some(watching);
    self.page = Page::Player;
    self.mode = AppMode::Browse;
    let events = self.playback.play(&video_id, opts);
    self.apply_playback_events(events);
  }

  /// Stop playback and discard the session and anything still in flight for it.
  pub fn close_player(&mut self) {
    self.playback.close();
    self.tasks.details_rx = None;
    self.tasks.related_rx = None;
    self.details = None;
    self.related.clear();
    self.watching = None;
    self.queue = None;
    self.status_message = None;
    self.info_message = None;
    if self.page == Page::Player {
      self.page = Page::Home;
    }
  }

  pub async fn toggle_pause(&mut self) {
    if let Err(e) = self.playback.toggle_pause().await {
      self.set_error(format!("Pause error: {}", e));
    }
  }

  pub fn retry_embed(&mut self) {
    if self.watching.is_none() {
      return;
    }
    self.info_message = None;
    let events = self.playback.retry();
    self.apply_playback_events(events);
  }

  fn apply_playback_events(&mut self, events: Vec<PlaybackEvent>) {
    for event in events {
      match event {
        PlaybackEvent::Attempting { strategy } => {
          self.status_message = Some(format!("Loading player ({})…", strategy));
        }
        PlaybackEvent::Started { session, video_id } => {
          self.status_message = None;
          self.on_playback_started(session, &video_id);
        }
        PlaybackEvent::Exhausted { video_id } => {
          self.status_message = None;
          info!(video_id = %video_id, "embedding unavailable, offering link-out");
          self.info_message =
            Some("Embedding is disabled for this video. Open it externally or copy the link.".to_string());
        }
      }
    }
  }

  /// Side effects of the first entry into `Playing`: metadata requests and history.
  fn on_playback_started(&mut self, session: u64, video_id: &str) {
    let api = self.api.clone();
    let id = video_id.to_string();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(api.video_details(&id).await);
    });
    self.tasks.details_rx = Some((session, rx));

    let api = self.api.clone();
    let id = video_id.to_string();
    let max = constants().related_max_results;
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(api.related_videos(&id, max).await);
    });
    self.tasks.related_rx = Some((session, rx));

    let Some(watching) = self.watching.clone() else { return };
    let now = Utc::now();
    self.store.add_to_history(HistoryEntry {
      video_id: watching.video_id.clone(),
      title: watching.title.clone(),
      watched_at: now.timestamp_millis(),
    });
    self.store.update_stats(StatsEvent::VideoWatched {
      category: watching.category.clone(),
      day: Local::now().date_naive(),
      estimated_secs: constants().watch_time_estimate_secs,
    });
    self.refresh_library();
  }

  // --- Link-out ---

  pub fn open_watch_page(&mut self) {
    let Some(w) = &self.watching else { return };
    let url = watch_url(&w.video_id);
    match player::open_external(&url) {
      Ok(()) => self.info_message = Some("Opened in browser.".to_string()),
      Err(e) => self.set_error(format!("Failed to open browser: {:#}", e)),
    }
  }

  pub fn open_in_app(&mut self) {
    let Some(w) = &self.watching else { return };
    let uri = app_uri(&w.video_id);
    match player::open_external(&uri) {
      Ok(()) => self.info_message = Some("Opened in the YouTube app.".to_string()),
      Err(e) => self.set_error(format!("Failed to open app: {:#}", e)),
    }
  }

  pub fn copy_link(&mut self) {
    let Some(w) = &self.watching else { return };
    let url = watch_url(&w.video_id);
    match player::copy_to_clipboard(&url) {
      Ok(()) => self.info_message = Some(format!("Copied {}", url)),
      Err(e) => self.set_error(format!("Copy failed: {:#}", e)),
    }
  }

  // --- Playlist & history ---

  fn add_to_playlist(&mut self, watching: Watching) {
    let entry = PlaylistEntry {
      video_id: watching.video_id,
      title: watching.title,
      thumbnail_url: watching.thumbnail_url,
      added_at: Utc::now().timestamp_millis(),
    };
    let name = self.active_playlist.clone();
    self.info_message = Some(if self.store.add_to_playlist(&name, entry) {
      format!("Added to {}.", name)
    } else {
      format!("Already in {}.", name)
    });
    self.refresh_library();
  }

  pub fn add_selected_result_to_playlist(&mut self) {
    let Some(video) = self.results_state.selected().and_then(|i| self.results.get(i)) else { return };
    let watching = Watching::from_summary(video, None);
    self.add_to_playlist(watching);
  }

  pub fn add_current_to_playlist(&mut self) {
    let Some(watching) = self.watching.clone() else { return };
    self.add_to_playlist(watching);
  }

  pub fn remove_selected_from_playlist(&mut self) {
    let Some(entry) = self.playlist_state.selected().and_then(|i| self.playlist.get(i)) else { return };
    let id = entry.video_id.clone();
    let name = self.active_playlist.clone();
    self.store.remove_from_playlist(&name, &id);
    self.refresh_library();
  }

  pub fn clear_playlist(&mut self) {
    let name = self.active_playlist.clone();
    self.store.clear_playlist(&name);
    self.queue = None;
    self.info_message = Some(format!("{} cleared.", name));
    self.refresh_library();
  }

  /// Show the next (or previous) playlist on the playlist page.
  pub fn cycle_playlist(&mut self, forward: bool) {
    let len = self.playlist_names.len();
    let idx = self.playlist_names.iter().position(|n| *n == self.active_playlist).unwrap_or(0);
    let idx = if forward { wrap_next(idx, len) } else { wrap_prev(idx, len) };
    if let Some(name) = self.playlist_names.get(idx) {
      self.active_playlist = name.clone();
    }
    self.playlist_state.select(None);
    self.refresh_library();
  }

  pub fn begin_create_playlist(&mut self) {
    self.name_input.clear();
    self.mode = AppMode::PlaylistName;
  }

  /// Create the playlist typed into `name_input` and switch to it.
  pub fn submit_playlist_name(&mut self) {
    let name = self.name_input.trim().to_string();
    if !self.store.create_playlist(&name) {
      self.set_error(if name.is_empty() {
        "Enter a playlist name.".to_string()
      } else {
        format!("Playlist \"{}\" already exists.", name)
      });
      return;
    }
    info!(playlist = %name, "playlist created");
    self.name_input.clear();
    self.mode = AppMode::Browse;
    self.info_message = Some(format!("Playlist \"{}\" created.", name));
    self.active_playlist = name;
    self.playlist_state.select(None);
    self.refresh_library();
  }

  /// Delete the shown playlist. The built-in one can only be cleared.
  pub fn delete_active_playlist(&mut self) {
    let name = self.active_playlist.clone();
    if !self.store.delete_playlist(&name) {
      self.info_message = Some(format!("{} can be cleared but not deleted.", name));
      return;
    }
    info!(playlist = %name, "playlist deleted");
    self.queue = None;
    self.info_message = Some(format!("Playlist \"{}\" deleted.", name));
    self.refresh_library();
  }

  pub fn clear_history(&mut self) {
    self.store.clear_history();
    self.info_message = Some("History cleared.".to_string());
    self.refresh_library();
  }

  // --- Settings ---

  pub fn activate_setting(&mut self, item: SettingItem) {
    let mut settings = self.store.settings();
    match item {
      SettingItem::AutoQuality => settings.auto_quality = !settings.auto_quality,
      SettingItem::BackgroundPlay => settings.background_play_enabled = !settings.background_play_enabled,
      SettingItem::SaveHistory => settings.save_history = !settings.save_history,
      SettingItem::DefaultQuality => settings.default_quality = settings.default_quality.next(),
      SettingItem::ApiKey => {
        self.key_input.clear();
        self.mode = AppMode::ApiKey;
        return;
      }
      SettingItem::ClearCache => {
        let dropped = self.api.cached_responses();
        self.api.clear_cache();
        info!(dropped, "cache cleared");
        self.info_message = Some(format!("Cache cleared ({} responses).", dropped));
        return;
      }
    }
    if !self.store.save_settings(&settings) {
      self.set_error("Could not save settings.".to_string());
    }
    self.refresh_library();
  }

  /// Persist a new API key, rebuild the client with it and load content.
  pub fn submit_api_key(&mut self) {
    let Some(key) = usable_api_key(Some(&self.key_input)) else {
      self.set_error("Enter a valid API key.".to_string());
      return;
    };
    if !self.store.save_api_key(&key) {
      self.set_error("Could not save API key; using it for this session only.".to_string());
    }
    self.key_input.clear();
    self.mode = AppMode::Browse;
    self.api = ApiClient::new(self.config.api_config(Some(key)));
    self.config_error = None;
    self.info_message = Some("API key saved.".to_string());
    info!("api key updated");
    self.page = Page::Home;
    self.trigger_category("trending");
  }

  /// True when the player keeps running off the player page.
  pub fn is_background_playing(&self) -> bool {
    self.page != Page::Player && self.playback.state() != PlaybackState::Idle
  }
}

fn clamp_selection(state: &mut ListState, len: usize) {
  match state.selected() {
    _ if len == 0 => state.select(None),
    None => state.select(Some(0)),
    Some(i) if i >= len => state.select(Some(len - 1)),
    Some(_) => {}
  }
}
