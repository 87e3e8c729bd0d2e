use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use serde::Deserialize;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::cache::ResponseCache;
use crate::constants::constants;

/// Errors surfaced by the YouTube Data API client.
///
/// Every variant is shown to the user as a per-action failure; the client
/// never retries on its own.
#[derive(Error, Debug)]
pub enum ApiError {
  /// No usable API key was configured.
  #[error("YouTube API key is missing. Add one in Settings.")]
  MissingCredential,

  #[error("API error: {code} {reason}")]
  Status { code: u16, reason: String },

  #[error("Network error: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("Malformed API response: {0}")]
  Decode(#[from] serde_json::Error),

  #[error("Invalid request URL: {0}")]
  InvalidUrl(String),
}

impl ApiError {
  /// Only a missing credential needs the user to fix settings. HTTP failures,
  /// quota and rate-limit responses included, are transient.
  pub fn is_configuration(&self) -> bool {
    matches!(self, ApiError::MissingCredential)
  }
}

/// Immutable client configuration resolved once at startup.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub api_key: Option<String>,
  pub region: String,
  pub max_results: u32,
  pub freshness: Duration,
}

impl ApiConfig {
  pub fn has_credential(&self) -> bool {
    self.api_key.is_some()
  }
}

/// Returns the key unless it is empty or the shipped placeholder.
pub fn usable_api_key(key: Option<&str>) -> Option<String> {
  key.map(str::trim).filter(|k| !k.is_empty() && *k != constants().api_key_placeholder).map(str::to_string)
}

// --- Data model ---

/// A single video as listed by search, trending or related queries.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoSummary {
  pub id: String,
  pub title: String,
  pub channel: String,
  pub thumbnail_url: String,
  /// ISO-8601 period, e.g. `PT4M13S`. Only present on `videos` listings.
  pub duration: Option<String>,
  pub view_count: Option<String>,
}

/// One page of listing results plus the continuation token for the next one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoPage {
  pub items: Vec<VideoSummary>,
  pub next_page_token: Option<String>,
}

/// Full metadata for an opened video.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoDetails {
  pub summary: VideoSummary,
  pub description: String,
  pub published_at: Option<DateTime<Utc>>,
  pub like_count: Option<String>,
}

// --- Wire format ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
  #[serde(default)]
  items: Vec<ApiItem>,
  next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiItem {
  id: ItemId,
  #[serde(default)]
  snippet: Snippet,
  content_details: Option<ContentDetails>,
  statistics: Option<Statistics>,
}

/// `videos` listings carry a bare id; `search` listings wrap it in a resource id.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ItemId {
  Plain(String),
  Resource {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
  },
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Snippet {
  title: String,
  channel_title: String,
  description: String,
  published_at: Option<String>,
  thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Thumbnails {
  medium: Option<Thumbnail>,
  high: Option<Thumbnail>,
  #[serde(rename = "default")]
  fallback: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
  url: String,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
  duration: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
  view_count: Option<String>,
  like_count: Option<String>,
}

impl ApiItem {
  fn video_id(&self) -> Option<&str> {
    let id = match &self.id {
      ItemId::Plain(id) => Some(id.as_str()),
      ItemId::Resource { video_id } => video_id.as_deref(),
    };
    id.filter(|id| !id.is_empty())
  }

  fn into_summary(self) -> Option<VideoSummary> {
    let id = self.video_id()?.to_string();
    let thumbs = &self.snippet.thumbnails;
    let thumbnail_url = thumbs
      .medium
      .as_ref()
      .or(thumbs.high.as_ref())
      .or(thumbs.fallback.as_ref())
      .map(|t| t.url.clone())
      .unwrap_or_else(|| format!("https://i.ytimg.com/vi/{}/mqdefault.jpg", id));
    let title = if self.snippet.title.is_empty() { "Untitled Video".to_string() } else { self.snippet.title };
    let channel =
      if self.snippet.channel_title.is_empty() { "Unknown Channel".to_string() } else { self.snippet.channel_title };
    Some(VideoSummary {
      id,
      title,
      channel,
      thumbnail_url,
      duration: self.content_details.and_then(|c| c.duration),
      view_count: self.statistics.and_then(|s| s.view_count),
    })
  }
}

impl From<ListResponse> for VideoPage {
  fn from(resp: ListResponse) -> Self {
    let total = resp.items.len();
    let items: Vec<VideoSummary> = resp.items.into_iter().filter_map(ApiItem::into_summary).collect();
    if items.len() < total {
      debug!(skipped = total - items.len(), "youtube: dropped listing items without a video id");
    }
    VideoPage { items, next_page_token: resp.next_page_token.filter(|t| !t.is_empty()) }
  }
}

// --- Category filters ---

/// What a category filter resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
  Trending,
  Search(String),
}

/// Map a category name to its listing. Unknown names are searched for literally.
pub fn resolve_category(category: &str) -> Listing {
  if category.eq_ignore_ascii_case("trending") {
    return Listing::Trending;
  }
  let query = constants()
    .categories
    .iter()
    .find(|(name, _)| name.eq_ignore_ascii_case(category))
    .map_or(category, |(_, query)| query.as_str());
  Listing::Search(query.to_string())
}

/// Category names offered as quick filters, trending first.
pub fn category_names() -> Vec<&'static str> {
  std::iter::once("trending").chain(constants().categories.iter().map(|(name, _)| name.as_str())).collect()
}

// --- Client ---

/// YouTube Data API v3 client with a shared time-windowed response cache.
///
/// Cheap to clone: clones share the HTTP connection pool and the cache, so a
/// request spawned onto a background task populates the same cache the UI reads.
#[derive(Clone)]
pub struct ApiClient {
  http: Client,
  config: Arc<ApiConfig>,
  cache: Arc<Mutex<ResponseCache>>,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Self {
    let http = Client::builder().timeout(Duration::from_secs(15)).build().unwrap_or_else(|e| {
      warn!(err = %e, "youtube: falling back to default HTTP client");
      Client::new()
    });
    let cache = ResponseCache::new(config.freshness);
    Self { http, config: Arc::new(config), cache: Arc::new(Mutex::new(cache)) }
  }

  pub fn config(&self) -> &ApiConfig {
    &self.config
  }

  /// Keyword search. Embeddability is not filtered here; restricted videos are
  /// handled by the playback fallback ladder.
  pub async fn search(&self, query: &str, max_results: u32, page_token: Option<&str>) -> Result<VideoPage, ApiError> {
    let url = self.search_url(query, max_results, page_token)?;
    Ok(self.fetch_list(url).await?.into())
  }

  /// The platform's "most popular" chart for the configured region.
  pub async fn trending(&self, max_results: u32, page_token: Option<&str>) -> Result<VideoPage, ApiError> {
    let url = self.trending_url(max_results, page_token)?;
    Ok(self.fetch_list(url).await?.into())
  }

  /// Full metadata for one video, or `None` if the id is unknown to the platform.
  pub async fn video_details(&self, video_id: &str) -> Result<Option<VideoDetails>, ApiError> {
    let url = self.details_url(video_id)?;
    let resp = self.fetch_list(url).await?;
    Ok(resp.items.into_iter().next().and_then(|item| {
      let description = item.snippet.description.clone();
      let published_at = item
        .snippet
        .published_at
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&Utc));
      let like_count = item.statistics.as_ref().and_then(|s| s.like_count.clone());
      item.into_summary().map(|summary| VideoDetails {
        summary,
        description: if description.is_empty() { "No description available.".to_string() } else { description },
        published_at,
        like_count,
      })
    }))
  }

  pub async fn related_videos(&self, video_id: &str, max_results: u32) -> Result<VideoPage, ApiError> {
    let url = self.related_url(video_id, max_results)?;
    Ok(self.fetch_list(url).await?.into())
  }

  /// Resolve a category filter and fetch it. `trending` goes to the chart,
  /// everything else is a keyword search.
  pub async fn search_by_category(
    &self,
    category: &str,
    max_results: u32,
    page_token: Option<&str>,
  ) -> Result<VideoPage, ApiError> {
    match resolve_category(category) {
      Listing::Trending => self.trending(max_results, page_token).await,
      Listing::Search(query) => self.search(&query, max_results, page_token).await,
    }
  }

  pub fn clear_cache(&self) {
    self.cache.lock().unwrap_or_else(PoisonError::into_inner).clear();
  }

  pub fn cached_responses(&self) -> usize {
    self.cache.lock().unwrap_or_else(PoisonError::into_inner).len()
  }

  // --- Request building ---

  fn build_url(&self, endpoint: &str, params: &[(&str, Option<String>)]) -> Result<Url, ApiError> {
    let key = self.config.api_key.as_deref().ok_or(ApiError::MissingCredential)?;
    let mut url = Url::parse(&format!("{}/{}", self.config.base_url.trim_end_matches('/'), endpoint))
      .map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
    {
      let mut query = url.query_pairs_mut();
      for (name, value) in params {
        if let Some(value) = value {
          query.append_pair(name, value);
        }
      }
      query.append_pair("key", key);
    }
    Ok(url)
  }

  fn search_url(&self, query: &str, max_results: u32, page_token: Option<&str>) -> Result<Url, ApiError> {
    self.build_url(
      "search",
      &[
        ("part", Some("snippet".to_string())),
        ("q", Some(query.to_string())),
        ("type", Some("video".to_string())),
        ("maxResults", Some(max_results.to_string())),
        ("pageToken", page_token.map(str::to_string)),
        ("regionCode", Some(self.config.region.clone())),
      ],
    )
  }

  fn trending_url(&self, max_results: u32, page_token: Option<&str>) -> Result<Url, ApiError> {
    self.build_url(
      "videos",
      &[
        ("part", Some("snippet,contentDetails,statistics".to_string())),
        ("chart", Some("mostPopular".to_string())),
        ("maxResults", Some(max_results.to_string())),
        ("pageToken", page_token.map(str::to_string)),
        ("regionCode", Some(self.config.region.clone())),
      ],
    )
  }

  fn details_url(&self, video_id: &str) -> Result<Url, ApiError> {
    self.build_url(
      "videos",
      &[("part", Some("snippet,contentDetails,statistics".to_string())), ("id", Some(video_id.to_string()))],
    )
  }

  fn related_url(&self, video_id: &str, max_results: u32) -> Result<Url, ApiError> {
    self.build_url(
      "search",
      &[
        ("part", Some("snippet".to_string())),
        ("relatedToVideoId", Some(video_id.to_string())),
        ("type", Some("video".to_string())),
        ("maxResults", Some(max_results.to_string())),
      ],
    )
  }

  // --- Transport ---

  /// Serve from cache when fresh, otherwise fetch, decode and cache the raw body.
  ///
  /// Concurrent identical requests are not coalesced; both may reach the network.
  async fn fetch_list(&self, url: Url) -> Result<ListResponse, ApiError> {
    let fingerprint = url.to_string();
    let cached = self.cache.lock().unwrap_or_else(PoisonError::into_inner).get(&fingerprint);
    if let Some(body) = cached {
      debug!(endpoint = url.path(), "youtube: cache hit");
      return Ok(serde_json::from_str(&body)?);
    }

    debug!(endpoint = url.path(), "youtube: fetching");
    let response = self.http.get(url.clone()).send().await.inspect_err(|e| {
      warn!(endpoint = url.path(), err = %e, "youtube: request failed");
    })?;
    let status = response.status();
    if !status.is_success() {
      warn!(endpoint = url.path(), status = status.as_u16(), "youtube: non-success response");
      return Err(ApiError::Status {
        code: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
      });
    }
    let body = response.text().await?;
    let parsed: ListResponse = serde_json::from_str(&body)?;
    self.cache.lock().unwrap_or_else(PoisonError::into_inner).put(fingerprint, body);
    Ok(parsed)
  }
}

// --- Formatting helpers ---

/// Format an ISO-8601 period (`PT1H2M10S`) as `1:02:10`, or `M:SS` without hours.
/// Anything unparseable renders as `0:00`.
pub fn format_duration(period: &str) -> String {
  let Some((hours, minutes, seconds)) = parse_period(period) else {
    return "0:00".to_string();
  };
  if hours > 0 { format!("{}:{:02}:{:02}", hours, minutes, seconds) } else { format!("{}:{:02}", minutes, seconds) }
}

/// Returns (hours, minutes, seconds); a day component folds into hours.
fn parse_period(period: &str) -> Option<(u64, u64, u64)> {
  let rest = period.trim().strip_prefix('P')?;
  let (date_part, time_part) = match rest.split_once('T') {
    Some((date, time)) => (date, time),
    None => (rest, ""),
  };

  let mut days = 0;
  if !date_part.is_empty() {
    days = date_part.strip_suffix('D')?.parse::<u64>().ok()?;
  }

  let (mut hours, mut minutes, mut seconds) = (0, 0, 0);
  let mut digits = String::new();
  for c in time_part.chars() {
    if c.is_ascii_digit() {
      digits.push(c);
      continue;
    }
    let value = digits.parse::<u64>().ok()?;
    digits.clear();
    match c {
      'H' => hours = value,
      'M' => minutes = value,
      'S' => seconds = value,
      _ => return None,
    }
  }
  if !digits.is_empty() {
    return None;
  }
  Some((days.checked_mul(24)?.checked_add(hours)?, minutes, seconds))
}

/// Abbreviate a view count: `950`, `1.5K`, `2.3M`.
pub fn format_view_count(count: u64) -> String {
  if count >= 1_000_000 {
    format!("{:.1}M", count as f64 / 1_000_000.0)
  } else if count >= 1_000 {
    format!("{:.1}K", count as f64 / 1_000.0)
  } else {
    count.to_string()
  }
}

/// Human-friendly relative time, e.g. `3 days ago`.
pub fn format_time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
  let seconds = (now - then).num_seconds().max(0);
  let units: [(i64, &str); 5] =
    [(31_536_000, "year"), (2_592_000, "month"), (86_400, "day"), (3_600, "hour"), (60, "minute")];
  for (size, name) in units {
    let n = seconds / size;
    if n >= 1 {
      return if n == 1 { format!("1 {} ago", name) } else { format!("{} {}s ago", n, name) };
    }
  }
  "Just now".to_string()
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  fn test_config(key: Option<&str>) -> ApiConfig {
    ApiConfig {
      base_url: "https://www.googleapis.com/youtube/v3".to_string(),
      api_key: key.map(str::to_string),
      region: "US".to_string(),
      max_results: 20,
      freshness: Duration::from_secs(3600),
    }
  }

  fn client() -> ApiClient {
    ApiClient::new(test_config(Some("test-key")))
  }

  // --- format_duration ---

  #[test]
  fn duration_with_hours() {
    assert_eq!(format_duration("PT1H2M10S"), "1:02:10");
    assert_eq!(format_duration("PT2H5S"), "2:00:05");
  }

  #[test]
  fn duration_without_hours() {
    assert_eq!(format_duration("PT45S"), "0:45");
    assert_eq!(format_duration("PT4M13S"), "4:13");
    assert_eq!(format_duration("PT12M"), "12:00");
  }

  #[test]
  fn duration_zero_and_garbage() {
    assert_eq!(format_duration("PT0S"), "0:00");
    assert_eq!(format_duration(""), "0:00");
    assert_eq!(format_duration("banana"), "0:00");
    assert_eq!(format_duration("PT5X"), "0:00");
  }

  #[test]
  fn duration_days_fold_into_hours() {
    assert_eq!(format_duration("P1DT1H"), "25:00:00");
  }

  #[test]
  fn huge_day_count_renders_as_zero() {
    assert_eq!(format_duration("P999999999999999999DT1H"), "0:00");
  }

  // --- format_view_count ---

  #[test]
  fn view_count_thresholds() {
    assert_eq!(format_view_count(950), "950");
    assert_eq!(format_view_count(999), "999");
    assert_eq!(format_view_count(1_000), "1.0K");
    assert_eq!(format_view_count(1_500), "1.5K");
    assert_eq!(format_view_count(2_300_000), "2.3M");
  }

  // --- format_time_ago ---

  #[test]
  fn time_ago_buckets() {
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    assert_eq!(format_time_ago(now, now), "Just now");
    assert_eq!(format_time_ago(now - chrono::Duration::minutes(1), now), "1 minute ago");
    assert_eq!(format_time_ago(now - chrono::Duration::hours(5), now), "5 hours ago");
    assert_eq!(format_time_ago(now - chrono::Duration::days(3), now), "3 days ago");
    assert_eq!(format_time_ago(now - chrono::Duration::days(400), now), "1 year ago");
  }

  // --- Categories ---

  #[test]
  fn trending_category_is_special_cased() {
    assert_eq!(resolve_category("trending"), Listing::Trending);
    assert_eq!(resolve_category("Trending"), Listing::Trending);
  }

  #[test]
  fn known_category_maps_to_canned_query() {
    assert_eq!(resolve_category("music"), Listing::Search("music official video".to_string()));
    assert_eq!(resolve_category("gaming"), Listing::Search("gaming gameplay".to_string()));
  }

  #[test]
  fn unknown_category_is_a_literal_query() {
    assert_eq!(resolve_category("unknown-tag"), Listing::Search("unknown-tag".to_string()));
  }

  #[test]
  fn category_names_start_with_trending() {
    let names = category_names();
    assert_eq!(names[0], "trending");
    assert!(names.contains(&"news"));
  }

  // --- Request building ---

  #[test]
  fn search_url_carries_all_parameters() {
    let url = client().search_url("lofi beats", 20, Some("CAUQAA")).unwrap();
    let pairs: Vec<(String, String)> = url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect();
    assert_eq!(url.path(), "/youtube/v3/search");
    assert!(pairs.contains(&("q".to_string(), "lofi beats".to_string())));
    assert!(pairs.contains(&("pageToken".to_string(), "CAUQAA".to_string())));
    assert!(pairs.contains(&("regionCode".to_string(), "US".to_string())));
    assert_eq!(pairs.last(), Some(&("key".to_string(), "test-key".to_string())));
    assert!(!pairs.iter().any(|(k, _)| k == "videoEmbeddable"));
  }

  #[test]
  fn absent_page_token_is_omitted() {
    let url = client().trending_url(10, None).unwrap();
    assert!(!url.query_pairs().any(|(k, _)| k == "pageToken"));
    assert!(url.query_pairs().any(|(k, v)| k == "chart" && v == "mostPopular"));
  }

  #[test]
  fn fingerprints_differ_per_parameter_set() {
    let c = client();
    let a = c.search_url("cats", 10, None).unwrap().to_string();
    let b = c.search_url("cats", 20, None).unwrap().to_string();
    let d = c.search_url("cats", 10, Some("next")).unwrap().to_string();
    assert_ne!(a, b);
    assert_ne!(a, d);
  }

  #[test]
  fn missing_key_is_a_configuration_error() {
    let c = ApiClient::new(test_config(None));
    let err = c.search_url("cats", 10, None).unwrap_err();
    assert!(matches!(err, ApiError::MissingCredential));
    assert!(err.is_configuration());
  }

  #[test]
  fn http_failures_are_transient() {
    for code in [400, 403, 429, 500] {
      let err = ApiError::Status { code, reason: "Forbidden".to_string() };
      assert!(!err.is_configuration(), "status {} should not need settings", code);
    }
  }

  #[test]
  fn placeholder_key_is_unusable() {
    assert_eq!(usable_api_key(Some("YOUR_YOUTUBE_API_KEY_HERE")), None);
    assert_eq!(usable_api_key(Some("  ")), None);
    assert_eq!(usable_api_key(None), None);
    assert_eq!(usable_api_key(Some(" abc ")), Some("abc".to_string()));
  }

  // --- Response decoding ---

  const SEARCH_BODY: &str = r#"{
    "nextPageToken": "CBQQAA",
    "items": [
      {"id": {"kind": "youtube#video", "videoId": "abc123"},
       "snippet": {"title": "First", "channelTitle": "Chan",
                   "thumbnails": {"medium": {"url": "https://i.ytimg.com/vi/abc123/mqdefault.jpg"}}}},
      {"id": {"kind": "youtube#channel", "channelId": "UCxyz"},
       "snippet": {"title": "A channel"}}
    ]
  }"#;

  const VIDEOS_BODY: &str = r#"{
    "items": [
      {"id": "xyz789",
       "snippet": {"title": "Trending one", "channelTitle": "Big", "description": "Hello",
                   "publishedAt": "2024-01-02T03:04:05Z",
                   "thumbnails": {"default": {"url": "https://i.ytimg.com/vi/xyz789/default.jpg"}}},
       "contentDetails": {"duration": "PT3M2S"},
       "statistics": {"viewCount": "1500", "likeCount": "42"}}
    ]
  }"#;

  #[test]
  fn search_listing_decodes_and_skips_non_videos() {
    let resp: ListResponse = serde_json::from_str(SEARCH_BODY).unwrap();
    let page: VideoPage = resp.into();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].id, "abc123");
    assert_eq!(page.items[0].duration, None);
    assert_eq!(page.next_page_token.as_deref(), Some("CBQQAA"));
  }

  #[test]
  fn videos_listing_decodes_details() {
    let resp: ListResponse = serde_json::from_str(VIDEOS_BODY).unwrap();
    let page: VideoPage = resp.into();
    let video = &page.items[0];
    assert_eq!(video.id, "xyz789");
    assert_eq!(video.thumbnail_url, "https://i.ytimg.com/vi/xyz789/default.jpg");
    assert_eq!(video.duration.as_deref(), Some("PT3M2S"));
    assert_eq!(video.view_count.as_deref(), Some("1500"));
    assert_eq!(page.next_page_token, None);
  }

  fn prime(client: &ApiClient, url: Url, body: &str) {
    client.cache.lock().unwrap().put(url.to_string(), body);
  }

  #[tokio::test]
  async fn trending_category_uses_chart_listing() {
    let c = client();
    prime(&c, c.trending_url(5, None).unwrap(), VIDEOS_BODY);
    prime(&c, c.search_url("trending", 5, None).unwrap(), SEARCH_BODY);
    let page = c.search_by_category("trending", 5, None).await.unwrap();
    assert_eq!(page.items[0].id, "xyz789");
  }

  #[tokio::test]
  async fn unknown_category_searches_literally() {
    let c = client();
    prime(&c, c.search_url("unknown-tag", 5, None).unwrap(), SEARCH_BODY);
    let page = c.search_by_category("unknown-tag", 5, None).await.unwrap();
    assert_eq!(page.items[0].id, "abc123");
  }

  #[tokio::test]
  async fn video_details_served_from_cache() {
    let c = client();
    prime(&c, c.details_url("xyz789").unwrap(), VIDEOS_BODY);
    let details = c.video_details("xyz789").await.unwrap().unwrap();
    assert_eq!(details.description, "Hello");
    assert_eq!(details.like_count.as_deref(), Some("42"));
    assert_eq!(details.published_at, Some(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()));
  }

  #[test]
  fn clear_cache_empties_shared_cache() {
    let c = client();
    let clone = c.clone();
    prime(&c, c.trending_url(5, None).unwrap(), VIDEOS_BODY);
    assert_eq!(clone.cached_responses(), 1);
    clone.clear_cache();
    assert_eq!(c.cached_responses(), 0);
  }
}
