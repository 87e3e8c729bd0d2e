use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// A raw API response body and the moment it was stored.
#[derive(Debug, Clone)]
struct CacheEntry {
  payload: String,
  stored_at: Instant,
}

/// Time-windowed cache of API responses keyed by the fully resolved request URL.
///
/// Stale entries are never evicted on read; they are reported as a miss and
/// overwritten by the next `put` for the same fingerprint. There is no
/// capacity bound, growth is limited only by the set of queries a user issues
/// in one session.
#[derive(Debug)]
pub struct ResponseCache {
  entries: HashMap<String, CacheEntry>,
  freshness: Duration,
}

impl ResponseCache {
  pub fn new(freshness: Duration) -> Self {
    Self { entries: HashMap::new(), freshness }
  }

  /// Returns the cached payload if it was stored less than the freshness window ago.
  pub fn get(&self, fingerprint: &str) -> Option<String> {
    let entry = self.entries.get(fingerprint)?;
    if entry.stored_at.elapsed() < self.freshness { Some(entry.payload.clone()) } else { None }
  }

  pub fn put(&mut self, fingerprint: impl Into<String>, payload: impl Into<String>) {
    self.entries.insert(fingerprint.into(), CacheEntry { payload: payload.into(), stored_at: Instant::now() });
  }

  pub fn clear(&mut self) {
    self.entries.clear();
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const HOUR: Duration = Duration::from_secs(3600);

  #[tokio::test(start_paused = true)]
  async fn hit_within_window() {
    let mut cache = ResponseCache::new(HOUR);
    cache.put("https://api/search?q=a", "{\"items\":[]}");
    tokio::time::advance(Duration::from_secs(3599)).await;
    assert_eq!(cache.get("https://api/search?q=a").as_deref(), Some("{\"items\":[]}"));
  }

  #[tokio::test(start_paused = true)]
  async fn miss_after_window_elapsed() {
    let mut cache = ResponseCache::new(HOUR);
    cache.put("https://api/search?q=a", "payload");
    tokio::time::advance(HOUR).await;
    assert_eq!(cache.get("https://api/search?q=a"), None);
    // The stale entry stays in place until overwritten.
    assert_eq!(cache.len(), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn put_refreshes_stale_entry() {
    let mut cache = ResponseCache::new(HOUR);
    cache.put("k", "old");
    tokio::time::advance(HOUR * 2).await;
    cache.put("k", "new");
    assert_eq!(cache.get("k").as_deref(), Some("new"));
    assert_eq!(cache.len(), 1);
  }

  #[test]
  fn unknown_fingerprint_is_a_miss() {
    let cache = ResponseCache::new(HOUR);
    assert_eq!(cache.get("https://api/videos?id=x"), None);
  }

  #[test]
  fn distinct_parameters_do_not_collide() {
    let mut cache = ResponseCache::new(HOUR);
    cache.put("https://api/search?q=cats&maxResults=10", "ten");
    cache.put("https://api/search?q=cats&maxResults=20", "twenty");
    assert_eq!(cache.get("https://api/search?q=cats&maxResults=10").as_deref(), Some("ten"));
    assert_eq!(cache.get("https://api/search?q=cats&maxResults=20").as_deref(), Some("twenty"));
  }

  #[test]
  fn clear_removes_everything() {
    let mut cache = ResponseCache::new(HOUR);
    cache.put("a", "1");
    cache.put("b", "2");
    cache.clear();
    assert_eq!(cache.len(), 0);
    assert_eq!(cache.get("a"), None);
  }
}
