//! Embed fallback state machine.
//!
//! A video owner can disable embedding, and the player only reports that
//! indirectly. The controller mounts one embed strategy at a time and treats
//! three independent signals as "this strategy failed": an explicit error
//! message from the host, a rendered height below the usable threshold after
//! the grace period, and a hard load failure. None of them is authoritative;
//! each one only moves the session to the next strategy. When the ladder is
//! exhausted the user is offered link-out alternatives.
//!
//! Every signal carries the session id and strategy index it was produced
//! for. Signals from a closed session or a superseded strategy are dropped,
//! so a late timer can never fail a newer attempt.

use anyhow::Result;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::constants::constants;

/// One concrete embed configuration: domain plus parameter set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedStrategy {
  pub name: String,
  pub base_url: String,
  pub params: Vec<(String, String)>,
}

impl EmbedStrategy {
  pub fn embed_url(&self, video_id: &str) -> String {
    let mut url = format!("{}/{}", self.base_url.trim_end_matches('/'), video_id);
    for (i, (k, v)) in self.params.iter().enumerate() {
      url.push(if i == 0 { '?' } else { '&' });
      url.push_str(k);
      url.push('=');
      url.push_str(v);
    }
    url
  }
}

/// Immutable fallback policy, resolved once at boot.
#[derive(Debug, Clone)]
pub struct PlaybackPolicy {
  pub strategies: Vec<EmbedStrategy>,
  pub grace_period: Duration,
  pub min_usable_height: u32,
}

impl Default for PlaybackPolicy {
  fn default() -> Self {
    let c = constants();
    Self {
      strategies: c.embed_strategies.clone(),
      grace_period: Duration::from_millis(c.embed_grace_period_ms),
      min_usable_height: c.min_usable_embed_height,
    }
  }
}

/// Per-play options handed to the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountOptions {
  /// Stream height cap in pixels; `None` lets the host choose.
  pub max_height: Option<u32>,
}

/// Signals an embed host can report about the strategy it is rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
  /// Explicit error message or code from the player.
  Error(String),
  /// The embed could not be loaded at all.
  LoadFailed(String),
  /// The player reported playback progress.
  Playing,
  /// Rendered height after the grace period, `None` if nothing is rendered.
  Measured(Option<u32>),
}

#[derive(Debug)]
struct Tagged {
  session: u64,
  strategy: usize,
  signal: Signal,
}

/// Sending half given to a host for one mounted strategy.
#[derive(Debug, Clone)]
pub struct SignalSink {
  session: u64,
  strategy: usize,
  tx: mpsc::UnboundedSender<Tagged>,
}

impl SignalSink {
  pub fn send(&self, signal: Signal) {
    // The receiver only disappears with the controller.
    let _ = self.tx.send(Tagged { session: self.session, strategy: self.strategy, signal });
  }

  /// A sink whose signals go nowhere.
  #[cfg(test)]
  pub(crate) fn detached() -> Self {
    let (tx, _rx) = mpsc::unbounded_channel();
    Self { session: 0, strategy: 0, tx }
  }
}

/// The rendering side of playback: an opaque player that can be mounted
/// with an embed URL, measured and released.
pub trait EmbedHost: Send {
  /// Start rendering `url`. An `Err` counts as a hard load failure.
  fn mount(&mut self, url: &str, opts: &MountOptions, sink: SignalSink) -> Result<()>;

  /// Measure the rendered height. The returned future is lazy and is only
  /// polled once the grace period has elapsed.
  fn probe(&mut self) -> BoxFuture<'static, Option<u32>>;

  /// Tear down whatever is mounted. Must be idempotent.
  fn release(&mut self);

  fn toggle_pause(&mut self) -> BoxFuture<'static, Result<()>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
  Playing,
  BlockedLinkOut,
}

/// Transient state of one play request. Discarded on close or a new play.
#[derive(Debug, Clone)]
pub struct PlaybackSession {
  pub id: u64,
  pub video_id: String,
  pub attempted: Vec<String>,
  pub current: usize,
  pub terminal: Option<Terminal>,
  opts: MountOptions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackState {
  Idle,
  Attempting { video_id: String, strategy: String, index: usize },
  Playing { video_id: String, strategy: String },
  ExhaustedFallback { video_id: String },
}

/// Transitions the application reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
  Attempting { strategy: String },
  /// Entered `Playing` for the first time in session `session`.
  Started { session: u64, video_id: String },
  Exhausted { video_id: String },
}

pub struct PlaybackController {
  host: Box<dyn EmbedHost>,
  policy: PlaybackPolicy,
  session: Option<PlaybackSession>,
  next_session: u64,
  tx: mpsc::UnboundedSender<Tagged>,
  rx: mpsc::UnboundedReceiver<Tagged>,
  grace_timer: Option<JoinHandle<()>>,
}

impl PlaybackController {
  pub fn new(host: Box<dyn EmbedHost>, policy: PlaybackPolicy) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    Self { host, policy, session: None, next_session: 1, tx, rx, grace_timer: None }
  }

  pub fn state(&self) -> PlaybackState {
    let Some(s) = &self.session else { return PlaybackState::Idle };
    let strategy = self.policy.strategies.get(s.current).map(|st| st.name.clone()).unwrap_or_default();
    match s.terminal {
      None => PlaybackState::Attempting { video_id: s.video_id.clone(), strategy, index: s.current },
      Some(Terminal::Playing) => PlaybackState::Playing { video_id: s.video_id.clone(), strategy },
      Some(Terminal::BlockedLinkOut) => PlaybackState::ExhaustedFallback { video_id: s.video_id.clone() },
    }
  }

  pub fn session(&self) -> Option<&PlaybackSession> {
    self.session.as_ref()
  }

  pub fn is_playing(&self) -> bool {
    matches!(self.session.as_ref().and_then(|s| s.terminal), Some(Terminal::Playing))
  }

  /// Start a new session for `video_id`, discarding any previous one.
  pub fn play(&mut self, video_id: &str, opts: MountOptions) -> Vec<PlaybackEvent> {
    self.close();
    let id = self.next_session;
    self.next_session += 1;
    info!(session = id, video_id, "playback: new session");
    self.session = Some(PlaybackSession {
      id,
      video_id: video_id.to_string(),
      attempted: Vec::new(),
      current: 0,
      terminal: None,
      opts,
    });
    let mut events = Vec::new();
    self.attempt(0, &mut events);
    events
  }

  /// Run the whole ladder again for the current video. This is the only way
  /// out of `ExhaustedFallback` other than `close` or a new `play`.
  pub fn retry(&mut self) -> Vec<PlaybackEvent> {
    let Some(s) = &self.session else { return Vec::new() };
    let (video_id, opts) = (s.video_id.clone(), s.opts.clone());
    info!(video_id = %video_id, "playback: explicit retry");
    self.play(&video_id, opts)
  }

  /// Valid from any state. Releases the host and cancels the grace timer.
  pub fn close(&mut self) {
    self.cancel_timer();
    if let Some(s) = self.session.take() {
      info!(session = s.id, video_id = %s.video_id, "playback: closed");
      self.host.release();
    }
  }

  pub async fn toggle_pause(&mut self) -> Result<()> {
    if !self.is_playing() {
      return Ok(());
    }
    self.host.toggle_pause().await
  }

  /// Apply every pending host signal. Call once per event-loop tick.
  pub fn poll(&mut self) -> Vec<PlaybackEvent> {
    let mut events = Vec::new();
    while let Ok(tagged) = self.rx.try_recv() {
      self.handle(tagged, &mut events);
    }
    events
  }

  fn handle(&mut self, tagged: Tagged, events: &mut Vec<PlaybackEvent>) {
    let Some(s) = &self.session else {
      debug!(session = tagged.session, "playback: signal with no session, dropped");
      return;
    };
    if tagged.session != s.id || tagged.strategy != s.current || s.terminal.is_some() {
      debug!(
        session = tagged.session,
        strategy = tagged.strategy,
        signal = ?tagged.signal,
        "playback: stale signal dropped"
      );
      return;
    }
    let min = self.policy.min_usable_height;
    let failure = match &tagged.signal {
      Signal::Playing => None,
      Signal::Measured(Some(h)) if *h >= min => None,
      Signal::Measured(Some(h)) => Some(format!("rendered height {}px below {}px", h, min)),
      Signal::Measured(None) => Some("nothing rendered after grace period".to_string()),
      Signal::Error(msg) => Some(format!("player error: {}", msg)),
      Signal::LoadFailed(msg) => Some(format!("load failed: {}", msg)),
    };
    match failure {
      None => self.enter_playing(events),
      Some(reason) => {
        let next = s.current + 1;
        warn!(session = s.id, strategy = s.current, reason = %reason, "playback: strategy failed");
        self.attempt(next, events);
      }
    }
  }

  fn enter_playing(&mut self, events: &mut Vec<PlaybackEvent>) {
    self.cancel_timer();
    let Some(s) = &mut self.session else { return };
    s.terminal = Some(Terminal::Playing);
    info!(session = s.id, video_id = %s.video_id, strategy = s.current, "playback: playing");
    events.push(PlaybackEvent::Started { session: s.id, video_id: s.video_id.clone() });
  }

  /// Mount strategy `index`, skipping forward past strategies that fail to load.
  fn attempt(&mut self, mut index: usize, events: &mut Vec<PlaybackEvent>) {
    self.cancel_timer();
    loop {
      let Some(s) = &mut self.session else { return };
      self.host.release();
      let Some(strategy) = self.policy.strategies.get(index) else {
        s.terminal = Some(Terminal::BlockedLinkOut);
        info!(session = s.id, video_id = %s.video_id, tried = ?s.attempted, "playback: fallback exhausted");
        events.push(PlaybackEvent::Exhausted { video_id: s.video_id.clone() });
        return;
      };
      s.current = index;
      s.attempted.push(strategy.name.clone());
      let url = strategy.embed_url(&s.video_id);
      info!(session = s.id, strategy = %strategy.name, url = %url, "playback: attempting");
      events.push(PlaybackEvent::Attempting { strategy: strategy.name.clone() });

      let sink = SignalSink { session: s.id, strategy: index, tx: self.tx.clone() };
      match self.host.mount(&url, &s.opts, sink.clone()) {
        Ok(()) => {
          self.arm_timer(sink);
          return;
        }
        Err(e) => {
          warn!(session = s.id, strategy = %strategy.name, err = %e, "playback: mount failed");
          index += 1;
        }
      }
    }
  }

  fn arm_timer(&mut self, sink: SignalSink) {
    let grace = self.policy.grace_period;
    let probe = self.host.probe();
    self.grace_timer = Some(tokio::spawn(async move {
      tokio::time::sleep(grace).await;
      let height = probe.await;
      sink.send(Signal::Measured(height));
    }));
  }

  fn cancel_timer(&mut self) {
    if let Some(handle) = self.grace_timer.take() {
      handle.abort();
    }
  }
}

impl Drop for PlaybackController {
  fn drop(&mut self) {
    self.close();
  }
}

/// Canonical watch page for a video.
pub fn watch_url(video_id: &str) -> String {
  format!("https://www.youtube.com/watch?v={}", video_id)
}

/// Deep link into the native app.
pub fn app_uri(video_id: &str) -> String {
  format!("vnd.youtube://{}", video_id)
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::VecDeque;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::{Arc, Mutex};

  /// How the fake host behaves for one mount.
  #[derive(Debug, Clone)]
  enum Behavior {
    /// Renders at the given height; never reports progress.
    Renders(u32),
    /// Reports progress right away.
    Plays,
    /// Reports an explicit error right away.
    Errors(&'static str),
    /// Refuses to mount.
    MountFails,
  }

  #[derive(Default)]
  struct Shared {
    mounted: Mutex<Vec<String>>,
    probes_run: AtomicUsize,
    releases: AtomicUsize,
    pauses: AtomicUsize,
  }

  struct FakeHost {
    script: VecDeque<Behavior>,
    current: Option<Behavior>,
    sink: Option<SignalSink>,
    shared: Arc<Shared>,
  }

  impl FakeHost {
    fn new(script: Vec<Behavior>) -> (Self, Arc<Shared>) {
      let shared = Arc::new(Shared::default());
      (Self { script: script.into(), current: None, sink: None, shared: shared.clone() }, shared)
    }
  }

  impl EmbedHost for FakeHost {
    fn mount(&mut self, url: &str, _opts: &MountOptions, sink: SignalSink) -> Result<()> {
      self.shared.mounted.lock().unwrap().push(url.to_string());
      let behavior = self.script.pop_front().unwrap_or(Behavior::Renders(0));
      match &behavior {
        Behavior::MountFails => anyhow::bail!("spawn failed"),
        Behavior::Plays => sink.send(Signal::Playing),
        Behavior::Errors(code) => sink.send(Signal::Error(code.to_string())),
        Behavior::Renders(_) => {}
      }
      self.current = Some(behavior);
      self.sink = Some(sink);
      Ok(())
    }

    fn probe(&mut self) -> BoxFuture<'static, Option<u32>> {
      let height = match self.current {
        Some(Behavior::Renders(h)) => Some(h),
        _ => None,
      };
      let shared = self.shared.clone();
      Box::pin(async move {
        shared.probes_run.fetch_add(1, Ordering::SeqCst);
        height
      })
    }

    fn release(&mut self) {
      self.current = None;
      self.sink = None;
      self.shared.releases.fetch_add(1, Ordering::SeqCst);
    }

    fn toggle_pause(&mut self) -> BoxFuture<'static, Result<()>> {
      self.shared.pauses.fetch_add(1, Ordering::SeqCst);
      Box::pin(async { Ok(()) })
    }
  }

  fn strategy(name: &str) -> EmbedStrategy {
    EmbedStrategy {
      name: name.to_string(),
      base_url: format!("https://{}.example/embed", name),
      params: vec![("autoplay".into(), "1".into())],
    }
  }

  fn policy() -> PlaybackPolicy {
    PlaybackPolicy {
      strategies: vec![strategy("a"), strategy("b"), strategy("c")],
      grace_period: Duration::from_millis(3000),
      min_usable_height: 50,
    }
  }

  fn controller(script: Vec<Behavior>) -> (PlaybackController, Arc<Shared>) {
    let (host, shared) = FakeHost::new(script);
    (PlaybackController::new(Box::new(host), policy()), shared)
  }

  async fn past_grace() {
    tokio::time::sleep(Duration::from_millis(3001)).await;
  }

  #[test]
  fn embed_url_appends_params_in_order() {
    let s = EmbedStrategy {
      name: "x".into(),
      base_url: "https://www.youtube.com/embed/".into(),
      params: vec![("autoplay".into(), "1".into()), ("rel".into(), "0".into())],
    };
    assert_eq!(s.embed_url("abc"), "https://www.youtube.com/embed/abc?autoplay=1&rel=0");
    let bare = EmbedStrategy { params: vec![], ..s };
    assert_eq!(bare.embed_url("abc"), "https://www.youtube.com/embed/abc");
  }

  #[test]
  fn link_out_urls() {
    assert_eq!(watch_url("abc"), "https://www.youtube.com/watch?v=abc");
    assert_eq!(app_uri("abc"), "vnd.youtube://abc");
  }

  #[test]
  fn default_policy_comes_from_constants() {
    let p = PlaybackPolicy::default();
    assert!(!p.strategies.is_empty());
    assert_eq!(p.grace_period, Duration::from_millis(3000));
  }

  #[tokio::test(start_paused = true)]
  async fn starts_idle_and_attempts_first_strategy() {
    let (mut c, shared) = controller(vec![Behavior::Renders(360)]);
    assert_eq!(c.state(), PlaybackState::Idle);
    let events = c.play("vid", MountOptions::default());
    assert_eq!(events, vec![PlaybackEvent::Attempting { strategy: "a".into() }]);
    assert!(matches!(c.state(), PlaybackState::Attempting { index: 0, .. }));
    assert_eq!(shared.mounted.lock().unwrap()[0], "https://a.example/embed/vid?autoplay=1");
  }

  #[tokio::test(start_paused = true)]
  async fn usable_height_after_grace_means_playing() {
    let (mut c, _) = controller(vec![Behavior::Renders(360)]);
    c.play("vid", MountOptions::default());
    past_grace().await;
    let events = c.poll();
    assert_eq!(events, vec![PlaybackEvent::Started { session: 1, video_id: "vid".into() }]);
    assert_eq!(c.state(), PlaybackState::Playing { video_id: "vid".into(), strategy: "a".into() });
  }

  #[tokio::test(start_paused = true)]
  async fn progress_signal_means_playing_before_grace() {
    let (mut c, shared) = controller(vec![Behavior::Plays]);
    c.play("vid", MountOptions::default());
    let events = c.poll();
    assert!(matches!(events.as_slice(), [PlaybackEvent::Started { .. }]));
    // The grace timer is cancelled on success.
    past_grace().await;
    assert!(c.poll().is_empty());
    assert_eq!(shared.probes_run.load(Ordering::SeqCst), 0);
  }

  #[tokio::test(start_paused = true)]
  async fn collapsed_height_moves_to_next_strategy() {
    let (mut c, shared) = controller(vec![Behavior::Renders(0), Behavior::Renders(360)]);
    c.play("vid", MountOptions::default());
    past_grace().await;
    let events = c.poll();
    assert_eq!(events, vec![PlaybackEvent::Attempting { strategy: "b".into() }]);
    past_grace().await;
    assert!(matches!(c.poll().as_slice(), [PlaybackEvent::Started { .. }]));
    assert_eq!(shared.mounted.lock().unwrap().len(), 2);
    assert_eq!(c.session().unwrap().attempted, vec!["a".to_string(), "b".to_string()]);
  }

  #[tokio::test(start_paused = true)]
  async fn explicit_error_moves_to_next_strategy() {
    let (mut c, _) = controller(vec![Behavior::Errors("150"), Behavior::Plays]);
    c.play("vid", MountOptions::default());
    let events = c.poll();
    assert_eq!(events[0], PlaybackEvent::Attempting { strategy: "b".into() });
    assert!(matches!(events[1], PlaybackEvent::Started { .. }));
  }

  #[tokio::test(start_paused = true)]
  async fn mount_failure_skips_straight_ahead() {
    let (mut c, _) = controller(vec![Behavior::MountFails, Behavior::Renders(360)]);
    let events = c.play("vid", MountOptions::default());
    assert_eq!(
      events,
      vec![PlaybackEvent::Attempting { strategy: "a".into() }, PlaybackEvent::Attempting { strategy: "b".into() }]
    );
    assert!(matches!(c.state(), PlaybackState::Attempting { index: 1, .. }));
  }

  #[tokio::test(start_paused = true)]
  async fn all_strategies_failing_ends_exhausted_without_further_attempts() {
    let (mut c, shared) = controller(vec![Behavior::Renders(0), Behavior::Errors("101"), Behavior::MountFails]);
    c.play("vid", MountOptions::default());
    past_grace().await;
    let events = c.poll();
    assert_eq!(events.last(), Some(&PlaybackEvent::Exhausted { video_id: "vid".into() }));
    assert_eq!(c.state(), PlaybackState::ExhaustedFallback { video_id: "vid".into() });

    // Nothing moves on its own from here.
    let mounts = shared.mounted.lock().unwrap().len();
    past_grace().await;
    past_grace().await;
    assert!(c.poll().is_empty());
    assert_eq!(shared.mounted.lock().unwrap().len(), mounts);
    assert_eq!(c.state(), PlaybackState::ExhaustedFallback { video_id: "vid".into() });
  }

  #[tokio::test(start_paused = true)]
  async fn each_strategy_tried_at_most_once_per_session() {
    let (mut c, shared) = controller(vec![Behavior::Renders(0), Behavior::Renders(0), Behavior::Renders(0)]);
    c.play("vid", MountOptions::default());
    for _ in 0..5 {
      past_grace().await;
      c.poll();
    }
    assert_eq!(shared.mounted.lock().unwrap().len(), 3);
    assert_eq!(c.session().unwrap().attempted, vec!["a".to_string(), "b".to_string(), "c".to_string()]);
  }

  #[tokio::test(start_paused = true)]
  async fn retry_from_exhausted_starts_a_new_session() {
    let script = vec![Behavior::MountFails, Behavior::MountFails, Behavior::MountFails, Behavior::Plays];
    let (mut c, _) = controller(script);
    c.play("vid", MountOptions::default());
    assert!(matches!(c.state(), PlaybackState::ExhaustedFallback { .. }));
    let first = c.session().unwrap().id;
    c.retry();
    assert_ne!(c.session().unwrap().id, first);
    assert!(matches!(c.poll().as_slice(), [PlaybackEvent::Started { .. }]));
  }

  #[tokio::test(start_paused = true)]
  async fn close_before_success_cancels_timer() {
    let (mut c, shared) = controller(vec![Behavior::Renders(0)]);
    c.play("vid", MountOptions::default());
    c.close();
    assert_eq!(c.state(), PlaybackState::Idle);
    past_grace().await;
    past_grace().await;
    assert!(c.poll().is_empty());
    assert_eq!(c.state(), PlaybackState::Idle);
    assert_eq!(shared.probes_run.load(Ordering::SeqCst), 0);
    assert!(shared.releases.load(Ordering::SeqCst) >= 1);
  }

  #[tokio::test(start_paused = true)]
  async fn signals_from_previous_session_are_ignored() {
    let (mut c, _) = controller(vec![Behavior::Renders(0), Behavior::Renders(360)]);
    c.play("first", MountOptions::default());
    // Grab a sink for the first session as a slow host would hold it.
    let stale = SignalSink { session: 1, strategy: 0, tx: c.tx.clone() };
    c.play("second", MountOptions::default());
    stale.send(Signal::Error("late".into()));
    stale.send(Signal::Playing);
    assert!(c.poll().is_empty());
    assert_eq!(c.session().unwrap().video_id, "second");
    assert!(matches!(c.state(), PlaybackState::Attempting { index: 0, .. }));
  }

  #[tokio::test(start_paused = true)]
  async fn signals_after_playing_do_not_transition() {
    let (mut c, _) = controller(vec![Behavior::Plays]);
    c.play("vid", MountOptions::default());
    c.poll();
    let sink = SignalSink { session: 1, strategy: 0, tx: c.tx.clone() };
    sink.send(Signal::Error("after".into()));
    sink.send(Signal::Measured(Some(0)));
    assert!(c.poll().is_empty());
    assert!(c.is_playing());
  }

  #[tokio::test(start_paused = true)]
  async fn pause_only_forwarded_while_playing() {
    let (mut c, shared) = controller(vec![Behavior::Renders(0), Behavior::Plays]);
    c.play("vid", MountOptions::default());
    c.toggle_pause().await.unwrap();
    assert_eq!(shared.pauses.load(Ordering::SeqCst), 0);
    c.retry();
    c.poll();
    c.toggle_pause().await.unwrap();
    assert_eq!(shared.pauses.load(Ordering::SeqCst), 1);
  }
}
