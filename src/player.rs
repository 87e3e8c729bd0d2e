use anyhow::{Context, Result, anyhow};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use futures::future::BoxFuture;
use std::io::Write;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::{
  io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader as TokioBufReader},
  process::{Child as TokioChild, Command},
  task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::playback::{EmbedHost, MountOptions, Signal, SignalSink};

/// How often the size probe re-asks mpv while the stream is still loading.
const PROBE_INTERVAL: Duration = Duration::from_millis(250);
/// How long the size probe waits for a stream that is still resolving.
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

static SOCKET_SEQ: AtomicU64 = AtomicU64::new(0);

/// Last status line printed by the player and its pause state, shared with the UI.
#[derive(Debug, Clone, Default)]
pub struct NowPlaying {
  line: Arc<Mutex<Option<String>>>,
  paused: Arc<AtomicBool>,
}

impl NowPlaying {
  pub fn get(&self) -> Option<String> {
    self.line.lock().unwrap_or_else(PoisonError::into_inner).clone()
  }

  pub fn is_paused(&self) -> bool {
    self.paused.load(Ordering::Relaxed)
  }

  fn set(&self, status: Option<String>) {
    *self.line.lock().unwrap_or_else(PoisonError::into_inner) = status;
  }

  fn reset(&self) {
    self.set(None);
    self.paused.store(false, Ordering::Relaxed);
  }
}

/// What a line of mpv terminal output tells us.
#[derive(Debug, PartialEq, Eq)]
enum LineKind {
  /// Status line with a playback position past zero.
  Progress(String),
  /// Status line before playback starts.
  Status(String),
  /// Error reported by mpv or its ytdl hook.
  Error(String),
  Other,
}

fn classify_line(line: &str) -> LineKind {
  let line = line.trim();
  if let Some(rest) = line.strip_prefix("Time: ") {
    let pos = rest.split(" / ").next().unwrap_or("");
    let started = pos.chars().any(|c| c.is_ascii_digit() && c != '0');
    return if started { LineKind::Progress(line.to_string()) } else { LineKind::Status(line.to_string()) };
  }
  if let Some(idx) = line.find("ERROR:") {
    return LineKind::Error(line[idx + "ERROR:".len()..].trim().to_string());
  }
  LineKind::Other
}

/// Forward one output stream of mpv as playback signals.
fn spawn_monitor<R>(stream: R, sink: SignalSink, now_playing: NowPlaying, reports_exit: bool) -> JoinHandle<()>
where
  R: AsyncRead + Unpin + Send + 'static,
{
  tokio::spawn(async move {
    let mut lines = TokioBufReader::new(stream).lines();
    let mut signalled_playing = false;
    while let Ok(Some(line)) = lines.next_line().await {
      match classify_line(&line) {
        LineKind::Progress(status) => {
          now_playing.set(Some(status));
          if !signalled_playing {
            signalled_playing = true;
            sink.send(Signal::Playing);
          }
        }
        LineKind::Status(status) => now_playing.set(Some(status)),
        LineKind::Error(msg) => {
          debug!(msg = %msg, "mpv: error line");
          sink.send(Signal::Error(msg));
        }
        LineKind::Other => {}
      }
    }
    if reports_exit {
      now_playing.reset();
      // A process that exits before playing never loaded; after playing this is stale and dropped.
      sink.send(Signal::LoadFailed("player exited".to_string()));
    }
  })
}

/// Runs embed URLs in an external mpv window (yt-dlp resolves them).
pub struct MpvHost {
  current_process: Option<TokioChild>,
  monitor_handles: Vec<JoinHandle<()>>,
  ipc_socket_path: Option<String>,
  now_playing: NowPlaying,
}

impl MpvHost {
  pub fn new() -> Self {
    Self {
      current_process: None,
      monitor_handles: Vec::new(),
      ipc_socket_path: None,
      now_playing: NowPlaying::default(),
    }
  }

  pub fn now_playing(&self) -> NowPlaying {
    self.now_playing.clone()
  }
}

fn ytdl_format(max_height: u32) -> String {
  format!("bestvideo[height<=?{h}]+bestaudio/best[height<=?{h}]/best", h = max_height)
}

/// Send one JSON IPC command and return the response carrying `request_id`.
async fn ipc_request(socket_path: &str, command: serde_json::Value) -> Result<serde_json::Value> {
  let mut stream =
    tokio::net::UnixStream::connect(socket_path).await.context("Failed to connect to mpv IPC socket")?;
  let mut payload = serde_json::to_vec(&serde_json::json!({ "command": command, "request_id": 1 }))?;
  payload.push(b'\n');
  stream.write_all(&payload).await.context("Failed to write to mpv IPC socket")?;

  let mut lines = TokioBufReader::new(stream).lines();
  // mpv may emit event lines before our response.
  for _ in 0..20 {
    let line = tokio::time::timeout(Duration::from_secs(3), lines.next_line())
      .await
      .context("Timeout waiting for mpv IPC response")?
      .context("Failed to read from mpv IPC socket")?;
    let Some(line) = line else { break };
    if let Ok(val) = serde_json::from_str::<serde_json::Value>(&line)
      && val.get("request_id").and_then(|v| v.as_i64()) == Some(1)
    {
      return Ok(val);
    }
  }
  Err(anyhow!("mpv IPC closed without a response"))
}

async fn probe_height(socket_path: String) -> Option<u32> {
  let deadline = tokio::time::Instant::now() + PROBE_TIMEOUT;
  loop {
    let resp = match ipc_request(&socket_path, serde_json::json!(["get_property", "height"])).await {
      Ok(resp) => resp,
      Err(e) => {
        debug!(err = %e, "mpv: size probe failed");
        return None;
      }
    };
    if resp.get("error").and_then(|v| v.as_str()) == Some("success") {
      return resp.get("data").and_then(|v| v.as_u64()).map(|h| h as u32);
    }
    // Property unavailable: the stream is still resolving.
    if tokio::time::Instant::now() >= deadline {
      return None;
    }
    tokio::time::sleep(PROBE_INTERVAL).await;
  }
}

impl EmbedHost for MpvHost {
  fn mount(&mut self, url: &str, opts: &MountOptions, sink: SignalSink) -> Result<()> {
    self.release();

    let seq = SOCKET_SEQ.fetch_add(1, Ordering::Relaxed);
    let socket_path = std::env::temp_dir().join(format!("fasttube-mpv-{}-{}.sock", std::process::id(), seq));
    let socket_path_str = socket_path.to_str().context("Temp dir path is not valid UTF-8")?.to_string();
    // Remove stale socket if it exists from a previous crash.
    let _ = std::fs::remove_file(&socket_path);

    let mut cmd = Command::new("mpv");
    cmd.args([
      "--force-window=immediate",
      "--keep-open=no",
      "--term-status-msg=Time: ${time-pos/full} / ${duration/full} | ${media-title} | ${pause}",
      &format!("--input-ipc-server={}", socket_path_str),
    ]);
    if let Some(h) = opts.max_height {
      cmd.arg(format!("--ytdl-format={}", ytdl_format(h)));
    }
    cmd.arg(url);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    cmd.kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|e| {
      if e.kind() == std::io::ErrorKind::NotFound {
        anyhow!("mpv not found. Install it with: brew install mpv (macOS) or apt install mpv (Linux)")
      } else {
        anyhow!(e).context("Failed to spawn mpv process")
      }
    })?;

    let stdout = child.stdout.take().context("Failed to get mpv stdout")?;
    let stderr = child.stderr.take().context("Failed to get mpv stderr")?;
    // Both pipes are drained so mpv never blocks on a full buffer.
    self.monitor_handles.push(spawn_monitor(stdout, sink.clone(), self.now_playing.clone(), true));
    self.monitor_handles.push(spawn_monitor(stderr, sink, self.now_playing.clone(), false));

    info!(url, socket = %socket_path_str, max_height = ?opts.max_height, "mpv: spawned");
    self.current_process = Some(child);
    self.ipc_socket_path = Some(socket_path_str);
    Ok(())
  }

  fn probe(&mut self) -> BoxFuture<'static, Option<u32>> {
    let socket_path = self.ipc_socket_path.clone();
    Box::pin(async move {
      let socket_path = socket_path?;
      probe_height(socket_path).await
    })
  }

  fn release(&mut self) {
    for handle in self.monitor_handles.drain(..) {
      handle.abort();
    }
    if let Some(mut child) = self.current_process.take() {
      if let Err(e) = child.start_kill() {
        warn!(err = %e, "mpv: failed to kill process");
      }
      // The runtime reaps the child once it is dropped.
    }
    if let Some(path) = self.ipc_socket_path.take() {
      let _ = std::fs::remove_file(&path);
    }
    self.now_playing.reset();
  }

  fn toggle_pause(&mut self) -> BoxFuture<'static, Result<()>> {
    let socket_path = self.ipc_socket_path.clone();
    let now_playing = self.now_playing.clone();
    Box::pin(async move {
      let Some(socket_path) = socket_path else { return Ok(()) };
      let resp = ipc_request(&socket_path, serde_json::json!(["cycle", "pause"])).await?;
      if resp.get("error").and_then(|v| v.as_str()) != Some("success") {
        return Err(anyhow!("mpv rejected pause command: {}", resp));
      }
      now_playing.paused.fetch_xor(true, Ordering::Relaxed);
      Ok(())
    })
  }
}

impl Default for MpvHost {
  fn default() -> Self {
    Self::new()
  }
}

impl Drop for MpvHost {
  fn drop(&mut self) {
    self.release();
  }
}

// --- Link-out ---

/// Open a URL or app URI with the platform's default handler.
pub fn open_external(target: &str) -> Result<()> {
  #[cfg(target_os = "macos")]
  let cmd = "open";
  #[cfg(not(target_os = "macos"))]
  let cmd = "xdg-open";
  let mut child = std::process::Command::new(cmd)
    .arg(target)
    .stdin(Stdio::null())
    .stdout(Stdio::null())
    .stderr(Stdio::null())
    .spawn()
    .with_context(|| format!("Failed to run {}", cmd))?;
  // Reap the child in a background thread to avoid zombie processes.
  std::thread::spawn(move || {
    let _ = child.wait();
  });
  Ok(())
}

/// OSC 52 escape sequence that asks the terminal to put `text` on the clipboard.
pub fn osc52_sequence(text: &str) -> String {
  format!("\x1b]52;c;{}\x07", STANDARD.encode(text))
}

pub fn copy_to_clipboard(text: &str) -> Result<()> {
  let mut out = std::io::stdout();
  out.write_all(osc52_sequence(text).as_bytes()).context("Failed to write clipboard sequence")?;
  out.flush().context("Failed to flush stdout")?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn status_line_before_playback() {
    assert_eq!(
      classify_line("Time: 00:00:00 / 00:03:20 | Song | no"),
      LineKind::Status("Time: 00:00:00 / 00:03:20 | Song | no".into())
    );
  }

  #[test]
  fn status_line_with_progress() {
    assert!(matches!(classify_line("Time: 00:00:02 / 00:03:20 | Song | no"), LineKind::Progress(_)));
  }

  #[test]
  fn unavailable_position_is_not_progress() {
    assert!(matches!(classify_line("Time: (unavailable) / (unavailable) | x | no"), LineKind::Status(_)));
  }

  #[test]
  fn ytdl_error_line() {
    assert_eq!(
      classify_line("[ytdl_hook] ERROR: [youtube] abc: Video unavailable"),
      LineKind::Error("[youtube] abc: Video unavailable".into())
    );
  }

  #[test]
  fn unrelated_output_ignored() {
    assert_eq!(classify_line(" (+) Video --vid=1 (h264 1280x720 30fps)"), LineKind::Other);
  }

  #[test]
  fn format_caps_height() {
    assert_eq!(ytdl_format(480), "bestvideo[height<=?480]+bestaudio/best[height<=?480]/best");
  }

  #[test]
  fn osc52_encodes_payload() {
    assert_eq!(osc52_sequence("hi"), "\x1b]52;c;aGk=\x07");
  }

  #[tokio::test]
  async fn status_clears_when_player_exits() {
    let now_playing = NowPlaying::default();
    let output: &[u8] = b"Time: 00:00:05 / 00:03:20 | Song | no\n";
    spawn_monitor(output, SignalSink::detached(), now_playing.clone(), false).await.unwrap();
    assert!(now_playing.get().is_some());

    spawn_monitor(output, SignalSink::detached(), now_playing.clone(), true).await.unwrap();
    assert_eq!(now_playing.get(), None);
    assert!(!now_playing.is_paused());
  }

  #[tokio::test]
  async fn probe_without_mount_reports_nothing() {
    let mut host = MpvHost::new();
    assert_eq!(host.probe().await, None);
    host.release();
    assert!(host.now_playing().get().is_none());
  }
}
