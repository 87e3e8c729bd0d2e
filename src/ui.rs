use chrono::{TimeZone, Utc};
use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Layout, Rect},
  style::{Modifier, Style, Stylize},
  text::{Line, Span},
  widgets::{Block, BorderType, List, ListItem, Padding, Paragraph, Wrap},
};

use crate::app::{App, AppMode, Page, SettingItem};
use crate::playback::{PlaybackState, watch_url};
use crate::store::format_kb;
use crate::theme::Theme;
use crate::youtube::{VideoSummary, category_names, format_duration, format_time_ago, format_view_count};

// --- Helpers ---

/// Compute the display width of the first `n` chars (accounting for double-width CJK).
pub fn display_width(s: &str, n: usize) -> usize {
  use unicode_width::UnicodeWidthChar;
  s.chars().take(n).map(|c| c.width().unwrap_or(0)).sum()
}

/// Truncate a string to `max_width` characters, appending "…" if truncated.
fn truncate_str(s: &str, max_width: usize) -> String {
  if s.chars().count() <= max_width {
    s.to_string()
  } else {
    let truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
    format!("{}…", truncated)
  }
}

fn views_label(raw: Option<&str>) -> Option<String> {
  raw.and_then(|v| v.parse::<u64>().ok()).map(|n| format!("{} views", format_view_count(n)))
}

fn rounded_block<'a>(theme: &Theme, title: impl Into<Line<'a>>) -> Block<'a> {
  Block::bordered()
    .title(title)
    .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(theme.border))
}

/// One list row: title on the left, muted metadata right-aligned.
fn row<'a>(theme: &Theme, title: &str, right: &str, inner_w: usize, fg: ratatui::style::Color) -> Line<'a> {
  if right.is_empty() {
    return Line::from(Span::styled(truncate_str(title, inner_w), Style::default().fg(fg)));
  }
  let right_w = right.chars().count();
  let title = truncate_str(title, inner_w.saturating_sub(right_w + 2));
  let gap = inner_w.saturating_sub(title.chars().count() + right_w);
  Line::from(vec![
    Span::styled(title, Style::default().fg(fg)),
    Span::raw(" ".repeat(gap)),
    Span::styled(right.to_string(), Style::default().fg(theme.muted)),
  ])
}

fn striped<'a>(theme: &Theme, i: usize, selected: Option<usize>, line: Line<'a>) -> ListItem<'a> {
  let bg = if Some(i) == selected {
    theme.highlight_bg
  } else if i % 2 == 1 {
    theme.stripe_bg
  } else {
    theme.bg
  };
  ListItem::new(line).bg(bg)
}

fn row_fg(theme: &Theme, i: usize, selected: Option<usize>) -> ratatui::style::Color {
  if Some(i) == selected { theme.highlight_fg } else { theme.fg }
}

fn video_items<'a>(
  theme: &Theme,
  videos: &[VideoSummary],
  selected: Option<usize>,
  inner_w: usize,
) -> Vec<ListItem<'a>> {
  videos
    .iter()
    .enumerate()
    .map(|(i, v)| {
      let mut meta = vec![v.channel.clone()];
      if let Some(d) = &v.duration {
        meta.push(format_duration(d));
      }
      if let Some(views) = views_label(v.view_count.as_deref()) {
        meta.push(views);
      }
      let right = truncate_str(&meta.join("  "), inner_w / 2);
      striped(theme, i, selected, row(theme, &v.title, &right, inner_w, row_fg(theme, i, selected)))
    })
    .collect()
}

fn millis_label(millis: i64) -> String {
  Utc.timestamp_millis_opt(millis).single().map(|t| format_time_ago(t, Utc::now())).unwrap_or_default()
}

// --- UI Rendering ---

pub fn ui(frame: &mut Frame, app: &mut App) {
  let theme = app.theme();

  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  let banner_h = if app.config_error.is_some() { 1 } else { 0 };
  let [header_area, banner_area, main_area, status_area, input_area, footer_area] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Length(banner_h),
    Constraint::Min(3),
    Constraint::Length(1),
    Constraint::Length(3),
    Constraint::Length(1),
  ])
  .areas(frame.area());

  render_header(frame, app, header_area);
  if let Some(msg) = &app.config_error {
    let text = format!(" ⚠  {}  (6: Settings)", msg);
    frame.render_widget(Paragraph::new(text).style(Style::default().fg(theme.bg).bg(theme.error)), banner_area);
  }
  match app.page {
    Page::Home => render_home(frame, app, main_area),
    Page::Player => render_player(frame, app, main_area),
    Page::Playlist => render_playlist(frame, app, main_area),
    Page::History => render_history(frame, app, main_area),
    Page::Stats => render_stats(frame, app, main_area),
    Page::Settings => render_settings(frame, app, main_area),
  }
  render_status(frame, app, status_area);
  render_input(frame, app, input_area);
  render_footer(frame, app, footer_area);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let mut spans = vec![Span::styled(" ▶ fasttube ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))];
  for (i, page) in Page::ALL.iter().enumerate() {
    let style = if *page == app.page {
      Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD)
    } else {
      Style::default().fg(theme.muted)
    };
    spans.push(Span::raw(" "));
    spans.push(Span::styled(format!(" {} {} ", i + 1, page.label()), style));
  }
  frame.render_widget(Line::from(spans), area);

  let version = format!("v{} ", env!("CARGO_PKG_VERSION"));
  let right = Line::from(Span::styled(&version, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(version.len() as u16), width: version.len() as u16, ..area };
  frame.render_widget(right, right_area);
}

fn render_home(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let [chips_area, list_area] = Layout::vertical([Constraint::Length(1), Constraint::Min(1)]).areas(area);

  let mut chips = vec![Span::styled(" c ", Style::default().fg(theme.key_fg).bg(theme.key_bg)), Span::raw(" ")];
  for name in category_names() {
    let active = app.category.as_deref() == Some(name);
    let style = if active {
      Style::default().fg(theme.accent).add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    } else {
      Style::default().fg(theme.muted)
    };
    chips.push(Span::styled(format!(" {} ", name), style));
  }
  frame.render_widget(Line::from(chips), chips_area);

  if app.results.is_empty() {
    let text = vec![
      Line::from(""),
      Line::from(Span::styled("▶  fasttube", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))),
      Line::from(""),
      Line::from(Span::styled("Search, browse and play YouTube from the terminal.", Style::default().fg(theme.fg))),
      Line::from(""),
      Line::from(Span::styled("Press / to search or c to browse a category.", Style::default().fg(theme.muted))),
    ];
    let paragraph = Paragraph::new(text).alignment(Alignment::Center).block(
      Block::bordered().border_type(BorderType::Rounded).border_style(Style::default().fg(theme.border)),
    );
    frame.render_widget(paragraph, list_area);
    return;
  }

  // Inner width: area minus 2 borders minus 2 chars for highlight symbol ("▶ ")
  let inner_w = list_area.width.saturating_sub(4) as usize;
  let items = video_items(theme, &app.results, app.results_state.selected(), inner_w);
  let label = match &app.category {
    Some(c) => c.clone(),
    None => "Results".to_string(),
  };
  let loading_more = app.pagination.as_ref().is_some_and(|p| p.loading_more);
  let suffix = if loading_more { " (loading more…)" } else { "" };
  let title = format!(" {} — {} videos{} ", label, app.results.len(), suffix);

  let list = List::new(items)
    .block(rounded_block(theme, title))
    .highlight_symbol("▶ ")
    .highlight_style(Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD));
  frame.render_stateful_widget(list, list_area, &mut app.results_state);
}

fn render_player(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let [info_area, related_area] =
    Layout::horizontal([Constraint::Percentage(62), Constraint::Percentage(38)]).areas(area);

  let state = app.playback.state();
  let (badge, badge_color) = match &state {
    PlaybackState::Idle => ("idle".to_string(), theme.muted),
    PlaybackState::Attempting { strategy, index, .. } => (format!("trying {} ({})", strategy, index + 1), theme.status),
    PlaybackState::Playing { strategy, .. } => {
      let label = if app.now_playing.is_paused() { "paused" } else { "playing" };
      (format!("{} via {}", label, strategy), theme.accent)
    }
    PlaybackState::ExhaustedFallback { .. } => ("embedding blocked".to_string(), theme.error),
  };
  let info_title = Line::from(vec![
    Span::styled(" Now Playing ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)),
    Span::styled(format!("[{}] ", badge), Style::default().fg(badge_color)),
  ]);
  let info_block = rounded_block(theme, info_title).padding(Padding::horizontal(1));
  let inner_w = info_area.width.saturating_sub(4) as usize;

  let mut lines = Vec::new();
  if let Some(w) = &app.watching {
    let title = app.details.as_ref().map_or(w.title.as_str(), |d| d.summary.title.as_str());
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
      truncate_str(title, inner_w),
      Style::default().fg(theme.fg).add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(""));

    if let Some(d) = &app.details {
      let mut push_field = |label: &'static str, value: String| {
        lines.push(Line::from(vec![
          Span::styled(label, Style::default().fg(theme.muted)),
          Span::styled(truncate_str(&value, inner_w.saturating_sub(label.len())), Style::default().fg(theme.fg)),
        ]));
      };
      push_field("Channel   ", d.summary.channel.clone());
      if let Some(duration) = &d.summary.duration {
        push_field("Duration  ", format_duration(duration));
      }
      if let Some(views) = views_label(d.summary.view_count.as_deref()) {
        push_field("Views     ", views);
      }
      if let Some(likes) = d.like_count.as_deref().and_then(|l| l.parse::<u64>().ok()) {
        push_field("Likes     ", format_view_count(likes));
      }
      if let Some(published) = d.published_at {
        push_field("Published ", format_time_ago(published, Utc::now()));
      }
      lines.push(Line::from(""));
      for text_line in d.description.lines().take(8) {
        lines.push(Line::from(Span::styled(text_line.to_string(), Style::default().fg(theme.muted))));
      }
    }

    if let PlaybackState::ExhaustedFallback { video_id } = &state {
      lines.push(Line::from(""));
      lines.push(Line::from(Span::styled(
        "The owner has disabled embedded playback.",
        Style::default().fg(theme.error).add_modifier(Modifier::BOLD),
      )));
      lines.push(Line::from(Span::styled(
        truncate_str(&watch_url(video_id), inner_w),
        Style::default().fg(theme.accent).add_modifier(Modifier::UNDERLINED),
      )));
      lines.push(Line::from(Span::styled(
        "o open in browser · y open app · c copy link · r try again",
        Style::default().fg(theme.muted),
      )));
    }

    if let Some(q) = &app.queue {
      lines.push(Line::from(""));
      lines.push(Line::from(Span::styled(
        format!("Playlist {}/{}", q.index + 1, q.entries.len()),
        Style::default().fg(theme.status),
      )));
    }
  }
  frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }).block(info_block), info_area);

  let related_w = related_area.width.saturating_sub(4) as usize;
  let items = video_items(theme, &app.related, app.related_state.selected(), related_w);
  let list = List::new(items)
    .block(rounded_block(theme, " Related "))
    .highlight_symbol("▶ ")
    .highlight_style(Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD));
  frame.render_stateful_widget(list, related_area, &mut app.related_state);
}

fn render_playlist(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let [picker_area, area] = Layout::vertical([Constraint::Length(1), Constraint::Min(1)]).areas(area);

  let mut chips = vec![Span::styled(" [ ] ", Style::default().fg(theme.key_fg).bg(theme.key_bg)), Span::raw(" ")];
  for name in &app.playlist_names {
    let style = if *name == app.active_playlist {
      Style::default().fg(theme.accent).add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    } else {
      Style::default().fg(theme.muted)
    };
    chips.push(Span::styled(format!(" {} ", name), style));
  }
  if app.mode == AppMode::PlaylistName {
    chips.push(Span::styled(format!("  New playlist: {}▏", app.name_input), Style::default().fg(theme.status)));
  }
  frame.render_widget(Line::from(chips), picker_area);

  let inner_w = area.width.saturating_sub(4) as usize;
  let selected = app.playlist_state.selected();
  let playing = app.watching.as_ref().map(|w| w.video_id.as_str());
  let items: Vec<ListItem> = app
    .playlist
    .iter()
    .enumerate()
    .map(|(i, e)| {
      let marker = if Some(e.video_id.as_str()) == playing { "♪ " } else { "" };
      let title = format!("{}{}", marker, e.title);
      let right = format!("added {}", millis_label(e.added_at));
      striped(theme, i, selected, row(theme, &title, &right, inner_w, row_fg(theme, i, selected)))
    })
    .collect();
  let title = format!(" {} — {} videos ", app.active_playlist, app.playlist.len());
  let list = List::new(items)
    .block(rounded_block(theme, title))
    .highlight_symbol("▶ ")
    .highlight_style(Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD));
  frame.render_stateful_widget(list, area, &mut app.playlist_state);
}

fn render_history(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let inner_w = area.width.saturating_sub(4) as usize;
  let selected = app.history_state.selected();
  let items: Vec<ListItem> = app
    .history
    .iter()
    .enumerate()
    .map(|(i, e)| {
      let right = millis_label(e.watched_at);
      striped(theme, i, selected, row(theme, &e.title, &right, inner_w, row_fg(theme, i, selected)))
    })
    .collect();
  let suffix = if app.settings.save_history { "" } else { " (recording off)" };
  let title = format!(" History — {} videos{} ", app.history.len(), suffix);
  let list = List::new(items)
    .block(rounded_block(theme, title))
    .highlight_symbol("▶ ")
    .highlight_style(Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD));
  frame.render_stateful_widget(list, area, &mut app.history_state);
}

fn render_stats(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let s = &app.stats;
  let hours = s.total_watch_time as f64 / 3600.0;
  let field = |label: &'static str, value: String| {
    Line::from(vec![
      Span::styled(format!("{:<20}", label), Style::default().fg(theme.muted)),
      Span::styled(value, Style::default().fg(theme.fg).add_modifier(Modifier::BOLD)),
    ])
  };
  let mut lines = vec![
    Line::from(""),
    field("Videos watched", s.videos_watched.to_string()),
    field("Watch time", format!("{:.1} h", hours)),
    field("Active days", s.active_days.len().to_string()),
    field("Playlists", app.playlist_names.len().to_string()),
    field("History", app.history.len().to_string()),
    field("Storage used", format_kb(app.storage_bytes)),
    Line::from(""),
    Line::from(Span::styled("Top categories", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))),
  ];
  let top = s.top_categories();
  if top.is_empty() {
    lines.push(Line::from(Span::styled("  nothing yet", Style::default().fg(theme.muted))));
  }
  for (name, count) in top {
    lines.push(Line::from(vec![
      Span::styled(format!("  {:<18}", name), Style::default().fg(theme.fg)),
      Span::styled(count.to_string(), Style::default().fg(theme.muted)),
    ]));
  }
  let block = rounded_block(theme, " Stats ").padding(Padding::horizontal(1));
  frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_settings(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let s = &app.settings;
  let on_off = |b: bool| if b { "on" } else { "off" }.to_string();
  let key_value = if app.mode == AppMode::ApiKey {
    format!("{}▏", "•".repeat(app.key_input.chars().count()))
  } else if app.api.config().has_credential() {
    "set".to_string()
  } else {
    "missing".to_string()
  };
  let selected = app.settings_state.selected();
  let inner_w = area.width.saturating_sub(4) as usize;
  let items: Vec<ListItem> = SettingItem::ALL
    .iter()
    .enumerate()
    .map(|(i, item)| {
      let (label, value) = match item {
        SettingItem::AutoQuality => ("Auto quality", on_off(s.auto_quality)),
        SettingItem::BackgroundPlay => ("Background play", on_off(s.background_play_enabled)),
        SettingItem::SaveHistory => ("Save history", on_off(s.save_history)),
        SettingItem::DefaultQuality => ("Default quality", s.default_quality.label().to_string()),
        SettingItem::ApiKey => ("YouTube API key", key_value.clone()),
        SettingItem::ClearCache => ("Clear response cache", format!("{} cached", app.api.cached_responses())),
      };
      striped(theme, i, selected, row(theme, label, &value, inner_w, row_fg(theme, i, selected)))
    })
    .collect();
  let title = format!(" Settings — storage {} ", format_kb(app.storage_bytes));
  let list = List::new(items)
    .block(rounded_block(theme, title))
    .highlight_symbol("▶ ")
    .highlight_style(Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD));
  frame.render_stateful_widget(list, area, &mut app.settings_state);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let (text, style) = if let Some(msg) = &app.status_message {
    (format!(" ⏳ {}", msg), Style::default().fg(theme.status))
  } else if let Some(err) = &app.last_error {
    (format!(" ⚠  {}", err), Style::default().fg(theme.error))
  } else if let Some(info) = &app.info_message {
    (format!(" ℹ  {}", info), Style::default().fg(theme.fg))
  } else if app.is_background_playing()
    && let Some(w) = &app.watching
  {
    let status = app.now_playing.get().unwrap_or_default();
    (format!(" ♪ {}  {}", w.title, status), Style::default().fg(theme.status))
  } else {
    match app.now_playing.get() {
      Some(status) => (format!(" ♪ {}", status), Style::default().fg(theme.status)),
      None => (" Ready".to_string(), Style::default().fg(theme.muted)),
    }
  };
  frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_input(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let border_color = if app.mode == AppMode::Input { theme.accent } else { theme.border };
  let input_block = Block::bordered()
    .title(" Search YouTube ")
    .title_style(Style::default().fg(border_color))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(border_color))
    .padding(Padding::horizontal(1));

  let inner_w = area.width.saturating_sub(4) as usize;
  let cursor_col = display_width(&app.input, app.cursor_position);

  if cursor_col < app.input_scroll {
    app.input_scroll = cursor_col;
  } else if cursor_col >= app.input_scroll + inner_w {
    app.input_scroll = cursor_col.saturating_sub(inner_w) + 1;
  }

  let visible: String = app
    .input
    .chars()
    .scan(0usize, |col, c| {
      let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
      let start = *col;
      *col += w;
      Some((start, *col, c))
    })
    .skip_while(|(_, end, _)| *end <= app.input_scroll)
    .take_while(|(start, _, _)| *start < app.input_scroll + inner_w)
    .map(|(_, _, c)| c)
    .collect();

  let paragraph = Paragraph::new(visible).style(Style::default().fg(theme.fg)).block(input_block);
  frame.render_widget(paragraph, area);

  if app.mode == AppMode::Input {
    let cursor_x = area.x + 2 + (cursor_col - app.input_scroll) as u16;
    frame.set_cursor_position((cursor_x, area.y + 1));
  }
}

fn footer_keys(app: &App) -> Vec<(&'static str, &'static str)> {
  match app.mode {
    AppMode::Input => vec![("Enter", "Search"), ("Esc", "Clear/Back"), ("^t", "Theme")],
    AppMode::ApiKey => vec![("Enter", "Save key"), ("Esc", "Cancel")],
    AppMode::PlaylistName => vec![("Enter", "Create"), ("Esc", "Cancel")],
    AppMode::Browse => {
      let mut k = match app.page {
        Page::Home => vec![("Enter", "Play"), ("j/k", "Navigate"), ("a", "Add"), ("c", "Category"), ("/", "Search")],
        Page::Player => {
          let mut k = vec![("Space", if app.now_playing.is_paused() { "Resume" } else { "Pause" }), ("x", "Close")];
          if matches!(app.playback.state(), PlaybackState::ExhaustedFallback { .. }) {
            k.extend([("o", "Browser"), ("y", "App"), ("c", "Copy"), ("r", "Retry")]);
          } else {
            k.extend([("Enter", "Play related"), ("a", "Add")]);
          }
          if app.queue.is_some() {
            k.extend([("n/p", "Next/Prev")]);
          }
          k
        }
        Page::Playlist => vec![
          ("Enter", "Play"),
          ("P", "Play all"),
          ("d", "Remove"),
          ("D", "Clear"),
          ("[/]", "Switch"),
          ("N", "New"),
          ("X", "Delete"),
        ],
        Page::History => vec![("Enter", "Play"), ("D", "Clear")],
        Page::Stats => vec![],
        Page::Settings => vec![("Enter", "Change"), ("j/k", "Navigate")],
      };
      k.extend([("Tab", "Page"), ("q", "Quit")]);
      k
    }
  }
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let keys = footer_keys(app);

  let spans: Vec<Span> = keys
    .iter()
    .enumerate()
    .flat_map(|(i, (key, action))| {
      let mut s = vec![
        Span::styled(format!(" {} ", key), Style::default().fg(theme.key_fg).bg(theme.key_bg)),
        Span::styled(format!(" {} ", action), Style::default().fg(theme.muted)),
      ];
      if i < keys.len() - 1 {
        s.push(Span::raw("  "));
      }
      s
    })
    .collect();

  frame.render_widget(Line::from(spans), area);

  let theme_label = format!("{} ", theme.name);
  let right = Line::from(Span::styled(&theme_label, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(theme_label.len() as u16), width: theme_label.len() as u16, ..area };
  frame.render_widget(right, right_area);
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::app::tests::test_app;
  use ratatui::{Terminal, backend::TestBackend};

  fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
    terminal.backend().buffer().content().iter().map(|c| c.symbol()).collect()
  }

  #[test]
  fn truncate_adds_ellipsis() {
    assert_eq!(truncate_str("hello", 10), "hello");
    assert_eq!(truncate_str("hello world", 6), "hello…");
  }

  #[test]
  fn display_width_counts_wide_chars() {
    assert_eq!(display_width("a日b", 3), 4);
    assert_eq!(display_width("abc", 2), 2);
  }

  #[test]
  fn views_label_formats_counts() {
    assert_eq!(views_label(Some("1500")).as_deref(), Some("1.5K views"));
    assert_eq!(views_label(Some("n/a")), None);
    assert_eq!(views_label(None), None);
  }

  #[tokio::test]
  async fn renders_every_page() {
    let mut app = test_app();
    let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
    for page in [Page::Home, Page::Playlist, Page::History, Page::Stats, Page::Settings] {
      app.show_page(page);
      terminal.draw(|frame| ui(frame, &mut app)).unwrap();
      assert!(buffer_text(&terminal).contains("fasttube"));
    }
  }

  #[tokio::test]
  async fn playlist_page_lists_playlist_names() {
    let mut app = test_app();
    app.name_input = "Road trip".into();
    app.submit_playlist_name();
    app.show_page(Page::Playlist);
    let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
    terminal.draw(|frame| ui(frame, &mut app)).unwrap();
    let text = buffer_text(&terminal);
    assert!(text.contains("Favorites"));
    assert!(text.contains("Road trip — 0 videos"));
  }

  #[tokio::test]
  async fn config_banner_is_rendered() {
    let mut app = test_app();
    app.config_error = Some("YouTube API key is missing".into());
    let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
    terminal.draw(|frame| ui(frame, &mut app)).unwrap();
    assert!(buffer_text(&terminal).contains("YouTube API key is missing"));
  }
}
