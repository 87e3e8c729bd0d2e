use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};

use crate::app::{App, AppMode, Page, SettingItem, list_down, list_up};

// --- Helpers ---

/// Convert a char index to a byte offset within the string.
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
  s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

// --- Event Handling ---

pub async fn handle_key_event(app: &mut App, key: event::KeyEvent) {
  if key.modifiers.contains(KeyModifiers::CONTROL) {
    match key.code {
      KeyCode::Char('c') => {
        app.should_quit = true;
        return;
      }
      KeyCode::Char('t') => {
        app.next_theme();
        return;
      }
      KeyCode::Char('s') => {
        app.close_player();
        return;
      }
      _ => {}
    }
  }

  match app.mode {
    AppMode::Input => handle_input_key(app, key),
    AppMode::ApiKey => handle_api_key(app, key),
    AppMode::PlaylistName => handle_playlist_name(app, key),
    AppMode::Browse => handle_browse_key(app, key).await,
  }
}

fn handle_input_key(app: &mut App, key: event::KeyEvent) {
  app.clear_error();
  match key.code {
    KeyCode::Enter => {
      app.trigger_search();
    }
    KeyCode::Char(c) => {
      let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
      app.input.insert(byte_idx, c);
      app.cursor_position += 1;
    }
    KeyCode::Backspace => {
      if app.cursor_position > 0 {
        app.cursor_position -= 1;
        let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
        app.input.remove(byte_idx);
      }
    }
    KeyCode::Delete => {
      if app.cursor_position < app.input.chars().count() {
        let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
        app.input.remove(byte_idx);
      }
    }
    KeyCode::Left => {
      app.cursor_position = app.cursor_position.saturating_sub(1);
    }
    KeyCode::Right => {
      if app.cursor_position < app.input.chars().count() {
        app.cursor_position += 1;
      }
    }
    KeyCode::Home => {
      app.cursor_position = 0;
    }
    KeyCode::End => {
      app.cursor_position = app.input.chars().count();
    }
    KeyCode::Esc => {
      if !app.input.is_empty() {
        app.input.clear();
        app.cursor_position = 0;
        app.input_scroll = 0;
      } else {
        app.mode = AppMode::Browse;
      }
    }
    KeyCode::Down | KeyCode::Tab => {
      app.mode = AppMode::Browse;
    }
    _ => {}
  }
}

fn handle_api_key(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Enter => app.submit_api_key(),
    KeyCode::Char(c) => app.key_input.push(c),
    KeyCode::Backspace => {
      app.key_input.pop();
    }
    KeyCode::Esc => {
      app.key_input.clear();
      app.mode = AppMode::Browse;
    }
    _ => {}
  }
}

fn handle_playlist_name(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Enter => app.submit_playlist_name(),
    KeyCode::Char(c) => app.name_input.push(c),
    KeyCode::Backspace => {
      app.name_input.pop();
    }
    KeyCode::Esc => {
      app.name_input.clear();
      app.mode = AppMode::Browse;
    }
    _ => {}
  }
}

async fn handle_browse_key(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Char('q') => {
      app.should_quit = true;
      return;
    }
    KeyCode::Char('/') => {
      app.show_page(Page::Home);
      app.mode = AppMode::Input;
      return;
    }
    KeyCode::Tab => {
      let idx = Page::ALL.iter().position(|p| *p == app.page).unwrap_or(0);
      let mut next = Page::ALL[(idx + 1) % Page::ALL.len()];
      if next == Page::Player && app.watching.is_none() {
        next = Page::ALL[(idx + 2) % Page::ALL.len()];
      }
      app.show_page(next);
      return;
    }
    KeyCode::Char(c @ '1'..='6') => {
      let idx = c as usize - '1' as usize;
      app.show_page(Page::ALL[idx]);
      return;
    }
    KeyCode::Char(' ') => {
      app.toggle_pause().await;
      return;
    }
    _ => {}
  }

  match app.page {
    Page::Home => handle_home_key(app, key),
    Page::Player => handle_player_key(app, key),
    Page::Playlist => handle_playlist_key(app, key),
    Page::History => handle_history_key(app, key),
    Page::Stats => {
      if key.code == KeyCode::Esc {
        app.show_page(Page::Home);
      }
    }
    Page::Settings => handle_settings_key(app, key),
  }
}

fn handle_home_key(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Enter => app.play_selected_result(),
    KeyCode::Char('a') => app.add_selected_result_to_playlist(),
    KeyCode::Char('c') => app.next_category(),
    KeyCode::Down | KeyCode::Char('j') => {
      if let Some(i) = list_down(&mut app.results_state, app.results.len()) {
        app.on_results_moved(i);
      }
    }
    KeyCode::Up | KeyCode::Char('k') => {
      list_up(&mut app.results_state, app.results.len());
    }
    KeyCode::Esc => {
      app.mode = AppMode::Input;
    }
    _ => {}
  }
}

fn handle_player_key(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Enter => app.play_selected_related(),
    KeyCode::Down | KeyCode::Char('j') => {
      list_down(&mut app.related_state, app.related.len());
    }
    KeyCode::Up | KeyCode::Char('k') => {
      list_up(&mut app.related_state, app.related.len());
    }
    KeyCode::Char('x') => app.close_player(),
    KeyCode::Char('o') => app.open_watch_page(),
    KeyCode::Char('y') => app.open_in_app(),
    KeyCode::Char('c') => app.copy_link(),
    KeyCode::Char('r') => app.retry_embed(),
    KeyCode::Char('a') => app.add_current_to_playlist(),
    KeyCode::Char('n') => app.play_next(),
    KeyCode::Char('p') => app.play_previous(),
    KeyCode::Esc => app.show_page(Page::Home),
    _ => {}
  }
}

fn handle_playlist_key(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Enter => {
      if let Some(i) = app.playlist_state.selected() {
        app.play_playlist(i);
      }
    }
    KeyCode::Char('P') => app.play_all(),
    KeyCode::Char('d') => app.remove_selected_from_playlist(),
    KeyCode::Char('D') => app.clear_playlist(),
    KeyCode::Char('N') => app.begin_create_playlist(),
    KeyCode::Char('X') => app.delete_active_playlist(),
    KeyCode::Right | KeyCode::Char(']') | KeyCode::Char('l') => app.cycle_playlist(true),
    KeyCode::Left | KeyCode::Char('[') | KeyCode::Char('h') => app.cycle_playlist(false),
    KeyCode::Down | KeyCode::Char('j') => {
      list_down(&mut app.playlist_state, app.playlist.len());
    }
    KeyCode::Up | KeyCode::Char('k') => {
      list_up(&mut app.playlist_state, app.playlist.len());
    }
    KeyCode::Esc => app.show_page(Page::Home),
    _ => {}
  }
}

fn handle_history_key(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Enter => app.play_selected_history(),
    KeyCode::Char('D') => app.clear_history(),
    KeyCode::Down | KeyCode::Char('j') => {
      list_down(&mut app.history_state, app.history.len());
    }
    KeyCode::Up | KeyCode::Char('k') => {
      list_up(&mut app.history_state, app.history.len());
    }
    KeyCode::Esc => app.show_page(Page::Home),
    _ => {}
  }
}

fn handle_settings_key(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Enter => {
      if let Some(item) = app.settings_state.selected().and_then(|i| SettingItem::ALL.get(i)) {
        app.activate_setting(*item);
      }
    }
    KeyCode::Down | KeyCode::Char('j') => {
      list_down(&mut app.settings_state, SettingItem::ALL.len());
    }
    KeyCode::Up | KeyCode::Char('k') => {
      list_up(&mut app.settings_state, SettingItem::ALL.len());
    }
    KeyCode::Esc => app.show_page(Page::Home),
    _ => {}
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::app::tests::test_app;
  use ratatui::crossterm::event::KeyEvent;

  fn press(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn ctrl(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
  }

  // --- char_to_byte_index ---

  #[test]
  fn char_to_byte_ascii() {
    assert_eq!(char_to_byte_index("hello", 0), 0);
    assert_eq!(char_to_byte_index("hello", 3), 3);
    assert_eq!(char_to_byte_index("hello", 5), 5); // past end
  }

  #[test]
  fn char_to_byte_multibyte() {
    let s = "aé日"; // a=1 byte, é=2 bytes, 日=3 bytes
    assert_eq!(char_to_byte_index(s, 0), 0);
    assert_eq!(char_to_byte_index(s, 1), 1);
    assert_eq!(char_to_byte_index(s, 2), 3);
    assert_eq!(char_to_byte_index(s, 3), 6);
  }

  #[test]
  fn char_to_byte_empty() {
    assert_eq!(char_to_byte_index("", 0), 0);
    assert_eq!(char_to_byte_index("", 5), 0);
  }

  // --- key routing ---

  #[tokio::test]
  async fn typing_edits_search_box() {
    let mut app = test_app();
    handle_key_event(&mut app, press(KeyCode::Char('/'))).await;
    assert_eq!(app.mode, AppMode::Input);
    for c in "cat".chars() {
      handle_key_event(&mut app, press(KeyCode::Char(c))).await;
    }
    handle_key_event(&mut app, press(KeyCode::Left)).await;
    handle_key_event(&mut app, press(KeyCode::Backspace)).await;
    assert_eq!(app.input, "ct");
    assert_eq!(app.cursor_position, 1);
    // In the search box, 'q' is text, not quit.
    handle_key_event(&mut app, press(KeyCode::Char('q'))).await;
    assert!(!app.should_quit);
  }

  #[tokio::test]
  async fn number_keys_switch_pages() {
    let mut app = test_app();
    handle_key_event(&mut app, press(KeyCode::Char('3'))).await;
    assert_eq!(app.page, Page::Playlist);
    handle_key_event(&mut app, press(KeyCode::Char('6'))).await;
    assert_eq!(app.page, Page::Settings);
    handle_key_event(&mut app, press(KeyCode::Esc)).await;
    assert_eq!(app.page, Page::Home);
  }

  #[tokio::test]
  async fn tab_skips_empty_player_page() {
    let mut app = test_app();
    handle_key_event(&mut app, press(KeyCode::Tab)).await;
    assert_eq!(app.page, Page::Playlist);
  }

  #[tokio::test]
  async fn settings_enter_toggles_selected_row() {
    let mut app = test_app();
    handle_key_event(&mut app, press(KeyCode::Char('6'))).await;
    handle_key_event(&mut app, press(KeyCode::Down)).await;
    handle_key_event(&mut app, press(KeyCode::Enter)).await;
    assert!(!app.settings.background_play_enabled);
  }

  #[tokio::test]
  async fn api_key_mode_collects_text() {
    let mut app = test_app();
    app.mode = AppMode::ApiKey;
    for c in "ab".chars() {
      handle_key_event(&mut app, press(KeyCode::Char(c))).await;
    }
    handle_key_event(&mut app, press(KeyCode::Backspace)).await;
    assert_eq!(app.key_input, "a");
    handle_key_event(&mut app, press(KeyCode::Esc)).await;
    assert_eq!(app.mode, AppMode::Browse);
    assert!(app.key_input.is_empty());
  }

  #[tokio::test]
  async fn new_playlist_is_named_by_typing() {
    let mut app = test_app();
    handle_key_event(&mut app, press(KeyCode::Char('3'))).await;
    handle_key_event(&mut app, press(KeyCode::Char('N'))).await;
    assert_eq!(app.mode, AppMode::PlaylistName);
    // While naming, page and quit keys are text.
    for c in "q3".chars() {
      handle_key_event(&mut app, press(KeyCode::Char(c))).await;
    }
    handle_key_event(&mut app, press(KeyCode::Enter)).await;
    assert_eq!(app.active_playlist, "q3");
    assert!(!app.should_quit);

    handle_key_event(&mut app, press(KeyCode::Char(']'))).await;
    assert_eq!(app.active_playlist, "Favorites");
  }

  #[tokio::test]
  async fn ctrl_c_quits_from_any_mode() {
    let mut app = test_app();
    app.mode = AppMode::Input;
    handle_key_event(&mut app, ctrl('c')).await;
    assert!(app.should_quit);
  }
}
