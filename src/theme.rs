use ratatui::style::Color;

pub struct Theme {
  pub name: &'static str,
  pub bg: Color,
  pub fg: Color,
  pub accent: Color,
  pub muted: Color,
  pub border: Color,
  pub highlight_fg: Color,
  pub highlight_bg: Color,
  pub stripe_bg: Color,
  pub status: Color,
  pub error: Color,
  pub key_fg: Color,
  pub key_bg: Color,
}

pub const THEMES: &[Theme] = &[
  Theme {
    name: "Crimson",
    bg: Color::Rgb(18, 18, 18),
    fg: Color::Rgb(230, 230, 230),
    accent: Color::Rgb(255, 48, 64),
    muted: Color::Rgb(130, 130, 130),
    border: Color::Rgb(70, 70, 70),
    highlight_fg: Color::Rgb(255, 255, 255),
    highlight_bg: Color::Rgb(120, 20, 30),
    stripe_bg: Color::Rgb(26, 26, 26),
    status: Color::Rgb(255, 196, 0),
    error: Color::Rgb(255, 85, 85),
    key_fg: Color::Rgb(18, 18, 18),
    key_bg: Color::Rgb(255, 48, 64),
  },
  Theme {
    name: "Nord",
    bg: Color::Rgb(46, 52, 64),
    fg: Color::Rgb(216, 222, 233),
    accent: Color::Rgb(136, 192, 208),
    muted: Color::Rgb(129, 161, 193),
    border: Color::Rgb(76, 86, 106),
    highlight_fg: Color::Rgb(46, 52, 64),
    highlight_bg: Color::Rgb(136, 192, 208),
    stripe_bg: Color::Rgb(52, 58, 71),
    status: Color::Rgb(235, 203, 139),
    error: Color::Rgb(191, 97, 106),
    key_fg: Color::Rgb(46, 52, 64),
    key_bg: Color::Rgb(129, 161, 193),
  },
  Theme {
    name: "Gruvbox",
    bg: Color::Rgb(40, 40, 40),
    fg: Color::Rgb(235, 219, 178),
    accent: Color::Rgb(250, 189, 47),
    muted: Color::Rgb(146, 131, 116),
    border: Color::Rgb(80, 73, 69),
    highlight_fg: Color::Rgb(40, 40, 40),
    highlight_bg: Color::Rgb(215, 153, 33),
    stripe_bg: Color::Rgb(50, 48, 47),
    status: Color::Rgb(184, 187, 38),
    error: Color::Rgb(251, 73, 52),
    key_fg: Color::Rgb(40, 40, 40),
    key_bg: Color::Rgb(168, 153, 132),
  },
  Theme {
    name: "Paper",
    bg: Color::Rgb(250, 248, 242),
    fg: Color::Rgb(40, 40, 40),
    accent: Color::Rgb(200, 30, 45),
    muted: Color::Rgb(120, 120, 120),
    border: Color::Rgb(200, 196, 186),
    highlight_fg: Color::Rgb(250, 248, 242),
    highlight_bg: Color::Rgb(200, 30, 45),
    stripe_bg: Color::Rgb(242, 239, 230),
    status: Color::Rgb(160, 110, 0),
    error: Color::Rgb(190, 30, 30),
    key_fg: Color::Rgb(250, 248, 242),
    key_bg: Color::Rgb(90, 90, 90),
  },
];

/// Index of the theme called `name`, or the first theme.
pub fn theme_index(name: Option<&str>) -> usize {
  name.and_then(|n| THEMES.iter().position(|t| t.name.eq_ignore_ascii_case(n))).unwrap_or(0)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn lookup_by_name() {
    assert_eq!(theme_index(Some("nord")), 1);
    assert_eq!(theme_index(Some("missing")), 0);
    assert_eq!(theme_index(None), 0);
  }
}
