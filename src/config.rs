use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use crossterm::event::{KeyCode, KeyModifiers};
use serde::{Deserialize, Serialize};

use crate::view::DisplayFormat;

/// Top-level application configuration.
///
/// Loaded from `$XDG_CONFIG_HOME/newsdeck/config.yaml` (or platform
/// equivalent). A missing file means defaults. Fixed once the dashboard is
/// running.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Base URL of the news API; resource paths are appended to it.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Seconds between automatic refreshes of the active view.
    #[serde(default = "default_refresh_every")]
    pub refresh_every: u64,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub keybindings: KeyBindings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            refresh_every: default_refresh_every(),
            request_timeout: default_request_timeout(),
            display: DisplayConfig::default(),
            keybindings: KeyBindings::default(),
        }
    }
}

impl Config {
    /// Auto-refresh period. Never zero.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_every.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout.max(1))
    }

    pub fn display_format(&self) -> DisplayFormat {
        DisplayFormat {
            date: self.display.format.date.clone(),
            time: self.display.format.time.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DisplayConfig {
    #[serde(default)]
    pub format: FormatConfig,

    /// Width percentage of the sidebar.
    #[serde(default = "default_sidebar_width")]
    pub sidebar_width: u16,

    #[serde(default)]
    pub colours: ColourConfig,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            format: FormatConfig::default(),
            sidebar_width: default_sidebar_width(),
            colours: ColourConfig::default(),
        }
    }
}

/// strftime layouts for dates on cards and the last-update stamp.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FormatConfig {
    #[serde(default = "default_date_format")]
    pub date: String,

    #[serde(default = "default_time_format")]
    pub time: String,
}

impl Default for FormatConfig {
    fn default() -> Self {
        let format = DisplayFormat::default();
        Self {
            date: format.date,
            time: format.time,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ColourConfig {
    #[serde(default = "default_active_border")]
    pub active_border: String,

    #[serde(default = "default_inactive_border")]
    pub inactive_border: String,

    /// plain, double, thick or rounded.
    #[serde(default = "default_border_type")]
    pub border_type: String,

    #[serde(default = "default_highlight_bg")]
    pub highlight_bg: String,

    /// Colour of the marker on articles published in the last minutes.
    #[serde(default = "default_recent_indicator")]
    pub recent_indicator: String,
}

impl Default for ColourConfig {
    fn default() -> Self {
        Self {
            active_border: default_active_border(),
            inactive_border: default_inactive_border(),
            border_type: default_border_type(),
            highlight_bg: default_highlight_bg(),
            recent_indicator: default_recent_indicator(),
        }
    }
}

/// Parse a border type name.
pub fn parse_border_type(name: &str) -> Result<ratatui::widgets::BorderType, String> {
    use ratatui::widgets::BorderType;
    match name.to_lowercase().as_str() {
        "plain" => Ok(BorderType::Plain),
        "double" => Ok(BorderType::Double),
        "thick" => Ok(BorderType::Thick),
        "rounded" => Ok(BorderType::Rounded),
        _ => Err(format!("Unknown border type: {name}")),
    }
}

/// Parse a colour name or `#rrggbb` value.
pub fn parse_color(name: &str) -> Result<ratatui::style::Color, String> {
    use ratatui::style::Color;
    let lower = name.to_lowercase();
    if let Some(hex) = lower.strip_prefix('#') {
        let channel = |range: std::ops::Range<usize>| {
            hex.get(range)
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| format!("Invalid hex color: {name}"))
        };
        if hex.len() != 6 {
            return Err(format!("Invalid hex color: {name}"));
        }
        return Ok(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?));
    }

    let color = match lower.replace('_', "").as_str() {
        "black" => Color::Black,
        "red" => Color::Red,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "blue" => Color::Blue,
        "magenta" => Color::Magenta,
        "cyan" => Color::Cyan,
        "white" => Color::White,
        "gray" | "grey" => Color::Gray,
        "darkgray" | "darkgrey" => Color::DarkGray,
        "lightred" => Color::LightRed,
        "lightgreen" => Color::LightGreen,
        "lightyellow" => Color::LightYellow,
        "lightblue" => Color::LightBlue,
        "lightmagenta" => Color::LightMagenta,
        "lightcyan" => Color::LightCyan,
        _ => return Err(format!("Unknown color: {name}")),
    };
    Ok(color)
}

// ---------------------------------------------------------------------------
// Keybindings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct KeyBindings {
    #[serde(default)]
    pub global: GlobalKeyBindings,

    /// Bindings while the view sidebar is focused.
    #[serde(default)]
    pub sidebar: ListKeyBindings,

    /// Bindings while the card list is focused.
    #[serde(default)]
    pub cards: ListKeyBindings,
}

/// Bindings that work in every pane.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GlobalKeyBindings {
    #[serde(default = "default_quit")]
    pub quit: Vec<KeyBinding>,

    #[serde(default = "default_focus_next")]
    pub focus_next: Vec<KeyBinding>,

    #[serde(default = "default_focus_prev")]
    pub focus_prev: Vec<KeyBinding>,

    /// Reload the active view.
    #[serde(default = "default_refresh")]
    pub refresh: KeyBinding,

    /// Open the selected card's link.
    #[serde(default = "default_open_browser")]
    pub open_browser: KeyBinding,

    /// Step the source filter through the known portals.
    #[serde(default = "default_cycle_source")]
    pub cycle_source: KeyBinding,

    /// Prompt for a `YYYY-MM-DD` date filter.
    #[serde(default = "default_date_filter")]
    pub date_filter: KeyBinding,

    #[serde(default = "default_clear_filters")]
    pub clear_filters: KeyBinding,

    #[serde(default = "default_jump_top")]
    pub jump_top: KeyBinding,

    #[serde(default = "default_jump_bottom")]
    pub jump_bottom: KeyBinding,
}

impl Default for GlobalKeyBindings {
    fn default() -> Self {
        Self {
            quit: default_quit(),
            focus_next: default_focus_next(),
            focus_prev: default_focus_prev(),
            refresh: default_refresh(),
            open_browser: default_open_browser(),
            cycle_source: default_cycle_source(),
            date_filter: default_date_filter(),
            clear_filters: default_clear_filters(),
            jump_top: default_jump_top(),
            jump_bottom: default_jump_bottom(),
        }
    }
}

/// Navigation bindings shared by the two list panes.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListKeyBindings {
    #[serde(default = "default_move_down")]
    pub move_down: Vec<KeyBinding>,

    #[serde(default = "default_move_up")]
    pub move_up: Vec<KeyBinding>,

    /// Sidebar: load the view. Cards: open the link.
    #[serde(default = "default_select")]
    pub select: KeyBinding,

    #[serde(default = "default_page_down")]
    pub page_down: Vec<KeyBinding>,

    #[serde(default = "default_page_up")]
    pub page_up: Vec<KeyBinding>,
}

impl Default for ListKeyBindings {
    fn default() -> Self {
        Self {
            move_down: default_move_down(),
            move_up: default_move_up(),
            select: default_select(),
            page_down: default_page_down(),
            page_up: default_page_up(),
        }
    }
}

/// A single key binding, written as `"a"`, `"Ctrl-a"`, `"Enter"`, `"Shift-Tab"`, ...
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    /// Parse the textual form used in the config file.
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();

        if s.eq_ignore_ascii_case("shift-tab") {
            return Ok(KeyBinding {
                code: KeyCode::BackTab,
                modifiers: KeyModifiers::NONE,
            });
        }

        let (modifiers, key) = if let Some(rest) = s.strip_prefix("Ctrl-") {
            (KeyModifiers::CONTROL, rest)
        } else if let Some(rest) = s.strip_prefix("Alt-") {
            (KeyModifiers::ALT, rest)
        } else if let Some(rest) = s.strip_prefix("Shift-") {
            (KeyModifiers::SHIFT, rest)
        } else {
            (KeyModifiers::NONE, s)
        };

        let mut chars = key.chars();
        let code = match (chars.next(), chars.next()) {
            (Some(c), None) => KeyCode::Char(c),
            _ => match key.to_lowercase().as_str() {
                "enter" => KeyCode::Enter,
                "tab" => KeyCode::Tab,
                "backtab" => KeyCode::BackTab,
                "esc" | "escape" => KeyCode::Esc,
                "space" => KeyCode::Char(' '),
                "up" => KeyCode::Up,
                "down" => KeyCode::Down,
                "left" => KeyCode::Left,
                "right" => KeyCode::Right,
                "pageup" => KeyCode::PageUp,
                "pagedown" => KeyCode::PageDown,
                "home" => KeyCode::Home,
                "end" => KeyCode::End,
                _ => return Err(format!("Unknown key: {key}")),
            },
        };

        // Uppercase letters arrive with SHIFT set.
        let modifiers = match code {
            KeyCode::Char(c) if c.is_ascii_uppercase() => modifiers | KeyModifiers::SHIFT,
            _ => modifiers,
        };

        Ok(KeyBinding { code, modifiers })
    }

    pub fn matches(&self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        // Terminals disagree on how Shift+Tab is reported.
        if self.code == KeyCode::BackTab && self.modifiers == KeyModifiers::NONE {
            return (code == KeyCode::BackTab
                && (modifiers == KeyModifiers::NONE || modifiers == KeyModifiers::SHIFT))
                || (code == KeyCode::Tab && modifiers == KeyModifiers::SHIFT);
        }
        self.code == code && self.modifiers == modifiers
    }

    /// Short label for the status bar.
    pub fn display(&self) -> String {
        let prefix = if self.modifiers.contains(KeyModifiers::CONTROL) {
            "Ctrl+"
        } else if self.modifiers.contains(KeyModifiers::ALT) {
            "Alt+"
        } else {
            ""
        };
        format!("{prefix}{}", self.key_name(false))
    }

    /// The textual form accepted by [`KeyBinding::parse`].
    pub fn as_string(&self) -> String {
        let prefix = if self.modifiers.contains(KeyModifiers::CONTROL) {
            "Ctrl-"
        } else if self.modifiers.contains(KeyModifiers::ALT) {
            "Alt-"
        } else {
            ""
        };
        format!("{prefix}{}", self.key_name(true))
    }

    fn key_name(&self, for_config: bool) -> String {
        match self.code {
            KeyCode::Char(' ') => "Space".to_string(),
            KeyCode::Char(c) => c.to_string(),
            KeyCode::Enter => "Enter".to_string(),
            KeyCode::Tab => "Tab".to_string(),
            KeyCode::BackTab if for_config => "Shift-Tab".to_string(),
            KeyCode::BackTab => "Shift+Tab".to_string(),
            KeyCode::Esc => "Esc".to_string(),
            KeyCode::Up if for_config => "Up".to_string(),
            KeyCode::Up => "\u{2191}".to_string(),
            KeyCode::Down if for_config => "Down".to_string(),
            KeyCode::Down => "\u{2193}".to_string(),
            KeyCode::Left => "Left".to_string(),
            KeyCode::Right => "Right".to_string(),
            KeyCode::PageUp if for_config => "PageUp".to_string(),
            KeyCode::PageUp => "PgUp".to_string(),
            KeyCode::PageDown if for_config => "PageDown".to_string(),
            KeyCode::PageDown => "PgDn".to_string(),
            KeyCode::Home => "Home".to_string(),
            KeyCode::End => "End".to_string(),
            _ => "?".to_string(),
        }
    }
}

impl<'de> Deserialize<'de> for KeyBinding {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        KeyBinding::parse(&s).map_err(serde::de::Error::custom)
    }
}

impl Serialize for KeyBinding {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.as_string())
    }
}

/// Whether any of `bindings` matches the key.
pub fn matches_any(bindings: &[KeyBinding], code: KeyCode, modifiers: KeyModifiers) -> bool {
    bindings.iter().any(|b| b.matches(code, modifiers))
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_api_base_url() -> String {
    "http://localhost:8080/api/scraping".to_string()
}

fn default_refresh_every() -> u64 {
    300
}

fn default_request_timeout() -> u64 {
    30
}

fn default_sidebar_width() -> u16 {
    25
}

fn default_date_format() -> String {
    DisplayFormat::default().date
}

fn default_time_format() -> String {
    DisplayFormat::default().time
}

fn default_active_border() -> String {
    "cyan".to_string()
}

fn default_inactive_border() -> String {
    "darkgray".to_string()
}

fn default_border_type() -> String {
    "plain".to_string()
}

fn default_highlight_bg() -> String {
    "darkgray".to_string()
}

fn default_recent_indicator() -> String {
    "lightgreen".to_string()
}

fn kb(s: &str) -> KeyBinding {
    KeyBinding::parse(s).unwrap_or(KeyBinding {
        code: KeyCode::Null,
        modifiers: KeyModifiers::NONE,
    })
}

fn kbs(keys: &[&str]) -> Vec<KeyBinding> {
    keys.iter().map(|k| kb(k)).collect()
}

fn default_quit() -> Vec<KeyBinding> {
    kbs(&["q", "Ctrl-c"])
}

fn default_focus_next() -> Vec<KeyBinding> {
    kbs(&["Tab"])
}

fn default_focus_prev() -> Vec<KeyBinding> {
    kbs(&["Shift-Tab"])
}

fn default_refresh() -> KeyBinding {
    kb("r")
}

fn default_open_browser() -> KeyBinding {
    kb("o")
}

fn default_cycle_source() -> KeyBinding {
    kb("s")
}

fn default_date_filter() -> KeyBinding {
    kb("d")
}

fn default_clear_filters() -> KeyBinding {
    kb("c")
}

fn default_jump_top() -> KeyBinding {
    kb("g")
}

fn default_jump_bottom() -> KeyBinding {
    kb("G")
}

fn default_move_down() -> Vec<KeyBinding> {
    kbs(&["j", "Down"])
}

fn default_move_up() -> Vec<KeyBinding> {
    kbs(&["k", "Up"])
}

fn default_select() -> KeyBinding {
    kb("Enter")
}

fn default_page_down() -> Vec<KeyBinding> {
    kbs(&["Ctrl-d", "PageDown"])
}

fn default_page_up() -> Vec<KeyBinding> {
    kbs(&["Ctrl-u", "PageUp"])
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// `$XDG_CONFIG_HOME/newsdeck/config.yaml` (or platform equivalent).
pub fn config_path() -> anyhow::Result<PathBuf> {
    let dir = dirs::config_dir().context("Could not determine config directory")?;
    Ok(dir.join("newsdeck").join("config.yaml"))
}

/// Load the configuration, falling back to defaults when no file exists.
///
/// A file that exists but does not parse is an error.
pub fn load() -> anyhow::Result<Config> {
    let path = config_path()?;

    if !path.exists() {
        return Ok(Config::default());
    }

    let contents = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = serde_yaml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    Ok(config)
}
