//! User configuration: the key binding table and persisted defaults.
//!
//! Defaults are stored as a simple key-value text file at
//! `$XDG_CONFIG_HOME/image-triage/config.toml`
//! (default `~/.config/image-triage/config.toml`).  Command-line flags
//! override whatever the file says.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::core::rules::{Category, ExtensionAllowList};

// ───────────────────────────────────────── actions ───────────

/// Everything the operator can do to the image on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Quit,
    Keep,
    Back,
    Restart,
    MoveTo(Category),
    Delete,
}

impl Action {
    /// Ordered list of all actions (used for the key hint).
    pub const ALL: &[Action] = &[
        Action::Quit,
        Action::Keep,
        Action::Back,
        Action::Restart,
        Action::MoveTo(Category::Reclassify),
        Action::MoveTo(Category::Annotate),
        Action::Delete,
    ];

    /// Human-readable label for the UI.
    pub fn label(self) -> &'static str {
        match self {
            Action::Quit => "quit",
            Action::Keep => "keep",
            Action::Back => "back",
            Action::Restart => "restart",
            Action::MoveTo(Category::Reclassify) => "wrong class",
            Action::MoveTo(Category::Annotate) => "annotate",
            Action::Delete => "delete",
        }
    }
}

// ───────────────────────────────────────── key bind ──────────

/// A single key binding: key code + modifier combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyBind {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBind {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    /// Does this binding match a key event?  Only CTRL/ALT/SHIFT modifiers
    /// are compared (platform-specific modifiers like SUPER are ignored).
    pub fn matches(&self, event: KeyEvent) -> bool {
        let mask = KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SHIFT;
        self.code == event.code && (self.modifiers & mask) == (event.modifiers & mask)
    }

    /// User-friendly display string (e.g. `"Esc"`, `"Ctrl+c"`, `"s"`).
    pub fn display(&self) -> String {
        let mut s = String::new();
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            s.push_str("Ctrl+");
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            s.push_str("Alt+");
        }
        if self.modifiers.contains(KeyModifiers::SHIFT) {
            s.push_str("Shift+");
        }
        s.push_str(&match self.code {
            KeyCode::Char(' ') => "Space".into(),
            KeyCode::Char(c) => c.to_string(),
            KeyCode::Enter => "Enter".into(),
            KeyCode::Esc => "Esc".into(),
            KeyCode::Tab => "Tab".into(),
            KeyCode::Backspace => "Bksp".into(),
            KeyCode::Delete => "Del".into(),
            KeyCode::F(n) => format!("F{n}"),
            other => format!("{other:?}"),
        });
        s
    }
}

// ───────────────────────────────────────── bindings ──────────

/// The key → action table the engine dispatches on.
#[derive(Debug, Clone)]
pub struct KeyBindings {
    bindings: HashMap<Action, Vec<KeyBind>>,
}

impl KeyBindings {
    /// The fixed triage table.  Ctrl+c also quits because raw mode swallows
    /// the interrupt signal.
    pub fn triage_defaults() -> Self {
        let n = KeyModifiers::NONE;
        let ctrl = KeyModifiers::CONTROL;
        let key = |c: char| KeyBind::new(KeyCode::Char(c), n);
        let mut m = HashMap::new();

        m.insert(
            Action::Quit,
            vec![KeyBind::new(KeyCode::Esc, n), KeyBind::new(KeyCode::Char('c'), ctrl)],
        );
        m.insert(Action::Keep, vec![key('s')]);
        m.insert(Action::Back, vec![key('b')]);
        m.insert(Action::Restart, vec![key('0')]);
        m.insert(Action::MoveTo(Category::Reclassify), vec![key('m')]);
        m.insert(Action::MoveTo(Category::Annotate), vec![key('a')]);
        m.insert(Action::Delete, vec![key('d'), key('x')]);

        Self { bindings: m }
    }

    /// Find the action that matches a key event.  When multiple bindings
    /// match, the one with the most modifiers wins.
    pub fn match_key(&self, event: KeyEvent) -> Option<Action> {
        let mut best: Option<Action> = None;
        let mut best_mod_count = 0;

        for (&action, binds) in &self.bindings {
            for bind in binds {
                if bind.matches(event) {
                    let mc = bind.modifiers.bits().count_ones();
                    if best.is_none() || mc > best_mod_count {
                        best = Some(action);
                        best_mod_count = mc;
                    }
                }
            }
        }
        best
    }

    /// Format the binding list for a given action (e.g. `"d/x"`).
    pub fn display_bindings(&self, action: Action) -> String {
        match self.bindings.get(&action) {
            Some(binds) if !binds.is_empty() => {
                binds.iter().map(|b| b.display()).collect::<Vec<_>>().join("/")
            }
            _ => "unbound".into(),
        }
    }

    /// Short display of the first binding only (for the status bar).
    fn short_binding(&self, action: Action) -> String {
        match self.bindings.get(&action) {
            Some(binds) if !binds.is_empty() => binds[0].display(),
            _ => "?".into(),
        }
    }

    /// Build the status-bar hint string, listing only the actions for which
    /// `offered` returns true.
    pub fn status_bar_hint(&self, offered: impl Fn(Action) -> bool) -> String {
        Action::ALL
            .iter()
            .copied()
            .filter(|&a| offered(a))
            .map(|a| {
                let keys = if a == Action::Delete {
                    self.display_bindings(a)
                } else {
                    self.short_binding(a)
                };
                format!("{keys}: {}", a.label())
            })
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::triage_defaults()
    }
}

// ───────────────────────────────────────── display size ──────

/// Pixel box an image is fitted into before it is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplaySize {
    pub width: u32,
    pub height: u32,
}

impl Default for DisplaySize {
    fn default() -> Self {
        Self {
            width: 800,
            height: 800,
        }
    }
}

impl FromStr for DisplaySize {
    type Err = String;

    /// Parse `"800x600"` (also accepts `X` and `*` as separators).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .trim()
            .split_once(['x', 'X', '*'])
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
        let width: u32 = w.trim().parse().map_err(|_| format!("bad width '{w}'"))?;
        let height: u32 = h.trim().parse().map_err(|_| format!("bad height '{h}'"))?;
        if width == 0 || height == 0 {
            return Err(format!("display size must be non-zero, got '{s}'"));
        }
        Ok(Self { width, height })
    }
}

impl fmt::Display for DisplaySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

// ───────────────────────────────────────── settings ──────────

/// Persisted session defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub allowed_extensions: ExtensionAllowList,
    /// Emit a progress notice every this many files (0 disables).
    pub milestone_interval: usize,
    pub display_size: DisplaySize,
    /// Directory names, resolved under the source directory.
    pub reclassify_dir: String,
    pub annotate_dir: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            allowed_extensions: ExtensionAllowList::default(),
            milestone_interval: 10,
            display_size: DisplaySize::default(),
            reclassify_dir: Category::Reclassify.default_dir_name().to_string(),
            annotate_dir: Category::Annotate.default_dir_name().to_string(),
        }
    }
}

impl Settings {
    /// Default directory name for a category.
    pub fn dir_name(&self, category: Category) -> &str {
        match category {
            Category::Reclassify => &self.reclassify_dir,
            Category::Annotate => &self.annotate_dir,
        }
    }

    // ── persistence ─────────────────────────────────────────────

    /// Load settings from disk, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(contents) => return Self::parse_config(&contents),
                Err(e) => tracing::warn!("ignoring unreadable config {}: {e}", path.display()),
            }
        }
        Self::default()
    }

    /// Persist current settings to disk.
    pub fn save(&self) -> anyhow::Result<PathBuf> {
        let path = config_path();
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.serialise())?;
        Ok(())
    }

    fn parse_config(s: &str) -> Self {
        let mut settings = Self::default();

        for line in s.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('[') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim().trim_matches('"');

            match key {
                "allowed_extensions" => {
                    let exts = ExtensionAllowList::new(value.split(','));
                    if !exts.is_empty() {
                        settings.allowed_extensions = exts;
                    }
                }
                "milestone_interval" => {
                    if let Ok(v) = value.parse::<usize>() {
                        settings.milestone_interval = v;
                    }
                }
                "display_size" => {
                    if let Ok(v) = value.parse::<DisplaySize>() {
                        settings.display_size = v;
                    }
                }
                "reclassify_dir" if !value.is_empty() => {
                    settings.reclassify_dir = value.to_string();
                }
                "annotate_dir" if !value.is_empty() => {
                    settings.annotate_dir = value.to_string();
                }
                _ => tracing::debug!("config: ignoring key '{key}'"),
            }
        }

        settings
    }

    fn serialise(&self) -> String {
        let exts: Vec<&str> = self.allowed_extensions.iter().collect();
        let lines = vec![
            "# image-triage configuration".to_string(),
            String::new(),
            "# Extensions kept without prompting (comma separated)".to_string(),
            format!("allowed_extensions = {}", exts.join(", ")),
            "# Progress notice every N files (0 disables)".to_string(),
            format!("milestone_interval = {}", self.milestone_interval),
            "# Pixel box images are fitted into".to_string(),
            format!("display_size = {}", self.display_size),
            String::new(),
            "# Destination directory names, created under the source directory".to_string(),
            format!("reclassify_dir = {}", self.reclassify_dir),
            format!("annotate_dir = {}", self.annotate_dir),
            String::new(),
        ];
        lines.join("\n")
    }
}

/// Return the config file path (`$XDG_CONFIG_HOME/image-triage/config.toml`).
fn config_path() -> PathBuf {
    let config_dir = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            PathBuf::from(home).join(".config")
        });
    config_dir.join("image-triage").join("config.toml")
}
