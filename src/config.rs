//! Application configuration.
//!
//! The configuration is loaded from a JSON file, by default
//! `$XDG_CONFIG_HOME/hyprws/config.json` or the path given with
//! `--config <path>`.  Keys are kebab-case and every key is optional.
//!
//! # Example
//!
//! ```json
//! {
//!   "format": "{icon} {windows}",
//!   "format-icons": { "active": "", "default": "" },
//!   "sort-by": "number",
//!   "collapse-inactive-projects": true,
//!   "transform-workspace-names": true,
//!   "persistent-workspaces": { "*": 5 },
//!   "window-rewrite": { "class<firefox>": "web", "title<.*vim.*>": "vim" }
//! }
//! ```
//!
//! [`Config`] is the raw file shape.  [`Options`] is the validated record the
//! engine consumes: regexes compiled, enums parsed, rewrite rules built.

use crate::rewrite::{RewriteRules, DEFAULT_REWRITE};
use log::{error, warn};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Monitor the bar lives on.  Defaults to the focused monitor at startup.
    pub output: Option<String>,
    pub format: String,
    pub format_icons: HashMap<String, String>,
    pub all_outputs: bool,
    pub show_special: bool,
    pub special_visible_only: bool,
    pub persistent_only: bool,
    pub active_only: bool,
    pub move_to_monitor: bool,
    pub sort_by: String,
    pub ignore_workspaces: Vec<String>,
    pub ignore_windows: Vec<String>,
    /// Kept as raw JSON: keys are monitor names, `*` or workspace names and
    /// the meaning of each value depends on its type.
    pub persistent_workspaces: Option<Value>,
    pub window_rewrite: Map<String, Value>,
    pub window_rewrite_default: String,
    pub format_window_separator: String,
    pub active_window_position: String,
    pub collapse_inactive_projects: bool,
    pub transform_workspace_names: bool,
    pub show_window_icons: String,
    pub icon_size: i32,
    /// Shell template run when a workspace appears; `{name}`, `{monitor}`
    /// and `{id}` are substituted.
    pub on_workspace_created: String,
    pub on_workspace_destroyed: String,
    pub create_script: String,
    pub create_current_script: String,
    pub remove_script: String,
    /// Capture window thumbnails for icon tooltips.
    pub thumbnails: bool,
    /// Render tick interval in milliseconds.
    pub interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output: None,
            format: "{name}".to_string(),
            format_icons: HashMap::new(),
            all_outputs: false,
            show_special: false,
            special_visible_only: false,
            persistent_only: false,
            active_only: false,
            move_to_monitor: false,
            sort_by: "default".to_string(),
            ignore_workspaces: Vec::new(),
            ignore_windows: Vec::new(),
            persistent_workspaces: None,
            window_rewrite: Map::new(),
            window_rewrite_default: DEFAULT_REWRITE.to_string(),
            format_window_separator: " ".to_string(),
            active_window_position: "none".to_string(),
            collapse_inactive_projects: false,
            transform_workspace_names: false,
            show_window_icons: "all".to_string(),
            icon_size: 16,
            on_workspace_created: String::new(),
            on_workspace_destroyed: String::new(),
            create_script: "hyprws-workspace-create".to_string(),
            create_current_script: "hyprws-workspace-create-current".to_string(),
            remove_script: "hyprws-workspace-remove".to_string(),
            thumbnails: true,
            interval_ms: 1000,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))?;
        Ok(config)
    }

    /// `$XDG_CONFIG_HOME/hyprws/config.json`, falling back to `~/.config`.
    pub fn default_path() -> Option<PathBuf> {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("hyprws").join("config.json"))
    }
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);

// ---------------------------------------------------------------------------
//  Validated options
// ---------------------------------------------------------------------------

/// How workspaces are ordered on the bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortMethod {
    Id,
    Name,
    Number,
    #[default]
    Default,
    SpecialCentered,
}

/// Which workspaces show their window icons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IconMode {
    None,
    CurrentGroup,
    #[default]
    All,
}

/// Where the active window is moved inside its workspace's window list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActiveWindowPosition {
    #[default]
    None,
    First,
    Last,
}

fn normalize_enum(raw: &str) -> String {
    raw.trim().to_ascii_lowercase().replace('_', "-")
}

impl SortMethod {
    pub fn parse(raw: &str) -> Option<Self> {
        match normalize_enum(raw).as_str() {
            "id" => Some(Self::Id),
            "name" => Some(Self::Name),
            "number" => Some(Self::Number),
            "default" => Some(Self::Default),
            "special-centered" => Some(Self::SpecialCentered),
            _ => None,
        }
    }
}

impl IconMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match normalize_enum(raw).as_str() {
            "none" => Some(Self::None),
            "current-group" => Some(Self::CurrentGroup),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

impl ActiveWindowPosition {
    pub fn parse(raw: &str) -> Option<Self> {
        match normalize_enum(raw).as_str() {
            "none" => Some(Self::None),
            "first" => Some(Self::First),
            "last" => Some(Self::Last),
            _ => None,
        }
    }
}

/// A list of case-insensitive regexes matched against whole strings.
#[derive(Debug, Clone, Default)]
pub struct RegexList(Vec<Regex>);

impl RegexList {
    /// Compile `patterns`; invalid entries are logged and dropped.
    pub fn compile<'a>(patterns: impl IntoIterator<Item = &'a str>, what: &str) -> Self {
        let mut out = Vec::new();
        for pattern in patterns {
            match RegexBuilder::new(&format!("^(?:{pattern})$"))
                .case_insensitive(true)
                .build()
            {
                Ok(re) => out.push(re),
                Err(e) => error!("invalid {what} regex {pattern:?}: {e}"),
            }
        }
        Self(out)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_match(&self, s: &str) -> bool {
        self.0.iter().any(|re| re.is_match(s))
    }
}

/// External helper commands run from clicks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scripts {
    /// Called with the project name to add a workspace to a project.
    pub create: String,
    /// Called when the already active workspace is clicked.
    pub create_current: String,
    /// Called with a workspace name to delete it.
    pub remove: String,
}

/// Validated options consumed by the engine and the render projection.
#[derive(Debug, Clone)]
pub struct Options {
    pub output: Option<String>,
    pub format: String,
    pub format_icons: HashMap<String, String>,
    /// `format` references `{icon}`.
    pub with_icon: bool,
    pub all_outputs: bool,
    pub show_special: bool,
    pub special_visible_only: bool,
    pub persistent_only: bool,
    pub active_only: bool,
    pub move_to_monitor: bool,
    pub sort_by: SortMethod,
    pub ignore_workspaces: RegexList,
    pub ignore_windows: RegexList,
    pub persistent_workspaces: Option<Map<String, Value>>,
    pub rewrite: RewriteRules,
    pub window_separator: String,
    pub active_window_position: ActiveWindowPosition,
    pub collapse_inactive_projects: bool,
    pub transform_workspace_names: bool,
    pub icon_mode: IconMode,
    pub icon_size: i32,
    pub on_workspace_created: String,
    pub on_workspace_destroyed: String,
    pub scripts: Scripts,
    pub thumbnails: bool,
    pub interval: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl Options {
    pub fn from_config(config: &Config) -> Self {
        let sort_by = SortMethod::parse(&config.sort_by).unwrap_or_else(|| {
            warn!("invalid sort-by {:?}, using default", config.sort_by);
            SortMethod::Default
        });
        let icon_mode = IconMode::parse(&config.show_window_icons).unwrap_or_else(|| {
            warn!(
                "invalid show-window-icons {:?}, using current-group",
                config.show_window_icons
            );
            IconMode::CurrentGroup
        });
        let active_window_position = ActiveWindowPosition::parse(&config.active_window_position)
            .unwrap_or_else(|| {
                warn!(
                    "invalid active-window-position {:?}, using none",
                    config.active_window_position
                );
                ActiveWindowPosition::None
            });
        let persistent_workspaces = match &config.persistent_workspaces {
            None => None,
            Some(Value::Object(map)) => Some(map.clone()),
            Some(other) => {
                warn!("persistent-workspaces must be an object, ignoring {other}");
                None
            }
        };

        Self {
            output: config.output.clone(),
            format: config.format.clone(),
            format_icons: config.format_icons.clone(),
            with_icon: config.format.contains("{icon}"),
            all_outputs: config.all_outputs,
            show_special: config.show_special,
            special_visible_only: config.special_visible_only,
            persistent_only: config.persistent_only,
            active_only: config.active_only,
            move_to_monitor: config.move_to_monitor,
            sort_by,
            ignore_workspaces: RegexList::compile(
                config.ignore_workspaces.iter().map(String::as_str),
                "ignore-workspaces",
            ),
            ignore_windows: RegexList::compile(
                config.ignore_windows.iter().map(String::as_str),
                "ignore-windows",
            ),
            persistent_workspaces,
            rewrite: RewriteRules::new(&config.window_rewrite, &config.window_rewrite_default),
            window_separator: config.format_window_separator.clone(),
            active_window_position,
            collapse_inactive_projects: config.collapse_inactive_projects,
            transform_workspace_names: config.transform_workspace_names,
            icon_mode,
            icon_size: config.icon_size,
            on_workspace_created: config.on_workspace_created.clone(),
            on_workspace_destroyed: config.on_workspace_destroyed.clone(),
            scripts: Scripts {
                create: config.create_script.clone(),
                create_current: config.create_current_script.clone(),
                remove: config.remove_script.clone(),
            },
            thumbnails: config.thumbnails,
            interval: Duration::from_millis(config.interval_ms.max(1)),
        }
    }

    /// Title changes only matter when titles are displayed or matched
    /// against `ignore-windows`.
    pub fn needs_titles(&self) -> bool {
        self.rewrite.uses_title() || self.icon_mode != IconMode::None || !self.ignore_windows.is_empty()
    }

    /// A window is skipped when its class or title matches `ignore-windows`.
    pub fn is_window_ignored(&self, class: &str, title: &str) -> bool {
        self.ignore_windows.is_match(class) || self.ignore_windows.is_match(title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_full_config() {
        let json = r#"{
            "output": "DP-1",
            "format": "{icon}",
            "format-icons": { "active": "A" },
            "sort-by": "special-centered",
            "ignore-workspaces": ["scratch.*"],
            "window-rewrite": { "class<kitty>": "K" },
            "collapse-inactive-projects": true,
            "show-window-icons": "current-group",
            "interval-ms": 250
        }"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.output.as_deref(), Some("DP-1"));
        assert!(cfg.collapse_inactive_projects);
        assert_eq!(cfg.interval_ms, 250);

        let opts = Options::from_config(&cfg);
        assert!(opts.with_icon);
        assert_eq!(opts.sort_by, SortMethod::SpecialCentered);
        assert_eq!(opts.icon_mode, IconMode::CurrentGroup);
        assert!(opts.ignore_workspaces.is_match("SCRATCHPAD"));
        assert_eq!(opts.rewrite.rewrite("kitty", ""), "K");
        assert_eq!(opts.interval, Duration::from_millis(250));
    }

    #[test]
    fn deserialize_empty_uses_defaults() {
        let cfg: Config = serde_json::from_str("{}").unwrap();
        let opts = Options::from_config(&cfg);
        assert_eq!(opts.format, "{name}");
        assert!(!opts.with_icon);
        assert_eq!(opts.sort_by, SortMethod::Default);
        assert_eq!(opts.icon_mode, IconMode::All);
        assert_eq!(opts.window_separator, " ");
        assert_eq!(opts.icon_size, 16);
        assert!(opts.thumbnails);
        assert!(opts.persistent_workspaces.is_none());
    }

    #[test]
    fn invalid_enums_fall_back() {
        let cfg: Config = serde_json::from_str(
            r#"{ "sort-by": "bogus", "show-window-icons": "bogus", "active-window-position": "x" }"#,
        )
        .unwrap();
        let opts = Options::from_config(&cfg);
        assert_eq!(opts.sort_by, SortMethod::Default);
        assert_eq!(opts.icon_mode, IconMode::CurrentGroup);
        assert_eq!(opts.active_window_position, ActiveWindowPosition::None);
    }

    #[test]
    fn enum_parsing_is_lenient() {
        assert_eq!(SortMethod::parse("SPECIAL_CENTERED"), Some(SortMethod::SpecialCentered));
        assert_eq!(IconMode::parse(" None "), Some(IconMode::None));
        assert_eq!(ActiveWindowPosition::parse("LAST"), Some(ActiveWindowPosition::Last));
    }

    #[test]
    fn non_object_persistent_workspaces_ignored() {
        let cfg: Config = serde_json::from_str(r#"{ "persistent-workspaces": [1, 2] }"#).unwrap();
        assert!(Options::from_config(&cfg).persistent_workspaces.is_none());
    }

    #[test]
    fn regex_list_skips_invalid_and_matches_whole() {
        let list = RegexList::compile(["(", "fire"], "test");
        assert!(list.is_match("FIRE"));
        assert!(!list.is_match("firefox"));
    }

    #[test]
    fn window_ignore_checks_class_and_title() {
        let cfg: Config = serde_json::from_str(r#"{ "ignore-windows": ["pavucontrol"] }"#).unwrap();
        let opts = Options::from_config(&cfg);
        assert!(opts.is_window_ignored("pavucontrol", "Volume"));
        assert!(opts.is_window_ignored("x", "Pavucontrol"));
        assert!(!opts.is_window_ignored("kitty", "zsh"));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Config::load(Path::new("/nonexistent/hyprws.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
