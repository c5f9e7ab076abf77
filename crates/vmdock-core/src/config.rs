//! Persisted application settings.
//!
//! One JSON file holds everything: endpoints, themes and the layout/behaviour
//! knobs. Missing keys take their defaults on every load and unknown keys are
//! carried through untouched, so files written by older or newer builds keep
//! their content. A file that is not JSON is replaced with defaults; a bad
//! value inside valid JSON only resets that one setting.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use crate::model::Endpoint;

pub const CONFIG_FILE: &str = "config.json";
const APP_DIR: &str = "VmDock";
const HOME_ENV: &str = "VMDOCK_HOME";

pub const SIDE_PANEL_WIDTH_RANGE: (i32, i32) = (32, 50);
pub const METRICS_PANEL_WIDTH_RANGE: (i32, i32) = (120, 600);
pub const CARD_DIMENSION_RANGE: (i32, i32) = (1, 4096);
pub const HEADER_DIMENSION_RANGE: (i32, i32) = (0, 4096);

/// A theme is an open key/colour map; only a handful of keys are read by the
/// core, the rest belong to whatever draws the cards.
pub type Theme = Map<String, Value>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no config directory available; set {HOME_ENV}")]
    NoConfigDir,

    #[error("theme not found: {0}")]
    ThemeNotFound(String),

    #[error("theme file {0} does not contain a json object")]
    InvalidTheme(PathBuf),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> ConfigError + '_ {
    move |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    }
}

// ── Settings ────────────────────────────────────────────────────────

/// Screen edge the bar docks to.
///
/// Persisted as a lowercase string. Unknown values read back as `Top` rather
/// than failing the whole file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DockEdge {
    #[default]
    Top,
    Left,
    Right,
}

impl DockEdge {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "top" => Some(Self::Top),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }
}

impl From<String> for DockEdge {
    fn from(raw: String) -> Self {
        Self::parse(&raw).unwrap_or_default()
    }
}

impl From<DockEdge> for String {
    fn from(edge: DockEdge) -> Self {
        edge.as_str().to_string()
    }
}

impl fmt::Display for DockEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub servers: Vec<Endpoint>,
    pub themes: BTreeMap<String, Theme>,
    pub active_theme: String,
    pub button_width: i32,
    pub button_height: i32,
    pub cluster_header_height_px: i32,
    pub cluster_header_width_px: i32,
    pub dock_position: DockEdge,
    pub monitor_index: usize,
    pub side_panel_width: i32,
    pub metrics_panel_width: i32,
    pub show_running_only: bool,
    /// Kept for file compatibility; nothing reads it.
    pub auto_refresh_on_hover: bool,
    pub debug_logging: bool,
    pub disable_appbar: bool,
    pub skip_inventory_on_startup: bool,
    pub vmrc_path: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            servers: Vec::new(),
            themes: builtin_themes(),
            active_theme: DEFAULT_THEME.into(),
            button_width: 160,
            button_height: 48,
            cluster_header_height_px: 10,
            cluster_header_width_px: 200,
            dock_position: DockEdge::Top,
            monitor_index: 0,
            side_panel_width: 50,
            metrics_panel_width: 180,
            show_running_only: true,
            auto_refresh_on_hover: false,
            debug_logging: true,
            disable_appbar: false,
            skip_inventory_on_startup: false,
            vmrc_path: String::new(),
            extra: Map::new(),
        }
    }
}

impl AppConfig {
    /// Decode a parsed settings document one key at a time. Values that do not
    /// fit their setting keep the default; their keys are returned.
    pub fn from_value(value: Value) -> (Self, Vec<String>) {
        let mut config = Self::default();
        let mut rejected = Vec::new();

        let Value::Object(mut map) = value else {
            warn!("config: top level is not an object");
            rejected.push("<root>".to_string());
            return (config, rejected);
        };

        if let Some(raw) = map.remove("servers") {
            match raw {
                Value::Array(entries) => {
                    config.servers = entries
                        .into_iter()
                        .enumerate()
                        .filter_map(|(i, entry)| match serde_json::from_value::<Endpoint>(entry) {
                            Ok(endpoint) => Some(endpoint),
                            Err(e) => {
                                warn!(index = i, error = %e, "config: skipping invalid server entry");
                                rejected.push(format!("servers[{i}]"));
                                None
                            }
                        })
                        .collect();
                }
                other => reject(&mut rejected, "servers", &other),
            }
        }

        if let Some(raw) = map.remove("themes") {
            match raw {
                Value::Object(themes) => {
                    config.themes = themes
                        .into_iter()
                        .filter_map(|(name, theme)| match theme {
                            Value::Object(theme) => Some((name, theme)),
                            other => {
                                reject(&mut rejected, &format!("themes.{name}"), &other);
                                None
                            }
                        })
                        .collect();
                }
                other => reject(&mut rejected, "themes", &other),
            }
        }

        macro_rules! decode {
            ($($field:ident),* $(,)?) => {$(
                if let Some(raw) = map.remove(stringify!($field)) {
                    match serde_json::from_value(raw.clone()) {
                        Ok(v) => config.$field = v,
                        Err(_) => reject(&mut rejected, stringify!($field), &raw),
                    }
                }
            )*};
        }
        decode!(
            active_theme,
            button_width,
            button_height,
            cluster_header_height_px,
            cluster_header_width_px,
            dock_position,
            monitor_index,
            side_panel_width,
            metrics_panel_width,
            show_running_only,
            auto_refresh_on_hover,
            debug_logging,
            disable_appbar,
            skip_inventory_on_startup,
            vmrc_path,
        );

        config.extra = map;
        (config, rejected)
    }

    /// Add any built-in theme missing by name. Existing themes are never
    /// overwritten. Returns whether anything was added.
    fn merge_default_themes(&mut self) -> bool {
        let mut changed = false;
        for (name, theme) in builtin_themes() {
            if !self.themes.contains_key(&name) {
                self.themes.insert(name, theme);
                changed = true;
            }
        }
        changed
    }

    pub fn layout(&self) -> LayoutSettings {
        LayoutSettings {
            button_width: self
                .button_width
                .clamp(CARD_DIMENSION_RANGE.0, CARD_DIMENSION_RANGE.1),
            button_height: self
                .button_height
                .clamp(CARD_DIMENSION_RANGE.0, CARD_DIMENSION_RANGE.1),
            cluster_header_height_px: self
                .cluster_header_height_px
                .clamp(HEADER_DIMENSION_RANGE.0, HEADER_DIMENSION_RANGE.1),
            cluster_header_width_px: self
                .cluster_header_width_px
                .clamp(HEADER_DIMENSION_RANGE.0, HEADER_DIMENSION_RANGE.1),
            dock_position: self.dock_position,
            monitor_index: self.monitor_index,
            side_panel_width: self
                .side_panel_width
                .clamp(SIDE_PANEL_WIDTH_RANGE.0, SIDE_PANEL_WIDTH_RANGE.1),
            metrics_panel_width: self
                .metrics_panel_width
                .clamp(METRICS_PANEL_WIDTH_RANGE.0, METRICS_PANEL_WIDTH_RANGE.1),
        }
    }

    /// The active theme, falling back to the built-in default and then to
    /// the first theme by name.
    pub fn active_theme(&self) -> Theme {
        self.themes
            .get(&self.active_theme)
            .or_else(|| self.themes.get(DEFAULT_THEME))
            .or_else(|| self.themes.values().next())
            .cloned()
            .unwrap_or_default()
    }

    pub fn flag(&self, flag: Flag) -> bool {
        match flag {
            Flag::ShowRunningOnly => self.show_running_only,
            Flag::AutoRefreshOnHover => self.auto_refresh_on_hover,
            Flag::DebugLogging => self.debug_logging,
            Flag::DisableAppbar => self.disable_appbar,
            Flag::SkipInventoryOnStartup => self.skip_inventory_on_startup,
        }
    }

    fn flag_mut(&mut self, flag: Flag) -> &mut bool {
        match flag {
            Flag::ShowRunningOnly => &mut self.show_running_only,
            Flag::AutoRefreshOnHover => &mut self.auto_refresh_on_hover,
            Flag::DebugLogging => &mut self.debug_logging,
            Flag::DisableAppbar => &mut self.disable_appbar,
            Flag::SkipInventoryOnStartup => &mut self.skip_inventory_on_startup,
        }
    }

    pub fn vmrc_path(&self) -> Option<PathBuf> {
        let trimmed = self.vmrc_path.trim();
        (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
    }
}

/// Boolean settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    ShowRunningOnly,
    AutoRefreshOnHover,
    DebugLogging,
    DisableAppbar,
    SkipInventoryOnStartup,
}

/// Card and dock geometry settings, already clamped to their valid ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutSettings {
    pub button_width: i32,
    pub button_height: i32,
    pub cluster_header_height_px: i32,
    pub cluster_header_width_px: i32,
    pub dock_position: DockEdge,
    pub monitor_index: usize,
    pub side_panel_width: i32,
    pub metrics_panel_width: i32,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        AppConfig::default().layout()
    }
}

// ── Store ───────────────────────────────────────────────────────────

/// Owns the settings file. Every read-modify-write goes through one lock so
/// a save never interleaves with a load or another save.
pub struct ConfigStore {
    dir: PathBuf,
    path: PathBuf,
    inner: Mutex<AppConfig>,
}

impl ConfigStore {
    /// `$VMDOCK_HOME`, else `<platform config dir>/VmDock`.
    pub fn default_dir() -> Result<PathBuf> {
        if let Ok(home) = std::env::var(HOME_ENV)
            && !home.trim().is_empty()
        {
            return Ok(PathBuf::from(home));
        }
        dirs::config_dir()
            .map(|d| d.join(APP_DIR))
            .ok_or(ConfigError::NoConfigDir)
    }

    pub fn open_default() -> Result<Self> {
        Self::open(Self::default_dir()?)
    }

    /// Load (or create) `config.json` under `dir`, merge defaults forward and
    /// write the result back.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(io_err(&dir))?;
        let path = dir.join(CONFIG_FILE);

        let store = Self {
            dir,
            path,
            inner: Mutex::new(AppConfig::default()),
        };
        store.reload()?;
        Ok(store)
    }

    /// Re-read the file from disk, replacing the in-memory settings.
    ///
    /// Only a file that is not JSON at all is replaced with defaults. In a
    /// file that parses, each setting is decoded on its own and a bad value
    /// falls back to its default; such a file is left untouched on disk until
    /// the next explicit change.
    pub fn reload(&self) -> Result<()> {
        let mut guard = self.inner.lock();

        let (mut config, rejected) = match fs::read(&self.path) {
            Ok(bytes) => match serde_json::from_slice::<Value>(&bytes) {
                Ok(value) => AppConfig::from_value(value),
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "config: unreadable, replacing with defaults");
                    (AppConfig::default(), Vec::new())
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "config: not found, writing defaults");
                (AppConfig::default(), Vec::new())
            }
            Err(e) => return Err(io_err(&self.path)(e)),
        };

        if config.merge_default_themes() {
            debug!("config: merged missing default themes");
        }

        if rejected.is_empty() {
            write_atomic(&self.path, &config)?;
        } else {
            warn!(
                path = %self.path.display(),
                rejected = ?rejected,
                "config: invalid settings replaced by defaults in memory; file left as is"
            );
        }
        *guard = config;
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> AppConfig {
        self.inner.lock().clone()
    }

    /// Apply `f` and persist, all under the lock. The in-memory value only
    /// changes when the save succeeds.
    pub fn update<R>(&self, f: impl FnOnce(&mut AppConfig) -> R) -> Result<R> {
        let mut guard = self.inner.lock();
        let mut next = guard.clone();
        let out = f(&mut next);
        write_atomic(&self.path, &next)?;
        *guard = next;
        Ok(out)
    }

    // ── Endpoints ───────────────────────────────────────────────────

    pub fn servers(&self) -> Vec<Endpoint> {
        self.inner.lock().servers.clone()
    }

    pub fn set_servers(&self, servers: Vec<Endpoint>) -> Result<()> {
        self.update(|c| c.servers = servers)
    }

    /// The configured endpoint for `host`, compared case-insensitively.
    pub fn endpoint_for(&self, host: &str) -> Option<Endpoint> {
        self.inner
            .lock()
            .servers
            .iter()
            .find(|s| s.host.eq_ignore_ascii_case(host))
            .cloned()
    }

    // ── Layout ──────────────────────────────────────────────────────

    pub fn layout(&self) -> LayoutSettings {
        self.inner.lock().layout()
    }

    pub fn set_layout(&self, layout: LayoutSettings) -> Result<()> {
        self.update(|c| {
            c.button_width = layout.button_width;
            c.button_height = layout.button_height;
            c.cluster_header_height_px = layout.cluster_header_height_px;
            c.cluster_header_width_px = layout.cluster_header_width_px;
            c.dock_position = layout.dock_position;
            c.monitor_index = layout.monitor_index;
            c.side_panel_width = layout.side_panel_width;
            c.metrics_panel_width = layout.metrics_panel_width;
        })
    }

    pub fn set_docking(&self, edge: DockEdge, monitor_index: usize) -> Result<()> {
        self.update(|c| {
            c.dock_position = edge;
            c.monitor_index = monitor_index;
        })
    }

    // ── Flags ───────────────────────────────────────────────────────

    pub fn flag(&self, flag: Flag) -> bool {
        self.inner.lock().flag(flag)
    }

    pub fn set_flag(&self, flag: Flag, value: bool) -> Result<()> {
        self.update(|c| *c.flag_mut(flag) = value)
    }

    pub fn vmrc_path(&self) -> Option<PathBuf> {
        self.inner.lock().vmrc_path()
    }

    pub fn set_vmrc_path(&self, path: impl Into<String>) -> Result<()> {
        let path = path.into();
        self.update(|c| c.vmrc_path = path)
    }

    // ── Themes ──────────────────────────────────────────────────────

    pub fn active_theme(&self) -> Theme {
        self.inner.lock().active_theme()
    }

    pub fn active_theme_name(&self) -> String {
        self.inner.lock().active_theme.clone()
    }

    pub fn theme_names(&self) -> Vec<String> {
        self.inner.lock().themes.keys().cloned().collect()
    }

    pub fn set_theme(&self, name: impl Into<String>, theme: Theme) -> Result<()> {
        let name = name.into();
        self.update(|c| {
            c.themes.insert(name, theme);
        })
    }

    pub fn set_active_theme(&self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        self.update(|c| c.active_theme = name)
    }

    /// Store the theme in `path` and return the name it was stored under:
    /// the file's `name` key, else the file stem.
    pub fn import_theme(&self, path: &Path) -> Result<String> {
        let bytes = fs::read(path).map_err(io_err(path))?;
        let Value::Object(mut theme) = serde_json::from_slice::<Value>(&bytes)? else {
            return Err(ConfigError::InvalidTheme(path.to_path_buf()));
        };

        let name = match theme.get("name").and_then(Value::as_str) {
            Some(n) if !n.trim().is_empty() => n.to_string(),
            _ => path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_string)
                .ok_or_else(|| ConfigError::InvalidTheme(path.to_path_buf()))?,
        };
        theme
            .entry("name")
            .or_insert_with(|| Value::String(name.clone()));
        theme
            .entry("description")
            .or_insert_with(|| Value::String(String::new()));

        self.set_theme(name.clone(), theme)?;
        info!(theme = %name, "config: theme imported");
        Ok(name)
    }

    pub fn export_theme(&self, name: &str, path: &Path) -> Result<()> {
        let theme = self
            .inner
            .lock()
            .themes
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::ThemeNotFound(name.to_string()))?;
        let bytes = serde_json::to_vec_pretty(&theme)?;
        fs::write(path, bytes).map_err(io_err(path))
    }
}

fn reject(rejected: &mut Vec<String>, key: &str, raw: &Value) {
    warn!(key, value = %raw, "config: invalid value, using default");
    rejected.push(key.to_string());
}

fn write_atomic(path: &Path, config: &AppConfig) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(config)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes).map_err(io_err(&tmp))?;
    fs::rename(&tmp, path).map_err(io_err(path))
}

// ── Built-in themes ─────────────────────────────────────────────────

pub const DEFAULT_THEME: &str = "default_dark";

fn builtin_themes() -> BTreeMap<String, Theme> {
    let themes = [
        (
            DEFAULT_THEME,
            json!({
                "name": "Default Dark",
                "description": "Neutral dark with subtle gradient and green status LED.",
                "transparent": false,
                "bg_gradient_start": "#1E1E2A",
                "bg_gradient_end": "#2A2A3A",
                "cards_background": "#1B1B26",
                "text_primary": "#FFFFFF",
                "text_secondary": "#AAAAAA",
                "button_bg": "#2F2F45",
                "button_radius_px": 10,
                "cluster_header_bg": "#2A2A3A",
                "cluster_header_text": "#FFFFFF",
                "vm_led_on": "#4CAF50",
                "vm_name_text": "#FFFFFF",
                "vm_server_text": "#AAAAAA",
                "panel_text": "#FFFFFF",
                "status_ok": "#4CAF50",
                "status_warn": "#FFC107",
                "status_err": "#F44336"
            }),
        ),
        (
            "Neon_Nights",
            json!({
                "name": "Neon Nights",
                "description": "Vibrant purple-to-blue neon glow with cyan accents.",
                "transparent": false,
                "bg_gradient_start": "#1F1147",
                "bg_gradient_end": "#0D1F4A",
                "cards_background": "#151532",
                "text_primary": "#E6E6FF",
                "text_secondary": "#9AA3B2",
                "button_bg": "#1E88E5",
                "button_radius_px": 8,
                "cluster_header_bg": "#2B2B5E",
                "cluster_header_text": "#E6E6FF",
                "vm_led_on": "#00E5FF",
                "vm_name_text": "#FFFFFF",
                "vm_server_text": "#B3C1D1",
                "panel_text": "#E6E6FF",
                "status_ok": "#00E676",
                "status_warn": "#FFD54F",
                "status_err": "#FF5252"
            }),
        ),
        (
            "Oceanic",
            json!({
                "name": "Oceanic",
                "description": "Cool teal-to-navy ocean palette with crisp white text.",
                "transparent": false,
                "bg_gradient_start": "#013A63",
                "bg_gradient_end": "#011E3C",
                "cards_background": "#0A2A43",
                "text_primary": "#E0F7FA",
                "text_secondary": "#A7C8D1",
                "button_bg": "#0277BD",
                "button_radius_px": 10,
                "cluster_header_bg": "#014F86",
                "cluster_header_text": "#E0F7FA",
                "vm_led_on": "#00BFA5",
                "vm_name_text": "#FFFFFF",
                "vm_server_text": "#B2EBF2",
                "panel_text": "#E0F7FA",
                "status_ok": "#26A69A",
                "status_warn": "#FFD54F",
                "status_err": "#EF5350"
            }),
        ),
        (
            "Tan_99",
            json!({
                "name": "Tan_99",
                "description": "Warm tan gradient with blue accents and magenta labels.",
                "transparent": false,
                "bg_gradient_start": "#60270C",
                "bg_gradient_end": "#944D2B",
                "cards_background": "#1B1B26",
                "text_primary": "#FFFFFF",
                "text_secondary": "#AAAAAA",
                "button_bg": "#19518B",
                "button_radius_px": 5,
                "cluster_header_bg": "#FFAAFF",
                "cluster_header_text": "#B92F17",
                "vm_led_on": "#10EE22",
                "vm_name_text": "#FFFFFF",
                "vm_server_text": "#FF00FF",
                "panel_text": "#FFFFFF",
                "status_ok": "#4CAF50",
                "status_warn": "#FFC107",
                "status_err": "#F44336"
            }),
        ),
        (
            "Solar_Flare",
            json!({
                "name": "Solar Flare",
                "description": "Radiant orange-to-crimson gradient with bold accents.",
                "transparent": false,
                "bg_gradient_start": "#FF8C00",
                "bg_gradient_end": "#B71C1C",
                "cards_background": "#3A1E1E",
                "text_primary": "#FFF3E0",
                "text_secondary": "#FFCCBC",
                "button_bg": "#D84315",
                "button_radius_px": 8,
                "cluster_header_bg": "#6D2323",
                "cluster_header_text": "#FFE0B2",
                "vm_led_on": "#FFCA28",
                "vm_name_text": "#FFFFFF",
                "vm_server_text": "#FFE0B2",
                "panel_text": "#FFE0B2",
                "status_ok": "#81C784",
                "status_warn": "#FFB74D",
                "status_err": "#E57373"
            }),
        ),
        (
            "Forest_Mist",
            json!({
                "name": "Forest Mist",
                "description": "Lush green gradient with misty overlays and soft whites.",
                "transparent": false,
                "bg_gradient_start": "#1B5E20",
                "bg_gradient_end": "#0D3B14",
                "cards_background": "#102918",
                "text_primary": "#E8F5E9",
                "text_secondary": "#B7D7B7",
                "button_bg": "#2E7D32",
                "button_radius_px": 10,
                "cluster_header_bg": "#1B5E20",
                "cluster_header_text": "#E8F5E9",
                "vm_led_on": "#A5D6A7",
                "vm_name_text": "#FFFFFF",
                "vm_server_text": "#C8E6C9",
                "panel_text": "#E8F5E9",
                "status_ok": "#81C784",
                "status_warn": "#FFD54F",
                "status_err": "#E57373"
            }),
        ),
        (
            "Midnight_Purple",
            json!({
                "name": "Midnight Purple",
                "description": "Deep purple gradient with fuchsia highlights and silver text.",
                "transparent": false,
                "bg_gradient_start": "#2D0A31",
                "bg_gradient_end": "#1B0033",
                "cards_background": "#1A0820",
                "text_primary": "#F3E5F5",
                "text_secondary": "#C5B3CC",
                "button_bg": "#6A1B9A",
                "button_radius_px": 12,
                "cluster_header_bg": "#4A115A",
                "cluster_header_text": "#F3E5F5",
                "vm_led_on": "#EC407A",
                "vm_name_text": "#FFFFFF",
                "vm_server_text": "#E1BEE7",
                "panel_text": "#F3E5F5",
                "status_ok": "#66BB6A",
                "status_warn": "#FFCA28",
                "status_err": "#EF5350"
            }),
        ),
        (
            "Carbon_Red",
            json!({
                "name": "Carbon Red",
                "description": "Carbon fiber dark with red accents and bold highlights.",
                "transparent": false,
                "bg_gradient_start": "#202124",
                "bg_gradient_end": "#111213",
                "cards_background": "#1A1B1E",
                "text_primary": "#ECEFF1",
                "text_secondary": "#B0BEC5",
                "button_bg": "#C62828",
                "button_radius_px": 6,
                "cluster_header_bg": "#2B2C2F",
                "cluster_header_text": "#ECEFF1",
                "vm_led_on": "#FF5252",
                "vm_name_text": "#FFFFFF",
                "vm_server_text": "#CFD8DC",
                "panel_text": "#ECEFF1",
                "status_ok": "#66BB6A",
                "status_warn": "#FFA726",
                "status_err": "#EF5350"
            }),
        ),
    ];

    themes
        .into_iter()
        .filter_map(|(name, value)| match value {
            Value::Object(map) => Some((name.to_string(), map)),
            _ => None,
        })
        .collect()
}
