//! Configuration loading and parsing.
//!
//! Parses `keygate.toml` (or an override path provided by the binary). Every
//! section is optional and defaulted; unknown fields are ignored (TOML
//! deserialization tolerance) so hosts can carry newer files without warnings.
//!
//! Sections:
//! * `[filter]` – native edit delegation switch.
//! * `[adornments]` – control character display.
//! * `[quirks]` – cooperating completion extension behavior, expressed as a
//!   table from key class to action so new extensions need only new data.
//! * `[[keymap]]` – key mappings in Vim notation.

use anyhow::{Context, Result};
use core_events::parse_keys;
use core_keymap::{KeyMap, RemapMode};
use serde::Deserialize;
use std::{fs, path::PathBuf};
use tracing::{info, warn};

pub const CONFIG_FILE_NAME: &str = "keygate.toml";

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct FilterConfig {
    /// Let the host perform primitive insert-mode edits itself so its own
    /// side effects (auto-indent, brace completion) still fire.
    #[serde(default = "FilterConfig::default_native_edits")]
    pub native_edits: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            native_edits: Self::default_native_edits(),
        }
    }
}

impl FilterConfig {
    const fn default_native_edits() -> bool {
        true
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct AdornmentConfig {
    #[serde(default = "AdornmentConfig::default_show_control_chars")]
    pub show_control_chars: bool,
}

impl Default for AdornmentConfig {
    fn default() -> Self {
        Self {
            show_control_chars: Self::default_show_control_chars(),
        }
    }
}

impl AdornmentConfig {
    const fn default_show_control_chars() -> bool {
        true
    }
}

/// How the filter treats a key class the cooperating extension also handles.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum QuirkAction {
    /// Process eagerly during query, then let the extension see the key too.
    Cooperate,
    /// Process eagerly during query and keep the key from the extension.
    Exclusive,
    /// No special handling.
    Ignore,
}

/// Key classes with extension-specific handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuirkKeyClass {
    Escape,
    Backspace,
    Enter,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct QuirkTable {
    /// A cooperating completion extension sits ahead of the filter in the
    /// host's dispatch chain.
    #[serde(default)]
    pub extension_installed: bool,
    /// Defer popup navigation keys to the host whenever the extension is
    /// installed, since its popups cannot be observed.
    #[serde(default = "QuirkTable::default_defer_navigation")]
    pub defer_navigation: bool,
    #[serde(default = "QuirkTable::default_escape")]
    pub escape: QuirkAction,
    #[serde(default = "QuirkTable::default_exclusive")]
    pub backspace: QuirkAction,
    #[serde(default = "QuirkTable::default_exclusive")]
    pub enter: QuirkAction,
}

impl Default for QuirkTable {
    fn default() -> Self {
        Self {
            extension_installed: false,
            defer_navigation: Self::default_defer_navigation(),
            escape: Self::default_escape(),
            backspace: Self::default_exclusive(),
            enter: Self::default_exclusive(),
        }
    }
}

impl QuirkTable {
    const fn default_defer_navigation() -> bool {
        true
    }
    const fn default_escape() -> QuirkAction {
        QuirkAction::Cooperate
    }
    const fn default_exclusive() -> QuirkAction {
        QuirkAction::Exclusive
    }

    /// Default table with the extension marked as installed.
    pub fn installed() -> Self {
        Self {
            extension_installed: true,
            ..Self::default()
        }
    }

    pub fn action(&self, class: QuirkKeyClass) -> QuirkAction {
        match class {
            QuirkKeyClass::Escape => self.escape,
            QuirkKeyClass::Backspace => self.backspace,
            QuirkKeyClass::Enter => self.enter,
        }
    }

    /// Whether navigation keys are unconditionally deferred to the host.
    pub fn defers_navigation(&self) -> bool {
        self.extension_installed && self.defer_navigation
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum KeymapMode {
    Normal,
    Visual,
    Insert,
    Command,
}

impl From<KeymapMode> for RemapMode {
    fn from(m: KeymapMode) -> Self {
        match m {
            KeymapMode::Normal => RemapMode::Normal,
            KeymapMode::Visual => RemapMode::Visual,
            KeymapMode::Insert => RemapMode::Insert,
            KeymapMode::Command => RemapMode::Command,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct KeymapEntry {
    pub mode: KeymapMode,
    pub lhs: String,
    pub rhs: String,
    #[serde(default)]
    pub remap: bool,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub adornments: AdornmentConfig,
    #[serde(default)]
    pub quirks: QuirkTable,
    #[serde(default)]
    pub keymap: Vec<KeymapEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub raw: Option<String>, // original file string (optional)
    pub file: ConfigFile,    // parsed (or default) data
}

/// Best-effort config path following platform conventions (XDG / AppData Roaming).
pub fn discover() -> PathBuf {
    // Prefer local working directory `keygate.toml` before the platform config dir.
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("keygate").join(CONFIG_FILE_NAME);
    }
    // Final fallback relative filename.
    PathBuf::from(CONFIG_FILE_NAME)
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = fs::read_to_string(&path) else {
        return Ok(Config::default());
    };
    match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => {
            info!(
                target: "config",
                path = %path.display(),
                keymap_entries = file.keymap.len(),
                extension_installed = file.quirks.extension_installed,
                "config_loaded"
            );
            Ok(Config {
                raw: Some(content),
                file,
            })
        }
        Err(e) => {
            // On parse error fall back to defaults.
            warn!(target: "config", path = %path.display(), error = %e, "config_parse_failed");
            Ok(Config::default())
        }
    }
}

impl Config {
    /// Compile the `[[keymap]]` entries into a mapping table.
    pub fn build_keymap(&self) -> Result<KeyMap> {
        let mut km = KeyMap::new();
        for (i, entry) in self.file.keymap.iter().enumerate() {
            let lhs = parse_keys(&entry.lhs)
                .with_context(|| format!("keymap[{i}]: invalid lhs {:?}", entry.lhs))?;
            let rhs = parse_keys(&entry.rhs)
                .with_context(|| format!("keymap[{i}]: invalid rhs {:?}", entry.rhs))?;
            km.map(entry.mode.into(), lhs, rhs, entry.remap);
        }
        Ok(km)
    }
}
