//! Key trace scripts.
//!
//! ```toml
//! mode = "insert"
//! surfaces = ["completion"]
//! word_completion = false
//! text = "hello"
//!
//! [[step]]
//! key = "<Esc>"
//!
//! [[step]]
//! phase = "query"
//! key = "<CR>"
//!
//! [[step]]
//! command = "undo"
//!
//! [[step]]
//! settings = "hide_control_chars"
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use core_events::{KeyEvent, KeyParseError, SettingsEvent};
use core_state::{ModeKind, UiSurfaces};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("step {index}: invalid key {notation:?}")]
    BadKey {
        index: usize,
        notation: String,
        #[source]
        source: KeyParseError,
    },
    #[error("step {0}: exactly one of `key`, `command` or `settings` is required")]
    AmbiguousInput(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceMode {
    #[default]
    Normal,
    Insert,
    Replace,
    Visual,
    VisualLine,
    VisualBlock,
    Command,
    ExternalEdit,
    Disabled,
}

impl From<TraceMode> for ModeKind {
    fn from(m: TraceMode) -> Self {
        match m {
            TraceMode::Normal => ModeKind::Normal,
            TraceMode::Insert => ModeKind::Insert,
            TraceMode::Replace => ModeKind::Replace,
            TraceMode::Visual => ModeKind::VisualCharacter,
            TraceMode::VisualLine => ModeKind::VisualLine,
            TraceMode::VisualBlock => ModeKind::VisualBlock,
            TraceMode::Command => ModeKind::Command,
            TraceMode::ExternalEdit => ModeKind::ExternalEdit,
            TraceMode::Disabled => ModeKind::Disabled,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    Completion,
    QuickInfo,
    SignatureHelp,
    SmartTag,
}

impl From<Surface> for UiSurfaces {
    fn from(s: Surface) -> Self {
        match s {
            Surface::Completion => UiSurfaces::COMPLETION,
            Surface::QuickInfo => UiSurfaces::QUICK_INFO,
            Surface::SignatureHelp => UiSurfaces::SIGNATURE_HELP,
            Surface::SmartTag => UiSurfaces::SMART_TAG,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Query,
    Exec,
    #[default]
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostCommand {
    Undo,
    Redo,
    Paste,
}

/// Display settings notification delivered to the adornment source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingsChange {
    ShowControlChars,
    HideControlChars,
    FormatChanged,
}

impl From<SettingsChange> for SettingsEvent {
    fn from(change: SettingsChange) -> Self {
        match change {
            SettingsChange::ShowControlChars => SettingsEvent::ControlCharsDisplay(true),
            SettingsChange::HideControlChars => SettingsEvent::ControlCharsDisplay(false),
            SettingsChange::FormatChanged => SettingsEvent::FormatChanged,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    #[serde(default)]
    pub phase: Phase,
    pub key: Option<String>,
    pub command: Option<HostCommand>,
    pub settings: Option<SettingsChange>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Trace {
    #[serde(default)]
    pub mode: TraceMode,
    #[serde(default)]
    pub surfaces: Vec<Surface>,
    #[serde(default)]
    pub word_completion: bool,
    /// Initial document text.
    #[serde(default)]
    pub text: String,
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepInput {
    Key(KeyEvent),
    Command(HostCommand),
    Settings(SettingsChange),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedStep {
    pub phase: Phase,
    pub input: StepInput,
}

impl Trace {
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("trace is not valid TOML")
    }

    pub fn surfaces(&self) -> UiSurfaces {
        self.surfaces
            .iter()
            .fold(UiSurfaces::empty(), |acc, s| acc | UiSurfaces::from(*s))
    }

    /// Validate every step. Fails on the first bad one.
    pub fn resolve_steps(&self) -> Result<Vec<ResolvedStep>, TraceError> {
        self.steps
            .iter()
            .enumerate()
            .map(|(index, step)| {
                let input = match (&step.key, step.command, step.settings) {
                    (Some(notation), None, None) => {
                        let key = notation.parse::<KeyEvent>().map_err(|source| {
                            TraceError::BadKey {
                                index,
                                notation: notation.clone(),
                                source,
                            }
                        })?;
                        StepInput::Key(key)
                    }
                    (None, Some(cmd), None) => StepInput::Command(cmd),
                    (None, None, Some(change)) => StepInput::Settings(change),
                    _ => return Err(TraceError::AmbiguousInput(index)),
                };
                Ok(ResolvedStep {
                    phase: step.phase,
                    input,
                })
            })
            .collect()
    }
}

pub fn load(path: &Path) -> Result<Trace> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading trace {}", path.display()))?;
    Trace::parse(&content).with_context(|| format!("parsing trace {}", path.display()))
}
