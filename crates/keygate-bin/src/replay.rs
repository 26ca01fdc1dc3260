//! Drive a trace through the command filter and report every phase.

use anyhow::Result;
use core_config::Config;
use std::cell::Cell;
use std::rc::Rc;

use core_events::{
    CommandGroup, EventHub, ExecOptions, KeyModifiers, RawCommand, SettingsEvent, Subscription,
};
use core_filter::{CommandFilter, FilterOptions, ModalEngine};
use core_input::{raw_for_key, standard};
use core_render::{AttachedAdornments, ControlCharAdornments, ElementFactory, TextSnapshot};
use tracing::{info, warn};

use crate::sim::{SimEngine, SimHost};
use crate::trace::{HostCommand, Phase, ResolvedStep, SettingsChange, StepInput, Trace};

/// Elements are just the caret text; there is no real renderer.
pub struct CaretFactory;

impl ElementFactory for CaretFactory {
    type Element = String;

    fn create(&mut self, display: &str) -> String {
        display.to_string()
    }
}

pub struct Replay {
    filter: CommandFilter<SimEngine, SimHost>,
    adornments: AttachedAdornments<CaretFactory>,
    settings: EventHub<SettingsEvent>,
    invalidations: Rc<Cell<usize>>,
    _watch: Subscription,
}

fn command_raw(cmd: HostCommand) -> RawCommand {
    let id = match cmd {
        HostCommand::Undo => standard::UNDO,
        HostCommand::Redo => standard::REDO,
        HostCommand::Paste => standard::PASTE,
    };
    RawCommand::new(CommandGroup::Standard, id)
}

fn input_label(input: StepInput) -> String {
    match input {
        StepInput::Key(key) => key.to_string(),
        StepInput::Command(cmd) => format!("{cmd:?}").to_lowercase(),
        StepInput::Settings(change) => format!("{change:?}"),
    }
}

impl Replay {
    pub fn build(config: &Config, trace: &Trace) -> Result<Self> {
        let keymap = config.build_keymap()?;
        let engine = SimEngine::new(trace.mode.into(), keymap, trace.word_completion);
        let host = SimHost::new(&trace.text, trace.surfaces());
        let settings = EventHub::new("settings");
        let adornments = ControlCharAdornments::attach(
            host.doc_events(),
            &settings,
            CaretFactory,
            config.file.adornments.show_control_chars,
        );
        let invalidations = Rc::new(Cell::new(0));
        let counter = invalidations.clone();
        let watch = adornments
            .source()
            .borrow()
            .invalidated()
            .subscribe(move |_| counter.set(counter.get() + 1));
        let filter = CommandFilter::new(
            engine,
            host,
            config.file.quirks,
            FilterOptions::from(&config.file.filter),
        );
        info!(
            target: "runtime",
            mode = ?trace.mode,
            surfaces = ?trace.surfaces(),
            steps = trace.steps.len(),
            "replay_ready"
        );
        Ok(Self {
            filter,
            adornments,
            settings,
            invalidations,
            _watch: watch,
        })
    }

    pub fn run(&mut self, steps: &[ResolvedStep]) -> Vec<String> {
        steps.iter().flat_map(|step| self.step(*step)).collect()
    }

    fn step(&mut self, step: ResolvedStep) -> Vec<String> {
        let label = input_label(step.input);
        let (raw, mods) = match step.input {
            StepInput::Key(key) => match raw_for_key(key) {
                Some(pair) => pair,
                None => {
                    warn!(target: "runtime", key = %key, "no_editor_command");
                    return vec![format!("skip  {label}: no editor command")];
                }
            },
            StepInput::Command(cmd) => (command_raw(cmd), KeyModifiers::empty()),
            StepInput::Settings(change) => return vec![self.settings_step(change, &label)],
        };

        let mut lines = Vec::new();
        if matches!(step.phase, Phase::Query | Phase::Both) {
            let state = self.filter.query_status(&raw, mods);
            let mut line = format!(
                "query {label:<8} -> {:<11} mode={:?}",
                format!("{state:?}"),
                self.filter.engine().mode()
            );
            if let Some(key) = self.filter.discarded_key().get() {
                line.push_str(&format!(" discarded={key}"));
            }
            lines.push(self.with_actions(line));
        }
        if matches!(step.phase, Phase::Exec | Phase::Both) {
            let status = self.filter.exec(&raw, mods, ExecOptions::default());
            let line = format!(
                "exec  {label:<8} -> {:<11} mode={:?}",
                format!("{status:?}"),
                self.filter.engine().mode()
            );
            lines.push(self.with_actions(line));
        }
        lines
    }

    fn settings_step(&mut self, change: SettingsChange, label: &str) -> String {
        let before = self.invalidations.get();
        self.settings.raise(&change.into());
        let raised = self.invalidations.get() - before;
        info!(target: "runtime", ?change, raised, "settings_changed");
        format!(
            "settings {label} -> invalidated={raised} enabled={}",
            self.adornments.source().borrow().is_enabled()
        )
    }

    fn with_actions(&mut self, mut line: String) -> String {
        let actions = self.filter.engine_mut().take_actions();
        if !actions.is_empty() {
            let list: Vec<String> = actions.iter().map(|a| format!("{a:?}")).collect();
            line.push_str(&format!(" [{}]", list.join(", ")));
        }
        line
    }

    /// Final document text and its control-character adornments.
    pub fn summary(&self) -> Vec<String> {
        let document = self.filter.host().document();
        let source = self.adornments.source();
        let marks: Vec<String> = source
            .borrow_mut()
            .annotations(document, 0..document.len_chars())
            .into_iter()
            .map(|(span, text)| format!("{}:{text}", span.start))
            .collect();
        vec![
            format!("document {:?}", document.text()),
            format!("adornments [{}]", marks.join(" ")),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn replay(config: &Config, trace_src: &str) -> (Vec<String>, Vec<String>) {
        let trace = Trace::parse(trace_src).unwrap();
        let steps = trace.resolve_steps().unwrap();
        let mut replay = Replay::build(config, &trace).unwrap();
        let lines = replay.run(&steps);
        (lines, replay.summary())
    }

    #[test]
    fn insert_and_escape_round_trip() {
        let (lines, summary) = replay(
            &Config::default(),
            "text = \"x\"\n[[step]]\nkey = \"i\"\n[[step]]\nkey = \"y\"\n[[step]]\nkey = \"<Esc>\"\n",
        );
        assert_eq!(lines.len(), 6);
        assert!(lines[1].contains("EnterInsert"), "{lines:?}");
        assert!(lines[3].contains("NativeEdit(Insert('y'), true)"), "{lines:?}");
        assert!(lines[5].contains("mode=Normal"), "{lines:?}");
        assert_eq!(summary[0], "document \"xy\"");
    }

    #[test]
    fn cooperating_extension_escape_is_eager() {
        let mut config = Config::default();
        config.file.quirks.extension_installed = true;
        let (lines, _) = replay(
            &config,
            "mode = \"insert\"\n[[step]]\nkey = \"<Esc>\"\n",
        );
        assert!(lines[0].starts_with("query <Esc>"), "{lines:?}");
        assert!(lines[0].contains("Enabled"), "{lines:?}");
        assert!(lines[0].contains("discarded=<Esc>"), "{lines:?}");
        assert!(lines[0].contains("LeaveInsert"), "{lines:?}");
        // Already handled: no second LeaveInsert.
        assert!(lines[1].contains("-> Ok"), "{lines:?}");
        assert!(!lines[1].contains("LeaveInsert"), "{lines:?}");
    }

    #[test]
    fn control_chars_tracked_through_edits() {
        let (_, summary) = replay(
            &Config::default(),
            "mode = \"insert\"\ntext = \"\\u0007\"\n[[step]]\nkey = \"<Home>\"\n[[step]]\nkey = \"a\"\n",
        );
        assert_eq!(summary[0], "document \"a\\u{7}\"");
        assert_eq!(summary[1], "adornments [1:^G]");
    }

    #[test]
    fn settings_toggle_hides_and_restores_adornments() {
        let (lines, summary) = replay(
            &Config::default(),
            "text = \"\\u0007\"\n\
             [[step]]\nsettings = \"hide_control_chars\"\n\
             [[step]]\nsettings = \"hide_control_chars\"\n\
             [[step]]\nsettings = \"show_control_chars\"\n\
             [[step]]\nsettings = \"format_changed\"\n",
        );
        assert_eq!(
            lines,
            vec![
                "settings HideControlChars -> invalidated=1 enabled=false",
                "settings HideControlChars -> invalidated=0 enabled=false",
                "settings ShowControlChars -> invalidated=1 enabled=true",
                "settings FormatChanged -> invalidated=1 enabled=true",
            ]
        );
        assert_eq!(summary[1], "adornments [0:^G]");
    }

    #[test]
    fn host_commands_reach_the_host() {
        let (lines, summary) = replay(&Config::default(), "[[step]]\ncommand = \"paste\"\n");
        assert!(lines[0].contains("query paste"), "{lines:?}");
        assert_eq!(summary[0], "document \"<clip>\"");
    }
}
