use core_events::{CommandGroup, EditorCommand, KeyEvent, KeyModifiers, RawCommand};
use core_input::{InputGate, PassReason, classify, editor, normalize, standard};
use std::sync::{Arc, Mutex};
use tracing::dispatcher::Dispatch;
use tracing_subscriber::layer::SubscriberExt;

#[derive(Default)]
struct Gate {
    automation: bool,
    search: bool,
}

impl InputGate for Gate {
    fn in_automation(&self) -> bool {
        self.automation
    }
    fn is_incremental_search_active(&self) -> bool {
        self.search
    }
}

fn typechar(c: char) -> RawCommand {
    RawCommand::with_char(CommandGroup::Editor, editor::TYPECHAR, c)
}

#[test]
fn idle_host_converts_keys() {
    let gate = Gate::default();
    assert_eq!(
        normalize(&gate, &typechar('j'), KeyModifiers::empty()),
        Some(EditorCommand::Key(KeyEvent::char('j')))
    );
}

#[test]
fn automation_context_passes_everything() {
    let gate = Gate {
        automation: true,
        ..Gate::default()
    };
    assert_eq!(normalize(&gate, &typechar('j'), KeyModifiers::empty()), None);
    let undo = RawCommand::new(CommandGroup::Standard, standard::UNDO);
    assert_eq!(
        classify(&gate, &undo, KeyModifiers::empty()),
        Err(PassReason::Automation)
    );
}

#[test]
fn incremental_search_passes_keys() {
    let gate = Gate {
        search: true,
        ..Gate::default()
    };
    let esc = RawCommand::new(CommandGroup::Editor, editor::CANCEL);
    assert_eq!(
        classify(&gate, &esc, KeyModifiers::empty()),
        Err(PassReason::IncrementalSearch)
    );
}

#[test]
fn host_commands_are_never_claimed() {
    let gate = Gate::default();
    let paste = RawCommand::new(CommandGroup::Standard, standard::PASTE);
    assert_eq!(normalize(&gate, &paste, KeyModifiers::empty()), None);
    assert_eq!(
        classify(&gate, &paste, KeyModifiers::empty()),
        Err(PassReason::HostCommand)
    );
}

#[test]
fn undo_redo_survive_the_gate() {
    let gate = Gate::default();
    let undo = RawCommand::new(CommandGroup::Standard, standard::UNDO);
    let redo = RawCommand::new(CommandGroup::Standard, standard::REDO);
    assert_eq!(normalize(&gate, &undo, KeyModifiers::empty()), Some(EditorCommand::Undo));
    assert_eq!(normalize(&gate, &redo, KeyModifiers::empty()), Some(EditorCommand::Redo));
}

#[test]
fn rejection_is_traced_on_normalize_target() {
    let targets: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = targets.clone();
    let layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .without_time()
        .with_writer(move || CaptureWriter(sink.clone()));
    let subscriber = tracing_subscriber::registry()
        .with(tracing_subscriber::filter::LevelFilter::TRACE)
        .with(layer);
    let dispatch = Dispatch::new(subscriber);
    tracing::dispatcher::with_default(&dispatch, || {
        let gate = Gate {
            automation: true,
            ..Gate::default()
        };
        let _ = normalize(&gate, &typechar('x'), KeyModifiers::empty());
    });
    let lines = targets.lock().unwrap().join("");
    assert!(lines.contains("input.normalize"), "log output: {lines}");
    assert!(lines.contains("pass_to_host"));
}

struct CaptureWriter(Arc<Mutex<Vec<String>>>);

impl std::io::Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0
            .lock()
            .unwrap()
            .push(String::from_utf8_lossy(buf).into_owned());
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
