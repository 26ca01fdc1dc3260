mod common;

use common::*;
use core_events::KeyEvent;
use core_filter::{
    ArbitrationPolicy, CommandState, Deferral, QueryClass, QuirkAction, QuirkTable, Route,
};
use core_keymap::RemapMode;
use core_state::{ModeKind, UiSurfaces};
use pretty_assertions::assert_eq;

fn route(engine: &MockEngine, host: &MockHost, quirks: &QuirkTable, notation: &str) -> Route {
    ArbitrationPolicy::new(quirks).route(engine, host, key(notation))
}

fn completion_popup() -> MockHost {
    MockHost {
        surfaces: UiSurfaces::COMPLETION,
        ..MockHost::default()
    }
}

#[test]
fn engine_declined_goes_to_host() {
    let mut engine = MockEngine::default();
    engine.declined.insert(KeyEvent::ctrl('w'));
    let host = MockHost::default();
    assert_eq!(
        route(&engine, &host, &QuirkTable::default(), "<C-w>"),
        Route::Host(Deferral::EngineDeclined)
    );
}

#[test]
fn disabled_engine_declines_everything() {
    let engine = MockEngine::in_mode(ModeKind::Disabled);
    let host = MockHost::default();
    for k in ["x", "<Esc>", "<Down>"] {
        assert_eq!(
            route(&engine, &host, &QuirkTable::default(), k),
            Route::Host(Deferral::EngineDeclined),
            "{k}"
        );
    }
}

#[test]
fn ambiguous_mapping_stays_with_engine_even_over_popup() {
    let mut engine = MockEngine::in_mode(ModeKind::Insert);
    engine.map(RemapMode::Insert, "<Tab>x", "y");
    let host = completion_popup();
    assert_eq!(
        route(&engine, &host, &QuirkTable::default(), "<Tab>"),
        Route::Engine
    );
}

#[test]
fn buffered_input_makes_unmapped_key_ambiguous() {
    let mut engine = MockEngine::in_mode(ModeKind::Insert);
    engine.buffered = vec![KeyEvent::char('j')];
    let host = completion_popup();
    // `j<Down>` replays two keys, so the popup rule never sees a single key.
    assert_eq!(
        route(&engine, &host, &QuirkTable::default(), "<Down>"),
        Route::Engine
    );
}

#[test]
fn insert_word_completion_defers_any_key() {
    let mut engine = MockEngine::in_mode(ModeKind::Insert);
    engine.word_completion = true;
    let host = MockHost::default();
    for k in ["a", "<Down>", "<C-n>"] {
        assert_eq!(
            route(&engine, &host, &QuirkTable::default(), k),
            Route::Host(Deferral::WordCompletion),
            "{k}"
        );
    }
}

#[test]
fn word_completion_checked_before_mapping_lookup() {
    let mut engine = MockEngine::in_mode(ModeKind::Insert);
    engine.map(RemapMode::Insert, "jk", "<Esc>");
    engine.word_completion = true;
    let host = MockHost::default();
    // `j` is a strict prefix of `jk`; the open session still wins.
    assert_eq!(
        route(&engine, &host, &QuirkTable::default(), "j"),
        Route::Host(Deferral::WordCompletion)
    );

    let mut f = filter(engine, host, QuirkTable::default());
    press(&mut f, "j");
    assert!(f.engine().processed.is_empty());
    assert!(f.engine().buffered.is_empty());
    assert_eq!(f.host().execs.len(), 1);
}

#[test]
fn word_completion_outside_insert_does_not_defer() {
    let mut engine = MockEngine::in_mode(ModeKind::Normal);
    engine.word_completion = true;
    let host = MockHost::default();
    assert_eq!(
        route(&engine, &host, &QuirkTable::default(), "a"),
        Route::Engine
    );
}

#[test]
fn popup_navigation_defers_to_intellisense() {
    let engine = MockEngine::in_mode(ModeKind::Insert);
    let host = completion_popup();
    for k in ["<Up>", "<Down>", "<Left>", "<Right>", "<Tab>", "<S-Tab>", "<BS>", "<CR>"] {
        assert_eq!(
            route(&engine, &host, &QuirkTable::default(), k),
            Route::Host(Deferral::IntelliSense),
            "{k}"
        );
    }
}

#[test]
fn popup_ignores_chords_and_non_navigation_keys() {
    let engine = MockEngine::in_mode(ModeKind::Insert);
    let host = MockHost {
        surfaces: UiSurfaces::QUICK_INFO | UiSurfaces::SIGNATURE_HELP,
        ..MockHost::default()
    };
    for k in ["a", "<C-Down>", "<A-Left>", "<Home>", "<Esc>"] {
        assert_eq!(
            route(&engine, &host, &QuirkTable::default(), k),
            Route::Engine,
            "{k}"
        );
    }
}

#[test]
fn popup_rule_applies_to_resolved_key() {
    let mut engine = MockEngine::in_mode(ModeKind::Normal);
    engine.map(RemapMode::Normal, "J", "<Down>");
    engine.map(RemapMode::Normal, "<Up>", "k");
    let host = completion_popup();
    let quirks = QuirkTable::default();
    assert_eq!(
        route(&engine, &host, &quirks, "J"),
        Route::Host(Deferral::IntelliSense)
    );
    assert_eq!(route(&engine, &host, &quirks, "<Up>"), Route::Engine);
}

#[test]
fn cooperating_extension_defers_navigation_pessimistically() {
    let engine = MockEngine::in_mode(ModeKind::Normal);
    let host = MockHost::default();
    assert_eq!(
        route(&engine, &host, &QuirkTable::installed(), "<Down>"),
        Route::Host(Deferral::CooperatingExtension)
    );
    assert_eq!(
        route(&engine, &host, &QuirkTable::installed(), "j"),
        Route::Engine
    );
    assert_eq!(
        route(&engine, &host, &QuirkTable::default(), "<Down>"),
        Route::Engine
    );
    let opted_out = QuirkTable {
        defer_navigation: false,
        ..QuirkTable::installed()
    };
    assert_eq!(route(&engine, &host, &opted_out, "<Down>"), Route::Engine);
}

#[test]
fn visible_popup_outranks_extension_rule() {
    let engine = MockEngine::in_mode(ModeKind::Normal);
    let host = completion_popup();
    assert_eq!(
        route(&engine, &host, &QuirkTable::installed(), "<Tab>"),
        Route::Host(Deferral::IntelliSense)
    );
}

#[test]
fn route_has_no_side_effects() {
    let mut engine = MockEngine::in_mode(ModeKind::Normal);
    engine.word_completion = true;
    let host = completion_popup();
    let quirks = QuirkTable::installed();
    let policy = ArbitrationPolicy::new(&quirks);
    for _ in 0..3 {
        assert_eq!(
            policy.route(&engine, &host, KeyEvent::ENTER),
            Route::Host(Deferral::IntelliSense)
        );
    }
    assert!(engine.word_completion);
    assert!(engine.processed.is_empty());
    assert!(host.queries.is_empty());
}

#[test]
fn query_class_follows_route() {
    let engine = MockEngine::in_mode(ModeKind::Insert);
    let host = completion_popup();
    let quirks = QuirkTable::default();
    let policy = ArbitrationPolicy::new(&quirks);
    assert_eq!(
        policy.query_class(&engine, &host, KeyEvent::char('a')),
        QueryClass::Enable
    );
    assert_eq!(
        policy.query_class(&engine, &host, KeyEvent::TAB),
        QueryClass::PassOn
    );
}

#[test]
fn settle_dismisses_completion_for_popup_deferrals_only() {
    let quirks = QuirkTable::default();
    let policy = ArbitrationPolicy::new(&quirks);
    let mut engine = MockEngine::in_mode(ModeKind::Insert);

    engine.word_completion = true;
    policy.settle(&mut engine, Deferral::WordCompletion);
    policy.settle(&mut engine, Deferral::EngineDeclined);
    assert!(engine.word_completion);

    policy.settle(&mut engine, Deferral::IntelliSense);
    assert!(!engine.word_completion);
    engine.word_completion = true;
    policy.settle(&mut engine, Deferral::CooperatingExtension);
    assert!(!engine.word_completion);
    assert_eq!(engine.dismissals, 2);

    // Nothing to dismiss.
    policy.settle(&mut engine, Deferral::IntelliSense);
    assert_eq!(engine.dismissals, 2);
}

#[test]
fn exec_dismisses_lingering_completion_before_deferring() {
    let mut engine = MockEngine::in_mode(ModeKind::Normal);
    engine.word_completion = true;
    let mut f = filter(engine, completion_popup(), QuirkTable::default());

    // Query stays pure; the host answers for the popup.
    assert_eq!(query_key(&mut f, "<Down>"), CommandState::Unsupported);
    assert!(f.engine().word_completion);

    exec_key(&mut f, "<Down>");
    assert!(!f.engine().word_completion);
    assert!(f.engine().processed.is_empty());
    assert_eq!(f.host().execs.len(), 1);
}

#[test]
fn declined_key_is_never_enabled() {
    let modes = [
        ModeKind::Normal,
        ModeKind::Insert,
        ModeKind::Replace,
        ModeKind::VisualLine,
        ModeKind::Command,
        ModeKind::ExternalEdit,
    ];
    let tables = [
        QuirkTable::default(),
        QuirkTable::installed(),
        QuirkTable {
            escape: QuirkAction::Cooperate,
            enter: QuirkAction::Cooperate,
            backspace: QuirkAction::Cooperate,
            ..QuirkTable::installed()
        },
    ];
    for mode in modes {
        for quirks in tables {
            for k in ["<Esc>", "<CR>", "<BS>", "<Down>", "<Tab>", "a", "<C-r>"] {
                let mut engine = MockEngine::in_mode(mode);
                engine.declined.insert(key(k));
                let host = completion_popup();
                assert_eq!(
                    route(&engine, &host, &quirks, k),
                    Route::Host(Deferral::EngineDeclined),
                    "{mode:?} {k}"
                );

                let mut f = filter(engine, MockHost::default(), quirks);
                assert_ne!(
                    query_key(&mut f, k),
                    CommandState::Enabled,
                    "{mode:?} {quirks:?} {k}"
                );
                assert!(f.engine().processed.is_empty(), "{mode:?} {k}");
                assert!(f.discarded_key().is_empty(), "{mode:?} {k}");
                assert_eq!(f.host().queries.len(), 1, "{mode:?} {k}");
            }
        }
    }
}
