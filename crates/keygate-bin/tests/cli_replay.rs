use std::fs;
use std::process::Command;

fn keygate(trace: &str, config: &str) -> (bool, String, String) {
    let dir = tempfile::tempdir().unwrap();
    let trace_path = dir.path().join("trace.toml");
    let config_path = dir.path().join("keygate.toml");
    fs::write(&trace_path, trace).unwrap();
    fs::write(&config_path, config).unwrap();
    let out = Command::new(env!("CARGO_BIN_EXE_keygate"))
        .current_dir(dir.path())
        .arg("--config")
        .arg(&config_path)
        .arg(&trace_path)
        .output()
        .unwrap();
    (
        out.status.success(),
        String::from_utf8_lossy(&out.stdout).into_owned(),
        String::from_utf8_lossy(&out.stderr).into_owned(),
    )
}

#[test]
fn mapped_escape_and_undo() {
    let (ok, stdout, stderr) = keygate(
        "text = \"x\"\n\
         [[step]]\nkey = \"a\"\n\
         [[step]]\nkey = \"y\"\n\
         [[step]]\nkey = \"j\"\n\
         [[step]]\nkey = \"k\"\n\
         [[step]]\ncommand = \"undo\"\n",
        "[[keymap]]\nmode = \"insert\"\nlhs = \"jk\"\nrhs = \"<Esc>\"\n",
    );
    assert!(ok, "{stderr}");
    let lines: Vec<&str> = stdout.lines().collect();
    // Five steps, two phases each, plus the summary.
    assert_eq!(lines.len(), 12, "{stdout}");
    assert!(lines[5].contains("Pending"), "{stdout}");
    assert!(lines[7].contains("LeaveInsert"), "{stdout}");
    assert!(lines[7].contains("mode=Normal"), "{stdout}");
    assert!(lines[9].contains("Undo(1)"), "{stdout}");
    assert_eq!(lines[10], "document \"xy\"");
}

#[test]
fn popup_navigation_goes_to_host() {
    let (ok, stdout, stderr) = keygate(
        "mode = \"insert\"\nsurfaces = [\"completion\"]\n[[step]]\nkey = \"<Down>\"\n",
        "",
    );
    assert!(ok, "{stderr}");
    let lines: Vec<&str> = stdout.lines().collect();
    // The host's answer, and no engine action on either phase.
    assert!(lines[0].starts_with("query <Down>"), "{stdout}");
    assert!(lines[0].contains("Enabled"), "{stdout}");
    assert!(!lines[1].contains('['), "{stdout}");
}

#[test]
fn bad_trace_fails_with_step_index() {
    let (ok, _, stderr) = keygate("[[step]]\nkey = \"<Nope>\"\n", "");
    assert!(!ok);
    assert!(stderr.contains("step 0"), "{stderr}");
}
