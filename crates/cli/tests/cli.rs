use assert_cmd::Command;
use std::fs;
use tempfile::TempDir;

fn corpus(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (path, text) in files {
        let path = dir.path().join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }
    dir
}

fn marker_index() -> Command {
    let mut cmd = Command::cargo_bin("marker-index").unwrap();
    cmd.env("RUST_LOG", "warn");
    cmd
}

#[test]
fn scan_prints_the_requested_view_as_json() {
    let dir = corpus(&[
        ("a.html", r#"<p i18n="@@greeting">Hello</p>"#),
        ("nested/b.html", r#"<img i18n-alt="@@logo" alt="Logo">"#),
        ("notes.txt", r#"<p i18n="@@ignored">x</p>"#),
    ]);

    let output = marker_index()
        .args(["scan", "--view", "by-file"])
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let view: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let documents: Vec<&str> = view.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(documents, vec!["a.html", "nested/b.html"]);
    assert_eq!(view["a.html"][0]["id"], "greeting");
    assert_eq!(view["a.html"][0]["value"], "Hello");
    assert_eq!(view["nested/b.html"][0]["id"], "logo");
}

#[test]
fn check_exits_nonzero_on_mismatched_values() {
    let dir = corpus(&[
        ("a.html", r#"<p i18n="@@title">Welcome</p>"#),
        ("b.html", r#"<h1 i18n="@@title">Welcome back</h1>"#),
    ]);

    let output = marker_index().arg("check").arg(dir.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("a.html:1:1: error [title]"), "{stdout}");
    assert!(stdout.contains("b.html:1:1: error [title]"), "{stdout}");
    assert!(stdout.contains("0 ok, 0 warnings, 2 errors"), "{stdout}");
}

#[test]
fn check_passes_with_warnings_only() {
    let dir = corpus(&[("a.html", r#"<p i18n="@@bold">Some <b>bold</b> text</p>"#)]);

    let output = marker_index()
        .args(["check", "--json"])
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["generation"], 1);
    assert_eq!(report["summary"]["warning"], 1);
    assert_eq!(report["diagnostics"][0]["state"], "warning");
}

#[test]
fn config_file_in_root_narrows_the_corpus() {
    let dir = corpus(&[
        (".marker-index.toml", "include = [\"app/**/*.html\"]\n"),
        ("app/a.html", r#"<p i18n="@@kept">x</p>"#),
        ("legacy/b.html", r#"<p i18n="@@dropped">y</p>"#),
    ]);

    let output = marker_index()
        .args(["scan", "--view", "by-id"])
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let view: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(view.get("kept").is_some());
    assert!(view.get("dropped").is_none());
}

#[test]
fn missing_root_is_reported() {
    let output = marker_index()
        .args(["scan", "/definitely/not/a/corpus"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("not accessible"), "{stderr}");
}
