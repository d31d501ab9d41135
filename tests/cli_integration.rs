//! Integration tests for the command-line interface.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const SOURCE: &str = "int foo(void);\n\nint foo(void)\n{\n    return 0;\n}\n";
const REWRITTEN: &str = "int foo();\n\nint foo()\n{\n    return 0;\n}\n";

fn bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_remove-void-args"))
}

/// Workspace with a source file and a build directory holding
/// compile_commands.json for it.
fn setup_workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("src");
    let build = dir.path().join("build");
    fs::create_dir_all(&src).unwrap();
    fs::create_dir_all(&build).unwrap();

    let file = src.join("main.cpp");
    fs::write(&file, SOURCE).unwrap();

    let db = serde_json::json!([{
        "directory": build,
        "file": file,
        "command": format!("c++ -std=c++17 -c {}", file.display()),
    }]);
    fs::write(
        build.join("compile_commands.json"),
        serde_json::to_string_pretty(&db).unwrap(),
    )
    .unwrap();

    dir
}

fn run(dir: &Path, args: &[&str]) -> Output {
    bin().current_dir(dir).args(args).output().unwrap()
}

#[test]
fn help_lists_arguments() {
    let output = bin().arg("--help").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("BUILD_PATH"));
    assert!(stdout.contains("--dry-run"));
}

#[test]
fn rewrites_file_from_compile_commands() {
    let dir = setup_workspace();
    let output = run(dir.path(), &["build", "src/main.cpp"]);

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let content = fs::read_to_string(dir.path().join("src/main.cpp")).unwrap();
    assert_eq!(content, REWRITTEN);
}

#[test]
fn dry_run_leaves_file_untouched() {
    let dir = setup_workspace();
    let output = run(dir.path(), &["build", "src/main.cpp", "--dry-run", "--diff"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("DRY RUN"));
    assert!(stdout.contains("+int foo();"));

    let content = fs::read_to_string(dir.path().join("src/main.cpp")).unwrap();
    assert_eq!(content, SOURCE);
}

#[test]
fn second_run_changes_nothing() {
    let dir = setup_workspace();
    assert!(run(dir.path(), &["build", "src/main.cpp"]).status.success());
    let output = run(dir.path(), &["build", "src/main.cpp"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("edits in 0 files"));
    let content = fs::read_to_string(dir.path().join("src/main.cpp")).unwrap();
    assert_eq!(content, REWRITTEN);
}

#[test]
fn missing_database_fails() {
    let dir = setup_workspace();
    let output = run(dir.path(), &["src", "src/main.cpp"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("compilation database"));

    let content = fs::read_to_string(dir.path().join("src/main.cpp")).unwrap();
    assert_eq!(content, SOURCE);
}

#[test]
fn file_missing_from_database_fails() {
    let dir = setup_workspace();
    fs::write(dir.path().join("src/other.cpp"), SOURCE).unwrap();
    let output = run(dir.path(), &["build", "src/main.cpp", "src/other.cpp"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no compile command"));

    // Nothing is written when any lookup fails
    let content = fs::read_to_string(dir.path().join("src/main.cpp")).unwrap();
    assert_eq!(content, SOURCE);
}

#[test]
fn fixed_command_line_database() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.cpp"), SOURCE).unwrap();

    let output = run(dir.path(), &["unused-build-dir", "a.cpp", "--", "-std=c++17"]);

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let content = fs::read_to_string(dir.path().join("a.cpp")).unwrap();
    assert_eq!(content, REWRITTEN);
}

#[test]
fn export_fixes_writes_json() {
    let dir = setup_workspace();
    let output = run(
        dir.path(),
        &["build", "src/main.cpp", "--dry-run", "--export-fixes", "fixes.json"],
    );
    assert!(output.status.success());

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("fixes.json")).unwrap()).unwrap();
    let replacements = json["files"][0]["replacements"].as_array().unwrap();
    assert_eq!(replacements.len(), 2);
    assert_eq!(replacements[0]["replacement_text"], "int foo()");
}
