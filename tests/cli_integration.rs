//! Testes de integração para a CLI do Padrão.

use std::fs;
use std::path::Path;
use std::process::Command;

use predicates::prelude::*;
use tempfile::TempDir;

/// Verifica que o binário pode ser executado.
fn padrao_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_padrao"))
}

/// Mesmo binário, com as asserções do assert_cmd, rodando dentro de `dir`.
fn padrao_in(dir: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::cargo_bin("padrao").expect("binary is built");
    cmd.current_dir(dir);
    cmd
}

/// Diretório inicializado com um projeto de exemplo em `project/`.
fn create_test_workspace() -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    padrao_in(temp_dir.path()).arg("init").assert().success();

    let project = temp_dir.path().join("project");
    fs::create_dir(&project).expect("Failed to create project dir");
    fs::write(project.join("a.py"), "x = get_name\ny = get_age\n").expect("Failed to write file");

    temp_dir
}

#[test]
fn test_version_command() {
    let output = padrao_bin()
        .arg("version")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("padrao"));
}

#[test]
fn test_help_command() {
    let output = padrao_bin()
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["init", "learn", "improve", "match", "insights", "export", "import", "reset", "doctor"] {
        assert!(stdout.contains(command), "missing command: {}", command);
    }
}

#[test]
fn test_invalid_command() {
    let output = padrao_bin()
        .arg("invalid-command-that-does-not-exist")
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
}

#[test]
fn test_verbose_and_quiet_flags() {
    for flag in ["-v", "-q"] {
        let output = padrao_bin()
            .arg(flag)
            .arg("version")
            .output()
            .expect("Failed to execute command");

        assert!(output.status.success());
    }
}

#[test]
fn test_init_creates_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("padrao.toml");

    let output = padrao_bin()
        .arg("init")
        .arg("--path")
        .arg(temp_dir.path())
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "init command failed");
    assert!(config_path.exists(), "Config file was not created");
    assert!(temp_dir.path().join(".padrao").is_dir());

    let content = fs::read_to_string(&config_path).expect("Failed to read config");
    assert!(content.contains("[general]"));
    assert!(content.contains("[learning]"));
    assert!(content.contains("[[patterns]]"));

    let gitignore = fs::read_to_string(temp_dir.path().join(".gitignore")).unwrap();
    assert!(gitignore.contains(".padrao/"));
}

#[test]
fn test_doctor_reports_invalid_catalog() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    fs::write(
        temp_dir.path().join("padrao.toml"),
        "[[patterns]]\nname = \"broken\"\nrule = \"get_(\"\n",
    )
    .unwrap();

    padrao_in(temp_dir.path())
        .arg("doctor")
        .assert()
        .success()
        .stdout(predicate::str::contains("Catálogo inválido"));
}

#[test]
fn test_match_prints_json() {
    let temp_dir = create_test_workspace();

    padrao_in(temp_dir.path())
        .args(["match", "project/a.py", "--pattern", "accessor"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"accessor\"").and(predicate::str::contains("get_age")));
}

#[test]
fn test_match_unknown_pattern_fails() {
    let temp_dir = create_test_workspace();

    padrao_in(temp_dir.path())
        .args(["match", "project/a.py", "--pattern", "nope"])
        .assert()
        .failure();
}

#[test]
fn test_learn_improve_cycle() {
    let temp_dir = create_test_workspace();

    padrao_in(temp_dir.path())
        .args(["learn", "project", "--project-id", "p1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("accessor - 2 matches"))
        .stdout(predicate::str::contains("Variações novas: 1"));

    // segunda vez é no-op
    padrao_in(temp_dir.path())
        .args(["learn", "project", "--project-id", "p1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Projeto já aprendido"));

    padrao_in(temp_dir.path())
        .arg("insights")
        .assert()
        .success()
        .stdout(predicate::str::contains("### accessor"));

    padrao_in(temp_dir.path())
        .args(["improve", "--pattern", "accessor", "--write"])
        .assert()
        .success()
        .stdout(predicate::str::contains("get_[a-zA-Z]+e"));

    let content = fs::read_to_string(temp_dir.path().join("padrao.toml")).unwrap();
    assert!(content.contains("get_[a-zA-Z]+e"));
}

#[test]
fn test_export_reset_import() {
    let temp_dir = create_test_workspace();

    padrao_in(temp_dir.path())
        .args(["learn", "project", "--project-id", "p1"])
        .assert()
        .success();

    padrao_in(temp_dir.path())
        .args(["export", "shared.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Variações: 1"));
    assert!(temp_dir.path().join("shared.json").exists());

    padrao_in(temp_dir.path())
        .args(["reset", "--yes"])
        .assert()
        .success();

    padrao_in(temp_dir.path())
        .arg("insights")
        .assert()
        .success()
        .stdout(predicate::str::contains("Nada aprendido ainda"));

    padrao_in(temp_dir.path())
        .args(["import", "shared.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Variações importadas: 1"));
}
