//! CLI smoke tests for the colearnhub binary

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use tempfile::TempDir;

fn colearnhub(args: &[&str]) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_colearnhub"));
    cmd.args(args)
        .env_remove("APP__BACKEND__URL")
        .env_remove("COLEARNHUB_PASSWORD")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    cmd
}

fn run_colearnhub(args: &[&str]) -> std::process::Output {
    colearnhub(args).output().expect("Failed to execute colearnhub")
}

fn run_colearnhub_with_password_env(args: &[&str]) -> std::process::Output {
    colearnhub(args)
        .env("COLEARNHUB_PASSWORD", "p@ss1234")
        .output()
        .expect("Failed to execute colearnhub")
}

fn run_colearnhub_with_stdin(args: &[&str], input: &str) -> std::process::Output {
    let mut child = colearnhub(args)
        .stdin(Stdio::piped())
        .spawn()
        .expect("Failed to spawn colearnhub");
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(input.as_bytes())
        .expect("Failed to write stdin");
    child.wait_with_output().expect("Failed to wait for colearnhub")
}

/// Config rooted in a temp dir so nothing is written to the real home.
fn write_config(dir: &Path, extra: &str) -> String {
    let path = dir.join("config.yaml");
    let yaml = format!(
        r#"
app:
  home_dir: "{}"
logging:
  default:
    console_level: warn
    file: "logs/colearnhub.log"
    file_level: info
{extra}
"#,
        dir.join("home").display()
    );
    std::fs::write(&path, yaml).expect("Failed to write config");
    path.to_string_lossy().to_string()
}

const ANA: &[&str] = &[
    "signup",
    "--name",
    "Ana Silva",
    "--email",
    "ana@x.com",
    "--birth-date",
    "2000-01-01",
    "--country",
    "1",
    "--username",
    "anas",
];

#[test]
fn test_cli_help_command() {
    let output = run_colearnhub(&["--help"]);
    assert!(output.status.success(), "Help command should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("colearnhub"), "Should contain binary name");
    assert!(stdout.contains("Usage:"), "Should contain usage information");
    assert!(stdout.contains("signup"), "Should contain 'signup' subcommand");
    assert!(stdout.contains("sign-in"), "Should contain 'sign-in' subcommand");
    assert!(stdout.contains("check"), "Should contain 'check' subcommand");
    assert!(stdout.contains("--mock"), "Should mention mock option");
}

#[test]
fn test_cli_version_command() {
    let output = run_colearnhub(&["--version"]);
    assert!(output.status.success(), "Version command should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("colearnhub"));
    assert!(stdout.chars().any(|c| c.is_ascii_digit()));
}

#[test]
fn test_cli_invalid_command() {
    let output = run_colearnhub(&["invalid-command"]);
    assert!(!output.status.success(), "Invalid command should fail");
}

#[test]
fn test_cli_missing_config_file() {
    let output = run_colearnhub(&["--config", "/nonexistent/config.yaml", "check"]);
    assert!(!output.status.success(), "Should fail with missing config");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Config file not found"), "stderr: {stderr}");
}

#[test]
fn test_cli_invalid_yaml() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("invalid.yaml");
    std::fs::write(&config_path, "invalid: yaml: content: [unclosed").unwrap();

    let output = run_colearnhub(&["--config", config_path.to_str().unwrap(), "check"]);
    assert!(!output.status.success(), "Should fail with invalid YAML");
}

#[test]
fn test_cli_check_with_backend() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(
        temp_dir.path(),
        r#"backend:
  url: "https://project.example.co"
  api_key: "anon-secret"
modules:
  accounts:
    default_role: student"#,
    );

    let output = run_colearnhub(&["--config", &config, "check"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Configuration check passed"));
    assert!(stdout.contains("https://project.example.co"));
    assert!(stdout.contains("<redacted>"));
    assert!(!stdout.contains("anon-secret"), "api key must not be printed");
}

#[test]
fn test_cli_check_rejects_bad_module_config() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(
        temp_dir.path(),
        r#"modules:
  accounts:
    default_role: tutor"#,
    );

    let output = run_colearnhub(&["--config", &config, "check"]);
    assert!(!output.status.success());
}

#[test]
fn test_cli_print_config() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(temp_dir.path(), "");

    let output = run_colearnhub(&["--config", &config, "--print-config"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("home_dir"));
}

#[test]
fn test_cli_signup_with_mock_prints_profile() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(temp_dir.path(), "");

    let mut args = vec!["--config", config.as_str(), "--mock"];
    args.extend_from_slice(ANA);
    let output = run_colearnhub_with_password_env(&args);
    assert!(
        output.status.success(),
        "signup failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let profile: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be the profile JSON");
    assert_eq!(profile["name"], "Ana Silva");
    assert_eq!(profile["username"], "anas");
    assert_eq!(profile["country"], 1);
    assert_eq!(profile["birth_date"], "2000-01-01");
    assert!(profile["id"].is_string());
    assert!(profile.get("password").is_none());
}

#[test]
fn test_cli_signup_reports_missing_fields() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(temp_dir.path(), "");

    let output = run_colearnhub(&[
        "--config",
        &config,
        "--mock",
        "signup",
        "--name",
        "Ana Silva",
        "--email",
        "ana@x.com",
        "--birth-date",
        "01/01/2000",
        "--username",
        "anas",
        "--password",
        "p@ss1234",
    ]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("birth_date"), "stderr: {stderr}");
}

#[test]
fn test_cli_signup_without_backend_is_a_config_error() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(temp_dir.path(), "");

    let mut args = vec!["--config", config.as_str()];
    args.extend_from_slice(ANA);
    let output = run_colearnhub_with_password_env(&args);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No backend configured"), "stderr: {stderr}");
}

#[test]
fn test_cli_signup_reads_password_from_stdin() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(temp_dir.path(), "");

    let mut args = vec!["--config", config.as_str(), "--mock"];
    args.extend_from_slice(ANA);
    let output = run_colearnhub_with_stdin(&args, "p@ss1234\n");
    assert!(
        output.status.success(),
        "signup failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let profile: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(profile["username"], "anas");
}

#[test]
fn test_cli_signup_without_password_fails() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(temp_dir.path(), "");

    let mut args = vec!["--config", config.as_str(), "--mock"];
    args.extend_from_slice(ANA);
    let output = run_colearnhub(&args);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No password given"), "stderr: {stderr}");
}

#[test]
fn test_cli_help_hides_password_env_value() {
    let output = colearnhub(&["signup", "--help"])
        .env("COLEARNHUB_PASSWORD", "hunter2-secret")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("COLEARNHUB_PASSWORD"));
    assert!(!stdout.contains("hunter2-secret"));
}

#[test]
fn test_cli_sign_in_with_mock_rejects_unknown_account() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(temp_dir.path(), "");

    let output = run_colearnhub_with_stdin(
        &["--config", &config, "--mock", "sign-in", "--email", "ana@x.com"],
        "p@ss1234\n",
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Sign-in failed"), "stderr: {stderr}");
}
