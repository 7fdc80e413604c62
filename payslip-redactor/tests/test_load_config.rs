use payslip_redactor::load_config::{load_config, load_config_or_default, DEFAULT_MAX_UPLOAD_BYTES};
use serial_test::serial;
use std::env;
use std::fs::write;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
#[serial]
fn test_load_config_full_file() {
    env::remove_var("PORT");
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("redactor.yaml");
    let config_yaml = r#"
runs_dir: ./data/runs
server:
  host: 127.0.0.1
  port: 9090
  max_upload_bytes: 1048576
redactor:
  program: /usr/bin/python3
  script: tools/redact.py
  verbose: false
  timeout_secs: 600
  extra_args: ["--strict"]
"#;
    write(&config_path, config_yaml).unwrap();

    let config = load_config(&config_path).expect("Config should load");

    assert_eq!(config.runs_dir, dir.path().join("data/runs"));
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.server.max_upload_bytes, 1_048_576);
    assert_eq!(config.redactor.program, PathBuf::from("/usr/bin/python3"));
    assert_eq!(config.redactor.script, Some(dir.path().join("tools/redact.py")));
    assert!(!config.redactor.verbose);
    assert_eq!(config.redactor.timeout_secs, Some(600));
    assert_eq!(config.redactor.extra_args, vec!["--strict".to_string()]);
}

#[test]
#[serial]
fn test_load_config_partial_file_uses_defaults() {
    env::remove_var("PORT");
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("redactor.yaml");
    write(&config_path, "server:\n  port: 8123\n").unwrap();

    let config = load_config(&config_path).expect("Partial config should load");

    assert_eq!(config.server.port, 8123);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
    assert_eq!(config.runs_dir, dir.path().join("runs"));
    assert_eq!(config.redactor.program, PathBuf::from("python3"));
    assert!(config.redactor.verbose);
    let script = config.redactor.script.expect("default script");
    assert!(script.is_absolute(), "script should be made absolute: {script:?}");
    assert!(script.ends_with("payslip_universal_redactor.py"));
}

#[test]
#[serial]
fn test_program_path_resolved_but_bare_name_left_for_path_lookup() {
    env::remove_var("PORT");
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("redactor.yaml");
    write(&config_path, "redactor:\n  program: ./bin/redact.sh\n  script: ~\n").unwrap();

    let config = load_config(&config_path).expect("Config should load");

    assert!(config.redactor.program.is_absolute(), "got {:?}", config.redactor.program);
    assert!(config.redactor.program.ends_with("bin/redact.sh"));
    assert!(config.redactor.program.starts_with(std::path::absolute(dir.path()).unwrap()));
    assert_eq!(config.redactor.script, None);

    write(&config_path, "redactor:\n  program: python3\n").unwrap();
    let config = load_config(&config_path).expect("Config should load");
    assert_eq!(config.redactor.program, PathBuf::from("python3"));
}

#[test]
#[serial]
fn test_empty_file_is_all_defaults() {
    env::remove_var("PORT");
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("empty.yaml");
    write(&config_path, "").unwrap();

    let config = load_config(&config_path).expect("Empty config should load");

    assert_eq!(config.server.port, 8000);
}

#[test]
#[serial]
fn test_port_env_overrides_file_and_defaults() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("redactor.yaml");
    write(&config_path, "server:\n  port: 8123\n").unwrap();

    env::set_var("PORT", "9999");
    let from_file = load_config(&config_path);
    let from_defaults = load_config_or_default(None);
    env::remove_var("PORT");

    assert_eq!(from_file.unwrap().server.port, 9999);
    assert_eq!(from_defaults.unwrap().server.port, 9999);
}

#[test]
#[serial]
fn test_invalid_port_env_errors() {
    env::set_var("PORT", "eighty");
    let result = load_config_or_default(None);
    env::remove_var("PORT");

    let msg = result.unwrap_err().to_string();
    assert!(msg.contains("PORT"), "PORT error expected, got: {msg}");
}

#[test]
#[serial]
fn test_load_config_errors_for_invalid_file() {
    env::remove_var("PORT");
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("broken.yaml");
    write(&config_path, b"server: [:::").unwrap();

    let err = load_config(&config_path).unwrap_err();
    let msg = err.to_string();
    assert!(
        msg.contains("parse") || msg.contains("YAML"),
        "Parse error expected, got: {msg}"
    );
}

#[test]
#[serial]
fn test_load_config_errors_for_missing_file() {
    let err = load_config("/definitely/not/here.yaml").unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}
