//! Integration tests for `scanward config` and command dispatch.

use std::fs;

use tempfile::TempDir;

use scanward_cli::cli::{Cli, Commands, ConfigAction, ConfigArgs, OutputFormat};
use scanward_cli::error::CliError;

fn cli(config: std::path::PathBuf, action: ConfigAction) -> Cli {
    Cli {
        config,
        log_level: None,
        output: OutputFormat::Json,
        command: Commands::Config(ConfigArgs { action }),
    }
}

#[tokio::test]
async fn test_config_validate_valid_toml() {
    // Given: A valid config file
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("scanward.toml");
    fs::write(
        &config_path,
        r#"
[general]
log_level = "debug"

[database]
root_dir = "/tmp/scanward-db"
update_interval_secs = 3600

[server]
port = 9991
"#,
    )
    .unwrap();

    // When: Validating
    let result = scanward_cli::run(cli(config_path, ConfigAction::Validate)).await;

    // Then: Succeeds
    assert!(result.is_ok(), "valid config should validate: {result:?}");
}

#[tokio::test]
async fn test_config_validate_malformed_toml() {
    // Given: A malformed TOML file
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("bad.toml");
    fs::write(&config_path, "[general\nlog_level = \"info\"\n").unwrap();

    // When: Validating
    let err = scanward_cli::run(cli(config_path, ConfigAction::Validate))
        .await
        .unwrap_err();

    // Then: Configuration error, exit code 2
    assert!(matches!(err, CliError::Config(_)));
    assert_eq!(err.exit_code(), 2);
}

#[tokio::test]
async fn test_config_validate_rejects_short_update_interval() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("scanward.toml");
    fs::write(&config_path, "[database]\nupdate_interval_secs = 5\n").unwrap();

    let err = scanward_cli::run(cli(config_path, ConfigAction::Validate))
        .await
        .unwrap_err();
    assert_eq!(err.exit_code(), 2);
}

#[tokio::test]
async fn test_config_validate_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let err = scanward_cli::run(cli(
        temp_dir.path().join("absent.toml"),
        ConfigAction::Validate,
    ))
    .await
    .unwrap_err();
    assert!(matches!(err, CliError::Config(_)));
}

#[tokio::test]
async fn test_config_show_unknown_section() {
    // Given: A valid config file
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("scanward.toml");
    fs::write(&config_path, "[server]\nport = 9991\n").unwrap();

    // When: Showing a section that does not exist
    let err = scanward_cli::run(cli(
        config_path,
        ConfigAction::Show {
            section: Some("ebpf".to_owned()),
        },
    ))
    .await
    .unwrap_err();

    // Then: Command error naming the valid sections
    match err {
        CliError::Command(message) => assert!(message.contains("database")),
        other => panic!("expected command error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_config_show_known_section() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("scanward.toml");
    fs::write(&config_path, "[scan]\nmax_attempts = 3\n").unwrap();

    let result = scanward_cli::run(cli(
        config_path,
        ConfigAction::Show {
            section: Some("scan".to_owned()),
        },
    ))
    .await;
    assert!(result.is_ok());
}
