//! Configuration layering: defaults < TOML file < environment < CLI flags.

use std::fs;
use std::sync::Mutex;

use clap::Parser;
use drivedupe::cli::{Cli, Commands, OutputFormat};
use drivedupe::config::Config;
use drivedupe::duplicates::ResolveScope;
use tempfile::tempdir;

static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Clear all DRIVEDUPE_* environment variables to avoid interference.
fn clear_env() {
    for (key, _) in std::env::vars() {
        if key.starts_with("DRIVEDUPE_") {
            std::env::remove_var(key);
        }
    }
}

#[test]
fn test_load_defaults_without_file() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();

    let config: Config = Config::figment(None).extract().unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_load_from_toml() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
[drive]
api_base_url = "http://localhost:8080/drive/v3"
page_size = 250
timeout_secs = 5
token_file = "token.json"

[scan]
min_size = 1024
resolve = "duplicates"
output = "json"
"#,
    )
    .unwrap();

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.drive.api_base_url, "http://localhost:8080/drive/v3");
    assert_eq!(config.drive.page_size, 250);
    assert_eq!(config.drive.timeout_secs, 5);
    assert_eq!(config.drive.token_file.as_deref(), Some(std::path::Path::new("token.json")));
    assert_eq!(config.scan.min_size, Some(1024));
    assert_eq!(config.scan.resolve, ResolveScope::Duplicates);
    assert_eq!(config.scan.output, OutputFormat::Json);
}

#[test]
fn test_env_overrides_file() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[drive]\npage_size = 250\n").unwrap();

    std::env::set_var("DRIVEDUPE_DRIVE__PAGE_SIZE", "42");
    std::env::set_var("DRIVEDUPE_SCAN__OUTPUT", "csv");
    let config = Config::load(Some(&path));
    clear_env();

    let config = config.unwrap();
    assert_eq!(config.drive.page_size, 42);
    assert_eq!(config.scan.output, OutputFormat::Csv);
}

#[test]
fn test_cli_overrides_env() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();

    std::env::set_var("DRIVEDUPE_SCAN__RESOLVE", "duplicates");
    let config = Config::load(None);
    clear_env();
    let mut config = config.unwrap();
    assert_eq!(config.scan.resolve, ResolveScope::Duplicates);

    let cli = Cli::try_parse_from(["drivedupe", "scan", "--resolve", "all"]).unwrap();
    let Commands::Scan(args) = cli.command else {
        panic!("Expected Scan command");
    };
    config.apply_scan_args(&args).unwrap();
    assert_eq!(config.scan.resolve, ResolveScope::All);
}

#[test]
fn test_invalid_values_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");

    fs::write(&path, "[drive]\ntimeout_secs = 0\n").unwrap();
    assert!(Config::load(Some(&path)).is_err());

    fs::write(&path, "[scan]\nresolve = \"sometimes\"\n").unwrap();
    assert!(Config::load(Some(&path)).is_err());

    fs::write(&path, "not toml at all [").unwrap();
    assert!(Config::load(Some(&path)).is_err());
}

#[test]
fn test_save_then_load() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("drivedupe").join("config.toml");

    let mut config = Config::default();
    config.drive.page_size = 10;
    config.scan.max_size = Some(99);
    config.save(&path).unwrap();

    assert_eq!(Config::load(Some(&path)).unwrap(), config);
}
