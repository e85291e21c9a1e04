//! Integration tests for the offline CLI commands.
//!
//! `plan`, `status` and `tile` never contact the map source, so they run
//! against a temporary cache directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

/// Write a config for a 4x2 grid of 64x64 tiles (1 pixel per degree).
fn write_config(dir: &Path) -> PathBuf {
    let config = format!(
        "[storage]\n\
         directory = {root}\n\
         extension = .raw\n\
         content_type = image/raw-s16\n\
         [tile]\n\
         width = 64\n\
         height = 64\n\
         [raster]\n\
         pixels_per_degree = 1\n\
         data_type = s16\n\
         invalid_value = -9999\n\
         [logging]\n\
         file = {log}\n",
        root = dir.join("cache").display(),
        log = dir.join("logs").join("wmscache.log").display(),
    );
    let path = dir.join("config.ini");
    fs::write(&path, config).unwrap();
    path
}

fn run_cli(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_wmscache"))
        .arg("--config")
        .arg(config)
        .args(args)
        .output()
        .expect("Failed to execute CLI command")
}

fn stdout_of(output: &Output, context: &str) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("{} failed:\nstdout: {}\nstderr: {}", context, stdout, stderr);
    }
    stdout
}

#[test]
fn test_plan_prints_levels() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path());

    let stdout = stdout_of(&run_cli(&config, &["plan"]), "plan");

    let levels = stdout
        .lines()
        .find(|line| line.trim_start().starts_with("Levels:"))
        .expect("levels row");
    assert_eq!(levels.split_whitespace().last(), Some("2"));
    assert!(!temp.path().join("cache").exists());
}

#[test]
fn test_status_on_empty_cache() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path());

    let stdout = stdout_of(&run_cli(&config, &["status"]), "status");

    assert!(stdout.contains("Total tiles:"), "{}", stdout);
    assert!(stdout.contains("incomplete"), "{}", stdout);
    assert!(temp.path().join("cache").is_dir());
}

#[test]
fn test_tile_reports_pending_and_empty() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path());

    let stdout = stdout_of(&run_cli(&config, &["tile", "1", "1", "0"]), "tile");
    assert!(stdout.contains("pending"), "{}", stdout);

    let row = temp.path().join("cache").join("1").join("0");
    fs::create_dir_all(&row).unwrap();
    fs::write(row.join("1.raw"), b"").unwrap();

    let stdout = stdout_of(&run_cli(&config, &["tile", "1", "1", "0"]), "tile");
    assert!(stdout.contains("empty"), "{}", stdout);
    assert!(stdout.contains("no valid samples"), "{}", stdout);
}

#[test]
fn test_tile_outside_grid_fails() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path());

    let output = run_cli(&config, &["tile", "1", "9", "0"]);

    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(1));
}
