//! Runs the storyloom binary end to end with the offline gateway.

use std::path::Path;
use std::process::{Command, Output};
use storyloom::cli::RunEventRecord;
use tempfile::TempDir;

const FAST_PACING: &str = r#"
[pacing]
scene_spacing_ms = 0
error_retry_delay_ms = 0
rate_limit_base_ms = 0
"#;

fn storyloom(temp_dir: &TempDir, args: &[&str]) -> Output {
    let home = temp_dir.path().join("home");
    std::fs::create_dir_all(&home).unwrap();
    Command::new(env!("CARGO_BIN_EXE_storyloom"))
        .env("HOME", &home)
        .env("XDG_CONFIG_HOME", temp_dir.path().join("xdg-config"))
        .env("NO_COLOR", "1")
        .env_remove("STORYLOOM_LOG")
        .args(args)
        .output()
        .unwrap()
}

fn write_config(dir: &Path, body: &str) -> String {
    let path = dir.join("storyloom.toml");
    std::fs::write(&path, body).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn generate_offline_streams_json_events() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(temp_dir.path(), FAST_PACING);

    let output = storyloom(
        &temp_dir,
        &[
            "--quiet",
            "--config",
            &config,
            "generate",
            "--offline",
            "--theme",
            "pirates",
            "--format",
            "json",
        ],
    );

    assert!(
        output.status.success(),
        "generate should succeed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    let (summary, event_lines) = lines.split_last().unwrap();

    let records: Vec<RunEventRecord> = event_lines
        .iter()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(records.first().unwrap().event_type, "progress");
    assert_eq!(records.last().unwrap().event_type, "run_complete");
    assert!(records.windows(2).all(|w| w[1].seq == w[0].seq + 1));
    assert!(records.iter().all(|r| r.run == records[0].run));
    assert_eq!(
        records.iter().filter(|r| r.event_type == "scene_ready").count(),
        20
    );

    let summary: serde_json::Value = serde_json::from_str(summary).unwrap();
    assert_eq!(summary["theme"], "pirates");
    assert_eq!(summary["failed_scenes"], 0);
}

#[test]
fn generate_with_blank_theme_exits_non_zero() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(temp_dir.path(), FAST_PACING);

    let output = storyloom(
        &temp_dir,
        &["--quiet", "--config", &config, "generate", "--offline", "--theme", " "],
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Please enter a story theme."), "stderr={}", stderr);
}

#[test]
fn config_show_reflects_workspace_file() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path().join("ws");
    std::fs::create_dir_all(workspace.join("config")).unwrap();
    std::fs::write(
        workspace.join("config").join("config.toml"),
        "[gateway]\nbase_url = \"https://stories.example.com\"\n",
    )
    .unwrap();

    let output = storyloom(
        &temp_dir,
        &[
            "--quiet",
            "--workspace",
            workspace.to_str().unwrap(),
            "config",
            "show",
            "--format",
            "json",
        ],
    );

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["gateway"]["base_url"], "https://stories.example.com");
    assert_eq!(value["pacing"]["scene_max_retries"], 3);
}

#[test]
fn config_validate_fails_on_bad_values() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(temp_dir.path(), "[pacing]\nscene_max_retries = 0\n");

    let output = storyloom(&temp_dir, &["--quiet", "--config", &config, "config", "validate"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("scene_max_retries"));
}
