//! Integration tests for layered configuration loading

use crate::integration::test_utils::with_env;
use std::fs;
use storyloom::config::{global_config_path, ConfigLoader, StoryloomConfig};
use tempfile::TempDir;

#[test]
fn test_defaults_when_no_files_exist() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path().join("ws");
    fs::create_dir_all(&workspace).unwrap();

    let config = with_env(&temp_dir, &[], || ConfigLoader::load(&workspace).unwrap());

    assert_eq!(config, StoryloomConfig::default());
}

#[test]
fn test_workspace_env_file_overrides_base_file() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path().join("ws");
    fs::create_dir_all(workspace.join("config")).unwrap();
    fs::write(
        workspace.join("config").join("config.toml"),
        r#"
[gateway]
base_url = "http://stories.internal:8080"

[pacing]
scene_spacing_ms = 1000
"#,
    )
    .unwrap();
    fs::write(
        workspace.join("config").join("staging.toml"),
        "[pacing]\nscene_spacing_ms = 250\n",
    )
    .unwrap();

    let config = with_env(&temp_dir, &[("STORYLOOM_ENV", "staging")], || {
        ConfigLoader::load(&workspace).unwrap()
    });

    assert_eq!(config.gateway.base_url, "http://stories.internal:8080");
    assert_eq!(config.pacing.scene_spacing_ms, 250);
    assert_eq!(config.pacing.scene_max_retries, 3);
}

#[test]
fn test_global_file_is_lowest_file_layer() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path().join("ws");
    fs::create_dir_all(workspace.join("config")).unwrap();
    fs::write(
        workspace.join("config").join("config.toml"),
        "[pacing]\nerror_retry_delay_ms = 10\n",
    )
    .unwrap();

    let config = with_env(&temp_dir, &[], || {
        let global = global_config_path().unwrap();
        fs::create_dir_all(global.parent().unwrap()).unwrap();
        fs::write(
            &global,
            "[pacing]\nerror_retry_delay_ms = 99\nrate_limit_base_ms = 500\n",
        )
        .unwrap();
        ConfigLoader::load(&workspace).unwrap()
    });

    assert_eq!(config.pacing.error_retry_delay_ms, 10);
    assert_eq!(config.pacing.rate_limit_base_ms, 500);
}

#[test]
fn test_environment_variables_override_files() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("storyloom.toml");
    fs::write(
        &config_file,
        "[pacing]\nscene_max_retries = 5\n\n[gateway]\nbase_url = \"http://file:1\"\n",
    )
    .unwrap();

    let config = with_env(
        &temp_dir,
        &[
            ("STORYLOOM__PACING__SCENE_MAX_RETRIES", "7"),
            ("STORYLOOM__GATEWAY__BASE_URL", "https://env.example.com"),
        ],
        || ConfigLoader::load_from_file(&config_file).unwrap(),
    );

    assert_eq!(config.pacing.scene_max_retries, 7);
    assert_eq!(config.gateway.base_url, "https://env.example.com");
}

#[test]
fn test_explicit_file_must_exist() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("nope.toml");

    let result = with_env(&temp_dir, &[], || ConfigLoader::load_from_file(&missing));

    assert!(result.is_err());
}

#[test]
fn test_loaded_config_validation_collects_errors() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("bad.toml");
    fs::write(
        &config_file,
        r#"
[gateway]
base_url = "localhost:5000"

[logging]
format = "xml"
"#,
    )
    .unwrap();

    let config = with_env(&temp_dir, &[], || {
        ConfigLoader::load_from_file(&config_file).unwrap()
    });
    let errors = config.validate().unwrap_err();

    assert_eq!(errors.len(), 2);
    assert!(errors[0].to_string().contains("http://"));
    assert!(errors[1].to_string().contains("xml"));
}
