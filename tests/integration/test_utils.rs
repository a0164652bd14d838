//! Shared test utilities for integration tests
//!
//! Environment isolation for config loading, plus a harness wiring the
//! orchestrator to the scripted gateway, a recording sink and a recording sleeper.

use std::sync::{Arc, Mutex};
use storyloom::gateway::ScriptedGateway;
use storyloom::pacing::{PacingConfig, RecordingSleeper};
use storyloom::sink::RecordingSink;
use storyloom::GenerationOrchestrator;
use tempfile::TempDir;

/// Serializes environment mutation across tests in this binary
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Run `f` with XDG_CONFIG_HOME and HOME pointed into `test_dir` and the given
/// extra variables set; everything is restored afterwards.
pub fn with_env<F, R>(test_dir: &TempDir, vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());

    let config_home = test_dir.path().join("xdg-config");
    let home = test_dir.path().join("home");
    std::fs::create_dir_all(&config_home).unwrap();
    std::fs::create_dir_all(&home).unwrap();

    let mut touched: Vec<(String, Option<String>)> = Vec::new();
    let mut set = |key: &str, value: &str| {
        touched.push((key.to_string(), std::env::var(key).ok()));
        std::env::set_var(key, value);
    };
    set("XDG_CONFIG_HOME", config_home.to_str().unwrap());
    set("HOME", home.to_str().unwrap());
    for (key, value) in vars {
        set(key, value);
    }

    let result = f();

    for (key, original) in touched.into_iter().rev() {
        match original {
            Some(value) => std::env::set_var(&key, value),
            None => std::env::remove_var(&key),
        }
    }
    result
}

pub struct Harness {
    pub gateway: Arc<ScriptedGateway>,
    pub sink: Arc<RecordingSink>,
    pub sleeper: Arc<RecordingSleeper>,
    pub orchestrator: GenerationOrchestrator,
}

pub fn harness(gateway: ScriptedGateway) -> Harness {
    harness_with_pacing(gateway, PacingConfig::default())
}

pub fn harness_with_pacing(gateway: ScriptedGateway, pacing: PacingConfig) -> Harness {
    let gateway = Arc::new(gateway);
    let sink = Arc::new(RecordingSink::new());
    let sleeper = Arc::new(RecordingSleeper::new());
    let orchestrator =
        GenerationOrchestrator::new(gateway.clone(), sink.clone(), sleeper.clone(), pacing);
    Harness {
        gateway,
        sink,
        sleeper,
        orchestrator,
    }
}
