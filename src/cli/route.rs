//! CLI route: single route table and run context. Dispatches to domain services and presentation.

use crate::cli::help::command_name;
use crate::cli::parse::{Commands, ConfigCommands};
use crate::cli::presentation::{
    format_config_output, format_run_summary, format_validation_errors, EventFormat,
    TerminalSink,
};
use crate::config::{ConfigLoader, StoryloomConfig};
use crate::error::StoryError;
use crate::gateway::{GenerationGateway, HttpGateway, ScriptedGateway};
use crate::orchestrator::GenerationOrchestrator;
use crate::pacing::TokioSleeper;
use crate::sink::PresentationSink;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Runtime context for CLI execution: workspace, config path and the loaded config.
pub struct RunContext {
    workspace_root: PathBuf,
    config_path: Option<PathBuf>,
    config: StoryloomConfig,
    color: bool,
}

impl RunContext {
    /// Load configuration for `workspace_root`, or from `config_path` alone when given.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, StoryError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };
        let color = config.logging.color && std::env::var_os("NO_COLOR").is_none();
        Ok(Self {
            workspace_root,
            config_path,
            config,
            color,
        })
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, StoryError> {
        let started = Instant::now();
        let name = command_name(command);
        debug!(
            command = %name,
            workspace = %self.workspace_root.display(),
            config = ?self.config_path,
            "executing command"
        );
        let result = match command {
            Commands::Generate {
                theme,
                format,
                offline,
            } => self.handle_generate(theme, format, *offline),
            Commands::Config { command } => self.handle_config(command),
        };
        info!(
            command = %name,
            ok = result.is_ok(),
            duration_ms = started.elapsed().as_millis() as u64,
            "command finished"
        );
        result
    }

    fn handle_generate(&self, theme: &str, format: &str, offline: bool) -> Result<String, StoryError> {
        let format = EventFormat::parse(format)?;
        self.validate_config()?;

        let gateway: Arc<dyn GenerationGateway> = if offline {
            Arc::new(ScriptedGateway::new())
        } else {
            Arc::new(HttpGateway::new(&self.config.gateway)?)
        };
        let run_id = format!("run-{}", Utc::now().format("%Y%m%dT%H%M%S%3f"));
        let sink: Arc<dyn PresentationSink> =
            Arc::new(TerminalSink::stdout(format, self.color, run_id));
        let orchestrator = GenerationOrchestrator::new(
            gateway,
            sink,
            Arc::new(TokioSleeper),
            self.config.pacing.clone(),
        );

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let report = runtime.block_on(orchestrator.start_run(theme))?;

        match format {
            EventFormat::Text => Ok(format_run_summary(&report, self.color)),
            EventFormat::Json => Ok(serde_json::to_string(&serde_json::json!({
                "theme": report.theme,
                "failed_scenes": report.failed_scenes,
                "cover": report.cover.is_some(),
                "music": report.music,
                "duration_ms": report.duration_ms,
            }))?),
        }
    }

    fn handle_config(&self, command: &ConfigCommands) -> Result<String, StoryError> {
        match command {
            ConfigCommands::Show { format } => format_config_output(&self.config, format),
            ConfigCommands::Validate => {
                self.validate_config()?;
                Ok("Configuration is valid".to_string())
            }
        }
    }

    fn validate_config(&self) -> Result<(), StoryError> {
        self.config
            .validate()
            .map_err(|errors| StoryError::ConfigError(format_validation_errors(&errors)))
    }
}
