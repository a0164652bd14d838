//! CLI domain: parse, route, help, output, and presentation only.
//! No orchestration logic; the route table hands work to the orchestrator.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::command_name;
pub use output::map_error;
pub use parse::{Cli, Commands, ConfigCommands};
pub use presentation::{
    format_config_output, format_run_summary, format_validation_errors, EventFormat,
    RunEventRecord, TerminalSink,
};
pub use route::RunContext;
