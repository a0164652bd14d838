//! CLI presentation: live event rendering and end-of-command formatters.

mod events;
mod summary;

pub use events::{EventFormat, RunEventRecord, TerminalSink};
pub use summary::{format_config_output, format_run_summary, format_validation_errors};
