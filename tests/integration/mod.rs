//! Integration tests for the storyloom generation orchestrator

mod cli_binary;
mod config_integration;
mod orchestration_flow;
mod retry_backoff;
mod test_utils;
