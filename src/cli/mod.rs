//! CLI layer - Command-line interface
//!
//! Contains argument parsing, output formatting, signal handling,
//! the bridge socket transport and the subcommand runners.

pub mod app;
pub mod args;
pub mod config_cmd;
pub mod ipc;
pub mod presenter;
pub mod send_cmd;
pub mod serve;
pub mod signals;
pub mod transcode_cmd;

// Re-export commonly used types
pub use app::{load_merged_config, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE_ERROR};
pub use args::{Cli, Commands, ConfigAction, SendArgs, ServeArgs, TranscodeDirection};
pub use presenter::Presenter;
pub use serve::run_server;
