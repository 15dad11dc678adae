//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;

/// voice-bridge - voice recording and playback bridge
#[derive(Parser, Debug)]
#[command(name = "voice-bridge")]
#[command(version)]
#[command(about = "Voice recording and playback bridge with WAV/AMR transcoding")]
#[command(long_about = None)]
pub struct Cli {
    /// Tracing filter (overridden by RUST_LOG)
    #[arg(long, global = true, value_name = "FILTER")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the bridge server until SIGINT/SIGTERM
    Serve(ServeArgs),
    /// Send one command to a running bridge
    Send(SendArgs),
    /// Convert a file between WAV and AMR
    Transcode {
        /// Conversion direction
        #[arg(value_enum)]
        direction: TranscodeDirection,
        /// Source file; the target is its sibling with the other extension
        path: PathBuf,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Bridge socket path
    #[arg(long, value_name = "PATH")]
    pub socket: Option<String>,

    /// App-writable directory for recordings
    #[arg(long, value_name = "DIR")]
    pub storage_dir: Option<String>,

    /// Read-only directory searched first for relative playback sources
    #[arg(long, value_name = "DIR")]
    pub bundle_dir: Option<String>,

    /// Do not check that local playback sources exist
    #[arg(long)]
    pub no_validate: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct SendArgs {
    /// Bridge method, e.g. startPlayingAudio
    pub method: String,

    /// Positional arguments; JSON literals are parsed, anything else is a string
    #[arg(allow_negative_numbers = true)]
    pub args: Vec<String>,

    /// Bridge socket path
    #[arg(long, value_name = "PATH")]
    pub socket: Option<String>,

    /// Milliseconds to keep printing events after the reply
    #[arg(short = 'w', long, value_name = "MS", default_value_t = 0)]
    pub wait: u64,
}

impl SendArgs {
    /// Arguments as JSON values
    pub fn json_args(&self) -> Vec<Value> {
        self.args.iter().map(|arg| parse_arg(arg)).collect()
    }
}

/// `12` and `{"validate":false}` become JSON; `clip1` stays a string
pub fn parse_arg(arg: &str) -> Value {
    match serde_json::from_str::<Value>(arg) {
        Ok(value) => value,
        Err(_) => Value::String(arg.to_string()),
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum TranscodeDirection {
    WavToAmr,
    AmrToWav,
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "storage_dir",
    "bundle_dir",
    "socket_path",
    "validate_playback",
    "log_level",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use serde_json::json;

    #[test]
    fn cli_parses_serve_defaults() {
        let cli = Cli::parse_from(["voice-bridge", "serve"]);
        match cli.command {
            Commands::Serve(args) => {
                assert!(args.socket.is_none());
                assert!(args.storage_dir.is_none());
                assert!(!args.no_validate);
            }
            other => panic!("Expected serve, got {:?}", other),
        }
    }

    #[test]
    fn cli_parses_serve_flags() {
        let cli = Cli::parse_from([
            "voice-bridge",
            "serve",
            "--socket",
            "/tmp/vb.sock",
            "--storage-dir",
            "/data",
            "--no-validate",
        ]);
        let Commands::Serve(args) = cli.command else {
            panic!("Expected serve");
        };
        assert_eq!(args.socket.as_deref(), Some("/tmp/vb.sock"));
        assert_eq!(args.storage_dir.as_deref(), Some("/data"));
        assert!(args.no_validate);
    }

    #[test]
    fn cli_parses_send() {
        let cli = Cli::parse_from([
            "voice-bridge",
            "send",
            "seekToAudio",
            "clip1",
            "1500",
            "--wait",
            "200",
        ]);
        let Commands::Send(args) = cli.command else {
            panic!("Expected send");
        };
        assert_eq!(args.method, "seekToAudio");
        assert_eq!(args.wait, 200);
        assert_eq!(args.json_args(), vec![json!("clip1"), json!(1500)]);
    }

    #[test]
    fn send_args_keep_plain_words_as_strings() {
        assert_eq!(parse_arg("clip1"), json!("clip1"));
        assert_eq!(parse_arg("\"quoted\""), json!("quoted"));
        assert_eq!(parse_arg("0.5"), json!(0.5));
        assert_eq!(parse_arg(r#"{"validate":false}"#), json!({"validate": false}));
    }

    #[test]
    fn cli_parses_transcode() {
        let cli = Cli::parse_from(["voice-bridge", "transcode", "wav-to-amr", "memo.wav"]);
        match cli.command {
            Commands::Transcode { direction, path } => {
                assert_eq!(direction, TranscodeDirection::WavToAmr);
                assert_eq!(path, PathBuf::from("memo.wav"));
            }
            other => panic!("Expected transcode, got {:?}", other),
        }
    }

    #[test]
    fn cli_parses_config_set() {
        let cli = Cli::parse_from(["voice-bridge", "config", "set", "log_level", "debug"]);
        if let Commands::Config {
            action: ConfigAction::Set { key, value },
        } = cli.command
        {
            assert_eq!(key, "log_level");
            assert_eq!(value, "debug");
        } else {
            panic!("Expected Config Set command");
        }
    }

    #[test]
    fn global_log_level_after_subcommand() {
        let cli = Cli::parse_from(["voice-bridge", "serve", "--log-level", "debug"]);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn valid_config_keys() {
        assert!(is_valid_config_key("storage_dir"));
        assert!(is_valid_config_key("validate_playback"));
        assert!(!is_valid_config_key("api_key"));
    }

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }
}
