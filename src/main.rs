//! voice-bridge CLI entry point

use std::process::ExitCode;

use clap::Parser;

use voice_bridge::cli::{
    app::{init_tracing, load_merged_config, EXIT_ERROR, EXIT_USAGE_ERROR},
    args::{Cli, Commands},
    config_cmd::handle_config_command,
    ipc::{ReplyStatus, SocketPath},
    presenter::Presenter,
    send_cmd::handle_send_command,
    serve::run_server,
    transcode_cmd::handle_transcode_command,
};
use voice_bridge::domain::config::AppConfig;
use voice_bridge::domain::error::ConfigError;
use voice_bridge::infrastructure::XdgConfigStore;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let mut presenter = Presenter::new();

    let cli_config = match &cli.command {
        Commands::Serve(args) => AppConfig {
            storage_dir: args.storage_dir.clone(),
            bundle_dir: args.bundle_dir.clone(),
            socket_path: args.socket.clone(),
            validate_playback: if args.no_validate { Some(false) } else { None },
            log_level: cli.log_level.clone(),
        },
        Commands::Send(args) => AppConfig {
            socket_path: args.socket.clone(),
            log_level: cli.log_level.clone(),
            ..Default::default()
        },
        _ => AppConfig {
            log_level: cli.log_level.clone(),
            ..Default::default()
        },
    };

    // Merge config
    let config = load_merged_config(cli_config).await;
    init_tracing(config.log_level_or_default());

    match cli.command {
        Commands::Serve(_) => run_server(config).await,
        Commands::Send(args) => {
            let socket = SocketPath::new(config.socket_path_or_default());
            match handle_send_command(args, socket, &presenter).await {
                Ok(ReplyStatus::Ok) => ExitCode::SUCCESS,
                Ok(ReplyStatus::Error) => ExitCode::from(EXIT_ERROR),
                Err(e) => {
                    presenter.error(&e);
                    ExitCode::from(EXIT_ERROR)
                }
            }
        }
        Commands::Transcode { direction, path } => {
            match handle_transcode_command(direction, path, &mut presenter).await {
                Ok(_) => ExitCode::SUCCESS,
                Err(e) => {
                    presenter.error(&e.to_string());
                    ExitCode::from(EXIT_ERROR)
                }
            }
        }
        Commands::Config { action } => {
            let store = XdgConfigStore::new();
            match handle_config_command(action, &store, &presenter).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(e @ ConfigError::ValidationError { .. }) => {
                    presenter.error(&e.to_string());
                    ExitCode::from(EXIT_USAGE_ERROR)
                }
                Err(e) => {
                    presenter.error(&e.to_string());
                    ExitCode::from(EXIT_ERROR)
                }
            }
        }
    }
}
