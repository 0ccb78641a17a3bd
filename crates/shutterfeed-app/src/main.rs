//! Shutterfeed terminal client entry point.
//!
//! Binary name: `sfeed`
//!
//! Parses CLI arguments, loads config, opens the configured backend, resolves
//! the stored session, then dispatches to a command handler.

mod cli;
mod state;

use std::process::ExitCode;

use clap::Parser;
use clap_complete::generate;
use console::style;

use shutterfeed_core::repository::Backend;
use shutterfeed_infra::config::load_client_config;
use shutterfeed_infra::filesystem::resolve_data_dir;
use shutterfeed_infra::{HostedBackend, LocalBackend};
use shutterfeed_observe::tracing_setup::{init_tracing, shutdown_tracing};
use shutterfeed_types::config::BackendKind;
use shutterfeed_types::profile::ProfileEdits;

use cli::{Cli, Commands, PostCommand};
use state::AppState;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,shutterfeed_core=debug,shutterfeed_infra=debug",
        _ => "trace",
    };
    if let Err(e) = init_tracing(filter, cli.otel) {
        eprintln!("Warning: tracing setup failed: {e}");
    }

    let json = cli.json;
    let result = run(cli).await;
    shutdown_tracing();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if json {
                println!("{}", serde_json::json!({"error": format!("{e:#}")}));
            } else {
                eprintln!("  {} {e:#}", style("✗").red().bold());
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Shell completions don't need a backend
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "sfeed", &mut std::io::stdout());
        return Ok(());
    }

    let data_dir = resolve_data_dir();
    tokio::fs::create_dir_all(&data_dir).await?;
    let config = load_client_config(&data_dir).await;
    tracing::debug!(backend = %config.backend, data_dir = %data_dir.display(), "starting");

    match config.backend {
        BackendKind::Local => {
            let backend = LocalBackend::open(&data_dir, &config).await?;
            dispatch(AppState::init(backend, config, data_dir).await, cli).await
        }
        BackendKind::Hosted => {
            let backend = HostedBackend::connect(&data_dir, &config)?;
            dispatch(AppState::init(backend, config, data_dir).await, cli).await
        }
    }
}

async fn dispatch<B: Backend>(mut state: AppState<B>, cli: Cli) -> anyhow::Result<()> {
    let json = cli.json;
    match cli.command {
        Commands::Signup {
            email,
            password,
            confirm,
        } => cli::auth::signup(&mut state, email, password, confirm, json).await,

        Commands::Login { email, password } => {
            cli::auth::login(&mut state, email, password, json).await
        }

        Commands::Logout => cli::auth::logout(&mut state, json).await,

        Commands::Status => cli::status::status(&state, json).await,

        Commands::Setup {
            username,
            full_name,
            bio,
            avatar_url,
        } => {
            let edits = ProfileEdits {
                username: username.unwrap_or_default(),
                full_name,
                bio,
                avatar_url,
            };
            cli::setup::setup(&mut state, edits, json).await
        }

        Commands::Feed { watch } => cli::feed::feed(&mut state, watch, json).await,

        Commands::Post { action } => match action {
            PostCommand::Create { content, media } => {
                cli::post::create_post(&mut state, content, media.as_deref(), json).await
            }
            PostCommand::Delete { id, force } => {
                cli::post::delete_post(&mut state, &id, force, json).await
            }
        },

        Commands::Profile => cli::profile::show_profile(&mut state, json).await,

        Commands::Avatar { path } => cli::profile::change_avatar(&mut state, &path, json).await,

        Commands::Completions { .. } => Ok(()),
    }
}
