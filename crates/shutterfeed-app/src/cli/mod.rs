//! CLI command definitions for the `sfeed` binary.
//!
//! Uses clap derive macros for argument parsing. Each command module renders
//! one orchestrator view, either as styled text or as JSON.

pub mod auth;
pub mod feed;
pub mod post;
pub mod profile;
pub mod setup;
pub mod status;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use indicatif::{ProgressBar, ProgressStyle};

/// A photo and video feed in your terminal.
#[derive(Parser)]
#[command(name = "sfeed", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an account and sign in.
    Signup {
        /// Account email.
        #[arg(long)]
        email: Option<String>,

        /// Password (prompted when omitted).
        #[arg(long, env = "SFEED_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Password confirmation (prompted when omitted).
        #[arg(long)]
        confirm: Option<String>,
    },

    /// Sign in with email and password.
    #[command(alias = "signin")]
    Login {
        /// Account email.
        #[arg(long)]
        email: Option<String>,

        /// Password (prompted when omitted).
        #[arg(long, env = "SFEED_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Sign out and forget the stored session.
    #[command(alias = "signout")]
    Logout,

    /// Show the session, profile, and current screen.
    Status,

    /// Complete profile setup.
    Setup {
        /// Username (lowercase letters, digits, underscores).
        #[arg(long)]
        username: Option<String>,

        /// Display name.
        #[arg(long)]
        full_name: Option<String>,

        /// Short bio (max 150 characters).
        #[arg(long)]
        bio: Option<String>,

        /// Avatar image URL.
        #[arg(long)]
        avatar_url: Option<String>,
    },

    /// Show the feed, newest first.
    #[command(alias = "home")]
    Feed {
        /// Keep running and redraw when posts change.
        #[arg(long, short)]
        watch: bool,
    },

    /// Create or delete posts.
    Post {
        #[command(subcommand)]
        action: PostCommand,
    },

    /// Show your profile with your posts.
    Profile,

    /// Upload a new avatar image.
    Avatar {
        /// Image file to upload.
        path: PathBuf,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum PostCommand {
    /// Publish a post.
    Create {
        /// Post text.
        #[arg(long)]
        content: Option<String>,

        /// Image or video file to attach.
        #[arg(long)]
        media: Option<PathBuf>,
    },

    /// Delete one of your posts and its media.
    #[command(alias = "rm")]
    Delete {
        /// Post id.
        id: String,

        /// Skip confirmation prompt.
        #[arg(long)]
        force: bool,
    },
}

/// Cyan spinner for a slow backend call. Hidden in JSON mode.
pub fn spinner(message: &str, hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Render a timestamp as a coarse relative age ("5m", "3h", "2d").
pub fn relative_age(at: chrono::DateTime<chrono::Utc>, now: chrono::DateTime<chrono::Utc>) -> String {
    let secs = (now - at).num_seconds().max(0);
    match secs {
        0..60 => format!("{secs}s"),
        60..3_600 => format!("{}m", secs / 60),
        3_600..86_400 => format!("{}h", secs / 3_600),
        _ => format!("{}d", secs / 86_400),
    }
}
