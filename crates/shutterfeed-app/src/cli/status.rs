//! Session and profile status command.

use anyhow::Result;
use console::style;

use shutterfeed_core::repository::Backend;
use shutterfeed_types::view::{ProfileState, SessionState};

use crate::state::AppState;

/// Display who is signed in, their profile, and which screen is active.
pub async fn status<B: Backend>(state: &AppState<B>, json: bool) -> Result<()> {
    let orchestrator = &state.orchestrator;
    let session = orchestrator.session().session();
    let profile = orchestrator.profile().profile();

    if json {
        let status = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "backend": state.config.backend.to_string(),
            "data_dir": state.data_dir.display().to_string(),
            "view": orchestrator.view(),
            "session": session.map(|s| serde_json::json!({
                "user_id": s.user_id,
                "email": s.email,
                "expires_at": s.expires_at,
            })),
            "profile": profile,
            "last_error": orchestrator.last_error(),
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Shutterfeed v{}",
        style("◉").bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!();

    println!("  {}", style("── Session ──").dim());
    match orchestrator.session() {
        SessionState::Present(s) => {
            println!("  Email:   {}", style(&s.email).cyan());
            println!("  User:    {}", style(s.user_id.short()).dim());
            if let Some(expires) = s.expires_at {
                println!(
                    "  Expires: {}",
                    style(expires.format("%Y-%m-%d %H:%M UTC")).dim()
                );
            }
        }
        SessionState::Absent => println!("  {}", style("Signed out").yellow()),
        SessionState::Pending => println!("  {}", style("Unknown").dim()),
    }
    println!();

    println!("  {}", style("── Profile ──").dim());
    match orchestrator.profile() {
        ProfileState::Complete(p) | ProfileState::Incomplete(p) => {
            println!("  Username: {}", style(format!("@{}", p.username)).bold());
            if let Some(name) = p.full_name.as_deref() {
                println!("  Name:     {name}");
            }
            let setup = if p.is_setup_complete {
                style("complete").green()
            } else {
                style("incomplete").yellow()
            };
            println!("  Setup:    {setup}");
        }
        ProfileState::Absent | ProfileState::Pending => {
            println!("  {}", style("Not loaded").dim());
        }
    }
    println!();

    println!("  {}", style("── Client ──").dim());
    println!("  Screen:   {}", style(orchestrator.view()).bold());
    println!("  Backend:  {}", state.config.backend);
    println!("  Data dir: {}", style(state.data_dir.display()).dim());
    if let Some(err) = orchestrator.last_error() {
        println!("  Error:    {}", style(err).red());
    }
    println!();

    Ok(())
}
