//! Profile setup command.

use anyhow::{Result, bail};
use console::style;
use dialoguer::Input;

use shutterfeed_core::repository::Backend;
use shutterfeed_types::profile::ProfileEdits;
use shutterfeed_types::view::ActiveView;

use super::auth::print_next_step;
use super::spinner;
use crate::state::AppState;

/// Fill in the profile and unlock the feed.
///
/// ```bash
/// sfeed setup --username alice --full-name "Alice Liddell" --bio "down the hole"
/// ```
pub async fn setup<B: Backend>(
    state: &mut AppState<B>,
    edits: ProfileEdits,
    json: bool,
) -> Result<()> {
    match state.orchestrator.view() {
        ActiveView::Login => bail!("not signed in, run `sfeed login` first"),
        ActiveView::Loading => {
            // Bootstrap gave up earlier in this run; one manual retry.
            state.orchestrator.retry_bootstrap().await?;
        }
        _ => {}
    }

    let suggested = state
        .orchestrator
        .profile()
        .profile()
        .map(|p| p.username.clone())
        .unwrap_or_default();
    let edits = if edits.username.is_empty() && !json {
        ProfileEdits {
            username: Input::<String>::new()
                .with_prompt("Username")
                .default(suggested)
                .interact_text()?,
            ..edits
        }
    } else {
        edits
    };

    let spinner = spinner("Saving profile...", json);
    let result = state.orchestrator.complete_setup(&edits).await;
    spinner.finish_and_clear();
    let view = result?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "profile": state.orchestrator.profile().profile(),
                "view": view,
            }))?
        );
        return Ok(());
    }

    let username = state
        .orchestrator
        .profile()
        .profile()
        .map(|p| p.username.clone())
        .unwrap_or_default();
    println!();
    println!(
        "  {} Profile ready: {}",
        style("✓").green().bold(),
        style(format!("@{username}")).cyan().bold()
    );
    print_next_step(view);
    println!();
    Ok(())
}
