//! Profile detail and avatar commands.

use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use shutterfeed_core::repository::Backend;
use shutterfeed_types::view::Page;

use super::feed::media_label;
use super::post::read_upload;
use super::{relative_age, spinner};
use crate::state::AppState;

/// Show the signed-in user's profile and posts.
pub async fn show_profile<B: Backend>(state: &mut AppState<B>, json: bool) -> Result<()> {
    state.orchestrator.navigate(Page::ProfileDetail)?;
    let detail = state.orchestrator.profile_detail().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&detail)?);
        return Ok(());
    }

    let profile = &detail.profile;
    println!();
    println!(
        "  {} {}",
        style(profile.display_name()).bold(),
        style(format!("@{}", profile.username)).cyan()
    );
    if let Some(bio) = profile.bio.as_deref().filter(|b| !b.is_empty()) {
        println!("  {bio}");
    }
    println!(
        "  {} posts  {} followers  {} following",
        style(detail.stats.posts).bold(),
        style(detail.stats.followers).bold(),
        style(detail.stats.following).bold()
    );
    if let Some(url) = &profile.avatar_url {
        println!("  Avatar: {}", style(url).dim());
    }
    println!();

    if detail.posts.is_empty() {
        println!("  {}", style("No posts yet.").dim());
        println!();
        return Ok(());
    }

    let now = Utc::now();
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("ID").fg(Color::White),
        Cell::new("Post").fg(Color::White),
        Cell::new("Media").fg(Color::White),
        Cell::new("Age").fg(Color::White),
    ]);
    for post in &detail.posts {
        table.add_row(vec![
            Cell::new(post.id).fg(Color::DarkGrey),
            Cell::new(&post.content),
            Cell::new(media_label(post.media_type)),
            Cell::new(relative_age(post.created_at, now)).fg(Color::DarkGrey),
        ]);
    }
    println!("{table}");
    println!();
    Ok(())
}

/// Replace the avatar with a local image.
pub async fn change_avatar<B: Backend>(
    state: &mut AppState<B>,
    path: &Path,
    json: bool,
) -> Result<()> {
    let upload = read_upload(path).await?;

    let spinner = spinner("Uploading avatar...", json);
    let result = state.orchestrator.change_avatar(&upload).await;
    spinner.finish_and_clear();
    let profile = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
        return Ok(());
    }
    println!(
        "  {} Avatar updated: {}",
        style("✓").green().bold(),
        style(profile.avatar_url.unwrap_or_default()).dim()
    );
    Ok(())
}
