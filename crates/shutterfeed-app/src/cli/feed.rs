//! Feed command, with an optional live mode.

use anyhow::Result;
use chrono::Utc;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use shutterfeed_core::repository::Backend;
use shutterfeed_types::post::{FeedPost, MediaType};
use shutterfeed_types::view::{ActiveView, Page};

use super::{relative_age, spinner};
use crate::state::AppState;

/// Show the feed once, or keep redrawing it with `watch`.
///
/// ```bash
/// sfeed feed
/// sfeed feed --watch    # Ctrl+C to stop
/// ```
pub async fn feed<B: Backend>(state: &mut AppState<B>, watch: bool, json: bool) -> Result<()> {
    state.orchestrator.navigate(Page::Feed)?;

    let spinner = spinner("Loading feed...", json);
    let result = state.orchestrator.refresh_feed().await.map(|posts| posts.len());
    spinner.finish_and_clear();
    let count = result?;
    tracing::debug!(count, "feed loaded");

    render(state.orchestrator.feed(), json, watch)?;
    if !watch {
        return Ok(());
    }

    if !json {
        println!(
            "  {}",
            style("Watching for new posts. Press Ctrl+C to stop.").dim()
        );
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            next = state.orchestrator.next_event() => match next {
                Some(ActiveView::Feed) => render(state.orchestrator.feed(), json, watch)?,
                Some(ActiveView::Login) => {
                    if !json {
                        println!("  {} Signed out", style("!").yellow().bold());
                    }
                    break;
                }
                Some(view) => {
                    tracing::info!(%view, "view changed, leaving feed");
                    break;
                }
                None => break,
            },
        }
    }
    Ok(())
}

fn render(posts: &[FeedPost], json: bool, watch: bool) -> Result<()> {
    if json {
        // One compact document per redraw when watching.
        if watch {
            println!("{}", serde_json::to_string(posts)?);
        } else {
            println!("{}", serde_json::to_string_pretty(posts)?);
        }
        return Ok(());
    }

    if posts.is_empty() {
        println!();
        println!(
            "  {} No posts yet. Share one with: {}",
            style("i").blue().bold(),
            style("sfeed post create --content \"hello\"").yellow()
        );
        println!();
        return Ok(());
    }

    let now = Utc::now();
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Author").fg(Color::White),
        Cell::new("Post").fg(Color::White),
        Cell::new("Media").fg(Color::White),
        Cell::new("Age").fg(Color::White),
    ]);

    for item in posts {
        table.add_row(vec![
            Cell::new(format!("@{}", item.author_name())).fg(Color::Cyan),
            Cell::new(&item.post.content),
            Cell::new(media_label(item.post.media_type)),
            Cell::new(relative_age(item.post.created_at, now)).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} post{}",
        style(posts.len()).bold(),
        if posts.len() == 1 { "" } else { "s" }
    );
    println!();
    Ok(())
}

pub fn media_label(media_type: Option<MediaType>) -> &'static str {
    match media_type {
        Some(MediaType::Image) => "image",
        Some(MediaType::Video) => "video",
        None => "",
    }
}
