//! Post lifecycle commands: create, delete.

use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use console::style;
use dialoguer::{Confirm, Input};

use shutterfeed_core::repository::Backend;
use shutterfeed_types::post::{CreatePostRequest, MediaUpload, PostId};

use super::spinner;
use crate::state::AppState;

/// Content type from a file extension. Unknown extensions map to
/// `application/octet-stream`, which upload validation rejects.
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        _ => "application/octet-stream",
    }
}

/// Read a local file into an upload.
pub async fn read_upload(path: &Path) -> Result<MediaUpload> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("invalid file name: {}", path.display()))?
        .to_string();
    Ok(MediaUpload {
        file_name,
        content_type: content_type_for(path).to_string(),
        bytes,
    })
}

/// Publish a post, optionally with one image or video.
///
/// ```bash
/// sfeed post create --content "sunset" --media ~/Pictures/sunset.jpg
/// ```
pub async fn create_post<B: Backend>(
    state: &mut AppState<B>,
    content: Option<String>,
    media: Option<&Path>,
    json: bool,
) -> Result<()> {
    let content = match content {
        Some(c) => c,
        None => Input::<String>::new()
            .with_prompt("What's on your mind?")
            .interact_text()?,
    };
    let media = match media {
        Some(path) => Some(read_upload(path).await?),
        None => None,
    };

    let spinner = spinner("Posting...", json);
    let result = state
        .orchestrator
        .create_post(CreatePostRequest { content, media })
        .await;
    spinner.finish_and_clear();
    let post = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&post)?);
        return Ok(());
    }

    println!();
    println!("  {} Posted", style("✓").green().bold());
    println!("  ID: {}", style(post.id).dim());
    if let Some(url) = &post.media_url {
        println!("  Media: {}", style(url).dim());
    }
    println!();
    Ok(())
}

/// Delete one of your posts. `id` may be a full id or an unambiguous prefix.
pub async fn delete_post<B: Backend>(
    state: &mut AppState<B>,
    id: &str,
    force: bool,
    json: bool,
) -> Result<()> {
    let post_id = resolve_own_post(state, id).await?;

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete post {post_id}? Its media is removed too."))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    state.orchestrator.delete_post(&post_id).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({"deleted": true, "id": post_id.to_string()})
        );
    } else {
        println!("  {} Post deleted", style("✓").green().bold());
    }
    Ok(())
}

async fn resolve_own_post<B: Backend>(state: &AppState<B>, id: &str) -> Result<PostId> {
    if let Ok(post_id) = id.parse::<PostId>() {
        return Ok(post_id);
    }

    let detail = state.orchestrator.profile_detail().await?;
    let prefix = id.to_lowercase();
    let mut matches = detail
        .posts
        .iter()
        .filter(|p| p.id.to_string().starts_with(&prefix));
    match (matches.next(), matches.next()) {
        (Some(post), None) => Ok(post.id),
        (Some(_), Some(_)) => bail!("'{id}' matches more than one of your posts"),
        (None, _) => bail!("no post of yours matches '{id}'"),
    }
}
