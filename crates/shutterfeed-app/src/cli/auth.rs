//! Account CLI commands: signup, login, logout.

use anyhow::Result;
use console::style;
use dialoguer::{Input, Password};
use secrecy::SecretString;

use shutterfeed_core::repository::Backend;
use shutterfeed_types::view::ActiveView;

use super::spinner;
use crate::state::AppState;

fn prompt_email(email: Option<String>) -> Result<String> {
    match email {
        Some(e) => Ok(e),
        None => Ok(Input::<String>::new().with_prompt("Email").interact_text()?),
    }
}

fn prompt_password(password: Option<String>, prompt: &str) -> Result<SecretString> {
    let password = match password {
        Some(p) => p,
        None => Password::new().with_prompt(prompt).interact()?,
    };
    Ok(SecretString::from(password))
}

/// Create an account. When the backend signs the new account in right away,
/// the profile is bootstrapped before returning.
///
/// # Examples
///
/// ```bash
/// # Interactive prompts
/// sfeed signup
///
/// # Script mode
/// sfeed signup --email a@b.com --password pw123456 --confirm pw123456
/// ```
pub async fn signup<B: Backend>(
    state: &mut AppState<B>,
    email: Option<String>,
    password: Option<String>,
    confirm: Option<String>,
    json: bool,
) -> Result<()> {
    let email = prompt_email(email)?;
    // A password given on the command line confirms itself unless --confirm
    // says otherwise.
    let (password, confirm) = match password {
        Some(p) => {
            let confirm = confirm.unwrap_or_else(|| p.clone());
            (SecretString::from(p), SecretString::from(confirm))
        }
        None => {
            let password = prompt_password(None, "Password")?;
            (password, prompt_password(confirm, "Confirm password")?)
        }
    };

    let spinner = spinner("Creating account...", json);
    let result = state
        .orchestrator
        .sign_up(&email, password, confirm)
        .await;
    spinner.finish_and_clear();
    let view = result?;

    if json {
        println!(
            "{}",
            serde_json::json!({"signed_up": true, "email": email, "view": view})
        );
        return Ok(());
    }

    println!();
    match view {
        ActiveView::Login => println!(
            "  {} Account created. Confirm your email, then run {}",
            style("✓").green().bold(),
            style("sfeed login").yellow()
        ),
        _ => {
            println!(
                "  {} Account created and signed in as {}",
                style("✓").green().bold(),
                style(&email).cyan()
            );
            print_next_step(view);
        }
    }
    println!();
    Ok(())
}

/// Sign in with email and password.
pub async fn login<B: Backend>(
    state: &mut AppState<B>,
    email: Option<String>,
    password: Option<String>,
    json: bool,
) -> Result<()> {
    let email = prompt_email(email)?;
    let password = prompt_password(password, "Password")?;

    let spinner = spinner("Signing in...", json);
    let result = state.orchestrator.sign_in(&email, password).await;
    spinner.finish_and_clear();
    let view = result?;

    if json {
        println!(
            "{}",
            serde_json::json!({"signed_in": true, "email": email, "view": view})
        );
        return Ok(());
    }

    println!();
    println!(
        "  {} Signed in as {}",
        style("✓").green().bold(),
        style(&email).cyan()
    );
    print_next_step(view);
    println!();
    Ok(())
}

/// Sign out. Succeeds when nobody is signed in.
pub async fn logout<B: Backend>(state: &mut AppState<B>, json: bool) -> Result<()> {
    let view = state.orchestrator.sign_out().await?;

    if json {
        println!("{}", serde_json::json!({"signed_out": true, "view": view}));
    } else {
        println!("  {} Signed out", style("✓").green().bold());
    }
    Ok(())
}

/// One-line hint for what to run next from `view`.
pub fn print_next_step(view: ActiveView) {
    let hint = match view {
        ActiveView::ProfileSetup => "sfeed setup --username <name>",
        ActiveView::Feed | ActiveView::ProfileDetail => "sfeed feed",
        ActiveView::Login => "sfeed login",
        ActiveView::Loading => "sfeed status",
    };
    println!("  {} Next: {}", style("→").dim(), style(hint).yellow());
}
