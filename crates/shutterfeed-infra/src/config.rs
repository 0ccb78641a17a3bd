//! Client configuration loader for Shutterfeed.
//!
//! Reads `config.toml` from the data directory (`~/.shutterfeed/` in
//! production) and deserializes it into [`ClientConfig`]. Falls back to
//! defaults when the file is missing or malformed.

use std::path::Path;

use shutterfeed_types::config::{ClientConfig, SESSION_TTL_HOURS_RANGE};

/// Load client configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`ClientConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - Otherwise returns the parsed config, with an out-of-range
///   `session_ttl_hours` clamped and logged.
pub async fn load_client_config(data_dir: &Path) -> ClientConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return ClientConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return ClientConfig::default();
        }
    };

    match toml::from_str::<ClientConfig>(&content) {
        Ok(config) => clamp_session_ttl(config),
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            ClientConfig::default()
        }
    }
}

fn clamp_session_ttl(mut config: ClientConfig) -> ClientConfig {
    if !SESSION_TTL_HOURS_RANGE.contains(&config.session_ttl_hours) {
        let clamped = config.session_ttl().num_hours();
        tracing::warn!(
            configured = config.session_ttl_hours,
            clamped,
            "session_ttl_hours out of range"
        );
        config.session_ttl_hours = clamped;
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use shutterfeed_types::config::BackendKind;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_client_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_client_config(tmp.path()).await;
        assert_eq!(config.backend, BackendKind::Local);
        assert_eq!(config.media_bucket, "post-media");
    }

    #[tokio::test]
    async fn load_client_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
backend = "hosted"
hosted_url = "https://project.example.co"
max_avatar_bytes = 1024

[retry]
max_attempts = 5
"#,
        )
        .await
        .unwrap();

        let config = load_client_config(tmp.path()).await;
        assert_eq!(config.backend, BackendKind::Hosted);
        assert_eq!(config.hosted_url.as_deref(), Some("https://project.example.co"));
        assert_eq!(config.max_avatar_bytes, 1024);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.initial_backoff_ms, 200);
    }

    #[tokio::test]
    async fn load_client_config_clamps_session_ttl() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "session_ttl_hours = -3\n")
            .await
            .unwrap();
        assert_eq!(load_client_config(tmp.path()).await.session_ttl_hours, 1);

        tokio::fs::write(
            tmp.path().join("config.toml"),
            "session_ttl_hours = 9223372036854775807\n",
        )
        .await
        .unwrap();
        assert_eq!(load_client_config(tmp.path()).await.session_ttl_hours, 24 * 365);
    }

    #[tokio::test]
    async fn load_client_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_client_config(tmp.path()).await;
        assert_eq!(config.backend, BackendKind::Local);
    }
}
