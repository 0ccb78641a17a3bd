//! Profiles table over the hosted REST API.

use reqwest::Method;
use serde::Serialize;
use shutterfeed_core::event::EventBus;
use shutterfeed_core::repository::ProfileRepository;
use shutterfeed_types::error::RepositoryError;
use shutterfeed_types::event::{ChangeKind, Table, TableChange};
use shutterfeed_types::profile::{Profile, ProfileUpdate};
use shutterfeed_types::user::UserId;

use super::client::HostedClient;

const PROFILES: &str = "/rest/v1/profiles";

/// PATCH body. Unset fields are omitted so the server keeps them, and the
/// setup flag is only ever sent as `true`.
#[derive(Debug, Serialize)]
struct ProfilePatch<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    full_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bio: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    avatar_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_setup_complete: Option<bool>,
    updated_at: String,
}

impl<'a> From<&'a ProfileUpdate> for ProfilePatch<'a> {
    fn from(update: &'a ProfileUpdate) -> Self {
        Self {
            username: update.username.as_deref(),
            full_name: update.full_name.as_deref(),
            bio: update.bio.as_deref(),
            avatar_url: update.avatar_url.as_deref(),
            is_setup_complete: update.mark_setup_complete.then_some(true),
            updated_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

pub struct HostedProfileRepository {
    client: HostedClient,
    changes: EventBus<TableChange>,
}

impl HostedProfileRepository {
    pub fn new(client: HostedClient, changes: EventBus<TableChange>) -> Self {
        Self { client, changes }
    }

    fn notify(&self, kind: ChangeKind, id: &UserId) {
        self.changes
            .publish(TableChange::new(Table::Profiles, kind, id.to_string()));
    }
}

/// `in.(a,b,c)` filter value for a set of ids.
fn in_filter(ids: &[UserId]) -> String {
    let list: Vec<String> = ids.iter().map(ToString::to_string).collect();
    format!("in.({})", list.join(","))
}

impl ProfileRepository for HostedProfileRepository {
    async fn get_profile(&self, id: &UserId) -> Result<Option<Profile>, RepositoryError> {
        let request = self
            .client
            .request(Method::GET, PROFILES)
            .query(&[("select", "*".to_string()), ("id", format!("eq.{id}"))]);
        let rows: Vec<Profile> = self.client.send_json(request).await?;
        Ok(rows.into_iter().next())
    }

    async fn get_profiles(&self, ids: &[UserId]) -> Result<Vec<Profile>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let request = self
            .client
            .request(Method::GET, PROFILES)
            .query(&[("select", "*".to_string()), ("id", in_filter(ids))]);
        self.client.send_json(request).await
    }

    async fn create_profile(&self, profile: &Profile) -> Result<Profile, RepositoryError> {
        let request = self
            .client
            .request(Method::POST, PROFILES)
            .header("Prefer", "return=representation")
            .json(profile);
        let rows: Vec<Profile> = self.client.send_json(request).await?;
        let created = rows
            .into_iter()
            .next()
            .ok_or_else(|| RepositoryError::Query("insert returned no row".to_string()))?;
        self.notify(ChangeKind::Insert, &created.id);
        Ok(created)
    }

    async fn update_profile(
        &self,
        id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<Profile, RepositoryError> {
        let request = self
            .client
            .request(Method::PATCH, PROFILES)
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .json(&ProfilePatch::from(update));
        let rows: Vec<Profile> = self.client.send_json(request).await?;
        let updated = rows.into_iter().next().ok_or(RepositoryError::NotFound)?;
        self.notify(ChangeKind::Update, id);
        Ok(updated)
    }

    async fn is_username_taken(
        &self,
        username: &str,
        excluding: &UserId,
    ) -> Result<bool, RepositoryError> {
        let request = self.client.request(Method::GET, PROFILES).query(&[
            ("select", "id".to_string()),
            ("username", format!("eq.{username}")),
            ("id", format!("neq.{excluding}")),
            ("limit", "1".to_string()),
        ]);
        let rows: Vec<serde_json::Value> = self.client.send_json(request).await?;
        Ok(!rows.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_omits_unset_fields() {
        let update = ProfileUpdate::avatar("https://cdn/a.png".to_string());
        let json = serde_json::to_value(ProfilePatch::from(&update)).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj["avatar_url"], "https://cdn/a.png");
        assert!(!obj.contains_key("username"));
        assert!(!obj.contains_key("is_setup_complete"));
        assert!(obj.contains_key("updated_at"));
    }

    #[test]
    fn test_patch_only_raises_setup_flag() {
        let update = ProfileUpdate {
            username: Some("alice".to_string()),
            mark_setup_complete: true,
            ..Default::default()
        };
        let json = serde_json::to_value(ProfilePatch::from(&update)).unwrap();
        assert_eq!(json["is_setup_complete"], true);
        assert_eq!(json["username"], "alice");
    }

    #[test]
    fn test_in_filter() {
        let a: UserId = "0f8e2a4b-1c3d-4e5f-8a9b-0c1d2e3f4a5b".parse().unwrap();
        let b: UserId = "1f8e2a4b-1c3d-4e5f-8a9b-0c1d2e3f4a5b".parse().unwrap();
        assert_eq!(
            in_filter(&[a, b]),
            "in.(0f8e2a4b-1c3d-4e5f-8a9b-0c1d2e3f4a5b,1f8e2a4b-1c3d-4e5f-8a9b-0c1d2e3f4a5b)"
        );
    }

    #[test]
    fn test_rest_row_deserializes_into_profile() {
        let json = r#"[{
            "id": "0f8e2a4b-1c3d-4e5f-8a9b-0c1d2e3f4a5b",
            "username": "user_0f8e2a4b",
            "full_name": null,
            "bio": null,
            "avatar_url": "https://api.dicebear.com/7.x/avataaars/svg?seed=x",
            "is_setup_complete": false,
            "created_at": "2026-10-19T08:00:00.123456+00:00",
            "updated_at": "2026-10-19T08:00:00.123456+00:00"
        }]"#;
        let rows: Vec<Profile> = serde_json::from_str(json).unwrap();
        assert_eq!(rows[0].username, "user_0f8e2a4b");
        assert!(!rows[0].is_setup_complete);
    }
}
