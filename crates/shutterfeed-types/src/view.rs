//! View-selection model for the session orchestrator.
//!
//! The orchestrator derives one `ActiveView` from a `SessionState`, a
//! `ProfileState`, and the last page the user navigated to.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use crate::profile::Profile;
use crate::user::Session;

/// What the orchestrator currently knows about authentication.
#[derive(Debug, Clone, Default)]
pub enum SessionState {
    /// The initial session fetch has not resolved yet.
    #[default]
    Pending,
    Absent,
    Present(Session),
}

impl SessionState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Present(session) => Some(session),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, SessionState::Absent)
    }
}

impl From<Option<Session>> for SessionState {
    fn from(session: Option<Session>) -> Self {
        match session {
            Some(session) => SessionState::Present(session),
            None => SessionState::Absent,
        }
    }
}

/// What the orchestrator currently knows about the signed-in user's profile.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ProfileState {
    /// No lookup has completed for the current session.
    #[default]
    Pending,
    /// Lookup completed and found nothing; creation is in progress.
    Absent,
    Incomplete(Profile),
    Complete(Profile),
}

impl ProfileState {
    pub fn profile(&self) -> Option<&Profile> {
        match self {
            ProfileState::Incomplete(p) | ProfileState::Complete(p) => Some(p),
            ProfileState::Pending | ProfileState::Absent => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, ProfileState::Complete(_))
    }
}

impl From<Option<Profile>> for ProfileState {
    fn from(profile: Option<Profile>) -> Self {
        match profile {
            Some(p) if p.is_setup_complete => ProfileState::Complete(p),
            Some(p) => ProfileState::Incomplete(p),
            None => ProfileState::Absent,
        }
    }
}

/// Pages reachable by navigation once setup is complete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    #[default]
    Feed,
    ProfileDetail,
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Page::Feed => write!(f, "feed"),
            Page::ProfileDetail => write!(f, "profile"),
        }
    }
}

impl FromStr for Page {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "feed" | "home" => Ok(Page::Feed),
            "profile" | "profile_detail" | "profile-detail" => Ok(Page::ProfileDetail),
            other => Err(format!("invalid page: '{other}'")),
        }
    }
}

/// The screen to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveView {
    /// Non-terminal: waiting on the session or profile.
    Loading,
    Login,
    ProfileSetup,
    Feed,
    ProfileDetail,
}

impl From<Page> for ActiveView {
    fn from(page: Page) -> Self {
        match page {
            Page::Feed => ActiveView::Feed,
            Page::ProfileDetail => ActiveView::ProfileDetail,
        }
    }
}

impl fmt::Display for ActiveView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActiveView::Loading => write!(f, "loading"),
            ActiveView::Login => write!(f, "login"),
            ActiveView::ProfileSetup => write!(f, "profile-setup"),
            ActiveView::Feed => write!(f, "feed"),
            ActiveView::ProfileDetail => write!(f, "profile-detail"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::UserId;

    #[test]
    fn test_profile_state_from_option() {
        assert_eq!(ProfileState::from(None), ProfileState::Absent);

        let mut profile = Profile::with_defaults(UserId::new(), "https://a.example");
        assert!(matches!(
            ProfileState::from(Some(profile.clone())),
            ProfileState::Incomplete(_)
        ));

        profile.is_setup_complete = true;
        let state = ProfileState::from(Some(profile));
        assert!(state.is_complete());
        assert!(state.profile().is_some());
    }

    #[test]
    fn test_page_parse_aliases() {
        assert_eq!("home".parse::<Page>().unwrap(), Page::Feed);
        assert_eq!("profile".parse::<Page>().unwrap(), Page::ProfileDetail);
        assert!("settings".parse::<Page>().is_err());
    }

    #[test]
    fn test_active_view_serializes_snake_case() {
        let json = serde_json::to_string(&ActiveView::ProfileSetup).unwrap();
        assert_eq!(json, "\"profile_setup\"");
        assert_eq!(ActiveView::ProfileSetup.to_string(), "profile-setup");
    }
}
