//! The view decision as a pure function of session, profile, and page.

use shutterfeed_types::view::{ActiveView, Page, ProfileState, SessionState};

/// Decide which view to render.
///
/// | session  | profile             | view                          |
/// |----------|---------------------|-------------------------------|
/// | pending  | any                 | loading                       |
/// | absent   | any                 | login                         |
/// | present  | pending or absent   | loading                       |
/// | present  | incomplete          | profile-setup                 |
/// | present  | complete            | the navigated page            |
pub fn resolve_view(session: &SessionState, profile: &ProfileState, page: Page) -> ActiveView {
    match (session, profile) {
        (SessionState::Pending, _) => ActiveView::Loading,
        (SessionState::Absent, _) => ActiveView::Login,
        (SessionState::Present(_), ProfileState::Pending | ProfileState::Absent) => {
            ActiveView::Loading
        }
        (SessionState::Present(_), ProfileState::Incomplete(_)) => ActiveView::ProfileSetup,
        (SessionState::Present(_), ProfileState::Complete(_)) => page.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use shutterfeed_types::profile::Profile;
    use shutterfeed_types::user::{Session, UserId};

    fn present() -> SessionState {
        SessionState::Present(Session {
            user_id: UserId::new(),
            email: "a@b.com".to_string(),
            access_token: SecretString::from("t".to_string()),
            expires_at: None,
        })
    }

    fn profiles() -> Vec<ProfileState> {
        let mut profile = Profile::with_defaults(UserId::new(), "https://a.test");
        let incomplete = ProfileState::Incomplete(profile.clone());
        profile.is_setup_complete = true;
        vec![
            ProfileState::Pending,
            ProfileState::Absent,
            incomplete,
            ProfileState::Complete(profile),
        ]
    }

    #[test]
    fn test_pending_session_is_loading_for_any_profile() {
        for profile in profiles() {
            for page in [Page::Feed, Page::ProfileDetail] {
                assert_eq!(
                    resolve_view(&SessionState::Pending, &profile, page),
                    ActiveView::Loading
                );
            }
        }
    }

    #[test]
    fn test_absent_session_is_login_for_any_profile() {
        for profile in profiles() {
            for page in [Page::Feed, Page::ProfileDetail] {
                assert_eq!(
                    resolve_view(&SessionState::Absent, &profile, page),
                    ActiveView::Login
                );
            }
        }
    }

    #[test]
    fn test_present_session() {
        let session = present();
        let [pending, absent, incomplete, complete]: [ProfileState; 4] =
            profiles().try_into().unwrap();

        assert_eq!(resolve_view(&session, &pending, Page::Feed), ActiveView::Loading);
        assert_eq!(resolve_view(&session, &absent, Page::Feed), ActiveView::Loading);
        assert_eq!(
            resolve_view(&session, &incomplete, Page::ProfileDetail),
            ActiveView::ProfileSetup
        );
        assert_eq!(resolve_view(&session, &complete, Page::Feed), ActiveView::Feed);
        assert_eq!(
            resolve_view(&session, &complete, Page::ProfileDetail),
            ActiveView::ProfileDetail
        );
    }
}
