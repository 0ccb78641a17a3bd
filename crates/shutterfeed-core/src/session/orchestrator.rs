//! The session/view orchestrator.
//!
//! Owns the derived client state (session, profile, navigated page, cached
//! feed) and decides which view to render. All mutation goes through
//! `&mut self`, so events are applied one at a time in arrival order.
//!
//! Session changes are never applied from the return value of a sign-in or
//! sign-out call. The auth provider publishes a [`SessionEvent`] for every
//! change and the orchestrator applies those, discarding any event whose
//! sequence number is not newer than the last one applied.

use std::sync::Arc;

use secrecy::SecretString;
use shutterfeed_types::config::ClientConfig;
use shutterfeed_types::error::{ProfileError, ViewError};
use shutterfeed_types::event::{SessionEvent, Table, TableChange};
use shutterfeed_types::post::{CreatePostRequest, FeedPost, MediaUpload, Post, PostId};
use shutterfeed_types::profile::{Profile, ProfileEdits};
use shutterfeed_types::user::{Session, UserId};
use shutterfeed_types::view::{ActiveView, Page, ProfileState, SessionState};

use crate::event::Subscription;
use crate::repository::{AuthProvider, Backend, ChangeFeed};
use crate::service::{
    AuthService, Backoff, FeedService, MediaService, ProfileDetail, ProfileService,
};
use crate::session::transition::resolve_view;

enum Incoming {
    Session(Option<SessionEvent>),
    Table(Option<TableChange>),
}

pub struct SessionOrchestrator<B: Backend> {
    backend: Arc<B>,
    auth: AuthService<B>,
    profiles: ProfileService<B>,
    feed: FeedService<B>,
    backoff: Backoff,

    session: SessionState,
    profile: ProfileState,
    page: Page,
    view: ActiveView,
    last_seq: u64,
    last_error: Option<String>,
    posts: Vec<FeedPost>,

    session_events: Option<Subscription<SessionEvent>>,
    post_changes: Option<Subscription<TableChange>>,
}

impl<B: Backend> SessionOrchestrator<B> {
    /// Build an orchestrator in the `Loading` view. Call [`start`](Self::start)
    /// to attach listeners and resolve the initial session.
    pub fn new(backend: Arc<B>, config: &ClientConfig) -> Self {
        let media = MediaService::new(
            Arc::clone(&backend),
            config.media_bucket.clone(),
            config.max_avatar_bytes,
        );
        Self {
            auth: AuthService::new(Arc::clone(&backend)),
            profiles: ProfileService::new(
                Arc::clone(&backend),
                config.avatar_base_url.clone(),
                media.clone(),
            ),
            feed: FeedService::new(Arc::clone(&backend), media),
            backoff: Backoff::new(config.retry.clone()),
            backend,
            session: SessionState::Pending,
            profile: ProfileState::Pending,
            page: Page::Feed,
            view: ActiveView::Loading,
            last_seq: 0,
            last_error: None,
            posts: Vec::new(),
            session_events: None,
            post_changes: None,
        }
    }

    /// Register listeners, then fetch the current session once.
    ///
    /// Listeners are registered first so no change between the fetch and the
    /// subscription is lost. The fetched snapshot only applies while the
    /// session is still pending; an event that arrived earlier wins.
    pub async fn start(&mut self) -> ActiveView {
        if self.session_events.is_none() {
            self.session_events = Some(self.backend.auth().subscribe());
        }
        if self.post_changes.is_none() {
            self.post_changes = Some(self.backend.changes().subscribe(Table::Posts));
        }

        let snapshot = match self.auth.current_session().await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "could not fetch current session, treating as signed out");
                self.last_error = Some(e.to_string());
                None
            }
        };
        let snapshot = snapshot.filter(|s| {
            let expired = s.is_expired_at(chrono::Utc::now());
            if expired {
                tracing::info!(user_id = %s.user_id, "stored session has expired");
            }
            !expired
        });

        if matches!(self.session, SessionState::Pending) {
            self.apply_session(snapshot).await
        } else {
            tracing::debug!("session already resolved by an event, ignoring snapshot");
            self.view
        }
    }

    /// Apply a session-change event. Events not newer than the last applied
    /// one are discarded.
    pub async fn on_session_changed(&mut self, event: SessionEvent) -> ActiveView {
        if event.seq <= self.last_seq {
            tracing::debug!(
                seq = event.seq,
                last_seq = self.last_seq,
                change = ?event.change,
                "discarding stale session event"
            );
            return self.view;
        }
        self.last_seq = event.seq;
        tracing::debug!(seq = event.seq, change = ?event.change, "session changed");
        self.apply_session(event.session).await
    }

    async fn apply_session(&mut self, next: Option<Session>) -> ActiveView {
        match next {
            None => {
                self.session = SessionState::Absent;
                self.profile = ProfileState::Pending;
                self.page = Page::Feed;
                self.posts.clear();
                self.last_error = None;
                self.recompute()
            }
            Some(session) => {
                let same_user = self
                    .session
                    .session()
                    .is_some_and(|s| s.user_id == session.user_id);
                let profile_known = self.profile.profile().is_some();
                self.session = SessionState::Present(session);

                if same_user && profile_known {
                    return self.recompute();
                }
                self.profile = ProfileState::Pending;
                self.page = Page::Feed;
                self.posts.clear();
                self.recompute();
                self.bootstrap_profile().await
            }
        }
    }

    /// Look up the signed-in user's profile, creating it if absent.
    ///
    /// Transient backend failures are retried with backoff. On exhaustion
    /// the view stays `Loading` and the error is kept in `last_error`.
    async fn bootstrap_profile(&mut self) -> ActiveView {
        let Some(user_id) = self.session.session().map(|s| s.user_id) else {
            return self.recompute();
        };

        match self.load_or_create(&user_id).await {
            Ok(profile) => {
                self.last_error = None;
                self.profile = ProfileState::from(Some(profile));
            }
            Err(e) => {
                tracing::error!(%user_id, error = %e, "profile bootstrap failed, staying in loading");
                self.last_error = Some(e.to_string());
                self.profile = ProfileState::Pending;
            }
        }
        self.recompute()
    }

    async fn load_or_create(&mut self, user_id: &UserId) -> Result<Profile, ProfileError> {
        let found = {
            let profiles = &self.profiles;
            self.backoff
                .retry_if("get_profile", move || profiles.get_profile(user_id), is_transient)
                .await?
        };
        if let Some(profile) = found {
            return Ok(profile);
        }

        self.profile = ProfileState::Absent;
        self.recompute();

        let profiles = &self.profiles;
        self.backoff
            .retry_if(
                "ensure_profile",
                move || profiles.ensure_profile(user_id),
                is_transient,
            )
            .await
    }

    /// Run profile bootstrap again after it gave up.
    pub async fn retry_bootstrap(&mut self) -> Result<ActiveView, ViewError> {
        if self.session.session().is_none() {
            return Err(ViewError::NotAuthenticated);
        }
        if self.profile.profile().is_some() {
            return Ok(self.view);
        }
        Ok(self.bootstrap_profile().await)
    }

    /// Persist setup edits and move to the feed.
    ///
    /// On any error, including `UsernameTaken`, state is left unchanged.
    pub async fn complete_setup(&mut self, edits: &ProfileEdits) -> Result<ActiveView, ViewError> {
        let user_id = self
            .session
            .session()
            .map(|s| s.user_id)
            .ok_or(ViewError::NotAuthenticated)?;
        match &self.profile {
            ProfileState::Incomplete(_) => {}
            ProfileState::Complete(_) => return Err(ViewError::SetupAlreadyComplete),
            ProfileState::Pending | ProfileState::Absent => return Err(ViewError::ProfileLoading),
        }

        let profile = self.profiles.complete_setup(&user_id, edits).await?;
        self.profile = ProfileState::from(Some(profile));
        self.page = Page::Feed;
        Ok(self.recompute())
    }

    /// Switch between the feed and the profile page. Only allowed once
    /// setup is complete; does not refetch anything.
    pub fn navigate(&mut self, target: Page) -> Result<ActiveView, ViewError> {
        self.ready_profile()?;
        self.page = target;
        Ok(self.recompute())
    }

    /// Sign in, then apply the resulting session event.
    pub async fn sign_in(
        &mut self,
        email: &str,
        password: SecretString,
    ) -> Result<ActiveView, ViewError> {
        self.auth.sign_in(email, password).await?;
        Ok(self.pump_pending().await)
    }

    /// Register, then apply the resulting session event if one was issued.
    pub async fn sign_up(
        &mut self,
        email: &str,
        password: SecretString,
        confirm: SecretString,
    ) -> Result<ActiveView, ViewError> {
        self.auth.sign_up(email, password, confirm).await?;
        Ok(self.pump_pending().await)
    }

    /// Request sign-out. The view moves to `Login` once the provider's
    /// sign-out event is applied.
    pub async fn sign_out(&mut self) -> Result<ActiveView, ViewError> {
        self.auth.sign_out().await?;
        Ok(self.pump_pending().await)
    }

    /// Apply every event already queued on the listeners without waiting.
    pub async fn pump_pending(&mut self) -> ActiveView {
        while let Some(event) = self.session_events.as_mut().and_then(|s| s.try_recv()) {
            self.on_session_changed(event).await;
        }
        while let Some(change) = self.post_changes.as_mut().and_then(|s| s.try_recv()) {
            self.on_table_changed(change).await;
        }
        self.view
    }

    /// Wait for the next session or table event and apply it.
    ///
    /// Returns `None` once both listeners are closed or released.
    pub async fn next_event(&mut self) -> Option<ActiveView> {
        let incoming = match (self.session_events.as_mut(), self.post_changes.as_mut()) {
            (None, None) => return None,
            (Some(session), None) => Incoming::Session(session.recv().await),
            (None, Some(posts)) => Incoming::Table(posts.recv().await),
            (Some(session), Some(posts)) => tokio::select! {
                event = session.recv() => Incoming::Session(event),
                change = posts.recv() => Incoming::Table(change),
            },
        };

        match incoming {
            Incoming::Session(Some(event)) => Some(self.on_session_changed(event).await),
            Incoming::Table(Some(change)) => Some(self.on_table_changed(change).await),
            Incoming::Session(None) => {
                tracing::warn!("session listener closed");
                self.session_events = None;
                Some(self.view)
            }
            Incoming::Table(None) => {
                tracing::warn!("post change listener closed");
                self.post_changes = None;
                Some(self.view)
            }
        }
    }

    /// Refetch the feed on a post-table change, but only while the feed is
    /// on screen.
    pub async fn on_table_changed(&mut self, change: TableChange) -> ActiveView {
        if change.table != Table::Posts || self.view != ActiveView::Feed {
            tracing::debug!(table = %change.table, view = %self.view, "ignoring table change");
            return self.view;
        }
        if let Err(e) = self.refresh_feed().await {
            tracing::warn!(error = %e, "feed refresh after table change failed");
        }
        self.view
    }

    /// Refetch the feed wholesale.
    pub async fn refresh_feed(&mut self) -> Result<&[FeedPost], ViewError> {
        self.ready_profile()?;
        self.posts = self.feed.fetch_feed().await?;
        Ok(&self.posts)
    }

    pub async fn create_post(&mut self, request: CreatePostRequest) -> Result<Post, ViewError> {
        let (user_id, _) = self.ready_profile()?;
        Ok(self.feed.create_post(&user_id, request).await?)
    }

    pub async fn delete_post(&mut self, post_id: &PostId) -> Result<(), ViewError> {
        let (user_id, _) = self.ready_profile()?;
        Ok(self.feed.delete_post(&user_id, post_id).await?)
    }

    /// The signed-in user's profile page: their posts and counters.
    pub async fn profile_detail(&self) -> Result<ProfileDetail, ViewError> {
        let (_, profile) = self.ready_profile()?;
        Ok(self.feed.profile_detail(profile.clone()).await?)
    }

    pub async fn change_avatar(&mut self, upload: &MediaUpload) -> Result<Profile, ViewError> {
        let (user_id, _) = self.ready_profile()?;
        let profile = self.profiles.change_avatar(&user_id, upload).await?;
        self.profile = ProfileState::from(Some(profile.clone()));
        self.recompute();
        Ok(profile)
    }

    /// Release both listeners. Further events are not observed.
    pub fn shutdown(&mut self) {
        if let Some(subscription) = self.session_events.take() {
            subscription.unsubscribe();
        }
        if let Some(subscription) = self.post_changes.take() {
            subscription.unsubscribe();
        }
    }

    pub fn view(&self) -> ActiveView {
        self.view
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn profile(&self) -> &ProfileState {
        &self.profile
    }

    pub fn page(&self) -> Page {
        self.page
    }

    /// Feed as of the last refresh.
    pub fn feed(&self) -> &[FeedPost] {
        &self.posts
    }

    /// Most recent bootstrap or session-fetch error, cleared on success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_listening(&self) -> bool {
        self.session_events.is_some()
    }

    fn ready_profile(&self) -> Result<(UserId, &Profile), ViewError> {
        let user_id = self
            .session
            .session()
            .map(|s| s.user_id)
            .ok_or(ViewError::NotAuthenticated)?;
        match &self.profile {
            ProfileState::Complete(profile) => Ok((user_id, profile)),
            ProfileState::Incomplete(_) => Err(ViewError::SetupIncomplete),
            ProfileState::Pending | ProfileState::Absent => Err(ViewError::ProfileLoading),
        }
    }

    fn recompute(&mut self) -> ActiveView {
        let next = resolve_view(&self.session, &self.profile, self.page);
        if next != self.view {
            tracing::debug!(from = %self.view, to = %next, "view transition");
            self.view = next;
        }
        next
    }
}

fn is_transient(err: &ProfileError) -> bool {
    matches!(err, ProfileError::BackendUnavailable(_))
}
