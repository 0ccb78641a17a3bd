//! In-memory backend used by unit tests in this crate.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use secrecy::{ExposeSecret, SecretString};
use shutterfeed_types::error::{AuthError, RepositoryError};
use shutterfeed_types::event::{ChangeKind, SessionEvent, Table, TableChange};
use shutterfeed_types::post::{Post, PostId};
use shutterfeed_types::profile::{Profile, ProfileUpdate};
use shutterfeed_types::user::{Credentials, Session, UserId};

use crate::event::{EventBus, Subscription};
use crate::repository::{
    AuthProvider, Backend, ChangeFeed, MediaStore, PostRepository, ProfileRepository,
};

pub const TEST_AVATAR_BASE: &str = "https://avatars.test/svg";

#[derive(Default)]
pub struct MemoryAuth {
    accounts: Mutex<HashMap<String, (UserId, String)>>,
    current: Mutex<Option<Session>>,
    seq: AtomicU64,
    bus: EventBus<SessionEvent>,
}

impl MemoryAuth {
    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn issue(&self, user_id: UserId, email: &str) -> Session {
        let session = Session {
            user_id,
            email: email.to_string(),
            access_token: SecretString::from(format!("token-{user_id}")),
            expires_at: None,
        };
        *self.current.lock().unwrap() = Some(session.clone());
        self.bus
            .publish(SessionEvent::signed_in(self.next_seq(), session.clone()));
        session
    }

    /// Register an account without signing in.
    pub fn add_account(&self, email: &str, password: &str) -> UserId {
        let id = UserId::new();
        self.accounts
            .lock()
            .unwrap()
            .insert(email.to_string(), (id, password.to_string()));
        id
    }

    /// Put a session in place as if restored from a previous run, without
    /// publishing an event.
    pub fn restore(&self, session: Session) {
        *self.current.lock().unwrap() = Some(session);
    }

    pub fn listener_count(&self) -> usize {
        self.bus.receiver_count()
    }

    /// Hand out a sequence number without publishing, to build events by hand.
    pub fn reserve_seq(&self) -> u64 {
        self.next_seq()
    }
}

impl AuthProvider for MemoryAuth {
    async fn current_session(&self) -> Result<Option<Session>, AuthError> {
        Ok(self.current.lock().unwrap().clone())
    }

    fn subscribe(&self) -> Subscription<SessionEvent> {
        self.bus.subscribe("session")
    }

    async fn sign_in_with_password(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let account = self
            .accounts
            .lock()
            .unwrap()
            .get(&credentials.email)
            .cloned();
        match account {
            Some((id, password)) if password == credentials.password.expose_secret() => {
                Ok(self.issue(id, &credentials.email))
            }
            _ => Err(AuthError::InvalidCredentials),
        }
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<Option<Session>, AuthError> {
        if self
            .accounts
            .lock()
            .unwrap()
            .contains_key(&credentials.email)
        {
            return Err(AuthError::DuplicateAccount);
        }
        let id = self.add_account(&credentials.email, credentials.password.expose_secret());
        Ok(Some(self.issue(id, &credentials.email)))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        *self.current.lock().unwrap() = None;
        self.bus.publish(SessionEvent::signed_out(self.next_seq()));
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryProfiles {
    rows: Mutex<HashMap<UserId, Profile>>,
    /// Number of upcoming calls that fail with `Connection`.
    pub fail_next: AtomicU32,
    pub create_calls: AtomicU32,
}

impl MemoryProfiles {
    fn maybe_fail(&self) -> Result<(), RepositoryError> {
        let remaining = self.fail_next.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_next.store(remaining - 1, Ordering::SeqCst);
            return Err(RepositoryError::Connection);
        }
        Ok(())
    }

    pub fn insert(&self, profile: Profile) {
        self.rows.lock().unwrap().insert(profile.id, profile);
    }

    pub fn count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn get(&self, id: &UserId) -> Option<Profile> {
        self.rows.lock().unwrap().get(id).cloned()
    }
}

impl ProfileRepository for MemoryProfiles {
    async fn get_profile(&self, id: &UserId) -> Result<Option<Profile>, RepositoryError> {
        self.maybe_fail()?;
        Ok(self.get(id))
    }

    async fn get_profiles(&self, ids: &[UserId]) -> Result<Vec<Profile>, RepositoryError> {
        self.maybe_fail()?;
        let rows = self.rows.lock().unwrap();
        Ok(ids.iter().filter_map(|id| rows.get(id).cloned()).collect())
    }

    async fn create_profile(&self, profile: &Profile) -> Result<Profile, RepositoryError> {
        self.maybe_fail()?;
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.rows.lock().unwrap();
        if rows.contains_key(&profile.id) {
            return Err(RepositoryError::Conflict("profile exists".to_string()));
        }
        if rows.values().any(|p| p.username == profile.username) {
            return Err(RepositoryError::Conflict(profile.username.clone()));
        }
        rows.insert(profile.id, profile.clone());
        Ok(profile.clone())
    }

    async fn update_profile(
        &self,
        id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<Profile, RepositoryError> {
        self.maybe_fail()?;
        let mut rows = self.rows.lock().unwrap();
        if let Some(username) = &update.username {
            if rows.values().any(|p| p.id != *id && &p.username == username) {
                return Err(RepositoryError::Conflict(username.clone()));
            }
        }
        let profile = rows.get_mut(id).ok_or(RepositoryError::NotFound)?;
        update.apply_to(profile);
        Ok(profile.clone())
    }

    async fn is_username_taken(
        &self,
        username: &str,
        excluding: &UserId,
    ) -> Result<bool, RepositoryError> {
        self.maybe_fail()?;
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .any(|p| p.id != *excluding && p.username == username))
    }
}

pub struct MemoryPosts {
    rows: Mutex<Vec<Post>>,
    changes: EventBus<TableChange>,
}

impl MemoryPosts {
    pub fn count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

impl PostRepository for MemoryPosts {
    async fn list_posts(&self) -> Result<Vec<Post>, RepositoryError> {
        let mut posts = self.rows.lock().unwrap().clone();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Post>, RepositoryError> {
        let mut posts: Vec<Post> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.user_id == *user_id)
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    async fn get_post(&self, id: &PostId) -> Result<Option<Post>, RepositoryError> {
        Ok(self.rows.lock().unwrap().iter().find(|p| p.id == *id).cloned())
    }

    async fn create_post(&self, post: &Post) -> Result<Post, RepositoryError> {
        self.rows.lock().unwrap().push(post.clone());
        self.changes.publish(TableChange::new(
            Table::Posts,
            ChangeKind::Insert,
            post.id.to_string(),
        ));
        Ok(post.clone())
    }

    async fn delete_post(&self, id: &PostId) -> Result<(), RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|p| p.id != *id);
        if rows.len() == before {
            return Err(RepositoryError::NotFound);
        }
        self.changes.publish(TableChange::new(
            Table::Posts,
            ChangeKind::Delete,
            id.to_string(),
        ));
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryMedia {
    objects: Mutex<HashMap<(String, String), Vec<u8>>>,
}

impl MemoryMedia {
    pub fn contains(&self, bucket: &str, path: &str) -> bool {
        self.objects
            .lock()
            .unwrap()
            .contains_key(&(bucket.to_string(), path.to_string()))
    }

    pub fn count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

impl MediaStore for MemoryMedia {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: &[u8],
        _content_type: &str,
    ) -> Result<String, RepositoryError> {
        let key = (bucket.to_string(), path.to_string());
        let mut objects = self.objects.lock().unwrap();
        if objects.contains_key(&key) {
            return Err(RepositoryError::Conflict(path.to_string()));
        }
        objects.insert(key, bytes.to_vec());
        Ok(self.public_url(bucket, path))
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), RepositoryError> {
        let mut objects = self.objects.lock().unwrap();
        for path in paths {
            objects.remove(&(bucket.to_string(), path.clone()));
        }
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("https://storage.test/object/public/{bucket}/{path}")
    }
}

pub struct MemoryChanges {
    bus: EventBus<TableChange>,
}

impl ChangeFeed for MemoryChanges {
    fn subscribe(&self, table: Table) -> Subscription<TableChange> {
        self.bus
            .subscribe_filtered("table", move |c: &TableChange| c.table == table)
    }
}

pub struct MemoryBackend {
    pub auth: MemoryAuth,
    pub profiles: MemoryProfiles,
    pub posts: MemoryPosts,
    pub media: MemoryMedia,
    pub changes: MemoryChanges,
}

impl MemoryBackend {
    pub fn new() -> Self {
        let bus = EventBus::new(64);
        Self {
            auth: MemoryAuth::default(),
            profiles: MemoryProfiles::default(),
            posts: MemoryPosts {
                rows: Mutex::new(Vec::new()),
                changes: bus.clone(),
            },
            media: MemoryMedia::default(),
            changes: MemoryChanges { bus },
        }
    }
}

impl Backend for MemoryBackend {
    type Auth = MemoryAuth;
    type Profiles = MemoryProfiles;
    type Posts = MemoryPosts;
    type Media = MemoryMedia;
    type Changes = MemoryChanges;

    fn auth(&self) -> &MemoryAuth {
        &self.auth
    }

    fn profiles(&self) -> &MemoryProfiles {
        &self.profiles
    }

    fn posts(&self) -> &MemoryPosts {
        &self.posts
    }

    fn media(&self) -> &MemoryMedia {
        &self.media
    }

    fn changes(&self) -> &MemoryChanges {
        &self.changes
    }
}

/// A profile that has already been through setup.
pub fn complete_profile(id: UserId, username: &str) -> Profile {
    let mut profile = Profile::with_defaults(id, TEST_AVATAR_BASE);
    profile.username = username.to_string();
    profile.is_setup_complete = true;
    profile
}
