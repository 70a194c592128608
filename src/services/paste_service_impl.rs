//! Paste lifecycle over any [`PasteStore`].

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::db::PasteStore;
use crate::models::paste::{MAX_LANGUAGE_LENGTH, MAX_TITLE_LENGTH, PASTE_ID_LENGTH};
use crate::models::{CreatePaste, NewPaste, Owner, Paste, PasteChanges};
use crate::services::clock::Clock;
use crate::services::paste_service::{
    Dashboard, DashboardCounts, PasteError, PasteService, RECENT_PASTES_LIMIT,
};
use crate::services::policy::{self, Denial, Gone};
use crate::services::token::Identity;

type IdGenerator = Box<dyn Fn() -> String + Send + Sync>;

pub struct DefaultPasteService {
    store: Arc<dyn PasteStore>,
    clock: Arc<dyn Clock>,
    generate_id: IdGenerator,
}

impl DefaultPasteService {
    #[must_use]
    pub fn new(store: Arc<dyn PasteStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            generate_id: Box::new(generate_paste_id),
        }
    }

    /// Replaces the random id source. Used to exercise collision handling.
    #[must_use]
    pub fn with_id_generator<F>(mut self, generate_id: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.generate_id = Box::new(generate_id);
        self
    }

    async fn allocate_id(&self) -> Result<String, PasteError> {
        loop {
            let id = (self.generate_id)();
            if !self.store.paste_exists(&id).await? {
                return Ok(id);
            }
            debug!("Paste id collision on {id}, retrying");
        }
    }

    async fn find(&self, id: &str) -> Result<Paste, PasteError> {
        self.store.get_paste(id).await?.ok_or(PasteError::NotFound)
    }

    /// Loads a paste and deletes it instead if it has expired or burned.
    async fn load_live(&self, id: &str) -> Result<Paste, PasteError> {
        let paste = self.find(id).await?;
        match policy::check_gone(&paste, self.clock.now()) {
            None => Ok(paste),
            Some(gone) => Err(self.destroy(&paste.id, gone).await),
        }
    }

    async fn destroy(&self, id: &str, gone: Gone) -> PasteError {
        if let Err(e) = self.store.delete_paste(id).await {
            return e.into();
        }

        match gone {
            Gone::Expired => {
                info!("Deleted expired paste {id}");
                metrics::counter!("pastes_expired_total").increment(1);
            }
            Gone::Burned => {
                info!("Burned paste {id} after reading");
                metrics::counter!("pastes_burned_total").increment(1);
            }
        }

        gone.into()
    }
}

fn validate_fields(title: Option<&str>, language: Option<&str>) -> Result<(), PasteError> {
    if title.is_some_and(|t| t.chars().count() > MAX_TITLE_LENGTH) {
        return Err(PasteError::Validation(format!(
            "Title must be {MAX_TITLE_LENGTH} characters or less"
        )));
    }

    if language.is_some_and(|l| l.chars().count() > MAX_LANGUAGE_LENGTH) {
        return Err(PasteError::Validation(format!(
            "Language must be {MAX_LANGUAGE_LENGTH} characters or less"
        )));
    }

    Ok(())
}

fn owner_of(requester: Option<&Identity>) -> Owner {
    Owner::from_user_id(requester.map(|i| i.user_id))
}

#[async_trait]
impl PasteService for DefaultPasteService {
    async fn create(
        &self,
        requester: Option<&Identity>,
        input: CreatePaste,
    ) -> Result<Paste, PasteError> {
        if input.content.is_empty() {
            return Err(PasteError::Validation("Content is required".to_string()));
        }
        validate_fields(input.title.as_deref(), input.language.as_deref())?;

        let id = self.allocate_id().await?;
        let now = self.clock.now();

        let paste = self
            .store
            .insert_paste(NewPaste {
                id,
                title: input.title.filter(|t| !t.is_empty()),
                content: input.content,
                language: input.language.filter(|l| !l.is_empty()),
                is_public: input.is_public,
                expires_at: input.expires_in.expires_at(now),
                burn_after_read: input.burn_after_read,
                owner: owner_of(requester),
                created_at: now,
            })
            .await?;

        info!(
            paste_id = %paste.id,
            user_id = ?paste.owner.user_id(),
            burn_after_read = paste.burn_after_read,
            "Created paste"
        );
        metrics::counter!("pastes_created_total").increment(1);

        Ok(paste)
    }

    async fn read(&self, id: &str, requester: Option<&Identity>) -> Result<Paste, PasteError> {
        let mut paste = self.load_live(id).await?;
        policy::can_read(&paste, requester)?;

        // Burn-after-read pastes only count a view if nobody else got there first.
        let expected_views = paste.burn_after_read.then_some(paste.views);
        if !self
            .store
            .increment_paste_views(&paste.id, expected_views)
            .await?
        {
            if paste.burn_after_read {
                return Err(self.destroy(&paste.id, Gone::Burned).await);
            }
            return Err(PasteError::NotFound);
        }

        paste.views += 1;
        metrics::counter!("pastes_read_total").increment(1);
        Ok(paste)
    }

    async fn read_raw(&self, id: &str, requester: Option<&Identity>) -> Result<Paste, PasteError> {
        let paste = self.find(id).await?;
        if policy::is_expired(&paste, self.clock.now()) {
            return Err(self.destroy(&paste.id, Gone::Expired).await);
        }
        policy::can_read(&paste, requester)?;
        Ok(paste)
    }

    async fn update(
        &self,
        id: &str,
        requester: Option<&Identity>,
        changes: PasteChanges,
    ) -> Result<Paste, PasteError> {
        requester.ok_or(Denial::NotAuthenticated)?;

        let paste = self.load_live(id).await?;
        policy::can_mutate(&paste, requester)?;
        validate_fields(changes.title.as_deref(), changes.language.as_deref())?;

        let updated = self
            .store
            .update_paste(&paste.id, &changes, self.clock.now())
            .await?
            .ok_or(PasteError::NotFound)?;

        info!(paste_id = %updated.id, "Updated paste");
        Ok(updated)
    }

    async fn delete(&self, id: &str, requester: Option<&Identity>) -> Result<(), PasteError> {
        requester.ok_or(Denial::NotAuthenticated)?;

        let paste = self.load_live(id).await?;
        policy::can_mutate(&paste, requester)?;

        if !self.store.delete_paste(&paste.id).await? {
            return Err(PasteError::NotFound);
        }

        info!(paste_id = %paste.id, "Deleted paste");
        metrics::counter!("pastes_deleted_total").increment(1);
        Ok(())
    }

    async fn fork(&self, id: &str, requester: Option<&Identity>) -> Result<Paste, PasteError> {
        let original = self.load_live(id).await?;
        policy::can_read(&original, requester)?;

        let title = match original.title.as_deref() {
            Some(title) => format!("{title} (Fork)"),
            None => "Untitled (Fork)".to_string(),
        };

        let new_id = self.allocate_id().await?;
        let forked = self
            .store
            .insert_paste(NewPaste {
                id: new_id,
                title: Some(title),
                content: original.content,
                language: original.language,
                is_public: true,
                expires_at: None,
                burn_after_read: false,
                owner: owner_of(requester),
                created_at: self.clock.now(),
            })
            .await?;

        info!(paste_id = %forked.id, source = %original.id, "Forked paste");
        metrics::counter!("pastes_forked_total").increment(1);

        Ok(forked)
    }

    async fn list_recent(&self) -> Result<Vec<Paste>, PasteError> {
        Ok(self
            .store
            .list_recent_public_pastes(RECENT_PASTES_LIMIT)
            .await?)
    }

    async fn list_by_owner(
        &self,
        user_id: i32,
        public_only: bool,
    ) -> Result<Vec<Paste>, PasteError> {
        Ok(self.store.list_pastes_by_owner(user_id, public_only).await?)
    }

    async fn dashboard(&self, identity: &Identity) -> Result<Dashboard, PasteError> {
        let pastes = self.store.list_pastes_by_owner(identity.user_id, false).await?;
        let public = self
            .store
            .count_pastes_by_owner(identity.user_id, true)
            .await?;
        let private = self
            .store
            .count_pastes_by_owner(identity.user_id, false)
            .await?;

        Ok(Dashboard {
            counts: DashboardCounts {
                public,
                private,
                total: pastes.len() as u64,
            },
            pastes,
        })
    }
}

/// Random lowercase hex id of [`PASTE_ID_LENGTH`] characters.
#[must_use]
pub fn generate_paste_id() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; PASTE_ID_LENGTH / 2] = rng.random();

    bytes
        .iter()
        .fold(String::with_capacity(PASTE_ID_LENGTH), |mut acc, b| {
            use std::fmt::Write;
            let _ = write!(acc, "{b:02x}");
            acc
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Store;
    use crate::models::ExpiresIn;
    use crate::services::clock::ManualClock;
    use chrono::{Duration, Utc};
    use std::sync::Mutex;

    struct Harness {
        service: DefaultPasteService,
        store: Store,
        clock: Arc<ManualClock>,
    }

    async fn harness() -> Harness {
        let path =
            std::env::temp_dir().join(format!("patbin-paste-test-{}.db", uuid::Uuid::new_v4()));
        let store = Store::new(&format!("sqlite:{}", path.display()))
            .await
            .expect("failed to open store");
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let service = DefaultPasteService::new(Arc::new(store.clone()), clock.clone());
        Harness {
            service,
            store,
            clock,
        }
    }

    fn input(content: &str) -> CreatePaste {
        CreatePaste {
            title: Some("notes".to_string()),
            content: content.to_string(),
            language: Some("rust".to_string()),
            is_public: true,
            ..Default::default()
        }
    }

    async fn register(store: &Store, name: &str) -> Identity {
        let security = crate::config::SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            argon2_parallelism: 1,
        };
        match store.create_user(name, "password", &security).await.unwrap() {
            crate::db::CreateUserOutcome::Created(u) => Identity {
                user_id: u.id,
                username: u.username,
            },
            crate::db::CreateUserOutcome::UsernameTaken => panic!("username taken"),
        }
    }

    #[test]
    fn test_generated_ids_are_short_hex() {
        let id = generate_paste_id();
        assert_eq!(id.len(), PASTE_ID_LENGTH);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[tokio::test]
    async fn test_read_after_create_counts_one_view() {
        let h = harness().await;
        let created = h.service.create(None, input("fn main() {}")).await.unwrap();
        assert_eq!(created.views, 0);
        assert_eq!(created.owner, Owner::Anonymous);

        let read = h.service.read(&created.id, None).await.unwrap();
        assert_eq!(read.content, "fn main() {}");
        assert_eq!(read.views, 1);

        let stored = h.store.get_paste(&created.id).await.unwrap().unwrap();
        assert_eq!(stored.views, 1);
    }

    #[tokio::test]
    async fn test_empty_content_is_rejected() {
        let h = harness().await;
        assert!(matches!(
            h.service.create(None, input("")).await,
            Err(PasteError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_id_collisions_are_retried() {
        let h = harness().await;
        let ids = Mutex::new(vec!["bbbbbbbb", "aaaaaaaa", "aaaaaaaa"]);
        let service = DefaultPasteService::new(Arc::new(h.store.clone()), h.clock.clone())
            .with_id_generator(move || {
                ids.lock()
                    .unwrap()
                    .pop()
                    .expect("ran out of ids")
                    .to_string()
            });

        let first = service.create(None, input("one")).await.unwrap();
        let second = service.create(None, input("two")).await.unwrap();

        assert_eq!(first.id, "aaaaaaaa");
        assert_eq!(second.id, "bbbbbbbb");
    }

    #[tokio::test]
    async fn test_expired_paste_is_deleted_on_access() {
        let h = harness().await;
        let mut req = input("short lived");
        req.expires_in = ExpiresIn::OneHour;
        let created = h.service.create(None, req).await.unwrap();

        h.clock.advance(Duration::minutes(59));
        assert!(h.service.read(&created.id, None).await.is_ok());

        h.clock.advance(Duration::minutes(2));
        assert!(matches!(
            h.service.read(&created.id, None).await,
            Err(PasteError::Expired)
        ));
        assert!(h.store.get_paste(&created.id).await.unwrap().is_none());
        assert!(matches!(
            h.service.read(&created.id, None).await,
            Err(PasteError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_burn_after_read_allows_one_read() {
        let h = harness().await;
        let mut req = input("secret");
        req.burn_after_read = true;
        let created = h.service.create(None, req).await.unwrap();

        let first = h.service.read(&created.id, None).await.unwrap();
        assert_eq!(first.content, "secret");

        assert!(matches!(
            h.service.read(&created.id, None).await,
            Err(PasteError::Burned)
        ));
        assert!(h.store.get_paste(&created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_raw_skips_burn_and_view_count() {
        let h = harness().await;
        let mut req = input("raw body");
        req.burn_after_read = true;
        let created = h.service.create(None, req).await.unwrap();

        h.service.read(&created.id, None).await.unwrap();

        // Raw fetch still serves a burned paste and does not count views.
        let raw = h.service.read_raw(&created.id, None).await.unwrap();
        assert_eq!(raw.content, "raw body");
        assert_eq!(raw.views, 1);
        assert!(h.store.get_paste(&created.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_raw_honours_expiry_and_visibility() {
        let h = harness().await;
        let owner = register(&h.store, "rawowner").await;

        let mut private = input("hidden");
        private.is_public = false;
        let private = h.service.create(Some(&owner), private).await.unwrap();
        assert!(matches!(
            h.service.read_raw(&private.id, None).await,
            Err(PasteError::Denied(Denial::Private))
        ));
        assert!(h.service.read_raw(&private.id, Some(&owner)).await.is_ok());

        let mut expiring = input("soon gone");
        expiring.expires_in = ExpiresIn::OneDay;
        let expiring = h.service.create(None, expiring).await.unwrap();
        h.clock.advance(Duration::days(2));
        assert!(matches!(
            h.service.read_raw(&expiring.id, None).await,
            Err(PasteError::Expired)
        ));
    }

    #[tokio::test]
    async fn test_private_paste_visibility() {
        let h = harness().await;
        let owner = register(&h.store, "owner").await;
        let other = register(&h.store, "other").await;

        let mut req = input("private body");
        req.is_public = false;
        let created = h.service.create(Some(&owner), req).await.unwrap();

        assert!(matches!(
            h.service.read(&created.id, None).await,
            Err(PasteError::Denied(Denial::Private))
        ));
        assert!(matches!(
            h.service.read(&created.id, Some(&other)).await,
            Err(PasteError::Denied(Denial::Private))
        ));
        assert!(h.service.read(&created.id, Some(&owner)).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_is_partial_and_owner_gated() {
        let h = harness().await;
        let owner = register(&h.store, "editor").await;
        let other = register(&h.store, "intruder").await;
        let created = h.service.create(Some(&owner), input("v1")).await.unwrap();

        let changes = PasteChanges::from_fields(
            Some(String::new()),
            Some("v2".to_string()),
            None,
            Some(false),
        );

        assert!(matches!(
            h.service.update(&created.id, None, changes.clone()).await,
            Err(PasteError::Denied(Denial::NotAuthenticated))
        ));
        assert!(matches!(
            h.service.update(&created.id, Some(&other), changes.clone()).await,
            Err(PasteError::Denied(Denial::NotOwner))
        ));

        h.clock.advance(Duration::seconds(5));
        let updated = h
            .service
            .update(&created.id, Some(&owner), changes)
            .await
            .unwrap();
        assert_eq!(updated.title.as_deref(), Some("notes"));
        assert_eq!(updated.content, "v2");
        assert_eq!(updated.language.as_deref(), Some("rust"));
        assert!(!updated.is_public);
        assert!(updated.updated_at > created.updated_at);
    }

    #[tokio::test]
    async fn test_anonymous_paste_cannot_be_deleted() {
        let h = harness().await;
        let someone = register(&h.store, "someone").await;
        let created = h.service.create(None, input("forever")).await.unwrap();

        assert!(matches!(
            h.service.delete(&created.id, Some(&someone)).await,
            Err(PasteError::Denied(Denial::NotOwner))
        ));
        assert!(h.store.get_paste(&created.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_owner_can_delete() {
        let h = harness().await;
        let owner = register(&h.store, "deleter").await;
        let created = h.service.create(Some(&owner), input("bye")).await.unwrap();

        h.service.delete(&created.id, Some(&owner)).await.unwrap();
        assert!(matches!(
            h.service.read(&created.id, Some(&owner)).await,
            Err(PasteError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_fork_copies_content_and_resets_flags() {
        let h = harness().await;
        let owner = register(&h.store, "author").await;
        let forker = register(&h.store, "forker").await;

        let mut req = input("shared code");
        req.expires_in = ExpiresIn::OneWeek;
        req.burn_after_read = true;
        let original = h.service.create(Some(&owner), req).await.unwrap();

        let forked = h.service.fork(&original.id, Some(&forker)).await.unwrap();
        assert_ne!(forked.id, original.id);
        assert_eq!(forked.content, "shared code");
        assert_eq!(forked.title.as_deref(), Some("notes (Fork)"));
        assert_eq!(forked.language.as_deref(), Some("rust"));
        assert!(forked.is_public);
        assert_eq!(forked.views, 0);
        assert_eq!(forked.expires_at, None);
        assert!(!forked.burn_after_read);
        assert_eq!(forked.owner, Owner::Owned(forker.user_id));

        let anonymous_fork = h.service.fork(&original.id, None).await.unwrap();
        assert_eq!(anonymous_fork.owner, Owner::Anonymous);
    }

    #[tokio::test]
    async fn test_fork_of_private_paste() {
        let h = harness().await;
        let owner = register(&h.store, "privateauthor").await;

        let mut req = input("private");
        req.is_public = false;
        let original = h.service.create(Some(&owner), req).await.unwrap();

        assert!(matches!(
            h.service.fork(&original.id, None).await,
            Err(PasteError::Denied(Denial::Private))
        ));

        let forked = h.service.fork(&original.id, Some(&owner)).await.unwrap();
        assert!(forked.is_public);
    }

    #[tokio::test]
    async fn test_listings_and_dashboard() {
        let h = harness().await;
        let owner = register(&h.store, "lister").await;

        for i in 0..3 {
            let mut req = input(&format!("paste {i}"));
            req.is_public = i != 1;
            h.service.create(Some(&owner), req).await.unwrap();
            h.clock.advance(Duration::seconds(1));
        }
        for i in 0..22 {
            h.service
                .create(None, input(&format!("anon {i}")))
                .await
                .unwrap();
            h.clock.advance(Duration::seconds(1));
        }

        let recent = h.service.list_recent().await.unwrap();
        assert_eq!(recent.len(), 20);
        assert_eq!(recent[0].content, "anon 21");
        assert!(recent.iter().all(|p| p.is_public));

        let public = h.service.list_by_owner(owner.user_id, true).await.unwrap();
        assert_eq!(public.len(), 2);
        assert_eq!(public[0].content, "paste 2");

        let dashboard = h.service.dashboard(&owner).await.unwrap();
        assert_eq!(dashboard.pastes.len(), 3);
        assert_eq!(dashboard.counts.public, 2);
        assert_eq!(dashboard.counts.private, 1);
        assert_eq!(dashboard.counts.total, 3);
    }
}
