//! In-process collaborators for local runs (`BACKEND_MODE=memory`) and tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::profile::{ProfileRecord, ProfileUpsert};
use crate::services::identity_provider::{CreatedAccount, IdentityProvider, NewAccount, ProviderError};
use crate::services::profile_store::ProfileStore;
use crate::utils::{crypto, time};

#[derive(Default)]
pub struct InMemoryProfileStore {
    profiles: RwLock<HashMap<String, ProfileRecord>>,
    fail_writes: AtomicBool,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a record as-is, replacing any existing one.
    pub async fn insert(&self, record: ProfileRecord) {
        self.profiles.write().await.insert(record.uid.clone(), record);
    }

    pub async fn get_profile(&self, uid: &str) -> Option<ProfileRecord> {
        self.profiles.read().await.get(uid).cloned()
    }

    pub async fn len(&self) -> usize {
        self.profiles.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.profiles.read().await.is_empty()
    }

    /// Makes every subsequent `upsert_merge` fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn get(&self, uid: &str) -> Result<Option<ProfileRecord>> {
        Ok(self.get_profile(uid).await)
    }

    async fn upsert_merge(&self, upsert: ProfileUpsert) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Internal("profile store unavailable".to_string()));
        }

        let now = time::now();
        let mut profiles = self.profiles.write().await;
        let created_at = profiles
            .get(&upsert.uid)
            .map(|existing| existing.created_at)
            .unwrap_or(now);
        profiles.insert(
            upsert.uid.clone(),
            ProfileRecord {
                uid: upsert.uid,
                email: upsert.email,
                display_name: upsert.display_name,
                role: upsert.role.as_str().to_string(),
                active: upsert.active,
                created_at,
                updated_at: now,
            },
        );
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct StoredAccount {
    pub uid: String,
    pub email: String,
    pub password_hash: String,
    pub display_name: Option<String>,
    pub disabled: bool,
}

/// Identity provider keyed by email; duplicate emails are refused the way
/// a real provider refuses them.
#[derive(Default)]
pub struct InMemoryIdentityProvider {
    accounts: RwLock<HashMap<String, StoredAccount>>,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn account(&self, email: &str) -> Option<StoredAccount> {
        self.accounts.read().await.get(email).cloned()
    }

    pub async fn len(&self) -> usize {
        self.accounts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.accounts.read().await.is_empty()
    }

    pub async fn verify_credentials(&self, email: &str, password: &str) -> bool {
        match self.accounts.read().await.get(email) {
            Some(account) => crypto::verify_password(password, &account.password_hash).unwrap_or(false),
            None => false,
        }
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn create_user(&self, account: NewAccount) -> std::result::Result<CreatedAccount, ProviderError> {
        if self.accounts.read().await.contains_key(&account.email) {
            return Err(email_taken());
        }

        // Hashing runs outside the lock; the email is checked again before insert.
        let password = account.password.clone();
        let password_hash = tokio::task::spawn_blocking(move || crypto::hash_password(&password))
            .await
            .map_err(|e| ProviderError::new("auth/internal-error", e.to_string()))?
            .map_err(|e| ProviderError::new("auth/internal-error", e.to_string()))?;

        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&account.email) {
            return Err(email_taken());
        }
        let uid = Uuid::new_v4().simple().to_string();
        accounts.insert(
            account.email.clone(),
            StoredAccount {
                uid: uid.clone(),
                email: account.email,
                password_hash,
                display_name: account.display_name,
                disabled: account.disabled,
            },
        );
        Ok(CreatedAccount { uid })
    }
}

fn email_taken() -> ProviderError {
    ProviderError::new(
        "auth/email-already-exists",
        "The email address is already in use by another account.",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::Role;

    fn upsert(uid: &str, role: Role) -> ProfileUpsert {
        ProfileUpsert {
            uid: uid.to_string(),
            email: "a@b.com".to_string(),
            display_name: None,
            role,
            active: true,
        }
    }

    #[tokio::test]
    async fn merge_preserves_created_at() {
        let store = InMemoryProfileStore::new();
        store.upsert_merge(upsert("u1", Role::Fermier)).await.unwrap();
        let first = store.get("u1").await.unwrap().unwrap();

        store.upsert_merge(upsert("u1", Role::Depot)).await.unwrap();
        let second = store.get("u1").await.unwrap().unwrap();

        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at >= first.updated_at);
        assert_eq!(second.role, "DEPOT");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn failing_writes_leave_the_store_untouched() {
        let store = InMemoryProfileStore::new();
        store.set_fail_writes(true);
        assert!(store.upsert_merge(upsert("u1", Role::Admin)).await.is_err());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn provider_refuses_duplicate_email_and_hashes_passwords() {
        let provider = InMemoryIdentityProvider::new();
        let account = NewAccount {
            email: "a@b.com".into(),
            password: "secret1".into(),
            display_name: Some("A".into()),
            disabled: false,
        };

        let created = provider.create_user(account.clone()).await.unwrap();
        let stored = provider.account("a@b.com").await.unwrap();
        assert_eq!(stored.uid, created.uid);
        assert_ne!(stored.password_hash, "secret1");
        assert!(provider.verify_credentials("a@b.com", "secret1").await);

        let err = provider.create_user(account).await.unwrap_err();
        assert!(err.code.contains("email-already-exists"));
        assert_eq!(provider.len().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_creates_with_one_email_keep_a_single_account() {
        let provider = std::sync::Arc::new(InMemoryIdentityProvider::new());
        let account = NewAccount {
            email: "race@b.com".into(),
            password: "secret1".into(),
            display_name: None,
            disabled: false,
        };

        let first = tokio::spawn({
            let provider = provider.clone();
            let account = account.clone();
            async move { provider.create_user(account).await }
        });
        let second = tokio::spawn({
            let provider = provider.clone();
            async move { provider.create_user(account).await }
        });
        let results = [first.await.unwrap(), second.await.unwrap()];

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        let err = results.iter().find_map(|r| r.as_ref().err()).unwrap();
        assert_eq!(err.code, "auth/email-already-exists");
        assert_eq!(provider.len().await, 1);
    }
}
