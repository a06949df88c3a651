pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use crate::config::{AuthzMode, BackendMode, Config};
use crate::error::{Error, Result};
use crate::middleware::auth::JwtVerifier;
use crate::models::profile::{ProfileRecord, Role};
use crate::services::{
    authorization_service::{CallerAuthorizer, ClaimRoleGate, ProfileRoleGate},
    identity_provider::{IdentityProvider, RestIdentityProvider},
    memory::{InMemoryIdentityProvider, InMemoryProfileStore},
    profile_store::{PgProfileStore, ProfileStore},
    provisioning_service::ProvisioningService,
};

#[derive(Clone)]
pub struct AppState {
    pub provisioning: ProvisioningService,
    pub verifier: JwtVerifier,
}

impl AppState {
    pub fn new(provisioning: ProvisioningService, verifier: JwtVerifier) -> Self {
        Self {
            provisioning,
            verifier,
        }
    }

    /// Wires the collaborators selected by `config`. The pool is required in
    /// postgres mode and ignored in memory mode.
    pub async fn from_config(config: &Config, pool: Option<sqlx::PgPool>) -> Result<Self> {
        let (identity, profiles): (Arc<dyn IdentityProvider>, Arc<dyn ProfileStore>) =
            match config.backend_mode {
                BackendMode::Postgres => {
                    let pool = pool.ok_or_else(|| {
                        Error::Config("postgres backend requires a database pool".to_string())
                    })?;
                    let base_url = config.identity_provider_url.as_deref().ok_or_else(|| {
                        Error::Config("Missing environment variable: IDENTITY_PROVIDER_URL".to_string())
                    })?;
                    let identity: Arc<dyn IdentityProvider> = Arc::new(RestIdentityProvider::new(
                        base_url,
                        config.identity_provider_token.clone(),
                    )?);
                    let profiles: Arc<dyn ProfileStore> = Arc::new(PgProfileStore::new(pool));
                    (identity, profiles)
                }
                BackendMode::Memory => {
                    let store = InMemoryProfileStore::new();
                    if let Some(uid) = &config.bootstrap_admin_uid {
                        store.insert(bootstrap_admin(uid)).await;
                        tracing::info!(%uid, "Seeded bootstrap admin profile");
                    }
                    let identity: Arc<dyn IdentityProvider> = Arc::new(InMemoryIdentityProvider::new());
                    let profiles: Arc<dyn ProfileStore> = Arc::new(store);
                    (identity, profiles)
                }
            };

        let authorizer: Arc<dyn CallerAuthorizer> = match config.authz_mode {
            AuthzMode::Profile => Arc::new(ProfileRoleGate::new(profiles.clone())),
            AuthzMode::Claim => Arc::new(ClaimRoleGate),
        };

        Ok(Self::new(
            ProvisioningService::new(authorizer, identity, profiles),
            JwtVerifier::new(&config.jwt_secret),
        ))
    }
}

fn bootstrap_admin(uid: &str) -> ProfileRecord {
    let now = utils::time::now();
    ProfileRecord {
        uid: uid.to_string(),
        email: format!("{}@bootstrap.local", uid),
        display_name: None,
        role: Role::Admin.as_str().to_string(),
        active: true,
        created_at: now,
        updated_at: now,
    }
}
