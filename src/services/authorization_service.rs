use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::middleware::auth::CallerIdentity;
use crate::models::profile::Role;
use crate::services::profile_store::ProfileStore;

/// Decides whether a caller may run an administrative operation.
#[async_trait]
pub trait CallerAuthorizer: Send + Sync {
    async fn authorize(&self, caller: Option<&CallerIdentity>) -> Result<()>;
}

fn require_caller(caller: Option<&CallerIdentity>) -> Result<&CallerIdentity> {
    caller.ok_or_else(|| Error::Unauthenticated("Vous devez être connecté.".to_string()))
}

/// Re-reads the caller's profile and requires an active ADMIN record.
#[derive(Clone)]
pub struct ProfileRoleGate {
    store: Arc<dyn ProfileStore>,
}

impl ProfileRoleGate {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CallerAuthorizer for ProfileRoleGate {
    async fn authorize(&self, caller: Option<&CallerIdentity>) -> Result<()> {
        let caller = require_caller(caller)?;

        let profile = self
            .store
            .get(&caller.uid)
            .await?
            .ok_or_else(|| Error::PermissionDenied("Profil introuvable.".to_string()))?;

        if !profile.active {
            return Err(Error::PermissionDenied("Compte inactif.".to_string()));
        }
        if profile.role != Role::Admin.as_str() {
            return Err(Error::PermissionDenied("Action réservée ADMIN.".to_string()));
        }
        Ok(())
    }
}

/// Trusts the `role` claim of the caller's token; no profile read.
#[derive(Clone, Copy, Default)]
pub struct ClaimRoleGate;

#[async_trait]
impl CallerAuthorizer for ClaimRoleGate {
    async fn authorize(&self, caller: Option<&CallerIdentity>) -> Result<()> {
        let caller = require_caller(caller)?;
        match caller.role_claim.as_deref() {
            Some(role) if role == Role::Admin.as_str() => Ok(()),
            _ => Err(Error::PermissionDenied("Action réservée ADMIN.".to_string())),
        }
    }
}
