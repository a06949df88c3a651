use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use crate::dto::provisioning_dto::{ProvisioningRequest, ProvisioningResult};
use crate::error::{Error, Result};
use crate::middleware::auth::CallerIdentity;
use crate::models::profile::ProfileUpsert;
use crate::services::authorization_service::CallerAuthorizer;
use crate::services::identity_provider::{IdentityProvider, NewAccount};
use crate::services::profile_store::ProfileStore;
use crate::utils::validation::{normalize_request, NewUser};

/// Runs `adminCreateUser`: gate, validate, create the provider account,
/// then mirror the profile.
///
/// The two writes are not atomic. If the account is created and the profile
/// write fails, the account stays behind without a profile; the error is
/// reported as `internal` and the orphaned uid is logged for reconciliation.
#[derive(Clone)]
pub struct ProvisioningService {
    authorizer: Arc<dyn CallerAuthorizer>,
    identity: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileStore>,
}

impl ProvisioningService {
    pub fn new(
        authorizer: Arc<dyn CallerAuthorizer>,
        identity: Arc<dyn IdentityProvider>,
        profiles: Arc<dyn ProfileStore>,
    ) -> Self {
        Self {
            authorizer,
            identity,
            profiles,
        }
    }

    /// Runs only the caller gate.
    pub async fn authorize(&self, caller: Option<&CallerIdentity>) -> Result<()> {
        self.authorizer.authorize(caller).await.map_err(|err| {
            warn!(code = err.code(), "Provisioning refused by gate");
            err
        })
    }

    #[instrument(skip_all, fields(caller = caller.map(|c| c.uid.as_str()).unwrap_or("-")))]
    pub async fn admin_create_user(
        &self,
        caller: Option<&CallerIdentity>,
        request: ProvisioningRequest,
    ) -> Result<ProvisioningResult> {
        self.authorize(caller).await?;

        let user = normalize_request(request).map_err(|err| {
            warn!(code = err.code(), "Provisioning request rejected");
            err
        })?;

        let role = user.role;
        let uid = self.create_account(&user).await?;
        self.mirror_profile(&uid, user).await?;

        info!(%uid, %role, "User provisioned");
        Ok(ProvisioningResult::created(uid))
    }

    async fn create_account(&self, user: &NewUser) -> Result<String> {
        let account = NewAccount {
            email: user.email.clone(),
            password: user.password.clone(),
            display_name: user.display_name.clone(),
            disabled: !user.active,
        };
        let created = self.identity.create_user(account).await.map_err(|err| {
            warn!(code = %err.code, "Identity provider refused account");
            Error::from(err)
        })?;
        Ok(created.uid)
    }

    async fn mirror_profile(&self, uid: &str, user: NewUser) -> Result<()> {
        let upsert = ProfileUpsert {
            uid: uid.to_string(),
            email: user.email,
            display_name: user.display_name,
            role: user.role,
            active: user.active,
        };
        self.profiles.upsert_merge(upsert).await.map_err(|err| {
            error!(%uid, error = %err, "Account created but profile write failed; account is orphaned");
            Error::profile_write(err)
        })
    }
}
