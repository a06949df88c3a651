use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;

use crate::error::{Error, Result};

/// Error signal returned by an identity provider. `code` is provider
/// specific (`auth/email-already-exists`, ...), `message` is human readable.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ProviderError {
    pub code: String,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreatedAccount {
    pub uid: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn create_user(&self, account: NewAccount) -> std::result::Result<CreatedAccount, ProviderError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignUpResponse {
    local_id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Client for an Identity Toolkit compatible REST endpoint.
#[derive(Clone)]
pub struct RestIdentityProvider {
    client: Client,
    accounts_url: Url,
    bearer_token: Option<String>,
}

impl RestIdentityProvider {
    pub fn new(base_url: &str, bearer_token: Option<String>) -> Result<Self> {
        let base = Url::parse(&format!("{}/", base_url.trim_end_matches('/')))
            .map_err(|e| Error::Config(format!("Invalid IDENTITY_PROVIDER_URL: {}", e)))?;
        let accounts_url = base
            .join("accounts")
            .map_err(|e| Error::Config(format!("Invalid IDENTITY_PROVIDER_URL: {}", e)))?;
        Ok(Self {
            client: Client::new(),
            accounts_url,
            bearer_token,
        })
    }

    pub fn accounts_url(&self) -> &Url {
        &self.accounts_url
    }
}

/// Maps an Identity Toolkit error message (`EMAIL_EXISTS : ...`) to an
/// `auth/...` code.
pub fn provider_error_from_message(message: &str) -> ProviderError {
    let key = message.split([' ', ':']).next().unwrap_or_default().trim();
    let code = match key {
        "EMAIL_EXISTS" | "DUPLICATE_EMAIL" => "auth/email-already-exists".to_string(),
        "" => "auth/internal-error".to_string(),
        other => format!("auth/{}", other.to_ascii_lowercase().replace('_', "-")),
    };
    ProviderError::new(code, message)
}

#[async_trait]
impl IdentityProvider for RestIdentityProvider {
    #[instrument(skip(self, account), fields(email = %account.email))]
    async fn create_user(&self, account: NewAccount) -> std::result::Result<CreatedAccount, ProviderError> {
        let mut request = self.client.post(self.accounts_url.clone()).json(&account);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| ProviderError::new("auth/network-error", e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| ProviderError::new("auth/network-error", e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|env| env.error.message)
                .unwrap_or_else(|_| format!("HTTP {}: {}", status.as_u16(), body));
            return Err(provider_error_from_message(&message));
        }

        let created: SignUpResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::new("auth/internal-error", e.to_string()))?;
        Ok(CreatedAccount {
            uid: created.local_id,
        })
    }
}
