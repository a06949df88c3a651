use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

use crate::services::identity_provider::ProviderError;

pub type Result<T> = std::result::Result<T, Error>;

/// Signal a provider puts in its error code when the email is taken.
pub const EMAIL_ALREADY_EXISTS_SIGNAL: &str = "email-already-exists";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    PermissionDenied(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    AlreadyExists(String),

    #[error("{0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Error {
    /// Stable caller-facing code. Backend-only variants collapse to `internal`.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Unauthenticated(_) => "unauthenticated",
            Error::PermissionDenied(_) => "permission-denied",
            Error::InvalidArgument(_) => "invalid-argument",
            Error::AlreadyExists(_) => "already-exists",
            _ => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Error::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Error::PermissionDenied(_) => StatusCode::FORBIDDEN,
            Error::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            Error::AlreadyExists(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Wraps a failure of the profile write that follows account creation.
    pub fn profile_write(err: Error) -> Self {
        Error::Internal(format!("Erreur création user: {}", err))
    }
}

impl From<ProviderError> for Error {
    fn from(err: ProviderError) -> Self {
        if err.code.contains(EMAIL_ALREADY_EXISTS_SIGNAL) {
            Error::AlreadyExists("Cet email existe déjà dans le fournisseur d'identité.".to_string())
        } else {
            Error::Internal(format!("Erreur création user: {}", err.message))
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let code = self.code();
        let message = match &self {
            Error::Config(_) => "Configuration du serveur invalide.".to_string(),
            other => other.to_string(),
        };

        let body = Json(json!({ "error": { "status": code, "message": message } }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_email_signal_maps_to_already_exists() {
        let err: Error = ProviderError::new(
            "auth/email-already-exists",
            "The email address is already in use by another account.",
        )
        .into();
        assert_eq!(err.code(), "already-exists");
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn other_provider_errors_keep_the_message() {
        let err: Error = ProviderError::new("auth/invalid-password", "PASSWORD_TOO_WEAK").into();
        assert_eq!(err.code(), "internal");
        assert!(err.to_string().contains("PASSWORD_TOO_WEAK"));
    }

    #[test]
    fn backend_variants_collapse_to_internal() {
        let err = Error::Database(sqlx::Error::PoolTimedOut);
        assert_eq!(err.code(), "internal");
        let wrapped = Error::profile_write(err);
        assert_eq!(wrapped.code(), "internal");
        assert!(wrapped.to_string().starts_with("Erreur création user:"));
    }
}
