use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: Option<String>,
}

/// Authenticated subject attached to a request by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub uid: String,
    pub role_claim: Option<String>,
}

impl CallerIdentity {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            role_claim: None,
        }
    }

    pub fn with_role_claim(mut self, role: impl Into<String>) -> Self {
        self.role_claim = Some(role.into());
        self
    }
}

impl From<Claims> for CallerIdentity {
    fn from(claims: Claims) -> Self {
        Self {
            uid: claims.sub,
            role_claim: claims.role,
        }
    }
}

#[derive(Clone)]
pub struct JwtVerifier {
    key: Arc<DecodingKey>,
    validation: Arc<Validation>,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        Self {
            key: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
            validation: Arc::new(validation),
        }
    }

    pub fn verify(&self, token: &str) -> Result<CallerIdentity, jsonwebtoken::errors::Error> {
        let data = decode::<Claims>(token, &self.key, &self.validation)?;
        Ok(data.claims.into())
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Attaches a `CallerIdentity` when the request carries a valid bearer
/// token. Never rejects; an absent identity is handled by the gate.
pub async fn attach_caller_identity(
    State(verifier): State<JwtVerifier>,
    mut req: Request,
    next: Next,
) -> Response {
    let identity = match bearer_token(req.headers()) {
        Some(token) => match verifier.verify(token) {
            Ok(identity) => Some(identity),
            Err(err) => {
                tracing::warn!(error = %err, "Rejected caller token");
                None
            }
        },
        None => None,
    };

    if let Some(identity) = identity {
        req.extensions_mut().insert(identity);
    }
    next.run(req).await
}
