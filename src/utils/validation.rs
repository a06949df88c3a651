use validator::{Validate, ValidationErrors};

use crate::dto::provisioning_dto::ProvisioningRequest;
use crate::error::{Error, Result};
use crate::models::profile::Role;

/// Normalized, validated input for a new account.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct NewUser {
    #[validate(length(min = 1, message = "Email obligatoire."))]
    pub email: String,
    #[validate(length(min = 6, message = "Mot de passe >= 6 caractères obligatoire."))]
    pub password: String,
    pub display_name: Option<String>,
    pub role: Role,
    pub active: bool,
}

/// Fields are reported in this order when several are invalid.
const FIELD_ORDER: [&str; 2] = ["email", "password"];

pub fn validate<T: Validate>(val: &T) -> std::result::Result<(), ValidationErrors> {
    val.validate()
}

/// Normalizes a raw request and rejects it with `invalid-argument` on the
/// first bad field (email, then password, then role).
pub fn normalize_request(req: ProvisioningRequest) -> Result<NewUser> {
    let email = req.email.unwrap_or_default().trim().to_lowercase();
    let password = req.password.unwrap_or_default();
    let display_name = req
        .display_name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty());
    let role_text = req
        .role
        .filter(|role| !role.is_empty())
        .unwrap_or_else(|| Role::default().as_str().to_string());

    let mut user = NewUser {
        email,
        password,
        display_name,
        role: Role::default(),
        active: req.active,
    };

    validate(&user).map_err(first_invalid_field)?;

    user.role = role_text
        .trim()
        .parse()
        .map_err(|_| Error::InvalidArgument("Rôle invalide.".to_string()))?;
    Ok(user)
}

fn first_invalid_field(errors: ValidationErrors) -> Error {
    let fields = errors.field_errors();
    let message = FIELD_ORDER
        .iter()
        .filter_map(|field| fields.get(*field))
        .filter_map(|errs| errs.first())
        .find_map(|err| err.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| errors.to_string());
    Error::InvalidArgument(message)
}
