use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    #[default]
    Fermier,
    Veterinaire,
    Depot,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Fermier, Role::Veterinaire, Role::Depot];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Fermier => "FERMIER",
            Role::Veterinaire => "VETERINAIRE",
            Role::Depot => "DEPOT",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exact, case-sensitive match against the fixed role names.
impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| format!("unknown role '{}'", s))
    }
}

/// Mirrored per-user document. `role` is kept as stored text so records
/// written by other tools with unexpected values still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
    pub role: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields merged into a profile on upsert. Timestamps are server-assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileUpsert {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
    pub role: Role,
    pub active: bool,
}
