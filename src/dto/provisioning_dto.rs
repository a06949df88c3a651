use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;

/// Scalars are accepted in text form; objects and arrays are rejected.
/// Falsy scalars (`false`, `0`, `""`) count as absent.
fn deserialize_lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<JsonValue>::deserialize(deserializer)? {
        None | Some(JsonValue::Null) | Some(JsonValue::Bool(false)) => Ok(None),
        Some(JsonValue::String(s)) if s.is_empty() => Ok(None),
        Some(JsonValue::String(s)) => Ok(Some(s)),
        Some(JsonValue::Number(n)) => Ok(number_text(&n)),
        Some(JsonValue::Bool(true)) => Ok(Some("true".to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a string, found {}",
            other
        ))),
    }
}

fn number_text(n: &serde_json::Number) -> Option<String> {
    match n.as_f64() {
        Some(f) if f == 0.0 => None,
        Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => Some(format!("{}", f as i64)),
        _ => Some(n.to_string()),
    }
}

/// Only the JSON literal `true` counts as true; anything else is false.
fn deserialize_strict_true<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(matches!(value, Some(JsonValue::Bool(true))))
}

/// Raw `adminCreateUser` input, before normalization.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProvisioningRequest {
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub password: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "deserialize_strict_true")]
    pub active: bool,
}

/// Callable envelope: the payload travels under `data`.
#[derive(Debug, Clone, Deserialize)]
pub struct CallableRequest<T> {
    #[serde(default)]
    pub data: Option<T>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CallableResponse<T> {
    pub result: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProvisioningResult {
    pub ok: bool,
    pub uid: String,
}

impl ProvisioningResult {
    pub fn created(uid: String) -> Self {
        Self { ok: true, uid }
    }
}
