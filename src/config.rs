use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendMode {
    Postgres,
    Memory,
}

impl FromStr for BackendMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" => Ok(BackendMode::Postgres),
            "memory" => Ok(BackendMode::Memory),
            other => Err(format!("unknown backend mode '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthzMode {
    Profile,
    Claim,
}

impl FromStr for AuthzMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "profile" => Ok(AuthzMode::Profile),
            "claim" => Ok(AuthzMode::Claim),
            other => Err(format!("unknown authorization mode '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub jwt_secret: String,
    pub backend_mode: BackendMode,
    pub authz_mode: AuthzMode,
    pub database_url: Option<String>,
    pub identity_provider_url: Option<String>,
    pub identity_provider_token: Option<String>,
    pub bootstrap_admin_uid: Option<String>,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let backend_mode = get_env_parse_or("BACKEND_MODE", BackendMode::Postgres)?;
        let (database_url, identity_provider_url) = match backend_mode {
            BackendMode::Postgres => (
                Some(get_env("DATABASE_URL")?),
                Some(get_env("IDENTITY_PROVIDER_URL")?),
            ),
            BackendMode::Memory => (
                env::var("DATABASE_URL").ok(),
                env::var("IDENTITY_PROVIDER_URL").ok(),
            ),
        };

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            jwt_secret: get_env("JWT_SECRET")?,
            backend_mode,
            authz_mode: get_env_parse_or("AUTHZ_MODE", AuthzMode::Profile)?,
            database_url,
            identity_provider_url,
            identity_provider_token: env::var("IDENTITY_PROVIDER_TOKEN").ok(),
            bootstrap_admin_uid: env::var("BOOTSTRAP_ADMIN_UID").ok(),
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> Result<&'static Config> {
    CONFIG
        .get()
        .ok_or_else(|| Error::Config("Configuration has not been initialized".to_string()))
}
