use crate::error::{Error, Result};
use crate::services::share_link_service::MAX_TTL_DAYS;
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub public_origin: String,
    pub share_link_ttl_days: i64,
    pub public_rps: u32,
    pub integration_rps: u32,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env("DATABASE_URL")?,
            public_origin: get_env("PUBLIC_ORIGIN")?.trim_end_matches('/').to_string(),
            share_link_ttl_days: share_link_ttl_days()?,
            public_rps: get_env_parse_or("PUBLIC_RPS", 50)?,
            integration_rps: get_env_parse_or("INTEGRATION_RPS", 100)?,
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn share_link_ttl_days() -> Result<i64> {
    let days = get_env_parse_or("SHARE_LINK_TTL_DAYS", 30)?;
    check_ttl_days(days)
}

fn check_ttl_days(days: i64) -> Result<i64> {
    if (1..=MAX_TTL_DAYS).contains(&days) {
        Ok(days)
    } else {
        Err(Error::Config(format!(
            "SHARE_LINK_TTL_DAYS must be between 1 and {}, got {}",
            MAX_TTL_DAYS, days
        )))
    }
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
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

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
