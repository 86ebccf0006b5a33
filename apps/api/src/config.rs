use anyhow::{bail, Context, Result};

use crate::models::user::Role;
use crate::pipeline::policy::{Action, Policy};

/// Items per page on the resume listing.
const DEFAULT_PAGE_SIZE: usize = 3;

#[derive(Debug, Clone)]
pub struct S3Settings {
    pub bucket: String,
    pub endpoint: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Where records and blobs live.
#[derive(Debug, Clone)]
pub enum StorageBackend {
    /// Redis record store + S3 blob store.
    External { redis_url: String, s3: S3Settings },
    /// Process-local stores; data is lost on restart.
    Memory,
}

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub storage: StorageBackend,
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    pub page_size: usize,
    pub policy: Policy,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let storage = match optional_env("STORE_BACKEND").as_deref() {
            None | Some("redis") => StorageBackend::External {
                redis_url: require_env("REDIS_URL")?,
                s3: S3Settings {
                    bucket: require_env("S3_BUCKET")?,
                    endpoint: require_env("S3_ENDPOINT")?,
                    region: optional_env("S3_REGION").unwrap_or_else(|| "us-east-1".to_string()),
                    access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
                    secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
                },
            },
            Some("memory") => StorageBackend::Memory,
            Some(other) => bail!("STORE_BACKEND must be 'redis' or 'memory', got '{other}'"),
        };

        let page_size = match optional_env("PAGE_SIZE") {
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|size| *size > 0)
                .with_context(|| format!("PAGE_SIZE must be a positive integer, got '{raw}'"))?,
            None => DEFAULT_PAGE_SIZE,
        };

        Ok(Config {
            storage,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            page_size,
            policy: policy_from_env()?,
        })
    }
}

/// Starts from the default policy and applies any `PERMIT_<ACTION>` overrides.
fn policy_from_env() -> Result<Policy> {
    let mut policy = Policy::default();
    for action in Action::ALL {
        let key = action.env_key();
        if let Some(raw) = optional_env(&key) {
            let roles = parse_roles(&raw).with_context(|| format!("Invalid {key}"))?;
            policy = policy.with_grant(action, roles);
        }
    }
    Ok(policy)
}

/// Parses a comma-separated role list. An empty list grants nobody.
fn parse_roles(raw: &str) -> Result<Vec<Role>> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| Role::parse(name).with_context(|| format!("unknown role '{name}'")))
        .collect()
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
