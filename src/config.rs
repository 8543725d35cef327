use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{info, warn};

pub const DEFAULT_CATALOG_URL: &str = "https://api.themoviedb.org/3";
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_BIND: &str = "0.0.0.0:3146";
const DEFAULT_DEMO_PASSWORD: &str = "password123";
const DEV_SECRET_KEY: &str = "streamverse-dev-key";

#[derive(Debug, Clone)]
pub struct Config {
    /// Catalog service credential, sent as `api_key`.
    pub api_key: String,
    pub catalog_url: String,
    /// Directory holding the durable session slot.
    pub data_dir: PathBuf,
    pub bind: SocketAddr,
    /// HMAC key for credential digests.
    pub secret_key: String,
    pub demo_password: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("TMDB_API_KEY")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .context("Missing required environment variable: TMDB_API_KEY")?;

        let catalog_url = var_or("STREAMVERSE_CATALOG_URL", DEFAULT_CATALOG_URL);
        let data_dir = PathBuf::from(var_or("STREAMVERSE_DATA_DIR", DEFAULT_DATA_DIR));
        let bind_raw = var_or("STREAMVERSE_BIND", DEFAULT_BIND);
        let bind = bind_raw
            .parse()
            .with_context(|| format!("Invalid STREAMVERSE_BIND address '{}'", bind_raw))?;

        let secret_key = match env::var("STREAMVERSE_SECRET_KEY")
            .ok()
            .filter(|s| !s.is_empty())
        {
            Some(key) => key,
            None => {
                warn!("STREAMVERSE_SECRET_KEY not set - using the development key");
                DEV_SECRET_KEY.to_string()
            }
        };
        let demo_password = var_or("STREAMVERSE_DEMO_PASSWORD", DEFAULT_DEMO_PASSWORD);

        info!(
            catalog_url = %catalog_url,
            data_dir = %data_dir.display(),
            bind = %bind,
            "Configuration loaded"
        );

        Ok(Self {
            api_key,
            catalog_url,
            data_dir,
            bind,
            secret_key,
            demo_password,
        })
    }
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
