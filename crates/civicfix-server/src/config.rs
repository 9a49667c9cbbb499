use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Session secrets that must be replaced before going to production.
const PLACEHOLDER_SECRETS: &[&str] = &["civicfix_secret_key", "change-me"];

pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub upload_dir: PathBuf,
    pub session_secret: String,
    pub cookie_secure: bool,
    pub admin_email: String,
    pub admin_password: String,
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset keys take defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let port = var("CIVICFIX_PORT", "5000")
            .parse()
            .context("CIVICFIX_PORT must be a port number")?;
        let cookie_secure = parse_bool(&var("CIVICFIX_COOKIE_SECURE", "true"))
            .context("CIVICFIX_COOKIE_SECURE must be true or false")?;
        let max_upload_bytes = var("CIVICFIX_MAX_UPLOAD_BYTES", "26214400")
            .parse()
            .context("CIVICFIX_MAX_UPLOAD_BYTES must be a byte count")?;

        Ok(Self {
            host: var("CIVICFIX_HOST", "0.0.0.0"),
            port,
            db_path: var("CIVICFIX_DB_PATH", "civicfix.db").into(),
            upload_dir: var("CIVICFIX_UPLOAD_DIR", "uploads").into(),
            session_secret: var("CIVICFIX_SESSION_SECRET", "civicfix_secret_key"),
            cookie_secure,
            admin_email: var("CIVICFIX_ADMIN_EMAIL", "admin@civicfix.com"),
            admin_password: var("CIVICFIX_ADMIN_PASSWORD", "admin123"),
            max_upload_bytes,
        })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }

    pub fn has_placeholder_secret(&self) -> bool {
        self.session_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&self.session_secret.as_str())
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
