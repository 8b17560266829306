use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use tracing::warn;

/// Placeholder JWT secret used when none is configured.
const DEV_SECRET: &str = "dev-secret-change-me";

/// Process configuration, read once from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub host: String,
    pub port: u16,
    /// Put a bearer-token check on the data routes. Off by default.
    pub require_auth: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let jwt_secret = get("MYSTERY_JWT_SECRET").filter(|s| !s.is_empty()).unwrap_or_else(|| {
            warn!("MYSTERY_JWT_SECRET is unset, signing tokens with the development secret");
            DEV_SECRET.into()
        });

        let port = match get("MYSTERY_PORT") {
            Some(raw) => raw.parse().with_context(|| format!("invalid MYSTERY_PORT '{}'", raw))?,
            None => 5000,
        };

        let require_auth = match get("MYSTERY_REQUIRE_AUTH").as_deref() {
            None | Some("") | Some("0") | Some("false") => false,
            Some("1") | Some("true") => true,
            Some(other) => anyhow::bail!("invalid MYSTERY_REQUIRE_AUTH '{}'", other),
        };

        Ok(Self {
            db_path: get("MYSTERY_DB_PATH").unwrap_or_else(|| "mystery.db".into()).into(),
            jwt_secret,
            host: get("MYSTERY_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            require_auth,
        })
    }

    pub fn listen_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse().with_context(|| format!("invalid listen address '{}'", addr))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config(&[]).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.jwt_secret, DEV_SECRET);
        assert_eq!(config.db_path, PathBuf::from("mystery.db"));
        assert!(!config.require_auth);
        assert_eq!(config.listen_addr().unwrap().to_string(), "0.0.0.0:5000");
    }

    #[test]
    fn reads_overrides() {
        let config = config(&[
            ("MYSTERY_PORT", "8081"),
            ("MYSTERY_HOST", "127.0.0.1"),
            ("MYSTERY_JWT_SECRET", "s3cret"),
            ("MYSTERY_REQUIRE_AUTH", "true"),
        ])
        .unwrap();
        assert_eq!(config.listen_addr().unwrap().to_string(), "127.0.0.1:8081");
        assert_eq!(config.jwt_secret, "s3cret");
        assert!(config.require_auth);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(config(&[("MYSTERY_PORT", "seventy")]).is_err());
        assert!(config(&[("MYSTERY_REQUIRE_AUTH", "maybe")]).is_err());
    }
}
