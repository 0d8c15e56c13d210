use std::net::SocketAddr;

use anyhow::Context;

pub const DEFAULT_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let bind_addr = lookup("STUDYHAVEN_ADDR")
            .unwrap_or_else(|| DEFAULT_ADDR.to_string())
            .parse()
            .context("STUDYHAVEN_ADDR must be a socket address like 127.0.0.1:3000")?;

        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self {
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            bind_addr,
            max_connections,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_without_env() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_addr.to_string(), DEFAULT_ADDR);
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn env_values_override_defaults() {
        let config = config_from(&[
            ("STUDYHAVEN_ADDR", "0.0.0.0:8080"),
            ("DATABASE_MAX_CONNECTIONS", "12"),
            ("DATABASE_URL", "postgres://localhost/studyhaven"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.max_connections, 12);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/studyhaven")
        );
    }

    #[test]
    fn bad_address_is_reported() {
        let err = config_from(&[("STUDYHAVEN_ADDR", "not-an-addr")]).unwrap_err();
        assert!(err.to_string().contains("STUDYHAVEN_ADDR"));
    }
}
