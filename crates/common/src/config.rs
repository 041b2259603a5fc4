use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Deserialize;

/// Relay configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// Listen host (default: loopback, internal only)
    pub host: String,

    /// Listen port
    pub port: u16,

    /// Base URL the downstream agent uses to call back `/done/{id}`
    pub public_url: String,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Plain-text activity log file
    pub log_file: PathBuf,

    /// Maximum number of pooled SQLite connections (default: 5)
    pub db_max_connections: u32,

    /// Downstream agent host
    pub agent_host: String,

    /// Downstream agent port
    pub agent_port: u16,

    /// Bearer credential sent with every agent request
    pub agent_token: String,

    /// `model` field of the chat-completion request
    pub agent_model: String,

    /// Upper bound on a single forward call, in seconds (default: 120)
    pub agent_timeout_secs: u64,

    /// Opaque recipient identifier, only rendered into the agent instruction
    pub recipient: Option<String>,
}

impl RelayConfig {
    /// Load configuration from `.env` and the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let host = var("RELAY_HOST", "127.0.0.1");
        let port: u16 = var("RELAY_PORT", "10020")
            .parse()
            .map_err(|_| anyhow::anyhow!("RELAY_PORT must be a valid u16"))?;
        let public_url = lookup("RELAY_PUBLIC_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("http://{}:{}", host, port));

        Ok(Self {
            public_url,
            database_path: PathBuf::from(var("RELAY_DATABASE_PATH", "relay.db")),
            log_file: PathBuf::from(var("RELAY_LOG_FILE", "relay.log")),
            db_max_connections: var("RELAY_DB_MAX_CONNECTIONS", "5")
                .parse()
                .map_err(|_| anyhow::anyhow!("RELAY_DB_MAX_CONNECTIONS must be a valid u32"))?,
            agent_host: var("AGENT_HOST", "127.0.0.1"),
            agent_port: var("AGENT_PORT", "18789")
                .parse()
                .map_err(|_| anyhow::anyhow!("AGENT_PORT must be a valid u16"))?,
            agent_token: var("AGENT_TOKEN", ""),
            agent_model: var("AGENT_MODEL", "agent:main"),
            agent_timeout_secs: var("AGENT_TIMEOUT_SECS", "120")
                .parse()
                .map_err(|_| anyhow::anyhow!("AGENT_TIMEOUT_SECS must be a valid u64"))?,
            recipient: lookup("RELAY_RECIPIENT").filter(|r| !r.is_empty()),
            host,
            port,
        })
    }

    /// Socket address the relay binds to.
    pub fn listen_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid listen address {}:{}", self.host, self.port))
    }

    /// Chat-completion endpoint of the downstream agent.
    pub fn agent_endpoint(&self) -> String {
        format!(
            "http://{}:{}/v1/chat/completions",
            self.agent_host, self.agent_port
        )
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> anyhow::Result<RelayConfig> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RelayConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 10020);
        assert_eq!(config.public_url, "http://127.0.0.1:10020");
        assert_eq!(config.agent_endpoint(), "http://127.0.0.1:18789/v1/chat/completions");
        assert_eq!(config.agent_timeout_secs, 120);
        assert_eq!(config.agent_model, "agent:main");
        assert!(config.agent_token.is_empty());
        assert!(config.recipient.is_none());
        assert_eq!(config.listen_addr().unwrap().port(), 10020);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("RELAY_PORT", "9000"),
            ("RELAY_PUBLIC_URL", "http://relay.local:9000/"),
            ("AGENT_HOST", "10.0.0.2"),
            ("AGENT_PORT", "8080"),
            ("AGENT_TOKEN", "secret"),
            ("RELAY_RECIPIENT", "+15550100"),
        ])
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.public_url, "http://relay.local:9000");
        assert_eq!(config.agent_endpoint(), "http://10.0.0.2:8080/v1/chat/completions");
        assert_eq!(config.agent_token, "secret");
        assert_eq!(config.recipient.as_deref(), Some("+15550100"));
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let err = load(&[("RELAY_PORT", "not-a-port")]).unwrap_err();
        assert!(err.to_string().contains("RELAY_PORT"));
        assert!(load(&[("AGENT_TIMEOUT_SECS", "-1")]).is_err());
    }
}
