//! API server configuration.

use std::path::PathBuf;
use std::time::Duration;

use companion_core::llm::config::LlmConfig;

/// Default listener address.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:8000").
    pub bind_addr: String,
    /// Upstream model provider settings.
    pub llm: LlmConfig,
    /// Persona text file overriding the built-in persona.
    pub persona_file: Option<PathBuf>,
    /// Credential table as `user:pass,user2:pass2`. `None` uses the built-in table.
    pub users: Option<String>,
    /// Idle expiry for sessions. `None` keeps sessions for the process lifetime.
    pub session_idle_ttl: Option<Duration>,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable                | Default                     |
    /// |-------------------------|-----------------------------|
    /// | `BIND_ADDR`             | `127.0.0.1:8000`            |
    /// | `PERSONA_FILE`          | built-in persona            |
    /// | `COMPANION_USERS`       | `user123:password123`       |
    /// | `SESSION_IDLE_TTL_SECS` | unset (no eviction)         |
    ///
    /// Provider variables are documented on [`LlmConfig::from_env`].
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve from an arbitrary key lookup (env vars in production).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            bind_addr: non_empty("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into()),
            llm: LlmConfig::from_lookup(&lookup),
            persona_file: non_empty("PERSONA_FILE").map(PathBuf::from),
            users: non_empty("COMPANION_USERS"),
            session_idle_ttl: non_empty("SESSION_IDLE_TTL_SECS")
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
