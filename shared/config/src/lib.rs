use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Database pool size
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Base64-encoded 32-byte key for encrypting OAuth client secrets at rest.
    /// When unset, secrets are stored in plaintext.
    pub secret_encryption_key: Option<String>,

    /// Timeout in seconds for outbound HTTP (OAuth providers, email APIs)
    #[serde(default = "default_outbound_timeout")]
    pub outbound_timeout_seconds: u64,

    /// Admin session lifetime in minutes (sliding)
    #[serde(default = "default_admin_session_minutes")]
    pub admin_session_minutes: i64,

    /// Bootstrap admin email (created at startup if no admin exists)
    pub bootstrap_admin_email: Option<String>,

    /// Bootstrap admin password
    pub bootstrap_admin_password: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_max_connections() -> u32 {
    5
}

fn default_outbound_timeout() -> u64 {
    10
}

fn default_admin_session_minutes() -> i64 {
    30
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, config::ConfigError> {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        let builder = config::Config::builder()
            .set_default("database_url", "")?
            .set_default("host", "0.0.0.0")?
            .set_default("port", 3000)?
            .set_default("max_connections", 5)?
            .set_default("outbound_timeout_seconds", 10)?
            .set_default("admin_session_minutes", 30)?
            .add_source(config::Environment::default());

        builder.build()?.try_deserialize::<Config>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(default_port(), 3000);
        assert_eq!(default_admin_session_minutes(), 30);
        assert_eq!(default_outbound_timeout(), 10);
    }
}
