use secrecy::Secret;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub base_url: String,
    pub host: String,
    pub port: u16,

    // Hosted data service (REST data API)
    pub supabase_url: String,
    pub supabase_anon_key: Secret<String>,

    // Direct Postgres connection, used for sessions and migrations
    pub database_url: String,

    // Platform admin
    pub admin_token: Secret<String>,

    // Security
    pub secure_cookies: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        // Load .env file if it exists (for local development)
        let _ = dotenvy::dotenv();

        let config = config::Config::builder()
            .add_source(config::Environment::default().separator("__"))
            .build()?;

        Ok(Self {
            base_url: config.get("base_url")?,
            host: config.get("host").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: config.get("port")?,

            supabase_url: config.get("supabase_url")?,
            supabase_anon_key: Secret::new(config.get("supabase_anon_key")?),

            database_url: config.get("database_url")?,

            admin_token: Secret::new(config.get("admin_token")?),

            secure_cookies: config.get("secure_cookies").unwrap_or(true),
        })
    }

    /// Public URL a dynamic route code is reachable at.
    pub fn dynamic_link(&self, code: &str) -> String {
        format!("{}/d/{}", self.base_url.trim_end_matches('/'), code)
    }
}
