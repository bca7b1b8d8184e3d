use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub broker: BrokerConfig,
    pub port: u16,
    pub admin_username: String,
    pub admin_password: String,
    pub jwt_secret: String,
    pub jwt_issuer: String,
}

/// PostgreSQL connection settings
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// NATS JetStream settings
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    pub url: String,
    pub stream: String,
    /// Subjects bound to the stream
    pub subjects: Vec<String>,
    /// How long a single publish waits for its JetStream acknowledgement
    pub ack_timeout: Duration,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            url: "nats://localhost:4222".to_string(),
            stream: "COMPANIES".to_string(),
            subjects: vec!["companies.>".to_string()],
            ack_timeout: Duration::from_millis(5000),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let defaults = BrokerConfig::default();

        Ok(Self {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .context("DATABASE_MAX_CONNECTIONS must be a valid number")?,
            },
            broker: BrokerConfig {
                url: env::var("NATS_URL").unwrap_or(defaults.url),
                stream: env::var("NATS_STREAM").unwrap_or(defaults.stream),
                subjects: defaults.subjects,
                ack_timeout: match env::var("NATS_ACK_TIMEOUT_MS") {
                    Ok(ms) => Duration::from_millis(
                        ms.parse()
                            .context("NATS_ACK_TIMEOUT_MS must be a valid number")?,
                    ),
                    Err(_) => defaults.ack_timeout,
                },
            },
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            admin_username: env::var("ADMIN_USERNAME").context("ADMIN_USERNAME must be set")?,
            admin_password: env::var("ADMIN_PASSWORD").context("ADMIN_PASSWORD must be set")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "company-service".to_string()),
        })
    }
}
