use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub web: WebConfig,
    // These fields will be populated from the .env file
    pub database_path: String,
    pub allowed_origins: String,
    pub log_level: String,
    pub jwt_secret: String,
    pub jwt_issuer: Option<String>,
    pub jwt_audience: Option<String>,
    pub stripe_secret_key: String,
    pub payment_currency: String,
    pub payment_api_base: String,
}

fn required_var(name: &str) -> Result<String, config::ConfigError> {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| config::ConfigError::Message(format!(
            "FATAL: Environment variable '{}' is not set in your .env file.", name
        )))
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

impl Config {
    pub fn from_env(env_path: &Path) -> Result<Self, config::ConfigError> {
        dotenvy::from_path(env_path)
            .map_err(|e| config::ConfigError::Message(format!(
                "FATAL: Failed to load .env file from '{}'. Error: {}", env_path.display(), e
            )))?;

        let database_path = required_var("DATABASE_PATH")?;
        let jwt_secret = required_var("JWT_SECRET")?;
        let stripe_secret_key = required_var("STRIPE_SECRET_KEY")?;

        let allowed_origins = env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| "".to_string());
        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let payment_currency = optional_var("PAYMENT_CURRENCY")
            .unwrap_or_else(|| "usd".to_string())
            .to_lowercase();
        let payment_api_base = optional_var("PAYMENT_API_BASE")
            .unwrap_or_else(|| "https://api.stripe.com".to_string());

        if Path::new(&database_path).is_relative() {
            return Err(config::ConfigError::Message(format!(
                "FATAL: The 'DATABASE_PATH' in your .env file is a relative path ('{}'). It MUST be an absolute path.",
                database_path
            )));
        }

        if url::Url::parse(&payment_api_base).is_err() {
            return Err(config::ConfigError::Message(format!(
                "FATAL: 'PAYMENT_API_BASE' is not a valid URL ('{}').", payment_api_base
            )));
        }

        if payment_currency.len() != 3 || !payment_currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(config::ConfigError::Message(
                "FATAL: 'PAYMENT_CURRENCY' must be a three-letter ISO currency code.".to_string()
            ));
        }

        let mut builder = config::Config::builder()
            // Base settings (web host/port) come from the TOML file.
            .add_source(config::File::new("config/default.toml", config::FileFormat::Toml))
            .set_override("database_path", database_path)?
            .set_override("allowed_origins", allowed_origins)?
            .set_override("log_level", log_level)?
            .set_override("jwt_secret", jwt_secret)?
            .set_override("stripe_secret_key", stripe_secret_key)?
            .set_override("payment_currency", payment_currency)?
            .set_override("payment_api_base", payment_api_base)?;

        if let Some(issuer) = optional_var("JWT_ISSUER") {
            builder = builder.set_override("jwt_issuer", issuer)?;
        }
        if let Some(audience) = optional_var("JWT_AUDIENCE") {
            builder = builder.set_override("jwt_audience", audience)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Returns the full path to the users database file inside its own folder.
    pub fn users_db_path(&self) -> PathBuf {
        PathBuf::from(&self.database_path)
            .join("users")
            .join("users.db")
    }

    /// Returns the full path to the records database (donation requests, blogs, funding).
    pub fn records_db_path(&self) -> PathBuf {
        PathBuf::from(&self.database_path)
            .join("records")
            .join("records.db")
    }
}
