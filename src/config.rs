use std::env;

use thiserror::Error;

use crate::infrastructure::receipt_pdf::DEFAULT_LINE_LIMIT_CHARS;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has an invalid value '{value}'")]
    Invalid { var: &'static str, value: String },
}

/// Runtime settings, read from the environment (and `.env` via dotenvy).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// HS256 secret used to verify bearer tokens.
    pub jwt_secret: String,
    /// HS256 secret used to sign the staged-cart cookie.
    pub staged_cart_secret: String,
    pub receipt_line_limit: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let required = |var: &'static str| lookup(var).ok_or(ConfigError::Missing(var));

        let port = match lookup("PORT") {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::Invalid { var: "PORT", value })?,
            None => 8080,
        };
        let receipt_line_limit = match lookup("RECEIPT_LINE_LIMIT") {
            Some(value) => match value.parse::<usize>() {
                Ok(limit) if limit > 0 => limit,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "RECEIPT_LINE_LIMIT",
                        value,
                    })
                }
            },
            None => DEFAULT_LINE_LIMIT_CHARS,
        };

        Ok(AppConfig {
            database_url: required("DATABASE_URL")?,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            jwt_secret: required("JWT_SECRET")?,
            staged_cart_secret: required("STAGED_CART_SECRET")?,
            receipt_line_limit,
        })
    }
}
