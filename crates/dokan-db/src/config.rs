//! Dokan configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! | Variable                   | Default      |
//! |----------------------------|--------------|
//! | `DOKAN_DB_PATH`            | `./dokan.db` |
//! | `DOKAN_DB_MAX_CONNECTIONS` | `5`          |
//! | `DOKAN_PAGE_SIZE`          | `10`         |
//! | `DOKAN_CURRENCY_SYMBOL`    | `৳`          |

use dokan_core::{Money, DEFAULT_PAGE_SIZE};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::pool::DbConfig;

const IN_MEMORY: &str = ":memory:";

/// Runtime configuration for a Dokan installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DokanConfig {
    /// SQLite database file (`:memory:` for a throwaway database)
    pub db_path: PathBuf,

    /// Pool size
    pub max_connections: u32,

    /// Rows per page on the transactions screen
    pub page_size: usize,

    /// Symbol shown in front of amounts
    pub currency_symbol: String,
}

impl Default for DokanConfig {
    fn default() -> Self {
        DokanConfig {
            db_path: PathBuf::from("./dokan.db"),
            max_connections: 5,
            page_size: DEFAULT_PAGE_SIZE,
            currency_symbol: "৳".to_string(),
        }
    }
}

impl DokanConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = DokanConfig::default();

        let config = DokanConfig {
            db_path: lookup("DOKAN_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),

            max_connections: parse_positive(&lookup, "DOKAN_DB_MAX_CONNECTIONS")?
                .unwrap_or(defaults.max_connections),

            page_size: parse_positive(&lookup, "DOKAN_PAGE_SIZE")?.unwrap_or(defaults.page_size),

            currency_symbol: lookup("DOKAN_CURRENCY_SYMBOL").unwrap_or(defaults.currency_symbol),
        };

        Ok(config)
    }

    /// Pool configuration for this installation.
    pub fn db_config(&self) -> DbConfig {
        if self.db_path.as_os_str() == IN_MEMORY {
            DbConfig::in_memory()
        } else {
            DbConfig::new(&self.db_path).max_connections(self.max_connections)
        }
    }

    /// Formats an amount for display.
    ///
    /// ## Example
    /// ```rust
    /// use dokan_core::Money;
    /// use dokan_db::config::DokanConfig;
    ///
    /// let config = DokanConfig::default();
    /// assert_eq!(config.format_currency(Money::from_poisha(123_450)), "৳1234.50");
    /// ```
    pub fn format_currency(&self, amount: Money) -> String {
        let poisha = amount.poisha();
        format!(
            "{}{}{}.{:02}",
            if poisha < 0 { "-" } else { "" },
            self.currency_symbol,
            (poisha / 100).abs(),
            (poisha % 100).abs()
        )
    }
}

fn parse_positive<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };

    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => Ok(Some(value)),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw,
        }),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },
}
