//! Runtime configuration for the chat storage engine.
//!
//! Values come from built-in defaults overlaid with `CHATSTORE__*`
//! environment variables, using `__` to separate nested keys:
//!
//! ```text
//! CHATSTORE__DATABASE__URL=postgres://chat@localhost/chat
//! CHATSTORE__ENGINE__BATCH_SIZE=25
//! CHATSTORE__ENGINE__RATE_LIMIT__MAX_MESSAGES=10
//! CHATSTORE__LOGGING__FORMAT=json
//! ```

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "CHATSTORE";

/// Largest sub-batch a single storage batch statement may carry.
pub const MAX_BATCH_SIZE: usize = 50;

/// Largest page a read may return.
pub const MAX_PAGE_LIMIT: u32 = 500;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or deserialised.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A value is outside its permitted range.
    #[error("invalid configuration value for {key}: {reason}")]
    Invalid {
        /// Dotted configuration key.
        key: &'static str,
        /// Why the value was rejected.
        reason: &'static str,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChatStoreConfig {
    /// Storage backend connection settings.
    pub database: DatabaseConfig,
    /// Log output settings.
    pub logging: LoggingConfig,
    /// Write, read, and rate-limit behaviour.
    pub engine: EngineConfig,
}

impl ChatStoreConfig {
    /// Loads configuration from defaults and the environment, then
    /// validates it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] when an environment value cannot be
    /// deserialised and [`ConfigError::Invalid`] when a value is out of
    /// range.
    pub fn load() -> Result<Self, ConfigError> {
        let loaded: Self = config::Config::builder()
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Checks cross-field and range constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.pool_size == 0 {
            return Err(invalid("database.pool_size", "must be at least 1"));
        }
        self.engine.validate()
    }
}

/// Storage backend connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL; `None` selects the in-memory store.
    pub url: Option<String>,
    /// Maximum pooled connections.
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            pool_size: 8,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable single-line output.
    #[default]
    Compact,
    /// One JSON object per event.
    Json,
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `chatstore=debug`.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::Compact,
        }
    }
}

/// Per-sender write budget consulted before a create.
///
/// # Examples
///
/// ```
/// use chatstore::config::RateLimitPolicy;
///
/// let policy = RateLimitPolicy::default();
/// assert!(policy.permits(4));
/// assert!(!policy.permits(5));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RateLimitPolicy {
    /// Messages a sender may write into one stream per window.
    pub max_messages: u64,
    /// Window length in seconds.
    pub window_seconds: u64,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            max_messages: 5,
            window_seconds: 1,
        }
    }
}

impl RateLimitPolicy {
    /// Returns `true` when a sender with `count` recent messages may write
    /// another.
    #[must_use]
    pub const fn permits(self, count: u64) -> bool {
        count < self.max_messages
    }
}

/// Write, read, and rate-limit behaviour of the service layer.
///
/// The retention TTL is fixed at
/// [`MESSAGE_TTL_SECONDS`](crate::chat::domain::MESSAGE_TTL_SECONDS) and is
/// not configurable. Batch and page sizes may be lowered but never raised
/// past [`MAX_BATCH_SIZE`] and [`MAX_PAGE_LIMIT`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum rows per storage batch, at most [`MAX_BATCH_SIZE`].
    pub batch_size: usize,
    /// Page size used when the caller gives none.
    pub default_page_limit: u32,
    /// Ceiling on page size, at most [`MAX_PAGE_LIMIT`].
    pub max_page_limit: u32,
    /// Maximum message text length in characters.
    pub max_text_length: usize,
    /// Upper bound on each storage statement, in milliseconds.
    pub statement_timeout_ms: u64,
    /// Policy applied by rate-limited creates.
    pub rate_limit: RateLimitPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batch_size: MAX_BATCH_SIZE,
            default_page_limit: 100,
            max_page_limit: MAX_PAGE_LIMIT,
            max_text_length: 2_000,
            statement_timeout_ms: 5_000,
            rate_limit: RateLimitPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Returns the statement timeout as a [`Duration`].
    #[must_use]
    pub const fn statement_timeout(&self) -> Duration {
        Duration::from_millis(self.statement_timeout_ms)
    }

    /// Resolves a caller-supplied page size.
    ///
    /// `None` and `0` select the default; values above the ceiling are
    /// clamped to it. The result never exceeds [`MAX_PAGE_LIMIT`], even for
    /// a configuration that skipped [`Self::validate`].
    #[must_use]
    pub fn page_limit(&self, requested: Option<u32>) -> usize {
        let ceiling = self.max_page_limit.clamp(1, MAX_PAGE_LIMIT);
        let limit = match requested {
            None | Some(0) => self.default_page_limit,
            Some(value) => value,
        };
        usize::try_from(limit.clamp(1, ceiling)).unwrap_or(usize::MAX)
    }

    /// Returns the sub-batch size, between 1 and [`MAX_BATCH_SIZE`].
    #[must_use]
    pub fn sub_batch_size(&self) -> usize {
        self.batch_size.clamp(1, MAX_BATCH_SIZE)
    }

    /// Checks range constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            return Err(invalid("engine.batch_size", "must be between 1 and 50"));
        }
        if self.max_page_limit == 0 || self.max_page_limit > MAX_PAGE_LIMIT {
            return Err(invalid("engine.max_page_limit", "must be between 1 and 500"));
        }
        if self.default_page_limit == 0 || self.default_page_limit > self.max_page_limit {
            return Err(invalid(
                "engine.default_page_limit",
                "must be between 1 and engine.max_page_limit",
            ));
        }
        if self.statement_timeout_ms == 0 {
            return Err(invalid("engine.statement_timeout_ms", "must be positive"));
        }
        if self.rate_limit.max_messages == 0 {
            return Err(invalid("engine.rate_limit.max_messages", "must be at least 1"));
        }
        Ok(())
    }
}

const fn invalid(key: &'static str, reason: &'static str) -> ConfigError {
    ConfigError::Invalid { key, reason }
}
