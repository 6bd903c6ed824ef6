//! Run configuration: options, environment overrides, optional TOML file.
//!
//! # Configuration Precedence
//!
//! Settings are resolved in this order (highest priority first):
//!
//! 1. **Programmatic** — values set via [`RunOptions`] builder methods
//! 2. **Environment variables** — `SYNCFLOW_*` vars, applied by
//!    [`RunOptions::apply_env_overrides`] / [`RunOptions::load`]
//! 3. **Config file** — a TOML file (requires the `config-file` feature)
//! 4. **Defaults** — [`RunOptions::default`]
//!
//! # Supported Environment Variables
//!
//! | Variable | Type | Maps to |
//! |----------|------|---------|
//! | `SYNCFLOW_DEFAULT_LIMIT` | [`Limit`] | `limit` |
//! | `SYNCFLOW_STRAND_STACK_SIZE` | `usize` | `stack_size` |
//! | `SYNCFLOW_STRAND_NAME_PREFIX` | `String` | `name_prefix` |

use crate::error::{Error, ErrorKind};
use crate::flow::Limit;
use crate::tracing_compat::debug;

/// Environment variable name for the default concurrency limit.
pub const ENV_DEFAULT_LIMIT: &str = "SYNCFLOW_DEFAULT_LIMIT";
/// Environment variable name for the strand thread stack size.
pub const ENV_STRAND_STACK_SIZE: &str = "SYNCFLOW_STRAND_STACK_SIZE";
/// Environment variable name for the strand thread name prefix.
pub const ENV_STRAND_NAME_PREFIX: &str = "SYNCFLOW_STRAND_NAME_PREFIX";

/// Options for one entry-point invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Concurrency cap for the run's flow. `Unbounded` attaches no flow.
    pub limit: Limit,
    /// Prefix for the strand's thread name (a strand id is appended).
    pub name_prefix: String,
    /// Stack size for the strand thread, or `None` for the platform default.
    pub stack_size: Option<usize>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            limit: Limit::Unbounded,
            name_prefix: "syncflow".to_string(),
            stack_size: None,
        }
    }
}

impl RunOptions {
    /// Creates default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds options from defaults plus environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut options = Self::default();
        options.apply_env_overrides()?;
        Ok(options)
    }

    /// Sets the concurrency cap.
    #[must_use]
    pub fn limit(mut self, limit: impl Into<Limit>) -> Self {
        self.limit = limit.into();
        self
    }

    /// Sets the strand thread name prefix.
    #[must_use]
    pub fn name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = prefix.into();
        self
    }

    /// Sets the strand thread stack size in bytes.
    #[must_use]
    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    /// Applies `SYNCFLOW_*` environment overrides in place.
    ///
    /// Only variables that are set are applied. A set-but-unparseable value
    /// is a [`ConfigError`]: a misconfigured limit must not silently lift
    /// the cap.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(val) = read_env(ENV_DEFAULT_LIMIT) {
            self.limit = val.parse::<Limit>().map_err(|e| ConfigError::InvalidEnv {
                var: ENV_DEFAULT_LIMIT,
                detail: e.to_string(),
            })?;
            debug!(var = ENV_DEFAULT_LIMIT, limit = %self.limit, "env override applied");
        }
        if let Some(val) = read_env(ENV_STRAND_STACK_SIZE) {
            self.stack_size = Some(parse_usize(ENV_STRAND_STACK_SIZE, &val)?);
            debug!(var = ENV_STRAND_STACK_SIZE, "env override applied");
        }
        if let Some(val) = read_env(ENV_STRAND_NAME_PREFIX) {
            self.name_prefix = val;
            debug!(var = ENV_STRAND_NAME_PREFIX, prefix = %self.name_prefix, "env override applied");
        }
        Ok(())
    }

    /// Loads options from a TOML file, then applies environment overrides.
    #[cfg(feature = "config-file")]
    pub fn from_toml_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            detail: e.to_string(),
        })?;
        let mut options = Self::from_toml_str(&content)?;
        options.apply_env_overrides()?;
        Ok(options)
    }

    /// Parses options from a TOML string.
    ///
    /// ```toml
    /// limit = "4"            # or "unbounded"
    /// name_prefix = "myapp"
    /// stack_size = 2097152
    /// ```
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let parsed: RunOptionsToml =
            toml::from_str(content).map_err(|e| ConfigError::Parse {
                detail: e.to_string(),
            })?;
        let mut options = Self::default();
        if let Some(limit) = parsed.limit {
            options.limit = limit.parse::<Limit>().map_err(|e| ConfigError::Parse {
                detail: e.to_string(),
            })?;
        }
        if let Some(prefix) = parsed.name_prefix {
            options.name_prefix = prefix;
        }
        if let Some(bytes) = parsed.stack_size {
            options.stack_size = Some(bytes);
        }
        Ok(options)
    }
}

/// TOML-deserializable mirror of [`RunOptions`].
#[cfg(feature = "config-file")]
#[derive(serde::Deserialize, Default, Debug)]
struct RunOptionsToml {
    limit: Option<String>,
    name_prefix: Option<String>,
    stack_size: Option<usize>,
}

fn read_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn parse_usize(var: &'static str, val: &str) -> Result<usize, ConfigError> {
    val.trim()
        .parse::<usize>()
        .map_err(|e| ConfigError::InvalidEnv {
            var,
            detail: format!("expected unsigned integer, got {val:?} ({e})"),
        })
}

/// Configuration parse/validation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable held an unparseable value.
    #[error("invalid value for {var}: {detail}")]
    InvalidEnv {
        /// The offending variable name.
        var: &'static str,
        /// What was wrong with the value.
        detail: String,
    },
    /// A config file could not be read.
    #[cfg(feature = "config-file")]
    #[error("failed to read config file {path}: {detail}")]
    Io {
        /// The file path.
        path: String,
        /// The I/O error text.
        detail: String,
    },
    /// A config file could not be parsed.
    #[cfg(feature = "config-file")]
    #[error("failed to parse config: {detail}")]
    Parse {
        /// The parse error text.
        detail: String,
    },
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::new(ErrorKind::InvalidConfig)
            .with_message(e.to_string())
            .with_source(e)
    }
}
