use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use std::env;

use crate::log::LogLevel;

/// Environment variable that switches validation on or off explicitly.
pub const VALIDATE_VAR: &str = "ADDONS_VALIDATE";
/// Environment variable naming the deployment environment.
pub const ENV_VAR: &str = "ADDONS_ENV";
/// Environment variable with the default application log level.
pub const LOG_LEVEL_VAR: &str = "ADDONS_LOG_LEVEL";

/// Options threaded into [`ContextBuilder::new`](crate::ContextBuilder::new).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    /// Run every shape, uniqueness and context validation.
    pub validate: bool,
    /// Log level used when the application definition does not request one.
    pub default_level: Option<LogLevel>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            validate: true,
            default_level: None,
        }
    }
}

impl BuildOptions {
    /// Options with validation switched off.
    pub fn unvalidated() -> Self {
        Self {
            validate: false,
            ..Self::default()
        }
    }
}

/// Build configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Option<String>,
    pub build: BuildOptions,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let environment = lookup(ENV_VAR);
        let production = environment
            .as_deref()
            .is_some_and(|env| env.eq_ignore_ascii_case("production"));

        let validate = match lookup(VALIDATE_VAR) {
            Some(raw) => parse_flag(&raw).with_context(|| format!("{VALIDATE_VAR} must be a boolean"))?,
            None => !production,
        };

        let default_level = lookup(LOG_LEVEL_VAR)
            .map(|raw| raw.parse::<LogLevel>())
            .transpose()
            .with_context(|| format!("{LOG_LEVEL_VAR} must be a log level"))?;

        Ok(Self {
            environment,
            build: BuildOptions {
                validate,
                default_level,
            },
        })
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("invalid flag value {other:?}"),
    }
}
