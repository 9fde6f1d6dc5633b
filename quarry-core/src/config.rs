use crate::{Context, Error, Result};
use url::Url;

/// Session options, usually read from a connection URL.
///
/// ```rust
/// use quarry_core::SessionConfig;
/// let config = SessionConfig::from_url("postgres://localhost/shop?soft_delete=false").unwrap();
/// assert_eq!(config.dialect, "postgres");
/// assert!(config.debug);
/// assert!(!config.soft_delete);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Name of the dialect in the registry.
    pub dialect: String,
    /// Log successful statements at debug level, failures are always logged.
    pub debug: bool,
    /// Honour soft delete fields: deletes become updates and reads skip deleted rows.
    pub soft_delete: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            dialect: "generic".into(),
            debug: true,
            soft_delete: true,
        }
    }
}

impl SessionConfig {
    pub fn new(dialect: impl Into<String>) -> Self {
        Self {
            dialect: dialect.into(),
            ..Default::default()
        }
    }

    pub fn from_url(url: &str) -> Result<Self> {
        let parsed = Url::parse(url).with_context(|| format!("Invalid connection URL `{}`", url))?;
        let mut config = Self::new(parsed.scheme());
        for (key, value) in parsed.query_pairs() {
            match &*key {
                "debug" => config.debug = parse_flag(&key, &value)?,
                "soft_delete" => config.soft_delete = parse_flag(&key, &value)?,
                _ => log::debug!("Session parameter {} is left to the driver", key),
            }
        }
        Ok(config)
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(Error::msg(format!(
            "Session parameter {} expects a boolean, found `{}`",
            key, value
        ))),
    }
}
