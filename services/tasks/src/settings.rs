//! Tasks service settings, read from `TASKS_*` environment variables

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    /// Socket address the HTTP server binds to
    pub bind_address: String,
    /// Page size used when a listing request names none
    pub default_page_size: u32,
    /// Upper bound applied to requested page sizes
    pub max_page_size: u32,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let settings: Settings = Config::builder()
            .set_default("bind_address", "0.0.0.0:3001")?
            .set_default("default_page_size", 20_i64)?
            .set_default("max_page_size", 100_i64)?
            .add_source(Environment::with_prefix("TASKS"))
            .build()?
            .try_deserialize()?;

        if settings.default_page_size == 0 || settings.max_page_size == 0 {
            return Err(ConfigError::Message(
                "page sizes must be positive".to_string(),
            ));
        }

        Ok(settings)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3001".to_string(),
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn clear() {
        unsafe {
            env::remove_var("TASKS_BIND_ADDRESS");
            env::remove_var("TASKS_DEFAULT_PAGE_SIZE");
            env::remove_var("TASKS_MAX_PAGE_SIZE");
        }
    }

    #[test]
    #[serial]
    fn defaults_apply_without_environment() {
        clear();
        assert_eq!(Settings::from_env().unwrap(), Settings::default());
    }

    #[test]
    #[serial]
    fn environment_overrides_defaults() {
        clear();
        unsafe {
            env::set_var("TASKS_BIND_ADDRESS", "127.0.0.1:9000");
            env::set_var("TASKS_MAX_PAGE_SIZE", "50");
        }

        let settings = Settings::from_env().unwrap();
        assert_eq!(settings.bind_address, "127.0.0.1:9000");
        assert_eq!(settings.max_page_size, 50);
        assert_eq!(settings.default_page_size, 20);

        clear();
    }

    #[test]
    #[serial]
    fn zero_page_size_is_rejected() {
        clear();
        unsafe {
            env::set_var("TASKS_DEFAULT_PAGE_SIZE", "0");
        }

        assert!(Settings::from_env().is_err());

        clear();
    }
}
