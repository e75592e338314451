use std::time::Duration;

use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

use crate::validation::validate_failure_rate;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Settings {
    pub debug: bool,
    pub auth_token: String,
    pub enable_swagger: bool,
    pub port: u16,
    pub booking_delay_ms: u64,
    pub booking_failure_rate: f64,
    pub profile_store_path: String,
    pub catalog_path: Option<String>,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let config = Config::builder()
            // APP_BOOKING_DELAY_MS -> booking_delay_ms
            .add_source(Environment::with_prefix("APP").try_parsing(true))
            .set_default("debug", false)?
            .set_default("auth_token", "default-token-change-me")?
            .set_default("enable_swagger", true)?
            .set_default("port", 8080)?
            .set_default("booking_delay_ms", 1000)?
            .set_default("booking_failure_rate", 0.15)?
            .set_default("profile_store_path", "data/profile_store.json")?
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        validate_failure_rate(settings.booking_failure_rate).map_err(ConfigError::Message)?;
        Ok(settings)
    }

    pub fn booking_delay(&self) -> Duration {
        Duration::from_millis(self.booking_delay_ms)
    }
}
