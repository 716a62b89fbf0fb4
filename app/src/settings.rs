use config::{Config, ConfigError, Environment, File};
use infrastructure::{MonitoringConfig, MqttConfig};
use serde::Deserialize;

use crate::adapter::aldes::AldesCloud;
use crate::adapter::homeassistant::HomeAssistant;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub aldes: AldesCloud,
    #[serde(default)]
    pub polling: PollingSettings,
    pub mqtt: MqttConfig,
    pub homeassistant: HomeAssistant,
    pub monitoring: MonitoringConfig,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name("config.toml").required(false))
            .add_source(Environment::with_prefix("ALDES_BRIDGE").separator("__"));

        let s = builder.build()?;
        s.try_deserialize()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollingSettings {
    pub interval_secs: u64,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self { interval_secs: 60 }
    }
}
