mod command;
mod discovery;
mod state;

pub use command::HaCommandProcessor;
pub use state::HaStateExporter;

use serde::Deserialize;

use crate::entity::CatalogEntry;

#[derive(Debug, Deserialize, Clone)]
pub struct HomeAssistant {
    #[serde(default = "default_discovery_prefix")]
    pub discovery_prefix: String,
    #[serde(default = "default_base_topic")]
    pub base_topic: String,
}

fn default_discovery_prefix() -> String {
    "homeassistant".to_string()
}

fn default_base_topic() -> String {
    "aldes".to_string()
}

impl HomeAssistant {
    fn discovery_topic(&self, entry: &CatalogEntry) -> String {
        format!(
            "{}/{}/{}/config",
            self.discovery_prefix,
            entry.descriptor.platform,
            entry.unique_id()
        )
    }

    fn state_topic(&self, entry: &CatalogEntry) -> String {
        let topic = format!("{}/{}/{}", self.base_topic, entry.device_id(), entry.descriptor.key);

        match entry.member_id() {
            Some(member) => format!("{}/{}", topic, member),
            None => topic,
        }
    }

    fn command_topic(&self, entry: &CatalogEntry) -> String {
        format!("{}/set", self.state_topic(entry))
    }

    fn command_subscription(&self) -> String {
        format!("{}/+/+/set", self.base_topic)
    }
}
