use std::collections::HashMap;
use std::sync::Arc;

use infrastructure::{EventListener, MqttSender};

use crate::entity::{CatalogEntry, EntityStateEvent};

use super::HomeAssistant;
use super::discovery::discovery_message;

pub struct HaStateExporter {
    config: HomeAssistant,
    sender: MqttSender,
    entries: Vec<Arc<CatalogEntry>>,
    states: EventListener<EntityStateEvent>,
}

impl HaStateExporter {
    pub fn new(
        config: HomeAssistant,
        sender: MqttSender,
        entries: Vec<Arc<CatalogEntry>>,
        states: EventListener<EntityStateEvent>,
    ) -> Self {
        Self {
            config,
            sender,
            entries,
            states,
        }
    }

    pub async fn run(mut self) {
        self.announce().await;

        let mut last_sent = LastSent::default();

        while let Some(event) = self.states.recv().await {
            let (topic, payload) = state_message(&self.config, &event);

            if !last_sent.changed(&topic, &payload) {
                continue;
            }

            match self.sender.send_retained(topic.clone(), payload.clone()).await {
                Ok(()) => last_sent.record(topic, payload),
                Err(e) => tracing::error!("Error exporting state of {}: {:?}", event.entry.unique_id(), e),
            }
        }
    }

    async fn announce(&self) {
        tracing::info!("Announcing {} entities to Home Assistant", self.entries.len());

        for entry in self.entries.iter() {
            let result = match discovery_message(&self.config, entry) {
                Ok((topic, payload)) => self.sender.send_retained(topic, payload).await,
                Err(e) => Err(e),
            };

            if let Err(e) = result {
                tracing::error!("Error announcing {}: {:?}", entry.unique_id(), e);
            }
        }
    }
}

fn state_message(config: &HomeAssistant, event: &EntityStateEvent) -> (String, String) {
    (config.state_topic(&event.entry), event.value.to_string())
}

#[derive(Default)]
struct LastSent {
    payloads: HashMap<String, String>,
}

impl LastSent {
    fn changed(&self, topic: &str, payload: &str) -> bool {
        self.payloads.get(topic).map(String::as_str) != Some(payload)
    }

    fn record(&mut self, topic: String, payload: String) {
        self.payloads.insert(topic, payload);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::homeassistant::tests::{config, entry};
    use crate::core::{FieldValue, ProductReference};
    use crate::entity::InstanceKey;

    fn event(value: FieldValue) -> EntityStateEvent {
        EntityStateEvent {
            entry: Arc::new(entry(
                ProductReference::EasyHomeConnect,
                "kitchen_temperature",
                InstanceKey::Single,
            )),
            value,
        }
    }

    #[test]
    fn state_payload_is_plain_value() {
        let (topic, payload) = state_message(&config(), &event(FieldValue::Number(21.5)));

        assert_eq!(topic, "aldes/s1/kitchen_temperature");
        assert_eq!(payload, "21.5");
    }

    #[test]
    fn unchanged_state_is_suppressed() {
        let mut last_sent = LastSent::default();

        assert!(last_sent.changed("aldes/S1/mode", "Daily"));
        last_sent.record("aldes/S1/mode".to_string(), "Daily".to_string());

        assert!(!last_sent.changed("aldes/S1/mode", "Daily"));
        assert!(last_sent.changed("aldes/S1/mode", "Boost"));
        assert!(last_sent.changed("aldes/S2/mode", "Daily"));
    }
}
