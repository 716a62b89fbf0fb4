use serde::Serialize;

use crate::descriptor::{AirMode, DeviceClass, EntityCategory, Platform, Unit};
use crate::entity::CatalogEntry;

use super::HomeAssistant;

#[derive(Debug, Serialize)]
struct DiscoveryConfig {
    name: String,
    unique_id: String,
    object_id: String,
    state_topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    command_topic: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    options: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    unit_of_measurement: Option<Unit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    device_class: Option<DeviceClass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state_class: Option<&'static str>,
    entity_category: EntityCategory,
    icon: &'static str,
    device: Device,
}

#[derive(Debug, Serialize)]
struct Device {
    identifiers: Vec<String>,
    name: String,
    manufacturer: &'static str,
    model: String,
    serial_number: String,
}

/// Retained discovery message announcing one catalog entry to Home Assistant.
pub fn discovery_message(config: &HomeAssistant, entry: &CatalogEntry) -> anyhow::Result<(String, String)> {
    let descriptor = &entry.descriptor;
    let unique_id = entry.unique_id();

    let (command_topic, options) = match descriptor.platform {
        Platform::Select => (Some(config.command_topic(entry)), AirMode::labels()),
        Platform::Sensor => (None, vec![]),
    };

    let payload = DiscoveryConfig {
        name: entry.display_name(),
        object_id: unique_id.clone(),
        unique_id,
        state_topic: config.state_topic(entry),
        command_topic,
        options,
        unit_of_measurement: descriptor.unit,
        device_class: descriptor.device_class,
        state_class: descriptor.unit.map(|_| "measurement"),
        entity_category: descriptor.category,
        icon: descriptor.icon,
        device: Device {
            identifiers: vec![format!("aldes_{}", entry.serial_number)],
            name: entry.device_name(),
            manufacturer: "Aldes",
            model: entry.reference.friendly_name().to_string(),
            serial_number: entry.serial_number.clone(),
        },
    };

    Ok((config.discovery_topic(entry), serde_json::to_string(&payload)?))
}
