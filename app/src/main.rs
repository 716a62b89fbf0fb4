use std::sync::Arc;
use std::time::Duration;

use settings::Settings;

use crate::adapter::homeassistant::{HaCommandProcessor, HaStateExporter};
use crate::coordinator::Coordinator;
use crate::descriptor::DescriptorRegistry;
use crate::entity::{EntityRunner, build_catalog};

mod adapter;
mod coordinator;
mod core;
mod descriptor;
mod entity;
pub mod port;
mod settings;

#[tokio::main(flavor = "multi_thread")]
pub async fn main() {
    let settings = Settings::new().expect("Error reading configuration");

    settings.monitoring.init().expect("Error initializing monitoring");

    let mut mqtt_client = settings.mqtt.new_client();
    let aldes_client = settings.aldes.new_client().expect("Error initializing Aldes client");

    let mut coordinator = Coordinator::new(
        aldes_client.clone(),
        Duration::from_secs(settings.polling.interval_secs),
    );

    tracing::info!("Fetching initial product state");
    let first_snapshot = coordinator
        .first_refresh()
        .await
        .expect("Error fetching initial product state");

    let registry = Arc::new(DescriptorRegistry::default());
    let catalog = build_catalog(&first_snapshot, &registry);
    let entity_runner = EntityRunner::new(catalog, registry, coordinator.subscribe());

    let state_exporter = HaStateExporter::new(
        settings.homeassistant.clone(),
        mqtt_client.sender(),
        entity_runner.entries(),
        entity_runner.subscribe(),
    );

    let command_processor = HaCommandProcessor::new(
        settings.homeassistant.clone(),
        &mut mqtt_client,
        entity_runner.entries(),
        aldes_client,
        coordinator.client(),
    )
    .await
    .expect("Error subscribing to Home Assistant commands");

    tracing::info!("Starting main loop");

    tokio::select!(
        _ = mqtt_client.run() => {},
        _ = coordinator.run() => {},
        _ = entity_runner.run() => {},
        _ = state_exporter.run() => {},
        _ = command_processor.run() => {},
    );

    tracing::warn!("Main loop stopped");
}
