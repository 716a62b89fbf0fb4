mod catalog;
mod live;
mod resolve;

pub use catalog::{Catalog, CatalogEntry, InstanceKey, build_catalog};
pub use live::{LiveEntity, Refresh};
pub use resolve::ResolveError;

use std::collections::HashSet;
use std::sync::Arc;

use infrastructure::{EventBus, EventListener, meter};

use crate::core::{Document, FieldValue};
use crate::descriptor::DescriptorRegistry;

#[derive(Debug, Clone)]
pub struct EntityStateEvent {
    pub entry: Arc<CatalogEntry>,
    pub value: FieldValue,
}

/// Keeps the live state of all catalogued entities and refreshes it on every new snapshot.
pub struct EntityRunner {
    entities: Vec<LiveEntity>,
    registry: Arc<DescriptorRegistry>,
    known_ids: HashSet<String>,
    snapshots: EventListener<Arc<Document>>,
    events: EventBus<EntityStateEvent>,
}

impl EntityRunner {
    pub fn new(catalog: Catalog, registry: Arc<DescriptorRegistry>, snapshots: EventListener<Arc<Document>>) -> Self {
        for unsupported in catalog.unsupported() {
            tracing::warn!("{}", unsupported);
        }

        tracing::info!("Tracking {} entities", catalog.entries().len());

        let entities: Vec<LiveEntity> = catalog
            .into_entries()
            .into_iter()
            .map(|entry| LiveEntity::new(Arc::new(entry)))
            .collect();

        let known_ids = entities.iter().map(|e| e.entry().unique_id()).collect();

        Self {
            entities,
            registry,
            known_ids,
            snapshots,
            events: EventBus::new(256),
        }
    }

    pub fn entries(&self) -> Vec<Arc<CatalogEntry>> {
        self.entities.iter().map(|e| e.entry().clone()).collect()
    }

    pub fn subscribe(&self) -> EventListener<EntityStateEvent> {
        self.events.subscribe()
    }

    pub async fn run(mut self) {
        while let Some(document) = self.snapshots.recv().await {
            self.refresh_all(&document);
        }

        tracing::warn!("Snapshot channel closed, entity refresh stopped");
    }

    #[tracing::instrument(skip_all, fields(fetched_at = %document.fetched_at()))]
    pub fn refresh_all(&mut self, document: &Document) -> Vec<EntityStateEvent> {
        let emitter = self.events.emitter();
        let mut published = vec![];

        for entity in self.entities.iter_mut() {
            match entity.refresh(document) {
                Ok(Refresh::Published(value)) => {
                    let event = EntityStateEvent {
                        entry: entity.entry().clone(),
                        value,
                    };
                    emitter.send(event.clone());
                    published.push(event);
                }
                Ok(Refresh::Retained(value)) => {
                    tracing::trace!("Keeping last value {} of {}", value, entity.entry().unique_id());
                }
                Ok(Refresh::Unknown) => {}
                Err(e) => {
                    tracing::error!("{}", e);
                    meter::increment(
                        "aldes_resolve_errors",
                        &[("serial_number", e.serial_number.as_str()), ("field", e.field)],
                    );
                }
            }
        }

        self.report_new_entries(document);

        published
    }

    //catalog is fixed at startup, members appearing later are only reported
    fn report_new_entries(&mut self, document: &Document) {
        for entry in build_catalog(document, &self.registry).into_entries() {
            let id = entry.unique_id();

            if !self.known_ids.contains(&id) {
                tracing::info!(
                    "New entity {} ({}) appeared, restart to expose it",
                    entry.display_name(),
                    id
                );
                self.known_ids.insert(id);
            }
        }
    }
}
