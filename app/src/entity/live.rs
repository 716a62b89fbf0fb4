use std::sync::Arc;

use crate::core::{Document, FieldValue};

use super::{CatalogEntry, ResolveError};

#[derive(Debug, Clone, PartialEq)]
pub enum Refresh {
    /// A value was resolved from the snapshot.
    Published(FieldValue),
    /// Nothing resolved, the last published value stays in place.
    Retained(FieldValue),
    /// Nothing resolved and nothing was ever published.
    Unknown,
}

/// Exposed state of a catalog entry across snapshots.
#[derive(Debug)]
pub struct LiveEntity {
    entry: Arc<CatalogEntry>,
    published: Option<FieldValue>,
}

impl LiveEntity {
    pub fn new(entry: Arc<CatalogEntry>) -> Self {
        Self { entry, published: None }
    }

    pub fn entry(&self) -> &Arc<CatalogEntry> {
        &self.entry
    }

    /// Absent values never overwrite a published one. Errors leave the state untouched.
    pub fn refresh(&mut self, document: &Document) -> Result<Refresh, ResolveError> {
        match self.entry.resolve(document)? {
            Some(value) => {
                self.published = Some(value.clone());
                Ok(Refresh::Published(value))
            }
            None => Ok(match &self.published {
                Some(value) => Refresh::Retained(value.clone()),
                None => Refresh::Unknown,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::DescriptorRegistry;
    use crate::entity::build_catalog;
    use chrono::Utc;
    use serde_json::json;

    fn document(connected: bool, indicator: serde_json::Value) -> Document {
        let products = json!([{
            "serial_number": "S1",
            "reference": "EASY_HOME_CONNECT",
            "modem": "M1",
            "isConnected": connected,
            "indicator": indicator
        }]);

        Document::from_json(&products.to_string(), Utc::now()).unwrap()
    }

    fn kitchen_temperature(doc: &Document) -> LiveEntity {
        let entry = build_catalog(doc, &DescriptorRegistry::default())
            .into_entries()
            .into_iter()
            .find(|e| e.descriptor.key == "kitchen_temperature")
            .unwrap();

        LiveEntity::new(Arc::new(entry))
    }

    #[test]
    fn stale_value_is_retained() {
        let first = document(true, json!({ "TmpCu": 215 }));
        let second = document(true, json!({}));
        let mut entity = kitchen_temperature(&first);

        assert_eq!(entity.refresh(&first), Ok(Refresh::Published(FieldValue::Number(21.5))));
        assert_eq!(entity.refresh(&second), Ok(Refresh::Retained(FieldValue::Number(21.5))));
        assert_eq!(entity.published.as_ref(), Some(&FieldValue::Number(21.5)));
    }

    #[test]
    fn disconnect_keeps_last_value() {
        let first = document(true, json!({ "TmpCu": 215 }));
        let offline = document(false, json!({ "TmpCu": 190 }));
        let mut entity = kitchen_temperature(&first);

        entity.refresh(&first).unwrap();

        assert_eq!(entity.refresh(&offline), Ok(Refresh::Retained(FieldValue::Number(21.5))));
    }

    #[test]
    fn nothing_published_yet_is_unknown() {
        let empty = document(true, json!({}));
        let mut entity = kitchen_temperature(&empty);

        let refresh = entity.refresh(&empty).unwrap();

        assert_eq!(refresh, Refresh::Unknown);
        assert_eq!(entity.published.as_ref(), None);
    }

    #[test]
    fn new_value_replaces_published() {
        let first = document(true, json!({ "TmpCu": 215 }));
        let second = document(true, json!({ "TmpCu": 190 }));
        let mut entity = kitchen_temperature(&first);

        entity.refresh(&first).unwrap();

        assert_eq!(entity.refresh(&second), Ok(Refresh::Published(FieldValue::Number(19.0))));
    }

    #[test]
    fn error_keeps_published_value() {
        let first = document(true, json!({ "TmpCu": 215 }));
        let broken = document(true, json!({ "TmpCu": "n/a" }));
        let mut entity = kitchen_temperature(&first);

        entity.refresh(&first).unwrap();

        assert!(entity.refresh(&broken).is_err());
        assert_eq!(entity.published.as_ref(), Some(&FieldValue::Number(21.5)));
    }
}
