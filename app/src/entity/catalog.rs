use std::collections::HashSet;

use derive_more::derive::{Display, Error};

use crate::core::{Document, FieldValue, Product, ProductReference};
use crate::descriptor::{DescriptorRegistry, FieldDescriptor, FieldSource};

use super::resolve::{ResolveError, resolve};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InstanceKey {
    Single,
    Member(String),
}

/// One entity to expose: a descriptor bound to a product and, for collections, to one member.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub serial_number: String,
    pub reference: ProductReference,
    pub modem: String,
    pub descriptor: FieldDescriptor,
    pub instance: InstanceKey,
    pub label: Option<String>,
}

impl CatalogEntry {
    pub fn resolve(&self, document: &Document) -> Result<Option<FieldValue>, ResolveError> {
        resolve(document, &self.serial_number, &self.descriptor, &self.instance)
    }

    pub fn unique_id(&self) -> String {
        let base = format!("aldes_{}_{}", self.device_id(), self.descriptor.key);

        match self.member_id() {
            None => base,
            Some(id) => format!("{}_{}", base, id),
        }
    }

    /// Serial number reduced to `[a-z0-9_]`.
    pub fn device_id(&self) -> String {
        slug(&self.serial_number)
    }

    /// Member identity reduced to `[a-z0-9_]`, safe for ids and topic levels.
    pub fn member_id(&self) -> Option<String> {
        match &self.instance {
            InstanceKey::Single => None,
            InstanceKey::Member(id) => Some(slug(id)),
        }
    }

    pub fn device_name(&self) -> String {
        format!("{} {}", self.reference.friendly_name(), self.serial_number)
    }

    pub fn display_name(&self) -> String {
        let name = format!("{} {}", self.device_name(), self.descriptor.name);

        match (&self.label, &self.instance) {
            (Some(label), _) => format!("{} {}", name, label),
            (None, InstanceKey::Member(id)) => format!("{} {}", name, id),
            (None, InstanceKey::Single) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Display, Error)]
pub enum CatalogError {
    #[display("No descriptors registered for reference {reference} of product {serial_number}")]
    UnknownReference {
        serial_number: String,
        reference: ProductReference,
    },
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    unsupported: Vec<CatalogError>,
}

impl Catalog {
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn unsupported(&self) -> &[CatalogError] {
        &self.unsupported
    }

    pub fn into_entries(self) -> Vec<CatalogEntry> {
        self.entries
    }
}

/// Enumerates all entities of a document in product, descriptor and member order.
///
/// Products with an unregistered reference are skipped and reported, the rest of the catalog is
/// still built.
pub fn build_catalog(document: &Document, registry: &DescriptorRegistry) -> Catalog {
    let mut catalog = Catalog::default();

    for product in document.products() {
        let Some(descriptors) = registry.descriptors(&product.reference) else {
            catalog.unsupported.push(CatalogError::UnknownReference {
                serial_number: product.serial_number.clone(),
                reference: product.reference.clone(),
            });
            continue;
        };

        for descriptor in descriptors {
            catalog.entries.extend(entries_of(product, descriptor));
        }
    }

    catalog
}

fn entries_of(product: &Product, descriptor: &FieldDescriptor) -> Vec<CatalogEntry> {
    let entry = |instance: InstanceKey, label: Option<String>| CatalogEntry {
        serial_number: product.serial_number.clone(),
        reference: product.reference.clone(),
        modem: product.modem.clone(),
        descriptor: descriptor.clone(),
        instance,
        label,
    };

    match &descriptor.source {
        FieldSource::Value(_) => vec![entry(InstanceKey::Single, None)],

        FieldSource::Member { records, member } => match records.find(product, member) {
            Some(_) => vec![entry(InstanceKey::Single, None)],
            None => {
                tracing::debug!(
                    "No {} record in {} of {}, skipping {}",
                    member,
                    records.path,
                    product.serial_number,
                    descriptor.key
                );
                vec![]
            }
        },

        FieldSource::Collection { records, label_field } => {
            let mut seen = HashSet::new();
            let mut entries = vec![];

            for record in records.records(product) {
                let Some(id) = records.identity(record) else {
                    tracing::debug!("Record without {} in {}: {:?}", records.id_field, records.path, record);
                    continue;
                };

                //ids and topics use the slug, so members differing only in punctuation or case collide
                if !seen.insert(slug(&id)) {
                    tracing::warn!(
                        "Duplicate {} {} in {} of {}, only the first is exposed",
                        records.id_field,
                        id,
                        records.path,
                        product.serial_number
                    );
                    continue;
                }

                let label = label_field
                    .and_then(|field| record.get(field))
                    .and_then(|v| v.as_str())
                    .map(str::to_owned);

                entries.push(entry(InstanceKey::Member(id), label));
            }

            entries
        }
    }
}

fn slug(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn document(products: serde_json::Value) -> Document {
        Document::from_json(&products.to_string(), Utc::now()).unwrap()
    }

    fn tone_air(thermostats: serde_json::Value) -> serde_json::Value {
        json!({
            "serial_number": "T1",
            "reference": "TONE_AIR",
            "modem": "MT",
            "isConnected": true,
            "indicator": { "thermostats": thermostats, "qte_eau_chaude": 80 },
            "indicators": [ { "type": "MODE", "value": "V" } ]
        })
    }

    fn keys(catalog: &Catalog) -> Vec<(String, InstanceKey)> {
        catalog
            .entries()
            .iter()
            .map(|e| (e.descriptor.key.to_string(), e.instance.clone()))
            .collect()
    }

    #[test]
    fn one_entry_per_thermostat() {
        let doc = document(json!([tone_air(json!([
            { "ThermostatId": "A", "Name": "Lounge", "CurrentTemperature": 19.95 }
        ]))]));

        let catalog = build_catalog(&doc, &DescriptorRegistry::default());

        let thermostats: Vec<_> = catalog.entries().iter().filter(|e| e.descriptor.key == "thermostat").collect();
        assert_eq!(thermostats.len(), 1);
        assert_eq!(thermostats[0].instance, InstanceKey::Member("A".to_string()));
        assert_eq!(thermostats[0].label.as_deref(), Some("Lounge"));
        assert_eq!(thermostats[0].resolve(&doc), Ok(Some(FieldValue::Number(20.0))));
    }

    #[test]
    fn order_follows_products_descriptors_and_members() {
        let doc = document(json!([
            tone_air(json!([
                { "ThermostatId": 2, "Name": "Bedroom" },
                { "ThermostatId": 1, "Name": "Lounge" }
            ])),
            {
                "serial_number": "S1",
                "reference": "EASY_HOME_CONNECT",
                "modem": "M1",
                "isConnected": true,
                "indicator": {}
            }
        ]));

        let catalog = build_catalog(&doc, &DescriptorRegistry::default());
        let order = keys(&catalog);

        assert_eq!(
            order[..4],
            [
                ("thermostat".to_string(), InstanceKey::Member("2".to_string())),
                ("thermostat".to_string(), InstanceKey::Member("1".to_string())),
                ("hot_water_quantity".to_string(), InstanceKey::Single),
                ("mode".to_string(), InstanceKey::Single),
            ]
        );
        assert_eq!(order[4], ("kitchen_humidity".to_string(), InstanceKey::Single));
        //no MODE indicator for S1
        assert_eq!(order.last().unwrap().0, "humidity_variation");
        assert_eq!(order, keys(&build_catalog(&doc, &DescriptorRegistry::default())));
    }

    #[test]
    fn unknown_reference_does_not_stop_catalog() {
        let doc = document(json!([
            { "serial_number": "X1", "reference": "INSPIR_AIR", "modem": "MX" },
            tone_air(json!([]))
        ]));

        let catalog = build_catalog(&doc, &DescriptorRegistry::default());

        assert_eq!(
            catalog.unsupported(),
            &[CatalogError::UnknownReference {
                serial_number: "X1".to_string(),
                reference: ProductReference::Unknown("INSPIR_AIR".to_string()),
            }]
        );
        assert_eq!(keys(&catalog).len(), 2);
        assert!(catalog.entries().iter().all(|e| e.serial_number == "T1"));
    }

    #[test]
    fn duplicate_and_anonymous_members_are_skipped() {
        let doc = document(json!([tone_air(json!([
            { "ThermostatId": "A", "Name": "Lounge" },
            { "Name": "Unnamed" },
            { "ThermostatId": "A", "Name": "Lounge again" }
        ]))]));

        let catalog = build_catalog(&doc, &DescriptorRegistry::default());
        let thermostats: Vec<_> = catalog.entries().iter().filter(|e| e.descriptor.key == "thermostat").collect();

        assert_eq!(thermostats.len(), 1);
        assert_eq!(thermostats[0].label.as_deref(), Some("Lounge"));
    }

    #[test]
    fn members_with_same_slug_are_skipped() {
        let doc = document(json!([tone_air(json!([
            { "ThermostatId": "A 1", "Name": "Lounge" },
            { "ThermostatId": "a_1", "Name": "Kitchen" },
            { "ThermostatId": "A-2", "Name": "Bedroom" }
        ]))]));

        let catalog = build_catalog(&doc, &DescriptorRegistry::default());
        let ids: Vec<_> = catalog.entries().iter().map(|e| e.unique_id()).collect();

        assert_eq!(
            ids,
            vec![
                "aldes_t1_thermostat_a_1",
                "aldes_t1_thermostat_a_2",
                "aldes_t1_hot_water_quantity",
                "aldes_t1_mode",
            ]
        );
        assert_eq!(catalog.entries()[0].label.as_deref(), Some("Lounge"));
    }

    #[test]
    fn entries_are_enumerated_for_disconnected_products() {
        let doc = document(json!([{
            "serial_number": "S1",
            "reference": "EASY_HOME_CONNECT",
            "isConnected": false
        }]));

        let catalog = build_catalog(&doc, &DescriptorRegistry::default());

        assert_eq!(catalog.entries().len(), 10);
        assert!(catalog.entries().iter().all(|e| e.resolve(&doc) == Ok(None)));
    }

    #[test]
    fn names_and_ids() {
        let doc = document(json!([tone_air(json!([
            { "ThermostatId": "A 1", "Name": "Lounge" },
            { "ThermostatId": "B" }
        ]))]));

        let catalog = build_catalog(&doc, &DescriptorRegistry::default());
        let entries = catalog.entries();

        assert_eq!(entries[0].unique_id(), "aldes_t1_thermostat_a_1");
        assert_eq!(entries[0].display_name(), "T.One® AIR T1 Thermostat Lounge");
        assert_eq!(entries[1].display_name(), "T.One® AIR T1 Thermostat B");
        assert_eq!(entries[2].unique_id(), "aldes_t1_hot_water_quantity");
        assert_eq!(entries[2].display_name(), "T.One® AIR T1 Hot Water Quantity");
    }
}
