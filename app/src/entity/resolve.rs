use derive_more::derive::{Display, Error};

use crate::core::{Document, FieldValue};
use crate::descriptor::{FieldDescriptor, FieldSource, TransformError};

use super::InstanceKey;

#[derive(Debug, Clone, PartialEq, Display, Error)]
#[display("Error resolving {field} of product {serial_number}: {source}")]
pub struct ResolveError {
    pub serial_number: String,
    pub field: &'static str,
    pub source: TransformError,
}

/// Looks up the current value of one entity in a document snapshot.
///
/// Absence is the expected outcome for removed or disconnected products and for missing vendor
/// fields. Only a failing transformation is reported as an error.
pub fn resolve(
    document: &Document,
    serial_number: &str,
    descriptor: &FieldDescriptor,
    instance: &InstanceKey,
) -> Result<Option<FieldValue>, ResolveError> {
    let Some(product) = document.product(serial_number) else {
        return Ok(None);
    };

    if !product.is_connected {
        return Ok(None);
    }

    let raw = match (&descriptor.source, instance) {
        (FieldSource::Value(path), InstanceKey::Single) => path.lookup(product),
        (FieldSource::Member { records, member }, InstanceKey::Single) => {
            records.find(product, member).and_then(|record| records.value(record))
        }
        (FieldSource::Collection { records, .. }, InstanceKey::Member(id)) => {
            records.find(product, id).and_then(|record| records.value(record))
        }
        (source, instance) => {
            tracing::warn!(
                "Instance {:?} does not match source {:?} of {}",
                instance,
                source,
                descriptor.key
            );
            None
        }
    };

    let Some(raw) = raw.and_then(FieldValue::from_json) else {
        return Ok(None);
    };

    match &descriptor.transform {
        Some(transform) => transform.apply(raw).map(Some).map_err(|source| ResolveError {
            serial_number: serial_number.to_string(),
            field: descriptor.key,
            source,
        }),
        None => Ok(Some(raw)),
    }
}
