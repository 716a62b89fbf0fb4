mod mode;
mod registry;

pub use mode::AirMode;
pub use registry::DescriptorRegistry;

use derive_more::derive::{Display, Error};
use serde::Serialize;
use serde_json::Value;

use crate::core::{FieldValue, Product};

/// Builds a [`FieldPath`] from dotted vendor keys, e.g. `field_path!(indicator.Qai.actualValue)`.
macro_rules! field_path {
    ($a:ident) => {
        $crate::descriptor::FieldPath::One(stringify!($a))
    };
    ($a:ident . $b:ident) => {
        $crate::descriptor::FieldPath::Two(stringify!($a), stringify!($b))
    };
    ($a:ident . $b:ident . $c:ident) => {
        $crate::descriptor::FieldPath::Three(stringify!($a), stringify!($b), stringify!($c))
    };
}

pub(crate) use field_path;

/// Declarative description of where one field lives in a product record and how it is presented.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub key: &'static str,
    pub name: &'static str,
    pub platform: Platform,
    pub source: FieldSource,
    pub transform: Option<Transform>,
    pub unit: Option<Unit>,
    pub device_class: Option<DeviceClass>,
    pub category: EntityCategory,
    pub icon: &'static str,
}

impl FieldDescriptor {
    pub fn sensor(key: &'static str, name: &'static str, source: FieldSource) -> Self {
        Self {
            key,
            name,
            platform: Platform::Sensor,
            source,
            transform: None,
            unit: None,
            device_class: None,
            category: EntityCategory::Diagnostic,
            icon: "mdi:eye",
        }
    }

    pub fn select(key: &'static str, name: &'static str, source: FieldSource) -> Self {
        Self {
            platform: Platform::Select,
            category: EntityCategory::Config,
            icon: "mdi:tune",
            ..Self::sensor(key, name, source)
        }
    }

    pub fn with_transform(self, transform: Transform) -> Self {
        Self {
            transform: Some(transform),
            ..self
        }
    }

    pub fn with_unit(self, unit: Unit) -> Self {
        Self { unit: Some(unit), ..self }
    }

    pub fn with_device_class(self, device_class: DeviceClass) -> Self {
        Self {
            device_class: Some(device_class),
            ..self
        }
    }

    pub fn with_icon(self, icon: &'static str) -> Self {
        Self { icon, ..self }
    }
}

/// Path from the product root, one to three keys deep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldPath {
    One(&'static str),
    Two(&'static str, &'static str),
    Three(&'static str, &'static str, &'static str),
}

impl FieldPath {
    pub fn segments(&self) -> Vec<&'static str> {
        match *self {
            FieldPath::One(a) => vec![a],
            FieldPath::Two(a, b) => vec![a, b],
            FieldPath::Three(a, b, c) => vec![a, b, c],
        }
    }

    /// Missing keys anywhere along the path yield `None`.
    pub fn lookup<'a>(&self, product: &'a Product) -> Option<&'a Value> {
        let mut segments = self.segments().into_iter();
        let first = segments.next()?;

        segments.try_fold(product.section(first)?, |current, key| current.get(key))
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.segments().join("."))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldSource {
    /// Plain value at the end of the path.
    Value(FieldPath),
    /// One entity per record of the collection.
    Collection { records: RecordSet, label_field: Option<&'static str> },
    /// A single, fixed record of the collection.
    Member { records: RecordSet, member: &'static str },
}

/// A list of sub-records, each with an identity and a value field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordSet {
    pub path: FieldPath,
    pub id_field: &'static str,
    pub value_field: &'static str,
}

impl RecordSet {
    pub fn records<'a>(&self, product: &'a Product) -> &'a [Value] {
        self.path
            .lookup(product)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Identity normalized to a string, numeric ids included.
    pub fn identity(&self, record: &Value) -> Option<String> {
        match record.get(self.id_field)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn find<'a>(&self, product: &'a Product, identity: &str) -> Option<&'a Value> {
        self.records(product)
            .iter()
            .find(|record| self.identity(record).as_deref() == Some(identity))
    }

    pub fn value<'a>(&self, record: &'a Value) -> Option<&'a Value> {
        record.get(self.value_field)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transform {
    Divide(f64),
    Round(u32),
    ModeLabel,
}

#[derive(Debug, Clone, PartialEq, Display, Error)]
pub enum TransformError {
    #[display("Unknown {table} code {code:?}")]
    UnknownCode { table: &'static str, code: String },

    #[display("Expected a number, got {value:?}")]
    NotANumber { value: FieldValue },
}

impl Transform {
    pub fn apply(&self, raw: FieldValue) -> Result<FieldValue, TransformError> {
        match self {
            Transform::Divide(divisor) => Ok(FieldValue::Number(number(&raw)? / divisor)),
            Transform::Round(decimals) => {
                let factor = 10f64.powi(*decimals as i32);
                Ok(FieldValue::Number((number(&raw)? * factor).round() / factor))
            }
            Transform::ModeLabel => {
                let code = raw.to_string();
                match AirMode::from_code(&code) {
                    Some(mode) => Ok(FieldValue::from(mode.label())),
                    None => Err(TransformError::UnknownCode { table: "mode", code }),
                }
            }
        }
    }
}

fn number(raw: &FieldValue) -> Result<f64, TransformError> {
    raw.as_f64()
        .ok_or_else(|| TransformError::NotANumber { value: raw.clone() })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum Platform {
    #[display("sensor")]
    Sensor,
    #[display("select")]
    Select,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Unit {
    #[serde(rename = "°C")]
    Celsius,
    #[serde(rename = "%")]
    Percent,
    #[serde(rename = "ppm")]
    PartsPerMillion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Temperature,
    Humidity,
    CarbonDioxide,
    Aqi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityCategory {
    Diagnostic,
    Config,
}
