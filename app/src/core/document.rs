use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// One fetched snapshot of the status of all products of an account.
#[derive(Debug, Clone)]
pub struct Document {
    products: Vec<Product>,
    fetched_at: DateTime<Utc>,
}

impl Document {
    pub fn new(products: Vec<Product>, fetched_at: DateTime<Utc>) -> Self {
        Self { products, fetched_at }
    }

    pub fn from_json(json: &str, fetched_at: DateTime<Utc>) -> anyhow::Result<Self> {
        let products: Vec<Product> = serde_json::from_str(json)?;
        Ok(Self::new(products, fetched_at))
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn product(&self, serial_number: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.serial_number == serial_number)
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Product {
    pub serial_number: String,
    pub reference: ProductReference,
    #[serde(default)]
    pub modem: String,
    #[serde(rename = "isConnected", default)]
    pub is_connected: bool,
    //indicator, indicators and whatever else the vendor sends
    #[serde(flatten)]
    pub sections: Map<String, Value>,
}

impl Product {
    pub fn section(&self, key: &str) -> Option<&Value> {
        self.sections.get(key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProductReference {
    EasyHomeConnect,
    ToneAir,
    Unknown(String),
}

impl ProductReference {
    pub fn wire_name(&self) -> &str {
        match self {
            ProductReference::EasyHomeConnect => "EASY_HOME_CONNECT",
            ProductReference::ToneAir => "TONE_AIR",
            ProductReference::Unknown(name) => name,
        }
    }

    pub fn friendly_name(&self) -> &str {
        match self {
            ProductReference::EasyHomeConnect => "EASYHOME PureAir Compact CONNECT",
            ProductReference::ToneAir => "T.One® AIR",
            ProductReference::Unknown(name) => name,
        }
    }
}

impl From<&str> for ProductReference {
    fn from(value: &str) -> Self {
        match value {
            "EASY_HOME_CONNECT" => ProductReference::EasyHomeConnect,
            "TONE_AIR" => ProductReference::ToneAir,
            other => ProductReference::Unknown(other.to_string()),
        }
    }
}

impl Display for ProductReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.wire_name())
    }
}

//unknown references must not fail the whole document
impl<'de> Deserialize<'de> for ProductReference {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(ProductReference::from(value.as_str()))
    }
}
