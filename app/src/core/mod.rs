pub mod document;
pub mod value;

pub use document::{Document, Product, ProductReference};
pub use value::FieldValue;
