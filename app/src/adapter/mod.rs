pub mod aldes;
pub mod homeassistant;
