use std::collections::HashMap;

use crate::core::ProductReference;

use super::{DeviceClass, FieldDescriptor, FieldSource, RecordSet, Transform, Unit, field_path};

/// Field descriptors per product reference, in declaration order.
pub struct DescriptorRegistry {
    sets: HashMap<ProductReference, Vec<FieldDescriptor>>,
}

impl DescriptorRegistry {
    pub fn new(sets: Vec<(ProductReference, Vec<FieldDescriptor>)>) -> Self {
        Self {
            sets: sets.into_iter().collect(),
        }
    }

    pub fn descriptors(&self, reference: &ProductReference) -> Option<&[FieldDescriptor]> {
        self.sets.get(reference).map(Vec::as_slice)
    }
}

impl Default for DescriptorRegistry {
    fn default() -> Self {
        Self::new(vec![
            (ProductReference::EasyHomeConnect, easy_home_connect_fields()),
            (ProductReference::ToneAir, tone_air_fields()),
        ])
    }
}

fn easy_home_connect_fields() -> Vec<FieldDescriptor> {
    vec![
        //
        // KITCHEN
        //
        humidity("kitchen_humidity", "Kitchen Humidity", FieldSource::Value(field_path!(indicator.HrCuCo))),
        temperature("kitchen_temperature", "Kitchen Temperature", FieldSource::Value(field_path!(indicator.TmpCu)))
            .with_transform(Transform::Divide(10.0)),
        //
        // BATHROOMS
        //
        humidity("bathroom_1_humidity", "Bathroom 1 Humidity", FieldSource::Value(field_path!(indicator.HrBa1Co))),
        temperature("bathroom_1_temperature", "Bathroom 1 Temperature", FieldSource::Value(field_path!(indicator.TmpBa1)))
            .with_transform(Transform::Divide(10.0)),
        humidity("bathroom_2_humidity", "Bathroom 2 Humidity", FieldSource::Value(field_path!(indicator.HrBa2Co))),
        temperature("bathroom_2_temperature", "Bathroom 2 Temperature", FieldSource::Value(field_path!(indicator.TmpBa2)))
            .with_transform(Transform::Divide(10.0)),
        //
        // AIR QUALITY
        //
        FieldDescriptor::sensor("co2", "Carbon dioxide", FieldSource::Value(field_path!(indicator.CO2)))
            .with_unit(Unit::PartsPerMillion)
            .with_device_class(DeviceClass::CarbonDioxide)
            .with_icon("mdi:molecule-co2"),
        FieldDescriptor::sensor("qai", "Air Quality Index", FieldSource::Value(field_path!(indicator.Qai.actualValue)))
            .with_device_class(DeviceClass::Aqi)
            .with_icon("mdi:air-filter"),
        FieldDescriptor::sensor(
            "polluant_dominant",
            "Polluant Dominant",
            FieldSource::Value(field_path!(indicator.Qai.polluantDominant)),
        )
        .with_icon("mdi:flower-pollen"),
        humidity("humidity_variation", "Humidity Variation", FieldSource::Value(field_path!(indicator.VarHR)))
            .with_icon("mdi:cloud-percent"),
        //
        // CONTROL
        //
        air_mode(),
    ]
}

fn tone_air_fields() -> Vec<FieldDescriptor> {
    vec![
        temperature(
            "thermostat",
            "Thermostat",
            FieldSource::Collection {
                records: RecordSet {
                    path: field_path!(indicator.thermostats),
                    id_field: "ThermostatId",
                    value_field: "CurrentTemperature",
                },
                label_field: Some("Name"),
            },
        )
        .with_transform(Transform::Round(1)),
        FieldDescriptor::sensor(
            "hot_water_quantity",
            "Hot Water Quantity",
            FieldSource::Value(field_path!(indicator.qte_eau_chaude)),
        )
        .with_unit(Unit::Percent)
        .with_icon("mdi:water-boiler"),
        air_mode(),
    ]
}

fn air_mode() -> FieldDescriptor {
    FieldDescriptor::select(
        "mode",
        "Mode",
        FieldSource::Member {
            records: RecordSet {
                path: field_path!(indicators),
                id_field: "type",
                value_field: "value",
            },
            member: "MODE",
        },
    )
    .with_transform(Transform::ModeLabel)
}

fn temperature(key: &'static str, name: &'static str, source: FieldSource) -> FieldDescriptor {
    FieldDescriptor::sensor(key, name, source)
        .with_unit(Unit::Celsius)
        .with_device_class(DeviceClass::Temperature)
        .with_icon("mdi:thermometer")
}

fn humidity(key: &'static str, name: &'static str, source: FieldSource) -> FieldDescriptor {
    FieldDescriptor::sensor(key, name, source)
        .with_unit(Unit::Percent)
        .with_device_class(DeviceClass::Humidity)
        .with_icon("mdi:water-percent")
}
