//! Opslag van de actuele parameterwaarden per algoritme.

use std::collections::HashMap;

use serde_json::Value as JsonValue;

use super::{ParamValue, ParameterSpec};
use crate::error::{EngineError, EngineResult};
use crate::registry::AlgorithmDescriptor;

/// Interface waarmee de loader per algoritme een eigenschapsgroep aanmeldt
/// bij de host (bijvoorbeeld om UI-controls te genereren).
pub trait PropertyGroupRegistrar {
    fn register_group(&mut self, algorithm_id: &str, class_name: &str, parameters: &[ParameterSpec]);
}

/// Registrar die niets doet, voor hosts zonder UI.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRegistrar;

impl PropertyGroupRegistrar for NoopRegistrar {
    fn register_group(&mut self, _: &str, _: &str, _: &[ParameterSpec]) {}
}

/// Waarden van één eigenschapsgroep.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterValues {
    class_name: String,
    values: HashMap<String, ParamValue>,
}

impl ParameterValues {
    #[must_use]
    pub fn with_defaults(class_name: &str, parameters: &[ParameterSpec]) -> Self {
        Self {
            class_name: class_name.to_owned(),
            values: parameters
                .iter()
                .map(|spec| (spec.id.clone(), spec.default.clone()))
                .collect(),
        }
    }

    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    #[must_use]
    pub fn get(&self, parameter_id: &str) -> Option<&ParamValue> {
        self.values.get(parameter_id)
    }

    fn insert(&mut self, parameter_id: &str, value: ParamValue) {
        self.values.insert(parameter_id.to_owned(), value);
    }
}

/// Sleutelde opslag `algoritme-id → waarden`.
#[derive(Debug, Clone, Default)]
pub struct ParameterStore {
    groups: HashMap<String, ParameterValues>,
}

impl PropertyGroupRegistrar for ParameterStore {
    fn register_group(&mut self, algorithm_id: &str, class_name: &str, parameters: &[ParameterSpec]) {
        log::debug!(
            "eigenschapsgroep `{class_name}` aangemeld voor `{algorithm_id}` ({} parameters)",
            parameters.len()
        );
        self.groups.insert(
            algorithm_id.to_owned(),
            ParameterValues::with_defaults(class_name, parameters),
        );
    }
}

impl ParameterStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn group(&self, algorithm_id: &str) -> Option<&ParameterValues> {
        self.groups.get(algorithm_id)
    }

    fn group_mut(&mut self, descriptor: &AlgorithmDescriptor) -> &mut ParameterValues {
        self.groups
            .entry(descriptor.id.clone())
            .or_insert_with(|| {
                ParameterValues::with_defaults(
                    descriptor.property_group.as_deref().unwrap_or_default(),
                    &descriptor.parameters,
                )
            })
    }

    /// Huidige waarde van een parameter, of de standaardwaarde als de groep
    /// nog niet bestaat.
    #[must_use]
    pub fn value<'a>(&'a self, descriptor: &AlgorithmDescriptor, spec: &'a ParameterSpec) -> &'a ParamValue {
        self.groups
            .get(&descriptor.id)
            .and_then(|group| group.get(&spec.id))
            .unwrap_or(&spec.default)
    }

    /// Zet een waarde van de host na type- en grenscontrole.
    pub fn set(
        &mut self,
        descriptor: &AlgorithmDescriptor,
        parameter_id: &str,
        raw: &JsonValue,
    ) -> EngineResult<()> {
        let spec = descriptor.parameter(parameter_id).ok_or_else(|| {
            EngineError::validation(format!(
                "algoritme `{}` heeft geen parameter `{parameter_id}`",
                descriptor.id
            ))
        })?;
        let value = spec.coerce(raw)?;
        self.group_mut(descriptor).insert(parameter_id, value);
        Ok(())
    }

    /// Zet een reeds getypeerde waarde.
    pub fn set_value(
        &mut self,
        descriptor: &AlgorithmDescriptor,
        parameter_id: &str,
        value: ParamValue,
    ) -> EngineResult<()> {
        let spec = descriptor.parameter(parameter_id).ok_or_else(|| {
            EngineError::validation(format!(
                "algoritme `{}` heeft geen parameter `{parameter_id}`",
                descriptor.id
            ))
        })?;
        spec.validate(&value)?;
        self.group_mut(descriptor).insert(parameter_id, value);
        Ok(())
    }

    /// Zet alle parameters van een algoritme terug op hun standaardwaarde.
    pub fn reset(&mut self, descriptor: &AlgorithmDescriptor) {
        let class_name = descriptor.property_group.as_deref().unwrap_or_default();
        self.groups.insert(
            descriptor.id.clone(),
            ParameterValues::with_defaults(class_name, &descriptor.parameters),
        );
    }

    /// Een algoritme is klaar om te draaien als geen enkele enum nog op de
    /// lege keuze staat.
    #[must_use]
    pub fn is_ready(&self, descriptor: &AlgorithmDescriptor) -> bool {
        self.unset_parameters(descriptor).is_empty()
    }

    /// Ids van enum-parameters die nog geen keuze hebben.
    #[must_use]
    pub fn unset_parameters<'a>(&self, descriptor: &'a AlgorithmDescriptor) -> Vec<&'a str> {
        descriptor
            .parameters
            .iter()
            .filter(|spec| spec.is_unset(self.value(descriptor, spec)))
            .map(|spec| spec.id.as_str())
            .collect()
    }

    /// Alle waarden in declaratievolgorde.
    #[must_use]
    pub fn resolved<'a>(
        &'a self,
        descriptor: &'a AlgorithmDescriptor,
    ) -> Vec<(&'a ParameterSpec, &'a ParamValue)> {
        descriptor
            .parameters
            .iter()
            .map(|spec| (spec, self.value(descriptor, spec)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::PropertyData;
    use crate::registry::BackendId;
    use serde_json::json;

    fn descriptor() -> AlgorithmDescriptor {
        let enum_data: PropertyData = serde_json::from_value(json!({
            "items": [{"id": "DISPLAY_TEXT"}, {"id": "ADD_MESH"}]
        }))
        .expect("enum data");
        let float_data: PropertyData =
            serde_json::from_value(json!({"default": 0.5, "min": 0.0, "max": 1.0}))
                .expect("float data");
        let mut descriptor = AlgorithmDescriptor::new("demo", "Demo", BackendId::Native(0));
        descriptor.property_group = Some("DemoProperties".to_owned());
        descriptor.parameters = vec![
            ParameterSpec::build("ratio", "float", &float_data, Some(0)).expect("float spec"),
            ParameterSpec::build("output_option", "enum", &enum_data, Some(0)).expect("enum spec"),
        ];
        descriptor
    }

    #[test]
    fn enum_at_sentinel_blocks_readiness() {
        let descriptor = descriptor();
        let mut store = ParameterStore::new();
        store.register_group("demo", "DemoProperties", &descriptor.parameters);
        assert!(!store.is_ready(&descriptor));
        assert_eq!(store.unset_parameters(&descriptor), vec!["output_option"]);

        store
            .set(&descriptor, "output_option", &json!("ADD_MESH"))
            .expect("geldige keuze");
        assert!(store.is_ready(&descriptor));
    }

    #[test]
    fn reset_restores_defaults() {
        let descriptor = descriptor();
        let mut store = ParameterStore::new();
        store.set(&descriptor, "ratio", &json!(0.9)).expect("binnen grenzen");
        assert_eq!(
            store.group("demo").and_then(|group| group.get("ratio")),
            Some(&ParamValue::Float(0.9))
        );
        store.reset(&descriptor);
        assert_eq!(
            store.group("demo").and_then(|group| group.get("ratio")),
            Some(&ParamValue::Float(0.5))
        );
    }

    #[test]
    fn unknown_parameter_is_rejected() {
        let descriptor = descriptor();
        let mut store = ParameterStore::new();
        assert!(matches!(
            store.set(&descriptor, "missing", &json!(1)),
            Err(EngineError::Validation(_))
        ));
    }
}
