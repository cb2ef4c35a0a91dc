//! Import en export van opgeslagen parameterconfiguraties.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use super::{ParamValue, ParameterStore};
use crate::error::{EngineError, EngineResult};
use crate::registry::{AlgorithmDescriptor, Registry};

/// Extensie die bij een voorgestelde bestandsnaam hoort.
pub const CONFIGURATION_EXTENSION: &str = ".json";

/// `{"algorithm": id, "properties": {param: waarde}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedConfiguration {
    pub algorithm: String,
    #[serde(default)]
    pub properties: Map<String, JsonValue>,
}

impl SavedConfiguration {
    /// Legt de huidige waarden van een algoritme vast; floats worden op twee
    /// decimalen afgerond, binnen de grenzen van hun parameter.
    pub fn capture(store: &ParameterStore, descriptor: &AlgorithmDescriptor) -> EngineResult<Self> {
        let mut properties = Map::new();
        for (spec, value) in store.resolved(descriptor) {
            let json = serde_json::to_value(value.rounded_within(spec.min, spec.max)).map_err(|err| {
                EngineError::configuration(format!(
                    "parameter `{}` kon niet geserialiseerd worden: {err}",
                    spec.id
                ))
            })?;
            properties.insert(spec.id.clone(), json);
        }
        Ok(Self {
            algorithm: descriptor.id.clone(),
            properties,
        })
    }

    /// Leest een opgeslagen configuratie. Het veld `algorithm` is verplicht.
    pub fn from_json(text: &str) -> EngineResult<Self> {
        let raw: JsonValue = serde_json::from_str(text)
            .map_err(|err| EngineError::configuration(format!("ongeldige JSON: {err}")))?;
        if raw.get("algorithm").and_then(JsonValue::as_str).is_none() {
            return Err(EngineError::configuration(
                "configuratie bevat geen veld `algorithm`",
            ));
        }
        serde_json::from_value(raw)
            .map_err(|err| EngineError::configuration(format!("ongeldige configuratie: {err}")))
    }

    pub fn to_json(&self) -> EngineResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|err| EngineError::configuration(format!("export mislukt: {err}")))
    }

    /// Voorgestelde bestandsnaam zonder extensie, bijvoorbeeld
    /// `segmentation_cgal_clusters_4_smoothness_0_5`.
    #[must_use]
    pub fn suggested_file_stem(&self) -> String {
        let mut stem = crate::normalize_name(&self.algorithm);
        for (name, value) in &self.properties {
            let text = match value {
                JsonValue::String(text) => text.clone(),
                other => other.to_string(),
            };
            let sanitized: String = text
                .chars()
                .map(|c| if matches!(c, '[' | ']' | '.' | ',') { '_' } else { c })
                .collect();
            stem.push('_');
            stem.push_str(name);
            stem.push('_');
            stem.push_str(&sanitized);
        }
        stem
    }

    /// Past de waarden toe op de store. Eerst wordt alles gevalideerd zodat een
    /// ongeldige waarde niets halverwege achterlaat.
    pub fn apply(&self, registry: &Registry, store: &mut ParameterStore) -> EngineResult<()> {
        let descriptor = registry.get(&self.algorithm)?;
        let mut staged: Vec<(&str, ParamValue)> = Vec::with_capacity(self.properties.len());
        for (name, raw) in &self.properties {
            let spec = descriptor.parameter(name).ok_or_else(|| {
                EngineError::validation(format!(
                    "algoritme `{}` heeft geen parameter `{name}`",
                    descriptor.id
                ))
            })?;
            staged.push((spec.id.as_str(), spec.coerce(raw)?));
        }
        for (name, value) in staged {
            store.set_value(descriptor, name, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{ParameterSpec, PropertyData};
    use crate::registry::BackendId;
    use serde_json::json;

    fn registry() -> Registry {
        let float_data: PropertyData =
            serde_json::from_value(json!({"default": 0.5, "min": 0.0, "max": 1.0}))
                .expect("float data");
        let color_data: PropertyData =
            serde_json::from_value(json!({"default": [0.2, 0.4, 0.6]})).expect("color data");
        let mut descriptor = AlgorithmDescriptor::new("Demo", "Demo", BackendId::Native(0));
        descriptor.parameters = vec![
            ParameterSpec::build("smoothness", "float", &float_data, Some(0)).expect("float"),
            ParameterSpec::build("tint", "color", &color_data, Some(0)).expect("color"),
        ];
        let mut registry = Registry::new();
        registry.insert(descriptor);
        registry
    }

    #[test]
    fn export_rounds_and_import_restores() {
        let registry = registry();
        let descriptor = registry.get("demo").expect("demo bestaat");
        let mut store = ParameterStore::new();
        store
            .set(descriptor, "smoothness", &json!(0.456))
            .expect("binnen grenzen");

        let saved = SavedConfiguration::capture(&store, descriptor).expect("capture");
        assert_eq!(saved.properties["smoothness"], json!(0.46));
        assert_eq!(saved.properties["tint"], json!([0.2, 0.4, 0.6]));

        let text = saved.to_json().expect("json");
        let mut restored = ParameterStore::new();
        SavedConfiguration::from_json(&text)
            .expect("parse")
            .apply(&registry, &mut restored)
            .expect("apply");
        let spec = descriptor.parameter("smoothness").expect("spec");
        assert_eq!(restored.value(descriptor, spec), &ParamValue::Float(0.46));
    }

    #[test]
    fn value_at_upper_bound_survives_round_trip() {
        let data: PropertyData =
            serde_json::from_value(json!({"default": 0.5, "min": 0.0, "max": 0.999})).expect("data");
        let mut descriptor = AlgorithmDescriptor::new("Edge", "Edge", BackendId::Native(0));
        descriptor.parameters = vec![ParameterSpec::build("p", "float", &data, Some(0)).expect("p")];
        let mut registry = Registry::new();
        registry.insert(descriptor);
        let descriptor = registry.get("edge").expect("edge bestaat");

        let mut store = ParameterStore::new();
        store.set(descriptor, "p", &json!(0.999)).expect("op de grens");
        let text = SavedConfiguration::capture(&store, descriptor)
            .and_then(|saved| saved.to_json())
            .expect("export");

        let mut restored = ParameterStore::new();
        SavedConfiguration::from_json(&text)
            .expect("parse")
            .apply(&registry, &mut restored)
            .expect("import binnen grenzen");
        let spec = descriptor.parameter("p").expect("spec");
        assert_eq!(restored.value(descriptor, spec), &ParamValue::Float(0.999));
    }

    #[test]
    fn missing_algorithm_field_is_rejected() {
        let err = SavedConfiguration::from_json(r#"{"properties": {}}"#).expect_err("geen algorithm");
        assert!(matches!(err, EngineError::Configuration(_)));
    }

    #[test]
    fn invalid_value_leaves_store_untouched() {
        let registry = registry();
        let descriptor = registry.get("demo").expect("demo bestaat");
        let mut store = ParameterStore::new();
        let saved = SavedConfiguration::from_json(
            r#"{"algorithm": "demo", "properties": {"tint": [0.1, 0.1, 0.1], "smoothness": 4.0}}"#,
        )
        .expect("parse");
        assert!(saved.apply(&registry, &mut store).is_err());
        assert!(store.group("demo").is_none());
    }

    #[test]
    fn file_stem_replaces_separators() {
        let saved = SavedConfiguration {
            algorithm: "demo".to_owned(),
            properties: serde_json::from_value(json!({"smoothness": 0.5, "tint": [1.0, 0.5, 0.0]}))
                .expect("map"),
        };
        assert_eq!(
            saved.suggested_file_stem(),
            "demo_smoothness_0_5_tint__1_0_0_5_0_0_"
        );
    }
}
