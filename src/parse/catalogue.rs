//! Loader voor de JSON-catalogus met algoritmen.
//!
//! De catalogus is een object met per backend een sectie:
//!
//! ```json
//! { "cgal": { "language_id": 0, "libraries": [
//!     { "id_name": "cgal", "algorithms": [
//!         { "id_name": "area_computation_cgal", "name": "Area",
//!           "input": ["triangulation", "vertex_coordinates", "face_indices"],
//!           "steps": 1 } ] } ] } }
//! ```

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

use crate::error::{EngineError, EngineResult};
use crate::params::{ParameterSpec, PropertyData, PropertyGroupRegistrar};
use crate::pipeline::InputStep;
use crate::registry::{AlgorithmDescriptor, BackendId, Description, Registry};

/// Waarde van `algorithm_step` die "niet voor de backend" betekent.
const UNUSED_STEP: i64 = -1;

#[derive(Debug, Deserialize)]
struct BackendSection {
    #[serde(default)]
    language_id: Option<i64>,
    #[serde(default)]
    backend_id: Option<JsonValue>,
    #[serde(default)]
    libraries: Vec<LibrarySection>,
}

#[derive(Debug, Deserialize)]
struct LibrarySection {
    #[serde(default)]
    id_name: String,
    #[serde(default)]
    algorithms: Option<Vec<AlgorithmSection>>,
}

#[derive(Debug, Deserialize)]
struct AlgorithmSection {
    id_name: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    input: Vec<String>,
    #[serde(default)]
    steps: Option<usize>,
    #[serde(default)]
    functions_name: Option<Vec<String>>,
    #[serde(default)]
    properties: Option<PropertiesSection>,
}

#[derive(Debug, Deserialize)]
struct PropertiesSection {
    class_name: String,
    #[serde(default)]
    data: Vec<PropertyEntry>,
}

#[derive(Debug, Deserialize)]
struct PropertyEntry {
    id_name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    algorithm_step: Option<i64>,
    #[serde(default)]
    data: PropertyData,
}

/// Samenvatting van een geslaagde laadronde.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    /// Ids in documentvolgorde.
    pub loaded: Vec<String>,
    /// Ids die een eerder geladen algoritme vervangen hebben.
    pub replaced: Vec<String>,
}

/// Leest een catalogus zonder iets te registreren.
pub fn parse_catalogue(text: &str) -> EngineResult<Vec<AlgorithmDescriptor>> {
    let document: Map<String, JsonValue> = serde_json::from_str(text)
        .map_err(|err| EngineError::configuration(format!("catalogus is geen geldig JSON-object: {err}")))?;

    let mut seen = HashSet::new();
    let mut descriptors = Vec::new();

    for (backend_key, raw) in document {
        let section: BackendSection = serde_json::from_value(raw).map_err(|err| {
            EngineError::configuration(format!("backendsectie `{backend_key}` is ongeldig: {err}"))
        })?;
        let backend_id = backend_identity(&backend_key, &section)?;

        for library in &section.libraries {
            let Some(algorithms) = library.algorithms.as_ref() else {
                return Err(EngineError::configuration(format!(
                    "bibliotheek `{}` heeft geen veld `algorithms`",
                    library.id_name
                )));
            };
            for algorithm in algorithms {
                let descriptor = build_descriptor(algorithm, backend_id, &library.id_name)?;
                if !seen.insert(descriptor.id.clone()) {
                    return Err(EngineError::configuration(format!(
                        "algoritme `{}` komt meerdere keren voor in de catalogus",
                        descriptor.id
                    )));
                }
                descriptors.push(descriptor);
            }
        }
    }

    Ok(descriptors)
}

/// Leest een catalogus en voegt hem in zijn geheel toe aan `registry`.
///
/// Bij een fout blijft de registry ongewijzigd. Ids die al bestonden worden
/// overschreven. Voor elk algoritme met parameters wordt een
/// eigenschapsgroep aangemeld bij `registrar`.
pub fn load_catalogue(
    text: &str,
    registry: &mut Registry,
    registrar: &mut dyn PropertyGroupRegistrar,
) -> EngineResult<LoadReport> {
    let staged = parse_catalogue(text)?;
    let mut report = LoadReport::default();

    for descriptor in staged {
        if registry.contains(&descriptor.id) {
            report.replaced.push(descriptor.id.clone());
        }
        if let Some(class_name) = descriptor.property_group.as_deref() {
            registrar.register_group(&descriptor.id, class_name, &descriptor.parameters);
        }
        report.loaded.push(descriptor.id.clone());
        registry.insert(descriptor);
    }

    log::info!(
        "catalogus geladen: {} algoritmen ({} vervangen)",
        report.loaded.len(),
        report.replaced.len()
    );
    Ok(report)
}

fn backend_identity(key: &str, section: &BackendSection) -> EngineResult<BackendId> {
    if let Some(language_id) = section.language_id {
        return BackendId::from_language_id(language_id);
    }
    match section.backend_id.as_ref() {
        Some(JsonValue::Number(number)) => number
            .as_i64()
            .ok_or_else(|| EngineError::configuration(format!("ongeldige backend_id {number}")))
            .and_then(BackendId::from_language_id),
        Some(JsonValue::String(text)) => BackendId::parse(text).ok_or_else(|| {
            EngineError::configuration(format!("onbekende backend_id `{text}` in `{key}`"))
        }),
        _ => Err(EngineError::configuration(format!(
            "backendsectie `{key}` mist `language_id`"
        ))),
    }
}

fn build_descriptor(
    section: &AlgorithmSection,
    backend_id: BackendId,
    library: &str,
) -> EngineResult<AlgorithmDescriptor> {
    let mut descriptor = AlgorithmDescriptor::new(&section.id_name, &section.name, backend_id);
    if descriptor.id.is_empty() {
        return Err(EngineError::configuration(format!(
            "algoritme `{}` in bibliotheek `{library}` heeft een lege id_name",
            section.name
        )));
    }
    descriptor.library = library.to_owned();
    descriptor.description = Description::new(&section.description);
    descriptor.input_pipeline = section
        .input
        .iter()
        .map(|name| InputStep::parse(name))
        .collect::<EngineResult<_>>()?;

    match (&section.functions_name, section.steps) {
        (Some(functions), steps) => {
            descriptor.backend_function_names = functions.clone();
            descriptor.sub_algorithm_count = steps.unwrap_or(functions.len());
        }
        (None, Some(steps)) if steps > 1 => {
            return Err(EngineError::configuration(format!(
                "algoritme `{}` heeft {steps} stappen maar geen functions_name",
                descriptor.id
            )));
        }
        (None, steps) => descriptor.sub_algorithm_count = steps.unwrap_or(1),
    }

    if let Some(properties) = &section.properties {
        descriptor.property_group = Some(properties.class_name.clone());
        descriptor.parameters = properties
            .data
            .iter()
            .map(|entry| {
                let step_index = step_index(&descriptor.id, entry)?;
                ParameterSpec::build(&entry.id_name, &entry.kind, &entry.data, step_index)
            })
            .collect::<EngineResult<_>>()?;
    }

    descriptor.validate()?;
    Ok(descriptor)
}

// `algorithm_step` is 1-gebaseerd in het document.
fn step_index(algorithm: &str, entry: &PropertyEntry) -> EngineResult<Option<usize>> {
    match entry.algorithm_step {
        None | Some(UNUSED_STEP) => Ok(None),
        Some(step) if step >= 1 => Ok(usize::try_from(step - 1).ok()),
        Some(step) => Err(EngineError::configuration(format!(
            "parameter `{}` van `{algorithm}` heeft ongeldige algorithm_step {step}",
            entry.id_name
        ))),
    }
}
