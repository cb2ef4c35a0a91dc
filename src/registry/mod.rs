//! In-memory registry van alle geladen algoritmen.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::error::{EngineError, EngineResult};
use crate::params::ParameterSpec;
use crate::pipeline::InputStep;

/// Taal-id waarmee de catalogus de MeshLab-backend aanduidt.
pub const MESHLAB_LANGUAGE_ID: i64 = 1;

/// Identiteit van de backend die een algoritme uitvoert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendId {
    /// Filterbibliotheek die functies op naam toepast op een mesh-sessie.
    Meshlab,
    /// Gecompileerde router; het getal kiest de routertabel.
    Native(u32),
}

impl BackendId {
    /// Vertaalt het numerieke `language_id` uit de catalogus.
    pub fn from_language_id(id: i64) -> EngineResult<Self> {
        if id == MESHLAB_LANGUAGE_ID {
            return Ok(Self::Meshlab);
        }
        u32::try_from(id)
            .map(Self::Native)
            .map_err(|_| EngineError::configuration(format!("ongeldig language_id {id}")))
    }

    /// Leest een tekstuele backend-id zoals `meshlab-backend` of `native-backend-0`.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let key = crate::normalize_name(text).replace('_', "-");
        if key == "meshlab" || key == "meshlab-backend" {
            return Some(Self::Meshlab);
        }
        key.strip_prefix("native-backend-")
            .or_else(|| key.strip_prefix("native-"))
            .and_then(|suffix| suffix.parse().ok())
            .map(Self::Native)
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Meshlab => f.write_str("meshlab-backend"),
            Self::Native(id) => write!(f, "native-backend-{id}"),
        }
    }
}

/// Beschrijving van de algoritmetekst, ruw en als tooltipregels.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Description {
    pub text: String,
    pub lines: Vec<String>,
}

impl Description {
    #[must_use]
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_owned(),
            lines: crate::parse::description::wrap_description(text),
        }
    }

    /// Ingeklapte weergave: alleen de eerste regel, ingekort met "...".
    #[must_use]
    pub fn collapsed(&self) -> String {
        crate::parse::description::collapsed(&self.lines)
    }
}

/// Eén geregistreerd algoritme.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlgorithmDescriptor {
    pub id: String,
    pub display_name: String,
    pub description: Description,
    pub backend_id: BackendId,
    /// Bibliotheek waarin het algoritme gedeclareerd werd.
    pub library: String,
    pub input_pipeline: Vec<InputStep>,
    pub sub_algorithm_count: usize,
    pub backend_function_names: Vec<String>,
    pub parameters: Vec<ParameterSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_group: Option<String>,
}

impl AlgorithmDescriptor {
    /// Minimale beschrijving met één stap die de id als functienaam gebruikt.
    #[must_use]
    pub fn new(id: &str, display_name: &str, backend_id: BackendId) -> Self {
        let id = crate::normalize_name(id);
        Self {
            backend_function_names: vec![id.clone()],
            id,
            display_name: display_name.to_owned(),
            description: Description::default(),
            backend_id,
            library: String::new(),
            input_pipeline: Vec::new(),
            sub_algorithm_count: 1,
            parameters: Vec::new(),
            property_group: None,
        }
    }

    #[must_use]
    pub fn parameter(&self, parameter_id: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|spec| spec.id == parameter_id)
    }

    /// Controleert de structurele invarianten van de beschrijving.
    pub fn validate(&self) -> EngineResult<()> {
        if self.sub_algorithm_count == 0 {
            return Err(EngineError::configuration(format!(
                "algoritme `{}` heeft geen stappen",
                self.id
            )));
        }
        if self.backend_function_names.len() != self.sub_algorithm_count {
            return Err(EngineError::configuration(format!(
                "algoritme `{}` declareert {} stappen maar {} functienamen",
                self.id,
                self.sub_algorithm_count,
                self.backend_function_names.len()
            )));
        }
        for (index, spec) in self.parameters.iter().enumerate() {
            if let Some(step) = spec.step_index.filter(|step| *step >= self.sub_algorithm_count) {
                return Err(EngineError::configuration(format!(
                    "parameter `{}` van `{}` verwijst naar stap {} terwijl er {} zijn",
                    spec.id,
                    self.id,
                    step + 1,
                    self.sub_algorithm_count
                )));
            }
            if self.parameters[..index].iter().any(|other| other.id == spec.id) {
                return Err(EngineError::configuration(format!(
                    "algoritme `{}` declareert parameter `{}` meerdere keren",
                    self.id, spec.id
                )));
            }
        }
        Ok(())
    }
}

/// Alle algoritmen in laadvolgorde, met index op id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registry {
    algorithms: Vec<AlgorithmDescriptor>,
    index: HashMap<String, usize>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Voegt een algoritme toe; een bestaande id wordt overschreven op
    /// dezelfde positie.
    pub fn insert(&mut self, descriptor: AlgorithmDescriptor) {
        match self.index.get(&descriptor.id) {
            Some(&position) => {
                log::debug!("algoritme `{}` overschreven", descriptor.id);
                self.algorithms[position] = descriptor;
            }
            None => {
                self.index
                    .insert(descriptor.id.clone(), self.algorithms.len());
                self.algorithms.push(descriptor);
            }
        }
    }

    /// Zoekt een algoritme op id (hoofdletterongevoelig).
    pub fn get(&self, id: &str) -> EngineResult<&AlgorithmDescriptor> {
        self.find(id).ok_or_else(|| {
            EngineError::not_found(id, self.algorithms.iter().map(|d| d.id.as_str()))
        })
    }

    #[must_use]
    pub fn find(&self, id: &str) -> Option<&AlgorithmDescriptor> {
        self.index
            .get(&crate::normalize_name(id))
            .map(|&position| &self.algorithms[position])
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    #[must_use]
    pub fn algorithms(&self) -> &[AlgorithmDescriptor] {
        &self.algorithms
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.algorithms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.algorithms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_id_one_is_meshlab() {
        assert_eq!(BackendId::from_language_id(1), Ok(BackendId::Meshlab));
        assert_eq!(BackendId::from_language_id(0), Ok(BackendId::Native(0)));
        assert!(BackendId::from_language_id(-4).is_err());
    }

    #[test]
    fn textual_backend_ids_round_trip_through_display() {
        for id in [BackendId::Meshlab, BackendId::Native(3)] {
            assert_eq!(BackendId::parse(&id.to_string()), Some(id));
        }
        assert_eq!(BackendId::parse("cgal"), None);
    }

    #[test]
    fn insert_with_existing_id_keeps_position() {
        let mut registry = Registry::new();
        registry.insert(AlgorithmDescriptor::new("a", "A", BackendId::Native(0)));
        registry.insert(AlgorithmDescriptor::new("b", "B", BackendId::Native(0)));
        registry.insert(AlgorithmDescriptor::new("A", "A2", BackendId::Meshlab));

        let names: Vec<&str> = registry
            .algorithms()
            .iter()
            .map(|d| d.display_name.as_str())
            .collect();
        assert_eq!(names, vec!["A2", "B"]);
        assert_eq!(registry.get("a").map(|d| d.backend_id), Ok(BackendId::Meshlab));
    }

    #[test]
    fn step_index_must_be_in_range() {
        let mut descriptor = AlgorithmDescriptor::new("a", "A", BackendId::Native(0));
        descriptor.parameters.push(
            ParameterSpec::build("p", "float", &crate::params::PropertyData::default(), Some(1))
                .expect("float spec"),
        );
        assert!(matches!(
            descriptor.validate(),
            Err(EngineError::Configuration(_))
        ));
    }
}
