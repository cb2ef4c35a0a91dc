//! Samenhang van registry, parameteropslag en engine zoals een host ze
//! gebruikt: catalogus laden, parameters zetten en een algoritme op een
//! scène loslaten.

use serde_json::Value as JsonValue;

use crate::engine::{ExecutionEngine, ResolvedParameters, ResultPayload};
use crate::error::EngineResult;
use crate::interpret::{InterpretOptions, apply_results};
use crate::mesh::{MeshProvider, MeshSink};
use crate::params::config::CONFIGURATION_EXTENSION;
use crate::params::{ParameterStore, SavedConfiguration};
use crate::parse::{LoadReport, load_catalogue};
use crate::pipeline::run_input_pipeline;
use crate::registry::{AlgorithmDescriptor, Registry};

/// Catalogus die met de crate meegeleverd wordt.
pub const DEFAULT_CATALOGUE: &str = include_str!("../assets/catalogue.json");

#[derive(Debug)]
pub struct Workbench {
    registry: Registry,
    store: ParameterStore,
    engine: ExecutionEngine,
}

impl Workbench {
    /// Lege werkbank met de ingebouwde backends.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            store: ParameterStore::new(),
            engine: ExecutionEngine::with_builtin_backends(),
        }
    }

    /// Werkbank met de meegeleverde catalogus.
    pub fn with_default_catalogue() -> EngineResult<Self> {
        let mut workbench = Self::new();
        workbench.load_catalogue_str(DEFAULT_CATALOGUE)?;
        Ok(workbench)
    }

    pub fn load_catalogue_str(&mut self, text: &str) -> EngineResult<LoadReport> {
        load_catalogue(text, &mut self.registry, &mut self.store)
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    #[must_use]
    pub fn store(&self) -> &ParameterStore {
        &self.store
    }

    #[must_use]
    pub fn engine(&self) -> &ExecutionEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut ExecutionEngine {
        &mut self.engine
    }

    pub fn algorithm(&self, id: &str) -> EngineResult<&AlgorithmDescriptor> {
        self.registry.get(id)
    }

    pub fn set_parameter(&mut self, algorithm_id: &str, parameter_id: &str, raw: &JsonValue) -> EngineResult<()> {
        let descriptor = self.registry.get(algorithm_id)?;
        self.store.set(descriptor, parameter_id, raw)
    }

    pub fn reset_parameters(&mut self, algorithm_id: &str) -> EngineResult<()> {
        let descriptor = self.registry.get(algorithm_id)?;
        self.store.reset(descriptor);
        Ok(())
    }

    pub fn is_ready(&self, algorithm_id: &str) -> EngineResult<bool> {
        let descriptor = self.registry.get(algorithm_id)?;
        Ok(self.store.is_ready(descriptor))
    }

    /// Huidige waarden van een algoritme als configuratie.
    pub fn export_configuration(&self, algorithm_id: &str) -> EngineResult<SavedConfiguration> {
        let descriptor = self.registry.get(algorithm_id)?;
        SavedConfiguration::capture(&self.store, descriptor)
    }

    /// Bestandsnaam waaronder een export standaard bewaard wordt.
    pub fn suggested_file_name(&self, algorithm_id: &str) -> EngineResult<String> {
        let configuration = self.export_configuration(algorithm_id)?;
        Ok(format!(
            "{}{CONFIGURATION_EXTENSION}",
            configuration.suggested_file_stem()
        ))
    }

    /// Leest een configuratie en zet de waarden; geeft de id van het algoritme terug.
    pub fn import_configuration(&mut self, text: &str) -> EngineResult<String> {
        let configuration = SavedConfiguration::from_json(text)?;
        configuration.apply(&self.registry, &mut self.store)?;
        Ok(crate::normalize_name(&configuration.algorithm))
    }

    /// Waarden uit de store in de vorm die de engine verwacht.
    pub fn resolved_parameters(&self, algorithm_id: &str) -> EngineResult<ResolvedParameters> {
        let descriptor = self.registry.get(algorithm_id)?;
        Ok(self
            .store
            .resolved(descriptor)
            .into_iter()
            .map(|(spec, value)| (spec.id.clone(), value.clone()))
            .collect())
    }

    /// Draait een algoritme op `mesh`: invoerpipeline, uitvoering en
    /// interpretatie. Bij een fout blijft de mesh ongewijzigd, behalve een
    /// triangulatie die de pipeline al uitgevoerd heeft.
    pub fn run<M: MeshProvider + MeshSink>(&self, algorithm_id: &str, mesh: &mut M) -> EngineResult<ResultPayload> {
        #[cfg(not(target_arch = "wasm32"))]
        let started = std::time::Instant::now();

        let descriptor = self.registry.get(algorithm_id)?;
        let resolved = self.resolved_parameters(algorithm_id)?;
        let payload = run_input_pipeline(&descriptor.input_pipeline, &mut *mesh)?;

        let request = self.engine.prepare(&self.registry, algorithm_id, &resolved, payload)?;
        let results = self.engine.dispatch(&request)?;
        apply_results(&results, InterpretOptions::from_request(&request), mesh)?;

        #[cfg(not(target_arch = "wasm32"))]
        log::debug!(
            "{} uitgevoerd in {:?}: {:?}",
            descriptor.id,
            started.elapsed(),
            results.output_kinds()
        );
        Ok(results)
    }
}

impl Default for Workbench {
    fn default() -> Self {
        Self::new()
    }
}
