//! Routering van een algoritme-aanroep naar de juiste backend.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{EngineError, EngineResult};
use crate::mesh::MeshPayload;
use crate::params::{BackendValue, ParamValue};
use crate::registry::{BackendId, Registry};

pub mod backend;
pub mod classify;
pub mod result;

pub use backend::{Backend, BackendRegistry, BackendSession, SessionOutcome, StepParams};
pub use result::{OutputKind, ResultKind, ResultPayload};

/// Waarden per parameter-id zoals de host ze aanlevert. Ontbrekende
/// parameters vallen terug op hun standaardwaarde.
pub type ResolvedParameters = BTreeMap<String, ParamValue>;

/// Alles wat de backend voor één aanroep nodig heeft.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionRequest {
    pub algorithm_id: String,
    pub backend_id: BackendId,
    pub mesh: MeshPayload,
    /// Eén woordenboek per sub-algoritme.
    pub params: Vec<StepParams>,
    pub functions: Vec<String>,
    /// Waarden die alleen de orkestratie gebruikt; gaan nooit naar de backend.
    pub options: BTreeMap<String, ParamValue>,
}

impl ExecutionRequest {
    /// Leest een booleaanse optie; ontbreekt ze, dan `false`.
    #[must_use]
    pub fn option_flag(&self, name: &str) -> bool {
        self.options
            .get(name)
            .and_then(ParamValue::as_bool)
            .unwrap_or(false)
    }
}

/// Voert algoritmen uit via de geregistreerde backends.
#[derive(Debug, Default)]
pub struct ExecutionEngine {
    backends: BackendRegistry,
}

impl ExecutionEngine {
    #[must_use]
    pub fn new(backends: BackendRegistry) -> Self {
        Self { backends }
    }

    /// Engine met de ingebouwde native router.
    #[must_use]
    pub fn with_builtin_backends() -> Self {
        let mut backends = BackendRegistry::new();
        crate::backends::register_builtin(&mut backends);
        Self::new(backends)
    }

    #[must_use]
    pub fn backends(&self) -> &BackendRegistry {
        &self.backends
    }

    pub fn backends_mut(&mut self) -> &mut BackendRegistry {
        &mut self.backends
    }

    /// Bouwt het verzoek: opzoeken, gereedheid controleren, parameters per
    /// stap verdelen en omzetten naar backendwaarden.
    pub fn prepare(
        &self,
        registry: &Registry,
        algorithm_id: &str,
        resolved: &ResolvedParameters,
        mesh: MeshPayload,
    ) -> EngineResult<ExecutionRequest> {
        let descriptor = registry.get(algorithm_id)?;

        if let Some(unknown) = resolved
            .keys()
            .find(|key| descriptor.parameter(key).is_none())
        {
            return Err(EngineError::validation(format!(
                "algoritme `{}` heeft geen parameter `{unknown}`",
                descriptor.id
            )));
        }

        let mut params: Vec<StepParams> = vec![StepParams::new(); descriptor.sub_algorithm_count];
        let mut options = BTreeMap::new();

        for spec in &descriptor.parameters {
            let value = resolved.get(&spec.id).unwrap_or(&spec.default);
            if spec.is_unset(value) {
                return Err(EngineError::validation(format!(
                    "kies eerst een optie voor `{}` van `{}`",
                    spec.label, descriptor.id
                )));
            }
            match spec.step_index {
                Some(step) => {
                    let converted: BackendValue = spec.to_backend(value)?;
                    let slot = params.get_mut(step).ok_or_else(|| {
                        EngineError::configuration(format!(
                            "parameter `{}` verwijst naar onbekende stap {}",
                            spec.id,
                            step + 1
                        ))
                    })?;
                    slot.insert(spec.id.clone(), converted);
                }
                None => {
                    spec.validate(value)?;
                    options.insert(spec.id.clone(), value.clone());
                }
            }
        }

        if mesh.vertices.is_empty() {
            return Err(EngineError::validation(format!(
                "algoritme `{}` heeft vertexcoördinaten nodig",
                descriptor.id
            )));
        }
        mesh.validate()?;

        Ok(ExecutionRequest {
            algorithm_id: descriptor.id.clone(),
            backend_id: descriptor.backend_id,
            mesh,
            params,
            functions: descriptor.backend_function_names.clone(),
            options,
        })
    }

    /// Voert de stappen van het verzoek uit in één backendsessie en
    /// classificeert het resultaat. Deelresultaten worden bij een fout
    /// weggegooid.
    pub fn dispatch(&self, request: &ExecutionRequest) -> EngineResult<ResultPayload> {
        let backend = self.backends.get(request.backend_id)?;
        let mut session = backend.open_session(&request.mesh)?;

        for (function, params) in request.functions.iter().zip(&request.params) {
            log::debug!(
                "{}: {function} met {} parameters",
                request.backend_id,
                params.len()
            );
            session.invoke(function, params)?;
        }

        let outcome = session.current_result()?;
        let kinds = if outcome.declared.is_empty() {
            classify::classify(&request.functions, &outcome.mesh)?
        } else {
            outcome.declared.clone()
        };
        Ok(ResultPayload::assemble(&kinds, outcome)?)
    }

    /// `prepare` gevolgd door `dispatch`.
    pub fn execute(
        &self,
        registry: &Registry,
        algorithm_id: &str,
        resolved: &ResolvedParameters,
        mesh: MeshPayload,
    ) -> EngineResult<ResultPayload> {
        let request = self.prepare(registry, algorithm_id, resolved, mesh)?;
        self.dispatch(&request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendError;
    use crate::params::{ParameterSpec, PropertyData};
    use crate::registry::AlgorithmDescriptor;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    type CallLog = Rc<RefCell<Vec<(String, StepParams)>>>;

    struct RecordingBackend {
        calls: CallLog,
        vertex_color: bool,
    }

    struct RecordingSession {
        calls: CallLog,
        mesh: MeshPayload,
    }

    impl Backend for RecordingBackend {
        fn open_session(&self, mesh: &MeshPayload) -> Result<Box<dyn BackendSession>, BackendError> {
            let mut mesh = mesh.clone();
            if self.vertex_color {
                mesh.vertex_color = vec![0.5; mesh.vertex_count() * 4];
            }
            Ok(Box::new(RecordingSession {
                calls: Rc::clone(&self.calls),
                mesh,
            }))
        }
    }

    impl BackendSession for RecordingSession {
        fn invoke(&mut self, function: &str, params: &StepParams) -> Result<(), BackendError> {
            if function == "explode" {
                return Err(BackendError::failed(function, "filter exploded"));
            }
            self.calls
                .borrow_mut()
                .push((function.to_owned(), params.clone()));
            Ok(())
        }

        fn current_result(&mut self) -> Result<SessionOutcome, BackendError> {
            Ok(SessionOutcome {
                mesh: self.mesh.clone(),
                ..SessionOutcome::default()
            })
        }
    }

    fn triangle() -> MeshPayload {
        MeshPayload::new(vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0], vec![0, 1, 2])
    }

    fn setup(functions: &[&str], vertex_color: bool) -> (Registry, ExecutionEngine, CallLog) {
        let float_data: PropertyData =
            serde_json::from_value(json!({"default": 0.5, "min": 0.0, "max": 1.0})).expect("data");
        let flag_data: PropertyData = serde_json::from_value(json!({"default": "true"})).expect("data");

        let mut descriptor = AlgorithmDescriptor::new("A", "A", BackendId::Meshlab);
        descriptor.sub_algorithm_count = functions.len();
        descriptor.backend_function_names = functions.iter().map(|f| (*f).to_owned()).collect();
        descriptor.parameters = vec![
            ParameterSpec::build("p", "float", &float_data, Some(0)).expect("p"),
            ParameterSpec::build("delete_materials", "boolean", &flag_data, None).expect("flag"),
        ];
        let mut registry = Registry::new();
        registry.insert(descriptor);

        let calls: CallLog = Rc::default();
        let mut engine = ExecutionEngine::default();
        engine.backends_mut().register(
            BackendId::Meshlab,
            Box::new(RecordingBackend {
                calls: Rc::clone(&calls),
                vertex_color,
            }),
        );
        (registry, engine, calls)
    }

    #[test]
    fn parameters_are_grouped_per_step() {
        let (registry, engine, _) = setup(&["f1"], false);
        let resolved = ResolvedParameters::from([("p".to_owned(), ParamValue::Float(0.8))]);
        let request = engine
            .prepare(&registry, "A", &resolved, triangle())
            .expect("geldig verzoek");

        assert_eq!(request.functions, vec!["f1"]);
        assert_eq!(request.params.len(), 1);
        assert_eq!(request.params[0].get("p"), Some(&BackendValue::Float(0.8)));
        assert_eq!(request.params[0].len(), 1);
        assert!(request.option_flag("delete_materials"));
    }

    #[test]
    fn partition_covers_every_declared_parameter() {
        let (registry, engine, _) = setup(&["f1"], false);
        let request = engine
            .prepare(&registry, "a", &ResolvedParameters::new(), triangle())
            .expect("geldig verzoek");
        let mut seen: Vec<&str> = request
            .params
            .iter()
            .flat_map(|step| step.keys().map(String::as_str))
            .chain(request.options.keys().map(String::as_str))
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, vec!["delete_materials", "p"]);
    }

    #[test]
    fn curvature_session_classifies_as_vertex_coloration() {
        let (registry, engine, calls) = setup(&["compute-curvature-color"], true);
        let payload = engine
            .execute(&registry, "a", &ResolvedParameters::new(), triangle())
            .expect("uitvoering");
        assert_eq!(payload.output_kinds(), vec![OutputKind::VertexColoration]);
        assert_eq!(calls.borrow().len(), 1);
    }

    #[test]
    fn unknown_function_combination_is_unsupported() {
        let (registry, engine, _) = setup(&["f1", "f2"], false);
        assert!(matches!(
            engine.execute(&registry, "a", &ResolvedParameters::new(), triangle()),
            Err(EngineError::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn backend_failure_propagates_and_stops_the_chain() {
        let (registry, engine, calls) = setup(&["explode", "f2"], false);
        let err = engine
            .execute(&registry, "a", &ResolvedParameters::new(), triangle())
            .expect_err("backend faalt");
        assert_eq!(err.to_string(), "filter exploded");
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn missing_vertices_and_unknown_algorithm_are_rejected() {
        let (registry, engine, _) = setup(&["f1"], false);
        assert!(matches!(
            engine.prepare(&registry, "a", &ResolvedParameters::new(), MeshPayload::default()),
            Err(EngineError::Validation(_))
        ));
        assert!(matches!(
            engine.prepare(&registry, "b", &ResolvedParameters::new(), triangle()),
            Err(EngineError::NotFound { .. })
        ));
    }

    #[test]
    fn unregistered_backend_is_reported() {
        let mut registry = Registry::new();
        registry.insert(AlgorithmDescriptor::new("lonely", "Lonely", BackendId::Native(7)));
        let engine = ExecutionEngine::default();
        assert_eq!(
            engine.execute(&registry, "lonely", &ResolvedParameters::new(), triangle()),
            Err(EngineError::Backend(BackendError::Unavailable(BackendId::Native(7))))
        );
    }
}
