#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backends;
pub mod engine;
pub mod error;
pub mod interpret;
pub mod mesh;
pub mod params;
pub mod parse;
pub mod pipeline;
pub mod registry;
pub mod workbench;

use std::fmt;

use serde::Serialize;
use serde_json::Value as JsonValue;
use wasm_bindgen::JsError;
use wasm_bindgen::prelude::*;

use mesh::{EditableMesh, Scene};
use params::{ParamValue, ParameterSpec};
use registry::AlgorithmDescriptor;
use workbench::Workbench;

pub use error::{BackendError, EngineError, EngineResult};

cfg_if::cfg_if! {
    if #[cfg(all(feature = "console_error_panic_hook", target_arch = "wasm32"))] {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            console_error_panic_hook::set_once();
            init_logger();
        }
    } else {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            init_logger();
        }
    }
}

#[cfg(feature = "debug_logs")]
fn init_logger() {
    use log::LevelFilter;
    use wasm_bindgen_console_logger::DEFAULT_LOGGER;
    if log::set_logger(&DEFAULT_LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}

#[cfg(not(feature = "debug_logs"))]
fn init_logger() {}

#[cfg(all(feature = "parallel", target_arch = "wasm32"))]
#[wasm_bindgen]
pub async fn initialize_parallel(worker_count: Option<u32>) -> Result<(), JsError> {
    let threads = worker_count
        .map(|count| count.max(1) as usize)
        .or_else(|| {
            std::thread::available_parallelism()
                .map(|value| value.get())
                .ok()
        })
        .unwrap_or(1);

    wasm_bindgen_rayon::init_thread_pool(threads)
        .await
        .map_err(|err| JsError::new(&format!("kon rayon threadpool niet initialiseren: {err}")))
}

#[macro_export]
macro_rules! debug_log {
    ($($t:tt)*) => {{
        #[cfg(feature = "debug_logs")]
        {
            #[cfg(target_arch = "wasm32")]
            {
                ::web_sys::console::log_1(&::wasm_bindgen::JsValue::from_str(&format!($($t)*)));
            }
            #[cfg(not(target_arch = "wasm32"))]
            {
                println!("{}", format!($($t)*));
            }
        }
    }};
}

#[derive(Debug, Serialize)]
struct AlgorithmExport {
    id: String,
    name: String,
    /// Tooltipregels van de beschrijving.
    description: Vec<String>,
    backend: String,
    library: String,
    ready: bool,
}

#[derive(Debug, Serialize)]
struct ParameterExport<'a> {
    #[serde(flatten)]
    spec: &'a ParameterSpec,
    value: &'a ParamValue,
}

#[derive(Debug, Serialize)]
struct ExecutionSummary {
    outputs: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

/// Public entry point for consumers.
#[wasm_bindgen]
pub struct Engine {
    workbench: Workbench,
    scene: Option<Scene>,
}

#[wasm_bindgen]
impl Engine {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Engine {
        Engine {
            workbench: Workbench::new(),
            scene: None,
        }
    }

    /// Laad een catalogus; geeft de ids van de geladen algoritmen terug.
    #[wasm_bindgen]
    pub fn load_catalogue(&mut self, json: &str) -> Result<JsValue, JsValue> {
        let report = self.workbench.load_catalogue_str(json).map_err(to_js_error)?;
        serde_wasm_bindgen::to_value(&report.loaded).map_err(|err| JsError::new(&err.to_string()).into())
    }

    /// Laad de catalogus die met de engine meegeleverd wordt.
    #[wasm_bindgen]
    pub fn load_default_catalogue(&mut self) -> Result<JsValue, JsValue> {
        self.load_catalogue(workbench::DEFAULT_CATALOGUE)
    }

    /// Lijst van algoritmen voor UI-generatie.
    #[wasm_bindgen]
    pub fn get_algorithms(&self) -> Result<JsValue, JsValue> {
        let algorithms = algorithm_exports(&self.workbench);
        serde_wasm_bindgen::to_value(&algorithms).map_err(|err| JsError::new(&err.to_string()).into())
    }

    /// Parameters van één algoritme met hun huidige waarde.
    #[wasm_bindgen]
    pub fn get_parameters(&self, algorithm_id: &str) -> Result<JsValue, JsValue> {
        let descriptor = self.workbench.algorithm(algorithm_id).map_err(to_js_error)?;
        let parameters = parameter_exports(&self.workbench, descriptor);
        serde_wasm_bindgen::to_value(&parameters).map_err(|err| JsError::new(&err.to_string()).into())
    }

    #[wasm_bindgen]
    pub fn set_parameter(
        &mut self,
        algorithm_id: &str,
        parameter_id: &str,
        value: JsValue,
    ) -> Result<(), JsValue> {
        let raw: JsonValue = serde_wasm_bindgen::from_value(value)
            .map_err(|err| JsError::new(&format!("ongeldige parameterwaarde: {err}")))?;
        self.workbench
            .set_parameter(algorithm_id, parameter_id, &raw)
            .map_err(to_js_error)
    }

    #[wasm_bindgen]
    pub fn reset_parameters(&mut self, algorithm_id: &str) -> Result<(), JsValue> {
        self.workbench.reset_parameters(algorithm_id).map_err(to_js_error)
    }

    /// Huidige waarden als JSON-tekst.
    #[wasm_bindgen]
    pub fn export_configuration(&self, algorithm_id: &str) -> Result<String, JsValue> {
        self.workbench
            .export_configuration(algorithm_id)
            .and_then(|configuration| configuration.to_json())
            .map_err(to_js_error)
    }

    #[wasm_bindgen]
    pub fn suggested_file_name(&self, algorithm_id: &str) -> Result<String, JsValue> {
        self.workbench
            .suggested_file_name(algorithm_id)
            .map_err(to_js_error)
    }

    /// Lees een geëxporteerde configuratie; geeft de id van het algoritme terug.
    #[wasm_bindgen]
    pub fn import_configuration(&mut self, json: &str) -> Result<String, JsValue> {
        self.workbench.import_configuration(json).map_err(to_js_error)
    }

    /// Zet de actieve mesh uit platte buffers (`xyz` per vertex, driehoeken).
    #[wasm_bindgen]
    pub fn set_mesh(&mut self, name: &str, vertices: Vec<f64>, faces: Vec<u32>) -> Result<(), JsValue> {
        let mesh = EditableMesh::from_buffers(name, &vertices, &faces).map_err(to_js_error)?;
        self.scene = Some(Scene::new(mesh));
        Ok(())
    }

    /// Voer een algoritme uit op de actieve mesh.
    #[wasm_bindgen]
    pub fn execute(&mut self, algorithm_id: &str) -> Result<JsValue, JsValue> {
        let scene = match self.scene.as_mut() {
            Some(scene) => scene,
            None => return Err(js_error("er is geen mesh geladen")),
        };

        debug_log!("uitvoeren: {algorithm_id}");
        let results = self.workbench.run(algorithm_id, scene).map_err(to_js_error)?;
        let summary = ExecutionSummary {
            outputs: results.output_kinds().into_iter().map(|kind| kind.name()).collect(),
            message: results.message().map(str::to_owned),
        };
        serde_wasm_bindgen::to_value(&summary).map_err(|err| JsError::new(&err.to_string()).into())
    }

    /// De scène na de laatste uitvoering: actieve mesh, toegevoegde meshes en kleurlagen.
    #[wasm_bindgen]
    pub fn get_mesh(&self) -> Result<JsValue, JsValue> {
        let scene = match self.scene.as_ref() {
            Some(scene) => scene,
            None => return Err(js_error("er is geen mesh geladen")),
        };
        serde_wasm_bindgen::to_value(scene).map_err(|err| JsError::new(&err.to_string()).into())
    }

    /// Laatste bericht dat een algoritme aan de gebruiker wilde tonen.
    #[wasm_bindgen]
    pub fn get_message(&self) -> Option<String> {
        self.scene
            .as_ref()
            .map(|scene| scene.message.clone())
            .filter(|message| !message.is_empty())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

fn algorithm_exports(workbench: &Workbench) -> Vec<AlgorithmExport> {
    workbench
        .registry()
        .algorithms()
        .iter()
        .map(|descriptor| AlgorithmExport {
            id: descriptor.id.clone(),
            name: descriptor.display_name.clone(),
            description: descriptor.description.lines.clone(),
            backend: descriptor.backend_id.to_string(),
            library: descriptor.library.clone(),
            ready: workbench.store().is_ready(descriptor),
        })
        .collect()
}

fn parameter_exports<'a>(
    workbench: &'a Workbench,
    descriptor: &'a AlgorithmDescriptor,
) -> Vec<ParameterExport<'a>> {
    workbench
        .store()
        .resolved(descriptor)
        .into_iter()
        .map(|(spec, value)| ParameterExport { spec, value })
        .collect()
}

pub(crate) fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

pub(crate) fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

fn to_js_error<E: fmt::Display>(error: E) -> JsValue {
    js_error(&error.to_string())
}

fn js_error(message: &str) -> JsValue {
    #[cfg(target_arch = "wasm32")]
    {
        JsError::new(message).into()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
        JsValue::NULL
    }
}

#[cfg(test)]
mod tests {
    use super::{algorithm_exports, clamp, normalize_name, parameter_exports};
    use crate::workbench::Workbench;

    #[test]
    fn exports_list_catalogue_order_and_readiness() {
        let workbench = Workbench::with_default_catalogue().expect("catalogus");
        let algorithms = algorithm_exports(&workbench);
        assert_eq!(algorithms[0].id, "area_computation_cgal");
        assert!(algorithms[0].ready);
        let test_cpp = algorithms
            .iter()
            .find(|algorithm| algorithm.id == "test_cpp")
            .expect("test_cpp bestaat");
        assert!(!test_cpp.ready);
        assert_eq!(test_cpp.backend, "native-backend-0");
    }

    #[test]
    fn parameter_export_flattens_spec() {
        let workbench = Workbench::with_default_catalogue().expect("catalogus");
        let descriptor = workbench.algorithm("simplification_cgal").expect("bestaat");
        let exports = parameter_exports(&workbench, descriptor);
        let json = serde_json::to_value(&exports).expect("serialiseerbaar");
        assert_eq!(json[0]["id"], "decimation_factor");
        assert_eq!(json[0]["value"], 0.5);
    }

    #[test]
    fn helpers_clamp_and_normalize() {
        assert_eq!(clamp(5.0, 0.0, 1.0), 1.0);
        assert_eq!(clamp(-1.0, f64::NEG_INFINITY, 0.5), -1.0);
        assert_eq!(normalize_name("  Segmentation_CGAL "), "segmentation_cgal");
    }
}
