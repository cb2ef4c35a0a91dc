//! Native router: algoritmen die in de crate zelf geïmplementeerd zijn en op
//! naam gekozen worden.

use crate::engine::{Backend, BackendSession, OutputKind, SessionOutcome, StepParams};
use crate::error::BackendError;
use crate::mesh::MeshPayload;
use crate::params::BackendValue;
use crate::registry::BackendId;

pub mod area;
pub(crate) mod geometry;
pub mod segmentation;
pub mod simplification;
pub mod test_pyramid;

/// Wat een native algoritme na één aanroep oplevert.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NativeOutput {
    /// Nieuwe mesh-toestand van de sessie; `None` laat de mesh ongemoeid.
    pub mesh: Option<MeshPayload>,
    pub declared: Vec<OutputKind>,
    pub result_infos: String,
}

impl NativeOutput {
    #[must_use]
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            mesh: None,
            declared: vec![OutputKind::Message],
            result_infos: text.into(),
        }
    }
}

/// Gemeenschappelijke interface van de native algoritmen.
pub trait NativeAlgorithm {
    fn run(&self, mesh: &MeshPayload, params: &StepParams) -> Result<NativeOutput, BackendError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmKind {
    Area,
    Segmentation,
    Simplification,
    TestPyramid,
}

impl AlgorithmKind {
    pub fn run(self, mesh: &MeshPayload, params: &StepParams) -> Result<NativeOutput, BackendError> {
        match self {
            Self::Area => area::SurfaceArea.run(mesh, params),
            Self::Segmentation => segmentation::Segmentation.run(mesh, params),
            Self::Simplification => simplification::Simplification.run(mesh, params),
            Self::TestPyramid => test_pyramid::TestPyramid.run(mesh, params),
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Area => "Surface Area",
            Self::Segmentation => "Surface Segmentation",
            Self::Simplification => "Surface Simplification",
            Self::TestPyramid => "Test Pyramid",
        }
    }
}

#[derive(Debug)]
pub struct Registration {
    pub names: &'static [&'static str],
    pub kind: AlgorithmKind,
}

pub const REGISTRATIONS: &[Registration] = &[
    Registration {
        names: &["segmentation_cgal"],
        kind: AlgorithmKind::Segmentation,
    },
    Registration {
        names: &["simplification_cgal"],
        kind: AlgorithmKind::Simplification,
    },
    Registration {
        names: &["area_computation_cgal"],
        kind: AlgorithmKind::Area,
    },
    Registration {
        names: &["test_cpp"],
        kind: AlgorithmKind::TestPyramid,
    },
];

/// Router met een vaste tabel van algoritmen.
#[derive(Debug, Clone, Copy)]
pub struct NativeRouter {
    id: BackendId,
    table: &'static [Registration],
}

impl NativeRouter {
    #[must_use]
    pub fn new(id: BackendId) -> Self {
        Self {
            id,
            table: REGISTRATIONS,
        }
    }

    fn lookup(&self, function: &str) -> Option<AlgorithmKind> {
        let key = crate::normalize_name(function);
        self.table
            .iter()
            .find(|registration| registration.names.contains(&key.as_str()))
            .map(|registration| registration.kind)
    }
}

impl Backend for NativeRouter {
    fn open_session(&self, mesh: &MeshPayload) -> Result<Box<dyn BackendSession>, BackendError> {
        Ok(Box::new(NativeSession {
            router: *self,
            mesh: mesh.clone(),
            declared: Vec::new(),
            result_infos: String::new(),
        }))
    }

    fn functions(&self) -> Vec<&'static str> {
        self.table
            .iter()
            .flat_map(|registration| registration.names.iter().copied())
            .collect()
    }
}

struct NativeSession {
    router: NativeRouter,
    mesh: MeshPayload,
    declared: Vec<OutputKind>,
    result_infos: String,
}

impl BackendSession for NativeSession {
    fn invoke(&mut self, function: &str, params: &StepParams) -> Result<(), BackendError> {
        let kind = self
            .router
            .lookup(function)
            .ok_or_else(|| BackendError::UnknownFunction {
                backend: self.router.id,
                function: function.to_owned(),
            })?;
        log::debug!("{}: {}", self.router.id, kind.name());

        let output = kind.run(&self.mesh, params)?;
        if let Some(mesh) = output.mesh {
            self.mesh = mesh;
        }
        self.declared = output.declared;
        self.result_infos = output.result_infos;
        Ok(())
    }

    fn current_result(&mut self) -> Result<SessionOutcome, BackendError> {
        Ok(SessionOutcome {
            mesh: self.mesh.clone(),
            declared: self.declared.clone(),
            result_infos: self.result_infos.clone(),
        })
    }
}

pub(crate) fn require_triangles(function: &str, mesh: &MeshPayload) -> Result<(), BackendError> {
    if mesh.faces.is_empty() {
        return Err(BackendError::failed(
            function,
            format!("{function} requires a triangulated mesh with at least one face"),
        ));
    }
    Ok(())
}

pub(crate) fn number_param(
    function: &str,
    params: &StepParams,
    name: &str,
) -> Result<f64, BackendError> {
    params
        .get(name)
        .and_then(BackendValue::as_f64)
        .ok_or_else(|| BackendError::failed(function, format!("missing numeric parameter `{name}`")))
}

pub(crate) fn text_param<'a>(params: &'a StepParams, name: &str) -> Option<&'a str> {
    params.get(name).and_then(BackendValue::as_text)
}
