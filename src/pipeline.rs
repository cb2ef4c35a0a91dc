//! Voorbereiding van mesh-data voordat een algoritme aangeroepen wordt.

use std::fmt;

use serde::Serialize;

use crate::error::{EngineError, EngineResult};
use crate::mesh::weld::DEFAULT_WELD_EPSILON;
use crate::mesh::{MeshPayload, MeshProvider};

/// Eén stap van de invoerpipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputStep {
    /// Vertices samenvoegen en alle faces trianguleren, op de live mesh.
    Triangulate,
    ExtractVertexCoordinates,
    ExtractFaceIndices,
    ExtractVertexColor,
    ExtractFaceColor,
    /// Vertexkleuren als die er zijn, anders facekleuren.
    ColorData,
}

struct Registration {
    names: &'static [&'static str],
    step: InputStep,
}

const REGISTRATIONS: &[Registration] = &[
    Registration {
        names: &["triangulate", "triangulation"],
        step: InputStep::Triangulate,
    },
    Registration {
        names: &[
            "extract-vertex-coordinates",
            "vertex_coordinates",
            "extract-vertices",
        ],
        step: InputStep::ExtractVertexCoordinates,
    },
    Registration {
        names: &["extract-face-indices", "face_indices", "extract-faces"],
        step: InputStep::ExtractFaceIndices,
    },
    Registration {
        names: &["extract-vertex-color", "vertex_color"],
        step: InputStep::ExtractVertexColor,
    },
    Registration {
        names: &["extract-face-color", "face_color"],
        step: InputStep::ExtractFaceColor,
    },
    Registration {
        names: &["color_data", "color-data"],
        step: InputStep::ColorData,
    },
];

impl InputStep {
    /// Zoekt een stap op een van zijn namen in de catalogus.
    pub fn parse(name: &str) -> EngineResult<Self> {
        let key = crate::normalize_name(name);
        REGISTRATIONS
            .iter()
            .find(|registration| registration.names.contains(&key.as_str()))
            .map(|registration| registration.step)
            .ok_or_else(|| EngineError::configuration(format!("onbekende invoerstap `{name}`")))
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Triangulate => "triangulate",
            Self::ExtractVertexCoordinates => "extract-vertex-coordinates",
            Self::ExtractFaceIndices => "extract-face-indices",
            Self::ExtractVertexColor => "extract-vertex-color",
            Self::ExtractFaceColor => "extract-face-color",
            Self::ColorData => "color-data",
        }
    }

    fn apply(self, mesh: &mut dyn MeshProvider, payload: &mut MeshPayload) -> EngineResult<()> {
        match self {
            Self::Triangulate => mesh.triangulate_in_place(DEFAULT_WELD_EPSILON)?,
            Self::ExtractVertexCoordinates => payload.vertices = mesh.vertices(),
            Self::ExtractFaceIndices => payload.faces = mesh.faces()?,
            Self::ExtractVertexColor => payload.vertex_color = mesh.vertex_colors().unwrap_or_default(),
            Self::ExtractFaceColor => payload.face_color = mesh.face_colors().unwrap_or_default(),
            Self::ColorData => {
                if let Some(colors) = mesh.vertex_colors() {
                    payload.vertex_color = colors;
                } else if let Some(colors) = mesh.face_colors() {
                    payload.face_color = colors;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for InputStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Voert de stappen in volgorde uit en levert de verzamelde buffers.
pub fn run_input_pipeline(
    steps: &[InputStep],
    mesh: &mut dyn MeshProvider,
) -> EngineResult<MeshPayload> {
    let mut payload = MeshPayload::default();
    for step in steps {
        log::debug!("invoerstap {step}");
        step.apply(mesh, &mut payload)?;
    }

    // Indexgrenzen kunnen alleen gecontroleerd worden als de vertices mee
    // geëxtraheerd zijn.
    if payload.vertices.is_empty() && !payload.faces.is_empty() {
        return Err(EngineError::validation(
            "faces geëxtraheerd zonder vertexcoördinaten",
        ));
    }
    payload.validate()?;
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{EditableMesh, MeshSink, Scene};

    fn two_triangles() -> Scene {
        Scene::new(
            EditableMesh::from_buffers(
                "square",
                &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0],
                &[0, 1, 2, 0, 2, 3],
            )
            .expect("geldige mesh"),
        )
    }

    #[test]
    fn step_aliases_resolve() {
        assert_eq!(InputStep::parse("triangulation"), Ok(InputStep::Triangulate));
        assert_eq!(
            InputStep::parse("Extract-Vertices"),
            Ok(InputStep::ExtractVertexCoordinates)
        );
        assert_eq!(InputStep::parse("face_indices"), Ok(InputStep::ExtractFaceIndices));
        assert!(matches!(
            InputStep::parse("smooth"),
            Err(EngineError::Configuration(_))
        ));
    }

    #[test]
    fn extraction_fills_only_requested_buffers() {
        let mut scene = two_triangles();
        let payload = run_input_pipeline(
            &[InputStep::ExtractVertexCoordinates, InputStep::ExtractFaceIndices],
            &mut scene,
        )
        .expect("pipeline");
        assert_eq!(payload.vertices.len(), 12);
        assert_eq!(payload.faces.len(), 6);
        assert!(payload.vertex_color.is_empty());
        assert!(payload.face_color.is_empty());
    }

    #[test]
    fn color_data_prefers_vertex_colors() {
        let mut scene = two_triangles();
        scene.set_face_colors(&[0.5; 8]).expect("facekleuren");
        let payload = run_input_pipeline(&[InputStep::ColorData], &mut scene).expect("pipeline");
        assert_eq!(payload.face_color.len(), 8);

        scene.set_vertex_colors(&[1.0; 16]).expect("vertexkleuren");
        let payload = run_input_pipeline(&[InputStep::ColorData], &mut scene).expect("pipeline");
        assert_eq!(payload.vertex_color.len(), 16);
        assert!(payload.face_color.is_empty());
    }

    #[test]
    fn faces_without_vertices_fail_validation() {
        let mut scene = two_triangles();
        assert!(matches!(
            run_input_pipeline(&[InputStep::ExtractFaceIndices], &mut scene),
            Err(EngineError::Validation(_))
        ));
    }
}
