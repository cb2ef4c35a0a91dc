//! Getypeerde resultaten van een algoritme-aanroep.

use std::fmt;

use serde::Serialize;

use super::backend::SessionOutcome;
use crate::error::BackendError;

/// Tag van een resultaat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputKind {
    Message,
    VertexColoration,
    FaceColoration,
    ReplaceMesh,
    AddMesh,
}

impl OutputKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::VertexColoration => "vertex-coloration",
            Self::FaceColoration => "face-coloration",
            Self::ReplaceMesh => "replace-mesh",
            Self::AddMesh => "add-mesh",
        }
    }

    /// Leest een tag zoals routers die teruggeven; `new_mesh` is een oudere
    /// naam voor `replace-mesh`.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match crate::normalize_name(name).replace('_', "-").as_str() {
            "message" => Some(Self::Message),
            "vertex-coloration" => Some(Self::VertexColoration),
            "face-coloration" => Some(Self::FaceColoration),
            "replace-mesh" | "new-mesh" => Some(Self::ReplaceMesh),
            "add-mesh" => Some(Self::AddMesh),
            _ => None,
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Eén effect dat op de mesh toegepast moet worden.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ResultKind {
    Message { text: String },
    VertexColoration { colors: Vec<f32> },
    FaceColoration { colors: Vec<f32> },
    ReplaceMesh { vertices: Vec<f64>, faces: Vec<u32> },
    AddMesh { vertices: Vec<f64>, faces: Vec<u32> },
}

impl ResultKind {
    #[must_use]
    pub fn output_kind(&self) -> OutputKind {
        match self {
            Self::Message { .. } => OutputKind::Message,
            Self::VertexColoration { .. } => OutputKind::VertexColoration,
            Self::FaceColoration { .. } => OutputKind::FaceColoration,
            Self::ReplaceMesh { .. } => OutputKind::ReplaceMesh,
            Self::AddMesh { .. } => OutputKind::AddMesh,
        }
    }
}

/// Geordende lijst van resultaten van één aanroep.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultPayload {
    pub results: Vec<ResultKind>,
}

impl ResultPayload {
    #[must_use]
    pub fn output_kinds(&self) -> Vec<OutputKind> {
        self.results.iter().map(ResultKind::output_kind).collect()
    }

    /// Tekst van het eerste bericht, als er een is.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.results.iter().find_map(|result| match result {
            ResultKind::Message { text } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Zet de sessie-uitkomst om naar resultaten in de volgorde van `kinds`.
    pub fn assemble(kinds: &[OutputKind], outcome: SessionOutcome) -> Result<Self, BackendError> {
        let SessionOutcome {
            mesh, result_infos, ..
        } = outcome;
        mesh.validate()
            .map_err(|err| BackendError::MalformedResult(err.to_string()))?;

        let mut results = Vec::with_capacity(kinds.len());
        for kind in kinds {
            let result = match kind {
                OutputKind::Message => ResultKind::Message {
                    text: result_infos.clone(),
                },
                OutputKind::VertexColoration => {
                    if !mesh.has_vertex_color() {
                        return Err(BackendError::MalformedResult(
                            "vertex-coloration zonder vertexkleuren".to_owned(),
                        ));
                    }
                    ResultKind::VertexColoration {
                        colors: mesh.vertex_color.clone(),
                    }
                }
                OutputKind::FaceColoration => {
                    if !mesh.has_face_color() {
                        return Err(BackendError::MalformedResult(
                            "face-coloration zonder facekleuren".to_owned(),
                        ));
                    }
                    ResultKind::FaceColoration {
                        colors: mesh.face_color.clone(),
                    }
                }
                OutputKind::ReplaceMesh | OutputKind::AddMesh => {
                    if mesh.vertices.is_empty() {
                        return Err(BackendError::MalformedResult(format!(
                            "{kind} zonder vertices"
                        )));
                    }
                    let vertices = mesh.vertices.clone();
                    let faces = mesh.faces.clone();
                    if *kind == OutputKind::ReplaceMesh {
                        ResultKind::ReplaceMesh { vertices, faces }
                    } else {
                        ResultKind::AddMesh { vertices, faces }
                    }
                }
            };
            results.push(result);
        }
        Ok(Self { results })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::MeshPayload;

    fn outcome(mesh: MeshPayload) -> SessionOutcome {
        SessionOutcome {
            mesh,
            declared: Vec::new(),
            result_infos: "klaar".to_owned(),
        }
    }

    #[test]
    fn legacy_tag_names_parse() {
        assert_eq!(OutputKind::parse("new_mesh"), Some(OutputKind::ReplaceMesh));
        assert_eq!(OutputKind::parse("face_coloration"), Some(OutputKind::FaceColoration));
        assert_eq!(OutputKind::parse("sculpt"), None);
    }

    #[test]
    fn assemble_keeps_requested_order() {
        let mut mesh = MeshPayload::new(vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0], vec![0, 1, 2]);
        mesh.face_color = vec![1.0, 0.0, 0.0, 1.0];
        let payload = ResultPayload::assemble(
            &[OutputKind::ReplaceMesh, OutputKind::FaceColoration, OutputKind::Message],
            outcome(mesh),
        )
        .expect("geldig resultaat");
        assert_eq!(
            payload.output_kinds(),
            vec![OutputKind::ReplaceMesh, OutputKind::FaceColoration, OutputKind::Message]
        );
        assert_eq!(payload.message(), Some("klaar"));
    }

    #[test]
    fn coloration_without_channel_is_malformed() {
        let mesh = MeshPayload::new(vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0], vec![0, 1, 2]);
        assert!(matches!(
            ResultPayload::assemble(&[OutputKind::VertexColoration], outcome(mesh)),
            Err(BackendError::MalformedResult(_))
        ));
    }
}
