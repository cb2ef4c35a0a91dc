//! Eenvoudige in-memory host: een actieve polygonmesh met kleurlagen, extra
//! toegevoegde meshes en een statusbericht.

use serde::Serialize;

use super::weld::{cull_degenerate_triangles, triangulate_polygons, weld_vertices};
use super::{MeshPayload, MeshProvider, MeshSink};
use crate::error::{EngineError, EngineResult};

/// Domein waarop een kleurlaag gedefinieerd is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorDomain {
    Vertex,
    Face,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorLayer {
    pub name: String,
    pub domain: ColorDomain,
    pub colors: Vec<[f32; 4]>,
}

/// Polygonmesh met optionele kleurlagen. De laatst toegevoegde laag per
/// domein is de actieve.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EditableMesh {
    pub name: String,
    pub vertices: Vec<[f64; 3]>,
    pub faces: Vec<Vec<u32>>,
    pub color_layers: Vec<ColorLayer>,
}

impl EditableMesh {
    #[must_use]
    pub fn new(name: impl Into<String>, vertices: Vec<[f64; 3]>, faces: Vec<Vec<u32>>) -> Self {
        Self {
            name: name.into(),
            vertices,
            faces,
            color_layers: Vec::new(),
        }
    }

    /// Bouwt een driehoeksmesh uit platte buffers.
    pub fn from_buffers(name: impl Into<String>, vertices: &[f64], faces: &[u32]) -> EngineResult<Self> {
        let payload = MeshPayload::new(vertices.to_vec(), faces.to_vec());
        payload.validate()?;
        Ok(Self::new(
            name,
            vertices
                .chunks_exact(3)
                .map(|p| [p[0], p[1], p[2]])
                .collect(),
            faces.chunks_exact(3).map(<[u32]>::to_vec).collect(),
        ))
    }

    #[must_use]
    pub fn is_triangulated(&self) -> bool {
        self.faces.iter().all(|face| face.len() == 3)
    }

    #[must_use]
    pub fn active_layer(&self, domain: ColorDomain) -> Option<&ColorLayer> {
        self.color_layers.iter().rev().find(|layer| layer.domain == domain)
    }

    /// Platte kopie van de geometrie (alleen geldig als de mesh
    /// getrianguleerd is).
    pub fn to_payload(&self) -> EngineResult<MeshPayload> {
        Ok(MeshPayload {
            vertices: self.vertices(),
            faces: self.faces()?,
            vertex_color: self.vertex_colors().unwrap_or_default(),
            face_color: self.face_colors().unwrap_or_default(),
        })
    }

    fn push_layer(&mut self, domain: ColorDomain, colors: &[f32]) -> EngineResult<()> {
        let expected = match domain {
            ColorDomain::Vertex => self.vertices.len(),
            ColorDomain::Face => self.faces.len(),
        };
        if colors.len() % 4 != 0 || colors.len() / 4 != expected {
            return Err(EngineError::validation(format!(
                "{} kleurwaarden passen niet op {expected} elementen van `{}`",
                colors.len(),
                self.name
            )));
        }
        let prefix = match domain {
            ColorDomain::Vertex => "Vertex_Col",
            ColorDomain::Face => "Face_Col",
        };
        let count = self
            .color_layers
            .iter()
            .filter(|layer| layer.domain == domain)
            .count();
        let name = if count == 0 {
            prefix.to_owned()
        } else {
            format!("{prefix}.{count:03}")
        };
        self.color_layers.push(ColorLayer {
            name,
            domain,
            colors: colors
                .chunks_exact(4)
                .map(|c| [c[0], c[1], c[2], c[3]])
                .collect(),
        });
        Ok(())
    }
}

fn flatten_layer(layer: &ColorLayer) -> Vec<f32> {
    layer.colors.iter().flat_map(|c| c.iter().copied()).collect()
}

impl MeshProvider for EditableMesh {
    fn vertices(&self) -> Vec<f64> {
        self.vertices.iter().flat_map(|p| p.iter().copied()).collect()
    }

    fn faces(&self) -> EngineResult<Vec<u32>> {
        if !self.is_triangulated() {
            return Err(EngineError::validation(format!(
                "mesh `{}` bevat faces die geen driehoek zijn; trianguleer eerst",
                self.name
            )));
        }
        Ok(self.faces.iter().flatten().copied().collect())
    }

    fn vertex_colors(&self) -> Option<Vec<f32>> {
        self.active_layer(ColorDomain::Vertex).map(flatten_layer)
    }

    fn face_colors(&self) -> Option<Vec<f32>> {
        self.active_layer(ColorDomain::Face).map(flatten_layer)
    }

    fn triangulate_in_place(&mut self, epsilon: f64) -> EngineResult<()> {
        let welded = weld_vertices(&self.vertices, epsilon);
        let polygons: Vec<Vec<u32>> = self
            .faces
            .iter()
            .map(|face| {
                face.iter()
                    .map(|index| {
                        welded.remap.get(*index as usize).copied().ok_or_else(|| {
                            EngineError::validation(format!(
                                "face-index {index} van `{}` bestaat niet",
                                self.name
                            ))
                        })
                    })
                    .collect::<EngineResult<Vec<u32>>>()
            })
            .collect::<EngineResult<_>>()?;

        let (triangles, origins) = triangulate_polygons(&welded.points, &polygons);
        let (triangles, origins, culled) =
            cull_degenerate_triangles(&welded.points, &triangles, &origins, epsilon);

        for layer in &mut self.color_layers {
            layer.colors = match layer.domain {
                ColorDomain::Vertex => welded
                    .sources
                    .iter()
                    .map(|source| layer.colors.get(*source).copied().unwrap_or([1.0; 4]))
                    .collect(),
                ColorDomain::Face => origins
                    .iter()
                    .map(|origin| layer.colors.get(*origin).copied().unwrap_or([1.0; 4]))
                    .collect(),
            };
        }

        log::debug!(
            "`{}` getrianguleerd: {} vertices samengevoegd, {} driehoeken, {} verwijderd",
            self.name,
            welded.merged(),
            origins.len(),
            culled
        );

        self.vertices = welded.points;
        self.faces = triangles.chunks_exact(3).map(<[u32]>::to_vec).collect();
        Ok(())
    }
}

/// Actieve mesh plus wat een algoritme aan de scène toevoegt.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Scene {
    pub active: EditableMesh,
    pub added: Vec<EditableMesh>,
    pub message: String,
}

impl Scene {
    #[must_use]
    pub fn new(active: EditableMesh) -> Self {
        Self {
            active,
            added: Vec::new(),
            message: String::new(),
        }
    }
}

impl MeshProvider for Scene {
    fn vertices(&self) -> Vec<f64> {
        self.active.vertices()
    }

    fn faces(&self) -> EngineResult<Vec<u32>> {
        self.active.faces()
    }

    fn vertex_colors(&self) -> Option<Vec<f32>> {
        self.active.vertex_colors()
    }

    fn face_colors(&self) -> Option<Vec<f32>> {
        self.active.face_colors()
    }

    fn triangulate_in_place(&mut self, epsilon: f64) -> EngineResult<()> {
        self.active.triangulate_in_place(epsilon)
    }
}

impl MeshSink for Scene {
    fn element_counts(&self) -> (usize, usize) {
        (self.active.vertices.len(), self.active.faces.len())
    }

    fn replace_mesh(&mut self, vertices: &[f64], faces: &[u32]) -> EngineResult<()> {
        let name = self.active.name.clone();
        self.active = EditableMesh::from_buffers(name, vertices, faces)?;
        Ok(())
    }

    fn add_mesh(&mut self, vertices: &[f64], faces: &[u32]) -> EngineResult<()> {
        let name = format!("{}_result_{}", self.active.name, self.added.len() + 1);
        self.added.push(EditableMesh::from_buffers(name, vertices, faces)?);
        Ok(())
    }

    fn set_vertex_colors(&mut self, colors: &[f32]) -> EngineResult<()> {
        self.active.push_layer(ColorDomain::Vertex, colors)
    }

    fn set_face_colors(&mut self, colors: &[f32]) -> EngineResult<()> {
        self.active.push_layer(ColorDomain::Face, colors)
    }

    fn display_message(&mut self, text: &str) {
        self.message = text.to_owned();
    }

    fn clear_color_layers(&mut self) {
        self.active.color_layers.clear();
    }
}
