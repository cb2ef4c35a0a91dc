//! Mesh-data die tussen host, pipeline en backend uitgewisseld wordt.

use serde::Serialize;

use crate::error::{EngineError, EngineResult};

pub mod scene;
pub mod weld;

pub use scene::{ColorDomain, EditableMesh, Scene};

/// Platte buffers van één mesh: `xyz` per vertex, drie indices per face en
/// optionele RGBA-kleuren.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MeshPayload {
    pub vertices: Vec<f64>,
    pub faces: Vec<u32>,
    pub vertex_color: Vec<f32>,
    pub face_color: Vec<f32>,
}

impl MeshPayload {
    #[must_use]
    pub fn new(vertices: Vec<f64>, faces: Vec<u32>) -> Self {
        Self {
            vertices,
            faces,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len() / 3
    }

    #[must_use]
    pub fn has_vertex_color(&self) -> bool {
        !self.vertex_color.is_empty()
    }

    #[must_use]
    pub fn has_face_color(&self) -> bool {
        !self.face_color.is_empty()
    }

    /// Vertex `index` als punt.
    #[must_use]
    pub fn vertex(&self, index: usize) -> Option<[f64; 3]> {
        let start = index.checked_mul(3)?;
        let slice = self.vertices.get(start..start + 3)?;
        Some([slice[0], slice[1], slice[2]])
    }

    /// Itereert over de driehoeken als index-triples.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.faces.chunks_exact(3).map(|tri| [tri[0], tri[1], tri[2]])
    }

    /// Controleert lengtes, eindigheid en indexgrenzen.
    pub fn validate(&self) -> EngineResult<()> {
        check_geometry(&self.vertices, &self.faces)?;
        let count = self.vertex_count();
        // zonder geometrie valt er geen aantal te vergelijken
        let vertices = (!self.vertices.is_empty()).then_some(count);
        let faces = (!self.faces.is_empty()).then(|| self.face_count());
        check_colors("vertexkleuren", &self.vertex_color, vertices)?;
        check_colors("facekleuren", &self.face_color, faces)?;
        Ok(())
    }
}

/// Controleert platte geometriebuffers: lengtes, eindige coördinaten en
/// face-indices binnen het aantal vertices.
pub fn check_geometry(vertices: &[f64], faces: &[u32]) -> EngineResult<()> {
    if vertices.len() % 3 != 0 {
        return Err(EngineError::validation(format!(
            "vertexbuffer heeft lengte {} (geen veelvoud van 3)",
            vertices.len()
        )));
    }
    if faces.len() % 3 != 0 {
        return Err(EngineError::validation(format!(
            "facebuffer heeft lengte {} (geen veelvoud van 3)",
            faces.len()
        )));
    }
    if let Some(position) = vertices.iter().position(|c| !c.is_finite()) {
        return Err(EngineError::validation(format!(
            "vertex {} heeft een niet-eindige coördinaat",
            position / 3
        )));
    }
    let count = vertices.len() / 3;
    if let Some(index) = faces.iter().find(|index| **index as usize >= count) {
        return Err(EngineError::validation(format!(
            "face-index {index} verwijst buiten {count} vertices"
        )));
    }
    Ok(())
}

fn check_colors(label: &str, colors: &[f32], elements: Option<usize>) -> EngineResult<()> {
    if colors.is_empty() {
        return Ok(());
    }
    if colors.len() % 4 != 0 {
        return Err(EngineError::validation(format!(
            "{label} hebben lengte {} (geen veelvoud van 4)",
            colors.len()
        )));
    }
    if let Some(elements) = elements.filter(|elements| colors.len() / 4 != *elements) {
        return Err(EngineError::validation(format!(
            "{} {label} voor {elements} elementen",
            colors.len() / 4
        )));
    }
    Ok(())
}

/// Bron van mesh-data aan de hostkant.
pub trait MeshProvider {
    fn vertices(&self) -> Vec<f64>;
    /// Driehoeksindices; faalt als de mesh nog polygonen bevat.
    fn faces(&self) -> EngineResult<Vec<u32>>;
    fn vertex_colors(&self) -> Option<Vec<f32>>;
    fn face_colors(&self) -> Option<Vec<f32>>;
    /// Voegt vertices samen die dichter dan `epsilon` bij elkaar liggen en
    /// trianguleert daarna alle faces, op de live mesh.
    fn triangulate_in_place(&mut self, epsilon: f64) -> EngineResult<()>;
}

/// Ontvanger van de effecten van een algoritme.
pub trait MeshSink {
    /// Aantal vertices en faces van de mesh waar kleuren op landen.
    fn element_counts(&self) -> (usize, usize);
    fn replace_mesh(&mut self, vertices: &[f64], faces: &[u32]) -> EngineResult<()>;
    fn add_mesh(&mut self, vertices: &[f64], faces: &[u32]) -> EngineResult<()>;
    fn set_vertex_colors(&mut self, colors: &[f32]) -> EngineResult<()>;
    fn set_face_colors(&mut self, colors: &[f32]) -> EngineResult<()>;
    fn display_message(&mut self, text: &str);
    /// Verwijdert bestaande kleurlagen voordat nieuwe kleuren gezet worden.
    fn clear_color_layers(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_out_of_range_index() {
        let payload = MeshPayload::new(vec![0.0; 9], vec![0, 1, 3]);
        assert!(matches!(
            payload.validate(),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn validate_checks_color_counts() {
        let mut payload = MeshPayload::new(vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0], vec![0, 1, 2]);
        payload.face_color = vec![1.0, 0.0, 0.0, 1.0];
        assert!(payload.validate().is_ok());
        payload.vertex_color = vec![1.0; 8];
        assert!(payload.validate().is_err());
    }

    #[test]
    fn vertex_accessor_reads_triples() {
        let payload = MeshPayload::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], Vec::new());
        assert_eq!(payload.vertex(1), Some([4.0, 5.0, 6.0]));
        assert_eq!(payload.vertex(2), None);
    }
}
