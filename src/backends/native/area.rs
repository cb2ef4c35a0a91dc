use super::geometry::surface_area;
use super::{NativeAlgorithm, NativeOutput, require_triangles};
use crate::engine::StepParams;
use crate::error::BackendError;
use crate::mesh::MeshPayload;

#[derive(Debug, Default, Clone, Copy)]
pub struct SurfaceArea;

impl NativeAlgorithm for SurfaceArea {
    fn run(&self, mesh: &MeshPayload, _: &StepParams) -> Result<NativeOutput, BackendError> {
        require_triangles("area_computation_cgal", mesh)?;
        let area = surface_area(mesh);
        Ok(NativeOutput::message(format!("Mesh area: {area:.4} m²")))
    }
}
