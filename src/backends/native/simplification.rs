//! Vereenvoudiging door herhaald de kortste randen samen te trekken.
//!
//! Per ronde wordt een set onafhankelijke randen (geen gedeelde vertices)
//! naar hun middelpunt samengetrokken, tot het aantal randen onder
//! `decimation_factor * oorspronkelijk aantal` zakt.

use super::geometry::{Vec3, compact, edge_faces, length, sub};
use super::{NativeAlgorithm, NativeOutput, number_param, require_triangles};
use crate::engine::{OutputKind, StepParams};
use crate::error::BackendError;
use crate::mesh::MeshPayload;

const FUNCTION: &str = "simplification_cgal";

#[derive(Debug, Default, Clone, Copy)]
pub struct Simplification;

impl NativeAlgorithm for Simplification {
    fn run(&self, mesh: &MeshPayload, params: &StepParams) -> Result<NativeOutput, BackendError> {
        require_triangles(FUNCTION, mesh)?;
        let ratio = number_param(FUNCTION, params, "decimation_factor")?;
        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(BackendError::failed(
                FUNCTION,
                format!("decimation_factor must lie in (0, 1], got {ratio}"),
            ));
        }

        let simplified = simplify(mesh, ratio);
        let summary = format!(
            "Simplified mesh from {} to {} faces.",
            mesh.face_count(),
            simplified.face_count()
        );
        log::debug!("{FUNCTION}: {summary}");

        Ok(NativeOutput {
            mesh: Some(simplified),
            declared: vec![OutputKind::ReplaceMesh, OutputKind::Message],
            result_infos: summary,
        })
    }
}

/// Vereenvoudigde kopie van `mesh`; kleuren vervallen.
#[must_use]
pub fn simplify(mesh: &MeshPayload, ratio: f64) -> MeshPayload {
    let mut points: Vec<Vec3> = mesh.vertices.chunks_exact(3).map(|p| [p[0], p[1], p[2]]).collect();
    let mut faces = mesh.faces.clone();

    let initial = edge_faces(&faces).len();
    let target = (ratio * initial as f64).ceil() as usize;

    loop {
        let edges = edge_faces(&faces);
        if edges.len() <= target || faces.is_empty() {
            break;
        }

        let mut candidates: Vec<((u32, u32), f64)> = edges
            .keys()
            .map(|&(a, b)| ((a, b), length(sub(points[a as usize], points[b as usize]))))
            .collect();
        candidates.sort_by(|x, y| x.1.total_cmp(&y.1).then(x.0.cmp(&y.0)));

        // Eén samengetrokken rand kost ongeveer drie randen.
        let budget = (edges.len() - target).div_ceil(3).max(1);
        let mut remap: Vec<u32> = (0..points.len() as u32).collect();
        let mut touched = vec![false; points.len()];
        let mut collapsed = 0;
        for ((a, b), _) in candidates {
            let (ai, bi) = (a as usize, b as usize);
            if touched[ai] || touched[bi] {
                continue;
            }
            let (pa, pb) = (points[ai], points[bi]);
            points[ai] = [(pa[0] + pb[0]) / 2.0, (pa[1] + pb[1]) / 2.0, (pa[2] + pb[2]) / 2.0];
            remap[bi] = a;
            touched[ai] = true;
            touched[bi] = true;
            collapsed += 1;
            if collapsed >= budget {
                break;
            }
        }
        if collapsed == 0 {
            break;
        }

        faces = faces
            .chunks_exact(3)
            .map(|tri| [remap[tri[0] as usize], remap[tri[1] as usize], remap[tri[2] as usize]])
            .filter(|[a, b, c]| a != b && b != c && a != c)
            .flatten()
            .collect();
    }

    let flat: Vec<f64> = points.iter().flatten().copied().collect();
    let (vertices, faces) = compact(&flat, &faces);
    MeshPayload::new(vertices, faces)
}
