//! Kleine driehoeksmesh-hulpfuncties voor de native algoritmen.

use std::collections::{BTreeMap, HashMap};

use crate::mesh::MeshPayload;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

pub(crate) type Vec3 = [f64; 3];

pub(crate) fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub(crate) fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub(crate) fn dot(a: Vec3, b: Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub(crate) fn length(a: Vec3) -> f64 {
    dot(a, a).sqrt()
}

pub(crate) fn normalize(a: Vec3) -> Option<Vec3> {
    let len = length(a);
    (len.is_finite() && len > f64::EPSILON).then(|| [a[0] / len, a[1] / len, a[2] / len])
}

fn corners(mesh: &MeshPayload, tri: [u32; 3]) -> Option<[Vec3; 3]> {
    Some([
        mesh.vertex(tri[0] as usize)?,
        mesh.vertex(tri[1] as usize)?,
        mesh.vertex(tri[2] as usize)?,
    ])
}

/// Oppervlakte van één driehoek; 0 voor ongeldige indices.
pub(crate) fn triangle_area(mesh: &MeshPayload, tri: [u32; 3]) -> f64 {
    corners(mesh, tri).map_or(0.0, |[a, b, c]| 0.5 * length(cross(sub(b, a), sub(c, a))))
}

/// Eenheidsnormaal per driehoek; gedegenereerde driehoeken krijgen `[0, 0, 0]`.
pub(crate) fn face_normals(mesh: &MeshPayload) -> Vec<Vec3> {
    let triangles: Vec<[u32; 3]> = mesh.triangles().collect();
    let normal = |tri: &[u32; 3]| {
        corners(mesh, *tri)
            .and_then(|[a, b, c]| normalize(cross(sub(b, a), sub(c, a))))
            .unwrap_or([0.0; 3])
    };

    #[cfg(feature = "parallel")]
    {
        triangles.par_iter().map(normal).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        triangles.iter().map(normal).collect()
    }
}

/// Totale oppervlakte.
pub(crate) fn surface_area(mesh: &MeshPayload) -> f64 {
    let triangles: Vec<[u32; 3]> = mesh.triangles().collect();

    #[cfg(feature = "parallel")]
    {
        triangles.par_iter().map(|tri| triangle_area(mesh, *tri)).sum()
    }

    #[cfg(not(feature = "parallel"))]
    {
        triangles.iter().map(|tri| triangle_area(mesh, *tri)).sum()
    }
}

fn edge_key(a: u32, b: u32) -> (u32, u32) {
    if a < b { (a, b) } else { (b, a) }
}

/// Ongerichte randen met de driehoeken die eraan grenzen.
pub(crate) fn edge_faces(faces: &[u32]) -> BTreeMap<(u32, u32), Vec<usize>> {
    let mut edges: BTreeMap<(u32, u32), Vec<usize>> = BTreeMap::new();
    for (face, tri) in faces.chunks_exact(3).enumerate() {
        for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
            edges.entry(edge_key(a, b)).or_default().push(face);
        }
    }
    edges
}

/// Buren per driehoek via gedeelde randen.
pub(crate) fn face_neighbours(faces: &[u32]) -> Vec<Vec<usize>> {
    let mut neighbours = vec![Vec::new(); faces.len() / 3];
    for shared in edge_faces(faces).values() {
        for &face in shared {
            for &other in shared {
                if face != other && !neighbours[face].contains(&other) {
                    neighbours[face].push(other);
                }
            }
        }
    }
    neighbours
}

/// Verwijdert ongebruikte vertices en hernummert de faces.
pub(crate) fn compact(vertices: &[f64], faces: &[u32]) -> (Vec<f64>, Vec<u32>) {
    let mut remap: HashMap<u32, u32> = HashMap::new();
    let mut out_vertices = Vec::new();
    let mut out_faces = Vec::with_capacity(faces.len());
    for &index in faces {
        let next = remap.len() as u32;
        let mapped = *remap.entry(index).or_insert_with(|| {
            let start = index as usize * 3;
            out_vertices.extend_from_slice(&vertices[start..start + 3]);
            next
        });
        out_faces.push(mapped);
    }
    (out_vertices, out_faces)
}
