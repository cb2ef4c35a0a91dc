//! Segmentatie van een driehoeksmesh op basis van face-normalen.
//!
//! Faces worden met k-means op hun normaal in `clusters` groepen verdeeld.
//! Daarna neemt elke face in `smoothness * 10` rondes het label over dat de
//! meerderheid van zijn buren draagt, zodat versnipperde segmenten opgaan in
//! hun omgeving.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::geometry::{Vec3, dot, face_neighbours, face_normals, normalize};
use super::{NativeAlgorithm, NativeOutput, number_param, require_triangles, text_param};
use crate::engine::{OutputKind, StepParams};
use crate::error::BackendError;
use crate::mesh::MeshPayload;

const FUNCTION: &str = "segmentation_cgal";
/// Keuze van `output_option` die segmentkleuren oplevert.
pub const SEGMENTS_COLOR: &str = "SEGMENTS_COLOR";
const MAX_ITERATIONS: usize = 32;
const MAX_SMOOTHING_ROUNDS: f64 = 10.0;
const COLOR_SEED: u64 = 0x5e6_c0105;

#[derive(Debug, Default, Clone, Copy)]
pub struct Segmentation;

impl NativeAlgorithm for Segmentation {
    fn run(&self, mesh: &MeshPayload, params: &StepParams) -> Result<NativeOutput, BackendError> {
        require_triangles(FUNCTION, mesh)?;
        let clusters = number_param(FUNCTION, params, "clusters")?;
        let smoothness = number_param(FUNCTION, params, "smoothness")?;
        if clusters < 1.0 {
            return Err(BackendError::failed(
                FUNCTION,
                format!("clusters must be at least 1, got {clusters}"),
            ));
        }
        let clusters = clusters as usize;

        let labels = segment(mesh, clusters, smoothness.clamp(0.0, 1.0));
        let segments = labels.iter().copied().max().map_or(0, |max| max + 1);
        log::debug!("{FUNCTION}: {segments} segmenten voor {} faces", labels.len());

        if text_param(params, "output_option") == Some(SEGMENTS_COLOR) {
            let mut colored = mesh.clone();
            colored.face_color = segment_colors(&labels, segments);
            return Ok(NativeOutput {
                mesh: Some(colored),
                declared: vec![OutputKind::FaceColoration],
                result_infos: String::new(),
            });
        }

        Ok(NativeOutput::message(format!(
            "Parameters used:\n- number of clusters: {clusters}\n- smoothness: {smoothness}\n\n\
             Number of segments: {segments}."
        )))
    }
}

/// Segmentlabel per face, genummerd in volgorde van eerste voorkomen.
pub fn segment(mesh: &MeshPayload, clusters: usize, smoothness: f64) -> Vec<usize> {
    let normals = face_normals(mesh);
    let mut labels = kmeans(&normals, clusters.min(normals.len()).max(1));

    let rounds = (smoothness * MAX_SMOOTHING_ROUNDS).round() as usize;
    if rounds > 0 {
        let neighbours = face_neighbours(&mesh.faces);
        for _ in 0..rounds {
            let next = smooth_labels(&labels, &neighbours);
            if next == labels {
                break;
            }
            labels = next;
        }
    }

    relabel(&labels)
}

fn kmeans(normals: &[Vec3], k: usize) -> Vec<usize> {
    if normals.is_empty() {
        return Vec::new();
    }

    // Deterministische start: telkens de normaal die het verst van alle
    // gekozen centra ligt.
    let mut centers: Vec<Vec3> = vec![normals[0]];
    while centers.len() < k {
        let farthest = normals
            .iter()
            .map(|normal| {
                centers
                    .iter()
                    .map(|center| 1.0 - dot(*normal, *center))
                    .fold(f64::INFINITY, f64::min)
            })
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(&b.1));
        match farthest {
            Some((index, distance)) if distance > 1e-9 => centers.push(normals[index]),
            _ => break,
        }
    }

    let mut labels = vec![0usize; normals.len()];
    for _ in 0..MAX_ITERATIONS {
        let next: Vec<usize> = normals
            .iter()
            .map(|normal| nearest(&centers, *normal))
            .collect();
        let converged = next == labels;
        labels = next;

        for (center_index, center) in centers.iter_mut().enumerate() {
            let mut sum = [0.0; 3];
            for (normal, _) in normals
                .iter()
                .zip(&labels)
                .filter(|(_, label)| **label == center_index)
            {
                sum = [sum[0] + normal[0], sum[1] + normal[1], sum[2] + normal[2]];
            }
            if let Some(mean) = normalize(sum) {
                *center = mean;
            }
        }

        if converged {
            break;
        }
    }
    labels
}

fn nearest(centers: &[Vec3], normal: Vec3) -> usize {
    centers
        .iter()
        .enumerate()
        .max_by(|a, b| dot(*a.1, normal).total_cmp(&dot(*b.1, normal)))
        .map_or(0, |(index, _)| index)
}

fn smooth_labels(labels: &[usize], neighbours: &[Vec<usize>]) -> Vec<usize> {
    labels
        .iter()
        .enumerate()
        .map(|(face, &own)| {
            let around = &neighbours[face];
            let own_votes = 1 + around.iter().filter(|n| labels[**n] == own).count();
            around
                .iter()
                .map(|n| labels[*n])
                .filter(|label| *label != own)
                .map(|label| {
                    (
                        label,
                        around.iter().filter(|n| labels[**n] == label).count(),
                    )
                })
                .filter(|(_, votes)| *votes > own_votes)
                .max_by_key(|(label, votes)| (*votes, std::cmp::Reverse(*label)))
                .map_or(own, |(label, _)| label)
        })
        .collect()
}

fn relabel(labels: &[usize]) -> Vec<usize> {
    let mut mapping: Vec<(usize, usize)> = Vec::new();
    labels
        .iter()
        .map(|label| {
            if let Some((_, mapped)) = mapping.iter().find(|(from, _)| from == label) {
                *mapped
            } else {
                let mapped = mapping.len();
                mapping.push((*label, mapped));
                mapped
            }
        })
        .collect()
}

/// Willekeurige maar reproduceerbare RGBA-kleur per segment, uitgeschreven per face.
fn segment_colors(labels: &[usize], segments: usize) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(COLOR_SEED ^ segments as u64);
    let palette: Vec<[f32; 3]> = (0..segments)
        .map(|_| [rng.random(), rng.random(), rng.random()])
        .collect();
    labels
        .iter()
        .flat_map(|label| {
            let [r, g, b] = palette[*label];
            [r, g, b, 1.0]
        })
        .collect()
}
