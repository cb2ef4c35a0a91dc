//! Afleiden van uitvoertypen uit de aangeroepen functiecombinatie.
//!
//! Filterbackends geven niet zelf op wat hun resultaat betekent. De set van
//! aangeroepen functies bepaalt dat via een vaste tabel.

use std::collections::BTreeSet;

use super::result::OutputKind;
use crate::error::{EngineError, EngineResult};
use crate::mesh::MeshPayload;

/// Hoe kleurkanalen van de resulterende mesh meetellen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColorRule {
    Fixed,
    /// Voeg vertex- of facecoloring toe als de mesh dat kanaal draagt;
    /// vertexkleuren hebben voorrang en sluiten facekleuren uit.
    AppendPresent,
}

struct Classification {
    functions: &'static [&'static str],
    kinds: &'static [OutputKind],
    colors: ColorRule,
}

const CLASSIFICATIONS: &[Classification] = &[
    Classification {
        functions: &["compute-curvature-color"],
        kinds: &[OutputKind::VertexColoration],
        colors: ColorRule::Fixed,
    },
    Classification {
        functions: &["isotropic-remesh", "fractal-terrain"],
        kinds: &[OutputKind::ReplaceMesh],
        colors: ColorRule::Fixed,
    },
    Classification {
        functions: &["isotropic-remesh"],
        kinds: &[OutputKind::ReplaceMesh],
        colors: ColorRule::Fixed,
    },
    Classification {
        functions: &[
            "simplify-point-cloud",
            "compute-normals",
            "ball-pivoting-reconstruction",
        ],
        kinds: &[OutputKind::ReplaceMesh],
        colors: ColorRule::AppendPresent,
    },
];

/// Bibliotheeknamen → canonieke functienamen uit de tabel.
const ALIASES: &[(&str, &str)] = &[
    ("compute-curvature-and-color-apss-per-vertex", "compute-curvature-color"),
    ("colorize-curvature-apss", "compute-curvature-color"),
    ("meshing-isotropic-explicit-remeshing", "isotropic-remesh"),
    ("generate-simplified-point-cloud", "simplify-point-cloud"),
    ("compute-normal-for-point-clouds", "compute-normals"),
    (
        "generate-surface-reconstruction-ball-pivoting",
        "ball-pivoting-reconstruction",
    ),
];

/// Canonieke vorm: kleine letters, `_` wordt `-`, aliassen opgelost.
#[must_use]
pub fn canonical_function_name(name: &str) -> String {
    let key = crate::normalize_name(name).replace('_', "-");
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map_or(key, |(_, canonical)| (*canonical).to_owned())
}

/// Bepaalt de uitvoertypen voor een combinatie van functies en de mesh die
/// de sessie opleverde.
pub fn classify(functions: &[String], mesh: &MeshPayload) -> EngineResult<Vec<OutputKind>> {
    let invoked: BTreeSet<String> = functions
        .iter()
        .map(|name| canonical_function_name(name))
        .collect();

    let entry = CLASSIFICATIONS
        .iter()
        .find(|entry| {
            entry.functions.len() == invoked.len()
                && entry.functions.iter().all(|name| invoked.contains(*name))
        })
        .ok_or_else(|| EngineError::UnsupportedOperation(functions.to_vec()))?;

    let mut kinds = entry.kinds.to_vec();
    if entry.colors == ColorRule::AppendPresent {
        if mesh.has_vertex_color() {
            kinds.push(OutputKind::VertexColoration);
        } else if mesh.has_face_color() {
            kinds.push(OutputKind::FaceColoration);
        }
    }
    Ok(kinds)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|name| (*name).to_owned()).collect()
    }

    #[test]
    fn curvature_maps_to_vertex_coloration() {
        let mut mesh = MeshPayload::default();
        mesh.vertex_color = vec![1.0; 4];
        assert_eq!(
            classify(&names(&["compute-curvature-color"]), &mesh),
            Ok(vec![OutputKind::VertexColoration])
        );
        assert_eq!(
            classify(&names(&["compute_curvature_and_color_apss_per_vertex"]), &mesh),
            Ok(vec![OutputKind::VertexColoration])
        );
    }

    #[test]
    fn combination_is_order_independent() {
        let mesh = MeshPayload::default();
        assert_eq!(
            classify(&names(&["fractal-terrain", "isotropic-remesh"]), &mesh),
            Ok(vec![OutputKind::ReplaceMesh])
        );
    }

    #[test]
    fn reconstruction_appends_vertex_color_before_face_color() {
        let chain = names(&[
            "generate_simplified_point_cloud",
            "compute_normal_for_point_clouds",
            "generate_surface_reconstruction_ball_pivoting",
        ]);
        let mut mesh = MeshPayload::default();
        assert_eq!(classify(&chain, &mesh), Ok(vec![OutputKind::ReplaceMesh]));

        mesh.face_color = vec![1.0; 4];
        assert_eq!(
            classify(&chain, &mesh),
            Ok(vec![OutputKind::ReplaceMesh, OutputKind::FaceColoration])
        );

        mesh.vertex_color = vec![1.0; 4];
        assert_eq!(
            classify(&chain, &mesh),
            Ok(vec![OutputKind::ReplaceMesh, OutputKind::VertexColoration])
        );
    }

    #[test]
    fn unknown_combination_is_unsupported() {
        let err = classify(&names(&["compute-curvature-color", "isotropic-remesh"]), &MeshPayload::default())
            .expect_err("geen tabelregel");
        assert!(matches!(err, EngineError::UnsupportedOperation(_)));
    }
}
