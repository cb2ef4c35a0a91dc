//! Toepassen van resultaten op de mesh van de host.

use crate::engine::{ExecutionRequest, ResultKind, ResultPayload};
use crate::error::{EngineError, EngineResult};
use crate::mesh::{MeshSink, check_geometry};

/// Optie die bestaande kleurlagen laat wissen voor nieuwe kleuren gezet worden.
pub const DELETE_MATERIALS_OPTION: &str = "delete_materials";

/// Opties van de orkestratie die de interpretatie beïnvloeden.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InterpretOptions {
    pub delete_materials: bool,
}

impl InterpretOptions {
    #[must_use]
    pub fn from_request(request: &ExecutionRequest) -> Self {
        Self {
            delete_materials: request.option_flag(DELETE_MATERIALS_OPTION),
        }
    }
}

/// Past elk resultaat in volgorde toe op `sink`. Alle resultaten worden eerst
/// gecontroleerd; is er één ongeldig, dan blijft `sink` onaangeroerd.
pub fn apply_results(
    payload: &ResultPayload,
    options: InterpretOptions,
    sink: &mut dyn MeshSink,
) -> EngineResult<()> {
    check_results(payload, sink.element_counts())?;

    let mut cleared = false;
    for result in &payload.results {
        log::debug!("resultaat toepassen: {}", result.output_kind());
        match result {
            ResultKind::Message { text } => sink.display_message(text),
            ResultKind::VertexColoration { colors } => {
                clear_once(options, &mut cleared, sink);
                sink.set_vertex_colors(colors)?;
            }
            ResultKind::FaceColoration { colors } => {
                clear_once(options, &mut cleared, sink);
                sink.set_face_colors(colors)?;
            }
            ResultKind::ReplaceMesh { vertices, faces } => sink.replace_mesh(vertices, faces)?,
            ResultKind::AddMesh { vertices, faces } => sink.add_mesh(vertices, faces)?,
        }
    }
    Ok(())
}

// Loopt de resultaten na met de aantallen zoals de mesh ze na elke stap heeft.
fn check_results(payload: &ResultPayload, counts: (usize, usize)) -> EngineResult<()> {
    let (mut vertex_count, mut face_count) = counts;
    for result in &payload.results {
        match result {
            ResultKind::Message { .. } => {}
            ResultKind::VertexColoration { colors } => check_layer("vertex", colors, vertex_count)?,
            ResultKind::FaceColoration { colors } => check_layer("face", colors, face_count)?,
            ResultKind::ReplaceMesh { vertices, faces } => {
                check_geometry(vertices, faces)?;
                vertex_count = vertices.len() / 3;
                face_count = faces.len() / 3;
            }
            ResultKind::AddMesh { vertices, faces } => check_geometry(vertices, faces)?,
        }
    }
    Ok(())
}

fn check_layer(domain: &str, colors: &[f32], elements: usize) -> EngineResult<()> {
    if colors.len() % 4 != 0 || colors.len() / 4 != elements {
        return Err(EngineError::validation(format!(
            "{} {domain}kleurwaarden passen niet op {elements} elementen",
            colors.len()
        )));
    }
    Ok(())
}

fn clear_once(options: InterpretOptions, cleared: &mut bool, sink: &mut dyn MeshSink) {
    if options.delete_materials && !*cleared {
        sink.clear_color_layers();
        *cleared = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{EditableMesh, MeshProvider, Scene};

    fn scene() -> Scene {
        Scene::new(
            EditableMesh::from_buffers("tri", &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0], &[0, 1, 2])
                .expect("geldige mesh"),
        )
    }

    #[test]
    fn results_apply_in_order() {
        let mut scene = scene();
        let payload = ResultPayload {
            results: vec![
                ResultKind::ReplaceMesh {
                    vertices: vec![0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 2.0, 0.0, 2.0, 2.0, 0.0],
                    faces: vec![0, 1, 2, 1, 3, 2],
                },
                ResultKind::FaceColoration {
                    colors: vec![1.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0],
                },
                ResultKind::Message {
                    text: "2 segmenten".to_owned(),
                },
            ],
        };
        apply_results(&payload, InterpretOptions::default(), &mut scene).expect("toepassen");
        assert_eq!(scene.active.faces.len(), 2);
        assert_eq!(scene.face_colors().map(|c| c.len()), Some(8));
        assert_eq!(scene.message, "2 segmenten");
    }

    #[test]
    fn delete_materials_clears_previous_layers() {
        let mut scene = scene();
        scene.set_face_colors(&[0.0, 0.0, 1.0, 1.0]).expect("kleur");
        let payload = ResultPayload {
            results: vec![ResultKind::VertexColoration {
                colors: vec![1.0; 12],
            }],
        };

        apply_results(&payload, InterpretOptions { delete_materials: true }, &mut scene)
            .expect("toepassen");
        assert_eq!(scene.active.color_layers.len(), 1);
        assert_eq!(scene.face_colors(), None);
    }

    #[test]
    fn invalid_later_result_leaves_scene_untouched() {
        let mut scene = scene();
        scene.set_face_colors(&[0.0, 0.0, 1.0, 1.0]).expect("kleur");
        let before = scene.active.clone();
        let payload = ResultPayload {
            results: vec![
                ResultKind::FaceColoration {
                    colors: vec![1.0, 0.0, 0.0, 1.0],
                },
                ResultKind::VertexColoration {
                    colors: vec![1.0; 8],
                },
                ResultKind::Message {
                    text: "klaar".to_owned(),
                },
            ],
        };

        let err = apply_results(&payload, InterpretOptions { delete_materials: true }, &mut scene)
            .expect_err("te weinig vertexkleuren");
        assert!(matches!(err, EngineError::Validation(_)));
        assert_eq!(scene.active, before);
        assert!(scene.message.is_empty());
    }

    #[test]
    fn colors_are_checked_against_the_replacing_mesh() {
        let mut scene = scene();
        let before = scene.active.clone();
        let quad = ResultKind::ReplaceMesh {
            vertices: vec![0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 2.0, 0.0, 2.0, 2.0, 0.0],
            faces: vec![0, 1, 2, 1, 3, 2],
        };

        // één facekleur past op de oude driehoek, niet op de nieuwe twee faces
        let payload = ResultPayload {
            results: vec![
                quad,
                ResultKind::FaceColoration {
                    colors: vec![1.0, 0.0, 0.0, 1.0],
                },
            ],
        };
        assert!(apply_results(&payload, InterpretOptions::default(), &mut scene).is_err());
        assert_eq!(scene.active, before);

        let broken = ResultPayload {
            results: vec![
                ResultKind::AddMesh {
                    vertices: vec![0.0; 9],
                    faces: vec![0, 1, 2],
                },
                ResultKind::AddMesh {
                    vertices: vec![0.0; 9],
                    faces: vec![0, 1, 5],
                },
            ],
        };
        assert!(apply_results(&broken, InterpretOptions::default(), &mut scene).is_err());
        assert!(scene.added.is_empty());
    }

    #[test]
    fn added_mesh_leaves_active_mesh_alone() {
        let mut scene = scene();
        let payload = ResultPayload {
            results: vec![ResultKind::AddMesh {
                vertices: vec![0.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 1.0, 1.0],
                faces: vec![0, 1, 2],
            }],
        };
        apply_results(&payload, InterpretOptions::default(), &mut scene).expect("toepassen");
        assert_eq!(scene.added.len(), 1);
        assert_eq!(scene.active.vertices.len(), 3);
    }
}
