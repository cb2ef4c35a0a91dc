//! Diagnostisch algoritme om de native route zonder echte geometrie te testen.

use super::{NativeAlgorithm, NativeOutput, text_param};
use crate::engine::{OutputKind, StepParams};
use crate::error::BackendError;
use crate::mesh::MeshPayload;

pub const DISPLAY_TEXT: &str = "DISPLAY_TEXT";
pub const GREETING: &str = "This is a message from a pure native algorithm.";

const PYRAMID_VERTICES: [f64; 12] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.5, 1.0, 0.0, 0.5, 0.5, 1.0];
const PYRAMID_FACES: [u32; 12] = [0, 1, 2, 3, 1, 2, 3, 0, 2, 0, 1, 3];

#[derive(Debug, Default, Clone, Copy)]
pub struct TestPyramid;

impl NativeAlgorithm for TestPyramid {
    fn run(&self, _: &MeshPayload, params: &StepParams) -> Result<NativeOutput, BackendError> {
        if text_param(params, "output_option") == Some(DISPLAY_TEXT) {
            return Ok(NativeOutput::message(GREETING));
        }
        Ok(NativeOutput {
            mesh: Some(MeshPayload::new(PYRAMID_VERTICES.to_vec(), PYRAMID_FACES.to_vec())),
            declared: vec![OutputKind::AddMesh],
            result_infos: String::new(),
        })
    }
}
