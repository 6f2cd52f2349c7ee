//! ONNX Runtime backend.
//!
//! Expects a model exported with a single input named [`INPUT_NAME`] of shape
//! `[1, OBS_SIZE]` and a single output named [`OUTPUT_NAME`] of shape
//! `[1, ACTION_SIZE]`.

use std::path::Path;

use ort::{session::Session, value::TensorRef};

use super::{
    BackendError, BoxedInferenceBackend, INPUT_NAME, InferenceBackend, ModelLoader, OUTPUT_NAME,
};
use crate::{action::ACTION_SIZE, observation::OBS_SIZE};

const ENVIRONMENT_NAME: &str = "boostrap-bot";

#[derive(Debug, Default, Clone, Copy)]
pub struct OnnxLoader;

impl ModelLoader for OnnxLoader {
    fn load(&self, model_path: &Path) -> Result<BoxedInferenceBackend, BackendError> {
        ort::init()
            .with_name(ENVIRONMENT_NAME)
            .commit()
            .map_err(|err| BackendError::with_context("onnx runtime init", err))?;
        let session = Session::builder()
            .and_then(|builder| builder.commit_from_file(model_path))
            .map_err(|err| {
                BackendError::with_context(
                    &format!("load model {}", model_path.display()),
                    err,
                )
            })?;
        tracing::debug!(path = %model_path.display(), "onnx session created");
        Ok(Box::new(OnnxBackend {
            session: Some(session),
        }))
    }
}

struct OnnxBackend {
    session: Option<Session>,
}

impl InferenceBackend for OnnxBackend {
    fn run(
        &mut self,
        input: &[f32; OBS_SIZE],
        output: &mut [f32; ACTION_SIZE],
    ) -> Result<(), BackendError> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| BackendError::new("onnx session destroyed"))?;
        let tensor = TensorRef::from_array_view(([1_usize, OBS_SIZE], &input[..]))
            .map_err(|err| BackendError::with_context("create input tensor", err))?;
        let outputs = session
            .run(ort::inputs![INPUT_NAME => tensor])
            .map_err(|err| BackendError::with_context("session run", err))?;
        let (_shape, data) = outputs[OUTPUT_NAME]
            .try_extract_tensor::<f32>()
            .map_err(|err| BackendError::with_context("read output tensor", err))?;
        let Some(data) = data.get(..ACTION_SIZE) else {
            return Err(BackendError::new(format!(
                "output tensor has {} values, expected {ACTION_SIZE}",
                data.len()
            )));
        };
        output.copy_from_slice(data);
        Ok(())
    }

    fn release(&mut self) -> Result<(), BackendError> {
        // ort frees the session and its allocator on drop.
        self.session = None;
        Ok(())
    }
}
