//! Policy inference: observation vector to action vector.
//!
//! [`InferenceAdapter`] owns one loaded model session together with the
//! fixed-shape buffers the session reads from and writes to:
//!
//! - input `"obs"`, shape `[1, OBS_SIZE]`
//! - output `"action"`, shape `[1, ACTION_SIZE]`
//!
//! The session and its buffers are mutated in place on every call, so
//! [`InferenceAdapter::run`] takes a lock for the duration of the call and
//! hands the result back as an [`ActionOutput`] that keeps holding it. The
//! action is readable until the guard is dropped; the next `run` blocks until
//! then.
//!
//! Model runtimes plug in through [`ModelLoader`] and [`InferenceBackend`].
//! With the `onnx` feature enabled, [`onnx::OnnxLoader`] loads models with
//! ONNX Runtime.

use std::{
    fmt,
    ops::Deref,
    path::Path,
    sync::{Mutex, MutexGuard, PoisonError, TryLockError},
};

use crate::{action::ACTION_SIZE, observation::OBS_SIZE};

#[cfg(feature = "onnx")]
pub mod onnx;

/// Name of the model input port.
pub const INPUT_NAME: &str = "obs";
/// Name of the model output port.
pub const OUTPUT_NAME: &str = "action";

/// Failure reported by a model runtime.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("{message}")]
pub struct BackendError {
    message: String,
}

impl BackendError {
    #[must_use]
    pub fn new<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
        }
    }

    /// Wraps a runtime error, prefixed with what was being attempted.
    #[must_use]
    pub fn with_context<E>(context: &str, error: E) -> Self
    where
        E: fmt::Display,
    {
        Self::new(format!("{context}: {error}"))
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum InitError {
    #[display("model path is empty")]
    EmptyModelPath,
    #[display("failed to initialize inference backend: {_0}")]
    BackendInit(BackendError),
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum InferenceError {
    #[display("inference session has been released")]
    Released,
    #[display("inference failed: {_0}")]
    Backend(BackendError),
}

/// A loaded model that maps one observation to one action.
pub trait InferenceBackend: Send {
    /// Runs the model on `input`, writing the result into `output`.
    ///
    /// On error the contents of `output` are unspecified.
    fn run(
        &mut self,
        input: &[f32; OBS_SIZE],
        output: &mut [f32; ACTION_SIZE],
    ) -> Result<(), BackendError>;

    /// Destroys runtime resources held by the model.
    fn release(&mut self) -> Result<(), BackendError> {
        Ok(())
    }
}

pub type BoxedInferenceBackend = Box<dyn InferenceBackend>;

/// Brings up a model runtime and loads a model from disk.
pub trait ModelLoader: fmt::Debug {
    fn load(&self, model_path: &Path) -> Result<BoxedInferenceBackend, BackendError>;
}

/// Loader used when the crate is built without any model runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedLoader;

impl ModelLoader for UnsupportedLoader {
    fn load(&self, _model_path: &Path) -> Result<BoxedInferenceBackend, BackendError> {
        Err(BackendError::new(
            "no model runtime available (build with the `onnx` feature)",
        ))
    }
}

/// Returns the loader for the model runtime compiled into this build.
#[must_use]
pub fn default_loader() -> Box<dyn ModelLoader> {
    #[cfg(feature = "onnx")]
    {
        Box::new(onnx::OnnxLoader)
    }
    #[cfg(not(feature = "onnx"))]
    {
        Box::new(UnsupportedLoader)
    }
}

struct Session {
    backend: Option<BoxedInferenceBackend>,
    input: Option<Box<[f32; OBS_SIZE]>>,
    output: Option<Box<[f32; ACTION_SIZE]>>,
}

/// Serialized access to one loaded model and its I/O buffers.
pub struct InferenceAdapter {
    session: Mutex<Session>,
}

impl fmt::Debug for InferenceAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("InferenceAdapter");
        match self.session.try_lock() {
            Ok(session) => debug.field("released", &session.backend.is_none()),
            Err(TryLockError::Poisoned(err)) => {
                debug.field("released", &err.into_inner().backend.is_none())
            }
            Err(TryLockError::WouldBlock) => debug.field("released", &format_args!("<locked>")),
        };
        debug.finish()
    }
}

impl InferenceAdapter {
    /// Loads the model at `model_path` with `loader`.
    pub fn initialize(model_path: &Path, loader: &dyn ModelLoader) -> Result<Self, InitError> {
        if model_path.as_os_str().is_empty() {
            return Err(InitError::EmptyModelPath);
        }
        let backend = loader.load(model_path).map_err(InitError::BackendInit)?;
        Ok(Self::from_backend(backend))
    }

    /// Wraps an already loaded backend.
    #[must_use]
    pub fn from_backend(backend: BoxedInferenceBackend) -> Self {
        Self {
            session: Mutex::new(Session {
                backend: Some(backend),
                input: Some(Box::new([0.0; OBS_SIZE])),
                output: Some(Box::new([0.0; ACTION_SIZE])),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        // Every run rewrites both buffers, so a poisoned lock is still usable.
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Blocks while an [`ActionOutput`] from this adapter is alive.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.lock().backend.is_none()
    }

    /// Runs the model on `observation`.
    ///
    /// Only the first [`OBS_SIZE`] values are used; a shorter observation is
    /// padded with zeros. Blocks while another call (or a live
    /// [`ActionOutput`]) holds the session.
    pub fn run(&self, observation: &[f32]) -> Result<ActionOutput<'_>, InferenceError> {
        let mut guard = self.lock();
        let session = &mut *guard;
        let (Some(backend), Some(input), Some(output)) = (
            session.backend.as_mut(),
            session.input.as_deref_mut(),
            session.output.as_deref_mut(),
        ) else {
            return Err(InferenceError::Released);
        };

        let len = observation.len().min(OBS_SIZE);
        input[..len].copy_from_slice(&observation[..len]);
        input[len..].fill(0.0);

        backend
            .run(input, output)
            .map_err(InferenceError::Backend)?;
        Ok(ActionOutput { guard })
    }

    /// Destroys the session, then the input buffer, then the output buffer.
    ///
    /// Calling this more than once is harmless. Only the first failure is
    /// reported; the remaining resources are destroyed regardless.
    ///
    /// Waits for the session lock, so any [`ActionOutput`] from this adapter
    /// must be dropped first when calling from the same thread.
    pub fn release(&self) -> Result<(), BackendError> {
        let mut session = self.lock();
        let mut result = Ok(());
        if let Some(mut backend) = session.backend.take() {
            result = backend.release();
        }
        session.input = None;
        session.output = None;
        result
    }
}

impl Drop for InferenceAdapter {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            tracing::warn!(%err, "failed to release inference session");
        }
    }
}

/// Action vector produced by [`InferenceAdapter::run`].
///
/// Borrows the adapter's output buffer and holds its lock; decode it and drop
/// it before running the model again.
pub struct ActionOutput<'a> {
    guard: MutexGuard<'a, Session>,
}

impl fmt::Debug for ActionOutput<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ActionOutput").field(&&**self).finish()
    }
}

impl Deref for ActionOutput<'_> {
    type Target = [f32];

    fn deref(&self) -> &Self::Target {
        match self.guard.output.as_deref() {
            Some(output) => output,
            None => &[],
        }
    }
}
