//! Owning wrappers around the TensorFlow Lite C API.
//!
//! [`Engine`] holds a model, interpreter options, optional GPU/NNAPI
//! delegates and the interpreter built from them, and releases everything in
//! reverse acquisition order when dropped. Inputs are fed sequentially with
//! [`Engine::set_input`]; outputs are copied out as typed vectors or
//! `ndarray` arrays.
//!
//! The native library is only linked with the `tflite` feature, which
//! provides [`CApi`]. The `gpu` and `nnapi` features additionally enable the
//! corresponding delegates.

mod engine;
mod error;
mod runtime;
mod tflite;
#[cfg(feature = "tflite")]
mod tflite_sys;

pub use engine::{Engine, Timing};
pub use error::Error;
#[cfg(feature = "tflite")]
pub use runtime::CApi;
pub use runtime::{Runtime, Status};
pub use tflite::{
    DelegateConfig, DelegateKind, ExecutionPreference, GpuDelegateOptions, GpuInferencePriority,
    GpuInferenceUsage, NnApiDelegateOptions, ParseEnumError, Tensor, TensorMut, TensorType,
};

/// An engine backed by the linked TensorFlow Lite library.
#[cfg(feature = "tflite")]
pub type TfLiteEngine = Engine<CApi>;
