//! The boundary between the owning wrappers and the inference runtime.
//!
//! Every call the wrappers make into TensorFlow Lite goes through [`Runtime`].
//! [`CApi`] forwards to the C library; tests substitute a recording fake.

use crate::{
    error::Error,
    tflite::{GpuDelegateOptions, NnApiDelegateOptions, TensorType},
};
use num_derive::FromPrimitive;
use std::ffi::CStr;

#[cfg(feature = "tflite")]
mod c_api;
#[cfg(feature = "tflite")]
pub use c_api::CApi;

#[cfg(test)]
pub(crate) mod fake;

/// Return codes of the C API (`TfLiteStatus`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, FromPrimitive)]
pub enum Status {
    Ok = 0,
    Error = 1,
    DelegateError = 2,
    ApplicationError = 3,
    DelegateDataNotFound = 4,
    DelegateDataWriteError = 5,
    DelegateDataReadError = 6,
    UnresolvedOps = 7,
    Cancelled = 8,
}

pub(crate) fn status_to_result(status: Status, context: &'static str) -> Result<(), Error> {
    match status {
        Status::Ok => Ok(()),
        status => Err(Error::Status { status, context }),
    }
}

/// Operations the wrappers need from an inference runtime.
///
/// Handles are opaque to the caller. Creation functions are safe: they either
/// hand back a live handle or nothing. Everything that consumes a handle is
/// `unsafe`.
///
/// # Safety
///
/// Callers of the `unsafe` methods must pass handles that were produced by the
/// same runtime and have not been released. A handle passed to one of the
/// `delete_*` methods is dead afterwards and must not be used again. Tensor
/// handles are only valid while the interpreter they came from is alive. A
/// model and its delegates must outlive any interpreter created from them.
pub trait Runtime: Clone {
    type Model;
    type Options;
    type Delegate;
    type Interpreter;
    type Tensor: Copy;

    /// Version string of the underlying library.
    fn version(&self) -> String;

    /// Parse a model from `buffer`. The buffer must outlive the model.
    fn create_model(&self, buffer: &[u8]) -> Option<Self::Model>;
    fn create_model_from_file(&self, path: &CStr) -> Option<Self::Model>;
    unsafe fn delete_model(&self, model: &mut Self::Model);

    fn create_options(&self) -> Option<Self::Options>;
    unsafe fn set_num_threads(&self, options: &mut Self::Options, num_threads: i32);
    unsafe fn add_delegate(&self, options: &mut Self::Options, delegate: &mut Self::Delegate);
    unsafe fn delete_options(&self, options: &mut Self::Options);

    fn create_gpu_delegate(&self, options: &GpuDelegateOptions) -> Result<Self::Delegate, Error>;
    fn create_nnapi_delegate(
        &self,
        options: &NnApiDelegateOptions,
    ) -> Result<Self::Delegate, Error>;
    unsafe fn delete_delegate(&self, delegate: &mut Self::Delegate);

    unsafe fn create_interpreter(
        &self,
        model: &Self::Model,
        options: &Self::Options,
    ) -> Option<Self::Interpreter>;
    unsafe fn delete_interpreter(&self, interpreter: &mut Self::Interpreter);
    unsafe fn allocate_tensors(&self, interpreter: &mut Self::Interpreter) -> Status;
    unsafe fn invoke(&self, interpreter: &mut Self::Interpreter) -> Status;
    unsafe fn input_tensor_count(&self, interpreter: &Self::Interpreter) -> i32;
    unsafe fn output_tensor_count(&self, interpreter: &Self::Interpreter) -> i32;
    /// Input tensors are writable through [`Runtime::copy_from_buffer`]. The
    /// wrappers only do that while holding the interpreter mutably.
    unsafe fn input_tensor(
        &self,
        interpreter: &Self::Interpreter,
        index: i32,
    ) -> Option<Self::Tensor>;
    unsafe fn output_tensor(
        &self,
        interpreter: &Self::Interpreter,
        index: i32,
    ) -> Option<Self::Tensor>;

    unsafe fn tensor_type(&self, tensor: Self::Tensor) -> TensorType;
    unsafe fn tensor_name(&self, tensor: Self::Tensor) -> String;
    unsafe fn tensor_num_dims(&self, tensor: Self::Tensor) -> i32;
    unsafe fn tensor_dim(&self, tensor: Self::Tensor, index: i32) -> i32;
    unsafe fn tensor_byte_size(&self, tensor: Self::Tensor) -> usize;
    /// Length of the NUL-terminated payload of a string tensor.
    unsafe fn tensor_string_len(&self, tensor: Self::Tensor) -> usize;
    unsafe fn copy_from_buffer(&self, tensor: Self::Tensor, buffer: &[u8]) -> Status;
    unsafe fn copy_to_buffer(&self, tensor: Self::Tensor, buffer: &mut [u8]) -> Status;
}

#[cfg(test)]
mod tests {
    use super::{status_to_result, Status};
    use crate::error::Error;
    use num_traits::FromPrimitive;

    #[test]
    fn ok_status_is_ok() {
        assert!(status_to_result(Status::Ok, "unused").is_ok());
    }

    #[test]
    fn failed_status_keeps_context() {
        match status_to_result(Status::DelegateError, "model invocation failed") {
            Err(Error::Status { status, context }) => {
                assert_eq!(status, Status::DelegateError);
                assert_eq!(context, "model invocation failed");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn raw_status_codes() {
        assert_eq!(Status::from_i64(0), Some(Status::Ok));
        assert_eq!(Status::from_i64(7), Some(Status::UnresolvedOps));
        assert_eq!(Status::from_i64(42), None);
    }
}
