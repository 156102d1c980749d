use crate::{
    error::Error,
    runtime::{status_to_result, Runtime},
    tflite::{Model, Options, Tensor, TensorMut},
};
use std::convert::TryFrom;

/// A safe wrapper around TfLiteInterpreter.
///
/// The model, options and delegates used to build the interpreter are owned
/// elsewhere and must be dropped after it. [`crate::Engine`] takes care of
/// that ordering.
pub(crate) struct Interpreter<R: Runtime> {
    runtime: R,
    interpreter: R::Interpreter,
}

impl<R: Runtime> Interpreter<R> {
    pub(crate) fn new(runtime: &R, model: &Model<R>, options: &Options<R>) -> Result<Self, Error> {
        // SAFETY: model and options are both live handles from `runtime`
        let interpreter =
            unsafe { runtime.create_interpreter(model.as_handle(), options.as_handle()) }
                .ok_or(Error::CreateInterpreter)?;
        Ok(Self {
            runtime: runtime.clone(),
            interpreter,
        })
    }

    pub(crate) fn allocate_tensors(&mut self) -> Result<(), Error> {
        status_to_result(
            unsafe { self.runtime.allocate_tensors(&mut self.interpreter) },
            "failed to allocate tensors",
        )
    }

    pub(crate) fn invoke(&mut self) -> Result<(), Error> {
        status_to_result(
            unsafe { self.runtime.invoke(&mut self.interpreter) },
            "model invocation failed",
        )
    }

    pub(crate) fn get_input_tensor_count(&self) -> Result<usize, Error> {
        usize::try_from(unsafe { self.runtime.input_tensor_count(&self.interpreter) })
            .map_err(Error::GetTensorCount)
    }

    pub(crate) fn get_output_tensor_count(&self) -> Result<usize, Error> {
        usize::try_from(unsafe { self.runtime.output_tensor_count(&self.interpreter) })
            .map_err(Error::GetTensorCount)
    }

    pub(crate) fn get_input_tensor(&mut self, index: usize) -> Result<TensorMut<'_, R>, Error> {
        let tensor = self.input_tensor_handle(index)?;
        Ok(TensorMut::new(&self.runtime, tensor, index))
    }

    /// Read-only view of an input tensor, for diagnostics.
    pub(crate) fn get_input_tensor_ref(&self, index: usize) -> Result<Tensor<'_, R>, Error> {
        let tensor = self.input_tensor_handle(index)?;
        Ok(Tensor::new(&self.runtime, tensor, index))
    }

    pub(crate) fn get_output_tensor(&self, index: usize) -> Result<Tensor<'_, R>, Error> {
        let ffi_index = i32::try_from(index).map_err(Error::GetFfiIndex)?;
        let tensor = unsafe { self.runtime.output_tensor(&self.interpreter, ffi_index) }
            .ok_or(Error::GetOutputTensor(index))?;
        Ok(Tensor::new(&self.runtime, tensor, index))
    }

    fn input_tensor_handle(&self, index: usize) -> Result<R::Tensor, Error> {
        let ffi_index = i32::try_from(index).map_err(Error::GetFfiIndex)?;
        unsafe { self.runtime.input_tensor(&self.interpreter, ffi_index) }
            .ok_or(Error::GetInputTensor(index))
    }
}

impl<R: Runtime> Drop for Interpreter<R> {
    fn drop(&mut self) {
        // # SAFETY: self.interpreter is guaranteed to be valid.
        unsafe { self.runtime.delete_interpreter(&mut self.interpreter) }
    }
}
