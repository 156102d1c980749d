use crate::{
    error::Error,
    runtime::{status_to_result, Runtime},
    tflite::TensorType,
};
use bytemuck::Pod;
use ndarray::{ArrayD, IxDyn};
use std::{convert::TryFrom, mem::size_of, ops::Deref};

/// A safe wrapper around TfLiteTensor.
///
/// Data are owned by the interpreter that allocated the tensor; the borrow of
/// the runtime ties this view to that interpreter.
pub struct Tensor<'interp, R: Runtime> {
    runtime: &'interp R,
    tensor: R::Tensor,
    index: usize,
}

impl<'interp, R: Runtime> Tensor<'interp, R> {
    pub(crate) fn new(runtime: &'interp R, tensor: R::Tensor, index: usize) -> Self {
        Self {
            runtime,
            tensor,
            index,
        }
    }

    /// Position of this tensor among the interpreter's inputs or outputs.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> String {
        // # SAFETY: self.tensor is valid for 'interp
        unsafe { self.runtime.tensor_name(self.tensor) }
    }

    pub fn r#type(&self) -> TensorType {
        unsafe { self.runtime.tensor_type(self.tensor) }
    }

    pub fn byte_size(&self) -> usize {
        unsafe { self.runtime.tensor_byte_size(self.tensor) }
    }

    pub fn num_dims(&self) -> Result<usize, Error> {
        usize::try_from(unsafe { self.runtime.tensor_num_dims(self.tensor) })
            .map_err(Error::GetNumDims)
    }

    pub fn dim(&self, index: usize) -> Result<usize, Error> {
        let dims = self.num_dims()?;
        if index >= dims {
            return Err(Error::GetDim(index, dims));
        }

        let index = i32::try_from(index).map_err(Error::GetFfiIndex)?;
        usize::try_from(unsafe { self.runtime.tensor_dim(self.tensor, index) })
            .map_err(Error::ConvertDimI32ToUSize)
    }

    pub fn dims(&self) -> Result<Vec<usize>, Error> {
        (0..self.num_dims()?).map(|d| self.dim(d)).collect()
    }

    /// Size in bytes of a single element.
    ///
    /// String tensors report the length of their NUL-terminated payload.
    pub fn element_byte_size(&self) -> usize {
        self.r#type()
            .element_width()
            .unwrap_or_else(|| unsafe { self.runtime.tensor_string_len(self.tensor) })
    }

    /// Number of elements: byte size over element size, or zero when the
    /// element size is zero.
    pub fn len(&self) -> usize {
        match self.element_byte_size() {
            0 => 0,
            element_size => self.byte_size() / element_size,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy the raw tensor bytes into `buf`, whose length must equal
    /// [`Tensor::byte_size`].
    pub fn copy_to_buffer(&self, buf: &mut [u8]) -> Result<(), Error> {
        status_to_result(
            unsafe { self.runtime.copy_to_buffer(self.tensor, buf) },
            "failed to copy to output buffer",
        )
    }

    /// Replace the contents of `out` with the tensor bytes reinterpreted as `T`.
    pub fn read_into<T: Pod>(&self, out: &mut Vec<T>) -> Result<(), Error> {
        let byte_size = self.byte_size();
        let element_size = size_of::<T>();
        if element_size == 0 || byte_size % element_size != 0 {
            return Err(Error::OutputSizeMismatch {
                index: self.index,
                byte_size,
                element_size,
            });
        }

        out.clear();
        out.resize(byte_size / element_size, T::zeroed());
        self.copy_to_buffer(bytemuck::cast_slice_mut(out.as_mut_slice()))
    }

    pub fn to_vec<T: Pod>(&self) -> Result<Vec<T>, Error> {
        let mut out = Vec::new();
        self.read_into(&mut out)?;
        Ok(out)
    }

    /// Copy the tensor into an array shaped like the tensor.
    pub fn to_ndarray<T: Pod>(&self) -> Result<ArrayD<T>, Error> {
        ArrayD::from_shape_vec(IxDyn(&self.dims()?), self.to_vec()?)
            .map_err(Error::ConstructArrayView)
    }

    /// Shape formatted as `d0xd1x...`.
    pub fn shape_string(&self) -> Result<String, Error> {
        Ok(self
            .dims()?
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("x"))
    }
}

/// A tensor that can be written to: only input tensors, borrowed from a
/// mutably held interpreter.
pub struct TensorMut<'interp, R: Runtime> {
    tensor: Tensor<'interp, R>,
}

impl<'interp, R: Runtime> TensorMut<'interp, R> {
    pub(crate) fn new(runtime: &'interp R, tensor: R::Tensor, index: usize) -> Self {
        Self {
            tensor: Tensor::new(runtime, tensor, index),
        }
    }

    pub fn copy_from_buffer(&mut self, buf: &[u8]) -> Result<(), Error> {
        let tensor = &self.tensor;
        // SAFETY: buf is valid for buf.len() bytes and the interpreter is
        // borrowed mutably for 'interp
        status_to_result(
            unsafe { tensor.runtime.copy_from_buffer(tensor.tensor, buf) },
            "failed to copy from input buffer",
        )
    }

    pub fn copy_from_slice<T: Pod>(&mut self, data: &[T]) -> Result<(), Error> {
        self.copy_from_buffer(bytemuck::cast_slice(data))
    }
}

impl<'interp, R: Runtime> Deref for TensorMut<'interp, R> {
    type Target = Tensor<'interp, R>;

    fn deref(&self) -> &Self::Target {
        &self.tensor
    }
}
