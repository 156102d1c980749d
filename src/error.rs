use crate::{runtime::Status, tflite::DelegateKind};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to convert Path to CString")]
    PathToCString(#[source] std::ffi::NulError),

    #[error("failed to convert delegate option {0} to CString")]
    OptionToCString(&'static str, #[source] std::ffi::NulError),

    #[error("no model is loaded: the model buffer or file could not be parsed")]
    ModelNotLoaded,

    #[error("failed to create TfLiteInterpreterOptions structure")]
    CreateOptions,

    #[error("failed to create interpreter, got null pointer")]
    CreateInterpreter,

    #[error("interpreter has not been built")]
    InterpreterNotBuilt,

    #[error("interpreter is already built; options and delegates can no longer change")]
    InterpreterAlreadyBuilt,

    #[error("failed to create {0} delegate, got null pointer")]
    CreateDelegate(DelegateKind),

    #[error("a {0} delegate is already attached")]
    DelegateAlreadyAttached(DelegateKind),

    #[error("{context}: {status:?}")]
    Status {
        status: Status,
        context: &'static str,
    },

    #[error("failed to convert usize to i32")]
    GetFfiIndex(#[source] std::num::TryFromIntError),

    #[error("failed to get input tensor {0}: got null pointer instead")]
    GetInputTensor(usize),

    #[error("failed to get output tensor {0}: got null pointer instead")]
    GetOutputTensor(usize),

    #[error("input index {index} is out of range for a model with {count} inputs")]
    InputIndexOutOfRange { index: usize, count: usize },

    #[error("input {index} expects {expected} bytes, got {actual}")]
    InputSizeMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("output {index} has {byte_size} bytes, which is not a multiple of the element size {element_size}")]
    OutputSizeMismatch {
        index: usize,
        byte_size: usize,
        element_size: usize,
    },

    #[error("dimension index {0} is out of bounds for tensor with dimensions {1}")]
    GetDim(usize, usize),

    #[error("failed to convert dim i32 to usize")]
    ConvertDimI32ToUSize(#[source] std::num::TryFromIntError),

    #[error("failed to convert number of dims i32 to usize")]
    GetNumDims(#[source] std::num::TryFromIntError),

    #[error("failed to convert tensor count i32 to usize")]
    GetTensorCount(#[source] std::num::TryFromIntError),

    #[error("failed to construct array view from TfLiteTensor")]
    ConstructArrayView(#[source] ndarray::ShapeError),
}

/// Check whether a pointer to const T is null.
#[cfg_attr(not(feature = "tflite"), allow(dead_code))]
pub(crate) fn check_null<T>(ptr: *const T) -> Option<*const T> {
    if ptr.is_null() {
        None
    } else {
        Some(ptr)
    }
}

/// Check whether a pointer to mut T is null.
#[cfg_attr(not(feature = "tflite"), allow(dead_code))]
pub(crate) fn check_null_mut<T>(ptr: *mut T) -> Option<*mut T> {
    if ptr.is_null() {
        None
    } else {
        Some(ptr)
    }
}

#[cfg(test)]
mod tests {
    use super::{check_null, check_null_mut};

    #[test]
    fn null_pointers_are_none() {
        assert!(check_null(std::ptr::null::<u8>()).is_none());
        assert!(check_null_mut(std::ptr::null_mut::<u8>()).is_none());
    }

    #[test]
    fn valid_pointers_pass_through() {
        let mut value = 7_u8;
        let ptr: *mut u8 = &mut value;
        assert_eq!(check_null_mut(ptr), Some(ptr));
        assert_eq!(check_null(ptr as *const u8), Some(ptr as *const u8));
    }
}
