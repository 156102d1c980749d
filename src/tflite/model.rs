use crate::{error::Error, runtime::Runtime};
use std::{ffi::CString, os::unix::ffi::OsStrExt, path::Path};
use tracing::warn;

/// A safe TFLiteModel wrapper.
pub(crate) struct Model<R: Runtime> {
    runtime: R,
    /// SAFETY: `model` is owned and not mutated by any other APIs here
    /// or in TFLite.
    model: R::Model,
    // The runtime reads from this buffer for as long as `model` is alive.
    // Field order matters: it's dropped after `Drop::drop` releases `model`.
    _buffer: Option<Box<[u8]>>,
}

fn path_to_c_string<P>(path: P) -> Result<CString, Error>
where
    P: AsRef<Path>,
{
    CString::new(path.as_ref().as_os_str().as_bytes()).map_err(Error::PathToCString)
}

impl<R: Runtime> Model<R> {
    /// Parse a model from an owned buffer. Returns `None` if the runtime
    /// rejects the bytes.
    pub(crate) fn from_buffer(runtime: &R, buffer: Box<[u8]>) -> Option<Self> {
        let model = runtime.create_model(&buffer);
        if model.is_none() {
            warn!(
                message = "runtime rejected model buffer",
                len = buffer.len()
            );
        }
        Some(Self {
            runtime: runtime.clone(),
            model: model?,
            _buffer: Some(buffer),
        })
    }

    /// Load a model from a file. Returns `None` if the path isn't
    /// representable as a C string or the runtime can't parse the file.
    pub(crate) fn from_file<P>(runtime: &R, path: P) -> Option<Self>
    where
        P: AsRef<Path>,
    {
        let path_ref = path.as_ref();
        let path_bytes = match path_to_c_string(path_ref) {
            Ok(path_bytes) => path_bytes,
            Err(error) => {
                warn!(message = "invalid model path", path = ?path_ref, %error);
                return None;
            }
        };
        let model = runtime.create_model_from_file(&path_bytes);
        if model.is_none() {
            warn!(message = "failed to load model from file", path = ?path_ref);
        }
        Some(Self {
            runtime: runtime.clone(),
            model: model?,
            _buffer: None,
        })
    }

    pub(super) fn as_handle(&self) -> &R::Model {
        &self.model
    }
}

impl<R: Runtime> Drop for Model<R> {
    fn drop(&mut self) {
        // SAFETY: self.model is guaranteed to be valid
        unsafe { self.runtime.delete_model(&mut self.model) }
    }
}
