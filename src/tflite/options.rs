use crate::{error::Error, runtime::Runtime, tflite::Delegate};

/// A safe wrapper around TfLiteInterpreterOptions.
///
/// The C API has no getters for options, so what was set is recorded here.
pub(crate) struct Options<R: Runtime> {
    runtime: R,
    options: R::Options,
    num_threads: Option<i32>,
    num_delegates: usize,
}

impl<R: Runtime> Options<R> {
    pub(crate) fn new(runtime: &R) -> Result<Self, Error> {
        Ok(Self {
            options: runtime.create_options().ok_or(Error::CreateOptions)?,
            runtime: runtime.clone(),
            num_threads: None,
            num_delegates: 0,
        })
    }

    pub(crate) fn set_num_threads(&mut self, num_threads: i32) {
        // SAFETY: self.options is a valid pointer
        unsafe { self.runtime.set_num_threads(&mut self.options, num_threads) };
        self.num_threads = Some(num_threads);
    }

    /// `delegate` must outlive any interpreter built from these options.
    pub(crate) fn add_delegate(&mut self, delegate: &mut Delegate<R>) {
        // SAFETY: self.options and delegate are both valid. The caller keeps
        // `delegate` alive at least as long as the interpreter.
        unsafe {
            self.runtime
                .add_delegate(&mut self.options, delegate.as_mut_handle())
        };
        self.num_delegates += 1;
    }

    /// The thread count that was set, `None` for the runtime default.
    pub(crate) fn num_threads(&self) -> Option<i32> {
        self.num_threads
    }

    pub(crate) fn num_delegates(&self) -> usize {
        self.num_delegates
    }

    pub(super) fn as_handle(&self) -> &R::Options {
        &self.options
    }
}

impl<R: Runtime> Drop for Options<R> {
    fn drop(&mut self) {
        // SAFETY: self.options is guaranteed to be valid
        unsafe { self.runtime.delete_options(&mut self.options) }
    }
}
