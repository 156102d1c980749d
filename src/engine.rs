use crate::{
    error::Error,
    runtime::Runtime,
    tflite::{
        Delegate, DelegateConfig, DelegateKind, GpuDelegateOptions, Interpreter, Model,
        NnApiDelegateOptions, Options, Tensor, TensorMut,
    },
};
use bytemuck::Pod;
use ndarray::ArrayD;
use std::{
    path::Path,
    time::{Duration, Instant},
};
use tracing::{debug, instrument, warn};

mod summary;

/// Owns a model, its interpreter options, any delegates and the interpreter
/// built from them.
///
/// Typical use: construct, attach delegates, [`Engine::build_interpreter`],
/// then repeatedly [`Engine::set_input`], [`Engine::invoke`] and
/// [`Engine::output`].
///
/// Engines are move-only. `Engine::default()` owns nothing, and
/// `std::mem::take` leaves that empty engine behind.
pub struct Engine<R: Runtime> {
    runtime: R,
    model: Option<Model<R>>,
    options: Option<Options<R>>,
    delegates: Vec<Delegate<R>>,
    interpreter: Option<Interpreter<R>>,
    input_index: usize,
    timing: Timing,
}

#[derive(Debug, Copy, Clone, Default)]
pub struct Timing {
    /// Total time spent in successful invocations.
    pub inference: Duration,
    pub invocations: u32,
}

impl Timing {
    pub fn mean(&self) -> Option<Duration> {
        if self.invocations == 0 {
            None
        } else {
            Some(self.inference / self.invocations)
        }
    }
}

impl<R: Runtime + Default> Default for Engine<R> {
    fn default() -> Self {
        Self {
            runtime: R::default(),
            model: None,
            options: None,
            delegates: Vec::new(),
            interpreter: None,
            input_index: 0,
            timing: Timing::default(),
        }
    }
}

impl<R: Runtime> Engine<R> {
    /// Load a model from an in-memory flatbuffer. The engine keeps the
    /// buffer alive for the lifetime of the model.
    ///
    /// A buffer the runtime can't parse yields an engine that is not
    /// [loaded](Engine::is_loaded); building it fails.
    pub fn from_buffer<B>(runtime: R, buffer: B) -> Self
    where
        B: Into<Box<[u8]>>,
    {
        let model = Model::from_buffer(&runtime, buffer.into());
        Self::with_model(runtime, model)
    }

    /// Load a model from a `.tflite` file. Failures behave as in
    /// [`Engine::from_buffer`].
    pub fn from_file<P>(runtime: R, path: P) -> Self
    where
        P: AsRef<Path>,
    {
        let model = Model::from_file(&runtime, path);
        Self::with_model(runtime, model)
    }

    fn with_model(runtime: R, model: Option<Model<R>>) -> Self {
        let options = match Options::new(&runtime) {
            Ok(options) => Some(options),
            Err(error) => {
                warn!(message = "failed to create interpreter options", %error);
                None
            }
        };
        Self {
            runtime,
            model,
            options,
            delegates: Vec::new(),
            interpreter: None,
            input_index: 0,
            timing: Timing::default(),
        }
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn is_built(&self) -> bool {
        self.interpreter.is_some()
    }

    fn ensure_not_built(&self) -> Result<(), Error> {
        if self.is_built() {
            Err(Error::InterpreterAlreadyBuilt)
        } else {
            Ok(())
        }
    }

    pub fn set_num_threads(&mut self, num_threads: i32) -> Result<(), Error> {
        self.ensure_not_built()?;
        self.options
            .as_mut()
            .ok_or(Error::CreateOptions)?
            .set_num_threads(num_threads);
        Ok(())
    }

    pub fn set_gpu_delegate(&mut self, options: GpuDelegateOptions) -> Result<(), Error> {
        self.attach_delegate(DelegateConfig::Gpu(options))
    }

    pub fn set_nnapi_delegate(&mut self, options: NnApiDelegateOptions) -> Result<(), Error> {
        self.attach_delegate(DelegateConfig::NnApi(options))
    }

    fn attach_delegate(&mut self, config: DelegateConfig) -> Result<(), Error> {
        self.ensure_not_built()?;
        let kind = config.kind();
        if self.has_delegate(kind) {
            return Err(Error::DelegateAlreadyAttached(kind));
        }

        let options = self.options.as_mut().ok_or(Error::CreateOptions)?;
        let mut delegate = Delegate::new(&self.runtime, config)?;
        options.add_delegate(&mut delegate);
        self.delegates.push(delegate);
        Ok(())
    }

    fn has_delegate(&self, kind: DelegateKind) -> bool {
        self.delegates.iter().any(|delegate| delegate.kind() == kind)
    }

    /// Build the interpreter from the model, options and attached delegates.
    ///
    /// At most one interpreter is built per engine. If tensor allocation
    /// fails the interpreter is still kept, and building again returns
    /// [`Error::InterpreterAlreadyBuilt`].
    #[instrument(name = "Engine::build_interpreter", skip(self))]
    pub fn build_interpreter(&mut self) -> Result<(), Error> {
        self.ensure_not_built()?;
        // The GPU delegate allocates while it rewrites the graph.
        let allocate = !self.has_delegate(DelegateKind::Gpu);
        let model = self.model.as_ref().ok_or(Error::ModelNotLoaded)?;
        let options = self.options.as_ref().ok_or(Error::CreateOptions)?;

        let interpreter = Interpreter::new(&self.runtime, model, options)?;
        let interpreter = self.interpreter.insert(interpreter);
        if allocate {
            interpreter.allocate_tensors()?;
        }

        debug!(
            message = "built interpreter",
            inputs = interpreter.get_input_tensor_count()?,
            outputs = interpreter.get_output_tensor_count()?,
            delegates = self.delegates.len(),
        );
        Ok(())
    }

    fn interpreter(&self) -> Result<&Interpreter<R>, Error> {
        self.interpreter.as_ref().ok_or(Error::InterpreterNotBuilt)
    }

    fn interpreter_mut(&mut self) -> Result<&mut Interpreter<R>, Error> {
        self.interpreter.as_mut().ok_or(Error::InterpreterNotBuilt)
    }

    /// Copy `data` into the next input tensor.
    ///
    /// The first call after construction or an invocation fills input 0, the
    /// next input 1, and so on. The byte length of `data` must equal the
    /// tensor's byte size.
    pub fn set_input<T: Pod>(&mut self, data: &[T]) -> Result<&mut Self, Error> {
        let index = self.input_index;
        let interpreter = self.interpreter_mut()?;
        let count = interpreter.get_input_tensor_count()?;
        if index >= count {
            return Err(Error::InputIndexOutOfRange { index, count });
        }

        let bytes: &[u8] = bytemuck::cast_slice(data);
        let mut tensor = interpreter.get_input_tensor(index)?;
        let expected = tensor.byte_size();
        if bytes.len() != expected {
            return Err(Error::InputSizeMismatch {
                index,
                expected,
                actual: bytes.len(),
            });
        }
        tensor.copy_from_buffer(bytes)?;

        self.input_index += 1;
        Ok(self)
    }

    /// Index of the input tensor the next [`Engine::set_input`] fills.
    pub fn next_input_index(&self) -> usize {
        self.input_index
    }

    /// Run inference to completion.
    pub fn invoke(&mut self) -> Result<(), Error> {
        self.invoke_timed().map(|_| ())
    }

    /// Run inference and return the wall-clock time it took.
    pub fn invoke_timed(&mut self) -> Result<Duration, Error> {
        let interpreter = self.interpreter_mut()?;

        let start = Instant::now();
        let result = interpreter.invoke();
        let elapsed = start.elapsed();

        self.input_index = 0;
        result?;

        self.timing.inference += elapsed;
        self.timing.invocations += 1;
        debug!(message = "invoked interpreter", ?elapsed);
        Ok(elapsed)
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    /// Copy output `index` into a new vector of `T`.
    pub fn output<T: Pod>(&self, index: usize) -> Result<Vec<T>, Error> {
        self.output_tensor(index)?.to_vec()
    }

    /// Copy output `index` into `output`, replacing its contents.
    pub fn output_into<T: Pod>(&self, index: usize, output: &mut Vec<T>) -> Result<(), Error> {
        self.output_tensor(index)?.read_into(output)
    }

    /// Copy every output tensor, in order.
    pub fn outputs<T: Pod>(&self) -> Result<Vec<Vec<T>>, Error> {
        (0..self.output_tensor_count()?)
            .map(|index| self.output(index))
            .collect()
    }

    /// Output `index` shaped by the tensor's dimensions.
    pub fn output_array<T: Pod>(&self, index: usize) -> Result<ArrayD<T>, Error> {
        self.output_tensor(index)?.to_ndarray()
    }

    pub fn input_tensor_count(&self) -> Result<usize, Error> {
        self.interpreter()?.get_input_tensor_count()
    }

    pub fn output_tensor_count(&self) -> Result<usize, Error> {
        self.interpreter()?.get_output_tensor_count()
    }

    pub fn input_tensor_length(&self, index: usize) -> Result<usize, Error> {
        Ok(self.input_tensor(index)?.len())
    }

    pub fn output_tensor_length(&self, index: usize) -> Result<usize, Error> {
        Ok(self.output_tensor(index)?.len())
    }

    pub fn input_tensor(&self, index: usize) -> Result<Tensor<'_, R>, Error> {
        self.interpreter()?.get_input_tensor_ref(index)
    }

    pub fn input_tensor_mut(&mut self, index: usize) -> Result<TensorMut<'_, R>, Error> {
        self.interpreter_mut()?.get_input_tensor(index)
    }

    pub fn output_tensor(&self, index: usize) -> Result<Tensor<'_, R>, Error> {
        self.interpreter()?.get_output_tensor(index)
    }
}

impl<R: Runtime> Drop for Engine<R> {
    fn drop(&mut self) {
        // Reverse acquisition order: interpreter, delegates (last attached
        // first), options, model.
        self.interpreter.take();
        while let Some(delegate) = self.delegates.pop() {
            drop(delegate);
        }
        self.options.take();
        self.model.take();
    }
}
