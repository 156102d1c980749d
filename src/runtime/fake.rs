//! An in-memory runtime that records every call made through [`Runtime`].
//!
//! A model buffer is accepted when it carries the `TFL3` flatbuffer file
//! identifier at offset 4. Every interpreter gets the tensors registered with
//! [`FakeRuntime::with_input`] and [`FakeRuntime::with_output`]; invoking it
//! copies input `i` into output `i` where the sizes agree.

use super::{Runtime, Status};
use crate::{
    error::Error,
    tflite::{DelegateKind, GpuDelegateOptions, NnApiDelegateOptions, TensorType},
};
use std::{
    cell::RefCell,
    collections::{BTreeSet, HashMap},
    ffi::CStr,
    rc::Rc,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct Handle(pub(crate) u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    CreateModel(Handle),
    DeleteModel(Handle),
    CreateOptions(Handle),
    SetNumThreads(Handle, i32),
    AddDelegate { options: Handle, delegate: Handle },
    DeleteOptions(Handle),
    CreateDelegate(Handle, DelegateKind),
    DeleteDelegate(Handle),
    CreateInterpreter(Handle),
    DeleteInterpreter(Handle),
    AllocateTensors(Handle),
    Invoke(Handle),
    CopyFromBuffer { index: usize, len: usize },
    CopyToBuffer { index: usize, len: usize },
}

impl Call {
    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            Self::CreateModel(_) => "CreateModel",
            Self::DeleteModel(_) => "DeleteModel",
            Self::CreateOptions(_) => "CreateOptions",
            Self::SetNumThreads(..) => "SetNumThreads",
            Self::AddDelegate { .. } => "AddDelegate",
            Self::DeleteOptions(_) => "DeleteOptions",
            Self::CreateDelegate(..) => "CreateDelegate",
            Self::DeleteDelegate(_) => "DeleteDelegate",
            Self::CreateInterpreter(_) => "CreateInterpreter",
            Self::DeleteInterpreter(_) => "DeleteInterpreter",
            Self::AllocateTensors(_) => "AllocateTensors",
            Self::Invoke(_) => "Invoke",
            Self::CopyFromBuffer { .. } => "CopyFromBuffer",
            Self::CopyToBuffer { .. } => "CopyToBuffer",
        }
    }

    fn released(&self) -> Option<Handle> {
        match *self {
            Self::DeleteModel(handle)
            | Self::DeleteOptions(handle)
            | Self::DeleteDelegate(handle)
            | Self::DeleteInterpreter(handle) => Some(handle),
            _ => None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Side {
    Input,
    Output,
}

#[derive(Debug, Copy, Clone)]
pub(crate) struct FakeTensor {
    interpreter: Handle,
    side: Side,
    index: usize,
}

#[derive(Debug, Clone)]
struct TensorSpec {
    name: String,
    r#type: TensorType,
    dims: Vec<i32>,
    initial: Vec<u8>,
}

impl TensorSpec {
    fn new(name: &str, r#type: TensorType, dims: &[i32]) -> Self {
        let elements = dims.iter().map(|&d| d as usize).product::<usize>();
        let width = r#type.element_width().unwrap_or(1);
        Self {
            name: name.to_owned(),
            r#type,
            dims: dims.to_vec(),
            initial: vec![0; elements * width],
        }
    }
}

#[derive(Debug, Default)]
struct Buffers {
    inputs: Vec<Vec<u8>>,
    outputs: Vec<Vec<u8>>,
}

#[derive(Debug, Default)]
struct State {
    next_handle: u64,
    calls: Vec<Call>,
    live: BTreeSet<Handle>,
    inputs: Vec<TensorSpec>,
    outputs: Vec<TensorSpec>,
    interpreters: HashMap<Handle, Buffers>,
    fail_interpreter: bool,
    fail_allocate: bool,
    no_delegates: bool,
    fail_next_invoke: bool,
}

impl State {
    fn acquire(&mut self) -> Handle {
        self.next_handle += 1;
        let handle = Handle(self.next_handle);
        self.live.insert(handle);
        handle
    }

    fn release(&mut self, handle: Handle, call: Call) {
        assert!(self.live.remove(&handle), "double release of {:?}", handle);
        self.calls.push(call);
    }

    fn spec(&self, tensor: FakeTensor) -> &TensorSpec {
        match tensor.side {
            Side::Input => &self.inputs[tensor.index],
            Side::Output => &self.outputs[tensor.index],
        }
    }

    fn data(&mut self, tensor: FakeTensor) -> &mut Vec<u8> {
        let buffers = self
            .interpreters
            .get_mut(&tensor.interpreter)
            .expect("tensor outlived its interpreter");
        match tensor.side {
            Side::Input => &mut buffers.inputs[tensor.index],
            Side::Output => &mut buffers.outputs[tensor.index],
        }
    }
}

#[derive(Clone, Default)]
pub(crate) struct FakeRuntime {
    state: Rc<RefCell<State>>,
}

impl FakeRuntime {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Bytes the fake accepts as a model.
    pub(crate) fn valid_model() -> Vec<u8> {
        let mut model = vec![0x1c, 0, 0, 0];
        model.extend_from_slice(b"TFL3");
        model.extend_from_slice(&[0; 24]);
        model
    }

    pub(crate) fn with_input(self, name: &str, r#type: TensorType, dims: &[i32]) -> Self {
        self.state
            .borrow_mut()
            .inputs
            .push(TensorSpec::new(name, r#type, dims));
        self
    }

    /// A one-dimensional string input holding `payload`.
    pub(crate) fn with_string_input(self, name: &str, payload: &[u8]) -> Self {
        let mut spec = TensorSpec::new(name, TensorType::String, &[1]);
        spec.initial = payload.to_vec();
        self.state.borrow_mut().inputs.push(spec);
        self
    }

    pub(crate) fn with_output(self, name: &str, r#type: TensorType, dims: &[i32]) -> Self {
        self.state
            .borrow_mut()
            .outputs
            .push(TensorSpec::new(name, r#type, dims));
        self
    }

    /// Interpreter creation returns null.
    pub(crate) fn failing_interpreter(self) -> Self {
        self.state.borrow_mut().fail_interpreter = true;
        self
    }

    /// Tensor allocation reports an error.
    pub(crate) fn failing_allocation(self) -> Self {
        self.state.borrow_mut().fail_allocate = true;
        self
    }

    /// Delegate creation returns null.
    pub(crate) fn without_delegates(self) -> Self {
        self.state.borrow_mut().no_delegates = true;
        self
    }

    pub(crate) fn fail_next_invoke(&self) {
        self.state.borrow_mut().fail_next_invoke = true;
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub(crate) fn releases(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| call.released().is_some())
            .collect()
    }

    pub(crate) fn released_handles(&self) -> Vec<Handle> {
        self.calls().iter().filter_map(Call::released).collect()
    }

    pub(crate) fn live_handles(&self) -> usize {
        self.state.borrow().live.len()
    }

    fn create_delegate(&self, kind: DelegateKind) -> Result<Handle, Error> {
        let mut state = self.state.borrow_mut();
        if state.no_delegates {
            return Err(Error::CreateDelegate(kind));
        }
        let handle = state.acquire();
        state.calls.push(Call::CreateDelegate(handle, kind));
        Ok(handle)
    }

    fn tensor(&self, interpreter: Handle, side: Side, index: i32) -> Option<FakeTensor> {
        let state = self.state.borrow();
        let count = match side {
            Side::Input => state.inputs.len(),
            Side::Output => state.outputs.len(),
        };
        if index < 0 || index as usize >= count || !state.interpreters.contains_key(&interpreter)
        {
            return None;
        }
        Some(FakeTensor {
            interpreter,
            side,
            index: index as usize,
        })
    }
}

fn is_model(buffer: &[u8]) -> bool {
    buffer.get(4..8) == Some(&b"TFL3"[..])
}

impl Runtime for FakeRuntime {
    type Model = Handle;
    type Options = Handle;
    type Delegate = Handle;
    type Interpreter = Handle;
    type Tensor = FakeTensor;

    fn version(&self) -> String {
        "fake".to_owned()
    }

    fn create_model(&self, buffer: &[u8]) -> Option<Handle> {
        if !is_model(buffer) {
            return None;
        }
        let mut state = self.state.borrow_mut();
        let handle = state.acquire();
        state.calls.push(Call::CreateModel(handle));
        Some(handle)
    }

    fn create_model_from_file(&self, path: &CStr) -> Option<Handle> {
        let path = path.to_str().ok()?;
        let buffer = std::fs::read(path).ok()?;
        self.create_model(&buffer)
    }

    unsafe fn delete_model(&self, model: &mut Handle) {
        self.state
            .borrow_mut()
            .release(*model, Call::DeleteModel(*model));
    }

    fn create_options(&self) -> Option<Handle> {
        let mut state = self.state.borrow_mut();
        let handle = state.acquire();
        state.calls.push(Call::CreateOptions(handle));
        Some(handle)
    }

    unsafe fn set_num_threads(&self, options: &mut Handle, num_threads: i32) {
        self.state
            .borrow_mut()
            .calls
            .push(Call::SetNumThreads(*options, num_threads));
    }

    unsafe fn add_delegate(&self, options: &mut Handle, delegate: &mut Handle) {
        self.state.borrow_mut().calls.push(Call::AddDelegate {
            options: *options,
            delegate: *delegate,
        });
    }

    unsafe fn delete_options(&self, options: &mut Handle) {
        self.state
            .borrow_mut()
            .release(*options, Call::DeleteOptions(*options));
    }

    fn create_gpu_delegate(&self, _options: &GpuDelegateOptions) -> Result<Handle, Error> {
        self.create_delegate(DelegateKind::Gpu)
    }

    fn create_nnapi_delegate(&self, _options: &NnApiDelegateOptions) -> Result<Handle, Error> {
        self.create_delegate(DelegateKind::NnApi)
    }

    unsafe fn delete_delegate(&self, delegate: &mut Handle) {
        self.state
            .borrow_mut()
            .release(*delegate, Call::DeleteDelegate(*delegate));
    }

    unsafe fn create_interpreter(&self, model: &Handle, options: &Handle) -> Option<Handle> {
        let mut state = self.state.borrow_mut();
        assert!(state.live.contains(model) && state.live.contains(options));
        if state.fail_interpreter {
            return None;
        }
        let handle = state.acquire();
        let buffers = Buffers {
            inputs: state.inputs.iter().map(|spec| spec.initial.clone()).collect(),
            outputs: state.outputs.iter().map(|spec| spec.initial.clone()).collect(),
        };
        state.interpreters.insert(handle, buffers);
        state.calls.push(Call::CreateInterpreter(handle));
        Some(handle)
    }

    unsafe fn delete_interpreter(&self, interpreter: &mut Handle) {
        let mut state = self.state.borrow_mut();
        state.interpreters.remove(&*interpreter);
        state.release(*interpreter, Call::DeleteInterpreter(*interpreter));
    }

    unsafe fn allocate_tensors(&self, interpreter: &mut Handle) -> Status {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::AllocateTensors(*interpreter));
        if state.fail_allocate {
            Status::Error
        } else {
            Status::Ok
        }
    }

    unsafe fn invoke(&self, interpreter: &mut Handle) -> Status {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::Invoke(*interpreter));
        if std::mem::replace(&mut state.fail_next_invoke, false) {
            return Status::Error;
        }
        let buffers = match state.interpreters.get_mut(&*interpreter) {
            Some(buffers) => buffers,
            None => return Status::Error,
        };
        for (input, output) in buffers.inputs.iter().zip(buffers.outputs.iter_mut()) {
            if input.len() == output.len() {
                output.copy_from_slice(input);
            }
        }
        Status::Ok
    }

    unsafe fn input_tensor_count(&self, _interpreter: &Handle) -> i32 {
        self.state.borrow().inputs.len() as i32
    }

    unsafe fn output_tensor_count(&self, _interpreter: &Handle) -> i32 {
        self.state.borrow().outputs.len() as i32
    }

    unsafe fn input_tensor(&self, interpreter: &Handle, index: i32) -> Option<FakeTensor> {
        self.tensor(*interpreter, Side::Input, index)
    }

    unsafe fn output_tensor(&self, interpreter: &Handle, index: i32) -> Option<FakeTensor> {
        self.tensor(*interpreter, Side::Output, index)
    }

    unsafe fn tensor_type(&self, tensor: FakeTensor) -> TensorType {
        self.state.borrow().spec(tensor).r#type
    }

    unsafe fn tensor_name(&self, tensor: FakeTensor) -> String {
        self.state.borrow().spec(tensor).name.clone()
    }

    unsafe fn tensor_num_dims(&self, tensor: FakeTensor) -> i32 {
        self.state.borrow().spec(tensor).dims.len() as i32
    }

    unsafe fn tensor_dim(&self, tensor: FakeTensor, index: i32) -> i32 {
        self.state.borrow().spec(tensor).dims[index as usize]
    }

    unsafe fn tensor_byte_size(&self, tensor: FakeTensor) -> usize {
        self.state.borrow_mut().data(tensor).len()
    }

    unsafe fn tensor_string_len(&self, tensor: FakeTensor) -> usize {
        let mut state = self.state.borrow_mut();
        let data = state.data(tensor);
        data.iter().position(|&b| b == 0).unwrap_or(data.len())
    }

    unsafe fn copy_from_buffer(&self, tensor: FakeTensor, buffer: &[u8]) -> Status {
        let mut state = self.state.borrow_mut();
        let data = state.data(tensor);
        if tensor.side != Side::Input || data.len() != buffer.len() {
            return Status::Error;
        }
        data.copy_from_slice(buffer);
        state.calls.push(Call::CopyFromBuffer {
            index: tensor.index,
            len: buffer.len(),
        });
        Status::Ok
    }

    unsafe fn copy_to_buffer(&self, tensor: FakeTensor, buffer: &mut [u8]) -> Status {
        let mut state = self.state.borrow_mut();
        let data = state.data(tensor);
        if data.len() != buffer.len() {
            return Status::Error;
        }
        buffer.copy_from_slice(data);
        state.calls.push(Call::CopyToBuffer {
            index: tensor.index,
            len: buffer.len(),
        });
        Status::Ok
    }
}
