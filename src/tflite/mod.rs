mod model;
pub(crate) use model::Model;

mod tensor;
pub use tensor::{Tensor, TensorMut};

mod types;
pub use types::TensorType;

mod delegate;
pub(crate) use delegate::Delegate;
pub use delegate::{DelegateConfig, DelegateKind, ParseEnumError};

mod gpu;
pub use gpu::{GpuDelegateOptions, GpuInferencePriority, GpuInferenceUsage};

mod nnapi;
pub use nnapi::{ExecutionPreference, NnApiDelegateOptions};

mod interpreter;
pub(crate) use interpreter::Interpreter;

mod options;
pub(crate) use options::Options;
