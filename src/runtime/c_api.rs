use super::{Runtime, Status};
use crate::{
    error::{check_null, check_null_mut, Error},
    tflite::{DelegateKind, GpuDelegateOptions, NnApiDelegateOptions, TensorType},
    tflite_sys as sys,
};
use num_traits::FromPrimitive;
use std::{ffi::CStr, os::raw::c_void};
use tracing::debug;

/// The TensorFlow Lite C library, linked at build time.
#[derive(Debug, Default, Clone, Copy)]
pub struct CApi;

pub struct ModelHandle(*mut sys::TfLiteModel);

pub struct OptionsHandle(*mut sys::TfLiteInterpreterOptions);

#[cfg_attr(not(any(feature = "gpu", feature = "nnapi")), allow(dead_code))]
pub struct DelegateHandle {
    delegate: *mut sys::TfLiteDelegate,
    kind: DelegateKind,
}

pub struct InterpreterHandle(*mut sys::TfLiteInterpreter);

#[derive(Clone, Copy)]
pub struct TensorHandle(*mut sys::TfLiteTensor);

fn to_status(status: sys::TfLiteStatus) -> Status {
    Status::from_i64(i64::from(status.0)).unwrap_or(Status::Error)
}

impl Runtime for CApi {
    type Model = ModelHandle;
    type Options = OptionsHandle;
    type Delegate = DelegateHandle;
    type Interpreter = InterpreterHandle;
    type Tensor = TensorHandle;

    fn version(&self) -> String {
        // SAFETY: TfLiteVersion returns a static NUL-terminated string
        unsafe { CStr::from_ptr(sys::TfLiteVersion()) }
            .to_string_lossy()
            .into_owned()
    }

    fn create_model(&self, buffer: &[u8]) -> Option<Self::Model> {
        // SAFETY: buffer is valid for buffer.len() bytes; the caller keeps it
        // alive for as long as the model
        check_null_mut(unsafe {
            sys::TfLiteModelCreate(buffer.as_ptr() as *const c_void, buffer.len())
        })
        .map(ModelHandle)
    }

    fn create_model_from_file(&self, path: &CStr) -> Option<Self::Model> {
        check_null_mut(unsafe { sys::TfLiteModelCreateFromFile(path.as_ptr()) }).map(ModelHandle)
    }

    unsafe fn delete_model(&self, model: &mut Self::Model) {
        sys::TfLiteModelDelete(model.0);
    }

    fn create_options(&self) -> Option<Self::Options> {
        check_null_mut(unsafe { sys::TfLiteInterpreterOptionsCreate() }).map(OptionsHandle)
    }

    unsafe fn set_num_threads(&self, options: &mut Self::Options, num_threads: i32) {
        sys::TfLiteInterpreterOptionsSetNumThreads(options.0, num_threads);
    }

    unsafe fn add_delegate(&self, options: &mut Self::Options, delegate: &mut Self::Delegate) {
        sys::TfLiteInterpreterOptionsAddDelegate(options.0, delegate.delegate as _);
    }

    unsafe fn delete_options(&self, options: &mut Self::Options) {
        sys::TfLiteInterpreterOptionsDelete(options.0);
    }

    #[cfg(feature = "gpu")]
    fn create_gpu_delegate(&self, options: &GpuDelegateOptions) -> Result<Self::Delegate, Error> {
        let [priority1, priority2, priority3] = options.inference_priorities;
        // SAFETY: returns a plain struct by value
        let mut raw = unsafe { sys::TfLiteGpuDelegateOptionsV2Default() };
        raw.is_precision_loss_allowed = i32::from(options.is_precision_loss_allowed);
        raw.inference_preference = options.inference_preference as i32;
        raw.inference_priority1 = priority1 as i32;
        raw.inference_priority2 = priority2 as i32;
        raw.inference_priority3 = priority3 as i32;
        raw.max_delegated_partitions = options.max_delegated_partitions;

        let delegate = check_null_mut(unsafe { sys::TfLiteGpuDelegateV2Create(&raw) })
            .ok_or(Error::CreateDelegate(DelegateKind::Gpu))?;
        Ok(DelegateHandle {
            delegate,
            kind: DelegateKind::Gpu,
        })
    }

    #[cfg(not(feature = "gpu"))]
    fn create_gpu_delegate(&self, _options: &GpuDelegateOptions) -> Result<Self::Delegate, Error> {
        tracing::warn!("built without the gpu feature");
        Err(Error::CreateDelegate(DelegateKind::Gpu))
    }

    #[cfg(feature = "nnapi")]
    fn create_nnapi_delegate(
        &self,
        options: &NnApiDelegateOptions,
    ) -> Result<Self::Delegate, Error> {
        use std::{ffi::CString, os::raw::c_char};

        fn to_c_string(
            name: &'static str,
            value: Option<&str>,
        ) -> Result<Option<CString>, Error> {
            value
                .map(|value| CString::new(value).map_err(|e| Error::OptionToCString(name, e)))
                .transpose()
        }

        fn as_ptr(value: &Option<CString>) -> *const c_char {
            value.as_ref().map_or(std::ptr::null(), |value| value.as_ptr())
        }

        let accelerator_name =
            to_c_string("accelerator_name", options.accelerator_name.as_deref())?;
        let cache_dir = options
            .cache_dir
            .as_ref()
            .map(|dir| dir.to_string_lossy().into_owned());
        let cache_dir = to_c_string("cache_dir", cache_dir.as_deref())?;
        let model_token = to_c_string("model_token", options.model_token.as_deref())?;

        // SAFETY: returns a plain struct by value
        let mut raw = unsafe { sys::TfLiteNnapiDelegateOptionsDefault() };
        raw.execution_preference = sys::TfLiteNnapiDelegateOptions_ExecutionPreference(
            options.execution_preference as _,
        );
        raw.accelerator_name = as_ptr(&accelerator_name);
        raw.cache_dir = as_ptr(&cache_dir);
        raw.model_token = as_ptr(&model_token);
        raw.disallow_nnapi_cpu = i32::from(options.disallow_nnapi_cpu);
        raw.allow_fp16 = i32::from(options.allow_fp16);
        raw.max_number_delegated_partitions = options.max_number_delegated_partitions;

        // SAFETY: the strings referenced by raw live until the end of this
        // function; the delegate copies them during creation
        let delegate = check_null_mut(unsafe { sys::TfLiteNnapiDelegateCreate(&raw) })
            .ok_or(Error::CreateDelegate(DelegateKind::NnApi))?;
        Ok(DelegateHandle {
            delegate,
            kind: DelegateKind::NnApi,
        })
    }

    #[cfg(not(feature = "nnapi"))]
    fn create_nnapi_delegate(
        &self,
        _options: &NnApiDelegateOptions,
    ) -> Result<Self::Delegate, Error> {
        tracing::warn!("built without the nnapi feature");
        Err(Error::CreateDelegate(DelegateKind::NnApi))
    }

    unsafe fn delete_delegate(&self, delegate: &mut Self::Delegate) {
        match delegate.kind {
            #[cfg(feature = "gpu")]
            DelegateKind::Gpu => sys::TfLiteGpuDelegateV2Delete(delegate.delegate),
            #[cfg(feature = "nnapi")]
            DelegateKind::NnApi => sys::TfLiteNnapiDelegateDelete(delegate.delegate),
            #[allow(unreachable_patterns)]
            _ => {}
        }
    }

    unsafe fn create_interpreter(
        &self,
        model: &Self::Model,
        options: &Self::Options,
    ) -> Option<Self::Interpreter> {
        check_null_mut(sys::TfLiteInterpreterCreate(model.0, options.0)).map(InterpreterHandle)
    }

    unsafe fn delete_interpreter(&self, interpreter: &mut Self::Interpreter) {
        sys::TfLiteInterpreterDelete(interpreter.0);
    }

    unsafe fn allocate_tensors(&self, interpreter: &mut Self::Interpreter) -> Status {
        to_status(sys::TfLiteInterpreterAllocateTensors(interpreter.0))
    }

    unsafe fn invoke(&self, interpreter: &mut Self::Interpreter) -> Status {
        to_status(sys::TfLiteInterpreterInvoke(interpreter.0))
    }

    unsafe fn input_tensor_count(&self, interpreter: &Self::Interpreter) -> i32 {
        sys::TfLiteInterpreterGetInputTensorCount(interpreter.0)
    }

    unsafe fn output_tensor_count(&self, interpreter: &Self::Interpreter) -> i32 {
        sys::TfLiteInterpreterGetOutputTensorCount(interpreter.0)
    }

    unsafe fn input_tensor(
        &self,
        interpreter: &Self::Interpreter,
        index: i32,
    ) -> Option<Self::Tensor> {
        check_null_mut(sys::TfLiteInterpreterGetInputTensor(interpreter.0, index))
            .map(TensorHandle)
    }

    unsafe fn output_tensor(
        &self,
        interpreter: &Self::Interpreter,
        index: i32,
    ) -> Option<Self::Tensor> {
        check_null(sys::TfLiteInterpreterGetOutputTensor(interpreter.0, index))
            .map(|tensor| TensorHandle(tensor as *mut _))
    }

    unsafe fn tensor_type(&self, tensor: Self::Tensor) -> TensorType {
        let raw = sys::TfLiteTensorType(tensor.0);
        TensorType::from_i64(i64::from(raw.0)).unwrap_or_else(|| {
            debug!(message = "unknown tensor type", raw = raw.0);
            TensorType::NoType
        })
    }

    unsafe fn tensor_name(&self, tensor: Self::Tensor) -> String {
        check_null(sys::TfLiteTensorName(tensor.0)).map_or_else(String::new, |name| {
            CStr::from_ptr(name).to_string_lossy().into_owned()
        })
    }

    unsafe fn tensor_num_dims(&self, tensor: Self::Tensor) -> i32 {
        sys::TfLiteTensorNumDims(tensor.0)
    }

    unsafe fn tensor_dim(&self, tensor: Self::Tensor, index: i32) -> i32 {
        sys::TfLiteTensorDim(tensor.0, index)
    }

    unsafe fn tensor_byte_size(&self, tensor: Self::Tensor) -> usize {
        sys::TfLiteTensorByteSize(tensor.0)
    }

    unsafe fn tensor_string_len(&self, tensor: Self::Tensor) -> usize {
        let byte_size = sys::TfLiteTensorByteSize(tensor.0);
        check_null_mut(sys::TfLiteTensorData(tensor.0)).map_or(0, |data| {
            // SAFETY: the tensor owns byte_size bytes at data; the scan stays
            // inside them when the payload isn't NUL-terminated
            let bytes = std::slice::from_raw_parts(data as *const u8, byte_size);
            bytes.iter().position(|&b| b == 0).unwrap_or(byte_size)
        })
    }

    unsafe fn copy_from_buffer(&self, tensor: Self::Tensor, buffer: &[u8]) -> Status {
        to_status(sys::TfLiteTensorCopyFromBuffer(
            tensor.0,
            buffer.as_ptr() as *const c_void,
            buffer.len(),
        ))
    }

    unsafe fn copy_to_buffer(&self, tensor: Self::Tensor, buffer: &mut [u8]) -> Status {
        to_status(sys::TfLiteTensorCopyToBuffer(
            tensor.0,
            buffer.as_mut_ptr() as *mut c_void,
            buffer.len(),
        ))
    }
}
