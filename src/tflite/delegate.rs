use crate::{
    error::Error,
    runtime::Runtime,
    tflite::{GpuDelegateOptions, NnApiDelegateOptions},
};
use tracing::info;

/// The hardware backends a delegate can target.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DelegateKind {
    Gpu,
    NnApi,
}

impl std::fmt::Display for DelegateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Gpu => "GPU",
            Self::NnApi => "NNAPI",
        })
    }
}

/// The options record a delegate was created from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DelegateConfig {
    Gpu(GpuDelegateOptions),
    NnApi(NnApiDelegateOptions),
}

impl DelegateConfig {
    pub fn kind(&self) -> DelegateKind {
        match self {
            Self::Gpu(_) => DelegateKind::Gpu,
            Self::NnApi(_) => DelegateKind::NnApi,
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

/// A safe wrapper around Tensorflow Lite delegates.
pub(crate) struct Delegate<R: Runtime> {
    runtime: R,
    delegate: R::Delegate,
    config: DelegateConfig,
}

impl<R: Runtime> Delegate<R> {
    pub(crate) fn new(runtime: &R, config: DelegateConfig) -> Result<Self, Error> {
        let delegate = match &config {
            DelegateConfig::Gpu(options) => runtime.create_gpu_delegate(options)?,
            DelegateConfig::NnApi(options) => runtime.create_nnapi_delegate(options)?,
        };
        info!(message = "created delegate", kind = %config.kind());
        Ok(Self {
            runtime: runtime.clone(),
            delegate,
            config,
        })
    }

    pub(crate) fn kind(&self) -> DelegateKind {
        self.config.kind()
    }

    pub(crate) fn config(&self) -> &DelegateConfig {
        &self.config
    }

    pub(super) fn as_mut_handle(&mut self) -> &mut R::Delegate {
        &mut self.delegate
    }
}

impl<R: Runtime> Drop for Delegate<R> {
    fn drop(&mut self) {
        // SAFETY: self.delegate came from self.runtime and is released only here
        unsafe { self.runtime.delete_delegate(&mut self.delegate) }
    }
}
