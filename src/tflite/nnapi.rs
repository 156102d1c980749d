use super::delegate::ParseEnumError;
use num_derive::FromPrimitive;
use std::{path::PathBuf, str::FromStr};

/// Power/performance trade-off requested from NNAPI
/// (`TfLiteNnapiDelegateOptions::ExecutionPreference`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, FromPrimitive)]
pub enum ExecutionPreference {
    Undefined = -1,
    LowPower = 0,
    FastSingleAnswer = 1,
    SustainedSpeed = 2,
}

impl ExecutionPreference {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Undefined => "Undefined",
            Self::LowPower => "LowPower",
            Self::FastSingleAnswer => "FastSingleAnswer",
            Self::SustainedSpeed => "SustainedSpeed",
        }
    }
}

impl FromStr for ExecutionPreference {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "undefined" => Ok(Self::Undefined),
            "low-power" => Ok(Self::LowPower),
            "fast-single-answer" => Ok(Self::FastSingleAnswer),
            "sustained-speed" => Ok(Self::SustainedSpeed),
            _ => Err(ParseEnumError::new("NNAPI execution preference", s)),
        }
    }
}

/// Configuration for the NNAPI delegate (`TfLiteNnapiDelegateOptions`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NnApiDelegateOptions {
    pub execution_preference: ExecutionPreference,
    /// Run only on the named accelerator, as reported by NNAPI.
    pub accelerator_name: Option<String>,
    /// Directory for compilation caching. Needs `model_token` as well.
    pub cache_dir: Option<PathBuf>,
    pub model_token: Option<String>,
    pub disallow_nnapi_cpu: bool,
    pub allow_fp16: bool,
    /// Values <= 0 mean no limit.
    pub max_number_delegated_partitions: i32,
}

impl Default for NnApiDelegateOptions {
    fn default() -> Self {
        Self {
            execution_preference: ExecutionPreference::Undefined,
            accelerator_name: None,
            cache_dir: None,
            model_token: None,
            disallow_nnapi_cpu: false,
            allow_fp16: false,
            max_number_delegated_partitions: 3,
        }
    }
}
