use super::delegate::ParseEnumError;
use num_derive::FromPrimitive;
use std::str::FromStr;

/// What the GPU delegate should optimise compilation for
/// (`TfLiteGpuInferenceUsage`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, FromPrimitive)]
pub enum GpuInferenceUsage {
    FastSingleAnswer = 0,
    SustainedSpeed = 1,
    Balanced = 2,
}

impl GpuInferenceUsage {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::FastSingleAnswer => "Fast Single Answer",
            Self::SustainedSpeed => "Sustained Speed",
            Self::Balanced => "Balanced",
        }
    }
}

impl FromStr for GpuInferenceUsage {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fast-single-answer" => Ok(Self::FastSingleAnswer),
            "sustained-speed" => Ok(Self::SustainedSpeed),
            "balanced" => Ok(Self::Balanced),
            _ => Err(ParseEnumError::new("GPU inference preference", s)),
        }
    }
}

/// Ordering criteria for the GPU delegate (`TfLiteGpuInferencePriority`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, FromPrimitive)]
pub enum GpuInferencePriority {
    Auto = 0,
    MaxPrecision = 1,
    MinLatency = 2,
    MinMemoryUsage = 3,
}

impl GpuInferencePriority {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Auto => "Auto",
            Self::MaxPrecision => "MaxPrecision",
            Self::MinLatency => "MinLatency",
            Self::MinMemoryUsage => "MinMemory",
        }
    }
}

impl FromStr for GpuInferencePriority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "max-precision" => Ok(Self::MaxPrecision),
            "min-latency" => Ok(Self::MinLatency),
            "min-memory" => Ok(Self::MinMemoryUsage),
            _ => Err(ParseEnumError::new("GPU inference priority", s)),
        }
    }
}

/// Configuration for the GPU delegate (`TfLiteGpuDelegateOptionsV2`).
///
/// The defaults are those of `TfLiteGpuDelegateOptionsV2Default`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuDelegateOptions {
    /// Allow computing in float16 where the model is float32.
    pub is_precision_loss_allowed: bool,
    pub inference_preference: GpuInferenceUsage,
    /// Priorities in decreasing order of importance.
    pub inference_priorities: [GpuInferencePriority; 3],
    pub max_delegated_partitions: i32,
}

impl Default for GpuDelegateOptions {
    fn default() -> Self {
        Self {
            is_precision_loss_allowed: false,
            inference_preference: GpuInferenceUsage::FastSingleAnswer,
            inference_priorities: [
                GpuInferencePriority::MaxPrecision,
                GpuInferencePriority::Auto,
                GpuInferencePriority::Auto,
            ],
            max_delegated_partitions: 1,
        }
    }
}
