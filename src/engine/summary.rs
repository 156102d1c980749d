//! Human-readable descriptions of an engine's tensors and configuration.

use super::Engine;
use crate::{
    error::Error,
    runtime::Runtime,
    tflite::{DelegateConfig, GpuDelegateOptions, NnApiDelegateOptions, Tensor},
};

fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

fn tensor_line<R: Runtime>(tensor: &Tensor<'_, R>) -> String {
    let shape = tensor
        .shape_string()
        .unwrap_or_else(|error| format!("<{}>", error));
    format!(
        "  #{} {} {} {} {}\n",
        tensor.index(),
        tensor.name(),
        tensor.byte_size(),
        tensor.r#type(),
        shape
    )
}

fn tensor_section<'a, R, F>(title: &str, count: Result<usize, Error>, get: F) -> String
where
    R: Runtime + 'a,
    F: Fn(usize) -> Result<Tensor<'a, R>, Error>,
{
    let mut log = format!(" {}\n Number / Name / Byte / Type / Size\n", title);
    match count {
        Ok(count) => {
            for index in 0..count {
                match get(index) {
                    Ok(tensor) => log.push_str(&tensor_line(&tensor)),
                    Err(error) => log.push_str(&format!("  #{} <{}>\n", index, error)),
                }
            }
        }
        Err(error) => log.push_str(&format!("  <{}>\n", error)),
    }
    log.push('\n');
    log
}

fn gpu_section(options: &GpuDelegateOptions) -> String {
    let [first, second, third] = options.inference_priorities;
    format!(
        "\nGPU delegate Options:\n    \
         Precision Loss Allowed: {}\n    \
         Inference Preference: {}\n    \
         Inference Priority: {} {} {}",
        yes_no(options.is_precision_loss_allowed),
        options.inference_preference.label(),
        first.label(),
        second.label(),
        third.label(),
    )
}

fn nnapi_section(options: &NnApiDelegateOptions) -> String {
    let cache_dir = options
        .cache_dir
        .as_ref()
        .map(|dir| dir.display().to_string());
    format!(
        "\nNNAPI delegate Options:\n    \
         Execution Preference: {}\n    \
         Accelerator Name: {}\n    \
         Cache Dir: {}\n    \
         Model Token: {}\n    \
         Disallow NNAPI CPU: {}\n    \
         Max Number Delegate Partition: {}",
        options.execution_preference.label(),
        or_dash(options.accelerator_name.as_deref()),
        or_dash(cache_dir.as_deref()),
        or_dash(options.model_token.as_deref()),
        yes_no(options.disallow_nnapi_cpu),
        options.max_number_delegated_partitions,
    )
}

impl<R: Runtime> Engine<R> {
    /// Shapes and types of every input and output tensor, one per line.
    ///
    /// Empty when no interpreter has been built.
    pub fn summary(&self) -> String {
        let interpreter = match self.interpreter.as_ref() {
            Some(interpreter) => interpreter,
            None => return String::new(),
        };

        let mut log = tensor_section(
            "Input Tensor",
            interpreter.get_input_tensor_count(),
            |index| interpreter.get_input_tensor_ref(index),
        );
        log.push_str(&tensor_section(
            "Output Tensor",
            interpreter.get_output_tensor_count(),
            |index| interpreter.get_output_tensor(index),
        ));
        log
    }

    /// Thread count and attached delegate configuration.
    pub fn summarize_options(&self) -> String {
        let num_threads = self.options.as_ref().and_then(|options| options.num_threads());
        let num_delegates = self
            .options
            .as_ref()
            .map_or(0, |options| options.num_delegates());
        let configs = || self.delegates.iter().map(|delegate| delegate.config());
        let use_nnapi = configs().any(|config| matches!(config, DelegateConfig::NnApi(_)));

        let mut log = format!(
            "Num Threads: {}\nDelegates: {}\nUse NNAPI: {}",
            num_threads.map_or_else(|| "default".to_owned(), |n| n.to_string()),
            num_delegates,
            yes_no(use_nnapi),
        );

        for config in configs() {
            log.push_str(&match config {
                DelegateConfig::Gpu(options) => gpu_section(options),
                DelegateConfig::NnApi(options) => nnapi_section(options),
            });
        }
        log
    }
}
