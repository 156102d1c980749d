use anyhow::{anyhow, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::{
    fmt::Display,
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use structopt::StructOpt;
use tflite_engine::{
    CApi, Engine, ExecutionPreference, GpuDelegateOptions, GpuInferencePriority,
    GpuInferenceUsage, NnApiDelegateOptions, Runtime, TensorType,
};
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;

/// Number of leading elements shown for each output.
const PREVIEW_LEN: usize = 8;

#[derive(structopt::StructOpt)]
struct Opt {
    /// Path to a Tensorflow Lite model.
    #[structopt(required = true)]
    model: PathBuf,

    /// Number of threads used by the CPU kernels.
    #[structopt(short, long)]
    threads: Option<i32>,

    /// Attach the GPU delegate.
    #[structopt(long)]
    gpu: bool,

    /// Allow the GPU delegate to compute in float16.
    #[structopt(long)]
    gpu_precision_loss: bool,

    /// fast-single-answer, sustained-speed or balanced.
    #[structopt(long, default_value = "fast-single-answer")]
    gpu_preference: GpuInferenceUsage,

    /// Up to three of auto, max-precision, min-latency, min-memory.
    #[structopt(long, use_delimiter = true)]
    gpu_priorities: Vec<GpuInferencePriority>,

    /// Attach the NNAPI delegate.
    #[structopt(long)]
    nnapi: bool,

    /// undefined, low-power, fast-single-answer or sustained-speed.
    #[structopt(long, default_value = "undefined")]
    nnapi_preference: ExecutionPreference,

    #[structopt(long)]
    nnapi_accelerator: Option<String>,

    #[structopt(long)]
    nnapi_cache_dir: Option<PathBuf>,

    #[structopt(long)]
    nnapi_model_token: Option<String>,

    #[structopt(long)]
    nnapi_disallow_cpu: bool,

    #[structopt(long)]
    nnapi_allow_fp16: bool,

    /// Raw input files, one per input tensor in order. Missing inputs are
    /// zero-filled.
    #[structopt(short, long = "input")]
    inputs: Vec<PathBuf>,

    /// Number of invocations.
    #[structopt(short, long, default_value = "1")]
    repeat: u32,

    /// Write the raw bytes of each output to this directory.
    #[structopt(short, long)]
    dump_dir: Option<PathBuf>,

    #[structopt(short, long, default_value = "info", env = "RUST_LOG")]
    log_level: tracing_subscriber::filter::EnvFilter,

    #[structopt(short, long)]
    show_progress: bool,
}

impl Opt {
    fn gpu_options(&self) -> Result<GpuDelegateOptions> {
        let mut options = GpuDelegateOptions {
            is_precision_loss_allowed: self.gpu_precision_loss,
            inference_preference: self.gpu_preference,
            ..Default::default()
        };
        if self.gpu_priorities.len() > options.inference_priorities.len() {
            return Err(anyhow!(
                "at most {} GPU priorities can be given",
                options.inference_priorities.len()
            ));
        }
        if !self.gpu_priorities.is_empty() {
            options.inference_priorities = [GpuInferencePriority::Auto; 3];
            options.inference_priorities[..self.gpu_priorities.len()]
                .copy_from_slice(&self.gpu_priorities);
        }
        Ok(options)
    }

    fn nnapi_options(&self) -> NnApiDelegateOptions {
        NnApiDelegateOptions {
            execution_preference: self.nnapi_preference,
            accelerator_name: self.nnapi_accelerator.clone(),
            cache_dir: self.nnapi_cache_dir.clone(),
            model_token: self.nnapi_model_token.clone(),
            disallow_nnapi_cpu: self.nnapi_disallow_cpu,
            allow_fp16: self.nnapi_allow_fp16,
            ..Default::default()
        }
    }
}

fn join_preview<T: Display>(values: &[T]) -> String {
    let mut preview = values
        .iter()
        .take(PREVIEW_LEN)
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    if values.len() > PREVIEW_LEN {
        preview.push_str(", ...");
    }
    format!("[{}]", preview)
}

fn preview(engine: &Engine<CApi>, index: usize) -> Result<String> {
    let r#type = engine.output_tensor(index)?.r#type();
    Ok(match r#type {
        TensorType::Float32 => join_preview(&engine.output::<f32>(index)?),
        TensorType::Float16 => join_preview(&engine.output::<half::f16>(index)?),
        TensorType::Float64 => join_preview(&engine.output::<f64>(index)?),
        TensorType::Int8 => join_preview(&engine.output::<i8>(index)?),
        TensorType::Int16 => join_preview(&engine.output::<i16>(index)?),
        TensorType::Int32 => join_preview(&engine.output::<i32>(index)?),
        TensorType::Int64 => join_preview(&engine.output::<i64>(index)?),
        TensorType::UInt16 => join_preview(&engine.output::<u16>(index)?),
        TensorType::UInt32 => join_preview(&engine.output::<u32>(index)?),
        TensorType::UInt64 => join_preview(&engine.output::<u64>(index)?),
        _ => join_preview(&engine.output::<u8>(index)?),
    })
}

/// Where input `index` came from, for error messages.
fn input_source(paths: &[PathBuf], index: usize) -> String {
    paths
        .get(index)
        .map_or_else(|| "zeros".to_owned(), |path| path.display().to_string())
}

fn load_inputs(engine: &Engine<CApi>, paths: &[PathBuf]) -> Result<Vec<Vec<u8>>> {
    let count = engine.input_tensor_count()?;
    if paths.len() > count {
        return Err(anyhow!(
            "{} input files given for a model with {} inputs",
            paths.len(),
            count
        ));
    }

    (0..count)
        .map(|index| match paths.get(index) {
            Some(path) => std::fs::read(path)
                .with_context(|| format!("failed to read input file {}", path.display())),
            None => {
                let byte_size = engine.input_tensor(index)?.byte_size();
                info!(message = "zero-filling input", index, byte_size);
                Ok(vec![0; byte_size])
            }
        })
        .collect()
}

fn main() -> Result<()> {
    let opt = Opt::from_args();
    let gpu_options = opt.gpu_options()?;
    let nnapi_options = opt.nnapi_options();

    tracing::subscriber::set_global_default(
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer())
            .with(opt.log_level),
    )?;

    let running = Arc::new(AtomicBool::new(true));
    let running_ctrl_c = running.clone();

    ctrlc::set_handler(move || {
        running_ctrl_c.store(false, Ordering::SeqCst);
    })
    .context("failed setting Ctrl-C handler")?;

    let mut engine = Engine::from_file(CApi, &opt.model);
    println!("TensorFlow Lite {}", engine.runtime().version());
    if !engine.is_loaded() {
        return Err(anyhow!("failed to load model {}", opt.model.display()));
    }

    if let Some(threads) = opt.threads {
        engine
            .set_num_threads(threads)
            .context("failed setting number of threads")?;
    }
    if opt.gpu {
        engine
            .set_gpu_delegate(gpu_options)
            .context("failed attaching GPU delegate")?;
    }
    if opt.nnapi {
        engine
            .set_nnapi_delegate(nnapi_options)
            .context("failed attaching NNAPI delegate")?;
    }

    engine
        .build_interpreter()
        .context("failed building interpreter")?;
    print!("{}", engine.summary());
    println!("{}", engine.summarize_options());

    let inputs = load_inputs(&engine, &opt.inputs)?;

    let pb_invocations = if opt.show_progress {
        Some(
            ProgressBar::new_spinner().with_style(
                ProgressStyle::default_spinner()
                    .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
                    .template("{prefix:.bold.dim} {spinner} {wide_msg}"),
            ),
        )
    } else {
        None
    };

    for iteration in 0..opt.repeat {
        if !running.load(Ordering::SeqCst) {
            warn!(message = "interrupted", completed = iteration);
            break;
        }

        for (index, input) in inputs.iter().enumerate() {
            let source = input_source(&opt.inputs, index);
            engine
                .set_input(input)
                .with_context(|| format!("failed setting input {} from {}", index, source))?;
        }
        let elapsed = engine
            .invoke_timed()
            .with_context(|| format!("invocation {} failed", iteration))?;

        if let Some(pb) = pb_invocations.as_ref() {
            pb.set_message(format!("invocation {}: {:?}", iteration, elapsed));
            pb.inc(1);
        }
    }

    if let Some(pb) = pb_invocations {
        pb.finish_and_clear();
    }

    let timing = engine.timing();
    match timing.mean() {
        Some(mean) => println!(
            "Average inference time over {} runs: {:?}",
            timing.invocations, mean
        ),
        None => return Err(anyhow!("no invocation completed")),
    }

    if let Some(dump_dir) = opt.dump_dir.as_ref() {
        std::fs::create_dir_all(dump_dir)
            .with_context(|| format!("failed to create {}", dump_dir.display()))?;
    }

    for index in 0..engine.output_tensor_count()? {
        let tensor = engine.output_tensor(index)?;
        println!(
            "Output #{} {} {} {}: {}",
            index,
            tensor.name(),
            tensor.r#type(),
            tensor.shape_string()?,
            preview(&engine, index)?
        );

        if let Some(dump_dir) = opt.dump_dir.as_ref() {
            let path = dump_dir.join(format!("output_{}.bin", index));
            std::fs::write(&path, engine.output::<u8>(index)?)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{input_source, join_preview};
    use std::path::PathBuf;

    #[test]
    fn input_sources() {
        let paths = vec![PathBuf::from("/data/image.raw")];
        assert_eq!(input_source(&paths, 0), "/data/image.raw");
        assert_eq!(input_source(&paths, 1), "zeros");
    }

    #[test]
    fn preview_is_truncated() {
        assert_eq!(join_preview(&[1, 2, 3]), "[1, 2, 3]");
        assert_eq!(
            join_preview(&(0..10).collect::<Vec<_>>()),
            "[0, 1, 2, 3, 4, 5, 6, 7, ...]"
        );
    }
}
