//! Estimate Subcommands
//!
//! One argument struct per workload mode. Flags build the configuration;
//! `--config FILE` replaces them with a JSON workload of the same mode.

use anyhow::{bail, Context, Result};
use clap::Args;
use std::fs;
use std::path::{Path, PathBuf};

use vram_core::{
    FineTuningConfig, FineTuningMethod, GpuCatalog, GpuDescriptor, GrpoConfig, InferenceConfig, ModelCatalog,
    ModelDescriptor, MultimodalConfig, Optimizer, Precision, Quantization, TrainingConfig, WorkloadConfig,
};

use crate::app_config::AppConfig;
use crate::report::EstimateReport;

/// Which model the estimate is for.
#[derive(Args, Debug, Clone, Default)]
pub struct ModelArgs {
    /// Catalog model id (see `models`)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Custom model size in billions of parameters
    #[arg(long, conflicts_with = "model")]
    pub params: Option<f64>,
}

impl ModelArgs {
    pub fn resolve(&self) -> Result<Option<ModelDescriptor>> {
        if let Some(id) = &self.model {
            let model = ModelCatalog::builtin()
                .get_by_id(id)
                .with_context(|| "Use `vram_calc models` to list known ids")?;
            return Ok(Some(model.clone()));
        }
        Ok(self.params.map(ModelDescriptor::custom))
    }
}

/// Flags shared by every estimate subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Load the workload from a JSON file instead of flags
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Emit one JSON document
    #[arg(long)]
    pub json: bool,

    /// GPU id the advisor checks the estimate against
    #[arg(long)]
    pub gpu: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct InferenceArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    #[arg(long, default_value_t = Precision::Fp16)]
    pub precision: Precision,

    #[arg(long, default_value_t = Quantization::None)]
    pub quantization: Quantization,

    #[arg(short, long, default_value_t = 1)]
    pub batch_size: u32,

    #[arg(short, long, default_value_t = 2048)]
    pub seq_len: u32,

    /// Fraction of the full KV cache kept resident
    #[arg(long, default_value_t = 1.0)]
    pub kv_cache_ratio: f64,

    #[command(flatten)]
    pub output: OutputArgs,
}

impl InferenceArgs {
    pub fn to_config(&self) -> WorkloadConfig {
        WorkloadConfig::Inference(InferenceConfig {
            precision: self.precision,
            quantization: self.quantization,
            batch_size: self.batch_size,
            sequence_length: self.seq_len,
            kv_cache_ratio: self.kv_cache_ratio,
        })
    }
}

#[derive(Args, Debug, Clone)]
pub struct TrainingArgs {
    // Size and dimensions come from the catalog entry when given.
    #[command(flatten)]
    pub model: ModelArgs,

    #[arg(long)]
    pub hidden_size: Option<u32>,

    #[arg(long)]
    pub num_layers: Option<u32>,

    #[arg(long, default_value_t = Precision::Fp16)]
    pub precision: Precision,

    #[arg(short, long, default_value_t = 4)]
    pub batch_size: u32,

    #[arg(short, long, default_value_t = 2048)]
    pub seq_len: u32,

    #[arg(long, default_value_t = Optimizer::AdamW)]
    pub optimizer: Optimizer,

    #[arg(long)]
    pub gradient_checkpointing: bool,

    /// Disable FP16 activations for FP32 runs
    #[arg(long)]
    pub no_mixed_precision: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

impl TrainingArgs {
    pub fn to_config(&self, model: Option<&ModelDescriptor>) -> WorkloadConfig {
        let config = TrainingConfig {
            hidden_size: self.hidden_size,
            num_layers: self.num_layers,
            precision: self.precision,
            batch_size: self.batch_size,
            sequence_length: self.seq_len,
            optimizer: self.optimizer,
            gradient_checkpointing: self.gradient_checkpointing,
            mixed_precision: !self.no_mixed_precision,
            ..Default::default()
        };
        let config = match model {
            Some(m) => config.with_model(m),
            None => config,
        };
        WorkloadConfig::Training(config)
    }
}

#[derive(Args, Debug, Clone)]
pub struct FineTuneArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    #[arg(long, default_value_t = FineTuningMethod::Lora)]
    pub method: FineTuningMethod,

    #[arg(long, default_value_t = Precision::Fp16)]
    pub precision: Precision,

    /// Base weight quantization (QLoRA)
    #[arg(long, default_value_t = Quantization::None)]
    pub quantization: Quantization,

    #[arg(short, long, default_value_t = 4)]
    pub batch_size: u32,

    #[arg(short, long, default_value_t = 2048)]
    pub seq_len: u32,

    #[arg(long, default_value_t = 16)]
    pub lora_rank: u32,

    #[arg(long, default_value_t = 32)]
    pub lora_alpha: u32,

    #[command(flatten)]
    pub output: OutputArgs,
}

impl FineTuneArgs {
    pub fn to_config(&self) -> WorkloadConfig {
        WorkloadConfig::FineTuning(FineTuningConfig {
            precision: self.precision,
            batch_size: self.batch_size,
            sequence_length: self.seq_len,
            method: self.method,
            lora_rank: self.lora_rank,
            lora_alpha: self.lora_alpha,
            quantization: self.quantization,
        })
    }
}

#[derive(Args, Debug, Clone)]
pub struct GrpoArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    #[arg(long, default_value_t = Precision::Fp16)]
    pub precision: Precision,

    #[arg(long, default_value_t = Quantization::Int4)]
    pub quantization: Quantization,

    #[arg(short, long, default_value_t = 1)]
    pub batch_size: u32,

    #[arg(short, long, default_value_t = 1024)]
    pub seq_len: u32,

    /// Completions sampled per prompt
    #[arg(short = 'k', long, default_value_t = 8)]
    pub num_generations: u32,

    /// Keep optimizer moments in 32-bit instead of 8-bit
    #[arg(long)]
    pub full_precision_optimizer: bool,

    #[arg(long, default_value_t = 4)]
    pub gradient_accumulation_steps: u32,

    #[arg(long, default_value_t = 16)]
    pub lora_rank: u32,

    #[command(flatten)]
    pub output: OutputArgs,
}

impl GrpoArgs {
    pub fn to_config(&self) -> WorkloadConfig {
        WorkloadConfig::Grpo(GrpoConfig {
            precision: self.precision,
            batch_size: self.batch_size,
            sequence_length: self.seq_len,
            num_generations: self.num_generations,
            use_8bit_optimizer: !self.full_precision_optimizer,
            gradient_accumulation_steps: self.gradient_accumulation_steps,
            quantization: self.quantization,
            lora_rank: self.lora_rank,
        })
    }
}

#[derive(Args, Debug, Clone)]
pub struct MultimodalArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    #[arg(long, default_value_t = Precision::Fp16)]
    pub precision: Precision,

    /// Encoder precision (vision, audio and video)
    #[arg(long, default_value_t = Precision::Fp16)]
    pub encoder_precision: Precision,

    #[arg(long, default_value_t = Quantization::None)]
    pub quantization: Quantization,

    #[arg(short, long, default_value_t = 1)]
    pub batch_size: u32,

    /// Text tokens
    #[arg(short, long, default_value_t = 512)]
    pub seq_len: u32,

    #[arg(long, default_value_t = 336)]
    pub image_resolution: u32,

    #[arg(long, default_value_t = 14)]
    pub patch_size: u32,

    #[arg(long, default_value_t = 1)]
    pub num_images: u32,

    /// Audio window in seconds (0 disables audio)
    #[arg(long, default_value_t = 0.0)]
    pub audio_seconds: f64,

    /// Video length in seconds (0 disables video)
    #[arg(long, default_value_t = 0.0)]
    pub video_seconds: f64,

    #[arg(long, default_value_t = 1.0)]
    pub video_fps: f64,

    #[arg(long)]
    pub no_vision_encoder: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

impl MultimodalArgs {
    pub fn to_config(&self) -> WorkloadConfig {
        let defaults = MultimodalConfig::default();
        WorkloadConfig::Multimodal(MultimodalConfig {
            text_precision: self.precision,
            vision_precision: self.encoder_precision,
            audio_precision: self.encoder_precision,
            video_precision: self.encoder_precision,
            quantization: self.quantization,
            batch_size: self.batch_size,
            sequence_length: self.seq_len,
            image_resolution: self.image_resolution,
            patch_size: self.patch_size,
            num_images: self.num_images,
            audio_window_length: self.audio_seconds,
            video_frame_rate: self.video_fps,
            video_length: self.video_seconds,
            vision_encoder: !self.no_vision_encoder,
            audio_encoder: self.audio_seconds > 0.0,
            video_encoder: self.video_seconds > 0.0,
            ..defaults
        })
    }
}

/// Reads a workload file and checks it matches the subcommand's mode.
pub fn load_workload(path: &Path, expected_mode: &str) -> Result<WorkloadConfig> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read workload {}", path.display()))?;
    let config = WorkloadConfig::from_json(&content)
        .with_context(|| format!("Invalid workload {}", path.display()))?;
    if config.mode_name() != expected_mode {
        bail!(
            "{} describes a {} workload, expected {}",
            path.display(),
            config.mode_name(),
            expected_mode
        );
    }
    Ok(config)
}

pub fn resolve_target_gpu(explicit: Option<&str>, app: &AppConfig) -> Result<Option<&'static GpuDescriptor>> {
    match explicit.or(app.target_gpu.as_deref()) {
        Some(id) => {
            let gpu = GpuCatalog::builtin()
                .get_by_id(id)
                .with_context(|| "Use `vram_calc gpus` to list known ids")?;
            Ok(Some(gpu))
        }
        None => Ok(None),
    }
}

fn run_estimate(
    config: WorkloadConfig,
    model: Option<&ModelDescriptor>,
    output: &OutputArgs,
    app: &AppConfig,
) -> Result<()> {
    let target_gpu = resolve_target_gpu(output.gpu.as_deref(), app)?;
    tracing::info!(
        "🧮 Estimating {} memory{}",
        config.mode_name(),
        model.map(|m| format!(" for {}", m.id)).unwrap_or_default()
    );

    let report = EstimateReport::build(config, model, target_gpu)?;
    if output.json || app.json_output {
        println!("{}", report.to_json()?);
    } else {
        println!("{}", report.render());
    }
    Ok(())
}

fn workload_or(output: &OutputArgs, mode: &str, from_flags: impl FnOnce() -> WorkloadConfig) -> Result<WorkloadConfig> {
    match &output.config {
        Some(path) => load_workload(path, mode),
        None => {
            let config = from_flags();
            config.validate()?;
            Ok(config)
        }
    }
}

fn require_model(args: &ModelArgs) -> Result<ModelDescriptor> {
    match args.resolve()? {
        Some(model) => Ok(model),
        None => bail!("Pass --model <id> or --params <billions>"),
    }
}

pub fn run_inference(args: InferenceArgs, app: &AppConfig) -> Result<()> {
    let model = require_model(&args.model)?;
    let config = workload_or(&args.output, "inference", || args.to_config())?;
    run_estimate(config, Some(&model), &args.output, app)
}

pub fn run_training(args: TrainingArgs, app: &AppConfig) -> Result<()> {
    let model = args.model.resolve()?;
    let config = workload_or(&args.output, "training", || args.to_config(model.as_ref()))?;
    // A file-loaded workload still takes its size from --model/--params.
    let config = match &model {
        Some(m) => config.with_model(m),
        None => config,
    };
    run_estimate(config, model.as_ref(), &args.output, app)
}

pub fn run_fine_tuning(args: FineTuneArgs, app: &AppConfig) -> Result<()> {
    let model = require_model(&args.model)?;
    let config = workload_or(&args.output, "fine_tuning", || args.to_config())?;
    run_estimate(config, Some(&model), &args.output, app)
}

pub fn run_grpo(args: GrpoArgs, app: &AppConfig) -> Result<()> {
    let model = require_model(&args.model)?;
    let config = workload_or(&args.output, "grpo", || args.to_config())?;
    run_estimate(config, Some(&model), &args.output, app)
}

pub fn run_multimodal(args: MultimodalArgs, app: &AppConfig) -> Result<()> {
    let model = require_model(&args.model)?;
    let config = workload_or(&args.output, "multimodal", || args.to_config())?;
    run_estimate(config, Some(&model), &args.output, app)
}
