//! Workload Configuration
//!
//! One configuration type per workload mode, wrapped in the tagged
//! [`WorkloadConfig`] union. Configurations are plain data with defaults;
//! `validate()` runs before any arithmetic and rejects inputs the formulas
//! are not defined for.

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::catalog::ModelDescriptor;
use crate::error::{EngineError, Result};
use crate::precision::{Precision, Quantization};

/// Optimizer used for full training.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Optimizer {
    #[serde(rename = "SGD", alias = "sgd")]
    Sgd,
    #[serde(rename = "Adam", alias = "adam")]
    Adam,
    #[default]
    #[serde(rename = "AdamW", alias = "adamw")]
    AdamW,
}

impl Optimizer {
    /// FP32 state tensors kept per parameter (momentum, variance).
    pub fn state_multiplier(self) -> f64 {
        match self {
            Optimizer::Sgd => 1.0,
            Optimizer::Adam | Optimizer::AdamW => 2.0,
        }
    }

    pub fn is_adam_family(self) -> bool {
        matches!(self, Optimizer::Adam | Optimizer::AdamW)
    }
}

impl Display for Optimizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Optimizer::Sgd => "SGD",
            Optimizer::Adam => "Adam",
            Optimizer::AdamW => "AdamW",
        })
    }
}

impl FromStr for Optimizer {
    type Err = EngineError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sgd" => Ok(Optimizer::Sgd),
            "adam" => Ok(Optimizer::Adam),
            "adamw" => Ok(Optimizer::AdamW),
            _ => Err(EngineError::UnknownOptimizer(s.to_string())),
        }
    }
}

/// Parameter-efficient (or full) fine-tuning strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FineTuningMethod {
    #[serde(rename = "Full", alias = "full")]
    Full,
    #[default]
    #[serde(rename = "LoRA", alias = "lora")]
    Lora,
    #[serde(rename = "QLoRA", alias = "qlora")]
    QLora,
    #[serde(rename = "Prefix", alias = "prefix")]
    Prefix,
}

impl FineTuningMethod {
    pub fn uses_lora(self) -> bool {
        matches!(self, FineTuningMethod::Lora | FineTuningMethod::QLora)
    }
}

impl Display for FineTuningMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FineTuningMethod::Full => "Full",
            FineTuningMethod::Lora => "LoRA",
            FineTuningMethod::QLora => "QLoRA",
            FineTuningMethod::Prefix => "Prefix",
        })
    }
}

impl FromStr for FineTuningMethod {
    type Err = EngineError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(FineTuningMethod::Full),
            "lora" => Ok(FineTuningMethod::Lora),
            "qlora" => Ok(FineTuningMethod::QLora),
            "prefix" => Ok(FineTuningMethod::Prefix),
            _ => Err(EngineError::UnknownMethod(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub precision: Precision,
    pub quantization: Quantization,
    pub batch_size: u32,
    pub sequence_length: u32,
    /// Fraction of the full-length KV cache kept resident, in [0, 1].
    pub kv_cache_ratio: f64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            precision: Precision::Fp16,
            quantization: Quantization::None,
            batch_size: 1,
            sequence_length: 2048,
            kv_cache_ratio: 1.0,
        }
    }
}

impl InferenceConfig {
    pub fn validate(&self) -> Result<()> {
        check_shape(self.batch_size, self.sequence_length)?;
        if !self.kv_cache_ratio.is_finite() || !(0.0..=1.0).contains(&self.kv_cache_ratio) {
            return Err(EngineError::invalid(
                "kv_cache_ratio",
                format!("must be within [0, 1], got {}", self.kv_cache_ratio),
            ));
        }
        Ok(())
    }
}

/// Full training. The model size travels with the configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub model_params_billions: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_layers: Option<u32>,
    pub precision: Precision,
    pub batch_size: u32,
    pub sequence_length: u32,
    pub optimizer: Optimizer,
    pub gradient_checkpointing: bool,
    pub mixed_precision: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            model_params_billions: 7.0,
            hidden_size: None,
            num_layers: None,
            precision: Precision::Fp16,
            batch_size: 4,
            sequence_length: 2048,
            optimizer: Optimizer::AdamW,
            gradient_checkpointing: false,
            mixed_precision: true,
        }
    }
}

impl TrainingConfig {
    /// Takes the model size from `model`. Explicit dimension overrides win
    /// over the descriptor's own.
    pub fn with_model(self, model: &ModelDescriptor) -> Self {
        Self {
            model_params_billions: model.params_billions,
            hidden_size: self.hidden_size.or(model.hidden_size),
            num_layers: self.num_layers.or(model.num_layers),
            ..self
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_shape(self.batch_size, self.sequence_length)?;
        check_params("model_params_billions", self.model_params_billions)?;
        if self.hidden_size == Some(0) {
            return Err(EngineError::invalid("hidden_size", "must be at least 1"));
        }
        if self.num_layers == Some(0) {
            return Err(EngineError::invalid("num_layers", "must be at least 1"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FineTuningConfig {
    pub precision: Precision,
    pub batch_size: u32,
    pub sequence_length: u32,
    pub method: FineTuningMethod,
    pub lora_rank: u32,
    pub lora_alpha: u32,
    /// Base-model weight quantization (QLoRA).
    pub quantization: Quantization,
}

impl Default for FineTuningConfig {
    fn default() -> Self {
        Self {
            precision: Precision::Fp16,
            batch_size: 4,
            sequence_length: 2048,
            method: FineTuningMethod::Lora,
            lora_rank: 16,
            lora_alpha: 32,
            quantization: Quantization::None,
        }
    }
}

impl FineTuningConfig {
    pub fn validate(&self) -> Result<()> {
        check_shape(self.batch_size, self.sequence_length)?;
        if self.method.uses_lora() && self.lora_rank == 0 {
            return Err(EngineError::invalid(
                "lora_rank",
                format!("must be at least 1 for {}", self.method),
            ));
        }
        Ok(())
    }
}

/// Group-relative preference optimization (GRPO) over a PEFT adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrpoConfig {
    pub precision: Precision,
    pub batch_size: u32,
    pub sequence_length: u32,
    /// Preference-group size `k`: completions sampled per prompt.
    pub num_generations: u32,
    pub use_8bit_optimizer: bool,
    pub gradient_accumulation_steps: u32,
    pub quantization: Quantization,
    pub lora_rank: u32,
}

impl Default for GrpoConfig {
    fn default() -> Self {
        Self {
            precision: Precision::Fp16,
            batch_size: 1,
            sequence_length: 1024,
            num_generations: 8,
            use_8bit_optimizer: true,
            gradient_accumulation_steps: 4,
            quantization: Quantization::Int4,
            lora_rank: 16,
        }
    }
}

impl GrpoConfig {
    pub fn validate(&self) -> Result<()> {
        check_shape(self.batch_size, self.sequence_length)?;
        if self.num_generations == 0 {
            return Err(EngineError::invalid("num_generations", "must be at least 1"));
        }
        if self.gradient_accumulation_steps == 0 {
            return Err(EngineError::invalid(
                "gradient_accumulation_steps",
                "must be at least 1",
            ));
        }
        if self.lora_rank == 0 {
            return Err(EngineError::invalid("lora_rank", "must be at least 1"));
        }
        Ok(())
    }

    pub fn effective_batch_size(&self) -> u64 {
        self.batch_size as u64 * self.gradient_accumulation_steps as u64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultimodalConfig {
    /// Language backbone precision.
    pub text_precision: Precision,
    pub vision_precision: Precision,
    pub audio_precision: Precision,
    pub video_precision: Precision,
    pub quantization: Quantization,
    pub batch_size: u32,
    /// Text tokens per sample.
    pub sequence_length: u32,
    pub image_resolution: u32,
    pub patch_size: u32,
    pub num_images: u32,
    /// Informational. Audio tokenizes at a fixed 80 ms per token whatever
    /// the sample rate, so this never changes an estimate.
    pub audio_sample_rate: u32,
    /// Seconds of audio per sample.
    pub audio_window_length: f64,
    pub video_frame_rate: f64,
    /// Seconds of video per sample.
    pub video_length: f64,
    pub vision_encoder: bool,
    pub audio_encoder: bool,
    pub video_encoder: bool,
}

impl Default for MultimodalConfig {
    fn default() -> Self {
        Self {
            text_precision: Precision::Fp16,
            vision_precision: Precision::Fp16,
            audio_precision: Precision::Fp16,
            video_precision: Precision::Fp16,
            quantization: Quantization::None,
            batch_size: 1,
            sequence_length: 512,
            image_resolution: 336,
            patch_size: 14,
            num_images: 1,
            audio_sample_rate: 16000,
            audio_window_length: 0.0,
            video_frame_rate: 1.0,
            video_length: 0.0,
            vision_encoder: true,
            audio_encoder: false,
            video_encoder: false,
        }
    }
}

impl MultimodalConfig {
    pub fn validate(&self) -> Result<()> {
        check_shape(self.batch_size, self.sequence_length)?;
        if self.patch_size == 0 {
            return Err(EngineError::invalid("patch_size", "must be at least 1"));
        }
        check_non_negative("audio_window_length", self.audio_window_length)?;
        check_non_negative("video_frame_rate", self.video_frame_rate)?;
        check_non_negative("video_length", self.video_length)?;
        let uses_patches = self.num_images > 0 || self.has_video();
        if uses_patches && self.image_resolution < self.patch_size {
            return Err(EngineError::invalid(
                "image_resolution",
                format!(
                    "{} px is smaller than the {} px patch size",
                    self.image_resolution, self.patch_size
                ),
            ));
        }
        Ok(())
    }

    pub fn has_audio(&self) -> bool {
        self.audio_window_length > 0.0
    }

    pub fn has_video(&self) -> bool {
        self.video_length > 0.0 && self.video_frame_rate > 0.0
    }
}

/// Configuration for one estimate, tagged by workload mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum WorkloadConfig {
    Inference(InferenceConfig),
    Training(TrainingConfig),
    #[serde(alias = "finetune", alias = "fine-tuning")]
    FineTuning(FineTuningConfig),
    Grpo(GrpoConfig),
    Multimodal(MultimodalConfig),
}

impl WorkloadConfig {
    /// Parse and validate in one step.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: WorkloadConfig =
            serde_json::from_str(json).map_err(|e| EngineError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            WorkloadConfig::Inference(c) => c.validate(),
            WorkloadConfig::Training(c) => c.validate(),
            WorkloadConfig::FineTuning(c) => c.validate(),
            WorkloadConfig::Grpo(c) => c.validate(),
            WorkloadConfig::Multimodal(c) => c.validate(),
        }
    }

    pub fn mode_name(&self) -> &'static str {
        match self {
            WorkloadConfig::Inference(_) => "inference",
            WorkloadConfig::Training(_) => "training",
            WorkloadConfig::FineTuning(_) => "fine_tuning",
            WorkloadConfig::Grpo(_) => "grpo",
            WorkloadConfig::Multimodal(_) => "multimodal",
        }
    }

    /// Precision of the main (language) weights.
    pub fn precision(&self) -> Precision {
        match self {
            WorkloadConfig::Inference(c) => c.precision,
            WorkloadConfig::Training(c) => c.precision,
            WorkloadConfig::FineTuning(c) => c.precision,
            WorkloadConfig::Grpo(c) => c.precision,
            WorkloadConfig::Multimodal(c) => c.text_precision,
        }
    }

    pub fn batch_size(&self) -> u32 {
        match self {
            WorkloadConfig::Inference(c) => c.batch_size,
            WorkloadConfig::Training(c) => c.batch_size,
            WorkloadConfig::FineTuning(c) => c.batch_size,
            WorkloadConfig::Grpo(c) => c.batch_size,
            WorkloadConfig::Multimodal(c) => c.batch_size,
        }
    }

    pub fn sequence_length(&self) -> u32 {
        match self {
            WorkloadConfig::Inference(c) => c.sequence_length,
            WorkloadConfig::Training(c) => c.sequence_length,
            WorkloadConfig::FineTuning(c) => c.sequence_length,
            WorkloadConfig::Grpo(c) => c.sequence_length,
            WorkloadConfig::Multimodal(c) => c.sequence_length,
        }
    }

    /// Modes that update weights and therefore hold optimizer state.
    pub fn is_training(&self) -> bool {
        !matches!(self, WorkloadConfig::Inference(_) | WorkloadConfig::Multimodal(_))
    }

    /// Folds a resolved model into training configurations. Other modes
    /// take the descriptor at compute time and are returned unchanged.
    pub fn with_model(self, model: &ModelDescriptor) -> Self {
        match self {
            WorkloadConfig::Training(c) => WorkloadConfig::Training(c.with_model(model)),
            other => other,
        }
    }

    /// Training mode carries its own model size; every other mode needs a descriptor.
    pub fn requires_model(&self) -> bool {
        !matches!(self, WorkloadConfig::Training(_))
    }
}

fn check_shape(batch_size: u32, sequence_length: u32) -> Result<()> {
    if batch_size == 0 {
        return Err(EngineError::invalid("batch_size", "must be at least 1"));
    }
    if sequence_length == 0 {
        return Err(EngineError::invalid("sequence_length", "must be at least 1"));
    }
    Ok(())
}

pub(crate) fn check_params(field: &'static str, params_billions: f64) -> Result<()> {
    if !params_billions.is_finite() || params_billions < 0.0 {
        return Err(EngineError::invalid(
            field,
            format!("must be a non-negative number, got {}", params_billions),
        ));
    }
    Ok(())
}

fn check_non_negative(field: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(EngineError::invalid(field, format!("must be non-negative, got {}", value)));
    }
    Ok(())
}
