//! Engine Module - Memory formula engine
//!
//! Pure functions mapping a configuration (and, for most modes, a model
//! descriptor) to a [`MemoryBreakdown`]:
//! - inference: quantized weights, KV cache, light activations
//! - training: weights, gradients, optimizer state, activations
//! - fine_tuning: Full / LoRA / QLoRA / Prefix
//! - grpo: PEFT training with activations scaled by the group size
//! - multimodal: per-modality tokens summed into one sequence

pub mod breakdown;
pub mod dimensions;
pub mod formulas;

mod fine_tuning;
mod grpo;
mod inference;
mod multimodal;
mod training;

pub use breakdown::{BreakdownItem, Component, MemoryBreakdown, ModalityTokens};
pub use dimensions::{
    estimate_hidden_size, estimate_num_heads, estimate_num_layers, resolve_dimensions, ResolvedDimensions,
};
pub use fine_tuning::{
    compute_fine_tuning_memory, FULL_ACTIVATIONS_GB, LORA_ACTIVATIONS_GB, PREFIX_ACTIVATIONS_GB,
    QLORA_ACTIVATIONS_GB,
};
pub use grpo::compute_grpo_memory;
pub use inference::compute_inference_memory;
pub use multimodal::{compute_multimodal_memory, modality_tokens};
pub use training::compute_training_memory;

use crate::catalog::ModelDescriptor;
use crate::config::{check_params, WorkloadConfig};
use crate::error::{EngineError, Result};

pub(crate) fn validate_model(model: &ModelDescriptor) -> Result<()> {
    check_params("params_billions", model.params_billions)
}

/// Dispatch on the workload mode.
///
/// Training carries its model size in the configuration and ignores `model`;
/// every other mode requires a resolved descriptor.
pub fn compute_memory(config: &WorkloadConfig, model: Option<&ModelDescriptor>) -> Result<MemoryBreakdown> {
    if let WorkloadConfig::Training(training) = config {
        return compute_training_memory(training);
    }

    let model = model.ok_or_else(|| {
        EngineError::invalid("model", format!("a model is required for {} estimates", config.mode_name()))
    })?;

    match config {
        WorkloadConfig::Inference(c) => compute_inference_memory(c, model),
        WorkloadConfig::FineTuning(c) => compute_fine_tuning_memory(c, model),
        WorkloadConfig::Grpo(c) => compute_grpo_memory(c, model),
        WorkloadConfig::Multimodal(c) => compute_multimodal_memory(c, model),
        WorkloadConfig::Training(c) => compute_training_memory(c),
    }
}
