//! Fine-tuning mode (Full / LoRA / QLoRA / Prefix)
//!
//! Activations here are fixed per-method placeholders rather than the shape
//! formula used by the other modes. They do not move with batch size or
//! sequence length.

use tracing::debug;

use super::breakdown::{Component, MemoryBreakdown};
use super::formulas::{lora_params_billions, model_weights_gb, optimizer_state_gb, params_to_gb};
use super::validate_model;
use crate::catalog::ModelDescriptor;
use crate::config::{FineTuningConfig, FineTuningMethod};
use crate::error::Result;
use crate::precision::{Precision, Quantization};

pub const FULL_ACTIVATIONS_GB: f64 = 2.0;
pub const LORA_ACTIVATIONS_GB: f64 = 1.0;
pub const QLORA_ACTIVATIONS_GB: f64 = 0.8;
pub const PREFIX_ACTIVATIONS_GB: f64 = 1.2;

/// Share of parameters trained by prefix tuning.
pub const PREFIX_TRAINABLE_FRACTION: f64 = 0.1;

/// Adam-style optimizer multiplier used by every fine-tuning method.
const FINE_TUNING_OPTIMIZER_MULTIPLIER: f64 = 2.0;

pub fn compute_fine_tuning_memory(config: &FineTuningConfig, model: &ModelDescriptor) -> Result<MemoryBreakdown> {
    config.validate()?;
    validate_model(model)?;

    let params = model.params_billions;
    let bytes = config.precision.bytes_per_param();

    let (weights, gradients, optimizer, activations) = match config.method {
        FineTuningMethod::Full => {
            let weights = model_weights_gb(params, config.precision, Quantization::None);
            (
                weights,
                weights,
                optimizer_state_gb(params, FINE_TUNING_OPTIMIZER_MULTIPLIER),
                FULL_ACTIVATIONS_GB,
            )
        }
        FineTuningMethod::Lora => {
            let adapters = params_to_gb(lora_params_billions(params, config.lora_rank), bytes);
            (
                model_weights_gb(params, config.precision, Quantization::None),
                adapters,
                adapters * FINE_TUNING_OPTIMIZER_MULTIPLIER,
                LORA_ACTIVATIONS_GB,
            )
        }
        FineTuningMethod::QLora => {
            // Adapters stay FP16 whatever the base precision is.
            let adapters = params_to_gb(
                lora_params_billions(params, config.lora_rank),
                Precision::Fp16.bytes_per_param(),
            );
            (
                model_weights_gb(params, config.precision, config.quantization),
                adapters,
                adapters * FINE_TUNING_OPTIMIZER_MULTIPLIER,
                QLORA_ACTIVATIONS_GB,
            )
        }
        FineTuningMethod::Prefix => {
            let trainable = params_to_gb(params * PREFIX_TRAINABLE_FRACTION, bytes);
            (
                model_weights_gb(params, config.precision, Quantization::None),
                trainable,
                trainable * FINE_TUNING_OPTIMIZER_MULTIPLIER,
                PREFIX_ACTIVATIONS_GB,
            )
        }
    };

    let breakdown = MemoryBreakdown::new(&[
        (Component::ModelWeights, weights),
        (Component::Gradients, gradients),
        (Component::OptimizerState, optimizer),
        (Component::Activations, activations),
    ]);

    debug!(
        model = %model.id,
        method = %config.method,
        lora_rank = config.lora_rank,
        total_gb = breakdown.total_gb,
        "Fine-tuning estimate computed"
    );
    Ok(breakdown)
}
