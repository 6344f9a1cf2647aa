//! GRPO mode (group-relative preference optimization)
//!
//! Each prompt is expanded into `k = num_generations` completions that are
//! scored against each other, so the forward/backward activations and the
//! rollout KV cache both scale linearly in `k`. The base model is usually
//! quantized and only a small LoRA adapter is trained.

use tracing::debug;

use super::breakdown::{Component, MemoryBreakdown};
use super::dimensions::resolve_dimensions;
use super::formulas::{activations_gb, kv_cache_gb, lora_params_billions, model_weights_gb, params_to_gb};
use super::validate_model;
use crate::catalog::ModelDescriptor;
use crate::config::GrpoConfig;
use crate::error::Result;
use crate::precision::Precision;

/// Bytes per optimizer moment with and without an 8-bit optimizer.
const OPTIMIZER_BYTES_8BIT: f64 = 1.0;
const OPTIMIZER_BYTES_FP32: f64 = 4.0;
const OPTIMIZER_MOMENTS: f64 = 2.0;

pub fn compute_grpo_memory(config: &GrpoConfig, model: &ModelDescriptor) -> Result<MemoryBreakdown> {
    config.validate()?;
    validate_model(model)?;

    let dims = resolve_dimensions(model);
    let k = config.num_generations as f64;
    let batch = config.batch_size as f64;
    let seq_len = config.sequence_length as f64;
    let hidden = dims.hidden_size as f64;
    let layers = dims.num_layers as f64;

    let weights = model_weights_gb(model.params_billions, config.precision, config.quantization);

    let adapter_params = lora_params_billions(model.params_billions, config.lora_rank);
    let gradients = params_to_gb(adapter_params, Precision::Fp16.bytes_per_param());
    let moment_bytes = if config.use_8bit_optimizer {
        OPTIMIZER_BYTES_8BIT
    } else {
        OPTIMIZER_BYTES_FP32
    };
    let optimizer = params_to_gb(adapter_params, moment_bytes * OPTIMIZER_MOMENTS);

    let base_activations = activations_gb(batch, seq_len, hidden, layers, config.precision);
    let activations = k * base_activations;
    let kv_cache = kv_cache_gb(batch * k, seq_len, hidden, layers, config.precision);

    let breakdown = MemoryBreakdown::new(&[
        (Component::ModelWeights, weights),
        (Component::Gradients, gradients),
        (Component::OptimizerState, optimizer),
        (Component::Activations, activations),
        (Component::KvCache, kv_cache),
    ])
    .with_estimated_dimensions(dims.estimated);

    debug!(
        model = %model.id,
        num_generations = config.num_generations,
        effective_batch = config.effective_batch_size(),
        total_gb = breakdown.total_gb,
        "GRPO estimate computed"
    );
    Ok(breakdown)
}
