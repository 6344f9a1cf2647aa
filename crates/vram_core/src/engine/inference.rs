//! Inference mode

use tracing::debug;

use super::breakdown::{Component, MemoryBreakdown};
use super::dimensions::resolve_dimensions;
use super::formulas::{activations_gb, kv_cache_gb, model_weights_gb, INFERENCE_ACTIVATION_FACTOR};
use super::validate_model;
use crate::catalog::ModelDescriptor;
use crate::config::InferenceConfig;
use crate::error::Result;

/// Quantized weights + KV cache + 10% of the training activation estimate.
pub fn compute_inference_memory(config: &InferenceConfig, model: &ModelDescriptor) -> Result<MemoryBreakdown> {
    config.validate()?;
    validate_model(model)?;

    let dims = resolve_dimensions(model);
    let batch = config.batch_size as f64;
    let seq_len = config.sequence_length as f64;
    let hidden = dims.hidden_size as f64;
    let layers = dims.num_layers as f64;

    let weights = model_weights_gb(model.params_billions, config.precision, config.quantization);
    let kv_cache = kv_cache_gb(batch, seq_len, hidden, layers, config.precision) * config.kv_cache_ratio;
    let activations =
        activations_gb(batch, seq_len, hidden, layers, config.precision) * INFERENCE_ACTIVATION_FACTOR;

    let breakdown = MemoryBreakdown::new(&[
        (Component::ModelWeights, weights),
        (Component::KvCache, kv_cache),
        (Component::Activations, activations),
    ])
    .with_estimated_dimensions(dims.estimated);

    debug!(
        model = %model.id,
        precision = %config.precision,
        quantization = %config.quantization,
        total_gb = breakdown.total_gb,
        "Inference estimate computed"
    );
    Ok(breakdown)
}
