//! Closed-form memory formulas
//!
//! All results are GB with GB = bytes / 1024³; parameter counts are in
//! billions. The activation estimator is a deliberately simple shape
//! (Q/K/V projections, the seq×seq score matrix, a 4x MLP) and is kept as-is
//! for parity with existing outputs.

use crate::precision::{Precision, Quantization};

pub const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Activation factor under gradient checkpointing (~70% saved).
pub const CHECKPOINTING_FACTOR: f64 = 0.3;

/// Inference keeps no backward-pass activations.
pub const INFERENCE_ACTIVATION_FACTOR: f64 = 0.1;

/// LoRA sizing assumes hidden ≈ 4096, so `r` adds `2r / 4096` of the params.
pub const LORA_REFERENCE_HIDDEN: f64 = 4096.0;

/// Optimizer moments are always accumulated in FP32.
pub const OPTIMIZER_STATE_BYTES: f64 = 4.0;

pub fn params_to_gb(params_billions: f64, bytes_per_param: f64) -> f64 {
    params_billions * 1e9 * bytes_per_param / BYTES_PER_GB
}

pub fn model_weights_gb(params_billions: f64, precision: Precision, quantization: Quantization) -> f64 {
    params_to_gb(params_billions, precision.bytes_per_param() * quantization.ratio())
}

pub fn optimizer_state_gb(params_billions: f64, state_multiplier: f64) -> f64 {
    params_to_gb(params_billions, OPTIMIZER_STATE_BYTES * state_multiplier)
}

/// Key and value tensors for every position of every layer.
pub fn kv_cache_gb(batch: f64, seq_len: f64, hidden: f64, layers: f64, precision: Precision) -> f64 {
    batch * seq_len * hidden * layers * 2.0 * precision.bytes_per_param() / BYTES_PER_GB
}

pub fn activations_gb(batch: f64, seq_len: f64, hidden: f64, layers: f64, precision: Precision) -> f64 {
    let attention = batch * seq_len * hidden * 3.0 + batch * seq_len * seq_len;
    let feed_forward = batch * seq_len * hidden * 4.0 * 2.0;
    (attention + feed_forward) * layers * precision.bytes_per_param() / BYTES_PER_GB
}

pub fn lora_params_billions(params_billions: f64, rank: u32) -> f64 {
    params_billions * (2.0 * rank as f64 / LORA_REFERENCE_HIDDEN)
}
