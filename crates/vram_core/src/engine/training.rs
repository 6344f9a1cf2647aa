//! Full training mode

use tracing::debug;

use super::breakdown::{Component, MemoryBreakdown};
use super::dimensions::resolve_from_params;
use super::formulas::{activations_gb, model_weights_gb, optimizer_state_gb, CHECKPOINTING_FACTOR};
use crate::config::TrainingConfig;
use crate::error::Result;
use crate::precision::{Precision, Quantization};

/// Weights + gradients + FP32 optimizer moments + activations.
///
/// Training never quantizes weights. With `mixed_precision` on an FP32 run,
/// activations are held at FP16 width.
pub fn compute_training_memory(config: &TrainingConfig) -> Result<MemoryBreakdown> {
    config.validate()?;

    let params = config.model_params_billions;
    let dims = resolve_from_params(params, config.hidden_size, config.num_layers);

    let weights = model_weights_gb(params, config.precision, Quantization::None);
    let gradients = weights;
    let optimizer = optimizer_state_gb(params, config.optimizer.state_multiplier());

    let activation_precision = if config.mixed_precision && config.precision == Precision::Fp32 {
        Precision::Fp16
    } else {
        config.precision
    };
    let mut activations = activations_gb(
        config.batch_size as f64,
        config.sequence_length as f64,
        dims.hidden_size as f64,
        dims.num_layers as f64,
        activation_precision,
    );
    if config.gradient_checkpointing {
        activations *= CHECKPOINTING_FACTOR;
    }

    let breakdown = MemoryBreakdown::new(&[
        (Component::ModelWeights, weights),
        (Component::Gradients, gradients),
        (Component::OptimizerState, optimizer),
        (Component::Activations, activations),
    ])
    .with_estimated_dimensions(dims.estimated);

    debug!(
        params_billions = params,
        optimizer = %config.optimizer,
        checkpointing = config.gradient_checkpointing,
        total_gb = breakdown.total_gb,
        "Training estimate computed"
    );
    Ok(breakdown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Optimizer;

    #[test]
    fn test_gradients_match_weights() {
        let b = compute_training_memory(&TrainingConfig::default()).unwrap();
        assert_eq!(b.gradients, b.model_weights);
        // AdamW: 7e9 * 4 bytes * 2 moments
        assert!((b.optimizer_state - 56e9 / 1073741824.0).abs() < 1e-9);
    }

    #[test]
    fn test_sgd_halves_optimizer_state() {
        let adam = compute_training_memory(&TrainingConfig::default()).unwrap();
        let sgd = compute_training_memory(&TrainingConfig {
            optimizer: Optimizer::Sgd,
            ..Default::default()
        })
        .unwrap();
        assert!((sgd.optimizer_state * 2.0 - adam.optimizer_state).abs() < 1e-9);
    }

    #[test]
    fn test_mixed_precision_halves_fp32_activations() {
        let base = TrainingConfig {
            precision: Precision::Fp32,
            mixed_precision: false,
            hidden_size: Some(4096),
            num_layers: Some(32),
            ..Default::default()
        };
        let fp32 = compute_training_memory(&base).unwrap();
        let mixed = compute_training_memory(&TrainingConfig {
            mixed_precision: true,
            ..base.clone()
        })
        .unwrap();
        assert!((mixed.activations * 2.0 - fp32.activations).abs() < 1e-9);
        assert_eq!(mixed.model_weights, fp32.model_weights);
        assert!(!fp32.dimensions_estimated);
    }

    #[test]
    fn test_rejects_negative_params() {
        let config = TrainingConfig {
            model_params_billions: -1.0,
            ..Default::default()
        };
        assert!(compute_training_memory(&config).is_err());
    }
}
