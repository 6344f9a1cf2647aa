//! Invariants that must hold for every workload mode.

use vram_core::{
    compute_memory, recommend_multi_gpu_configs, recommend_single_gpus, FineTuningConfig, FineTuningMethod,
    GrpoConfig, InferenceConfig, MemoryBreakdown, ModelCatalog, ModelDescriptor, MultimodalConfig, Precision,
    Quantization, TrainingConfig, WorkloadConfig,
};

fn sample_configs() -> Vec<WorkloadConfig> {
    let mut configs = Vec::new();
    for precision in Precision::ALL {
        for quantization in Quantization::ALL {
            configs.push(WorkloadConfig::Inference(InferenceConfig {
                precision,
                quantization,
                batch_size: 2,
                sequence_length: 1024,
                kv_cache_ratio: 0.75,
            }));
        }
        configs.push(WorkloadConfig::Training(TrainingConfig {
            precision,
            gradient_checkpointing: precision == Precision::Bf16,
            ..Default::default()
        }));
        for method in [
            FineTuningMethod::Full,
            FineTuningMethod::Lora,
            FineTuningMethod::QLora,
            FineTuningMethod::Prefix,
        ] {
            configs.push(WorkloadConfig::FineTuning(FineTuningConfig {
                precision,
                method,
                quantization: Quantization::Int4,
                ..Default::default()
            }));
        }
        configs.push(WorkloadConfig::Grpo(GrpoConfig {
            precision,
            ..Default::default()
        }));
        configs.push(WorkloadConfig::Multimodal(MultimodalConfig {
            text_precision: precision,
            audio_window_length: 10.0,
            audio_encoder: true,
            video_length: 4.0,
            ..Default::default()
        }));
    }
    configs
}

fn models() -> Vec<ModelDescriptor> {
    let mut models: Vec<ModelDescriptor> = ModelCatalog::builtin().all().to_vec();
    models.push(ModelDescriptor::custom(0.125));
    models.push(ModelDescriptor::custom(30.0));
    models
}

fn assert_well_formed(b: &MemoryBreakdown, context: &str) {
    let tolerance = 1e-9 * b.total_gb.max(1.0);
    assert!(
        (b.total_gb - b.components_sum()).abs() <= tolerance,
        "{}: total {} != sum {}",
        context,
        b.total_gb,
        b.components_sum()
    );
    for item in &b.items {
        assert!(item.value_gb >= 0.0, "{}: negative {}", context, item.label);
        assert!(!item.percentage.is_nan(), "{}: NaN percentage", context);
    }
    if b.total_gb > 0.0 {
        let pct: f64 = b.items.iter().map(|i| i.percentage).sum();
        assert!((pct - 100.0).abs() < 0.1, "{}: percentages sum to {}", context, pct);
    } else {
        assert!(b.items.iter().all(|i| i.percentage == 0.0));
    }
}

#[test]
fn test_conservation_and_normalization() -> anyhow::Result<()> {
    for model in models() {
        for config in sample_configs() {
            let b = compute_memory(&config, Some(&model))?;
            assert_well_formed(&b, &format!("{} / {:?}", model.id, config));
        }
    }
    Ok(())
}

#[test]
fn test_zero_parameter_model_has_no_nan() -> anyhow::Result<()> {
    let model = ModelDescriptor::custom(0.0);
    for config in sample_configs() {
        if matches!(config, WorkloadConfig::Training(_)) {
            continue;
        }
        let b = compute_memory(&config, Some(&model))?;
        assert_well_formed(&b, "zero params");
    }
    Ok(())
}

#[test]
fn test_monotonic_in_batch_and_sequence() -> anyhow::Result<()> {
    let model = ModelCatalog::builtin().get_by_id("llama-2-13b")?;
    let shapes = [(1, 512), (1, 1024), (2, 1024), (4, 1024), (4, 4096), (8, 4096)];

    let mut previous: Option<(MemoryBreakdown, MemoryBreakdown, MemoryBreakdown)> = None;
    for (batch_size, sequence_length) in shapes {
        let inference = compute_memory(
            &WorkloadConfig::Inference(InferenceConfig {
                batch_size,
                sequence_length,
                ..Default::default()
            }),
            Some(model),
        )?;
        let training = compute_memory(
            &WorkloadConfig::Training(TrainingConfig {
                batch_size,
                sequence_length,
                ..Default::default()
            }),
            None,
        )?;
        let grpo = compute_memory(
            &WorkloadConfig::Grpo(GrpoConfig {
                batch_size,
                sequence_length,
                ..Default::default()
            }),
            Some(model),
        )?;

        if let Some((pi, pt, pg)) = &previous {
            assert!(inference.activations >= pi.activations);
            assert!(inference.kv_cache >= pi.kv_cache);
            assert!(training.activations >= pt.activations);
            assert!(grpo.activations >= pg.activations);
            assert!(grpo.kv_cache >= pg.kv_cache);
        }
        previous = Some((inference, training, grpo));
    }

    // Multimodal context grows with text length, batch and image count.
    let sweep = [(1, 256, 0), (1, 512, 0), (1, 512, 1), (2, 512, 1), (2, 1024, 2), (4, 2048, 4)];
    let mut previous: Option<MemoryBreakdown> = None;
    for (batch_size, sequence_length, num_images) in sweep {
        let multimodal = compute_memory(
            &WorkloadConfig::Multimodal(MultimodalConfig {
                batch_size,
                sequence_length,
                num_images,
                ..Default::default()
            }),
            Some(model),
        )?;
        if let Some(p) = &previous {
            assert!(multimodal.activations >= p.activations, "{:?}", (batch_size, sequence_length, num_images));
            assert!(multimodal.kv_cache >= p.kv_cache, "{:?}", (batch_size, sequence_length, num_images));
        }
        previous = Some(multimodal);
    }
    Ok(())
}

#[test]
fn test_quantization_ordering() -> anyhow::Result<()> {
    let model = ModelCatalog::builtin().get_by_id("mistral-7b")?;
    for precision in Precision::ALL {
        let weights = |quantization| -> anyhow::Result<f64> {
            let config = WorkloadConfig::Inference(InferenceConfig {
                precision,
                quantization,
                ..Default::default()
            });
            Ok(compute_memory(&config, Some(model))?.model_weights)
        };
        let none = weights(Quantization::None)?;
        let int8 = weights(Quantization::Int8)?;
        let int4 = weights(Quantization::Int4)?;
        assert!(int4 < int8 && int8 < none, "{}: {} {} {}", precision, int4, int8, none);
    }
    Ok(())
}

#[test]
fn test_single_gpu_recommendations_fit() -> anyhow::Result<()> {
    for required in [0.0, 4.5, 13.0, 23.9, 24.0, 79.0, 150.0, 500.0] {
        let fits = recommend_single_gpus(required)?;
        assert!(fits.iter().all(|f| f.gpu.memory_gb >= required));
        assert!(fits.windows(2).all(|w| w[0].score <= w[1].score));
    }
    assert!(recommend_single_gpus(10_000.0)?.is_empty());
    Ok(())
}

#[test]
fn test_multi_gpu_bounds() -> anyhow::Result<()> {
    for required in [1.0, 20.0, 90.0, 300.0, 1500.0, 5000.0, 50_000.0] {
        let configs = recommend_multi_gpu_configs(required)?;
        assert!(configs.len() <= 20);
        for c in &configs {
            assert!(c.total_memory_gb >= required);
            assert!(c.num_nodes >= 1 && c.num_nodes <= 16);
            assert!(c.gpu.memory_gb >= 8.0);
        }
    }
    Ok(())
}
