//! Optimization Advisor - Rule-based memory suggestions
//!
//! Each rule looks at the configuration and the computed breakdown (and the
//! target GPU, when given) and either fires or not. Rules never see each
//! other's output. The fired list is ordered high > medium > low, keeping
//! rule order within a priority.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::GpuDescriptor;
use crate::config::{FineTuningMethod, WorkloadConfig};
use crate::engine::{Component, MemoryBreakdown};
use crate::precision::{Precision, Quantization};

pub const LONG_SEQUENCE_THRESHOLD: u32 = 4096;
pub const HIGH_LORA_RANK_THRESHOLD: u32 = 64;
pub const HIGH_UTILIZATION_PCT: f64 = 95.0;
pub const LOW_UTILIZATION_PCT: f64 = 30.0;
pub const HIGH_GENERATION_COUNT: u32 = 8;
pub const HIGH_IMAGE_RESOLUTION: u32 = 672;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    Precision,
    Quantization,
    BatchSize,
    SequenceLength,
    GradientCheckpointing,
    Peft,
    LoraRank,
    Optimizer,
    Hardware,
    KvCache,
    Generations,
    Modality,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub priority: Priority,
    pub title: String,
    pub description: String,
    pub impact: String,
    pub implementation: Vec<String>,
}

impl Suggestion {
    fn new(kind: SuggestionKind, priority: Priority, title: &str, description: String, impact: String) -> Self {
        Self {
            kind,
            priority,
            title: title.to_string(),
            description,
            impact,
            implementation: Vec::new(),
        }
    }

    fn steps(mut self, steps: &[&str]) -> Self {
        self.implementation = steps.iter().map(|s| s.to_string()).collect();
        self
    }
}

/// Everything a rule may look at.
struct Context<'a> {
    config: &'a WorkloadConfig,
    breakdown: &'a MemoryBreakdown,
    target_gpu: Option<&'a GpuDescriptor>,
}

type Rule = fn(&Context<'_>) -> Option<Suggestion>;

const RULES: &[Rule] = &[
    fp32_precision,
    fp32_without_mixed_precision,
    long_sequence,
    near_gpu_capacity,
    underused_gpu,
    high_lora_rank,
    missing_checkpointing,
    full_fine_tune_large_model,
    lora_to_qlora,
    unquantized_large_inference,
    activation_heavy_batch,
    heavy_optimizer_state,
    many_generations,
    grpo_without_8bit_optimizer,
    kv_cache_heavy,
    high_image_resolution,
    video_dominates,
];

pub fn generate_optimization_suggestions(
    config: &WorkloadConfig,
    breakdown: &MemoryBreakdown,
    target_gpu: Option<&GpuDescriptor>,
) -> Vec<Suggestion> {
    let ctx = Context {
        config,
        breakdown,
        target_gpu,
    };
    let mut suggestions: Vec<Suggestion> = RULES.iter().filter_map(|rule| rule(&ctx)).collect();
    suggestions.sort_by_key(|s| s.priority);
    debug!(mode = config.mode_name(), fired = suggestions.len(), "Advisor rules evaluated");
    suggestions
}

fn fp32_precision(ctx: &Context<'_>) -> Option<Suggestion> {
    if ctx.config.precision() != Precision::Fp32 {
        return None;
    }
    let saved = ctx.breakdown.model_weights / 2.0;
    Some(
        Suggestion::new(
            SuggestionKind::Precision,
            Priority::High,
            "Switch to FP16 or BF16",
            "FP32 stores 4 bytes per parameter. Half precision is standard for both training and inference on modern GPUs.".to_string(),
            format!("Saves about {:.1} GB of weight memory", saved),
        )
        .steps(&[
            "Set precision to BF16 on Ampere or newer GPUs, FP16 otherwise",
            "Keep loss scaling enabled when training in FP16",
        ]),
    )
}

fn fp32_without_mixed_precision(ctx: &Context<'_>) -> Option<Suggestion> {
    let WorkloadConfig::Training(c) = ctx.config else {
        return None;
    };
    if c.precision != Precision::Fp32 || c.mixed_precision {
        return None;
    }
    Some(
        Suggestion::new(
            SuggestionKind::Precision,
            Priority::Medium,
            "Enable mixed precision",
            "Mixed precision keeps FP32 master weights but runs activations in half precision.".to_string(),
            format!("Halves activation memory (currently {:.1} GB)", ctx.breakdown.activations),
        )
        .steps(&["Enable automatic mixed precision (AMP) in the training loop"]),
    )
}

fn long_sequence(ctx: &Context<'_>) -> Option<Suggestion> {
    if matches!(ctx.config, WorkloadConfig::Multimodal(_)) {
        return None;
    }
    let seq = ctx.config.sequence_length();
    if seq <= LONG_SEQUENCE_THRESHOLD {
        return None;
    }
    Some(
        Suggestion::new(
            SuggestionKind::SequenceLength,
            Priority::Medium,
            "Reduce sequence length",
            format!(
                "A {} token context grows activations quadratically in the attention scores and linearly in the KV cache.",
                seq
            ),
            format!("Dropping to {} tokens cuts sequence-bound memory by at least half", seq / 2),
        )
        .steps(&[
            "Truncate or chunk inputs to the length the task needs",
            "Use a sliding-window or flash attention kernel for long contexts",
        ]),
    )
}

fn near_gpu_capacity(ctx: &Context<'_>) -> Option<Suggestion> {
    let gpu = ctx.target_gpu?;
    let utilization = gpu.utilization_pct(ctx.breakdown.total_gb);
    if utilization <= HIGH_UTILIZATION_PCT {
        return None;
    }
    let (title, description) = if utilization > 100.0 {
        (
            "Exceeds target GPU memory",
            format!(
                "The estimate of {:.1} GB does not fit in the {} ({} GB).",
                ctx.breakdown.total_gb, gpu.name, gpu.memory_gb
            ),
        )
    } else {
        (
            "Target GPU nearly full",
            format!(
                "The estimate uses {:.0}% of the {}; allocator fragmentation and CUDA context overhead can push it over.",
                utilization, gpu.name
            ),
        )
    };
    Some(
        Suggestion::new(
            SuggestionKind::Hardware,
            Priority::High,
            title,
            description,
            format!("{:.0}% utilization", utilization),
        )
        .steps(&[
            "Apply the memory reductions below, or",
            "Choose a larger GPU or a multi-GPU configuration",
        ]),
    )
}

fn underused_gpu(ctx: &Context<'_>) -> Option<Suggestion> {
    let gpu = ctx.target_gpu?;
    let utilization = gpu.utilization_pct(ctx.breakdown.total_gb);
    if utilization >= LOW_UTILIZATION_PCT {
        return None;
    }
    Some(
        Suggestion::new(
            SuggestionKind::BatchSize,
            Priority::Low,
            "GPU has spare memory",
            format!("Only {:.0}% of the {} is used.", utilization, gpu.name),
            "Higher throughput at no extra hardware cost".to_string(),
        )
        .steps(&[
            "Increase batch size until utilization approaches 80%",
            "Or pick a smaller, cheaper GPU",
        ]),
    )
}

fn high_lora_rank(ctx: &Context<'_>) -> Option<Suggestion> {
    let rank = match ctx.config {
        WorkloadConfig::FineTuning(c) if c.method.uses_lora() => c.lora_rank,
        WorkloadConfig::Grpo(c) => c.lora_rank,
        _ => return None,
    };
    if rank <= HIGH_LORA_RANK_THRESHOLD {
        return None;
    }
    Some(
        Suggestion::new(
            SuggestionKind::LoraRank,
            Priority::Medium,
            "Lower the LoRA rank",
            format!("Rank {} is well above the 8-64 range where LoRA quality usually saturates.", rank),
            format!("Adapter memory scales linearly with rank; rank 16 needs {:.0}% of it", 1600.0 / rank as f64),
        )
        .steps(&["Try rank 16 or 32 first", "Scale lora_alpha with the rank to keep the update magnitude"]),
    )
}

fn missing_checkpointing(ctx: &Context<'_>) -> Option<Suggestion> {
    let applies = match ctx.config {
        WorkloadConfig::Training(c) => !c.gradient_checkpointing,
        WorkloadConfig::FineTuning(c) => c.method == FineTuningMethod::Full,
        WorkloadConfig::Grpo(_) => true,
        _ => false,
    };
    if !applies || ctx.breakdown.share(Component::Activations) < 30.0 {
        return None;
    }
    let saved = ctx.breakdown.activations * 0.7;
    Some(
        Suggestion::new(
            SuggestionKind::GradientCheckpointing,
            Priority::High,
            "Enable gradient checkpointing",
            "Activations dominate this run. Checkpointing recomputes them during the backward pass instead of storing them.".to_string(),
            format!("Saves about {:.1} GB for roughly 20-30% more compute", saved),
        )
        .steps(&["Enable gradient checkpointing on the transformer blocks"]),
    )
}

fn full_fine_tune_large_model(ctx: &Context<'_>) -> Option<Suggestion> {
    let WorkloadConfig::FineTuning(c) = ctx.config else {
        return None;
    };
    if c.method != FineTuningMethod::Full || ctx.breakdown.model_weights < params_gb_hint(1.0, c.precision) {
        return None;
    }
    let trainable = ctx.breakdown.gradients + ctx.breakdown.optimizer_state;
    Some(
        Suggestion::new(
            SuggestionKind::Peft,
            Priority::High,
            "Use LoRA or QLoRA instead of full fine-tuning",
            "Full fine-tuning keeps gradients and optimizer state for every parameter.".to_string(),
            format!("Removes most of the {:.1} GB of gradient and optimizer memory", trainable),
        )
        .steps(&[
            "Switch method to LoRA with rank 16",
            "Use QLoRA with INT4 base weights if memory is still tight",
        ]),
    )
}

fn lora_to_qlora(ctx: &Context<'_>) -> Option<Suggestion> {
    let WorkloadConfig::FineTuning(c) = ctx.config else {
        return None;
    };
    if c.method != FineTuningMethod::Lora || ctx.breakdown.share(Component::ModelWeights) < 50.0 {
        return None;
    }
    let saved = ctx.breakdown.model_weights * (1.0 - Quantization::Int4.ratio());
    Some(
        Suggestion::new(
            SuggestionKind::Quantization,
            Priority::Medium,
            "Quantize the base model (QLoRA)",
            "The frozen base weights are most of the footprint; LoRA trains equally well on an INT4 base.".to_string(),
            format!("Saves about {:.1} GB", saved),
        )
        .steps(&["Set method to QLoRA", "Set quantization to INT4"]),
    )
}

fn unquantized_large_inference(ctx: &Context<'_>) -> Option<Suggestion> {
    let WorkloadConfig::Inference(c) = ctx.config else {
        return None;
    };
    if c.quantization.is_quantized() || ctx.breakdown.model_weights < params_gb_hint(7.0, c.precision) {
        return None;
    }
    let saved = ctx.breakdown.model_weights * (1.0 - Quantization::Int8.ratio());
    Some(
        Suggestion::new(
            SuggestionKind::Quantization,
            Priority::Medium,
            "Quantize weights for inference",
            "INT8 and INT4 weight quantization keep quality close to FP16 for most 7B+ models.".to_string(),
            format!("INT8 saves about {:.1} GB", saved),
        )
        .steps(&["Set quantization to INT8, or INT4 for the smallest footprint"]),
    )
}

fn activation_heavy_batch(ctx: &Context<'_>) -> Option<Suggestion> {
    let batch = ctx.config.batch_size();
    if batch <= 1 || ctx.breakdown.share(Component::Activations) < 50.0 {
        return None;
    }
    let implementation: &[&str] = if ctx.config.is_training() {
        &[
            "Halve the batch size",
            "Double gradient accumulation steps to keep the effective batch",
        ]
    } else {
        &["Halve the batch size", "Serve requests with continuous batching instead"]
    };
    Some(
        Suggestion::new(
            SuggestionKind::BatchSize,
            Priority::Medium,
            "Reduce batch size",
            format!("Activations are over half the estimate at batch size {}.", batch),
            format!("Halving the batch saves about {:.1} GB", ctx.breakdown.activations / 2.0),
        )
        .steps(implementation),
    )
}

fn heavy_optimizer_state(ctx: &Context<'_>) -> Option<Suggestion> {
    let WorkloadConfig::Training(c) = ctx.config else {
        return None;
    };
    if !c.optimizer.is_adam_family() || ctx.breakdown.share(Component::OptimizerState) < 40.0 {
        return None;
    }
    Some(
        Suggestion::new(
            SuggestionKind::Optimizer,
            Priority::Low,
            "Use an 8-bit optimizer",
            format!("{} keeps two FP32 moments per parameter.", c.optimizer),
            format!("8-bit moments save about {:.1} GB", ctx.breakdown.optimizer_state * 0.75),
        )
        .steps(&["Swap in an 8-bit Adam implementation", "Or use SGD with momentum when it converges"]),
    )
}

fn many_generations(ctx: &Context<'_>) -> Option<Suggestion> {
    let WorkloadConfig::Grpo(c) = ctx.config else {
        return None;
    };
    if c.num_generations <= HIGH_GENERATION_COUNT {
        return None;
    }
    let per_generation = ctx.breakdown.activations / c.num_generations as f64;
    Some(
        Suggestion::new(
            SuggestionKind::Generations,
            Priority::Medium,
            "Reduce generations per prompt",
            format!(
                "Activation memory grows linearly with the group size; k = {} costs {:.1} GB per generation.",
                c.num_generations, per_generation
            ),
            format!(
                "k = {} saves about {:.1} GB",
                HIGH_GENERATION_COUNT,
                per_generation * (c.num_generations - HIGH_GENERATION_COUNT) as f64
            ),
        )
        .steps(&["Lower num_generations to 4-8", "Raise gradient accumulation to keep the prompt count per step"]),
    )
}

fn grpo_without_8bit_optimizer(ctx: &Context<'_>) -> Option<Suggestion> {
    let WorkloadConfig::Grpo(c) = ctx.config else {
        return None;
    };
    if c.use_8bit_optimizer {
        return None;
    }
    Some(
        Suggestion::new(
            SuggestionKind::Optimizer,
            Priority::Low,
            "Enable the 8-bit optimizer",
            "Adapter optimizer moments are stored in FP32.".to_string(),
            format!("Saves about {:.2} GB", ctx.breakdown.optimizer_state * 0.75),
        )
        .steps(&["Set use_8bit_optimizer to true"]),
    )
}

fn kv_cache_heavy(ctx: &Context<'_>) -> Option<Suggestion> {
    let WorkloadConfig::Inference(c) = ctx.config else {
        return None;
    };
    if ctx.breakdown.share(Component::KvCache) < 30.0 {
        return None;
    }
    let implementation: &[&str] = if c.kv_cache_ratio >= 1.0 {
        &["Quantize the KV cache to 8 bits", "Cap the resident cache with a lower kv_cache_ratio"]
    } else {
        &["Quantize the KV cache to 8 bits"]
    };
    Some(
        Suggestion::new(
            SuggestionKind::KvCache,
            Priority::Low,
            "Shrink the KV cache",
            format!("The KV cache holds {:.0}% of the estimate.", ctx.breakdown.share(Component::KvCache)),
            format!("8-bit KV cache saves about {:.1} GB", ctx.breakdown.kv_cache / 2.0),
        )
        .steps(implementation),
    )
}

fn high_image_resolution(ctx: &Context<'_>) -> Option<Suggestion> {
    let WorkloadConfig::Multimodal(c) = ctx.config else {
        return None;
    };
    if c.num_images == 0 || c.image_resolution <= HIGH_IMAGE_RESOLUTION {
        return None;
    }
    Some(
        Suggestion::new(
            SuggestionKind::Modality,
            Priority::Medium,
            "Lower image resolution",
            format!(
                "Image tokens grow with the square of the resolution; {} px is above the usual 336-672 px range.",
                c.image_resolution
            ),
            "Halving the resolution quarters the image tokens".to_string(),
        )
        .steps(&["Resize images before encoding", "Or use a larger patch size"]),
    )
}

fn video_dominates(ctx: &Context<'_>) -> Option<Suggestion> {
    let tokens = ctx.breakdown.modality_tokens?;
    if tokens.video == 0 || tokens.video <= tokens.text {
        return None;
    }
    Some(
        Suggestion::new(
            SuggestionKind::Modality,
            Priority::Medium,
            "Sample fewer video frames",
            format!("Video contributes {} tokens against {} text tokens.", tokens.video, tokens.text),
            "Token count, and with it activations and KV cache, scale with frame rate".to_string(),
        )
        .steps(&["Lower video_frame_rate", "Trim the clip to the relevant segment"]),
    )
}

/// Weight size of a model with `params_billions` parameters at `precision`.
fn params_gb_hint(params_billions: f64, precision: Precision) -> f64 {
    crate::engine::formulas::model_weights_gb(params_billions, precision, Quantization::None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{GpuArchitecture, GpuCatalog, ModelArchitecture, ModelDescriptor};
    use crate::config::{FineTuningConfig, GrpoConfig, InferenceConfig, MultimodalConfig, Optimizer, TrainingConfig};
    use crate::engine::compute_memory;
    use std::collections::BTreeSet;

    fn model_7b() -> ModelDescriptor {
        ModelDescriptor::new("m7", "Model 7B", 7.0, ModelArchitecture::Transformer).with_dims(4096, 32, 32, 32000)
    }

    fn advise(config: WorkloadConfig, gpu: Option<&GpuDescriptor>) -> Vec<Suggestion> {
        let breakdown = compute_memory(&config, Some(&model_7b())).unwrap();
        generate_optimization_suggestions(&config, &breakdown, gpu)
    }

    fn kinds(suggestions: &[Suggestion]) -> Vec<SuggestionKind> {
        suggestions.iter().map(|s| s.kind).collect()
    }

    fn titles(suggestions: &[Suggestion]) -> Vec<&str> {
        suggestions.iter().map(|s| s.title.as_str()).collect()
    }

    fn fires(config: WorkloadConfig, title: &str) -> bool {
        titles(&advise(config, None)).contains(&title)
    }

    fn sized_gpu(memory_gb: f64) -> GpuDescriptor {
        GpuDescriptor {
            id: "sized".to_string(),
            name: "Sized GPU".to_string(),
            memory_gb,
            price_usd: None,
            cloud_price_usd_per_hour: None,
            architecture: GpuArchitecture::Ampere,
            power_watts: None,
            memory_bandwidth_gbs: None,
            features: BTreeSet::new(),
        }
    }

    /// 7B with real dimensions and a large activation footprint.
    fn activation_heavy_training(checkpointing: bool) -> TrainingConfig {
        TrainingConfig {
            hidden_size: Some(4096),
            num_layers: Some(32),
            batch_size: 16,
            sequence_length: 4096,
            gradient_checkpointing: checkpointing,
            ..Default::default()
        }
    }

    #[test]
    fn test_fp32_fires_precision_rule() {
        let config = WorkloadConfig::Inference(InferenceConfig {
            precision: Precision::Fp32,
            ..Default::default()
        });
        let s = advise(config, None);
        assert_eq!(s[0].kind, SuggestionKind::Precision);
        assert_eq!(s[0].priority, Priority::High);
    }

    #[test]
    fn test_output_sorted_by_priority() {
        let config = WorkloadConfig::Training(TrainingConfig {
            precision: Precision::Fp32,
            mixed_precision: false,
            sequence_length: 8192,
            batch_size: 8,
            ..Default::default()
        });
        let gpu = GpuCatalog::builtin().get_by_id("rtx-4090").unwrap();
        let s = advise(config, Some(gpu));
        assert!(s.len() >= 4);
        assert!(s.windows(2).all(|w| w[0].priority <= w[1].priority));
        assert!(kinds(&s).contains(&SuggestionKind::Hardware));
        assert!(kinds(&s).contains(&SuggestionKind::SequenceLength));
    }

    #[test]
    fn test_lora_rank_rule() {
        let config = WorkloadConfig::FineTuning(FineTuningConfig {
            lora_rank: 128,
            ..Default::default()
        });
        assert!(kinds(&advise(config, None)).contains(&SuggestionKind::LoraRank));

        let config = WorkloadConfig::FineTuning(FineTuningConfig {
            lora_rank: 128,
            method: FineTuningMethod::Prefix,
            ..Default::default()
        });
        assert!(!kinds(&advise(config, None)).contains(&SuggestionKind::LoraRank));
    }

    #[test]
    fn test_full_fine_tune_suggests_peft() {
        let config = WorkloadConfig::FineTuning(FineTuningConfig {
            method: FineTuningMethod::Full,
            ..Default::default()
        });
        let s = advise(config, None);
        assert!(kinds(&s).contains(&SuggestionKind::Peft));
    }

    #[test]
    fn test_underused_gpu_is_low_priority() {
        let config = WorkloadConfig::Inference(InferenceConfig {
            quantization: Quantization::Int4,
            sequence_length: 256,
            ..Default::default()
        });
        let gpu = GpuCatalog::builtin().get_by_id("b200").unwrap();
        let s = advise(config, Some(gpu));
        let spare = s.iter().find(|s| s.title == "GPU has spare memory").unwrap();
        assert_eq!(spare.priority, Priority::Low);
    }

    #[test]
    fn test_grpo_rules() {
        let config = WorkloadConfig::Grpo(GrpoConfig {
            num_generations: 16,
            use_8bit_optimizer: false,
            ..Default::default()
        });
        let k = kinds(&advise(config, None));
        assert!(k.contains(&SuggestionKind::Generations));
        assert!(k.contains(&SuggestionKind::Optimizer));
    }

    #[test]
    fn test_does_not_mutate_inputs() {
        let config = WorkloadConfig::Inference(InferenceConfig::default());
        let breakdown = compute_memory(&config, Some(&model_7b())).unwrap();
        let (config_before, breakdown_before) = (config.clone(), breakdown.clone());
        let _ = generate_optimization_suggestions(&config, &breakdown, None);
        assert_eq!(config, config_before);
        assert_eq!(breakdown, breakdown_before);
    }

    #[test]
    fn test_quiet_for_lean_configuration() {
        let config = WorkloadConfig::Inference(InferenceConfig {
            quantization: Quantization::Int4,
            sequence_length: 1024,
            ..Default::default()
        });
        assert!(advise(config, None).is_empty());
    }

    #[test]
    fn test_mixed_precision_rule() {
        let fp32 = |mixed_precision| {
            WorkloadConfig::Training(TrainingConfig {
                precision: Precision::Fp32,
                mixed_precision,
                ..Default::default()
            })
        };
        assert!(fires(fp32(false), "Enable mixed precision"));
        assert!(!fires(fp32(true), "Enable mixed precision"));
    }

    #[test]
    fn test_checkpointing_rule() {
        let plain = WorkloadConfig::Training(activation_heavy_training(false));
        let s = advise(plain, None);
        let rule = s.iter().find(|s| s.title == "Enable gradient checkpointing").unwrap();
        assert_eq!(rule.kind, SuggestionKind::GradientCheckpointing);
        assert_eq!(rule.priority, Priority::High);

        assert!(!fires(
            WorkloadConfig::Training(activation_heavy_training(true)),
            "Enable gradient checkpointing"
        ));
        // Default shape with real dimensions: activations stay under 30%.
        let light = WorkloadConfig::Training(TrainingConfig {
            hidden_size: Some(4096),
            num_layers: Some(32),
            ..Default::default()
        });
        assert!(!fires(light, "Enable gradient checkpointing"));
    }

    #[test]
    fn test_qlora_rule() {
        let lora = WorkloadConfig::FineTuning(FineTuningConfig::default());
        assert!(fires(lora, "Quantize the base model (QLoRA)"));

        let qlora = WorkloadConfig::FineTuning(FineTuningConfig {
            method: FineTuningMethod::QLora,
            quantization: Quantization::Int4,
            ..Default::default()
        });
        assert!(!fires(qlora, "Quantize the base model (QLoRA)"));
    }

    #[test]
    fn test_unquantized_inference_rule() {
        let fp16 = WorkloadConfig::Inference(InferenceConfig::default());
        assert!(fires(fp16, "Quantize weights for inference"));

        let int8 = WorkloadConfig::Inference(InferenceConfig {
            quantization: Quantization::Int8,
            ..Default::default()
        });
        assert!(!fires(int8, "Quantize weights for inference"));
    }

    #[test]
    fn test_activation_heavy_batch_rule() {
        let heavy = WorkloadConfig::Training(activation_heavy_training(false));
        let s = advise(heavy, None);
        let rule = s.iter().find(|s| s.title == "Reduce batch size").unwrap();
        assert!(rule.implementation.iter().any(|step| step.contains("gradient accumulation")));

        let single = WorkloadConfig::Training(TrainingConfig {
            batch_size: 1,
            ..activation_heavy_training(false)
        });
        assert!(!fires(single, "Reduce batch size"));
    }

    #[test]
    fn test_optimizer_state_rule() {
        let adam = TrainingConfig {
            hidden_size: Some(4096),
            num_layers: Some(32),
            ..Default::default()
        };
        let s = advise(WorkloadConfig::Training(adam.clone()), None);
        let rule = s.iter().find(|s| s.title == "Use an 8-bit optimizer").unwrap();
        assert_eq!(rule.priority, Priority::Low);

        let sgd = TrainingConfig {
            optimizer: Optimizer::Sgd,
            ..adam
        };
        assert!(!fires(WorkloadConfig::Training(sgd), "Use an 8-bit optimizer"));
    }

    #[test]
    fn test_kv_cache_rule() {
        let long_batch = WorkloadConfig::Inference(InferenceConfig {
            quantization: Quantization::Int4,
            batch_size: 8,
            sequence_length: 4096,
            ..Default::default()
        });
        let s = advise(long_batch, None);
        let rule = s.iter().find(|s| s.title == "Shrink the KV cache").unwrap();
        assert_eq!(rule.kind, SuggestionKind::KvCache);
        assert_eq!(rule.implementation.len(), 2);

        assert!(!fires(
            WorkloadConfig::Inference(InferenceConfig::default()),
            "Shrink the KV cache"
        ));
    }

    #[test]
    fn test_image_resolution_rule() {
        let high = WorkloadConfig::Multimodal(MultimodalConfig {
            image_resolution: 1024,
            ..Default::default()
        });
        assert!(fires(high, "Lower image resolution"));

        let standard = WorkloadConfig::Multimodal(MultimodalConfig::default());
        assert!(!fires(standard, "Lower image resolution"));

        let no_images = WorkloadConfig::Multimodal(MultimodalConfig {
            image_resolution: 1024,
            num_images: 0,
            ..Default::default()
        });
        assert!(!fires(no_images, "Lower image resolution"));
    }

    #[test]
    fn test_video_rule() {
        // 10 frames x 576 patches outweigh 512 text tokens.
        let video = WorkloadConfig::Multimodal(MultimodalConfig {
            video_encoder: true,
            video_length: 10.0,
            ..Default::default()
        });
        assert!(fires(video, "Sample fewer video frames"));

        let no_video = WorkloadConfig::Multimodal(MultimodalConfig::default());
        assert!(!fires(no_video, "Sample fewer video frames"));
    }

    #[test]
    fn test_capacity_rule_branches() {
        let config = WorkloadConfig::Inference(InferenceConfig::default());
        let total = compute_memory(&config, Some(&model_7b())).unwrap().total_gb;

        let over = advise(config.clone(), Some(&sized_gpu(total * 0.9)));
        assert!(titles(&over).contains(&"Exceeds target GPU memory"));
        assert!(!titles(&over).contains(&"Target GPU nearly full"));

        let tight = advise(config.clone(), Some(&sized_gpu(total / 0.97)));
        assert!(titles(&tight).contains(&"Target GPU nearly full"));
        assert!(!titles(&tight).contains(&"Exceeds target GPU memory"));

        let comfortable = advise(config, Some(&sized_gpu(total / 0.8)));
        assert!(!kinds(&comfortable).contains(&SuggestionKind::Hardware));
    }

    #[test]
    fn test_same_priority_keeps_rule_order() {
        let config = WorkloadConfig::Training(TrainingConfig {
            precision: Precision::Fp32,
            mixed_precision: false,
            sequence_length: 8192,
            ..activation_heavy_training(false)
        });
        let s = advise(config, None);
        let at = |priority| -> Vec<&str> {
            s.iter()
                .filter(|x| x.priority == priority)
                .map(|x| x.title.as_str())
                .collect()
        };
        assert_eq!(at(Priority::High), vec!["Switch to FP16 or BF16", "Enable gradient checkpointing"]);
        assert_eq!(
            at(Priority::Medium),
            vec!["Enable mixed precision", "Reduce sequence length", "Reduce batch size"]
        );
    }
}
