//! VRAM Core
//!
//! Memory estimation for running and training large language and multimodal
//! models, plus GPU recommendation on top of the estimates.
//!
//! - precision: bytes-per-parameter and quantization ratios
//! - catalog: builtin model and GPU databases
//! - config: per-mode workload configurations
//! - engine: the memory formulas
//! - recommend: single-GPU ranking and multi-node search
//! - advisor: rule-based optimization suggestions
//!
//! Everything here is synchronous and pure; the builtin catalogs are
//! immutable after first use.

pub mod advisor;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod precision;
pub mod recommend;

pub use advisor::{generate_optimization_suggestions, Priority, Suggestion, SuggestionKind};
pub use catalog::{GpuArchitecture, GpuCatalog, GpuDescriptor, ModelArchitecture, ModelCatalog, ModelDescriptor};
pub use config::{
    FineTuningConfig, FineTuningMethod, GrpoConfig, InferenceConfig, MultimodalConfig, Optimizer, TrainingConfig,
    WorkloadConfig,
};
pub use engine::{
    compute_fine_tuning_memory, compute_grpo_memory, compute_inference_memory, compute_memory,
    compute_multimodal_memory, compute_training_memory, BreakdownItem, Component, MemoryBreakdown, ModalityTokens,
};
pub use error::{EngineError, Result};
pub use precision::{Precision, Quantization};
pub use recommend::{recommend_multi_gpu_configs, recommend_single_gpus, GpuFit, MultiGpuConfig};
