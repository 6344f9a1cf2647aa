//! Builtin model table
//!
//! Parameter counts are the nominal sizes models are marketed under.

use super::{ModelArchitecture as Arch, ModelDescriptor};

pub(super) fn builtin_models() -> Vec<ModelDescriptor> {
    vec![
        ModelDescriptor::new("gpt2", "GPT-2 Small", 0.124, Arch::Transformer).with_dims(768, 12, 12, 50257),
        ModelDescriptor::new("phi-3-mini", "Phi-3 Mini", 3.8, Arch::Transformer).with_dims(3072, 32, 32, 32064),
        ModelDescriptor::new("llama-2-7b", "Llama 2 7B", 7.0, Arch::Transformer).with_dims(4096, 32, 32, 32000),
        ModelDescriptor::new("llama-2-13b", "Llama 2 13B", 13.0, Arch::Transformer).with_dims(5120, 40, 40, 32000),
        ModelDescriptor::new("llama-2-70b", "Llama 2 70B", 70.0, Arch::Transformer).with_dims(8192, 80, 64, 32000),
        ModelDescriptor::new("llama-3-8b", "Llama 3 8B", 8.0, Arch::Transformer).with_dims(4096, 32, 32, 128256),
        ModelDescriptor::new("llama-3-70b", "Llama 3 70B", 70.0, Arch::Transformer).with_dims(8192, 80, 64, 128256),
        ModelDescriptor::new("llama-3.1-405b", "Llama 3.1 405B", 405.0, Arch::Transformer)
            .with_dims(16384, 126, 128, 128256),
        ModelDescriptor::new("mistral-7b", "Mistral 7B", 7.3, Arch::Transformer).with_dims(4096, 32, 32, 32000),
        ModelDescriptor::new("gemma-7b", "Gemma 7B", 8.5, Arch::Transformer).with_dims(3072, 28, 16, 256000),
        ModelDescriptor::new("qwen2.5-7b", "Qwen2.5 7B", 7.6, Arch::Transformer).with_dims(3584, 28, 28, 152064),
        ModelDescriptor::new("qwen2-72b", "Qwen2 72B", 72.7, Arch::Transformer).with_dims(8192, 80, 64, 152064),
        ModelDescriptor::new("falcon-40b", "Falcon 40B", 40.0, Arch::Transformer).with_dims(8192, 60, 128, 65024),
        ModelDescriptor::new("mixtral-8x7b", "Mixtral 8x7B", 46.7, Arch::Moe)
            .with_dims(4096, 32, 32, 32000)
            .with_active_params(12.9),
        ModelDescriptor::new("deepseek-v3", "DeepSeek V3", 671.0, Arch::Moe)
            .with_dims(7168, 61, 128, 129280)
            .with_active_params(37.0),
        ModelDescriptor::new("chatglm3-6b", "ChatGLM3 6B", 6.2, Arch::Glm).with_dims(4096, 28, 32, 65024),
        ModelDescriptor::new("glm-4-9b", "GLM-4 9B", 9.4, Arch::Glm).with_dims(4096, 40, 32, 151552),
        ModelDescriptor::new("llava-1.5-7b", "LLaVA 1.5 7B", 7.1, Arch::Multimodal).with_dims(4096, 32, 32, 32000),
        ModelDescriptor::new("qwen2-vl-7b", "Qwen2-VL 7B", 8.3, Arch::Multimodal).with_dims(3584, 28, 28, 152064),
        ModelDescriptor::new("bge-large-en", "BGE Large EN", 0.335, Arch::Embedding).with_dims(1024, 24, 16, 30522),
    ]
}
