//! Multimodal mode
//!
//! Every modality is turned into tokens for the language backbone, the
//! counts are summed into one effective sequence length, and the standard
//! activation and KV-cache formulas run on that length:
//!
//! - text: tokens as given
//! - image: `(resolution / patch)²` patches per image
//! - audio: one token per 80 ms of audio
//! - video: `(resolution / patch)²` patches per sampled frame
//!
//! Modalities with an independent encoder also add that encoder's weights
//! at the modality's own precision.

use tracing::debug;

use super::breakdown::{Component, MemoryBreakdown, ModalityTokens};
use super::dimensions::resolve_dimensions;
use super::formulas::{activations_gb, kv_cache_gb, model_weights_gb, params_to_gb};
use super::validate_model;
use crate::catalog::ModelDescriptor;
use crate::config::MultimodalConfig;
use crate::error::Result;

pub const AUDIO_MS_PER_TOKEN: f64 = 80.0;

/// Encoder sizes in billions of parameters (ViT-L/14 class).
pub const VISION_ENCODER_PARAMS_B: f64 = 0.3;
pub const AUDIO_ENCODER_PARAMS_B: f64 = 0.3;
pub const VIDEO_ENCODER_PARAMS_B: f64 = 0.3;

pub fn patches_per_frame(resolution: u32, patch_size: u32) -> u64 {
    if patch_size == 0 {
        return 0;
    }
    let side = (resolution / patch_size) as u64;
    side.saturating_mul(side)
}

/// Per-modality token counts for one sample.
///
/// Counts saturate at `u64::MAX` instead of overflowing on extreme inputs.
pub fn modality_tokens(config: &MultimodalConfig) -> ModalityTokens {
    let patches = patches_per_frame(config.image_resolution, config.patch_size);

    let text = config.sequence_length as u64;
    let image = patches.saturating_mul(config.num_images as u64);
    let audio = if config.has_audio() {
        (config.audio_window_length * 1000.0 / AUDIO_MS_PER_TOKEN).floor() as u64
    } else {
        0
    };
    let video = if config.has_video() {
        let frames = (config.video_frame_rate * config.video_length).floor() as u64;
        frames.saturating_mul(patches)
    } else {
        0
    };

    ModalityTokens {
        text,
        image,
        audio,
        video,
        total: text.saturating_add(image).saturating_add(audio).saturating_add(video),
    }
}

pub fn compute_multimodal_memory(config: &MultimodalConfig, model: &ModelDescriptor) -> Result<MemoryBreakdown> {
    config.validate()?;
    validate_model(model)?;

    let dims = resolve_dimensions(model);
    let tokens = modality_tokens(config);
    let batch = config.batch_size as f64;
    let seq_len = tokens.total as f64;
    let hidden = dims.hidden_size as f64;
    let layers = dims.num_layers as f64;

    let mut weights = model_weights_gb(model.params_billions, config.text_precision, config.quantization);
    if config.vision_encoder && tokens.image > 0 {
        weights += params_to_gb(VISION_ENCODER_PARAMS_B, config.vision_precision.bytes_per_param());
    }
    if config.audio_encoder && tokens.audio > 0 {
        weights += params_to_gb(AUDIO_ENCODER_PARAMS_B, config.audio_precision.bytes_per_param());
    }
    if config.video_encoder && tokens.video > 0 {
        weights += params_to_gb(VIDEO_ENCODER_PARAMS_B, config.video_precision.bytes_per_param());
    }

    let activations = activations_gb(batch, seq_len, hidden, layers, config.text_precision);
    let kv_cache = kv_cache_gb(batch, seq_len, hidden, layers, config.text_precision);

    let breakdown = MemoryBreakdown::new(&[
        (Component::ModelWeights, weights),
        (Component::Activations, activations),
        (Component::KvCache, kv_cache),
    ])
    .with_estimated_dimensions(dims.estimated)
    .with_modality_tokens(tokens);

    debug!(
        model = %model.id,
        text_tokens = tokens.text,
        image_tokens = tokens.image,
        audio_tokens = tokens.audio,
        video_tokens = tokens.video,
        total_gb = breakdown.total_gb,
        "Multimodal estimate computed"
    );
    Ok(breakdown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ModelArchitecture;
    use crate::precision::Precision;

    fn llava() -> ModelDescriptor {
        ModelDescriptor::new("llava", "LLaVA", 7.0, ModelArchitecture::Multimodal).with_dims(4096, 32, 32, 32000)
    }

    #[test]
    fn test_token_counts_per_modality() {
        let config = MultimodalConfig {
            sequence_length: 100,
            image_resolution: 336,
            patch_size: 14,
            num_images: 2,
            audio_window_length: 30.0,
            video_frame_rate: 2.0,
            video_length: 5.0,
            ..Default::default()
        };
        let tokens = modality_tokens(&config);
        assert_eq!(tokens.text, 100);
        assert_eq!(tokens.image, 576 * 2);
        assert_eq!(tokens.audio, 375);
        assert_eq!(tokens.video, 10 * 576);
        assert_eq!(tokens.total, 100 + 1152 + 375 + 5760);
    }

    #[test]
    fn test_extreme_inputs_saturate() {
        let long_video = MultimodalConfig {
            video_encoder: true,
            video_frame_rate: 30.0,
            video_length: 1e18,
            ..Default::default()
        };
        assert!(long_video.validate().is_ok());
        let tokens = modality_tokens(&long_video);
        assert_eq!(tokens.video, u64::MAX);
        assert_eq!(tokens.total, u64::MAX);

        let huge_images = MultimodalConfig {
            image_resolution: u32::MAX,
            patch_size: 1,
            num_images: 2,
            ..Default::default()
        };
        assert_eq!(modality_tokens(&huge_images).image, u64::MAX);

        let b = compute_multimodal_memory(&long_video, &llava()).unwrap();
        assert!(b.total_gb.is_finite());
        assert!((b.components_sum() - b.total_gb).abs() <= 1e-9 * b.total_gb);
    }

    #[test]
    fn test_breakdown_exposes_tokens() {
        let b = compute_multimodal_memory(&MultimodalConfig::default(), &llava()).unwrap();
        let tokens = b.modality_tokens.expect("multimodal breakdown carries tokens");
        assert_eq!(tokens.total, 512 + 576);
        assert!((b.components_sum() - b.total_gb).abs() < 1e-9);
    }

    #[test]
    fn test_encoder_adds_weights_at_modality_precision() {
        let without = compute_multimodal_memory(
            &MultimodalConfig {
                vision_encoder: false,
                ..Default::default()
            },
            &llava(),
        )
        .unwrap();
        let with_fp32 = compute_multimodal_memory(
            &MultimodalConfig {
                vision_encoder: true,
                vision_precision: Precision::Fp32,
                ..Default::default()
            },
            &llava(),
        )
        .unwrap();
        let encoder = params_to_gb(VISION_ENCODER_PARAMS_B, 4.0);
        assert!((with_fp32.model_weights - without.model_weights - encoder).abs() < 1e-9);
        assert_eq!(with_fp32.activations, without.activations);
    }

    #[test]
    fn test_sample_rate_leaves_audio_tokens_unchanged() {
        let base = MultimodalConfig {
            audio_window_length: 8.0,
            audio_encoder: true,
            ..Default::default()
        };
        let resampled = MultimodalConfig {
            audio_sample_rate: 44100,
            ..base.clone()
        };
        assert_eq!(modality_tokens(&base), modality_tokens(&resampled));
        assert_eq!(modality_tokens(&base).audio, 100);
    }

    #[test]
    fn test_text_only_matches_plain_sequence() {
        let config = MultimodalConfig {
            num_images: 0,
            ..Default::default()
        };
        let b = compute_multimodal_memory(&config, &llava()).unwrap();
        let expected = activations_gb(1.0, 512.0, 4096.0, 32.0, Precision::Fp16);
        assert!((b.activations - expected).abs() < 1e-12);
    }
}
