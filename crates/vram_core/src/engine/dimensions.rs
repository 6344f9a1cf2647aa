//! Architecture dimension resolution
//!
//! Activation and KV-cache formulas need hidden size and layer count. When a
//! descriptor does not carry them, these rules of thumb fill the gap:
//!
//! - A dense transformer block holds roughly `12·h²` parameters (4h² for the
//!   attention projections, 8h² for a 4x-wide MLP), giving `h ≈ sqrt(P / 12)`.
//! - Depth grows slowly with size; `4·log2(P)` with `P` in billions.
//!
//! Both are coarse. Results built on them carry `dimensions_estimated = true`.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::catalog::ModelDescriptor;

pub const FALLBACK_VOCAB_SIZE: u32 = 32_000;
/// Typical attention head width used to derive a head count.
pub const TYPICAL_HEAD_DIM: u32 = 128;

pub fn estimate_hidden_size(params_billions: f64) -> u32 {
    let h = (params_billions.max(0.0) * 1e9 / 12.0).sqrt().round();
    (h as u32).max(1)
}

pub fn estimate_num_layers(params_billions: f64) -> u32 {
    if params_billions <= 0.0 {
        return 1;
    }
    let layers = (4.0 * params_billions.log2()).round();
    if layers < 1.0 {
        1
    } else {
        layers as u32
    }
}

pub fn estimate_num_heads(hidden_size: u32) -> u32 {
    (hidden_size / TYPICAL_HEAD_DIM).max(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedDimensions {
    pub hidden_size: u32,
    pub num_layers: u32,
    pub num_heads: u32,
    pub vocab_size: u32,
    pub estimated: bool,
}

/// Dimensions from explicit values where present, estimators otherwise.
pub fn resolve_from_params(
    params_billions: f64,
    hidden_size: Option<u32>,
    num_layers: Option<u32>,
) -> ResolvedDimensions {
    let estimated = hidden_size.is_none() || num_layers.is_none();
    let hidden_size = hidden_size.unwrap_or_else(|| estimate_hidden_size(params_billions));
    let num_layers = num_layers.unwrap_or_else(|| estimate_num_layers(params_billions));
    if estimated {
        warn!(
            params_billions,
            hidden_size, num_layers, "⚠️ Architecture dimensions estimated from parameter count"
        );
    }
    ResolvedDimensions {
        hidden_size,
        num_layers,
        num_heads: estimate_num_heads(hidden_size),
        vocab_size: FALLBACK_VOCAB_SIZE,
        estimated,
    }
}

pub fn resolve_dimensions(model: &ModelDescriptor) -> ResolvedDimensions {
    let mut dims = resolve_from_params(model.params_billions, model.hidden_size, model.num_layers);
    if let Some(heads) = model.num_heads {
        dims.num_heads = heads;
    }
    if let Some(vocab) = model.vocab_size {
        dims.vocab_size = vocab;
    }
    dims
}
