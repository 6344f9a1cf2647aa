//! Catalog Module - Static model and GPU databases
//!
//! Read-only descriptors used purely for sizing:
//! - ModelDescriptor / ModelCatalog: known models and their dimensions
//! - GpuDescriptor / GpuCatalog: purchasable or rentable accelerators
//!
//! The builtin catalogs are built once and shared; callers resolve ids here
//! before handing descriptors to the formula engine.

use std::collections::BTreeSet;
use std::fmt::{self, Display};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

mod gpus;
mod models;

/// Architecture tag. Classification only; the formulas do not branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelArchitecture {
    #[default]
    Transformer,
    Moe,
    Glm,
    Multimodal,
    Embedding,
}

impl Display for ModelArchitecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ModelArchitecture::Transformer => "transformer",
            ModelArchitecture::Moe => "moe",
            ModelArchitecture::Glm => "glm",
            ModelArchitecture::Multimodal => "multimodal",
            ModelArchitecture::Embedding => "embedding",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub id: String,
    pub name: String,
    pub params_billions: f64,
    /// Parameters active per forward pass (mixture-of-experts only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_params_billions: Option<f64>,
    #[serde(default)]
    pub architecture: ModelArchitecture,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_layers: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_heads: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vocab_size: Option<u32>,
}

impl ModelDescriptor {
    /// Descriptor without architecture dimensions; the engine estimates them.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        params_billions: f64,
        architecture: ModelArchitecture,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            params_billions,
            active_params_billions: None,
            architecture,
            hidden_size: None,
            num_layers: None,
            num_heads: None,
            vocab_size: None,
        }
    }

    pub fn with_dims(mut self, hidden_size: u32, num_layers: u32, num_heads: u32, vocab_size: u32) -> Self {
        self.hidden_size = Some(hidden_size);
        self.num_layers = Some(num_layers);
        self.num_heads = Some(num_heads);
        self.vocab_size = Some(vocab_size);
        self
    }

    pub fn with_active_params(mut self, active_params_billions: f64) -> Self {
        self.active_params_billions = Some(active_params_billions);
        self
    }

    /// Ad-hoc model sized only by parameter count (e.g. from a CLI flag).
    pub fn custom(params_billions: f64) -> Self {
        Self::new(
            "custom",
            format!("Custom {}B", params_billions),
            params_billions,
            ModelArchitecture::Transformer,
        )
    }
}

/// GPU generation / vendor family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GpuArchitecture {
    Turing,
    Ampere,
    #[serde(rename = "Ada Lovelace")]
    AdaLovelace,
    Hopper,
    Blackwell,
    #[serde(rename = "CDNA3")]
    Cdna3,
}

impl Display for GpuArchitecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GpuArchitecture::Turing => "Turing",
            GpuArchitecture::Ampere => "Ampere",
            GpuArchitecture::AdaLovelace => "Ada Lovelace",
            GpuArchitecture::Hopper => "Hopper",
            GpuArchitecture::Blackwell => "Blackwell",
            GpuArchitecture::Cdna3 => "CDNA3",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpuDescriptor {
    pub id: String,
    pub name: String,
    pub memory_gb: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_usd: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_price_usd_per_hour: Option<f64>,
    pub architecture: GpuArchitecture,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_watts: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_bandwidth_gbs: Option<u32>,
    #[serde(default)]
    pub features: BTreeSet<String>,
}

impl GpuDescriptor {
    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.contains(feature)
    }

    /// Percentage of this card's memory a requirement would occupy.
    pub fn utilization_pct(&self, required_gb: f64) -> f64 {
        if self.memory_gb <= 0.0 {
            return 0.0;
        }
        required_gb / self.memory_gb * 100.0
    }
}

/// Immutable list of known models.
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    models: Vec<ModelDescriptor>,
}

impl ModelCatalog {
    pub fn new(models: Vec<ModelDescriptor>) -> Self {
        Self { models }
    }

    /// Shared builtin catalog.
    pub fn builtin() -> &'static ModelCatalog {
        static CATALOG: OnceLock<ModelCatalog> = OnceLock::new();
        CATALOG.get_or_init(|| ModelCatalog::new(models::builtin_models()))
    }

    pub fn all(&self) -> &[ModelDescriptor] {
        &self.models
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn get_by_id(&self, id: &str) -> Result<&ModelDescriptor> {
        self.models
            .iter()
            .find(|m| m.id.eq_ignore_ascii_case(id))
            .ok_or_else(|| EngineError::ModelNotFound(id.to_string()))
    }

    pub fn filter<P>(&self, predicate: P) -> Vec<&ModelDescriptor>
    where
        P: Fn(&ModelDescriptor) -> bool,
    {
        self.models.iter().filter(|m| predicate(m)).collect()
    }

    /// Case-insensitive substring match on id or name.
    pub fn search(&self, query: &str) -> Vec<&ModelDescriptor> {
        let query = query.to_lowercase();
        self.filter(|m| m.id.to_lowercase().contains(&query) || m.name.to_lowercase().contains(&query))
    }
}

/// Immutable list of known GPUs, in display order.
#[derive(Debug, Clone, Default)]
pub struct GpuCatalog {
    gpus: Vec<GpuDescriptor>,
}

impl GpuCatalog {
    pub fn new(gpus: Vec<GpuDescriptor>) -> Self {
        Self { gpus }
    }

    /// Shared builtin catalog.
    pub fn builtin() -> &'static GpuCatalog {
        static CATALOG: OnceLock<GpuCatalog> = OnceLock::new();
        CATALOG.get_or_init(|| GpuCatalog::new(gpus::builtin_gpus()))
    }

    pub fn all(&self) -> &[GpuDescriptor] {
        &self.gpus
    }

    pub fn len(&self) -> usize {
        self.gpus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gpus.is_empty()
    }

    pub fn get_by_id(&self, id: &str) -> Result<&GpuDescriptor> {
        self.gpus
            .iter()
            .find(|g| g.id.eq_ignore_ascii_case(id))
            .ok_or_else(|| EngineError::GpuNotFound(id.to_string()))
    }

    pub fn filter<P>(&self, predicate: P) -> Vec<&GpuDescriptor>
    where
        P: Fn(&GpuDescriptor) -> bool,
    {
        self.gpus.iter().filter(|g| predicate(g)).collect()
    }
}
