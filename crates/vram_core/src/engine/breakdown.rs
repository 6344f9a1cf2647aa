//! MemoryBreakdown - Engine output structure

use serde::{Deserialize, Serialize};

/// Memory category a share of the estimate is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    ModelWeights,
    Gradients,
    OptimizerState,
    Activations,
    KvCache,
    Other,
}

impl Component {
    pub fn label(self) -> &'static str {
        match self {
            Component::ModelWeights => "Model Weights",
            Component::Gradients => "Gradients",
            Component::OptimizerState => "Optimizer State",
            Component::Activations => "Activations",
            Component::KvCache => "KV Cache",
            Component::Other => "Other",
        }
    }
}

/// One display row: label, size and share of the total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownItem {
    pub component: Component,
    pub label: String,
    pub value_gb: f64,
    pub percentage: f64,
}

/// Effective sequence length contributed by each modality.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalityTokens {
    pub text: u64,
    pub image: u64,
    pub audio: u64,
    pub video: u64,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryBreakdown {
    pub total_gb: f64,
    pub model_weights: f64,
    pub gradients: f64,
    pub optimizer_state: f64,
    pub activations: f64,
    pub kv_cache: f64,
    pub other: f64,
    /// Rows for the components this workload produces, in display order.
    pub items: Vec<BreakdownItem>,
    /// True when hidden size or layer count came from the fallback estimators.
    pub dimensions_estimated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modality_tokens: Option<ModalityTokens>,
}

impl MemoryBreakdown {
    /// Builds a breakdown whose total is exactly the sum of `parts`.
    ///
    /// Components not listed stay at zero and get no display row.
    pub fn new(parts: &[(Component, f64)]) -> Self {
        let mut breakdown = Self {
            total_gb: 0.0,
            model_weights: 0.0,
            gradients: 0.0,
            optimizer_state: 0.0,
            activations: 0.0,
            kv_cache: 0.0,
            other: 0.0,
            items: Vec::with_capacity(parts.len()),
            dimensions_estimated: false,
            modality_tokens: None,
        };

        for &(component, value) in parts {
            debug_assert!(value >= 0.0, "{} is negative: {}", component.label(), value);
            let value = value.max(0.0);
            *breakdown.slot_mut(component) += value;
            breakdown.total_gb += value;
        }

        let total = breakdown.total_gb;
        breakdown.items = parts
            .iter()
            .map(|&(component, value)| BreakdownItem {
                component,
                label: component.label().to_string(),
                value_gb: value.max(0.0),
                percentage: percentage_of(value.max(0.0), total),
            })
            .collect();

        breakdown
    }

    pub fn with_estimated_dimensions(mut self, estimated: bool) -> Self {
        self.dimensions_estimated = estimated;
        self
    }

    pub fn with_modality_tokens(mut self, tokens: ModalityTokens) -> Self {
        self.modality_tokens = Some(tokens);
        self
    }

    pub fn get(&self, component: Component) -> f64 {
        match component {
            Component::ModelWeights => self.model_weights,
            Component::Gradients => self.gradients,
            Component::OptimizerState => self.optimizer_state,
            Component::Activations => self.activations,
            Component::KvCache => self.kv_cache,
            Component::Other => self.other,
        }
    }

    fn slot_mut(&mut self, component: Component) -> &mut f64 {
        match component {
            Component::ModelWeights => &mut self.model_weights,
            Component::Gradients => &mut self.gradients,
            Component::OptimizerState => &mut self.optimizer_state,
            Component::Activations => &mut self.activations,
            Component::KvCache => &mut self.kv_cache,
            Component::Other => &mut self.other,
        }
    }

    pub fn components_sum(&self) -> f64 {
        self.model_weights + self.gradients + self.optimizer_state + self.activations + self.kv_cache + self.other
    }

    /// Share of the total held by `component`, 0 when the total is 0.
    pub fn share(&self, component: Component) -> f64 {
        percentage_of(self.get(component), self.total_gb)
    }

    /// Largest component, if any memory is attributed at all.
    pub fn dominant(&self) -> Option<Component> {
        self.items
            .iter()
            .filter(|item| item.value_gb > 0.0)
            .max_by(|a, b| a.value_gb.total_cmp(&b.value_gb))
            .map(|item| item.component)
    }
}

fn percentage_of(value: f64, total: f64) -> f64 {
    if total > 0.0 {
        100.0 * value / total
    } else {
        0.0
    }
}
