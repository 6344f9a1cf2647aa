//! Report Rendering
//!
//! Turns an estimate plus its recommendations into either a terminal table
//! or a single JSON document.

use serde::Serialize;
use std::fmt::Write as _;

use vram_core::{
    compute_memory, generate_optimization_suggestions, GpuCatalog, GpuDescriptor, GpuFit, MemoryBreakdown,
    ModelDescriptor, MultiGpuConfig, Suggestion, WorkloadConfig,
};

/// Single-GPU rows shown in text output.
pub const TOP_SINGLE_GPUS: usize = 5;
/// Multi-GPU rows shown in text output.
pub const TOP_MULTI_GPUS: usize = 5;

/// MB below 1 GB, GB below 1024 GB, TB above.
pub fn format_memory(gb: f64) -> String {
    if gb < 1.0 {
        format!("{:.0} MB", gb * 1024.0)
    } else if gb < 1024.0 {
        format!("{:.2} GB", gb)
    } else {
        format!("{:.2} TB", gb / 1024.0)
    }
}

fn format_price(price: Option<f64>) -> String {
    match price {
        Some(p) => format!("${:.0}", p),
        None => "n/a".to_string(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EstimateReport {
    pub mode: &'static str,
    pub model: Option<String>,
    pub config: WorkloadConfig,
    pub breakdown: MemoryBreakdown,
    pub single_gpu: Vec<GpuFit<'static>>,
    /// Only filled when no single card holds the requirement.
    pub multi_gpu: Vec<MultiGpuConfig<'static>>,
    pub suggestions: Vec<Suggestion>,
}

impl EstimateReport {
    pub fn build(
        config: WorkloadConfig,
        model: Option<&ModelDescriptor>,
        target_gpu: Option<&GpuDescriptor>,
    ) -> vram_core::Result<Self> {
        let breakdown = compute_memory(&config, model)?;
        let catalog = GpuCatalog::builtin();
        let single_gpu = catalog.recommend_single(breakdown.total_gb)?;
        let multi_gpu = if single_gpu.is_empty() {
            catalog.recommend_multi(breakdown.total_gb)?
        } else {
            Vec::new()
        };
        let suggestions = generate_optimization_suggestions(&config, &breakdown, target_gpu);

        tracing::debug!(
            mode = config.mode_name(),
            total_gb = breakdown.total_gb,
            single = single_gpu.len(),
            multi = multi_gpu.len(),
            "Report assembled"
        );

        Ok(Self {
            mode: config.mode_name(),
            model: model.map(|m| m.id.clone()),
            config,
            breakdown,
            single_gpu,
            multi_gpu,
            suggestions,
        })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let title = match &self.model {
            Some(id) => format!("{} / {}", self.mode, id),
            None => self.mode.to_string(),
        };
        let _ = writeln!(out, "=== VRAM Estimate: {} ===", title);
        out.push_str(&render_breakdown(&self.breakdown));
        out.push('\n');

        if self.single_gpu.is_empty() {
            let _ = writeln!(out, "\n⚠️  No single GPU holds {}.", format_memory(self.breakdown.total_gb));
            if !self.multi_gpu.is_empty() {
                out.push_str("\nMulti-GPU options:\n");
                out.push_str(&render_multi(&self.multi_gpu, TOP_MULTI_GPUS));
                out.push('\n');
            }
        } else {
            out.push_str("\nRecommended GPUs:\n");
            out.push_str(&render_single(&self.single_gpu, TOP_SINGLE_GPUS));
            out.push('\n');
        }

        if !self.suggestions.is_empty() {
            out.push_str("\nOptimization suggestions:\n");
            out.push_str(&render_suggestions(&self.suggestions));
            out.push('\n');
        }
        out
    }
}

pub fn render_breakdown(breakdown: &MemoryBreakdown) -> String {
    let mut out = String::new();
    for item in &breakdown.items {
        let _ = writeln!(
            out,
            "  {:<18} {:>12}  {:>5.1}%",
            item.label,
            format_memory(item.value_gb),
            item.percentage
        );
    }
    let _ = write!(out, "  {:<18} {:>12}", "Total", format_memory(breakdown.total_gb));

    if let Some(tokens) = &breakdown.modality_tokens {
        let _ = write!(
            out,
            "\n  Tokens: text {} / image {} / audio {} / video {} (total {})",
            tokens.text, tokens.image, tokens.audio, tokens.video, tokens.total
        );
    }
    if breakdown.dimensions_estimated {
        out.push_str("\n  ⚠️  Model dimensions were estimated from the parameter count.");
    }
    out
}

pub fn render_single(fits: &[GpuFit<'_>], limit: usize) -> String {
    fits.iter()
        .take(limit)
        .map(|f| {
            format!(
                "  {:<24} {:>10}  {:>5.1}% used  {}",
                f.gpu.name,
                format_memory(f.gpu.memory_gb),
                f.utilization_pct,
                format_price(f.gpu.price_usd)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_multi(configs: &[MultiGpuConfig<'_>], limit: usize) -> String {
    configs
        .iter()
        .take(limit)
        .map(|c| {
            format!(
                "  {:<44} {:>10}  ${:.0} ({:.0} $/GB, {:.1}% used)",
                c.suggestion,
                format_memory(c.total_memory_gb),
                c.total_cost_usd,
                c.cost_per_gb,
                c.utilization_pct
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_suggestions(suggestions: &[Suggestion]) -> String {
    let mut out = Vec::new();
    for s in suggestions {
        let mut block = format!("  [{:?}] {}\n      {}\n      Impact: {}", s.priority, s.title, s.description, s.impact);
        for step in &s.implementation {
            let _ = write!(block, "\n      - {}", step);
        }
        out.push(block);
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use vram_core::{InferenceConfig, ModelCatalog, TrainingConfig};

    #[test]
    fn test_format_memory_units() {
        assert_eq!(format_memory(0.5), "512 MB");
        assert_eq!(format_memory(0.0), "0 MB");
        assert_eq!(format_memory(1.0), "1.00 GB");
        assert_eq!(format_memory(13.0385), "13.04 GB");
        assert_eq!(format_memory(1023.99), "1023.99 GB");
        assert_eq!(format_memory(2048.0), "2.00 TB");
    }

    #[test]
    fn test_report_for_small_model_lists_single_gpus() -> anyhow::Result<()> {
        let model = ModelCatalog::builtin().get_by_id("llama-2-7b")?;
        let report = EstimateReport::build(WorkloadConfig::Inference(InferenceConfig::default()), Some(model), None)?;
        assert_eq!(report.mode, "inference");
        assert_eq!(report.model.as_deref(), Some("llama-2-7b"));
        assert!(!report.single_gpu.is_empty());
        assert!(report.multi_gpu.is_empty());

        let text = report.render();
        assert!(text.contains("Model Weights"));
        assert!(text.contains("Recommended GPUs"));
        Ok(())
    }

    #[test]
    fn test_report_for_huge_training_falls_back_to_multi_gpu() -> anyhow::Result<()> {
        let config = WorkloadConfig::Training(TrainingConfig {
            model_params_billions: 70.0,
            ..Default::default()
        });
        let report = EstimateReport::build(config, None, None)?;
        assert!(report.single_gpu.is_empty());
        assert!(!report.multi_gpu.is_empty());
        assert!(report.render().contains("Multi-GPU options"));
        Ok(())
    }

    #[test]
    fn test_json_document_has_all_sections() -> anyhow::Result<()> {
        let model = ModelCatalog::builtin().get_by_id("gpt2")?;
        let report = EstimateReport::build(WorkloadConfig::Inference(InferenceConfig::default()), Some(model), None)?;
        let value: serde_json::Value = serde_json::from_str(&report.to_json()?)?;
        for key in ["mode", "model", "config", "breakdown", "single_gpu", "multi_gpu", "suggestions"] {
            assert!(value.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(value["config"]["mode"], "inference");
        Ok(())
    }
}
