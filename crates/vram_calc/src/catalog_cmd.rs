//! Catalog & Recommendation Subcommands
//!
//! `models`, `gpus` and `recommend`: read-only views over the builtin
//! databases.

use anyhow::{bail, Result};
use clap::Args;
use serde::Serialize;

use vram_core::{recommend_multi_gpu_configs, recommend_single_gpus, GpuCatalog, GpuDescriptor, ModelCatalog, ModelDescriptor};

use crate::app_config::AppConfig;
use crate::report::{format_memory, render_multi, render_single};

#[derive(Args, Debug, Clone, Default)]
pub struct ModelsArgs {
    /// Substring match on id or name
    #[arg(short, long)]
    pub search: Option<String>,

    /// Minimum size in billions of parameters
    #[arg(long)]
    pub min_params: Option<f64>,

    /// Maximum size in billions of parameters
    #[arg(long)]
    pub max_params: Option<f64>,

    #[arg(long)]
    pub json: bool,
}

impl ModelsArgs {
    pub fn select<'a>(&self, catalog: &'a ModelCatalog) -> Vec<&'a ModelDescriptor> {
        let base = match &self.search {
            Some(query) => catalog.search(query),
            None => catalog.all().iter().collect(),
        };
        base.into_iter()
            .filter(|m| self.min_params.map_or(true, |min| m.params_billions >= min))
            .filter(|m| self.max_params.map_or(true, |max| m.params_billions <= max))
            .collect()
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct GpusArgs {
    /// Minimum memory in GB
    #[arg(long)]
    pub min_memory: Option<f64>,

    /// Only cards tagged with this feature (e.g. fp8, nvlink)
    #[arg(short, long)]
    pub feature: Option<String>,

    #[arg(long)]
    pub json: bool,
}

impl GpusArgs {
    pub fn select<'a>(&self, catalog: &'a GpuCatalog) -> Vec<&'a GpuDescriptor> {
        catalog.filter(|g| {
            self.min_memory.map_or(true, |min| g.memory_gb >= min)
                && self.feature.as_deref().map_or(true, |f| g.has_feature(f))
        })
    }
}

#[derive(Args, Debug, Clone)]
pub struct RecommendArgs {
    /// Required memory in GB
    pub required_gb: f64,

    /// Rows to show per table
    #[arg(short, long, default_value_t = 5)]
    pub top: usize,

    /// Always include multi-GPU layouts
    #[arg(long)]
    pub multi: bool,

    #[arg(long)]
    pub json: bool,
}

pub fn run_models(args: ModelsArgs, app: &AppConfig) -> Result<()> {
    let models = args.select(ModelCatalog::builtin());
    if args.json || app.json_output {
        println!("{}", serde_json::to_string_pretty(&models)?);
        return Ok(());
    }

    println!("📦 {} model(s)", models.len());
    for m in models {
        let active = m
            .active_params_billions
            .map(|a| format!(" ({}B active)", a))
            .unwrap_or_default();
        println!("  {:<16} {:<28} {:>8}B{}  [{}]", m.id, m.name, m.params_billions, active, m.architecture);
    }
    Ok(())
}

pub fn run_gpus(args: GpusArgs, app: &AppConfig) -> Result<()> {
    let gpus = args.select(GpuCatalog::builtin());
    if args.json || app.json_output {
        println!("{}", serde_json::to_string_pretty(&gpus)?);
        return Ok(());
    }

    println!("🖥️  {} GPU(s)", gpus.len());
    for g in gpus {
        let price = g.price_usd.map(|p| format!("${:.0}", p)).unwrap_or_else(|| "n/a".to_string());
        println!(
            "  {:<18} {:<26} {:>10}  {:>8}  {}",
            g.id,
            g.name,
            format_memory(g.memory_gb),
            price,
            g.architecture
        );
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct Recommendation {
    required_gb: f64,
    single_gpu: Vec<vram_core::GpuFit<'static>>,
    multi_gpu: Vec<vram_core::MultiGpuConfig<'static>>,
}

pub fn run_recommend(args: RecommendArgs, app: &AppConfig) -> Result<()> {
    if !args.required_gb.is_finite() || args.required_gb < 0.0 {
        bail!("Required memory must be a non-negative number of GB");
    }

    let single_gpu = recommend_single_gpus(args.required_gb)?;
    let multi_gpu = if args.multi || single_gpu.is_empty() {
        recommend_multi_gpu_configs(args.required_gb)?
    } else {
        Vec::new()
    };
    tracing::info!(
        "🔎 {} single-GPU and {} multi-GPU options for {}",
        single_gpu.len(),
        multi_gpu.len(),
        format_memory(args.required_gb)
    );

    if args.json || app.json_output {
        let doc = Recommendation {
            required_gb: args.required_gb,
            single_gpu,
            multi_gpu,
        };
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    if single_gpu.is_empty() {
        println!("⚠️  No single GPU holds {}.", format_memory(args.required_gb));
    } else {
        println!("Single GPU:");
        println!("{}", render_single(&single_gpu, args.top));
    }
    if !multi_gpu.is_empty() {
        println!("Multi-GPU:");
        println!("{}", render_multi(&multi_gpu, args.top));
    }
    Ok(())
}
