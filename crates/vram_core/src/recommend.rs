//! GPU Recommendation & Multi-Node Search
//!
//! - Single GPU: cards that hold the requirement, ranked by how close the
//!   utilization lands to an 80% target.
//! - Multi-GPU: a brute-force walk over (GPU type × GPUs per node × node
//!   count) ranked by purchase cost per GB of pooled memory.
//!
//! The node sizes {1, 2, 4, 8}, the 16-node cap and the 70% per-GPU
//! headroom are policy, not limits of the search.

use serde::Serialize;
use tracing::debug;

use crate::catalog::{GpuCatalog, GpuDescriptor};
use crate::error::{EngineError, Result};

pub const TARGET_UTILIZATION_PCT: f64 = 80.0;

pub const MIN_MULTI_GPU_MEMORY_GB: f64 = 8.0;
pub const GPUS_PER_NODE_OPTIONS: [u32; 4] = [1, 2, 4, 8];
pub const MAX_NODES: u32 = 16;
/// Planned per-GPU fill level; the rest is headroom.
pub const MULTI_GPU_UTILIZATION: f64 = 0.7;
/// Cost-per-GB differences below this are a tie, broken by node count.
pub const COST_PER_GB_TIE_USD: f64 = 50.0;
pub const MAX_MULTI_GPU_RESULTS: usize = 20;

/// One card that fits the requirement on its own.
#[derive(Debug, Clone, Serialize)]
pub struct GpuFit<'a> {
    pub gpu: &'a GpuDescriptor,
    pub utilization_pct: f64,
    /// Distance from the utilization target; lower is better.
    pub score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MultiGpuConfig<'a> {
    pub gpu: &'a GpuDescriptor,
    pub gpus_per_node: u32,
    pub num_nodes: u32,
    pub total_gpus: u32,
    pub total_memory_gb: f64,
    pub total_cost_usd: f64,
    pub cost_per_gb: f64,
    pub utilization_pct: f64,
    pub suggestion: String,
}

impl<'a> MultiGpuConfig<'a> {
    fn new(gpu: &'a GpuDescriptor, price: f64, gpus_per_node: u32, num_nodes: u32, required_gb: f64) -> Self {
        let total_gpus = gpus_per_node * num_nodes;
        let total_memory_gb = gpu.memory_gb * total_gpus as f64;
        let total_cost_usd = price * total_gpus as f64;
        let suggestion = if num_nodes == 1 {
            format!("{}× {} on a single node", total_gpus, gpu.name)
        } else {
            format!(
                "{} nodes × {}× {} ({} GPUs total)",
                num_nodes, gpus_per_node, gpu.name, total_gpus
            )
        };
        Self {
            gpu,
            gpus_per_node,
            num_nodes,
            total_gpus,
            total_memory_gb,
            total_cost_usd,
            cost_per_gb: if total_memory_gb > 0.0 {
                total_cost_usd / total_memory_gb
            } else {
                f64::INFINITY
            },
            utilization_pct: if total_memory_gb > 0.0 {
                required_gb / total_memory_gb * 100.0
            } else {
                0.0
            },
            suggestion,
        }
    }

    fn same_layout(&self, other: &MultiGpuConfig<'_>) -> bool {
        self.gpu.id == other.gpu.id && self.gpus_per_node == other.gpus_per_node && self.num_nodes == other.num_nodes
    }
}

fn check_requirement(required_gb: f64) -> Result<()> {
    if !required_gb.is_finite() || required_gb < 0.0 {
        return Err(EngineError::InvalidRequirement(required_gb));
    }
    Ok(())
}

impl GpuCatalog {
    /// Cards with enough memory, closest to 80% utilization first.
    ///
    /// Ties keep catalog order.
    pub fn recommend_single(&self, required_gb: f64) -> Result<Vec<GpuFit<'_>>> {
        check_requirement(required_gb)?;

        let mut fits: Vec<GpuFit<'_>> = self
            .all()
            .iter()
            .filter(|gpu| gpu.memory_gb >= required_gb)
            .map(|gpu| {
                let utilization_pct = gpu.utilization_pct(required_gb);
                GpuFit {
                    gpu,
                    utilization_pct,
                    score: (utilization_pct - TARGET_UTILIZATION_PCT).abs(),
                }
            })
            .collect();

        // `sort_by` is stable.
        fits.sort_by(|a, b| a.score.total_cmp(&b.score));
        debug!(required_gb, candidates = fits.len(), "Single-GPU ranking computed");
        Ok(fits)
    }

    /// Enumerates pooled configurations that reach `required_gb`.
    ///
    /// Cards under 8 GB or without a purchase price are skipped. At most 20
    /// configurations are returned.
    pub fn recommend_multi(&self, required_gb: f64) -> Result<Vec<MultiGpuConfig<'_>>> {
        check_requirement(required_gb)?;

        let mut configs: Vec<MultiGpuConfig<'_>> = Vec::new();

        for gpu in self.all() {
            if gpu.memory_gb < MIN_MULTI_GPU_MEMORY_GB {
                continue;
            }
            let Some(price) = gpu.price_usd else {
                continue;
            };

            let usable_per_gpu = gpu.memory_gb * MULTI_GPU_UTILIZATION;
            let gpus_needed = ((required_gb / usable_per_gpu).ceil() as u32).max(1);

            for &gpus_per_node in &GPUS_PER_NODE_OPTIONS {
                let candidate = if gpus_needed <= gpus_per_node {
                    MultiGpuConfig::new(gpu, price, gpus_needed, 1, required_gb)
                } else {
                    let num_nodes = gpus_needed.div_ceil(gpus_per_node).min(MAX_NODES);
                    MultiGpuConfig::new(gpu, price, gpus_per_node, num_nodes, required_gb)
                };

                if candidate.total_memory_gb < required_gb {
                    continue;
                }
                if configs.iter().any(|c| c.same_layout(&candidate)) {
                    continue;
                }
                configs.push(candidate);
            }
        }

        rank_by_cost(&mut configs);
        configs.truncate(MAX_MULTI_GPU_RESULTS);
        debug!(required_gb, configs = configs.len(), "Multi-GPU search computed");
        Ok(configs)
    }
}

/// Cheapest cost-per-GB first; within the tie window fewer nodes win.
///
/// A stable sort on cost followed by adjacent swaps keeps the ordering
/// well-defined even though "within 50" is not transitive. Every swap
/// lowers the number of node-count inversions, so the loop terminates.
fn rank_by_cost(configs: &mut [MultiGpuConfig<'_>]) {
    configs.sort_by(|a, b| a.cost_per_gb.total_cmp(&b.cost_per_gb));

    let mut changed = true;
    while changed {
        changed = false;
        for i in 1..configs.len() {
            let (prev, next) = (&configs[i - 1], &configs[i]);
            let tied = (next.cost_per_gb - prev.cost_per_gb).abs() < COST_PER_GB_TIE_USD;
            if tied && next.num_nodes < prev.num_nodes {
                configs.swap(i - 1, i);
                changed = true;
            }
        }
    }
}

/// [`GpuCatalog::recommend_single`] over the builtin catalog.
pub fn recommend_single_gpus(required_gb: f64) -> Result<Vec<GpuFit<'static>>> {
    GpuCatalog::builtin().recommend_single(required_gb)
}

/// [`GpuCatalog::recommend_multi`] over the builtin catalog.
pub fn recommend_multi_gpu_configs(required_gb: f64) -> Result<Vec<MultiGpuConfig<'static>>> {
    GpuCatalog::builtin().recommend_multi(required_gb)
}
