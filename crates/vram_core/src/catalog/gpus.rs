//! Builtin GPU table
//!
//! Prices are street/list prices in USD; cloud prices are typical on-demand
//! per-GPU hourly rates. Both drift, treat them as ballpark figures.

use std::collections::BTreeSet;

use super::{GpuArchitecture as Arch, GpuDescriptor};

struct GpuRow {
    id: &'static str,
    name: &'static str,
    memory_gb: f64,
    price_usd: Option<f64>,
    cloud_per_hour: Option<f64>,
    arch: Arch,
    watts: u32,
    bandwidth: u32,
    features: &'static [&'static str],
}

const CONSUMER: &[&str] = &["tensor-cores", "fp16", "bf16"];
const ADA: &[&str] = &["tensor-cores", "fp16", "bf16", "fp8"];
const DATACENTER: &[&str] = &["tensor-cores", "fp16", "bf16", "nvlink", "mig", "ecc"];
const HOPPER: &[&str] = &["tensor-cores", "fp16", "bf16", "fp8", "nvlink", "mig", "ecc", "transformer-engine"];

const ROWS: &[GpuRow] = &[
    GpuRow { id: "rtx-3060", name: "NVIDIA GeForce RTX 3060", memory_gb: 12.0, price_usd: Some(329.0), cloud_per_hour: None, arch: Arch::Ampere, watts: 170, bandwidth: 360, features: CONSUMER },
    GpuRow { id: "rtx-4060-ti-16gb", name: "NVIDIA GeForce RTX 4060 Ti 16GB", memory_gb: 16.0, price_usd: Some(499.0), cloud_per_hour: None, arch: Arch::AdaLovelace, watts: 165, bandwidth: 288, features: ADA },
    GpuRow { id: "rtx-3090", name: "NVIDIA GeForce RTX 3090", memory_gb: 24.0, price_usd: Some(1499.0), cloud_per_hour: Some(0.44), arch: Arch::Ampere, watts: 350, bandwidth: 936, features: CONSUMER },
    GpuRow { id: "rtx-4080", name: "NVIDIA GeForce RTX 4080", memory_gb: 16.0, price_usd: Some(1199.0), cloud_per_hour: None, arch: Arch::AdaLovelace, watts: 320, bandwidth: 717, features: ADA },
    GpuRow { id: "rtx-4090", name: "NVIDIA GeForce RTX 4090", memory_gb: 24.0, price_usd: Some(1599.0), cloud_per_hour: Some(0.74), arch: Arch::AdaLovelace, watts: 450, bandwidth: 1008, features: ADA },
    GpuRow { id: "rtx-5090", name: "NVIDIA GeForce RTX 5090", memory_gb: 32.0, price_usd: Some(1999.0), cloud_per_hour: Some(0.99), arch: Arch::Blackwell, watts: 575, bandwidth: 1792, features: ADA },
    GpuRow { id: "t4", name: "NVIDIA T4", memory_gb: 16.0, price_usd: Some(2000.0), cloud_per_hour: Some(0.35), arch: Arch::Turing, watts: 70, bandwidth: 320, features: &["tensor-cores", "fp16", "ecc"] },
    GpuRow { id: "a10", name: "NVIDIA A10", memory_gb: 24.0, price_usd: Some(3200.0), cloud_per_hour: Some(0.75), arch: Arch::Ampere, watts: 150, bandwidth: 600, features: &["tensor-cores", "fp16", "bf16", "ecc"] },
    GpuRow { id: "rtx-a6000", name: "NVIDIA RTX A6000", memory_gb: 48.0, price_usd: Some(4650.0), cloud_per_hour: Some(0.80), arch: Arch::Ampere, watts: 300, bandwidth: 768, features: &["tensor-cores", "fp16", "bf16", "nvlink", "ecc"] },
    GpuRow { id: "l40s", name: "NVIDIA L40S", memory_gb: 48.0, price_usd: Some(7500.0), cloud_per_hour: Some(1.10), arch: Arch::AdaLovelace, watts: 350, bandwidth: 864, features: &["tensor-cores", "fp16", "bf16", "fp8", "ecc"] },
    GpuRow { id: "a100-40gb", name: "NVIDIA A100 40GB", memory_gb: 40.0, price_usd: Some(10000.0), cloud_per_hour: Some(1.29), arch: Arch::Ampere, watts: 400, bandwidth: 1555, features: DATACENTER },
    GpuRow { id: "a100-80gb", name: "NVIDIA A100 80GB", memory_gb: 80.0, price_usd: Some(15000.0), cloud_per_hour: Some(1.79), arch: Arch::Ampere, watts: 400, bandwidth: 2039, features: DATACENTER },
    GpuRow { id: "h100-80gb", name: "NVIDIA H100 80GB", memory_gb: 80.0, price_usd: Some(30000.0), cloud_per_hour: Some(2.99), arch: Arch::Hopper, watts: 700, bandwidth: 3350, features: HOPPER },
    GpuRow { id: "h200", name: "NVIDIA H200", memory_gb: 141.0, price_usd: Some(35000.0), cloud_per_hour: Some(3.79), arch: Arch::Hopper, watts: 700, bandwidth: 4800, features: HOPPER },
    GpuRow { id: "b200", name: "NVIDIA B200", memory_gb: 192.0, price_usd: Some(40000.0), cloud_per_hour: Some(5.99), arch: Arch::Blackwell, watts: 1000, bandwidth: 8000, features: HOPPER },
    GpuRow { id: "mi300x", name: "AMD Instinct MI300X", memory_gb: 192.0, price_usd: Some(15000.0), cloud_per_hour: Some(2.49), arch: Arch::Cdna3, watts: 750, bandwidth: 5300, features: &["matrix-cores", "fp16", "bf16", "fp8", "ecc"] },
    GpuRow { id: "gtx-1660", name: "NVIDIA GeForce GTX 1660", memory_gb: 6.0, price_usd: Some(229.0), cloud_per_hour: None, arch: Arch::Turing, watts: 120, bandwidth: 192, features: &["fp16"] },
];

pub(super) fn builtin_gpus() -> Vec<GpuDescriptor> {
    ROWS.iter()
        .map(|row| GpuDescriptor {
            id: row.id.to_string(),
            name: row.name.to_string(),
            memory_gb: row.memory_gb,
            price_usd: row.price_usd,
            cloud_price_usd_per_hour: row.cloud_per_hour,
            architecture: row.arch,
            power_watts: Some(row.watts),
            memory_bandwidth_gbs: Some(row.bandwidth),
            features: row.features.iter().map(|f| f.to_string()).collect::<BTreeSet<_>>(),
        })
        .collect()
}
