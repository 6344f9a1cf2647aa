//! Precision & Quantization Tables
//!
//! Bytes-per-parameter for numeric formats and compression ratios for
//! weight quantization modes. Both enums are closed: an unrecognized tag is
//! rejected at parse time instead of falling back to FP32.

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Numeric format used to store weights, gradients and activations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Precision {
    #[serde(rename = "FP32", alias = "fp32")]
    Fp32,
    #[default]
    #[serde(rename = "FP16", alias = "fp16")]
    Fp16,
    #[serde(rename = "BF16", alias = "bf16")]
    Bf16,
    #[serde(rename = "INT8", alias = "int8")]
    Int8,
    #[serde(rename = "INT4", alias = "int4")]
    Int4,
    #[serde(rename = "FP8", alias = "fp8")]
    Fp8,
}

impl Precision {
    pub const ALL: [Precision; 6] = [
        Precision::Fp32,
        Precision::Fp16,
        Precision::Bf16,
        Precision::Int8,
        Precision::Int4,
        Precision::Fp8,
    ];

    pub fn bytes_per_param(self) -> f64 {
        match self {
            Precision::Fp32 => 4.0,
            Precision::Fp16 | Precision::Bf16 => 2.0,
            Precision::Int8 | Precision::Fp8 => 1.0,
            Precision::Int4 => 0.5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Precision::Fp32 => "FP32",
            Precision::Fp16 => "FP16",
            Precision::Bf16 => "BF16",
            Precision::Int8 => "INT8",
            Precision::Int4 => "INT4",
            Precision::Fp8 => "FP8",
        }
    }

    /// 16-bit floating formats (FP16/BF16).
    pub fn is_half(self) -> bool {
        matches!(self, Precision::Fp16 | Precision::Bf16)
    }
}

impl Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Precision {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FP32" => Ok(Precision::Fp32),
            "FP16" => Ok(Precision::Fp16),
            "BF16" => Ok(Precision::Bf16),
            "INT8" => Ok(Precision::Int8),
            "INT4" => Ok(Precision::Int4),
            "FP8" => Ok(Precision::Fp8),
            _ => Err(EngineError::UnknownPrecision(s.to_string())),
        }
    }
}

/// Weight quantization applied on top of the storage precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Quantization {
    #[default]
    #[serde(rename = "None", alias = "none")]
    None,
    #[serde(rename = "INT8", alias = "int8")]
    Int8,
    #[serde(rename = "INT4", alias = "int4")]
    Int4,
    #[serde(rename = "FP8", alias = "fp8")]
    Fp8,
}

impl Quantization {
    pub const ALL: [Quantization; 4] = [
        Quantization::None,
        Quantization::Int8,
        Quantization::Int4,
        Quantization::Fp8,
    ];

    /// Compression ratio relative to an FP32 baseline.
    pub fn ratio(self) -> f64 {
        match self {
            Quantization::None => 1.0,
            Quantization::Int8 | Quantization::Fp8 => 0.25,
            Quantization::Int4 => 0.125,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Quantization::None => "None",
            Quantization::Int8 => "INT8",
            Quantization::Int4 => "INT4",
            Quantization::Fp8 => "FP8",
        }
    }

    pub fn is_quantized(self) -> bool {
        self != Quantization::None
    }
}

impl Display for Quantization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quantization {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NONE" => Ok(Quantization::None),
            "INT8" => Ok(Quantization::Int8),
            "INT4" => Ok(Quantization::Int4),
            "FP8" => Ok(Quantization::Fp8),
            _ => Err(EngineError::UnknownQuantization(s.to_string())),
        }
    }
}

/// Free-function form of [`Precision::bytes_per_param`].
pub fn bytes_per_param(precision: Precision) -> f64 {
    precision.bytes_per_param()
}

/// Free-function form of [`Quantization::ratio`].
pub fn quantization_ratio(quantization: Quantization) -> f64 {
    quantization.ratio()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_per_param_table() {
        assert_eq!(bytes_per_param(Precision::Fp32), 4.0);
        assert_eq!(bytes_per_param(Precision::Fp16), 2.0);
        assert_eq!(bytes_per_param(Precision::Bf16), 2.0);
        assert_eq!(bytes_per_param(Precision::Int8), 1.0);
        assert_eq!(bytes_per_param(Precision::Int4), 0.5);
        assert_eq!(bytes_per_param(Precision::Fp8), 1.0);
    }

    #[test]
    fn test_quantization_ratios_are_ordered() {
        assert_eq!(quantization_ratio(Quantization::None), 1.0);
        assert_eq!(quantization_ratio(Quantization::Int8), 0.25);
        assert_eq!(quantization_ratio(Quantization::Fp8), 0.25);
        assert_eq!(quantization_ratio(Quantization::Int4), 0.125);
        assert!(Quantization::Int4.ratio() < Quantization::Int8.ratio());
    }

    #[test]
    fn test_parse_rejects_unknown_tags() {
        assert_eq!("bf16".parse::<Precision>(), Ok(Precision::Bf16));
        assert_eq!(" INT4 ".parse::<Quantization>(), Ok(Quantization::Int4));
        assert!(matches!(
            "FP64".parse::<Precision>(),
            Err(EngineError::UnknownPrecision(_))
        ));
        assert!(matches!(
            "NF4".parse::<Quantization>(),
            Err(EngineError::UnknownQuantization(_))
        ));
    }

    #[test]
    fn test_serde_uses_display_tags() {
        let json = serde_json::to_string(&Precision::Bf16).unwrap();
        assert_eq!(json, "\"BF16\"");
        let q: Quantization = serde_json::from_str("\"None\"").unwrap();
        assert_eq!(q, Quantization::None);
        assert!(serde_json::from_str::<Precision>("\"FP64\"").is_err());
    }
}
