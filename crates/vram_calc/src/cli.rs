use crate::catalog_cmd::{GpusArgs, ModelsArgs, RecommendArgs};
use crate::estimate::{FineTuneArgs, GrpoArgs, InferenceArgs, MultimodalArgs, TrainingArgs};
use crate::shell::ShellArgs;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::app_config::DEFAULT_CONFIG_FILE;

#[derive(Parser)]
#[command(author, version, about = "GPU memory (VRAM) estimator for LLM workloads", long_about = None)]
pub struct Cli {
    /// Application config file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub app_config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Estimate inference memory
    Inference(InferenceArgs),

    /// Estimate full-training memory
    Training(TrainingArgs),

    /// Estimate fine-tuning memory (Full, LoRA, QLoRA, Prefix)
    #[command(alias = "fine-tuning")]
    Finetune(FineTuneArgs),

    /// Estimate GRPO preference-training memory
    Grpo(GrpoArgs),

    /// Estimate vision/audio/video model memory
    Multimodal(MultimodalArgs),

    /// List builtin models
    Models(ModelsArgs),

    /// List builtin GPUs
    Gpus(GpusArgs),

    /// Recommend GPUs for a memory requirement in GB
    Recommend(RecommendArgs),

    /// Interactive JSON shell (Default)
    Shell(ShellArgs),

    /// Write the application config with default values
    Init,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use vram_core::{FineTuningMethod, Quantization};

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_estimate_flags() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from([
            "vram_calc",
            "finetune",
            "--model",
            "llama-2-7b",
            "--method",
            "qlora",
            "--quantization",
            "int4",
            "--json",
        ])?;
        let Some(Commands::Finetune(args)) = cli.command else {
            anyhow::bail!("expected finetune");
        };
        assert_eq!(args.method, FineTuningMethod::QLora);
        assert_eq!(args.quantization, Quantization::Int4);
        assert!(args.output.json);
        assert_eq!(args.model.model.as_deref(), Some("llama-2-7b"));
        Ok(())
    }

    #[test]
    fn test_model_and_params_conflict() {
        let parsed = Cli::try_parse_from(["vram_calc", "inference", "--model", "gpt2", "--params", "7"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_unknown_precision_rejected() {
        let parsed = Cli::try_parse_from(["vram_calc", "inference", "--params", "7", "--precision", "fp64"]);
        assert!(parsed.is_err());
    }
}
