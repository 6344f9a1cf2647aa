//! Interactive Shell
//!
//! Reads one JSON workload request per line and prints its estimate.
//! `/history` lists past results, `/clear` empties them, `/bye` or `/exit`
//! ends the session.

use anyhow::{Context, Result};
use clap::Args;
use serde::Deserialize;
use std::io::{self, BufRead, Write};

use vram_core::{GpuDescriptor, ModelCatalog, ModelDescriptor, WorkloadConfig};

use crate::app_config::AppConfig;
use crate::estimate::resolve_target_gpu;
use crate::history::{CalculationHistory, HistoryEntry};
use crate::report::{format_memory, EstimateReport};

#[derive(Args, Debug, Clone, Default)]
pub struct ShellArgs {
    /// GPU id the advisor checks each estimate against
    #[arg(long)]
    pub gpu: Option<String>,
}

/// One shell line: `{"model": "llama-2-7b", "config": {"mode": "inference", ...}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkloadRequest {
    #[serde(default)]
    pub model: Option<String>,
    /// Custom size when no catalog id is given.
    #[serde(default)]
    pub params_billions: Option<f64>,
    pub config: WorkloadConfig,
}

impl WorkloadRequest {
    pub fn parse(line: &str) -> Result<Self> {
        let request: WorkloadRequest = serde_json::from_str(line).context("Invalid request JSON")?;
        request.config.validate()?;
        Ok(request)
    }

    fn resolve_model(&self) -> Result<Option<ModelDescriptor>> {
        if let Some(id) = &self.model {
            return Ok(Some(ModelCatalog::builtin().get_by_id(id)?.clone()));
        }
        Ok(self.params_billions.map(ModelDescriptor::custom))
    }
}

pub enum Reply {
    Output(String),
    Exit,
}

pub struct ShellSession {
    history: CalculationHistory,
    target_gpu: Option<&'static GpuDescriptor>,
    json: bool,
}

impl ShellSession {
    pub fn new(history: CalculationHistory, target_gpu: Option<&'static GpuDescriptor>, json: bool) -> Self {
        Self {
            history,
            target_gpu,
            json,
        }
    }

    pub fn history(&self) -> &CalculationHistory {
        &self.history
    }

    /// Errors in a request are reported back instead of ending the session.
    pub fn handle_line(&mut self, line: &str) -> Reply {
        match line {
            "/bye" | "/exit" => Reply::Exit,
            "/history" => Reply::Output(self.history.render()),
            "/clear" => {
                self.history.clear();
                Reply::Output("🧹 History cleared.".to_string())
            }
            "/help" => Reply::Output(HELP.to_string()),
            _ => match self.estimate(line) {
                Ok(text) => Reply::Output(text),
                Err(e) => {
                    tracing::warn!("Request rejected: {:#}", e);
                    Reply::Output(format!("❌ {:#}", e))
                }
            },
        }
    }

    fn estimate(&mut self, line: &str) -> Result<String> {
        let request = WorkloadRequest::parse(line)?;
        let model = request.resolve_model()?;
        let config = match &model {
            Some(m) => request.config.with_model(m),
            None => request.config,
        };
        let report = EstimateReport::build(config, model.as_ref(), self.target_gpu)?;

        self.history.record(HistoryEntry::new(
            report.mode,
            report.model.as_deref(),
            report.breakdown.total_gb,
        ));

        if self.json {
            Ok(report.to_json()?)
        } else {
            Ok(report.render())
        }
    }

    /// Drives the session until `/bye`, `/exit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, output: &mut W) -> Result<()> {
        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match self.handle_line(line) {
                Reply::Exit => break,
                Reply::Output(text) => {
                    writeln!(output, "{}", text)?;
                }
            }
            write!(output, "> ")?;
            output.flush()?;
        }
        Ok(())
    }
}

const HELP: &str = r#"Enter a JSON request per line, e.g.
  {"model": "llama-2-7b", "config": {"mode": "inference", "quantization": "INT4"}}
  {"config": {"mode": "training", "model_params_billions": 13, "gradient_checkpointing": true}}
Commands: /history, /clear, /help, /bye"#;

pub fn run(args: ShellArgs, app: &AppConfig) -> Result<()> {
    let target_gpu = resolve_target_gpu(args.gpu.as_deref(), app)?;
    let mut session = ShellSession::new(CalculationHistory::new(app.history_capacity), target_gpu, app.json_output);

    println!("🚀 VRAM shell ready.");
    if let Some(gpu) = target_gpu {
        println!("🎯 Target GPU: {} ({})", gpu.name, format_memory(gpu.memory_gb));
    }
    println!("{}\n", HELP);
    print!("> ");
    io::stdout().flush()?;

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    session.run(stdin.lock(), &mut stdout)?;

    tracing::info!("Shell closed after {} calculation(s)", session.history().len());
    println!("👋 Bye!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn session(capacity: usize) -> ShellSession {
        ShellSession::new(CalculationHistory::new(capacity), None, false)
    }

    #[test]
    fn test_request_parsing() -> Result<()> {
        let request = WorkloadRequest::parse(r#"{"model": "gpt2", "config": {"mode": "inference", "batch_size": 2}}"#)?;
        assert_eq!(request.model.as_deref(), Some("gpt2"));
        assert_eq!(request.config.batch_size(), 2);

        assert!(WorkloadRequest::parse(r#"{"config": {"mode": "inference", "precision": "FP64"}}"#).is_err());
        assert!(WorkloadRequest::parse(r#"{"config": {"mode": "inference", "batch_size": 0}}"#).is_err());
        assert!(WorkloadRequest::parse("not json").is_err());
        Ok(())
    }

    #[test]
    fn test_estimates_are_recorded() {
        let mut s = session(10);
        let reply = s.handle_line(r#"{"model": "llama-2-7b", "config": {"mode": "inference"}}"#);
        assert!(matches!(reply, Reply::Output(ref t) if t.contains("VRAM Estimate")));
        let reply = s.handle_line(r#"{"config": {"mode": "training", "model_params_billions": 1.0}}"#);
        assert!(matches!(reply, Reply::Output(_)));
        assert_eq!(s.history().len(), 2);

        let modes: Vec<_> = s.history().entries().map(|e| e.mode.clone()).collect();
        assert_eq!(modes, vec!["inference", "training"]);
    }

    #[test]
    fn test_training_request_uses_named_model_size() {
        let mut s = session(10);
        s.handle_line(r#"{"model": "llama-2-70b", "config": {"mode": "training"}}"#);
        s.handle_line(r#"{"model": "gpt2", "config": {"mode": "training"}}"#);
        s.handle_line(r#"{"params_billions": 13.0, "config": {"mode": "training"}}"#);
        s.handle_line(r#"{"config": {"mode": "training", "model_params_billions": 13.0}}"#);

        let totals: Vec<f64> = s.history().entries().map(|e| e.total_gb).collect();
        assert_eq!(totals.len(), 4);
        assert!(totals[0] > totals[1] * 10.0, "70B {} vs gpt2 {}", totals[0], totals[1]);
        assert!((totals[2] - totals[3]).abs() < 1e-9);
    }

    #[test]
    fn test_bad_request_keeps_session_alive() {
        let mut s = session(10);
        let reply = s.handle_line(r#"{"model": "unknown-model", "config": {"mode": "inference"}}"#);
        assert!(matches!(reply, Reply::Output(ref t) if t.starts_with("❌")));
        // Inference without any model is rejected by the engine.
        let reply = s.handle_line(r#"{"config": {"mode": "inference"}}"#);
        assert!(matches!(reply, Reply::Output(ref t) if t.starts_with("❌")));
        assert!(s.history().is_empty());
    }

    #[test]
    fn test_commands() {
        let mut s = session(10);
        s.handle_line(r#"{"params_billions": 3.0, "config": {"mode": "grpo"}}"#);
        assert!(matches!(s.handle_line("/history"), Reply::Output(ref t) if t.contains("grpo")));
        assert!(matches!(s.handle_line("/clear"), Reply::Output(_)));
        assert!(s.history().is_empty());
        assert!(matches!(s.handle_line("/bye"), Reply::Exit));
        assert!(matches!(s.handle_line("/exit"), Reply::Exit));
    }

    #[test]
    fn test_run_stops_at_bye() -> Result<()> {
        let input = Cursor::new(
            "\n{\"model\": \"gpt2\", \"config\": {\"mode\": \"inference\"}}\n/bye\n{\"model\": \"gpt2\", \"config\": {\"mode\": \"inference\"}}\n",
        );
        let mut output = Vec::new();
        let mut s = session(10);
        s.run(input, &mut output)?;
        assert_eq!(s.history().len(), 1);
        assert!(String::from_utf8(output)?.contains("VRAM Estimate"));
        Ok(())
    }

    #[test]
    fn test_history_capacity_from_session() {
        let mut s = session(2);
        for _ in 0..4 {
            s.handle_line(r#"{"model": "gpt2", "config": {"mode": "inference"}}"#);
        }
        assert_eq!(s.history().len(), 2);
    }
}
