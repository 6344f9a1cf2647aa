//! Calculation History
//!
//! Bounded ring buffer of finished estimates. Owned by whoever runs the
//! session; the oldest entry is dropped once capacity is reached.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::VecDeque;

use crate::report::format_memory;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Local>,
    pub mode: String,
    pub model: Option<String>,
    pub total_gb: f64,
}

impl HistoryEntry {
    pub fn new(mode: &str, model: Option<&str>, total_gb: f64) -> Self {
        Self {
            timestamp: Local::now(),
            mode: mode.to_string(),
            model: model.map(str::to_string),
            total_gb,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CalculationHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl CalculationHistory {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn record(&mut self, entry: HistoryEntry) {
        self.entries.push_back(entry);
        if self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn render(&self) -> String {
        if self.entries.is_empty() {
            return "(no calculations yet)".to_string();
        }
        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| {
                format!(
                    "{:>3}. [{}] {:<12} {:<16} {}",
                    i + 1,
                    e.timestamp.format("%H:%M:%S"),
                    e.mode,
                    e.model.as_deref().unwrap_or("-"),
                    format_memory(e.total_gb)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evicts_oldest_at_capacity() {
        let mut history = CalculationHistory::new(3);
        for i in 0..5 {
            history.record(HistoryEntry::new("inference", Some("gpt2"), i as f64));
        }
        assert_eq!(history.len(), 3);
        let totals: Vec<f64> = history.entries().map(|e| e.total_gb).collect();
        assert_eq!(totals, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_zero_capacity_keeps_latest() {
        let mut history = CalculationHistory::new(0);
        history.record(HistoryEntry::new("training", None, 1.0));
        history.record(HistoryEntry::new("training", None, 2.0));
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.entries().next().map(|e| e.total_gb), Some(2.0));
    }

    #[test]
    fn test_clear_and_render() {
        let mut history = CalculationHistory::new(10);
        assert!(history.render().contains("no calculations"));
        history.record(HistoryEntry::new("grpo", Some("llama-3-8b"), 20.5));
        let text = history.render();
        assert!(text.contains("grpo"));
        assert!(text.contains("llama-3-8b"));
        assert!(text.contains("20.50 GB"));
        history.clear();
        assert!(history.is_empty());
    }
}
