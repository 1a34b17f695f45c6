use crate::core::graph::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What a trace entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceKind {
    /// A call site was bound into an invocation.
    Invocation,
    /// A value was passed through promotion because no rule knows its type.
    PassThrough,
    /// A top-level encode finished.
    Encode,
}

/// A single entry in the trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    pub timestamp: u64,
    pub kind: TraceKind,
    /// Function name, type name, or encoding mode, depending on `kind`.
    pub subject: String,
    pub detail: serde_json::Value,
    pub metadata: HashMap<String, String>,
}

impl TraceEntry {
    pub fn new(kind: TraceKind, subject: impl Into<String>, detail: serde_json::Value) -> Self {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self {
            timestamp,
            kind,
            subject: subject.into(),
            detail,
            metadata: HashMap::new(),
        }
    }

    pub(crate) fn pass_through(type_name: &str, value: &Value) -> Self {
        Self::new(
            TraceKind::PassThrough,
            type_name,
            serde_json::Value::String(value.describe()),
        )
    }
}

/// Trait for recording graph-building traces.
pub trait Telemetry: Send + Sync {
    fn record(&self, entry: TraceEntry);
}

/// Simple in-memory collector for traces.
#[derive(Default)]
pub struct MemoryTelemetry {
    traces: std::sync::Mutex<Vec<TraceEntry>>,
}

impl MemoryTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_traces(&self) -> Vec<TraceEntry> {
        self.traces.lock().map(|t| t.clone()).unwrap_or_default()
    }

    pub fn of_kind(&self, kind: TraceKind) -> Vec<TraceEntry> {
        self.get_traces()
            .into_iter()
            .filter(|t| t.kind == kind)
            .collect()
    }
}

impl Telemetry for MemoryTelemetry {
    fn record(&self, entry: TraceEntry) {
        if let Ok(mut traces) = self.traces.lock() {
            traces.push(entry);
        }
    }
}
