use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    domain::{WorkerKind, WorkerModes},
    error::RejectionCode,
};

/// PV name of the read-only rejection code output.
pub const ERROR_PV: &str = "SICO-SOFB-ERROR";

/// Value carried by a process variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PvValue {
    Int(i64),
    Float(f64),
    Text(String),
    Array(Vec<f64>),
}

impl PvValue {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            PvValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            PvValue::Int(v) => Some(*v as f64),
            PvValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PvValue::Int(_) => "integer",
            PvValue::Float(_) => "float",
            PvValue::Text(_) => "string",
            PvValue::Array(_) => "array",
        }
    }
}

impl fmt::Display for PvValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PvValue::Int(v) => write!(f, "{v}"),
            PvValue::Float(v) => write!(f, "{v}"),
            PvValue::Text(v) => f.write_str(v),
            PvValue::Array(values) => {
                f.write_str("[")?;
                for (idx, v) in values.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("]")
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteRequest {
    pub value: PvValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOutcome {
    Applied,
    Rejected,
    PassedThrough,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteResponse {
    pub name: String,
    pub outcome: WriteOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<RejectionCode>,
    #[serde(default)]
    pub interrupted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PvReading {
    pub name: String,
    pub value: PvValue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfaceSnapshot {
    pub pvs: BTreeMap<String, PvValue>,
    pub workers: WorkerModes,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseResponse {
    pub worker: WorkerKind,
    pub workers: WorkerModes,
    #[serde(default)]
    pub promoted: Vec<WorkerKind>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerEvent {
    PvWritten {
        name: String,
        value: PvValue,
        at: DateTime<Utc>,
    },
    WriteRejected {
        name: String,
        code: RejectionCode,
        at: DateTime<Utc>,
    },
    MeasurementInterrupted {
        at: DateTime<Utc>,
    },
    ModesChanged {
        workers: WorkerModes,
    },
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
