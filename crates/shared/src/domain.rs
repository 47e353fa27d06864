use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ParseNameError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerKind {
    OrbitCorrection,
    RespmMeasurement,
    OrbitMeasurement,
    VarUpdate,
}

impl WorkerKind {
    pub const ALL: [WorkerKind; 4] = [
        WorkerKind::OrbitCorrection,
        WorkerKind::RespmMeasurement,
        WorkerKind::OrbitMeasurement,
        WorkerKind::VarUpdate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WorkerKind::OrbitCorrection => "orbit_correction",
            WorkerKind::RespmMeasurement => "respm_measurement",
            WorkerKind::OrbitMeasurement => "orbit_measurement",
            WorkerKind::VarUpdate => "var_update",
        }
    }
}

impl fmt::Display for WorkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for WorkerKind {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WorkerKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ParseNameError::new("worker", s))
    }
}

/// Operating state of a worker.
///
/// `Waiting(n)` means the worker was asked to enter `Active(n)` while the
/// variable updater was busy; the worker promotes itself once it goes idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Idle,
    Active(u8),
    Waiting(u8),
}

impl Mode {
    pub fn is_idle(self) -> bool {
        matches!(self, Mode::Idle)
    }

    /// Active if `blocked` is false, queued otherwise.
    pub fn active_unless(value: u8, blocked: bool) -> Self {
        if blocked {
            Mode::Waiting(value)
        } else {
            Mode::Active(value)
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Idle => f.write_str("idle"),
            Mode::Active(n) => write!(f, "{n}"),
            Mode::Waiting(n) => write!(f, "W_{n}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerModes {
    pub orbit_correction: Mode,
    pub respm_measurement: Mode,
    pub orbit_measurement: Mode,
    pub var_update: Mode,
    pub n_samples: u32,
    pub max_length: u32,
    pub interrupt_pending: bool,
}

impl WorkerModes {
    pub fn mode_of(&self, worker: WorkerKind) -> Mode {
        match worker {
            WorkerKind::OrbitCorrection => self.orbit_correction,
            WorkerKind::RespmMeasurement => self.respm_measurement,
            WorkerKind::OrbitMeasurement => self.orbit_measurement,
            WorkerKind::VarUpdate => self.var_update,
        }
    }
}
