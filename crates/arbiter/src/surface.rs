use std::collections::BTreeMap;

use shared::{
    domain::{WorkerKind, WorkerModes},
    error::RejectionCode,
    protocol::{PvValue, SurfaceSnapshot, WriteOutcome, WriteResponse, ERROR_PV},
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    control_point::{
        ControlPoint, ControlRequest, ModeSelect, MAX_MODE_VALUE, MODE_PV, SAMPLE_COUNT_PV,
        WEIGHT_PV,
    },
    InterruptEvent, ModeArbiter,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceConfig {
    pub max_length: u32,
    pub n_samples: u32,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SurfaceError {
    #[error("invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
    #[error("{0} is read-only")]
    ReadOnly(String),
    #[error("invalid surface configuration: {0}")]
    InvalidConfig(String),
}

impl SurfaceError {
    fn invalid(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteReport {
    pub outcome: WriteOutcome,
    pub error_code: Option<RejectionCode>,
    pub interrupted: bool,
}

impl WriteReport {
    fn applied(interrupted: bool) -> Self {
        Self {
            outcome: WriteOutcome::Applied,
            error_code: None,
            interrupted,
        }
    }

    fn rejected(code: RejectionCode) -> Self {
        Self {
            outcome: WriteOutcome::Rejected,
            error_code: Some(code),
            interrupted: false,
        }
    }

    fn passed_through() -> Self {
        Self {
            outcome: WriteOutcome::PassedThrough,
            error_code: None,
            interrupted: false,
        }
    }

    pub fn into_response(self, name: impl Into<String>) -> WriteResponse {
        WriteResponse {
            name: name.into(),
            outcome: self.outcome,
            error_code: self.error_code,
            interrupted: self.interrupted,
        }
    }
}

/// PV store in front of the arbiter.
///
/// Accepted writes are stored, rejected ones only update the error PV.
#[derive(Debug)]
pub struct ControlSurface {
    arbiter: ModeArbiter,
    values: BTreeMap<String, PvValue>,
    last_error: Option<RejectionCode>,
}

impl ControlSurface {
    pub fn new(config: SurfaceConfig) -> Result<Self, SurfaceError> {
        if !(0.0..=1.0).contains(&config.weight) {
            return Err(SurfaceError::InvalidConfig(format!(
                "weight {} outside [0, 1]",
                config.weight
            )));
        }
        let arbiter = ModeArbiter::new(config.max_length, config.n_samples)
            .map_err(|e| SurfaceError::InvalidConfig(e.to_string()))?;

        let mut values = BTreeMap::new();
        values.insert(MODE_PV.to_string(), PvValue::Int(0));
        values.insert(
            SAMPLE_COUNT_PV.to_string(),
            PvValue::Int(i64::from(config.n_samples)),
        );
        values.insert(WEIGHT_PV.to_string(), PvValue::Float(config.weight));

        Ok(Self {
            arbiter,
            values,
            last_error: None,
        })
    }

    pub fn read(&self, name: &str) -> Option<PvValue> {
        if name == ERROR_PV {
            return Some(PvValue::Int(self.error_value()));
        }
        self.values.get(name).cloned()
    }

    pub fn write(&mut self, name: &str, value: PvValue) -> Result<WriteReport, SurfaceError> {
        if name == ERROR_PV {
            return Err(SurfaceError::ReadOnly(name.to_string()));
        }

        let request = match ControlPoint::parse(name) {
            ControlPoint::PassThrough(name) => {
                debug!(pv = %name, %value, "pass-through write");
                self.values.insert(name, value);
                return Ok(WriteReport::passed_through());
            }
            point => decode_request(&point, &value)?,
        };

        match self.arbiter.request(request) {
            Ok(applied) => {
                debug!(pv = name, %value, "write applied");
                if applied.interrupted {
                    warn!(pv = name, "response matrix measurement interrupted");
                }
                self.values.insert(name.to_string(), value);
                Ok(WriteReport::applied(applied.interrupted))
            }
            Err(rejected) => {
                info!(pv = name, %value, code = rejected.code.code(), "write rejected");
                self.last_error = Some(rejected.code);
                Ok(WriteReport::rejected(rejected.code))
            }
        }
    }

    pub fn release(&mut self, worker: WorkerKind) -> Vec<WorkerKind> {
        let promoted = self.arbiter.release(worker);
        info!(%worker, ?promoted, "worker released");
        promoted
    }

    pub fn modes(&self) -> WorkerModes {
        self.arbiter.modes()
    }

    pub fn snapshot(&self) -> SurfaceSnapshot {
        let mut pvs = self.values.clone();
        pvs.insert(ERROR_PV.to_string(), PvValue::Int(self.error_value()));
        SurfaceSnapshot {
            pvs,
            workers: self.arbiter.modes(),
        }
    }

    pub fn last_error(&self) -> Option<RejectionCode> {
        self.last_error
    }

    pub fn interrupt_handle(&self) -> InterruptEvent {
        self.arbiter.interrupt_handle()
    }

    fn error_value(&self) -> i64 {
        self.last_error.map_or(0, |code| i64::from(code.code()))
    }
}

fn decode_request(point: &ControlPoint, value: &PvValue) -> Result<ControlRequest, SurfaceError> {
    let name = point.pv_name();
    let request = match point {
        ControlPoint::ModeSelect => {
            let raw = expect_integer(name, value)?;
            let mode = ModeSelect::try_from(raw).map_err(|raw| {
                SurfaceError::invalid(name, format!("mode {raw} outside 0..={MAX_MODE_VALUE}"))
            })?;
            ControlRequest::SelectMode(mode)
        }
        ControlPoint::SampleCount => {
            let raw = expect_integer(name, value)?;
            let count = u32::try_from(raw).map_err(|_| {
                SurfaceError::invalid(name, format!("sample count {raw} out of range"))
            })?;
            ControlRequest::SetSampleCount(count)
        }
        ControlPoint::VarUpdate(task) => ControlRequest::UpdateVariable(*task),
        ControlPoint::Weight => {
            let weight = value.as_float().ok_or_else(|| {
                SurfaceError::invalid(name, format!("expected number, got {}", value.kind()))
            })?;
            ControlRequest::SetWeight(weight)
        }
        ControlPoint::PassThrough(_) => {
            return Err(SurfaceError::invalid(name, "not an arbitrated control point"))
        }
    };
    Ok(request)
}

fn expect_integer(name: &str, value: &PvValue) -> Result<i64, SurfaceError> {
    value.as_integer().ok_or_else(|| {
        SurfaceError::invalid(name, format!("expected integer, got {}", value.kind()))
    })
}

#[cfg(test)]
#[path = "tests/surface_tests.rs"]
mod tests;
