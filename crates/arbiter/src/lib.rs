//! Mode arbitration for the slow orbit feedback control surface.
//!
//! [`ModeArbiter`] owns the four cooperating workers and is the only place
//! their modes change in response to operator writes. [`ControlSurface`]
//! wraps it with the PV value store and the error PV.

use shared::{
    domain::{Mode, WorkerKind, WorkerModes},
    error::RejectionCode,
};
use thiserror::Error;

pub mod control_point;
pub mod surface;
pub mod workers;

pub use control_point::{ControlPoint, ControlRequest, ModeSelect, VarUpdateTask};
pub use surface::{ControlSurface, SurfaceConfig, SurfaceError, WriteReport};
pub use workers::{
    InterruptEvent, OrbitCorrection, OrbitMeasurement, RespmMeasurement, VarUpdate,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Applied {
    /// The running response matrix measurement was asked to stop.
    pub interrupted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("request rejected with code {}", .code.code())]
pub struct Rejected {
    pub code: RejectionCode,
}

impl From<RejectionCode> for Rejected {
    fn from(code: RejectionCode) -> Self {
        Self { code }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("initial sample count {n_samples} exceeds buffer length {max_length}")]
pub struct SampleCountOverflow {
    pub n_samples: u32,
    pub max_length: u32,
}

#[derive(Debug)]
pub struct ModeArbiter {
    orbit_correction: OrbitCorrection,
    respm_measurement: RespmMeasurement,
    orbit_measurement: OrbitMeasurement,
    var_update: VarUpdate,
}

impl ModeArbiter {
    pub fn new(max_length: u32, n_samples: u32) -> Result<Self, SampleCountOverflow> {
        if n_samples > max_length {
            return Err(SampleCountOverflow {
                n_samples,
                max_length,
            });
        }
        Ok(Self {
            orbit_correction: OrbitCorrection::default(),
            respm_measurement: RespmMeasurement::default(),
            orbit_measurement: OrbitMeasurement::new(max_length, n_samples),
            var_update: VarUpdate::default(),
        })
    }

    pub fn request(&mut self, request: ControlRequest) -> Result<Applied, Rejected> {
        let mut interrupted = false;
        match request {
            ControlRequest::SelectMode(ModeSelect::Stop) => {
                self.orbit_correction.mode = Mode::Idle;
                if self.respm_measurement.mode.is_idle() {
                    self.respm_measurement.mode = Mode::Idle;
                } else {
                    self.respm_measurement.interrupt.set();
                    interrupted = true;
                }
            }
            ControlRequest::SelectMode(ModeSelect::Correction(value)) => {
                if !self.respm_measurement.mode.is_idle() {
                    return Err(RejectionCode::MeasurementRunning.into());
                }
                self.orbit_correction.mode = Mode::active_unless(value, self.updating());
            }
            ControlRequest::SelectMode(ModeSelect::Measurement(value)) => {
                if !self.orbit_correction.mode.is_idle() {
                    return Err(RejectionCode::CorrectionRunning.into());
                }
                self.respm_measurement.mode = Mode::active_unless(value, self.updating());
            }
            ControlRequest::SetSampleCount(value) => {
                if value > self.orbit_measurement.max_length {
                    return Err(RejectionCode::SampleCountTooLarge.into());
                }
                self.orbit_measurement.n_samples = value;
            }
            ControlRequest::UpdateVariable(task) => {
                if !self.orbit_correction.mode.is_idle() || self.updating() {
                    return Err(task.rejection_code().into());
                }
                self.var_update.mode = Mode::Active(task.mode_value());
            }
            ControlRequest::SetWeight(value) => {
                if !(0.0..=1.0).contains(&value) {
                    return Err(RejectionCode::WeightOutOfRange.into());
                }
            }
        }
        Ok(Applied { interrupted })
    }

    /// Worker-side completion: `worker` returns to idle.
    ///
    /// Releasing the variable updater lets queued modes start; the workers
    /// promoted that way are returned.
    pub fn release(&mut self, worker: WorkerKind) -> Vec<WorkerKind> {
        match worker {
            WorkerKind::OrbitCorrection => self.orbit_correction.mode = Mode::Idle,
            WorkerKind::RespmMeasurement => {
                self.respm_measurement.mode = Mode::Idle;
                self.respm_measurement.interrupt.clear();
            }
            WorkerKind::OrbitMeasurement => self.orbit_measurement.mode = Mode::Idle,
            WorkerKind::VarUpdate => {
                self.var_update.mode = Mode::Idle;
                return self.resume_waiting();
            }
        }
        Vec::new()
    }

    /// Promotes `Waiting(n)` to `Active(n)` once the variable updater is idle.
    ///
    /// A queued measurement that was stopped while waiting is dropped to
    /// `Idle` and its interruption event cleared instead of being started.
    pub fn resume_waiting(&mut self) -> Vec<WorkerKind> {
        let mut promoted = Vec::new();
        if self.updating() {
            return promoted;
        }
        if let Mode::Waiting(value) = self.orbit_correction.mode {
            self.orbit_correction.mode = Mode::Active(value);
            promoted.push(WorkerKind::OrbitCorrection);
        }
        if let Mode::Waiting(value) = self.respm_measurement.mode {
            if self.respm_measurement.interrupt.is_set() {
                self.respm_measurement.mode = Mode::Idle;
                self.respm_measurement.interrupt.clear();
            } else {
                self.respm_measurement.mode = Mode::Active(value);
                promoted.push(WorkerKind::RespmMeasurement);
            }
        }
        promoted
    }

    pub fn modes(&self) -> WorkerModes {
        WorkerModes {
            orbit_correction: self.orbit_correction.mode,
            respm_measurement: self.respm_measurement.mode,
            orbit_measurement: self.orbit_measurement.mode,
            var_update: self.var_update.mode,
            n_samples: self.orbit_measurement.n_samples,
            max_length: self.orbit_measurement.max_length,
            interrupt_pending: self.respm_measurement.interrupt.is_set(),
        }
    }

    pub fn orbit_correction(&self) -> &OrbitCorrection {
        &self.orbit_correction
    }

    pub fn respm_measurement(&self) -> &RespmMeasurement {
        &self.respm_measurement
    }

    pub fn orbit_measurement(&self) -> &OrbitMeasurement {
        &self.orbit_measurement
    }

    pub fn var_update(&self) -> &VarUpdate {
        &self.var_update
    }

    pub fn interrupt_handle(&self) -> InterruptEvent {
        self.respm_measurement.interrupt.clone()
    }

    fn updating(&self) -> bool {
        !self.var_update.mode.is_idle()
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
