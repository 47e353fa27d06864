use std::fmt;

use shared::error::RejectionCode;

pub const MODE_PV: &str = "SICO-SOFB-MODE";
pub const SAMPLE_COUNT_PV: &str = "SICO-SOFB-AVGORBIT-NUMSAMPLES";
pub const WEIGHT_PV: &str = "SICO-SOFB-WEIGHT";

/// Highest value accepted by the mode selector.
pub const MAX_MODE_VALUE: i64 = 14;

/// Every named point the arbiter guards. Anything else is stored as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlPoint {
    ModeSelect,
    SampleCount,
    VarUpdate(VarUpdateTask),
    Weight,
    PassThrough(String),
}

impl ControlPoint {
    pub fn parse(name: &str) -> Self {
        match name {
            MODE_PV => ControlPoint::ModeSelect,
            SAMPLE_COUNT_PV => ControlPoint::SampleCount,
            WEIGHT_PV => ControlPoint::Weight,
            other => match VarUpdateTask::from_pv_name(other) {
                Some(task) => ControlPoint::VarUpdate(task),
                None => ControlPoint::PassThrough(other.to_string()),
            },
        }
    }

    pub fn pv_name(&self) -> &str {
        match self {
            ControlPoint::ModeSelect => MODE_PV,
            ControlPoint::SampleCount => SAMPLE_COUNT_PV,
            ControlPoint::VarUpdate(task) => task.pv_name(),
            ControlPoint::Weight => WEIGHT_PV,
            ControlPoint::PassThrough(name) => name.as_str(),
        }
    }
}

/// Jobs handed to the variable updater. Each maps to one `var_update` mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarUpdateTask {
    RespmLoad,
    RefOrbitXLoad,
    RefOrbitYLoad,
    RespmSelect,
    RefOrbitXSelect,
    RefOrbitYSelect,
    BpmSelect,
    ChSelect,
    CvSelect,
    BpmAdd,
    ChAdd,
    CvAdd,
    BpmRemove,
    ChRemove,
    CvRemove,
}

impl VarUpdateTask {
    pub const ALL: [VarUpdateTask; 15] = [
        VarUpdateTask::RespmLoad,
        VarUpdateTask::RefOrbitXLoad,
        VarUpdateTask::RefOrbitYLoad,
        VarUpdateTask::RespmSelect,
        VarUpdateTask::RefOrbitXSelect,
        VarUpdateTask::RefOrbitYSelect,
        VarUpdateTask::BpmSelect,
        VarUpdateTask::ChSelect,
        VarUpdateTask::CvSelect,
        VarUpdateTask::BpmAdd,
        VarUpdateTask::ChAdd,
        VarUpdateTask::CvAdd,
        VarUpdateTask::BpmRemove,
        VarUpdateTask::ChRemove,
        VarUpdateTask::CvRemove,
    ];

    /// Selection, addition and removal of BPM and corrector sets.
    pub const ELEMENT_SETS: [VarUpdateTask; 9] = [
        VarUpdateTask::BpmSelect,
        VarUpdateTask::ChSelect,
        VarUpdateTask::CvSelect,
        VarUpdateTask::BpmAdd,
        VarUpdateTask::ChAdd,
        VarUpdateTask::CvAdd,
        VarUpdateTask::BpmRemove,
        VarUpdateTask::ChRemove,
        VarUpdateTask::CvRemove,
    ];

    pub fn pv_name(self) -> &'static str {
        match self {
            VarUpdateTask::RespmLoad => "SICO-SOFB-RESPM",
            VarUpdateTask::RefOrbitXLoad => "SICO-SOFB-REFORBIT-X",
            VarUpdateTask::RefOrbitYLoad => "SICO-SOFB-REFORBIT-Y",
            VarUpdateTask::RespmSelect => "SICO-SOFB-RESPM-SEL",
            VarUpdateTask::RefOrbitXSelect => "SICO-SOFB-REFORBIT-X-SEL",
            VarUpdateTask::RefOrbitYSelect => "SICO-SOFB-REFORBIT-Y-SEL",
            VarUpdateTask::BpmSelect => "SICO-SOFB-BPM-SEL",
            VarUpdateTask::ChSelect => "SICO-SOFB-CH-SEL",
            VarUpdateTask::CvSelect => "SICO-SOFB-CV-SEL",
            VarUpdateTask::BpmAdd => "SICO-SOFB-BPM-ADD",
            VarUpdateTask::ChAdd => "SICO-SOFB-CH-ADD",
            VarUpdateTask::CvAdd => "SICO-SOFB-CV-ADD",
            VarUpdateTask::BpmRemove => "SICO-SOFB-BPM-RMV",
            VarUpdateTask::ChRemove => "SICO-SOFB-CH-RMV",
            VarUpdateTask::CvRemove => "SICO-SOFB-CV-RMV",
        }
    }

    pub fn from_pv_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|task| task.pv_name() == name)
    }

    /// Mode the variable updater enters for this job.
    pub fn mode_value(self) -> u8 {
        match self {
            VarUpdateTask::RespmLoad => 1,
            VarUpdateTask::RefOrbitXLoad => 2,
            VarUpdateTask::RefOrbitYLoad => 3,
            VarUpdateTask::RespmSelect => 4,
            VarUpdateTask::RefOrbitXSelect => 5,
            VarUpdateTask::RefOrbitYSelect => 6,
            VarUpdateTask::BpmSelect => 7,
            VarUpdateTask::ChSelect => 8,
            VarUpdateTask::CvSelect => 9,
            VarUpdateTask::BpmAdd => 10,
            VarUpdateTask::ChAdd => 11,
            VarUpdateTask::CvAdd => 12,
            VarUpdateTask::BpmRemove => 13,
            VarUpdateTask::ChRemove => 14,
            VarUpdateTask::CvRemove => 15,
        }
    }

    pub fn rejection_code(self) -> RejectionCode {
        match self {
            VarUpdateTask::RespmLoad => RejectionCode::RespmLoadBlocked,
            VarUpdateTask::RefOrbitXLoad | VarUpdateTask::RefOrbitYLoad => {
                RejectionCode::RefOrbitLoadBlocked
            }
            VarUpdateTask::RespmSelect => RejectionCode::RespmSelectBlocked,
            VarUpdateTask::RefOrbitXSelect | VarUpdateTask::RefOrbitYSelect => {
                RejectionCode::RefOrbitSelectBlocked
            }
            VarUpdateTask::BpmSelect
            | VarUpdateTask::ChSelect
            | VarUpdateTask::CvSelect
            | VarUpdateTask::BpmAdd
            | VarUpdateTask::ChAdd
            | VarUpdateTask::CvAdd
            | VarUpdateTask::BpmRemove
            | VarUpdateTask::ChRemove
            | VarUpdateTask::CvRemove => RejectionCode::ElementSetBlocked,
        }
    }
}

impl fmt::Display for VarUpdateTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.pv_name())
    }
}

/// Decoded value of the mode selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeSelect {
    Stop,
    /// Orbit correction modes 1..=8.
    Correction(u8),
    /// Response matrix measurement modes 9..=14.
    Measurement(u8),
}

impl TryFrom<i64> for ModeSelect {
    type Error = i64;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ModeSelect::Stop),
            1..=8 => Ok(ModeSelect::Correction(value as u8)),
            9..=MAX_MODE_VALUE => Ok(ModeSelect::Measurement(value as u8)),
            other => Err(other),
        }
    }
}

/// A typed request against the arbiter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlRequest {
    SelectMode(ModeSelect),
    SetSampleCount(u32),
    UpdateVariable(VarUpdateTask),
    SetWeight(f64),
}

#[cfg(test)]
#[path = "tests/control_point_tests.rs"]
mod tests;
