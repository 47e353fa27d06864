use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Forbidden,
    NotFound,
    Validation,
    Internal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Numeric code published on the error PV when a write is refused.
///
/// Several control points share a code (5, 9 and 12); the discriminants are
/// the values clients see and must not be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum RejectionCode {
    CorrectionRunning = 1,
    SampleCountTooLarge = 2,
    RespmLoadBlocked = 4,
    RefOrbitLoadBlocked = 5,
    MeasurementRunning = 7,
    RespmSelectBlocked = 8,
    RefOrbitSelectBlocked = 9,
    ElementSetBlocked = 12,
    WeightOutOfRange = 14,
}

impl RejectionCode {
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl From<RejectionCode> for u8 {
    fn from(value: RejectionCode) -> Self {
        value.code()
    }
}

impl TryFrom<u8> for RejectionCode {
    type Error = UnknownRejectionCode;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            1 => Self::CorrectionRunning,
            2 => Self::SampleCountTooLarge,
            4 => Self::RespmLoadBlocked,
            5 => Self::RefOrbitLoadBlocked,
            7 => Self::MeasurementRunning,
            8 => Self::RespmSelectBlocked,
            9 => Self::RefOrbitSelectBlocked,
            12 => Self::ElementSetBlocked,
            14 => Self::WeightOutOfRange,
            other => return Err(UnknownRejectionCode(other)),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown rejection code {0}")]
pub struct UnknownRejectionCode(pub u8);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} name: {name}")]
pub struct ParseNameError {
    pub kind: &'static str,
    pub name: String,
}

impl ParseNameError {
    pub fn new(kind: &'static str, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}
