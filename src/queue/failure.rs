use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure taxonomy recorded in a request's `errorKind`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    MissingRequiredField,
    /// Player, vehicle or item could not be resolved
    TargetNotFound,
    /// Unknown class, bad path or out-of-range value
    InvalidReference,
    OperationFailed,
    PersistenceFailed,
}

/// Why a handler rejected a request.
///
/// `code` becomes the request's `result` (e.g. `PLAYER_NOT_FOUND`); `detail`
/// only goes to the log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {detail}")]
pub struct Failure {
    pub kind: FailureKind,
    pub code: String,
    pub detail: String,
}

impl Failure {
    pub fn new(kind: FailureKind, code: &str, detail: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.to_string(),
            detail: detail.into(),
        }
    }

    pub fn missing(code: &str, detail: impl Into<String>) -> Self {
        Self::new(FailureKind::MissingRequiredField, code, detail)
    }

    pub fn not_found(code: &str, detail: impl Into<String>) -> Self {
        Self::new(FailureKind::TargetNotFound, code, detail)
    }

    pub fn invalid(code: &str, detail: impl Into<String>) -> Self {
        Self::new(FailureKind::InvalidReference, code, detail)
    }

    pub fn operation(code: &str, detail: impl Into<String>) -> Self {
        Self::new(FailureKind::OperationFailed, code, detail)
    }

    pub fn persistence(code: &str, detail: impl Into<String>) -> Self {
        Self::new(FailureKind::PersistenceFailed, code, detail)
    }
}
