//! Test outcome types
//!
//! Every executed case produces exactly one [`Verdict`]
//!
//! Inside the harness failures travel as [`CaseError`] until the
//! orchestrator converts them into the final verdict

use std::error::Error;
use std::fmt;

/// Tri-state outcome of a single case execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    /// Device output did not match the reference
    Fail(String),
    /// A required capability is missing; not a failure
    NotSupported(String),
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, Verdict::Fail(_))
    }

    pub fn is_not_supported(&self) -> bool {
        matches!(self, Verdict::NotSupported(_))
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Pass => write!(f, "Pass"),
            Verdict::Fail(msg) => write!(f, "Fail: {}", msg),
            Verdict::NotSupported(reason) => write!(f, "Not supported: {}", reason),
        }
    }
}

/// Errors raised while driving a case
///
/// `NotSupported` is a first-class outcome, raised by capability checks
/// before any resource is built; the remaining variants are genuine errors
#[derive(Debug)]
pub enum CaseError {
    /// A queried capability (format feature, extension, queue class,
    /// feature bit, limit) is absent
    NotSupported(String),
    /// Device output does not match the reference
    Comparison(String),
    /// Unexpected device, driver or I/O failure; aborts the case
    Internal(String),
}

impl CaseError {
    pub fn not_supported(what: &str) -> CaseError {
        CaseError::NotSupported(what.to_owned())
    }

    pub fn internal(what: &str) -> CaseError {
        CaseError::Internal(what.to_owned())
    }

    /// Collapse into the externally visible verdict
    pub fn into_verdict(self) -> Verdict {
        match self {
            CaseError::NotSupported(reason) => Verdict::NotSupported(reason),
            CaseError::Comparison(msg) => Verdict::Fail(msg),
            CaseError::Internal(msg) => Verdict::Fail(format!("internal error: {}", msg)),
        }
    }
}

impl fmt::Display for CaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseError::NotSupported(reason) => write!(f, "Not supported: {}", reason),
            CaseError::Comparison(msg) => write!(f, "Comparison failed: {}", msg),
            CaseError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl Error for CaseError {}
