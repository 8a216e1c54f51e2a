//! Step-level error taxonomy.
//!
//! Every primitive handler reports failure through [`StepError`]. The display
//! string is the user-visible `error` text carried by step events and the
//! terminal report, so messages are written for script authors, not operators.

use thiserror::Error;

/// Failure reported by a primitive handler or the dispatcher.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StepError {
    /// Missing required field, unknown action or condition, malformed argument.
    #[error("{0}")]
    InvalidArgument(String),

    /// Selector, element, picker wheel, or alert button not located in time.
    #[error("{0}")]
    NotFound(String),

    /// Element exists but is not hittable when the action requires it.
    #[error("{0}")]
    NotInteractable(String),

    /// A bounded wait elapsed: app never reached foreground, state never settled.
    #[error("{0}")]
    Timeout(String),

    /// An `assert*` primitive failed; carries the script author's message verbatim.
    #[error("{0}")]
    AssertionFailed(String),

    /// `math` divide or mod with a zero divisor.
    #[error("division by zero")]
    DivideByZero,

    /// Base64 or image payload could not be decoded.
    #[error("{0}")]
    Decode(String),

    /// Wraps any unexpected host failure surfaced by the driver or vision facade.
    #[error("{0}")]
    Unknown(String),
}

impl StepError {
    /// Stable machine-readable kind tag, used in structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            StepError::InvalidArgument(_) => "invalidArgument",
            StepError::NotFound(_) => "notFound",
            StepError::NotInteractable(_) => "notInteractable",
            StepError::Timeout(_) => "timeout",
            StepError::AssertionFailed(_) => "assertionFailed",
            StepError::DivideByZero => "divideByZero",
            StepError::Decode(_) => "decode",
            StepError::Unknown(_) => "unknown",
        }
    }

    /// Wraps an opaque host error (driver/vision backends report `anyhow`).
    pub fn from_host(error: impl std::fmt::Display) -> Self {
        StepError::Unknown(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_the_bare_message() {
        let err = StepError::AssertionFailed("no ghost".into());
        assert_eq!(err.to_string(), "no ghost");

        let err = StepError::NotFound("element 'Go' not found within 10s".into());
        assert_eq!(err.to_string(), "element 'Go' not found within 10s");
    }

    #[test]
    fn divide_by_zero_has_a_fixed_message() {
        assert_eq!(StepError::DivideByZero.to_string(), "division by zero");
        assert_eq!(StepError::DivideByZero.kind(), "divideByZero");
    }
}
