use thiserror::Error;

/// Input rejected at the edge of the treasure domain, before any valuation
/// or appraisal work starts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("validation failed: {0}")]
    Validation(String),

    /// Text that does not parse as the named identifier type.
    #[error("invalid {kind} `{input}`: {reason}")]
    InvalidId {
        kind: &'static str,
        input: String,
        reason: String,
    },
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(kind: &'static str, input: &str, reason: impl ToString) -> Self {
        Self::InvalidId {
            kind,
            input: input.to_string(),
            reason: reason.to_string(),
        }
    }
}
