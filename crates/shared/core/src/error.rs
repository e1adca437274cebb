use thiserror::Error;

/// Errors carried on the executor error channel
///
/// The virtual-time layer raises no errors of its own beyond
/// `NegativeDuration`; everything else originates from client code via
/// `raise_error` and is propagated unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecError {
    #[error("raised: {0}")]
    Raised(String),

    #[error("negative duration: {0}ns")]
    NegativeDuration(i64),
}

impl ExecError {
    /// Raise an application-level error from a message
    pub fn raised(msg: impl Into<String>) -> Self {
        ExecError::Raised(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, ExecError>;
