//! Error types for clipool.

pub mod unified;

pub use unified::{ErrorCategory, RecoverySuggestion};

use thiserror::Error;

/// Primary error type for all pool operations.
#[derive(Error, Debug)]
pub enum PoolError {
    #[error(
        "Maximum concurrent sessions ({max_sessions}) reached. \
         Please wait for existing conversations to complete."
    )]
    ResourceExhausted { max_sessions: usize },

    #[error("Identity collision: real id {real} is already bound (promoting {provisional})")]
    IdentityCollision { provisional: String, real: String },

    #[error("Failed to stop session: {0}")]
    Stop(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl PoolError {
    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ResourceExhausted { .. } => ErrorCategory::Capacity,
            Self::IdentityCollision { .. } => ErrorCategory::Invariant,
            Self::Stop(_) => ErrorCategory::Teardown,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::Io(_) => ErrorCategory::Io,
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::InvalidState(_) => ErrorCategory::Unknown,
        }
    }

    /// Whether the caller may retry the same request later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Capacity | ErrorCategory::Timeout
        )
    }

    /// Suggest recovery actions.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self.category() {
            ErrorCategory::Capacity => RecoverySuggestion::RetryLater,
            ErrorCategory::Invariant => RecoverySuggestion::ReportBug,
            ErrorCategory::Teardown => RecoverySuggestion::Ignore,
            ErrorCategory::Timeout => RecoverySuggestion::IncreaseTimeout,
            ErrorCategory::Configuration => RecoverySuggestion::CheckConfiguration,
            _ => RecoverySuggestion::ContactSupport,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, PoolError>;
