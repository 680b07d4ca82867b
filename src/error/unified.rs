//! Error classification and recovery.

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Capacity,
    Invariant,
    Teardown,
    Timeout,
    Io,
    Configuration,
    Unknown,
}

/// Suggested recovery action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySuggestion {
    /// The pool is full; try again once a conversation completes.
    RetryLater,
    /// The worker layer broke the identity protocol.
    ReportBug,
    CheckConfiguration,
    IncreaseTimeout,
    Ignore,
    ContactSupport,
}
