//! The worker contract the pool manages, plus its identifiers.

pub mod id;

#[cfg(feature = "process")]
pub mod process;

pub use id::{ProvisionalId, RealId, SessionKey};

#[cfg(feature = "process")]
pub use process::{CliOptions, CliSession, CliSessionFactory};

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::PoolError;

/// A long-lived conversational worker tracked by one registry entry.
///
/// The pool only reads [`is_busy`](Session::is_busy) and calls
/// [`stop`](Session::stop); everything else is driven by the caller holding
/// the session handle.
#[async_trait]
pub trait Session: Send + Sync + 'static {
    /// Whether the worker is currently processing a request.
    fn is_busy(&self) -> bool;

    /// Tear down the worker. Must be safe to call more than once.
    async fn stop(&self) -> Result<(), PoolError>;
}

/// What a new session is constructed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSpec {
    pub workspace: PathBuf,
    pub api_url: String,
    pub allowed_dirs: Vec<PathBuf>,
}

/// Builds sessions on admission.
pub trait SessionFactory: Send + Sync + 'static {
    type Session: Session;

    fn create(&self, spec: &SessionSpec) -> Result<Self::Session, PoolError>;
}
