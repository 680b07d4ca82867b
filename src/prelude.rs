//! Convenience re-exports for common use.

pub use crate::config::PoolConfig;
pub use crate::error::{PoolError, Result};
pub use crate::pool::{Acquired, PoolStats, ReleaseOutcome, SessionPool};
pub use crate::session::{ProvisionalId, RealId, Session, SessionFactory, SessionKey, SessionSpec};

#[cfg(feature = "process")]
pub use crate::session::{CliOptions, CliSession, CliSessionFactory};
