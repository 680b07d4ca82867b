//! Bounded pool of conversation sessions.
//!
//! [`SessionPool`] owns every registered session and is the only way to add,
//! re-key or remove one:
//! - [`SessionPool::acquire`]: reuse an active session or admit a new one
//! - [`SessionPool::promote`]: re-key a pending session under its real id
//! - [`SessionPool::resolve`]: map a provisional id to the real id it became
//! - [`SessionPool::release`]: stop and remove one session by either id
//! - [`SessionPool::shutdown`]: stop and remove everything
//! - [`SessionPool::snapshot`]: counts for introspection
//!
//! Every operation runs under one pool-wide lock. Session `stop` calls are
//! awaited while that lock is held, so a slow stop stalls the whole pool.

pub mod registry;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::PoolConfig;
use crate::error::{PoolError, Result};
use crate::session::{ProvisionalId, RealId, Session, SessionFactory, SessionKey, SessionSpec};
use registry::Registry;

pub use registry::EVICTION_BATCH;

/// Result of [`SessionPool::acquire`].
pub struct Acquired<S> {
    pub session: Arc<S>,
    /// Real id for a reused session, provisional id for a new one.
    pub id: SessionKey,
    pub is_new: bool,
}

/// Result of [`SessionPool::release`].
///
/// A failed stop still removes the session from the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseOutcome {
    NotFound,
    Released,
    ReleasedWithStopError(String),
}

impl ReleaseOutcome {
    /// Whether a session was removed.
    pub fn removed(&self) -> bool {
        !matches!(self, Self::NotFound)
    }
}

/// Point-in-time pool counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    pub active_sessions: usize,
    pub pending_sessions: usize,
    pub max_sessions: usize,
    /// Active sessions whose worker reported busy.
    pub busy_count: usize,
}

/// Which namespace a session is registered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SessionState {
    Pending,
    Active,
}

/// One row of [`SessionPool::sessions`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub id: SessionKey,
    pub state: SessionState,
    pub busy: bool,
    pub admitted_at: DateTime<Utc>,
}

/// Pool of sessions built by `F`, capped at `max_sessions`.
pub struct SessionPool<F: SessionFactory> {
    factory: F,
    spec: SessionSpec,
    max_sessions: usize,
    registry: Mutex<Registry<F::Session>>,
}

impl<F: SessionFactory> SessionPool<F> {
    /// Create an empty pool. Fails if `config` does not validate.
    pub fn new(config: PoolConfig, factory: F) -> Result<Self> {
        config.validate()?;
        info!(max_sessions = config.max_sessions, "session pool initialized");
        Ok(Self {
            factory,
            spec: config.session_spec(),
            max_sessions: config.max_sessions,
            registry: Mutex::new(Registry::default()),
        })
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }

    /// Return the active session for `existing`, or admit a new one.
    ///
    /// At capacity, idle active sessions are evicted first; if that frees
    /// nothing the call fails with [`PoolError::ResourceExhausted`]. New
    /// sessions start pending under a provisional id.
    pub async fn acquire(&self, existing: Option<&RealId>) -> Result<Acquired<F::Session>> {
        let mut registry = self.registry.lock().await;

        if let Some(real) = existing {
            if let Some(session) = registry.get_active(real) {
                debug!(real = %real, "reusing active session");
                return Ok(Acquired {
                    session: Arc::clone(session),
                    id: SessionKey::Real(real.clone()),
                    is_new: false,
                });
            }
        }

        if registry.len() >= self.max_sessions {
            evict_idle(&mut *registry).await;
            if registry.len() >= self.max_sessions {
                warn!(max_sessions = self.max_sessions, "session pool exhausted");
                return Err(PoolError::ResourceExhausted {
                    max_sessions: self.max_sessions,
                });
            }
        }

        let session = Arc::new(self.factory.create(&self.spec)?);
        let id = registry.fresh_provisional_id();
        registry.insert_pending(id.clone(), Arc::clone(&session));
        info!(provisional = %id, "created pending session");

        Ok(Acquired {
            session,
            id: SessionKey::Provisional(id),
            is_new: true,
        })
    }

    /// Re-key a pending session under the real id its worker reported.
    ///
    /// Returns `Ok(false)` if `provisional` is not pending (unknown or
    /// already promoted). Fails with [`PoolError::IdentityCollision`] if
    /// `real` already names another active session; nothing is changed.
    pub async fn promote(&self, provisional: &ProvisionalId, real: RealId) -> Result<bool> {
        let mut registry = self.registry.lock().await;
        match registry.promote(provisional, real.clone()) {
            Ok(true) => {
                info!(provisional = %provisional, real = %real, "promoted session");
                Ok(true)
            }
            Ok(false) => {
                warn!(provisional = %provisional, "no pending session to promote");
                Ok(false)
            }
            Err(e) => {
                error!(provisional = %provisional, real = %real, "real id already bound to another session");
                Err(e)
            }
        }
    }

    /// Real id a provisional id was promoted to, if any.
    pub async fn resolve(&self, provisional: &ProvisionalId) -> Option<RealId> {
        self.registry.lock().await.resolve(provisional)
    }

    /// Stop and remove the session registered under `id`.
    ///
    /// `id` may be a provisional or a real id; the pending namespace is
    /// checked first.
    pub async fn release(&self, id: &str) -> ReleaseOutcome {
        let mut registry = self.registry.lock().await;
        let Some((key, session)) = registry.take(id) else {
            return ReleaseOutcome::NotFound;
        };

        let state = if key.is_provisional() {
            SessionState::Pending
        } else {
            SessionState::Active
        };
        match session.stop().await {
            Ok(()) => {
                info!(id = %key, state = %state, "released session");
                ReleaseOutcome::Released
            }
            Err(e) => {
                warn!(id = %key, state = %state, error = %e, "session stop failed during release");
                ReleaseOutcome::ReleasedWithStopError(e.to_string())
            }
        }
    }

    /// Stop every session and clear the registry.
    ///
    /// Stop failures are logged and never keep other sessions from being
    /// stopped.
    pub async fn shutdown(&self) {
        let mut registry = self.registry.lock().await;
        let sessions = registry.drain();
        let count = sessions.len();

        let results = join_all(sessions.iter().map(|(_, session)| session.stop())).await;
        for ((key, _), result) in sessions.iter().zip(results) {
            if let Err(e) = result {
                error!(id = %key, error = %e, "error stopping session");
            }
        }

        info!(stopped = count, "all sessions stopped");
    }

    /// Current counts, read under one lock hold.
    pub async fn snapshot(&self) -> PoolStats {
        let registry = self.registry.lock().await;
        PoolStats {
            active_sessions: registry.active_len(),
            pending_sessions: registry.pending_len(),
            max_sessions: self.max_sessions,
            busy_count: registry.busy_count(),
        }
    }

    /// Every registered session in admission order.
    pub async fn sessions(&self) -> Vec<SessionInfo> {
        let registry = self.registry.lock().await;
        registry
            .entries()
            .into_iter()
            .map(|(id, entry)| SessionInfo {
                state: if id.is_provisional() {
                    SessionState::Pending
                } else {
                    SessionState::Active
                },
                busy: entry.session.is_busy(),
                admitted_at: entry.admitted_at,
                id,
            })
            .collect()
    }
}

/// Reclaim idle active sessions. Caller holds the pool lock.
async fn evict_idle<S: Session>(registry: &mut Registry<S>) {
    for (real, session) in registry.take_idle() {
        match session.stop().await {
            Ok(()) => debug!(real = %real, "evicted idle session"),
            Err(e) => warn!(real = %real, error = %e, "idle session stop failed during eviction"),
        }
    }
}
