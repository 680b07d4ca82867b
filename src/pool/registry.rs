//! Lock-free bookkeeping behind [`SessionPool`](super::SessionPool).
//!
//! Every method here assumes the caller holds the pool lock. Nothing in this
//! module awaits; stopping sessions is left to the pool.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::PoolError;
use crate::session::{ProvisionalId, RealId, Session, SessionKey};

/// Upper bound on sessions reclaimed by one eviction pass.
pub const EVICTION_BATCH: usize = 3;

/// One registered session.
#[derive(Debug)]
pub(crate) struct Entry<S> {
    pub session: Arc<S>,
    pub admitted_at: DateTime<Utc>,
    /// Admission order, fixed for the entry's lifetime.
    pub seq: u64,
    /// Order of insertion into the map currently holding the entry;
    /// restamped on promotion. Eviction scans oldest first.
    pub registered: u64,
}

// Manual impl: `S` itself need not be `Clone`.
impl<S> Clone for Entry<S> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
            admitted_at: self.admitted_at,
            seq: self.seq,
            registered: self.registered,
        }
    }
}

#[derive(Debug)]
pub(crate) struct Registry<S> {
    active: HashMap<RealId, Entry<S>>,
    pending: HashMap<ProvisionalId, Entry<S>>,
    identities: HashMap<ProvisionalId, RealId>,
    next_seq: u64,
}

impl<S> Default for Registry<S> {
    fn default() -> Self {
        Self {
            active: HashMap::new(),
            pending: HashMap::new(),
            identities: HashMap::new(),
            next_seq: 0,
        }
    }
}

impl<S: Session> Registry<S> {
    pub fn len(&self) -> usize {
        self.active.len() + self.pending.len()
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn busy_count(&self) -> usize {
        self.active
            .values()
            .filter(|entry| entry.session.is_busy())
            .count()
    }

    pub fn get_active(&self, id: &RealId) -> Option<&Arc<S>> {
        self.active.get(id).map(|entry| &entry.session)
    }

    /// A provisional id not currently pending and never promoted.
    pub fn fresh_provisional_id(&self) -> ProvisionalId {
        loop {
            let id = ProvisionalId::generate();
            if !self.pending.contains_key(&id) && !self.identities.contains_key(&id) {
                return id;
            }
        }
    }

    fn next_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    pub fn insert_pending(&mut self, id: ProvisionalId, session: Arc<S>) {
        let seq = self.next_seq();
        let entry = Entry {
            session,
            admitted_at: Utc::now(),
            seq,
            registered: seq,
        };
        let previous = self.pending.insert(id, entry);
        debug_assert!(previous.is_none(), "provisional id reused");
    }

    /// Move a pending entry under its real id.
    ///
    /// `Ok(false)` when `provisional` is not pending. A real id that is
    /// already active is a collision; the pending entry stays put.
    pub fn promote(&mut self, provisional: &ProvisionalId, real: RealId) -> Result<bool, PoolError> {
        if self.active.contains_key(&real) && self.pending.contains_key(provisional) {
            return Err(PoolError::IdentityCollision {
                provisional: provisional.to_string(),
                real: real.to_string(),
            });
        }
        let Some(mut entry) = self.pending.remove(provisional) else {
            return Ok(false);
        };

        entry.registered = self.next_seq();
        self.identities.insert(provisional.clone(), real.clone());
        self.active.insert(real, entry);
        Ok(true)
    }

    pub fn resolve(&self, provisional: &ProvisionalId) -> Option<RealId> {
        self.identities.get(provisional).cloned()
    }

    /// Detach the entry registered under a raw id, checking the pending
    /// namespace first. Taking an active entry purges the identity-map rows
    /// pointing at it.
    pub fn take(&mut self, raw: &str) -> Option<(SessionKey, Arc<S>)> {
        let provisional = ProvisionalId::from(raw);
        if let Some(entry) = self.pending.remove(&provisional) {
            return Some((SessionKey::Provisional(provisional), entry.session));
        }

        let real = RealId::from(raw);
        let entry = self.active.remove(&real)?;
        self.identities.retain(|_, mapped| *mapped != real);
        Some((SessionKey::Real(real), entry.session))
    }

    /// Detach up to [`EVICTION_BATCH`] idle active sessions, earliest
    /// promoted first.
    ///
    /// Pending entries are never candidates. Identity-map rows are kept.
    pub fn take_idle(&mut self) -> Vec<(RealId, Arc<S>)> {
        let mut idle: Vec<(u64, RealId)> = self
            .active
            .iter()
            .filter(|(_, entry)| !entry.session.is_busy())
            .map(|(id, entry)| (entry.registered, id.clone()))
            .collect();
        idle.sort_unstable_by_key(|(registered, _)| *registered);

        idle.into_iter()
            .take(EVICTION_BATCH)
            .filter_map(|(_, id)| {
                let entry = self.active.remove(&id)?;
                Some((id, entry.session))
            })
            .collect()
    }

    /// Detach everything and forget every identity mapping.
    pub fn drain(&mut self) -> Vec<(SessionKey, Arc<S>)> {
        self.identities.clear();
        let pending = self
            .pending
            .drain()
            .map(|(id, entry)| (SessionKey::Provisional(id), entry.session));
        let active = self
            .active
            .drain()
            .map(|(id, entry)| (SessionKey::Real(id), entry.session));
        pending.chain(active).collect()
    }

    /// All entries in admission order.
    pub fn entries(&self) -> Vec<(SessionKey, Entry<S>)> {
        let mut rows: Vec<(SessionKey, Entry<S>)> = self
            .pending
            .iter()
            .map(|(id, entry)| (SessionKey::Provisional(id.clone()), entry.clone()))
            .chain(
                self.active
                    .iter()
                    .map(|(id, entry)| (SessionKey::Real(id.clone()), entry.clone())),
            )
            .collect();
        rows.sort_unstable_by_key(|(_, entry)| entry.seq);
        rows
    }
}
