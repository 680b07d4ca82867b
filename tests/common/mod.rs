//! Shared test helpers and mock sessions.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use clipool::config::PoolConfig;
use clipool::error::PoolError;
use clipool::pool::SessionPool;
use clipool::session::{Session, SessionFactory, SessionSpec};

/// A session whose busy flag and stop behavior are set by the test.
#[derive(Default)]
pub struct MockSession {
    busy: AtomicBool,
    fail_stop: AtomicBool,
    stop_calls: AtomicUsize,
    pub spec: Option<SessionSpec>,
}

impl MockSession {
    pub fn set_busy(&self, busy: bool) {
        self.busy.store(busy, Ordering::SeqCst);
    }

    /// Make every later `stop` call fail.
    pub fn fail_on_stop(&self) {
        self.fail_stop.store(true, Ordering::SeqCst);
    }

    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Session for MockSession {
    fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    async fn stop(&self) -> Result<(), PoolError> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_stop.load(Ordering::SeqCst) {
            return Err(PoolError::Stop("mock stop failure".into()));
        }
        Ok(())
    }
}

/// Factory handing out [`MockSession`]s; clones share counters.
#[derive(Clone, Default)]
pub struct MockFactory {
    created: Arc<AtomicUsize>,
    fail_create: Arc<AtomicBool>,
}

impl MockFactory {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }
}

impl SessionFactory for MockFactory {
    type Session = MockSession;

    fn create(&self, spec: &SessionSpec) -> Result<MockSession, PoolError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(PoolError::InvalidState("mock factory refused".into()));
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(MockSession {
            spec: Some(spec.clone()),
            ..Default::default()
        })
    }
}

pub fn test_config(max_sessions: usize) -> PoolConfig {
    PoolConfig::builder()
        .workspace("/tmp/clipool-test")
        .api_url("http://localhost:8082")
        .max_sessions(max_sessions)
        .build()
}

pub fn test_pool(max_sessions: usize) -> (SessionPool<MockFactory>, MockFactory) {
    let factory = MockFactory::default();
    let pool = SessionPool::new(test_config(max_sessions), factory.clone()).unwrap();
    (pool, factory)
}
