//! clipool: bounded pool of subprocess-backed conversation sessions.
//!
//! Each conversation runs in its own worker process. A new session is
//! registered under a locally generated provisional id; once the worker
//! reports the id its provider assigned, the session is promoted and looked
//! up by that id from then on. The pool caps how many sessions exist at once
//! and reclaims idle ones under pressure.
//!
//! # Quick Start
//!
//! ```no_run
//! use clipool::prelude::*;
//!
//! # #[cfg(feature = "process")]
//! # async fn example() -> clipool::error::Result<()> {
//! let config = PoolConfig::from_env()?;
//! let pool = SessionPool::new(config, CliSessionFactory::default())?;
//!
//! let acquired = pool.acquire(None).await?;
//! let _stdout = acquired.session.launch(&["-p".into(), "Hello!".into()])?;
//!
//! // Later, once the worker has reported its id:
//! if let SessionKey::Provisional(provisional) = &acquired.id {
//!     pool.promote(provisional, RealId::from("session-abc")).await?;
//! }
//!
//! pool.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod pool;
pub mod prelude;
pub mod session;
