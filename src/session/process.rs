//! Subprocess-backed session running a CLI agent.

use std::future::Future;
use std::process::Stdio;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::{Child, ChildStdout, Command};
use tracing::debug;

use super::{Session, SessionFactory, SessionSpec};
use crate::error::PoolError;

/// Process-level settings shared by every [`CliSession`] a factory builds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliOptions {
    /// Executable to run.
    pub program: String,
    /// How long `stop` waits for the killed process to exit.
    pub stop_timeout: Duration,
}

impl Default for CliOptions {
    fn default() -> Self {
        Self {
            program: "claude".to_string(),
            stop_timeout: Duration::from_secs(5),
        }
    }
}

/// One CLI worker process, started on demand by [`launch`](CliSession::launch).
///
/// The session reports busy while its child has not exited. Reading and
/// framing the child's output is the caller's job.
pub struct CliSession {
    spec: SessionSpec,
    options: CliOptions,
    child: Mutex<Option<Child>>,
}

impl CliSession {
    pub fn new(spec: SessionSpec, options: CliOptions) -> Self {
        Self {
            spec,
            options,
            child: Mutex::new(None),
        }
    }

    pub fn spec(&self) -> &SessionSpec {
        &self.spec
    }

    /// Build the invocation for `args` without spawning it.
    pub fn command(&self, args: &[String]) -> Command {
        let mut command = Command::new(&self.options.program);
        command
            .current_dir(&self.spec.workspace)
            .env("ANTHROPIC_BASE_URL", &self.spec.api_url)
            .env("ANTHROPIC_API_URL", &self.spec.api_url);
        for dir in &self.spec.allowed_dirs {
            command.arg("--add-dir").arg(dir);
        }
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        command
    }

    /// Spawn the worker and hand back its stdout.
    ///
    /// Fails with [`PoolError::InvalidState`] while a previous process is
    /// still running.
    pub fn launch(&self, args: &[String]) -> Result<ChildStdout, PoolError> {
        let mut slot = self.lock_child();
        if let Some(child) = slot.as_mut() {
            if matches!(child.try_wait(), Ok(None)) {
                return Err(PoolError::InvalidState(
                    "worker process is still running".into(),
                ));
            }
        }

        let mut child = self.command(args).spawn()?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| PoolError::InvalidState("worker stdout was not captured".into()))?;
        debug!(program = %self.options.program, pid = ?child.id(), "spawned worker process");
        *slot = Some(child);
        Ok(stdout)
    }

    fn lock_child(&self) -> MutexGuard<'_, Option<Child>> {
        self.child
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Session for CliSession {
    fn is_busy(&self) -> bool {
        match self.lock_child().as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    async fn stop(&self) -> Result<(), PoolError> {
        let child = self.lock_child().take();
        let Some(mut child) = child else {
            return Ok(());
        };
        if child.try_wait()?.is_some() {
            return Ok(());
        }

        child.start_kill()?;
        with_timeout(self.options.stop_timeout, async move {
            child.wait().await?;
            Ok(())
        })
        .await
    }
}

/// Bound `future` by `duration`, mapping expiry to [`PoolError::Timeout`].
async fn with_timeout<T>(
    duration: Duration,
    future: impl Future<Output = Result<T, PoolError>>,
) -> Result<T, PoolError> {
    tokio::time::timeout(duration, future)
        .await
        .unwrap_or(Err(PoolError::Timeout(duration.as_millis() as u64)))
}

/// Builds [`CliSession`]s with shared [`CliOptions`].
#[derive(Debug, Clone, Default)]
pub struct CliSessionFactory {
    options: CliOptions,
}

impl CliSessionFactory {
    pub fn new(options: CliOptions) -> Self {
        Self { options }
    }
}

impl SessionFactory for CliSessionFactory {
    type Session = CliSession;

    fn create(&self, spec: &SessionSpec) -> Result<CliSession, PoolError> {
        Ok(CliSession::new(spec.clone(), self.options.clone()))
    }
}
