//! Submission context carrying the pool handle and run cancellation.
//!
//! Enumeration code receives a [`BackupContext`] and submits jobs through it
//! without ever holding the pool itself. The handle is a weak reference, so
//! a context outliving its run cannot keep the pool alive.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::pool::job::Job;

/// Lifecycle of a worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    /// Created, `run` not entered yet.
    Idle,
    /// Workers consuming, producer still submitting.
    Running,
    /// Producer done; workers finishing what is queued.
    Draining,
    /// All workers exited.
    Terminated,
}

impl fmt::Display for PoolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolState::Idle => write!(f, "idle"),
            PoolState::Running => write!(f, "running"),
            PoolState::Draining => write!(f, "draining"),
            PoolState::Terminated => write!(f, "terminated"),
        }
    }
}

/// Lifecycle flags of one pool.
///
/// Contexts hold these strongly, so the final state stays readable after the
/// run has dropped the pool.
#[derive(Default)]
pub(crate) struct PoolStatus {
    started: AtomicBool,
    intake_closed: AtomicBool,
    terminated: AtomicBool,
}

impl PoolStatus {
    pub(crate) fn mark_started(&self) {
        self.started.store(true, Ordering::SeqCst);
    }

    pub(crate) fn mark_terminated(&self) {
        self.terminated.store(true, Ordering::SeqCst);
    }

    pub(crate) fn state(&self) -> PoolState {
        if self.terminated.load(Ordering::SeqCst) {
            PoolState::Terminated
        } else if !self.started.load(Ordering::SeqCst) {
            PoolState::Idle
        } else if self.intake_closed.load(Ordering::SeqCst) {
            PoolState::Draining
        } else {
            PoolState::Running
        }
    }
}

/// Pool state reachable from contexts.
pub(crate) struct PoolShared {
    intake: Mutex<Option<mpsc::Sender<Job>>>,
    status: Arc<PoolStatus>,
}

impl PoolShared {
    pub(crate) fn new(intake: mpsc::Sender<Job>) -> Self {
        Self {
            intake: Mutex::new(Some(intake)),
            status: Arc::new(PoolStatus::default()),
        }
    }

    pub(crate) fn replace_intake(&self, intake: mpsc::Sender<Job>) {
        *self.intake.lock().unwrap_or_else(PoisonError::into_inner) = Some(intake);
    }

    pub(crate) fn status(&self) -> &Arc<PoolStatus> {
        &self.status
    }

    fn sender(&self) -> Option<mpsc::Sender<Job>> {
        self.intake
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drop the pool's sender; the channel closes once in-flight sends finish.
    fn close_intake(&self) -> bool {
        let closed = self
            .intake
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some();
        self.status.intake_closed.store(true, Ordering::SeqCst);
        closed
    }
}

/// What a bound context keeps of its pool.
#[derive(Clone)]
struct PoolHandle {
    shared: Weak<PoolShared>,
    status: Arc<PoolStatus>,
}

/// Cancellable context threaded through a backup session.
///
/// A fresh context carries no pool; [`BackupContext::bind`] derives one that
/// does. Clones share the same cancellation and pool handle.
#[derive(Clone, Default)]
pub struct BackupContext {
    cancel: CancellationToken,
    pool: Option<PoolHandle>,
}

impl BackupContext {
    /// Create a root context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive a context carrying a submission handle for `pool`.
    ///
    /// The derived context can be cancelled without affecting this one.
    pub fn bind(&self, pool: &crate::pool::WorkerPool) -> Self {
        let shared = pool.shared();
        Self {
            cancel: self.cancel.child_token(),
            pool: Some(PoolHandle {
                shared: Arc::downgrade(shared),
                status: shared.status().clone(),
            }),
        }
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Cancel this context and everything derived from it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// State of the bound pool, if any is bound.
    ///
    /// A pool dropped without running reports [`PoolState::Terminated`].
    pub fn pool_state(&self) -> Option<PoolState> {
        let handle = self.pool.as_ref()?;
        if handle.shared.strong_count() == 0 {
            return Some(PoolState::Terminated);
        }
        Some(handle.status.state())
    }

    pub(crate) fn is_bound_to(&self, shared: &Arc<PoolShared>) -> bool {
        self.pool
            .as_ref()
            .is_some_and(|handle| std::ptr::eq(handle.shared.as_ptr(), Arc::as_ptr(shared)))
    }

    /// Enqueue `job` on the bound pool.
    ///
    /// Blocks while the intake is full. Returns [`Error::Cancelled`] without
    /// enqueueing once the context is cancelled, so producers can stop
    /// enumerating early. This holds after the run has torn the pool down.
    pub async fn submit(&self, job: Job) -> Result<()> {
        let handle = self.pool.as_ref().ok_or(Error::NoPoolBound)?;
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let sender = handle
            .shared
            .upgrade()
            .and_then(|shared| shared.sender())
            .ok_or_else(|| self.closed_error())?;

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Error::Cancelled),
            sent = sender.send(job) => sent.map_err(|_| self.closed_error()),
        }
    }

    /// Signal that no more jobs will be submitted through this run.
    ///
    /// Closes the intake; workers drain what is queued, then exit. Calling it
    /// again, or after the pool is gone, is a no-op.
    pub fn mark_producer_done(&self) -> Result<()> {
        let handle = self.pool.as_ref().ok_or(Error::NoPoolBound)?;
        if let Some(shared) = handle.shared.upgrade() {
            if shared.close_intake() {
                tracing::debug!("Producer done, closing intake");
            }
        }
        Ok(())
    }

    fn closed_error(&self) -> Error {
        if self.cancel.is_cancelled() {
            Error::Cancelled
        } else {
            Error::PoolClosed
        }
    }
}

impl fmt::Debug for BackupContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackupContext")
            .field("cancelled", &self.is_cancelled())
            .field("pool_state", &self.pool_state())
            .finish()
    }
}
