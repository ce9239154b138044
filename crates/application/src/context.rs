//! Execution context carried through a case
//!
//! A [`Context`] travels from the case into the handler and into every
//! expectation. It carries a cancellation signal, an optional deadline and a
//! set of typed values. The case executor itself never aborts on
//! cancellation; handlers and custom predicates observe it if they care.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use http::Extensions;

use crate::error::{ApplicationError, ApplicationResult};

/// Cancellation, deadline and typed values shared by one case run.
///
/// Cloning is cheap; clones observe the same cancellation signals.
/// Derived contexts (`with_*`) inherit everything from their parent.
#[derive(Debug, Clone, Default)]
pub struct Context {
    cancel_flags: Vec<Arc<AtomicBool>>,
    deadline: Option<Instant>,
    values: Arc<Extensions>,
}

/// Cancels the context it was created with, and every context derived
/// from it.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Signals cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Returns true once [`CancellationToken::cancel`] has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

impl Context {
    /// An empty context: never cancelled, no deadline, no values.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// Derives a context that can be cancelled with the returned token.
    #[must_use]
    pub fn with_cancel(&self) -> (Self, CancellationToken) {
        let flag = Arc::new(AtomicBool::new(false));
        let mut child = self.clone();
        child.cancel_flags.push(Arc::clone(&flag));
        (child, CancellationToken { flag })
    }

    /// Derives a context that expires at `deadline`, or earlier if the
    /// parent already expires sooner.
    #[must_use]
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let mut child = self.clone();
        child.deadline = Some(self.deadline.map_or(deadline, |d| d.min(deadline)));
        child
    }

    /// Derives a context that expires after `timeout`.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derives a context carrying `value`, keyed by its type.
    ///
    /// A value of the same type on the parent is shadowed.
    #[must_use]
    pub fn with_value<T: Clone + Send + Sync + 'static>(&self, value: T) -> Self {
        let mut values = Extensions::clone(&self.values);
        values.insert(value);
        Self {
            cancel_flags: self.cancel_flags.clone(),
            deadline: self.deadline,
            values: Arc::new(values),
        }
    }

    /// Returns the value of type `T`, if one was attached.
    #[must_use]
    pub fn value<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.values.get::<T>()
    }

    /// Returns the deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline; `None` without a deadline.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Returns true if this context or any ancestor was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_flags
            .iter()
            .any(|flag| flag.load(Ordering::SeqCst))
    }

    /// Reports why the context is done, if it is.
    ///
    /// # Errors
    ///
    /// Returns [`ApplicationError::Cancelled`] after cancellation and
    /// [`ApplicationError::DeadlineExceeded`] once the deadline has passed.
    pub fn check(&self) -> ApplicationResult<()> {
        if self.is_cancelled() {
            return Err(ApplicationError::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(ApplicationError::DeadlineExceeded);
        }
        Ok(())
    }
}
