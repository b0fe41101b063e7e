//! Capabilities injected into a calculation: cancellation and progress reporting.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared cancellation predicate.
///
/// Cloning is cheap and every clone observes the same predicate. Once the
/// predicate returns `true`, the calculation stops at its next checkpoint and
/// fails with [`crate::Error::Cancelled`].
#[derive(Clone, Default)]
pub struct CancellationToken {
    predicate: Option<Arc<dyn Fn() -> bool + Send + Sync>>,
}

impl CancellationToken {
    /// A token that never cancels
    pub fn none() -> Self {
        Self { predicate: None }
    }

    pub fn from_fn<F>(predicate: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Some(Arc::new(predicate)),
        }
    }

    /// Token following an externally owned flag
    pub fn from_flag(flag: Arc<AtomicBool>) -> Self {
        Self::from_fn(move || flag.load(Ordering::Acquire))
    }

    pub fn is_cancelled(&self) -> bool {
        self.predicate.as_ref().is_some_and(|predicate| predicate())
    }
}

impl fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationToken")
            .field("enabled", &self.predicate.is_some())
            .finish()
    }
}

/// Receives progress events of long running calculations.
/// `progress` is in `[0, 1]`.
pub trait ProgressSink: Send + Sync {
    fn emit_progress(&self, name: &str, progress: f64);
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn emit_progress(&self, _name: &str, _progress: f64) {}
}

impl<F> ProgressSink for F
where
    F: Fn(&str, f64) + Send + Sync,
{
    fn emit_progress(&self, name: &str, progress: f64) {
        self(name, progress);
    }
}
