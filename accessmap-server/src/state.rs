use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use accessmap_core::prelude::*;

/// Shared state of the HTTP handlers
pub struct AppState<R> {
    pub routing: R,
    pub nodes: NodeCollection,
    pub isochrone: IsochroneConfig,
    shutdown: Arc<AtomicBool>,
}

impl<R: RoutingEngine> AppState<R> {
    pub fn new(routing: R, nodes: NodeCollection, isochrone: IsochroneConfig) -> Self {
        Self {
            routing,
            nodes,
            isochrone,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Cancels every running calculation at its next checkpoint
    pub fn begin_shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
    }

    /// Token of a calculation started by a request, tripped on shutdown
    pub fn cancellation(&self) -> CancellationToken {
        CancellationToken::from_flag(Arc::clone(&self.shutdown))
    }
}
