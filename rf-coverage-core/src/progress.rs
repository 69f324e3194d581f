//! Progress reporting and cooperative cancellation for long-running runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    RayLaunch,
    GridFill,
}

/// Receives coarse-grained progress updates during a run. Call sites report at the granularity
/// of one primary ray or one grid row, not per wall hit.
pub trait ProgressSink: Send {
    fn on_progress(&mut self, phase: Phase, done: u64, total: u64);
}

/// Discards every update; the default when the caller doesn't care.
#[derive(Debug, Default)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn on_progress(&mut self, _phase: Phase, _done: u64, _total: u64) {}
}

/// Adapts a plain closure into a [`ProgressSink`].
pub struct FnProgress<F: FnMut(Phase, u64, u64) + Send>(pub F);

impl<F: FnMut(Phase, u64, u64) + Send> ProgressSink for FnProgress<F> {
    fn on_progress(&mut self, phase: Phase, done: u64, total: u64) {
        (self.0)(phase, done, total)
    }
}

/// Cheap, cloneable cooperative-cancellation flag checked between ray hops and grid cells.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
