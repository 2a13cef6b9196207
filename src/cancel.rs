use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag for long-running operations.
///
/// Tessellation and voxelization check the token at coarse-grained
/// checkpoints (per subdivision level, per voxel slab). A cancelled
/// operation returns [`OperationError::Cancelled`](crate::error::OperationError::Cancelled)
/// and performs no store mutation.
///
/// Tokens are cheap to clone; all clones observe the same flag, so the
/// host can hand one to a worker and cancel from the caller side.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a new, un-cancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Returns whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}
