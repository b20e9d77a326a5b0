//! Shared-timer polling fallback for dashboard panels.
//!
//! When the push channel is down — or as a low-frequency safety net while it
//! is up — every panel that wants periodic refresh registers a keyed fetch
//! function here. One process-wide timer drives all of them: N mounted
//! panels never means N timers hammering a rate-limited backend.
//!
//! Correctness properties:
//! - The shared timer starts lazily on first registration and is torn down
//!   when the registry empties; it is never left running with no consumers
//! - Re-registering a key replaces the stored function (last writer wins),
//!   so stale closures never fire after a panel re-renders
//! - A tick never overlaps a key's still-pending fetch; the tick is skipped,
//!   not queued, so slow backends degrade to lower effective frequency

pub mod coordinator;
pub mod error;

pub use coordinator::{CoordinatorConfig, FallbackCoordinator, FetchFn, FetchFuture};
pub use error::{FetchError, FetchResult};
