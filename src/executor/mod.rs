//! Probe execution engine
//!
//! - Retry/fallback policy wrapping a single [`crate::client::Probe`]
//! - Scheduler fanning policies out under a concurrency bound and a run deadline
//! - Cancellation and monotonic progress shared by both

pub mod cancel;
pub mod progress;
pub mod retry;
pub mod scheduler;

pub use cancel::CancellationHandle;
pub use progress::{ProgressSpan, ProgressTracker};
pub use retry::{KnownReachable, RetryConfig, RetryPolicy};
pub use scheduler::{
    AbandonPolicy, ResultsCollection, ScheduleReport, Scheduler, SchedulerConfig, StopReason,
};
