//! statewait - waiting on long-running cloud jobs
//!
//! Cloud control planes answer many mutating calls with a job identifier and
//! expect the caller to poll a status endpoint until the job settles. This
//! crate provides the reusable part of that pattern: a cancellable,
//! deadline-bound poller that is generic over the status vocabulary and over
//! how a status is fetched.

pub mod context;
pub mod error;
pub mod status;
pub mod waiter;

pub use context::Context;
pub use error::WaitError;
pub use status::{Classify, Phase, StatusSet};
pub use waiter::{
    refresh_fn, FnRefresh, Outcome, PollSchedule, ProgressCallback, Refresh, Snapshot, WaitConfig,
    WaitEvent, Waiter,
};
