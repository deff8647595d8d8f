//! HuaweiCloud client with job submission and wait helpers
//!
//! Mutating HuaweiCloud calls usually answer with a job ID. The
//! [`operations`] submit such calls and block on the job through the
//! [`statewait`] poller; [`jobs`] holds the per-service status endpoints.

pub mod api;
pub mod config;
pub mod error;
pub mod jobs;
pub mod operations;

pub use api::{ApiError, Client, ServiceClient};
pub use config::{Config, ConfigError};
pub use error::{Error, Result};
pub use operations::DeletePolicy;
pub use statewait::{Context, WaitConfig};
