//! HuaweiCloud REST client

mod client;
pub mod common;
mod error;
mod pool;
#[cfg(test)]
pub mod test_helpers;

pub use client::{Client, RetryConfig, ServiceClient};
pub use error::ApiError;
pub use pool::{ConnectionPoolConfig, ConnectionStats};
