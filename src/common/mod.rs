//! Common utilities shared by the API client
//!
//! - Retry policy with exponential backoff for rate-limited requests

pub mod backoff;

pub use backoff::RetryPolicy;
