//! Finest-level retrieval.

mod level0;
mod retry;

pub use level0::{default_workers, FetchReport, Level0Fetcher};
pub use retry::{BoundedRetry, NoRetry, RetryForever, RetryPolicy};
