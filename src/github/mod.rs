//! GitHub access: organization listing and raw file contents.

mod client;
mod types;

pub use client::{DEFAULT_API_URL, FeedstockSource, GitHub};
#[cfg(test)]
pub use client::MockFeedstockSource;
pub use types::Repository;
