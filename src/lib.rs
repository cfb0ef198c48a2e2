pub mod config;
pub mod domain;
pub mod error;
pub mod git;
pub mod publisher;
pub mod ui;

pub use error::{PublishError, Result};
pub use publisher::{PublishOutcome, PublisherConfig, RefPublisher};
