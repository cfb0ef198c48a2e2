//! Git operations abstraction layer
//!
//! This module provides a trait-based abstraction over the repository
//! operations a release publisher needs, allowing for a real Git
//! implementation and a mock implementation for testing.
//!
//! # Overview
//!
//! The primary abstraction is the [RepositoryHandle] trait. The concrete
//! implementations include:
//!
//! - [repository::Git2Repository]: A real implementation using the `git2` crate
//! - [mock::MockRepository]: An in-memory implementation that records calls
//!
//! # Remotes
//!
//! A handle talks to exactly one remote. It is `origin` unless
//! [RepositoryHandle::set_remote] selects another one; every remote lookup
//! and every push goes to that remote.

pub mod mock;
pub mod repository;

pub use mock::{MockCall, MockRepository};
pub use repository::Git2Repository;

use crate::domain::RefKind;
use std::path::Path;

/// Name of the remote used when none is configured
pub const DEFAULT_REMOTE: &str = "origin";

/// Repository operations used to publish release refs
///
/// Errors are reported as `git2::Error`; callers wrap them with the
/// operation and ref they were working on.
///
/// ## Implementations
///
/// - [Git2Repository](repository::Git2Repository): Real Git implementation using the `git2` crate
/// - [MockRepository](mock::MockRepository): Test implementation for mocking Git operations
pub trait RepositoryHandle: Send {
    /// Open the repository at `path`
    ///
    /// # Returns
    /// * `Ok(Self)` - Handle to the repository
    /// * `Err` - If `path` is not a git repository
    fn open(path: &Path) -> Result<Self, git2::Error>
    where
        Self: Sized;

    /// Check out a local branch, updating the working tree
    ///
    /// Fails if the branch does not exist or the working tree has changes
    /// that would be overwritten.
    fn checkout(&mut self, branch: &str) -> Result<(), git2::Error>;

    /// Simulate pushes instead of sending them
    fn set_dry_run(&mut self, dry_run: bool);

    /// Number of extra attempts for pushes failing at the network level
    fn set_max_retries(&mut self, max_retries: u32);

    /// Select the remote used for remote lookups and pushes
    fn set_remote(&mut self, remote: &str);

    /// Check whether a local branch exists
    fn has_local_branch(&self, name: &str) -> Result<bool, git2::Error>;

    /// Check whether a branch exists on the configured remote
    fn has_remote_branch(&self, name: &str) -> Result<bool, git2::Error>;

    /// List tags reachable from a local branch, newest first
    ///
    /// # Example
    /// ```rust
    /// # use release_push::git::RepositoryHandle;
    /// # fn example<R: RepositoryHandle>(repo: &R) -> Result<(), git2::Error> {
    /// let tags = repo.tags_on_branch("main")?;
    /// let published = tags.iter().any(|t| t == "v1.18.0");
    /// # Ok(())
    /// # }
    /// ```
    fn tags_on_branch(&self, branch: &str) -> Result<Vec<String>, git2::Error>;

    /// Check whether a tag exists on the configured remote
    fn has_remote_tag(&self, name: &str) -> Result<bool, git2::Error>;

    /// Push a branch or tag to the configured remote
    ///
    /// `kind` selects the namespace, so a branch and a tag sharing a name
    /// are never confused. Honors the dry-run flag and retry count set earlier.
    fn push(&mut self, kind: RefKind, name: &str) -> Result<(), git2::Error>;
}
