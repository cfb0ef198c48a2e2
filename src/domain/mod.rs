//! Domain logic - ref name rules independent of git operations

pub mod refname;

pub use refname::{BranchName, RefKind, TagName, DEFAULT_TAG_PREFIX, RELEASE_BRANCH_PREFIX};
