use crate::error::{PublishError, Result};
use std::fmt;

/// Prefix every release branch must carry (e.g. `release-1.18`)
pub const RELEASE_BRANCH_PREFIX: &str = "release-";

/// Default prefix for release tags (e.g. `v1.18.0`)
pub const DEFAULT_TAG_PREFIX: &str = "v";

/// The kind of ref being published
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Branch,
    Tag,
}

impl RefKind {
    /// Namespace refs of this kind live under
    pub fn ref_prefix(&self) -> &'static str {
        match self {
            RefKind::Branch => "refs/heads/",
            RefKind::Tag => "refs/tags/",
        }
    }

    /// Full reference name, e.g. `refs/tags/v1.18.0`
    pub fn qualify(&self, name: &str) -> String {
        format!("{}{}", self.ref_prefix(), name)
    }
}

impl fmt::Display for RefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefKind::Branch => write!(f, "branch"),
            RefKind::Tag => write!(f, "tag"),
        }
    }
}

/// A release branch name that passed the `release-<major>.<minor>` grammar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchName {
    name: String,
    version: semver::Version,
}

impl BranchName {
    /// Validate a release branch name.
    ///
    /// The name must start with `release-` and the remainder, suffixed with
    /// `.0`, must parse as a semantic version.
    ///
    /// # Example
    /// ```rust
    /// # use release_push::domain::BranchName;
    /// let branch = BranchName::parse("release-1.18").unwrap();
    /// assert_eq!(branch.version().minor, 18);
    /// assert!(BranchName::parse("release-foo").is_err());
    /// ```
    pub fn parse(name: &str) -> Result<Self> {
        let suffix = name.strip_prefix(RELEASE_BRANCH_PREFIX).ok_or_else(|| {
            PublishError::invalid_ref_name(
                RefKind::Branch,
                name,
                format!("branch name has to start with {}", RELEASE_BRANCH_PREFIX),
            )
        })?;

        let version = semver::Version::parse(&format!("{}.0", suffix)).map_err(|e| {
            PublishError::invalid_ref_name(
                RefKind::Branch,
                name,
                format!("parsing semantic version in branch name: {}", e),
            )
        })?;

        Ok(BranchName {
            name: name.to_string(),
            version,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// The `<major>.<minor>.0` version this branch tracks
    pub fn version(&self) -> &semver::Version {
        &self.version
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A release tag name of the form `<prefix><semver>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagName {
    name: String,
    version: semver::Version,
}

impl TagName {
    /// Validate a tag name against the given prefix convention.
    ///
    /// An empty prefix accepts bare semantic versions. The match against the
    /// prefix is case-sensitive, so `V1.0.0` is rejected for prefix `v`.
    pub fn parse(name: &str, prefix: &str) -> Result<Self> {
        let version_part = name.strip_prefix(prefix).ok_or_else(|| {
            PublishError::invalid_ref_name(
                RefKind::Tag,
                name,
                format!("tag has to start with '{}'", prefix),
            )
        })?;

        let version = semver::Version::parse(version_part).map_err(|e| {
            PublishError::invalid_ref_name(
                RefKind::Tag,
                name,
                format!("transforming tag into semver: {}", e),
            )
        })?;

        Ok(TagName {
            name: name.to_string(),
            version,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &semver::Version {
        &self.version
    }
}

impl fmt::Display for TagName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
