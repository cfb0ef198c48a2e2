//! Idempotent publishing of release branches and tags
//!
//! A publish call validates the ref name, requires the ref to exist
//! locally, and pushes it only when the remote does not have it yet.
//! Calling it again once the ref is on the remote is a successful no-op.

use crate::config::PublishSettings;
use crate::domain::{BranchName, RefKind, TagName, DEFAULT_TAG_PREFIX};
use crate::error::{PublishError, Result};
use crate::git::{Git2Repository, RepositoryHandle, DEFAULT_REMOTE};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Options for a [RefPublisher]
#[derive(Debug, Clone, PartialEq)]
pub struct PublisherConfig {
    dry_run: bool,
    max_retries: u32,
    repo_path: PathBuf,
    remote: String,
    default_branch: String,
    tag_prefix: String,
}

impl PublisherConfig {
    /// Create a config with the default remote, default branch and tag prefix
    pub fn new(repo_path: impl Into<PathBuf>, dry_run: bool, max_retries: u32) -> Self {
        PublisherConfig {
            dry_run,
            max_retries,
            repo_path: repo_path.into(),
            remote: DEFAULT_REMOTE.to_string(),
            default_branch: crate::config::DEFAULT_BRANCH.to_string(),
            tag_prefix: DEFAULT_TAG_PREFIX.to_string(),
        }
    }

    /// Build a config from loaded settings for the repository at `repo_path`
    pub fn from_settings(settings: &PublishSettings, repo_path: impl Into<PathBuf>) -> Self {
        PublisherConfig {
            dry_run: settings.dry_run,
            max_retries: settings.max_retries,
            repo_path: repo_path.into(),
            remote: settings.remote.clone(),
            default_branch: settings.default_branch.clone(),
            tag_prefix: settings.tag_prefix.clone(),
        }
    }

    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = remote.into();
        self
    }

    pub fn with_default_branch(mut self, branch: impl Into<String>) -> Self {
        self.default_branch = branch.into();
        self
    }

    pub fn with_tag_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.tag_prefix = prefix.into();
        self
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    pub fn remote(&self) -> &str {
        &self.remote
    }

    pub fn default_branch(&self) -> &str {
        &self.default_branch
    }

    pub fn tag_prefix(&self) -> &str {
        &self.tag_prefix
    }
}

/// What a successful publish call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The ref was pushed (or, in dry-run mode, the push was simulated)
    Pushed,
    /// The remote already had the ref; nothing was pushed
    AlreadyPresent,
}

/// Pushes release branches and tags to the configured remote
///
/// Owns its repository handle exclusively. Not meant to be shared across
/// threads without external locking.
pub struct RefPublisher<R: RepositoryHandle = Git2Repository> {
    repo: R,
    config: PublisherConfig,
}

fn dry_run_label(dry_run: bool) -> &'static str {
    if dry_run {
        " --dry-run"
    } else {
        ""
    }
}

impl RefPublisher<Git2Repository> {
    /// Open a git repository on disk and prepare it for pushing
    ///
    /// Same as [create](Self::create) with the `git2` backed handle.
    pub fn open(config: PublisherConfig) -> Result<Self> {
        Self::create(config)
    }
}

impl<R: RepositoryHandle> RefPublisher<R> {
    /// Open the repository at `config.repo_path()` and prepare it for pushing
    ///
    /// # Returns
    /// * `Ok(RefPublisher)` - Repository opened with the default branch checked out
    /// * `Err(PublishError::RepositoryOpen)` - If the path is not a repository
    /// * `Err(PublishError::Checkout)` - If the default branch cannot be checked out
    pub fn create(config: PublisherConfig) -> Result<Self> {
        let repo = R::open(config.repo_path()).map_err(|source| PublishError::RepositoryOpen {
            path: config.repo_path().to_path_buf(),
            source,
        })?;

        Self::with_repository(config, repo)
    }

    /// Prepare an already opened repository handle for pushing
    ///
    /// Checks out the default branch, then hands the remote, dry-run flag
    /// and retry count to the handle.
    pub fn with_repository(config: PublisherConfig, mut repo: R) -> Result<Self> {
        info!(
            "Checkout {} branch to push objects",
            config.default_branch()
        );
        repo.checkout(config.default_branch())
            .map_err(|source| PublishError::Checkout {
                branch: config.default_branch().to_string(),
                source,
            })?;

        repo.set_remote(config.remote());

        if config.dry_run() {
            debug!("Setting dry run flag to repository, pushing will be simulated");
        }
        repo.set_dry_run(config.dry_run());
        repo.set_max_retries(config.max_retries());

        Ok(RefPublisher { repo, config })
    }

    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }

    /// The underlying repository handle
    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Push a release branch to the remote
    ///
    /// This function is idempotent: when the remote already has the branch
    /// it returns [PublishOutcome::AlreadyPresent] without pushing.
    pub fn publish_branch(&mut self, branch_name: &str) -> Result<PublishOutcome> {
        let branch = BranchName::parse(branch_name)?;
        let name = branch.as_str();

        let exists = self
            .repo
            .has_local_branch(name)
            .map_err(|source| PublishError::LocalLookup {
                kind: RefKind::Branch,
                name: name.to_string(),
                source,
            })?;
        if !exists {
            return Err(PublishError::ref_not_found(RefKind::Branch, name));
        }

        let on_remote = self
            .repo
            .has_remote_branch(name)
            .map_err(|source| PublishError::RemoteLookup {
                kind: RefKind::Branch,
                name: name.to_string(),
                source,
            })?;
        if on_remote {
            info!(
                "Branch {} already exists in remote {}. Noop.",
                name,
                self.config.remote()
            );
            return Ok(PublishOutcome::AlreadyPresent);
        }

        info!(
            "Pushing{} {} branch to {}",
            dry_run_label(self.config.dry_run()),
            name,
            self.config.remote()
        );
        self.push(RefKind::Branch, name)?;
        info!("Branch {} pushed successfully", name);

        Ok(PublishOutcome::Pushed)
    }

    /// Push a release tag to the remote
    ///
    /// The tag must be reachable from the default branch. Like
    /// [publish_branch](Self::publish_branch), this is a no-op when the
    /// remote already has the tag.
    pub fn publish_tag(&mut self, tag_name: &str) -> Result<PublishOutcome> {
        let tag = TagName::parse(tag_name, self.config.tag_prefix())?;
        let name = tag.as_str();

        let local_tags = self
            .repo
            .tags_on_branch(self.config.default_branch())
            .map_err(|source| PublishError::LocalLookup {
                kind: RefKind::Tag,
                name: name.to_string(),
                source,
            })?;
        if !local_tags.iter().any(|t| t == name) {
            return Err(PublishError::ref_not_found(RefKind::Tag, name));
        }

        let on_remote = self
            .repo
            .has_remote_tag(name)
            .map_err(|source| PublishError::RemoteLookup {
                kind: RefKind::Tag,
                name: name.to_string(),
                source,
            })?;
        if on_remote {
            info!(
                "Tag {} already exists in remote {}. Noop.",
                name,
                self.config.remote()
            );
            return Ok(PublishOutcome::AlreadyPresent);
        }

        info!(
            "Pushing{} tag for version {}",
            dry_run_label(self.config.dry_run()),
            name
        );
        self.push(RefKind::Tag, name)?;
        info!("Successfully pushed tag {}", name);

        Ok(PublishOutcome::Pushed)
    }

    fn push(&mut self, kind: RefKind, name: &str) -> Result<()> {
        self.repo
            .push(kind, name)
            .map_err(|source| PublishError::Push {
                kind,
                name: name.to_string(),
                source,
            })
    }
}
