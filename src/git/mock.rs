use crate::domain::RefKind;
use crate::git::{RepositoryHandle, DEFAULT_REMOTE};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;

/// A recorded call against [MockRepository]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Checkout(String),
    SetDryRun(bool),
    SetMaxRetries(u32),
    SetRemote(String),
    HasLocalBranch(String),
    HasRemoteBranch(String),
    TagsOnBranch(String),
    HasRemoteTag(String),
    Push(RefKind, String),
}

/// Mock repository for testing without actual git operations
///
/// A non-dry-run push adds the ref to the mock remote, so a later remote
/// lookup observes it.
pub struct MockRepository {
    local_branches: HashSet<String>,
    branch_tags: HashMap<String, Vec<String>>,
    remote_branches: HashSet<String>,
    remote_tags: HashSet<String>,
    failing: HashSet<&'static str>,
    dry_run: bool,
    max_retries: u32,
    remote: String,
    calls: Mutex<Vec<MockCall>>,
}

impl MockRepository {
    /// Create a new empty mock repository
    pub fn new() -> Self {
        MockRepository {
            local_branches: HashSet::new(),
            branch_tags: HashMap::new(),
            remote_branches: HashSet::new(),
            remote_tags: HashSet::new(),
            failing: HashSet::new(),
            dry_run: false,
            max_retries: 0,
            remote: DEFAULT_REMOTE.to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Add a local branch
    pub fn add_local_branch(&mut self, name: impl Into<String>) {
        self.local_branches.insert(name.into());
    }

    /// Add a tag reachable from a local branch
    pub fn add_tag(&mut self, branch: impl Into<String>, tag: impl Into<String>) {
        self.branch_tags
            .entry(branch.into())
            .or_default()
            .push(tag.into());
    }

    /// Add a branch to the mock remote
    pub fn add_remote_branch(&mut self, name: impl Into<String>) {
        self.remote_branches.insert(name.into());
    }

    /// Add a tag to the mock remote
    pub fn add_remote_tag(&mut self, name: impl Into<String>) {
        self.remote_tags.insert(name.into());
    }

    /// Make an operation fail
    ///
    /// `operation` is one of `checkout`, `has_local_branch`,
    /// `has_remote_branch`, `tags_on_branch`, `has_remote_tag` or `push`.
    pub fn fail_on(&mut self, operation: &'static str) {
        self.failing.insert(operation);
    }

    /// All calls made so far, in order
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of push calls made so far
    pub fn push_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, MockCall::Push(..)))
            .count()
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn remote(&self) -> &str {
        &self.remote
    }

    pub fn remote_has_branch(&self, name: &str) -> bool {
        self.remote_branches.contains(name)
    }

    pub fn remote_has_tag(&self, name: &str) -> bool {
        self.remote_tags.contains(name)
    }

    fn record(&self, call: MockCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn check(&self, operation: &str) -> Result<(), git2::Error> {
        if self.failing.contains(operation) {
            Err(git2::Error::from_str(&format!("mock {} failure", operation)))
        } else {
            Ok(())
        }
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl RepositoryHandle for MockRepository {
    fn open(_path: &Path) -> Result<Self, git2::Error> {
        Ok(MockRepository::new())
    }

    fn checkout(&mut self, branch: &str) -> Result<(), git2::Error> {
        self.record(MockCall::Checkout(branch.to_string()));
        self.check("checkout")
    }

    fn set_dry_run(&mut self, dry_run: bool) {
        self.record(MockCall::SetDryRun(dry_run));
        self.dry_run = dry_run;
    }

    fn set_max_retries(&mut self, max_retries: u32) {
        self.record(MockCall::SetMaxRetries(max_retries));
        self.max_retries = max_retries;
    }

    fn set_remote(&mut self, remote: &str) {
        self.record(MockCall::SetRemote(remote.to_string()));
        self.remote = remote.to_string();
    }

    fn has_local_branch(&self, name: &str) -> Result<bool, git2::Error> {
        self.record(MockCall::HasLocalBranch(name.to_string()));
        self.check("has_local_branch")?;
        Ok(self.local_branches.contains(name))
    }

    fn has_remote_branch(&self, name: &str) -> Result<bool, git2::Error> {
        self.record(MockCall::HasRemoteBranch(name.to_string()));
        self.check("has_remote_branch")?;
        Ok(self.remote_branches.contains(name))
    }

    fn tags_on_branch(&self, branch: &str) -> Result<Vec<String>, git2::Error> {
        self.record(MockCall::TagsOnBranch(branch.to_string()));
        self.check("tags_on_branch")?;
        Ok(self.branch_tags.get(branch).cloned().unwrap_or_default())
    }

    fn has_remote_tag(&self, name: &str) -> Result<bool, git2::Error> {
        self.record(MockCall::HasRemoteTag(name.to_string()));
        self.check("has_remote_tag")?;
        Ok(self.remote_tags.contains(name))
    }

    fn push(&mut self, kind: RefKind, name: &str) -> Result<(), git2::Error> {
        self.record(MockCall::Push(kind, name.to_string()));
        self.check("push")?;

        if self.dry_run {
            return Ok(());
        }

        match kind {
            RefKind::Branch => self.remote_branches.insert(name.to_string()),
            RefKind::Tag => self.remote_tags.insert(name.to_string()),
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_repository_branches() {
        let mut repo = MockRepository::new();
        repo.add_local_branch("release-1.18");
        repo.add_remote_branch("release-1.17");

        assert!(repo.has_local_branch("release-1.18").unwrap());
        assert!(!repo.has_local_branch("release-1.17").unwrap());
        assert!(repo.has_remote_branch("release-1.17").unwrap());
        assert!(!repo.has_remote_branch("release-1.18").unwrap());
    }

    #[test]
    fn test_mock_repository_tags() {
        let mut repo = MockRepository::new();
        repo.add_tag("main", "v1.18.0");
        repo.add_tag("main", "v1.17.0");

        assert_eq!(
            repo.tags_on_branch("main").unwrap(),
            vec!["v1.18.0".to_string(), "v1.17.0".to_string()]
        );
        assert!(repo.tags_on_branch("develop").unwrap().is_empty());
    }

    #[test]
    fn test_mock_push_updates_remote() {
        let mut repo = MockRepository::new();
        repo.add_local_branch("release-1.18");
        repo.add_tag("main", "v1.18.0");

        repo.push(RefKind::Branch, "release-1.18").unwrap();
        repo.push(RefKind::Tag, "v1.18.0").unwrap();

        assert!(repo.remote_has_branch("release-1.18"));
        assert!(repo.remote_has_tag("v1.18.0"));
        assert_eq!(repo.push_count(), 2);
    }

    #[test]
    fn test_mock_push_uses_ref_kind_for_shared_names() {
        let mut repo = MockRepository::new();
        repo.add_local_branch("v1.18.0");
        repo.add_tag("main", "v1.18.0");

        repo.push(RefKind::Tag, "v1.18.0").unwrap();

        assert!(repo.remote_has_tag("v1.18.0"));
        assert!(!repo.remote_has_branch("v1.18.0"));
    }

    #[test]
    fn test_mock_dry_run_push_leaves_remote_untouched() {
        let mut repo = MockRepository::new();
        repo.add_local_branch("release-1.18");
        repo.set_dry_run(true);

        repo.push(RefKind::Branch, "release-1.18").unwrap();

        assert!(!repo.remote_has_branch("release-1.18"));
        assert_eq!(repo.push_count(), 1);
    }

    #[test]
    fn test_mock_failure_injection() {
        let mut repo = MockRepository::new();
        repo.fail_on("has_remote_tag");

        assert!(repo.has_remote_tag("v1.0.0").is_err());
        assert!(repo.has_remote_branch("release-1.0").is_ok());
    }

    #[test]
    fn test_mock_records_calls() {
        let mut repo = MockRepository::default();
        repo.set_max_retries(5);
        repo.set_remote("upstream");
        let _ = repo.has_local_branch("release-1.0");

        assert_eq!(
            repo.calls(),
            vec![
                MockCall::SetMaxRetries(5),
                MockCall::SetRemote("upstream".to_string()),
                MockCall::HasLocalBranch("release-1.0".to_string()),
            ]
        );
        assert_eq!(repo.max_retries(), 5);
        assert_eq!(repo.remote(), "upstream");
    }
}
