use crate::domain::RefKind;
use crate::git::{RepositoryHandle, DEFAULT_REMOTE};
use git2::build::CheckoutBuilder;
use git2::{
    AutotagOption, BranchType, Direction, ErrorClass, ErrorCode, FetchOptions, Oid, PushOptions,
    RemoteCallbacks, Repository as Git2Repo, Sort,
};
use std::collections::HashMap;
use std::path::Path;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Base delay between push attempts; attempt `n` waits `n` times this long
const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Namespace for refs fetched only to answer a remote lookup
const SCRATCH_NAMESPACE: &str = "refs/release-push/";

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
    remote: String,
    dry_run: bool,
    max_retries: u32,
    retry_delay: Duration,
}

impl Git2Repository {
    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository {
            repo,
            remote: DEFAULT_REMOTE.to_string(),
            dry_run: false,
            max_retries: 0,
            retry_delay: RETRY_DELAY,
        }
    }

    /// Base delay between push attempts
    pub fn set_retry_delay(&mut self, delay: Duration) {
        self.retry_delay = delay;
    }

    /// Create a local branch from `<remote>/<branch>` so it can be checked out
    fn create_tracking_branch(&self, branch: &str) -> Result<(), git2::Error> {
        let tracking = format!("refs/remotes/{}/{}", self.remote, branch);
        let commit = self.repo.find_reference(&tracking)?.peel_to_commit()?;

        debug!("Creating local branch {} from {}", branch, tracking);
        let mut local = self.repo.branch(branch, &commit, false)?;
        local.set_upstream(Some(&format!("{}/{}", self.remote, branch)))?;
        Ok(())
    }

    /// Ask the remote whether it has `refname`, like `git ls-remote`
    ///
    /// Fetches only that ref into a scratch ref and checks whether it
    /// arrived. The scratch ref is removed before and after, so a ref
    /// deleted on the remote is never reported from a stale copy.
    fn remote_has_ref(&self, refname: &str) -> Result<bool, git2::Error> {
        let scratch = format!(
            "{}{}/{}",
            SCRATCH_NAMESPACE,
            self.remote,
            refname.trim_start_matches("refs/")
        );
        self.remove_reference(&scratch)?;

        let mut remote = self.repo.find_remote(&self.remote)?;
        let mut fetch_options = FetchOptions::new();
        fetch_options
            .remote_callbacks(remote_callbacks())
            .download_tags(AutotagOption::None);

        let refspec = format!("+{}:{}", refname, scratch);
        remote.fetch(&[refspec.as_str()], Some(&mut fetch_options), None)?;

        let found = self.remove_reference(&scratch)?;
        debug!("ls-remote {} {}: found={}", self.remote, refname, found);
        Ok(found)
    }

    /// Delete a reference if present, reporting whether it existed
    fn remove_reference(&self, refname: &str) -> Result<bool, git2::Error> {
        match self.repo.find_reference(refname) {
            Ok(mut reference) => {
                reference.delete()?;
                Ok(true)
            }
            Err(e) if e.code() == ErrorCode::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Build the `src:dst` refspec for a local branch or tag
    fn refspec_for(&self, kind: RefKind, name: &str) -> Result<String, git2::Error> {
        let refname = kind.qualify(name);
        self.repo.find_reference(&refname)?;
        Ok(format!("{0}:{0}", refname))
    }

    fn push_once(&self, refspec: &str) -> Result<(), git2::Error> {
        let mut remote = self.repo.find_remote(&self.remote)?;

        let mut callbacks = remote_callbacks();
        // A rejected update is reported here rather than as a push failure
        callbacks.push_update_reference(check_update_status);

        let mut push_options = PushOptions::new();
        push_options.remote_callbacks(callbacks);

        remote.push(&[refspec], Some(&mut push_options))
    }

    /// Check the ref resolves and the remote accepts a push connection
    fn simulate_push(&self, refspec: &str) -> Result<(), git2::Error> {
        let mut remote = self.repo.find_remote(&self.remote)?;
        remote.connect_auth(Direction::Push, Some(remote_callbacks()), None)?;

        info!("[dry-run] Would push {} to {}", refspec, self.remote);
        Ok(())
    }
}

impl RepositoryHandle for Git2Repository {
    fn open(path: &Path) -> Result<Self, git2::Error> {
        let repo = Git2Repo::open(path)?;
        Ok(Git2Repository::from_git2(repo))
    }

    fn checkout(&mut self, branch: &str) -> Result<(), git2::Error> {
        let refname = format!("refs/heads/{}", branch);

        if let Err(e) = self.repo.find_reference(&refname) {
            if e.code() != ErrorCode::NotFound {
                return Err(e);
            }
            self.create_tracking_branch(branch)?;
        }

        let commit = self.repo.find_reference(&refname)?.peel_to_commit()?;

        let mut checkout = CheckoutBuilder::new();
        checkout.safe();
        self.repo
            .checkout_tree(commit.as_object(), Some(&mut checkout))?;
        self.repo.set_head(&refname)?;

        Ok(())
    }

    fn set_dry_run(&mut self, dry_run: bool) {
        self.dry_run = dry_run;
    }

    fn set_max_retries(&mut self, max_retries: u32) {
        self.max_retries = max_retries;
    }

    fn set_remote(&mut self, remote: &str) {
        self.remote = remote.to_string();
    }

    fn has_local_branch(&self, name: &str) -> Result<bool, git2::Error> {
        match self.repo.find_branch(name, BranchType::Local) {
            Ok(_) => Ok(true),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn has_remote_branch(&self, name: &str) -> Result<bool, git2::Error> {
        self.remote_has_ref(&RefKind::Branch.qualify(name))
    }

    fn tags_on_branch(&self, branch: &str) -> Result<Vec<String>, git2::Error> {
        let head = self
            .repo
            .find_branch(branch, BranchType::Local)?
            .into_reference()
            .peel_to_commit()?
            .id();

        // Map each tagged commit to its tags (handles lightweight and annotated tags)
        let mut tagged: HashMap<Oid, Vec<String>> = HashMap::new();
        let tag_names = self.repo.tag_names(None)?;
        for tag_name in tag_names.iter().flatten() {
            let reference = self.repo.find_reference(&format!("refs/tags/{}", tag_name))?;
            if let Ok(commit) = reference.peel_to_commit() {
                tagged
                    .entry(commit.id())
                    .or_default()
                    .push(tag_name.to_string());
            }
        }

        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        revwalk.push(head)?;

        let mut tags = Vec::new();
        for oid in revwalk {
            if let Some(mut names) = tagged.remove(&oid?) {
                names.sort();
                tags.extend(names);
            }
        }

        Ok(tags)
    }

    fn has_remote_tag(&self, name: &str) -> Result<bool, git2::Error> {
        self.remote_has_ref(&RefKind::Tag.qualify(name))
    }

    fn push(&mut self, kind: RefKind, name: &str) -> Result<(), git2::Error> {
        let refspec = self.refspec_for(kind, name)?;

        if self.dry_run {
            return self.simulate_push(&refspec);
        }

        retry_transient(self.max_retries, self.retry_delay, || {
            self.push_once(&refspec)
        })
    }
}

/// Run `attempt_push` until it succeeds, fails for good, or retries run out
///
/// Only transient failures are retried, at most `max_retries` times;
/// attempt `n` is followed by a wait of `n * delay`.
fn retry_transient<F>(max_retries: u32, delay: Duration, mut attempt_push: F) -> Result<(), git2::Error>
where
    F: FnMut() -> Result<(), git2::Error>,
{
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        match attempt_push() {
            Ok(()) => return Ok(()),
            Err(e) if attempt <= max_retries && is_transient(&e) => {
                let wait = delay * attempt;
                warn!(
                    "Push failed (attempt {}/{}): {}. Retrying in {:?}",
                    attempt,
                    max_retries + 1,
                    e,
                    wait
                );
                thread::sleep(wait);
            }
            Err(e) => return Err(e),
        }
    }
}

/// Turn the per-ref status reported by the remote into an error
fn check_update_status(refname: &str, status: Option<&str>) -> Result<(), git2::Error> {
    match status {
        Some(message) => Err(git2::Error::new(
            ErrorCode::GenericError,
            ErrorClass::Reference,
            format!("remote rejected {}: {}", refname, message),
        )),
        None => Ok(()),
    }
}

/// Whether a push failure is worth retrying
fn is_transient(err: &git2::Error) -> bool {
    matches!(
        err.class(),
        ErrorClass::Net | ErrorClass::Ssh | ErrorClass::Http | ErrorClass::Os | ErrorClass::Ssl
    )
}

/// Callbacks trying SSH keys from ~/.ssh, then the SSH agent, then default credentials
fn remote_callbacks() -> RemoteCallbacks<'static> {
    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(|_url, username_from_url, allowed_types| {
        let username = username_from_url.unwrap_or("git");

        if allowed_types.contains(git2::CredentialType::SSH_KEY) {
            if let Some(home) = dirs::home_dir() {
                for key in ["id_ed25519", "id_rsa", "id_ecdsa"] {
                    let path = home.join(".ssh").join(key);
                    if path.exists() {
                        if let Ok(cred) = git2::Cred::ssh_key(username, None, &path, None) {
                            return Ok(cred);
                        }
                    }
                }
            }

            if let Ok(cred) = git2::Cred::ssh_key_from_agent(username) {
                return Ok(cred);
            }
        }

        git2::Cred::default()
    });
    callbacks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_rejects_non_repository() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(Git2Repository::open(dir.path()).is_err());
    }

    #[test]
    fn test_transient_error_classes() {
        let net = git2::Error::new(ErrorCode::GenericError, ErrorClass::Net, "reset");
        let rejected = git2::Error::new(ErrorCode::GenericError, ErrorClass::Reference, "nope");
        assert!(is_transient(&net));
        assert!(!is_transient(&rejected));
    }

    fn transient() -> git2::Error {
        git2::Error::new(ErrorCode::GenericError, ErrorClass::Net, "connection reset")
    }

    #[test]
    fn test_retry_until_success() {
        let mut attempts = 0;
        let result = retry_transient(2, Duration::ZERO, || {
            attempts += 1;
            if attempts < 3 {
                Err(transient())
            } else {
                Ok(())
            }
        });

        assert!(result.is_ok());
        assert_eq!(attempts, 3);
    }

    #[test]
    fn test_retry_gives_up_after_max_retries() {
        let mut attempts = 0;
        let result = retry_transient(1, Duration::ZERO, || {
            attempts += 1;
            Err(transient())
        });

        assert_eq!(result.unwrap_err().class(), ErrorClass::Net);
        assert_eq!(attempts, 2);
    }

    #[test]
    fn test_no_retry_when_max_retries_is_zero() {
        let mut attempts = 0;
        let _ = retry_transient(0, Duration::ZERO, || {
            attempts += 1;
            Err(transient())
        });
        assert_eq!(attempts, 1);
    }

    #[test]
    fn test_non_transient_failure_is_not_retried() {
        let mut attempts = 0;
        let result = retry_transient(5, Duration::ZERO, || {
            attempts += 1;
            check_update_status("refs/heads/release-1.18", Some("non-fast-forward"))
        });

        assert!(result.is_err());
        assert_eq!(attempts, 1);
    }

    #[test]
    fn test_check_update_status() {
        assert!(check_update_status("refs/tags/v1.18.0", None).is_ok());

        let err = check_update_status("refs/tags/v1.18.0", Some("hook declined")).unwrap_err();
        assert_eq!(err.message(), "remote rejected refs/tags/v1.18.0: hook declined");
        assert!(!is_transient(&err));
    }

    /// Repository whose only commit is on `refs/remotes/origin/main`
    fn repo_with_tracking_branch_only(dir: &Path) -> Git2Repo {
        let mut opts = git2::RepositoryInitOptions::new();
        opts.initial_head("main");
        let repo = Git2Repo::init_opts(dir, &opts).unwrap();
        repo.remote("origin", "https://example.invalid/release.git")
            .unwrap();

        {
            let sig = git2::Signature::now("Test User", "test@example.com").unwrap();
            let blob = repo.blob(b"release notes\n").unwrap();
            let mut builder = repo.treebuilder(None).unwrap();
            builder.insert("NOTES.md", blob, 0o100644).unwrap();
            let tree = repo.find_tree(builder.write().unwrap()).unwrap();
            repo.commit(
                Some("refs/remotes/origin/main"),
                &sig,
                &sig,
                "Initial commit",
                &tree,
                &[],
            )
            .unwrap();
        }
        repo
    }

    #[test]
    fn test_checkout_creates_branch_from_remote_tracking() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut repo = Git2Repository::from_git2(repo_with_tracking_branch_only(dir.path()));
        assert!(!repo.has_local_branch("main").unwrap());

        repo.checkout("main").unwrap();

        assert!(repo.has_local_branch("main").unwrap());
        assert_eq!(repo.repo.head().unwrap().name(), Some("refs/heads/main"));
        assert!(dir.path().join("NOTES.md").exists());

        let upstream = repo
            .repo
            .find_branch("main", BranchType::Local)
            .unwrap()
            .upstream()
            .unwrap();
        assert_eq!(upstream.name().unwrap(), Some("origin/main"));
    }

    #[test]
    fn test_checkout_missing_everywhere() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut repo = Git2Repository::from_git2(repo_with_tracking_branch_only(dir.path()));

        let err = repo.checkout("release-1.18").unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[test]
    fn test_refspec_for_uses_ref_kind() {
        let dir = tempfile::TempDir::new().unwrap();
        let raw = repo_with_tracking_branch_only(dir.path());
        {
            let commit = raw
                .find_reference("refs/remotes/origin/main")
                .unwrap()
                .peel_to_commit()
                .unwrap();
            raw.branch("v1.18.0", &commit, false).unwrap();
            raw.tag_lightweight("v1.18.0", commit.as_object(), false)
                .unwrap();
        }
        let repo = Git2Repository::from_git2(raw);

        assert_eq!(
            repo.refspec_for(RefKind::Tag, "v1.18.0").unwrap(),
            "refs/tags/v1.18.0:refs/tags/v1.18.0"
        );
        assert_eq!(
            repo.refspec_for(RefKind::Branch, "v1.18.0").unwrap(),
            "refs/heads/v1.18.0:refs/heads/v1.18.0"
        );
    }

    #[test]
    fn test_refspec_for_unknown_name() {
        let dir = tempfile::TempDir::new().unwrap();
        let repo = Git2Repository::from_git2(Git2Repo::init(dir.path()).unwrap());

        let err = repo.refspec_for(RefKind::Branch, "release-1.0").unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }
}
