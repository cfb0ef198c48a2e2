use crate::domain::RefKind;
use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for release-push operations
///
/// Every variant that wraps a repository failure keeps the underlying
/// `git2::Error` as its source and names the ref being worked on.
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("while opening repository {}: {source}", .path.display())]
    RepositoryOpen {
        path: PathBuf,
        #[source]
        source: git2::Error,
    },

    #[error("checking out {branch} branch: {source}")]
    Checkout {
        branch: String,
        #[source]
        source: git2::Error,
    },

    #[error("invalid {kind} name '{name}': {reason}")]
    InvalidRefName {
        kind: RefKind,
        name: String,
        reason: String,
    },

    #[error("checking if {kind} {name} exists locally: {source}")]
    LocalLookup {
        kind: RefKind,
        name: String,
        #[source]
        source: git2::Error,
    },

    #[error("unable to push {kind} {name}, it does not exist in the local repo")]
    RefNotFound { kind: RefKind, name: String },

    #[error("checking if {kind} {name} exists in remote repository: {source}")]
    RemoteLookup {
        kind: RefKind,
        name: String,
        #[source]
        source: git2::Error,
    },

    #[error("pushing {kind} {name}: {source}")]
    Push {
        kind: RefKind,
        name: String,
        #[source]
        source: git2::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in release-push
pub type Result<T> = std::result::Result<T, PublishError>;

impl PublishError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        PublishError::Config(msg.into())
    }

    /// Create an invalid ref name error
    pub fn invalid_ref_name(
        kind: RefKind,
        name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        PublishError::InvalidRefName {
            kind,
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a missing local ref error
    pub fn ref_not_found(kind: RefKind, name: impl Into<String>) -> Self {
        PublishError::RefNotFound {
            kind,
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display() {
        let err = PublishError::config("test config issue");
        assert_eq!(err.to_string(), "Configuration error: test config issue");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PublishError = io_err.into();
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_ref_not_found_names_the_ref() {
        let err = PublishError::ref_not_found(RefKind::Branch, "release-1.19");
        assert_eq!(
            err.to_string(),
            "unable to push branch release-1.19, it does not exist in the local repo"
        );
        assert!(err.source().is_none());
    }

    #[test]
    fn test_wrapped_errors_keep_source() {
        let err = PublishError::Push {
            kind: RefKind::Tag,
            name: "v1.18.0".to_string(),
            source: git2::Error::from_str("connection reset"),
        };

        assert_eq!(err.to_string(), "pushing tag v1.18.0: connection reset");
        let source = err.source().expect("push error should have a source");
        assert_eq!(source.to_string(), "connection reset");
    }

    #[test]
    fn test_error_messages_are_descriptive() {
        let lookup = || git2::Error::from_str("boom");
        let error_pairs = vec![
            (
                PublishError::RepositoryOpen {
                    path: PathBuf::from("/tmp/repo"),
                    source: lookup(),
                },
                "while opening repository /tmp/repo",
            ),
            (
                PublishError::Checkout {
                    branch: "main".to_string(),
                    source: lookup(),
                },
                "checking out main branch",
            ),
            (
                PublishError::invalid_ref_name(RefKind::Branch, "release-foo", "bad"),
                "invalid branch name 'release-foo'",
            ),
            (
                PublishError::LocalLookup {
                    kind: RefKind::Tag,
                    name: "v1.0.0".to_string(),
                    source: lookup(),
                },
                "checking if tag v1.0.0 exists locally",
            ),
            (
                PublishError::RemoteLookup {
                    kind: RefKind::Branch,
                    name: "release-1.0".to_string(),
                    source: lookup(),
                },
                "checking if branch release-1.0 exists in remote repository",
            ),
        ];

        for (err, expected_prefix) in error_pairs {
            let msg = err.to_string();
            assert!(
                msg.starts_with(expected_prefix),
                "Error message should start with '{}', but got '{}'",
                expected_prefix,
                msg
            );
        }
    }
}
