//! Error types for prstack
//!
//! One enum for the whole crate. The executor's retry loop only retries
//! errors for which [`Error::is_transient`] returns true; everything else
//! aborts the remaining plan.

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, Error>;

/// All errors that prstack can produce
#[derive(Debug, Error)]
pub enum Error {
    /// A commit in the stack range carries no Change-Id trailer
    #[error("commit {commit} has no `Change-Id:` trailer; run `prstack setup` and reword the commit")]
    MissingChangeId {
        /// Offending commit sha
        commit: String,
    },

    /// The same Change-Id appears on more than one commit in the range
    #[error("Change-Id `{0}` appears on more than one commit in the stack")]
    DuplicateChangeId(String),

    /// The trunk..tip range contains no commits
    #[error("no commits between the trunk and the current branch")]
    EmptyStack,

    /// The operator is on a branch prstack itself generated
    #[error("`{0}` is a generated stack branch; run prstack from the branch you created")]
    GeneratedBranch(String),

    /// The trunk resolves to the branch being pushed
    #[error(
        "branch `{0}` targets itself; fix the upstream with \
         `git branch {0} --set-upstream-to=<remote>/<branch>` or rename the branch"
    )]
    TrunkIsCurrentBranch(String),

    /// A `--trunk` value that is not `remote/branch`
    #[error("trunk must look like `remote/branch`, got `{0}`")]
    InvalidTrunk(String),

    /// A git subprocess exited non-zero
    #[error("failed to run `{command}`: {output}")]
    Git {
        /// The full command line that failed
        command: String,
        /// Combined stdout/stderr of the failed command
        output: String,
    },

    /// Filesystem failure while installing or checking the commit-msg hook
    #[error("hook setup failed: {0}")]
    Hook(String),

    /// No usable authentication for the remote host
    #[error("authentication failed: {0}")]
    Auth(String),

    /// A remote URL or host response we could not make sense of
    #[error("{0}")]
    Parse(String),

    /// The named git remote does not exist
    #[error("remote `{0}` not found")]
    RemoteNotFound(String),

    /// No remote pointing at a supported host
    #[error("no GitHub or GitLab remote found")]
    NoSupportedRemotes,

    /// Transport-level failure (retryable)
    #[error("network failure talking to the remote host: {0}")]
    Network(String),

    /// The host asked us to slow down (retryable)
    #[error("rate limited by the remote host")]
    RateLimited,

    /// Permanent host-side rejection: authorization, not-found, validation
    #[error("remote host error: {0}")]
    Host(String),

    /// Transient failures outlasted the retry budget
    #[error("remote host unavailable after {attempts} attempts: {last}")]
    RemoteUnavailable {
        /// Attempts made before giving up
        attempts: u32,
        /// Message of the last failure
        last: String,
    },

    /// A plan operation failed; remaining operations were not attempted
    #[error("{op} failed for change {change_id}: {source}")]
    OpFailed {
        /// Human name of the failed operation
        op: &'static str,
        /// Change-Id of the stack entry the operation targeted
        change_id: String,
        /// The underlying failure
        source: Box<Error>,
    },
}

impl Error {
    /// Whether the executor's backoff loop may retry this error
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::RateLimited)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() || e.is_connect() || e.is_request() {
            return Self::Network(e.to_string());
        }
        match e.status() {
            Some(status) if status.as_u16() == 429 => Self::RateLimited,
            Some(status) if status.is_server_error() => Self::Network(e.to_string()),
            _ => Self::Host(e.to_string()),
        }
    }
}
