//! Run configuration
//!
//! Everything the extractor, reconciler and executor need is carried in an
//! explicit [`StackContext`] value instead of being read from ambient process
//! state, so the reconciler can be driven from tests with synthetic fixtures
//! and no repository or network access.

use std::time::Duration;

/// Retry policy for remote host calls
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum attempts per call, including the first
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each subsequent retry
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(500),
        }
    }
}

/// Configuration for one reconciliation pass
#[derive(Debug, Clone)]
pub struct StackContext {
    /// Git remote the stack branches are pushed to
    pub remote: String,
    /// Trunk branch name on the remote (e.g. "main")
    pub trunk_branch: String,
    /// Prefix shared by every branch of this stack
    /// (`{branch_prefix}/{source_branch}`)
    pub stack_prefix: String,
    /// Create/update pull requests as drafts
    pub draft: bool,
    /// Stop mutating the chain after the first not-yet-merged unit
    pub next_only: bool,
    /// Never create new pull requests, only update existing ones
    pub only_update: bool,
    /// Leave titles and bodies of existing pull requests untouched
    pub keep_title_body: bool,
    /// Delete a unit's branch when closing it
    pub delete_branch_on_close: bool,
    /// Retry policy for transient host failures
    pub retry: RetryPolicy,
    /// Concurrency bound for closing orphaned units
    pub close_concurrency: usize,
}

impl StackContext {
    /// Context for a stack rooted at `remote/trunk_branch` under `stack_prefix`
    pub fn new(
        remote: impl Into<String>,
        trunk_branch: impl Into<String>,
        stack_prefix: impl Into<String>,
    ) -> Self {
        Self {
            remote: remote.into(),
            trunk_branch: trunk_branch.into(),
            stack_prefix: stack_prefix.into(),
            draft: false,
            next_only: false,
            only_update: false,
            keep_title_body: false,
            delete_branch_on_close: true,
            retry: RetryPolicy::default(),
            close_concurrency: 4,
        }
    }

    /// Deterministic branch name for a stack entry
    #[must_use]
    pub fn branch_for(&self, change_id: &crate::types::ChangeId) -> String {
        format!("{}/{change_id}", self.stack_prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChangeId;

    #[test]
    fn branch_names_are_deterministic() {
        let ctx = StackContext::new("origin", "main", "stack/alice/feature");
        let id = ChangeId::new("I0123");
        assert_eq!(ctx.branch_for(&id), "stack/alice/feature/I0123");
        assert_eq!(ctx.branch_for(&id), ctx.branch_for(&id));
    }
}
