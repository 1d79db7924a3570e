//! Remote stack inspection
//!
//! Rebuilds the remote view of a stack purely from host state. Branch names
//! carry the stable identifier as their last path segment, so no local
//! bookkeeping file is needed to match pull requests back to commits.

use crate::config::StackContext;
use crate::error::Result;
use crate::platform::RemoteHost;
use crate::reconcile::retry::with_retry;
use crate::types::{PullRequest, PullState, RemoteUnit};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::debug;

fn branch_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^I[0-9a-f]{40}$").expect("hardcoded regex is valid"))
}

/// Interpret a listed pull request as a stack unit.
///
/// Returns `None` for pull requests whose head branch merely shares the
/// prefix but does not end in a generated identifier.
pub fn unit_from_pull(pull: PullRequest, stack_prefix: &str) -> Option<RemoteUnit> {
    let suffix = pull
        .head_ref
        .strip_prefix(stack_prefix)?
        .strip_prefix('/')?;
    if !branch_id_re().is_match(suffix) {
        return None;
    }
    Some(RemoteUnit {
        change_id: crate::types::ChangeId::new(suffix),
        pull,
    })
}

/// List and normalize every remote unit belonging to the stack.
///
/// Closed-but-unmerged pull requests are dropped: they no longer participate
/// in any base chain and re-closing them would be a wasted mutation. When the
/// host reports several non-open pull requests for one identifier, only the
/// most recently updated survives. Open duplicates are passed through so the
/// planner can refuse to guess between them.
pub async fn inspect_remote(
    host: &dyn RemoteHost,
    ctx: &StackContext,
) -> Result<Vec<RemoteUnit>> {
    let pulls = with_retry(&ctx.retry, "list pull requests", || {
        host.list_stack_pulls(&ctx.stack_prefix)
    })
    .await?;
    debug!(count = pulls.len(), prefix = %ctx.stack_prefix, "listed stack pull requests");

    let mut open = Vec::new();
    let mut merged: HashMap<String, RemoteUnit> = HashMap::new();
    for pull in pulls {
        let Some(unit) = unit_from_pull(pull, &ctx.stack_prefix) else {
            continue;
        };
        match unit.pull.state {
            PullState::Open => open.push(unit),
            PullState::Merged => {
                let key = unit.change_id.as_str().to_string();
                match merged.get(&key) {
                    Some(kept) if kept.pull.updated_at >= unit.pull.updated_at => {}
                    _ => {
                        merged.insert(key, unit);
                    }
                }
            }
            PullState::Closed => {
                debug!(number = unit.pull.number, "dropping closed pull request");
            }
        }
    }

    open.extend(merged.into_values());
    Ok(open)
}

/// Order the open units of a stack by their base chain, bottom first.
///
/// The root is the unique open unit whose base lies outside the stack
/// prefix. Units a broken chain never reaches are left out rather than
/// guessed at.
pub fn chain_open_units(units: Vec<RemoteUnit>, stack_prefix: &str) -> Result<Vec<RemoteUnit>> {
    let mut by_base: HashMap<String, RemoteUnit> = HashMap::new();
    let mut root_base: Option<String> = None;

    for unit in units {
        if unit.pull.state != PullState::Open {
            continue;
        }
        if !unit.pull.base_ref.starts_with(stack_prefix) {
            if root_base.is_some() {
                return Err(crate::error::Error::Host(format!(
                    "two root pull requests found under {stack_prefix}"
                )));
            }
            root_base = Some(unit.pull.base_ref.clone());
        }
        if let Some(other) = by_base.insert(unit.pull.base_ref.clone(), unit) {
            return Err(crate::error::Error::Host(format!(
                "two pull requests based on {}",
                other.pull.base_ref
            )));
        }
    }

    let Some(base) = root_base else {
        return Ok(Vec::new());
    };

    let mut chain = Vec::with_capacity(by_base.len());
    let mut next = by_base.remove(&base);
    while let Some(unit) = next {
        let head = unit.pull.head_ref.clone();
        chain.push(unit);
        next = by_base.remove(&head);
    }
    Ok(chain)
}
