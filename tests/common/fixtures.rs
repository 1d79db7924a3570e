//! Test fixtures for reconciliation scenarios

#![allow(dead_code)]

use prstack::config::StackContext;
use prstack::types::{ChangeId, StackEntry};

/// A syntactically valid change id built from one repeated character.
pub fn id(c: char) -> String {
    format!("I{}", c.to_string().repeat(40))
}

/// A stack entry whose body carries the usual trailer.
pub fn entry(id: &str, sha: &str, title: &str) -> StackEntry {
    StackEntry {
        change_id: ChangeId::new(id),
        commit_sha: sha.to_string(),
        title: title.to_string(),
        body: format!("{title} body.\n\nChange-Id: {id}\n"),
    }
}

/// Context for a stack owned by alice on origin/main.
pub fn ctx() -> StackContext {
    let mut ctx = StackContext::new("origin", "main", "stack/alice/topic");
    // Tests must not sleep through real backoff delays.
    ctx.retry.base_delay = std::time::Duration::from_millis(1);
    ctx
}

/// The deterministic branch name for a change id under the fixture context.
pub fn branch(id: &str) -> String {
    format!("stack/alice/topic/{id}")
}
