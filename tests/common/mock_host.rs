//! In-memory remote host for testing
//!
//! These are test utilities - not all may be used in current tests but are
//! available for future test development.

#![allow(dead_code)]

use async_trait::async_trait;
use prstack::error::{Error, Result};
use prstack::git::BranchPusher;
use prstack::platform::{CreatePull, PullComment, RemoteHost};
use prstack::types::{HostConfig, HostKind, PullRequest, PullState};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Branch store shared between the fake pusher and the mock host, mapping
/// branch name to the sha it points at.
pub type Branches = Arc<Mutex<HashMap<String, String>>>;

/// Call record for `create_pull`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCall {
    pub head: String,
    pub base: String,
    pub title: String,
    pub draft: bool,
}

/// Call record for `update_pull_base`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateBaseCall {
    pub number: u64,
    pub base: String,
}

/// Call record for `force_push`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushCall {
    pub sha: String,
    pub branch: String,
}

/// Fake branch pusher backed by the shared branch store.
pub struct FakePusher {
    branches: Branches,
    pub pushes: Mutex<Vec<PushCall>>,
}

impl FakePusher {
    pub fn new(branches: Branches) -> Self {
        Self {
            branches,
            pushes: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl BranchPusher for FakePusher {
    async fn force_push(&self, _remote: &str, sha: &str, branch: &str) -> Result<()> {
        self.branches
            .lock()
            .unwrap()
            .insert(branch.to_string(), sha.to_string());
        self.pushes.lock().unwrap().push(PushCall {
            sha: sha.to_string(),
            branch: branch.to_string(),
        });
        Ok(())
    }
}

/// In-memory remote host
///
/// This manually implements `RemoteHost` rather than using a mocking crate
/// so the store behaves like a real host across passes: listings reflect
/// every earlier mutation, which is what the convergence tests rely on.
///
/// Features:
/// - Auto-incrementing pull request numbers
/// - Head shas resolved through the shared branch store
/// - Call tracking for verification
/// - Error injection for failure path testing
pub struct MockHost {
    config: HostConfig,
    branches: Branches,
    next_number: AtomicU64,
    next_comment_id: AtomicU64,
    pulls: Mutex<HashMap<u64, PullRequest>>,
    comments: Mutex<HashMap<u64, Vec<PullComment>>>,
    // Call tracking
    pub create_calls: Mutex<Vec<CreateCall>>,
    pub update_base_calls: Mutex<Vec<UpdateBaseCall>>,
    pub update_message_calls: Mutex<Vec<u64>>,
    pub close_calls: Mutex<Vec<u64>>,
    pub delete_branch_calls: Mutex<Vec<String>>,
    // Error injection
    error_on_create: Mutex<Option<String>>,
    error_on_update_base: Mutex<Option<String>>,
    error_on_close: Mutex<Option<String>>,
}

impl MockHost {
    pub fn new(branches: Branches) -> Self {
        Self {
            config: HostConfig {
                kind: HostKind::GitHub,
                owner: "alice".to_string(),
                repo: "project".to_string(),
                host: None,
            },
            branches,
            next_number: AtomicU64::new(1),
            next_comment_id: AtomicU64::new(1),
            pulls: Mutex::new(HashMap::new()),
            comments: Mutex::new(HashMap::new()),
            create_calls: Mutex::new(Vec::new()),
            update_base_calls: Mutex::new(Vec::new()),
            update_message_calls: Mutex::new(Vec::new()),
            close_calls: Mutex::new(Vec::new()),
            delete_branch_calls: Mutex::new(Vec::new()),
            error_on_create: Mutex::new(None),
            error_on_update_base: Mutex::new(None),
            error_on_close: Mutex::new(None),
        }
    }

    // === Error injection ===

    pub fn fail_create(&self, msg: &str) {
        *self.error_on_create.lock().unwrap() = Some(msg.to_string());
    }

    pub fn fail_update_base(&self, msg: &str) {
        *self.error_on_update_base.lock().unwrap() = Some(msg.to_string());
    }

    pub fn fail_close(&self, msg: &str) {
        *self.error_on_close.lock().unwrap() = Some(msg.to_string());
    }

    pub fn clear_failures(&self) {
        *self.error_on_create.lock().unwrap() = None;
        *self.error_on_update_base.lock().unwrap() = None;
        *self.error_on_close.lock().unwrap() = None;
    }

    // === State inspection ===

    pub fn pull(&self, number: u64) -> Option<PullRequest> {
        self.pulls.lock().unwrap().get(&number).cloned()
    }

    pub fn open_pulls(&self) -> Vec<PullRequest> {
        let mut pulls: Vec<PullRequest> = self
            .pulls
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.state == PullState::Open)
            .cloned()
            .collect();
        pulls.sort_by_key(|p| p.number);
        pulls
    }

    pub fn comments_on(&self, number: u64) -> Vec<PullComment> {
        self.comments
            .lock()
            .unwrap()
            .get(&number)
            .cloned()
            .unwrap_or_default()
    }

    /// Mark a pull request as merged, as a reviewer would via the web UI.
    pub fn merge_pull(&self, number: u64) {
        if let Some(pull) = self.pulls.lock().unwrap().get_mut(&number) {
            pull.state = PullState::Merged;
        }
    }

    fn sha_of(&self, branch: &str) -> String {
        self.branches
            .lock()
            .unwrap()
            .get(branch)
            .cloned()
            .unwrap_or_else(|| "unknown".to_string())
    }
}

#[async_trait]
impl RemoteHost for MockHost {
    async fn current_user(&self) -> Result<String> {
        Ok("alice".to_string())
    }

    async fn list_stack_pulls(&self, head_prefix: &str) -> Result<Vec<PullRequest>> {
        let pulls = self.pulls.lock().unwrap();
        let mut found: Vec<PullRequest> = pulls
            .values()
            .filter(|p| p.head_ref.starts_with(head_prefix))
            .cloned()
            .collect();
        drop(pulls);
        // A real host reports the branch tip, not the sha at creation time.
        for pull in &mut found {
            if pull.state == PullState::Open {
                pull.head_sha = self.sha_of(&pull.head_ref);
            }
        }
        found.sort_by_key(|p| p.number);
        Ok(found)
    }

    async fn create_pull(&self, req: &CreatePull<'_>) -> Result<PullRequest> {
        if let Some(msg) = self.error_on_create.lock().unwrap().clone() {
            return Err(Error::Host(msg));
        }
        self.create_calls.lock().unwrap().push(CreateCall {
            head: req.head.to_string(),
            base: req.base.to_string(),
            title: req.title.to_string(),
            draft: req.draft,
        });
        let number = self.next_number.fetch_add(1, Ordering::SeqCst);
        let pull = PullRequest {
            number,
            html_url: format!("https://example.com/alice/project/pull/{number}"),
            head_ref: req.head.to_string(),
            head_sha: self.sha_of(req.head),
            base_ref: req.base.to_string(),
            title: req.title.to_string(),
            body: req.body.to_string(),
            state: PullState::Open,
            draft: req.draft,
            updated_at: None,
        };
        self.pulls.lock().unwrap().insert(number, pull.clone());
        Ok(pull)
    }

    async fn update_pull_base(&self, number: u64, base: &str) -> Result<PullRequest> {
        if let Some(msg) = self.error_on_update_base.lock().unwrap().clone() {
            return Err(Error::Host(msg));
        }
        self.update_base_calls.lock().unwrap().push(UpdateBaseCall {
            number,
            base: base.to_string(),
        });
        let mut pulls = self.pulls.lock().unwrap();
        let pull = pulls
            .get_mut(&number)
            .ok_or_else(|| Error::Host(format!("pull request {number} not found")))?;
        pull.base_ref = base.to_string();
        Ok(pull.clone())
    }

    async fn update_pull_message(&self, number: u64, title: &str, body: &str) -> Result<PullRequest> {
        self.update_message_calls.lock().unwrap().push(number);
        let mut pulls = self.pulls.lock().unwrap();
        let pull = pulls
            .get_mut(&number)
            .ok_or_else(|| Error::Host(format!("pull request {number} not found")))?;
        pull.title = title.to_string();
        pull.body = body.to_string();
        Ok(pull.clone())
    }

    async fn close_pull(&self, number: u64) -> Result<()> {
        if let Some(msg) = self.error_on_close.lock().unwrap().clone() {
            return Err(Error::Host(msg));
        }
        self.close_calls.lock().unwrap().push(number);
        let mut pulls = self.pulls.lock().unwrap();
        let pull = pulls
            .get_mut(&number)
            .ok_or_else(|| Error::Host(format!("pull request {number} not found")))?;
        pull.state = PullState::Closed;
        Ok(())
    }

    async fn delete_branch(&self, branch: &str) -> Result<()> {
        self.delete_branch_calls
            .lock()
            .unwrap()
            .push(branch.to_string());
        self.branches.lock().unwrap().remove(branch);
        Ok(())
    }

    async fn list_comments(&self, number: u64) -> Result<Vec<PullComment>> {
        Ok(self.comments_on(number))
    }

    async fn create_comment(&self, number: u64, body: &str) -> Result<()> {
        let id = self.next_comment_id.fetch_add(1, Ordering::SeqCst);
        self.comments
            .lock()
            .unwrap()
            .entry(number)
            .or_default()
            .push(PullComment {
                id,
                body: body.to_string(),
            });
        Ok(())
    }

    async fn update_comment(&self, number: u64, comment_id: u64, body: &str) -> Result<()> {
        let mut comments = self.comments.lock().unwrap();
        let list = comments
            .get_mut(&number)
            .ok_or_else(|| Error::Host(format!("no comments on pull request {number}")))?;
        let comment = list
            .iter_mut()
            .find(|c| c.id == comment_id)
            .ok_or_else(|| Error::Host(format!("comment {comment_id} not found")))?;
        comment.body = body.to_string();
        Ok(())
    }

    fn config(&self) -> &HostConfig {
        &self.config
    }
}
