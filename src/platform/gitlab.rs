//! GitLab host implementation using reqwest
//!
//! GitLab has no first-class draft flag on the create API; drafts are encoded
//! in the title (`Draft: ` prefix). The conversion layer here strips and
//! re-applies that prefix so the reconciler only ever sees clean titles.

use crate::error::{Error, Result};
use crate::platform::{CreatePull, PullComment, RemoteHost};
use crate::types::{HostConfig, HostKind, PullRequest, PullState};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const PER_PAGE: usize = 100;
const DRAFT_PREFIX: &str = "Draft: ";

/// GitLab service
pub struct GitLabHost {
    client: Client,
    token: String,
    base_url: String,
    config: HostConfig,
    project_path: String,
}

#[derive(Deserialize)]
struct MergeRequest {
    iid: u64,
    web_url: String,
    source_branch: String,
    target_branch: String,
    sha: Option<String>,
    title: String,
    description: Option<String>,
    state: String,
    draft: Option<bool>,
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct MrNote {
    id: u64,
    body: String,
    system: bool,
}

#[derive(Deserialize)]
struct GitLabUser {
    username: String,
}

#[derive(Serialize)]
struct CreateMrPayload<'a> {
    source_branch: &'a str,
    target_branch: &'a str,
    title: String,
    description: &'a str,
}

impl GitLabHost {
    /// Create a new GitLab host client
    pub fn new(token: String, owner: String, repo: String, host: Option<String>) -> Self {
        let host = host.unwrap_or_else(|| "gitlab.com".to_string());
        let base_url = format!("https://{host}/api/v4");
        Self::with_base_url(
            token,
            owner,
            repo,
            base_url,
            if host == "gitlab.com" { None } else { Some(host) },
        )
    }

    fn with_base_url(
        token: String,
        owner: String,
        repo: String,
        base_url: String,
        host: Option<String>,
    ) -> Self {
        let project_path = format!("{owner}/{repo}");

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            token,
            base_url,
            config: HostConfig {
                kind: HostKind::GitLab,
                owner,
                repo,
                host,
            },
            project_path,
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn encoded_project(&self) -> String {
        urlencoding::encode(&self.project_path).into_owned()
    }

    fn mr_url(&self, number: u64, suffix: &str) -> String {
        self.api_url(&format!(
            "/projects/{}/merge_requests/{number}{suffix}",
            self.encoded_project()
        ))
    }
}

fn convert_mr(mr: &MergeRequest) -> PullRequest {
    let state = match mr.state.as_str() {
        "merged" => PullState::Merged,
        "opened" | "locked" => PullState::Open,
        _ => PullState::Closed,
    };

    let draft = mr.draft.unwrap_or_else(|| mr.title.starts_with(DRAFT_PREFIX));
    let title = mr
        .title
        .strip_prefix(DRAFT_PREFIX)
        .unwrap_or(&mr.title)
        .to_string();

    PullRequest {
        number: mr.iid,
        html_url: mr.web_url.clone(),
        head_ref: mr.source_branch.clone(),
        head_sha: mr.sha.clone().unwrap_or_default(),
        base_ref: mr.target_branch.clone(),
        title,
        body: mr.description.clone().unwrap_or_default(),
        state,
        draft,
        updated_at: mr.updated_at,
    }
}

/// Map non-success responses into the crate's error taxonomy
async fn checked(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(match status.as_u16() {
        429 => Error::RateLimited,
        401 | 403 => Error::Auth(format!("GitLab returned {status}: {body}")),
        s if s >= 500 => Error::Network(format!("GitLab returned {status}: {body}")),
        _ => Error::Host(format!("GitLab returned {status}: {body}")),
    })
}

#[async_trait]
impl RemoteHost for GitLabHost {
    async fn current_user(&self) -> Result<String> {
        let response = self
            .client
            .get(self.api_url("/user"))
            .header("PRIVATE-TOKEN", &self.token)
            .send()
            .await?;
        let user: GitLabUser = checked(response).await?.json().await?;
        Ok(user.username)
    }

    async fn list_stack_pulls(&self, head_prefix: &str) -> Result<Vec<PullRequest>> {
        let url = self.api_url(&format!(
            "/projects/{}/merge_requests",
            self.encoded_project()
        ));

        let mut pulls = Vec::new();
        let mut page = 1usize;
        loop {
            let response = self
                .client
                .get(&url)
                .header("PRIVATE-TOKEN", &self.token)
                .query(&[
                    ("state", "all"),
                    ("per_page", &PER_PAGE.to_string()),
                    ("page", &page.to_string()),
                ])
                .send()
                .await?;
            let batch: Vec<MergeRequest> = checked(response).await?.json().await?;
            let done = batch.len() < PER_PAGE;

            pulls.extend(
                batch
                    .iter()
                    .filter(|mr| mr.source_branch.starts_with(head_prefix))
                    .map(convert_mr),
            );

            if done {
                break;
            }
            page += 1;
        }

        Ok(pulls)
    }

    async fn create_pull(&self, req: &CreatePull<'_>) -> Result<PullRequest> {
        let url = self.api_url(&format!(
            "/projects/{}/merge_requests",
            self.encoded_project()
        ));

        let title = if req.draft {
            format!("{DRAFT_PREFIX}{}", req.title)
        } else {
            req.title.to_string()
        };

        let payload = CreateMrPayload {
            source_branch: req.head,
            target_branch: req.base,
            title,
            description: req.body,
        };

        let response = self
            .client
            .post(&url)
            .header("PRIVATE-TOKEN", &self.token)
            .json(&payload)
            .send()
            .await?;
        let mr: MergeRequest = checked(response).await?.json().await?;
        Ok(convert_mr(&mr))
    }

    async fn update_pull_base(&self, number: u64, base: &str) -> Result<PullRequest> {
        let response = self
            .client
            .put(self.mr_url(number, ""))
            .header("PRIVATE-TOKEN", &self.token)
            .json(&serde_json::json!({ "target_branch": base }))
            .send()
            .await?;
        let mr: MergeRequest = checked(response).await?.json().await?;
        Ok(convert_mr(&mr))
    }

    async fn update_pull_message(
        &self,
        number: u64,
        title: &str,
        body: &str,
    ) -> Result<PullRequest> {
        let response = self
            .client
            .put(self.mr_url(number, ""))
            .header("PRIVATE-TOKEN", &self.token)
            .json(&serde_json::json!({ "title": title, "description": body }))
            .send()
            .await?;
        let mr: MergeRequest = checked(response).await?.json().await?;
        Ok(convert_mr(&mr))
    }

    async fn close_pull(&self, number: u64) -> Result<()> {
        let response = self
            .client
            .put(self.mr_url(number, ""))
            .header("PRIVATE-TOKEN", &self.token)
            .json(&serde_json::json!({ "state_event": "close" }))
            .send()
            .await?;
        checked(response).await?;
        Ok(())
    }

    async fn delete_branch(&self, branch: &str) -> Result<()> {
        let url = self.api_url(&format!(
            "/projects/{}/repository/branches/{}",
            self.encoded_project(),
            urlencoding::encode(branch)
        ));
        let response = self
            .client
            .delete(&url)
            .header("PRIVATE-TOKEN", &self.token)
            .send()
            .await?;
        // A branch that is already gone is fine
        if response.status().as_u16() == 404 {
            return Ok(());
        }
        checked(response).await?;
        Ok(())
    }

    async fn list_comments(&self, number: u64) -> Result<Vec<PullComment>> {
        let response = self
            .client
            .get(self.mr_url(number, "/notes"))
            .header("PRIVATE-TOKEN", &self.token)
            .send()
            .await?;
        let notes: Vec<MrNote> = checked(response).await?.json().await?;
        Ok(notes
            .into_iter()
            .filter(|n| !n.system)
            .map(|n| PullComment {
                id: n.id,
                body: n.body,
            })
            .collect())
    }

    async fn create_comment(&self, number: u64, body: &str) -> Result<()> {
        let response = self
            .client
            .post(self.mr_url(number, "/notes"))
            .header("PRIVATE-TOKEN", &self.token)
            .json(&serde_json::json!({ "body": body }))
            .send()
            .await?;
        checked(response).await?;
        Ok(())
    }

    async fn update_comment(&self, number: u64, comment_id: u64, body: &str) -> Result<()> {
        let response = self
            .client
            .put(self.mr_url(number, &format!("/notes/{comment_id}")))
            .header("PRIVATE-TOKEN", &self.token)
            .json(&serde_json::json!({ "body": body }))
            .send()
            .await?;
        checked(response).await?;
        Ok(())
    }

    fn config(&self) -> &HostConfig {
        &self.config
    }
}
