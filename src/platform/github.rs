//! GitHub host implementation using octocrab

use crate::error::{Error, Result};
use crate::platform::{CreatePull, PullComment, RemoteHost};
use crate::types::{HostConfig, HostKind, PullRequest, PullState};
use async_trait::async_trait;
use octocrab::Octocrab;

/// GitHub service
pub struct GitHubHost {
    client: Octocrab,
    config: HostConfig,
}

impl GitHubHost {
    /// Create a new GitHub host client
    pub fn new(token: &str, owner: String, repo: String, host: Option<String>) -> Result<Self> {
        let mut builder = Octocrab::builder().personal_token(token.to_string());

        if let Some(ref h) = host {
            let base_url = format!("https://{h}/api/v3");
            builder = builder
                .base_uri(&base_url)
                .map_err(|e| Error::Host(e.to_string()))?;
        }

        let client = builder.build().map_err(|e| Error::Host(e.to_string()))?;

        Ok(Self {
            client,
            config: HostConfig {
                kind: HostKind::GitHub,
                owner,
                repo,
                host,
            },
        })
    }
}

/// Classify an octocrab failure into the crate's error taxonomy.
///
/// 429 and 5xx responses are retryable; 4xx responses (authorization,
/// not-found, validation) are permanent. Transport failures are retryable.
fn map_err(e: octocrab::Error) -> Error {
    match &e {
        octocrab::Error::GitHub { source, .. } => {
            let status = source.status_code;
            if status.as_u16() == 429 {
                Error::RateLimited
            } else if status.is_server_error() {
                Error::Network(format!("GitHub returned {status}: {}", source.message))
            } else if status.as_u16() == 401 || status.as_u16() == 403 {
                Error::Auth(source.message.clone())
            } else {
                Error::Host(format!("GitHub returned {status}: {}", source.message))
            }
        }
        octocrab::Error::Hyper { .. } | octocrab::Error::Service { .. } => {
            Error::Network(e.to_string())
        }
        _ => Error::Host(e.to_string()),
    }
}

fn convert_pull(pr: &octocrab::models::pulls::PullRequest) -> PullRequest {
    let state = if pr.merged_at.is_some() {
        PullState::Merged
    } else {
        match pr.state {
            Some(octocrab::models::IssueState::Open) => PullState::Open,
            _ => PullState::Closed,
        }
    };

    PullRequest {
        number: pr.number,
        html_url: pr
            .html_url
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
        head_ref: pr.head.ref_field.clone(),
        head_sha: pr.head.sha.clone(),
        base_ref: pr.base.ref_field.clone(),
        title: pr.title.as_deref().unwrap_or_default().to_string(),
        body: pr.body.as_deref().unwrap_or_default().to_string(),
        state,
        draft: pr.draft.unwrap_or(false),
        updated_at: pr.updated_at,
    }
}

#[async_trait]
impl RemoteHost for GitHubHost {
    async fn current_user(&self) -> Result<String> {
        let user = self.client.current().user().await.map_err(map_err)?;
        Ok(user.login)
    }

    async fn list_stack_pulls(&self, head_prefix: &str) -> Result<Vec<PullRequest>> {
        let mut page = self
            .client
            .pulls(&self.config.owner, &self.config.repo)
            .list()
            .state(octocrab::params::State::All)
            .per_page(100)
            .send()
            .await
            .map_err(map_err)?;

        let mut pulls = Vec::new();
        loop {
            pulls.extend(
                page.items
                    .iter()
                    .filter(|pr| pr.head.ref_field.starts_with(head_prefix))
                    .map(convert_pull),
            );
            match self
                .client
                .get_page::<octocrab::models::pulls::PullRequest>(&page.next)
                .await
                .map_err(map_err)?
            {
                Some(next) => page = next,
                None => break,
            }
        }

        Ok(pulls)
    }

    async fn create_pull(&self, req: &CreatePull<'_>) -> Result<PullRequest> {
        let pr = self
            .client
            .pulls(&self.config.owner, &self.config.repo)
            .create(req.title, req.head, req.base)
            .body(req.body)
            .draft(req.draft)
            .send()
            .await
            .map_err(map_err)?;

        Ok(convert_pull(&pr))
    }

    async fn update_pull_base(&self, number: u64, base: &str) -> Result<PullRequest> {
        let pr = self
            .client
            .pulls(&self.config.owner, &self.config.repo)
            .update(number)
            .base(base)
            .send()
            .await
            .map_err(map_err)?;

        Ok(convert_pull(&pr))
    }

    async fn update_pull_message(
        &self,
        number: u64,
        title: &str,
        body: &str,
    ) -> Result<PullRequest> {
        let pr = self
            .client
            .pulls(&self.config.owner, &self.config.repo)
            .update(number)
            .title(title)
            .body(body)
            .send()
            .await
            .map_err(map_err)?;

        Ok(convert_pull(&pr))
    }

    async fn close_pull(&self, number: u64) -> Result<()> {
        self.client
            .pulls(&self.config.owner, &self.config.repo)
            .update(number)
            .state(octocrab::params::pulls::State::Closed)
            .send()
            .await
            .map_err(map_err)?;
        Ok(())
    }

    async fn delete_branch(&self, branch: &str) -> Result<()> {
        let route = format!(
            "/repos/{}/{}/git/refs/heads/{branch}",
            self.config.owner, self.config.repo
        );
        let response = self
            .client
            ._delete(route, None::<&()>)
            .await
            .map_err(map_err)?;

        // 422 means the ref is already gone, which is what we wanted
        let status = response.status();
        if !status.is_success() && status.as_u16() != 422 {
            return Err(Error::Host(format!(
                "deleting branch {branch} returned {status}"
            )));
        }
        Ok(())
    }

    async fn list_comments(&self, number: u64) -> Result<Vec<PullComment>> {
        let comments = self
            .client
            .issues(&self.config.owner, &self.config.repo)
            .list_comments(number)
            .send()
            .await
            .map_err(map_err)?;

        Ok(comments
            .items
            .into_iter()
            .map(|c| PullComment {
                id: c.id.0,
                body: c.body.unwrap_or_default(),
            })
            .collect())
    }

    async fn create_comment(&self, number: u64, body: &str) -> Result<()> {
        self.client
            .issues(&self.config.owner, &self.config.repo)
            .create_comment(number, body)
            .await
            .map_err(map_err)?;
        Ok(())
    }

    async fn update_comment(&self, _number: u64, comment_id: u64, body: &str) -> Result<()> {
        self.client
            .issues(&self.config.owner, &self.config.repo)
            .update_comment(octocrab::models::CommentId(comment_id), body)
            .await
            .map_err(map_err)?;
        Ok(())
    }

    fn config(&self) -> &HostConfig {
        &self.config
    }
}
