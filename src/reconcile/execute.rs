//! Plan execution
//!
//! Applies a [`Plan`]'s mutations against the remote host. Chain ops run
//! strictly in plan order so every base a later op references already exists;
//! closes run afterwards with bounded concurrency because nothing depends on
//! them. A failed op aborts the pass, and because the plan is recomputed from
//! remote state on the next run, re-running after a partial failure only
//! performs the mutations that are still missing.

use crate::config::StackContext;
use crate::error::{Error, Result};
use crate::git::BranchPusher;
use crate::platform::{CreatePull, RemoteHost};
use crate::reconcile::message::{format_pull_body, STACK_COMMENT_FIRST_LINE};
use crate::reconcile::plan::{Plan, PlanOp};
use crate::reconcile::progress::{ExecuteProgress, Phase};
use crate::reconcile::retry::with_retry;
use crate::types::{PullRequest, PullState, RemoteUnit};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info};

/// What a pass actually did, for the final report.
#[derive(Debug, Default)]
pub struct ExecutionReport {
    /// Newly created pull requests, in stack order.
    pub created: Vec<PullRequest>,
    /// Numbers of pull requests whose head branch was force-pushed.
    pub updated: Vec<u64>,
    /// Numbers of pull requests whose base branch was repointed.
    pub rebased: Vec<u64>,
    /// Numbers of pull requests whose title or body was rewritten.
    pub retitled: Vec<u64>,
    /// Numbers of orphaned pull requests that were closed.
    pub closed: Vec<u64>,
    /// Non-fatal failures while refreshing navigation comments.
    pub comment_errors: Vec<String>,
}

impl ExecutionReport {
    /// True when the pass performed no mutation at all.
    pub fn is_noop(&self) -> bool {
        self.created.is_empty()
            && self.updated.is_empty()
            && self.rebased.is_empty()
            && self.retitled.is_empty()
            && self.closed.is_empty()
    }
}

fn op_failed(op: &PlanOp, change_id: &str, source: Error) -> Error {
    Error::OpFailed {
        op: op.verb(),
        change_id: change_id.to_string(),
        source: Box::new(source),
    }
}

/// Apply every mutation in the plan.
///
/// Chain ops run first, in order. Orphan closes follow, bounded by
/// `ctx.close_concurrency`. Navigation comments are refreshed last; their
/// failures are reported but never abort the pass.
pub async fn execute_plan(
    plan: &Plan,
    pusher: &dyn BranchPusher,
    host: Arc<dyn RemoteHost>,
    ctx: &StackContext,
    progress: &dyn ExecuteProgress,
) -> Result<ExecutionReport> {
    let mut report = ExecutionReport::default();

    // Current pull request per entry, filled in as creates land.
    let mut pulls: Vec<Option<PullRequest>> = plan
        .entries
        .iter()
        .map(|e| e.existing.as_ref().map(|u| u.pull.clone()))
        .collect();

    progress.on_phase(Phase::Execute);
    let mut closes: Vec<RemoteUnit> = Vec::new();
    for op in &plan.ops {
        match op {
            PlanOp::Create { index, base } => {
                let planned = &plan.entries[*index];
                let id = planned.entry.change_id.as_str();
                progress.on_op(op.verb(), &planned.entry.title);

                pusher
                    .force_push(&ctx.remote, &planned.entry.commit_sha, &planned.branch)
                    .await
                    .map_err(|e| op_failed(op, id, e))?;

                let body = format_pull_body(&planned.entry.body, depends_on(&pulls, *index));
                let req = CreatePull {
                    head: &planned.branch,
                    base: plan.base_branch(*base),
                    title: &planned.entry.title,
                    body: &body,
                    draft: ctx.draft,
                };
                let pull = with_retry(&ctx.retry, "create pull request", || {
                    host.create_pull(&req)
                })
                .await
                .map_err(|e| op_failed(op, id, e))?;
                info!(number = pull.number, branch = %planned.branch, "created pull request");
                pulls[*index] = Some(pull.clone());
                report.created.push(pull);
            }
            PlanOp::UpdateContent { index, number } => {
                let planned = &plan.entries[*index];
                progress.on_op(op.verb(), &planned.entry.title);
                pusher
                    .force_push(&ctx.remote, &planned.entry.commit_sha, &planned.branch)
                    .await
                    .map_err(|e| op_failed(op, planned.entry.change_id.as_str(), e))?;
                report.updated.push(*number);
            }
            PlanOp::RebaseBase {
                index,
                number,
                base,
            } => {
                let planned = &plan.entries[*index];
                let target = plan.base_branch(*base);
                progress.on_op(op.verb(), &planned.entry.title);
                let pull = with_retry(&ctx.retry, "update pull request base", || {
                    host.update_pull_base(*number, target)
                })
                .await
                .map_err(|e| op_failed(op, planned.entry.change_id.as_str(), e))?;
                debug!(number, base = target, "rebased pull request");
                pulls[*index] = Some(pull);
                report.rebased.push(*number);
            }
            PlanOp::Retitle { index, number } => {
                let planned = &plan.entries[*index];
                progress.on_op(op.verb(), &planned.entry.title);
                let body = format_pull_body(&planned.entry.body, depends_on(&pulls, *index));
                let pull = with_retry(&ctx.retry, "update pull request message", || {
                    host.update_pull_message(*number, &planned.entry.title, &body)
                })
                .await
                .map_err(|e| op_failed(op, planned.entry.change_id.as_str(), e))?;
                pulls[*index] = Some(pull);
                report.retitled.push(*number);
            }
            PlanOp::Close { unit } => closes.push(unit.clone()),
        }
    }

    if !closes.is_empty() {
        progress.on_phase(Phase::Close);
        report.closed = close_orphans(closes, Arc::clone(&host), ctx, progress).await?;
    }

    progress.on_phase(Phase::Comment);
    refresh_comments(&pulls, host.as_ref(), ctx, &mut report).await;

    Ok(report)
}

fn depends_on(pulls: &[Option<PullRequest>], index: usize) -> Option<u64> {
    if index == 0 {
        return None;
    }
    pulls[index - 1].as_ref().map(|p| p.number)
}

async fn close_orphans(
    closes: Vec<RemoteUnit>,
    host: Arc<dyn RemoteHost>,
    ctx: &StackContext,
    progress: &dyn ExecuteProgress,
) -> Result<Vec<u64>> {
    let semaphore = Arc::new(Semaphore::new(ctx.close_concurrency.max(1)));
    let mut tasks = JoinSet::new();
    for unit in closes {
        progress.on_op("close", &unit.pull.title);
        let host = Arc::clone(&host);
        let semaphore = Arc::clone(&semaphore);
        let retry = ctx.retry;
        let delete_branch = ctx.delete_branch_on_close;
        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            let number = unit.pull.number;
            with_retry(&retry, "close pull request", || host.close_pull(number))
                .await
                .map_err(|e| Error::OpFailed {
                    op: "close",
                    change_id: unit.change_id.as_str().to_string(),
                    source: Box::new(e),
                })?;
            if delete_branch {
                let branch = unit.branch().to_string();
                with_retry(&retry, "delete branch", || host.delete_branch(&branch))
                    .await
                    .map_err(|e| Error::OpFailed {
                        op: "close",
                        change_id: unit.change_id.as_str().to_string(),
                        source: Box::new(e),
                    })?;
            }
            info!(number, "closed orphaned pull request");
            Ok::<u64, Error>(number)
        });
    }

    let mut closed = Vec::new();
    let mut first_err = None;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(number)) => closed.push(number),
            Ok(Err(err)) if first_err.is_none() => first_err = Some(err),
            Ok(Err(_)) => {}
            Err(join_err) if first_err.is_none() => {
                first_err = Some(Error::Host(format!("close task failed: {join_err}")));
            }
            Err(_) => {}
        }
    }
    if let Some(err) = first_err {
        return Err(err);
    }
    closed.sort_unstable();
    Ok(closed)
}

/// Post or refresh the navigation comment on every open pull request of the
/// stack. Skipped entirely for single-entry stacks.
async fn refresh_comments(
    pulls: &[Option<PullRequest>],
    host: &dyn RemoteHost,
    ctx: &StackContext,
    report: &mut ExecutionReport,
) {
    let stacked: Vec<&PullRequest> = pulls.iter().filter_map(Option::as_ref).collect();
    if stacked.len() < 2 {
        return;
    }

    for current in stacked.iter().filter(|p| p.state == PullState::Open) {
        let body = navigation_comment(&stacked, current.number);
        if let Err(err) = upsert_comment(host, ctx, current.number, &body).await {
            report
                .comment_errors
                .push(format!("#{}: {err}", current.number));
        }
    }
}

fn navigation_comment(stacked: &[&PullRequest], current: u64) -> String {
    let mut body = String::from(STACK_COMMENT_FIRST_LINE);
    for (position, pull) in stacked.iter().enumerate() {
        let marker = if pull.number == current { " 👈" } else { "" };
        body.push_str(&format!(
            "{}. {} ([#{}]({})){marker}\n",
            position + 1,
            pull.title,
            pull.number,
            pull.html_url
        ));
    }
    body
}

async fn upsert_comment(
    host: &dyn RemoteHost,
    ctx: &StackContext,
    number: u64,
    body: &str,
) -> Result<()> {
    let comments = with_retry(&ctx.retry, "list comments", || host.list_comments(number)).await?;
    match comments
        .iter()
        .find(|c| c.body.starts_with(STACK_COMMENT_FIRST_LINE.trim_end()))
    {
        Some(existing) if existing.body == body => Ok(()),
        Some(existing) => {
            with_retry(&ctx.retry, "update comment", || {
                host.update_comment(number, existing.id, body)
            })
            .await
        }
        None => {
            with_retry(&ctx.retry, "create comment", || {
                host.create_comment(number, body)
            })
            .await
        }
    }
}
