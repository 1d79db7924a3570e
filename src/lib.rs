//! prstack - stacked pull requests from plain git branches
//!
//! Keeps a chain of pull requests in one-to-one correspondence with the
//! commits of a local branch. Each commit carries a stable `Change-Id:`
//! trailer, assigned once by a commit-msg hook, which survives rebases and
//! rewords and keys the commit to its pull request. A reconciliation pass
//! reads the local stack, inspects the remote one, computes the minimal set
//! of mutations and applies them in dependency order.
//!
//! The library is split along the pass's stages:
//! - [`stack`] extracts the ordered local stack from git
//! - [`reconcile`] inspects, plans and executes
//! - [`platform`] abstracts GitHub and GitLab behind one trait
//! - [`git`] wraps the git CLI and pushes branches
//! - [`setup`] installs the commit-msg hook

pub mod auth;
pub mod config;
pub mod error;
pub mod git;
pub mod platform;
pub mod reconcile;
pub mod setup;
pub mod stack;
pub mod types;
