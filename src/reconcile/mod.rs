//! The stack reconciliation engine
//!
//! One pass runs in three stages:
//! 1. inspection: rebuild the remote view of the stack ([`inspect_remote`])
//! 2. planning: a pure diff of local entries against remote units
//!    ([`build_plan`])
//! 3. execution: apply the plan's mutations in dependency order
//!    ([`execute_plan`])
//!
//! Nothing in this module persists state between passes; the remote host is
//! the only durable store, which is what makes a pass safe to re-run after a
//! partial failure.

mod execute;
mod inspect;
mod message;
mod plan;
mod progress;
mod retry;

pub use execute::{execute_plan, ExecutionReport};
pub use inspect::{chain_open_units, inspect_remote, unit_from_pull};
pub use message::{format_pull_body, stripped_message, STACK_COMMENT_FIRST_LINE};
pub use plan::{build_plan, BaseRef, Disposition, Plan, PlanOp, PlannedEntry};
pub use progress::{ExecuteProgress, NoopProgress, Phase};
pub use retry::with_retry;
