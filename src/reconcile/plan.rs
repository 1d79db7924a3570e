//! Plan construction
//!
//! [`build_plan`] is a pure diff of the ordered local stack against the
//! unordered set of remote units. It never talks to the network, which keeps
//! dry runs byte-identical to what a real pass would do and makes the
//! mutation logic testable without a host.

use crate::config::StackContext;
use crate::error::{Error, Result};
use crate::reconcile::message::stripped_message;
use crate::types::{PullState, RemoteUnit, StackEntry};
use std::collections::HashMap;

/// Base of a pull request, expressed by stack position.
///
/// Base refs are symbolic until execution so that an op targeting a branch
/// that a `Create` earlier in the plan will push still resolves correctly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseRef {
    /// The trunk branch of the stack.
    Trunk,
    /// The stack branch of the entry at this index.
    Entry(usize),
}

/// A single planned mutation.
///
/// Chain ops (`Create`, `UpdateContent`, `RebaseBase`, `Retitle`) are ordered
/// bottom of the stack first. `Close` ops always come after every chain op so
/// an interrupted pass never closes a unit that a later op still bases on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanOp {
    /// Push the entry's commit and open a new pull request on `base`.
    Create { index: usize, base: BaseRef },
    /// Force-push the entry's commit to the existing stack branch.
    UpdateContent { index: usize, number: u64 },
    /// Repoint the pull request's base at `base`.
    RebaseBase {
        index: usize,
        number: u64,
        base: BaseRef,
    },
    /// Rewrite the pull request title and body from the commit message.
    Retitle { index: usize, number: u64 },
    /// Close an orphaned pull request.
    Close { unit: RemoteUnit },
}

impl PlanOp {
    /// Short verb for logs and failure reports.
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::UpdateContent { .. } => "update",
            Self::RebaseBase { .. } => "rebase",
            Self::Retitle { .. } => "retitle",
            Self::Close { .. } => "close",
        }
    }
}

/// What a pass will do with one local entry, for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// No open unit exists, a pull request will be created.
    Create,
    /// An open unit exists and at least one of content, base, or message
    /// will change.
    Update,
    /// An open unit exists and nothing needs to change.
    UpToDate,
    /// The unit was already merged; it stays untouched in the base chain.
    Merged,
    /// Skipped because an earlier entry already consumed the next-only
    /// budget.
    SkipNextOnly,
    /// No open unit exists but creation is disabled.
    SkipCreate,
}

/// One local entry resolved against the remote state.
#[derive(Debug, Clone)]
pub struct PlannedEntry {
    /// The local commit.
    pub entry: StackEntry,
    /// Deterministic stack branch for this entry.
    pub branch: String,
    /// The intended base branch, trunk for the first entry.
    pub base: String,
    /// Matching remote unit, open or merged, if one exists.
    pub existing: Option<RemoteUnit>,
    /// What the pass will do with this entry.
    pub disposition: Disposition,
}

impl PlannedEntry {
    /// Pull request number when a unit already exists.
    pub fn number(&self) -> Option<u64> {
        self.existing.as_ref().map(|u| u.pull.number)
    }
}

/// The full reconciliation plan for one pass.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Trunk branch every base chain ends at.
    pub trunk_branch: String,
    /// Local entries in stack order with their resolved remote state.
    pub entries: Vec<PlannedEntry>,
    /// Mutations in execution order.
    pub ops: Vec<PlanOp>,
    /// Open units with no local counterpart, in pull request number order.
    pub orphans: Vec<RemoteUnit>,
}

impl Plan {
    /// True when the pass has nothing to mutate.
    pub fn is_noop(&self) -> bool {
        self.ops.is_empty()
    }

    /// Resolve a symbolic base to its branch name.
    pub fn base_branch(&self, base: BaseRef) -> &str {
        match base {
            BaseRef::Trunk => &self.trunk_branch,
            BaseRef::Entry(i) => &self.entries[i].branch,
        }
    }
}

/// Diff the local stack against the remote units and produce a plan.
///
/// `units` is the deduplicated remote view from
/// [`inspect_remote`](crate::reconcile::inspect_remote). Closed-but-unmerged
/// units must already have been dropped; merged units participate only as
/// fixed links in the base chain, and only when no open unit carries the
/// same identifier.
pub fn build_plan(
    entries: &[StackEntry],
    units: Vec<RemoteUnit>,
    ctx: &StackContext,
) -> Result<Plan> {
    let mut open: HashMap<String, RemoteUnit> = HashMap::new();
    let mut merged: HashMap<String, RemoteUnit> = HashMap::new();
    for unit in units {
        let key = unit.change_id.as_str().to_string();
        match unit.pull.state {
            PullState::Open => {
                if open.contains_key(&key) {
                    return Err(Error::Host(format!(
                        "multiple open pull requests for change {key}"
                    )));
                }
                open.insert(key, unit);
            }
            PullState::Merged => {
                merged.insert(key, unit);
            }
            PullState::Closed => {}
        }
    }

    let mut plan = Plan {
        trunk_branch: ctx.trunk_branch.clone(),
        entries: Vec::with_capacity(entries.len()),
        ops: Vec::new(),
        orphans: Vec::new(),
    };

    let mut base = BaseRef::Trunk;
    let mut base_branch = ctx.trunk_branch.clone();
    let mut budget_spent = false;

    for (index, entry) in entries.iter().enumerate() {
        let branch = ctx.branch_for(&entry.change_id);
        let open_unit = open.remove(entry.change_id.as_str());
        let merged_unit = merged.remove(entry.change_id.as_str());

        // An open unit and a merged one can coexist for the same id when a
        // change was merged and the commit then reappeared locally. The open
        // one is the reconciliation target; the merged one is history.
        let (disposition, existing) = if let Some(unit) = open_unit {
            if ctx.next_only && budget_spent {
                (Disposition::SkipNextOnly, Some(unit))
            } else {
                budget_spent = true;
                let mut changed = false;
                if unit.pull.head_sha != entry.commit_sha {
                    plan.ops.push(PlanOp::UpdateContent {
                        index,
                        number: unit.pull.number,
                    });
                    changed = true;
                }
                if unit.pull.base_ref != base_branch {
                    plan.ops.push(PlanOp::RebaseBase {
                        index,
                        number: unit.pull.number,
                        base,
                    });
                    changed = true;
                }
                if !ctx.keep_title_body && message_outdated(entry, &unit) {
                    plan.ops.push(PlanOp::Retitle {
                        index,
                        number: unit.pull.number,
                    });
                    changed = true;
                }
                let disposition = if changed {
                    Disposition::Update
                } else {
                    Disposition::UpToDate
                };
                (disposition, Some(unit))
            }
        } else if let Some(unit) = merged_unit {
            (Disposition::Merged, Some(unit))
        } else if ctx.next_only && budget_spent {
            (Disposition::SkipNextOnly, None)
        } else if ctx.only_update {
            budget_spent = true;
            (Disposition::SkipCreate, None)
        } else {
            budget_spent = true;
            plan.ops.push(PlanOp::Create { index, base });
            (Disposition::Create, None)
        };

        plan.entries.push(PlannedEntry {
            entry: entry.clone(),
            branch: branch.clone(),
            base: base_branch.clone(),
            existing,
            disposition,
        });

        base = BaseRef::Entry(index);
        base_branch = branch;
    }

    let mut orphans: Vec<RemoteUnit> = open.into_values().collect();
    orphans.sort_by_key(|u| u.pull.number);
    for unit in &orphans {
        plan.ops.push(PlanOp::Close { unit: unit.clone() });
    }
    plan.orphans = orphans;

    Ok(plan)
}

fn message_outdated(entry: &StackEntry, unit: &RemoteUnit) -> bool {
    if entry.title != unit.pull.title {
        return true;
    }
    stripped_message(&entry.body) != stripped_message(&unit.pull.body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChangeId, PullRequest};

    const ID_A: &str = "Iaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const ID_B: &str = "Ibbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
    const ID_C: &str = "Icccccccccccccccccccccccccccccccccccccccc";

    fn ctx() -> StackContext {
        StackContext::new("origin", "main", "stack/alice")
    }

    fn entry(id: &str, sha: &str, title: &str) -> StackEntry {
        StackEntry {
            change_id: ChangeId::new(id),
            commit_sha: sha.to_string(),
            title: title.to_string(),
            body: format!("{title}\n\nChange-Id: {id}\n"),
        }
    }

    fn unit(id: &str, number: u64, sha: &str, base: &str, title: &str, state: PullState) -> RemoteUnit {
        RemoteUnit {
            change_id: ChangeId::new(id),
            pull: PullRequest {
                number,
                html_url: format!("https://example.com/pull/{number}"),
                head_ref: format!("stack/alice/{id}"),
                head_sha: sha.to_string(),
                base_ref: base.to_string(),
                title: title.to_string(),
                body: title.to_string(),
                state,
                draft: false,
                updated_at: None,
            },
        }
    }

    #[test]
    fn fresh_stack_creates_in_order() {
        let entries = vec![entry(ID_A, "a1", "one"), entry(ID_B, "b1", "two")];
        let plan = build_plan(&entries, vec![], &ctx()).unwrap();

        assert_eq!(
            plan.ops,
            vec![
                PlanOp::Create {
                    index: 0,
                    base: BaseRef::Trunk
                },
                PlanOp::Create {
                    index: 1,
                    base: BaseRef::Entry(0)
                },
            ]
        );
        assert_eq!(plan.entries[0].base, "main");
        assert_eq!(plan.entries[1].base, format!("stack/alice/{ID_A}"));
    }

    #[test]
    fn converged_stack_is_noop() {
        let entries = vec![entry(ID_A, "a1", "one"), entry(ID_B, "b1", "two")];
        let branch_a = format!("stack/alice/{ID_A}");
        let units = vec![
            unit(ID_A, 1, "a1", "main", "one", PullState::Open),
            unit(ID_B, 2, "b1", &branch_a, "two", PullState::Open),
        ];
        let plan = build_plan(&entries, units, &ctx()).unwrap();

        assert!(plan.is_noop());
        assert!(plan
            .entries
            .iter()
            .all(|e| e.disposition == Disposition::UpToDate));
    }

    #[test]
    fn amended_commit_updates_content_only() {
        let entries = vec![entry(ID_A, "a2", "one")];
        let units = vec![unit(ID_A, 1, "a1", "main", "one", PullState::Open)];
        let plan = build_plan(&entries, units, &ctx()).unwrap();

        assert_eq!(plan.ops, vec![PlanOp::UpdateContent { index: 0, number: 1 }]);
    }

    #[test]
    fn reorder_emits_rebase_only_and_keeps_numbers() {
        // Remote has A then B; locally the order is swapped without edits.
        let branch_a = format!("stack/alice/{ID_A}");
        let branch_b = format!("stack/alice/{ID_B}");
        let entries = vec![entry(ID_B, "b1", "two"), entry(ID_A, "a1", "one")];
        let units = vec![
            unit(ID_A, 1, "a1", "main", "one", PullState::Open),
            unit(ID_B, 2, "b1", &branch_a, "two", PullState::Open),
        ];
        let plan = build_plan(&entries, units, &ctx()).unwrap();

        assert_eq!(
            plan.ops,
            vec![
                PlanOp::RebaseBase {
                    index: 0,
                    number: 2,
                    base: BaseRef::Trunk
                },
                PlanOp::RebaseBase {
                    index: 1,
                    number: 1,
                    base: BaseRef::Entry(0)
                },
            ]
        );
        assert_eq!(plan.base_branch(BaseRef::Entry(0)), branch_b);
        assert_eq!(plan.entries[0].number(), Some(2));
        assert_eq!(plan.entries[1].number(), Some(1));
    }

    #[test]
    fn insertion_rebases_successor() {
        // New commit B inserted between existing A and C.
        let branch_a = format!("stack/alice/{ID_A}");
        let entries = vec![
            entry(ID_A, "a1", "one"),
            entry(ID_B, "b1", "two"),
            entry(ID_C, "c2", "three"),
        ];
        let units = vec![
            unit(ID_A, 1, "a1", "main", "one", PullState::Open),
            unit(ID_C, 3, "c2", &branch_a, "three", PullState::Open),
        ];
        let plan = build_plan(&entries, units, &ctx()).unwrap();

        assert_eq!(
            plan.ops,
            vec![
                PlanOp::Create {
                    index: 1,
                    base: BaseRef::Entry(0)
                },
                PlanOp::RebaseBase {
                    index: 2,
                    number: 3,
                    base: BaseRef::Entry(1)
                },
            ]
        );
    }

    #[test]
    fn deletion_closes_after_chain_ops() {
        // B dropped from the stack; C moves down onto A.
        let branch_a = format!("stack/alice/{ID_A}");
        let branch_b = format!("stack/alice/{ID_B}");
        let entries = vec![entry(ID_A, "a1", "one"), entry(ID_C, "c2", "three")];
        let units = vec![
            unit(ID_A, 1, "a1", "main", "one", PullState::Open),
            unit(ID_B, 2, "b1", &branch_a, "two", PullState::Open),
            unit(ID_C, 3, "c2", &branch_b, "three", PullState::Open),
        ];
        let plan = build_plan(&entries, units, &ctx()).unwrap();

        assert_eq!(plan.ops.len(), 2);
        assert_eq!(
            plan.ops[0],
            PlanOp::RebaseBase {
                index: 1,
                number: 3,
                base: BaseRef::Entry(0)
            }
        );
        match &plan.ops[1] {
            PlanOp::Close { unit } => assert_eq!(unit.pull.number, 2),
            other => panic!("expected close, got {other:?}"),
        }
        assert_eq!(plan.orphans.len(), 1);
    }

    #[test]
    fn merged_unit_stays_in_base_chain() {
        let branch_a = format!("stack/alice/{ID_A}");
        let entries = vec![entry(ID_A, "a1", "one"), entry(ID_B, "b1", "two")];
        let units = vec![
            unit(ID_A, 1, "a1", "main", "one", PullState::Merged),
            unit(ID_B, 2, "b1", &branch_a, "two", PullState::Open),
        ];
        let plan = build_plan(&entries, units, &ctx()).unwrap();

        assert!(plan.is_noop());
        assert_eq!(plan.entries[0].disposition, Disposition::Merged);
        assert_eq!(plan.entries[1].base, branch_a);
    }

    #[test]
    fn open_unit_supersedes_merged_with_same_id() {
        // A merged pull and a newer open one carry the same id; the open one
        // is the target and must not be left dangling as neither entry nor
        // orphan.
        let entries = vec![entry(ID_A, "a2", "one")];
        let units = vec![
            unit(ID_A, 1, "a1", "main", "one", PullState::Merged),
            unit(ID_A, 7, "a1", "stack/alice/old-base", "one", PullState::Open),
        ];
        let plan = build_plan(&entries, units, &ctx()).unwrap();

        assert!(!plan.is_noop());
        assert!(plan.orphans.is_empty());
        assert_eq!(plan.entries[0].disposition, Disposition::Update);
        assert_eq!(plan.entries[0].number(), Some(7));
        assert_eq!(
            plan.ops,
            vec![
                PlanOp::UpdateContent { index: 0, number: 7 },
                PlanOp::RebaseBase {
                    index: 0,
                    number: 7,
                    base: BaseRef::Trunk
                },
            ]
        );
    }

    #[test]
    fn closed_unit_is_ignored() {
        let entries = vec![entry(ID_A, "a1", "one")];
        let units = vec![unit(ID_A, 1, "a1", "main", "one", PullState::Closed)];
        let plan = build_plan(&entries, units, &ctx()).unwrap();

        assert_eq!(
            plan.ops,
            vec![PlanOp::Create {
                index: 0,
                base: BaseRef::Trunk
            }]
        );
    }

    #[test]
    fn retitle_when_subject_changes() {
        let entries = vec![entry(ID_A, "a1", "one, reworded")];
        let units = vec![unit(ID_A, 1, "a1", "main", "one", PullState::Open)];
        let plan = build_plan(&entries, units, &ctx()).unwrap();

        assert_eq!(plan.ops, vec![PlanOp::Retitle { index: 0, number: 1 }]);
    }

    #[test]
    fn keep_title_body_suppresses_retitle() {
        let entries = vec![entry(ID_A, "a1", "one, reworded")];
        let units = vec![unit(ID_A, 1, "a1", "main", "one", PullState::Open)];
        let mut ctx = ctx();
        ctx.keep_title_body = true;
        let plan = build_plan(&entries, units, &ctx).unwrap();

        assert!(plan.is_noop());
    }

    #[test]
    fn next_only_stops_after_first_unmerged() {
        let entries = vec![
            entry(ID_A, "a1", "one"),
            entry(ID_B, "b1", "two"),
            entry(ID_C, "c1", "three"),
        ];
        let units = vec![unit(ID_A, 1, "a1", "main", "one", PullState::Merged)];
        let mut ctx = ctx();
        ctx.next_only = true;
        let plan = build_plan(&entries, units, &ctx).unwrap();

        assert_eq!(
            plan.ops,
            vec![PlanOp::Create {
                index: 1,
                base: BaseRef::Entry(0)
            }]
        );
        assert_eq!(plan.entries[2].disposition, Disposition::SkipNextOnly);
    }

    #[test]
    fn only_update_skips_missing_units() {
        let entries = vec![entry(ID_A, "a2", "one"), entry(ID_B, "b1", "two")];
        let units = vec![unit(ID_A, 1, "a1", "main", "one", PullState::Open)];
        let mut ctx = ctx();
        ctx.only_update = true;
        let plan = build_plan(&entries, units, &ctx).unwrap();

        assert_eq!(plan.ops, vec![PlanOp::UpdateContent { index: 0, number: 1 }]);
        assert_eq!(plan.entries[1].disposition, Disposition::SkipCreate);
    }

    #[test]
    fn duplicate_open_units_are_rejected() {
        let entries = vec![entry(ID_A, "a1", "one")];
        let units = vec![
            unit(ID_A, 1, "a1", "main", "one", PullState::Open),
            unit(ID_A, 2, "a1", "main", "one", PullState::Open),
        ];
        assert!(matches!(
            build_plan(&entries, units, &ctx()),
            Err(Error::Host(_))
        ));
    }

    #[test]
    fn predecessor_identity_change_forces_rebase() {
        // C keeps its content but its predecessor changed from A to B.
        let branch_a = format!("stack/alice/{ID_A}");
        let entries = vec![entry(ID_B, "b1", "two"), entry(ID_C, "c1", "three")];
        let units = vec![
            unit(ID_B, 2, "b1", "main", "two", PullState::Open),
            unit(ID_C, 3, "c1", &branch_a, "three", PullState::Open),
        ];
        let plan = build_plan(&entries, units, &ctx()).unwrap();

        assert_eq!(
            plan.ops,
            vec![PlanOp::RebaseBase {
                index: 1,
                number: 3,
                base: BaseRef::Entry(0)
            }]
        );
    }
}
