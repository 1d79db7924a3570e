//! Plan and outcome rendering

use crate::cli::style::{arrow, bullet, check, hyperlink_url, Stream, Stylize};
use anstream::println;
use prstack::reconcile::{Disposition, ExecutionReport, Plan};

fn disposition_word(disposition: Disposition) -> &'static str {
    match disposition {
        Disposition::Create => "create",
        Disposition::Update => "update",
        Disposition::UpToDate => "up to date",
        Disposition::Merged => "merged",
        Disposition::SkipNextOnly => "skip (next-only)",
        Disposition::SkipCreate => "skip (no pull request)",
    }
}

/// Print the stack with what the pass will do to each entry.
pub fn print_plan(plan: &Plan) {
    println!(
        "{} ({} entries on {}):",
        "Stack".emphasis(),
        plan.entries.len().accent(),
        plan.trunk_branch.accent()
    );
    for planned in &plan.entries {
        let word = disposition_word(planned.disposition);
        let styled = match planned.disposition {
            Disposition::Create | Disposition::Update => format!("{}", word.accent()),
            Disposition::Merged => format!("{}", word.success()),
            _ => format!("{}", word.muted()),
        };
        match planned.number() {
            Some(number) => println!(
                "  {} {} {} {} {}",
                bullet(),
                planned.entry.short_sha().muted(),
                planned.entry.title,
                format!("#{number}").accent(),
                format!("[{styled}]")
            ),
            None => println!(
                "  {} {} {} {}",
                bullet(),
                planned.entry.short_sha().muted(),
                planned.entry.title,
                format!("[{styled}]")
            ),
        }
    }
    for orphan in &plan.orphans {
        println!(
            "  {} {} {} {}",
            bullet(),
            "orphan".warn().for_stderr(),
            orphan.pull.title,
            format!("#{} [close]", orphan.pull.number).accent()
        );
    }
}

/// Print what a dry run would have done.
pub fn print_dry_run(plan: &Plan) {
    if plan.is_noop() {
        println!("{} nothing to do", check());
        return;
    }
    println!();
    println!("{} would perform:", "Dry run".emphasis());
    for op in &plan.ops {
        println!("  {} {}", arrow(), op.verb());
    }
}

/// Print the outcome of an executed pass.
pub fn print_report(report: &ExecutionReport) {
    if report.is_noop() {
        println!("{} everything up to date", check());
    }
    for pull in &report.created {
        println!(
            "{} created {} {}",
            check(),
            format!("#{}", pull.number).accent(),
            hyperlink_url(Stream::Stdout, &pull.html_url).muted()
        );
    }
    for number in &report.updated {
        println!("{} updated {}", check(), format!("#{number}").accent());
    }
    for number in &report.rebased {
        println!("{} rebased {}", check(), format!("#{number}").accent());
    }
    for number in &report.retitled {
        println!("{} retitled {}", check(), format!("#{number}").accent());
    }
    for number in &report.closed {
        println!("{} closed {}", check(), format!("#{number}").accent());
    }
    for err in &report.comment_errors {
        anstream::eprintln!(
            "{} stack comment update failed on {}",
            "warning:".warn(),
            err.error()
        );
    }
}
