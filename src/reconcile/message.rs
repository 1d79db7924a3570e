//! Commit message to pull request text mapping
//!
//! Machine-managed trailers never leak into pull request bodies. The
//! `Change-Id` trailer lives only in the commit message, and `Depends-On`
//! footers are regenerated on every pass from the planned chain rather than
//! trusted from what is currently on the host.

use regex::Regex;
use std::sync::OnceLock;

/// First line of a generated stack navigation comment, also used to find a
/// previously posted one.
pub const STACK_COMMENT_FIRST_LINE: &str = "This pull request is part of a stack:\n";

fn change_id_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^Change-Id: I[0-9a-f]{40}\n?").expect("hardcoded regex is valid")
    })
}

fn depends_on_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^Depends-On: #[0-9]+\n?").expect("hardcoded regex is valid")
    })
}

/// Strip machine-managed trailers from a message body.
///
/// The result is the comparable form used to decide whether a pull request
/// body is out of date, so it must be stable across passes.
pub fn stripped_message(message: &str) -> String {
    let out = change_id_line_re().replace_all(message, "");
    let out = depends_on_re().replace_all(&out, "");
    out.trim_end().to_string()
}

/// Build the pull request body for a commit message, appending a
/// `Depends-On` footer when the entry sits on top of another pull request.
pub fn format_pull_body(message: &str, depends_on: Option<u64>) -> String {
    let body = stripped_message(message);
    match depends_on {
        Some(number) if body.is_empty() => format!("Depends-On: #{number}"),
        Some(number) => format!("{body}\n\nDepends-On: #{number}"),
        None => body,
    }
}
