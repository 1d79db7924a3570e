//! Progress reporting hooks for plan execution

/// Coarse phases of a reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Listing remote pull requests.
    Inspect,
    /// Applying chain mutations.
    Execute,
    /// Closing orphaned pull requests.
    Close,
    /// Refreshing stack navigation comments.
    Comment,
}

/// Callbacks invoked while a plan is being executed.
///
/// Implementations must be cheap; they are called inline between host calls.
pub trait ExecuteProgress: Send + Sync {
    /// A new phase begins.
    fn on_phase(&self, _phase: Phase) {}

    /// A mutation op is about to run. `detail` names the affected entry or
    /// pull request.
    fn on_op(&self, _verb: &'static str, _detail: &str) {}

    /// A non-fatal problem occurred.
    fn on_warning(&self, _message: &str) {}
}

/// Progress sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ExecuteProgress for NoopProgress {}
