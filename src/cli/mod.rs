//! CLI commands
//!
//! Command implementations for the `prstack` binary.

mod checkout;
mod context;
mod list;
mod push;
mod report;
mod setup;
mod style;

pub use checkout::{run_checkout, CheckoutArgs};
pub use list::{run_list, ListArgs};
pub use push::{run_push, PushArgs};
pub use setup::run_setup;
