//! Command-line interface.

pub mod args;
pub mod collect;
pub mod find;
pub mod serve;

pub use args::{Cli, CollectArgs, Commands, FindArgs};
