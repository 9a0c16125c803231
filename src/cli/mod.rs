//! Command-line interface module.

mod args;
pub mod common;
pub mod compile;
pub mod doctor;
pub mod documents;
pub mod edit;

pub use args::{Cli, Commands, CompileArgs};
