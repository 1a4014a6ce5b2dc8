//! Command line interface module
//!
//! Argument parsing and the runner that executes one command against a
//! [`RegistryManager`](crate::manager::RegistryManager).

pub mod args;
pub mod runner;

pub use args::{Args, Command};
pub use runner::Runner;
