//! Common module - shared formatting and cleaning utilities
//!
//! Helpers reused by the manifest decoder, the tag aggregator and the CLI.

pub mod utils;

pub use utils::*;
