//! Command-line interface: `serve`, `migrate` and `jobs`.

pub mod args;

pub use args::{Cli, Commands};
