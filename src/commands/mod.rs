//! Command implementations
//!
//! Commands are `impl Repository` blocks, so they can reach every repository
//! area while keeping argument parsing in `main.rs`.

pub mod porcelain;
