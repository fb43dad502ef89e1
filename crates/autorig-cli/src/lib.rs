//! AutoRig CLI library.
//!
//! Scene loading, the terminal prompter and the command implementations
//! behind the `autorig` binary.

pub mod commands;
pub mod input;
pub mod prompt;
