//! opl CLI library
//!
//! Argument definitions and command implementations for the `opl` binary.

pub mod cli;
pub mod commands;
