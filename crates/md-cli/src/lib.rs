//! md-cli: Command-line front end for MirrorDesk
//!
//! Provides the `mirrordesk` binary, which pairs with a PC agent and
//! drives a single connection manager: watching the screen, sending
//! input and reading metrics.

pub mod commands;
pub mod output;
