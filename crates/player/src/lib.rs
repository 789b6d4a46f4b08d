//! Argonvale player client core.
//!
//! Keeps a browser-style game client in sync with the server: one owned
//! socket connection with an outbound buffer, a deduplicated event log,
//! and reconcilers that derive combat and exploration state from it.

pub mod application;
pub mod config;
pub mod infrastructure;
pub mod ports;
pub mod runner;

#[cfg(test)]
mod scenario_tests;
