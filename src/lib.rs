// ABOUTME: Library root for slotswap - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod approval;
pub mod config;
pub mod deploy;
pub mod diagnostics;
pub mod error;
pub mod health;
pub mod hooks;
pub mod output;
pub mod platform;
pub mod types;
