// ABOUTME: Command module aggregator for the slotswap CLI.
// ABOUTME: Re-exports deploy and status command handlers.

mod deploy;
mod platform_connection;
mod status;

pub use deploy::{DeployOptions, deploy};
pub use status::status;
