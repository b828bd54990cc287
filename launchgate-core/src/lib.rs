//! launchgate library exports
//!
//! Decides whether a network-launched application may leave the sandbox:
//! signed-descriptor conformance, certificate trust, and the user prompt.

pub mod config;
pub mod descriptor;
pub mod error;
pub mod launch;
pub mod signing;

pub use config::LaunchPolicy;
pub use error::LaunchError;
