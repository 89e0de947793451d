//! Web console and CLI for Tailscale Services.
//!
//! [`serve::ServeManager`] turns `tailscale serve status --json` into service
//! summaries and details, and turns console actions into `tailscale serve`
//! invocations. The [`console`] module renders it over HTTP.

pub mod cli;
pub mod cli_handlers;
pub mod config;
pub mod console;
pub mod error;
pub mod i18n;
pub mod logging;
pub mod requests;
pub mod serve;

#[cfg(test)]
pub mod test_utils;
