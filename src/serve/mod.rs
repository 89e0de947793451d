//! Serve-configuration translation layer.
//!
//! Builds `tailscale serve` invocations, runs them through a [`CommandRunner`]
//! and maps the status document into [`ServiceSummary`] / [`ServiceDetail`].

pub mod manager;
pub mod runner;
pub mod status;

pub use manager::{AdvertiseServiceParams, EndpointParams, ServeManager, UpdateEndpointParams};
pub use runner::{CommandOutput, CommandRunner, TailscaleCli};
pub use status::{PortEntry, ServiceDetail, ServiceSummary};
