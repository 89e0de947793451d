use super::runner::{CommandOutput, CommandRunner};
use super::status::{self, ServiceDetail, ServiceSummary};
use crate::error::{CommandError, Result, TwintailError};
use crate::log_serve_operation;
use std::sync::Arc;

/// Parameters for `tailscale serve --service=...` when creating a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertiseServiceParams {
    pub service_name: String,
    pub protocol: String,
    pub expose_port: String,
    pub destination: String,
}

/// One endpoint of an existing (or to-be-created) service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointParams {
    pub service_name: String,
    pub protocol: String,
    pub expose_port: String,
    pub destination: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateEndpointParams {
    pub service_name: String,
    pub protocol: String,
    pub expose_port: String,
    pub old_destination: String,
    pub new_destination: String,
}

impl UpdateEndpointParams {
    fn old_endpoint(&self) -> EndpointParams {
        EndpointParams {
            service_name: self.service_name.clone(),
            protocol: self.protocol.clone(),
            expose_port: self.expose_port.clone(),
            destination: self.old_destination.clone(),
        }
    }

    fn new_endpoint(&self) -> EndpointParams {
        EndpointParams {
            destination: self.new_destination.clone(),
            ..self.old_endpoint()
        }
    }
}

pub fn status_args() -> Vec<String> {
    vec!["serve".into(), "status".into(), "--json".into()]
}

/// `serve --service=svc:<name> --<protocol>=<port> <destination>`
pub fn serve_args(service_name: &str, protocol: &str, port: &str, destination: &str) -> Vec<String> {
    vec![
        "serve".into(),
        format!("--service={}", status::service_key(service_name)),
        format!("--{}={}", protocol, port),
        destination.to_string(),
    ]
}

/// Same as [`serve_args`] with a trailing `off`, which removes the tuple.
pub fn serve_off_args(service_name: &str, protocol: &str, port: &str, destination: &str) -> Vec<String> {
    let mut args = serve_args(service_name, protocol, port, destination);
    args.push("off".into());
    args
}

pub fn clear_args(service_name: &str) -> Vec<String> {
    vec!["serve".into(), "clear".into(), status::service_key(service_name)]
}

pub fn version_args() -> Vec<String> {
    vec!["version".into()]
}

/// Translates between the tailscale CLI and the console's read models.
///
/// Holds no state besides the runner: every call re-queries the daemon and
/// every mutation is a separate, unretried process invocation.
#[derive(Clone)]
pub struct ServeManager {
    runner: Arc<dyn CommandRunner>,
}

impl ServeManager {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// List every service, sorted by display name. Read-only.
    pub fn get_serve_status(&self) -> Result<Vec<ServiceSummary>> {
        let status = self.query_status()?;
        Ok(status::summarize_services(&status))
    }

    /// Look up `svc:<name>`. A missing service is `Ok(None)`.
    pub fn get_service_by_name(&self, name: &str) -> Result<Option<ServiceDetail>> {
        let status = self.query_status()?;
        Ok(status::find_service(&status, name))
    }

    pub fn advertise_service(&self, params: &AdvertiseServiceParams) -> Result<()> {
        log_serve_operation!("advertise_service", &params.service_name);
        self.mutate(serve_args(
            &params.service_name,
            &params.protocol,
            &params.expose_port,
            &params.destination,
        ))
    }

    pub fn add_endpoint(&self, params: &EndpointParams) -> Result<()> {
        log_serve_operation!("add_endpoint", &params.service_name);
        self.mutate(serve_args(
            &params.service_name,
            &params.protocol,
            &params.expose_port,
            &params.destination,
        ))
    }

    pub fn remove_endpoint(&self, params: &EndpointParams) -> Result<()> {
        log_serve_operation!("remove_endpoint", &params.service_name);
        self.mutate(serve_off_args(
            &params.service_name,
            &params.protocol,
            &params.expose_port,
            &params.destination,
        ))
    }

    /// Remove the old destination, then add the new one.
    ///
    /// The daemon has no single-call update. A failed remove aborts before the
    /// add is attempted and leaves the endpoint untouched. A failed add after a
    /// successful remove returns [`TwintailError::PartialUpdate`] wrapping the
    /// add step's [`CommandError`]: at that point neither destination is
    /// routed.
    pub fn update_endpoint(&self, params: &UpdateEndpointParams) -> Result<()> {
        log_serve_operation!(
            "update_endpoint",
            &params.service_name,
            params.new_destination.as_str()
        );
        self.remove_endpoint(&params.old_endpoint())?;

        match self.add_endpoint(&params.new_endpoint()) {
            Ok(()) => Ok(()),
            Err(TwintailError::Command(source)) => {
                tracing::error!(
                    service = %params.service_name,
                    removed = %params.old_destination,
                    attempted = %params.new_destination,
                    error = %source,
                    "Endpoint update left service without either destination"
                );
                Err(TwintailError::PartialUpdate {
                    removed_destination: params.old_destination.clone(),
                    source,
                })
            },
            Err(e) => Err(e),
        }
    }

    pub fn clear_service(&self, name: &str) -> Result<()> {
        log_serve_operation!("clear_service", name);
        self.mutate(clear_args(name))
    }

    /// Probe `tailscale version`. A missing binary or an unrecognized one (non-zero
    /// exit) is [`TwintailError::NotInstalled`]; other OS failures stay
    /// [`TwintailError::Execution`].
    pub fn check_installed(&self) -> Result<()> {
        match self.runner.run(&version_args()) {
            Ok(output) if output.success => {
                tracing::debug!(
                    version = %String::from_utf8_lossy(&output.stdout).trim(),
                    "tailscale is installed"
                );
                Ok(())
            },
            Ok(output) => {
                tracing::warn!(output = %output.combined(), "tailscale version check failed");
                Err(TwintailError::NotInstalled)
            },
            Err(TwintailError::Execution { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                tracing::warn!("tailscale binary not found");
                Err(TwintailError::NotInstalled)
            },
            Err(e) => Err(e),
        }
    }

    fn query_status(&self) -> Result<status::ServeStatus> {
        let args = status_args();
        let output = self.runner.run(&args)?;
        if !output.success {
            let message = output.combined();
            tracing::warn!(output = %message, "tailscale serve status failed");
            return Err(TwintailError::Execution {
                command: format!("tailscale {}", args.join(" ")),
                source: std::io::Error::other(exit_description(&output, message)),
            });
        }
        status::parse_status(&output.stdout)
    }

    fn mutate(&self, args: Vec<String>) -> Result<()> {
        let output = self.runner.run(&args)?;
        if output.success {
            return Ok(());
        }
        let err = CommandError::new(output.combined(), output.exit_code);
        tracing::warn!(?args, error = %err, "tailscale serve command failed");
        Err(err.into())
    }
}

fn exit_description(output: &CommandOutput, message: String) -> String {
    match (output.exit_code, message.is_empty()) {
        (Some(code), true) => format!("exited with status {}", code),
        (None, true) => "terminated by signal".to_string(),
        (_, false) => message,
    }
}
