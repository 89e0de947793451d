use crate::config::Config;
use crate::error::Result;
use crate::serve::{ServeManager, TailscaleCli};
use serde_json::json;
use std::sync::Arc;

/// Handle `twintail doctor`.
///
/// Prints a JSON report. Returns `Err(NotInstalled)` after printing when the
/// daemon CLI cannot be run, so the process exits non-zero.
pub fn handle_doctor_command(config: &Config) -> Result<()> {
    let cli = TailscaleCli::resolve(&config.tailscale_bin);
    let resolved = cli.program().display().to_string();
    let manager = ServeManager::new(Arc::new(cli));

    let installed = manager.check_installed();
    let daemon_check = match &installed {
        Ok(()) => json!({
            "check": "Tailscale CLI",
            "status": "✓ PASS",
            "details": {"program": resolved, "installed": true}
        }),
        Err(e) => json!({
            "check": "Tailscale CLI",
            "status": "✗ FAIL",
            "details": {"program": resolved, "installed": false, "error": e.to_string()}
        }),
    };

    let config_check = json!({
        "check": "Configuration",
        "status": "✓ INFO",
        "details": {
            "listen": config.listen_addr().to_string(),
            "tailscale_bin": config.tailscale_bin,
            "default_lang": config.default_lang,
        }
    });

    let report = json!({
        "summary": if installed.is_ok() { "✓ All checks passed" } else { "✗ Tailscale CLI unavailable" },
        "overall_status": if installed.is_ok() { "healthy" } else { "unhealthy" },
        "checks": [daemon_check, config_check],
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    installed
}
