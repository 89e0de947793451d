use crate::config::Config;
use crate::console::ConsoleServer;
use crate::logging::{cleanup_old_logs, log_dir};

const DEFAULT_RETENTION_DAYS: u32 = 7;

/// Handle `twintail serve`. Runs until Ctrl-C.
pub async fn handle_serve_command(config: Config) -> anyhow::Result<()> {
    if let Some(dir) = log_dir() {
        let retention_days = std::env::var("TWINTAIL_LOG_RETENTION_DAYS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_RETENTION_DAYS);
        if let Err(e) = cleanup_old_logs(&dir, retention_days) {
            tracing::warn!("Log cleanup failed: {}", e);
        }
    }

    ConsoleServer::new(config)?.run().await
}
