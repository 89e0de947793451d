use clap::Parser;
use std::io::IsTerminal;
use std::sync::Arc;
use twintail::cli::{Cli, Commands};
use twintail::cli_handlers::{
    handle_doctor_command, handle_serve_command, handle_show, handle_status,
};
use twintail::config::{Config, ConfigOverrides};
use twintail::error::{ErrorResponse, TwintailError};
use twintail::logging::{init_logging, log_file_path, ApplicationMode, LoggingConfig};
use twintail::serve::{ServeManager, TailscaleCli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut log_config = LoggingConfig::from_args(cli.quiet, cli.verbose > 0, cli.json);

    // The console logs to a file when asked to, or when stdout is redirected
    if let Commands::Serve { log_file, .. } = &cli.command {
        let file_output = match log_file {
            Some(path) => Some(path.clone()),
            None if !std::io::stdout().is_terminal() => log_file_path(ApplicationMode::Console).ok(),
            None => None,
        };
        if let Some(path) = file_output {
            log_config = LoggingConfig {
                level: log_config.level,
                json_format: cli.json,
                file_output: Some(path),
                ..LoggingConfig::for_mode(ApplicationMode::Console)
            };
        }
    }

    if let Err(e) = init_logging(log_config) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(&cli).await {
        let error_response = match e.downcast_ref::<TwintailError>() {
            Some(err) => err.to_error_response(),
            None => ErrorResponse {
                error: format!("{:#}", e),
                code: "INTERNAL_ERROR".to_string(),
            },
        };
        match serde_json::to_string_pretty(&error_response) {
            Ok(json) => eprintln!("{}", json),
            Err(_) => eprintln!("{}", error_response.error),
        }
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let mut overrides = ConfigOverrides {
        tailscale_bin: cli.tailscale_bin.clone(),
        ..ConfigOverrides::default()
    };
    if let Commands::Serve { bind, port, .. } = &cli.command {
        overrides.bind = bind.clone();
        overrides.port = *port;
    }
    let config = Config::from_env()?.with_overrides(overrides)?;

    match &cli.command {
        Commands::Serve { .. } => handle_serve_command(config).await?,
        Commands::Status { format } => handle_status(&manager_for(&config), format)?,
        Commands::Show { name, format } => handle_show(&manager_for(&config), name, format)?,
        Commands::Doctor => handle_doctor_command(&config)?,
    }

    Ok(())
}

fn manager_for(config: &Config) -> ServeManager {
    ServeManager::new(Arc::new(TailscaleCli::resolve(&config.tailscale_bin)))
}
