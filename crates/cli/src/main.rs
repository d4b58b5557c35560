use std::{net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use {
    clap::{Parser, Subcommand},
    tokio_util::sync::CancellationToken,
    tracing::{error, info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    confab_config::{ConfabConfig, Severity},
    confab_gateway::{AppState, HttpSubmitClient, SubmitApi},
    confab_viber::{OutboundSender, ViberClient},
};

#[derive(Parser)]
#[command(name = "confab", about = "Confab — Viber UAT service gateway")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Address to bind to (overrides config value).
    #[arg(long, global = true)]
    bind: Option<String>,

    /// Port to listen on (overrides config value).
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Config file path (overrides the default search locations).
    #[arg(long, global = true, env = "CONFAB_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway server (default when no subcommand is provided).
    Serve,
    /// Validate the configuration file and report its UAT posture.
    CheckConfig,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Load config from the explicit `--config` path or the search locations,
/// then fold in the environment overrides.
fn load_configuration(cli: &Cli) -> anyhow::Result<ConfabConfig> {
    let mut config = match cli.config {
        Some(ref path) => confab_config::load_config(path)?,
        None => confab_config::discover_and_load(),
    };
    confab_config::apply_env_overrides(&mut config);
    Ok(config)
}

async fn run_serve(cli: Cli) -> anyhow::Result<()> {
    let config = load_configuration(&cli)?;

    // Surface config problems at startup without refusing to boot; a UAT
    // deployment running on shipped defaults is a supported setup.
    let report = confab_config::validate::validate(cli.config.as_deref());
    for diagnostic in &report.diagnostics {
        match diagnostic.severity {
            Severity::Error => error!(path = %diagnostic.path, "{}", diagnostic.message),
            Severity::Warning => warn!(path = %diagnostic.path, "{}", diagnostic.message),
            Severity::Info => info!(path = %diagnostic.path, "{}", diagnostic.message),
        }
    }

    let bind = cli.bind.unwrap_or_else(|| config.server.bind.clone());
    let port = cli.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;

    // One timeout bounds every call made while a user's lane is locked,
    // Viber sends included.
    let timeout = Duration::from_secs(config.downstream.timeout_secs);
    let outbound: Arc<dyn OutboundSender> = Arc::new(ViberClient::new(
        config.viber.auth_token.clone(),
        config.viber.api_url.clone(),
        config.viber.sender_name.clone(),
        timeout,
    )?);
    let own_base = format!("http://127.0.0.1:{port}");
    let submit: Arc<dyn SubmitApi> =
        Arc::new(HttpSubmitClient::from_config(&config.downstream, &own_base)?);

    let state = AppState::new(&config, outbound, submit);

    let shutdown = CancellationToken::new();
    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            on_signal.cancel();
        }
    });

    confab_gateway::serve(addr, state, shutdown).await?;
    Ok(())
}

fn run_check_config(cli: &Cli) -> anyhow::Result<()> {
    let report = confab_config::validate::validate(cli.config.as_deref());

    match report.config_path {
        Some(ref path) => println!("checking {}", path.display()),
        None => println!("no config file found; checking built-in defaults"),
    }

    for diagnostic in &report.diagnostics {
        if diagnostic.path.is_empty() {
            println!("  {}: {}", diagnostic.severity, diagnostic.message);
        } else {
            println!(
                "  {}: {}: {}",
                diagnostic.severity, diagnostic.path, diagnostic.message
            );
        }
    }

    if report.diagnostics.is_empty() {
        println!("configuration OK");
    } else {
        println!(
            "{} error(s), {} warning(s)",
            report.count(Severity::Error),
            report.count(Severity::Warning)
        );
    }

    if report.has_errors() {
        anyhow::bail!("configuration has errors");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "confab starting");

    match cli.command {
        None | Some(Commands::Serve) => run_serve(cli).await,
        Some(Commands::CheckConfig) => run_check_config(&cli),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_serve_with_info_logs() {
        let cli = Cli::parse_from(["confab"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.log_level, "info");
        assert!(!cli.json_logs);
        assert!(cli.bind.is_none());
        assert!(cli.port.is_none());
    }

    #[test]
    fn overrides_parse_alongside_a_subcommand() {
        let cli = Cli::parse_from([
            "confab",
            "check-config",
            "--bind",
            "127.0.0.1",
            "--port",
            "9000",
        ]);
        assert!(matches!(cli.command, Some(Commands::CheckConfig)));
        assert_eq!(cli.bind.as_deref(), Some("127.0.0.1"));
        assert_eq!(cli.port, Some(9000));
    }
}
