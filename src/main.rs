use anyhow::Result;
use colored::Colorize;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use stackwatch::app::App;
use stackwatch::cli::Cli;
use stackwatch::core::DockerRuntime;
use stackwatch::utils::{format_millis, AppConfig};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse_lenient();
    let _guard = setup_tracing(&cli);

    let config = match AppConfig::discover(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => return Ok(fatal(&format!("Invalid configuration: {:#}", err), None)),
    };
    let registry = match config.registry() {
        Ok(registry) => registry,
        Err(err) => return Ok(fatal(&format!("{:#}", err), None)),
    };
    let settings = match config.settings(cli.interval()) {
        Ok(settings) => settings,
        Err(err) => return Ok(fatal(&format!("{:#}", err), None)),
    };

    let runtime = match DockerRuntime::connect().await {
        Ok(runtime) => runtime,
        Err(err) => {
            return Ok(fatal(
                &format!("Error connecting to Docker: {}", err),
                Some("Make sure Docker is running and accessible"),
            ))
        }
    };

    let cancel = CancellationToken::new();
    spawn_signal_handler(cancel.clone());

    println!(
        "{}",
        format!(
            "🚀 Starting {} ({} refresh, {} services)...",
            settings.title,
            format_millis(settings.interval),
            registry.len()
        )
        .cyan()
    );

    let mut app = App::new(runtime, registry, &settings);
    app.run(cancel).await?;

    let last = app
        .last_frame()
        .map(|frame| format!(" │ last: {}/{} healthy", frame.counts.healthy, frame.counts.total))
        .unwrap_or_default();
    println!("\n{}", format!("👋 Monitor stopped after {} updates{}", app.cycles(), last).dimmed());

    Ok(ExitCode::SUCCESS)
}

fn fatal(message: &str, hint: Option<&str>) -> ExitCode {
    eprintln!("{}", format!("❌ {}", message).red());
    if let Some(hint) = hint {
        eprintln!("{}", format!("💡 {}", hint).yellow());
    }
    ExitCode::FAILURE
}

/// Set up file-based tracing; stdout belongs to the dashboard. The returned
/// guard must live until exit so buffered log lines are flushed.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("stackwatch={log_level}")));

    let log_file = cli.log_file();
    let log_dir = log_file
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.to_path_buf())
        .unwrap_or_else(std::env::temp_dir);
    let log_name = log_file
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| "stackwatch.log".into());

    let file_appender = tracing_appender::rolling::never(log_dir, log_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false).with_target(true))
        .init();

    guard
}

/// Cancel the monitor on Ctrl+C or SIGTERM
fn spawn_signal_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        info!("shutdown signal received");
        cancel.cancel();
    });
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = terminate.recv() => {}
            }
        }
        Err(err) => {
            warn!(error = %err, "failed to install SIGTERM handler");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
