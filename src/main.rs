//! hostpulse - host telemetry snapshot service.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use clap::Parser;
use tokio::{net::TcpListener, signal};
use tracing::{error, info, Level};

use hostpulse::cli::{Args, Commands, LogLevel};
use hostpulse::command::{CommandRunner, SystemCommandRunner};
use hostpulse::config::{
    generate_config_file, render_config, resolve_config, validate_effective_config, Config,
};
use hostpulse::handlers::{
    health_handler, snapshot_handler, speedtest_handler, speedtest_start_handler,
};
use hostpulse::state::AppState;
use hostpulse::{resources, PROC_ROOT};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("Configuration invalid: {e}");
                std::process::exit(1);
            }
            println!("Configuration is valid");
            return Ok(());
        }

        println!("{}", render_config(&config, &args.config_format)?);
        return Ok(());
    }

    // Handle subcommands
    if let Some(command) = &args.command {
        let config = resolve_config(&args)?;
        if let Err(e) = validate_effective_config(&config) {
            eprintln!("Configuration invalid: {e}");
            std::process::exit(1);
        }

        return match command {
            Commands::Check {
                proc,
                speedtest,
                all,
            } => command_check(*proc, *speedtest, *all, &config),
            Commands::Config {
                output,
                format,
                commented,
            } => generate_config_file(output.clone(), format, *commented),
        };
    }

    // Load configuration for server mode
    let config = resolve_config(&args)?;
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("Configuration invalid: {e}");
        std::process::exit(1);
    }

    setup_logging(&args);
    info!("Starting hostpulse");

    let bind_ip = config.effective_bind().to_string();
    let port = config.effective_port();
    let enable_health = config.enable_health.unwrap_or(true);

    // Create shared application state
    let state = Arc::new(AppState::new(config));

    // Configure HTTP server routes and start listening
    let addr: SocketAddr = format!("{bind_ip}:{port}").parse()?;

    let mut app = Router::new()
        .route("/api/system", get(snapshot_handler))
        .route("/api/speedtest", get(speedtest_handler))
        .route("/api/speedtest/start", post(speedtest_start_handler));

    // Conditionally add health endpoint
    if enable_health {
        app = app.route("/health", get(health_handler));
    }

    let app = app.with_state(state);

    let listener = TcpListener::bind(addr).await?;
    info!("hostpulse listening on http://{}:{}", bind_ip, port);

    // Setup graceful shutdown signal handlers
    let shutdown_signal = async {
        let ctrl_c = async {
            signal::ctrl_c()
                .await
                .expect("Failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("Failed to install signal handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
            }
            _ = terminate => {
                info!("Received SIGTERM, shutting down gracefully...");
            }
        }
    };

    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                error!("Server error: {}", e);
                return Err(e.into());
            }
        }
        _ = shutdown_signal => {
            info!("Shutdown signal received, exiting...");
        }
    }

    info!("hostpulse stopped gracefully");
    Ok(())
}

/// Initializes the tracing subscriber with the configured log level.
fn setup_logging(args: &Args) {
    let log_level = match args.log_level {
        LogLevel::Off => Level::ERROR,
        LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    info!("Logging initialized with level: {:?}", args.log_level);
}

/// Validates system requirements: reports, never installs.
fn command_check(proc: bool, speedtest: bool, all: bool, config: &Config) -> Result<()> {
    println!("hostpulse - System Check");
    println!("========================");

    let mut all_ok = true;
    let run_all = all || (!proc && !speedtest);

    if proc || run_all {
        println!("\nChecking process pseudo-filesystem...");
        let proc_root = Path::new(PROC_ROOT);
        if proc_root.exists() {
            println!("   OK: {PROC_ROOT} accessible");

            let records = resources::process_list(proc_root);
            if records.is_empty() {
                println!("   FAIL: no process records readable under {PROC_ROOT}");
                all_ok = false;
            } else {
                println!("   OK: {} process records readable", records.len());
            }
        } else {
            println!("   FAIL: {PROC_ROOT} not found");
            all_ok = false;
        }
    }

    if speedtest || run_all {
        let command = config.effective_speedtest_command();
        println!("\nChecking speed measurement tool...");
        let runner = SystemCommandRunner;
        match runner.invoke(command, &["--version"]) {
            Ok(output) if output.success => {
                println!("   OK: {} available ({})", command, output.stdout.trim());
            }
            Ok(_) => {
                println!("   WARN: {command} present but returned an error");
            }
            Err(_) => {
                println!(
                    "   WARN: {command} not found - the speed test endpoint will report errors"
                );
            }
        }
    }

    println!("\nSummary:");
    if all_ok {
        println!("   All checks passed - system is ready");
        Ok(())
    } else {
        println!("   Some checks failed - please review warnings");
        std::process::exit(1);
    }
}
