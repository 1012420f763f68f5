//! Watch command implementation

use crate::cli::output::{format_notification_line, format_status};
use crate::cli::{load_config, WatchArgs};
use crate::config::TeamwatchConfig;
use crate::logging::init_tracing;
use crate::poller::AuthSignal;
use crate::session::DashboardSession;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

/// Load configuration with CLI overrides
pub fn load_config_with_overrides(
    args: &WatchArgs,
) -> Result<TeamwatchConfig, Box<dyn std::error::Error>> {
    let mut config = load_config(&args.config)?;

    // CLI overrides (highest priority)
    if let Some(ref url) = args.url {
        config.connection.url = url.clone();
    }
    if let Some(ref api_url) = args.api_url {
        config.connection.api_url = api_url.clone();
    }
    if let Some(ref token) = args.token {
        config.connection.token = Some(token.clone());
    }
    if let Some(ref log_level) = args.log_level {
        config.logging.level = log_level.clone();
    }
    if args.no_poller {
        config.poller.enabled = false;
    }

    Ok(config)
}

/// Wait for shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install CTRL+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
        _ = cancel_token.cancelled() => return,
    }

    cancel_token.cancel();
}

/// Main watch command handler
pub async fn run_watch(args: WatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config_with_overrides(&args)?;
    config.validate()?;
    init_tracing(&config.logging)?;

    if config.connection.token.is_none() {
        return Err("No token configured. Set TEAMWATCH_TOKEN or pass --token.".into());
    }

    tracing::info!(url = %config.connection.url, "Starting teamwatch");
    tracing::debug!(poller = config.poller.enabled, "Loaded configuration");

    let mut session = DashboardSession::new(config)?;
    let mut toasts = session.toasts();
    let mut auth = session.auth_signals();
    session.start()?;

    let mut states = session
        .connection()
        .map(|c| c.subscribe())
        .ok_or("Session did not start a connection")?;

    let cancel_token = CancellationToken::new();
    let signal_handle = tokio::spawn(shutdown_signal(cancel_token.clone()));
    let mut last_status = states.borrow_and_update().status;
    eprintln!("status: {}", format_status(last_status));

    let mut result: Result<(), Box<dyn std::error::Error>> = Ok(());
    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => break,
            toast = toasts.recv() => match toast {
                Ok(record) => {
                    if args.json {
                        match serde_json::to_string(&record) {
                            Ok(line) => println!("{}", line),
                            Err(e) => tracing::warn!(error = %e, "Cannot encode notification"),
                        }
                    } else {
                        println!("{}", format_notification_line(&record));
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Notification feed lagged");
                }
                Err(RecvError::Closed) => break,
            },
            signal = auth.recv() => {
                if let Ok(AuthSignal::Unauthorized) = signal {
                    result = Err("Server rejected the token (401)".into());
                    break;
                }
            }
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = states.borrow_and_update().clone();
                if state.status != last_status {
                    last_status = state.status;
                    match state.last_error {
                        Some(ref error) if !state.is_open() => {
                            eprintln!("status: {} ({})", format_status(state.status), error)
                        }
                        _ => eprintln!("status: {}", format_status(state.status)),
                    }
                }
            }
        }
    }

    cancel_token.cancel();
    session.stop().await;
    signal_handle.await?;

    let snapshot = session.store().snapshot();
    tracing::info!(
        teams = snapshot.teams.len(),
        messages = snapshot.message_count(),
        "teamwatch stopped"
    );
    result
}
