use tracing::{error, info};

/// Waits for the next OS shutdown signal: `SIGINT` or `SIGTERM` on Unix.
///
/// If the signal handlers cannot be registered, no signal is ever reported.
#[cfg(unix)]
pub(crate) async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let handlers = signal(SignalKind::interrupt())
        .and_then(|sigint| Ok((sigint, signal(SignalKind::terminate())?)));

    let (mut sigint, mut sigterm) = match handlers {
        Ok(handlers) => handlers,
        Err(error) => return never_signalled(error).await,
    };

    tokio::select! {
        biased; // no need to pay for randomized branch checking
        _ = sigint.recv() => {}
        _ = sigterm.recv() => {}
    }

    info!("Shutdown signal intercepted");
}

/// Waits for the next `ctrl_c` action on a non-Unix platform.
#[cfg(not(unix))]
pub(crate) async fn wait_for_shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        return never_signalled(error).await;
    }

    info!("Shutdown signal intercepted");
}

async fn never_signalled(error: std::io::Error) {
    error!(
        ?error,
        error_message = %error,
        "Failed to listen for shutdown signals",
    );

    std::future::pending::<()>().await
}
