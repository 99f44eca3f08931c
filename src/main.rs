use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use vfs_terminal::app::api::{router, AppState};
use vfs_terminal::cli::Cli;

fn setup_tracing(cli: &Cli) {
    if let Some(level) = cli.log_level.to_tracing_level() {
        tracing_subscriber::fmt()
            .with_max_level(level)
            .compact()
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(%err, "could not listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

fn spawn_session_sweeper(state: AppState) {
    let period = state.limits().idle_timeout.max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            state.evict_idle();
        }
    });
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse();
    setup_tracing(&cli);

    let state = AppState::with_limits(cli.terminal_config(), cli.session_limits());
    spawn_session_sweeper(state.clone());
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(cli.addr).await?;
    info!(addr = %cli.addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}
