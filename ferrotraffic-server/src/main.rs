use std::error::Error;
use std::sync::Arc;

use clap::Parser;
use ferrotraffic_core::prelude::*;
use ferrotraffic_server::{AppState, Cli, Config, NetworkSize, router};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli)?;

    let network = config.network.clone();
    let graph = tokio::task::spawn_blocking(move || create_street_graph(&network)).await??;
    let network_size = NetworkSize::of(&graph);
    info!(
        nodes = network_size.nodes,
        edges = network_size.edges,
        "Street network ready"
    );

    let source = HttpFeedSource::new(
        config.traffic.feed_url.clone(),
        config.traffic.connect_timeout(),
        config.traffic.usage_speeds,
    )?;
    let updater = Arc::new(TrafficUpdater::from_config(
        source,
        StateGate::new(graph),
        &config.traffic,
    ));

    let update_task = if config.traffic.enabled {
        Some(updater.spawn())
    } else {
        info!("Traffic updates disabled, accepting pushed reports only");
        None
    };

    let app = router(
        AppState::new(Arc::clone(&updater), network_size),
        &config.server,
    );
    let listener = TcpListener::bind(config.server.listen).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(updater.shutdown_token()))
        .await?;

    updater.stop();
    if let Some(task) = update_task {
        task.await?;
    }
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal(token: CancellationToken) {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Shutdown requested"),
        () = token.cancelled() => {}
    }
    token.cancel();
}
