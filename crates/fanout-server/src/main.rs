use anyhow::Context;
use clap::Parser;
use fanout_dispatch::DispatcherConfig;
use fanout_downstream::DownstreamConfig;
use fanout_server::{router, Config};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("invalid log level")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let client = DownstreamConfig::builder()
        .base_url(config.httpbin_url.clone())
        .timeout(config.request_timeout())
        .connect_timeout(config.connect_timeout())
        .name("httpbin")
        .build()
        .with_context(|| format!("failed to build client for {}", config.httpbin_url))?;

    let dispatcher = DispatcherConfig::builder()
        .name("delay")
        .failure_policy(config.failure_policy)
        .build(client);

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    tracing::info!("Listening on http://{}", config.bind);
    tracing::info!("  httpbin:        {}", config.httpbin_url);
    tracing::info!("  failure policy: {}", config.failure_policy);
    tracing::info!("Try it:");
    tracing::info!(
        "  curl 'http://{}/delay/parallel?delaySecs=1&numOfCalls=10&callLimit=3'",
        config.bind
    );

    axum::serve(listener, router(dispatcher).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutting down");
}
