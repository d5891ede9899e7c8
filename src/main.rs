use anyhow::Context;
use second_brain::{Config, build_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .json()
        .init();

    let config = Config::from_env()?;
    let addr = config.bind_addr();

    tracing::info!(
        addr = %addr,
        variant = %config.variant,
        base_url = %config.base_url,
        assets_dir = %config.assets_dir.display(),
        "starting server"
    );

    let router = build_router(&config);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("bind {addr}"))?;

    if let Err(e) = axum::serve(listener, router).await {
        tracing::error!(error = %e, "server stopped");
        return Err(e.into());
    }
    Ok(())
}
