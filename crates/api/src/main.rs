use anyhow::Context;

use dealflow_infra::DealflowConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = DealflowConfig::from_env().context("invalid configuration")?;
    dealflow_observability::init(config.log_format);

    let app = dealflow_api::app::build_app(config.deals.clone()).await;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        enforce_required_documents = config.deals.enforce_required_documents,
        "listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
