use anyhow::Result;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = bookshelf::config::from_env()?;
    let ax = bookshelf::build(config)?;

    let host = ax.get("http.host").unwrap_or_else(|| "127.0.0.1".to_string());
    let port = ax.get("http.port").unwrap_or_else(|| "8080".to_string());
    let addr = format!("{host}:{port}");

    ax.listen(addr).await?;

    Ok(())
}
