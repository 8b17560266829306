use mystery_server::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "mystery=debug,mystery_server=debug,mystery_api=debug,mystery_gateway=debug,tower_http=debug".into()
            }),
        )
        .init();

    let config = Config::from_env()?;
    mystery_server::run(config).await
}
