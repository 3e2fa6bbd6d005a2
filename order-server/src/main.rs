use order_server::{Config, Server, init_logger_with_file};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment (.env is optional)
    dotenv::dotenv().ok();

    // 2. Configuration
    let config = Config::from_env();

    // 3. Logging (file output in production only)
    let log_dir = config.is_production().then(|| config.log_dir());
    init_logger_with_file(Some(config.log_level.as_str()), config.log_json, log_dir.as_deref());

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        "Order server starting"
    );

    // 4. Serve until ctrl-c
    if let Err(e) = Server::new(config).run().await {
        tracing::error!(error = %e, "Server error");
        return Err(e.into());
    }

    Ok(())
}
