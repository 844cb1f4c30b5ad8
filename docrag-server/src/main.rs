use docrag_server::{ServiceConfig, run_server, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::from_env()?;
    telemetry::init(&config.log_level, config.log_format);

    run_server(config).await
}
