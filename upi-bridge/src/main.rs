use service_core::observability::init_tracing;
use upi_bridge::{config::Config, startup::Application};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(
        &config.service_name,
        &config.common.log_level,
        config.common.log_format,
    );

    let application = Application::build(config).await?;
    application.run_until_stopped().await?;

    Ok(())
}
