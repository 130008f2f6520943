use reportrelay_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    let app = reportrelay_api::setup::initialize_app(config.clone())?;

    reportrelay_api::setup::server::start_server(&config, app).await?;

    Ok(())
}
