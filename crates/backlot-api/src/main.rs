use backlot_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    backlot_api::telemetry::init_telemetry();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize the application (database, services, routes)
    let (_state, router) = backlot_api::setup::initialize_app(config.clone()).await?;

    // Start the server
    backlot_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
