use dancebattle_rs::config::Config;
use dancebattle_rs::service::server::start_server;
use dancebattle_rs::utils::log::init_logger_once;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger_once();

    let config = Config::load();
    let (addr, _state) = start_server(config).await?;
    tracing::info!("Feed engine ready at http://{addr}");

    // The server runs on a background task; park the main one.
    tokio::signal::ctrl_c().await?;
    Ok(())
}
