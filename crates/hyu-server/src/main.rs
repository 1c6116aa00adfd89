//! # Hyu Server
//!
//! Entry point: load configuration, install logging, connect to MySQL and
//! serve the REST API with the nightly scheduler alongside.

use hyu_config::ConfigLoader;
use hyu_core::HyuResult;
use hyu_server::app::Application;
use hyu_server::startup::{init_tracing, print_banner};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Application error: {}", e);
        eprintln!("Application error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> HyuResult<()> {
    let config_loader = ConfigLoader::from_default_location()?;
    let config = config_loader.get().await;

    init_tracing(&config.observability);
    print_banner();
    info!("Starting Hyu server {}", env!("CARGO_PKG_VERSION"));

    Application::build(config).await?.run().await
}
