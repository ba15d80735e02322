#![cfg(not(tarpaulin_include))]

use support_site::app;
use support_site::config::Config;

/// Main entry point for the web site
///
/// Initializes logging (`RUST_LOG`, default `info`), reads the configuration
/// from the environment and serves until the process is stopped.
///
/// # Environment
/// * `PORT` - listen port, default 8080, bound on all interfaces
/// * `DATA_DIR`, `STATIC_DIR`, `REVIEWS_FILE` - see [`Config`]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env();
    log::info!(
        "Starting web server (data: {}, static: {})",
        config.data_dir.display(),
        config.static_dir.display()
    );

    app::run(config).await
}
