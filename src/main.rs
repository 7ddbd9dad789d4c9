use clap::Parser;
use log::{error, info};
use std::sync::Arc;
use teaspoon::configuration::Cli;
use teaspoon::identity::resolver_from_config;
use teaspoon::storage::{FileImageStorage, FilePostStorage};
use teaspoon::WebServer;

#[tokio::main]
async fn main() {
    // RUST_LOG, when set, overrides the default level
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format_target(false)
        .init();

    info!("Importing configuration");

    let config = Cli::parse().into_config().unwrap_or_else(|e| {
        error!("Unable to load configuration: {}", e);
        std::process::exit(1);
    });

    info!("Configuration imported successfully");

    let posts = FilePostStorage::new(config.post_dir()).unwrap_or_else(|e| {
        error!("Unable to open post storage: {}, exiting...", e);
        std::process::exit(1);
    });
    let images = FileImageStorage::new(config.img_dir()).unwrap_or_else(|e| {
        error!("Unable to open image storage: {}, exiting...", e);
        std::process::exit(1);
    });
    let identity = resolver_from_config(&config).unwrap_or_else(|e| {
        error!("Unable to set up identity resolution: {}, exiting...", e);
        std::process::exit(1);
    });

    info!("Starting {} with {:?} identity resolution", config.hostname, config.identity);

    let server = WebServer::new(config, Arc::new(posts), Arc::new(images), identity);
    server.start().await;
}
