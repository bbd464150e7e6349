pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod models;
pub mod server;
pub mod store;

use cli::Args;
use config::ServiceConfig;
use log::info;
use server::{ bind_address, AppState, Server };
use std::error::Error;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = ServiceConfig::from_args(&args)?;
    config.log_summary();

    let state = AppState::new(config)?;
    let addr = bind_address(&args.host, args.http_port)?;
    info!("Starting server on: {}", addr);
    let server = Server::new(addr, state, args);
    server.run().await?;

    Ok(())
}
