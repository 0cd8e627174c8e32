mod cli;

use ascii_streamer::{Server, VideoCatalog};
use cli::Cli;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional; a missing file is not an error
    dotenv::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if cli.verbose {
        log::set_max_level(log::LevelFilter::Debug);
    }

    info!("Starting ASCII Streamer v{}", env!("CARGO_PKG_VERSION"));

    let catalog = VideoCatalog::load(&cli.videos);
    if catalog.is_empty() {
        warn!("Catalog is empty, the server will only serve an empty listing");
    } else {
        info!("Serving {} videos", catalog.len());
    }

    let server_url = cli.effective_server_url();
    info!("Advertised server URL: {}", server_url);

    let addr = cli.bind_addr();
    Server::new(catalog, server_url)
        .run(&addr)
        .await
        .with_context(|| format!("server failed on {}", addr))?;

    Ok(())
}
