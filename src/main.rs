mod adapter;
mod cli;
mod config;
mod diff;
mod filter;
mod hapi;
mod model;
mod pipeline;
mod remote;
mod submit;

use anyhow::Result;

use cli::Action;
use remote::DevOpsClient;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match cli::parse_args(&args)? {
        Action::Help => {
            cli::print_help();
            Ok(())
        }
        Action::Daily { config_path } => {
            let config = config::load_config(&config_path)?;
            let client = DevOpsClient::new(&config);
            pipeline::DailyPipeline::new(&config, &client).run().await
        }
        Action::DownloadAll { config_path, dst } => {
            let config = config::load_config(&config_path)?;
            let client = DevOpsClient::new(&config);
            pipeline::download_all(&client, &dst).await
        }
    }
}
