use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use splitboard_core::ai::Gateway;
use splitboard_core::tracing_setup;
use splitboard_server::run_server;

#[derive(Parser)]
#[command(name = "splitboard-server")]
#[command(about = "AI analysis endpoint for splitboard clients")]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8787")]
    bind: String,

    /// Override the completion provider base URL
    #[arg(long)]
    provider_base: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_setup::init_tracing();
    let args = Args::parse();

    let gateway = match args.provider_base {
        Some(base) => Gateway::with_api_base(base),
        None => Gateway::new(),
    };

    run_server(&args.bind, Arc::new(gateway)).await
}
