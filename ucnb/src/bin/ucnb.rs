use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use ucnb::{
    adapters::InMemoryChain,
    cfg::read_config,
    engine::BridgeEngine,
    event::TracingEventSink,
    node::BridgeNode,
};

#[derive(Parser)]
#[clap(version, about = "Standalone cross-chain NFT bridge node")]
struct Args {
    /// Path to the node configuration file.
    #[clap(long, short, default_value = "config.toml")]
    config_file: PathBuf,
    /// Emit logs as JSON.
    #[clap(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::builder()
        .with_default_directive("ucnb=info".parse()?)
        .from_env_lossy();
    if args.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = read_config(&args.config_file)?;
    tracing::info!(chain = %config.chain, validators = config.genesis_validators.len(), "starting bridge node");

    // The standalone node runs against an in-memory backend. Production deployments embed
    // the engine with adapters for their chain instead.
    let engine = BridgeEngine::new(&config, InMemoryChain::new(), Box::new(TracingEventSink))?;
    let (node, handle) = BridgeNode::new(engine);
    let node = tokio::spawn(node.run());

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    drop(handle);
    node.await?;
    Ok(())
}
