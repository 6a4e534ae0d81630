//! UniMerge node binary
//!
//! The single negotiation authority: HTTP API, identity roster, and the
//! contract-net engine over an in-memory knowledge base.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use unimerge_node::{Node, NodeConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "unimerge=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting UniMerge node");

    let config = NodeConfig::from_env();

    let node = Node::new(config);
    node.run().await?;

    Ok(())
}
