//! UniMerge Node - the negotiation authority boundary.
//!
//! A single-process exam-slot booking authority. Students and venue
//! administrators talk to it over HTTP; negotiations run through the
//! contract-net engine against an in-memory knowledge base.
//!
//! # Architecture
//!
//! - **Auth**: identity roster (built-in demo set or a live-editable JSON file)
//! - **API**: HTTP endpoints for login, constraints, negotiation, bookings
//! - **WS**: WebSocket streaming of the live negotiation trace
//! - **Slip**: printable exam slip for confirmed sessions
//!
//! # Example
//!
//! ```no_run
//! use unimerge_node::{Node, NodeConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = NodeConfig::from_env();
//!     let node = Node::new(config);
//!     node.run().await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod error;
pub mod node;
pub mod slip;
pub mod ws;

pub use auth::Directory;
pub use error::{Error, Result};
pub use node::{Node, NodeConfig, NodeState};
