//! Courier edge node
//!
//! The connection multiplexer: holds live WebSocket connections keyed by
//! token and delivers broker frames addressed to a connected token.
//!
//! - [`ConnectionTable`] - the token-to-socket map, owned by one server
//!   instance, never shared as global state
//! - [`EdgeServer`] - WebSocket accept loop, per-connection state machine,
//!   broker feed, and load reporting
//!
//! Nothing is buffered here for absent tokens: a frame for a token with no
//! live connection is a no-op, and the client recovers from storage with a
//! since-query. Nodes are fully independent of each other, which is what
//! allows horizontal scaling of the edge tier.

mod error;
mod feed;
mod report;
mod server;
mod table;

pub use error::{EdgeError, Result};
pub use server::{EdgeServer, EdgeServerConfig, TOKEN_PREFIX};
pub use table::{ConnectionTable, Delivery};
