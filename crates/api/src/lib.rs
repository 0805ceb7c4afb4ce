//! Courier HTTP API
//!
//! The stateless front-end: token issuance, queue lifecycle, message
//! post/history, and the edge-node listing. Any number of these processes
//! can run side by side; they share nothing but the storage backend and
//! the broker they publish into.

pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ErrorResponse, FieldError};
pub use routes::build_router;
pub use state::AppState;
