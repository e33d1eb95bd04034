//! HTTP + WebSocket 接入层

pub mod error;
pub mod routes;
pub mod state;
pub mod ws;

pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
