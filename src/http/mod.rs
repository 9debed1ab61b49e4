//! axum server exposing the reservation engine as a REST API under `/api/v1`.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::create_router;
pub use state::AppState;
