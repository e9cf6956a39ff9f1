//! Gompa HTTP surface: health, chat and feedback endpoints.

pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;
