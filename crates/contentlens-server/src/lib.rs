pub mod error;
pub mod pages;
pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;
