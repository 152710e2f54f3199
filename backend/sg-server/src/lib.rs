pub mod api;
pub mod app;
pub mod error;
pub mod health;
pub mod logger;
pub mod routes;
pub mod store;

#[cfg(test)]
mod tests;

pub use api::error::{ApiError, Result as ApiResult};
pub use app::build_state;
pub use error::{Result, ServerError};
pub use routes::build_router;
pub use store::open_store;
