pub mod app;
pub mod auth;
pub mod categories;
pub mod clock;
pub mod config;
pub mod dates;
pub mod db;
pub mod error;
pub mod kind;
pub mod memory;
pub mod state;
pub mod transactions;

pub use app::{build_app, serve};
pub use error::{AppError, AppResult};
pub use state::AppState;
