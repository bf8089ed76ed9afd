pub mod actions;
pub mod aggregate;
pub mod api;
pub mod app;
pub mod config;
pub mod dashboard;
pub mod errors;
pub mod form;
pub mod handlers;
pub mod login;
pub mod mock;
pub mod models;
pub mod session;
pub mod state;
pub mod ui;

pub use app::router;
pub use config::{Backend, Config};
pub use session::SessionStore;
pub use state::AppState;
