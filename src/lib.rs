pub mod api;
pub mod backend;
pub mod config;
pub mod dashboard;
pub mod errors;
pub mod models;
pub mod poller;
pub mod reconciler;
pub mod refresher;
pub mod session_store;
pub mod webapp_client;

pub use api::AppState;
pub use backend::WebAppBackend;
pub use config::Config;
pub use dashboard::Dashboard;
pub use errors::ApiError;
pub use models::*;
pub use webapp_client::*;
