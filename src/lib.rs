pub mod app;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod delivery;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod normalize;
pub mod search;
pub mod session;
pub mod state;
pub mod upstream;
pub mod view;

pub use app::router;
pub use config::Config;
pub use state::AppState;
