use crate::config::Config;
use crate::upstream::ParcelApi;

/// Per-process context handed to every handler. Nothing in it changes after
/// startup; requests share no mutable state.
#[derive(Clone)]
pub struct AppState {
    pub api: ParcelApi,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            api: ParcelApi::new(&config),
        }
    }
}
