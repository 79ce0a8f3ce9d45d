use std::sync::Arc;

use dtq_core::{AuthConfig, Coordinator};

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<Coordinator>,
    pub auth: Arc<AuthConfig>,
}
