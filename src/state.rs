use std::sync::Arc;

use crate::auth::AuthService;
use crate::cache::CachedRepository;
use crate::config::Settings;

/// Shared application state, built once in `main` and injected into the
/// router. Settings are read-only after startup, so everything here is
/// safe to share across concurrent requests.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub auth: Arc<AuthService>,
    pub data: Arc<CachedRepository>,
}
