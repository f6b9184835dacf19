//! Shared application state.

use std::sync::Arc;

use storyhall_session::application::router::ConnectionRouter;

use crate::qr::QrRenderer;

/// Application state shared across all request handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Protocol router owning sessions, memory and connections.
    pub router: Arc<ConnectionRouter>,
    /// Join-link QR renderer.
    pub qr: Arc<dyn QrRenderer>,
    /// Base for join URLs; the request `Host` header is used when unset.
    pub public_base_url: Option<String>,
    /// Base for join URLs when neither of the above is available.
    pub local_base_url: String,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        router: Arc<ConnectionRouter>,
        qr: Arc<dyn QrRenderer>,
        public_base_url: Option<String>,
        local_base_url: String,
    ) -> Self {
        Self {
            router,
            qr,
            public_base_url,
            local_base_url,
        }
    }
}
