//! Static frontend assets.

use std::path::Path;

use axum::Router;
use tower_http::services::ServeDir;
use tracing::{info, warn};

use crate::server::GatewayState;

/// Serve files from `dir` for any path no API route claims. Without the
/// directory the router is returned unchanged.
pub fn with_static_assets(router: Router<GatewayState>, dir: &Path) -> Router<GatewayState> {
    if dir.is_dir() {
        info!(dir = %dir.display(), "Serving static frontend");
        router.fallback_service(ServeDir::new(dir))
    } else {
        warn!(dir = %dir.display(), "Static directory not found; frontend disabled");
        router
    }
}
