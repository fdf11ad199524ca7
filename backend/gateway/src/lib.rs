//! docverify HTTP gateway
//!
//! Serves the document upload, session, and handwritten-validation API,
//! plus the static browser frontend.

pub mod control_ui;
pub mod error;
pub mod handlers;
pub mod health_api;
pub mod server;
pub mod session_cookie;
pub mod session_registry;

pub use server::{GatewayOptions, GatewayState, build_router, start_server};
pub use session_cookie::{CookieSigner, SessionCookie};
pub use session_registry::SessionStore;
