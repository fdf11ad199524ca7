//! Signed session cookie.
//!
//! The cookie carries `<session id>.<hex HMAC-SHA256 of the id>`. Cookies
//! with a bad signature are ignored, so a forged id never reaches the
//! session store.

use std::convert::Infallible;
use std::time::Duration;

use anyhow::{Result, anyhow};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{HeaderMap, header::COOKIE, request::Parts},
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

use crate::server::GatewayState;
use crate::session_registry::SessionId;

pub const COOKIE_NAME: &str = "docverify.sid";

type HmacSha256 = Hmac<Sha256>;

/// Signs and verifies session cookies with the configured secret.
#[derive(Clone)]
pub struct CookieSigner {
    mac: HmacSha256,
    max_age: Duration,
}

impl CookieSigner {
    pub fn new(secret: &str, max_age: Duration) -> Result<Self> {
        let mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| anyhow!("invalid session secret: {e}"))?;
        Ok(Self { mac, max_age })
    }

    /// A fresh random session id.
    pub fn new_session_id() -> SessionId {
        uuid::Uuid::new_v4().to_string()
    }

    fn signature(&self, session_id: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(session_id.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Cookie value for a session id.
    pub fn sign(&self, session_id: &str) -> String {
        format!("{}.{}", session_id, self.signature(session_id))
    }

    /// Session id from a cookie value, if the signature checks out.
    pub fn verify(&self, value: &str) -> Option<SessionId> {
        let (session_id, sig) = value.rsplit_once('.')?;
        uuid::Uuid::parse_str(session_id).ok()?;
        let sig = hex::decode(sig).ok()?;
        let mut mac = self.mac.clone();
        mac.update(session_id.as_bytes());
        mac.verify_slice(&sig).ok()?;
        Some(session_id.to_string())
    }

    /// `Set-Cookie` value establishing the session.
    pub fn set_cookie(&self, session_id: &str) -> String {
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            COOKIE_NAME,
            self.sign(session_id),
            self.max_age.as_secs()
        )
    }

    /// `Set-Cookie` value removing the session cookie.
    pub fn clear_cookie(&self) -> String {
        format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", COOKIE_NAME)
    }

    /// Verified session id from the request's `Cookie` headers.
    pub fn session_from_headers(&self, headers: &HeaderMap) -> Option<SessionId> {
        let raw = headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == COOKIE_NAME)
            .map(|(_, value)| value)?;

        let verified = self.verify(raw);
        if verified.is_none() {
            warn!("Ignoring session cookie with invalid signature");
        }
        verified
    }
}

/// The caller's verified session id, if any.
pub struct SessionCookie(pub Option<SessionId>);

#[async_trait]
impl FromRequestParts<GatewayState> for SessionCookie {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &GatewayState,
    ) -> Result<Self, Self::Rejection> {
        Ok(SessionCookie(state.cookies.session_from_headers(&parts.headers)))
    }
}
