//! Cookie-backed sessions.
//!
//! The whole session lives in one cookie: JSON, base64url-encoded, signed with
//! the server key. A cookie that fails verification or decoding yields an empty
//! session. Permanent sessions carry `expires_at` inside the signed payload so a
//! client holding on to an old cookie past its lifetime gets nothing back.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::{IntoResponseParts, ResponseParts};
use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};
use base64::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SessionConfig;
use crate::flash::{FlashMessage, FlashQueue};

use super::state::AppState;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct SessionPayload {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    values: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "FlashQueue::is_empty")]
    flashes: FlashQueue,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    permanent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<u64>,
}

impl SessionPayload {
    fn is_empty(&self) -> bool {
        self.values.is_empty() && self.flashes.is_empty()
    }

    fn is_expired(&self, now: u64) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

/// Request-scoped session. Extract it in a handler, mutate it, and return it
/// alongside the response so the cookie gets rewritten.
pub struct Session {
    jar: SignedCookieJar,
    config: Arc<SessionConfig>,
    payload: SessionPayload,
    modified: bool,
}

impl Session {
    pub fn from_jar(jar: SignedCookieJar, config: Arc<SessionConfig>) -> Self {
        let payload = jar
            .get(&config.cookie_name)
            .and_then(|cookie| decode_payload(cookie.value()))
            .filter(|payload| {
                let expired = payload.is_expired(unix_now());
                if expired {
                    debug!("session cookie expired");
                }
                !expired
            })
            .unwrap_or_default();

        Self {
            jar,
            config,
            payload,
            modified: false,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.payload.values.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.payload.values.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.payload.values.insert(key.into(), value.into());
        self.modified = true;
    }

    /// Removing a key that is not set is a no-op.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let removed = self.payload.values.remove(key);
        if removed.is_some() {
            self.modified = true;
        }
        removed
    }

    pub fn clear(&mut self) {
        if !self.payload.is_empty() {
            self.payload = SessionPayload::default();
            self.modified = true;
        }
    }

    pub fn set_permanent(&mut self, permanent: bool) {
        if self.payload.permanent != permanent {
            self.payload.permanent = permanent;
            self.modified = true;
        }
    }

    pub fn is_permanent(&self) -> bool {
        self.payload.permanent
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    pub fn flash(&mut self, category: impl Into<String>, message: impl Into<String>) {
        self.payload.flashes.push(category, message);
        self.modified = true;
    }

    pub fn take_flashes(&mut self) -> Vec<FlashMessage> {
        if self.payload.flashes.is_empty() {
            return Vec::new();
        }
        self.modified = true;
        self.payload.flashes.drain()
    }

    /// Writes the session back into the jar. Unmodified sessions leave the jar alone.
    pub fn into_jar(self) -> SignedCookieJar {
        if !self.modified {
            return self.jar;
        }

        let name = self.config.cookie_name.clone();
        if self.is_empty() {
            debug!("session emptied; removing cookie");
            return self
                .jar
                .remove(Cookie::build((name, "")).path("/").build());
        }

        let lifetime = self
            .is_permanent()
            .then_some(self.config.permanent_lifetime);
        let mut payload = self.payload;
        payload.expires_at = lifetime.map(|lifetime| unix_now().saturating_add(lifetime.as_secs()));

        let Some(value) = encode_payload(&payload) else {
            return self.jar;
        };

        let mut cookie = Cookie::build((name, value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.config.secure_cookies)
            .build();
        if let Some(lifetime) = lifetime {
            cookie.set_max_age(max_age(lifetime));
        }

        self.jar.add(cookie)
    }
}

impl FromRequestParts<AppState> for Session {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = SignedCookieJar::from_headers(&parts.headers, state.cookie_key.clone());
        Ok(Session::from_jar(jar, Arc::clone(&state.session)))
    }
}

impl IntoResponseParts for Session {
    type Error = Infallible;

    fn into_response_parts(self, res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        self.into_jar().into_response_parts(res)
    }
}

fn encode_payload(payload: &SessionPayload) -> Option<String> {
    match serde_json::to_vec(payload) {
        Ok(raw) => Some(BASE64_URL_SAFE_NO_PAD.encode(raw)),
        Err(error) => {
            debug!(error = %error, "failed to encode session");
            None
        }
    }
}

fn decode_payload(value: &str) -> Option<SessionPayload> {
    let raw = BASE64_URL_SAFE_NO_PAD.decode(value).ok()?;
    match serde_json::from_slice(&raw) {
        Ok(payload) => Some(payload),
        Err(error) => {
            debug!(error = %error, "discarding undecodable session cookie");
            None
        }
    }
}

fn max_age(lifetime: Duration) -> cookie::time::Duration {
    let secs = i64::try_from(lifetime.as_secs()).unwrap_or(i64::MAX);
    cookie::time::Duration::seconds(secs)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}
