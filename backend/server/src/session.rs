//! # Sessions
//!
//! Per-browser key/value state for the wizard, kept client-side.
//!
//! ## Cookie
//! - `hex(json(map)).hex(hmac_sha256(secret, hex(json(map))))`
//! - HttpOnly, SameSite=Lax, Path=/
//! - Anything that fails to verify or decode is treated as an empty session
//!
//! Every tab of the same browser shares the one cookie.
use std::collections::BTreeMap;

use axum::http::{HeaderMap, HeaderValue, header::InvalidHeaderValue};
use thiserror::Error;
use tracing::debug;

use crate::utils::{cookie_value, sign, verify_hex};

pub const SESSION_COOKIE: &str = "recipe_session";

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Session cookie is not a valid header: {0}")]
    Header(#[from] InvalidHeaderValue),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    values: BTreeMap<String, String>,
}

impl Session {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Clone)]
pub struct SessionStore {
    key: Vec<u8>,
}

impl SessionStore {
    pub fn new(secret: &str) -> Self {
        Self {
            key: secret.as_bytes().to_vec(),
        }
    }

    pub fn load(&self, headers: &HeaderMap) -> Session {
        let Some(cookie) = cookie_value(headers, SESSION_COOKIE) else {
            return Session::default();
        };

        self.decode(cookie).unwrap_or_else(|| {
            debug!("Discarding unverifiable session cookie");
            Session::default()
        })
    }

    /// `Set-Cookie` value carrying the session; an empty session expires the cookie.
    pub fn save(&self, session: &Session) -> Result<HeaderValue, SessionError> {
        if session.is_empty() {
            return Ok(HeaderValue::from_str(&format!(
                "{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"
            ))?);
        }

        let payload = hex::encode(serde_json::to_vec(&session.values)?);
        let signature = hex::encode(sign(&self.key, payload.as_bytes()));

        Ok(HeaderValue::from_str(&format!(
            "{SESSION_COOKIE}={payload}.{signature}; Path=/; HttpOnly; SameSite=Lax"
        ))?)
    }

    fn decode(&self, cookie: &str) -> Option<Session> {
        let (payload, signature) = cookie.split_once('.')?;

        if !verify_hex(&self.key, payload.as_bytes(), signature) {
            return None;
        }

        let json = hex::decode(payload).ok()?;
        let values = serde_json::from_slice(&json).ok()?;

        Some(Session { values })
    }
}

#[cfg(test)]
mod tests {
    use axum::http::header::COOKIE;

    use super::*;

    fn request_headers(set_cookie: &HeaderValue) -> HeaderMap {
        let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(pair).unwrap());
        headers
    }

    #[test]
    fn test_saved_session_loads_back() {
        let store = SessionStore::new("secret");
        let mut session = Session::default();
        session.insert("base", "oat");
        session.insert("name", "Morning; \"Glory\"");

        let cookie = store.save(&session).unwrap();
        assert_eq!(store.load(&request_headers(&cookie)), session);
    }

    #[test]
    fn test_foreign_key_is_rejected() {
        let mut session = Session::default();
        session.insert("base", "oat");

        let cookie = SessionStore::new("secret").save(&session).unwrap();
        let loaded = SessionStore::new("different").load(&request_headers(&cookie));

        assert!(loaded.is_empty());
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let store = SessionStore::new("secret");
        let mut session = Session::default();
        session.insert("base", "oat");

        let cookie = store.save(&session).unwrap();
        let (payload, signature) = cookie
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .split_once('=')
            .unwrap()
            .1
            .split_once('.')
            .unwrap();

        let forged_payload = hex::encode(br#"{"base":"soy"}"#);
        assert_ne!(forged_payload, payload);

        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("{SESSION_COOKIE}={forged_payload}.{signature}"))
                .unwrap(),
        );

        assert!(store.load(&headers).is_empty());
    }

    #[test]
    fn test_cleared_session_expires_cookie() {
        let store = SessionStore::new("secret");
        let cookie = store.save(&Session::default()).unwrap();

        assert!(cookie.to_str().unwrap().contains("Max-Age=0"));
    }
}
