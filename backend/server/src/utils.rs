use axum::http::{HeaderMap, header::COOKIE};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub fn sign(key: &[u8], message: &[u8]) -> Vec<u8> {
    // HMAC accepts keys of any length
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC key of any size");
    mac.update(message);

    mac.finalize().into_bytes().to_vec()
}

/// Constant-time check of `signature` against the HMAC of `message`.
pub fn verify(key: &[u8], message: &[u8], signature: &[u8]) -> bool {
    let Ok(mut mac) = HmacSha256::new_from_slice(key) else {
        return false;
    };
    mac.update(message);

    mac.verify_slice(signature).is_ok()
}

pub fn verify_hex(key: &[u8], message: &[u8], signature_hex: &str) -> bool {
    hex::decode(signature_hex)
        .map(|signature| verify(key, message, &signature))
        .unwrap_or(false)
}

pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}
