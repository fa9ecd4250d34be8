//! Client-side view of signed session tokens.
//!
//! Tokens are JWTs issued by the guide API. The signature is never checked
//! here; the API verifies it on every request. The client only reads the
//! `exp` claim to decide whether a cached token is still worth presenting.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde_json::{Map, Value};
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq)]
pub struct TokenClaims {
    /// `exp` in Unix seconds. `None` when the payload carries no numeric expiry.
    pub expires_at: Option<i64>,
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedToken {
    pub raw: String,
    pub claims: TokenClaims,
}

/// Decodes a cached token without verifying it.
///
/// Absent, empty and malformed input all yield `None`; callers treat every one
/// of them as "no cached session".
pub fn decode(raw: Option<&str>) -> Option<DecodedToken> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }

    let mut segments = raw.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return None;
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let Value::Object(mut claims) = serde_json::from_slice::<Value>(&bytes).ok()? else {
        return None;
    };

    let expires_at = claims.remove("exp").as_ref().and_then(read_unix_seconds);

    Some(DecodedToken {
        raw: raw.to_string(),
        claims: TokenClaims {
            expires_at,
            extra: claims,
        },
    })
}

fn read_unix_seconds(value: &Value) -> Option<i64> {
    if let Some(seconds) = value.as_i64() {
        return Some(seconds);
    }
    let seconds = value.as_f64()?;
    if !seconds.is_finite() {
        return None;
    }
    Some(seconds.floor() as i64)
}

pub fn now_unix() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

/// A token expiring exactly at `now` is already invalid.
pub fn is_valid_at(decoded: Option<&DecodedToken>, now: i64) -> bool {
    decoded
        .and_then(|d| d.claims.expires_at)
        .is_some_and(|exp| exp > now)
}

pub fn is_valid(decoded: Option<&DecodedToken>) -> bool {
    is_valid_at(decoded, now_unix())
}
