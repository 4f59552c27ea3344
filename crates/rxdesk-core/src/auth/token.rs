//! Local, unverified inspection of JWT-shaped bearer tokens.
//!
//! Nothing here checks a signature. These helpers only stop the client from
//! presenting a token it already knows is stale; the server stays the
//! authority on whether a token is genuine.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// Claims carried in a token's payload segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Claims(Map<String, Value>);

impl Claims {
    /// Expiry in seconds since the epoch, if present and numeric.
    pub fn exp(&self) -> Option<f64> {
        self.0.get("exp").and_then(Value::as_f64)
    }

    pub fn subject(&self) -> Option<&str> {
        self.0.get("sub").and_then(Value::as_str)
    }

    /// Expiry as a timestamp, for display.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let exp = self.exp()?;
        DateTime::from_timestamp_millis((exp * 1000.0) as i64)
    }
}

/// Decode the payload (middle segment) of a token.
///
/// Returns `None` when the token has no payload segment, the segment is not
/// base64url, the bytes are not UTF-8, or the JSON is not an object.
pub fn decode_token(token: &str) -> Option<Claims> {
    let payload = token.split('.').nth(1)?;

    // Tolerate padding and the standard alphabet as well as base64url
    let normalized: String = payload
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    let bytes = URL_SAFE_NO_PAD.decode(normalized).ok()?;
    let text = String::from_utf8(bytes).ok()?;
    match serde_json::from_str::<Value>(&text).ok()? {
        Value::Object(map) => Some(Claims(map)),
        _ => None,
    }
}

/// Whether `token` should be treated as expired right now.
pub fn is_token_expired(token: &str) -> bool {
    is_token_expired_at(token, Utc::now())
}

/// Whether `token` should be treated as expired at `now`.
///
/// Fails closed: an undecodable token, a missing or non-numeric `exp`, or an
/// `exp` of zero all count as expired.
pub fn is_token_expired_at(token: &str, now: DateTime<Utc>) -> bool {
    let Some(exp) = decode_token(token).and_then(|claims| claims.exp()) else {
        return true;
    };
    if exp == 0.0 {
        return true;
    }

    let now_secs = now.timestamp_millis() as f64 / 1000.0;
    exp < now_secs
}

/// Build an unsigned JWT-shaped token from a claims object.
///
/// Used by the simulated auth provider so its tokens pass the expiry check.
pub fn encode_unsigned(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{}.{}.unsigned", header, payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn token_with(claims: Value) -> String {
        encode_unsigned(&claims)
    }

    #[test]
    fn test_zero_exp_is_expired() {
        // payload is {"exp":0}
        assert!(is_token_expired("aaa.eyJleHAiOjB9.ccc"));
        let claims = decode_token("aaa.eyJleHAiOjB9.ccc").unwrap();
        assert_eq!(claims.exp(), Some(0.0));
    }

    #[test]
    fn test_past_exp_is_expired() {
        let now = Utc::now();
        let token = token_with(json!({ "exp": (now - Duration::seconds(1)).timestamp() }));
        assert!(is_token_expired_at(&token, now));

        let long_ago = token_with(json!({ "exp": 1_000_000 }));
        assert!(is_token_expired(&long_ago));
    }

    #[test]
    fn test_future_exp_is_not_expired() {
        let now = Utc::now();
        let token = token_with(json!({ "exp": (now + Duration::hours(1)).timestamp() }));
        assert!(!is_token_expired_at(&token, now));
        assert!(!is_token_expired(&token));
    }

    #[test]
    fn test_fractional_exp_compares_precisely() {
        let now = DateTime::from_timestamp(1_700_000_000, 500_000_000).unwrap();
        let before = token_with(json!({ "exp": 1_700_000_000.25 }));
        let after = token_with(json!({ "exp": 1_700_000_000.75 }));
        assert!(is_token_expired_at(&before, now));
        assert!(!is_token_expired_at(&after, now));
    }

    #[test]
    fn test_missing_or_non_numeric_exp_fails_closed() {
        let now = Utc::now();
        assert!(is_token_expired_at(&token_with(json!({ "sub": "a@b.c" })), now));
        assert!(is_token_expired_at(&token_with(json!({ "exp": "4102444800" })), now));
        assert!(is_token_expired_at(&token_with(json!({ "exp": null })), now));
    }

    #[test]
    fn test_undecodable_tokens_fail_closed() {
        assert!(is_token_expired(""));
        assert!(is_token_expired("mock_jwt_token_1700000000000"));
        assert!(is_token_expired("a.!!!.c"));
        // "bnVsbA" is `null`, not an object
        assert!(is_token_expired("a.bnVsbA.c"));
        // "NQ" is the bare number 5
        assert!(decode_token("a.NQ.c").is_none());
        // invalid UTF-8 (0xff 0xfe)
        assert!(is_token_expired("a.__4.c"));
    }

    #[test]
    fn test_decode_accepts_padding_and_standard_alphabet() {
        // {"exp":0} padded
        assert!(decode_token("a.eyJleHAiOjB9=.c").is_some());
        // the payload below encodes to "..._Pz8-Pj4..." so both alphabets differ
        let url = URL_SAFE_NO_PAD.encode(r#"{"sub":"???>>>"}"#);
        let std_form = url.replace('-', "+").replace('_', "/");
        let claims = decode_token(&format!("h.{}.s", std_form)).unwrap();
        assert_eq!(claims.subject(), Some("???>>>"));
    }

    #[test]
    fn test_expires_at() {
        let claims = decode_token(&token_with(json!({ "exp": 1_700_000_000 }))).unwrap();
        assert_eq!(
            claims.expires_at(),
            DateTime::from_timestamp(1_700_000_000, 0)
        );
    }
}
