//! Session token payloads
//!
//! Tokens are `header.payload.signature` strings. Only the payload segment is
//! read on the client; the signature is the server's business.

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Claims carried in the middle segment of a session token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPayload {
    /// Subject (the logged-in identifier)
    #[serde(default)]
    pub sub: Option<String>,
    /// Expiry, seconds since epoch
    #[serde(default)]
    pub exp: Option<i64>,
    /// Anything else the server put in the payload
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl TokenPayload {
    /// A payload without `exp` never counts as live.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.exp {
            Some(exp) => exp <= now.timestamp(),
            None => true,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Decode the payload segment of a token.
///
/// The second dot-separated segment is read whatever the segment count.
/// Returns `None` when it is missing or is not a base64 JSON object.
pub fn decode(token: &str) -> Option<TokenPayload> {
    let payload = token.split('.').nth(1)?;
    let bytes = decode_segment(payload)?;
    serde_json::from_slice(&bytes).ok()
}

/// Servers disagree on the alphabet and padding, so try them all.
fn decode_segment(segment: &str) -> Option<Vec<u8>> {
    if segment.is_empty() {
        return None;
    }

    [URL_SAFE_NO_PAD, URL_SAFE, STANDARD_NO_PAD, STANDARD]
        .iter()
        .find_map(|engine| engine.decode(segment).ok())
}

/// True when the token is absent, malformed or past its expiry.
pub fn is_token_expired(payload: Option<&TokenPayload>) -> bool {
    payload.map(TokenPayload::is_expired).unwrap_or(true)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Build an unsigned token with the given claims
    pub fn token_with(sub: &str, exp: i64) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let claims = serde_json::json!({ "sub": sub, "exp": exp });
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string().as_bytes());
        format!("{}.{}.signature", header, payload)
    }

    pub fn live_token(sub: &str) -> String {
        token_with(sub, Utc::now().timestamp() + 3600)
    }

    pub fn expired_token(sub: &str) -> String {
        token_with(sub, Utc::now().timestamp() - 3600)
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn test_decode_valid_token() {
        let token = token_with("ana", 2_000_000_000);
        let payload = decode(&token).unwrap();
        assert_eq!(payload.sub.as_deref(), Some("ana"));
        assert_eq!(payload.exp, Some(2_000_000_000));
    }

    #[test]
    fn test_decode_standard_alphabet_with_padding() {
        let payload = STANDARD.encode(br#"{"sub":"luis","exp":1,"role":"admin"}"#);
        let token = format!("h.{}.s", payload);
        let decoded = decode(&token).unwrap();
        assert_eq!(decoded.sub.as_deref(), Some("luis"));
        assert_eq!(decoded.extra.get("role"), Some(&serde_json::json!("admin")));
    }

    #[test]
    fn test_decode_reads_second_segment_of_any_length_token() {
        let payload = URL_SAFE_NO_PAD.encode(br#"{"sub":"ana","exp":5}"#);

        let short = decode(&format!("h.{}", payload)).unwrap();
        assert_eq!(short.sub.as_deref(), Some("ana"));

        let long = decode(&format!("h.{}.s.extra", payload)).unwrap();
        assert_eq!(long.exp, Some(5));
    }

    #[test]
    fn test_decode_malformed_returns_none() {
        assert!(decode("").is_none());
        assert!(decode("a.b.c").is_none());
        assert!(decode("only-one-part").is_none());
        assert!(decode("a..c").is_none());
        assert!(decode("a.b.c.d").is_none());
        assert!(decode("h.").is_none());

        let not_json = URL_SAFE_NO_PAD.encode(b"not json");
        assert!(decode(&format!("h.{}.s", not_json)).is_none());
    }

    #[test]
    fn test_expiry_is_strict() {
        let now = Utc::now();
        let at_now = TokenPayload {
            sub: None,
            exp: Some(now.timestamp()),
            extra: HashMap::new(),
        };
        assert!(at_now.is_expired_at(now));

        let later = TokenPayload {
            exp: Some(now.timestamp() + 1),
            ..at_now.clone()
        };
        assert!(!later.is_expired_at(now));
    }

    #[test]
    fn test_past_expiry_wins_over_other_claims() {
        let payload = decode(&expired_token("admin")).unwrap();
        assert!(payload.is_expired());
        assert!(is_token_expired(Some(&payload)));
    }

    #[test]
    fn test_missing_exp_or_payload_is_expired() {
        let payload = TokenPayload {
            sub: Some("ana".into()),
            exp: None,
            extra: HashMap::new(),
        };
        assert!(payload.is_expired());
        assert!(is_token_expired(None));
        assert!(!is_token_expired(decode(&live_token("ana")).as_ref()));
    }
}
