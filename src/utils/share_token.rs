//! Bearer tokens for shareable assignment links.
//!
//! A token is `<payload>-<nonce>` where the payload is base64 of
//! `{"id": "<assignment id>", "exp": <epoch millis>}`. Nothing about a token
//! is stored server-side apart from the last issued value on the assignment
//! row, so everything needed to identify the assignment travels in the token.

use base64::alphabet::Alphabet;
use base64::engine::general_purpose::{GeneralPurpose, NO_PAD, STANDARD};
use base64::Engine;
use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use serde::Deserialize;
use serde_json::json;

use crate::utils::time;

pub const SEPARATOR: char = '-';
pub const NONCE_LEN: usize = 6;

// URL-safe alphabet with `-` swapped for `.` so the payload never contains the separator.
const PAYLOAD_ALPHABET: Alphabet =
    match Alphabet::new("ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789._") {
        Ok(alphabet) => alphabet,
        Err(_) => panic!("share token alphabet must be 64 unique ASCII characters"),
    };

const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(&PAYLOAD_ALPHABET, NO_PAD);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedToken {
    pub assignment_id: String,
    pub expires_at_ms: i64,
    pub expired: bool,
}

impl DecodedToken {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        time::from_epoch_millis(self.expires_at_ms)
    }
}

#[derive(Deserialize)]
struct Payload {
    id: PayloadId,
    exp: i64,
}

// Older issuers wrote the numeric primary key instead of its string form.
#[derive(Deserialize)]
#[serde(untagged)]
enum PayloadId {
    Text(String),
    Number(i64),
}

impl PayloadId {
    fn into_string(self) -> String {
        match self {
            PayloadId::Text(s) => s,
            PayloadId::Number(n) => n.to_string(),
        }
    }
}

pub fn encode(assignment_id: &str, expires_at: DateTime<Utc>) -> String {
    let payload = json!({
        "id": assignment_id,
        "exp": time::to_epoch_millis(expires_at),
    });
    format!(
        "{}{}{}",
        PAYLOAD_ENGINE.encode(payload.to_string()),
        SEPARATOR,
        generate_nonce(NONCE_LEN)
    )
}

/// Decodes against the system clock. Returns `None` for anything that is not
/// a well-formed token; an expired token still decodes, with `expired` set.
pub fn decode(token: &str) -> Option<DecodedToken> {
    decode_at(token, time::now())
}

pub fn decode_at(token: &str, now: DateTime<Utc>) -> Option<DecodedToken> {
    let encoded = payload_part(token)?;
    let raw = PAYLOAD_ENGINE
        .decode(encoded)
        .or_else(|_| STANDARD.decode(encoded))
        .ok()?;
    let payload: Payload = serde_json::from_slice(&raw).ok()?;

    let assignment_id = payload.id.into_string();
    if assignment_id.trim().is_empty() {
        return None;
    }

    Some(DecodedToken {
        assignment_id,
        expires_at_ms: payload.exp,
        expired: payload.exp < time::to_epoch_millis(now),
    })
}

/// The part of a token before its first separator, if the token has one.
pub fn payload_part(token: &str) -> Option<&str> {
    match token.split_once(SEPARATOR) {
        Some((payload, _)) if !payload.is_empty() => Some(payload),
        _ => None,
    }
}

/// Reduces whatever the client sent (bare token, path, or full share URL)
/// to the bare token.
pub fn normalize(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Ok(parsed) = url::Url::parse(trimmed) {
        if let Some(segment) = parsed
            .path_segments()
            .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
        {
            return segment.to_string();
        }
    }

    let without_suffix = trimmed
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    without_suffix
        .rsplit('/')
        .find(|s| !s.is_empty())
        .unwrap_or_default()
        .to_string()
}

fn generate_nonce(length: usize) -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn round_trip_future_expiry() {
        let exp = time::now() + Duration::days(30);
        let token = encode("42", exp);
        let decoded = decode(&token).expect("token should decode");
        assert_eq!(decoded.assignment_id, "42");
        assert!(!decoded.expired);
        assert_eq!(decoded.expires_at_ms, exp.timestamp_millis());
    }

    #[test]
    fn past_expiry_decodes_as_expired() {
        let exp = time::now() - Duration::seconds(1);
        let decoded = decode(&encode("7", exp)).expect("expired tokens still decode");
        assert!(decoded.expired);
    }

    #[test]
    fn expiry_is_relative_to_supplied_clock() {
        let exp = time::now();
        let token = encode("7", exp);
        assert!(!decode_at(&token, exp - Duration::milliseconds(1)).unwrap().expired);
        assert!(!decode_at(&token, exp).unwrap().expired);
        assert!(decode_at(&token, exp + Duration::milliseconds(1)).unwrap().expired);
    }

    #[test]
    fn token_shape() {
        let token = encode("123", time::now());
        let (payload, nonce) = token.split_once(SEPARATOR).unwrap();
        assert!(!payload.contains(SEPARATOR));
        assert!(!payload.contains('/') && !payload.contains('+') && !payload.contains('='));
        assert_eq!(nonce.len(), NONCE_LEN);
        assert!(nonce.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn repeated_encodes_differ() {
        let exp = time::now() + Duration::days(1);
        let a = encode("42", exp);
        let b = encode("42", exp);
        assert_ne!(a, b);
        assert_eq!(payload_part(&a), payload_part(&b));
    }

    #[test]
    fn malformed_input_is_none() {
        assert!(decode("").is_none());
        assert!(decode("not-base64!!!").is_none());
        assert!(decode("only-one-part").is_none());
        assert!(decode("noseparator").is_none());
        assert!(decode("-abcd").is_none());
    }

    #[test]
    fn payload_missing_fields_is_none() {
        let no_exp = PAYLOAD_ENGINE.encode(r#"{"id":"5"}"#);
        assert!(decode(&format!("{no_exp}-abcd")).is_none());
        let no_id = PAYLOAD_ENGINE.encode(r#"{"exp":1}"#);
        assert!(decode(&format!("{no_id}-abcd")).is_none());
        let blank_id = PAYLOAD_ENGINE.encode(r#"{"id":" ","exp":1}"#);
        assert!(decode(&format!("{blank_id}-abcd")).is_none());
    }

    #[test]
    fn accepts_legacy_padded_payload_with_numeric_id() {
        let exp = (time::now() + Duration::days(2)).timestamp_millis();
        let legacy = STANDARD.encode(format!(r#"{{"id":9,"exp":{exp}}}"#));
        let decoded = decode(&format!("{legacy}-x1y2")).expect("legacy payload");
        assert_eq!(decoded.assignment_id, "9");
        assert!(!decoded.expired);
    }

    #[test]
    fn normalize_strips_urls_and_paths() {
        assert_eq!(normalize("  abc-1234 "), "abc-1234");
        assert_eq!(
            normalize("https://school.example/assignments/play/abc-1234?ref=wa"),
            "abc-1234"
        );
        assert_eq!(normalize("/assignments/play/abc-1234/"), "abc-1234");
        assert_eq!(normalize("abc-1234#top"), "abc-1234");
        assert_eq!(normalize(""), "");
    }
}
