// * Session Identity
// * Per-run browser-equivalent identity material: cookies, user agent, the
// * per-run session nonce, and the process-stable device identifier.

use std::collections::HashMap;
use std::sync::LazyLock;

use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue};

use crate::network::errors::NetworkError;
use crate::config::constants::{MS_TOKEN_ALPHABET, MS_TOKEN_LENGTH, WEB_ID_DIGITS};

// * The device identifier a browser would persist in localStorage. Minted
// * once per process so every request in every run reports the same device.
static WEB_ID: LazyLock<String> = LazyLock::new(|| {
    let mut rng = rand::thread_rng();
    let mut id = String::with_capacity(WEB_ID_DIGITS);
    // * Leading digit must be non-zero to keep the identifier width fixed
    id.push(char::from(b'1' + rng.gen_range(0..9u8)));
    for _ in 1..WEB_ID_DIGITS {
        id.push(char::from(b'0' + rng.gen_range(0..10u8)));
    }
    id
});

// * Returns the process-stable web id
pub fn web_id() -> &'static str {
    &WEB_ID
}

// * Generates a session nonce of the given length from the declared
// * alphabet. The browser mints this client-side; the browserless path
// * generates a fresh one per run.
pub fn generate_ms_token(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(MS_TOKEN_ALPHABET[rng.gen_range(0..MS_TOKEN_ALPHABET.len())]))
        .collect()
}

// * Parses a raw Cookie header value into a key/value map. Values may
// * themselves contain '=' so only the first one splits.
pub fn parse_cookie_string(cookie_string: &str) -> HashMap<String, String> {
    cookie_string
        .split(';')
        .filter_map(|pair| {
            let pair = pair.trim();
            if pair.is_empty() {
                return None;
            }
            let (key, value) = pair.split_once('=')?;
            Some((key.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

// * Immutable per-run session identity. Built once at crawler construction
// * and never persisted beyond the run.
#[derive(Debug, Clone)]
pub struct SessionIdentity {
    pub cookie_string: String,
    pub cookie_map: HashMap<String, String>,
    pub user_agent: String,
    pub ms_token: String,
}

impl SessionIdentity {
    pub fn new(cookie_string: String, user_agent: String) -> Self {
        let cookie_map = parse_cookie_string(&cookie_string);
        Self {
            cookie_string,
            cookie_map,
            user_agent,
            ms_token: generate_ms_token(MS_TOKEN_LENGTH),
        }
    }

    // * The default header set the platform's web client sends
    pub fn default_headers(&self) -> Result<HeaderMap, NetworkError> {
        let mut headers = HeaderMap::new();
        let entries = [
            ("User-Agent", self.user_agent.as_str()),
            ("Cookie", self.cookie_string.as_str()),
            ("Host", "www.douyin.com"),
            ("Origin", "https://www.douyin.com/"),
            ("Referer", "https://www.douyin.com/"),
            ("Content-Type", "application/json;charset=UTF-8"),
        ];
        for (name, value) in entries {
            let value = HeaderValue::from_str(value)
                .map_err(|_| NetworkError::InvalidHeader(name.to_string()))?;
            headers.insert(name, value);
        }
        Ok(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ms_token_length_and_alphabet() {
        let token = generate_ms_token(107);
        assert_eq!(token.len(), 107);
        assert!(token
            .bytes()
            .all(|b| MS_TOKEN_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_ms_token_is_not_deterministic() {
        // * Non-determinism check: two draws of 107 chars colliding would
        // * require astronomically bad luck
        assert_ne!(generate_ms_token(107), generate_ms_token(107));
    }

    #[test]
    fn test_web_id_is_stable_and_numeric() {
        let first = web_id();
        let second = web_id();
        assert_eq!(first, second);
        assert_eq!(first.len(), WEB_ID_DIGITS);
        assert!(first.bytes().all(|b| b.is_ascii_digit()));
        assert_ne!(first.as_bytes()[0], b'0');
    }

    #[test]
    fn test_parse_cookie_string() {
        let map = parse_cookie_string("sessionid=abc123; ttwid=1%7Cx=y; passport_csrf=z");
        assert_eq!(map.get("sessionid").unwrap(), "abc123");
        // * Only the first '=' splits
        assert_eq!(map.get("ttwid").unwrap(), "1%7Cx=y");
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_parse_cookie_string_skips_malformed_pairs() {
        let map = parse_cookie_string("valid=1; ; malformed; other=2");
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_default_headers_carry_session_material() {
        let identity = SessionIdentity::new(
            "sessionid=abc".to_string(),
            "TestAgent/1.0".to_string(),
        );
        let headers = identity.default_headers().unwrap();
        assert_eq!(headers.get("User-Agent").unwrap(), "TestAgent/1.0");
        assert_eq!(headers.get("Cookie").unwrap(), "sessionid=abc");
        assert_eq!(headers.get("Host").unwrap(), "www.douyin.com");
    }
}
