// * Session Parameter Builder
// * Merges the constant fingerprint environment and per-session identity
// * into an outgoing request's parameter map, then signs the result unless
// * the endpoint is exempt. All effects are in-place mutation.

use std::collections::BTreeMap;

use crate::config::constants::{is_signature_exempt, FINGERPRINT_PARAMS};
use crate::network::errors::NetworkError;
use crate::network::identity::{web_id, SessionIdentity};
use crate::network::signer::Signer;
use crate::ops::telemetry;

// * Builds the full browser-equivalent parameter set for one request.
// *
// * An empty map is left untouched: parameterless GETs are never
// * fingerprinted or signed. Caller-supplied keys that collide with the
// * fingerprint set or identity fields are overwritten. The canonical query
// * string is the merged map (without `a_bogus`) in map iteration order.
pub async fn build_session_params(
    identity: &SessionIdentity,
    signer: &dyn Signer,
    uri: &str,
    params: &mut BTreeMap<String, String>,
) -> Result<(), NetworkError> {
    if params.is_empty() {
        return Ok(());
    }

    for (key, value) in FINGERPRINT_PARAMS {
        params.insert((*key).to_string(), (*value).to_string());
    }
    params.insert("webid".to_string(), web_id().to_string());
    params.insert("msToken".to_string(), identity.ms_token.clone());

    let query = serde_urlencoded::to_string(&*params)?;

    if !is_signature_exempt(uri) {
        let token = signer.sign(uri, &query, &identity.user_agent).await?;
        telemetry::record_signature_computed();
        params.insert("a_bogus".to_string(), token);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::config::constants::{AWEME_DETAIL_URI, GENERAL_SEARCH_URI};
    use crate::network::signer::SignatureError;

    // * Records every invocation and echoes its inputs back as the token
    struct EchoSigner {
        calls: AtomicUsize,
    }

    impl EchoSigner {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Signer for EchoSigner {
        async fn sign(
            &self,
            uri: &str,
            query: &str,
            user_agent: &str,
        ) -> Result<String, SignatureError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("sig:{}:{}:{}", uri, query.len(), user_agent))
        }
    }

    fn identity() -> SessionIdentity {
        SessionIdentity::new("sessionid=abc".to_string(), "TestAgent/1.0".to_string())
    }

    #[tokio::test]
    async fn test_merges_fingerprint_set_and_identity_fields() {
        let identity = identity();
        let signer = EchoSigner::new();
        let mut params = BTreeMap::from([("aweme_id".to_string(), "123".to_string())]);

        build_session_params(&identity, &signer, AWEME_DETAIL_URI, &mut params)
            .await
            .unwrap();

        for (key, value) in FINGERPRINT_PARAMS {
            assert_eq!(params.get(*key).map(String::as_str), Some(*value));
        }
        assert_eq!(params.get("webid").unwrap(), web_id());
        assert_eq!(params.get("msToken").unwrap(), &identity.ms_token);
        assert_eq!(params.get("aweme_id").unwrap(), "123");
    }

    #[tokio::test]
    async fn test_signs_non_exempt_uris_with_exact_token() {
        let identity = identity();
        let signer = EchoSigner::new();
        let mut params = BTreeMap::from([("aweme_id".to_string(), "123".to_string())]);

        build_session_params(&identity, &signer, AWEME_DETAIL_URI, &mut params)
            .await
            .unwrap();

        // * Recompute the canonical query the builder must have signed:
        // * the merged map without a_bogus
        let mut signed = params.clone();
        signed.remove("a_bogus");
        let query = serde_urlencoded::to_string(&signed).unwrap();
        let expected = format!("sig:{}:{}:TestAgent/1.0", AWEME_DETAIL_URI, query.len());
        assert_eq!(params.get("a_bogus").unwrap(), &expected);
        assert_eq!(signer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exempt_uri_gets_no_signature() {
        let identity = identity();
        let signer = EchoSigner::new();
        let mut params = BTreeMap::from([("keyword".to_string(), "rust".to_string())]);

        build_session_params(&identity, &signer, GENERAL_SEARCH_URI, &mut params)
            .await
            .unwrap();

        assert!(!params.contains_key("a_bogus"));
        assert_eq!(signer.calls.load(Ordering::SeqCst), 0);
        // * Fingerprinting still applies to exempt endpoints
        assert!(params.contains_key("device_platform"));
        assert!(params.contains_key("msToken"));
    }

    #[tokio::test]
    async fn test_empty_params_is_a_no_op_twice() {
        let identity = identity();
        let signer = EchoSigner::new();
        let mut params: BTreeMap<String, String> = BTreeMap::new();

        build_session_params(&identity, &signer, AWEME_DETAIL_URI, &mut params)
            .await
            .unwrap();
        assert!(params.is_empty());

        // * Idempotent and restartable on empty input
        build_session_params(&identity, &signer, AWEME_DETAIL_URI, &mut params)
            .await
            .unwrap();
        assert!(params.is_empty());
        assert_eq!(signer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_caller_keys_are_overwritten_by_fingerprint_set() {
        let identity = identity();
        let signer = EchoSigner::new();
        let mut params = BTreeMap::from([
            ("aweme_id".to_string(), "123".to_string()),
            ("browser_name".to_string(), "Firefox".to_string()),
        ]);

        build_session_params(&identity, &signer, AWEME_DETAIL_URI, &mut params)
            .await
            .unwrap();

        assert_eq!(params.get("browser_name").unwrap(), "Chrome");
    }
}
