// * Browserless Platform Client
// * Satisfies the request-signing and session-liveness contract of the
// * platform client without a live browser handle. Session material comes
// * from static configuration; the signing hook is an injected strategy.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::constants::{
    API_HOST, AWEME_DETAIL_URI, COMMENT_LIST_URI, GENERAL_SEARCH_URI, REQUESTS_PER_SECOND,
    USER_POST_URI,
};
use crate::network::errors::NetworkError;
use crate::network::identity::{parse_cookie_string, SessionIdentity};
use crate::network::pacing::RequestPacer;
use crate::network::params::build_session_params;
use crate::network::proxy::ProxyPool;
use crate::network::signer::Signer;
use crate::ops::telemetry;

// * Interstitial pages served instead of JSON when the session is flagged
static VERIFY_PAGE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(verify|captcha|security-check|validate)").expect("static regex")
});

// * Handle to a live browser page. Only the browser-backed client variant
// * ever holds one; the browserless client keeps the field at None for
// * interface parity with that variant.
#[derive(Debug)]
pub struct BrowserPage;

// * Session-liveness contract shared by the browser-backed and browserless
// * client variants. The variant is selected by the crawler factory.
#[async_trait]
pub trait PlatformSession: Send + Sync {
    // * Asserts the current session/cookie is still accepted upstream
    async fn pong(&self) -> Result<bool, NetworkError>;

    // * Refreshes session cookies. The browserless path has nothing to
    // * refresh; the interop path accepts cookies exported from a browser
    // * context and overwrites the stored header/map.
    async fn update_cookies(&mut self, exported: Option<&[(String, String)]>);
}

pub struct BrowserlessClient {
    http: reqwest::Client,
    headers: HeaderMap,
    identity: SessionIdentity,
    signer: Arc<dyn Signer>,
    pacer: RequestPacer,
    proxy: Option<String>,
    proxy_pool: Option<Arc<ProxyPool>>,
    // * Always None in browserless mode
    browser_page: Option<BrowserPage>,
}

impl BrowserlessClient {
    pub fn new(
        timeout: Duration,
        proxy: Option<String>,
        identity: SessionIdentity,
        signer: Arc<dyn Signer>,
        proxy_pool: Option<Arc<ProxyPool>>,
    ) -> Result<Self, NetworkError> {
        let headers = identity.default_headers()?;

        let mut builder = reqwest::Client::builder().timeout(timeout);
        if let Some(url) = proxy.as_deref() {
            builder = builder.proxy(reqwest::Proxy::all(url)?);
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            headers,
            identity,
            signer,
            pacer: RequestPacer::new(REQUESTS_PER_SECOND),
            proxy,
            proxy_pool,
            browser_page: None,
        })
    }

    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }

    pub fn proxy_pool(&self) -> Option<&Arc<ProxyPool>> {
        self.proxy_pool.as_ref()
    }

    pub fn has_browser_page(&self) -> bool {
        self.browser_page.is_some()
    }

    // * Issues one signed request against the platform API. GET sends the
    // * parameter map as the query string; POST sends it as the JSON body.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        params: &mut BTreeMap<String, String>,
    ) -> Result<Value, NetworkError> {
        build_session_params(&self.identity, self.signer.as_ref(), uri, params).await?;
        self.pacer.acquire().await;

        let url = format!("{}{}", API_HOST, uri);
        let timer = telemetry::request_timer(uri);
        let request = if method == Method::POST {
            self.http.post(&url).headers(self.headers.clone()).json(&params)
        } else {
            self.http.get(&url).headers(self.headers.clone()).query(&params)
        };

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                timer.observe_duration();
                telemetry::record_request(uri, "transport_error");
                return Err(err.into());
            }
        };
        timer.observe_duration();

        let status = response.status().as_u16();
        if status == 403 || status == 429 {
            telemetry::record_request(uri, "blocked");
            return Err(NetworkError::Blocked(status));
        }

        let body = response.text().await?;
        self.decode_body(uri, &body)
    }

    fn decode_body(&self, uri: &str, body: &str) -> Result<Value, NetworkError> {
        if body.is_empty() {
            telemetry::record_request(uri, "rejected");
            return Err(NetworkError::DataFetch(
                "empty response body, session material likely rejected".to_string(),
            ));
        }

        let payload: Value = match serde_json::from_str(body) {
            Ok(payload) => payload,
            Err(_) => {
                telemetry::record_request(uri, "rejected");
                // * Non-JSON bodies here are interstitial block pages
                if let Some(hit) = VERIFY_PAGE_REGEX.find(body) {
                    return Err(NetworkError::DataFetch(format!(
                        "verification interstitial served: {}",
                        hit.as_str()
                    )));
                }
                return Err(NetworkError::DataFetch(
                    "response body is not JSON".to_string(),
                ));
            }
        };

        if let Some(code) = payload.get("status_code").and_then(Value::as_i64) {
            if code != 0 {
                telemetry::record_request(uri, "api_error");
                return Err(NetworkError::DataFetch(format!(
                    "upstream status_code {}",
                    code
                )));
            }
        }

        telemetry::record_request(uri, "ok");
        Ok(payload)
    }

    // * Fetches the detail payload for one video id
    pub async fn get_video_by_id(&self, aweme_id: &str) -> Result<Value, NetworkError> {
        let mut params = BTreeMap::from([("aweme_id".to_string(), aweme_id.to_string())]);
        let payload = self.request(Method::GET, AWEME_DETAIL_URI, &mut params).await?;
        payload
            .get("aweme_detail")
            .filter(|detail| !detail.is_null())
            .cloned()
            .ok_or_else(|| {
                NetworkError::DataFetch(format!("no aweme_detail in response for {}", aweme_id))
            })
    }

    // * One page of general search results for a keyword
    pub async fn search_by_keyword(
        &self,
        keyword: &str,
        offset: u32,
        count: u32,
    ) -> Result<Value, NetworkError> {
        let mut params = BTreeMap::from([
            ("search_channel".to_string(), "aweme_general".to_string()),
            ("search_source".to_string(), "normal_search".to_string()),
            ("query_correct_type".to_string(), "1".to_string()),
            ("is_filter_search".to_string(), "0".to_string()),
            ("keyword".to_string(), keyword.to_string()),
            ("offset".to_string(), offset.to_string()),
            ("count".to_string(), count.to_string()),
        ]);
        self.request(Method::GET, GENERAL_SEARCH_URI, &mut params).await
    }

    // * One page of a creator's published posts
    pub async fn get_user_posts(
        &self,
        sec_user_id: &str,
        max_cursor: i64,
        count: u32,
    ) -> Result<Value, NetworkError> {
        let mut params = BTreeMap::from([
            ("sec_user_id".to_string(), sec_user_id.to_string()),
            ("max_cursor".to_string(), max_cursor.to_string()),
            ("count".to_string(), count.to_string()),
            ("locate_query".to_string(), "false".to_string()),
            ("publish_video_strategy_type".to_string(), "2".to_string()),
        ]);
        self.request(Method::GET, USER_POST_URI, &mut params).await
    }

    // * One page of comments for a video
    pub async fn get_comments(
        &self,
        aweme_id: &str,
        cursor: i64,
        count: u32,
    ) -> Result<Value, NetworkError> {
        let mut params = BTreeMap::from([
            ("aweme_id".to_string(), aweme_id.to_string()),
            ("cursor".to_string(), cursor.to_string()),
            ("count".to_string(), count.to_string()),
            ("item_type".to_string(), "0".to_string()),
        ]);
        self.request(Method::GET, COMMENT_LIST_URI, &mut params).await
    }

    // * Plain byte fetch for media URLs. These are CDN links carrying their
    // * own auth in the URL - no fingerprinting or signing applies.
    pub async fn download_bytes(&self, url: &str) -> Result<Vec<u8>, NetworkError> {
        let parsed = Url::parse(url)
            .map_err(|err| NetworkError::DataFetch(format!("bad media url: {}", err)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(NetworkError::DataFetch(format!(
                "unsupported media url scheme: {}",
                parsed.scheme()
            )));
        }

        self.pacer.acquire().await;
        let response = self
            .http
            .get(parsed)
            .header("User-Agent", self.headers.get("User-Agent").cloned().unwrap_or(
                HeaderValue::from_static("Mozilla/5.0"),
            ))
            .send()
            .await?;
        let status = response.status().as_u16();
        if status == 403 || status == 429 {
            return Err(NetworkError::Blocked(status));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl PlatformSession for BrowserlessClient {
    // * Authentication is asserted by the presence of a configured cookie
    // * rather than probed live. Stubbed to true.
    // * TODO: probe the LOGIN_STATUS cookie against the profile endpoint
    // * instead of asserting liveness.
    async fn pong(&self) -> Result<bool, NetworkError> {
        debug!("browserless pong: cookie-configured session asserted live");
        Ok(true)
    }

    async fn update_cookies(&mut self, exported: Option<&[(String, String)]>) {
        let Some(pairs) = exported else {
            // * Pure HTTP mode: cookies were fixed at construction
            info!("browserless mode, cookies already configured; refresh skipped");
            return;
        };

        // * Interop path for mixed-mode callers: overwrite the stored
        // * header and map with cookies exported from a browser context
        let cookie_string = pairs
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join("; ");
        self.identity.cookie_map = parse_cookie_string(&cookie_string);
        self.identity.cookie_string = cookie_string;

        match HeaderValue::from_str(&self.identity.cookie_string) {
            Ok(value) => {
                self.headers.insert("Cookie", value);
            }
            Err(_) => warn!("exported cookies not header-safe; keeping previous Cookie header"),
        }
    }
}
