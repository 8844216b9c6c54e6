// * Configuration Constants
// * Central location for the emulated web-client environment and request defaults

// * API origin the browserless client talks to
pub const API_HOST: &str = "https://www.douyin.com";

// * Fallback user agent when the credential file does not pin one
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

// * Endpoint paths
pub const AWEME_DETAIL_URI: &str = "/aweme/v1/web/aweme/detail/";
pub const GENERAL_SEARCH_URI: &str = "/aweme/v1/web/general/search/single/";
pub const USER_POST_URI: &str = "/aweme/v1/web/aweme/post/";
pub const COMMENT_LIST_URI: &str = "/aweme/v1/web/comment/list/";

// * Endpoints that must never receive a computed signature token.
// * Membership is a substring match against the request URI.
pub const SIGNATURE_EXEMPT_PATHS: &[&str] = &["/v1/web/general/search"];

// * Session nonce shape: the browser mints this client-side; the browserless
// * path generates it locally from this alphabet at this length.
pub const MS_TOKEN_LENGTH: usize = 107;
pub const MS_TOKEN_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789=";

// * Stable device identifier width (decimal digits)
pub const WEB_ID_DIGITS: usize = 19;

// * Request defaults
pub const REQUEST_TIMEOUT_SECS: u64 = 60;
pub const REQUESTS_PER_SECOND: u32 = 1;

// * Fingerprint Parameter Set: constant key/value pairs describing the
// * simulated browser/device environment. Must exactly match what the
// * platform's real web client sends or requests are rejected upstream.
// * Versioned table - not user-configurable.
pub const FINGERPRINT_PARAMS: &[(&str, &str)] = &[
    ("device_platform", "webapp"),
    ("aid", "6383"),
    ("channel", "channel_pc_web"),
    ("version_code", "190600"),
    ("version_name", "19.6.0"),
    ("update_version_code", "170400"),
    ("pc_client_type", "1"),
    ("cookie_enabled", "true"),
    ("browser_language", "zh-CN"),
    ("browser_platform", "MacIntel"),
    ("browser_name", "Chrome"),
    ("browser_version", "125.0.0.0"),
    ("browser_online", "true"),
    ("engine_name", "Blink"),
    ("os_name", "Mac OS"),
    ("os_version", "10.15.7"),
    ("cpu_core_num", "8"),
    ("device_memory", "8"),
    ("engine_version", "109.0"),
    ("platform", "PC"),
    ("screen_width", "2560"),
    ("screen_height", "1440"),
    ("effective_type", "4g"),
    ("round_trip_time", "50"),
];

// * Returns true when the URI belongs to the Signature Exemption Set
pub fn is_signature_exempt(uri: &str) -> bool {
    SIGNATURE_EXEMPT_PATHS.iter().any(|path| uri.contains(path))
}
