// * Video Metadata Record
// * The result entity of a crawl: identifiers, descriptive fields, media
// * URLs, provenance, and the complete untyped upstream payload for
// * forward-compatibility. Records are never mutated after creation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::constants::API_HOST;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoMetadata {
    // * Core identifiers
    pub aweme_id: String,
    pub title: String,
    pub desc: String,
    pub nickname: String,
    pub user_id: String,
    pub aweme_url: String,

    // * Optional descriptive fields
    pub aweme_type: Option<String>,
    pub create_time: Option<i64>,
    pub sec_uid: Option<String>,
    pub short_user_id: Option<String>,
    pub user_unique_id: Option<String>,
    pub user_signature: Option<String>,
    pub avatar: Option<String>,

    // * Interaction counts, as provided-as-text by the upstream API
    pub liked_count: Option<String>,
    pub collected_count: Option<String>,
    pub comment_count: Option<String>,
    pub share_count: Option<String>,

    pub ip_location: Option<String>,
    pub last_modify_ts: Option<i64>,

    // * Media URLs
    pub cover_url: Option<String>,
    pub video_download_url: Option<String>,
    pub music_download_url: Option<String>,
    pub note_download_url: Option<String>,

    // * Provenance
    pub source_keyword: Option<String>,

    // * Complete upstream payload
    pub raw_metadata: Option<Value>,
}

fn text(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

// * Counts arrive as numbers in the item payload but are persisted as text
fn count_text(stats: &Value, key: &str) -> Option<String> {
    stats.get(key).and_then(Value::as_i64).map(|n| n.to_string())
}

fn first_url(value: &Value, path: &[&str]) -> Option<String> {
    let mut node = value;
    for key in path {
        node = node.get(key)?;
    }
    node.get("url_list")?
        .as_array()?
        .first()?
        .as_str()
        .map(str::to_string)
}

impl VideoMetadata {
    // * Flattens one upstream aweme item into the persisted record shape.
    // * Used at store time; the activity later re-reads the flat record.
    pub fn from_aweme(item: &Value, source_keyword: Option<&str>) -> Self {
        let aweme_id = text(item, "aweme_id").unwrap_or_default();
        let author = item.get("author").cloned().unwrap_or(Value::Null);
        let stats = item.get("statistics").cloned().unwrap_or(Value::Null);

        Self {
            aweme_url: format!("{}/video/{}", API_HOST, aweme_id),
            title: text(item, "desc").unwrap_or_default(),
            desc: text(item, "desc").unwrap_or_default(),
            aweme_type: item
                .get("aweme_type")
                .and_then(Value::as_i64)
                .map(|n| n.to_string()),
            create_time: item.get("create_time").and_then(Value::as_i64),
            nickname: text(&author, "nickname").unwrap_or_default(),
            user_id: text(&author, "uid").unwrap_or_default(),
            sec_uid: text(&author, "sec_uid"),
            short_user_id: text(&author, "short_id"),
            user_unique_id: text(&author, "unique_id"),
            user_signature: text(&author, "signature"),
            avatar: first_url(&author, &["avatar_thumb"]),
            liked_count: count_text(&stats, "digg_count"),
            collected_count: count_text(&stats, "collect_count"),
            comment_count: count_text(&stats, "comment_count"),
            share_count: count_text(&stats, "share_count"),
            ip_location: text(item, "ip_label"),
            last_modify_ts: Some(chrono::Utc::now().timestamp_millis()),
            cover_url: first_url(item, &["video", "cover"]),
            video_download_url: first_url(item, &["video", "play_addr"]),
            music_download_url: first_url(item, &["music", "play_url"]),
            note_download_url: item
                .get("images")
                .and_then(Value::as_array)
                .and_then(|images| images.first())
                .and_then(|image| first_url(image, &[])),
            source_keyword: source_keyword.map(str::to_string),
            raw_metadata: Some(item.clone()),
            aweme_id,
        }
    }

    // * Rebuilds the typed record from a persisted flat batch entry. Field
    // * access mirrors the batch file contract: missing keys degrade to
    // * defaults, never to errors.
    pub fn from_record(raw: &Value, fallback_id: &str) -> Self {
        Self {
            aweme_id: text(raw, "aweme_id").unwrap_or_else(|| fallback_id.to_string()),
            title: text(raw, "title").unwrap_or_default(),
            desc: text(raw, "desc").unwrap_or_default(),
            nickname: text(raw, "nickname").unwrap_or_default(),
            user_id: text(raw, "user_id").unwrap_or_default(),
            aweme_url: text(raw, "aweme_url").unwrap_or_default(),
            aweme_type: text(raw, "aweme_type"),
            create_time: raw.get("create_time").and_then(Value::as_i64),
            sec_uid: text(raw, "sec_uid"),
            short_user_id: text(raw, "short_user_id"),
            user_unique_id: text(raw, "user_unique_id"),
            user_signature: text(raw, "user_signature"),
            avatar: text(raw, "avatar"),
            liked_count: text(raw, "liked_count"),
            collected_count: text(raw, "collected_count"),
            comment_count: text(raw, "comment_count"),
            share_count: text(raw, "share_count"),
            ip_location: text(raw, "ip_location"),
            last_modify_ts: raw.get("last_modify_ts").and_then(Value::as_i64),
            cover_url: text(raw, "cover_url"),
            video_download_url: text(raw, "video_download_url"),
            music_download_url: text(raw, "music_download_url"),
            note_download_url: text(raw, "note_download_url"),
            source_keyword: text(raw, "source_keyword"),
            raw_metadata: Some(raw.clone()),
        }
    }
}
