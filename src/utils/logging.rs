use serde::Serialize;
use tracing::debug;

use crate::error::SnapshotApi;

const PAYLOAD_PREVIEW_CHARS: usize = 4096;

/// Logs a decoded upstream payload, pretty-printed and clipped, at debug.
///
/// Serialization is skipped entirely unless debug is enabled.
pub(crate) fn debug_upstream_payload<T>(api: SnapshotApi, date_time: &str, payload: &T)
where
    T: Serialize,
{
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }

    let pretty = serde_json::to_string_pretty(payload)
        .unwrap_or_else(|error| format!("<pretty serialize failed: {error}>"));
    debug!(
        api = %api,
        date_time,
        bytes = pretty.len(),
        body = %clip_chars(&pretty, PAYLOAD_PREVIEW_CHARS),
        "Upstream payload"
    );
}

/// Longest prefix of `s` holding at most `max` chars.
pub(crate) fn clip_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
