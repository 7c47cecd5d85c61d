use backon::{ExponentialBuilder, Retryable};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use url::Url;

use crate::error::{FetchError, IsRetryable, SnapshotApi};
use crate::utils::logging::clip_chars;

pub(crate) const UPSTREAM_BODY_PREVIEW_CHARS: usize = 300;

pub(crate) fn retry_policy(max_times: usize) -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(100))
        .with_max_delay(Duration::from_millis(300))
        .with_max_times(max_times)
        .with_jitter()
}

fn preview(bytes: &[u8]) -> String {
    let raw_body = String::from_utf8_lossy(bytes);
    clip_chars(&raw_body, UPSTREAM_BODY_PREVIEW_CHARS).to_string()
}

async fn get_json_once<T>(
    api: SnapshotApi,
    client: &reqwest::Client,
    url: &Url,
    date_time: &str,
    timeout: Duration,
) -> Result<T, FetchError>
where
    T: DeserializeOwned,
{
    let start = Instant::now();
    let resp = client
        .get(url.clone())
        .query(&[("date_time", date_time)])
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| FetchError::from_reqwest(api, e, timeout))?;

    let status = resp.status();
    let bytes = resp
        .bytes()
        .await
        .map_err(|e| FetchError::from_reqwest(api, e, timeout))?;

    if !status.is_success() {
        tracing::debug!(
            %api,
            %status,
            url = %url,
            body = %preview(&bytes),
            "[{api}] Upstream returned non-success status"
        );
        return Err(FetchError::Status { api, status });
    }

    tracing::debug!(
        %api,
        %status,
        date_time,
        bytes = bytes.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "[{api}] Snapshot payload received"
    );

    serde_json::from_slice::<T>(&bytes).map_err(|e| {
        tracing::debug!(%api, body = %preview(&bytes), "[{api}] Payload did not decode");
        FetchError::payload(api, e.to_string())
    })
}

/// `GET url?date_time=...`, decoding the JSON body as `T`.
///
/// Transport failures, timeouts and 5xx responses are retried with the given
/// policy; 4xx and undecodable bodies fail immediately.
pub(crate) async fn get_json_with_retry<T>(
    api: SnapshotApi,
    client: &reqwest::Client,
    url: &Url,
    date_time: &str,
    policy: &ExponentialBuilder,
    timeout: Duration,
) -> Result<T, FetchError>
where
    T: DeserializeOwned,
{
    (|| get_json_once::<T>(api, client, url, date_time, timeout))
        .retry(policy)
        .when(|err: &FetchError| err.is_retryable())
        .notify(|err, dur: Duration| {
            tracing::warn!(%api, error = %err, "[{api}] Upstream error, retry after {:?}", dur);
        })
        .await
}
