//! 커넥터 공용 HTTP 헬퍼.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::error;

use crate::error::{FetchError, FetchResult};

/// 인증 헤더를 기본 헤더로 갖는 reqwest 클라이언트 생성.
pub(crate) fn build_client(authorization: &str, timeout_secs: u64) -> FetchResult<reqwest::Client> {
    let mut auth = HeaderValue::from_str(authorization)
        .map_err(|e| FetchError::Config(format!("invalid authorization header: {}", e)))?;
    auth.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, auth);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| FetchError::Config(format!("failed to build HTTP client: {}", e)))
}

/// 기본 URL과 경로 접미사 결합.
pub(crate) fn join_url(base: &str, suffix: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        suffix.trim_start_matches('/')
    )
}

/// 응답 상태를 확인하고 JSON 본문을 역직렬화합니다.
pub(crate) async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> FetchResult<T> {
    let status = response.status();
    let body = response.text().await?;

    if status.is_success() {
        serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse response: {} - Body: {}", e, truncate(&body, 512));
            FetchError::Malformed(e.to_string())
        })
    } else {
        Err(FetchError::Status {
            status: status.as_u16(),
            body: truncate(&body, 512).to_string(),
        })
    }
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
