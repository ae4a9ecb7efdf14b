//! HTTP object store (Cloudflare R2 REST API or a bearer-token gateway).

use crate::naming::encode_key;
use crate::{ObjectStore, StoreResult};
use relink_error::{StoreError, StoreErrorKind};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, error, instrument};

const CLOUDFLARE_API_URL: &str = "https://api.cloudflare.com/client/v4/accounts";

/// Longest response body excerpt kept in error messages.
const BODY_EXCERPT_LEN: usize = 200;

/// Object store reached over HTTP with bearer-token auth.
///
/// Objects live at `{objects_url}/{key}`: `PUT` uploads, `HEAD` checks
/// existence. The preflight `GET`s `access_url` and requires success.
#[derive(Debug, Clone)]
pub struct HttpObjectStore {
    client: Client,
    objects_url: String,
    access_url: String,
    token: String,
}

impl HttpObjectStore {
    /// Store rooted at `{endpoint}/{bucket}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        endpoint: &str,
        bucket: &str,
        token: impl Into<String>,
        timeout: Duration,
    ) -> StoreResult<Self> {
        let objects_url = format!("{}/{}", endpoint.trim_end_matches('/'), encode_key(bucket));
        Self::with_urls(objects_url.clone(), objects_url, token, timeout)
    }

    /// Store backed by the Cloudflare R2 REST API.
    ///
    /// The preflight lists the account's buckets, which needs an R2 token.
    pub fn cloudflare(
        account_id: &str,
        bucket: &str,
        token: impl Into<String>,
        timeout: Duration,
    ) -> StoreResult<Self> {
        let buckets_url = format!("{}/{}/r2/buckets", CLOUDFLARE_API_URL, account_id);
        let objects_url = format!("{}/{}/objects", buckets_url, encode_key(bucket));
        Self::with_urls(objects_url, buckets_url, token, timeout)
    }

    fn with_urls(
        objects_url: String,
        access_url: String,
        token: impl Into<String>,
        timeout: Duration,
    ) -> StoreResult<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            StoreError::new(StoreErrorKind::InvalidConfig(format!(
                "Failed to build HTTP client: {}",
                e
            )))
        })?;
        debug!(objects_url = %objects_url, "Created HTTP object store");
        Ok(Self {
            client,
            objects_url,
            access_url,
            token: token.into(),
        })
    }

    /// URL of a single object.
    pub fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.objects_url, encode_key(key))
    }
}

#[async_trait::async_trait]
impl ObjectStore for HttpObjectStore {
    #[instrument(skip(self, data), fields(size = data.len()))]
    async fn put_object(&self, key: &str, data: &[u8], content_type: &str) -> StoreResult<()> {
        let response = self
            .client
            .put(self.object_url(key))
            .bearer_auth(&self.token)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(data.to_vec())
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_success() {
            debug!(status = %status, "Object stored");
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        error!(status = %status, body = %excerpt(&body), "Object store rejected upload");
        Err(status_error(status, &body))
    }

    #[instrument(skip(self))]
    async fn head_object(&self, key: &str) -> StoreResult<bool> {
        let response = self
            .client
            .head(self.object_url(key))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(transport_error)?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(status_error(status, "")),
        }
    }

    #[instrument(skip(self), fields(url = %self.access_url))]
    async fn verify_access(&self) -> StoreResult<()> {
        let response = self
            .client
            .get(&self.access_url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_success() {
            debug!("Object store access verified");
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, &body))
    }

    fn backend_name(&self) -> &'static str {
        "http"
    }
}

/// Map a transport failure to a store error kind.
fn transport_error(e: reqwest::Error) -> StoreError {
    if e.is_timeout() {
        StoreError::new(StoreErrorKind::Timeout(e.to_string()))
    } else if e.is_builder() {
        StoreError::new(StoreErrorKind::InvalidConfig(e.to_string()))
    } else {
        StoreError::new(StoreErrorKind::Connection(e.to_string()))
    }
}

/// Map a non-success HTTP status to a store error kind.
fn status_error(status: StatusCode, body: &str) -> StoreError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            StoreError::new(StoreErrorKind::PermissionDenied(format!(
                "HTTP {}: check the token has write access to the bucket",
                status.as_u16()
            )))
        }
        _ => StoreError::new(StoreErrorKind::Status {
            status_code: status.as_u16(),
            message: excerpt(body).to_string(),
        }),
    }
}

fn excerpt(body: &str) -> &str {
    match body.char_indices().nth(BODY_EXCERPT_LEN) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relink_error::RetryableError;

    fn store() -> HttpObjectStore {
        HttpObjectStore::cloudflare("acct", "media", "token", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn cloudflare_urls() {
        let store = store();
        assert_eq!(
            store.object_url("photo.png"),
            "https://api.cloudflare.com/client/v4/accounts/acct/r2/buckets/media/objects/photo.png"
        );
        assert_eq!(
            store.access_url,
            "https://api.cloudflare.com/client/v4/accounts/acct/r2/buckets"
        );
    }

    #[test]
    fn object_keys_are_escaped() {
        let store = HttpObjectStore::new("https://s3.example/", "b", "t", Duration::from_secs(1)).unwrap();
        assert_eq!(store.object_url("a b#1.png"), "https://s3.example/b/a%20b%231.png");
    }

    #[test]
    fn auth_failures_are_permanent() {
        let err = status_error(StatusCode::FORBIDDEN, "denied");
        assert!(matches!(err.kind, StoreErrorKind::PermissionDenied(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn throttling_and_server_errors_are_transient() {
        for code in [408, 429, 500, 502, 503, 504] {
            let status = StatusCode::from_u16(code).unwrap();
            assert!(status_error(status, "").is_retryable(), "{code}");
        }
        assert!(!status_error(StatusCode::BAD_REQUEST, "").is_retryable());
        assert!(!status_error(StatusCode::CONFLICT, "").is_retryable());
    }

    #[test]
    fn excerpts_are_bounded() {
        let body = "é".repeat(500);
        assert_eq!(excerpt(&body).chars().count(), BODY_EXCERPT_LEN);
        assert_eq!(excerpt("short"), "short");
    }
}
