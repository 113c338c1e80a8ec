//! Input normalization: turn whatever the caller supplied (inline data URI
//! or remote URL) into the single inline-encoded image the generation call
//! requires. The inline form wins when both are present; the URL path is
//! the only place in the pipeline that performs its own network fetch.

use crate::{
    error::{EnhanceError, ErrorCategory, Result},
    models::OperationRequest,
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

/// A parsed `data:<mime>;base64,<data>` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    /// Base64 payload, without the data-URI prefix.
    pub data: String,
}

impl InlineImage {
    /// Parse and validate an inline data URI. The mime type must start with
    /// `image/` and the payload must decode to at least one byte; anything
    /// else is rejected before the provider is ever contacted.
    pub fn parse(uri: &str) -> Result<Self> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| EnhanceError::InvalidDataUri("missing \"data:\" prefix".into()))?;
        let (mime_type, data) = rest
            .split_once(";base64,")
            .ok_or_else(|| EnhanceError::InvalidDataUri("missing \";base64,\" marker".into()))?;
        if !mime_type.starts_with("image/") {
            return Err(EnhanceError::InvalidContentType {
                got: mime_type.to_string(),
            });
        }
        let bytes = BASE64
            .decode(data)
            .map_err(|e| EnhanceError::InvalidDataUri(format!("payload is not base64: {e}")))?;
        if bytes.is_empty() {
            return Err(EnhanceError::InvalidDataUri("payload is empty".into()));
        }
        Ok(Self {
            mime_type: mime_type.to_string(),
            data: data.to_string(),
        })
    }

    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: BASE64.encode(bytes),
        }
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// Outcome of a raw image fetch, before any validation.
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub status: u16,
    pub content_type: String,
    pub body: Vec<u8>,
}

/// Seam over the outbound HTTP GET so tests can count calls and fake
/// responses.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedImage>;
}

/// Real fetcher backed by reqwest. Adds no auth headers; the URL is
/// caller-supplied.
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedImage> {
        let response = self.client.get(url).send().await.map_err(|e| {
            EnhanceError::Provider {
                category: ErrorCategory::NetworkFetchFailure,
                message: format!("Fetching the remote image failed: {e}"),
            }
        })?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let body = response
            .bytes()
            .await
            .map_err(|e| EnhanceError::Provider {
                category: ErrorCategory::NetworkFetchFailure,
                message: format!("Reading the remote image body failed: {e}"),
            })?
            .to_vec();
        Ok(FetchedImage {
            status,
            content_type,
            body,
        })
    }
}

/// Resolve the request's image into the inline form. At most one fetch is
/// performed, and only when no inline payload is present.
pub async fn normalize(
    request: &OperationRequest,
    fetcher: &dyn ImageFetcher,
) -> Result<InlineImage> {
    if let Some(uri) = &request.photo_data_uri {
        return InlineImage::parse(uri);
    }
    let url = request.image_url.as_deref().ok_or(EnhanceError::MissingInput)?;

    log::debug!("Fetching remote image from {url}");
    let fetched = fetcher.fetch(url).await?;

    if !(200..300).contains(&fetched.status) {
        return Err(EnhanceError::FetchFailed {
            status: fetched.status,
        });
    }
    // Ignore content-type parameters such as "; charset=...".
    let media_type = fetched
        .content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_string();
    if !media_type.starts_with("image/") {
        return Err(EnhanceError::InvalidContentType {
            got: fetched.content_type,
        });
    }
    if fetched.body.is_empty() {
        return Err(EnhanceError::InvalidDataUri("fetched body is empty".into()));
    }
    Ok(InlineImage::from_bytes(media_type, &fetched.body))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fetcher that replays a canned response and counts calls.
    pub struct MockFetcher {
        pub response: FetchedImage,
        pub calls: AtomicUsize,
    }

    impl MockFetcher {
        pub fn new(status: u16, content_type: &str, body: &[u8]) -> Self {
            Self {
                response: FetchedImage {
                    status,
                    content_type: content_type.to_string(),
                    body: body.to_vec(),
                },
                calls: AtomicUsize::new(0),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ImageFetcher for MockFetcher {
        async fn fetch(&self, _url: &str) -> Result<FetchedImage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.response.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::MockFetcher;
    use super::*;

    const PNG_URI: &str = "data:image/png;base64,aGVsbG8=";

    #[tokio::test]
    async fn missing_input_short_circuits_before_any_fetch() {
        let fetcher = MockFetcher::new(200, "image/png", b"png");
        let err = normalize(&OperationRequest::default(), &fetcher)
            .await
            .unwrap_err();
        assert!(matches!(err, EnhanceError::MissingInput));
        assert_eq!(fetcher.call_count(), 0);
    }

    #[tokio::test]
    async fn inline_payload_takes_precedence_over_url() {
        let fetcher = MockFetcher::new(200, "image/png", b"other");
        let mut request = OperationRequest::from_data_uri(PNG_URI);
        request.image_url = Some("https://example.com/a.png".into());
        let image = normalize(&request, &fetcher).await.unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(fetcher.call_count(), 0);
    }

    #[tokio::test]
    async fn non_2xx_fetch_yields_fetch_failed_with_status() {
        let fetcher = MockFetcher::new(404, "image/png", b"nope");
        let request = OperationRequest::from_url("https://example.com/missing.png");
        let err = normalize(&request, &fetcher).await.unwrap_err();
        assert!(matches!(err, EnhanceError::FetchFailed { status: 404 }));
        assert_eq!(fetcher.call_count(), 1);
    }

    #[tokio::test]
    async fn non_image_content_type_is_rejected() {
        let fetcher = MockFetcher::new(200, "text/plain", b"not an image");
        let request = OperationRequest::from_url("https://example.com/readme.txt");
        let err = normalize(&request, &fetcher).await.unwrap_err();
        match err {
            EnhanceError::InvalidContentType { got } => assert_eq!(got, "text/plain"),
            other => panic!("expected InvalidContentType, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetched_bytes_become_a_data_uri() {
        let fetcher = MockFetcher::new(200, "image/jpeg; charset=binary", b"jpeg bytes");
        let request = OperationRequest::from_url("https://example.com/a.jpg");
        let image = normalize(&request, &fetcher).await.unwrap();
        assert_eq!(image.mime_type, "image/jpeg");
        assert_eq!(
            image.to_data_uri(),
            format!("data:image/jpeg;base64,{}", BASE64.encode(b"jpeg bytes"))
        );
    }

    #[test]
    fn parse_rejects_non_image_mime() {
        let err = InlineImage::parse("data:text/plain;base64,aGVsbG8=").unwrap_err();
        assert!(matches!(err, EnhanceError::InvalidContentType { .. }));
    }

    #[test]
    fn parse_rejects_empty_payload() {
        let err = InlineImage::parse("data:image/png;base64,").unwrap_err();
        assert!(matches!(err, EnhanceError::InvalidDataUri(_)));
    }

    #[test]
    fn parse_rejects_missing_prefix() {
        let err = InlineImage::parse("image/png;base64,aGVsbG8=").unwrap_err();
        assert!(matches!(err, EnhanceError::InvalidDataUri(_)));
    }

    #[test]
    fn parse_round_trips() {
        let image = InlineImage::parse(PNG_URI).unwrap();
        assert_eq!(image.to_data_uri(), PNG_URI);
    }
}
