//! Mock S3-compatible object storage server
//!
//! Provides a [`MockStorageServer`] that simulates the small slice of the
//! S3 API the services use: object deletion, delimiter-based listing, and
//! bucket head checks. Presigned URL generation itself is offline (pure
//! request signing), so only the calls that actually hit the network need
//! a stub.

use wiremock::matchers::{method, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mock object storage server backed by [`wiremock::MockServer`]
///
/// # Example
///
/// ```rust,ignore
/// use raindrops_test_utils::MockStorageServer;
///
/// #[tokio::test]
/// async fn test_sweep() {
///     let storage = MockStorageServer::start().await;
///     storage
///         .mock_list_prefixes(&["tile-1/", "tile-7/"])
///         .await;
///     storage.mock_delete_success().await;
///     // run code against storage.endpoint()
/// }
/// ```
pub struct MockStorageServer {
    server: MockServer,
}

impl MockStorageServer {
    /// Start a new mock storage server
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Endpoint URL to configure the storage client with
    pub fn endpoint(&self) -> String {
        self.server.uri()
    }

    /// Access the underlying mock server for custom expectations
    pub fn server(&self) -> &MockServer {
        &self.server
    }

    /// Respond 204 to every object DELETE
    pub async fn mock_delete_success(&self) {
        Mock::given(method("DELETE"))
            .and(path_regex(r"^/.+"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&self.server)
            .await;
    }

    /// Respond 500 to every object DELETE
    pub async fn mock_delete_failure(&self) {
        Mock::given(method("DELETE"))
            .and(path_regex(r"^/.+"))
            .respond_with(ResponseTemplate::new(500).set_body_string(
                error_xml("InternalError", "We encountered an internal error."),
            ))
            .mount(&self.server)
            .await;
    }

    /// Respond to delimiter listings with the given common prefixes
    /// (the ListObjectsV2 shape for "top-level directories")
    pub async fn mock_list_prefixes(&self, prefixes: &[&str]) {
        let body = list_bucket_xml(prefixes, &[]);
        Mock::given(method("GET"))
            .and(query_param("list-type", "2"))
            .and(query_param("delimiter", "/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(body)
                    .insert_header("content-type", "application/xml"),
            )
            .mount(&self.server)
            .await;
    }

    /// Respond to listings under `prefix` with concrete object keys
    pub async fn mock_list_objects(&self, prefix: &str, keys: &[&str]) {
        let body = list_bucket_xml(&[], keys);
        Mock::given(method("GET"))
            .and(query_param("list-type", "2"))
            .and(query_param("prefix", prefix))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(body)
                    .insert_header("content-type", "application/xml"),
            )
            .mount(&self.server)
            .await;
    }

    /// Respond 200 to bucket HEAD checks (readiness probes)
    pub async fn mock_head_bucket_success(&self) {
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&self.server)
            .await;
    }

    /// Respond 200 to presigned-style object PUTs
    pub async fn mock_put_success(&self) {
        Mock::given(method("PUT"))
            .and(path_regex(r"^/.+"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&self.server)
            .await;
    }

    /// Count of requests received so far
    pub async fn received_request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|reqs| reqs.len())
            .unwrap_or(0)
    }
}

/// Build a ListObjectsV2 response body
fn list_bucket_xml(prefixes: &[&str], keys: &[&str]) -> String {
    let mut body = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
  <Name>raindrops-tiles</Name>
  <Prefix></Prefix>
  <MaxKeys>1000</MaxKeys>
  <IsTruncated>false</IsTruncated>
"#,
    );
    body.push_str(&format!("  <KeyCount>{}</KeyCount>\n", prefixes.len() + keys.len()));
    for key in keys {
        body.push_str(&format!(
            "  <Contents><Key>{key}</Key><LastModified>2024-01-01T00:00:00.000Z</LastModified><Size>1024</Size><StorageClass>STANDARD</StorageClass></Contents>\n"
        ));
    }
    for prefix in prefixes {
        body.push_str(&format!(
            "  <CommonPrefixes><Prefix>{prefix}</Prefix></CommonPrefixes>\n"
        ));
    }
    body.push_str("</ListBucketResult>");
    body
}

/// Build an S3 error response body
fn error_xml(code: &str, message: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Error><Code>{code}</Code><Message>{message}</Message></Error>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_xml_contains_prefixes_and_keys() {
        let body = list_bucket_xml(&["tile-1/"], &["tile-1/audio.mp3"]);
        assert!(body.contains("<Prefix>tile-1/</Prefix>"));
        assert!(body.contains("<Key>tile-1/audio.mp3</Key>"));
        assert!(body.contains("<KeyCount>2</KeyCount>"));
    }

    #[tokio::test]
    async fn server_starts_and_reports_endpoint() {
        let storage = MockStorageServer::start().await;
        assert!(storage.endpoint().starts_with("http://"));
        assert_eq!(storage.received_request_count().await, 0);
    }
}
