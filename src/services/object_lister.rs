//! Bucket listing seam and its S3 implementation.

use async_trait::async_trait;
use aws_sdk_s3::{
    Client,
    error::{DisplayErrorContext, SdkError},
};
use chrono::DateTime;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::object::ObjectEntry;

#[derive(Debug, Error)]
pub enum ListingError {
    #[error("bucket `{0}` not found")]
    BucketNotFound(String),
    #[error("object listing failed: {0}")]
    Backend(String),
}

/// Objects found under a prefix.
#[derive(Debug, Default)]
pub struct Listing {
    pub objects: Vec<ObjectEntry>,
    /// True when the page cap stopped the listing before the last page.
    pub truncated: bool,
}

#[async_trait]
pub trait ObjectLister: Send + Sync {
    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Listing, ListingError>;
}

/// Lists objects with ListObjectsV2, following continuation tokens.
#[derive(Clone, Debug)]
pub struct S3ObjectLister {
    client: Client,
    /// Stop after this many pages; `None` reads every page.
    max_pages: Option<u32>,
}

impl S3ObjectLister {
    pub fn new(client: Client, max_pages: Option<u32>) -> Self {
        Self { client, max_pages }
    }

    /// Build a client from shared SDK config. Path-style addressing is forced
    /// when an endpoint override (e.g. LocalStack) is in use.
    pub fn from_sdk_config(
        sdk_config: &aws_config::SdkConfig,
        path_style: bool,
        max_pages: Option<u32>,
    ) -> Self {
        let s3_config = aws_sdk_s3::config::Builder::from(sdk_config)
            .force_path_style(path_style)
            .build();
        Self::new(Client::from_conf(s3_config), max_pages)
    }
}

#[async_trait]
impl ObjectLister for S3ObjectLister {
    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Listing, ListingError> {
        let mut listing = Listing::default();
        let mut continuation_token: Option<String> = None;
        let mut pages: u32 = 0;

        loop {
            let mut req = self.client.list_objects_v2().bucket(bucket).prefix(prefix);
            if let Some(ref token) = continuation_token {
                req = req.continuation_token(token);
            }

            let resp = match req.send().await {
                Ok(resp) => resp,
                Err(SdkError::ServiceError(service_err))
                    if service_err.err().is_no_such_bucket() =>
                {
                    return Err(ListingError::BucketNotFound(bucket.to_string()));
                }
                Err(err) => {
                    return Err(ListingError::Backend(
                        DisplayErrorContext(&err).to_string(),
                    ));
                }
            };
            pages += 1;

            for obj in resp.contents() {
                let Some(key) = obj.key() else {
                    continue;
                };
                let Some(last_modified) = obj
                    .last_modified()
                    .and_then(|t| DateTime::from_timestamp(t.secs(), t.subsec_nanos()))
                else {
                    debug!("skipping {} without a usable LastModified", key);
                    continue;
                };

                listing.objects.push(ObjectEntry {
                    key: key.to_string(),
                    size: obj.size().unwrap_or(0).max(0) as u64,
                    last_modified,
                });
            }

            if resp.is_truncated() != Some(true) {
                break;
            }
            continuation_token = resp.next_continuation_token().map(str::to_string);
            if continuation_token.is_none() {
                break;
            }
            if self.max_pages.is_some_and(|max| pages >= max) {
                warn!(
                    "listing of s3://{}/{} stopped after {} pages",
                    bucket, prefix, pages
                );
                listing.truncated = true;
                break;
            }
        }

        debug!(
            "listed {} objects from s3://{}/{} in {} pages",
            listing.objects.len(),
            bucket,
            prefix,
            pages
        );
        Ok(listing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
    use aws_smithy_runtime::client::http::test_util::{ReplayEvent, StaticReplayClient};
    use aws_smithy_runtime_api::http::{Request, Response, StatusCode};
    use aws_smithy_types::body::SdkBody;
    use chrono::{TimeZone, Utc};

    fn event(status: u16, body: &str) -> ReplayEvent {
        ReplayEvent::new(
            Request::new(SdkBody::empty()),
            Response::new(
                StatusCode::try_from(status).unwrap(),
                SdkBody::from(body.to_string()),
            ),
        )
    }

    fn page(keys: &[&str], next_token: Option<&str>) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8"?><ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/"><Name>media-bucket</Name><Prefix>downloads/u</Prefix><MaxKeys>1000</MaxKeys>"#,
        );
        xml.push_str(&format!("<KeyCount>{}</KeyCount>", keys.len()));
        match next_token {
            Some(token) => xml.push_str(&format!(
                "<IsTruncated>true</IsTruncated><NextContinuationToken>{}</NextContinuationToken>",
                token
            )),
            None => xml.push_str("<IsTruncated>false</IsTruncated>"),
        }
        for key in keys {
            xml.push_str(&format!(
                "<Contents><Key>{}</Key><LastModified>2023-01-09T15:00:00.000Z</LastModified><ETag>\"etag\"</ETag><Size>2048</Size><StorageClass>STANDARD</StorageClass></Contents>",
                key
            ));
        }
        xml.push_str("</ListBucketResult>");
        xml
    }

    fn lister(
        events: Vec<ReplayEvent>,
        max_pages: Option<u32>,
    ) -> (S3ObjectLister, StaticReplayClient) {
        let replay = StaticReplayClient::new(events);
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("test", "test", None, None, "replay"))
            .http_client(replay.clone())
            .build();
        (S3ObjectLister::new(Client::from_conf(config), max_pages), replay)
    }

    #[tokio::test]
    async fn follows_continuation_tokens() {
        let (lister, replay) = lister(
            vec![
                event(
                    200,
                    &page(&["downloads/u/1/a.bin", "downloads/u/1/b.bin"], Some("page-2")),
                ),
                event(200, &page(&["downloads/u/2/c.bin"], None)),
            ],
            None,
        );

        let listing = lister.list_objects("media-bucket", "downloads/u").await.unwrap();

        let keys: Vec<&str> = listing.objects.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(
            keys,
            vec!["downloads/u/1/a.bin", "downloads/u/1/b.bin", "downloads/u/2/c.bin"]
        );
        assert!(!listing.truncated);
        assert_eq!(listing.objects[0].size, 2048);
        assert_eq!(
            listing.objects[0].last_modified,
            Utc.with_ymd_and_hms(2023, 1, 9, 15, 0, 0).unwrap()
        );

        let requests: Vec<_> = replay.actual_requests().collect();
        assert_eq!(requests.len(), 2);
        assert!(requests[1].uri().contains("continuation-token=page-2"));
    }

    #[tokio::test]
    async fn page_cap_marks_listing_truncated() {
        let (lister, replay) = lister(
            vec![
                event(200, &page(&["downloads/u/1/a.bin"], Some("page-2"))),
                event(200, &page(&["downloads/u/2/b.bin"], None)),
            ],
            Some(1),
        );

        let listing = lister.list_objects("media-bucket", "downloads/u").await.unwrap();

        assert!(listing.truncated);
        assert_eq!(listing.objects.len(), 1);
        assert_eq!(replay.actual_requests().count(), 1);
    }

    #[tokio::test]
    async fn empty_listing_has_no_objects() {
        let (lister, _) = lister(vec![event(200, &page(&[], None))], None);

        let listing = lister.list_objects("media-bucket", "downloads/u").await.unwrap();

        assert!(listing.objects.is_empty());
        assert!(!listing.truncated);
    }

    #[tokio::test]
    async fn missing_bucket_is_reported() {
        let (lister, _) = lister(
            vec![event(
                404,
                r#"<?xml version="1.0" encoding="UTF-8"?><Error><Code>NoSuchBucket</Code><Message>The specified bucket does not exist</Message><BucketName>media-bucket</BucketName></Error>"#,
            )],
            None,
        );

        let result = lister.list_objects("media-bucket", "downloads/u").await;

        assert!(matches!(
            result,
            Err(ListingError::BucketNotFound(bucket)) if bucket == "media-bucket"
        ));
    }

    #[tokio::test]
    async fn access_denied_is_a_backend_error() {
        let (lister, _) = lister(
            vec![event(
                403,
                r#"<?xml version="1.0" encoding="UTF-8"?><Error><Code>AccessDenied</Code><Message>Access Denied</Message></Error>"#,
            )],
            None,
        );

        let result = lister.list_objects("media-bucket", "downloads/u").await;

        assert!(matches!(result, Err(ListingError::Backend(_))));
    }
}
