//! ListService: resolves the data bucket, lists a user's downloads and
//! renders the manifest response.
//!
//! Every call ends in exactly one `HandlerResponse`. Configuration failures
//! become error responses; listing failures are logged and produce an empty
//! manifest.

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::{
    errors::ListError,
    models::{manifest::ManifestItem, request::ListRequest, response::HandlerResponse},
    services::{
        config_store::{ConfigStore, ConfigStoreError, ConfigStoreResult},
        manifest::{ManifestOptions, build_manifest},
        object_lister::{ListingError, ObjectLister},
    },
};

/// Root of the per-user key space.
pub const DOWNLOAD_ROOT: &str = "downloads";

/// Key prefix listed for `uid`.
pub fn user_prefix(uid: &str) -> String {
    format!("{}/{}", DOWNLOAD_ROOT, uid)
}

#[derive(Clone)]
pub struct ListService {
    config_store: Arc<dyn ConfigStore>,
    lister: Arc<dyn ObjectLister>,
    options: ManifestOptions,
}

impl ListService {
    pub fn new(
        config_store: Arc<dyn ConfigStore>,
        lister: Arc<dyn ObjectLister>,
        options: ManifestOptions,
    ) -> Self {
        Self {
            config_store,
            lister,
            options,
        }
    }

    /// Handle one request end to end.
    pub async fn handle(&self, request: &ListRequest) -> HandlerResponse {
        match self.list(request).await {
            Ok(items) => HandlerResponse::manifest(&items),
            Err(err) => {
                match &err {
                    ListError::BadRequest(_) => warn!("rejecting request: {}", err),
                    _ => error!("cannot list downloads: {}", err),
                }
                HandlerResponse::from(err)
            }
        }
    }

    /// Produce the manifest for the request's uid.
    pub async fn list(&self, request: &ListRequest) -> Result<Vec<ManifestItem>, ListError> {
        let uid = request.uid()?;
        let bucket = self.resolve_bucket().await?;
        let prefix = user_prefix(&uid);
        info!("listing downloads for {} in bucket {} under {}", uid, bucket, prefix);

        let objects = match self.lister.list_objects(&bucket, &prefix).await {
            Ok(listing) => {
                if listing.truncated {
                    warn!("manifest for {} built from a truncated listing", uid);
                }
                listing.objects
            }
            Err(err @ ListingError::BucketNotFound(_)) => {
                error!("no objects found in bucket: {}", err);
                Vec::new()
            }
            Err(err) => {
                warn!("no objects found in bucket: {}", err);
                Vec::new()
            }
        };

        let items = build_manifest(&uid, objects, &self.options);
        info!("manifest for {} holds {} files", uid, items.len());
        Ok(items)
    }

    /// Find the data bucket named by the single configuration record.
    pub async fn resolve_bucket(&self) -> Result<String, ListError> {
        self.config_store.ensure_exists().await.map_err(|err| match err {
            ConfigStoreError::TableNotFound(table) => ListError::ConfigurationMissing(table),
            other => ListError::ConfigurationUnavailable(other.to_string()),
        })?;

        let records = self.config_store.scan().await.map_err(|err| match err {
            ConfigStoreError::TableNotFound(table) => ListError::ConfigurationMissing(table),
            other => ListError::ConfigurationReadError(other.to_string()),
        })?;

        match records.as_slice() {
            [] => Err(ListError::ConfigurationEmpty),
            [record] => record
                .data_bucket
                .clone()
                .ok_or(ListError::ConfigurationInvalid),
            many => Err(ListError::ConfigurationAmbiguous(many.len())),
        }
    }

    /// Readiness check: does the configuration store answer?
    pub async fn check_config_store(&self) -> ConfigStoreResult<()> {
        self.config_store.ensure_exists().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{config_record::ConfigRecord, object::ObjectEntry},
        services::{config_store::StaticConfigStore, object_lister::Listing},
    };
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use chrono::{TimeZone, Utc};
    use std::sync::Mutex;

    enum Table {
        Missing,
        Down,
        ScanFails,
        Rows(Vec<ConfigRecord>),
    }

    struct FakeConfigStore(Table);

    #[async_trait]
    impl ConfigStore for FakeConfigStore {
        async fn ensure_exists(&self) -> ConfigStoreResult<()> {
            match &self.0 {
                Table::Missing => Err(ConfigStoreError::TableNotFound("BDDMainTable".into())),
                Table::Down => Err(ConfigStoreError::Backend("connection reset".into())),
                _ => Ok(()),
            }
        }

        async fn scan(&self) -> ConfigStoreResult<Vec<ConfigRecord>> {
            match &self.0 {
                Table::Rows(rows) => Ok(rows.clone()),
                _ => Err(ConfigStoreError::Backend("scan throttled".into())),
            }
        }
    }

    #[derive(Default)]
    struct FakeLister {
        objects: Vec<ObjectEntry>,
        fail: bool,
        truncated: bool,
        calls: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl ObjectLister for FakeLister {
        async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Listing, ListingError> {
            self.calls
                .lock()
                .unwrap()
                .push((bucket.to_string(), prefix.to_string()));
            if self.fail {
                return Err(ListingError::Backend("access denied".into()));
            }
            Ok(Listing {
                objects: self.objects.clone(),
                truncated: self.truncated,
            })
        }
    }

    fn service(table: Table, lister: Arc<FakeLister>) -> ListService {
        ListService::new(
            Arc::new(FakeConfigStore(table)),
            lister,
            ManifestOptions::default(),
        )
    }

    fn request(uid: &str) -> ListRequest {
        ListRequest::from_body(format!(r#"{{"uid":"{}"}}"#, uid))
    }

    fn object(key: &str, size: u64) -> ObjectEntry {
        ObjectEntry {
            key: key.to_string(),
            size,
            last_modified: Utc.with_ymd_and_hms(2023, 1, 9, 16, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn lists_user_prefix_in_configured_bucket() {
        let lister = Arc::new(FakeLister {
            objects: vec![
                object("downloads/u/1673186400000/a.bin", 2048),
                object("downloads/u/1673276400000/b.bin", 4096),
            ],
            ..Default::default()
        });
        let svc = service(Table::Rows(vec![ConfigRecord::with_bucket("b")]), lister.clone());

        let response = svc.handle(&request("u")).await;

        assert_eq!(response.status_code, 200);
        assert_eq!(
            *lister.calls.lock().unwrap(),
            vec![("b".to_string(), "downloads/u".to_string())]
        );
        let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body[0]["FileName"], "b.bin");
        assert_eq!(body[1]["FileName"], "a.bin");
    }

    #[tokio::test]
    async fn improper_call_skips_configuration() {
        let lister = Arc::new(FakeLister::default());
        let svc = service(Table::Missing, lister.clone());

        let response = svc.handle(&ListRequest::from_body("{}")).await;

        assert_eq!(response.status_code, 400);
        assert!(response.body.contains("Improper Call"));
        assert!(lister.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn record_count_must_be_one() {
        for (rows, headline) in [
            (vec![], "empty item"),
            (
                vec![ConfigRecord::with_bucket("a"), ConfigRecord::with_bucket("b")],
                "too many items",
            ),
        ] {
            for uid in ["u", "someone-else"] {
                let svc = service(Table::Rows(rows.clone()), Arc::new(FakeLister::default()));
                let response = svc.handle(&request(uid)).await;
                assert_eq!(response.status_code, 400);
                assert!(response.body.contains(headline), "{}", response.body);
            }
        }
    }

    #[tokio::test]
    async fn configuration_failures_map_per_call_site() {
        let cases = [
            (Table::Missing, StatusCode::BAD_REQUEST, "Missing Configuration"),
            (Table::Down, StatusCode::SERVICE_UNAVAILABLE, "Configuration Unavailable"),
            (Table::ScanFails, StatusCode::BAD_REQUEST, "missing item."),
            (
                Table::Rows(vec![ConfigRecord { data_bucket: None }]),
                StatusCode::BAD_REQUEST,
                "missing data-bucket.",
            ),
        ];

        for (table, status, headline) in cases {
            let svc = service(table, Arc::new(FakeLister::default()));
            let response = svc.handle(&request("u")).await;
            assert_eq!(response.status(), status);
            assert!(response.body.contains(headline), "{}", response.body);
        }
    }

    #[tokio::test]
    async fn listing_failure_yields_empty_manifest() {
        let lister = Arc::new(FakeLister {
            fail: true,
            ..Default::default()
        });
        let svc = ListService::new(
            Arc::new(StaticConfigStore::new("b")),
            lister,
            ManifestOptions::default(),
        );

        let response = svc.handle(&request("u")).await;

        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, "[]");
    }

    #[tokio::test]
    async fn truncated_listing_still_returns_manifest() {
        let lister = Arc::new(FakeLister {
            objects: vec![
                object("downloads/u/1673186400000/a.bin", 2048),
                object("downloads/u/1673276400000/b.bin", 4096),
            ],
            truncated: true,
            ..Default::default()
        });
        let svc = service(Table::Rows(vec![ConfigRecord::with_bucket("b")]), lister);

        let response = svc.handle(&request("u")).await;

        assert_eq!(response.status_code, 200);
        let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body.as_array().unwrap().len(), 2);
        assert_eq!(body[0]["FileName"], "b.bin");
    }

    #[test]
    fn prefix_is_rooted_at_downloads() {
        assert_eq!(user_prefix("u"), "downloads/u");
    }
}
