//! DynamoDB-backed configuration store.
//!
//! Existence is checked with `DescribeTable`; records are read with a full
//! `Scan` that follows `LastEvaluatedKey` until the table is exhausted.

use async_trait::async_trait;
use aws_sdk_dynamodb::{
    Client,
    error::{DisplayErrorContext, SdkError},
    types::AttributeValue,
};
use std::collections::HashMap;
use tracing::debug;

use crate::{
    models::config_record::{ConfigRecord, DATA_BUCKET_FIELD},
    services::config_store::{ConfigStore, ConfigStoreError, ConfigStoreResult},
};

#[derive(Clone)]
pub struct DynamoConfigStore {
    client: Client,
    table_name: String,
}

impl std::fmt::Debug for DynamoConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamoConfigStore")
            .field("table_name", &self.table_name)
            .finish()
    }
}

impl DynamoConfigStore {
    pub fn new(sdk_config: &aws_config::SdkConfig, table_name: impl Into<String>) -> Self {
        Self::from_client(Client::new(sdk_config), table_name)
    }

    pub fn from_client(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    fn item_to_record(item: &HashMap<String, AttributeValue>) -> ConfigRecord {
        ConfigRecord {
            data_bucket: item
                .get(DATA_BUCKET_FIELD)
                .and_then(|v| v.as_s().ok())
                .cloned(),
        }
    }
}

#[async_trait]
impl ConfigStore for DynamoConfigStore {
    async fn ensure_exists(&self) -> ConfigStoreResult<()> {
        match self
            .client
            .describe_table()
            .table_name(&self.table_name)
            .send()
            .await
        {
            Ok(_) => Ok(()),
            Err(SdkError::ServiceError(service_err))
                if service_err.err().is_resource_not_found_exception() =>
            {
                Err(ConfigStoreError::TableNotFound(self.table_name.clone()))
            }
            Err(err) => Err(ConfigStoreError::Backend(format!(
                "DynamoDB DescribeTable failed: {}",
                DisplayErrorContext(&err)
            ))),
        }
    }

    async fn scan(&self) -> ConfigStoreResult<Vec<ConfigRecord>> {
        let mut records = Vec::new();
        let mut last_evaluated_key = None;

        loop {
            let mut request = self.client.scan().table_name(&self.table_name);
            if let Some(key) = last_evaluated_key.take() {
                request = request.set_exclusive_start_key(Some(key));
            }

            let response = match request.send().await {
                Ok(response) => response,
                Err(SdkError::ServiceError(service_err))
                    if service_err.err().is_resource_not_found_exception() =>
                {
                    return Err(ConfigStoreError::TableNotFound(self.table_name.clone()));
                }
                Err(err) => {
                    return Err(ConfigStoreError::Backend(format!(
                        "DynamoDB Scan failed: {}",
                        DisplayErrorContext(&err)
                    )));
                }
            };

            records.extend(response.items().iter().map(Self::item_to_record));

            match response.last_evaluated_key() {
                Some(key) if !key.is_empty() => {
                    debug!("scan of {} continues past {} records", self.table_name, records.len());
                    last_evaluated_key = Some(key.clone());
                }
                _ => break,
            }
        }

        Ok(records)
    }
}
