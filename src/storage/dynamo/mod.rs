//! DynamoDB backend.
//!
//! Table schema:
//! - `partitionKey` (String, HASH): asset id
//! - `sortKey` (String, RANGE): `{resourceType}^{resourceName}^{location}`
//!
//! Remaining attributes follow the document layout in `storage::marshal`.
//! Table provisioning is left to infrastructure.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_sdk_dynamodb::error::{DisplayErrorContext, SdkError};
use aws_sdk_dynamodb::operation::get_item::GetItemError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::AttributeValue as DynamoValue;
use aws_sdk_dynamodb::Client;
use tracing::{debug, info};

use crate::storage::attribute::{AttributeMap, AttributeValue};
use crate::storage::backend::{BackendError, PutOutcome, SnapshotBackend};
use crate::storage::key::{StorageKey, PARTITION_KEY_ATTR, SORT_KEY_ATTR};

const KEYS_ABSENT_CONDITION: &str = "attribute_not_exists(#pk) AND attribute_not_exists(#sk)";

/// DynamoDB implementation of [`SnapshotBackend`].
pub struct DynamoBackend {
    client: Client,
    table_name: String,
}

impl DynamoBackend {
    /// Create a backend using credentials and region from the environment.
    ///
    /// `region` overrides the environment's region; `endpoint` points the
    /// client at DynamoDB Local or LocalStack. SDK retries are disabled: a
    /// resent conditional put could report the caller's own write as
    /// `ConditionFailed`.
    pub async fn new(
        table_name: impl Into<String>,
        region: Option<&str>,
        endpoint: Option<&str>,
    ) -> Self {
        let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .retry_config(RetryConfig::disabled());

        if let Some(region) = region {
            config_loader = config_loader.region(aws_config::Region::new(region.to_string()));
        }

        let config = config_loader.load().await;

        let client = match endpoint {
            Some(endpoint) => {
                let dynamo_config = aws_sdk_dynamodb::config::Builder::from(&config)
                    .endpoint_url(endpoint)
                    .build();
                Client::from_conf(dynamo_config)
            }
            None => Client::new(&config),
        };

        let table_name = table_name.into();
        info!(
            table = %table_name,
            region = ?region,
            endpoint = ?endpoint,
            "Connected to DynamoDB for version snapshots"
        );

        Self { client, table_name }
    }

    /// Create with explicit client (for testing).
    ///
    /// The client should be built with `RetryConfig::disabled()`.
    pub fn with_client(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

#[async_trait]
impl SnapshotBackend for DynamoBackend {
    async fn get_item(&self, key: &StorageKey) -> Result<Option<AttributeMap>, BackendError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key(PARTITION_KEY_ATTR, DynamoValue::S(key.partition_key.clone()))
            .key(SORT_KEY_ATTR, DynamoValue::S(key.sort_key.clone()))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| classify("get_item", &e, is_throttled_get(&e)))?;

        match output.item {
            Some(item) if !item.is_empty() => {
                debug!(key = %key, "Fetched item from DynamoDB");
                from_dynamo_item(item).map(Some)
            }
            _ => Ok(None),
        }
    }

    async fn put_item_if_not_exists(
        &self,
        key: &StorageKey,
        item: AttributeMap,
    ) -> Result<PutOutcome, BackendError> {
        let result = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(to_dynamo_item(item)))
            .condition_expression(KEYS_ABSENT_CONDITION)
            .expression_attribute_names("#pk", PARTITION_KEY_ATTR)
            .expression_attribute_names("#sk", SORT_KEY_ATTR)
            .send()
            .await;

        match result {
            Ok(_) => {
                debug!(key = %key, "Stored item in DynamoDB");
                Ok(PutOutcome::Written)
            }
            Err(SdkError::ServiceError(service))
                if service.err().is_conditional_check_failed_exception() =>
            {
                Ok(PutOutcome::ConditionFailed)
            }
            Err(e) if put_outcome_unknown(&e) => Err(BackendError::outcome_unknown(format!(
                "DynamoDB put_item failed after dispatch: {}",
                DisplayErrorContext(&e)
            ))),
            Err(e) => {
                let throttled = is_throttled_put(&e);
                Err(classify("put_item", &e, throttled))
            }
        }
    }
}

fn is_throttled_get<R>(err: &SdkError<GetItemError, R>) -> bool {
    match err {
        SdkError::ServiceError(service) => {
            let e = service.err();
            e.is_provisioned_throughput_exceeded_exception()
                || e.is_request_limit_exceeded()
                || e.is_internal_server_error()
        }
        _ => false,
    }
}

fn is_throttled_put<R>(err: &SdkError<PutItemError, R>) -> bool {
    match err {
        SdkError::ServiceError(service) => {
            let e = service.err();
            e.is_provisioned_throughput_exceeded_exception() || e.is_request_limit_exceeded()
        }
        _ => false,
    }
}

/// Whether a failed put may still have been applied by the service.
///
/// Covers failures after the request was sent: client-side timeouts, an
/// unreadable response, and server errors DynamoDB documents as possibly
/// applied.
fn put_outcome_unknown<R>(err: &SdkError<PutItemError, R>) -> bool {
    match err {
        SdkError::TimeoutError(_) | SdkError::ResponseError(_) => true,
        SdkError::DispatchFailure(failure) => failure.is_timeout(),
        SdkError::ServiceError(service) => service.err().is_internal_server_error(),
        _ => false,
    }
}

/// Map an SDK error to a [`BackendError`].
///
/// Transport failures and throttling are retryable; any other service
/// error (validation, missing table, auth) is not.
fn classify<E, R>(operation: &str, err: &SdkError<E, R>, throttled: bool) -> BackendError
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let message = format!("DynamoDB {} failed: {}", operation, DisplayErrorContext(err));
    let retryable = throttled
        || matches!(
            err,
            SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) | SdkError::ResponseError(_)
        );
    BackendError {
        message,
        retryable,
        outcome_unknown: false,
    }
}

fn to_dynamo_item(item: AttributeMap) -> HashMap<String, DynamoValue> {
    item.into_iter()
        .map(|(name, value)| (name, to_dynamo(value)))
        .collect()
}

fn to_dynamo(value: AttributeValue) -> DynamoValue {
    match value {
        AttributeValue::S(s) => DynamoValue::S(s),
        AttributeValue::N(n) => DynamoValue::N(n),
        AttributeValue::B(b) => DynamoValue::B(Blob::new(b)),
        AttributeValue::Bool(b) => DynamoValue::Bool(b),
        AttributeValue::Null => DynamoValue::Null(true),
        AttributeValue::L(values) => DynamoValue::L(values.into_iter().map(to_dynamo).collect()),
        AttributeValue::M(map) => DynamoValue::M(to_dynamo_item(map)),
    }
}

fn from_dynamo_item(item: HashMap<String, DynamoValue>) -> Result<AttributeMap, BackendError> {
    item.into_iter()
        .map(|(name, value)| from_dynamo(value).map(|v| (name, v)))
        .collect()
}

fn from_dynamo(value: DynamoValue) -> Result<AttributeValue, BackendError> {
    Ok(match value {
        DynamoValue::S(s) => AttributeValue::S(s),
        DynamoValue::N(n) => AttributeValue::N(n),
        DynamoValue::B(b) => AttributeValue::B(b.into_inner()),
        DynamoValue::Bool(b) => AttributeValue::Bool(b),
        DynamoValue::Null(_) => AttributeValue::Null,
        DynamoValue::L(values) => AttributeValue::L(
            values
                .into_iter()
                .map(from_dynamo)
                .collect::<Result<_, _>>()?,
        ),
        DynamoValue::M(map) => AttributeValue::M(from_dynamo_item(map)?),
        DynamoValue::Ss(values) => {
            AttributeValue::L(values.into_iter().map(AttributeValue::S).collect())
        }
        DynamoValue::Ns(values) => {
            AttributeValue::L(values.into_iter().map(AttributeValue::N).collect())
        }
        DynamoValue::Bs(values) => AttributeValue::L(
            values
                .into_iter()
                .map(|b| AttributeValue::B(b.into_inner()))
                .collect(),
        ),
        other => {
            return Err(BackendError::fatal(format!(
                "Unsupported DynamoDB attribute value: {:?}",
                other
            )))
        }
    })
}
