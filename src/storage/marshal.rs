//! Record marshalling between [`VersionSnapshot`] and [`AttributeMap`].
//!
//! Stored document layout:
//! ```text
//! {
//!   partitionKey: S,   // = assetId
//!   sortKey:      S,   // = resourceType ^ resourceName ^ location
//!   assetId:      S,
//!   resourceType: S,
//!   resourceName: S,
//!   location:     S,
//!   snapshotSpec: B
//! }
//! ```

use thiserror::Error;

use super::attribute::{AttributeMap, AttributeValue};
use super::key::{derive_key, StorageKey, PARTITION_KEY_ATTR, SORT_KEY_ATTR};
use crate::model::{Id, VersionSnapshot};

pub const ASSET_ID_ATTR: &str = "assetId";
pub const RESOURCE_TYPE_ATTR: &str = "resourceType";
pub const RESOURCE_NAME_ATTR: &str = "resourceName";
pub const LOCATION_ATTR: &str = "location";
pub const SNAPSHOT_SPEC_ATTR: &str = "snapshotSpec";

/// A stored document could not be turned back into a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Missing attribute '{0}'")]
    MissingAttribute(&'static str),

    #[error("Attribute '{attribute}' has type {found}, expected {expected}")]
    WrongType {
        attribute: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Stored key {stored} does not match key {derived} derived from the record")]
    KeyMismatch {
        stored: StorageKey,
        derived: StorageKey,
    },

    #[error("Record holds id {found}, requested {requested}")]
    IdMismatch { requested: Id, found: Id },
}

/// Encode a snapshot and its derived keys into a backend document.
pub fn encode(snapshot: &VersionSnapshot) -> AttributeMap {
    let key = derive_key(&snapshot.id);
    let id = &snapshot.id;

    let mut item = AttributeMap::with_capacity(7);
    item.insert(
        PARTITION_KEY_ATTR.to_string(),
        AttributeValue::S(key.partition_key),
    );
    item.insert(SORT_KEY_ATTR.to_string(), AttributeValue::S(key.sort_key));
    item.insert(
        ASSET_ID_ATTR.to_string(),
        AttributeValue::S(id.asset_id.clone()),
    );
    item.insert(
        RESOURCE_TYPE_ATTR.to_string(),
        AttributeValue::S(id.resource_type.clone()),
    );
    item.insert(
        RESOURCE_NAME_ATTR.to_string(),
        AttributeValue::S(id.resource_name.clone()),
    );
    item.insert(
        LOCATION_ATTR.to_string(),
        AttributeValue::S(id.location.clone()),
    );
    item.insert(
        SNAPSHOT_SPEC_ATTR.to_string(),
        AttributeValue::B(snapshot.snapshot_spec.clone()),
    );
    item
}

/// Decode a backend document into a snapshot.
///
/// Extra attributes are ignored. Key attributes are optional, but when
/// present they must agree with the key derived from the decoded id.
pub fn decode(item: &AttributeMap) -> Result<VersionSnapshot, DecodeError> {
    let id = Id {
        asset_id: required_s(item, ASSET_ID_ATTR)?.to_string(),
        resource_type: required_s(item, RESOURCE_TYPE_ATTR)?.to_string(),
        resource_name: required_s(item, RESOURCE_NAME_ATTR)?.to_string(),
        location: required_s(item, LOCATION_ATTR)?.to_string(),
    };
    let snapshot_spec = required_b(item, SNAPSHOT_SPEC_ATTR)?.to_vec();

    let derived = derive_key(&id);
    let stored = StorageKey {
        partition_key: optional_s(item, PARTITION_KEY_ATTR)?
            .unwrap_or(derived.partition_key.as_str())
            .to_string(),
        sort_key: optional_s(item, SORT_KEY_ATTR)?
            .unwrap_or(derived.sort_key.as_str())
            .to_string(),
    };
    if stored != derived {
        return Err(DecodeError::KeyMismatch { stored, derived });
    }

    Ok(VersionSnapshot { id, snapshot_spec })
}

fn required<'a>(
    item: &'a AttributeMap,
    attribute: &'static str,
) -> Result<&'a AttributeValue, DecodeError> {
    item.get(attribute)
        .ok_or(DecodeError::MissingAttribute(attribute))
}

fn required_s<'a>(item: &'a AttributeMap, attribute: &'static str) -> Result<&'a str, DecodeError> {
    let value = required(item, attribute)?;
    value.as_s().ok_or(DecodeError::WrongType {
        attribute,
        expected: "string",
        found: value.kind(),
    })
}

fn required_b<'a>(
    item: &'a AttributeMap,
    attribute: &'static str,
) -> Result<&'a [u8], DecodeError> {
    let value = required(item, attribute)?;
    value.as_b().ok_or(DecodeError::WrongType {
        attribute,
        expected: "binary",
        found: value.kind(),
    })
}

fn optional_s<'a>(
    item: &'a AttributeMap,
    attribute: &'static str,
) -> Result<Option<&'a str>, DecodeError> {
    match item.get(attribute) {
        None => Ok(None),
        Some(value) => value.as_s().map(Some).ok_or(DecodeError::WrongType {
            attribute,
            expected: "string",
            found: value.kind(),
        }),
    }
}
