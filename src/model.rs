//! Snapshot entity model.
//!
//! An [`Id`] names one logical resource snapshot; a [`VersionSnapshot`] pairs
//! that id with an opaque payload. Snapshots are immutable once persisted.

use std::fmt;

use thiserror::Error;

use crate::storage::key::DELIMITER;

/// Reasons an [`Id`] is rejected before any backend call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{0}' must not be empty")]
    EmptyField(&'static str),

    #[error(
        "Field '{field}' must not contain the key delimiter '{delim}': {value:?}",
        delim = DELIMITER
    )]
    ContainsDelimiter { field: &'static str, value: String },
}

/// Composite identifier of a version snapshot.
///
/// All four fields are required. Equality is structural.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Id {
    /// Unique identifier of the asset. Becomes the partition key.
    pub asset_id: String,
    /// Type of the resource, e.g. `config`.
    pub resource_type: String,
    /// Name of the resource.
    pub resource_name: String,
    /// Location of the resource, e.g. a region.
    pub location: String,
}

impl Id {
    pub fn new(
        asset_id: impl Into<String>,
        resource_type: impl Into<String>,
        resource_name: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            asset_id: asset_id.into(),
            resource_type: resource_type.into(),
            resource_name: resource_name.into(),
            location: location.into(),
        }
    }

    /// Check the preconditions that keep key derivation injective.
    ///
    /// Every field must be non-empty. The three fields joined into the sort
    /// key must not contain [`DELIMITER`]; `asset_id` stands alone as the
    /// partition key and may contain it.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields = [
            ("assetId", &self.asset_id),
            ("resourceType", &self.resource_type),
            ("resourceName", &self.resource_name),
            ("location", &self.location),
        ];
        for (name, value) in fields {
            if value.is_empty() {
                return Err(ValidationError::EmptyField(name));
            }
        }

        for &(name, value) in &fields[1..] {
            if value.contains(DELIMITER) {
                return Err(ValidationError::ContainsDelimiter {
                    field: name,
                    value: value.to_string(),
                });
            }
        }

        Ok(())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}@{}",
            self.asset_id, self.resource_type, self.resource_name, self.location
        )
    }
}

/// A point-in-time snapshot of a resource.
///
/// Identity is wholly determined by `id`. The store never interprets
/// `snapshot_spec`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSnapshot {
    pub id: Id,
    pub snapshot_spec: Vec<u8>,
}

impl VersionSnapshot {
    pub fn new(id: Id, snapshot_spec: impl Into<Vec<u8>>) -> Self {
        Self {
            id,
            snapshot_spec: snapshot_spec.into(),
        }
    }

    /// Validate the embedded id. Empty payloads are allowed.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.id.validate()
    }
}
