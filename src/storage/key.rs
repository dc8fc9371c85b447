//! Identifier to backend key derivation.
//!
//! ```text
//! partitionKey = assetId
//! sortKey      = resourceType ^ resourceName ^ location
//! ```

use std::fmt;

use crate::model::Id;

/// Separator between the fields joined into the sort key.
pub const DELIMITER: char = '^';

/// Attribute name of the partition key in stored documents.
pub const PARTITION_KEY_ATTR: &str = "partitionKey";

/// Attribute name of the sort key in stored documents.
pub const SORT_KEY_ATTR: &str = "sortKey";

/// Physical two-part key of a stored record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey {
    pub partition_key: String,
    pub sort_key: String,
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.partition_key, self.sort_key)
    }
}

/// Derive the storage key for an id.
///
/// Pure and deterministic. Injective only for ids that pass
/// [`Id::validate`]; the store validates before calling this.
pub fn derive_key(id: &Id) -> StorageKey {
    StorageKey {
        partition_key: id.asset_id.clone(),
        sort_key: format!(
            "{}{d}{}{d}{}",
            id.resource_type,
            id.resource_name,
            id.location,
            d = DELIMITER
        ),
    }
}
