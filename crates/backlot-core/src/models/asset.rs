//! Catalog asset model and canonical-GUID derivation.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use utoipa::ToSchema;

/// Asset names carrying this prefix are recognized as canonical media items
/// and linked to a [`super::MediaFile`] during ingestion.
pub const CANONICAL_GUID_PREFIX: &str = "cpb-aacip";

/// Media kind enum (matches the `media_kind` database enum)
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize, ToSchema)]
#[sqlx(type_name = "media_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
}

/// An asset record mirrored from the external catalog, keyed by the
/// catalog's own id. Upserts replace all non-key attributes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CatalogAsset {
    pub id: String,
    pub name: String,
    pub size: i64,
    pub kind: Option<MediaKind>,
    pub format: Option<String>,
    #[schema(value_type = Object)]
    pub thumbnails: Option<JsonValue>,
    #[serde(default)]
    pub media_file_guid: Option<String>,
}

impl CatalogAsset {
    /// Canonical GUID derived from this asset's name, if the name carries
    /// the canonical prefix.
    pub fn canonical_guid(&self) -> Option<String> {
        canonical_guid_for_asset(&self.name)
    }
}

/// Derive the canonical media GUID from an asset file name: the name
/// truncated at the first occurrence of `_`, `.`, or the literal `-dupe`
/// marker. Names without the canonical prefix yield `None`.
pub fn canonical_guid_for_asset(name: &str) -> Option<String> {
    if !name.starts_with(CANONICAL_GUID_PREFIX) {
        return None;
    }
    let cut = [
        name.find('_'),
        name.find('.'),
        name.find("-dupe"),
    ]
    .into_iter()
    .flatten()
    .min();
    match cut {
        Some(i) => Some(name[..i].to_string()),
        None => Some(name.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guid_truncates_at_first_underscore() {
        assert_eq!(
            canonical_guid_for_asset("cpb-aacip-000-12345678_dupe.mp4").as_deref(),
            Some("cpb-aacip-000-12345678")
        );
    }

    #[test]
    fn test_guid_truncates_at_first_dot() {
        assert_eq!(
            canonical_guid_for_asset("cpb-aacip-191-29b5mpvv.mp4").as_deref(),
            Some("cpb-aacip-191-29b5mpvv")
        );
    }

    #[test]
    fn test_guid_truncates_at_dupe_marker() {
        assert_eq!(
            canonical_guid_for_asset("cpb-aacip-42-8697r7sq-dupe.h264.mp4").as_deref(),
            Some("cpb-aacip-42-8697r7sq")
        );
    }

    #[test]
    fn test_guid_without_separators_is_whole_name() {
        assert_eq!(
            canonical_guid_for_asset("cpb-aacip-507-zw18k75z4h").as_deref(),
            Some("cpb-aacip-507-zw18k75z4h")
        );
    }

    #[test]
    fn test_non_canonical_names_yield_none() {
        assert_eq!(canonical_guid_for_asset("b-roll_tape_3.mov"), None);
        assert_eq!(canonical_guid_for_asset(""), None);
    }
}
