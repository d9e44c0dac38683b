//! File entity model and content classification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Coarse content category derived from sniffed MIME content at upload
/// time. Never inferred from the filename extension, which guards against
/// spoofing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "file_kind", rename_all = "lowercase")]
pub enum FileKind {
    /// Any `image/*` MIME type.
    Image,
    /// Any `video/*` MIME type.
    Video,
    /// Any `audio/*` MIME type.
    Audio,
    /// Any MIME type containing `pdf`.
    Pdf,
    /// Everything else, including unsniffable content.
    None,
}

impl FileKind {
    /// Classify a sniffed MIME string into a closed content category.
    pub fn from_mime(mime: Option<&str>) -> Self {
        match mime {
            Some(m) if m.starts_with("image") => Self::Image,
            Some(m) if m.starts_with("video") => Self::Video,
            Some(m) if m.starts_with("audio") => Self::Audio,
            Some(m) if m.contains("pdf") => Self::Pdf,
            _ => Self::None,
        }
    }
}

/// A file stored in a user's directory tree.
///
/// Shares the sibling-uniqueness namespace with [`crate::Folder`]: no two
/// entries under the same parent may carry the same name for one owner.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct File {
    /// Unique file identifier.
    pub id: i64,
    /// File name (sanitized, equals the on-disk name).
    pub name: String,
    /// Sniffed MIME type, if the content was recognizable.
    pub mime: Option<String>,
    /// Content category derived from `mime` at creation.
    pub kind: FileKind,
    /// User-local star flag.
    pub is_starred: bool,
    /// Whether the file is visible in global search.
    pub is_public: bool,
    /// Absolute file path. Always the verbatim path returned by the vault.
    pub path: String,
    /// The file owner. Immutable.
    pub user_id: i64,
    /// Containing folder (None for root-level files).
    pub folder_id: Option<i64>,
    /// When the file was created.
    pub created_at: DateTime<Utc>,
    /// When the file was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Data required to create a new file row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFile {
    /// Sanitized file name.
    pub name: String,
    /// Sniffed MIME type.
    pub mime: Option<String>,
    /// Content category.
    pub kind: FileKind,
    /// Absolute path returned by the vault.
    pub path: String,
    /// The file owner.
    pub user_id: i64,
    /// Containing folder (None for root-level).
    pub folder_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_sniffed_mime() {
        assert_eq!(FileKind::from_mime(Some("image/png")), FileKind::Image);
        assert_eq!(FileKind::from_mime(Some("video/mp4")), FileKind::Video);
        assert_eq!(FileKind::from_mime(Some("audio/mpeg")), FileKind::Audio);
        assert_eq!(FileKind::from_mime(Some("application/pdf")), FileKind::Pdf);
        assert_eq!(FileKind::from_mime(Some("text/plain")), FileKind::None);
        assert_eq!(FileKind::from_mime(Option::None), FileKind::None);
    }
}
