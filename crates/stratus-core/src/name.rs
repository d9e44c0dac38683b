//! Name policy for user-supplied folder and file names.
//!
//! Every name that reaches the hierarchy coordinator must first pass
//! [`parse_name`] and then the matching character-set predicate. The
//! basename check is the primary defense against directory traversal:
//! a legal name is exactly its own basename, so separators and `..`
//! segments can never survive into a joined path.

use std::ffi::OsStr;
use std::path::Path;

/// Trim a raw name and accept it only if the trimmed string equals its own
/// basename. Returns `None` for empty results and for anything containing
/// path separators or traversal segments.
pub fn parse_name(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match Path::new(trimmed).file_name() {
        Some(base) if base == OsStr::new(trimmed) => Some(trimmed),
        _ => None,
    }
}

/// Whether a folder name uses only the allowed character set:
/// alphanumerics, underscore, hyphen, and space.
pub fn is_folder_name_safe(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ' '))
}

/// Whether a file name uses only the allowed character set. File names
/// additionally allow `.` for extensions.
pub fn is_file_name_safe(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ' ' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_name_accepts_plain_names() {
        assert_eq!(parse_name("Docs"), Some("Docs"));
        assert_eq!(parse_name("  report.pdf  "), Some("report.pdf"));
        assert_eq!(parse_name("my folder"), Some("my folder"));
    }

    #[test]
    fn test_parse_name_rejects_empty() {
        assert_eq!(parse_name(""), None);
        assert_eq!(parse_name("   "), None);
        assert_eq!(parse_name("\t\n"), None);
    }

    #[test]
    fn test_parse_name_rejects_separators() {
        assert_eq!(parse_name("a/b"), None);
        assert_eq!(parse_name("/etc"), None);
        assert_eq!(parse_name("nested/../../escape"), None);
    }

    #[test]
    fn test_parse_name_rejects_traversal_segments() {
        assert_eq!(parse_name(".."), None);
        assert_eq!(parse_name(" .. "), None);
        assert_eq!(parse_name("../secret"), None);
    }

    #[test]
    fn test_folder_name_charset() {
        assert!(is_folder_name_safe("Docs"));
        assert!(is_folder_name_safe("my_folder-2 final"));
        assert!(!is_folder_name_safe("notes.txt"));
        assert!(!is_folder_name_safe("bad!name"));
        assert!(!is_folder_name_safe(""));
    }

    #[test]
    fn test_file_name_charset() {
        assert!(is_file_name_safe("a.png"));
        assert!(is_file_name_safe("report_v2-final.pdf"));
        assert!(!is_file_name_safe("semi;colon"));
        assert!(!is_file_name_safe("uni\u{2603}code"));
        assert!(!is_file_name_safe(""));
    }
}
