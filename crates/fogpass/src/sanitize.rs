//! Helpers for cleaning names before they reach the filesystem or tracing
//! span attributes.

use std::path::Path;

/// Returns only the filename component of a path (no directory).
///
/// Safe for span fields: reveals the file name without exposing the full path.
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Makes an uploaded file name safe to embed in a scratch file name.
///
/// Anything outside `[A-Za-z0-9._-]` becomes `_`, which also removes path
/// separators. An empty name becomes `upload`.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_path_returns_filename() {
        assert_eq!(
            redact_path(Path::new("/var/fogpass/uploads/abc_route.csv")),
            "abc_route.csv"
        );
    }

    #[test]
    fn test_redact_path_no_filename() {
        assert_eq!(redact_path(Path::new("/")), "<unknown>");
    }

    #[test]
    fn test_sanitize_keeps_safe_characters() {
        assert_eq!(sanitize_file_name("Route-7_v2.xlsx"), "Route-7_v2.xlsx");
    }

    #[test]
    fn test_sanitize_replaces_separators_and_spaces() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_file_name("my landmarks (final).csv"), "my_landmarks__final_.csv");
        assert_eq!(sanitize_file_name("C:\\data\\düsseldorf.csv"), "C__data_d_sseldorf.csv");
    }

    #[test]
    fn test_sanitize_empty_name() {
        assert_eq!(sanitize_file_name(""), "upload");
        assert_eq!(sanitize_file_name("   "), "upload");
    }
}
