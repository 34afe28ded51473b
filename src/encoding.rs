//! Charset-name resolution for the XML declaration.
//!
//! Maps platform text-encoding labels (`"utf8"`, `"latin1"`, `"ISO_8859-1"`)
//! to the canonical charset name advertised in an XML declaration.
//! Resolution goes through the WHATWG encoding label registry, which covers
//! the aliases in common use. A label that cannot be resolved yields `None`,
//! and the declaration simply omits its encoding attribute; an unknown
//! label is never a hard error.

use encoding_rs::Encoding;

/// Resolves a platform encoding label to a canonical charset name.
///
/// Matching is case-insensitive and tolerant of surrounding whitespace.
/// Returns `None` when the label is unknown.
///
/// # Example
///
/// ```rust
/// use xmlwriter_rs::encoding::resolve_charset;
///
/// assert_eq!(resolve_charset("utf8"), Some("UTF-8"));
/// assert_eq!(resolve_charset("no-such-encoding"), None);
/// ```
pub fn resolve_charset(label: &str) -> Option<&'static str> {
    Encoding::for_label(label.trim().as_bytes()).map(|enc| enc.name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_labels() {
        assert_eq!(resolve_charset("UTF-8"), Some("UTF-8"));
        assert_eq!(resolve_charset("utf8"), Some("UTF-8"));
        assert_eq!(resolve_charset("utf-16le"), Some("UTF-16LE"));
        assert_eq!(resolve_charset("euc-jp"), Some("EUC-JP"));
    }

    #[test]
    fn test_legacy_aliases() {
        // latin1 and its ISO spellings all canonicalize to windows-1252
        assert_eq!(resolve_charset("latin1"), Some("windows-1252"));
        assert_eq!(resolve_charset("iso-8859-1"), Some("windows-1252"));
        assert_eq!(resolve_charset("ISO_8859-1"), Some("windows-1252"));
    }

    #[test]
    fn test_whitespace_and_case() {
        assert_eq!(resolve_charset("  Utf-8 "), Some("UTF-8"));
    }

    #[test]
    fn test_unknown_label() {
        assert_eq!(resolve_charset("no-such-encoding"), None);
        assert_eq!(resolve_charset(""), None);
    }
}
