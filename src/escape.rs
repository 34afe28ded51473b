//! Escaping for XML text content and attribute values.
//!
//! Text content escapes the markup-significant characters (`&`, `<`, `>`)
//! plus bare carriage returns, which a conformant parser would otherwise
//! normalize away. Attribute values additionally escape the active quote
//! character and all other C0 controls as numeric character references, so
//! a round trip through a parser recovers the original string exactly.

use std::borrow::Cow;

/// Returns true if `c` forces an escape in element text content.
fn text_needs_escape(c: char) -> bool {
    matches!(c, '&' | '<' | '>' | '\r')
}

/// Escapes a string for use as element text content.
///
/// Clean input is returned borrowed without allocating.
pub fn escape_text(content: &str) -> Cow<'_, str> {
    if !content.chars().any(text_needs_escape) {
        return Cow::Borrowed(content);
    }

    let mut out = String::with_capacity(content.len() + 8);
    for c in content.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#13;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Escapes a string for use inside an attribute value delimited by `quote`.
///
/// `quote` is the active quote character (`b'"'` or `b'\''`); only the
/// active one is escaped, so values may freely contain the other.
pub fn escape_attr(content: &str, quote: u8) -> Cow<'_, str> {
    let needs_escape = |c: char| {
        matches!(c, '&' | '<' | '>') || c == quote as char || (c.is_ascii() && (c as u8) < 0x20)
    };
    if !content.chars().any(needs_escape) {
        return Cow::Borrowed(content);
    }

    let mut out = String::with_capacity(content.len() + 8);
    for c in content.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if quote == b'"' => out.push_str("&quot;"),
            '\'' if quote == b'\'' => out.push_str("&apos;"),
            c if c.is_ascii() && (c as u8) < 0x20 => {
                out.push_str(&format!("&#{};", c as u32));
            }
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_clean_input_borrows() {
        let input = "no markup here";
        assert!(matches!(escape_text(input), Cow::Borrowed(_)));
    }

    #[test]
    fn test_text_markup_chars() {
        assert_eq!(escape_text("a < b & c > d"), "a &lt; b &amp; c &gt; d");
        assert_eq!(escape_text("line\rbreak"), "line&#13;break");
    }

    #[test]
    fn test_text_leaves_quotes_alone() {
        assert_eq!(escape_text(r#"say "hi""#), r#"say "hi""#);
    }

    #[test]
    fn test_attr_double_quote() {
        assert_eq!(
            escape_attr(r#"he said "hi" & left"#, b'"'),
            "he said &quot;hi&quot; &amp; left"
        );
        // the inactive quote passes through
        assert_eq!(escape_attr("it's fine", b'"'), "it's fine");
    }

    #[test]
    fn test_attr_single_quote() {
        assert_eq!(escape_attr("it's fine", b'\''), "it&apos;s fine");
        assert_eq!(escape_attr(r#"say "hi""#, b'\''), r#"say "hi""#);
    }

    #[test]
    fn test_attr_control_chars() {
        assert_eq!(escape_attr("a\tb\nc\rd", b'"'), "a&#9;b&#10;c&#13;d");
        assert_eq!(escape_attr("bell\u{7}", b'"'), "bell&#7;");
    }

    #[test]
    fn test_attr_clean_input_borrows() {
        assert!(matches!(escape_attr("plain", b'"'), Cow::Borrowed(_)));
    }
}
