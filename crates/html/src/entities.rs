//! Character reference decoding and escaping for markup text.
//!
//! Decoding is deliberately narrow:
//! - Named references: `&amp;`, `&lt;`, `&gt;`, `&quot;`, `&apos;`, `&nbsp;`.
//! - Numeric references only when semicolon-terminated: `&#215;`, `&#xD7;`.
//! - Invalid scalars, unknown names and malformed numerics pass through unchanged.

const NAMED: &[(&str, char)] = &[
    ("&amp;", '&'),
    ("&lt;", '<'),
    ("&gt;", '>'),
    ("&quot;", '"'),
    ("&apos;", '\''),
    ("&nbsp;", '\u{00A0}'),
];

const MAX_HEX_DIGITS: usize = 6; // 0x10FFFF
const MAX_DEC_DIGITS: usize = 7; // 1114111

pub fn decode_entities(s: &str) -> String {
    if memchr::memchr(b'&', s.as_bytes()).is_none() {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = memchr::memchr(b'&', rest.as_bytes()) {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        match decode_one(rest) {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &rest[consumed..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Decode the reference at the start of `s` (which begins with `&`).
fn decode_one(s: &str) -> Option<(char, usize)> {
    if let Some((name, ch)) = NAMED.iter().find(|(name, _)| s.starts_with(name)) {
        return Some((*ch, name.len()));
    }
    let body = s.strip_prefix("&#")?;
    let (digits_start, radix, max_digits) = match body.as_bytes().first() {
        Some(b'x' | b'X') => (1, 16, MAX_HEX_DIGITS),
        _ => (0, 10, MAX_DEC_DIGITS),
    };
    let digits = &body[digits_start..];
    let len = digits
        .bytes()
        .take(max_digits + 1)
        .take_while(|b| b.is_ascii_hexdigit() && (radix == 16 || b.is_ascii_digit()))
        .count();
    if len == 0 || len > max_digits || digits.as_bytes().get(len) != Some(&b';') {
        return None;
    }
    let ch = u32::from_str_radix(&digits[..len], radix)
        .ok()
        .and_then(char::from_u32)?;
    Some((ch, 2 + digits_start + len + 1))
}

/// Escape text content for serialization inside an element.
pub fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{00A0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

/// Escape a double-quoted attribute value.
pub fn escape_attribute(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{00A0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_entities_preserves_utf8() {
        assert_eq!(decode_entities("120×32"), "120×32");
        assert_eq!(decode_entities("π &amp; σ"), "π & σ");
    }

    #[test]
    fn decode_entities_decodes_named_and_numeric() {
        assert_eq!(decode_entities("a &amp; b"), "a & b");
        assert_eq!(decode_entities("&lt;tag&gt;"), "<tag>");
        assert_eq!(decode_entities("&quot;hi&quot;"), "\"hi\"");
        assert_eq!(decode_entities("a&nbsp;b"), "a\u{00A0}b");
        assert_eq!(decode_entities("&#215;"), "×");
        assert_eq!(decode_entities("&#xD7;"), "×");
    }

    #[test]
    fn decode_entities_leaves_malformed_references() {
        for input in [
            "&amp",
            "&notanentity;",
            "&#xZZ;",
            "&#-1;",
            "&#;",
            "&#x;",
            "&#123",
            "&#xD800;",
            "&#x110000;",
            "&#11141111;",
            "&",
        ] {
            assert_eq!(decode_entities(input), input, "input {input:?}");
        }
    }

    #[test]
    fn decode_entities_respects_digit_limits() {
        assert_eq!(decode_entities("&#1114111;"), "\u{10FFFF}");
        assert_eq!(decode_entities("&#x10FFFF;"), "\u{10FFFF}");
    }

    #[test]
    fn escape_text_then_decode_is_identity() {
        let raw = "a < b && c > d\u{00A0}";
        let mut escaped = String::new();
        escape_text(raw, &mut escaped);
        assert_eq!(escaped, "a &lt; b &amp;&amp; c &gt; d&nbsp;");
        assert_eq!(decode_entities(&escaped), raw);
    }

    #[test]
    fn escape_attribute_quotes() {
        let mut out = String::new();
        escape_attribute(r#"say "hi" & go"#, &mut out);
        assert_eq!(out, "say &quot;hi&quot; &amp; go");
    }
}
