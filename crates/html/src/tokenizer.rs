//! Small, forgiving markup tokenizer for injected fragments and template markup.
//!
//! Tag and attribute names use the ASCII class `[A-Za-z0-9:_-]` and are
//! lowercased. `<script>` and `<style>` bodies are scanned as raw text up to
//! the matching close tag. Malformed input never fails: a stray `<` that does
//! not start a tag is kept as text, an unterminated comment runs to the end.
//!
//! Slices are only cut at ASCII structural bytes, so every slice endpoint is a
//! UTF-8 char boundary.
use crate::entities::decode_entities;
use crate::types::{Token, is_rawtext_element, is_void_element};
use memchr::memchr;

const COMMENT_START: &str = "<!--";
const COMMENT_END: &str = "-->";

fn starts_with_ignore_ascii_case_at(haystack: &[u8], start: usize, needle: &[u8]) -> bool {
    haystack.len() >= start + needle.len()
        && haystack[start..start + needle.len()].eq_ignore_ascii_case(needle)
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b':'
}

/// Find `</name` followed by optional ASCII whitespace and `>`.
/// Returns `(start_of_close_tag, end_after_gt)` relative to `haystack`.
fn find_rawtext_close_tag(haystack: &str, name: &str) -> Option<(usize, usize)> {
    let bytes = haystack.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        i += memchr(b'<', &bytes[i..])?;
        if bytes.get(i + 1) == Some(&b'/')
            && starts_with_ignore_ascii_case_at(bytes, i + 2, name.as_bytes())
        {
            let mut k = i + 2 + name.len();
            while k < bytes.len() && bytes[k].is_ascii_whitespace() {
                k += 1;
            }
            if bytes.get(k) == Some(&b'>') {
                return Some((i, k + 1));
            }
        }
        i += 1;
    }
    None
}

pub fn tokenize(input: &str) -> Vec<Token> {
    let mut out = Vec::new();
    let bytes = input.as_bytes();
    let mut text_start = 0;
    let mut i = 0;

    let flush_text = |out: &mut Vec<Token>, from: usize, to: usize| {
        if from < to {
            let decoded = decode_entities(&input[from..to]);
            if !decoded.is_empty() {
                out.push(Token::Text(decoded));
            }
        }
    };

    while i < bytes.len() {
        let Some(rel) = memchr(b'<', &bytes[i..]) else {
            break;
        };
        i += rel;

        if input[i..].starts_with(COMMENT_START) {
            flush_text(&mut out, text_start, i);
            let body_start = i + COMMENT_START.len();
            match input[body_start..].find(COMMENT_END) {
                Some(end) => {
                    out.push(Token::Comment(input[body_start..body_start + end].to_string()));
                    i = body_start + end + COMMENT_END.len();
                }
                None => {
                    out.push(Token::Comment(input[body_start..].to_string()));
                    i = bytes.len();
                }
            }
            text_start = i;
            continue;
        }

        if starts_with_ignore_ascii_case_at(bytes, i, b"<!doctype") {
            flush_text(&mut out, text_start, i);
            let rest = &input[i + 2..];
            let end = rest.find('>').unwrap_or(rest.len());
            out.push(Token::Doctype(rest[..end].trim().to_string()));
            i = (i + 2 + end + 1).min(bytes.len());
            text_start = i;
            continue;
        }

        if bytes.get(i + 1) == Some(&b'/') {
            let start = i + 2;
            let mut j = start;
            while j < bytes.len() && is_name_byte(bytes[j]) {
                j += 1;
            }
            if j == start {
                // `</` without a name is text.
                i += 1;
                continue;
            }
            flush_text(&mut out, text_start, i);
            let name = input[start..j].to_ascii_lowercase();
            while j < bytes.len() && bytes[j] != b'>' {
                j += 1;
            }
            i = (j + 1).min(bytes.len());
            text_start = i;
            out.push(Token::EndTag(name));
            continue;
        }

        let start = i + 1;
        let mut j = start;
        while j < bytes.len() && is_name_byte(bytes[j]) {
            j += 1;
        }
        if j == start {
            // `<` not followed by a name is text.
            i += 1;
            continue;
        }
        flush_text(&mut out, text_start, i);
        let name = input[start..j].to_ascii_lowercase();
        let (attributes, mut self_closing, after) = scan_attributes(input, j);
        if is_void_element(&name) {
            self_closing = true;
        }
        i = after;
        text_start = i;

        let rawtext = is_rawtext_element(&name) && !self_closing;
        out.push(Token::StartTag {
            name: name.clone(),
            attributes,
            self_closing,
        });

        if rawtext {
            match find_rawtext_close_tag(&input[i..], &name) {
                Some((rel_start, rel_end)) => {
                    let raw = &input[i..i + rel_start];
                    if !raw.is_empty() {
                        out.push(Token::Text(raw.to_string()));
                    }
                    i += rel_end;
                }
                None => {
                    // Missing close tag: the remainder is raw text.
                    let raw = &input[i..];
                    if !raw.is_empty() {
                        out.push(Token::Text(raw.to_string()));
                    }
                    i = bytes.len();
                }
            }
            out.push(Token::EndTag(name));
            text_start = i;
        }
    }

    flush_text(&mut out, text_start, bytes.len());
    out
}

/// Scan attributes starting right after the tag name. Returns the attributes,
/// whether the tag was written self-closing, and the index after `>`.
fn scan_attributes(input: &str, mut k: usize) -> (Vec<(String, Option<String>)>, bool, usize) {
    let bytes = input.as_bytes();
    let len = bytes.len();
    let mut attributes: Vec<(String, Option<String>)> = Vec::new();
    let mut self_closing = false;

    let skip_whitespace = |k: &mut usize| {
        while *k < len && bytes[*k].is_ascii_whitespace() {
            *k += 1;
        }
    };

    loop {
        skip_whitespace(&mut k);
        if k >= len {
            break;
        }
        match bytes[k] {
            b'>' => {
                k += 1;
                break;
            }
            b'/' => {
                if bytes.get(k + 1) == Some(&b'>') {
                    self_closing = true;
                    k += 2;
                    break;
                }
                k += 1;
                continue;
            }
            _ => {}
        }
        let name_start = k;
        while k < len && is_name_byte(bytes[k]) {
            k += 1;
        }
        if name_start == k {
            k += 1;
            continue;
        }
        let name = input[name_start..k].to_ascii_lowercase();

        skip_whitespace(&mut k);
        let value = if k < len && bytes[k] == b'=' {
            k += 1;
            skip_whitespace(&mut k);
            if k < len && (bytes[k] == b'"' || bytes[k] == b'\'') {
                let quote = bytes[k];
                k += 1;
                let vstart = k;
                while k < len && bytes[k] != quote {
                    k += 1;
                }
                let raw = &input[vstart..k];
                if k < len {
                    k += 1;
                }
                Some(decode_entities(raw))
            } else {
                let vstart = k;
                while k < len && !bytes[k].is_ascii_whitespace() && bytes[k] != b'>' {
                    if bytes[k] == b'/' && bytes.get(k + 1) == Some(&b'>') {
                        break;
                    }
                    k += 1;
                }
                Some(decode_entities(&input[vstart..k]))
            }
        } else {
            None
        };
        attributes.push((name, value));
    }
    (attributes, self_closing, k)
}
