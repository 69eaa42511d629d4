//! Hand-written scanner for item documents.
//!
//! The grammar is the JSON subset item documents use: objects, arrays, quoted
//! strings, integers, floats, booleans and null. Every structure is handled by
//! the same forward scan, which tracks the open brackets and whether it is
//! inside a string; separators only count at the top nesting level of the
//! span being split, so nested values stay intact for the recursive step.
//!
//! String contents are returned exactly as written between the quotes. A
//! backslash skips the following byte while scanning, so `"a\"b"` yields
//! `a\"b` with the backslash kept; decoding escapes is left to consumers.

use super::{Mapping, Node};
use crate::error::ParseError;

/// Deepest nesting of objects and lists accepted, counting the root object.
pub const MAX_NESTING_DEPTH: usize = 64;

#[derive(Clone, Copy, Debug)]
/// A slice of the input plus its byte offset in the whole document.
struct Span<'a> {
    text: &'a str,
    offset: usize,
}

impl<'a> Span<'a> {
    fn trim(self) -> Self {
        let start_trimmed = self.text.trim_start();
        let lead = self.text.len() - start_trimmed.len();
        Span {
            text: start_trimmed.trim_end(),
            offset: self.offset + lead,
        }
    }

    fn slice(self, start: usize, end: usize) -> Self {
        Span {
            text: &self.text[start..end],
            offset: self.offset + start,
        }
    }

    fn len(&self) -> usize {
        self.text.len()
    }

    fn invalid(&self) -> ParseError {
        ParseError::InvalidValue {
            token: self.text.to_string(),
            offset: self.offset,
        }
    }
}

/// Parse a document into its root mapping.
///
/// Input whose first non-whitespace character is not `{` produces an empty
/// mapping; callers that look for `Items` then simply find nothing. Anything
/// after the closing brace other than whitespace is an error. A leading UTF-8
/// byte order mark is skipped.
pub fn parse(text: &str) -> Result<Node, ParseError> {
    let body = text.strip_prefix('\u{FEFF}').unwrap_or(text);
    let root = Span {
        text: body,
        offset: text.len() - body.len(),
    }
    .trim();
    if !root.text.starts_with('{') {
        return Ok(Node::Map(Mapping::new()));
    }

    let end = closing_index(root)?;
    let rest = root.slice(end + 1, root.len()).trim();
    if !rest.text.is_empty() {
        return Err(ParseError::TrailingContent {
            offset: rest.offset,
        });
    }
    let object = root.slice(0, end + 1);
    check_depth(object)?;
    parse_object(object)
}

/// Reject documents nesting more than `MAX_NESTING_DEPTH` structures, root
/// included, before the recursive descent starts.
fn check_depth(span: Span<'_>) -> Result<(), ParseError> {
    let mut too_deep = None;
    scan(span, |idx, _, depth| {
        if depth > MAX_NESTING_DEPTH {
            too_deep = Some(idx);
            return false;
        }
        true
    })?;
    match too_deep {
        Some(idx) => Err(ParseError::TooDeep {
            limit: MAX_NESTING_DEPTH,
            offset: span.offset + idx,
        }),
        None => Ok(()),
    }
}

/// Single forward pass over `span`.
///
/// `visit` sees every byte outside string literals together with the nesting
/// depth after that byte; returning `false` stops the scan early. A complete
/// scan fails on unterminated strings and on brackets that do not pair up.
fn scan(span: Span<'_>, mut visit: impl FnMut(usize, u8, usize) -> bool) -> Result<(), ParseError> {
    let bytes = span.text.as_bytes();
    let mut open: Vec<(u8, usize)> = Vec::new();
    let mut string_start: Option<usize> = None;
    let mut idx = 0;

    while idx < bytes.len() {
        let byte = bytes[idx];
        if string_start.is_some() {
            match byte {
                b'\\' => {
                    idx += 2;
                    continue;
                }
                b'"' => string_start = None,
                _ => {}
            }
            idx += 1;
            continue;
        }

        match byte {
            b'"' => string_start = Some(idx),
            b'{' | b'[' => open.push((byte, idx)),
            b'}' | b']' => {
                let expected = if byte == b'}' { b'{' } else { b'[' };
                match open.pop() {
                    Some((opener, _)) if opener == expected => {}
                    _ => {
                        return Err(ParseError::Unbalanced {
                            found: byte as char,
                            offset: span.offset + idx,
                        });
                    }
                }
            }
            _ => {}
        }

        if !visit(idx, byte, open.len()) {
            return Ok(());
        }
        idx += 1;
    }

    if let Some(start) = string_start {
        return Err(ParseError::UnterminatedString {
            offset: span.offset + start,
        });
    }
    if let Some((_, start)) = open.last() {
        return Err(ParseError::Unclosed {
            offset: span.offset + start,
        });
    }
    Ok(())
}

/// Index of the bracket closing the one at the start of `span`.
fn closing_index(span: Span<'_>) -> Result<usize, ParseError> {
    let mut close = None;
    scan(span, |idx, byte, depth| {
        if depth == 0 && matches!(byte, b'}' | b']') {
            close = Some(idx);
            return false;
        }
        true
    })?;
    close.ok_or(ParseError::Unclosed {
        offset: span.offset,
    })
}

/// Split on `separator` wherever it appears at depth zero. Empty pieces (from
/// `{}` or a trailing comma) are dropped.
fn split_top_level(span: Span<'_>, separator: u8) -> Result<Vec<Span<'_>>, ParseError> {
    let mut cuts = Vec::new();
    scan(span, |idx, byte, depth| {
        if depth == 0 && byte == separator {
            cuts.push(idx);
        }
        true
    })?;

    let mut pieces = Vec::with_capacity(cuts.len() + 1);
    let mut start = 0;
    for cut in cuts.into_iter().chain(std::iter::once(span.len())) {
        let piece = span.slice(start, cut).trim();
        if !piece.text.is_empty() {
            pieces.push(piece);
        }
        start = cut + 1;
    }
    Ok(pieces)
}

fn find_top_level(span: Span<'_>, target: u8) -> Result<Option<usize>, ParseError> {
    let mut found = None;
    scan(span, |idx, byte, depth| {
        if depth == 0 && byte == target {
            found = Some(idx);
            return false;
        }
        true
    })?;
    Ok(found)
}

fn parse_value(span: Span<'_>) -> Result<Node, ParseError> {
    let span = span.trim();
    match span.text.as_bytes().first() {
        None => Err(span.invalid()),
        Some(b'{') | Some(b'[') => {
            let end = closing_index(span)?;
            if end + 1 != span.len() {
                return Err(span.invalid());
            }
            if span.text.starts_with('{') {
                parse_object(span)
            } else {
                parse_list(span)
            }
        }
        Some(b'"') => parse_string(span).map(Node::Str),
        Some(_) => match span.text {
            "true" => Ok(Node::Bool(true)),
            "false" => Ok(Node::Bool(false)),
            "null" => Ok(Node::Null),
            _ => parse_number(span),
        },
    }
}

/// `span` covers `{ ... }` including both braces.
fn parse_object(span: Span<'_>) -> Result<Node, ParseError> {
    let body = span.slice(1, span.len() - 1);
    let mut map = Mapping::new();
    for entry in split_top_level(body, b',')? {
        let Some(colon) = find_top_level(entry, b':')? else {
            return Err(ParseError::MissingColon {
                offset: entry.offset + entry.len(),
            });
        };
        let key_span = entry.slice(0, colon).trim();
        if !key_span.text.starts_with('"') {
            return Err(ParseError::ExpectedKey {
                offset: key_span.offset,
            });
        }
        let key = parse_string(key_span)?;
        let value = parse_value(entry.slice(colon + 1, entry.len()))?;
        map.insert(key, value);
    }
    Ok(Node::Map(map))
}

/// `span` covers `[ ... ]` including both brackets.
fn parse_list(span: Span<'_>) -> Result<Node, ParseError> {
    let body = span.slice(1, span.len() - 1);
    split_top_level(body, b',')?
        .into_iter()
        .map(parse_value)
        .collect::<Result<Vec<_>, _>>()
        .map(Node::List)
}

/// `span` starts with a quote; the closing quote must end the span.
fn parse_string(span: Span<'_>) -> Result<String, ParseError> {
    let bytes = span.text.as_bytes();
    let mut idx = 1;
    while idx < bytes.len() {
        match bytes[idx] {
            b'\\' => idx += 2,
            b'"' => {
                if idx + 1 != bytes.len() {
                    return Err(span.invalid());
                }
                return Ok(span.text[1..idx].to_string());
            }
            _ => idx += 1,
        }
    }
    Err(ParseError::UnterminatedString {
        offset: span.offset,
    })
}

/// Integer when the literal has no fraction or exponent and fits in `i64`,
/// float otherwise.
fn parse_number(span: Span<'_>) -> Result<Node, ParseError> {
    let token = span.text;
    let numeric_chars = token
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'-' | b'+' | b'.' | b'e' | b'E'));
    if !numeric_chars || !token.bytes().any(|b| b.is_ascii_digit()) {
        return Err(span.invalid());
    }

    if !token.contains(['.', 'e', 'E']) {
        if let Ok(value) = token.parse::<i64>() {
            return Ok(Node::Int(value));
        }
    }
    token
        .parse::<f64>()
        .map(Node::Float)
        .map_err(|_| span.invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root(text: &str) -> Mapping {
        match parse(text).expect("document parses") {
            Node::Map(map) => map,
            other => panic!("expected mapping root, got {other:?}"),
        }
    }

    #[test]
    fn scalars_keep_integer_and_float_apart() {
        let map = root(r#"{"a": 12, "b": 1.5, "c": -3, "d": 2e3, "e": true, "f": false, "g": null}"#);
        assert_eq!(map.get("a"), Some(&Node::Int(12)));
        assert_eq!(map.get("b"), Some(&Node::Float(1.5)));
        assert_eq!(map.get("c"), Some(&Node::Int(-3)));
        assert_eq!(map.get("d"), Some(&Node::Float(2000.0)));
        assert_eq!(map.get("e"), Some(&Node::Bool(true)));
        assert_eq!(map.get("f"), Some(&Node::Bool(false)));
        assert!(map.get("g").is_some_and(Node::is_null));
    }

    #[test]
    fn escaped_quote_stays_literal() {
        let map = root(r#"{"name": "a\"b", "path": "C:\\icons\\x.png"}"#);
        assert_eq!(map.get_str("name"), Some(r#"a\"b"#));
        assert_eq!(map.get_str("name").map(str::len), Some(4));
        assert_eq!(map.get_str("path"), Some(r"C:\\icons\\x.png"));
    }

    #[test]
    fn nested_separators_do_not_split_outer_entries() {
        let map = root(
            r#"{
                "Items": [
                    {"PrefabName": "A", "Flags": ["NoDrop", "Hidden"], "Meta": {"k": "x:y,z"}},
                    {"PrefabName": "B"}
                ],
                "Note": "colon: and, comma"
            }"#,
        );
        let items = map.get_list("Items");
        assert_eq!(items.len(), 2);
        let first = items[0].as_mapping().expect("first item is a mapping");
        assert_eq!(first.get_list("Flags").len(), 2);
        assert_eq!(
            first.get_mapping("Meta").and_then(|m| m.get_str("k")),
            Some("x:y,z")
        );
        assert_eq!(map.get_str("Note"), Some("colon: and, comma"));
    }

    #[test]
    fn deep_nesting_parses() {
        let map = root(r#"{"a": [[[{"b": [1, [2, {"c": []}]]}]]]}"#);
        let mut node = map.get("a").expect("a present");
        for _ in 0..3 {
            node = &node.as_list().expect("list level")[0];
        }
        let inner = node.as_mapping().expect("innermost mapping");
        assert_eq!(inner.get_list("b").len(), 2);
    }

    fn nested_lists(depth: usize) -> String {
        // The root object is one level; the lists make up the rest.
        let lists = depth - 1;
        format!("{{\"a\": {}1{}}}", "[".repeat(lists), "]".repeat(lists))
    }

    #[test]
    fn nesting_up_to_the_limit_parses() {
        let map = root(&nested_lists(MAX_NESTING_DEPTH));
        let mut node = map.get("a").expect("a present");
        let mut levels = 1;
        while let Some(list) = node.as_list() {
            node = &list[0];
            levels += 1;
        }
        assert_eq!(levels, MAX_NESTING_DEPTH);
        assert_eq!(node, &Node::Int(1));
    }

    #[test]
    fn nesting_past_the_limit_is_rejected() {
        let text = nested_lists(MAX_NESTING_DEPTH + 1);
        let offset = "{\"a\": ".len() + MAX_NESTING_DEPTH - 1;
        assert_eq!(
            parse(&text),
            Err(ParseError::TooDeep {
                limit: MAX_NESTING_DEPTH,
                offset,
            })
        );
    }

    #[test]
    fn very_deep_documents_fail_without_recursing() {
        let text = nested_lists(100_000);
        assert!(matches!(parse(&text), Err(ParseError::TooDeep { .. })));
    }

    #[test]
    fn leading_byte_order_mark_is_skipped() {
        let map = root("\u{FEFF}{\"Items\": [{\"PrefabName\": \"A\"}]}");
        assert_eq!(map.get_list("Items").len(), 1);
        assert_eq!(
            parse("\u{FEFF}{\"a\": }"),
            Err(ParseError::InvalidValue {
                token: String::new(),
                offset: 8,
            })
        );
    }

    #[test]
    fn non_object_root_is_empty_document() {
        assert_eq!(parse("[1, 2]"), Ok(Node::Map(Mapping::new())));
        assert_eq!(parse("   "), Ok(Node::Map(Mapping::new())));
        assert_eq!(parse("Items = 3"), Ok(Node::Map(Mapping::new())));
    }

    #[test]
    fn empty_object_and_trailing_commas() {
        assert!(root("{}").is_empty());
        let map = root(r#"{"Items": [{"PrefabName": "A"},], }"#);
        assert_eq!(map.get_list("Items").len(), 1);
    }

    #[test]
    fn unterminated_string_fails() {
        let err = parse(r#"{"a": "open}"#).unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedString { .. }), "{err:?}");
    }

    #[test]
    fn unbalanced_braces_fail() {
        assert!(matches!(
            parse(r#"{"a": [1, 2}"#),
            Err(ParseError::Unbalanced { found: '}', .. })
        ));
        assert!(matches!(
            parse(r#"{"a": {"b": 1}"#),
            Err(ParseError::Unclosed { offset: 0 })
        ));
    }

    #[test]
    fn trailing_content_and_bad_tokens_fail() {
        assert!(matches!(
            parse(r#"{"a": 1} extra"#),
            Err(ParseError::TrailingContent { offset: 9 })
        ));
        assert!(matches!(
            parse(r#"{"a": tru}"#),
            Err(ParseError::InvalidValue { .. })
        ));
        assert!(matches!(
            parse(r#"{"a" 1}"#),
            Err(ParseError::MissingColon { .. })
        ));
        assert!(matches!(
            parse(r#"{a: 1}"#),
            Err(ParseError::ExpectedKey { offset: 1 })
        ));
    }

    #[test]
    fn oversized_integer_falls_back_to_float() {
        let map = root(r#"{"big": 99999999999999999999}"#);
        assert!(matches!(map.get("big"), Some(Node::Float(_))));
    }

    #[test]
    fn unicode_content_survives() {
        let map = root("{\"name\": \"Rúnar ✦\", \"n\": 1}");
        assert_eq!(map.get_str("name"), Some("Rúnar ✦"));
        assert_eq!(map.get_int("n", 0), 1);
    }
}
