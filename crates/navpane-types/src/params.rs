//! Request parameters and `application/x-www-form-urlencoded` helpers.

use std::collections::BTreeMap;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

use crate::error::{NavError, Result};

/// Parameter map handed to page handlers. Later duplicates overwrite
/// earlier ones.
pub type Params = BTreeMap<String, String>;

/// Everything except `A-Z a-z 0-9 . - * _` is escaped.
const FORM: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'.')
    .remove(b'-')
    .remove(b'*')
    .remove(b'_');

/// Form-encode a value: unreserved characters kept, space as `+`,
/// everything else percent-escaped as UTF-8.
pub fn form_encode(input: &str) -> String {
    utf8_percent_encode(input, FORM)
        .to_string()
        .replace("%20", "+")
}

/// Inverse of [`form_encode`].
///
/// A `%` not followed by two hex digits, or an escape sequence that does not
/// decode to UTF-8, is a [`NavError::MalformedAddress`].
pub fn form_decode(input: &str) -> Result<String> {
    let bytes = input.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b == b'%' {
            let valid = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                return Err(NavError::malformed(
                    input,
                    format!("incomplete escape at index {i}"),
                ));
            }
        }
    }
    let plus_decoded = input.replace('+', " ");
    percent_decode_str(&plus_decoded)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|e| NavError::malformed(input, format!("escape is not UTF-8: {e}")))
}

/// Parse `k1=v1&k2=v2` into a [`Params`] map.
///
/// Pairs without `=` are dropped, keys and values are trimmed and
/// form-decoded, and pairs that fail to decode are skipped.
pub fn parse_pairs(payload: &str) -> Params {
    let mut params = Params::new();
    for pair in payload.split('&') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        match (form_decode(key.trim()), form_decode(value.trim())) {
            (Ok(k), Ok(v)) => {
                params.insert(k, v);
            },
            _ => log::debug!("skipping undecodable parameter pair `{pair}`"),
        }
    }
    params
}

/// Serialize a map as a form body (`k=v&k2=v2`, form-encoded).
pub fn encode_pairs(params: &Params) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", form_encode(k), form_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Look up and decode a single parameter in a query string.
///
/// Returns `Ok(None)` when no pair has the given key.
pub fn query_value(query: &str, key: &str) -> Result<Option<String>> {
    for pair in query.split('&') {
        match pair.split_once('=') {
            Some((k, v)) if k == key => return form_decode(v).map(Some),
            _ => {},
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_keeps_unreserved() {
        assert_eq!(form_encode("aZ09.-*_"), "aZ09.-*_");
    }

    #[test]
    fn encode_space_and_reserved() {
        assert_eq!(form_encode("a b"), "a+b");
        assert_eq!(
            form_encode("http://localhost/x.html?a=1&b=2"),
            "http%3A%2F%2Flocalhost%2Fx.html%3Fa%3D1%26b%3D2"
        );
        assert_eq!(form_encode("~"), "%7E");
    }

    #[test]
    fn encode_utf8() {
        assert_eq!(form_encode("é"), "%C3%A9");
    }

    #[test]
    fn decode_plus_and_escapes() {
        assert_eq!(form_decode("a+b%2Bc").unwrap(), "a b+c");
        assert_eq!(form_decode("%C3%A9").unwrap(), "é");
    }

    #[test]
    fn decode_rejects_bad_escapes() {
        assert!(form_decode("%zz").is_err());
        assert!(form_decode("abc%4").is_err());
        assert!(form_decode("%FF").is_err());
    }

    #[test]
    fn parse_pairs_drops_pairs_without_equals() {
        let p = parse_pairs("a=1&junk&b=2");
        assert_eq!(p.len(), 2);
        assert_eq!(p["a"], "1");
        assert_eq!(p["b"], "2");
    }

    #[test]
    fn parse_pairs_duplicates_overwrite() {
        let p = parse_pairs("a=1&a=2");
        assert_eq!(p["a"], "2");
    }

    #[test]
    fn parse_pairs_trims_and_decodes() {
        let p = parse_pairs(" name = John+Doe &city=S%C3%A3o");
        assert_eq!(p["name"], "John Doe");
        assert_eq!(p["city"], "São");
    }

    #[test]
    fn parse_pairs_empty_value_and_input() {
        assert_eq!(parse_pairs("a=")["a"], "");
        assert!(parse_pairs("").is_empty());
    }

    #[test]
    fn parse_pairs_skips_undecodable() {
        let p = parse_pairs("a=%zz&b=ok");
        assert!(!p.contains_key("a"));
        assert_eq!(p["b"], "ok");
    }

    #[test]
    fn query_value_finds_key() {
        let q = "x=1&url=http%3A%2F%2Fexample.com%2F&y=2";
        assert_eq!(
            query_value(q, "url").unwrap().as_deref(),
            Some("http://example.com/")
        );
        assert_eq!(query_value(q, "missing").unwrap(), None);
    }

    #[test]
    fn encode_pairs_is_ordered() {
        let mut p = Params::new();
        p.insert("b".into(), "two words".into());
        p.insert("a".into(), "1".into());
        assert_eq!(encode_pairs(&p), "a=1&b=two+words");
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn encoded_output_is_query_safe(s in "\\PC{0,40}") {
                let enc = form_encode(&s);
                prop_assert!(enc.bytes().all(|b| b.is_ascii_alphanumeric()
                    || matches!(b, b'.' | b'-' | b'*' | b'_' | b'%' | b'+')));
            }

            #[test]
            fn decode_inverts_encode(s in "\\PC{0,40}") {
                prop_assert_eq!(form_decode(&form_encode(&s)).unwrap(), s);
            }
        }
    }
}
