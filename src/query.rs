use percent_encoding::percent_decode_str;
use std::collections::HashMap;

/// Decode a redirect query string into a parameter map
///
/// Splits on `&` then `=`. Keys are taken verbatim; values are
/// percent-decoded. A pair without `=` (a bare flag such as `prompt`) maps to
/// `None`. When a key repeats, the first occurrence wins and later duplicates
/// are ignored: authorization servers should not send duplicates, but a
/// malformed redirect must not break the receiver. An empty query string
/// yields an empty map.
pub(crate) fn decode_query(query: &str) -> HashMap<String, Option<String>> {
    let mut parameters = HashMap::new();
    for pair in query.split('&') {
        if pair.is_empty() {
            continue;
        }
        let (key, value) = match pair.split_once('=') {
            Some((key, value)) => (
                key,
                Some(percent_decode_str(value).decode_utf8_lossy().into_owned()),
            ),
            None => (pair, None),
        };
        parameters.entry(key.to_string()).or_insert(value);
    }
    parameters
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_code_and_state() {
        let params = decode_query("code=abc&state=xyz");
        assert_eq!(params.len(), 2);
        assert_eq!(params["code"], Some("abc".to_string()));
        assert_eq!(params["state"], Some("xyz".to_string()));
    }

    #[test]
    fn percent_decodes_values() {
        let params = decode_query("code=a%20b");
        assert_eq!(params["code"], Some("a b".to_string()));
    }

    #[test]
    fn first_duplicate_wins() {
        let params = decode_query("a=1&a=2");
        assert_eq!(params["a"], Some("1".to_string()));
    }

    #[test]
    fn bare_key_has_no_value() {
        let params = decode_query("flag&code=1");
        assert_eq!(params["flag"], None);
        assert_eq!(params["code"], Some("1".to_string()));
    }

    #[test]
    fn empty_query_is_empty_map() {
        assert!(decode_query("").is_empty());
    }

    #[test]
    fn empty_value_is_present_but_empty() {
        let params = decode_query("code=");
        assert_eq!(params["code"], Some(String::new()));
    }

    #[test]
    fn keys_are_taken_verbatim() {
        // Only values are percent-decoded.
        let params = decode_query("na%6De=x");
        assert_eq!(params["na%6De"], Some("x".to_string()));
    }

    #[test]
    fn undecodable_value_is_kept_lossily() {
        // Invalid UTF-8 after decoding must not fail the whole redirect.
        let params = decode_query("code=%ff");
        assert_eq!(params["code"], Some("\u{fffd}".to_string()));
    }
}
