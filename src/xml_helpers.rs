//! Shared XML helpers for reading and writing package parts.
//!
//! Attribute readers unescape values and ignore attributes that are not
//! valid UTF-8.

use quick_xml::events::BytesStart;

/// Extract a string attribute value by its full (possibly prefixed) key.
pub fn attr_string(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

/// Extract a `u32` attribute value by key.
pub fn attr_u32(e: &BytesStart, key: &[u8]) -> Option<u32> {
    attr_string(e, key).and_then(|s| s.trim().parse().ok())
}

/// Extract an `f64` attribute value by key.
pub fn attr_f64(e: &BytesStart, key: &[u8]) -> Option<f64> {
    attr_string(e, key).and_then(|s| s.trim().parse().ok())
}

/// Relationship id attribute (`r:id` or any other prefix bound to it).
pub fn attr_rel_id(e: &BytesStart) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| {
            let key = attr.key.as_ref();
            key == b"r:id" || (key.len() > 3 && key.ends_with(b":id"))
        })
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

/// All attributes as unescaped `(key, value)` pairs, in document order.
pub fn owned_attrs(e: &BytesStart) -> Vec<(String, String)> {
    e.attributes()
        .flatten()
        .filter_map(|attr| {
            let key = std::str::from_utf8(attr.key.as_ref()).ok()?.to_string();
            let value = attr.unescape_value().ok()?.into_owned();
            Some((key, value))
        })
        .collect()
}

/// Whether the element declares the given namespace prefix (`xmlns:{prefix}`).
pub fn declares_prefix(e: &BytesStart, prefix: &str) -> bool {
    let key = format!("xmlns:{prefix}");
    e.attributes()
        .flatten()
        .any(|attr| attr.key.as_ref() == key.as_bytes())
}

/// The namespace prefix of an element name, if any (`x` for `x:row`).
pub fn element_prefix(e: &BytesStart) -> Option<String> {
    let name = e.name();
    let full = std::str::from_utf8(name.as_ref()).ok()?;
    full.split_once(':').map(|(prefix, _)| prefix.to_string())
}

/// Escape text for use in element content or attribute values.
pub fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Format a size value the way spreadsheet applications do: no trailing zeros.
pub fn format_number(value: f64) -> String {
    let s = format!("{value:.6}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    s.to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn make_start(xml: &str) -> BytesStart<'_> {
        let content = xml
            .trim_start_matches('<')
            .trim_end_matches('>')
            .trim_end_matches('/')
            .trim_end();
        BytesStart::from_content(content, content.find(' ').unwrap_or(content.len()))
    }

    #[test]
    fn test_attr_string() {
        let e = make_start(r#"<foo name="a &amp; b" />"#);
        assert_eq!(attr_string(&e, b"name"), Some("a & b".to_string()));
        assert_eq!(attr_string(&e, b"missing"), None);
    }

    #[test]
    fn test_attr_numbers() {
        let e = make_start(r#"<row r="42" ht="15.75" customHeight="1"/>"#);
        assert_eq!(attr_u32(&e, b"r"), Some(42));
        assert_eq!(attr_f64(&e, b"ht"), Some(15.75));
        assert_eq!(attr_u32(&e, b"missing"), None);
    }

    #[test]
    fn test_rel_id_any_prefix() {
        let e = make_start(r#"<drawing r:id="rId3"/>"#);
        assert_eq!(attr_rel_id(&e), Some("rId3".to_string()));
        let e = make_start(r#"<drawing rel:id="rId9"/>"#);
        assert_eq!(attr_rel_id(&e), Some("rId9".to_string()));
        let e = make_start(r#"<sheet sheetId="1"/>"#);
        assert_eq!(attr_rel_id(&e), None);
    }

    #[test]
    fn test_prefixes() {
        let e = make_start(r#"<x:worksheet xmlns:x="urn:x" xmlns:r="urn:r">"#);
        assert_eq!(element_prefix(&e), Some("x".to_string()));
        assert!(declares_prefix(&e, "r"));
        assert!(!declares_prefix(&e, "xdr"));
    }

    #[test]
    fn test_owned_attrs_and_escape() {
        let e = make_start(r#"<col min="1" max="3" style="2"/>"#);
        assert_eq!(owned_attrs(&e).len(), 3);
        assert_eq!(xml_escape(r#"a<b&"c""#), "a&lt;b&amp;&quot;c&quot;");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(18.0), "18");
        assert_eq!(format_number(15.75), "15.75");
    }
}
