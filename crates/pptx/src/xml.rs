//! Small helpers over quick-xml events.

use quick_xml::events::BytesStart;

/// Extract the local name from a potentially namespaced XML element name.
pub fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Namespace prefix of a qualified name, including the colon (`"p:"`), or
/// an empty string.
pub fn prefix_of(name: &[u8]) -> String {
    match name.iter().position(|&b| b == b':') {
        Some(pos) => String::from_utf8_lossy(&name[..=pos]).into_owned(),
        None => String::new(),
    }
}

/// Unescaped value of the attribute whose full key is `key`.
pub fn attr(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Value of a relationship-id attribute (`r:id`), whatever prefix the
/// document binds to the relationships namespace.
pub fn rel_id_attr(e: &BytesStart) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| {
            let key = a.key.as_ref();
            key.contains(&b':') && local_name(key) == b"id"
        })
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Strip a UTF-8 byte order mark.
pub fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{feff}').unwrap_or(text)
}
