//! Small helpers over quick-xml events.

use deckdump_core::{Error, Result};
use quick_xml::events::BytesStart;

/// Extract the local name from a potentially namespaced XML element name.
pub(crate) fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Value of an unprefixed attribute, e.g. `name` or `sz`.
pub(crate) fn attr(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key {
            let value = attr
                .unescape_value()
                .map_err(|e| Error::XmlError(format!("Bad attribute value: {}", e)))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Value of a namespace-prefixed attribute by local name, e.g. `r:id` or
/// `r:embed`, whatever prefix the part binds to the relationships namespace.
pub(crate) fn prefixed_attr(e: &BytesStart<'_>, local: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes().flatten() {
        if attr.key.prefix().is_some() && attr.key.local_name().as_ref() == local {
            let value = attr
                .unescape_value()
                .map_err(|e| Error::XmlError(format!("Bad attribute value: {}", e)))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Parse an XML schema boolean (`1`, `0`, `true`, `false`).
pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}
