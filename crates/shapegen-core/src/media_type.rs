use indexmap::IndexSet;

pub const JSON: &str = "application/json";
pub const CBOR: &str = "application/cbor";
pub const EVENT_STREAM: &str = "text/event-stream";

/// Declared media types in negotiation order: every content type, then every
/// accept type not already present.
pub fn declared_media_types<'a>(
    content_types: impl IntoIterator<Item = &'a String>,
    accepts: impl IntoIterator<Item = &'a String>,
) -> IndexSet<String> {
    content_types
        .into_iter()
        .chain(accepts)
        .cloned()
        .collect()
}

/// Orders `declared` by `priority`.
///
/// Priority entries that are declared come first in priority order; the
/// remaining declared entries follow in declaration order. Undeclared
/// priority entries are dropped and declared entries are never dropped.
pub fn negotiate(declared: &IndexSet<String>, priority: &[String]) -> IndexSet<String> {
    let mut ordered: IndexSet<String> = priority
        .iter()
        .filter(|media_type| declared.contains(*media_type))
        .cloned()
        .collect();
    ordered.extend(declared.iter().cloned());
    ordered
}

/// Default media types of a document given the caller's priority list.
pub fn default_media_types(
    content_types: &[String],
    accepts: &[String],
    priority: &[String],
) -> Vec<String> {
    let declared = declared_media_types(content_types, accepts);
    negotiate(&declared, priority).into_iter().collect()
}
