use regex::Regex;
use std::sync::OnceLock;

/// Marker separating a nested group label inside a raw group attribute.
pub const NESTED_GROUP_MARKER: &str = " | ";

fn residue_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // sanitize rules leave only word characters, underscores and hyphens
    RE.get_or_init(|| Regex::new(r"[^\w\-]+").unwrap())
}

/// Sanitizes a raw category label into a filesystem and markup safe slug.
/// Different labels may collapse to the same slug and then share a bouquet,
/// an accepted collision.
pub fn sanitize_label(label: &str) -> String {
    let collapsed = label
        .trim()
        .replace(NESTED_GROUP_MARKER, "-")
        .replace(' ', "_")
        .replace('+', "");
    residue_regex()
        .replace_all(&collapsed, "")
        .trim_matches('-')
        .to_string()
}

/// Stable bouquet file name for a provider prefix and raw category label.
/// An empty label maps to the provider catch-all bouquet.
pub fn bouquet_filename(file_prefix: &str, label: &str) -> String {
    let slug = sanitize_label(label);
    if slug.is_empty() {
        format!("{file_prefix}.tv")
    } else {
        format!("{file_prefix}_{slug}.tv")
    }
}
