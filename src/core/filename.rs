const FORBIDDEN: &[char] = &['/', '\\', '?', '%', '*', ':', '|', '"', '<', '>'];

/// Replaces every character that is illegal in a path segment on common
/// filesystems with `-`. Everything else is kept, in order.
pub fn sanitize_path_component(name: &str) -> String {
    name.chars()
        .map(|c| if FORBIDDEN.contains(&c) { '-' } else { c })
        .collect()
}

/// Trim, then sanitize. Used for every title scraped from a page.
pub fn clean_title(raw: &str) -> String {
    sanitize_path_component(raw.trim())
}
