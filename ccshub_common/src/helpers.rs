/// Parse a boolean flag from a string value, or return the given default value otherwise.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let value = match value {
        Some(v) => v,
        None => return default,
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// Turns a free-text search keyword into a lowercase `LIKE` pattern that matches it anywhere in a column.
///
/// Returns `None` for blank keywords, which callers treat as "no filter".
pub fn substring_pattern(keyword: Option<&str>) -> Option<String> {
    let keyword = keyword?.trim();
    if keyword.is_empty() {
        return None;
    }
    Some(format!("%{}%", keyword.to_lowercase()))
}
