//! Canonical node identifiers.

/// Map a free-text label to its canonical node id.
///
/// Uppercases, turns spaces into underscores and drops apostrophes. No other
/// folding happens: `"Jake "` and `"Jake"` stay distinct.
pub fn normalize_id(label: &str) -> String {
    label.to_uppercase().replace(' ', "_").replace('\'', "")
}

/// Human-readable type name: first character uppercase, the rest lowercase.
pub fn display_type(label: &str) -> String {
    let lower = label.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
