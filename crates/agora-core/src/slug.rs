//! URL slugs derived from post titles.

const FALLBACK_SLUG: &str = "post";

/// Lowercase the title, keep ASCII letters, digits and `_`, and turn every run
/// of whitespace, `_` and `-` into a single hyphen. Other characters are
/// dropped. Leading and trailing hyphens never appear.
pub fn slugify(title: &str) -> String {
    let lowered = title.trim().to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    let mut separator_pending = false;

    for ch in lowered.chars() {
        if ch.is_ascii_alphanumeric() {
            if separator_pending && !slug.is_empty() {
                slug.push('-');
            }
            separator_pending = false;
            slug.push(ch);
        } else if ch.is_whitespace() || ch == '_' || ch == '-' {
            separator_pending = true;
        }
    }

    slug
}

/// Disambiguate a slug with a base-36 millisecond timestamp.
pub fn with_unique_suffix(base: &str, unix_millis: i64) -> String {
    let base = if base.is_empty() { FALLBACK_SLUG } else { base };
    format!("{base}-{}", to_base36(unix_millis.unsigned_abs()))
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.iter().rev().map(|&b| b as char).collect()
}
