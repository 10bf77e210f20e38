//! URL slug derivation

use crate::error::ValidationError;

/// Maximum slug length before whitespace is replaced.
pub const MAX_SLUG_LEN: usize = 100;

/// Derive a URL-safe slug from a display name.
///
/// Lowercases, drops anything outside `[a-z0-9]`, whitespace and `-`,
/// collapses whitespace runs, truncates to [`MAX_SLUG_LEN`], trims, then
/// turns the remaining whitespace into `-`.
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();

    let mut collapsed = String::with_capacity(lowered.len());
    let mut in_space = false;
    for c in lowered.chars() {
        if c.is_whitespace() {
            if !in_space {
                collapsed.push(' ');
            }
            in_space = true;
        } else if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
            collapsed.push(c);
            in_space = false;
        }
    }

    // Only ASCII survives the filter, so byte truncation is safe.
    collapsed.truncate(MAX_SLUG_LEN);
    collapsed.trim().replace(' ', "-")
}

/// Validate a display name and return its slug.
pub fn slug_for_name(name: &str) -> Result<String, ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::RequiredFieldMissing {
            field: "name".to_string(),
        });
    }
    let slug = slugify(name);
    if slug.is_empty() {
        return Err(ValidationError::InvalidValue {
            field: "name".to_string(),
            reason: "must contain at least one letter or digit".to_string(),
        });
    }
    Ok(slug)
}
