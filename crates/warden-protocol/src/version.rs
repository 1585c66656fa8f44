//! Protocol version comparison

/// Parse a `major.minor` version string.
pub fn parse_version(text: &str) -> Option<(u64, u64)> {
    let (major, minor) = text.split_once('.')?;
    if minor.contains('.') {
        return None;
    }
    Some((major.parse().ok()?, minor.parse().ok()?))
}

/// Whether `current` satisfies `required` (major first, then minor).
///
/// An unparseable `current` never satisfies anything; callers validate
/// `required` before comparing.
pub fn version_gte(current: &str, required: &str) -> bool {
    match (parse_version(current), parse_version(required)) {
        (Some(current), Some(required)) => current >= required,
        _ => false,
    }
}
