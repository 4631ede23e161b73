//! Small pure text helpers.

/// Truncate a string to fit within `max_total` characters, appending `suffix`
/// if truncated. The suffix counts toward the budget.
fn truncate_to_fit(raw: &str, max_total: usize, suffix: &str) -> String {
    if raw.chars().count() <= max_total {
        return raw.to_string();
    }
    let take = max_total.saturating_sub(suffix.chars().count());
    let head: String = raw.chars().take(take).collect();
    format!("{head}{suffix}")
}

/// Truncate a string to at most `max` characters, adding `...` if needed.
///
/// - Trims surrounding whitespace before truncating.
/// - Counts `char`s, not bytes, so Unicode scalars are never split.
/// - Enforces a minimum `max` of 3 so the ellipsis fits.
#[must_use]
pub fn truncate_with_ellipsis(raw: &str, max: usize) -> String {
    let max = max.max(3);
    truncate_to_fit(raw.trim(), max, "...")
}

#[cfg(test)]
mod tests {
    use super::{truncate_to_fit, truncate_with_ellipsis};

    #[test]
    fn short_string_unchanged() {
        assert_eq!(truncate_with_ellipsis("hello", 10), "hello");
    }

    #[test]
    fn exact_length_unchanged() {
        assert_eq!(truncate_with_ellipsis("hello", 5), "hello");
    }

    #[test]
    fn long_string_gets_ellipsis() {
        assert_eq!(truncate_with_ellipsis("hello world", 8), "hello...");
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        assert_eq!(truncate_with_ellipsis("  hello  ", 10), "hello");
    }

    #[test]
    fn minimum_budget_is_the_ellipsis() {
        assert_eq!(truncate_with_ellipsis("hello", 1), "...");
    }

    #[test]
    fn to_fit_respects_budget() {
        let result = truncate_to_fit("hello world", 8, "…");
        assert!(result.chars().count() <= 8);
        assert!(result.ends_with('…'));
    }

    #[test]
    fn to_fit_counts_chars_not_bytes() {
        let result = truncate_to_fit("héllo wörld", 8, "...");
        assert_eq!(result.chars().count(), 8);
    }
}
