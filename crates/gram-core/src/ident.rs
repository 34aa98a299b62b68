//! Canonical identities
//!
//! Every ingredient, cookware item and intermediate preparation is keyed by
//! the slug of its display name. Two names collide exactly when their slugs
//! are equal, so this function must stay pure and deterministic.

/// Identity used when a name slugifies to nothing (e.g. only punctuation).
pub const UNKNOWN_IDENTITY: &str = "unknown";

/// Derive the canonical identity of a display name.
///
/// Lowercases, transliterates diacritics ("crème" → "creme"), collapses every
/// run of non-alphanumeric characters into a single `-` and trims leading and
/// trailing dashes. Falls back to [`UNKNOWN_IDENTITY`] for empty results.
pub fn slugify(text: &str) -> String {
    let slug = slug::slugify(text);
    if slug.is_empty() {
        UNKNOWN_IDENTITY.to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Flour", "flour")]
    #[case("  Egg White ", "egg-white")]
    #[case("Crème Brûlée", "creme-brulee")]
    #[case("pâte à choux", "pate-a-choux")]
    #[case("salt & pepper", "salt-pepper")]
    #[case("--dark--chocolate--", "dark-chocolate")]
    fn test_slugify(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(slugify(input), expected);
    }

    #[test]
    fn test_slugify_empty_falls_back() {
        assert_eq!(slugify(""), UNKNOWN_IDENTITY);
        assert_eq!(slugify("!!!"), UNKNOWN_IDENTITY);
    }

    #[test]
    fn test_slugify_is_stable() {
        assert_eq!(slugify("Pastry Cream"), slugify("pastry   cream"));
    }
}
