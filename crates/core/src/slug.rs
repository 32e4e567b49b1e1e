//! URL-safe slug derivation for guides and tags.

use crate::constants::FALLBACK_SLUG;

/// Derives a slug from a title or name.
///
/// Lower-cases the input, collapses every run of characters that are not ASCII alphanumerics
/// into a single `-`, and trims leading and trailing hyphens. Input with no ASCII alphanumerics
/// yields [`FALLBACK_SLUG`].
///
/// # Arguments
///
/// * `input` - The title or name to derive from.
///
/// # Returns
///
/// A non-empty slug containing only `a-z`, `0-9` and `-`.
pub fn derive_slug(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_hyphen = false;

    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    if slug.is_empty() {
        FALLBACK_SLUG.to_owned()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_slug_collapses_punctuation() {
        assert_eq!(
            derive_slug("Getting Started: PK Tips!"),
            "getting-started-pk-tips"
        );
    }

    #[test]
    fn test_derive_slug_trims_hyphens() {
        assert_eq!(derive_slug("  --Hello,   World--  "), "hello-world");
    }

    #[test]
    fn test_derive_slug_treats_non_ascii_as_separator() {
        assert_eq!(derive_slug("Café Münster 2"), "caf-m-nster-2");
    }

    #[test]
    fn test_derive_slug_falls_back_when_empty() {
        assert_eq!(derive_slug(""), FALLBACK_SLUG);
        assert_eq!(derive_slug("!!! ???"), FALLBACK_SLUG);
    }
}
