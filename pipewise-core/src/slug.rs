use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::validation::ValidationError;

const MAX_SLUG_LEN: usize = 80;

/// Slug used when a name has no usable characters.
pub const FALLBACK_SLUG: &str = "untitled";

static SLUG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid regex")
});

/// Check a caller-supplied slug.
pub fn validate_slug(value: &str) -> Result<String, ValidationError> {
    let slug = value.trim();
    if slug.is_empty() {
        return Err(ValidationError::Empty { field: "slug" });
    }
    if slug.len() > MAX_SLUG_LEN + 20 {
        return Err(ValidationError::TooLong {
            field: "slug",
            max: MAX_SLUG_LEN + 20,
        });
    }
    if !SLUG_RE.is_match(slug) {
        return Err(ValidationError::InvalidFormat {
            field: "slug",
            reason: "must be lowercase letters, digits and single dashes",
        });
    }
    Ok(slug.to_string())
}

pub fn slugify(input: &str) -> String {
    let mut slug = String::new();
    let mut last_was_dash = false;

    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_was_dash = false;
        } else if ch.is_ascii() && !slug.is_empty() && !last_was_dash {
            slug.push('-');
            last_was_dash = true;
        }
        // Non-ASCII characters are skipped entirely.
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    if slug.len() > MAX_SLUG_LEN {
        slug.truncate(MAX_SLUG_LEN);
        while slug.ends_with('-') {
            slug.pop();
        }
    }

    if slug.is_empty() {
        return FALLBACK_SLUG.to_string();
    }

    slug
}

/// First slug derived from `base` that is not in `taken`: `base`, then
/// `base-1`, `base-2`, ...
pub fn first_available<'a, I>(base: &str, taken: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let taken: HashSet<&str> = taken.into_iter().collect();
    if !taken.contains(base) {
        return base.to_string();
    }

    (1..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !taken.contains(candidate.as_str()))
        .unwrap_or_else(|| base.to_string())
}

/// Slug for `name`, unique against `taken`.
pub fn available_slug<'a, I>(name: &str, taken: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    first_available(&slugify(name), taken)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_basic_cases() {
        assert_eq!(slugify("Acme Inc"), "acme-inc");
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("emoji 😀 test"), "emoji-test");
        assert_eq!(slugify("foo/bar\\baz"), "foo-bar-baz");
        assert_eq!(slugify("  --Acme,  Inc.--  "), "acme-inc");
    }

    #[test]
    fn slugify_truncates_and_cleans() {
        let long = "a".repeat(100);
        let slug = slugify(&long);
        assert_eq!(slug.len(), MAX_SLUG_LEN);
        assert!(slug.chars().all(|c| c == 'a'));
    }

    #[test]
    fn slugify_never_empty() {
        assert_eq!(slugify(""), FALLBACK_SLUG);
        assert_eq!(slugify("日本"), FALLBACK_SLUG);
    }

    #[test]
    fn first_available_suffixes() {
        assert_eq!(first_available("acme-inc", []), "acme-inc");
        assert_eq!(first_available("acme-inc", ["acme-inc"]), "acme-inc-1");
        assert_eq!(
            first_available("acme-inc", ["acme-inc", "acme-inc-1", "acme-inc-3"]),
            "acme-inc-2"
        );
    }

    #[test]
    fn unrelated_slugs_do_not_collide() {
        assert_eq!(first_available("acme", ["acme-inc", "acme-1x"]), "acme");
    }

    #[test]
    fn validate_slug_format() {
        assert_eq!(validate_slug(" acme-inc ").unwrap(), "acme-inc");
        assert!(validate_slug("Acme").is_err());
        assert!(validate_slug("acme--inc").is_err());
        assert!(validate_slug("-acme").is_err());
        assert_eq!(
            validate_slug(""),
            Err(ValidationError::Empty { field: "slug" })
        );
    }

    #[test]
    fn slugify_output_always_validates() {
        let long = "z".repeat(200);
        for name in ["Acme Inc", "  x  ", "日本", "a/b/c", long.as_str()] {
            assert!(validate_slug(&slugify(name)).is_ok(), "{name}");
        }
    }

    #[test]
    fn available_slug_from_name() {
        assert_eq!(available_slug("Acme Inc", ["acme-inc"]), "acme-inc-1");
    }
}
