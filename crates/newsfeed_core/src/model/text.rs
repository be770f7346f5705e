//! Name and slug normalization helpers.

use once_cell::sync::Lazy;
use regex::Regex;

static NON_SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9_\s-]").expect("valid slug charset regex"));
static SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[-\s]+").expect("valid separator regex"));

/// Converts a display name into a URL-safe slug.
///
/// Non-ASCII characters and punctuation are dropped, the rest is lowercased
/// and runs of whitespace or hyphens collapse into one `-`.
pub fn slugify(value: &str) -> String {
    let ascii: String = value.chars().filter(char::is_ascii).collect();
    let lowered = ascii.to_ascii_lowercase();
    let stripped = NON_SLUG_RE.replace_all(&lowered, "");
    SEPARATOR_RE
        .replace_all(stripped.trim(), "-")
        .into_owned()
}

/// Uppercases the first letter of every word and lowercases the rest.
///
/// A word starts at any letter not preceded by another letter, so
/// `"r&d ops"` becomes `"R&D Ops"`.
pub fn title_case(value: &str) -> String {
    let mut previous_is_alpha = false;
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if ch.is_alphabetic() {
            if previous_is_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            previous_is_alpha = true;
        } else {
            out.push(ch);
            previous_is_alpha = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{slugify, title_case};

    #[test]
    fn slugify_collapses_separators_and_drops_punctuation() {
        assert_eq!(slugify("  Human Resources  "), "human-resources");
        assert_eq!(slugify("R&D -- Labs"), "rd-labs");
        assert_eq!(slugify("Café Ops"), "caf-ops");
        assert_eq!(slugify("ops_team"), "ops_team");
    }

    #[test]
    fn title_case_restarts_after_non_letters() {
        assert_eq!(title_case("human resources"), "Human Resources");
        assert_eq!(title_case("r&d OPS"), "R&D Ops");
        assert_eq!(title_case("team 2b"), "Team 2B");
    }
}
