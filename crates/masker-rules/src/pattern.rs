//! Patterns with lookaround-style boundaries
//!
//! `regex` has no lookaround. A `BoundedPattern` gets the same results as
//! `(?<![class])core(?![class])`: the trailing check is compiled into the
//! regex as a consumed, non-captured char (so shorter alternatives are still
//! tried), and the leading check is done by hand on the char before the match.

use regex::{Match, Regex};

/// Char class a match must not touch on either side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// `[0-9A-Za-z]`
    Alphanumeric,
    /// `[0-9A-Z]`
    UpperAlphanumeric,
}

impl Boundary {
    fn class(self) -> &'static str {
        match self {
            Boundary::Alphanumeric => "0-9A-Za-z",
            Boundary::UpperAlphanumeric => "0-9A-Z",
        }
    }

    pub fn contains(self, c: char) -> bool {
        match self {
            Boundary::Alphanumeric => c.is_ascii_alphanumeric(),
            Boundary::UpperAlphanumeric => c.is_ascii_digit() || c.is_ascii_uppercase(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BoundedPattern {
    regex: Regex,
    boundary: Boundary,
}

impl BoundedPattern {
    pub fn new(core: &str, boundary: Boundary) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("({core})(?:[^{}]|$)", boundary.class()))?;
        Ok(Self { regex, boundary })
    }

    /// All non-overlapping matches, leftmost first, as byte ranges
    pub fn find_all<'t>(&self, text: &'t str) -> Vec<Match<'t>> {
        let mut matches = Vec::new();
        let mut pos = 0;

        while pos <= text.len() {
            let Some(core) = self.regex.captures_at(text, pos).and_then(|caps| caps.get(1)) else {
                break;
            };

            if self.clear_before(text, core.start()) {
                pos = core.end().max(core.start() + 1);
                matches.push(core);
            } else {
                // Lookbehind failed at this start; retry from the next char
                pos = text[core.start()..]
                    .chars()
                    .next()
                    .map_or(text.len() + 1, |c| core.start() + c.len_utf8());
            }
        }

        matches
    }

    fn clear_before(&self, text: &str, start: usize) -> bool {
        text[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !self.boundary.contains(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_adjacent_alphanumerics() {
        let pattern = BoundedPattern::new(r"\d{4}", Boundary::Alphanumeric).unwrap();

        let found: Vec<&str> = pattern.find_all("a1234 1234 12345 b").iter().map(|m| m.as_str()).collect();
        assert_eq!(found, vec!["1234"]);
    }

    #[test]
    fn test_backtracks_to_shorter_match() {
        // 8 digits followed by a letter must fall back to nothing, 7 with a dash is fine
        let pattern = BoundedPattern::new(r"\d{7,8}", Boundary::Alphanumeric).unwrap();

        assert!(pattern.find_all("12345678x").is_empty());
        let found = pattern.find_all("1234567-");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].as_str(), "1234567");
    }

    #[test]
    fn test_cjk_neighbours_are_not_boundaries() {
        let pattern = BoundedPattern::new(r"\d{4}", Boundary::Alphanumeric).unwrap();

        let found = pattern.find_all("号码1234和5678");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].start(), "号码".len());
    }

    #[test]
    fn test_upper_boundary_allows_lowercase() {
        let pattern = BoundedPattern::new(r"[CWHM]\d{8}", Boundary::UpperAlphanumeric).unwrap();

        assert_eq!(pattern.find_all("xC12345678").len(), 1);
        assert!(pattern.find_all("XC12345678").is_empty());
    }
}
