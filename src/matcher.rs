use std::ops::Range;

use regex::{Regex, RegexBuilder};

use crate::error::MatcherError;

/// Case-insensitive matcher over a set of found words.
/// Re-locates those words inside a note's raw text so a search hit can be
/// turned back into an offset.
///
/// Offsets are byte offsets into the searched text.
#[derive(Debug, Clone)]
pub struct TermMatcher {
    regex: Regex,
    last_index: usize,
}

impl TermMatcher {
    /// Build one alternation pattern from `terms`.
    /// Terms are matched literally; duplicates and empty strings are dropped.
    pub fn new<I, S>(terms: I) -> Result<Self, MatcherError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen: Vec<String> = Vec::new();
        for term in terms {
            let term = term.as_ref();
            if term.is_empty() || seen.iter().any(|t| t.eq_ignore_ascii_case(term)) {
                continue;
            }
            seen.push(term.to_string());
        }
        if seen.is_empty() {
            return Err(MatcherError::NoTerms);
        }

        let pattern = seen
            .iter()
            .map(|t| regex::escape(t))
            .collect::<Vec<_>>()
            .join("|");
        let regex = RegexBuilder::new(&pattern).case_insensitive(true).build()?;
        Ok(Self { regex, last_index: 0 })
    }

    /// Find the next occurrence of any term at or after `start`.
    pub fn find_from(&self, text: &str, start: usize) -> Option<Range<usize>> {
        let mut start = start.min(text.len());
        while !text.is_char_boundary(start) {
            start += 1;
        }
        self.regex.find_at(text, start).map(|m| m.range())
    }

    /// Search from the current cursor and move the cursor past the match.
    /// Without a match the cursor stays where the search started.
    pub fn exec(&mut self, text: &str) -> Option<Range<usize>> {
        let found = self.find_from(text, self.last_index)?;
        self.last_index = found.end;
        Some(found)
    }

    /// Where the next `exec` will start searching.
    pub fn last_index(&self) -> usize {
        self.last_index
    }

    pub fn set_last_index(&mut self, index: usize) {
        self.last_index = index;
    }
}
