//! Static-call idiom patterns scanned for in source text.
//!
//! The canonical set targets the C# static calls that defeat naive unit
//! testing: ambient time lookups, filesystem existence checks, and GUID
//! generation. Time patterns exclude assignment positions (`DateTime.Now =`)
//! since writing to the property is not a call site worth mocking; the
//! `regex` crate has no lookahead, so the exclusion is a post-match check on
//! the text that follows.

use regex::Regex;

use crate::core::errors::{CallsiftError, Result};

/// One named search pattern compiled for occurrence scanning.
#[derive(Debug, Clone)]
pub struct StaticPattern {
    name: String,
    regex: Regex,
    reject_assignment: bool,
}

impl StaticPattern {
    /// Compile a pattern.
    pub fn new(
        name: impl Into<String>,
        pattern: &str,
        reject_assignment: bool,
    ) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| {
            CallsiftError::validation(format!("invalid occurrence pattern '{pattern}': {e}"))
        })?;
        Ok(Self {
            name: name.into(),
            regex,
            reject_assignment,
        })
    }

    /// Pattern display name ("DateTime.Now").
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Byte offsets of every non-overlapping occurrence in `text`.
    pub fn occurrences<'t>(&self, text: &'t str) -> Vec<usize> {
        self.regex
            .find_iter(text)
            .filter(|m| !(self.reject_assignment && followed_by_assignment(text, m.end())))
            .map(|m| m.start())
            .collect()
    }
}

/// True when the first non-whitespace character after `end` is a lone `=`,
/// i.e. the occurrence is the target of an assignment.
fn followed_by_assignment(text: &str, end: usize) -> bool {
    text[end..]
        .chars()
        .find(|c| !c.is_whitespace())
        .is_some_and(|c| c == '=')
}

/// The canonical C# static-call idiom set.
pub fn default_patterns() -> Result<Vec<StaticPattern>> {
    Ok(vec![
        StaticPattern::new("DateTime.Now", r"DateTime\s*\.\s*Now", true)?,
        StaticPattern::new("DateTime.UtcNow", r"DateTime\s*\.\s*UtcNow", true)?,
        StaticPattern::new("File.Exists", r"File\s*\.\s*Exists\s*\(", false)?,
        StaticPattern::new("Directory.Exists", r"Directory\s*\.\s*Exists\s*\(", false)?,
        StaticPattern::new("Guid.NewGuid", r"Guid\s*\.\s*NewGuid\s*\(", false)?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_set_compiles() {
        let patterns = default_patterns().unwrap();
        assert_eq!(patterns.len(), 5);
    }

    #[test]
    fn finds_time_occurrences() {
        let patterns = default_patterns().unwrap();
        let now = &patterns[0];
        assert_eq!(now.occurrences("var t = DateTime.Now;").len(), 1);
        assert_eq!(now.occurrences("var t = DateTime . Now;").len(), 1);
        assert_eq!(now.occurrences("var t = OtherClock.Now;").len(), 0);
    }

    #[test]
    fn assignment_positions_are_rejected() {
        let patterns = default_patterns().unwrap();
        let now = &patterns[0];
        assert!(now.occurrences("DateTime.Now = fake;").is_empty());
        assert!(now.occurrences("DateTime.Now   = fake;").is_empty());
        assert_eq!(now.occurrences("Log(DateTime.Now);").len(), 1);
    }

    #[test]
    fn utc_now_does_not_match_plain_now_pattern() {
        let patterns = default_patterns().unwrap();
        let now = &patterns[0];
        let utc = &patterns[1];
        let text = "var t = DateTime.UtcNow;";
        assert!(now.occurrences(text).is_empty());
        assert_eq!(utc.occurrences(text).len(), 1);
    }

    #[test]
    fn call_patterns_require_open_paren() {
        let patterns = default_patterns().unwrap();
        let file_exists = &patterns[2];
        assert_eq!(file_exists.occurrences("if (File.Exists(path))").len(), 1);
        assert!(file_exists.occurrences("// File.Exists docs").is_empty());
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        assert!(StaticPattern::new("bad", r"([unclosed", false).is_err());
    }
}
