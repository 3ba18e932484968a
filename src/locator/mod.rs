//! Heuristic source-location resolution for static-call occurrences.
//!
//! For each pattern occurrence in a file, the locator walks backward through
//! lines to find the nearest enclosing method signature and, further
//! backward, the nearest enclosing class declaration. This is windowed text
//! scanning, not parsing: it does not track brace nesting, and a parenthesized
//! construct sitting between the occurrence and the true signature can be
//! misattributed. That imprecision is an accepted property of the design, and
//! the downstream stub generator tolerates it.

pub mod patterns;

use std::path::{Path, PathBuf};

use indexmap::{IndexMap, IndexSet};
use regex::Regex;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::core::config::LocatorConfig;
use crate::core::errors::Result;
use patterns::StaticPattern;

/// Sentinel method name when no signature is found within the window.
pub const UNKNOWN_METHOD: &str = "UnknownMethod";

/// One occurrence of a static-call idiom in a file's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    /// Name of the pattern that matched
    pub pattern: String,

    /// Byte offset of the match in the file text
    pub offset: usize,

    /// Zero-based line number (newline count before the offset)
    pub line: usize,
}

/// Heuristic owner of a [`PatternMatch`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodAttribution {
    /// Enclosing class name, or the file's base name when none was found
    pub class_name: String,

    /// Enclosing method name, or [`UNKNOWN_METHOD`]
    pub method_name: String,

    /// Raw text between the signature's parentheses
    pub parameter_list: String,

    /// Whether the keyword `static` appears on the signature line
    pub is_static: bool,
}

/// Scan results for one file.
#[derive(Debug, Clone)]
pub struct FileScan {
    /// File path
    pub path: PathBuf,

    /// Deduplicated attributions for every occurrence in the file
    pub attributions: Vec<MethodAttribution>,

    /// Names of the patterns that occurred at least once
    pub patterns_seen: Vec<String>,
}

/// Scan results for a directory tree.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// Per-file results, only files with at least one occurrence
    pub files: Vec<FileScan>,

    /// Number of files containing each pattern, in pattern order
    pub pattern_file_counts: IndexMap<String, usize>,
}

impl ScanReport {
    /// Total files with at least one occurrence.
    pub fn files_with_occurrences(&self) -> usize {
        self.files.len()
    }
}

/// Locates pattern occurrences and attributes them to methods and classes.
pub struct OccurrenceLocator {
    patterns: Vec<StaticPattern>,
    method_window: usize,
    class_window: usize,
    file_extension: String,
    skip_dirs: Vec<String>,
    method_regex: Regex,
    class_regex: Regex,
}

impl OccurrenceLocator {
    /// Build a locator with the canonical pattern set.
    pub fn new(config: &LocatorConfig) -> Result<Self> {
        Self::with_patterns(config, patterns::default_patterns()?)
    }

    /// Build a locator over an explicit pattern set.
    pub fn with_patterns(config: &LocatorConfig, patterns: Vec<StaticPattern>) -> Result<Self> {
        Ok(Self {
            patterns,
            method_window: config.method_window,
            class_window: config.class_window,
            file_extension: config.file_extension.clone(),
            skip_dirs: config.skip_dirs.clone(),
            // A generic "identifier ( parameter-list )" shape; deliberately
            // simple so the same heuristic fires on ordinary signatures and
            // on expression-bodied members alike
            method_regex: Regex::new(r"(?P<name>\w+)\s*\((?P<params>[^)]*)\)")
                .expect("method signature regex is valid"),
            class_regex: Regex::new(r"class\s+(?P<name>\w+)")
                .expect("class declaration regex is valid"),
        })
    }

    /// Find every pattern occurrence in `text`.
    pub fn find_occurrences(&self, text: &str) -> Vec<PatternMatch> {
        let mut matches = Vec::new();
        for pattern in &self.patterns {
            for offset in pattern.occurrences(text) {
                let line = text[..offset].matches('\n').count();
                matches.push(PatternMatch {
                    pattern: pattern.name().to_string(),
                    offset,
                    line,
                });
            }
        }
        matches
    }

    /// Attribute one occurrence to its enclosing method and class.
    ///
    /// The method search scans upward from the match line (inclusive) for at
    /// most `method_window` lines. The class search continues upward from the
    /// line where the method search stopped, not from the match line, so a
    /// found signature narrows the class window; that anchoring is preserved
    /// behavior.
    pub fn attribute(&self, text: &str, m: &PatternMatch, file_path: &Path) -> MethodAttribution {
        let lines: Vec<&str> = text.lines().collect();
        let match_line = m.line.min(lines.len().saturating_sub(1));

        let mut method_name = None;
        let mut parameter_list = String::new();
        let mut is_static = false;
        let mut method_line = None;

        let method_floor = match_line.saturating_sub(self.method_window - 1);
        for i in (method_floor..=match_line).rev() {
            let line = lines[i].trim();
            if line.is_empty() {
                continue;
            }
            if let Some(caps) = self.method_regex.captures(line) {
                method_name = Some(caps["name"].to_string());
                parameter_list = caps["params"].trim().to_string();
                is_static = line.contains("static");
                method_line = Some(i);
                break;
            }
        }

        let class_anchor = method_line.unwrap_or(match_line);
        let class_floor = class_anchor.saturating_sub(self.class_window - 1);
        let mut class_name = None;
        for i in (class_floor..=class_anchor).rev() {
            if let Some(caps) = self.class_regex.captures(lines[i].trim()) {
                class_name = Some(caps["name"].to_string());
                break;
            }
        }

        MethodAttribution {
            class_name: class_name.unwrap_or_else(|| file_base_name(file_path)),
            method_name: method_name.unwrap_or_else(|| UNKNOWN_METHOD.to_string()),
            parameter_list,
            is_static,
        }
    }

    /// Scan one file, returning its deduplicated attributions.
    ///
    /// An unreadable file yields an empty result; a single bad file must not
    /// abort a directory-wide scan.
    pub fn scan_file(&self, path: &Path) -> Option<FileScan> {
        let text = match read_lossy(path) {
            Ok(text) => text,
            Err(err) => {
                warn!("skipping unreadable file {}: {err}", path.display());
                return None;
            }
        };

        let occurrences = self.find_occurrences(&text);
        if occurrences.is_empty() {
            return None;
        }

        let mut attributions: IndexSet<MethodAttribution> = IndexSet::new();
        let mut patterns_seen: IndexSet<String> = IndexSet::new();
        for m in &occurrences {
            patterns_seen.insert(m.pattern.clone());
            attributions.insert(self.attribute(&text, m, path));
        }

        debug!(
            path = %path.display(),
            occurrences = occurrences.len(),
            attributions = attributions.len(),
            "scanned file"
        );

        Some(FileScan {
            path: path.to_path_buf(),
            attributions: attributions.into_iter().collect(),
            patterns_seen: patterns_seen.into_iter().collect(),
        })
    }

    /// Scan a directory tree for source files containing occurrences.
    pub fn scan_directory(&self, root: &Path) -> ScanReport {
        let mut report = ScanReport::default();
        for pattern in &self.patterns {
            report.pattern_file_counts.insert(pattern.name().to_string(), 0);
        }

        let walker = WalkDir::new(root).into_iter().filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            !(entry.file_type().is_dir() && self.skip_dirs.iter().any(|d| d == name.as_ref()))
        });

        for entry in walker.filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let matches_ext = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.file_extension));
            if !matches_ext {
                continue;
            }

            if let Some(scan) = self.scan_file(path) {
                for pattern in &scan.patterns_seen {
                    if let Some(count) = report.pattern_file_counts.get_mut(pattern) {
                        *count += 1;
                    }
                }
                report.files.push(scan);
            }
        }

        report
    }
}

/// Read a file as text, dropping undecodable bytes rather than failing.
fn read_lossy(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn file_base_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| UNKNOWN_METHOD.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locator() -> OccurrenceLocator {
        OccurrenceLocator::new(&LocatorConfig::default()).unwrap()
    }

    const SAMPLE: &str = r#"using System;

namespace Demo
{
    public class OrderService
    {
        static string Foo(int x)
        {
            var stamp = DateTime.Now;
            return stamp.ToString();
        }

        public bool CheckInput(string path, int retries)
        {
            if (File.Exists(path))
            {
                return true;
            }
            var id = Guid.NewGuid();
            return id != Guid.Empty;
        }
    }
}
"#;

    #[test]
    fn occurrence_line_numbers_are_newline_counts() {
        let loc = locator();
        let matches = loc.find_occurrences(SAMPLE);
        let now = matches.iter().find(|m| m.pattern == "DateTime.Now").unwrap();
        // `var stamp = DateTime.Now;` is the 9th line, zero-based index 8
        assert_eq!(now.line, 8);
        assert_eq!(&SAMPLE[..now.offset].matches('\n').count(), &now.line);
    }

    #[test]
    fn attributes_static_method_signature() {
        let loc = locator();
        let matches = loc.find_occurrences(SAMPLE);
        let now = matches.iter().find(|m| m.pattern == "DateTime.Now").unwrap();

        let attr = loc.attribute(SAMPLE, now, Path::new("OrderService.cs"));
        assert_eq!(attr.method_name, "Foo");
        assert_eq!(attr.parameter_list, "int x");
        assert!(attr.is_static);
        assert_eq!(attr.class_name, "OrderService");
    }

    #[test]
    fn attributes_instance_method_signature() {
        let loc = locator();
        let matches = loc.find_occurrences(SAMPLE);
        let guid = matches.iter().find(|m| m.pattern == "Guid.NewGuid").unwrap();

        let attr = loc.attribute(SAMPLE, guid, Path::new("OrderService.cs"));
        // The occurrence's own line carries `NewGuid()`, a parenthesized
        // shape, and wins the backward scan before the true signature is
        // reached. Accepted heuristic imprecision.
        assert_eq!(attr.method_name, "NewGuid");
        assert!(!attr.is_static);
        assert_eq!(attr.class_name, "OrderService");
    }

    #[test]
    fn falls_back_to_sentinels() {
        let loc = locator();
        let text = "var t = DateTime.Now;\n";
        let matches = loc.find_occurrences(text);
        assert_eq!(matches.len(), 1);

        let attr = loc.attribute(text, &matches[0], Path::new("dir/Helpers.cs"));
        assert_eq!(attr.method_name, UNKNOWN_METHOD);
        assert_eq!(attr.class_name, "Helpers");
        assert_eq!(attr.parameter_list, "");
        assert!(!attr.is_static);
    }

    #[test]
    fn method_window_bounds_the_backward_scan() {
        let mut text = String::from("class Wide {\n    void Far(string a)\n    {\n");
        for _ in 0..120 {
            text.push_str("        // filler\n");
        }
        text.push_str("        var t = DateTime.Now;\n    }\n}\n");

        let loc = locator();
        let matches = loc.find_occurrences(&text);
        let attr = loc.attribute(&text, &matches[0], Path::new("Wide.cs"));

        // The signature sits more than 80 lines up; out of the window
        assert_eq!(attr.method_name, UNKNOWN_METHOD);
        // The class search runs from the match line and 200 lines still
        // reach the declaration
        assert_eq!(attr.class_name, "Wide");
    }

    #[test]
    fn class_search_anchors_where_method_search_stopped() {
        // Class declaration at line 0, method signature at line 150, match
        // at line 212. A 200-line class window anchored at the match line
        // would stop short of the declaration; anchored at the found
        // signature line it reaches it.
        let mut text = String::from("class Anchored {\n");
        for _ in 0..149 {
            text.push_str("    ; padding\n");
        }
        text.push_str("    void Near(int v)\n    {\n");
        for _ in 0..60 {
            text.push_str("        ; padding\n");
        }
        text.push_str("        var t = DateTime.Now;\n    }\n}\n");

        let loc = locator();
        let matches = loc.find_occurrences(&text);
        assert_eq!(matches[0].line, 212);

        let attr = loc.attribute(&text, &matches[0], Path::new("Anchored.cs"));
        assert_eq!(attr.method_name, "Near");
        assert_eq!(attr.class_name, "Anchored");
    }

    #[test]
    fn multiple_occurrences_in_one_method_deduplicate() {
        let text = r#"class Dedup
{
    void Both(string path)
    {
        if (File.Exists(path)) { }
        var id = Guid.NewGuid();
    }
}
"#;
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("Dedup.cs");
        std::fs::write(&file, text).unwrap();

        let scan = locator().scan_file(&file).unwrap();
        // Two different patterns, one enclosing method
        assert_eq!(scan.attributions.len(), 1);
        assert_eq!(scan.patterns_seen.len(), 2);
    }

    #[test]
    fn unreadable_file_yields_empty_scan() {
        let scan = locator().scan_file(Path::new("/nonexistent/Missing.cs"));
        assert!(scan.is_none());
    }

    #[test]
    fn directory_scan_skips_configured_dirs_and_counts_patterns() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::create_dir_all(dir.path().join("bin")).unwrap();

        std::fs::write(
            dir.path().join("src/Clock.cs"),
            "class Clock { DateTime Tick() { return DateTime.Now; } }\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("bin/Skipped.cs"),
            "class Skipped { DateTime Tick() { return DateTime.Now; } }\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("src/readme.txt"), "DateTime.Now\n").unwrap();

        let report = locator().scan_directory(dir.path());
        assert_eq!(report.files_with_occurrences(), 1);
        assert_eq!(report.pattern_file_counts["DateTime.Now"], 1);
        assert_eq!(report.pattern_file_counts["Guid.NewGuid"], 0);
    }
}
