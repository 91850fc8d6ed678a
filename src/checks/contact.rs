use regex::{Regex, RegexBuilder};
use std::path::Path;
use tracing::{info, warn};

/// Pattern-based classifier for "I need a specialist" messages.
///
/// Patterns are tried in order and the first match wins. A missing pattern
/// file leaves the detector empty, which never matches.
#[derive(Debug, Clone, Default)]
pub struct ContactRequestDetector {
    patterns: Vec<Regex>,
}

impl ContactRequestDetector {
    pub fn new(patterns: Vec<Regex>) -> Self {
        Self { patterns }
    }

    /// Compile patterns given as strings, in either accepted line format.
    #[cfg(test)]
    pub fn from_patterns<'a, I>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let patterns = patterns
            .into_iter()
            .map(compile_pattern)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(patterns))
    }

    /// Load one pattern per line from `path`.
    ///
    /// Blank lines are skipped, lines that fail to compile are skipped with a
    /// warning, and an absent or unreadable file yields an empty detector.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                info!(
                    "Contact patterns not loaded from {} ({}), contact detection disabled",
                    path.display(),
                    e
                );
                return Self::default();
            }
        };

        let mut patterns = Vec::new();
        for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
            match compile_pattern(line) {
                Ok(regex) => patterns.push(regex),
                Err(e) => warn!(pattern = line, error = %e, "Skipping invalid contact pattern"),
            }
        }

        info!(
            "Loaded {} contact patterns from {}",
            patterns.len(),
            path.display()
        );
        Self::new(patterns)
    }

    pub fn is_contact_request(&self, text: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(text))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Compile a bare regex, or a delimited `/body/flags` pattern.
///
/// Supported flags: `i`, `m`, `s`, `x`; `u` is accepted and ignored since
/// matching is always Unicode-aware.
pub fn compile_pattern(line: &str) -> Result<Regex, regex::Error> {
    if let Some((body, flags)) = split_delimited(line) {
        return RegexBuilder::new(body)
            .case_insensitive(flags.contains('i'))
            .multi_line(flags.contains('m'))
            .dot_matches_new_line(flags.contains('s'))
            .ignore_whitespace(flags.contains('x'))
            .build();
    }
    Regex::new(line)
}

fn split_delimited(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix('/')?;
    let end = rest.rfind('/')?;
    let (body, flags) = (&rest[..end], &rest[end + 1..]);
    if flags.chars().all(|c| "imsxu".contains(c)) {
        Some((body, flags))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_detector_never_matches() {
        let detector = ContactRequestDetector::default();
        assert!(detector.is_empty());
        assert!(!detector.is_contact_request("recommend a dentist"));
        assert!(!detector.is_contact_request(""));
    }

    #[test]
    fn test_matches_when_any_pattern_matches() {
        let detector =
            ContactRequestDetector::from_patterns([r"plumber", r"(?i)\bdentist\b"]).unwrap();
        assert!(detector.is_contact_request("need a plumber"));
        assert!(detector.is_contact_request("Any good DENTIST around?"));
        assert!(!detector.is_contact_request("nice weather today"));
    }

    #[test]
    fn test_delimited_pattern_flags() {
        let detector = ContactRequestDetector::from_patterns(["/посоветуйте.*мастера/iu"]).unwrap();
        assert!(detector.is_contact_request("Посоветуйте хорошего МАСТЕРА"));

        let dotall = compile_pattern("/a.b/s").unwrap();
        assert!(dotall.is_match("a\nb"));
        let plain = compile_pattern("/a.b/").unwrap();
        assert!(!plain.is_match("a\nb"));
    }

    #[test]
    fn test_slash_without_flags_is_plain_regex() {
        // Not a delimited pattern: "z" is not a flag.
        let regex = compile_pattern("/path/z").unwrap();
        assert!(regex.is_match("see /path/z here"));
    }

    #[test]
    fn test_load_skips_blank_and_invalid_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contact_keywords.txt");
        std::fs::write(&path, "\n  /recommend/i  \n(unclosed\n\n(?i)looking for\n").unwrap();

        let detector = ContactRequestDetector::load(&path);
        assert_eq!(detector.len(), 2);
        assert!(detector.is_contact_request("Can you RECOMMEND someone?"));
        assert!(detector.is_contact_request("Looking for an electrician"));
    }

    #[test]
    fn test_missing_file_yields_empty_detector() {
        let detector = ContactRequestDetector::load(Path::new("/nonexistent/contact_keywords.txt"));
        assert!(detector.is_empty());
        assert!(!detector.is_contact_request("recommend a plumber"));
    }

    #[test]
    fn test_from_patterns_reports_invalid_regex() {
        assert!(ContactRequestDetector::from_patterns(["(broken"]).is_err());
    }
}
