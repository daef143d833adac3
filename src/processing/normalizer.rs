//! Text normalization shared by every scoring path

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static NON_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9\s]").expect("Invalid non-alphanumeric regex"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

static PERSON_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z][a-z]+ [A-Z][a-z]+\b").expect("Invalid name regex"));

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("Invalid email regex")
});

static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{10}\b").expect("Invalid phone regex"));

/// Lowercase, replace anything outside `[a-z0-9\s]` with a space, collapse
/// whitespace and trim.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = NON_ALNUM.replace_all(&lowered, " ");
    WHITESPACE.replace_all(&stripped, " ").trim().to_string()
}

/// Normalization for vocabulary terms: punctuation is removed rather than
/// turned into a word break, so "c++" becomes "c" and "node.js" becomes "nodejs".
pub fn normalize_term(term: &str) -> String {
    let lowered = term.to_lowercase();
    let stripped = NON_ALNUM.replace_all(&lowered, "");
    WHITESPACE.replace_all(&stripped, " ").trim().to_string()
}

/// Mask personal details that should not influence screening.
///
/// Emails go first so the address is not split up by the name pattern.
pub fn redact_pii(text: &str) -> String {
    let text = EMAIL.replace_all(text, "REDACTED_EMAIL");
    let text = PERSON_NAME.replace_all(&text, "REDACTED_NAME");
    PHONE.replace_all(&text, "REDACTED_PHONE").into_owned()
}

/// Raw text paired with its normalized form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    raw: String,
    normalized: String,
}

impl Document {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let normalized = normalize(&raw);
        Self { raw, normalized }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }

    pub fn word_count(&self) -> usize {
        self.normalized.split_whitespace().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_normal_form(s: &str) {
        assert!(s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == ' '));
        assert!(!s.starts_with(' ') && !s.ends_with(' '));
        assert!(!s.contains("  "));
    }

    #[test]
    fn test_normalize_basic() {
        assert_eq!(
            normalize("Senior  Rust/C++ Engineer!\n\tRemote"),
            "senior rust c engineer remote"
        );
    }

    #[test]
    fn test_normalize_empty_and_whitespace() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \n\t "), "");
        assert_eq!(normalize("!!! ---"), "");
    }

    #[test]
    fn test_normalize_output_alphabet() {
        let samples = [
            "Café Zürich — 5 yrs exp.",
            "ÄÖÜ ß ΣΊΣΥΦΟΣ",
            "email: jane@example.com, tel +1 (555) 123-4567",
            "\u{00a0}leading nbsp and trailing tab\t",
            "MiXeD CaSe 123abc",
        ];
        for sample in samples {
            assert_normal_form(&normalize(sample));
        }
    }

    #[test]
    fn test_normalize_idempotent() {
        let samples = ["Hello,   World!", "Python/Java & SQL", "  x  ", "Ünïcödé"];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn test_normalize_term_strips_punctuation() {
        assert_eq!(normalize_term("Node.js"), "nodejs");
        assert_eq!(normalize_term("  Microsoft   Excel "), "microsoft excel");
        assert_eq!(normalize_term("C++"), "c");
        assert_eq!(normalize_term("???"), "");
    }

    #[test]
    fn test_redact_pii() {
        let text = "Jane Doe\njane.doe@mail.com | 5551234567\nSkills: Rust";
        let redacted = redact_pii(text);
        assert!(redacted.contains("REDACTED_NAME"));
        assert!(redacted.contains("REDACTED_EMAIL"));
        assert!(redacted.contains("REDACTED_PHONE"));
        assert!(!redacted.contains("jane.doe"));
        assert!(redacted.contains("Skills: Rust"));
    }

    #[test]
    fn test_document_keeps_both_forms() {
        let doc = Document::new("Python, SQL!");
        assert_eq!(doc.raw(), "Python, SQL!");
        assert_eq!(doc.normalized(), "python sql");
        assert_eq!(doc.word_count(), 2);
        assert!(!doc.is_empty());
        assert!(Document::new(" . ").is_empty());
    }
}
