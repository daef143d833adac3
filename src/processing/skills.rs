//! Skill matching of normalized text against the vocabulary

use crate::processing::vocabulary::SkillVocabulary;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Skills found in the resume and skills the job asks for that the resume lacks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillMatch {
    pub matched: BTreeSet<String>,
    pub missing: BTreeSet<String>,
}

fn vocabulary_tokens(text: &str, vocabulary: &SkillVocabulary) -> BTreeSet<String> {
    text.split_whitespace()
        .filter(|token| vocabulary.contains(token))
        .map(str::to_string)
        .collect()
}

/// Single-token matching: vocabulary entries with several words never match,
/// since both texts are split on whitespace first.
pub fn match_skills(
    resume_normalized: &str,
    jd_normalized: &str,
    vocabulary: &SkillVocabulary,
) -> SkillMatch {
    let matched = vocabulary_tokens(resume_normalized, vocabulary);
    let missing = vocabulary_tokens(jd_normalized, vocabulary)
        .difference(&matched)
        .cloned()
        .collect();

    SkillMatch { matched, missing }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::normalizer::normalize;

    fn vocab() -> SkillVocabulary {
        SkillVocabulary::from_terms(["python", "java", "sql", "kubernetes", "machine learning"])
    }

    #[test]
    fn test_all_jd_skills_covered() {
        let result = match_skills(
            &normalize("Python Java SQL"),
            &normalize("Looking for Python and SQL developer"),
            &vocab(),
        );
        let matched: Vec<&str> = result.matched.iter().map(String::as_str).collect();
        assert_eq!(matched, vec!["java", "python", "sql"]);
        assert!(result.missing.is_empty());
    }

    #[test]
    fn test_missing_skill_reported() {
        let result = match_skills(
            &normalize("Python developer"),
            &normalize("Python engineer with Kubernetes"),
            &vocab(),
        );
        assert!(result.missing.contains("kubernetes"));
        assert!(!result.missing.contains("python"));
    }

    #[test]
    fn test_multi_word_terms_never_match() {
        let result = match_skills(
            "machine learning engineer",
            "machine learning required",
            &vocab(),
        );
        assert!(result.matched.is_empty());
        assert!(result.missing.is_empty());
    }

    #[test]
    fn test_empty_texts() {
        let result = match_skills("", "", &vocab());
        assert_eq!(result, SkillMatch::default());
    }
}
