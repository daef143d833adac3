//! Controlled skill vocabulary built from two tabular sources
//!
//! Source A is a skill-rating table (O*NET "Skills" export): only rows rated on
//! the importance scale at or above a cut-off contribute their term. Source B
//! is a technology example table whose term column is taken as is. Both are
//! read with a column schema that is checked before any row is used.

use crate::error::{Result, ScreenerError};
use crate::processing::normalizer::normalize_term;
use csv::{ReaderBuilder, StringRecord};
use log::{debug, info};
use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

/// Column names and filter values for the two sources
#[derive(Debug, Clone, PartialEq)]
pub struct VocabularySchema {
    pub ratings_term_column: String,
    pub ratings_scale_column: String,
    pub ratings_value_column: String,
    pub scale_filter: String,
    pub min_importance: f64,
    pub examples_term_column: String,
}

impl Default for VocabularySchema {
    fn default() -> Self {
        Self {
            ratings_term_column: "Element Name".to_string(),
            ratings_scale_column: "Scale Name".to_string(),
            ratings_value_column: "Data Value".to_string(),
            scale_filter: "Importance".to_string(),
            min_importance: 3.0,
            examples_term_column: "Example".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Text,
    Number,
}

/// A required column resolved against a header row
struct Column {
    name: String,
    kind: ColumnKind,
    index: usize,
}

enum Cell<'a> {
    Missing,
    Text(&'a str),
    Number(f64),
}

impl Column {
    fn resolve(headers: &StringRecord, name: &str, kind: ColumnKind, source: &str) -> Result<Self> {
        let index = headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| {
                ScreenerError::DataLoad(format!(
                    "{}: required column '{}' not found",
                    source, name
                ))
            })?;
        Ok(Self {
            name: name.to_string(),
            kind,
            index,
        })
    }

    fn read<'a>(&self, record: &'a StringRecord, row: usize, source: &str) -> Result<Cell<'a>> {
        let raw = match record.get(self.index).map(str::trim) {
            Some(value) if !value.is_empty() => value,
            _ => return Ok(Cell::Missing),
        };

        match self.kind {
            ColumnKind::Text => Ok(Cell::Text(raw)),
            ColumnKind::Number => raw.parse::<f64>().map(Cell::Number).map_err(|_| {
                ScreenerError::DataLoad(format!(
                    "{}: row {}: column '{}' expects a number, found '{}'",
                    source, row, self.name, raw
                ))
            }),
        }
    }
}

/// Read-only set of normalized skill terms
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkillVocabulary {
    terms: BTreeSet<String>,
}

impl SkillVocabulary {
    /// Build from the rating table and the example table on disk.
    ///
    /// `.csv` files are comma separated, anything else is read as tab separated.
    pub fn build(ratings_path: &Path, examples_path: &Path, schema: &VocabularySchema) -> Result<Self> {
        let ratings = open_source(ratings_path)?;
        let examples = open_source(examples_path)?;

        let vocabulary = Self::from_readers(
            ratings,
            delimiter_for(ratings_path),
            examples,
            delimiter_for(examples_path),
            schema,
        )?;

        info!(
            "Loaded skill vocabulary: {} terms from {} and {}",
            vocabulary.len(),
            ratings_path.display(),
            examples_path.display()
        );
        Ok(vocabulary)
    }

    pub fn from_readers<A: Read, B: Read>(
        ratings: A,
        ratings_delimiter: u8,
        examples: B,
        examples_delimiter: u8,
        schema: &VocabularySchema,
    ) -> Result<Self> {
        let mut terms = load_rated_terms(ratings, ratings_delimiter, schema)?;
        let rated = terms.len();
        let example_terms = load_example_terms(examples, examples_delimiter, schema)?;
        debug!(
            "Vocabulary sources: {} rated terms, {} example terms",
            rated,
            example_terms.len()
        );
        terms.extend(example_terms);
        Ok(Self { terms })
    }

    /// Vocabulary from literal terms, normalized the same way as table cells
    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let terms = terms
            .into_iter()
            .map(|t| normalize_term(t.as_ref()))
            .filter(|t| !t.is_empty())
            .collect();
        Self { terms }
    }

    /// Case-insensitive lookup
    pub fn contains(&self, term: &str) -> bool {
        self.terms.contains(term) || self.terms.contains(&normalize_term(term))
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(String::as_str)
    }
}

fn open_source(path: &Path) -> Result<std::fs::File> {
    std::fs::File::open(path).map_err(|e| {
        ScreenerError::DataLoad(format!("cannot read '{}': {}", path.display(), e))
    })
}

fn delimiter_for(path: &Path) -> u8 {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => b',',
        _ => b'\t',
    }
}

fn reader<R: Read>(source: R, delimiter: u8) -> csv::Reader<R> {
    ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .has_headers(true)
        .from_reader(source)
}

fn headers<R: Read>(reader: &mut csv::Reader<R>, source: &str) -> Result<StringRecord> {
    reader
        .headers()
        .cloned()
        .map_err(|e| ScreenerError::DataLoad(format!("{}: unreadable header: {}", source, e)))
}

fn load_rated_terms<R: Read>(
    source: R,
    delimiter: u8,
    schema: &VocabularySchema,
) -> Result<BTreeSet<String>> {
    const SOURCE: &str = "skill ratings";
    let mut reader = reader(source, delimiter);
    let headers = headers(&mut reader, SOURCE)?;

    let term = Column::resolve(&headers, &schema.ratings_term_column, ColumnKind::Text, SOURCE)?;
    let scale = Column::resolve(&headers, &schema.ratings_scale_column, ColumnKind::Text, SOURCE)?;
    let value = Column::resolve(&headers, &schema.ratings_value_column, ColumnKind::Number, SOURCE)?;

    let mut terms = BTreeSet::new();
    for (i, record) in reader.records().enumerate() {
        let row = i + 2;
        let record = record.map_err(|e| {
            ScreenerError::DataLoad(format!("{}: row {}: {}", SOURCE, row, e))
        })?;

        let on_scale = matches!(scale.read(&record, row, SOURCE)?, Cell::Text(s) if s == schema.scale_filter);
        let important = matches!(value.read(&record, row, SOURCE)?, Cell::Number(v) if v >= schema.min_importance);
        if !(on_scale && important) {
            continue;
        }

        if let Cell::Text(raw) = term.read(&record, row, SOURCE)? {
            let normalized = normalize_term(raw);
            if !normalized.is_empty() {
                terms.insert(normalized);
            }
        }
    }
    Ok(terms)
}

fn load_example_terms<R: Read>(
    source: R,
    delimiter: u8,
    schema: &VocabularySchema,
) -> Result<BTreeSet<String>> {
    const SOURCE: &str = "technology examples";
    let mut reader = reader(source, delimiter);
    let headers = headers(&mut reader, SOURCE)?;
    let term = Column::resolve(&headers, &schema.examples_term_column, ColumnKind::Text, SOURCE)?;

    let mut terms = BTreeSet::new();
    for (i, record) in reader.records().enumerate() {
        let row = i + 2;
        let record = record.map_err(|e| {
            ScreenerError::DataLoad(format!("{}: row {}: {}", SOURCE, row, e))
        })?;
        if let Cell::Text(raw) = term.read(&record, row, SOURCE)? {
            let normalized = normalize_term(raw);
            if !normalized.is_empty() {
                terms.insert(normalized);
            }
        }
    }
    Ok(terms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    const RATINGS: &str = "\
O*NET-SOC Code\tElement Name\tScale Name\tData Value
11-1011.00\tCritical Thinking\tImportance\t4.12
11-1011.00\tProgramming\tImportance\t3.00
11-1011.00\tRepairing\tImportance\t1.25
11-1011.00\tMathematics\tLevel\t5.00
11-1011.00\tActive Listening\tImportance\t
11-1011.00\t\tImportance\t4.50
";

    const EXAMPLES: &str = "\
O*NET-SOC Code\tExample\tHot Technology
15-1252.00\tPython\tY
15-1252.00\tNode.js\tY
15-1252.00\t\tN
15-1252.00\tMicrosoft Excel\tN
15-1252.00\tpython\tY
";

    fn build(ratings: &str, examples: &str) -> Result<SkillVocabulary> {
        SkillVocabulary::from_readers(
            ratings.as_bytes(),
            b'\t',
            examples.as_bytes(),
            b'\t',
            &VocabularySchema::default(),
        )
    }

    #[test]
    fn test_filters_and_unions_sources() {
        let vocab = build(RATINGS, EXAMPLES).unwrap();
        let terms: Vec<&str> = vocab.iter().collect();
        assert_eq!(
            terms,
            vec![
                "critical thinking",
                "microsoft excel",
                "nodejs",
                "programming",
                "python"
            ]
        );
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let vocab = build(RATINGS, EXAMPLES).unwrap();
        assert!(vocab.contains("programming"));
        assert!(!vocab.contains("repairing"));
        assert!(!vocab.contains("mathematics"));
        assert!(!vocab.contains("active listening"));
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let vocab = build(RATINGS, EXAMPLES).unwrap();
        assert!(vocab.contains("Python"));
        assert!(vocab.contains("Node.js"));
    }

    #[test]
    fn test_missing_column_is_data_load_error() {
        let examples = "Code\tTechnology\n1\tRust\n";
        let err = build(RATINGS, examples).unwrap_err();
        assert!(matches!(err, ScreenerError::DataLoad(ref m) if m.contains("Example")));
    }

    #[test]
    fn test_non_numeric_value_is_data_load_error() {
        let ratings = "Element Name\tScale Name\tData Value\nWriting\tImportance\thigh\n";
        let err = build(ratings, EXAMPLES).unwrap_err();
        assert!(matches!(err, ScreenerError::DataLoad(ref m) if m.contains("row 2")));
    }

    #[test]
    fn test_build_from_files_detects_delimiter() {
        let dir = TempDir::new().unwrap();
        let ratings_path = dir.path().join("skills.csv");
        let examples_path = dir.path().join("Technology Skills.txt");

        let mut f = std::fs::File::create(&ratings_path).unwrap();
        writeln!(f, "Element Name,Scale Name,Data Value").unwrap();
        writeln!(f, "\"Judgment, Decision Making\",Importance,3.5").unwrap();
        std::fs::write(&examples_path, EXAMPLES).unwrap();

        let vocab =
            SkillVocabulary::build(&ratings_path, &examples_path, &VocabularySchema::default())
                .unwrap();
        assert!(vocab.contains("judgment decision making"));
        assert!(vocab.contains("python"));
    }

    #[test]
    fn test_unreadable_source_is_data_load_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.txt");
        let err = SkillVocabulary::build(&missing, &missing, &VocabularySchema::default())
            .unwrap_err();
        assert!(matches!(err, ScreenerError::DataLoad(_)));
    }

    #[test]
    fn test_from_terms_normalizes() {
        let vocab = SkillVocabulary::from_terms(["SQL", " Java ", "C#", "!!"]);
        assert_eq!(vocab.len(), 3);
        assert!(vocab.contains("sql"));
        assert!(vocab.contains("c"));
    }
}
