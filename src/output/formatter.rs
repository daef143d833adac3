//! Output formatters for single results and ranked batches

use crate::config::OutputFormat;
use crate::error::{Result, ScreenerError};
use crate::output::report::{join_skills, BatchReport, ScoreReport};
use crate::processing::ScoreResult;
use askama::Template;
use colored::{Color, Colorize};
use std::path::Path;

pub trait OutputFormatter {
    fn format_score(&self, report: &ScoreReport) -> Result<String>;
    fn format_batch(&self, report: &BatchReport) -> Result<String>;
    fn supports_format(&self) -> OutputFormat;
}

/// Terminal output with optional colors
pub struct ConsoleFormatter {
    use_colors: bool,
    detailed: bool,
}

pub struct JsonFormatter {
    pretty: bool,
}

pub struct MarkdownFormatter;

pub struct HtmlFormatter;

/// Picks the formatter for the requested output format
pub struct ReportGenerator {
    console_formatter: ConsoleFormatter,
    json_formatter: JsonFormatter,
    markdown_formatter: MarkdownFormatter,
    html_formatter: HtmlFormatter,
}

struct HtmlRow {
    rank: usize,
    name: String,
    lexical: String,
    semantic: String,
    final_score: String,
    status: &'static str,
    shortlisted: bool,
    note: String,
}

#[derive(Template)]
#[template(
    ext = "html",
    source = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{{ title }}</title>
    <style>
        body { font-family: -apple-system, 'Segoe UI', Roboto, sans-serif; max-width: 960px; margin: 0 auto; padding: 20px; color: #333; }
        table { width: 100%; border-collapse: collapse; }
        th, td { padding: 8px; border-bottom: 1px solid #ddd; text-align: left; }
        .shortlisted { color: #1e7e34; font-weight: bold; }
        .rejected { color: #b02a37; }
        .meta { color: #777; font-size: 0.9em; }
    </style>
</head>
<body>
    <h1>{{ title }}</h1>
    <p class="meta">Generated: {{ generated_at }} | Model: {{ model }} | Weights: lexical {{ lexical_weight }}, semantic {{ semantic_weight }} | Threshold: {{ threshold }}</p>
    {% if !notice.is_empty() %}<p><strong>{{ notice }}</strong></p>{% endif %}
    <table>
        <tr><th>#</th><th>Resume</th><th>TF-IDF</th><th>Semantic</th><th>Final</th><th>Status</th></tr>
        {% for row in rows %}
        <tr>
            <td>{{ row.rank }}</td>
            <td>{{ row.name }}{% if !row.note.is_empty() %} <em>({{ row.note }})</em>{% endif %}</td>
            <td>{{ row.lexical }}</td>
            <td>{{ row.semantic }}</td>
            <td>{{ row.final_score }}</td>
            <td class="{% if row.shortlisted %}shortlisted{% else %}rejected{% endif %}">{{ row.status }}</td>
        </tr>
        {% endfor %}
    </table>
    {% if !matched.is_empty() %}
    <h2>Skills</h2>
    <p><strong>Matched:</strong> {{ matched }}</p>
    <p><strong>Missing:</strong> {{ missing }}</p>
    {% endif %}
</body>
</html>"#
)]
struct ResultsPage {
    title: String,
    generated_at: String,
    model: String,
    lexical_weight: f64,
    semantic_weight: f64,
    threshold: f64,
    notice: String,
    rows: Vec<HtmlRow>,
    matched: String,
    missing: String,
}

fn issue_note(result: &ScoreResult) -> String {
    result
        .issue()
        .map(|issue| issue.to_error().to_string())
        .unwrap_or_default()
}

fn truncation_notice(report: &BatchReport) -> Option<String> {
    report.batch.is_truncated().then(|| {
        format!(
            "Only the first {} of {} resumes were scored; {} were not evaluated.",
            report.batch.len(),
            report.batch.submitted,
            report.batch.excluded
        )
    })
}

impl ConsoleFormatter {
    pub fn new(use_colors: bool, detailed: bool) -> Self {
        Self { use_colors, detailed }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, title: &str) -> String {
        if self.use_colors {
            format!("\n{}\n", title.color(Color::Blue).bold())
        } else {
            format!("\n{}\n", title)
        }
    }

    fn status(&self, result: &ScoreResult) -> String {
        let color = if result.shortlisted() {
            Color::Green
        } else {
            Color::Red
        };
        self.colorize(result.status_label(), color)
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_score(&self, report: &ScoreReport) -> Result<String> {
        let result = &report.result;
        let mut output = String::new();

        output.push_str(&self.format_header("RESUME SCREENING RESULT"));
        output.push_str(&format!("Resume: {}\nJob description: {}\n", report.resume, report.job));

        output.push_str(&self.format_header("Scores"));
        output.push_str(&format!(
            "TF-IDF similarity:   {:>6.2} (weight {:.2})\n",
            result.lexical_score(),
            report.weights.lexical()
        ));
        output.push_str(&format!(
            "Semantic similarity: {:>6.2} (weight {:.2})\n",
            result.semantic_score(),
            report.weights.semantic()
        ));
        output.push_str(&format!(
            "Final score:         {:>6.2} -> {}\n",
            result.final_score(),
            self.status(result)
        ));

        if let Some(issue) = result.issue() {
            output.push_str(&format!(
                "{}\n",
                self.colorize(&format!("Warning: {}", issue.to_error()), Color::Yellow)
            ));
        }

        output.push_str(&self.format_header("Skills"));
        output.push_str(&format!(
            "Matched: {}\n",
            self.colorize(&join_skills(result.matched_skills()), Color::Green)
        ));
        output.push_str(&format!(
            "Missing: {}\n",
            self.colorize(&join_skills(result.missing_skills()), Color::Yellow)
        ));

        if self.detailed {
            output.push_str(&self.format_header("Details"));
            output.push_str(&format!(
                "Generated: {} | Processing time: {}ms\nEmbedding model: {}\nVocabulary: {} terms\nShortlist threshold: {:.2}\n",
                report.metadata.timestamp(),
                report.metadata.processing_time_ms,
                report.metadata.embedding_model,
                report.metadata.vocabulary_size,
                report.weights.threshold()
            ));
        }

        Ok(output)
    }

    fn format_batch(&self, report: &BatchReport) -> Result<String> {
        let mut output = String::new();

        output.push_str(&self.format_header("RESUME RANKING"));
        output.push_str(&format!("Job description: {}\n", report.job));
        if let Some(notice) = truncation_notice(report) {
            output.push_str(&format!("{}\n", self.colorize(&notice, Color::Yellow)));
        }
        output.push('\n');

        output.push_str(&format!(
            "{:>3}  {:<32} {:>7} {:>9} {:>7}  {}\n",
            "#", "Resume", "TF-IDF", "Semantic", "Final", "Status"
        ));
        for (i, entry) in report.batch.entries.iter().enumerate() {
            let result = &entry.result;
            output.push_str(&format!(
                "{:>3}  {:<32} {:>7.2} {:>9.2} {:>7.2}  {}\n",
                i + 1,
                entry.id,
                result.lexical_score(),
                result.semantic_score(),
                result.final_score(),
                self.status(result)
            ));
            if let Some(issue) = result.issue() {
                output.push_str(&format!(
                    "     {}\n",
                    self.colorize(&issue.to_error().to_string(), Color::Yellow)
                ));
            }
            if self.detailed {
                output.push_str(&format!(
                    "     matched: {}\n     missing: {}\n",
                    join_skills(result.matched_skills()),
                    join_skills(result.missing_skills())
                ));
            }
        }

        output.push_str(&format!(
            "\nShortlisted {} of {} (threshold {:.2})\n",
            report.batch.shortlisted().count(),
            report.batch.len(),
            report.weights.threshold()
        ));
        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Console
    }
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn to_json<T: serde::Serialize>(&self, value: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        Ok(json)
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_score(&self, report: &ScoreReport) -> Result<String> {
        self.to_json(report)
    }

    fn format_batch(&self, report: &BatchReport) -> Result<String> {
        self.to_json(report)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Json
    }
}

impl OutputFormatter for MarkdownFormatter {
    fn format_score(&self, report: &ScoreReport) -> Result<String> {
        let result = &report.result;
        let mut md = String::new();

        md.push_str("# Resume Screening Result\n\n");
        md.push_str(&format!("- **Resume:** {}\n- **Job description:** {}\n", report.resume, report.job));
        md.push_str(&format!("- **Generated:** {}\n\n", report.metadata.timestamp()));

        md.push_str("| Signal | Score | Weight |\n|---|---:|---:|\n");
        md.push_str(&format!("| TF-IDF | {:.2} | {:.2} |\n", result.lexical_score(), report.weights.lexical()));
        md.push_str(&format!("| Semantic | {:.2} | {:.2} |\n", result.semantic_score(), report.weights.semantic()));
        md.push_str(&format!("| **Final** | **{:.2}** | |\n\n", result.final_score()));
        md.push_str(&format!("**Status:** {}\n\n", result.status_label()));

        if let Some(issue) = result.issue() {
            md.push_str(&format!("> Warning: {}\n\n", issue.to_error()));
        }

        md.push_str("## Skills\n\n");
        md.push_str(&format!("- **Matched:** {}\n", join_skills(result.matched_skills())));
        md.push_str(&format!("- **Missing:** {}\n", join_skills(result.missing_skills())));
        Ok(md)
    }

    fn format_batch(&self, report: &BatchReport) -> Result<String> {
        let mut md = String::new();

        md.push_str("# Resume Ranking\n\n");
        md.push_str(&format!("- **Job description:** {}\n", report.job));
        md.push_str(&format!("- **Generated:** {}\n\n", report.metadata.timestamp()));
        if let Some(notice) = truncation_notice(report) {
            md.push_str(&format!("> {}\n\n", notice));
        }

        md.push_str("| # | Resume | TF-IDF | Semantic | Final | Status |\n|---:|---|---:|---:|---:|---|\n");
        for (i, entry) in report.batch.entries.iter().enumerate() {
            let result = &entry.result;
            md.push_str(&format!(
                "| {} | {} | {:.2} | {:.2} | {:.2} | {} |\n",
                i + 1,
                entry.id,
                result.lexical_score(),
                result.semantic_score(),
                result.final_score(),
                result.status_label()
            ));
        }
        Ok(md)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Markdown
    }
}

impl HtmlFormatter {
    fn row(rank: usize, name: &str, result: &ScoreResult) -> HtmlRow {
        HtmlRow {
            rank,
            name: name.to_string(),
            lexical: format!("{:.2}", result.lexical_score()),
            semantic: format!("{:.2}", result.semantic_score()),
            final_score: format!("{:.2}", result.final_score()),
            status: result.status_label(),
            shortlisted: result.shortlisted(),
            note: issue_note(result),
        }
    }

    fn render(page: ResultsPage) -> Result<String> {
        page.render()
            .map_err(|e| ScreenerError::OutputFormatting(format!("HTML template failed: {}", e)))
    }
}

impl OutputFormatter for HtmlFormatter {
    fn format_score(&self, report: &ScoreReport) -> Result<String> {
        let result = &report.result;
        Self::render(ResultsPage {
            title: "Resume Screening Result".to_string(),
            generated_at: report.metadata.timestamp(),
            model: report.metadata.embedding_model.clone(),
            lexical_weight: report.weights.lexical(),
            semantic_weight: report.weights.semantic(),
            threshold: report.weights.threshold(),
            notice: format!("Job description: {}", report.job),
            rows: vec![Self::row(1, &report.resume, result)],
            matched: join_skills(result.matched_skills()),
            missing: join_skills(result.missing_skills()),
        })
    }

    fn format_batch(&self, report: &BatchReport) -> Result<String> {
        let rows = report
            .batch
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| Self::row(i + 1, &entry.id, &entry.result))
            .collect();

        Self::render(ResultsPage {
            title: "Resume Ranking".to_string(),
            generated_at: report.metadata.timestamp(),
            model: report.metadata.embedding_model.clone(),
            lexical_weight: report.weights.lexical(),
            semantic_weight: report.weights.semantic(),
            threshold: report.weights.threshold(),
            notice: truncation_notice(report).unwrap_or_default(),
            rows,
            matched: String::new(),
            missing: String::new(),
        })
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Html
    }
}

impl ReportGenerator {
    pub fn new(use_colors: bool, detailed: bool) -> Self {
        Self {
            console_formatter: ConsoleFormatter::new(use_colors, detailed),
            json_formatter: JsonFormatter::new(true),
            markdown_formatter: MarkdownFormatter,
            html_formatter: HtmlFormatter,
        }
    }

    fn formatter(&self, format: OutputFormat) -> &dyn OutputFormatter {
        match format {
            OutputFormat::Console => &self.console_formatter,
            OutputFormat::Json => &self.json_formatter,
            OutputFormat::Markdown => &self.markdown_formatter,
            OutputFormat::Html => &self.html_formatter,
        }
    }

    pub fn score_report(&self, report: &ScoreReport, format: OutputFormat) -> Result<String> {
        self.formatter(format).format_score(report)
    }

    pub fn batch_report(&self, report: &BatchReport, format: OutputFormat) -> Result<String> {
        self.formatter(format).format_batch(report)
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new(true, false)
    }
}

pub fn save_report_to_file(content: &str, file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(file_path, content)?;
    Ok(())
}
