//! Document rendering contract and content preparation.
//!
//! The orchestrator never writes files itself. When a task routes to the
//! document-producing specialist, the prepared title and body are handed to a
//! [`DocumentRenderer`], which always answers with a [`RenderReport`] (never
//! an error) describing what happened. [`TextFileRenderer`] is the reference
//! implementation shipped with the crate; PDF or other back ends plug in
//! behind the same trait.
//!
//! Preparation itself goes through a [`ContentCleaner`]: a replaceable
//! strategy that strips conversational filler from generated prose, removes
//! explicit document-request phrasing from user prompts, and infers a short
//! title. The default [`PatternCleaner`] works from a fixed rule set; the
//! rules are lossy heuristics by nature, which is exactly why they live
//! behind a trait the orchestrator never looks inside.

use chrono::Utc;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Structured outcome of one rendering attempt.
#[derive(Debug, Clone)]
pub struct RenderReport {
    /// Whether the document was produced.
    pub success: bool,
    /// Title the document was rendered under.
    pub title: String,
    /// Location of the produced file, when rendering succeeded.
    pub path: Option<PathBuf>,
    /// Word count of the rendered body.
    pub word_count: usize,
    /// Non-empty paragraph count of the rendered body.
    pub paragraph_count: usize,
    /// Size of the produced file in bytes.
    pub file_size: u64,
    /// Error description, when rendering failed.
    pub detail: String,
}

impl RenderReport {
    /// Build a success report for a rendered file.
    pub fn success(
        title: impl Into<String>,
        path: PathBuf,
        word_count: usize,
        paragraph_count: usize,
        file_size: u64,
    ) -> Self {
        Self {
            success: true,
            title: title.into(),
            path: Some(path),
            word_count,
            paragraph_count,
            file_size,
            detail: String::new(),
        }
    }

    /// Build a failure report carrying an error description.
    pub fn failure(title: impl Into<String>, error: impl fmt::Display) -> Self {
        Self {
            success: false,
            title: title.into(),
            path: None,
            word_count: 0,
            paragraph_count: 0,
            file_size: 0,
            detail: error.to_string(),
        }
    }

    /// The formatted outcome text returned to the user.
    pub fn message(&self) -> String {
        if self.success {
            let path = self
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            format!(
                "Document created successfully.\n\n\
                 File path: {}\n\
                 Title: {}\n\
                 Word count: {}\n\
                 Paragraphs: {}\n\
                 File size: {}\n\n\
                 The document has been saved and is ready to use.",
                path,
                self.title,
                self.word_count,
                self.paragraph_count,
                humanize_size(self.file_size)
            )
        } else {
            format!(
                "Document creation failed.\n\nError: {}\n\nPlease check the request and try again.",
                self.detail
            )
        }
    }
}

/// Format a byte count for display.
pub fn humanize_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} bytes", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

/// A collaborator that turns a title and body into a file on disk.
///
/// Implementations report failures through the returned [`RenderReport`];
/// they never raise to the caller.
pub trait DocumentRenderer: Send + Sync {
    /// Render `body` under `title` and report the outcome.
    fn render(&self, title: &str, body: &str) -> RenderReport;
}

/// Reference renderer that writes markdown text files.
pub struct TextFileRenderer {
    output_dir: PathBuf,
}

impl TextFileRenderer {
    /// Create a renderer writing into `output_dir` (created on demand).
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    fn filename_for(title: &str) -> String {
        let mut slug = String::new();
        for ch in title.chars() {
            if ch.is_ascii_alphanumeric() {
                slug.push(ch.to_ascii_lowercase());
            } else if !slug.ends_with('_') && !slug.is_empty() {
                slug.push('_');
            }
        }
        let slug = slug.trim_matches('_');
        let slug = if slug.is_empty() { "document" } else { slug };
        let slug: String = slug.chars().take(40).collect();
        format!("{}_{}.md", slug, Utc::now().format("%Y%m%d_%H%M%S"))
    }
}

impl DocumentRenderer for TextFileRenderer {
    fn render(&self, title: &str, body: &str) -> RenderReport {
        if let Err(err) = fs::create_dir_all(&self.output_dir) {
            return RenderReport::failure(title, err);
        }

        let path = self.output_dir.join(Self::filename_for(title));
        let content = format!("# {}\n\n{}\n", title, body.trim());

        if let Err(err) = fs::write(&path, &content) {
            return RenderReport::failure(title, err);
        }

        let file_size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        let word_count = body.split_whitespace().count();
        let paragraph_count = body
            .split("\n\n")
            .filter(|p| !p.trim().is_empty())
            .count();

        log::debug!("rendered document '{}' to {}", title, path.display());
        RenderReport::success(title, path, word_count, paragraph_count, file_size)
    }
}

/// Replaceable content-preparation strategy for the document pipeline.
pub trait ContentCleaner: Send + Sync {
    /// Remove conversational filler and self-introductions from prose.
    fn strip_filler(&self, text: &str) -> String;

    /// Remove phrasing that explicitly asks for document output, so a
    /// text-generation call produces content rather than talk about files.
    fn strip_document_phrasing(&self, text: &str) -> String;

    /// Infer a short title for the given body text.
    fn infer_title(&self, text: &str) -> String;
}

/// Line openers that mark conversational filler rather than content.
const FILLER_OPENERS: &[&str] = &[
    "i'll ",
    "i will ",
    "i'd be happy",
    "i would be happy",
    "i'm happy to",
    "sure,",
    "sure!",
    "sure thing",
    "certainly",
    "of course",
    "absolutely",
    "as an ai",
    "as a language model",
    "i am a",
    "i am an",
    "i'm a",
    "i'm an",
    "here's what i",
    "here is what i",
    "let me know",
    "great question",
    "happy to help",
];

/// Request phrasings that ask for document output, longest first.
const DOCUMENT_REQUEST_PHRASES: &[&str] = &[
    "create a pdf document about",
    "create a pdf document",
    "create a pdf report about",
    "create a pdf report",
    "create a pdf about",
    "create a pdf",
    "make a pdf about",
    "make a pdf",
    "generate a pdf about",
    "generate a pdf",
    "produce a pdf",
    "write a pdf",
    "save it as a pdf",
    "save as a pdf",
    "as a pdf document",
    "as a pdf",
    "in pdf format",
    "into a pdf",
    "pdf document",
    "pdf report",
    "pdf file",
];

/// Prefixes that disqualify a line from being used as a title.
const NON_TITLE_OPENERS: &[&str] = &["create", "make", "generate", "write", "produce"];

/// Default [`ContentCleaner`] working from a fixed rule set.
#[derive(Debug, Default, Clone, Copy)]
pub struct PatternCleaner;

impl PatternCleaner {
    fn is_bulleted(line: &str) -> bool {
        line.starts_with('-') || line.starts_with('*') || line.starts_with('\u{2022}')
    }
}

impl ContentCleaner for PatternCleaner {
    fn strip_filler(&self, text: &str) -> String {
        let kept: Vec<&str> = text
            .lines()
            .filter(|line| {
                let lowered = line.trim().to_lowercase();
                !FILLER_OPENERS
                    .iter()
                    .any(|opener| lowered.starts_with(opener))
            })
            .collect();
        kept.join("\n").trim().to_string()
    }

    fn strip_document_phrasing(&self, text: &str) -> String {
        let mut cleaned = text.to_string();
        for phrase in DOCUMENT_REQUEST_PHRASES {
            cleaned = strip_phrase(&cleaned, phrase);
        }
        tidy_spaces(&cleaned)
    }

    fn infer_title(&self, text: &str) -> String {
        // An explicit "Title:" line always wins.
        for line in text.lines() {
            let trimmed = line.trim();
            if let Some(pos) = find_ci(trimmed, "title:") {
                if pos == 0 {
                    let rest = trimmed["title:".len()..]
                        .trim()
                        .trim_matches(|c| c == '"' || c == '\'');
                    if !rest.is_empty() {
                        return rest.to_string();
                    }
                }
            }
        }

        // First short, non-bulleted, non-imperative line.
        for line in text.lines() {
            let trimmed = line.trim().trim_start_matches('#').trim();
            if trimmed.is_empty() || Self::is_bulleted(line.trim()) {
                continue;
            }
            if trimmed.chars().count() >= 80 {
                break;
            }
            let lowered = trimmed.to_lowercase();
            if NON_TITLE_OPENERS
                .iter()
                .any(|opener| lowered.starts_with(opener))
            {
                continue;
            }
            return trimmed.trim_end_matches(&[':', '.'][..]).to_string();
        }

        // Fall back to the leading words of the first paragraph.
        let first_paragraph = text
            .split("\n\n")
            .map(|p| p.trim())
            .find(|p| !p.is_empty())
            .unwrap_or("");
        let words: Vec<&str> = first_paragraph.split_whitespace().take(8).collect();
        if words.is_empty() {
            "Document".to_string()
        } else {
            words.join(" ").trim_end_matches(&[':', '.', ','][..]).to_string()
        }
    }
}

/// Byte offset of the first ASCII case-insensitive occurrence of `needle`.
fn find_ci(haystack: &str, needle: &str) -> Option<usize> {
    let haystack = haystack.as_bytes();
    let needle = needle.as_bytes();
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle))
}

/// Remove every case-insensitive occurrence of `phrase` from `text`.
fn strip_phrase(text: &str, phrase: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = find_ci(rest, phrase) {
        result.push_str(&rest[..pos]);
        rest = &rest[pos + phrase.len()..];
    }
    result.push_str(rest);
    result
}

/// Collapse runs of spaces left behind by phrase removal, per line.
fn tidy_spaces(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
