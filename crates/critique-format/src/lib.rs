pub mod payload;
pub mod render;
pub mod sections;
pub mod split;

use serde::Serialize;

pub use payload::{parse_payload, ParsedPayload};
pub use render::{render, render_evaluation};
pub use sections::{format_report, ReportFormatter};
pub use split::{split, SplitOptions, SplitText, Splitter};

/// Where a section came from. Fixes both its title and its display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    CodeQuality,
    BestPractices,
    Performance,
    Readability,
    SecurityConsiderations,
    ImprovedFunction,
    InformativeFeedback,
    /// The payload could not be decoded; shown as-is
    Fallback,
}

impl SectionKind {
    pub fn title(&self) -> &'static str {
        match self {
            SectionKind::CodeQuality => "Code Quality",
            SectionKind::BestPractices => "Best Practices",
            SectionKind::Performance => "Performance",
            SectionKind::Readability => "Readability",
            SectionKind::SecurityConsiderations => "Security Considerations",
            SectionKind::ImprovedFunction => "Improved Function",
            SectionKind::InformativeFeedback => "Informative Feedback",
            SectionKind::Fallback => "Report",
        }
    }

    /// Recommendation sub-sections are grouped under one heading when rendered.
    pub fn is_recommendation(&self) -> bool {
        matches!(
            self,
            SectionKind::ImprovedFunction | SectionKind::InformativeFeedback
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeBlock {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub source: String,
}

/// One titled, renderable unit of a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub kind: SectionKind,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narrative_before: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narrative_after: Option<String>,
}

impl Section {
    pub fn new(kind: SectionKind) -> Self {
        Self {
            kind,
            title: kind.title().to_string(),
            narrative_before: None,
            code: None,
            narrative_after: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.narrative_before.is_none() && self.code.is_none() && self.narrative_after.is_none()
    }
}

/// `Some(trimmed)` unless the text is blank.
pub(crate) fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
