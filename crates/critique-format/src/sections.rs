use critique_core::{EvaluationReport, FallbackMode, Recommendation, RenderSettings};
use tracing::debug;

use crate::payload::{parse_payload, ParsedPayload};
use crate::split::{SplitOptions, SplitText, Splitter};
use crate::{non_empty, CodeBlock, Section, SectionKind};

const PARSE_NOTICE: &str =
    "The evaluation could not be parsed as a structured report. Showing the raw output.";
const EMPTY_NOTICE: &str = "No report content.";

/// Format a payload with default options.
pub fn format_report(payload: &str) -> Vec<Section> {
    ReportFormatter::default().format(payload)
}

/// Payload to sections. Holds only immutable options, so one instance can
/// serve any number of renders.
#[derive(Debug, Clone, Default)]
pub struct ReportFormatter {
    splitter: Splitter,
    fallback: FallbackMode,
}

impl ReportFormatter {
    pub fn new(options: SplitOptions, fallback: FallbackMode) -> Self {
        Self {
            splitter: Splitter::new(options),
            fallback,
        }
    }

    pub fn from_settings(settings: &RenderSettings) -> Self {
        Self::new(SplitOptions::from(settings), settings.fallback)
    }

    /// Never fails and never returns an empty list.
    pub fn format(&self, payload: &str) -> Vec<Section> {
        match parse_payload(payload) {
            ParsedPayload::Structured(report) => {
                let sections = self.sections(&report);
                debug!("rendered {} sections", sections.len());
                sections
            }
            ParsedPayload::Unstructured(raw) => vec![self.fallback_section(&raw)],
        }
    }

    /// One section per populated field, in display order.
    pub fn sections(&self, report: &EvaluationReport) -> Vec<Section> {
        let narratives = [
            (SectionKind::CodeQuality, &report.code_quality),
            (SectionKind::BestPractices, &report.best_practices),
            (SectionKind::Performance, &report.performance),
            (SectionKind::Readability, &report.readability),
            (SectionKind::SecurityConsiderations, &report.security_considerations),
        ];

        let mut sections: Vec<Section> = narratives
            .into_iter()
            .filter_map(|(kind, text)| self.narrative_section(kind, text.as_deref()?))
            .collect();

        if let Some(recs) = &report.recommendations {
            let subsections = [
                (SectionKind::ImprovedFunction, &recs.improved_function),
                (SectionKind::InformativeFeedback, &recs.informative_feedback),
            ];
            sections.extend(
                subsections
                    .into_iter()
                    .filter_map(|(kind, rec)| self.recommendation_section(kind, rec.as_ref()?)),
            );
        }

        sections
    }

    fn narrative_section(&self, kind: SectionKind, text: &str) -> Option<Section> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let section = from_split(kind, self.splitter.split(text));
        // A field made only of an empty fence still deserves its words.
        Some(if section.is_empty() {
            Section {
                narrative_before: Some(text.to_string()),
                ..Section::new(kind)
            }
        } else {
            section
        })
    }

    fn recommendation_section(&self, kind: SectionKind, rec: &Recommendation) -> Option<Section> {
        match rec {
            Recommendation::Combined(text) => self.narrative_section(kind, text),
            Recommendation::Split { explanation, code } => {
                let mut section = Section {
                    narrative_before: non_empty(explanation),
                    ..Section::new(kind)
                };
                if code.contains("```") {
                    // Producers sometimes fence the code anyway; unwrap it.
                    let split = self.splitter.split(code);
                    section.narrative_before = join(section.narrative_before, non_empty(&split.before));
                    section.code = split.code.or_else(|| self.plain_code(code));
                    section.narrative_after = non_empty(&split.after);
                } else {
                    section.code = self.plain_code(code);
                }
                (!section.is_empty()).then_some(section)
            }
        }
    }

    fn plain_code(&self, code: &str) -> Option<CodeBlock> {
        non_empty(code).map(|source| CodeBlock {
            language: Some(self.splitter.options().default_language.clone()),
            source,
        })
    }

    fn fallback_section(&self, raw: &str) -> Section {
        let mut section = Section::new(SectionKind::Fallback);
        if raw.trim().is_empty() {
            section.narrative_before = Some(EMPTY_NOTICE.to_string());
            return section;
        }
        debug!("rendering fallback section ({:?})", self.fallback);
        if self.fallback == FallbackMode::Notice {
            section.narrative_before = Some(PARSE_NOTICE.to_string());
        }
        section.code = Some(CodeBlock {
            language: None,
            source: raw.to_string(),
        });
        section
    }
}

fn from_split(kind: SectionKind, split: SplitText) -> Section {
    Section {
        narrative_before: non_empty(&split.before),
        code: split.code,
        narrative_after: non_empty(&split.after),
        ..Section::new(kind)
    }
}

fn join(a: Option<String>, b: Option<String>) -> Option<String> {
    match (a, b) {
        (Some(a), Some(b)) => Some(format!("{a}\n\n{b}")),
        (a, b) => a.or(b),
    }
}
