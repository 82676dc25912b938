use critique_core::{Evaluation, OutputFormat};
use serde::Serialize;
use tracing::warn;

use crate::{CodeBlock, Section};

const RECOMMENDATIONS: &str = "Recommendations";

pub fn render(sections: &[Section], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => to_text(sections),
        OutputFormat::Markdown => to_markdown(sections, 2),
        OutputFormat::Html => to_html(sections, 2),
        OutputFormat::Json => to_json(sections),
    }
}

/// A stored evaluation: summary header, then its rendered report.
pub fn render_evaluation(evaluation: &Evaluation, sections: &[Section], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut out = String::new();
            underline(&mut out, &evaluation.title, '=');
            out.push_str(&format!(
                "{} | {} | score {}/100\n\n",
                evaluation.id,
                language_or_unknown(&evaluation.language),
                evaluation.score
            ));
            out.push_str("Strengths: ");
            out.push_str(evaluation.strengths.trim());
            out.push_str("\nImprovements: ");
            out.push_str(evaluation.improvements.trim());
            out.push_str("\n\n");
            out.push_str(&to_text(sections));
            out
        }
        OutputFormat::Markdown => {
            let mut out = format!("# {}\n\n", evaluation.title);
            out.push_str(&format!(
                "- **Id:** {}\n- **Language:** {}\n- **Score:** {}/100\n\n",
                evaluation.id,
                language_or_unknown(&evaluation.language),
                evaluation.score
            ));
            out.push_str(&format!("**Strengths:** {}\n\n", evaluation.strengths.trim()));
            out.push_str(&format!("**Improvements:** {}\n\n", evaluation.improvements.trim()));
            out.push_str(&to_markdown(sections, 2));
            out
        }
        OutputFormat::Html => {
            let mut out = String::from("<article class=\"evaluation\">\n");
            out.push_str(&format!("<h1>{}</h1>\n", escape_html(&evaluation.title)));
            out.push_str(&format!(
                "<p class=\"meta\">{} &middot; {} &middot; score {}/100</p>\n",
                escape_html(&evaluation.id),
                escape_html(language_or_unknown(&evaluation.language)),
                evaluation.score
            ));
            out.push_str(&format!(
                "<p><strong>Strengths:</strong> {}</p>\n<p><strong>Improvements:</strong> {}</p>\n",
                escape_html(evaluation.strengths.trim()),
                escape_html(evaluation.improvements.trim())
            ));
            out.push_str(&to_html(sections, 2));
            out.push_str("</article>\n");
            out
        }
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct View<'a> {
                evaluation: &'a Evaluation,
                sections: &'a [Section],
            }
            to_json(&View {
                evaluation,
                sections,
            })
        }
    }
}

fn language_or_unknown(language: &str) -> &str {
    if language.is_empty() {
        "unknown"
    } else {
        language
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    match serde_json::to_string_pretty(value) {
        Ok(mut json) => {
            json.push('\n');
            json
        }
        Err(e) => {
            warn!("cannot serialize report: {e}");
            String::from("[]\n")
        }
    }
}

// --- Plain text ---

fn underline(out: &mut String, title: &str, ch: char) {
    out.push_str(title);
    out.push('\n');
    out.extend(std::iter::repeat(ch).take(title.chars().count()));
    out.push_str("\n\n");
}

fn to_text(sections: &[Section]) -> String {
    let mut out = String::new();
    let mut in_recommendations = false;

    for section in sections {
        if section.kind.is_recommendation() {
            if !in_recommendations {
                underline(&mut out, RECOMMENDATIONS, '=');
                in_recommendations = true;
            }
            underline(&mut out, &section.title, '-');
        } else {
            underline(&mut out, &section.title, '=');
        }

        if let Some(text) = &section.narrative_before {
            out.push_str(text);
            out.push_str("\n\n");
        }
        if let Some(code) = &section.code {
            if let Some(lang) = &code.language {
                out.push_str(&format!("    [{lang}]\n"));
            }
            for line in code.source.lines() {
                if line.is_empty() {
                    out.push('\n');
                } else {
                    out.push_str("    ");
                    out.push_str(line);
                    out.push('\n');
                }
            }
            out.push('\n');
        }
        if let Some(text) = &section.narrative_after {
            out.push_str(text);
            out.push_str("\n\n");
        }
    }

    out
}

// --- Markdown ---

/// Longer than any backtick run inside the source, so the fence cannot close early.
fn fence_for(source: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for ch in source.chars() {
        if ch == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    "`".repeat((longest + 1).max(3))
}

fn markdown_code(out: &mut String, code: &CodeBlock) {
    let fence = fence_for(&code.source);
    out.push_str(&fence);
    out.push_str(code.language.as_deref().unwrap_or(""));
    out.push('\n');
    out.push_str(&code.source);
    out.push('\n');
    out.push_str(&fence);
    out.push_str("\n\n");
}

fn to_markdown(sections: &[Section], level: usize) -> String {
    let heading = "#".repeat(level);
    let sub_heading = "#".repeat(level + 1);
    let mut out = String::new();
    let mut in_recommendations = false;

    for section in sections {
        if section.kind.is_recommendation() {
            if !in_recommendations {
                out.push_str(&format!("{heading} {RECOMMENDATIONS}\n\n"));
                in_recommendations = true;
            }
            out.push_str(&format!("{sub_heading} {}\n\n", section.title));
        } else {
            out.push_str(&format!("{heading} {}\n\n", section.title));
        }

        if let Some(text) = &section.narrative_before {
            out.push_str(text);
            out.push_str("\n\n");
        }
        if let Some(code) = &section.code {
            markdown_code(&mut out, code);
        }
        if let Some(text) = &section.narrative_after {
            out.push_str(text);
            out.push_str("\n\n");
        }
    }

    out
}

// --- HTML ---

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn html_paragraphs(out: &mut String, text: &str) {
    for para in text.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
        out.push_str("<p>");
        out.push_str(&escape_html(para).replace('\n', "<br>\n"));
        out.push_str("</p>\n");
    }
}

fn to_html(sections: &[Section], level: usize) -> String {
    let h = level.min(5);
    let mut out = String::new();
    let mut in_recommendations = false;

    for section in sections {
        let heading = if section.kind.is_recommendation() {
            if !in_recommendations {
                out.push_str(&format!("<h{h}>{RECOMMENDATIONS}</h{h}>\n"));
                in_recommendations = true;
            }
            h + 1
        } else {
            h
        };

        out.push_str("<section class=\"report-section\">\n");
        out.push_str(&format!(
            "<h{heading}>{}</h{heading}>\n",
            escape_html(&section.title)
        ));
        if let Some(text) = &section.narrative_before {
            html_paragraphs(&mut out, text);
        }
        if let Some(code) = &section.code {
            match &code.language {
                Some(lang) => out.push_str(&format!(
                    "<pre><code class=\"language-{}\">",
                    escape_html(lang)
                )),
                None => out.push_str("<pre><code>"),
            }
            out.push_str(&escape_html(&code.source));
            out.push_str("</code></pre>\n");
        }
        if let Some(text) = &section.narrative_after {
            html_paragraphs(&mut out, text);
        }
        out.push_str("</section>\n");
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{format_report, SectionKind};

    fn sample() -> Vec<Section> {
        format_report(
            r#"{
                "code_quality": "Mostly tidy.",
                "recommendations": {
                    "improved_function": {"explanation": "Return early.", "code": "function f(x) { if (!x) { return; } }"},
                    "informative_feedback": "Write <tests> & docs."
                }
            }"#,
        )
    }

    #[test]
    fn markdown_groups_recommendations() {
        let md = render(&sample(), OutputFormat::Markdown);
        assert!(md.starts_with("## Code Quality\n\nMostly tidy.\n\n"));
        assert_eq!(md.matches("## Recommendations").count(), 1);
        assert!(md.contains("### Improved Function\n\nReturn early.\n\n```javascript\nfunction f(x)"));
        assert!(md.contains("### Informative Feedback"));
        let rec = md.find("## Recommendations").unwrap();
        assert!(md.find("### Improved Function").unwrap() > rec);
    }

    #[test]
    fn markdown_fence_outgrows_backticks_in_source() {
        let section = Section {
            code: Some(CodeBlock {
                language: None,
                source: "a ``` b".into(),
            }),
            ..Section::new(SectionKind::Fallback)
        };
        let md = render(&[section], OutputFormat::Markdown);
        assert!(md.contains("````\na ``` b\n````"));
    }

    #[test]
    fn html_is_escaped() {
        let html = render(&sample(), OutputFormat::Html);
        assert!(html.contains("<h2>Code Quality</h2>"));
        assert!(html.contains("<h3>Improved Function</h3>"));
        assert!(html.contains("<pre><code class=\"language-javascript\">"));
        assert!(html.contains("Write &lt;tests&gt; &amp; docs."));
        assert!(!html.contains("<tests>"));
    }

    #[test]
    fn text_indents_code() {
        let text = render(&sample(), OutputFormat::Text);
        assert!(text.contains("Code Quality\n============\n\nMostly tidy."));
        assert!(text.contains("    [javascript]\n    function f(x)"));
        assert!(text.contains("Recommendations\n==============="));
    }

    #[test]
    fn json_lists_sections() {
        let json = render(&sample(), OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let arr = value.as_array().unwrap();
        assert_eq!(arr.len(), 3);
        assert_eq!(arr[0]["kind"], "code_quality");
        assert_eq!(arr[1]["narrativeBefore"], "Return early.");
        assert_eq!(arr[1]["code"]["language"], "javascript");
        assert!(arr[0].get("code").is_none());
    }

    #[test]
    fn evaluation_header_precedes_report() {
        let evaluation = Evaluation {
            id: "eval-3".into(),
            title: "Debounce".into(),
            language: "javascript".into(),
            score: 64,
            strengths: "Small.".into(),
            improvements: "Name things.".into(),
            full_report: String::new(),
            created_at: 0,
        };
        let sections = format_report(&evaluation.full_report);
        let md = render_evaluation(&evaluation, &sections, OutputFormat::Markdown);
        assert!(md.starts_with("# Debounce\n\n"));
        assert!(md.contains("- **Score:** 64/100"));
        assert!(md.contains("## Report\n\nNo report content."));

        let json = render_evaluation(&evaluation, &sections, OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["evaluation"]["score"], 64);
        assert_eq!(value["sections"][0]["kind"], "fallback");
    }
}
