use critique_core::Submission;

pub fn system_prompt() -> String {
    let schema = serde_json::to_string_pretty(&critique_core::envelope_schema())
        .unwrap_or_else(|_| "{}".to_string());
    format!(
        "You are an expert code reviewer. Evaluate the submitted code for quality, idiomatic \
use of its language, performance, readability and security, and suggest concrete \
improvements.\n\n\
Be constructive, specific and actionable. Quote the submitter's identifiers when pointing at \
a problem. Do not pad sections with generic advice.\n\n\
## Sections\n{}\n\n\
## Output\n\
Output ONLY a JSON object, no markdown around it, matching this schema:\n{}\n\n\
\"score\" is a number between 0 and 100. \"strengths\" and \"improvements\" are 2-3 sentence \
summaries. \"full_report\" is an object with the section fields above; omit a field rather \
than leaving it empty.",
        critique_core::rubric::RUBRIC,
        schema
    )
}

pub fn user_message(submission: &Submission) -> String {
    let mut out = String::with_capacity(submission.code.len() + 256);
    out.push_str("Task Title: ");
    out.push_str(submission.title.trim());
    out.push('\n');
    if !submission.description.trim().is_empty() {
        out.push_str("Description: ");
        out.push_str(submission.description.trim());
        out.push('\n');
    }
    out.push_str("Programming Language: ");
    out.push_str(&submission.language);
    out.push_str("\n\nCode:\n```");
    out.push_str(&submission.language);
    out.push('\n');
    out.push_str(submission.code.trim_end());
    out.push_str("\n```\n");
    out
}
