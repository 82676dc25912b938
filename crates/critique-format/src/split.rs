use critique_core::RenderSettings;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::{non_empty, CodeBlock};

const FENCE: &str = "```";

/// A fence info string we accept as a language label, e.g. `js`, `c++`, `objective-c`.
static LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_+#.\-]+$").expect("valid label regex"));

static DEFAULT_DEFINITION: Lazy<Regex> = Lazy::new(|| {
    definition_regex(&SplitOptions::default().function_keyword).expect("valid definition regex")
});

/// `function`, `function name(` or `function (`, but not `functional(`.
fn definition_regex(keyword: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(
        r"\b{}\b\s*(?:[A-Za-z_$][\w$]*)?\s*\(",
        regex::escape(keyword)
    ))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitOptions {
    /// Language recorded for snippets without a label of their own
    pub default_language: String,
    /// Keyword that starts an unfenced function definition
    pub function_keyword: String,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            default_language: "javascript".to_string(),
            function_keyword: "function".to_string(),
        }
    }
}

impl From<&RenderSettings> for SplitOptions {
    fn from(settings: &RenderSettings) -> Self {
        Self {
            default_language: settings.default_language.clone(),
            function_keyword: settings.function_keyword.clone(),
        }
    }
}

/// A narrative field cut around its first embedded snippet. Each part is
/// trimmed; `before` holds the whole text when no snippet was found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitText {
    pub before: String,
    pub code: Option<CodeBlock>,
    pub after: String,
}

impl SplitText {
    fn narrative(text: &str) -> Self {
        Self {
            before: text.trim().to_string(),
            ..Default::default()
        }
    }
}

/// Split `text` with the default options.
pub fn split(text: &str) -> SplitText {
    Splitter::default().split(text)
}

#[derive(Debug, Clone)]
pub struct Splitter {
    options: SplitOptions,
    definition: Regex,
}

impl Default for Splitter {
    fn default() -> Self {
        Self {
            options: SplitOptions::default(),
            definition: DEFAULT_DEFINITION.clone(),
        }
    }
}

impl Splitter {
    pub fn new(options: SplitOptions) -> Self {
        let definition = match definition_regex(&options.function_keyword) {
            Ok(re) => re,
            Err(e) => {
                warn!(
                    "cannot use function keyword {:?} ({e}); falling back to the default",
                    options.function_keyword
                );
                DEFAULT_DEFINITION.clone()
            }
        };
        Self {
            options,
            definition,
        }
    }

    pub fn options(&self) -> &SplitOptions {
        &self.options
    }

    /// Fenced block first, then an unfenced function definition, else narrative only.
    pub fn split(&self, text: &str) -> SplitText {
        self.split_fenced(text)
            .or_else(|| self.split_definition(text))
            .unwrap_or_else(|| SplitText::narrative(text))
    }

    fn split_fenced(&self, text: &str) -> Option<SplitText> {
        let open = text.find(FENCE)?;
        let body_start = open + FENCE.len();
        let rest = &text[body_start..];

        // An unterminated fence runs to the end of the text.
        let (body, after) = match rest.find(FENCE) {
            Some(close) => (&rest[..close], &rest[close + FENCE.len()..]),
            None => (rest, ""),
        };

        let (label, source) = self.strip_label(body);
        let code = non_empty(source).map(|source| CodeBlock {
            language: Some(
                label
                    .map(str::to_string)
                    .unwrap_or_else(|| self.options.default_language.clone()),
            ),
            source,
        });

        Some(SplitText {
            before: text[..open].trim().to_string(),
            code,
            after: after.trim().to_string(),
        })
    }

    /// The fence line's info string, when it is a bare language label.
    fn strip_label<'a>(&self, body: &'a str) -> (Option<&'a str>, &'a str) {
        let Some(newline) = body.find('\n') else {
            return (None, body);
        };
        let info = body[..newline].trim();
        if info.is_empty() {
            (None, &body[newline + 1..])
        } else if LABEL.is_match(info) {
            (Some(info), &body[newline + 1..])
        } else {
            (None, body)
        }
    }

    fn split_definition(&self, text: &str) -> Option<SplitText> {
        let found = self.definition.find(text)?;
        let start = found.start();
        let end = balanced_end(text, found.end()).unwrap_or(text.len());

        Some(SplitText {
            before: text[..start].trim().to_string(),
            code: non_empty(&text[start..end]).map(|source| CodeBlock {
                language: Some(self.options.default_language.clone()),
                source,
            }),
            after: text[end..].trim().to_string(),
        })
    }
}

/// Byte index just past the `}` that balances the first `{` at or after
/// `from`. Braces inside string or char literals do not count, and closing
/// braces seen before any opening one are ignored. `None` if the braces never
/// balance.
fn balanced_end(text: &str, from: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut opened = false;
    let mut in_string = false;
    let mut in_char = false;
    let mut escaped = false;

    for (i, ch) in text[from..].char_indices() {
        match ch {
            '\\' if !escaped && (in_string || in_char) => escaped = true,
            '"' if !in_char && !escaped => in_string = !in_string,
            '\'' if !in_string && !escaped => in_char = !in_char,
            '{' if !in_string && !in_char => {
                depth += 1;
                opened = true;
            }
            '}' if opened && !in_string && !in_char => {
                depth -= 1;
                if depth == 0 {
                    return Some(from + i + 1);
                }
            }
            _ => escaped = false,
        }
    }

    None
}
