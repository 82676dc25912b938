use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use critique_core::{envelope_schema, settings::KEYS, OutputFormat, Settings, Store, Submission};
use critique_format::{render as render_sections, render_evaluation, ReportFormatter};
use tracing::{debug, info};

pub fn render(store: &Store, path: Option<&Path>, format: Option<OutputFormat>) -> Result<()> {
    let payload = read_input(path)?;
    let settings = store.read_settings();
    let format = format.unwrap_or(settings.render.format);

    let sections = ReportFormatter::from_settings(&settings.render).format(&payload);
    debug!("{} section(s) from {} byte payload", sections.len(), payload.len());
    print_output(&render_sections(&sections, format));
    Ok(())
}

pub struct EvaluateRequest {
    pub path: PathBuf,
    pub language: Option<String>,
    pub title: Option<String>,
    pub description: String,
    pub save: bool,
    pub format: Option<OutputFormat>,
}

pub async fn evaluate(store: &Store, request: EvaluateRequest) -> Result<()> {
    let code = std::fs::read_to_string(&request.path)
        .with_context(|| format!("read {}", request.path.display()))?;
    let settings = store.read_settings();

    let submission = Submission {
        title: request.title.unwrap_or_else(|| file_title(&request.path)),
        description: request.description,
        language: request
            .language
            .unwrap_or_else(|| infer_language(&request.path, &settings.render.default_language)),
        code,
    };

    let id = store.next_evaluation_id()?;
    let evaluation = critique_evaluate::evaluate(&submission, &settings.ai, id).await?;

    if request.save {
        store.write_evaluation(&evaluation)?;
        info!("saved {}", evaluation.id);
    }

    let format = request.format.unwrap_or(settings.render.format);
    let sections = ReportFormatter::from_settings(&settings.render).format(&evaluation.full_report);
    print_output(&render_evaluation(&evaluation, &sections, format));
    Ok(())
}

pub fn list(store: &Store) -> Result<()> {
    let evaluations = store.list_evaluations()?;
    if evaluations.is_empty() {
        println!("No evaluations.");
        return Ok(());
    }

    let id_width = evaluations.iter().map(|e| e.id.len()).max().unwrap_or(0).max(2);
    let lang_width = evaluations
        .iter()
        .map(|e| e.language.len())
        .max()
        .unwrap_or(0)
        .max("LANGUAGE".len());

    println!("{:<id_width$}  {:>5}  {:<lang_width$}  TITLE", "ID", "SCORE", "LANGUAGE");
    for evaluation in &evaluations {
        println!(
            "{:<id_width$}  {:>5}  {:<lang_width$}  {}",
            evaluation.id, evaluation.score, evaluation.language, evaluation.title
        );
    }
    Ok(())
}

pub fn show(store: &Store, id: &str, format: Option<OutputFormat>) -> Result<()> {
    let evaluation = store.read_evaluation(id)?;
    let settings = store.read_settings();
    let format = format.unwrap_or(settings.render.format);

    let sections = ReportFormatter::from_settings(&settings.render).format(&evaluation.full_report);
    print_output(&render_evaluation(&evaluation, &sections, format));
    Ok(())
}

pub fn delete(store: &Store, id: &str) -> Result<()> {
    store.delete_evaluation(id)?;
    println!("Deleted {id}.");
    Ok(())
}

pub fn schema() -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&envelope_schema())?);
    Ok(())
}

pub fn config_show(store: &Store) -> Result<()> {
    let settings = store.read_settings();
    for key in KEYS {
        println!("{key} = {}", settings.get(key)?);
    }
    Ok(())
}

pub fn config_get(store: &Store, key: &str) -> Result<()> {
    println!("{}", store.read_settings().get(key)?);
    Ok(())
}

pub fn config_set(store: &Store, key: &str, value: &str) -> Result<()> {
    let mut settings: Settings = store.read_settings();
    settings.set(key, value)?;
    store.write_settings(&settings)?;
    println!("{key} = {}", settings.get(key)?);
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(p) if p != Path::new("-") => {
            std::fs::read_to_string(p).with_context(|| format!("read {}", p.display()))
        }
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("read payload from stdin")?;
            if buf.is_empty() {
                bail!("no payload on stdin");
            }
            Ok(buf)
        }
    }
}

fn print_output(out: &str) {
    if out.ends_with('\n') {
        print!("{out}");
    } else {
        println!("{out}");
    }
}

fn file_title(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn infer_language(path: &Path, default: &str) -> String {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    let language = match ext.as_str() {
        "js" | "mjs" | "cjs" | "jsx" => "javascript",
        "ts" | "tsx" => "typescript",
        "py" => "python",
        "rs" => "rust",
        "go" => "go",
        "java" => "java",
        "kt" | "kts" => "kotlin",
        "rb" => "ruby",
        "php" => "php",
        "c" | "h" => "c",
        "cc" | "cpp" | "cxx" | "hpp" => "cpp",
        "cs" => "csharp",
        "swift" => "swift",
        "sh" | "bash" => "bash",
        _ => default,
    };
    language.to_string()
}
