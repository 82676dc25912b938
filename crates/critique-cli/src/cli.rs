use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use critique_core::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "critique", version, about = "Produce and render LLM code-review reports")]
pub struct Cli {
    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
    /// Data directory (default: $CRITIQUE_HOME or ~/.critique)
    #[arg(long, global = true)]
    pub home: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render a report payload from a file or stdin
    Render {
        /// Payload file; stdin when omitted or "-"
        path: Option<PathBuf>,
        /// text, markdown, html or json (default: render.format setting)
        #[arg(short, long)]
        format: Option<OutputFormat>,
    },
    /// Send a source file to the configured LLM for review
    Evaluate {
        path: PathBuf,
        /// Language of the code (default: inferred from the file extension)
        #[arg(short, long)]
        language: Option<String>,
        /// Title shown on the report (default: the file name)
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long, default_value = "")]
        description: String,
        /// Print the result without storing it
        #[arg(long)]
        no_save: bool,
        #[arg(short, long)]
        format: Option<OutputFormat>,
    },
    /// List stored evaluations
    List,
    /// Show a stored evaluation with its full report
    Show {
        id: String,
        #[arg(short, long)]
        format: Option<OutputFormat>,
    },
    /// Delete a stored evaluation
    Delete { id: String },
    /// Print the JSON schema the evaluator is asked to follow
    Schema,
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print every setting
    Show,
    Get { key: String },
    Set { key: String, value: String },
}
