mod cli;
mod commands;

use clap::Parser;
use critique_core::Store;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::{Cli, Commands, ConfigCommands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let store = match &cli.home {
        Some(home) => Store::new(home),
        None => Store::open_default(),
    };

    match cli.command {
        Commands::Render { path, format } => commands::render(&store, path.as_deref(), format),
        Commands::Evaluate {
            path,
            language,
            title,
            description,
            no_save,
            format,
        } => {
            let request = commands::EvaluateRequest {
                path,
                language,
                title,
                description,
                save: !no_save,
                format,
            };
            commands::evaluate(&store, request).await
        }
        Commands::List => commands::list(&store),
        Commands::Show { id, format } => commands::show(&store, &id, format),
        Commands::Delete { id } => commands::delete(&store, &id),
        Commands::Schema => commands::schema(),
        Commands::Config { command } => match command {
            ConfigCommands::Show => commands::config_show(&store),
            ConfigCommands::Get { key } => commands::config_get(&store, &key),
            ConfigCommands::Set { key, value } => commands::config_set(&store, &key, &value),
        },
    }
}

/// Logs go to stderr so rendered output on stdout stays pipeable.
/// `RUST_LOG` takes precedence over `-v`.
fn init_logging(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbosity {
        0 => EnvFilter::new("critique=warn"),
        1 => EnvFilter::new("critique=info"),
        2 => EnvFilter::new("critique=debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
