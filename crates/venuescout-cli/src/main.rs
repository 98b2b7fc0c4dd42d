mod collect;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use venuescout_core::{load_categories, AppConfig, CategoryTable};

#[derive(Debug, Parser)]
#[command(name = "venuescout")]
#[command(about = "Venue discovery over the Google Places API")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List the venue categories and the queries they search for
    Categories,
    /// Collect every venue for one category and export it
    Collect {
        /// Category label, matched case-insensitively (e.g. "Padel")
        #[arg(long)]
        category: String,

        /// Ignore the page ceiling; stop only when results run out or the
        /// record ceiling is reached
        #[arg(long)]
        all: bool,

        /// CSV destination (defaults to venues_export_<date>.csv)
        #[arg(long, conflicts_with = "json")]
        output: Option<PathBuf>,

        /// Print the venues as JSON on stdout instead of writing CSV
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse before touching the environment so `--help` works on a broken setup.
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("venuescout: try `venuescout --help`");
        return Ok(());
    };

    dotenvy::dotenv().ok();
    let config = venuescout_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let categories = category_table(&config)?;

    match command {
        Commands::Categories => {
            for category in categories.iter() {
                println!("{:<24} {}", category.label, category.query);
            }
        }
        Commands::Collect {
            category,
            all,
            output,
            json,
        } => {
            let category = categories.resolve(&category)?;
            let format = if json {
                collect::OutputFormat::Json
            } else {
                collect::OutputFormat::Csv(output)
            };
            collect::run_collect(&config, category, all, format).await?;
        }
    }

    Ok(())
}

fn category_table(config: &AppConfig) -> anyhow::Result<CategoryTable> {
    Ok(match &config.categories_path {
        Some(path) => load_categories(path)?,
        None => CategoryTable::builtin(),
    })
}
