//! Command line inspector for addons namespaces.
//!
//! Loads a library and an application definition from JSON, builds the
//! context and prints every action with its derived type.

mod inspect;

use std::path::PathBuf;

use addons::{naming, Config};
use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "addons")]
#[command(about = "Inspect the action namespace built from a library and an application")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a context and list every action with its derived type
    Inspect {
        /// Library definition: { "name", "actions" }
        #[arg(long)]
        library: PathBuf,
        /// Application definition: { "name", "actions", "level", ... }
        #[arg(long)]
        app: PathBuf,
        /// Skip shape and uniqueness validation
        #[arg(long)]
        no_validate: bool,
        /// Print the listing as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the type derived for one action name
    Type {
        library: String,
        app: String,
        action: String,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,addons=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect {
            library,
            app,
            no_validate,
            json,
        } => {
            let config = Config::from_env()?;
            let mut options = config.build;
            if no_validate {
                options.validate = false;
            }
            tracing::debug!(environment = ?config.environment, validate = options.validate, "loaded config");

            let context = inspect::build(
                inspect::read_json(&library)?,
                inspect::read_json(&app)?,
                options,
            )?;
            let rows = inspect::rows(&context);

            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                inspect::print_table(&context, &rows);
            }
        }
        Commands::Type {
            library,
            app,
            action,
        } => {
            println!("{}", naming::action_type(&library, &app, &action));
        }
    }

    Ok(())
}
