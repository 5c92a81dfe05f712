use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rusqlite::Connection;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crowdfunding_admin::{
    db, CommentController, Config, FormRegistry, ImportOptions, ImportReport, Importer,
    ResourceKind, SessionToken, SqliteCommentModel, Submission, SubmissionOutcome,
};

const DEFAULT_CONFIG: &str = "crowdfunding.toml";

/// Admin tools for the crowdfunding backend
#[derive(Debug, Parser)]
#[command(name = "crowdfunding-admin")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "CROWDFUNDING_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file, overrides the configured path
    #[arg(short, long, global = true, env = "CROWDFUNDING_DB")]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create the tables
    Init,

    /// Import a reference data file
    Import {
        #[arg(value_enum)]
        target: ImportTarget,

        /// XML file, or GeoNames TXT dump for locations
        file: PathBuf,

        /// Ignore source ids and let the database assign new ones
        #[arg(long)]
        reset_id: bool,

        /// Skip TXT locations with a smaller population
        #[arg(long)]
        min_population: Option<i64>,
    },

    /// Remove every row of a resource
    Remove {
        /// currencies, countries or locations
        kind: String,
    },

    /// Save a comment from posted form data
    Comment {
        /// Anti-forgery token posted with the form
        #[arg(long)]
        token: Option<String>,

        /// Session the token was issued for
        #[arg(long, default_value = "cli")]
        session: String,

        /// Form data as a JSON object of strings
        #[arg(long)]
        data: String,

        #[arg(long, default_value = "save")]
        task: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ImportTarget {
    Currencies,
    Countries,
    Locations,
    States,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(database) = cli.database {
        config.database.path = database;
    }

    let conn = open_database(&config.database.path)?;

    match cli.command {
        Commands::Init => {
            println!("🔧 Database ready at {}", config.database.path.display());
            Ok(())
        }
        Commands::Import {
            target,
            file,
            reset_id,
            min_population,
        } => {
            let mut options = ImportOptions::from(&config.import);
            options.reset_id = reset_id;
            if let Some(min_population) = min_population {
                options.min_population = min_population;
            }
            run_import(&conn, options, target, &file)
        }
        Commands::Remove { kind } => {
            let removed = Importer::new(&conn, ImportOptions::from(&config.import))
                .remove_all(&kind)
                .with_context(|| format!("Failed to remove {}", kind))?;
            println!("🗑️  Removed {} rows from {}", removed, kind);
            Ok(())
        }
        Commands::Comment {
            token,
            session,
            data,
            task,
        } => run_comment(&conn, &config, token, &session, &data, task),
    }
}

fn run_import(conn: &Connection, options: ImportOptions, target: ImportTarget, file: &Path) -> Result<()> {
    println!("📂 Importing {}...", file.display());

    let importer = Importer::new(conn, options);
    let report: ImportReport = match target {
        ImportTarget::Currencies => importer.import(ResourceKind::Currencies, file),
        ImportTarget::Countries => importer.import(ResourceKind::Countries, file),
        ImportTarget::Locations => importer.import(ResourceKind::Locations, file),
        ImportTarget::States => importer.import_states(file),
    }
    .with_context(|| format!("Failed to import {}", file.display()))?;

    println!("✓ {:?}: {}", report.mode, report.summary());
    Ok(())
}

fn run_comment(
    conn: &Connection,
    config: &Config,
    token: Option<String>,
    session: &str,
    data: &str,
    task: String,
) -> Result<()> {
    let data: HashMap<String, String> =
        serde_json::from_str(data).context("Form data must be a JSON object of strings")?;

    let forms = FormRegistry::with_defaults(config.comments.max_length);
    let session = SessionToken::new(&config.comments.session_secret, session);
    let mut controller = CommentController::new(&forms, &session, SqliteCommentModel::new(conn));

    let outcome = controller.save(&Submission { token, task, data })?;

    match &outcome {
        SubmissionOutcome::Saved { id, message, .. } => println!("✅ {} (id {})", message, id),
        SubmissionOutcome::Rejected { errors, .. } => {
            eprintln!("❌ Comment rejected:");
            for error in errors {
                eprintln!("   {}", error);
            }
        }
    }
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    Ok(())
}

/// Explicit config files must exist; the default one is optional
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path).with_context(|| format!("Failed to load {}", path.display())),
        None if Path::new(DEFAULT_CONFIG).exists() => Ok(Config::load(Path::new(DEFAULT_CONFIG))?),
        None => Ok(Config::default()),
    }
}

fn open_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    db::setup_database(&conn)?;
    Ok(conn)
}

fn setup_logging(verbosity: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = match verbosity {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
