//! FileCab CLI
//!
//! Command-line access to a FileCab record file.
//!
//! # Commands
//!
//! - `create` / `edit` / `remove` - Change records
//! - `list` / `find` / `stat` - Read records
//! - `purge` - Reclaim space held by removed records
//! - `export` / `import` - Move records through CSV or XML files

mod commands;

use clap::{Args, Parser, Subcommand};
use commands::parse_date;
use filecab_core::{
    open_store, BackendKind, Field, Format, ParametersContainer, RuleSet, StoreConfig,
    StoreMetrics, ValidationRules,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// FileCab record file tool.
#[derive(Parser)]
#[command(name = "filecab")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the record file
    #[arg(global = true, short, long, default_value = "cabinet.db")]
    path: PathBuf,

    /// Validation rule set (default, custom)
    #[arg(global = true, short, long, default_value = "default")]
    rules: RuleSet,

    /// JSON document with rule set definitions
    #[arg(global = true, long)]
    rules_file: Option<PathBuf>,

    /// Report time spent in the store
    #[arg(global = true, long)]
    use_stopwatch: bool,

    /// Log every store call
    #[arg(global = true, long)]
    use_logger: bool,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Field values for `create` and `edit`.
#[derive(Args)]
struct RecordArgs {
    /// First name
    #[arg(long)]
    first_name: String,

    /// Last name
    #[arg(long)]
    last_name: String,

    /// Date of birth (MM/dd/yyyy)
    #[arg(long, value_parser = parse_date)]
    date_of_birth: NaiveDate,

    /// Working hours per week
    #[arg(long)]
    working_hours: i16,

    /// Annual income
    #[arg(long)]
    annual_income: Decimal,

    /// Driver license category
    #[arg(long)]
    category: char,
}

impl RecordArgs {
    fn to_parameters(&self) -> ParametersContainer {
        ParametersContainer::new(
            self.first_name.clone(),
            self.last_name.clone(),
            self.date_of_birth,
            self.working_hours,
            self.annual_income,
            self.category,
        )
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create a record
    Create(RecordArgs),

    /// Replace every field of a record
    Edit {
        /// Record id
        id: i32,

        #[command(flatten)]
        record: RecordArgs,
    },

    /// Mark a record as removed
    Remove {
        /// Record id
        id: i32,
    },

    /// List every record
    List,

    /// Find records by one field
    Find {
        /// Field to match (firstname, lastname, dateofbirth, workinghours,
        /// annualincome, category)
        field: Field,

        /// Value to match
        value: String,
    },

    /// Show record counts
    Stat,

    /// Physically discard removed records
    Purge,

    /// Write every record to a file
    Export {
        /// File format (csv, xml)
        format: Format,

        /// Output file
        file: PathBuf,
    },

    /// Merge records from a file
    Import {
        /// File format (csv, xml)
        format: Format,

        /// Input file
        file: PathBuf,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so command output stays clean
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Version = cli.command {
        println!("FileCab CLI v{}", env!("CARGO_PKG_VERSION"));
        println!("FileCab Core v{}", filecab_core::VERSION);
        return Ok(());
    }

    let mut config = StoreConfig::new()
        .rule_set(cli.rules)
        .logged(cli.use_logger);
    if let Some(rules_file) = &cli.rules_file {
        config = config.rules(ValidationRules::load(rules_file, cli.rules)?);
    }
    let metrics = Arc::new(StoreMetrics::new());
    if cli.use_stopwatch {
        config = config.with_metrics(Arc::clone(&metrics));
    }

    let mut store = open_store(&config, BackendKind::File(cli.path.clone()))?;

    match cli.command {
        Commands::Create(record) => {
            commands::records::create(store.as_mut(), &record.to_parameters())?;
        }
        Commands::Edit { id, record } => {
            commands::records::edit(store.as_mut(), id, &record.to_parameters())?;
        }
        Commands::Remove { id } => commands::records::remove(store.as_mut(), id)?,
        Commands::List => commands::records::list(store.as_ref())?,
        Commands::Find { field, value } => {
            commands::records::find(store.as_ref(), field, &value)?;
        }
        Commands::Stat => commands::records::stat(store.as_ref())?,
        Commands::Purge => commands::records::purge(store.as_mut())?,
        Commands::Export { format, file } => {
            commands::transfer::export(store.as_ref(), format, &file)?;
        }
        Commands::Import { format, file } => {
            commands::transfer::import(store.as_mut(), format, &file)?;
        }
        Commands::Version => {}
    }

    if cli.use_stopwatch {
        let snap = metrics.snapshot();
        println!("Elapsed: {:?} over {} store call(s)", snap.elapsed, snap.total());
    }

    Ok(())
}
