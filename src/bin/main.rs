//! relic CLI - Inspect the encoding and inferred schema of table exports
//!
//! Usage:
//!   relic detect <file> [--table <name>] [--variant <map>] [--save]
//!   relic hash <file> [--table <name>] [--variant <map>]
//!   relic validate <file> [--table <name>] [--variant <map>]
//!   relic infer <field>...
//!   relic analyze <path>... [--json]
//!   relic categories
//!   relic stats
//!
//! Examples:
//!   relic detect data/items.xml --save
//!   relic hash data/items.xml && edit data/items.xml && relic validate data/items.xml
//!   relic analyze data/ --json

use clap::{Parser, Subcommand};
use relic::analysis::{self, TableReport};
use relic::config::Settings;
use relic::encoding::DetectionSource;
use relic::inference::{slot, PatternCategoryCatalog};
use relic::Session;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a log filter, e.g. `relic=debug`.
const LOG_ENV_VAR: &str = "RELIC_LOG";

#[derive(Parser)]
#[command(name = "relic")]
#[command(about = "relic - Encoding transparency and schema inference for legacy game-server tables")]
#[command(version)]
struct Cli {
    /// Path to a relic.toml (overrides RELIC_CONFIG and the default locations)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Identifies a file's row in the metadata store.
#[derive(clap::Args)]
struct KeyArgs {
    /// Table name (defaults to the file stem)
    #[arg(short, long)]
    table: Option<String>,

    /// Map variant, empty when the file is not map-scoped
    #[arg(long, default_value = "")]
    variant: String,
}

impl KeyArgs {
    fn table_for(&self, file: &Path) -> String {
        self.table
            .clone()
            .or_else(|| analysis::table_name(file))
            .unwrap_or_default()
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Detect the encoding of a table file
    Detect {
        file: PathBuf,

        #[command(flatten)]
        key: KeyArgs,

        /// Record the decision in the metadata store
        #[arg(short, long)]
        save: bool,
    },

    /// Record the baseline hash of a table file
    Hash {
        file: PathBuf,

        #[command(flatten)]
        key: KeyArgs,
    },

    /// Check an exported file against its baseline hash
    Validate {
        file: PathBuf,

        #[command(flatten)]
        key: KeyArgs,
    },

    /// Infer type, reference and slot hypotheses from column names
    Infer {
        /// Column names
        #[arg(required = true)]
        fields: Vec<String>,
    },

    /// Analyze table files or directories of them
    Analyze {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Print reports as JSON
        #[arg(long)]
        json: bool,

        /// Do not record detected encodings
        #[arg(long)]
        no_save: bool,
    },

    /// List the pattern categories
    Categories,

    /// Show metadata store statistics
    Stats,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = match load_settings(cli.config.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Infer { ref fields } => return cmd_infer(&settings, fields),
        Commands::Categories => return cmd_categories(),
        _ => {}
    }

    let session = match Session::open(settings) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to open metadata store: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Detect { file, key, save } => cmd_detect(&session, &file, &key, save),
        Commands::Hash { file, key } => cmd_hash(&session, &file, &key),
        Commands::Validate { file, key } => cmd_validate(&session, &file, &key),
        Commands::Analyze {
            paths,
            json,
            no_save,
        } => cmd_analyze(&session, &paths, json, no_save),
        Commands::Stats => cmd_stats(&session),
        Commands::Infer { .. } | Commands::Categories => ExitCode::SUCCESS,
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(path: Option<&Path>) -> Result<Settings, relic::config::SettingsError> {
    match path {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    }
}

fn cmd_detect(session: &Session, file: &Path, key: &KeyArgs, save: bool) -> ExitCode {
    let bytes = match fs::read(file) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", file.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let table = key.table_for(file);
    let outcome = match session.detect(&bytes, &table) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Detection failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let source = match outcome.source {
        DetectionSource::Detected => "detected",
        DetectionSource::Historical => "stored history",
        DetectionSource::Default => "default",
    };
    println!("File:       {}", file.display());
    println!("Table:      {}", table);
    println!("Encoding:   {}", outcome.info);
    println!("Confidence: {}", outcome.confidence);
    println!("Source:     {}", source);

    if save {
        if let Err(e) = session
            .cache()
            .save_metadata(&table, &key.variant, file, &outcome.info)
        {
            eprintln!("Failed to save metadata: {}", e);
            return ExitCode::FAILURE;
        }
        println!("Saved.");
    }

    ExitCode::SUCCESS
}

fn cmd_hash(session: &Session, file: &Path, key: &KeyArgs) -> ExitCode {
    let table = key.table_for(file);
    match session.validator().save_file_hash(&table, &key.variant, file) {
        Ok(hash) => {
            println!("{}  {}", hash, file.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Failed to record hash for '{}': {}", file.display(), e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_validate(session: &Session, file: &Path, key: &KeyArgs) -> ExitCode {
    let table = key.table_for(file);
    match session
        .validator()
        .validate_round_trip(&table, &key.variant, file)
    {
        Ok(result) => {
            println!("{}", result);
            if result.passed {
                ExitCode::SUCCESS
            } else {
                println!("  original: {}", result.original_hash);
                println!("  exported: {}", result.exported_hash);
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            eprintln!("Validation error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_infer(settings: &Settings, fields: &[String]) -> ExitCode {
    let inferrer = relic::inference::FieldTypeInferrer::new();
    let references =
        relic::inference::ReferenceDetector::new().with_known_tables(&settings.inference.known_tables);

    for field in fields {
        let inferred = inferrer.infer_from_name(field);
        print!("{}: {}({})", field, inferred.field_type, inferred.confidence);

        let reference = references.detect_field(field);
        if let (Some(table), Some(target)) =
            (&reference.target_table_name, &reference.target_field_name)
        {
            print!(" -> {}.{}({})", table, target, reference.confidence);
        }

        if let Some(info) = slot::extract_slot_info(field) {
            print!(" slot {}#{}", info.category, info.slot_index);
        }
        println!();
    }

    ExitCode::SUCCESS
}

fn cmd_analyze(session: &Session, inputs: &[PathBuf], json: bool, no_save: bool) -> ExitCode {
    let files = match analysis::collect_table_files(inputs) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error listing inputs: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if files.is_empty() {
        eprintln!("No table files found.");
        return ExitCode::FAILURE;
    }

    let analyzer = match session.corpus_analyzer() {
        Ok(a) => a.with_persist(!no_save),
        Err(e) => {
            eprintln!("Failed to start analyzer: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut reports = Vec::new();
    let mut failed = 0usize;
    for (path, result) in files.iter().zip(analyzer.analyze_files(&files)) {
        match result {
            Ok(report) => reports.push(report),
            Err(e) => {
                eprintln!("{}: {}", path.display(), e);
                failed += 1;
            }
        }
    }

    if json {
        match serde_json::to_string_pretty(&reports) {
            Ok(out) => println!("{}", out),
            Err(e) => {
                eprintln!("Failed to serialize reports: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        for report in &reports {
            print_report(report);
        }
    }

    if failed > 0 {
        eprintln!("{} of {} files failed.", failed, files.len());
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn print_report(report: &TableReport) {
    println!(
        "{} ({} records, {}, confidence {})",
        report.table_name, report.record_count, report.encoding.info, report.encoding.confidence
    );
    for column in &report.columns {
        println!("  {}", column);
    }
    for family in &report.slot_families {
        let gaps = family.missing_indices();
        if gaps.is_empty() {
            println!("  slots {}: 1..={}", family.category, family.max_index());
        } else {
            println!(
                "  slots {}: 1..={} missing {:?}",
                family.category,
                family.max_index(),
                gaps
            );
        }
    }
    println!();
}

fn cmd_categories() -> ExitCode {
    for category in PatternCategoryCatalog::all() {
        println!(
            "{} {:<12} {}",
            category.mechanism_icon, category.mechanism_code, category.mechanism_name
        );
    }
    ExitCode::SUCCESS
}

fn cmd_stats(session: &Session) -> ExitCode {
    let stats = match session.store_stats() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to read store statistics: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("Encoding entries: {}", stats.encoding_entries);
    println!("Baseline hashes:  {}", stats.hash_entries);

    match session.list_metadata() {
        Ok(records) => {
            if !records.is_empty() {
                println!();
                for record in records {
                    println!("  {:<32} {}", record.key.to_string(), record.info);
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Failed to list metadata: {}", e);
            ExitCode::FAILURE
        }
    }
}
