use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::*;
use tracing_subscriber::EnvFilter;

use crate::{
    models::collection::AwardCollection,
    services::{
        awards::{FindAwardError, find_award},
        calendar::{CalendarError, write_event},
        convert::{ExportError, convert_file},
        filter::{FilterSpec, collect_facets, filter_awards, parse_horizon},
        ingest::{IngestError, ingest_rows},
        review::write_review,
        validate::{ValidationReport, validate},
    },
    sources::{
        SourceError,
        mapping::{ColumnMapping, MappingPreset},
        read_table,
    },
    storage::{Storage, StorageError, cursor::CursorFile, json::JsonFileStorage},
};

mod models;
mod normalize;
mod services;
mod sources;
mod storage;
mod ui;

#[derive(Parser)]
#[command(
    name = "awards",
    about = "Maintain and browse the award listing data"
)]
struct Cli {
    /// Awards collection file
    #[arg(
        long,
        global = true,
        env = "AWARDS_DATA",
        default_value = "docs/data/awards.json"
    )]
    data: PathBuf,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show awards matching the filters, soonest deadline first
    List {
        /// Search title, requirements, previous awardees, eligibility and level
        #[arg(short, long, default_value = "")]
        search: String,

        /// Only awards at this level
        #[arg(short, long, default_value = "")]
        level: String,

        /// Eligible group (can be used multiple times)
        #[arg(short = 'f', long = "for", action = clap::ArgAction::Append)]
        award_for: Vec<String>,

        /// Award type (can be used multiple times)
        #[arg(short = 't', long = "type", action = clap::ArgAction::Append)]
        award_type: Vec<String>,

        /// Only deadlines within this many days
        #[arg(short, long)]
        deadline: Option<String>,
    },

    /// Show the values available for filtering
    Facets,

    /// Check the collection and write a validation report
    Validate {
        #[arg(long, default_value = "scripts/validation-results.json")]
        report: PathBuf,
    },

    /// Replace the collection with the contents of a CSV or workbook export
    Convert {
        source: PathBuf,

        #[arg(short, long, value_enum, default_value_t = MappingPreset::Workbook)]
        mapping: MappingPreset,

        /// JSON column mapping, overrides --mapping
        #[arg(long)]
        mapping_file: Option<PathBuf>,
    },

    /// Append new form-response rows to the collection
    Ingest {
        source: PathBuf,

        #[arg(short, long, value_enum, default_value_t = MappingPreset::Form)]
        mapping: MappingPreset,

        /// JSON column mapping, overrides --mapping
        #[arg(long)]
        mapping_file: Option<PathBuf>,

        /// Ingestion cursor file
        #[arg(long, env = "AWARDS_STATE", default_value = ".github/state.json")]
        state: PathBuf,

        /// Write a review summary per added award into this directory
        #[arg(long)]
        review_dir: Option<PathBuf>,
    },

    /// Export an award deadline as an iCalendar file
    Calendar {
        /// Award id or part of its title
        award: String,

        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
    },
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }
}

fn load_existing(path: &Path) -> AwardCollection {
    match JsonFileStorage::existing(path.to_path_buf()).load() {
        Ok(collection) => collection,
        Err(StorageError::NotFound(path)) => {
            eprintln!("Error: Awards file '{}' not found", path.display());
            eprintln!("\nSet --data or AWARDS_DATA to the collection file.");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: Failed to load awards: {}", e);
            std::process::exit(1);
        }
    }
}

fn resolve_mapping(preset: MappingPreset, mapping_file: Option<&Path>) -> ColumnMapping {
    let Some(path) = mapping_file else {
        return preset.mapping();
    };

    let parsed = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|content| serde_json::from_str(&content).map_err(|e| e.to_string()));

    match parsed {
        Ok(mapping) => mapping,
        Err(e) => {
            eprintln!("Error: Invalid mapping file '{}': {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

fn report_source_error(e: SourceError) -> ! {
    match e {
        SourceError::UnsupportedFormat(path) => {
            eprintln!("Error: Unsupported source file '{}'", path.display());
            eprintln!("\nExpected one of: .csv, .tsv, .xlsx, .xlsm, .xls, .ods");
        }
        other => eprintln!("Error: {}", other),
    }
    std::process::exit(1);
}

fn write_report(path: &Path, report: &ValidationReport) {
    let written = serde_json::to_string_pretty(report)
        .map_err(|e| e.to_string())
        .and_then(|json| {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
            }
            std::fs::write(path, json).map_err(|e| e.to_string())
        });

    if let Err(e) = written {
        eprintln!("Error: Failed to write report '{}': {}", path.display(), e);
        std::process::exit(1);
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    match cli.command {
        Commands::List {
            search,
            level,
            award_for,
            award_type,
            deadline,
        } => {
            let collection = load_existing(&cli.data);
            let spec = FilterSpec {
                search,
                level,
                award_for,
                award_type,
                deadline: deadline.as_deref().and_then(parse_horizon),
            };
            let today = jiff::Zoned::now().date();

            let awards = filter_awards(&collection.awards, &spec, today);

            if awards.is_empty() {
                println!("No awards match the current filters");
            } else {
                ui::render_view_header(awards.len(), collection.len());
                for award in awards {
                    ui::render_award(award, today);
                }
            }
            println!(
                "\n  {} {}",
                "Last updated".dimmed(),
                ui::format_last_updated(collection.last_updated).dimmed()
            );
        }
        Commands::Facets => {
            let collection = load_existing(&cli.data);
            ui::render_facets(&collect_facets(&collection.awards));
        }
        Commands::Validate { report } => {
            let result = match JsonFileStorage::existing(cli.data.clone()).load() {
                Ok(collection) => validate(&collection),
                Err(e @ StorageError::NotFound(_)) => ValidationReport::unreadable(e.to_string()),
                Err(e) if e.is_malformed() => {
                    ValidationReport::unreadable(format!("Invalid JSON: {}", e))
                }
                Err(e) => {
                    eprintln!("Error: Failed to load awards: {}", e);
                    std::process::exit(1);
                }
            };

            write_report(&report, &result);
            ui::render_validation_report(&result);

            if !result.valid {
                std::process::exit(1);
            }
        }
        Commands::Convert {
            source,
            mapping,
            mapping_file,
        } => {
            let mapping = resolve_mapping(mapping, mapping_file.as_deref());
            let storage = JsonFileStorage::new(cli.data.clone());

            match convert_file(&source, &mapping, &storage, &jiff::Zoned::now()) {
                Ok(report) => {
                    ui::render_convert_report(&report);
                    println!("{} {}", "Saved".green(), storage.path().display());
                }
                Err(ExportError::Source(e)) => report_source_error(e),
                Err(ExportError::Storage(e)) => {
                    eprintln!("Error: Failed to save awards: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Ingest {
            source,
            mapping,
            mapping_file,
            state,
            review_dir,
        } => {
            let mapping = resolve_mapping(mapping, mapping_file.as_deref());
            let table = match read_table(&source, mapping.has_headers) {
                Ok(table) => table,
                Err(e) => report_source_error(e),
            };
            let storage = JsonFileStorage::new(cli.data.clone());
            let cursor = CursorFile::new(state);

            let report = match ingest_rows(&table, &mapping, &storage, &cursor, &jiff::Zoned::now())
            {
                Ok(report) => report,
                Err(IngestError::Interrupted {
                    row,
                    last_durable_row,
                    source,
                }) => {
                    eprintln!("Error: Failed to save the award from row {}: {}", row, source);
                    eprintln!(
                        "\nRows up to {} are saved; the next run resumes after it.",
                        last_durable_row
                    );
                    std::process::exit(1);
                }
                Err(IngestError::Storage(e)) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            };

            if let Some(dir) = review_dir {
                for award in &report.added {
                    match write_review(&dir, award) {
                        Ok(path) => tracing::info!(path = %path.display(), "wrote review summary"),
                        Err(e) => {
                            eprintln!("Error: {}", e);
                            std::process::exit(1);
                        }
                    }
                }
            }

            tracing::info!(
                data = %storage.path().display(),
                state = %cursor.path().display(),
                last_processed_row = report.last_processed_row,
                "ingestion finished"
            );
            ui::render_ingest_report(&report);
        }
        Commands::Calendar { award, out_dir } => {
            let collection = load_existing(&cli.data);

            let award = match find_award(&collection, &award) {
                Ok(award) => award,
                Err(FindAwardError::AwardNotFound(identifier)) => {
                    eprintln!("Error: Award '{}' not found", identifier);
                    std::process::exit(1);
                }
                Err(FindAwardError::AmbiguousAwardName(titles)) => {
                    eprintln!("Error: Award name is ambiguous. Multiple awards found:");
                    for title in titles {
                        eprintln!("  - {}", title);
                    }
                    eprintln!("\nPlease be more specific or use the award id.");
                    std::process::exit(1);
                }
            };

            match write_event(award, &out_dir, jiff::Timestamp::now()) {
                Ok(path) => println!("{} {}", "Saved".green(), path.display()),
                Err(CalendarError::InvalidDeadline { title, value }) => {
                    eprintln!("Error: Award '{}' has no valid deadline ('{}')", title, value);
                    std::process::exit(1);
                }
                Err(e @ CalendarError::WriteFailed { .. }) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}
