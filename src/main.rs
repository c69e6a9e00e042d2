//! # Lecture Brief CLI (`brief`)
//!
//! Resolves weekly lecture material for the courses configured in a TOML
//! file and prints the extracted text.
//!
//! ## Usage
//!
//! ```bash
//! brief --config ./config/brief.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `brief week` | Print the current semester week |
//! | `brief resolve <course>` | Resolve and print this week's and last week's material |
//! | `brief extract <file>` | Extract the text of a local PDF / PPTX / DOCX |
//! | `brief courses` | List configured courses and whether their folders are reachable |
//!
//! ## Examples
//!
//! ```bash
//! # Week of a given day
//! brief week --date 2025-03-20
//!
//! # JSON output for downstream briefing generation
//! brief resolve edtech --json
//!
//! # Keep a copy of this week's newest file
//! brief resolve edtech --save ./this-week.pdf
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use lecture_brief::config::{self, Config};
use lecture_brief::courses;
use lecture_brief::extract::extract_text;
use lecture_brief::models::{WeekNumber, WeeklyBundle};
use lecture_brief::resolve::{ResolveOptions, Resolver};
use lecture_brief::store;
use lecture_brief::week::compute_week;

/// Lecture Brief CLI: resolve weekly lecture material and extract its text.
///
/// All commands except `extract` read a TOML configuration file given by
/// `--config`.
#[derive(Parser)]
#[command(
    name = "brief",
    about = "Resolve weekly lecture material from a document store and extract its text",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/brief.toml")]
    config: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log output format (logs go to stderr).
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the semester week for a date.
    Week {
        /// Reference date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Resolve a course's current and previous week material.
    ///
    /// Lists the course folder once, matches documents tagged with the week
    /// keyword, downloads them and prints the extracted text.
    Resolve {
        /// Course name as configured under `[courses.<name>]`.
        course: String,

        /// Reference date (YYYY-MM-DD). Defaults to today.
        #[arg(long, conflicts_with = "week")]
        date: Option<NaiveDate>,

        /// Resolve an explicit week instead of computing it from a date.
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        week: Option<u32>,

        /// Print the bundle as JSON.
        #[arg(long)]
        json: bool,

        /// Write the newest current week document to this path.
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Extract the text of a local document.
    Extract {
        /// Path to a PDF, PPTX, or DOCX file.
        path: PathBuf,

        /// Declared content type; defaults to detection by file suffix.
        #[arg(long)]
        content_type: Option<String>,
    },

    /// List configured courses and check that their folders can be listed.
    Courses,
}

fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = match cli.verbose {
        0 => "lecture_brief=info,brief=info",
        1 => "lecture_brief=debug,brief=debug",
        _ => "lecture_brief=trace,brief=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

#[derive(Serialize)]
struct RawSummary<'a> {
    name: &'a str,
    content_type: &'a str,
    size: usize,
}

#[derive(Serialize)]
struct ResolveOutput<'a> {
    course: &'a str,
    subject: Option<&'a str>,
    #[serde(flatten)]
    bundle: &'a WeeklyBundle,
    current_week_raw: Option<RawSummary<'a>>,
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    // Commands that don't require config
    if let Commands::Extract { path, content_type } = &cli.command {
        return run_extract(path, content_type.as_deref()).await;
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Week { date } => {
            let date = date.unwrap_or_else(today);
            let week = compute_week(cfg.semester.start_date, date);
            println!("{}", week);
        }
        Commands::Resolve {
            course,
            date,
            week,
            json,
            save,
        } => {
            run_resolve(&cfg, &course, date, week, json, save).await?;
        }
        Commands::Courses => {
            let store = store::build_store(&cfg)?;
            courses::list_courses(&cfg, store.as_ref()).await?;
        }
        Commands::Extract { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}

async fn run_extract(path: &std::path::Path, content_type: Option<&str>) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let text = extract_text(&bytes, &name, content_type)
        .with_context(|| format!("Failed to extract {}", path.display()))?;
    println!("{}", text);
    Ok(())
}

async fn run_resolve(
    cfg: &Config,
    course_name: &str,
    date: Option<NaiveDate>,
    week: Option<u32>,
    json: bool,
    save: Option<PathBuf>,
) -> anyhow::Result<()> {
    let course = cfg.course(course_name)?;
    let store: Arc<dyn store::DocumentStore> = Arc::from(store::build_store(cfg)?);
    let resolver = Resolver::new(store, ResolveOptions::from_config(cfg)?);

    let week = match week.and_then(WeekNumber::new) {
        Some(week) => week,
        None => compute_week(cfg.semester.start_date, date.unwrap_or_else(today)),
    };

    let bundle = resolver
        .resolve_week(&course.material_folder(), week)
        .await
        .with_context(|| format!("Could not load material for course '{}'", course_name))?;

    if let Some(path) = &save {
        match &bundle.current_week_raw {
            Some(raw) => {
                tokio::fs::write(path, &raw.bytes)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                tracing::info!(path = %path.display(), document = %raw.name, "saved current week document");
            }
            None => tracing::warn!("no current week document to save"),
        }
    }

    if json {
        let output = ResolveOutput {
            course: course_name,
            subject: course.subject.as_deref(),
            bundle: &bundle,
            current_week_raw: bundle.current_week_raw.as_ref().map(|raw| RawSummary {
                name: &raw.name,
                content_type: &raw.content_type,
                size: raw.bytes.len(),
            }),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_bundle(course_name, &bundle);
    Ok(())
}

fn print_bundle(course: &str, bundle: &WeeklyBundle) {
    let week = bundle.week.map(|w| w.to_string()).unwrap_or_default();
    println!("course: {}  week: {}", course, week);
    println!();

    match (&bundle.previous_week_document, &bundle.previous_week_text) {
        (Some(name), Some(text)) => {
            println!("── previous week: {}", name);
            println!("{}", text.trim_end());
        }
        (Some(name), None) => println!("── previous week: {} (unreadable)", name),
        (None, _) => println!("── previous week: none"),
    }
    println!();

    if bundle.current_week_documents.is_empty() {
        println!("── current week: no material posted yet");
        return;
    }
    println!(
        "── current week: {}",
        bundle.current_week_documents.join(", ")
    );
    println!("{}", bundle.current_week_text.trim_end());
}
