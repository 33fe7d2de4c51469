use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use callscope_core::FilterSpec;

/// Call-record analytics and cross-source correlation.
///
/// Reads call histories exported from device extractions and prints JSON
/// results on stdout. Logs go to stderr (set `RUST_LOG` to see them).
#[derive(Parser, Debug)]
#[command(name = "callscope", version, about)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Aggregate statistics for one or more call history files.
    Stats(StatsArgs),

    /// Find field values shared by records from different files.
    Similarities(SimilarityArgs),

    /// Identify the country of a single phone number.
    Lookup(LookupArgs),

    /// Print the SHA-256 digest of a file.
    Hash(HashArgs),

    /// Convert a Cellebrite XML report into a call history JSON document.
    Convert(ConvertArgs),
}

// ── stats ───────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Call history JSON files (`{"call_history": [...], "filters": {...}}`).
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Keep only calls of this type.
    #[arg(long = "type")]
    pub call_type: Option<String>,

    /// Keep only calls made through this application.
    #[arg(long)]
    pub app: Option<String>,

    /// Keep only calls with this number.
    #[arg(long)]
    pub number: Option<String>,

    /// Inclusive lower time bound (ISO-8601).
    #[arg(long)]
    pub start_time: Option<String>,

    /// Inclusive upper time bound (ISO-8601).
    #[arg(long)]
    pub end_time: Option<String>,

    /// Directory holding country_codes.json and city_codes.json.
    #[arg(long)]
    pub tables_dir: Option<PathBuf>,

    /// Fail instead of leaving geography empty when a table is missing.
    #[arg(long)]
    pub strict: bool,
}

impl StatsArgs {
    /// Filter constraints given on the command line.
    pub fn filter_overrides(&self) -> FilterSpec {
        FilterSpec {
            call_type: self.call_type.clone(),
            app: self.app.clone(),
            number: self.number.clone(),
            start_time: self.start_time.clone(),
            end_time: self.end_time.clone(),
        }
    }
}

// ── similarities ────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct SimilarityArgs {
    /// Call history files; each file name becomes the source tag.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Keep only groups for this field.
    #[arg(long)]
    pub field: Option<String>,

    /// Keep only groups with this value.
    #[arg(long)]
    pub value: Option<String>,
}

// ── lookup / hash ───────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct LookupArgs {
    /// Raw phone number, e.g. +77011234567.
    pub number: String,

    /// Directory holding country_codes.json.
    #[arg(long)]
    pub tables_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct HashArgs {
    pub file: PathBuf,
}

// ── convert ─────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// UFED report XML (namespace http://pa.cellebrite.com/report/2.0).
    pub report: PathBuf,
}
