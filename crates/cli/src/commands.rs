//! Subcommand handlers. Each returns the JSON document to print.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use callscope_compute::{AnalyticsEngine, SimilarityJob, SimilarityQuery};
use callscope_core::{
    read_report, CallHistory, Config, ReferenceTables, SourcedRecord, TableKind, TableLoader,
    TableStore, TablesConfig,
};

use crate::cli::{ConvertArgs, HashArgs, LookupArgs, SimilarityArgs, StatsArgs};
use crate::hash::file_sha256;

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}

/// File name used as a source tag or result key.
fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn tables_config(config: &Config, dir_override: Option<&Path>) -> TablesConfig {
    let mut tables = config.tables.clone();
    if let Some(dir) = dir_override {
        tables.dir = dir.to_path_buf();
    }
    tables
}

// ── stats ───────────────────────────────────────────────────────────

pub fn stats(args: &StatsArgs, config: &Config) -> Result<Value> {
    let tables = tables_config(config, args.tables_dir.as_deref());
    let strict = args.strict || tables.strict;
    let store = TableStore::open(TableLoader::from_config(&tables), strict)
        .context("failed to load reference tables")?;
    let engine = AnalyticsEngine::from_store(&store)
        .with_strict(strict)
        .with_workers(config.analytics.workers);

    let overrides = args.filter_overrides();
    let mut histories = Vec::with_capacity(args.inputs.len());
    for path in &args.inputs {
        let mut history: CallHistory = read_json(path)?;
        let filters = history.filters.take().unwrap_or_default().merged_with(&overrides);
        if !filters.is_empty() {
            history.filters = Some(filters);
        }
        info!(
            input = %path.display(),
            records = history.call_history.len(),
            language = history.language.as_deref().unwrap_or("-"),
            "call history loaded"
        );
        histories.push(history);
    }

    if let [history] = histories.as_slice() {
        let report = engine
            .statistics(history)
            .with_context(|| format!("statistics failed for {}", args.inputs[0].display()))?;
        return Ok(serde_json::to_value(report)?);
    }

    let results = engine.statistics_batch(&histories)?;
    let mut out = Map::new();
    for (path, result) in args.inputs.iter().zip(results) {
        let report =
            result.with_context(|| format!("statistics failed for {}", path.display()))?;
        out.insert(source_name(path), serde_json::to_value(report)?);
    }
    Ok(Value::Object(out))
}

// ── similarities ────────────────────────────────────────────────────

/// Tag every call object in a file's `call_history` with the file name.
///
/// Fields are kept as written, so tool-specific extras take part in
/// correlation too.
fn read_tagged(path: &Path) -> Result<Vec<SourcedRecord>> {
    let source = source_name(path);
    let doc: Value = read_json(path)?;
    let Some(Value::Array(calls)) = doc.get("call_history") else {
        bail!("{} has no call_history array", path.display());
    };

    let mut records = Vec::with_capacity(calls.len());
    for (idx, call) in calls.iter().enumerate() {
        match call {
            Value::Object(fields) => records.push(SourcedRecord::new(source.clone(), fields.clone())),
            other => warn!(source = %source, idx, value = %other, "skipping non-object call entry"),
        }
    }
    Ok(records)
}

pub fn similarities(args: &SimilarityArgs) -> Result<Value> {
    let mut records = Vec::new();
    for path in &args.files {
        records.extend(read_tagged(path)?);
    }

    let job = SimilarityJob::new(
        records,
        SimilarityQuery::new(args.field.clone(), args.value.clone()),
    );
    let groups = job.groups();
    info!(
        sources = args.files.len(),
        records = job.records().len(),
        groups = groups.len(),
        "similarities computed"
    );
    Ok(serde_json::to_value(&groups)?)
}

// ── lookup / hash ───────────────────────────────────────────────────

pub fn lookup(args: &LookupArgs, config: &Config) -> Result<Value> {
    let tables = tables_config(config, args.tables_dir.as_deref());
    let country = TableLoader::from_config(&tables)
        .load_table(TableKind::Country)
        .context("failed to load country table")?;
    let tables = ReferenceTables {
        country: Some(country),
        city: None,
    };

    let found = tables.identify_country(&args.number);
    Ok(json!({
        "number": args.number,
        "country": found.as_ref().map(|m| m.label),
        "prefix": found.as_ref().map(|m| m.prefix),
    }))
}

pub fn hash(args: &HashArgs) -> Result<Value> {
    let digest = file_sha256(&args.file)
        .with_context(|| format!("failed to hash {}", args.file.display()))?;
    Ok(json!({
        "file": args.file.display().to_string(),
        "sha256": digest,
    }))
}

// ── convert ─────────────────────────────────────────────────────────

pub fn convert(args: &ConvertArgs) -> Result<Value> {
    let history = read_report(&args.report)
        .with_context(|| format!("failed to convert {}", args.report.display()))?;
    Ok(serde_json::to_value(history)?)
}
