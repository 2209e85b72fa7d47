// SPDX-FileCopyrightText: 2026 Franklin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `franklin doctor`: configuration, database, and adapter checks.
//!
//! No check spends tokens or embedding quota; adapters are judged by their
//! own health reports.

use std::io::IsTerminal;
use std::path::Path;
use std::time::{Duration, Instant};

use franklin_anthropic::AnthropicProvider;
use franklin_config::FranklinConfig;
use franklin_core::{FranklinError, HealthStatus, PluginAdapter};
use franklin_openai::OpenAiEmbedder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Outcome of one check, timed from `start`.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: &'static str,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn finish(
        name: &'static str,
        status: CheckStatus,
        message: impl Into<String>,
        start: Instant,
    ) -> Self {
        Self {
            name,
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Row counts read from an existing database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Inventory {
    memories: i64,
    turns: i64,
    profiles: i64,
}

/// Run every check and print the report.
///
/// `deep` adds SQLite's integrity check and allocator statistics.
pub async fn run_doctor(
    config: &FranklinConfig,
    config_path: Option<&Path>,
    deep: bool,
    plain: bool,
) -> Result<(), FranklinError> {
    let db_path = config.storage.database_path.as_str();
    let mut results = vec![
        check_config(config_path),
        check_database(db_path).await,
        check_embedding(config).await,
        check_llm(config).await,
    ];
    if deep {
        results.push(check_db_integrity(db_path).await);
        results.push(check_memory_baseline());
    }

    let use_color = !plain && std::io::stdout().is_terminal();
    println!("\n  franklin doctor\n  {}", "-".repeat(50));
    for result in &results {
        println!("{}", render_line(result, use_color));
    }
    println!("\n  {}\n", summary(&results, deep));
    Ok(())
}

fn summary(results: &[CheckResult], deep: bool) -> String {
    let issues = results
        .iter()
        .filter(|r| r.status != CheckStatus::Pass)
        .count();
    match (issues, deep) {
        (0, _) => "All checks passed.".to_string(),
        (1, true) => "1 issue found.".to_string(),
        (n, true) => format!("{n} issues found."),
        (n, false) => format!(
            "{n} issue{} found. Run with --deep for more checks.",
            if n == 1 { "" } else { "s" }
        ),
    }
}

/// One report line: status marker, padded name, message, timing.
fn render_line(result: &CheckResult, use_color: bool) -> String {
    use colored::Colorize;

    let duration_ms = result.duration.as_millis();
    let (marker, message) = if use_color {
        match result.status {
            CheckStatus::Pass => ("✓".green().to_string(), result.message.clone()),
            CheckStatus::Warn => ("!".yellow().to_string(), result.message.yellow().to_string()),
            CheckStatus::Fail => ("✗".red().to_string(), result.message.red().to_string()),
        }
    } else {
        let marker = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        (marker.to_string(), result.message.clone())
    };
    format!("    {marker} {:<20} {message} ({duration_ms}ms)", result.name)
}

fn check_config(config_path: Option<&Path>) -> CheckResult {
    const NAME: &str = "Configuration";
    let start = Instant::now();
    let loaded = match config_path {
        Some(path) => franklin_config::load_and_validate_path(path),
        None => franklin_config::load_and_validate(),
    };
    match loaded {
        Ok(_) => CheckResult::finish(NAME, CheckStatus::Pass, "valid", start),
        Err(errors) => CheckResult::finish(
            NAME,
            CheckStatus::Fail,
            format!("{} error(s)", errors.len()),
            start,
        ),
    }
}

/// Open the database only if it already exists.
async fn open_existing(db_path: &str) -> Result<Option<tokio_rusqlite::Connection>, String> {
    if !Path::new(db_path).exists() {
        return Ok(None);
    }
    tokio_rusqlite::Connection::open(db_path)
        .await
        .map(Some)
        .map_err(|e| format!("open failed: {e}"))
}

async fn check_database(db_path: &str) -> CheckResult {
    const NAME: &str = "Database";
    let start = Instant::now();
    let conn = match open_existing(db_path).await {
        Ok(Some(conn)) => conn,
        Ok(None) => {
            return CheckResult::finish(
                NAME,
                CheckStatus::Warn,
                format!("not found: {db_path} (created on first use)"),
                start,
            );
        }
        Err(message) => return CheckResult::finish(NAME, CheckStatus::Fail, message, start),
    };

    let inventory: Result<Inventory, tokio_rusqlite::Error> = conn
        .call(|conn| {
            let count = |table: &str| {
                conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                    row.get::<_, i64>(0)
                })
            };
            Ok(Inventory {
                memories: count("memories")?,
                turns: count("conversation_turns")?,
                profiles: count("user_profiles")?,
            })
        })
        .await;

    match inventory {
        Ok(inv) => CheckResult::finish(
            NAME,
            CheckStatus::Pass,
            format!(
                "{} memories, {} turns, {} profiles",
                inv.memories, inv.turns, inv.profiles
            ),
            start,
        ),
        Err(e) => CheckResult::finish(NAME, CheckStatus::Fail, format!("query failed: {e}"), start),
    }
}

async fn check_embedding(config: &FranklinConfig) -> CheckResult {
    let start = Instant::now();
    let status = match OpenAiEmbedder::new(&config.embedding) {
        Ok(embedder) => embedder.health_check().await,
        Err(e) => Err(e),
    };
    adapter_result("Embeddings", status, start)
}

async fn check_llm(config: &FranklinConfig) -> CheckResult {
    let start = Instant::now();
    let status = match AnthropicProvider::new(&config.anthropic) {
        Ok(provider) => provider.health_check().await,
        Err(e) => Err(e),
    };
    adapter_result("Extraction model", status, start)
}

fn adapter_result(
    name: &'static str,
    status: Result<HealthStatus, FranklinError>,
    start: Instant,
) -> CheckResult {
    let (status, message) = match status {
        Ok(HealthStatus::Healthy) => (CheckStatus::Pass, "configured".to_string()),
        Ok(HealthStatus::Degraded(reason)) => (CheckStatus::Warn, reason),
        Ok(HealthStatus::Unhealthy(reason)) => (CheckStatus::Fail, reason),
        Err(e) => (CheckStatus::Fail, e.to_string()),
    };
    CheckResult::finish(name, status, message, start)
}

async fn check_db_integrity(db_path: &str) -> CheckResult {
    const NAME: &str = "DB integrity";
    let start = Instant::now();
    let conn = match open_existing(db_path).await {
        Ok(Some(conn)) => conn,
        Ok(None) => {
            return CheckResult::finish(NAME, CheckStatus::Warn, "skipped, no database", start);
        }
        Err(message) => return CheckResult::finish(NAME, CheckStatus::Fail, message, start),
    };

    let problems: Result<Vec<String>, tokio_rusqlite::Error> = conn
        .call(|conn| {
            let mut stmt = conn.prepare("PRAGMA integrity_check")?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await;

    match problems {
        Ok(rows) if rows == ["ok"] => CheckResult::finish(NAME, CheckStatus::Pass, "ok", start),
        Ok(rows) => CheckResult::finish(
            NAME,
            CheckStatus::Fail,
            format!("{} problem(s), first: {}", rows.len(), rows.first().map_or("", String::as_str)),
            start,
        ),
        Err(e) => CheckResult::finish(NAME, CheckStatus::Fail, format!("check failed: {e}"), start),
    }
}

#[cfg(not(target_env = "msvc"))]
fn check_memory_baseline() -> CheckResult {
    const MIB: f64 = 1024.0 * 1024.0;
    let start = Instant::now();
    if let Err(e) = tikv_jemalloc_ctl::epoch::advance() {
        return CheckResult::finish(
            "Heap",
            CheckStatus::Warn,
            format!("allocator stats unavailable: {e}"),
            start,
        );
    }
    let allocated = tikv_jemalloc_ctl::stats::allocated::read().unwrap_or(0) as f64 / MIB;
    let resident = tikv_jemalloc_ctl::stats::resident::read().unwrap_or(0) as f64 / MIB;
    CheckResult::finish(
        "Heap",
        CheckStatus::Pass,
        format!("allocated {allocated:.1} MiB, resident {resident:.1} MiB"),
        start,
    )
}

#[cfg(target_env = "msvc")]
fn check_memory_baseline() -> CheckResult {
    CheckResult::finish(
        "Heap",
        CheckStatus::Warn,
        "jemalloc not available on MSVC",
        Instant::now(),
    )
}
