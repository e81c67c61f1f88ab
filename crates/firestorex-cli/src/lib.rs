use std::path::Path;

use anyhow::Context;
use firestorex_core::{AppError, ErrorMetadata, LogLevel, UploadGuard, Verdict};
use serde::Serialize;

/// Print a value as pretty JSON on stdout.
pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

/// Final path component as UTF-8.
pub fn file_name(file: &Path) -> anyhow::Result<&str> {
    file.file_name()
        .and_then(|n| n.to_str())
        .context("File name is not valid UTF-8")
}

/// Object path for an upload: the explicit path, or `{actor}/{file name}`
/// when an actor is known, or just the file name.
pub fn object_path(file: &Path, explicit: Option<&str>, actor: Option<&str>) -> anyhow::Result<String> {
    if let Some(path) = explicit {
        return Ok(path.trim_start_matches('/').to_string());
    }

    let name = file_name(file)?;

    Ok(match actor {
        Some(actor) => format!("{}/{}", actor, name),
        None => name.to_string(),
    })
}

/// JSON summary of a validation verdict.
pub fn verdict_json(name: &str, size: u64, verdict: &Verdict) -> serde_json::Value {
    match verdict.reason() {
        None => serde_json::json!({ "file": name, "size": size, "accepted": true }),
        Some(reason) => serde_json::json!({
            "file": name,
            "size": size,
            "accepted": false,
            "reason": reason.to_string(),
        }),
    }
}

/// Check a local file against the upload guard using only its name and size.
pub async fn validate_file(file: &Path) -> anyhow::Result<serde_json::Value> {
    let size = tokio::fs::metadata(file)
        .await
        .with_context(|| format!("Failed to read file: {}", file.display()))?
        .len();
    let name = file_name(file)?;
    let verdict = UploadGuard::default().check(name, size);
    Ok(verdict_json(name, size, &verdict))
}

/// Error body printed on stderr when a command fails.
#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub error: String,
    pub code: &'static str,
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorReport {
    /// Details and the error type are shown only for non-sensitive errors outside production.
    pub fn new(err: &AppError, is_production: bool) -> Self {
        let show_details = !is_production && !err.is_sensitive();

        Self {
            error: err.client_message(),
            code: err.error_code(),
            recoverable: err.is_recoverable(),
            suggested_action: err.suggested_action(),
            error_type: show_details.then(|| err.error_type().to_string()),
            details: show_details.then(|| err.detailed_message()),
        }
    }
}

/// Log a failed command at the error's own level.
pub fn log_error(err: &AppError) {
    let error_type = err.error_type();
    match err.log_level() {
        LogLevel::Debug => tracing::debug!(error = %err, error_type, "Command failed"),
        LogLevel::Warn => tracing::warn!(error = %err, error_type, "Command failed"),
        LogLevel::Error => tracing::error!(error = %err, error_type, "Command failed"),
    }
}

pub fn is_production_env() -> bool {
    std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .map(|env| matches!(env.to_lowercase().as_str(), "production" | "prod"))
        .unwrap_or(false)
}

/// Process exit code for a failed command: 2 for caller errors, 1 otherwise.
pub fn exit_code(err: &impl ErrorMetadata) -> i32 {
    match err.http_status_code() {
        400..=499 => 2,
        _ => 1,
    }
}
