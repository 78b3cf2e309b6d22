//! Local storage for preferences and reports that could not be sent.
//!
//! Stores data in:
//! - Linux: ~/.local/share/profile-companion/
//! - macOS: ~/Library/Application Support/profile-companion/
//! - Windows: %APPDATA%/profile-companion/

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;
use uuid::Uuid;

use crate::report::ReportSubmission;
use crate::services::{AggregateRefresh, PreferenceStore};

const PREFS_FILE: &str = "prefs.json";
const PENDING_DIR: &str = "pending_reports";
const SENT_DIR: &str = "sent_reports";

/// Local storage manager for profile-companion data.
pub struct LocalStorage {
    data_dir: PathBuf,
}

/// A report saved while the backend was unreachable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingReport {
    pub id: String,
    pub report: ReportSubmission,
    /// Idempotency key for this report. Must be reused for all retries.
    pub idempotency_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PendingReportRecord {
    report: ReportSubmission,
    idempotency_key: String,
}

/// A report the backend has accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentReport {
    pub id: String,
    pub image_url: String,
    pub subject_user_id: String,
    pub reason: String,
    pub reported_at: DateTime<Utc>,
}

impl LocalStorage {
    /// Initialize local storage, creating directories if needed.
    pub fn new() -> Result<Self> {
        let dirs = ProjectDirs::from("com", "profilekit", "profile-companion")
            .context("Could not determine project directories")?;
        Self::with_data_dir(dirs.data_dir().to_path_buf())
    }

    /// Initialize storage rooted at an explicit directory (used by tests).
    pub fn with_data_dir(data_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
        fs::create_dir_all(data_dir.join(PENDING_DIR))?;
        fs::create_dir_all(data_dir.join(SENT_DIR))?;
        Ok(Self { data_dir })
    }

    fn prefs_path(&self) -> PathBuf {
        self.data_dir.join(PREFS_FILE)
    }

    /// Load the whole preference blob. Missing or corrupt files read as empty
    /// so one bad write never bricks the flows.
    fn load_prefs(&self) -> HashMap<String, String> {
        let path = self.prefs_path();
        let Ok(content) = fs::read_to_string(&path) else {
            return HashMap::new();
        };
        match serde_json::from_str(&content) {
            Ok(prefs) => prefs,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "preference blob unreadable; treating as empty");
                HashMap::new()
            }
        }
    }

    fn store_prefs(&self, prefs: &HashMap<String, String>) -> Result<()> {
        let path = self.prefs_path();
        let json =
            serde_json::to_string_pretty(prefs).context("Failed to serialize preferences")?;
        let mut file = open_private_file_overwrite(&path)
            .with_context(|| format!("Failed to open preferences at {}", path.display()))?;
        file.write_all(json.as_bytes())
            .with_context(|| format!("Failed to write preferences to {}", path.display()))?;
        Ok(())
    }

    /// Save a report for a later explicit sync.
    pub fn save_pending_report(
        &self,
        report: &ReportSubmission,
        idempotency_key: &str,
    ) -> Result<String> {
        let key = idempotency_key.trim();
        if key.is_empty() {
            anyhow::bail!("Idempotency key cannot be empty");
        }

        let id = format!(
            "pending_{}_{}",
            Utc::now().timestamp_millis(),
            Uuid::new_v4().simple()
        );
        let path = self.data_dir.join(PENDING_DIR).join(format!("{id}.json"));
        let record = PendingReportRecord {
            report: report.clone(),
            idempotency_key: key.to_string(),
        };
        let json =
            serde_json::to_string_pretty(&record).context("Failed to serialize pending report")?;

        let mut file = open_private_file_new(&path)
            .with_context(|| format!("Failed to create pending report at {}", path.display()))?;
        file.write_all(json.as_bytes())
            .with_context(|| format!("Failed to write pending report to {}", path.display()))?;

        Ok(id)
    }

    /// Load all pending reports, oldest first for deterministic retry order.
    /// Corrupt entries are quarantined rather than failing the whole queue.
    pub fn load_pending_reports(&self) -> Result<Vec<PendingReport>> {
        let pending_dir = self.data_dir.join(PENDING_DIR);
        let mut reports = Vec::new();

        if !pending_dir.exists() {
            return Ok(reports);
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(&pending_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                entries.push(entry);
            }
        }
        entries.sort_by_key(|entry| entry.metadata().and_then(|m| m.modified()).ok());

        for entry in entries {
            let path = entry.path();
            let id = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("unknown")
                .to_string();

            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(_) => {
                    let _ = quarantine_corrupt_record(&path);
                    continue;
                }
            };
            let record: PendingReportRecord = match serde_json::from_str(&content) {
                Ok(record) => record,
                Err(_) => {
                    let _ = quarantine_corrupt_record(&path);
                    continue;
                }
            };

            reports.push(PendingReport {
                id,
                report: record.report,
                idempotency_key: record.idempotency_key,
            });
        }

        Ok(reports)
    }

    /// Remove a pending report after a successful sync.
    pub fn remove_pending_report(&self, id: &str) -> Result<()> {
        if !is_valid_pending_id(id) {
            anyhow::bail!("Invalid pending report ID");
        }

        let path = self.data_dir.join(PENDING_DIR).join(format!("{id}.json"));
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove pending report: {}", path.display()))?;
        }
        Ok(())
    }

    /// Record a report the backend accepted.
    pub fn record_sent_report(&self, report: &ReportSubmission) -> Result<String> {
        let id = format!(
            "sent_{}_{}",
            Utc::now().timestamp_millis(),
            Uuid::new_v4().simple()
        );
        let sent = SentReport {
            id: id.clone(),
            image_url: report.image_url.clone(),
            subject_user_id: report.subject_user_id.clone(),
            reason: report.flags.reason_string(),
            reported_at: Utc::now(),
        };

        let path = self.data_dir.join(SENT_DIR).join(format!("{id}.json"));
        let json =
            serde_json::to_string_pretty(&sent).context("Failed to serialize sent report")?;
        let mut file = open_private_file_new(&path)
            .with_context(|| format!("Failed to create sent report at {}", path.display()))?;
        file.write_all(json.as_bytes())
            .with_context(|| format!("Failed to write sent report to {}", path.display()))?;

        Ok(id)
    }

    /// Load the sent-reports collection, newest first.
    pub fn load_sent_reports(&self) -> Result<Vec<SentReport>> {
        let sent_dir = self.data_dir.join(SENT_DIR);
        let mut reports = Vec::new();

        if !sent_dir.exists() {
            return Ok(reports);
        }

        for entry in fs::read_dir(&sent_dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.extension().map(|e| e == "json").unwrap_or(false) {
                continue;
            }
            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(_) => {
                    let _ = quarantine_corrupt_record(&path);
                    continue;
                }
            };
            match serde_json::from_str::<SentReport>(&content) {
                Ok(report) => reports.push(report),
                Err(_) => {
                    let _ = quarantine_corrupt_record(&path);
                }
            }
        }

        reports.sort_by(|a, b| b.reported_at.cmp(&a.reported_at));
        Ok(reports)
    }
}

impl PreferenceStore for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.load_prefs().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut prefs = self.load_prefs();
        prefs.insert(key.to_string(), value.to_string());
        self.store_prefs(&prefs)
    }
}

/// Cached view of the sent-reports collection.
///
/// `refresh` only invalidates; the next `list` call reloads from disk. This
/// is the aggregate a successful report submission invalidates.
pub struct SentReportsCache {
    storage: std::sync::Arc<LocalStorage>,
    cached: Mutex<Option<Vec<SentReport>>>,
}

impl SentReportsCache {
    pub fn new(storage: std::sync::Arc<LocalStorage>) -> Self {
        SentReportsCache {
            storage,
            cached: Mutex::new(None),
        }
    }

    pub fn list(&self) -> Result<Vec<SentReport>> {
        let mut cached = self.cached.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(reports) = cached.as_ref() {
            return Ok(reports.clone());
        }
        let reports = self.storage.load_sent_reports()?;
        *cached = Some(reports.clone());
        Ok(reports)
    }
}

impl AggregateRefresh for SentReportsCache {
    fn refresh(&self) {
        *self.cached.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

fn is_valid_pending_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 200
        && id
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
}

fn quarantine_corrupt_record(path: &Path) -> std::io::Result<()> {
    let invalid_path = path.with_extension("invalid");

    // Try to preserve the file for troubleshooting. If we can't rename, fall
    // back to removing it so one bad file doesn't block the queue.
    fs::rename(path, &invalid_path).or_else(|_| fs::remove_file(path))
}

fn open_private_file_new(path: &Path) -> std::io::Result<fs::File> {
    open_private_file(path, true, false)
}

fn open_private_file_overwrite(path: &Path) -> std::io::Result<fs::File> {
    open_private_file(path, false, true)
}

fn open_private_file(path: &Path, create_new: bool, truncate: bool) -> std::io::Result<fs::File> {
    let mut options = fs::OpenOptions::new();
    options.write(true);
    if create_new {
        options.create_new(true);
    } else {
        options.create(true);
    }
    if truncate {
        options.truncate(true);
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}
