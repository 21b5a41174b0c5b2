use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use crate::error::PhyemError;
use crate::lesson::report::{sort_newest_first, Report};

const COLLABORATOR: &str = "report_store";

/// Durable list of submitted reports, kept as one JSON array on disk.
/// A missing file reads as an empty list; a corrupt one is an error.
#[derive(Debug)]
pub struct ReportStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl ReportStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ReportStore {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_raw(&self) -> Result<Vec<Report>, PhyemError> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(PhyemError::new(format!("Failed to read report store: {}", e), "io")
                    .with_collaborator(COLLABORATOR)
                    .with_context(format!("path: {:?}", self.path)));
            }
        };
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&text).map_err(|e| {
            PhyemError::new(format!("Report store is corrupt: {}", e), "json_parse")
                .with_collaborator(COLLABORATOR)
                .with_context(format!("path: {:?}", self.path))
        })
    }

    async fn write_raw(&self, reports: &[Report]) -> Result<(), PhyemError> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await.map_err(|e| {
                PhyemError::new(format!("Failed to create data directory: {}", e), "io")
                    .with_collaborator(COLLABORATOR)
                    .with_context(format!("path: {:?}", dir))
            })?;
        }
        let json = serde_json::to_string_pretty(reports).map_err(|e| {
            PhyemError::new(format!("Failed to serialize reports: {}", e), "json_serialize")
                .with_collaborator(COLLABORATOR)
        })?;
        tokio::fs::write(&self.path, json).await.map_err(|e| {
            PhyemError::new(format!("Failed to write report store: {}", e), "io")
                .with_collaborator(COLLABORATOR)
                .with_context(format!("path: {:?}", self.path))
        })
    }

    pub async fn append(&self, report: &Report) -> Result<(), PhyemError> {
        let _guard = self.write_lock.lock().await;
        let mut reports = self.read_raw().await?;
        reports.push(report.clone());
        self.write_raw(&reports).await?;
        tracing::info!(
            report_id = %report.id,
            student_id = %report.student_id,
            total = reports.len(),
            "Report stored"
        );
        Ok(())
    }

    /// All stored reports, newest first
    pub async fn list(&self) -> Result<Vec<Report>, PhyemError> {
        let mut reports = self.read_raw().await?;
        sort_newest_first(&mut reports);
        Ok(reports)
    }

    pub async fn clear(&self) -> Result<(), PhyemError> {
        let _guard = self.write_lock.lock().await;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(PhyemError::new(format!("Failed to clear report store: {}", e), "io")
                    .with_collaborator(COLLABORATOR)
                    .with_context(format!("path: {:?}", self.path)));
            }
        }
        tracing::warn!(path = ?self.path, "Report store cleared");
        Ok(())
    }

    /// Merge imported rows in front of the stored ones, dropping any report
    /// whose (student id, timestamp) pair was already seen. Returns the new total.
    pub async fn merge_imported(&self, imported: Vec<Report>) -> Result<usize, PhyemError> {
        let _guard = self.write_lock.lock().await;
        let existing = self.read_raw().await?;
        let incoming = imported.len();
        let merged = merge_unique(imported, existing);
        self.write_raw(&merged).await?;
        tracing::info!(incoming = incoming, total = merged.len(), "Imported reports merged");
        Ok(merged.len())
    }
}

/// `first` wins over `second` on duplicate (student id, timestamp)
pub fn merge_unique(first: Vec<Report>, second: Vec<Report>) -> Vec<Report> {
    let mut seen = HashSet::new();
    first
        .into_iter()
        .chain(second)
        .filter(|r| seen.insert((r.student_id.clone(), r.timestamp.clone())))
        .collect()
}
