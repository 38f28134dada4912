//! Spreadsheet report ingestion and reading
//!
//! Each known store owns one canonical slot file (`warehouse_{code}.xlsx`)
//! in the upload directory. Uploads are classified by the warehouse text in
//! their first worksheet and replace the slot they match; reads parse the
//! slots that exist. Unclassified uploads are kept under a unique
//! `warehouse_{millis}_{uuid}.xlsx` name for a day, then swept.

use std::fs;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use chrono::Utc;
use shared::{
    classify_warehouse_text, is_excel_filename, materials_from_rows, SavedReportFile,
    SpreadsheetReport, SpreadsheetStore, StoreCode, CLASSIFICATION_CELL,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

const TEMP_PREFIX: &str = "temp_";
const REPORT_PREFIX: &str = "warehouse_";

/// Temp files younger than this may belong to a concurrent upload
const STALE_TEMP_AGE: Duration = Duration::from_secs(60);

/// Unclassified uploads are never read; they are kept this long for inspection
const UNCLASSIFIED_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

/// A file received in an upload request
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_name: String,
    pub content: Vec<u8>,
}

/// Spreadsheet ingestion service
#[derive(Debug, Clone)]
pub struct ReportIngestionService {
    upload_dir: PathBuf,
    max_files: usize,
}

/// Removes the wrapped path when dropped
struct TempFile(PathBuf);

impl Drop for TempFile {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.0) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(path = %self.0.display(), error = %e, "Failed to remove temp upload");
            }
        }
    }
}

/// Grid of cell texts in absolute sheet coordinates
fn range_to_rows(range: &Range<Data>) -> Vec<Vec<String>> {
    let Some((last_row, last_col)) = range.end() else {
        return Vec::new();
    };

    (0..=last_row)
        .map(|row| {
            (0..=last_col)
                .map(|col| {
                    range
                        .get_value((row, col))
                        .map(|cell| cell.to_string())
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect()
}

/// First worksheet of an `.xlsx`/`.xls` file as rows of cell text
pub fn read_first_sheet(path: &Path) -> AppResult<Vec<Vec<String>>> {
    let content = fs::read(path)?;
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(content))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(calamine::Error::Msg("workbook has no worksheets"))??;

    Ok(range_to_rows(&range))
}

/// Slot for a parsed upload: the classification cell first, then the file name
pub fn classify_upload(rows: &[Vec<String>], original_name: &str) -> Option<StoreCode> {
    let (row, col) = CLASSIFICATION_CELL;
    rows.get(row)
        .and_then(|cells| cells.get(col))
        .and_then(|text| classify_warehouse_text(text))
        .or_else(|| classify_warehouse_text(original_name))
}

/// Age after which a file in the upload directory is swept, if ever
fn sweep_age(file_name: &str) -> Option<Duration> {
    if file_name.starts_with(TEMP_PREFIX) {
        return Some(STALE_TEMP_AGE);
    }
    let canonical = StoreCode::ALL
        .iter()
        .any(|code| code.canonical_file_name() == file_name);
    (file_name.starts_with(REPORT_PREFIX) && !canonical).then_some(UNCLASSIFIED_RETENTION)
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

impl ReportIngestionService {
    pub fn new(upload_dir: impl Into<PathBuf>, max_files: usize) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            max_files,
        }
    }

    /// Reject the batch before anything touches the disk
    pub fn validate(&self, files: &[UploadedFile]) -> AppResult<()> {
        if files.is_empty() {
            return Err(AppError::NoFilesUploaded);
        }
        if files.len() > self.max_files {
            return Err(AppError::TooManyFiles {
                max: self.max_files,
            });
        }
        if let Some(file) = files.iter().find(|f| !is_excel_filename(&f.original_name)) {
            return Err(AppError::UnsupportedFile(file.original_name.clone()));
        }
        Ok(())
    }

    /// Store every parseable file; files that fail are logged and skipped
    pub async fn ingest(&self, files: Vec<UploadedFile>) -> AppResult<Vec<SavedReportFile>> {
        self.validate(&files)?;

        let service = self.clone();
        tokio::task::spawn_blocking(move || service.ingest_blocking(files))
            .await
            .map_err(anyhow::Error::from)?
    }

    fn ingest_blocking(&self, files: Vec<UploadedFile>) -> AppResult<Vec<SavedReportFile>> {
        fs::create_dir_all(&self.upload_dir)?;

        let mut saved = Vec::with_capacity(files.len());
        for file in files {
            match self.store_file(&file) {
                Ok(Some(entry)) => saved.push(entry),
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(file = %file.original_name, error = %e, "Failed to store report");
                }
            }
        }

        self.sweep_stale_files();
        Ok(saved)
    }

    fn store_file(&self, file: &UploadedFile) -> AppResult<Option<SavedReportFile>> {
        let millis = Utc::now().timestamp_millis();
        let temp = TempFile(self.upload_dir.join(format!(
            "{}{}_{}.xlsx",
            TEMP_PREFIX,
            millis,
            Uuid::new_v4().simple()
        )));
        fs::write(&temp.0, &file.content)?;

        let rows = match read_first_sheet(&temp.0) {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(file = %file.original_name, error = %e, "Skipping unreadable spreadsheet");
                return Ok(None);
            }
        };

        let saved_name = match classify_upload(&rows, &file.original_name) {
            Some(code) => {
                let name = code.canonical_file_name();
                remove_if_exists(&self.upload_dir.join(&name))?;
                tracing::info!(file = %file.original_name, store = %code, "Replacing canonical report");
                name
            }
            None => {
                let name = format!(
                    "{}{}_{}.xlsx",
                    REPORT_PREFIX,
                    millis,
                    Uuid::new_v4().simple()
                );
                tracing::info!(file = %file.original_name, saved = %name, "Unclassified report saved under fallback name");
                name
            }
        };

        let target = self.upload_dir.join(&saved_name);
        fs::write(&target, &file.content)?;

        Ok(Some(SavedReportFile {
            original_name: file.original_name.clone(),
            saved_name,
            path: target.display().to_string(),
            size: file.content.len() as u64,
            upload_date: Utc::now(),
        }))
    }

    /// Remove temp files left behind by interrupted uploads and expired
    /// unclassified reports
    fn sweep_stale_files(&self) {
        let entries = match fs::read_dir(&self.upload_dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to list upload directory");
                return;
            }
        };

        let now = SystemTime::now();
        for entry in entries.flatten() {
            let Some(max_age) = sweep_age(&entry.file_name().to_string_lossy()) else {
                continue;
            };
            let stale = entry
                .metadata()
                .and_then(|meta| meta.modified())
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .is_some_and(|age| age >= max_age);
            if stale {
                drop(TempFile(entry.path()));
            }
        }
    }

    /// Materials from the canonical slots; `None` when nothing was ever uploaded
    pub async fn read_report(&self) -> AppResult<Option<SpreadsheetReport>> {
        let service = self.clone();
        let report = tokio::task::spawn_blocking(move || service.read_report_blocking())
            .await
            .map_err(anyhow::Error::from)?;
        Ok(report)
    }

    fn read_report_blocking(&self) -> Option<SpreadsheetReport> {
        if !self.upload_dir.is_dir() {
            return None;
        }

        let stores = StoreCode::ALL
            .iter()
            .filter_map(|code| {
                let path = self.upload_dir.join(code.canonical_file_name());
                if !path.is_file() {
                    return None;
                }
                match read_first_sheet(&path) {
                    Ok(rows) => Some(SpreadsheetStore::new(*code, materials_from_rows(&rows))),
                    Err(e) => {
                        tracing::warn!(store = %code, error = %e, "Skipping unreadable canonical report");
                        None
                    }
                }
            })
            .collect();

        Some(SpreadsheetReport::new(stores))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> UploadedFile {
        UploadedFile {
            original_name: name.to_string(),
            content: vec![1, 2, 3],
        }
    }

    #[test]
    fn test_validate_batch() {
        let service = ReportIngestionService::new("unused", 2);

        assert!(matches!(service.validate(&[]), Err(AppError::NoFilesUploaded)));
        assert!(matches!(
            service.validate(&[file("a.xlsx"), file("b.xlsx"), file("c.xlsx")]),
            Err(AppError::TooManyFiles { max: 2 })
        ));
        assert!(matches!(
            service.validate(&[file("a.xlsx"), file("notes.csv")]),
            Err(AppError::UnsupportedFile(name)) if name == "notes.csv"
        ));
        assert!(service.validate(&[file("a.XLS"), file("b.xlsx")]).is_ok());
    }

    #[test]
    fn test_classify_prefers_cell_over_file_name() {
        let rows = vec![
            vec!["".to_string()],
            vec!["".to_string(), "".to_string(), "مستودع المواد الفعالة".to_string()],
        ];
        assert_eq!(
            classify_upload(&rows, "تقرير الجاهزة.xlsx"),
            Some(StoreCode::ActiveMaterials)
        );
        assert_eq!(
            classify_upload(&[], "تقرير الجاهزة.xlsx"),
            Some(StoreCode::FinishedGoods)
        );
        assert_eq!(classify_upload(&[], "report.xlsx"), None);
    }

    #[test]
    fn test_sweep_age_by_name() {
        assert_eq!(sweep_age("temp_1_abc.xlsx"), Some(STALE_TEMP_AGE));
        assert_eq!(
            sweep_age("warehouse_1700000000000_abc.xlsx"),
            Some(UNCLASSIFIED_RETENTION)
        );
        assert_eq!(sweep_age("warehouse_12.xlsx"), None);
        assert_eq!(sweep_age("warehouse_101.xlsx"), None);
        assert_eq!(sweep_age("notes.txt"), None);
    }

    #[test]
    fn test_read_first_sheet_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_first_sheet(&dir.path().join("missing.xlsx")),
            Err(AppError::Storage(_))
        ));

        let garbage = dir.path().join("garbage.xlsx");
        fs::write(&garbage, b"not a workbook").unwrap();
        assert!(matches!(
            read_first_sheet(&garbage),
            Err(AppError::Spreadsheet(_))
        ));
    }

    #[test]
    fn test_temp_file_guard_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("temp_1.xlsx");
        fs::write(&path, b"x").unwrap();

        drop(TempFile(path.clone()));
        assert!(!path.exists());
        // already gone is fine
        drop(TempFile(path));
    }
}
