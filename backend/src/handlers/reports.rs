//! HTTP handlers for uploaded spreadsheet reports

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::{is_excel_filename, SavedReportFile, SpreadsheetReport};

use crate::error::{AppError, AppResult};
use crate::extract::Multipart;
use crate::services::spreadsheet::{ReportIngestionService, UploadedFile};
use crate::AppState;

/// Multipart field carrying the workbooks
const FILES_FIELD: &str = "files";

#[derive(Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub count: usize,
    pub files: Vec<SavedReportFile>,
}

#[derive(Serialize)]
pub struct SpreadsheetReportResponse {
    pub success: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub report: SpreadsheetReport,
}

fn ingestion_service(state: &AppState) -> ReportIngestionService {
    ReportIngestionService::new(
        state.config.reports.upload_dir.clone(),
        state.config.reports.max_files,
    )
}

/// Upload warehouse workbooks, replacing the matching canonical slots
pub async fn upload_reports(
    State(state): State<AppState>,
    Multipart(mut multipart): Multipart,
) -> AppResult<Json<UploadResponse>> {
    let max_files = state.config.reports.max_files;
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILES_FIELD) {
            continue;
        }
        let original_name = field.file_name().unwrap_or_default().to_string();
        if !is_excel_filename(&original_name) {
            return Err(AppError::UnsupportedFile(original_name));
        }
        if files.len() == max_files {
            return Err(AppError::TooManyFiles { max: max_files });
        }

        let content = field.bytes().await?;
        files.push(UploadedFile {
            original_name,
            content: content.to_vec(),
        });
    }

    let saved = ingestion_service(&state).ingest(files).await?;
    tracing::info!(saved = saved.len(), "Spreadsheet reports uploaded");

    Ok(Json(UploadResponse {
        success: true,
        message: "تم رفع الملفات بنجاح واستبدال الملفات القديمة".to_string(),
        count: saved.len(),
        files: saved,
    }))
}

/// Materials per store from the uploaded workbooks
pub async fn spreadsheet_materials_by_stores(
    State(state): State<AppState>,
) -> AppResult<Json<SpreadsheetReportResponse>> {
    let (message, report) = match ingestion_service(&state).read_report().await? {
        Some(report) => ("تم جلب المواد من ملفات Excel بنجاح", report),
        None => ("لا توجد ملفات مرفوعة", SpreadsheetReport::empty()),
    };

    Ok(Json(SpreadsheetReportResponse {
        success: true,
        message: message.to_string(),
        timestamp: Utc::now(),
        report,
    }))
}
