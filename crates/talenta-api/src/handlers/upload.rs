//! Document upload handler.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use talenta_core::{DocumentKind, Error, FileRepository};

use super::{ApiError, AppState};

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub cv_id: Uuid,
    pub report_id: Uuid,
}

/// Replace filesystem-hostile characters so uploaded names can't escape
/// the upload directory or break tooling.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// `POST /upload` — accepts multipart fields `cv` and `project_report`,
/// stores both on disk, and returns their file ids.
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut cv_id: Option<Uuid> = None;
    let mut report_id: Option<Uuid> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidInput(format!("Malformed multipart body: {}", e)))?
    {
        let kind = match field.name() {
            Some("cv") => DocumentKind::Cv,
            Some("project_report") => DocumentKind::ProjectReport,
            _ => continue,
        };

        let original_name = field.file_name().map(sanitize_filename);
        let data = field
            .bytes()
            .await
            .map_err(|e| Error::InvalidInput(format!("Failed to read upload: {}", e)))?;

        let stored_name = format!(
            "{}-{}",
            Uuid::now_v7(),
            original_name.as_deref().unwrap_or("document.pdf")
        );
        let path = state.upload_dir.join(&stored_name);
        tokio::fs::write(&path, &data).await.map_err(Error::Io)?;

        let id = state
            .db
            .files
            .save(kind, &path.to_string_lossy(), original_name.as_deref())
            .await?;

        info!(
            file_id = %id,
            kind = %kind,
            size = data.len(),
            "Stored uploaded document"
        );

        match kind {
            DocumentKind::Cv => cv_id = Some(id),
            DocumentKind::ProjectReport => report_id = Some(id),
        }
    }

    match (cv_id, report_id) {
        (Some(cv_id), Some(report_id)) => Ok((
            StatusCode::CREATED,
            Json(UploadResponse { cv_id, report_id }),
        )),
        _ => Err(Error::InvalidInput(
            "Both 'cv' and 'project_report' files are required".to_string(),
        )
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename_keeps_safe_chars() {
        assert_eq!(sanitize_filename("resume-2026.pdf"), "resume-2026.pdf");
        assert_eq!(sanitize_filename("my_cv.v2.PDF"), "my_cv.v2.PDF");
    }

    #[test]
    fn test_sanitize_filename_replaces_hostile_chars() {
        assert_eq!(sanitize_filename("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_filename("cv résumé.pdf"), "cv_r_sum_.pdf");
        assert_eq!(sanitize_filename("a b\tc"), "a_b_c");
    }
}
