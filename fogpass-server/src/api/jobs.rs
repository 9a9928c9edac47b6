use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use fogpass::db::failure_repo::{self, FailedRowRecord};
use fogpass::UploadJob;

use super::error::{bad_request, internal_error, not_found, ApiResult};
use crate::state::AppState;

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 1000;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub size: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    pub content: Vec<T>,
    pub page_number: u64,
    pub page_size: u64,
    pub total_elements: u64,
    pub total_pages: u64,
    pub first: bool,
    pub last: bool,
}

impl<T> PageResponse<T> {
    pub fn new(content: Vec<T>, page_number: u64, page_size: u64, total_elements: u64) -> Self {
        let total_pages = total_elements.div_ceil(page_size);
        Self {
            content,
            page_number,
            page_size,
            total_elements,
            total_pages,
            first: page_number == 0,
            last: page_number.saturating_add(1) >= total_pages,
        }
    }
}

fn check_job_id(job_id: &str) -> ApiResult<()> {
    uuid::Uuid::parse_str(job_id)
        .map(|_| ())
        .map_err(|_| bad_request(format!("Invalid job id: {}", job_id)))
}

async fn find_job(state: &AppState, job_id: String) -> ApiResult<UploadJob> {
    check_job_id(&job_id)?;
    let tracker = state.tracker.clone();
    let lookup_id = job_id.clone();
    tokio::task::spawn_blocking(move || tracker.find(&lookup_id))
        .await
        .map_err(internal_error)?
        .map_err(internal_error)?
        .ok_or_else(|| not_found(format!("Job not found: {}", job_id)))
}

/// GET /api/masterdata/landmarks/status/{job_id}
pub async fn job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<UploadJob>> {
    find_job(&state, job_id).await.map(Json)
}

/// GET /api/masterdata/landmarks/failures/{job_id}
pub async fn job_failures(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<PageResponse<FailedRowRecord>>> {
    let job = find_job(&state, job_id).await?;

    let page = query.page.unwrap_or(0);
    let size = query
        .size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let db = state.db.clone();
    let (rows, total) =
        tokio::task::spawn_blocking(move || failure_repo::page_by_job(&db, &job.job_id, page, size))
            .await
            .map_err(internal_error)?
            .map_err(internal_error)?;

    Ok(Json(PageResponse::new(rows, page, size, total)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_arithmetic() {
        let page = PageResponse::new(vec![0; 20], 0, 20, 25);
        assert_eq!(page.total_pages, 2);
        assert!(page.first);
        assert!(!page.last);

        let page = PageResponse::new(vec![0; 5], 1, 20, 25);
        assert!(!page.first);
        assert!(page.last);
    }

    #[test]
    fn test_empty_result_is_single_last_page() {
        let page: PageResponse<u8> = PageResponse::new(vec![], 0, 20, 0);
        assert_eq!(page.total_pages, 0);
        assert!(page.first);
        assert!(page.last);
    }

    #[test]
    fn test_last_page_number_does_not_overflow() {
        let page: PageResponse<u8> = PageResponse::new(vec![], u64::MAX, 1000, 3);
        assert_eq!(page.total_pages, 1);
        assert!(!page.first);
        assert!(page.last);
    }

    #[test]
    fn test_job_id_must_be_uuid() {
        assert!(check_job_id("9b2f4a55-6f0e-4a5c-8d1e-2f3b4c5d6e7f").is_ok());
        assert!(check_job_id("not-a-job").is_err());
    }
}
