use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;

use fogpass::{UploadAccepted, UploadRequest};

use super::error::{bad_request, intake_error, internal_error, ApiError, ApiResult, ErrorResponse};
use super::identity;
use crate::state::AppState;

/// Multipart field names that carry the file, in order of preference.
const FILE_FIELDS: [&str; 5] = ["file", "files", "upload", "csv", "data"];
const ROUTE_FIELD: &str = "routeId";

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    #[serde(rename = "routeId")]
    pub route_id: Option<String>,
}

/// The file part picked out of a multipart body.
struct FilePart {
    rank: usize,
    file_name: Option<String>,
    content: Vec<u8>,
}

fn multipart_error(e: MultipartError) -> ApiError {
    (e.status(), Json(ErrorResponse { error: e.body_text() }))
}

/// Lower is better. Named fields rank by position; any other part with a
/// filename ranks after all of them. Text parts under other names are ignored.
fn file_rank(field_name: Option<&str>, has_file_name: bool) -> Option<usize> {
    match field_name.and_then(|n| FILE_FIELDS.iter().position(|f| *f == n)) {
        Some(rank) => Some(rank),
        None if has_file_name => Some(FILE_FIELDS.len()),
        None => None,
    }
}

fn parse_route_id(raw: Option<String>) -> ApiResult<i64> {
    let raw = raw
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .ok_or_else(|| bad_request("routeId is required"))?;
    raw.parse::<i64>()
        .map_err(|_| bad_request(format!("Invalid routeId: {}", raw)))
}

/// POST /api/masterdata/landmarks
pub async fn upload_landmarks(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<UploadAccepted>)> {
    let mut chosen: Option<FilePart> = None;
    let mut route_field: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        if name.as_deref() == Some(ROUTE_FIELD) && field.file_name().is_none() {
            route_field = Some(field.text().await.map_err(multipart_error)?);
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let Some(rank) = file_rank(name.as_deref(), file_name.is_some()) else {
            continue;
        };
        let content = field.bytes().await.map_err(multipart_error)?;
        if chosen.as_ref().map_or(true, |c| rank < c.rank) {
            chosen = Some(FilePart {
                rank,
                file_name,
                content: content.to_vec(),
            });
        }
    }

    let route_id = parse_route_id(query.route_id.or(route_field))?;
    let (file_name, content) = match chosen {
        Some(part) => (part.file_name, Some(part.content)),
        None => (None, None),
    };

    let request = UploadRequest {
        file_name,
        content,
        route_id,
        uploaded_by: identity::uploaded_by(&headers),
        client_ip: identity::client_ip(&headers),
    };

    let intake = state.intake.clone();
    let accepted = tokio::task::spawn_blocking(move || intake.accept(request))
        .await
        .map_err(internal_error)?
        .map_err(intake_error)?;

    Ok((StatusCode::ACCEPTED, Json(accepted)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_rank_order() {
        assert_eq!(file_rank(Some("file"), true), Some(0));
        assert_eq!(file_rank(Some("data"), false), Some(4));
        assert_eq!(file_rank(Some("attachment"), true), Some(5));
        assert_eq!(file_rank(Some("comment"), false), None);
        assert_eq!(file_rank(None, false), None);
    }

    #[test]
    fn test_parse_route_id() {
        assert_eq!(parse_route_id(Some(" 42 ".to_string())).unwrap(), 42);
        assert_eq!(
            parse_route_id(None).unwrap_err().0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            parse_route_id(Some("".to_string())).unwrap_err().0,
            StatusCode::BAD_REQUEST
        );
        let (_, Json(body)) = parse_route_id(Some("north".to_string())).unwrap_err();
        assert_eq!(body.error, "Invalid routeId: north");
    }
}
