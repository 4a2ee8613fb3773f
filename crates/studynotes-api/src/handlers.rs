//! HTTP handlers for the studynotes API.
//!
//! Handlers stay thin: decode the request, call the repository or
//! directory, run the derived-view functions, encode the response. Merge,
//! fallback, and validation rules all live below the trait seam.

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use studynotes_core::{
    defaults, filter_notes, format_byte_size, sort_notes, with_subject_name, Error, FileType,
    FunctionInvoker, NewSubject, Note, NoteDraft, NoteRepository, ObjectStore, SortMode, Subject,
    SubjectDirectory,
};
use studynotes_store::ContentFetchTracker;

// =============================================================================
// STATE
// =============================================================================

#[derive(Clone)]
pub struct AppState {
    pub notes: Arc<dyn NoteRepository>,
    pub subjects: Arc<dyn SubjectDirectory>,
    pub objects: Arc<dyn ObjectStore>,
    pub functions: Arc<dyn FunctionInvoker>,
    pub fetches: Arc<ContentFetchTracker>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/notes", get(list_notes).post(create_note))
        .route("/notes/recent", get(recent_notes))
        .route("/notes/shared", get(shared_notes))
        .route("/notes/search", get(search_notes))
        .route("/notes/:id", get(get_note).delete(delete_note))
        .route("/notes/:id/content", get(note_content))
        .route("/notes/:id/share", post(share_note))
        .route("/subjects", get(list_subjects).post(create_subject))
        .route(
            "/subjects/:id",
            get(get_subject).put(update_subject).delete(delete_subject),
        )
        .route("/subjects/:id/notes", get(subject_notes))
        .route("/search", get(invoke_search))
        .route("/content-fetches", delete(abort_fetches))
        .route("/files/*key", get(get_file))
        .with_state(state)
}

// =============================================================================
// ERRORS
// =============================================================================

pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    Unavailable(String),
    Internal(String),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::NoteNotFound(_) | Error::SubjectNotFound(_) | Error::ObjectNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            Error::Validation(msg) | Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::Conflict(msg) => ApiError::Conflict(msg),
            Error::Unavailable(msg) => ApiError::Unavailable(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::Internal(msg) => {
                warn!(subsystem = "api", error = %msg, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

// =============================================================================
// VIEWS
// =============================================================================

/// A note as the API presents it: stored fields plus derived ones.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NoteView {
    #[serde(flatten)]
    note: Note,
    file_size_display: String,
    file_url: String,
}

impl NoteView {
    fn build(note: Note, subjects: &[Subject]) -> Self {
        let note = with_subject_name(&note, subjects);
        Self {
            file_size_display: format_byte_size(note.file_size),
            file_url: format!("/files/{}", note.file_key),
            note,
        }
    }
}

async fn views(state: &AppState, notes: Vec<Note>) -> Result<Vec<NoteView>, ApiError> {
    let subjects = state.subjects.list().await?;
    Ok(notes
        .into_iter()
        .map(|n| NoteView::build(n, &subjects))
        .collect())
}

// =============================================================================
// NOTES
// =============================================================================

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

#[derive(Deserialize)]
struct ListNotesQuery {
    subject_id: Option<String>,
    file_type: Option<FileType>,
    sort: Option<SortMode>,
}

async fn list_notes(
    State(state): State<AppState>,
    Query(query): Query<ListNotesQuery>,
) -> Result<Json<Vec<NoteView>>, ApiError> {
    let all = state.notes.list_all().await?;
    let filtered = filter_notes(&all, query.subject_id.as_deref(), query.file_type);
    let sorted = sort_notes(&filtered, query.sort.unwrap_or(SortMode::NewestFirst));
    Ok(Json(views(&state, sorted).await?))
}

#[derive(Deserialize)]
struct RecentQuery {
    limit: Option<usize>,
}

async fn recent_notes(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<NoteView>>, ApiError> {
    let recent = state
        .notes
        .list_recent(query.limit.unwrap_or(defaults::RECENT_LIMIT))
        .await?;
    Ok(Json(views(&state, recent).await?))
}

async fn shared_notes(State(state): State<AppState>) -> Result<Json<Vec<NoteView>>, ApiError> {
    let shared = state.notes.list_shared().await?;
    Ok(Json(views(&state, shared).await?))
}

#[derive(Deserialize)]
struct SearchQuery {
    q: String,
}

async fn search_notes(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<NoteView>>, ApiError> {
    let hits = state.notes.search(&query.q).await?;
    Ok(Json(views(&state, hits).await?))
}

async fn get_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<NoteView>, ApiError> {
    let note = state
        .notes
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("note not found: {id}")))?;
    let subjects = state.subjects.list().await?;
    Ok(Json(NoteView::build(note, &subjects)))
}

async fn note_content(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let note = state
        .notes
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("note not found: {id}")))?;

    // Inline cached content wins; otherwise the blob is fetched through
    // the tracker so navigating away can abort it.
    if let Some(content) = note.content {
        return Ok(Json(json!({ "id": id, "content": content })));
    }
    let text = state
        .fetches
        .fetch_text(&note.file_key)
        .await
        .map_err(|e| ApiError::Internal(format!("content fetch aborted: {e}")))??;
    Ok(Json(json!({ "id": id, "content": text })))
}

async fn create_note(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<NoteView>), ApiError> {
    let mut title = String::new();
    let mut subject_id = String::new();
    let mut tags: Option<Vec<String>> = None;
    let mut content: Option<String> = None;
    let mut file_name = String::new();
    let mut claimed_type: Option<String> = None;
    let mut blob: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                file_name = field.file_name().unwrap_or_default().to_string();
                claimed_type = field.content_type().map(str::to_string);
                blob = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::BadRequest(format!("unreadable file part: {e}")))?
                        .to_vec(),
                );
            }
            "title" => title = text_field(field).await?,
            "subjectId" => subject_id = text_field(field).await?,
            "tags" => {
                let raw = text_field(field).await?;
                let parsed: Vec<String> = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect();
                if !parsed.is_empty() {
                    tags = Some(parsed);
                }
            }
            "content" => content = Some(text_field(field).await?),
            _ => {}
        }
    }

    let blob = blob.ok_or_else(|| ApiError::BadRequest("file part is required".into()))?;
    let file_type = resolve_file_type(&file_name, claimed_type.as_deref())?;

    let draft = NoteDraft {
        title,
        file_name,
        file_type,
        subject_id,
        tags,
        content,
    };
    let note = state.notes.create(draft, &blob).await?;
    let subjects = state.subjects.list().await?;
    Ok((StatusCode::CREATED, Json(NoteView::build(note, &subjects))))
}

async fn text_field(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::BadRequest(format!("unreadable form field: {e}")))
}

fn resolve_file_type(file_name: &str, claimed: Option<&str>) -> Result<FileType, ApiError> {
    if let Some(mime) = claimed {
        if let Some(t) = FileType::from_content_type(mime) {
            return Ok(t);
        }
    }
    file_name
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("unsupported file type: {file_name}")))
}

#[derive(Deserialize)]
struct ShareRequest {
    email: String,
}

async fn share_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ShareRequest>,
) -> Result<Json<NoteView>, ApiError> {
    if request.email.trim().is_empty() {
        return Err(ApiError::BadRequest("email is required".into()));
    }
    let note = state.notes.mark_shared(&id, request.email.trim()).await?;
    let subjects = state.subjects.list().await?;
    Ok(Json(NoteView::build(note, &subjects)))
}

async fn delete_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let note = state
        .notes
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("note not found: {id}")))?;
    state.notes.delete(&note).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// SUBJECTS
// =============================================================================

async fn list_subjects(State(state): State<AppState>) -> Result<Json<Vec<Subject>>, ApiError> {
    let mut subjects = state.subjects.list().await?;
    // note_count is derived from the merged note collection, never stored.
    let notes = state.notes.list_all().await?;
    for subject in &mut subjects {
        subject.note_count = Some(notes.iter().filter(|n| n.subject_id == subject.id).count() as i64);
    }
    Ok(Json(subjects))
}

async fn get_subject(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Subject>, ApiError> {
    state
        .subjects
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("subject not found: {id}")))
}

async fn create_subject(
    State(state): State<AppState>,
    Json(request): Json<NewSubject>,
) -> Result<(StatusCode, Json<Subject>), ApiError> {
    if request.name.trim().is_empty() {
        return Err(ApiError::BadRequest("name is required".into()));
    }
    let created = state.subjects.create(request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateSubjectRequest {
    name: Option<String>,
    color: Option<String>,
    description: Option<String>,
}

async fn update_subject(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateSubjectRequest>,
) -> Result<Json<Subject>, ApiError> {
    let mut subject = state
        .subjects
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("subject not found: {id}")))?;
    if let Some(name) = request.name {
        subject.name = name;
    }
    if let Some(color) = request.color {
        subject.color = Some(color);
    }
    if let Some(description) = request.description {
        subject.description = Some(description);
    }
    state.subjects.update(&subject).await?;
    Ok(Json(subject))
}

async fn delete_subject(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.subjects.delete(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("subject not found: {id}")))
    }
}

async fn subject_notes(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<NoteView>>, ApiError> {
    let notes = state.notes.list_by_subject(&id).await?;
    Ok(Json(views(&state, notes).await?))
}

// =============================================================================
// SEARCH FUNCTION & FILES
// =============================================================================

async fn invoke_search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let response = state
        .functions
        .invoke(defaults::SEARCH_FUNCTION, json!({ "query": query.q }))
        .await?;
    // Unwrap the string-encoded body into real JSON for the client.
    let body = response
        .get("body")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| ApiError::Internal("search function returned no body".into()))?;
    let parsed: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| ApiError::Internal(format!("search function body is not JSON: {e}")))?;
    Ok(Json(parsed))
}

async fn abort_fetches(State(state): State<AppState>) -> StatusCode {
    state.fetches.abort_all();
    StatusCode::NO_CONTENT
}

async fn get_file(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, ApiError> {
    let bytes = state.objects.get(&key).await?;
    let content_type = match key.rsplit('.').next() {
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    };
    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use studynotes_core::{seed_notes, seed_subjects};
    use studynotes_store::{
        BackedNoteRepository, BackedSubjectDirectory, MemoryObjectStore, MemoryTableStore,
        MockSearchFunction,
    };
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let tables = Arc::new(MemoryTableStore::new());
        let objects = Arc::new(MemoryObjectStore::new());
        AppState {
            notes: Arc::new(
                BackedNoteRepository::new(tables.clone(), objects.clone())
                    .with_seed(seed_notes()),
            ),
            subjects: Arc::new(
                BackedSubjectDirectory::new(tables).with_seed(seed_subjects()),
            ),
            objects: objects.clone(),
            functions: Arc::new(MockSearchFunction::new()),
            fetches: Arc::new(ContentFetchTracker::new(objects)),
        }
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_list_notes_resolves_subject_names_and_sizes() {
        let app = router(test_state());
        let response = app
            .oneshot(Request::get("/notes").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        let notes = body.as_array().unwrap();
        assert_eq!(notes.len(), 3);

        let calculus = notes
            .iter()
            .find(|n| n["id"] == "1")
            .expect("seed note 1 listed");
        assert_eq!(calculus["subjectName"], "Mathematics");
        assert_eq!(calculus["fileSizeDisplay"], "2.38 MB");
        assert_eq!(calculus["fileUrl"], "/files/notes/1/calculus_lecture_1.pdf");
    }

    #[tokio::test]
    async fn test_note_listing_sorted_newest_first() {
        let app = router(test_state());
        let response = app
            .oneshot(Request::get("/notes").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = body_json(response).await;
        let ids: Vec<_> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|n| n["id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["3", "2", "1"]);
    }

    #[tokio::test]
    async fn test_get_missing_note_is_404() {
        let app = router(test_state());
        let response = app
            .oneshot(Request::get("/notes/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_share_and_shared_listing() {
        let state = test_state();
        let app = router(state);

        let response = app
            .clone()
            .oneshot(
                Request::post("/notes/1/share")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"email":"friend2@example.com"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let shared = body_json(response).await;
        assert_eq!(shared["isShared"], true);

        let response = app
            .oneshot(Request::get("/notes/shared").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_share_requires_email() {
        let app = router(test_state());
        let response = app
            .oneshot(
                Request::post("/notes/1/share")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"email":"  "}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_subject_counts_derived_from_notes() {
        let app = router(test_state());
        let response = app
            .oneshot(Request::get("/subjects").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = body_json(response).await;
        let subjects = body.as_array().unwrap();
        assert_eq!(subjects.len(), 4);

        let math = subjects.iter().find(|s| s["id"] == "1").unwrap();
        assert_eq!(math["noteCount"], 1);
        let history = subjects.iter().find(|s| s["id"] == "4").unwrap();
        assert_eq!(history["noteCount"], 0);
    }

    #[tokio::test]
    async fn test_search_function_endpoint_unwraps_body() {
        let app = router(test_state());
        let response = app
            .oneshot(
                Request::get("/search?q=calculus")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["results"][0]["id"], "search-result-1");
        assert_eq!(body["results"][0]["title"], "Search result for: calculus");
    }

    #[tokio::test]
    async fn test_file_endpoint_serves_blob() {
        let state = test_state();
        state
            .objects
            .put("notes/x/a.txt", b"hello", "text/plain")
            .await
            .unwrap();
        let app = router(state);

        let response = app
            .oneshot(
                Request::get("/files/notes/x/a.txt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
            Some("text/plain")
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"hello");
    }

    #[tokio::test]
    async fn test_missing_file_is_404() {
        let app = router(test_state());
        let response = app
            .oneshot(
                Request::get("/files/notes/none.txt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
