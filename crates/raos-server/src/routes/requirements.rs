use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use raos_core::requirement::{RecordEdit, RequirementRecord};
use raos_core::store::{ListQuery, Page};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::owner::Owner;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateBody {
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub q: Option<String>,
}

impl ListParams {
    fn into_query(self, owner: Option<String>) -> ListQuery {
        let defaults = ListQuery::default();
        ListQuery {
            page: self.page.unwrap_or(defaults.page),
            limit: self.limit.unwrap_or(defaults.limit),
            search: self.q,
            owner,
        }
    }
}

fn record_json(r: &RequirementRecord) -> serde_json::Value {
    serde_json::json!({
        "id": r.id,
        "description": r.description,
        "app_name": r.app_name,
        "entities": r.entities,
        "roles": r.roles,
        "features": r.features,
        "raos": r.raos,
        "mockup_markup": r.mockup_markup,
        "owner_id": r.owner_id,
        "state": r.state(),
        "created_at": r.created_at,
    })
}

fn summary_json(r: RequirementRecord) -> serde_json::Value {
    serde_json::json!({
        "id": r.id,
        "description": r.description,
        "app_name": r.app_name,
        "roles": r.roles,
        "owner_id": r.owner_id,
        "state": r.state(),
        "has_mockup": r.mockup_markup.is_some(),
        "created_at": r.created_at,
    })
}

async fn list_page(app: &AppState, query: ListQuery) -> Result<Page<serde_json::Value>, AppError> {
    let pipeline = app.pipeline.clone();
    let page = tokio::task::spawn_blocking(move || pipeline.list(&query))
        .await
        .map_err(|e| AppError::from(anyhow::anyhow!("task join error: {e}")))??;
    Ok(page.map(summary_json))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/requirements: create a record for the caller and run extraction.
///
/// If extraction fails the record stays in `created` and its id is returned
/// with the error so the client can retry via `/extract`.
pub async fn create_requirement(
    State(app): State<AppState>,
    Owner(owner): Owner,
    Json(body): Json<CreateBody>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    if body.description.trim().is_empty() {
        return Err(AppError::bad_request("description is required"));
    }

    let pipeline = app.pipeline.clone();
    let record = tokio::task::spawn_blocking(move || pipeline.create(&body.description, &owner))
        .await
        .map_err(|e| AppError::from(anyhow::anyhow!("task join error: {e}")))??;

    let id = record.id;
    let record = app
        .pipeline
        .run_extraction(id)
        .await
        .map_err(|e| AppError::from(e).with_record(id))?;

    Ok((StatusCode::CREATED, Json(record_json(&record))))
}

/// POST /api/requirements/:id/extract: run (or re-read) extraction.
pub async fn extract_requirement(
    State(app): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let record = app
        .pipeline
        .run_extraction(id)
        .await
        .map_err(|e| AppError::from(e).with_record(id))?;
    Ok(Json(record_json(&record)))
}

/// POST /api/requirements/:id/generate-ui: run (or re-read) the mockup stage.
pub async fn generate_ui(
    State(app): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let markup = app
        .pipeline
        .run_mockup(id)
        .await
        .map_err(|e| AppError::from(e).with_record(id))?;
    Ok(Json(serde_json::json!({
        "id": id,
        "mockup_markup": markup,
    })))
}

/// GET /api/requirements: public listing, newest first.
pub async fn list_requirements(
    State(app): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<serde_json::Value>>, AppError> {
    let page = list_page(&app, params.into_query(None)).await?;
    Ok(Json(page))
}

/// GET /api/requirements/mine: the caller's records, newest first.
pub async fn list_my_requirements(
    State(app): State<AppState>,
    Owner(owner): Owner,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<serde_json::Value>>, AppError> {
    let page = list_page(&app, params.into_query(Some(owner))).await?;
    Ok(Json(page))
}

/// GET /api/requirements/:id: full record.
pub async fn get_requirement(
    State(app): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let pipeline = app.pipeline.clone();
    let record = tokio::task::spawn_blocking(move || pipeline.get(id))
        .await
        .map_err(|e| AppError::from(anyhow::anyhow!("task join error: {e}")))??;
    Ok(Json(record_json(&record)))
}

/// PUT /api/requirements/:id: owner edit of the extracted fields.
pub async fn update_requirement(
    State(app): State<AppState>,
    Path(id): Path<Uuid>,
    Owner(owner): Owner,
    Json(edit): Json<RecordEdit>,
) -> Result<Json<serde_json::Value>, AppError> {
    let record = app.pipeline.edit(id, &owner, &edit).await?;
    Ok(Json(record_json(&record)))
}

/// DELETE /api/requirements/:id: owner delete.
pub async fn delete_requirement(
    State(app): State<AppState>,
    Path(id): Path<Uuid>,
    Owner(owner): Owner,
) -> Result<Json<serde_json::Value>, AppError> {
    app.pipeline.delete(id, &owner).await?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}
