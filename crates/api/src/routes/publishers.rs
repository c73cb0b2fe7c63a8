//! Publisher catalog routes

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

use super::heroes::Pagination;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Publisher {
    pub id: Uuid,
    pub name: String,
    pub headquarters: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Deserialize)]
pub struct CreatePublisherRequest {
    pub name: String,
    pub headquarters: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePublisherRequest {
    pub name: Option<String>,
    pub headquarters: Option<String>,
}

const PUBLISHER_COLUMNS: &str = "id, name, headquarters, created_at";

pub async fn list(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> ApiResult<Json<Vec<Publisher>>> {
    let (limit, offset) = pagination.clamp();
    let query = format!(
        r#"
        SELECT {PUBLISHER_COLUMNS} FROM publishers
        WHERE ($3::text IS NULL OR name ILIKE '%' || $3 || '%')
        ORDER BY name ASC
        LIMIT $1 OFFSET $2
        "#
    );
    let publishers = sqlx::query_as::<_, Publisher>(&query)
        .bind(limit)
        .bind(offset)
        .bind(pagination.search.as_deref())
        .fetch_all(&state.pool)
        .await?;
    Ok(Json(publishers))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Publisher>> {
    let query = format!("SELECT {PUBLISHER_COLUMNS} FROM publishers WHERE id = $1");
    let publisher = sqlx::query_as::<_, Publisher>(&query)
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(publisher))
}

pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreatePublisherRequest>,
) -> ApiResult<(StatusCode, Json<Publisher>)> {
    if req.name.trim().is_empty() {
        return Err(ApiError::Validation(
            "Publisher name is required".to_string(),
        ));
    }

    let query = format!(
        r#"
        INSERT INTO publishers (id, name, headquarters)
        VALUES ($1, $2, $3)
        RETURNING {PUBLISHER_COLUMNS}
        "#
    );
    let publisher = sqlx::query_as::<_, Publisher>(&query)
        .bind(Uuid::new_v4())
        .bind(req.name.trim())
        .bind(req.headquarters.as_deref())
        .fetch_one(&state.pool)
        .await?;

    tracing::info!(publisher_id = %publisher.id, "Publisher created");
    Ok((StatusCode::CREATED, Json(publisher)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdatePublisherRequest>,
) -> ApiResult<Json<Publisher>> {
    if matches!(&req.name, Some(name) if name.trim().is_empty()) {
        return Err(ApiError::Validation(
            "Publisher name cannot be empty".to_string(),
        ));
    }

    let query = format!(
        r#"
        UPDATE publishers
        SET name = COALESCE($2, name),
            headquarters = COALESCE($3, headquarters)
        WHERE id = $1
        RETURNING {PUBLISHER_COLUMNS}
        "#
    );
    let publisher = sqlx::query_as::<_, Publisher>(&query)
        .bind(id)
        .bind(req.name.as_deref().map(str::trim))
        .bind(req.headquarters.as_deref())
        .fetch_optional(&state.pool)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(publisher))
}

/// Delete a publisher; heroes referencing it are detached, not deleted.
pub async fn delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    let result = sqlx::query("DELETE FROM publishers WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound);
    }
    tracing::info!(publisher_id = %id, "Publisher deleted");
    Ok(StatusCode::NO_CONTENT)
}
