//! Hero catalog routes

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

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Hero {
    pub id: Uuid,
    pub name: String,
    pub alias: Option<String>,
    pub powers: Option<String>,
    pub publisher_id: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub search: Option<String>,
}

impl Pagination {
    /// Clamp to sane bounds; callers cannot request unbounded pages.
    pub fn clamp(&self) -> (i64, i64) {
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateHeroRequest {
    pub name: String,
    pub alias: Option<String>,
    pub powers: Option<String>,
    pub publisher_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateHeroRequest {
    pub name: Option<String>,
    pub alias: Option<String>,
    pub powers: Option<String>,
    /// Absent leaves the publisher unchanged; an explicit null detaches it.
    #[serde(default, deserialize_with = "double_option")]
    pub publisher_id: Option<Option<Uuid>>,
}

/// Wraps a present value (including null) in an outer `Some`, so absent and
/// null fields deserialize differently.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}

const HERO_COLUMNS: &str = "id, name, alias, powers, publisher_id, created_at";

pub async fn list(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> ApiResult<Json<Vec<Hero>>> {
    let (limit, offset) = pagination.clamp();
    let query = format!(
        r#"
        SELECT {HERO_COLUMNS} FROM heroes
        WHERE ($3::text IS NULL OR name ILIKE '%' || $3 || '%' OR alias ILIKE '%' || $3 || '%')
        ORDER BY name ASC
        LIMIT $1 OFFSET $2
        "#
    );
    let heroes = sqlx::query_as::<_, Hero>(&query)
        .bind(limit)
        .bind(offset)
        .bind(pagination.search.as_deref())
        .fetch_all(&state.pool)
        .await?;
    Ok(Json(heroes))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Hero>> {
    let query = format!("SELECT {HERO_COLUMNS} FROM heroes WHERE id = $1");
    let hero = sqlx::query_as::<_, Hero>(&query)
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(hero))
}

pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateHeroRequest>,
) -> ApiResult<(StatusCode, Json<Hero>)> {
    if req.name.trim().is_empty() {
        return Err(ApiError::Validation("Hero name is required".to_string()));
    }

    let query = format!(
        r#"
        INSERT INTO heroes (id, name, alias, powers, publisher_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {HERO_COLUMNS}
        "#
    );
    let hero = sqlx::query_as::<_, Hero>(&query)
        .bind(Uuid::new_v4())
        .bind(req.name.trim())
        .bind(req.alias.as_deref())
        .bind(req.powers.as_deref())
        .bind(req.publisher_id)
        .fetch_one(&state.pool)
        .await?;

    tracing::info!(hero_id = %hero.id, "Hero created");
    Ok((StatusCode::CREATED, Json(hero)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateHeroRequest>,
) -> ApiResult<Json<Hero>> {
    if matches!(&req.name, Some(name) if name.trim().is_empty()) {
        return Err(ApiError::Validation("Hero name cannot be empty".to_string()));
    }

    let query = format!(
        r#"
        UPDATE heroes
        SET name = COALESCE($2, name),
            alias = COALESCE($3, alias),
            powers = COALESCE($4, powers),
            publisher_id = CASE WHEN $6 THEN $5::uuid ELSE publisher_id END
        WHERE id = $1
        RETURNING {HERO_COLUMNS}
        "#
    );
    let hero = sqlx::query_as::<_, Hero>(&query)
        .bind(id)
        .bind(req.name.as_deref().map(str::trim))
        .bind(req.alias.as_deref())
        .bind(req.powers.as_deref())
        .bind(req.publisher_id.flatten())
        .bind(req.publisher_id.is_some())
        .fetch_optional(&state.pool)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(hero))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    let result = sqlx::query("DELETE FROM heroes WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound);
    }
    tracing::info!(hero_id = %id, "Hero deleted");
    Ok(StatusCode::NO_CONTENT)
}
