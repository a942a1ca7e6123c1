// Admin-only user management under /api/v1/auth/users
use axum::extract::{Path, Query};
use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use super::parse_id;
use crate::api::{ApiResponse, ApiResult, ListResponse};
use crate::auth::password;
use crate::database::models::{Role, User};
use crate::database::Db;
use crate::error::ApiError;
use crate::middleware::{authorize, CurrentUser};
use crate::query::QueryDescriptor;

/// Columns safe to expose in listings; credential fields never leave the
/// database through the translator
const SAFE_FIELDS: [&str; 4] = ["name", "email", "role", "created_at"];

#[derive(Debug, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
}

/// GET /api/v1/auth/users
pub async fn list(
    CurrentUser(admin): CurrentUser,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<ListResponse, ApiError> {
    authorize(&admin, &[Role::Admin])?;

    let mut descriptor = QueryDescriptor::from_params(&params)?;
    descriptor
        .select
        .retain(|field| SAFE_FIELDS.contains(&field.as_str()));
    if descriptor.select.is_empty() {
        descriptor.select = SAFE_FIELDS.iter().map(|s| s.to_string()).collect();
    }

    let page = descriptor.fetch_page("users", Db::pool()?).await?;
    Ok(ListResponse(page))
}

/// GET /api/v1/auth/users/:id
pub async fn show(CurrentUser(admin): CurrentUser, Path(id): Path<String>) -> ApiResult<User> {
    authorize(&admin, &[Role::Admin])?;

    let id = parse_id(&id)?;
    let user = User::find(id, Db::pool()?)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No user with the id of {}", id)))?;
    Ok(ApiResponse::success(user))
}

/// POST /api/v1/auth/users
pub async fn create(
    CurrentUser(admin): CurrentUser,
    Json(payload): Json<NewUser>,
) -> ApiResult<User> {
    authorize(&admin, &[Role::Admin])?;

    let hash = password::hash_password(&payload.password)?;
    let user = User::create(
        &payload.name,
        &payload.email,
        payload.role.unwrap_or(Role::User),
        &hash,
        Db::pool()?,
    )
    .await?;
    Ok(ApiResponse::created(user))
}

/// PUT /api/v1/auth/users/:id
pub async fn update(
    CurrentUser(admin): CurrentUser,
    Path(id): Path<String>,
    Json(patch): Json<UserPatch>,
) -> ApiResult<User> {
    authorize(&admin, &[Role::Admin])?;

    let id = parse_id(&id)?;
    let pool = Db::pool()?;

    User::find(id, pool)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No user with the id of {}", id)))?;

    let user = User::admin_update(
        id,
        patch.name.as_deref(),
        patch.email.as_deref(),
        patch.role,
        pool,
    )
    .await?;
    Ok(ApiResponse::success(user))
}

/// DELETE /api/v1/auth/users/:id
pub async fn destroy(
    CurrentUser(admin): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    authorize(&admin, &[Role::Admin])?;

    let id = parse_id(&id)?;
    let deleted = User::delete(id, Db::pool()?).await?;
    if deleted == 0 {
        return Err(ApiError::not_found(format!("No user with the id of {}", id)));
    }
    Ok(ApiResponse::success(json!({})))
}
