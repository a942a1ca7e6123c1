use axum::extract::{Path, Query};
use axum::response::Json;
use serde_json::{json, Value};

use super::{check_ownership, parse_id};
use crate::api::{ApiResponse, ApiResult, ListResponse};
use crate::database::models::review::{NewReview, Review, ReviewPatch};
use crate::database::models::{Bootcamp, Role};
use crate::database::Db;
use crate::error::ApiError;
use crate::middleware::{authorize, CurrentUser};
use crate::query::{PopulateSpec, QueryDescriptor};

const BOOTCAMP_POPULATE: PopulateSpec = PopulateSpec {
    relation: "bootcamp",
    table: "bootcamps",
    foreign_key: "bootcamp_id",
    fields: &["name", "description"],
};

/// GET /api/v1/reviews
pub async fn list(
    Query(params): Query<Vec<(String, String)>>,
) -> Result<ListResponse, ApiError> {
    let mut descriptor = QueryDescriptor::from_params(&params)?;
    descriptor.populate(BOOTCAMP_POPULATE);
    let page = descriptor.fetch_page("reviews", Db::pool()?).await?;
    Ok(ListResponse(page))
}

/// GET /api/v1/bootcamps/:bootcamp_id/reviews
pub async fn list_for_bootcamp(
    Path(bootcamp_id): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<ListResponse, ApiError> {
    let bootcamp_id = parse_id(&bootcamp_id)?;
    let mut descriptor = QueryDescriptor::from_params(&params)?;
    descriptor
        .and_eq("bootcamp_id", json!(bootcamp_id))
        .populate(BOOTCAMP_POPULATE);
    let page = descriptor.fetch_page("reviews", Db::pool()?).await?;
    Ok(ListResponse(page))
}

/// GET /api/v1/reviews/:id
pub async fn show(Path(id): Path<String>) -> ApiResult<Review> {
    let id = parse_id(&id)?;
    let review = Review::find(id, Db::pool()?)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No review found with the id of {}", id)))?;
    Ok(ApiResponse::success(review))
}

/// POST /api/v1/bootcamps/:bootcamp_id/reviews - role user or admin; the
/// unique index rejects a second review from the same user
pub async fn create(
    CurrentUser(user): CurrentUser,
    Path(bootcamp_id): Path<String>,
    Json(payload): Json<NewReview>,
) -> ApiResult<Review> {
    authorize(&user, &[Role::User, Role::Admin])?;

    let bootcamp_id = parse_id(&bootcamp_id)?;
    let pool = Db::pool()?;

    Bootcamp::find(bootcamp_id, pool).await?.ok_or_else(|| {
        ApiError::not_found(format!("No bootcamp with the id of {}", bootcamp_id))
    })?;

    let review = Review::create(bootcamp_id, user.id, &payload, pool).await?;
    Ok(ApiResponse::created(review))
}

/// PUT /api/v1/reviews/:id - author or admin
pub async fn update(
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(patch): Json<ReviewPatch>,
) -> ApiResult<Review> {
    authorize(&user, &[Role::User, Role::Admin])?;

    let id = parse_id(&id)?;
    let pool = Db::pool()?;

    let review = Review::find(id, pool)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No review found with the id of {}", id)))?;
    check_ownership(review.user_id, &user, "update", "review")?;

    let updated = Review::update(id, &patch, pool).await?;
    Ok(ApiResponse::success(updated))
}

/// DELETE /api/v1/reviews/:id - author or admin
pub async fn destroy(
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    authorize(&user, &[Role::User, Role::Admin])?;

    let id = parse_id(&id)?;
    let pool = Db::pool()?;

    let review = Review::find(id, pool)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No review found with the id of {}", id)))?;
    check_ownership(review.user_id, &user, "delete", "review")?;

    review.delete(pool).await?;
    Ok(ApiResponse::success(json!({})))
}
