use axum::extract::{Path, Query};
use axum::response::Json;
use serde_json::{json, Value};

use super::{check_ownership, parse_id};
use crate::api::{ApiResponse, ApiResult, ListResponse};
use crate::database::models::course::{Course, CoursePatch, NewCourse};
use crate::database::models::{Bootcamp, Role};
use crate::database::Db;
use crate::error::ApiError;
use crate::middleware::{authorize, CurrentUser};
use crate::query::{PopulateSpec, QueryDescriptor};

/// Safe projection of the parent bootcamp into course listings
const BOOTCAMP_POPULATE: PopulateSpec = PopulateSpec {
    relation: "bootcamp",
    table: "bootcamps",
    foreign_key: "bootcamp_id",
    fields: &["name", "description"],
};

/// GET /api/v1/courses - all courses, parent bootcamp populated
pub async fn list(
    Query(params): Query<Vec<(String, String)>>,
) -> Result<ListResponse, ApiError> {
    let mut descriptor = QueryDescriptor::from_params(&params)?;
    descriptor.populate(BOOTCAMP_POPULATE);
    let page = descriptor.fetch_page("courses", Db::pool()?).await?;
    Ok(ListResponse(page))
}

/// GET /api/v1/bootcamps/:bootcamp_id/courses - courses of one bootcamp
pub async fn list_for_bootcamp(
    Path(bootcamp_id): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<ListResponse, ApiError> {
    let bootcamp_id = parse_id(&bootcamp_id)?;
    let mut descriptor = QueryDescriptor::from_params(&params)?;
    descriptor
        .and_eq("bootcamp_id", json!(bootcamp_id))
        .populate(BOOTCAMP_POPULATE);
    let page = descriptor.fetch_page("courses", Db::pool()?).await?;
    Ok(ListResponse(page))
}

/// GET /api/v1/courses/:id
pub async fn show(Path(id): Path<String>) -> ApiResult<Course> {
    let id = parse_id(&id)?;
    let course = Course::find(id, Db::pool()?)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No course with the id of {}", id)))?;
    Ok(ApiResponse::success(course))
}

/// POST /api/v1/bootcamps/:bootcamp_id/courses - publisher or admin, must
/// own the parent bootcamp
pub async fn create(
    CurrentUser(user): CurrentUser,
    Path(bootcamp_id): Path<String>,
    Json(payload): Json<NewCourse>,
) -> ApiResult<Course> {
    authorize(&user, &[Role::Publisher, Role::Admin])?;

    let bootcamp_id = parse_id(&bootcamp_id)?;
    let pool = Db::pool()?;

    let bootcamp = Bootcamp::find(bootcamp_id, pool).await?.ok_or_else(|| {
        ApiError::not_found(format!("No bootcamp with the id of {}", bootcamp_id))
    })?;

    if user.role != Role::Admin && bootcamp.user_id != user.id {
        return Err(ApiError::unauthorized(format!(
            "User {} is not authorized to add a course to bootcamp {}",
            user.id, bootcamp_id
        )));
    }

    let course = Course::create(bootcamp_id, user.id, &payload, pool).await?;
    Ok(ApiResponse::created(course))
}

/// PUT /api/v1/courses/:id - owner or admin
pub async fn update(
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(patch): Json<CoursePatch>,
) -> ApiResult<Course> {
    authorize(&user, &[Role::Publisher, Role::Admin])?;

    let id = parse_id(&id)?;
    let pool = Db::pool()?;

    let course = Course::find(id, pool)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No course with the id of {}", id)))?;
    check_ownership(course.user_id, &user, "update", "course")?;

    let updated = Course::update(id, &patch, pool).await?;
    Ok(ApiResponse::success(updated))
}

/// DELETE /api/v1/courses/:id - owner or admin
pub async fn destroy(
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    authorize(&user, &[Role::Publisher, Role::Admin])?;

    let id = parse_id(&id)?;
    let pool = Db::pool()?;

    let course = Course::find(id, pool)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No course with the id of {}", id)))?;
    check_ownership(course.user_id, &user, "delete", "course")?;

    course.delete(pool).await?;
    Ok(ApiResponse::success(json!({})))
}
