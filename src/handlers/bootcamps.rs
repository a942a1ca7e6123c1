use axum::extract::{Multipart, Path, Query};
use axum::response::Json;
use serde_json::{json, Value};

use super::{check_ownership, parse_id};
use crate::api::{ApiResponse, ApiResult, ListResponse};
use crate::config;
use crate::database::models::bootcamp::{Bootcamp, BootcampPatch, NewBootcamp};
use crate::database::models::Role;
use crate::database::Db;
use crate::error::ApiError;
use crate::geo::{angular_radius, Geocoder};
use crate::middleware::{authorize, CurrentUser};
use crate::query::QueryDescriptor;

/// Postgres array columns on the bootcamps table; filters on these are
/// membership tests
const ARRAY_COLUMNS: &[&str] = &["careers"];

/// GET /api/v1/bootcamps - list through the query translator
pub async fn list(
    Query(params): Query<Vec<(String, String)>>,
) -> Result<ListResponse, ApiError> {
    let mut descriptor = QueryDescriptor::from_params(&params)?;
    descriptor.array_columns(ARRAY_COLUMNS);
    let page = descriptor.fetch_page("bootcamps", Db::pool()?).await?;
    Ok(ListResponse(page))
}

/// GET /api/v1/bootcamps/:id
pub async fn show(Path(id): Path<String>) -> ApiResult<Bootcamp> {
    let id = parse_id(&id)?;
    let bootcamp = Bootcamp::find(id, Db::pool()?)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Bootcamp not found with id of {}", id)))?;
    Ok(ApiResponse::success(bootcamp))
}

/// POST /api/v1/bootcamps - publisher or admin; non-admins may own at most
/// one bootcamp
pub async fn create(
    CurrentUser(user): CurrentUser,
    Json(mut payload): Json<NewBootcamp>,
) -> ApiResult<Bootcamp> {
    authorize(&user, &[Role::Publisher, Role::Admin])?;

    let pool = Db::pool()?;
    let already_owns = Bootcamp::find_by_owner(user.id, pool).await?.is_some();
    if exceeds_publish_quota(user.role, already_owns) {
        return Err(ApiError::bad_request(format!(
            "The user with id {} has already published a bootcamp",
            user.id
        )));
    }

    // Resolve coordinates from the address when the client didn't send any;
    // a geocoder outage shouldn't block creation
    if payload.latitude.is_none() {
        if let Some(address) = payload.address.as_deref() {
            match Geocoder::new().geocode(address).await {
                Ok(coords) => {
                    payload.latitude = Some(coords.latitude);
                    payload.longitude = Some(coords.longitude);
                }
                Err(e) => tracing::warn!("Geocoding failed for new bootcamp: {}", e),
            }
        }
    }

    let bootcamp = Bootcamp::create(user.id, &payload, pool).await?;
    Ok(ApiResponse::created(bootcamp))
}

/// PUT /api/v1/bootcamps/:id - owner or admin
pub async fn update(
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(patch): Json<BootcampPatch>,
) -> ApiResult<Bootcamp> {
    let id = parse_id(&id)?;
    let pool = Db::pool()?;

    let bootcamp = Bootcamp::find(id, pool)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Bootcamp not found with id of {}", id)))?;
    check_ownership(bootcamp.user_id, &user, "update", "bootcamp")?;

    let updated = Bootcamp::update(id, &patch, pool).await?;
    Ok(ApiResponse::success(updated))
}

/// DELETE /api/v1/bootcamps/:id - owner or admin; courses and reviews
/// cascade with it
pub async fn destroy(
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_id(&id)?;
    let pool = Db::pool()?;

    let bootcamp = Bootcamp::find(id, pool)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Bootcamp not found with id of {}", id)))?;
    check_ownership(bootcamp.user_id, &user, "delete", "bootcamp")?;

    Bootcamp::delete(id, pool).await?;
    Ok(ApiResponse::success(json!({})))
}

/// GET /api/v1/bootcamps/radius/:zipcode/:distance - bootcamps within
/// `distance` kilometers of the zipcode's coordinates
pub async fn within_radius(
    Path((zipcode, distance)): Path<(String, f64)>,
) -> Result<Json<Value>, ApiError> {
    let coords = Geocoder::new().geocode(&zipcode).await?;
    let radius = angular_radius(distance);

    let bootcamps =
        Bootcamp::within_radius(coords.latitude, coords.longitude, radius, Db::pool()?).await?;

    Ok(Json(json!({
        "success": true,
        "count": bootcamps.len(),
        "data": bootcamps,
    })))
}

/// PUT /api/v1/bootcamps/:id/photo - multipart image upload, owner or admin
pub async fn upload_photo(
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> ApiResult<String> {
    let id = parse_id(&id)?;
    let pool = Db::pool()?;

    let bootcamp = Bootcamp::find(id, pool)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Bootcamp not found with id of {}", id)))?;
    check_ownership(bootcamp.user_id, &user, "update", "bootcamp")?;

    let field = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.to_string()))?
        .ok_or_else(|| ApiError::bad_request("Please upload a file"))?;

    let content_type = field.content_type().unwrap_or_default().to_string();
    if !content_type.starts_with("image") {
        return Err(ApiError::bad_request("Please upload an image file"));
    }

    let extension = field
        .file_name()
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| format!(".{}", ext))
        .unwrap_or_default();

    let data = field
        .bytes()
        .await
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let uploads = &config::config().uploads;
    if data.len() > uploads.max_file_bytes {
        return Err(ApiError::bad_request(format!(
            "Please upload an image file less than {} bytes",
            uploads.max_file_bytes
        )));
    }

    // Deterministic name derived from the resource id
    let filename = photo_filename(id, &extension);
    let destination = std::path::Path::new(&uploads.path).join(&filename);

    tokio::fs::create_dir_all(&uploads.path).await.map_err(|e| {
        tracing::error!("Creating upload directory failed: {}", e);
        ApiError::internal_server_error("Problem with file upload")
    })?;
    tokio::fs::write(&destination, &data).await.map_err(|e| {
        tracing::error!("Writing upload failed: {}", e);
        ApiError::internal_server_error("Problem with file upload")
    })?;

    Bootcamp::set_photo(id, &filename, pool).await?;
    Ok(ApiResponse::success(filename))
}

fn photo_filename(id: uuid::Uuid, extension: &str) -> String {
    format!("photo_{}{}", id, extension)
}

/// Singleton rule: everyone but admins may publish at most one bootcamp
fn exceeds_publish_quota(role: Role, already_owns: bool) -> bool {
    role != Role::Admin && already_owns
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn photo_filename_is_deterministic() {
        let id = uuid::Uuid::parse_str("b9d106be-27e8-4a10-a271-1e939a9d6b09").unwrap();
        assert_eq!(
            photo_filename(id, ".jpg"),
            "photo_b9d106be-27e8-4a10-a271-1e939a9d6b09.jpg"
        );
        assert_eq!(
            photo_filename(id, ""),
            "photo_b9d106be-27e8-4a10-a271-1e939a9d6b09"
        );
    }

    #[test]
    fn second_bootcamp_blocked_for_non_admins() {
        assert!(exceeds_publish_quota(Role::Publisher, true));
        assert!(exceeds_publish_quota(Role::User, true));
        assert!(!exceeds_publish_quota(Role::Publisher, false));
    }

    #[test]
    fn admins_are_exempt_from_the_publish_quota() {
        assert!(!exceeds_publish_quota(Role::Admin, true));
        assert!(!exceeds_publish_quota(Role::Admin, false));
    }
}
